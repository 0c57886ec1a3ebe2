// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The station ties the dispatcher, the grid, the log surface and the
//! configured rigs together and processes commands one at a time.

use tracing::{debug, info};

use crate::dispatch::{DispatchError, Dispatcher};
use crate::grid::{require_block_mut, Grid, GridError};
use crate::log::LogSurface;
use crate::rpc::RpcRequest;
use crate::sequencer::{
    DrillPlatform, DrillWinch, PlatformLayout, RigKind, RigLink, SetupError, WinchLayout,
};

pub mod command;
pub mod request;
pub mod response;

pub use command::StationCommand;
pub use request::StationRequest;
pub use response::{StationError, StationReply, StationResult};

/// Caller id of requests the station issues on its own behalf.
pub const STATION_CALLER: &str = "Station";

/// The dispatcher together with the grid and log surface it drives.
pub struct Plant<G> {
    dispatcher: Dispatcher,
    grid: G,
    surface: Box<dyn LogSurface>,
}

impl<G: Grid> Plant<G> {
    pub fn dispatch(&mut self, raw: &str) -> Result<(), DispatchError> {
        self.dispatcher
            .dispatch(raw, &mut self.grid, self.surface.as_mut())
    }
}

impl<G: Grid> RigLink for Plant<G> {
    fn grid(&self) -> &dyn Grid {
        &self.grid
    }

    fn call(&mut self, request: &RpcRequest) -> Result<(), DispatchError> {
        self.dispatch(&request.to_string())
    }

    fn start_countdown(&mut self, timer: &str) -> Result<(), GridError> {
        debug!("Starting countdown of {}", timer);
        require_block_mut(&mut self.grid, timer)?.start_countdown()
    }

    fn stop_countdown(&mut self, timer: &str) -> Result<(), GridError> {
        debug!("Stopping countdown of {}", timer);
        require_block_mut(&mut self.grid, timer)?.stop_countdown()
    }
}

pub struct Station<G> {
    plant: Plant<G>,
    platform: Option<DrillPlatform>,
    winch: Option<DrillWinch>,
}

impl<G: Grid> Station<G> {
    pub fn new(dispatcher: Dispatcher, grid: G, surface: Box<dyn LogSurface>) -> Self {
        Self {
            plant: Plant {
                dispatcher,
                grid,
                surface,
            },
            platform: None,
            winch: None,
        }
    }

    /// Attach a drill platform; fails if the grid lacks any of its blocks.
    pub fn with_platform(mut self, layout: PlatformLayout) -> Result<Self, SetupError> {
        let platform = DrillPlatform::new(layout, &self.plant.grid)?;
        info!(
            "Drill platform ready: {} pistons, ready at {}m, max depth {}m",
            platform.profile().unit_count,
            platform.profile().ready_extension,
            platform.profile().max_depth
        );
        platform.announce(&mut self.plant);
        self.platform = Some(platform);
        Ok(self)
    }

    pub fn with_winch(mut self, layout: WinchLayout) -> Result<Self, SetupError> {
        let winch = DrillWinch::new(layout, &self.plant.grid)?;
        info!("Drill winch ready: {}", winch.layout().winch);
        self.winch = Some(winch);
        Ok(self)
    }

    pub fn platform(&self) -> Option<&DrillPlatform> {
        self.platform.as_ref()
    }

    pub fn winch(&self) -> Option<&DrillWinch> {
        self.winch.as_ref()
    }

    pub fn grid(&self) -> &G {
        &self.plant.grid
    }

    /// Direct grid access for the host, e.g. to advance a simulation.
    pub fn grid_mut(&mut self) -> &mut G {
        &mut self.plant.grid
    }

    pub fn process(&mut self, cmd: StationCommand) -> StationResult<StationReply> {
        match cmd {
            StationCommand::Trigger { rig, trigger } => {
                debug!("Trigger {} for {}", trigger, rig);
                let outcome = match rig {
                    RigKind::Platform => self
                        .platform
                        .as_ref()
                        .ok_or(StationError::RigNotConfigured(rig))?
                        .handle(&trigger, &mut self.plant),
                    RigKind::Winch => self
                        .winch
                        .as_ref()
                        .ok_or(StationError::RigNotConfigured(rig))?
                        .handle(&trigger, &mut self.plant),
                };
                info!("{} {}: {:?}", rig, trigger, outcome);
                Ok(StationReply::outcome(outcome))
            }
            StationCommand::Rpc { raw } => {
                self.plant.dispatch(&raw)?;
                Ok(StationReply::default())
            }
            StationCommand::ReadLog => Ok(StationReply::log(self.read_log()?)),
            StationCommand::ClearLog => {
                self.plant.dispatch(&format!("{};ClearLog", STATION_CALLER))?;
                Ok(StationReply::default())
            }
        }
    }

    pub fn read_log(&self) -> StationResult<String> {
        self.plant
            .surface
            .read()
            .map_err(|e| StationError::Surface(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::mock::{MockBlock, MockGrid};
    use crate::grid::BlockKind;
    use crate::log::MemorySurface;
    use crate::sequencer::{PlatformPhase, RigPhase, TriggerOutcome};

    fn platform_grid() -> MockGrid {
        let mut drill = MockBlock::new("Drill", BlockKind::Drill);
        drill.enabled = false;
        MockGrid::default()
            .with_block(MockBlock::piston("P1", 2.5))
            .with_block(MockBlock::piston("P2", 2.5))
            .with_block(MockBlock::piston("P3", 2.5))
            .with_block(MockBlock::piston("P4", 2.5))
            .with_block(MockBlock::new("DT Advanced Rotor", BlockKind::Rotor))
            .with_block(drill)
            .with_block(MockBlock::new("Start_Drilling_Caller", BlockKind::Timer))
            .with_block(MockBlock::new("Stop_Drilling_Caller", BlockKind::Timer))
            .with_group("DT Pistons", &["P1", "P2", "P3", "P4"])
            .with_group("DT Drills", &["Drill"])
    }

    fn station() -> Station<MockGrid> {
        Station::new(
            Dispatcher::default(),
            platform_grid(),
            Box::new(MemorySurface::new()),
        )
        .with_platform(PlatformLayout::default())
        .unwrap()
    }

    #[test]
    fn test_platform_start_goes_through_dispatcher() {
        let mut station = station();

        let reply = station
            .process(StationCommand::Trigger {
                rig: RigKind::Platform,
                trigger: "start".to_string(),
            })
            .unwrap();

        assert_eq!(
            reply.outcome,
            Some(TriggerOutcome::Applied {
                phase: RigPhase::Platform(PlatformPhase::Drilling),
                failed_calls: 0
            })
        );
        let grid = station.grid();
        assert_eq!(grid.get("P1").velocity, 0.125);
        assert_eq!(grid.get("P4").limits, (2.5, 10.0));
        assert_eq!(grid.get("DT Advanced Rotor").velocity, 4.0);
        assert_eq!(grid.get("DT Advanced Rotor").limits, (f32::MIN, f32::MAX));
        assert!(grid.get("Drill").enabled);
        assert!(grid.get("Stop_Drilling_Caller").counting);

        let log = station.read_log().unwrap();
        assert!(log.starts_with(
            "->DrillController->start->SetGroupEnabled: [INFO]: DT Drills enabled: true"
        ));
        assert!(log.contains("->DrillController->Constructor->Log: [DEBUG]: New controller:"));
    }

    #[test]
    fn test_missing_rig_is_an_error() {
        let mut station = station();
        let err = station
            .process(StationCommand::Trigger {
                rig: RigKind::Winch,
                trigger: "start".to_string(),
            })
            .unwrap_err();
        assert_eq!(err, StationError::RigNotConfigured(RigKind::Winch));
    }

    #[test]
    fn test_rpc_errors_are_returned() {
        let mut station = station();
        let err = station
            .process(StationCommand::Rpc {
                raw: "me;Nope".to_string(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            StationError::Dispatch(DispatchError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_read_and_clear_log() {
        let mut station = station();
        station
            .process(StationCommand::Rpc {
                raw: "me;Log;INFO;hello".to_string(),
            })
            .unwrap();
        let reply = station.process(StationCommand::ReadLog).unwrap();
        assert!(reply
            .log
            .as_deref()
            .is_some_and(|log| log.starts_with("->me->Log: [INFO]: hello")));

        station.process(StationCommand::ClearLog).unwrap();
        assert_eq!(station.read_log().unwrap(), "");
    }

    #[test]
    fn test_rejected_trigger_with_delimiter_is_persisted() {
        let mut station = station();
        station.process(StationCommand::ClearLog).unwrap();

        let reply = station
            .process(StationCommand::Trigger {
                rig: RigKind::Platform,
                trigger: "start;now".to_string(),
            })
            .unwrap();

        assert_eq!(
            reply.outcome,
            Some(TriggerOutcome::Rejected {
                trigger: "start;now".to_string()
            })
        );
        assert!(station
            .read_log()
            .unwrap()
            .starts_with("->DrillController->Log: [ERROR]: Invalid arg: start,now"));
    }

    #[test]
    fn test_setup_error_propagates() {
        let result = Station::new(
            Dispatcher::default(),
            MockGrid::default(),
            Box::new(MemorySurface::new()),
        )
        .with_platform(PlatformLayout::default());
        assert!(matches!(result, Err(SetupError::MissingGroup { .. })));
    }
}
