// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Drill platform: a piston arm with a drill head rotor.

use serde::{Deserialize, Serialize};

use crate::grid::{group_members, measure_extension, BlockKind, Grid, GridError};
use crate::log::LogLevel;

use super::phase::{classify_platform, DepthProfile, PlatformPhase, PlatformReading, UNIT_STROKE};
use super::{
    any_enabled, expect_block, expect_group, CallBatch, RigLink, RigPhase, SetupError,
    TriggerOutcome,
};

const RIG: &str = "platform";

/// Block and group names the platform is wired to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformLayout {
    /// Caller id used for every request.
    pub controller: String,
    pub piston_group: String,
    pub rotor: String,
    pub drill_group: String,
    /// Timer that re-issues `start`.
    pub start_timer: String,
    /// Timer that re-issues `stop`.
    pub stop_timer: String,
}

impl Default for PlatformLayout {
    fn default() -> Self {
        Self {
            controller: "DrillController".to_string(),
            piston_group: "DT Pistons".to_string(),
            rotor: "DT Advanced Rotor".to_string(),
            drill_group: "DT Drills".to_string(),
            start_timer: "Start_Drilling_Caller".to_string(),
            stop_timer: "Stop_Drilling_Caller".to_string(),
        }
    }
}

/// Platform sequencer. Holds no phase; every trigger measures the arm.
#[derive(Debug, Clone)]
pub struct DrillPlatform {
    layout: PlatformLayout,
    profile: DepthProfile,
}

impl DrillPlatform {
    /// Resolve every required block and derive the depth profile from the
    /// pistons enabled right now.
    pub fn new<G>(layout: PlatformLayout, grid: &G) -> Result<Self, SetupError>
    where
        G: Grid + ?Sized,
    {
        expect_group(grid, RIG, &layout.piston_group)?;
        expect_block(grid, RIG, &layout.rotor, "rotor or hinge", |k| k.is_stator())?;
        expect_group(grid, RIG, &layout.drill_group)?;
        for timer in [&layout.start_timer, &layout.stop_timer] {
            expect_block(grid, RIG, timer, "timer", |k| k == BlockKind::Timer)?;
        }

        let pistons = group_members(grid, &layout.piston_group, |b| {
            b.kind() == BlockKind::Piston && b.is_enabled()
        })
        .map_err(|_| SetupError::MissingGroup {
            rig: RIG,
            name: layout.piston_group.clone(),
        })?;
        let profile =
            DepthProfile::from_actuator_count(pistons.len()).ok_or_else(|| SetupError::NoPistons {
                rig: RIG,
                group: layout.piston_group.clone(),
            })?;

        Ok(Self { layout, profile })
    }

    pub fn layout(&self) -> &PlatformLayout {
        &self.layout
    }

    pub fn profile(&self) -> &DepthProfile {
        &self.profile
    }

    /// Log the derived constants.
    pub fn announce<L: RigLink + ?Sized>(&self, link: &mut L) {
        let mut calls = self.batch(link, "Constructor");
        calls.log(
            LogLevel::Debug,
            format!("New controller:{}", self.profile.describe()),
        );
    }

    pub fn handle<L: RigLink + ?Sized>(&self, trigger: &str, link: &mut L) -> TriggerOutcome {
        match trigger {
            "getReady" => self.get_ready(link),
            "getTransport" => self.get_transport(link),
            "start" => self.start(link),
            "stop" => self.stop(link, false),
            "stop:force" => self.stop(link, true),
            "status" => self.status(link),
            other => {
                CallBatch::new(link, self.layout.controller.as_str())
                    .log(LogLevel::Error, format!("Invalid arg: {}", other));
                TriggerOutcome::Rejected {
                    trigger: other.to_string(),
                }
            }
        }
    }

    /// Move the arm to the ready position, where drilling can start at any moment.
    fn get_ready<L: RigLink + ?Sized>(&self, link: &mut L) -> TriggerOutcome {
        let reading = match self.read(link, "GetReady") {
            Ok(reading) => reading,
            Err(outcome) => return outcome,
        };
        let p = self.profile;
        let velocity = if reading.total < p.ready_extension {
            p.positioning_speed
        } else {
            -p.positioning_speed
        };

        let mut calls = self.batch(link, "GetReady");
        self.set_piston_velocity(&mut calls, velocity);
        self.set_piston_limits(&mut calls, p.ready_per_unit, p.ready_per_unit);
        self.park_rotor(&mut calls);
        applied(PlatformPhase::GettingReady, &calls)
    }

    fn get_transport<L: RigLink + ?Sized>(&self, link: &mut L) -> TriggerOutcome {
        let mut calls = self.batch(link, "GetTransport");
        self.set_piston_velocity(&mut calls, -self.profile.positioning_speed);
        self.set_piston_limits(&mut calls, 0.0, 0.0);
        self.park_rotor(&mut calls);
        calls.stop_countdown(&self.layout.start_timer);
        calls.stop_countdown(&self.layout.stop_timer);
        applied(PlatformPhase::Transport, &calls)
    }

    /// Drill one hole. Only valid in the ready position; arms the stop timer.
    fn start<L: RigLink + ?Sized>(&self, link: &mut L) -> TriggerOutcome {
        let reading = match self.read(link, "start") {
            Ok(reading) => reading,
            Err(outcome) => return outcome,
        };
        let p = self.profile;
        if !p.is_ready(reading.total) {
            return self.abort(link, "start", p.ready_extension, reading.total);
        }

        let mut calls = self.batch(link, "start");
        self.set_piston_velocity(&mut calls, p.drill_speed);
        self.set_piston_limits(&mut calls, p.ready_per_unit, UNIT_STROKE);
        calls.send("SetBlockVelocity", [self.layout.rotor.clone(), "4".to_string()]);
        calls.send(
            "SetRotorLimit",
            [self.layout.rotor.as_str(), "-361", "361"],
        );
        calls.send("SetGroupEnabled", [self.layout.drill_group.as_str(), "true"]);
        calls.stop_countdown(&self.layout.start_timer);
        calls.start_countdown(&self.layout.stop_timer);
        applied(PlatformPhase::Drilling, &calls)
    }

    /// Retract to the ready position. Unless forced, only at maximum depth.
    fn stop<L: RigLink + ?Sized>(&self, link: &mut L, force: bool) -> TriggerOutcome {
        let p = self.profile;
        if !force {
            let reading = match self.read(link, "stop") {
                Ok(reading) => reading,
                Err(outcome) => return outcome,
            };
            if !p.is_at_depth(reading.total) {
                return self.abort(link, "stop", p.max_depth, reading.total);
            }
        }

        let mut calls = self.batch(link, "stop");
        self.set_piston_velocity(&mut calls, -p.positioning_speed);
        self.set_piston_limits(&mut calls, p.ready_per_unit, p.ready_per_unit);
        self.park_rotor(&mut calls);
        calls.send("SetGroupEnabled", [self.layout.drill_group.as_str(), "false"]);
        calls.stop_countdown(&self.layout.stop_timer);
        applied(PlatformPhase::Stopping, &calls)
    }

    fn status<L: RigLink + ?Sized>(&self, link: &mut L) -> TriggerOutcome {
        let reading = match self.read(link, "status") {
            Ok(reading) => reading,
            Err(outcome) => return outcome,
        };
        let phase = classify_platform(&self.profile, &reading);
        self.batch(link, "status").log(
            LogLevel::Info,
            format!(
                "Phase: {} (extension {}m of {}m)",
                phase, reading.total, self.profile.max_depth
            ),
        );
        TriggerOutcome::Status {
            phase: RigPhase::Platform(phase),
        }
    }

    /// Current reading of the arm.
    pub fn measure(&self, grid: &dyn Grid) -> Result<PlatformReading, GridError> {
        let group = &self.layout.piston_group;
        let total = measure_extension(grid, group)?;
        let velocity = group_members(grid, group, |b| {
            b.kind() == BlockKind::Piston && b.is_enabled()
        })?
        .first()
        .and_then(|name| grid.block(name))
        .and_then(|b| b.velocity())
        .map(f64::from)
        .unwrap_or(0.0);
        let drills_on = any_enabled(grid, &self.layout.drill_group, BlockKind::Drill);
        Ok(PlatformReading {
            total,
            velocity,
            drills_on,
        })
    }

    fn read<L: RigLink + ?Sized>(
        &self,
        link: &mut L,
        action: &str,
    ) -> Result<PlatformReading, TriggerOutcome> {
        match self.measure(link.grid()) {
            Ok(reading) => Ok(reading),
            Err(e) => {
                let reason = format!("Could not measure piston extension: {}", e);
                self.batch(link, action).log(LogLevel::Error, &reason);
                Err(TriggerOutcome::Aborted { reason })
            }
        }
    }

    fn abort<L: RigLink + ?Sized>(
        &self,
        link: &mut L,
        action: &str,
        expected: f64,
        actual: f64,
    ) -> TriggerOutcome {
        let reason = format!(
            "Pistons are in wrong position. They need to be exactly at {}m. Were at {}",
            expected, actual
        );
        self.batch(link, action).log(LogLevel::Info, &reason);
        TriggerOutcome::Aborted { reason }
    }

    fn batch<'l, L: RigLink + ?Sized>(&self, link: &'l mut L, action: &str) -> CallBatch<'l, L> {
        CallBatch::new(link, format!("{}->{}", self.layout.controller, action))
    }

    fn set_piston_velocity<L: RigLink + ?Sized>(&self, calls: &mut CallBatch<'_, L>, velocity: f64) {
        calls.send(
            "SetPistonGroupVelocity",
            [self.layout.piston_group.clone(), velocity.to_string()],
        );
    }

    fn set_piston_limits<L: RigLink + ?Sized>(
        &self,
        calls: &mut CallBatch<'_, L>,
        lower: f64,
        upper: f64,
    ) {
        calls.send(
            "SetPistonGroupLimits",
            [
                self.layout.piston_group.clone(),
                lower.to_string(),
                upper.to_string(),
            ],
        );
    }

    /// Drill head to the transport-safe range.
    fn park_rotor<L: RigLink + ?Sized>(&self, calls: &mut CallBatch<'_, L>) {
        calls.send("SetBlockVelocity", [self.layout.rotor.as_str(), "1"]);
        calls.send("SetRotorLimit", [self.layout.rotor.as_str(), "0", "1"]);
    }
}

fn applied<L: RigLink + ?Sized>(phase: PlatformPhase, calls: &CallBatch<'_, L>) -> TriggerOutcome {
    TriggerOutcome::Applied {
        phase: RigPhase::Platform(phase),
        failed_calls: calls.failed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::mock::{MockBlock, MockGrid};
    use crate::sequencer::testing::RecordingLink;

    fn grid_at(positions: &[f32]) -> MockGrid {
        let mut drill = MockBlock::new("Drill A", BlockKind::Drill);
        drill.enabled = false;
        let mut grid = MockGrid::default()
            .with_block(MockBlock::new("DT Advanced Rotor", BlockKind::Rotor))
            .with_block(drill)
            .with_block(MockBlock::new("Start_Drilling_Caller", BlockKind::Timer))
            .with_block(MockBlock::new("Stop_Drilling_Caller", BlockKind::Timer))
            .with_group("DT Drills", &["Drill A"]);
        let mut names = Vec::new();
        for (i, pos) in positions.iter().enumerate() {
            let name = format!("Piston {}", i + 1);
            grid = grid.with_block(MockBlock::piston(&name, *pos));
            names.push(name);
        }
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        grid.with_group("DT Pistons", &names)
    }

    fn platform(grid: &MockGrid) -> DrillPlatform {
        DrillPlatform::new(PlatformLayout::default(), grid).unwrap()
    }

    #[test]
    fn test_profile_from_enabled_pistons() {
        let mut grid = grid_at(&[0.0; 5]);
        grid.get_mut("Piston 5").enabled = false;
        let p = platform(&grid);
        assert_eq!(p.profile().unit_count, 4);
        assert_eq!(p.profile().ready_extension, 10.0);
        assert_eq!(p.profile().max_depth, 40.0);
    }

    #[test]
    fn test_setup_requires_blocks() {
        let grid = grid_at(&[0.0; 4]);
        let layout = PlatformLayout {
            rotor: "Missing Rotor".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            DrillPlatform::new(layout, &grid),
            Err(SetupError::MissingBlock { .. })
        ));

        let layout = PlatformLayout {
            start_timer: "Drill A".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            DrillPlatform::new(layout, &grid),
            Err(SetupError::WrongKind { .. })
        ));

        let empty = grid_at(&[]);
        assert!(matches!(
            DrillPlatform::new(PlatformLayout::default(), &empty),
            Err(SetupError::NoPistons { .. })
        ));
    }

    #[test]
    fn test_get_ready_extends_from_transport() {
        let grid = grid_at(&[0.0; 4]);
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);

        let outcome = p.handle("getReady", &mut link);

        assert_eq!(
            outcome,
            TriggerOutcome::Applied {
                phase: RigPhase::Platform(PlatformPhase::GettingReady),
                failed_calls: 0
            }
        );
        assert_eq!(
            link.mutations(),
            vec![
                "DrillController->GetReady;SetPistonGroupVelocity;DT Pistons;0.25",
                "DrillController->GetReady;SetPistonGroupLimits;DT Pistons;2.5;2.5",
                "DrillController->GetReady;SetBlockVelocity;DT Advanced Rotor;1",
                "DrillController->GetReady;SetRotorLimit;DT Advanced Rotor;0;1",
            ]
        );
    }

    #[test]
    fn test_get_ready_retracts_when_deeper() {
        let grid = grid_at(&[5.0; 4]);
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);
        p.handle("getReady", &mut link);
        assert_eq!(
            link.mutations()[0],
            "DrillController->GetReady;SetPistonGroupVelocity;DT Pistons;-0.25"
        );
    }

    #[test]
    fn test_start_off_position_is_a_no_op() {
        let grid = grid_at(&[2.5, 2.5, 2.5, 2.4]);
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);

        let outcome = p.handle("start", &mut link);

        assert!(matches!(outcome, TriggerOutcome::Aborted { .. }));
        assert!(link.mutations().is_empty());
        assert!(link.countdowns.is_empty());
        let logs = link.logs();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].starts_with(
            "DrillController->start;Log;INFO;Pistons are in wrong position. They need to be exactly at 10m."
        ));
    }

    #[test]
    fn test_start_at_ready_position() {
        let grid = grid_at(&[2.5; 4]);
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);

        let outcome = p.handle("start", &mut link);

        assert_eq!(
            outcome,
            TriggerOutcome::Applied {
                phase: RigPhase::Platform(PlatformPhase::Drilling),
                failed_calls: 0
            }
        );
        assert_eq!(
            link.mutations(),
            vec![
                "DrillController->start;SetPistonGroupVelocity;DT Pistons;0.125",
                "DrillController->start;SetPistonGroupLimits;DT Pistons;2.5;10",
                "DrillController->start;SetBlockVelocity;DT Advanced Rotor;4",
                "DrillController->start;SetRotorLimit;DT Advanced Rotor;-361;361",
                "DrillController->start;SetGroupEnabled;DT Drills;true",
            ]
        );
        assert_eq!(
            link.countdowns,
            vec!["stop Start_Drilling_Caller", "start Stop_Drilling_Caller"]
        );
        assert!(link.grid.get("Stop_Drilling_Caller").counting);
    }

    #[test]
    fn test_stop_requires_max_depth() {
        let grid = grid_at(&[9.0, 10.0, 10.0, 10.0]);
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);

        let outcome = p.handle("stop", &mut link);

        assert!(matches!(outcome, TriggerOutcome::Aborted { .. }));
        assert!(link.mutations().is_empty());
    }

    #[test]
    fn test_stop_at_max_depth() {
        let grid = grid_at(&[10.0; 4]);
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);

        p.handle("stop", &mut link);

        assert!(link
            .mutations()
            .contains(&"DrillController->stop;SetGroupEnabled;DT Drills;false"));
        assert_eq!(link.countdowns, vec!["stop Stop_Drilling_Caller"]);
    }

    #[test]
    fn test_forced_stop_ignores_position() {
        let grid = grid_at(&[3.0, 1.0, 0.0, 0.0]);
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);

        let outcome = p.handle("stop:force", &mut link);

        assert!(matches!(outcome, TriggerOutcome::Applied { .. }));
        assert_eq!(
            link.mutations(),
            vec![
                "DrillController->stop;SetPistonGroupVelocity;DT Pistons;-0.25",
                "DrillController->stop;SetPistonGroupLimits;DT Pistons;2.5;2.5",
                "DrillController->stop;SetBlockVelocity;DT Advanced Rotor;1",
                "DrillController->stop;SetRotorLimit;DT Advanced Rotor;0;1",
                "DrillController->stop;SetGroupEnabled;DT Drills;false",
            ]
        );
    }

    #[test]
    fn test_get_transport_disarms_both_timers() {
        let grid = grid_at(&[2.5; 4]);
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);
        link.grid.get_mut("Stop_Drilling_Caller").counting = true;

        p.handle("getTransport", &mut link);

        assert_eq!(
            link.mutations()[..2],
            [
                "DrillController->GetTransport;SetPistonGroupVelocity;DT Pistons;-0.25",
                "DrillController->GetTransport;SetPistonGroupLimits;DT Pistons;0;0",
            ]
        );
        assert_eq!(
            link.countdowns,
            vec!["stop Start_Drilling_Caller", "stop Stop_Drilling_Caller"]
        );
        assert!(!link.grid.get("Stop_Drilling_Caller").counting);
    }

    #[test]
    fn test_unknown_trigger_is_rejected_and_logged() {
        let grid = grid_at(&[0.0; 4]);
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);

        let outcome = p.handle("dance", &mut link);

        assert_eq!(
            outcome,
            TriggerOutcome::Rejected {
                trigger: "dance".to_string()
            }
        );
        assert_eq!(link.calls, vec!["DrillController;Log;ERROR;Invalid arg: dance"]);
    }

    #[test]
    fn test_trigger_with_delimiter_is_still_logged() {
        let grid = grid_at(&[0.0; 4]);
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);

        let outcome = p.handle("start;now", &mut link);

        assert_eq!(
            outcome,
            TriggerOutcome::Rejected {
                trigger: "start;now".to_string()
            }
        );
        assert_eq!(link.calls, vec!["DrillController;Log;ERROR;Invalid arg: start,now"]);
    }

    #[test]
    fn test_status_reports_phase() {
        let grid = grid_at(&[2.5; 4]);
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);

        let outcome = p.handle("status", &mut link);

        assert_eq!(
            outcome,
            TriggerOutcome::Status {
                phase: RigPhase::Platform(PlatformPhase::Ready)
            }
        );
        assert!(link.logs()[0].starts_with("DrillController->status;Log;INFO;Phase: ready"));
    }

    #[test]
    fn test_unreadable_status_aborts() {
        let mut grid = grid_at(&[2.5; 4]);
        grid.get_mut("Piston 2").status = "Offline".to_string();
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);

        let outcome = p.handle("start", &mut link);

        assert!(matches!(outcome, TriggerOutcome::Aborted { .. }));
        assert!(link.logs()[0].contains(";Log;ERROR;Could not measure piston extension"));
        assert!(link.mutations().is_empty());
    }

    #[test]
    fn test_unreadable_status_with_delimiter_is_logged() {
        let mut grid = grid_at(&[2.5; 4]);
        grid.get_mut("Piston 3").status = "Offline;Log;INFO;fine".to_string();
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);

        let outcome = p.handle("stop", &mut link);

        assert!(matches!(outcome, TriggerOutcome::Aborted { .. }));
        let logs = link.logs();
        assert_eq!(logs.len(), 1);
        assert!(logs[0]
            .starts_with("DrillController->stop;Log;ERROR;Could not measure piston extension"));
        assert!(logs[0].ends_with("\"Offline,Log,INFO,fine\""));
    }

    #[test]
    fn test_refused_calls_are_counted() {
        let grid = grid_at(&[0.0; 4]);
        let p = platform(&grid);
        let mut link = RecordingLink::new(grid);
        link.refuse.push("setrotorlimit".to_string());

        let outcome = p.handle("getReady", &mut link);

        assert_eq!(
            outcome,
            TriggerOutcome::Applied {
                phase: RigPhase::Platform(PlatformPhase::GettingReady),
                failed_calls: 1
            }
        );
    }
}
