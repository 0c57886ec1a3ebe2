// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Drill winch: drills lowered on a rope, hinged arm and three position sensors.

use serde::{Deserialize, Serialize};

use crate::grid::{BlockKind, Grid};
use crate::log::LogLevel;

use super::phase::{classify_winch, WinchPhase, WinchReading, WinchSensor};
use super::{
    any_enabled, expect_block, expect_group, CallBatch, RigLink, RigPhase, SetupError,
    TriggerOutcome,
};

const RIG: &str = "winch";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinchLayout {
    pub controller: String,
    pub hinge_group: String,
    pub drill_group: String,
    pub winch: String,
    pub sensor_rolled_up: String,
    pub sensor_rolled_down: String,
    pub sensor_drill_ready: String,
}

impl Default for WinchLayout {
    fn default() -> Self {
        Self {
            controller: "DrillWinchController".to_string(),
            hinge_group: "Drill Hinges".to_string(),
            drill_group: "Drills".to_string(),
            winch: "Drill Winch".to_string(),
            sensor_rolled_up: "Sensor Fully Rolled Up".to_string(),
            sensor_rolled_down: "Sensor Fully Rolled Down".to_string(),
            sensor_drill_ready: "Sensor Drill Ready".to_string(),
        }
    }
}

impl WinchLayout {
    pub fn sensor(&self, sensor: WinchSensor) -> &str {
        match sensor {
            WinchSensor::RolledUp => &self.sensor_rolled_up,
            WinchSensor::RolledDown => &self.sensor_rolled_down,
            WinchSensor::DrillReady => &self.sensor_drill_ready,
        }
    }
}

/// Fixed actuator settings applied by one transition.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bundle {
    action: &'static str,
    phase: WinchPhase,
    drills: bool,
    rpm: f64,
    locked: bool,
    sensor: Option<WinchSensor>,
}

fn bundle_for(trigger: &str) -> Option<Bundle> {
    let bundle = match trigger {
        "start" => Bundle {
            action: "start",
            phase: WinchPhase::RollingDown,
            drills: false,
            rpm: 0.5,
            locked: false,
            sensor: Some(WinchSensor::DrillReady),
        },
        "readyPositionReached" => Bundle {
            action: "readyPositionReached",
            phase: WinchPhase::Drilling,
            drills: true,
            rpm: 0.5,
            locked: false,
            sensor: Some(WinchSensor::RolledDown),
        },
        "stop" | "fullyRolledDown" => Bundle {
            action: "stop",
            phase: WinchPhase::RollingUp,
            drills: false,
            rpm: -0.5,
            locked: false,
            sensor: Some(WinchSensor::RolledUp),
        },
        "fullyRolledUp" => Bundle {
            action: "fullyRolledUp",
            phase: WinchPhase::RolledUp,
            drills: false,
            rpm: 0.0,
            locked: true,
            sensor: None,
        },
        _ => return None,
    };
    Some(bundle)
}

/// Winch sequencer.
#[derive(Debug, Clone)]
pub struct DrillWinch {
    layout: WinchLayout,
}

impl DrillWinch {
    pub fn new<G>(layout: WinchLayout, grid: &G) -> Result<Self, SetupError>
    where
        G: Grid + ?Sized,
    {
        expect_group(grid, RIG, &layout.hinge_group)?;
        expect_group(grid, RIG, &layout.drill_group)?;
        expect_block(grid, RIG, &layout.winch, "rotor or hinge", |k| k.is_stator())?;
        for sensor in WinchSensor::ALL {
            expect_block(grid, RIG, layout.sensor(sensor), "sensor", |k| {
                k == BlockKind::Sensor
            })?;
        }
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &WinchLayout {
        &self.layout
    }

    pub fn handle<L: RigLink + ?Sized>(&self, trigger: &str, link: &mut L) -> TriggerOutcome {
        if trigger == "status" {
            return self.status(link);
        }
        let Some(bundle) = bundle_for(trigger) else {
            CallBatch::new(link, self.layout.controller.as_str())
                .log(LogLevel::Error, format!("Invalid arg: {}", trigger));
            return TriggerOutcome::Rejected {
                trigger: trigger.to_string(),
            };
        };
        self.apply(&bundle, link)
    }

    fn apply<L: RigLink + ?Sized>(&self, bundle: &Bundle, link: &mut L) -> TriggerOutcome {
        let layout = &self.layout;
        let mut calls = CallBatch::new(link, format!("{}->{}", layout.controller, bundle.action));

        calls.send(
            "SetGroupEnabled",
            [layout.drill_group.clone(), bundle.drills.to_string()],
        );
        calls.send(
            "SetBlockVelocity",
            [layout.winch.clone(), bundle.rpm.to_string()],
        );
        calls.send("SetRotorLimit", [layout.winch.as_str(), "-361", "361"]);
        calls.send(
            "SetRotorLock",
            [layout.winch.clone(), bundle.locked.to_string()],
        );
        calls.send(
            "SetGroupRotorLock",
            [layout.hinge_group.clone(), bundle.locked.to_string()],
        );

        // Disable before enabling so two sensors are never on together.
        for sensor in WinchSensor::ALL {
            if Some(sensor) != bundle.sensor {
                calls.send("SetBlockEnabled", [layout.sensor(sensor), "false"]);
            }
        }
        if let Some(sensor) = bundle.sensor {
            calls.send("SetBlockEnabled", [layout.sensor(sensor), "true"]);
        }

        TriggerOutcome::Applied {
            phase: RigPhase::Winch(bundle.phase),
            failed_calls: calls.failed(),
        }
    }

    fn status<L: RigLink + ?Sized>(&self, link: &mut L) -> TriggerOutcome {
        let reading = self.measure(link.grid());
        let phase = classify_winch(&reading);
        CallBatch::new(link, format!("{}->status", self.layout.controller))
            .log(LogLevel::Info, format!("Phase: {}", phase));
        TriggerOutcome::Status {
            phase: RigPhase::Winch(phase),
        }
    }

    pub fn measure(&self, grid: &dyn Grid) -> WinchReading {
        let layout = &self.layout;
        let winch_locked = grid
            .block(&layout.winch)
            .and_then(|b| b.is_locked())
            .unwrap_or(false);
        let drills_on = any_enabled(grid, &layout.drill_group, BlockKind::Drill);
        let active_sensor = WinchSensor::ALL.into_iter().find(|sensor| {
            grid.block(layout.sensor(*sensor))
                .is_some_and(|b| b.is_enabled())
        });
        WinchReading {
            winch_locked,
            drills_on,
            active_sensor,
        }
    }
}
