// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Simulation settings and the builder that lays out a grid for the
//! configured rigs, using the block names from their layouts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use drill_core::{PlatformLayout, RigKind, WinchLayout};

use crate::blocks::{SimDrill, SimPiston, SimSensor, SimStator, SimTimer, Threshold, TimerAction};
use crate::grid::{BuildError, SimGrid};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    /// Simulation step in milliseconds.
    pub tick_ms: u64,
    pub platform: PlatformSim,
    pub winch: WinchSim,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            platform: PlatformSim::default(),
            winch: WinchSim::default(),
        }
    }
}

impl GridSpec {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSim {
    pub piston_count: usize,
    /// Initial extension of each piston in meters.
    pub initial_position: f32,
    pub drill_count: usize,
    /// Delay of the timer that re-issues `start`.
    pub start_delay_ms: u64,
    /// Period of the timer that re-issues `stop` until the arm is at depth.
    pub stop_delay_ms: u64,
}

impl Default for PlatformSim {
    fn default() -> Self {
        Self {
            piston_count: 4,
            initial_position: 0.0,
            drill_count: 4,
            start_delay_ms: 5_000,
            stop_delay_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinchSim {
    pub hinge_count: usize,
    pub drill_count: usize,
    /// Winch angle at which the drill-ready sensor trips.
    pub drill_ready_angle: f32,
    /// Winch angle at which the rolled-down sensor trips.
    pub rolled_down_angle: f32,
}

impl Default for WinchSim {
    fn default() -> Self {
        Self {
            hinge_count: 2,
            drill_count: 2,
            drill_ready_angle: 90.0,
            rolled_down_angle: 360.0,
        }
    }
}

fn action(rig: RigKind, trigger: &str) -> TimerAction {
    TimerAction {
        rig,
        trigger: trigger.to_string(),
    }
}

fn numbered(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{} {}", prefix, i)).collect()
}

/// Add the platform blocks named by `layout`.
pub fn add_platform(grid: &mut SimGrid, sim: &PlatformSim, layout: &PlatformLayout) -> Result<(), BuildError> {
    let pistons = numbered(&layout.piston_group, sim.piston_count);
    for name in &pistons {
        grid.add_block(SimPiston::new(name.as_str(), sim.initial_position))?;
    }
    grid.add_group(&layout.piston_group, pistons)?;

    grid.add_block(SimStator::rotor(layout.rotor.as_str()))?;

    let drills = numbered(&layout.drill_group, sim.drill_count);
    for name in &drills {
        grid.add_block(SimDrill::new(name.as_str()))?;
    }
    grid.add_group(&layout.drill_group, drills)?;

    grid.add_block(SimTimer::new(
        layout.start_timer.as_str(),
        Duration::from_millis(sim.start_delay_ms),
        action(RigKind::Platform, "start"),
    ))?;
    grid.add_block(
        SimTimer::new(
            layout.stop_timer.as_str(),
            Duration::from_millis(sim.stop_delay_ms),
            action(RigKind::Platform, "stop"),
        )
        .repeating(),
    )?;
    Ok(())
}

/// Add the winch blocks named by `layout`. Sensors watch the winch angle.
pub fn add_winch(grid: &mut SimGrid, sim: &WinchSim, layout: &WinchLayout) -> Result<(), BuildError> {
    let hinges = numbered(&layout.hinge_group, sim.hinge_count);
    for name in &hinges {
        grid.add_block(SimStator::hinge(name.as_str()))?;
    }
    grid.add_group(&layout.hinge_group, hinges)?;

    let drills = numbered(&layout.drill_group, sim.drill_count);
    for name in &drills {
        grid.add_block(SimDrill::new(name.as_str()))?;
    }
    grid.add_group(&layout.drill_group, drills)?;

    let winch = layout.winch.as_str();
    grid.add_block(SimStator::rotor(winch))?;
    grid.add_block(SimSensor::new(layout.sensor_rolled_up.as_str()).watching(
        winch,
        Threshold::AtMost(0.0),
        action(RigKind::Winch, "fullyRolledUp"),
    ))?;
    grid.add_block(SimSensor::new(layout.sensor_drill_ready.as_str()).watching(
        winch,
        Threshold::AtLeast(sim.drill_ready_angle),
        action(RigKind::Winch, "readyPositionReached"),
    ))?;
    grid.add_block(SimSensor::new(layout.sensor_rolled_down.as_str()).watching(
        winch,
        Threshold::AtLeast(sim.rolled_down_angle),
        action(RigKind::Winch, "fullyRolledDown"),
    ))?;
    Ok(())
}

/// Build a grid holding the blocks of every given rig.
pub fn build_grid(
    spec: &GridSpec,
    platform: Option<&PlatformLayout>,
    winch: Option<&WinchLayout>,
) -> Result<SimGrid, BuildError> {
    let mut grid = SimGrid::new();
    if let Some(layout) = platform {
        add_platform(&mut grid, &spec.platform, layout)?;
    }
    if let Some(layout) = winch {
        add_winch(&mut grid, &spec.winch, layout)?;
    }
    Ok(grid)
}
