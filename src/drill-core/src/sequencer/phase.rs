// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Phase inference for both rigs.
//!
//! Phases are never stored. Each trigger reads the grid and classifies it
//! here, so the rounding and comparison rules live in one place.

use std::fmt;

use serde::Serialize;

/// Range each piston contributes, in meters.
pub const UNIT_STROKE: f64 = 10.0;
/// Aggregate extension of the ready position, before rounding.
pub const READY_DEPTH: f64 = 10.0;
/// Aggregate drilling speed, split across the pistons.
pub const DRILL_SPEED: f64 = 0.5;
/// Aggregate positioning speed, split across the pistons.
pub const POSITIONING_SPEED: f64 = 1.0;

/// Round to one decimal place, ties to even.
///
/// Pistons only accept one decimal of precision.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Depth constants derived from the number of enabled pistons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepthProfile {
    pub unit_count: usize,
    pub max_depth: f64,
    pub ready_per_unit: f64,
    pub ready_extension: f64,
    pub drill_speed: f64,
    pub positioning_speed: f64,
}

impl DepthProfile {
    /// `None` for an empty piston set.
    ///
    /// The per-unit ready extension is rounded first and the aggregate is
    /// recomputed from the rounded value, so both agree after rounding.
    pub fn from_actuator_count(count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let n = count as f64;
        let ready_per_unit = round1(READY_DEPTH / n);
        Some(Self {
            unit_count: count,
            max_depth: UNIT_STROKE * n,
            ready_per_unit,
            ready_extension: round1(ready_per_unit * n),
            drill_speed: DRILL_SPEED / n,
            positioning_speed: POSITIONING_SPEED / n,
        })
    }

    /// Aggregate extension matches the ready position within one decimal.
    pub fn is_ready(&self, total: f64) -> bool {
        round1(total) == self.ready_extension
    }

    /// Aggregate extension is exactly at maximum depth.
    pub fn is_at_depth(&self, total: f64) -> bool {
        total == self.max_depth
    }

    pub fn describe(&self) -> String {
        format!(
            "\n  maxDepth              : {}\n  readyPosition         : {}\n  readyPositionPerPiston: {}\n  drillSpeed            : {}\n  positioningSpeed      : {}\n  pistonCount           : {}\n",
            self.max_depth,
            self.ready_extension,
            self.ready_per_unit,
            self.drill_speed,
            self.positioning_speed,
            self.unit_count
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformPhase {
    Transport,
    GettingReady,
    Ready,
    Drilling,
    Stopping,
}

impl fmt::Display for PlatformPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::GettingReady => "getting ready",
            Self::Ready => "ready",
            Self::Drilling => "drilling",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Observed platform state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformReading {
    /// Sum of enabled piston extensions.
    pub total: f64,
    /// Velocity of the piston group, 0 when unknown.
    pub velocity: f64,
    pub drills_on: bool,
}

pub fn classify_platform(profile: &DepthProfile, reading: &PlatformReading) -> PlatformPhase {
    if reading.drills_on {
        return if profile.is_at_depth(reading.total) {
            PlatformPhase::Stopping
        } else {
            PlatformPhase::Drilling
        };
    }
    if profile.is_ready(reading.total) {
        PlatformPhase::Ready
    } else if reading.total > profile.ready_extension {
        PlatformPhase::Stopping
    } else if round1(reading.total) == 0.0 || reading.velocity < 0.0 {
        PlatformPhase::Transport
    } else {
        PlatformPhase::GettingReady
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WinchPhase {
    RolledUp,
    RollingDown,
    ReadyAtDepth,
    Drilling,
    RollingUp,
}

impl fmt::Display for WinchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RolledUp => "rolled up",
            Self::RollingDown => "rolling down",
            Self::ReadyAtDepth => "ready at depth",
            Self::Drilling => "drilling",
            Self::RollingUp => "rolling up",
        };
        f.write_str(name)
    }
}

/// The three position sensors of the winch rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WinchSensor {
    RolledUp,
    RolledDown,
    DrillReady,
}

impl WinchSensor {
    pub const ALL: [WinchSensor; 3] = [Self::RolledUp, Self::RolledDown, Self::DrillReady];
}

/// Observed winch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinchReading {
    pub winch_locked: bool,
    pub drills_on: bool,
    /// First enabled sensor, if any.
    pub active_sensor: Option<WinchSensor>,
}

/// A rig with no active sensor is parked, whether or not the lock is engaged.
pub fn classify_winch(reading: &WinchReading) -> WinchPhase {
    match reading.active_sensor {
        Some(WinchSensor::DrillReady) => WinchPhase::RollingDown,
        Some(WinchSensor::RolledDown) if reading.drills_on => WinchPhase::Drilling,
        Some(WinchSensor::RolledDown) => WinchPhase::ReadyAtDepth,
        Some(WinchSensor::RolledUp) => WinchPhase::RollingUp,
        None => WinchPhase::RolledUp,
    }
}
