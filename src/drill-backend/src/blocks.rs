// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Simulated blocks.
//!
//! Motion is integrated in [`SimBlock::advance`]; everything else is plain
//! state. There is no inertia and no load.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use drill_core::{Block, BlockKind, GridError, RigKind};

/// Stroke of a single piston in meters.
pub const PISTON_STROKE: f32 = 10.0;

/// Trigger delivered to a rig when a timer expires or a sensor trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerAction {
    pub rig: RigKind,
    pub trigger: String,
}

/// An action fired by a block during [`SimBlock::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridEvent {
    pub source: String,
    pub action: TimerAction,
}

/// A block that takes part in the simulation step.
pub trait SimBlock: Block {
    /// Integrate motion over `dt`. Returns an action when a countdown expires.
    fn advance(&mut self, _dt: Duration) -> Option<TimerAction> {
        None
    }

    /// Extension for pistons, angle for stators.
    fn position(&self) -> Option<f32> {
        None
    }

    fn as_block(&self) -> &dyn Block;

    fn as_block_mut(&mut self) -> &mut dyn Block;

    /// Sensors only: watch a position and report whether it trips.
    fn sense(&mut self, _position: Option<f32>) -> Option<TimerAction> {
        None
    }

    /// Name of the block a sensor watches.
    fn watched(&self) -> Option<&str> {
        None
    }
}

macro_rules! impl_as_block {
    () => {
        fn as_block(&self) -> &dyn Block {
            self
        }

        fn as_block_mut(&mut self) -> &mut dyn Block {
            self
        }
    };
}

/// Move `position` toward the limit in the direction of travel.
fn travel(position: f32, velocity: f32, dt: f32, lower: f32, upper: f32) -> f32 {
    if velocity > 0.0 && position < upper {
        (position + velocity * dt).min(upper)
    } else if velocity < 0.0 && position > lower {
        (position + velocity * dt).max(lower)
    } else {
        position
    }
}

#[derive(Debug, Clone)]
pub struct SimPiston {
    name: String,
    enabled: bool,
    position: f32,
    velocity: f32,
    limits: (f32, f32),
}

impl SimPiston {
    pub fn new(name: impl Into<String>, position: f32) -> Self {
        let position = position.clamp(0.0, PISTON_STROKE);
        Self {
            name: name.into(),
            enabled: true,
            position,
            velocity: 0.0,
            limits: (0.0, PISTON_STROKE),
        }
    }
}

impl Block for SimPiston {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Piston
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn status_text(&self) -> String {
        format!("Current position: {:.1}m", self.position)
    }

    fn velocity(&self) -> Option<f32> {
        Some(self.velocity)
    }

    fn set_velocity(&mut self, velocity: f32) -> Result<(), GridError> {
        self.velocity = velocity;
        Ok(())
    }

    fn limits(&self) -> Option<(f32, f32)> {
        Some(self.limits)
    }

    fn set_limits(&mut self, lower: f32, upper: f32) -> Result<(), GridError> {
        let lower = lower.clamp(0.0, PISTON_STROKE);
        let upper = upper.clamp(0.0, PISTON_STROKE);
        self.limits = (lower.min(upper), upper.max(lower));
        Ok(())
    }
}

impl SimBlock for SimPiston {
    impl_as_block!();

    fn advance(&mut self, dt: Duration) -> Option<TimerAction> {
        if self.enabled {
            let (lower, upper) = self.limits;
            self.position = travel(self.position, self.velocity, dt.as_secs_f32(), lower, upper);
        }
        None
    }

    fn position(&self) -> Option<f32> {
        Some(self.position)
    }
}

/// Rotor or hinge. Velocity is in RPM, angle and limits in degrees.
#[derive(Debug, Clone)]
pub struct SimStator {
    name: String,
    kind: BlockKind,
    enabled: bool,
    angle: f32,
    rpm: f32,
    limits: (f32, f32),
    locked: bool,
}

impl SimStator {
    pub fn rotor(name: impl Into<String>) -> Self {
        Self::new(name, BlockKind::Rotor)
    }

    pub fn hinge(name: impl Into<String>) -> Self {
        Self::new(name, BlockKind::Hinge)
    }

    fn new(name: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            name: name.into(),
            kind,
            enabled: true,
            angle: 0.0,
            rpm: 0.0,
            limits: (f32::MIN, f32::MAX),
            locked: false,
        }
    }
}

impl Block for SimStator {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BlockKind {
        self.kind
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn status_text(&self) -> String {
        format!("Current angle: {:.0}°", self.angle)
    }

    fn velocity(&self) -> Option<f32> {
        Some(self.rpm)
    }

    fn set_velocity(&mut self, velocity: f32) -> Result<(), GridError> {
        self.rpm = velocity;
        Ok(())
    }

    fn limits(&self) -> Option<(f32, f32)> {
        Some(self.limits)
    }

    fn set_limits(&mut self, lower: f32, upper: f32) -> Result<(), GridError> {
        self.limits = (lower, upper);
        Ok(())
    }

    fn is_locked(&self) -> Option<bool> {
        Some(self.locked)
    }

    fn set_locked(&mut self, locked: bool) -> Result<(), GridError> {
        self.locked = locked;
        Ok(())
    }
}

impl SimBlock for SimStator {
    impl_as_block!();

    fn advance(&mut self, dt: Duration) -> Option<TimerAction> {
        if self.enabled && !self.locked {
            let (lower, upper) = self.limits;
            let deg_per_sec = self.rpm * 6.0;
            self.angle = travel(self.angle, deg_per_sec, dt.as_secs_f32(), lower, upper);
        }
        None
    }

    fn position(&self) -> Option<f32> {
        Some(self.angle)
    }
}

#[derive(Debug, Clone)]
pub struct SimDrill {
    name: String,
    enabled: bool,
}

impl SimDrill {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: false,
        }
    }
}

impl Block for SimDrill {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Drill
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn status_text(&self) -> String {
        let text = if self.enabled { "Drilling" } else { "Idle" };
        text.to_string()
    }
}

impl SimBlock for SimDrill {
    impl_as_block!();
}

/// Position the sensor trips at, on a watched block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    AtLeast(f32),
    AtMost(f32),
}

impl Threshold {
    pub fn reached(&self, position: f32) -> bool {
        match *self {
            Self::AtLeast(limit) => position >= limit,
            Self::AtMost(limit) => position <= limit,
        }
    }
}

/// Proximity sensor. Fires its action once per approach while enabled.
#[derive(Debug, Clone)]
pub struct SimSensor {
    name: String,
    enabled: bool,
    watch: Option<(String, Threshold)>,
    action: Option<TimerAction>,
    tripped: bool,
}

impl SimSensor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: false,
            watch: None,
            action: None,
            tripped: false,
        }
    }

    pub fn watching(mut self, block: impl Into<String>, threshold: Threshold, action: TimerAction) -> Self {
        self.watch = Some((block.into(), threshold));
        self.action = Some(action);
        self
    }
}

impl Block for SimSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Sensor
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.tripped = false;
        }
    }

    fn status_text(&self) -> String {
        let text = if self.tripped { "Detected" } else { "Clear" };
        text.to_string()
    }
}

impl SimBlock for SimSensor {
    impl_as_block!();

    fn watched(&self) -> Option<&str> {
        self.watch.as_ref().map(|(block, _)| block.as_str())
    }

    fn sense(&mut self, position: Option<f32>) -> Option<TimerAction> {
        let (Some((_, threshold)), Some(position)) = (&self.watch, position) else {
            return None;
        };
        let reached = self.enabled && threshold.reached(position);
        let fire = reached && !self.tripped;
        self.tripped = reached;
        if fire {
            self.action.clone()
        } else {
            None
        }
    }
}

/// Countdown timer. A repeating timer re-arms itself after firing.
#[derive(Debug, Clone)]
pub struct SimTimer {
    name: String,
    enabled: bool,
    delay: Duration,
    repeat: bool,
    action: TimerAction,
    remaining: Option<Duration>,
}

impl SimTimer {
    pub fn new(name: impl Into<String>, delay: Duration, action: TimerAction) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            delay,
            repeat: false,
            action,
            remaining: None,
        }
    }

    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.remaining
    }
}

impl Block for SimTimer {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Timer
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn status_text(&self) -> String {
        match self.remaining {
            Some(left) => format!("Counting down: {:.1}s", left.as_secs_f32()),
            None => "Stopped".to_string(),
        }
    }

    fn is_counting_down(&self) -> Option<bool> {
        Some(self.remaining.is_some())
    }

    fn start_countdown(&mut self) -> Result<(), GridError> {
        self.remaining = Some(self.delay);
        Ok(())
    }

    fn stop_countdown(&mut self) -> Result<(), GridError> {
        self.remaining = None;
        Ok(())
    }
}

impl SimBlock for SimTimer {
    impl_as_block!();

    fn advance(&mut self, dt: Duration) -> Option<TimerAction> {
        if !self.enabled {
            return None;
        }
        let left = self.remaining?;
        if left > dt {
            self.remaining = Some(left - dt);
            return None;
        }
        self.remaining = self.repeat.then_some(self.delay);
        Some(self.action.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(trigger: &str) -> TimerAction {
        TimerAction {
            rig: RigKind::Platform,
            trigger: trigger.to_string(),
        }
    }

    #[test]
    fn test_piston_moves_to_limit() {
        let mut piston = SimPiston::new("P", 0.0);
        piston.set_limits(2.5, 2.5).unwrap();
        piston.set_velocity(1.0).unwrap();
        piston.advance(Duration::from_secs(2));
        assert_eq!(piston.status_text(), "Current position: 2.0m");
        piston.advance(Duration::from_secs(2));
        assert_eq!(piston.status_text(), "Current position: 2.5m");
    }

    #[test]
    fn test_piston_limits_stay_within_stroke() {
        let mut piston = SimPiston::new("P", 0.0);
        piston.set_limits(-5.0, 40.0).unwrap();
        assert_eq!(piston.limits(), Some((0.0, PISTON_STROKE)));
    }

    #[test]
    fn test_locked_stator_does_not_move() {
        let mut winch = SimStator::rotor("W");
        winch.set_velocity(1.0).unwrap();
        winch.set_locked(true).unwrap();
        winch.advance(Duration::from_secs(1));
        assert_eq!(winch.position(), Some(0.0));
        winch.set_locked(false).unwrap();
        winch.advance(Duration::from_secs(1));
        assert_eq!(winch.position(), Some(6.0));
    }

    #[test]
    fn test_timer_fires_once_unless_repeating() {
        let mut once = SimTimer::new("T", Duration::from_secs(1), action("start"));
        once.start_countdown().unwrap();
        assert_eq!(once.advance(Duration::from_millis(600)), None);
        assert_eq!(once.advance(Duration::from_millis(600)), Some(action("start")));
        assert_eq!(once.is_counting_down(), Some(false));

        let mut again = SimTimer::new("T", Duration::from_secs(1), action("stop")).repeating();
        again.start_countdown().unwrap();
        assert!(again.advance(Duration::from_secs(1)).is_some());
        assert_eq!(again.is_counting_down(), Some(true));
    }

    #[test]
    fn test_sensor_fires_on_approach_only_when_enabled() {
        let mut sensor =
            SimSensor::new("S").watching("W", Threshold::AtLeast(90.0), action("readyPositionReached"));
        assert_eq!(sensor.sense(Some(100.0)), None);

        sensor.set_enabled(true);
        assert!(sensor.sense(Some(100.0)).is_some());
        assert_eq!(sensor.sense(Some(120.0)), None);
        assert_eq!(sensor.sense(Some(10.0)), None);
        assert!(sensor.sense(Some(95.0)).is_some());
    }
}
