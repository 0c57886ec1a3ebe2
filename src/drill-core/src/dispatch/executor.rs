// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Applies validated commands to the grid.

use crate::grid::{group_members, require_block_mut, BlockKind, Grid, GridError};
use crate::log::{LogLevel, Logger};

use super::command::ActuatorCommand;
use super::DispatchError;

/// Angle beyond which a requested rotor bound means "unlimited".
pub const ROTOR_LIMIT_DEG: f32 = 360.0;

/// Widen out-of-range rotor bounds to the most permissive representable value.
///
/// A lower bound below -360° becomes `f32::MIN`, an upper bound above 360°
/// becomes `f32::MAX`; anything else is kept.
pub fn widen_rotor_limits(lower: f32, upper: f32) -> (f32, f32) {
    let lower = if lower < -ROTOR_LIMIT_DEG { f32::MIN } else { lower };
    let upper = if upper > ROTOR_LIMIT_DEG { f32::MAX } else { upper };
    (lower, upper)
}

pub fn execute(
    cmd: &ActuatorCommand,
    grid: &mut dyn Grid,
    logger: &mut Logger<'_>,
) -> Result<(), DispatchError> {
    match cmd {
        ActuatorCommand::SetBlockVelocity { block, velocity } => {
            require_block_mut(grid, block)?.set_velocity(*velocity)?;
            logger.log(
                LogLevel::Info,
                &format!("Set {} velocity to {}", block, velocity),
            );
        }
        ActuatorCommand::SetRotorLimit {
            rotor,
            lower,
            upper,
        } => {
            let target = require_block_mut(grid, rotor)?;
            if !target.kind().is_stator() {
                return Err(GridError::unsupported(rotor, "angle limits").into());
            }
            let (lower, upper) = widen_rotor_limits(*lower, *upper);
            target.set_limits(lower, upper)?;
            logger.log(
                LogLevel::Info,
                &format!("Set {} limits to {}..{}", rotor, lower, upper),
            );
        }
        ActuatorCommand::SetPistonGroupVelocity { group, velocity } => {
            let Some(pistons) = enabled_members(grid, logger, group, "pistons", |k| {
                k == BlockKind::Piston
            })?
            else {
                return Ok(());
            };
            for name in &pistons {
                require_block_mut(grid, name)?.set_velocity(*velocity)?;
            }
            logger.log(
                LogLevel::Info,
                &format!("{} new speed: {}", group, velocity),
            );
        }
        ActuatorCommand::SetPistonGroupLimits {
            group,
            lower,
            upper,
        } => {
            let Some(pistons) = enabled_members(grid, logger, group, "pistons", |k| {
                k == BlockKind::Piston
            })?
            else {
                return Ok(());
            };
            for name in &pistons {
                require_block_mut(grid, name)?.set_limits(*lower, *upper)?;
            }
            logger.log(
                LogLevel::Info,
                &format!("{} new limit: {}-{}", group, lower, upper),
            );
        }
        ActuatorCommand::Log { level, message } => {
            logger.log(*level, message);
        }
        ActuatorCommand::ClearLog => {
            logger
                .clear()
                .map_err(|e| DispatchError::Surface(e.to_string()))?;
        }
        ActuatorCommand::SetBlockEnabled { block, enabled } => {
            require_block_mut(grid, block)?.set_enabled(*enabled);
            logger.log(
                LogLevel::Info,
                &format!("{} enabled: {}", block, enabled),
            );
        }
        ActuatorCommand::SetGroupEnabled { group, enabled } => {
            // Disabled members must be reachable, otherwise nothing could be re-enabled.
            let members = group_members(grid, group, |_| true)?;
            if members.is_empty() {
                logger.log(LogLevel::Error, &format!("No blocks in group {}", group));
                return Ok(());
            }
            for name in &members {
                require_block_mut(grid, name)?.set_enabled(*enabled);
            }
            logger.log(
                LogLevel::Info,
                &format!("{} enabled: {}", group, enabled),
            );
        }
        ActuatorCommand::SetRotorLock { rotor, locked } => {
            require_block_mut(grid, rotor)?.set_locked(*locked)?;
            logger.log(LogLevel::Info, &format!("{} locked: {}", rotor, locked));
        }
        ActuatorCommand::SetGroupRotorLock { group, locked } => {
            let Some(rotors) =
                enabled_members(grid, logger, group, "rotors", |k| k.is_stator())?
            else {
                return Ok(());
            };
            for name in &rotors {
                require_block_mut(grid, name)?.set_locked(*locked)?;
            }
            logger.log(LogLevel::Info, &format!("{} locked: {}", group, locked));
        }
    }
    Ok(())
}

/// Enabled group members of the accepted kinds, or `None` after logging an
/// error when there are none. An empty group is reported, not raised.
fn enabled_members<F>(
    grid: &dyn Grid,
    logger: &mut Logger<'_>,
    group: &str,
    noun: &str,
    accept: F,
) -> Result<Option<Vec<String>>, DispatchError>
where
    F: Fn(BlockKind) -> bool,
{
    logger.log(LogLevel::Debug, &format!("Looking for group {}", group));
    let members = group_members(grid, group, |b| accept(b.kind()) && b.is_enabled())?;
    logger.log(LogLevel::Debug, "Found group");
    if members.is_empty() {
        logger.log(LogLevel::Error, &format!("No {} in group {}", noun, group));
        return Ok(None);
    }
    Ok(Some(members))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::mock::{MockBlock, MockGrid};
    use crate::log::{LogPolicy, MemorySurface};

    fn rig() -> MockGrid {
        let mut off = MockBlock::piston("P3", 0.0);
        off.enabled = false;
        let mut drill_off = MockBlock::new("D2", BlockKind::Drill);
        drill_off.enabled = false;
        MockGrid::default()
            .with_block(MockBlock::piston("P1", 0.0))
            .with_block(MockBlock::piston("P2", 0.0))
            .with_block(off)
            .with_block(MockBlock::new("R", BlockKind::Rotor))
            .with_block(MockBlock::new("H", BlockKind::Hinge))
            .with_block(MockBlock::new("D1", BlockKind::Drill))
            .with_block(drill_off)
            .with_group("Pistons", &["P1", "P2", "P3"])
            .with_group("Drills", &["D1", "D2"])
            .with_group("Hinges", &["H"])
            .with_group("Empty", &["P3"])
    }

    fn run(grid: &mut MockGrid, cmd: ActuatorCommand) -> (Result<(), DispatchError>, String) {
        let mut surface = MemorySurface::new();
        let result = {
            let mut logger = Logger::new(&mut surface, LogPolicy::default());
            execute(&cmd, grid, &mut logger)
        };
        (result, surface.text().to_string())
    }

    #[test]
    fn test_widen_rotor_limits() {
        assert_eq!(widen_rotor_limits(-400.0, 400.0), (f32::MIN, f32::MAX));
        assert_eq!(widen_rotor_limits(-100.0, 100.0), (-100.0, 100.0));
        assert_eq!(widen_rotor_limits(-360.0, 360.0), (-360.0, 360.0));
        assert_eq!(widen_rotor_limits(-361.0, 361.0), (f32::MIN, f32::MAX));
    }

    #[test]
    fn test_set_rotor_limit_applies_widening() {
        let mut grid = rig();
        let (result, _) = run(
            &mut grid,
            ActuatorCommand::SetRotorLimit {
                rotor: "R".into(),
                lower: -400.0,
                upper: 400.0,
            },
        );
        result.unwrap();
        assert_eq!(grid.get("R").limits, (f32::MIN, f32::MAX));
    }

    #[test]
    fn test_set_rotor_limit_rejects_pistons() {
        let mut grid = rig();
        let (result, _) = run(
            &mut grid,
            ActuatorCommand::SetRotorLimit {
                rotor: "P1".into(),
                lower: 0.0,
                upper: 1.0,
            },
        );
        assert!(matches!(result, Err(DispatchError::Grid(_))));
    }

    #[test]
    fn test_group_velocity_only_touches_enabled_pistons() {
        let mut grid = rig();
        let (result, log) = run(
            &mut grid,
            ActuatorCommand::SetPistonGroupVelocity {
                group: "Pistons".into(),
                velocity: 0.25,
            },
        );
        result.unwrap();
        assert_eq!(grid.get("P1").velocity, 0.25);
        assert_eq!(grid.get("P2").velocity, 0.25);
        assert_eq!(grid.get("P3").velocity, 0.0);
        assert!(log.starts_with(": [INFO]: Pistons new speed: 0.25"));
    }

    #[test]
    fn test_empty_group_is_logged_not_raised() {
        let mut grid = rig();
        let (result, log) = run(
            &mut grid,
            ActuatorCommand::SetPistonGroupVelocity {
                group: "Empty".into(),
                velocity: 1.0,
            },
        );
        assert!(result.is_ok());
        assert!(log.starts_with(": [ERROR]: No pistons in group Empty"));
    }

    #[test]
    fn test_group_limits_set_both_bounds() {
        let mut grid = rig();
        let (result, _) = run(
            &mut grid,
            ActuatorCommand::SetPistonGroupLimits {
                group: "Pistons".into(),
                lower: 2.5,
                upper: 2.5,
            },
        );
        result.unwrap();
        assert_eq!(grid.get("P1").limits, (2.5, 2.5));
        assert_eq!(grid.get("P3").limits, (0.0, 0.0));
    }

    #[test]
    fn test_missing_group_is_an_error() {
        let mut grid = rig();
        let (result, _) = run(
            &mut grid,
            ActuatorCommand::SetPistonGroupLimits {
                group: "Nope".into(),
                lower: 0.0,
                upper: 0.0,
            },
        );
        assert!(matches!(
            result,
            Err(DispatchError::Grid(GridError::GroupNotFound(_)))
        ));
    }

    #[test]
    fn test_group_enable_reaches_disabled_members() {
        let mut grid = rig();
        let (result, _) = run(
            &mut grid,
            ActuatorCommand::SetGroupEnabled {
                group: "Drills".into(),
                enabled: true,
            },
        );
        result.unwrap();
        assert!(grid.get("D1").enabled);
        assert!(grid.get("D2").enabled);
    }

    #[test]
    fn test_locks() {
        let mut grid = rig();
        run(
            &mut grid,
            ActuatorCommand::SetGroupRotorLock {
                group: "Hinges".into(),
                locked: true,
            },
        )
        .0
        .unwrap();
        run(
            &mut grid,
            ActuatorCommand::SetRotorLock {
                rotor: "R".into(),
                locked: true,
            },
        )
        .0
        .unwrap();
        assert!(grid.get("H").locked);
        assert!(grid.get("R").locked);
    }
}
