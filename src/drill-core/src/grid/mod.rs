// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Interfaces to the physical blocks of a grid.
//!
//! Name resolution and device behaviour are provided by the host; the core
//! only consumes lookups by name and the per-block capabilities below.

use serde::{Deserialize, Serialize};

pub mod sensing;

pub use sensing::{measure_extension, parse_extension};

/// Kind of physical block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Piston,
    Rotor,
    Hinge,
    Drill,
    Sensor,
    Timer,
}

impl BlockKind {
    /// Rotors and hinges share the stator capabilities (velocity, angle limits, lock).
    pub fn is_stator(&self) -> bool {
        matches!(self, Self::Rotor | Self::Hinge)
    }
}

/// Errors raised by grid lookups and block capabilities.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("block not found: {0}")]
    BlockNotFound(String),

    #[error("block group not found: {0}")]
    GroupNotFound(String),

    #[error("block {block} does not support {capability}")]
    Unsupported {
        block: String,
        capability: &'static str,
    },

    #[error("unreadable status text: {0:?}")]
    UnreadableStatus(String),
}

impl GridError {
    pub fn unsupported(block: &str, capability: &'static str) -> Self {
        Self::Unsupported {
            block: block.to_string(),
            capability,
        }
    }
}

/// A single addressable block.
///
/// Capabilities a block does not have keep the default implementation,
/// which reports `GridError::Unsupported`.
pub trait Block: Send {
    fn name(&self) -> &str;

    fn kind(&self) -> BlockKind;

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Free-form status text, e.g. `Current position: 2.5m` for pistons.
    fn status_text(&self) -> String;

    fn velocity(&self) -> Option<f32> {
        None
    }

    fn set_velocity(&mut self, _velocity: f32) -> Result<(), GridError> {
        Err(GridError::unsupported(self.name(), "velocity"))
    }

    /// Lower and upper limit (meters for pistons, degrees for stators).
    fn limits(&self) -> Option<(f32, f32)> {
        None
    }

    fn set_limits(&mut self, _lower: f32, _upper: f32) -> Result<(), GridError> {
        Err(GridError::unsupported(self.name(), "limits"))
    }

    fn is_locked(&self) -> Option<bool> {
        None
    }

    fn set_locked(&mut self, _locked: bool) -> Result<(), GridError> {
        Err(GridError::unsupported(self.name(), "lock"))
    }

    fn is_counting_down(&self) -> Option<bool> {
        None
    }

    fn start_countdown(&mut self) -> Result<(), GridError> {
        Err(GridError::unsupported(self.name(), "countdown"))
    }

    fn stop_countdown(&mut self) -> Result<(), GridError> {
        Err(GridError::unsupported(self.name(), "countdown"))
    }
}

/// Name-based access to the blocks and block groups of a grid.
pub trait Grid: Send {
    fn block(&self, name: &str) -> Option<&dyn Block>;

    fn block_mut(&mut self, name: &str) -> Option<&mut dyn Block>;

    /// Member names of a group, in grid order.
    fn group(&self, name: &str) -> Option<Vec<String>>;
}

/// Resolve a block or fail with `BlockNotFound`.
pub fn require_block<'g, G>(grid: &'g G, name: &str) -> Result<&'g dyn Block, GridError>
where
    G: Grid + ?Sized,
{
    grid.block(name)
        .ok_or_else(|| GridError::BlockNotFound(name.to_string()))
}

/// Resolve a block mutably or fail with `BlockNotFound`.
pub fn require_block_mut<'g, G>(grid: &'g mut G, name: &str) -> Result<&'g mut dyn Block, GridError>
where
    G: Grid + ?Sized,
{
    grid.block_mut(name)
        .ok_or_else(|| GridError::BlockNotFound(name.to_string()))
}

/// Names of the group members accepted by `filter`.
///
/// Membership is resolved on every call; members missing from the grid are skipped.
pub fn group_members<G, F>(grid: &G, group: &str, filter: F) -> Result<Vec<String>, GridError>
where
    G: Grid + ?Sized,
    F: Fn(&dyn Block) -> bool,
{
    let names = grid
        .group(group)
        .ok_or_else(|| GridError::GroupNotFound(group.to_string()))?;
    Ok(names
        .into_iter()
        .filter(|name| grid.block(name).map(&filter).unwrap_or(false))
        .collect())
}
