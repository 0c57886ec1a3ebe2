// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Rig sequencers.
//!
//! A sequencer reads the grid, infers the rig's phase and moves it on by
//! issuing RPC requests to the dispatcher. Precondition failures and bad
//! triggers are logged and absorbed; callers always get a [`TriggerOutcome`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dispatch::DispatchError;
use crate::grid::{require_block, BlockKind, Grid, GridError};
use crate::log::LogLevel;
use crate::rpc::RpcRequest;

pub mod phase;
pub mod platform;
pub mod winch;

pub use phase::{
    classify_platform, classify_winch, round1, DepthProfile, PlatformPhase, PlatformReading,
    WinchPhase, WinchReading, WinchSensor,
};
pub use platform::{DrillPlatform, PlatformLayout};
pub use winch::{DrillWinch, WinchLayout};

/// What a sequencer needs from its host.
pub trait RigLink {
    /// Read-only view used for measurements.
    fn grid(&self) -> &dyn Grid;

    /// Send one request to the dispatcher.
    fn call(&mut self, request: &RpcRequest) -> Result<(), DispatchError>;

    fn start_countdown(&mut self, timer: &str) -> Result<(), GridError>;

    fn stop_countdown(&mut self, timer: &str) -> Result<(), GridError>;
}

/// Rigs a station can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigKind {
    Platform,
    Winch,
}

impl fmt::Display for RigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platform => f.write_str("platform"),
            Self::Winch => f.write_str("winch"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RigPhase {
    Platform(PlatformPhase),
    Winch(WinchPhase),
}

impl fmt::Display for RigPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platform(phase) => fmt::Display::fmt(phase, f),
            Self::Winch(phase) => fmt::Display::fmt(phase, f),
        }
    }
}

/// Result of one trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// Transition issued. `failed_calls` counts requests the dispatcher refused.
    Applied { phase: RigPhase, failed_calls: usize },
    /// Precondition not met or measurement failed; nothing was changed.
    Aborted { reason: String },
    /// Trigger not recognised.
    Rejected { trigger: String },
    Status { phase: RigPhase },
}

/// Missing or unusable blocks found while building a sequencer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error("{rig}: missing block '{name}'")]
    MissingBlock { rig: &'static str, name: String },

    #[error("{rig}: missing group '{name}'")]
    MissingGroup { rig: &'static str, name: String },

    #[error("{rig}: block '{name}' is a {found:?}, expected {expected}")]
    WrongKind {
        rig: &'static str,
        name: String,
        found: BlockKind,
        expected: &'static str,
    },

    #[error("{rig}: no enabled pistons in group '{group}'")]
    NoPistons { rig: &'static str, group: String },
}

pub(crate) fn expect_block<G, F>(
    grid: &G,
    rig: &'static str,
    name: &str,
    expected: &'static str,
    accept: F,
) -> Result<(), SetupError>
where
    G: Grid + ?Sized,
    F: Fn(BlockKind) -> bool,
{
    let block = require_block(grid, name).map_err(|_| SetupError::MissingBlock {
        rig,
        name: name.to_string(),
    })?;
    if !accept(block.kind()) {
        return Err(SetupError::WrongKind {
            rig,
            name: name.to_string(),
            found: block.kind(),
            expected,
        });
    }
    Ok(())
}

pub(crate) fn expect_group<G>(grid: &G, rig: &'static str, name: &str) -> Result<Vec<String>, SetupError>
where
    G: Grid + ?Sized,
{
    grid.group(name).ok_or_else(|| SetupError::MissingGroup {
        rig,
        name: name.to_string(),
    })
}

/// Whether any member of `group` of the given kind is enabled.
pub(crate) fn any_enabled<G>(grid: &G, group: &str, kind: BlockKind) -> bool
where
    G: Grid + ?Sized,
{
    grid.group(group)
        .unwrap_or_default()
        .iter()
        .filter_map(|name| grid.block(name))
        .any(|b| b.kind() == kind && b.is_enabled())
}

/// Requests issued for one transition, all under the same caller id.
///
/// A refused request is logged by the dispatcher; the batch only counts it
/// and keeps going so the rest of the bundle is still applied.
pub(crate) struct CallBatch<'l, L: RigLink + ?Sized> {
    link: &'l mut L,
    caller: String,
    failed: usize,
}

impl<'l, L: RigLink + ?Sized> CallBatch<'l, L> {
    pub fn new(link: &'l mut L, caller: impl Into<String>) -> Self {
        Self {
            link,
            caller: caller.into(),
            failed: 0,
        }
    }

    pub fn send<I, S>(&mut self, command: &str, args: I)
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let request = match RpcRequest::new(self.caller.as_str(), command, args) {
            Ok(request) => request,
            Err(e) => {
                warn!("{}: request not sent: {}", self.caller, e);
                self.failed += 1;
                return;
            }
        };
        if let Err(e) = self.link.call(&request) {
            warn!("{}: {} refused: {}", self.caller, command, e);
            self.failed += 1;
        }
    }

    /// Log through the dispatcher. `;` in the message becomes `,` so the
    /// entry always fits in one request.
    pub fn log(&mut self, level: LogLevel, message: impl fmt::Display) {
        let message = message.to_string().replace(';', ",");
        self.send("Log", [level.as_str().to_string(), message]);
    }

    pub fn start_countdown(&mut self, timer: &str) {
        if let Err(e) = self.link.start_countdown(timer) {
            warn!("{}: failed to start {}: {}", self.caller, timer, e);
            self.failed += 1;
        }
    }

    pub fn stop_countdown(&mut self, timer: &str) {
        if let Err(e) = self.link.stop_countdown(timer) {
            warn!("{}: failed to stop {}: {}", self.caller, timer, e);
            self.failed += 1;
        }
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}
