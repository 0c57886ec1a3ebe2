// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod dispatch;
pub mod grid;
pub mod log;
pub mod rpc;
pub mod sequencer;
pub mod station;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use dispatch::{Dispatcher, DispatchError};
pub use grid::{Block, BlockKind, Grid, GridError};
pub use log::{LogLevel, LogPolicy, LogSurface, Logger, MemorySurface};
pub use rpc::{ProtocolError, RpcRequest};
pub use sequencer::{
    DrillPlatform, DrillWinch, PlatformLayout, RigKind, RigLink, RigPhase, SetupError,
    TriggerOutcome, WinchLayout,
};
pub use station::{
    Station, StationCommand, StationError, StationReply, StationRequest, StationResult,
};
