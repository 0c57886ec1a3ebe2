// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use crate::log::LogLevel;

/// Validated operation invocation, produced from raw RPC arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCommand {
    SetBlockVelocity { block: String, velocity: f32 },
    SetRotorLimit { rotor: String, lower: f32, upper: f32 },
    SetPistonGroupVelocity { group: String, velocity: f32 },
    SetPistonGroupLimits { group: String, lower: f32, upper: f32 },
    Log { level: LogLevel, message: String },
    ClearLog,
    SetBlockEnabled { block: String, enabled: bool },
    SetGroupEnabled { group: String, enabled: bool },
    SetRotorLock { rotor: String, locked: bool },
    SetGroupRotorLock { group: String, locked: bool },
}
