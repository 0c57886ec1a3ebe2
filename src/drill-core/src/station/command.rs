// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use crate::sequencer::RigKind;

/// Command handled by the station task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationCommand {
    /// Deliver a trigger string to one rig's sequencer.
    Trigger { rig: RigKind, trigger: String },
    /// Raw `caller;command;args...` request for the dispatcher.
    Rpc { raw: String },
    ReadLog,
    ClearLog,
}
