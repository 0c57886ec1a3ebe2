// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Transport DTOs for the JSON line protocol.

use serde::{Deserialize, Serialize};

use drill_core::{RigKind, TriggerOutcome};

/// Command received from network clients (JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Deliver a trigger string to one rig's sequencer.
    Trigger { rig: RigKind, trigger: String },
    /// Raw `caller;command;args...` request for the dispatcher.
    Rpc { request: String },
    ReadLog,
    ClearLog,
}

/// Envelope for client commands with optional authentication token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEnvelope {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(flatten)]
    pub cmd: ClientCommand,
}

/// Response sent to network clients over TCP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TriggerOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    pub error: Option<String>,
}

impl ClientResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            outcome: None,
            log: None,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            outcome: None,
            log: None,
            error: Some(message.into()),
        }
    }
}
