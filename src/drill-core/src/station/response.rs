// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::Serialize;

use crate::dispatch::DispatchError;
use crate::sequencer::{RigKind, TriggerOutcome};

/// Successful answer to a [`super::StationCommand`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StationReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TriggerOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl StationReply {
    pub fn outcome(outcome: TriggerOutcome) -> Self {
        Self {
            outcome: Some(outcome),
            log: None,
        }
    }

    pub fn log(text: String) -> Self {
        Self {
            outcome: None,
            log: Some(text),
        }
    }
}

/// Error type returned by station requests.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StationError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("no {0} rig is configured")]
    RigNotConfigured(RigKind),

    #[error("log surface error: {0}")]
    Surface(String),

    #[error("station is not running")]
    Closed,
}

pub type StationResult<T> = Result<T, StationError>;
