// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tokio::sync::oneshot;

use super::{StationCommand, StationReply, StationResult};

/// Request sent to the station task.
#[derive(Debug)]
pub struct StationRequest {
    pub cmd: StationCommand,
    pub respond_to: oneshot::Sender<StationResult<StationReply>>,
}
