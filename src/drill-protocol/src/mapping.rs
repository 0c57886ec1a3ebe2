// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Mapping between client DTOs and station commands and replies.

use drill_core::{StationCommand, StationReply, StationResult};

use crate::types::{ClientCommand, ClientResponse};

pub fn client_command_to_station(cmd: ClientCommand) -> StationCommand {
    match cmd {
        ClientCommand::Trigger { rig, trigger } => StationCommand::Trigger { rig, trigger },
        ClientCommand::Rpc { request } => StationCommand::Rpc { raw: request },
        ClientCommand::ReadLog => StationCommand::ReadLog,
        ClientCommand::ClearLog => StationCommand::ClearLog,
    }
}

/// A trigger that was absorbed by the sequencer still counts as success;
/// only station errors are reported as failures.
pub fn station_result_to_response(result: StationResult<StationReply>) -> ClientResponse {
    match result {
        Ok(reply) => ClientResponse {
            outcome: reply.outcome,
            log: reply.log,
            ..ClientResponse::ok()
        },
        Err(e) => ClientResponse::error(e.to_string()),
    }
}
