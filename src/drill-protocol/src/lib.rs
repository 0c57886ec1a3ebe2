// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! JSON line protocol spoken between remote clients and drill-server.
//!
//! Covers the transport DTOs, envelope parsing, token checks and the
//! mapping onto station commands.

pub mod auth;
pub mod codec;
pub mod mapping;
pub mod types;

pub use auth::{NoAuthValidator, SimpleTokenValidator, TokenValidator};
pub use codec::{encode_response, parse_envelope};
pub use mapping::{client_command_to_station, station_result_to_response};
pub use types::{ClientCommand, ClientEnvelope, ClientResponse};
