// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Line codec for envelopes and responses.

use crate::types::{ClientEnvelope, ClientResponse};

/// Parse one JSON line into a ClientEnvelope. The token is optional.
pub fn parse_envelope(input: &str) -> Result<ClientEnvelope, serde_json::Error> {
    serde_json::from_str::<ClientEnvelope>(input.trim())
}

/// Serialize a response as a single newline-terminated line.
pub fn encode_response(response: &ClientResponse) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(response)? + "\n")
}
