// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Text RPC requests exchanged between controllers and the dispatcher.
//!
//! Wire format: `caller;command;arg1;arg2;...`. There is no escaping, so a
//! `;` can never appear inside a field. Outgoing requests are checked when
//! they are built instead of being split apart on the receiving side.

use std::fmt;

pub const FIELD_DELIMITER: char = ';';

/// Errors of the request wire format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("expected '<caller>;<command>[;<args>...]', got {raw:?}")]
    TooFewFields { raw: String },

    #[error("field {field:?} contains the reserved delimiter ';'")]
    Delimiter { field: String },
}

/// A parsed RPC request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest {
    pub caller: String,
    pub command: String,
    /// Raw arguments, passed through to the operation untouched.
    pub args: Vec<String>,
}

impl RpcRequest {
    /// Build an outgoing request, rejecting any field that contains `;`.
    pub fn new<I, S>(
        caller: impl Into<String>,
        command: impl Into<String>,
        args: I,
    ) -> Result<Self, ProtocolError>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let request = Self {
            caller: caller.into(),
            command: command.into(),
            args: args.into_iter().map(|a| a.to_string()).collect(),
        };
        for field in request.fields() {
            if field.contains(FIELD_DELIMITER) {
                return Err(ProtocolError::Delimiter {
                    field: field.to_string(),
                });
            }
        }
        Ok(request)
    }

    /// Split a raw request into caller, command and raw arguments.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let mut fields = raw.split(FIELD_DELIMITER);
        match (fields.next(), fields.next()) {
            (Some(caller), Some(command)) => Ok(Self {
                caller: caller.to_string(),
                command: command.to_string(),
                args: fields.map(str::to_string).collect(),
            }),
            _ => Err(ProtocolError::TooFewFields {
                raw: raw.to_string(),
            }),
        }
    }

    fn fields(&self) -> impl Iterator<Item = &str> {
        [self.caller.as_str(), self.command.as_str()]
            .into_iter()
            .chain(self.args.iter().map(String::as_str))
    }
}

impl fmt::Display for RpcRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for field in self.fields() {
            if !first {
                write!(f, "{}", FIELD_DELIMITER)?;
            }
            f.write_str(field)?;
            first = false;
        }
        Ok(())
    }
}
