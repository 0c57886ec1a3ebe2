// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The fixed table of operations the dispatcher exposes.
//!
//! Each descriptor owns its argument contract: a fixed arity and a parser
//! turning the raw string arguments into an [`ActuatorCommand`].

use super::command::ActuatorCommand;
use super::DispatchError;
use crate::log::LogLevel;

type ArgParser = fn(&[String]) -> Result<ActuatorCommand, String>;

/// Static description of a registered operation.
#[derive(Debug)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub usage: &'static str,
    pub example: &'static str,
    pub arity: usize,
    parse: ArgParser,
}

impl OperationDescriptor {
    /// Registry key; lookups are case-insensitive.
    pub fn key(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// Check arity and parse the raw arguments.
    pub fn parse(&self, args: &[String]) -> Result<ActuatorCommand, DispatchError> {
        if args.len() != self.arity {
            return Err(self.invalid_usage(format!(
                "expected {} argument(s), got {}",
                self.arity,
                args.len()
            )));
        }
        (self.parse)(args).map_err(|reason| self.invalid_usage(reason))
    }

    /// One line of the unknown-command diagnostic.
    pub fn catalog_line(&self) -> String {
        format!("    {}: {} | {}", self.name, self.usage, self.example)
    }

    fn invalid_usage(&self, reason: String) -> DispatchError {
        DispatchError::InvalidUsage {
            command: self.name.to_string(),
            reason,
            usage: self.usage,
            example: self.example,
        }
    }
}

pub static OPERATIONS: [OperationDescriptor; 10] = [
    OperationDescriptor {
        name: "SetBlockVelocity",
        usage: "<blockName>;<newVelocity>",
        example: "My super rotor;4",
        arity: 2,
        parse: |args| {
            Ok(ActuatorCommand::SetBlockVelocity {
                block: args[0].clone(),
                velocity: parse_f32(&args[1])?,
            })
        },
    },
    OperationDescriptor {
        name: "SetRotorLimit",
        usage: "<rotorName>;<lowerLimit>;<upperLimit>",
        example: "superRotor;15;22",
        arity: 3,
        parse: |args| {
            Ok(ActuatorCommand::SetRotorLimit {
                rotor: args[0].clone(),
                lower: parse_f32(&args[1])?,
                upper: parse_f32(&args[2])?,
            })
        },
    },
    OperationDescriptor {
        name: "SetPistonGroupVelocity",
        usage: "<pistonGroupName>;<newSpeed>",
        example: "My Pistons;3.5",
        arity: 2,
        parse: |args| {
            Ok(ActuatorCommand::SetPistonGroupVelocity {
                group: args[0].clone(),
                velocity: parse_f32(&args[1])?,
            })
        },
    },
    OperationDescriptor {
        name: "SetPistonGroupLimits",
        usage: "<pistonGroupName>;<lowerLimit>;<upperLimit>",
        example: "My Pistons;3.5;4.5",
        arity: 3,
        parse: |args| {
            Ok(ActuatorCommand::SetPistonGroupLimits {
                group: args[0].clone(),
                lower: parse_f32(&args[1])?,
                upper: parse_f32(&args[2])?,
            })
        },
    },
    OperationDescriptor {
        name: "Log",
        usage: "<logLevel>;<logMessage>",
        example: "ERROR;Something bad happened",
        arity: 2,
        parse: |args| {
            let level = args[0].parse::<LogLevel>().map_err(|e| e.to_string())?;
            Ok(ActuatorCommand::Log {
                level,
                message: args[1].clone(),
            })
        },
    },
    OperationDescriptor {
        name: "ClearLog",
        usage: "(no arguments)",
        example: "(no arguments)",
        arity: 0,
        parse: |_| Ok(ActuatorCommand::ClearLog),
    },
    OperationDescriptor {
        name: "SetBlockEnabled",
        usage: "<blockName>;<true|false>",
        example: "Sensor Drill Ready;true",
        arity: 2,
        parse: |args| {
            Ok(ActuatorCommand::SetBlockEnabled {
                block: args[0].clone(),
                enabled: parse_bool(&args[1])?,
            })
        },
    },
    OperationDescriptor {
        name: "SetGroupEnabled",
        usage: "<groupName>;<true|false>",
        example: "DT Drills;false",
        arity: 2,
        parse: |args| {
            Ok(ActuatorCommand::SetGroupEnabled {
                group: args[0].clone(),
                enabled: parse_bool(&args[1])?,
            })
        },
    },
    OperationDescriptor {
        name: "SetRotorLock",
        usage: "<rotorName>;<true|false>",
        example: "Drill Winch;true",
        arity: 2,
        parse: |args| {
            Ok(ActuatorCommand::SetRotorLock {
                rotor: args[0].clone(),
                locked: parse_bool(&args[1])?,
            })
        },
    },
    OperationDescriptor {
        name: "SetGroupRotorLock",
        usage: "<groupName>;<true|false>",
        example: "Drill Hinges;false",
        arity: 2,
        parse: |args| {
            Ok(ActuatorCommand::SetGroupRotorLock {
                group: args[0].clone(),
                locked: parse_bool(&args[1])?,
            })
        },
    },
];

fn parse_f32(raw: &str) -> Result<f32, String> {
    raw.trim()
        .parse::<f32>()
        .map_err(|_| format!("'{}' is not a number", raw))
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        _ => Err(format!("'{}' is not a boolean", raw)),
    }
}
