// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Common-functions dispatcher.
//!
//! Requests arrive as `caller;command;args...`. The command is resolved
//! case-insensitively against a fixed operation table, its arguments are
//! validated by the operation itself and the resulting command is applied
//! to the grid. Every failure is logged at ERROR and returned unchanged.

use std::collections::HashMap;

use crate::grid::{Grid, GridError};
use crate::log::{LogLevel, LogPolicy, LogSurface, Logger};
use crate::rpc::RpcRequest;

pub mod command;
pub mod executor;
pub mod operations;

pub use command::ActuatorCommand;
pub use executor::{execute, widen_rotor_limits, ROTOR_LIMIT_DEG};
pub use operations::{OperationDescriptor, OPERATIONS};

/// Failures raised by [`Dispatcher::dispatch`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("malformed request {raw:?}: expected '<caller>;<command>[;<args>...]'")]
    MalformedRequest { raw: String },

    /// `message` lists every registered operation with usage and example.
    #[error("{message}")]
    UnknownCommand { name: String, message: String },

    #[error("invalid usage of {command}: {reason}\n    usage: {usage}\n    example: {example}")]
    InvalidUsage {
        command: String,
        reason: String,
        usage: &'static str,
        example: &'static str,
    },

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("log surface error: {0}")]
    Surface(String),
}

/// Fixed registry of operations plus the log policy applied to every dispatch.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    operations: &'static [OperationDescriptor],
    index: HashMap<String, usize>,
    policy: LogPolicy,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(LogPolicy::default())
    }
}

impl Dispatcher {
    pub fn new(policy: LogPolicy) -> Self {
        let operations: &'static [OperationDescriptor] = &OPERATIONS;
        let index = operations
            .iter()
            .enumerate()
            .map(|(i, op)| (op.key(), i))
            .collect();
        Self {
            operations,
            index,
            policy,
        }
    }

    pub fn policy(&self) -> LogPolicy {
        self.policy
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&'static OperationDescriptor> {
        let operations = self.operations;
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&i| &operations[i])
    }

    pub fn operations(&self) -> &'static [OperationDescriptor] {
        self.operations
    }

    /// Diagnostic listing every registered operation, one per line.
    pub fn catalog(&self) -> String {
        self.operations
            .iter()
            .map(OperationDescriptor::catalog_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse, validate and execute one raw request.
    ///
    /// A request that applied cleanly but could not be written to the log
    /// surface fails with [`DispatchError::Surface`].
    pub fn dispatch(
        &self,
        raw: &str,
        grid: &mut dyn Grid,
        surface: &mut dyn LogSurface,
    ) -> Result<(), DispatchError> {
        let mut logger = Logger::new(surface, self.policy);
        let result = self.run(raw, grid, &mut logger);
        if let Err(e) = &result {
            logger.log(LogLevel::Error, &e.to_string());
        }
        match logger.take_persist_error() {
            Some(e) if result.is_ok() => Err(DispatchError::Surface(e.to_string())),
            _ => result,
        }
    }

    fn run(
        &self,
        raw: &str,
        grid: &mut dyn Grid,
        logger: &mut Logger<'_>,
    ) -> Result<(), DispatchError> {
        let request = RpcRequest::parse(raw).map_err(|_| DispatchError::MalformedRequest {
            raw: raw.to_string(),
        })?;
        logger.push_caller(request.caller.as_str());
        logger.log(LogLevel::Debug, "Split args for function calls");

        let Some(op) = self.lookup(&request.command) else {
            logger.log(
                LogLevel::Debug,
                &format!("Could not find function with name {}", request.command),
            );
            return Err(DispatchError::UnknownCommand {
                name: request.command.clone(),
                message: format!(
                    "Unknown function: {}\n    Possible functions and arguments:\n{}",
                    request.command,
                    self.catalog()
                ),
            });
        };

        logger.log(LogLevel::Debug, &format!("Executing {}", op.name));
        logger.push_caller(op.name);
        let cmd = op.parse(&request.args)?;
        execute(&cmd, grid, logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::mock::{MockBlock, MockGrid};
    use crate::grid::BlockKind;
    use crate::log::MemorySurface;

    fn rig() -> MockGrid {
        MockGrid::default()
            .with_block(MockBlock::new("R", BlockKind::Rotor))
            .with_block(MockBlock::piston("P1", 0.0))
            .with_block(MockBlock::piston("P2", 0.0))
            .with_group("Pistons", &["P1", "P2"])
            .with_group("Empty", &[])
    }

    #[test]
    fn test_well_formed_request_succeeds_and_logs() {
        let dispatcher = Dispatcher::default();
        let mut grid = rig();
        let mut surface = MemorySurface::new();

        dispatcher
            .dispatch("me;SetBlockVelocity;R;4", &mut grid, &mut surface)
            .unwrap();

        assert_eq!(grid.get("R").velocity, 4.0);
        let lines: Vec<&str> = surface.text().lines().collect();
        assert_eq!(
            lines,
            vec![
                "->me->SetBlockVelocity: [INFO]: Set R velocity to 4",
                "->me: [DEBUG]: Executing SetBlockVelocity",
                "->me: [DEBUG]: Split args for function calls",
            ]
        );
    }

    struct ReadOnlySurface;

    impl LogSurface for ReadOnlySurface {
        fn read(&self) -> std::io::Result<String> {
            Ok(String::new())
        }

        fn write(&mut self, _text: &str, _append: bool) -> std::io::Result<()> {
            Err(std::io::Error::other("panel is read-only"))
        }
    }

    #[test]
    fn test_unwritable_surface_fails_the_request() {
        let dispatcher = Dispatcher::default();
        let mut grid = rig();
        let err = dispatcher
            .dispatch("me;SetBlockVelocity;P1;0.5", &mut grid, &mut ReadOnlySurface)
            .unwrap_err();
        assert_eq!(err, DispatchError::Surface("panel is read-only".to_string()));
        assert_eq!(grid.get("P1").velocity, 0.5);

        let err = dispatcher
            .dispatch("me;Explode", &mut grid, &mut ReadOnlySurface)
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownCommand { .. }));
    }

    #[test]
    fn test_command_lookup_is_case_insensitive() {
        let dispatcher = Dispatcher::default();
        let mut grid = rig();
        let mut surface = MemorySurface::new();
        dispatcher
            .dispatch("me;setpistongroupvelocity;Pistons;0.5", &mut grid, &mut surface)
            .unwrap();
        assert_eq!(grid.get("P1").velocity, 0.5);
        assert_eq!(grid.get("P2").velocity, 0.5);
    }

    #[test]
    fn test_too_few_fields_is_malformed() {
        let dispatcher = Dispatcher::default();
        let mut grid = rig();
        for raw in ["", "justcaller"] {
            let mut surface = MemorySurface::new();
            let err = dispatcher.dispatch(raw, &mut grid, &mut surface).unwrap_err();
            assert!(matches!(err, DispatchError::MalformedRequest { .. }));
            assert!(surface.text().starts_with(": [ERROR]: malformed request"));
        }
    }

    #[test]
    fn test_unknown_command_lists_catalog() {
        let dispatcher = Dispatcher::default();
        let mut grid = rig();
        let mut surface = MemorySurface::new();

        let err = dispatcher
            .dispatch("me;Explode;now", &mut grid, &mut surface)
            .unwrap_err();

        let DispatchError::UnknownCommand { name, message } = &err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(name, "Explode");
        for op in dispatcher.operations() {
            assert!(message.contains(op.usage), "missing usage of {}", op.name);
            assert!(message.contains(op.example), "missing example of {}", op.name);
        }
        assert!(surface.text().starts_with("->me: [ERROR]: Unknown function: Explode"));
        assert!(surface
            .text()
            .contains("->me: [DEBUG]: Could not find function with name Explode"));
    }

    #[test]
    fn test_wrong_arity_is_raised_with_usage() {
        let dispatcher = Dispatcher::default();
        let mut grid = rig();
        let mut surface = MemorySurface::new();

        let err = dispatcher
            .dispatch("me;SetRotorLimit;R;1", &mut grid, &mut surface)
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::InvalidUsage {
                usage: "<rotorName>;<lowerLimit>;<upperLimit>",
                ..
            }
        ));
        assert!(surface
            .text()
            .starts_with("->me->SetRotorLimit: [ERROR]: invalid usage of SetRotorLimit"));
        assert_eq!(grid.get("R").limits, (0.0, 0.0));
    }

    #[test]
    fn test_empty_group_is_not_raised() {
        let dispatcher = Dispatcher::default();
        let mut grid = rig();
        let mut surface = MemorySurface::new();
        dispatcher
            .dispatch("me;SetPistonGroupVelocity;Empty;1.0", &mut grid, &mut surface)
            .unwrap();
        assert!(surface
            .text()
            .starts_with("->me->SetPistonGroupVelocity: [ERROR]: No pistons in group Empty"));
    }

    #[test]
    fn test_missing_block_is_raised() {
        let dispatcher = Dispatcher::default();
        let mut grid = rig();
        let mut surface = MemorySurface::new();
        let err = dispatcher
            .dispatch("me;SetBlockVelocity;Ghost;1", &mut grid, &mut surface)
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::Grid(GridError::BlockNotFound("Ghost".to_string()))
        );
    }

    #[test]
    fn test_rotor_limit_widening_through_dispatch() {
        let dispatcher = Dispatcher::default();
        let mut grid = rig();
        let mut surface = MemorySurface::new();
        dispatcher
            .dispatch("me;SetRotorLimit;R;-400;400", &mut grid, &mut surface)
            .unwrap();
        assert_eq!(grid.get("R").limits, (f32::MIN, f32::MAX));
        dispatcher
            .dispatch("me;SetRotorLimit;R;-100;100", &mut grid, &mut surface)
            .unwrap();
        assert_eq!(grid.get("R").limits, (-100.0, 100.0));
    }

    #[test]
    fn test_log_and_clear_log() {
        let dispatcher = Dispatcher::default();
        let mut grid = rig();
        let mut surface = MemorySurface::new();
        dispatcher
            .dispatch("me;Log;error;Something bad happened", &mut grid, &mut surface)
            .unwrap();
        assert!(surface
            .text()
            .starts_with("->me->Log: [ERROR]: Something bad happened"));

        dispatcher
            .dispatch("me;ClearLog", &mut grid, &mut surface)
            .unwrap();
        assert_eq!(surface.text(), "");
    }

    #[test]
    fn test_policy_filters_debug_entries() {
        let dispatcher = Dispatcher::new(LogPolicy {
            max_level: LogLevel::Info,
            max_lines: None,
        });
        let mut grid = rig();
        let mut surface = MemorySurface::new();
        dispatcher
            .dispatch("me;SetBlockVelocity;R;2", &mut grid, &mut surface)
            .unwrap();
        assert_eq!(
            surface.text(),
            "->me->SetBlockVelocity: [INFO]: Set R velocity to 2"
        );
    }
}
