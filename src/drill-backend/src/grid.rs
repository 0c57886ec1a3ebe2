// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use drill_core::{Block, Grid};

use crate::blocks::{GridEvent, SimBlock};

/// Errors raised while assembling a grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("duplicate block name '{0}'")]
    DuplicateBlock(String),

    #[error("duplicate group name '{0}'")]
    DuplicateGroup(String),

    #[error("group '{group}' references unknown block '{block}'")]
    UnknownMember { group: String, block: String },
}

/// In-memory grid of simulated blocks.
#[derive(Default)]
pub struct SimGrid {
    blocks: Vec<Box<dyn SimBlock>>,
    index: HashMap<String, usize>,
    groups: HashMap<String, Vec<String>>,
}

impl SimGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block<B: SimBlock + 'static>(&mut self, block: B) -> Result<(), BuildError> {
        let name = block.name().to_string();
        if self.index.contains_key(&name) {
            return Err(BuildError::DuplicateBlock(name));
        }
        self.index.insert(name, self.blocks.len());
        self.blocks.push(Box::new(block));
        Ok(())
    }

    pub fn add_group<I, S>(&mut self, name: &str, members: I) -> Result<(), BuildError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.groups.contains_key(name) {
            return Err(BuildError::DuplicateGroup(name.to_string()));
        }
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        if let Some(block) = members.iter().find(|m| !self.index.contains_key(*m)) {
            return Err(BuildError::UnknownMember {
                group: name.to_string(),
                block: block.clone(),
            });
        }
        self.groups.insert(name.to_string(), members);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Position of a piston or stator.
    pub fn position(&self, name: &str) -> Option<f32> {
        self.index
            .get(name)
            .and_then(|&i| self.blocks[i].position())
    }

    /// Move every block by `dt`, then evaluate sensors against the new positions.
    /// Returns the actions fired by timers and sensors, in block order.
    pub fn advance(&mut self, dt: Duration) -> Vec<GridEvent> {
        let mut events = Vec::new();
        for block in &mut self.blocks {
            if let Some(action) = block.advance(dt) {
                events.push(GridEvent {
                    source: block.name().to_string(),
                    action,
                });
            }
        }

        for i in 0..self.blocks.len() {
            let Some(watched) = self.blocks[i].watched() else {
                continue;
            };
            let position = self.position(watched);
            let sensor = &mut self.blocks[i];
            if let Some(action) = sensor.sense(position) {
                events.push(GridEvent {
                    source: sensor.name().to_string(),
                    action,
                });
            }
        }

        for event in &events {
            debug!(
                "{} fired {} for {}",
                event.source, event.action.trigger, event.action.rig
            );
        }
        events
    }
}

impl Grid for SimGrid {
    fn block(&self, name: &str) -> Option<&dyn Block> {
        let &i = self.index.get(name)?;
        Some(self.blocks[i].as_block())
    }

    fn block_mut(&mut self, name: &str) -> Option<&mut dyn Block> {
        let &i = self.index.get(name)?;
        Some(self.blocks[i].as_block_mut())
    }

    fn group(&self, name: &str) -> Option<Vec<String>> {
        self.groups.get(name).cloned()
    }
}
