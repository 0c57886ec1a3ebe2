// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Position readout from piston status text.

use super::{group_members, BlockKind, Grid, GridError};

const FIELD_SEPARATOR: char = ':';
const UNIT_SUFFIX: char = 'm';

/// Extract the extension in meters from a status text like `Current position: 2.5m`.
///
/// Splits on `:` and takes the second field, splits that on the unit suffix
/// and parses the first part.
pub fn parse_extension(status: &str) -> Result<f64, GridError> {
    let unreadable = || GridError::UnreadableStatus(status.to_string());
    let field = status.split(FIELD_SEPARATOR).nth(1).ok_or_else(unreadable)?;
    let value = field.split(UNIT_SUFFIX).next().ok_or_else(unreadable)?;
    value.trim().parse::<f64>().map_err(|_| unreadable())
}

/// Sum of the extensions of all enabled pistons in `group`.
pub fn measure_extension<G>(grid: &G, group: &str) -> Result<f64, GridError>
where
    G: Grid + ?Sized,
{
    let pistons = group_members(grid, group, |b| {
        b.kind() == BlockKind::Piston && b.is_enabled()
    })?;
    let mut total = 0.0;
    for name in pistons {
        if let Some(block) = grid.block(&name) {
            total += parse_extension(&block.status_text())?;
        }
    }
    Ok(total)
}
