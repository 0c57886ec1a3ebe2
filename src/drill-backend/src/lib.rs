// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Simulated grid and file-backed log panel used by the drill server.

pub mod blocks;
pub mod builder;
pub mod grid;
pub mod surface;

pub use blocks::{GridEvent, SimBlock, TimerAction};
pub use builder::{build_grid, GridSpec, PlatformSim, WinchSim};
pub use grid::{BuildError, SimGrid};
pub use surface::FileSurface;
