// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the process-wide subscriber.
/// Falls back to INFO if the level is missing or not a tracing level name.
pub fn init_logging(log_level: Option<&str>) {
    let level = parse_level(log_level);

    FmtSubscriber::builder()
        .with_target(false)
        .with_max_level(level)
        .init();
}

fn parse_level(log_level: Option<&str>) -> Level {
    log_level
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::INFO)
}
