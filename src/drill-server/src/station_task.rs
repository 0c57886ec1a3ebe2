// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The single task that owns the station.
//!
//! Client requests and simulation ticks are handled one at a time, so every
//! trigger runs to completion before the next one starts.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use drill_backend::SimGrid;
use drill_core::{Station, StationCommand, StationRequest};

pub async fn run_station_task(
    mut station: Station<SimGrid>,
    mut rx: mpsc::Receiver<StationRequest>,
    tick: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!("Station task running, grid tick {:?}", tick);
    let mut ticker = time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => advance(&mut station, tick),

            maybe_req = rx.recv() => {
                let Some(StationRequest { cmd, respond_to }) = maybe_req else {
                    info!("Request channel closed, stopping station task");
                    break;
                };
                let label = format!("{:?}", cmd);
                let result = station.process(cmd);
                if let Err(e) = &result {
                    warn!("{} failed: {}", label, e);
                }
                if respond_to.send(result).is_err() {
                    debug!("Client went away before the reply to {}", label);
                }
            }

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!("Station task shutting down");
                    break;
                }
            }
        }
    }
}

/// Step the simulation and deliver whatever the timers and sensors fired.
fn advance(station: &mut Station<SimGrid>, tick: Duration) {
    for event in station.grid_mut().advance(tick) {
        let cmd = StationCommand::Trigger {
            rig: event.action.rig,
            trigger: event.action.trigger,
        };
        if let Err(e) = station.process(cmd) {
            warn!("Trigger from {} failed: {}", event.source, e);
        }
    }
}
