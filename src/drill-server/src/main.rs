// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod config;
mod listener;
mod station_task;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use drill_app::{init_logging, ConfigFile};
use drill_backend::{build_grid, FileSurface, SimGrid};
use drill_core::{DynResult, Dispatcher, LogSurface, MemorySurface, Station};
use drill_protocol::{SimpleTokenValidator, TokenValidator};

use config::ServerConfig;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - drilling rig control daemon");
const STATION_CHANNEL_BUFFER: usize = 32;

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// IP address for the JSON TCP listener
    #[arg(short = 'l', long = "listen")]
    listen: Option<IpAddr>,
    /// Port for the JSON TCP listener
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,
}

fn open_surface(cfg: &ServerConfig) -> DynResult<Box<dyn LogSurface>> {
    match &cfg.log.panel_file {
        Some(path) => {
            info!("Log panel: {}", path.display());
            Ok(Box::new(FileSurface::open(path)?))
        }
        None => {
            info!("Log panel kept in memory");
            Ok(Box::new(MemorySurface::new()))
        }
    }
}

fn build_station(cfg: &ServerConfig) -> DynResult<Station<SimGrid>> {
    let grid = build_grid(&cfg.grid, cfg.platform_layout(), cfg.winch_layout())?;
    info!("Simulated grid with {} blocks", grid.len());

    let dispatcher = Dispatcher::new(cfg.log.policy());
    let mut station = Station::new(dispatcher, grid, open_surface(cfg)?);
    if let Some(layout) = cfg.platform_layout() {
        station = station.with_platform(layout.clone())?;
    }
    if let Some(layout) = cfg.winch_layout() {
        station = station.with_winch(layout.clone())?;
    }
    Ok(station)
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", ServerConfig::example_combined_toml());
        return Ok(());
    }

    let (cfg, config_path) = if let Some(ref path) = cli.config {
        let cfg = ServerConfig::load_from_file(path)?;
        (cfg, Some(path.clone()))
    } else {
        ServerConfig::load_from_default_paths()?
    };
    cfg.validate()
        .map_err(|e| format!("Invalid server configuration: {}", e))?;

    init_logging(cfg.general.log_level.as_deref());

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    let station = build_station(&cfg)?;

    let (tx, rx) = mpsc::channel(STATION_CHANNEL_BUFFER);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task_handles: Vec<JoinHandle<()>> = Vec::new();

    let tick = cfg.grid.tick();
    let station_shutdown_rx = shutdown_rx.clone();
    task_handles.push(tokio::spawn(station_task::run_station_task(
        station,
        rx,
        tick,
        station_shutdown_rx,
    )));

    if cfg.listen.enabled {
        let listen_ip = cli.listen.unwrap_or(cfg.listen.listen);
        let listen_port = cli.port.unwrap_or(cfg.listen.port);
        let listen_addr = SocketAddr::from((listen_ip, listen_port));
        let tokens = cfg.listen.auth.tokens.iter().filter(|t| !t.is_empty()).cloned();
        let validator: Arc<dyn TokenValidator> = Arc::new(SimpleTokenValidator::new(tokens));
        let station_tx = tx.clone();
        let listener_shutdown_rx = shutdown_rx.clone();
        task_handles.push(tokio::spawn(async move {
            if let Err(e) =
                listener::run_listener(listen_addr, station_tx, validator, listener_shutdown_rx)
                    .await
            {
                error!("Listener error: {:?}", e);
            }
        }));
    }

    signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down");
    let _ = shutdown_tx.send(true);
    drop(tx);
    tokio::time::sleep(Duration::from_millis(400)).await;

    for handle in &task_handles {
        if !handle.is_finished() {
            handle.abort();
        }
    }
    for handle in task_handles {
        let _ = handle.await;
    }
    Ok(())
}
