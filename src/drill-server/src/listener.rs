// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! JSON-over-TCP listener for drill-server.
//!
//! Accepts client connections speaking the `ClientEnvelope`/`ClientResponse`
//! protocol defined in `drill-protocol`, one JSON object per line.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info, warn};

use drill_core::StationRequest;
use drill_protocol::{
    client_command_to_station, encode_response, parse_envelope, station_result_to_response,
    ClientResponse, TokenValidator,
};

/// Run the JSON TCP listener until shutdown is signalled.
pub async fn run_listener(
    addr: SocketAddr,
    station_tx: mpsc::Sender<StationRequest>,
    validator: Arc<dyn TokenValidator>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer) = accepted?;
                info!("Client connected: {}", peer);

                let tx = station_tx.clone();
                let validator = Arc::clone(&validator);
                tokio::spawn(async move {
                    if let Err(e) = handle_client(socket, peer, tx, validator).await {
                        error!("Client {} error: {:?}", peer, e);
                    }
                });
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!("Listener shutting down");
                    return Ok(());
                }
            }
        }
    }
}

async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    tx: mpsc::Sender<StationRequest>,
    validator: Arc<dyn TokenValidator>,
) -> std::io::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            info!("Client {} disconnected", addr);
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let envelope = match parse_envelope(trimmed) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Invalid JSON from {}: {} / {}", addr, trimmed, e);
                let resp = ClientResponse::error(format!("Invalid JSON: {}", e));
                write_response(&mut writer, &resp).await?;
                continue;
            }
        };

        if let Err(e) = validator.validate(envelope.token.as_deref()) {
            warn!("Rejected request from {}: {}", addr, e);
            write_response(&mut writer, &ClientResponse::error(e.to_string())).await?;
            continue;
        }

        let (resp_tx, resp_rx) = oneshot::channel();
        let req = StationRequest {
            cmd: client_command_to_station(envelope.cmd),
            respond_to: resp_tx,
        };

        if let Err(e) = tx.send(req).await {
            error!("Failed to send request to station task: {:?}", e);
            let resp = ClientResponse::error("Internal error: station task not available");
            write_response(&mut writer, &resp).await?;
            continue;
        }

        let resp = match resp_rx.await {
            Ok(result) => station_result_to_response(result),
            Err(e) => {
                error!("Station response oneshot recv error: {:?}", e);
                ClientResponse::error("Internal error waiting for station response")
            }
        };
        write_response(&mut writer, &resp).await?;
    }

    Ok(())
}

async fn write_response<W>(writer: &mut W, resp: &ClientResponse) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = encode_response(resp)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}
