//! WebSocket server: accept loop and per-subscriber session tasks.
//!
//! Subscribers connect here to receive the broadcast stream.  Sessions are
//! receive-only from the subscriber's point of view: the bridge pushes
//! encoded wire frames and ignores whatever text the subscriber sends
//! (protocol-level Ping/Pong and Close are handled per RFC 6455 by
//! tokio-tungstenite).
//!
//! Each session runs in its own Tokio task, so one slow subscriber never
//! blocks the accept loop or the other sessions.  The accept loop polls a
//! shared `AtomicBool` between short `accept()` timeouts so Ctrl+C can stop
//! the server even when nobody is connecting.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};

use crate::domain::BridgeConfig;
use crate::infrastructure::hub::Hub;

/// Runs the subscriber accept loop until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (port in use,
/// missing permission).
pub async fn run_server(
    config: &BridgeConfig,
    hub: Arc<Hub>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.ws_bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {}", config.ws_bind_addr))?;

    info!("subscriber WebSocket listener on {}", config.ws_bind_addr);
    run_server_on(listener, hub, running).await;
    Ok(())
}

/// Accept loop over an already-bound listener.
///
/// Split out from [`run_server`] so tests can bind an ephemeral port and
/// learn the address before the loop starts.
pub async fn run_server_on(listener: TcpListener, hub: Arc<Hub>, running: Arc<AtomicBool>) {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // A short timeout keeps the loop responsive to the shutdown flag
        // even when no subscriber is connecting.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                let hub = Arc::clone(&hub);
                tokio::spawn(async move {
                    handle_subscriber(stream, peer_addr, hub).await;
                });
            }
            Ok(Err(e)) => {
                // Transient accept error (e.g. fd exhaustion); keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {
                // Timeout; loop back to check the running flag.
            }
        }
    }
}

/// Entry point for each per-subscriber task; logs the session outcome.
async fn handle_subscriber(raw_stream: TcpStream, peer_addr: SocketAddr, hub: Arc<Hub>) {
    match run_subscriber_session(raw_stream, peer_addr, hub).await {
        Ok(()) => info!("subscriber session {peer_addr} closed"),
        Err(e) => warn!("subscriber session {peer_addr} closed with error: {e:#}"),
    }
}

/// Runs the complete lifecycle of one subscriber session: WebSocket
/// upgrade, hub registration, frame forwarding, unregistration.
async fn run_subscriber_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    hub: Arc<Hub>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    // The hub writes frames into this channel; only the session task
    // touches the WebSocket sink.
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<String>();

    let id = match hub.register(frame_tx).await {
        Ok(id) => id,
        Err(e) => {
            // Refuse politely so the subscriber can tell why.
            let _ = ws_tx.send(WsMessage::Close(None)).await;
            return Err(e).with_context(|| format!("refusing subscriber {peer_addr}"));
        }
    };
    info!(subscriber = %id, "subscriber connected from {peer_addr}");

    loop {
        tokio::select! {
            frame = frame_rx.recv() => match frame {
                Some(text) => {
                    if ws_tx.send(WsMessage::Text(text)).await.is_err() {
                        debug!(subscriber = %id, "WebSocket send failed (subscriber gone)");
                        break;
                    }
                }
                // The hub pruned us (or is gone); end the session.
                None => break,
            },
            inbound = ws_rx.next() => match inbound {
                Some(Ok(WsMessage::Close(_))) | None => {
                    debug!(subscriber = %id, "subscriber closed the connection");
                    break;
                }
                Some(Ok(WsMessage::Text(text))) => {
                    // The broadcast stream is one-way; nothing to do here.
                    debug!(subscriber = %id, bytes = text.len(), "ignoring inbound text frame");
                }
                Some(Ok(_)) => {
                    // Ping/Pong/Binary: protocol frames handled by the
                    // library, anything else is ignored.
                }
                Some(Err(e)) => {
                    warn!(subscriber = %id, "WebSocket error: {e}");
                    break;
                }
            },
        }
    }

    hub.unregister(&id).await;
    Ok(())
}
