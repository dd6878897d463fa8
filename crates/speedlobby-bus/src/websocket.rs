//! WebSocket gateway: attaches real sockets to an [`InMemoryBus`].
//!
//! The gateway owns no channel semantics of its own. A connecting socket
//! sends one attach frame — `{"channel": "...", "steamid": "..."}` — and is
//! then a plain bus attachment: inbound frames become channel messages,
//! channel broadcasts become outbound frames, and a socket close becomes the
//! channel's `Closed` event. Who the steamid belongs to is the session
//! layer's problem and is settled before a client ever reaches this port.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use speedlobby_protocol::SteamId;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use crate::{BusError, InMemoryBus};

/// The first frame a connecting socket must send.
#[derive(Debug, Deserialize)]
struct AttachRequest {
    channel: String,
    steamid: SteamId,
}

/// Accepts WebSocket connections and attaches them to a bus.
pub struct WebSocketGateway {
    listener: TcpListener,
    bus: Arc<InMemoryBus>,
}

impl WebSocketGateway {
    /// Binds the gateway to the given address.
    pub async fn bind(addr: &str, bus: Arc<InMemoryBus>) -> Result<Self, BusError> {
        let listener = TcpListener::bind(addr).await.map_err(BusError::AcceptFailed)?;
        tracing::info!(addr, "websocket gateway listening");
        Ok(Self { listener, bus })
    }

    /// Returns the local address the gateway is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop. Each connection gets its own task; a failed
    /// session never takes the gateway down.
    pub async fn run(self) -> Result<(), BusError> {
        loop {
            let (stream, addr) = self.listener.accept().await.map_err(BusError::AcceptFailed)?;
            tracing::debug!(%addr, "accepted websocket connection");
            let bus = Arc::clone(&self.bus);
            tokio::spawn(async move {
                if let Err(e) = handle_socket(stream, bus).await {
                    tracing::debug!(error = %e, "websocket session ended with error");
                }
            });
        }
    }
}

/// Drives one socket from accept to close.
async fn handle_socket(stream: TcpStream, bus: Arc<InMemoryBus>) -> Result<(), BusError> {
    let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
        BusError::AcceptFailed(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e))
    })?;
    let (mut ws_tx, mut ws_rx) = ws.split();

    // First frame names the channel and identity.
    let first = match ws_rx.next().await {
        Some(Ok(Message::Text(text))) => text.as_bytes().to_vec(),
        Some(Ok(Message::Binary(data))) => data.into(),
        _ => return Ok(()), // closed before attaching
    };
    let request: AttachRequest = match serde_json::from_slice(&first) {
        Ok(req) => req,
        Err(e) => {
            tracing::debug!(error = %e, "malformed attach frame, closing");
            let _ = ws_tx.close().await;
            return Ok(());
        }
    };

    let client = match bus.attach(&request.channel, request.steamid.clone()).await {
        Ok(client) => client,
        Err(e) => {
            tracing::debug!(
                channel = request.channel,
                steamid = %request.steamid,
                error = %e,
                "attach rejected, closing"
            );
            let _ = ws_tx.close().await;
            return Ok(());
        }
    };
    let (sender, mut broadcasts) = client.split();

    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Binary(data))) => sender.send(data.into()),
                Some(Ok(Message::Text(text))) => sender.send(text.as_bytes().to_vec()),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // skip ping/pong/frame
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "websocket receive failed");
                    break;
                }
            },
            payload = broadcasts.recv() => match payload {
                Some(payload) => {
                    if ws_tx.send(Message::Binary(payload.into())).await.is_err() {
                        break;
                    }
                }
                // Channel deleted out from under us — hang up.
                None => {
                    let _ = ws_tx.close().await;
                    break;
                }
            },
        }
    }

    sender.close();
    Ok(())
}
