//! In-memory channel bus.
//!
//! The canonical [`ChannelBus`] implementation: channels are entries in one
//! map, attachments are unbounded mpsc senders. All of the lobby logic runs
//! against this; network front ends (the WebSocket gateway) attach sockets
//! to it rather than reimplementing the bus semantics.
//!
//! # Locking
//!
//! The channel map sits behind a plain `std::sync::Mutex`. The lock is never
//! held across an `.await` — the attach path fetches the authorizer, drops
//! the lock for the authorization check, then re-takes it — so there is no
//! async mutex overhead and no deadlock surface against callers that hold
//! their own locks while calling into the bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use speedlobby_protocol::SteamId;
use tokio::sync::mpsc;

use crate::{BusConnection, BusError, ChannelBus, ChannelEvent, ChannelHooks, ConnectionId};

/// A registered channel: its hooks plus every live attachment. The
/// identity behind each attachment travels with the client-side sender,
/// not the bus — a `Closed` event carries it from there.
struct ChannelState {
    hooks: ChannelHooks,
    conns: HashMap<ConnectionId, BusConnection>,
}

/// An in-process [`ChannelBus`].
pub struct InMemoryBus {
    channels: Mutex<HashMap<String, ChannelState>>,
    next_conn: AtomicU64,
}

impl InMemoryBus {
    /// Creates a new bus with no channels.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            channels: Mutex::new(HashMap::new()),
            next_conn: AtomicU64::new(1),
        })
    }

    /// Attaches a connection to a channel under the given identity.
    ///
    /// Runs the channel's authorization check first; the returned
    /// [`BusClient`] receives every broadcast from the moment of attachment
    /// and can push payloads into the channel owner's mailbox.
    pub async fn attach(
        self: &Arc<Self>,
        channel: &str,
        identity: SteamId,
    ) -> Result<BusClient, BusError> {
        // Fetch the authorizer without holding the lock across its await.
        let authorizer = {
            let channels = self.channels.lock().expect("bus lock poisoned");
            let state = channels
                .get(channel)
                .ok_or_else(|| BusError::UnknownChannel(channel.to_string()))?;
            Arc::clone(&state.hooks.authorizer)
        };

        if !authorizer.authorize(&identity).await {
            return Err(BusError::Unauthorized {
                channel: channel.to_string(),
                identity,
            });
        }

        let id = ConnectionId::new(self.next_conn.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = BusConnection::new(id, tx);

        let events = {
            let mut channels = self.channels.lock().expect("bus lock poisoned");
            // Re-check: the channel may have been deleted while authorizing.
            let state = channels
                .get_mut(channel)
                .ok_or_else(|| BusError::UnknownChannel(channel.to_string()))?;
            state.conns.insert(id, conn.clone());
            state.hooks.events.clone()
        };

        tracing::debug!(channel, %identity, %id, "connection attached");

        Ok(BusClient {
            sender: BusSender { bus: Arc::clone(self), identity, conn, events },
            rx,
        })
    }

    /// Detaches a connection wherever it is currently attached. The channel
    /// is looked up by connection id because channels can be renamed while
    /// attachments live.
    fn detach(&self, id: ConnectionId) {
        let mut channels = self.channels.lock().expect("bus lock poisoned");
        for state in channels.values_mut() {
            if state.conns.remove(&id).is_some() {
                return;
            }
        }
    }
}

#[async_trait]
impl ChannelBus for InMemoryBus {
    async fn create(&self, channel: &str, hooks: ChannelHooks) -> Result<(), BusError> {
        let mut channels = self.channels.lock().expect("bus lock poisoned");
        if channels.contains_key(channel) {
            return Err(BusError::ChannelExists(channel.to_string()));
        }
        channels.insert(channel.to_string(), ChannelState { hooks, conns: HashMap::new() });
        tracing::debug!(channel, "channel created");
        Ok(())
    }

    async fn send(&self, channel: &str, payload: Vec<u8>) -> Result<(), BusError> {
        let channels = self.channels.lock().expect("bus lock poisoned");
        let state = channels
            .get(channel)
            .ok_or_else(|| BusError::UnknownChannel(channel.to_string()))?;
        for conn in state.conns.values() {
            conn.send(&payload);
        }
        Ok(())
    }

    async fn rename(&self, channel: &str, new_id: &str) -> Result<(), BusError> {
        let mut channels = self.channels.lock().expect("bus lock poisoned");
        if channels.contains_key(new_id) {
            return Err(BusError::ChannelExists(new_id.to_string()));
        }
        let state = channels
            .remove(channel)
            .ok_or_else(|| BusError::UnknownChannel(channel.to_string()))?;
        channels.insert(new_id.to_string(), state);
        tracing::debug!(old = channel, new = new_id, "channel renamed");
        Ok(())
    }

    async fn delete(&self, channel: &str) -> Result<(), BusError> {
        let mut channels = self.channels.lock().expect("bus lock poisoned");
        channels
            .remove(channel)
            .ok_or_else(|| BusError::UnknownChannel(channel.to_string()))?;
        // Dropping the state drops every attachment sender (clients see end
        // of stream) and the events sender (the owner's mailbox drains out).
        tracing::debug!(channel, "channel deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Client side
// ---------------------------------------------------------------------------

/// The sending half of an attached connection.
///
/// Split out of [`BusClient`] so a network front end can pump inbound and
/// outbound traffic from different tasks or `select!` arms.
pub struct BusSender {
    bus: Arc<InMemoryBus>,
    identity: SteamId,
    conn: BusConnection,
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl BusSender {
    /// This attachment's connection id.
    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    /// The identity this attachment was authorized under.
    pub fn identity(&self) -> &SteamId {
        &self.identity
    }

    /// Delivers a payload to the channel owner's mailbox.
    pub fn send(&self, payload: Vec<u8>) {
        let event = ChannelEvent::Message {
            identity: self.identity.clone(),
            payload,
            conn: self.conn.clone(),
        };
        if self.events.send(event).is_err() {
            tracing::debug!(id = %self.conn.id(), "message to deleted channel dropped");
        }
    }

    /// Detaches from the channel and notifies the owner.
    pub fn close(self) {
        self.bus.detach(self.conn.id());
        let _ = self.events.send(ChannelEvent::Closed {
            identity: self.identity,
            conn: self.conn,
        });
    }
}

/// A connection attached to a channel: broadcasts in, payloads out.
pub struct BusClient {
    sender: BusSender,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl BusClient {
    /// This attachment's connection id.
    pub fn id(&self) -> ConnectionId {
        self.sender.id()
    }

    /// The identity this attachment was authorized under.
    pub fn identity(&self) -> &SteamId {
        self.sender.identity()
    }

    /// Delivers a payload to the channel owner's mailbox.
    pub fn send(&self, payload: Vec<u8>) {
        self.sender.send(payload);
    }

    /// Receives the next broadcast (or directed) payload. Returns `None`
    /// once the channel has been deleted.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    /// Non-blocking receive, for tests that drain queued broadcasts.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    /// Splits into the sending half and the raw broadcast receiver.
    pub fn split(self) -> (BusSender, mpsc::UnboundedReceiver<Vec<u8>>) {
        (self.sender, self.rx)
    }

    /// Detaches from the channel and notifies the owner.
    pub fn close(self) {
        self.sender.close();
    }
}
