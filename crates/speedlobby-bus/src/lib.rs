//! Named channel bus for speedlobby.
//!
//! A *channel* is a long-lived, named broadcast group: connections attach to
//! it under an authorized identity, inbound messages and disconnects are
//! delivered to the channel's owner as [`ChannelEvent`]s, and
//! [`ChannelBus::send`] fans a payload out to every attached connection.
//! Several connections may attach under the same identity (one browser tab,
//! one game client); the bus does not distinguish them — that is done by an
//! application-level handshake.
//!
//! The lobby registry consumes this purely through the [`ChannelBus`] trait.
//! [`InMemoryBus`] is the canonical implementation; the `websocket` feature
//! adds a [`WebSocketGateway`] that attaches real sockets to it.

mod error;
mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::BusError;
pub use memory::{BusClient, BusSender, InMemoryBus};
#[cfg(feature = "websocket")]
pub use websocket::WebSocketGateway;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use speedlobby_protocol::SteamId;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// ConnectionId / BusConnection
// ---------------------------------------------------------------------------

/// Opaque identifier for a single attached connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Server-side handle to one attached connection.
///
/// Cheap to clone — an id plus a channel sender. The registry keeps one of
/// these per game attachment so it can query a single client directly,
/// and compares handles by id to tell a game disconnect from a browser
/// disconnect.
#[derive(Debug, Clone)]
pub struct BusConnection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl BusConnection {
    /// Creates a handle. Normally done by a bus implementation; exposed so
    /// tests can fabricate attachments.
    pub fn new(id: ConnectionId, tx: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self { id, tx }
    }

    /// Returns this connection's id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Sends a payload to this one connection. Silently drops if the
    /// receiver is gone — a disconnect event is already on its way.
    pub fn send(&self, payload: &[u8]) {
        if self.tx.send(payload.to_vec()).is_err() {
            tracing::debug!(id = %self.id, "send to closed connection dropped");
        }
    }
}

impl PartialEq for BusConnection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BusConnection {}

// ---------------------------------------------------------------------------
// Channel events and hooks
// ---------------------------------------------------------------------------

/// Something that happened on a channel, delivered to the channel owner's
/// mailbox in arrival order.
#[derive(Debug)]
pub enum ChannelEvent {
    /// An attached connection sent a payload.
    Message {
        identity: SteamId,
        payload: Vec<u8>,
        conn: BusConnection,
    },
    /// An attached connection closed.
    Closed {
        identity: SteamId,
        conn: BusConnection,
    },
}

/// Decides whether an identity may attach to a channel.
///
/// Evaluated at attach time against live state (a lobby's current roster),
/// so implementations are async and re-check on every attempt.
#[async_trait]
pub trait ChannelAuthorizer: Send + Sync {
    async fn authorize(&self, identity: &SteamId) -> bool;
}

/// Everything a channel owner registers at creation time: who may attach,
/// and where channel events should be delivered.
pub struct ChannelHooks {
    pub authorizer: Arc<dyn ChannelAuthorizer>,
    pub events: mpsc::UnboundedSender<ChannelEvent>,
}

impl ChannelHooks {
    pub fn new(
        authorizer: Arc<dyn ChannelAuthorizer>,
        events: mpsc::UnboundedSender<ChannelEvent>,
    ) -> Self {
        Self { authorizer, events }
    }
}

// ---------------------------------------------------------------------------
// ChannelBus
// ---------------------------------------------------------------------------

/// The bus contract consumed by the lobby registry.
#[async_trait]
pub trait ChannelBus: Send + Sync {
    /// Registers a new named channel. Fails with [`BusError::ChannelExists`]
    /// if the id is taken.
    async fn create(&self, channel: &str, hooks: ChannelHooks) -> Result<(), BusError>;

    /// Broadcasts a payload to every connection currently attached.
    async fn send(&self, channel: &str, payload: Vec<u8>) -> Result<(), BusError>;

    /// Moves a channel to a new id, keeping its attachments and hooks.
    async fn rename(&self, channel: &str, new_id: &str) -> Result<(), BusError>;

    /// Removes a channel, detaching every connection. Fails with
    /// [`BusError::UnknownChannel`] if the id is unknown.
    async fn delete(&self, channel: &str) -> Result<(), BusError>;
}

// =========================================================================
// Tests
// =========================================================================
