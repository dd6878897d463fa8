//! Error types for the bus layer.

use speedlobby_protocol::SteamId;

/// Errors that can occur during channel bus operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// A channel with this id already exists.
    #[error("channel {0:?} already exists")]
    ChannelExists(String),

    /// No channel with this id is registered. Also covers the benign race
    /// where a grace-period sweep deletes a channel another path already
    /// removed — callers decide whether to suppress it.
    #[error("unknown channel {0:?}")]
    UnknownChannel(String),

    /// The identity failed the channel's authorization check.
    #[error("{identity} is not authorized for channel {channel:?}")]
    Unauthorized { channel: String, identity: SteamId },

    /// Binding or accepting network connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}
