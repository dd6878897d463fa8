//! Unified error type for the speedlobby meta-crate.

use speedlobby_bus::BusError;
use speedlobby_protocol::ProtocolError;
use speedlobby_registry::LobbyError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `speedlobby` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SpeedlobbyError {
    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A bus-level error (unknown channel, unauthorized attach).
    #[error(transparent)]
    Bus(#[from] BusError),

    /// A lobby-level error (registry, readiness, lifecycle).
    #[error(transparent)]
    Lobby(#[from] LobbyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let top: SpeedlobbyError = err.into();
        assert!(matches!(top, SpeedlobbyError::Protocol(_)));
        assert!(top.to_string().contains("bad"));
    }

    #[test]
    fn test_from_bus_error() {
        let err = BusError::UnknownChannel("lobby_x".into());
        let top: SpeedlobbyError = err.into();
        assert!(matches!(top, SpeedlobbyError::Bus(_)));
    }

    #[test]
    fn test_from_lobby_error() {
        let err = LobbyError::NameMissing("x".into());
        let top: SpeedlobbyError = err.into();
        assert!(matches!(top, SpeedlobbyError::Lobby(_)));
    }
}
