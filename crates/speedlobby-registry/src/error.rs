//! Error types for the lobby registry.

use speedlobby_protocol::SteamId;

/// Errors that can occur during lobby operations.
///
/// Each variant maps to a stable code string via [`LobbyError::code`]; the
/// control-plane boundary hands callers only that code and keeps the full
/// context (names, identities) in the server log.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The name is empty after trimming, too long, or names a lobby that
    /// does not exist (join-time lookup).
    #[error("invalid lobby name {0:?}")]
    NameInvalid(String),

    /// A lobby with this name already exists, in either the public or the
    /// private map.
    #[error("lobby name {0:?} already in use")]
    NameTaken(String),

    /// No lobby with this name exists.
    #[error("no such lobby {0:?}")]
    NameMissing(String),

    /// The lobby has a password and the supplied one does not verify.
    #[error("wrong password for lobby {0:?}")]
    PasswordMismatch(String),

    /// The participant is already a member of this lobby.
    #[error("{steamid} already joined lobby {lobby:?}")]
    AlreadyJoined { lobby: String, steamid: SteamId },

    /// The participant has no identity record.
    #[error("unknown participant {0}")]
    UnknownParticipant(SteamId),

    /// A manual ready toggle arrived while the game is in progress.
    #[error("game already in progress in lobby {0:?}")]
    GameInProgress(String),

    /// Readying up requires a map selection, and the lobby has none.
    #[error("no map selected in lobby {0:?}")]
    NoMapSelected(String),

    /// Readying up requires a live game attachment for the participant.
    #[error("no game client connected for {0}")]
    GameClientNotConnected(SteamId),

    /// The game client answered the map-presence query negatively.
    #[error("{0} does not have the selected map")]
    MapNotPresent(SteamId),

    /// The game client did not answer the map-presence query in time, or
    /// the pending query was superseded by a newer one.
    #[error("map check timed out for {0}")]
    Timeout(SteamId),

    /// The map is reserved for the active tournament round.
    #[error("map {0:?} is reserved for the active tournament")]
    MapReserved(String),

    /// Anything unanticipated. Wrapped so the boundary contract never
    /// leaks internal detail to callers.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LobbyError {
    /// The stable code string surfaced to control-plane callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NameInvalid(_) => "NameInvalid",
            Self::NameTaken(_) => "NameTaken",
            Self::NameMissing(_) => "NameMissing",
            Self::PasswordMismatch(_) => "PasswordMismatch",
            Self::AlreadyJoined { .. } => "AlreadyJoined",
            Self::UnknownParticipant(_) => "UnknownParticipant",
            Self::GameInProgress(_) => "GameInProgress",
            Self::NoMapSelected(_) => "NoMapSelected",
            Self::GameClientNotConnected(_) => "GameClientNotConnected",
            Self::MapNotPresent(_) => "MapNotPresent",
            Self::Timeout(_) => "Timeout",
            Self::MapReserved(_) => "MapReserved",
            Self::Internal(_) => "Internal",
        }
    }
}
