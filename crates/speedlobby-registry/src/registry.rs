//! The two lobby maps and their persisted snapshot.
//!
//! Every lobby exists in two maps under the same name: a public list-entry
//! (safe to hand to anyone) and a private data-entry (password hash, live
//! sessions, scoped context). The name sets of the two maps are always
//! identical; every operation that touches one touches the other under the
//! same lock.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use speedlobby_protocol::{Mode, SteamId};

use crate::context::LobbyContext;
use crate::session::PlayerSession;

// ---------------------------------------------------------------------------
// LobbyId
// ---------------------------------------------------------------------------

/// Stable internal identity of a lobby. Survives renames, which lobby
/// names do not — connection-event handlers and grace timers hold one of
/// these and resolve the current name at use time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LobbyId(pub u64);

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lobby-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// LobbyState
// ---------------------------------------------------------------------------

/// The lifecycle state of a lobby.
///
/// `Idle ⇄ InProgress`: the lobby moves to `InProgress` when every member
/// is ready, and back to `Idle` when an unready transition leaves no one
/// ready. A partial unready leaves the state alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LobbyState {
    Idle,
    InProgress,
}

impl fmt::Display for LobbyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::InProgress => write!(f, "in_progress"),
        }
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// The public summary of a lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    /// Member identities in join order.
    pub players: Vec<SteamId>,
    pub mode: Mode,
}

impl ListEntry {
    pub(crate) fn new() -> Self {
        Self { players: Vec::new(), mode: Mode::Ffa }
    }
}

/// The private operational state of a lobby. Holds the password hash and
/// live connection handles, so it is never exposed as-is — external callers
/// get a [`DataEntrySnapshot`].
#[derive(Debug)]
pub struct DataEntry {
    pub(crate) id: LobbyId,
    pub(crate) password: Option<String>,
    pub players: HashMap<SteamId, PlayerSession>,
    pub state: LobbyState,
    pub context: LobbyContext,
}

impl DataEntry {
    pub(crate) fn new(id: LobbyId, password: Option<String>, context: LobbyContext) -> Self {
        Self {
            id,
            password,
            players: HashMap::new(),
            state: LobbyState::Idle,
            context,
        }
    }

    pub(crate) fn to_snapshot(&self) -> DataEntrySnapshot {
        DataEntrySnapshot {
            password: self.password.clone(),
            players: self
                .players
                .iter()
                .map(|(id, s)| (id.clone(), PlayerSessionSnapshot { ready: s.ready }))
                .collect(),
            state: self.state,
            context: self.context.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The persistable view of a [`PlayerSession`] — live handles and pending
/// callbacks don't survive a restart and are dropped here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSessionSnapshot {
    pub ready: bool,
}

/// The persistable view of a [`DataEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEntrySnapshot {
    /// Argon2 PHC hash, or `None` for open lobbies.
    pub password: Option<String>,
    pub players: HashMap<SteamId, PlayerSessionSnapshot>,
    pub state: LobbyState,
    pub context: LobbyContext,
}

/// The full registry snapshot, rewritten on every mutating operation when a
/// snapshot store is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbySnapshot {
    pub list: HashMap<String, ListEntry>,
    pub data: HashMap<String, DataEntrySnapshot>,
}

// ---------------------------------------------------------------------------
// LobbyMaps
// ---------------------------------------------------------------------------

/// Both maps, guarded together by the service's mutex.
#[derive(Debug, Default)]
pub(crate) struct LobbyMaps {
    pub(crate) list: HashMap<String, ListEntry>,
    pub(crate) data: HashMap<String, DataEntry>,
}

impl LobbyMaps {
    /// Whether `name` is present in either map.
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.list.contains_key(name) || self.data.contains_key(name)
    }

    /// Whether `name` is present in both maps — the invariant form every
    /// lookup path uses.
    pub(crate) fn contains_both(&self, name: &str) -> bool {
        self.list.contains_key(name) && self.data.contains_key(name)
    }

    /// Resolves a lobby's current name from its stable id.
    pub(crate) fn name_of(&self, id: LobbyId) -> Option<String> {
        self.data
            .iter()
            .find(|(_, entry)| entry.id == id)
            .map(|(name, _)| name.clone())
    }

    pub(crate) fn snapshot(&self) -> LobbySnapshot {
        LobbySnapshot {
            list: self.list.clone(),
            data: self
                .data
                .iter()
                .map(|(name, entry)| (name.clone(), entry.to_snapshot()))
                .collect(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
