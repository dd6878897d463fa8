//! External collaborators consumed by the registry.
//!
//! The registry coordinates lobbies; it does not look up identities, fetch
//! workshop metadata, rank runs, or own a storage format. Those concerns
//! live behind the traits here — production wires real services in, tests
//! substitute in-memory fakes.

use std::path::PathBuf;

use async_trait::async_trait;
use speedlobby_protocol::{MapInfo, Mode, RunResult, SteamId};

use crate::context::LobbyContext;
use crate::error::LobbyError;
use crate::registry::LobbySnapshot;

/// A known participant, as recorded by the identity directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub steamid: SteamId,
    pub name: String,
}

/// Looks up participants by id. Joining a lobby requires an identity
/// record; `None` means the id is unknown.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn lookup(&self, steamid: &SteamId) -> Option<Identity>;
}

/// Resolves workshop map ids to their metadata.
#[async_trait]
pub trait WorkshopIndex: Send + Sync {
    async fn fetch_map(&self, map_id: &str) -> Result<MapInfo, LobbyError>;
}

/// Records finished runs. The context scopes the submission to the lobby's
/// own board so lobby runs never pollute the main dataset.
#[async_trait]
pub trait RankingService: Send + Sync {
    async fn submit(
        &self,
        mode: Mode,
        steamid: &SteamId,
        run: &RunResult,
        note: &str,
        context: &LobbyContext,
    ) -> Result<(), LobbyError>;
}

/// Durable storage for the registry snapshot. The full snapshot is
/// rewritten on every mutating operation.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn persist(&self, snapshot: &LobbySnapshot) -> std::io::Result<()>;
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// A [`SnapshotStore`] that rewrites one JSON file per mutation.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn persist(&self, snapshot: &LobbySnapshot) -> std::io::Result<()> {
        let bytes = serde_json::to_vec(snapshot).map_err(std::io::Error::other)?;
        tokio::fs::write(&self.path, bytes).await
    }
}
