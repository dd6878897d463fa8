//! A runnable lobby server demo.
//!
//! Wires the real lobby service to the WebSocket gateway with permissive
//! stand-ins for the external collaborators: any steamid has an identity,
//! any workshop id resolves to fabricated metadata, and run submissions go
//! to the log. Point a WebSocket client at the printed address, send
//! `{"channel":"lobby_casual","steamid":"..."}` to attach, and drive the
//! lobby with the control commands.
//!
//! Environment:
//! - `LOBBY_ADDR` — bind address (default `127.0.0.1:8092`)
//! - `LOBBY_SNAPSHOT` — snapshot file path (persistence off when unset)

use std::sync::Arc;

use async_trait::async_trait;
use speedlobby::{LobbyConfig, LobbyService, handle};
use speedlobby_bus::{InMemoryBus, WebSocketGateway};
use speedlobby_protocol::{MapInfo, Mode, RunResult, SteamId};
use speedlobby_registry::{
    Identity, IdentityDirectory, JsonFileStore, LobbyContext, LobbyError, RankingService,
    SnapshotStore, WorkshopIndex,
};
use tracing_subscriber::EnvFilter;

/// Accepts every steamid. A real deployment resolves identities from the
/// user directory during session auth, well before the gateway.
struct OpenDirectory;

#[async_trait]
impl IdentityDirectory for OpenDirectory {
    async fn lookup(&self, steamid: &SteamId) -> Option<Identity> {
        Some(Identity {
            steamid: steamid.clone(),
            name: format!("player-{steamid}"),
        })
    }
}

/// Fabricates plausible metadata for any workshop id.
struct StubWorkshop;

#[async_trait]
impl WorkshopIndex for StubWorkshop {
    async fn fetch_map(&self, map_id: &str) -> Result<MapInfo, LobbyError> {
        Ok(MapInfo {
            id: map_id.to_string(),
            title: format!("Workshop map {map_id}"),
            author: "unknown".to_string(),
            file: format!("workshop/{map_id}/{map_id}.bsp"),
            thumbnail: String::new(),
        })
    }
}

/// Logs submissions instead of ranking them.
struct LogRanking;

#[async_trait]
impl RankingService for LogRanking {
    async fn submit(
        &self,
        mode: Mode,
        steamid: &SteamId,
        run: &RunResult,
        _note: &str,
        context: &LobbyContext,
    ) -> Result<(), LobbyError> {
        tracing::info!(
            %mode, %steamid, time = run.time, portals = run.portals,
            scope = %context.name,
            "run recorded"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let addr = std::env::var("LOBBY_ADDR").unwrap_or_else(|_| "127.0.0.1:8092".to_string());
    let store: Option<Arc<dyn SnapshotStore>> = std::env::var("LOBBY_SNAPSHOT")
        .ok()
        .map(|path| Arc::new(JsonFileStore::new(path)) as Arc<dyn SnapshotStore>);

    let bus = InMemoryBus::new();
    let service = LobbyService::new(
        LobbyConfig::default(),
        bus.clone(),
        Arc::new(OpenDirectory),
        Arc::new(StubWorkshop),
        Arc::new(LogRanking),
        store,
    );

    // A lobby to play with right away.
    if let Err(code) = handle(&service, "create", &[serde_json::json!("casual")]).await {
        tracing::error!(code, "demo lobby creation failed");
    }

    let gateway = WebSocketGateway::bind(&addr, bus).await?;
    tracing::info!(addr = %gateway.local_addr()?, "lobby server ready");
    gateway.run().await?;
    Ok(())
}
