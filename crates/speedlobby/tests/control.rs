//! Integration tests for the control-plane boundary: commands in, code
//! strings out, nothing internal leaking through.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use speedlobby::{InMemoryBus, LobbyConfig, LobbyService, handle};
use speedlobby_protocol::{MapInfo, Mode, RunResult, SteamId};
use speedlobby_registry::{
    Identity, IdentityDirectory, LobbyContext, LobbyError, RankingService, WorkshopIndex,
};

struct Directory(HashSet<SteamId>);

#[async_trait]
impl IdentityDirectory for Directory {
    async fn lookup(&self, steamid: &SteamId) -> Option<Identity> {
        self.0.contains(steamid).then(|| Identity {
            steamid: steamid.clone(),
            name: "someone".to_string(),
        })
    }
}

struct Workshop;

#[async_trait]
impl WorkshopIndex for Workshop {
    async fn fetch_map(&self, map_id: &str) -> Result<MapInfo, LobbyError> {
        Ok(MapInfo {
            id: map_id.to_string(),
            title: "map".to_string(),
            author: "author".to_string(),
            file: format!("workshop/{map_id}/map.bsp"),
            thumbnail: "thumb".to_string(),
        })
    }
}

struct NullRanking;

#[async_trait]
impl RankingService for NullRanking {
    async fn submit(
        &self,
        _mode: Mode,
        _steamid: &SteamId,
        _run: &RunResult,
        _note: &str,
        _context: &LobbyContext,
    ) -> Result<(), LobbyError> {
        Ok(())
    }
}

fn service() -> Arc<LobbyService> {
    LobbyService::new(
        LobbyConfig::default(),
        InMemoryBus::new(),
        Arc::new(Directory(HashSet::from([SteamId::new("p1")]))),
        Arc::new(Workshop),
        Arc::new(NullRanking),
        None,
    )
}

#[tokio::test]
async fn test_unknown_command_code() {
    let svc = service();
    assert_eq!(handle(&svc, "explode", &[]).await, Err("UnknownCommand"));
}

#[tokio::test]
async fn test_create_returns_success_and_list_sees_it() {
    let svc = service();

    let created = handle(&svc, "create", &[json!("speedrun"), json!("")]).await;
    assert_eq!(created.unwrap(), json!("SUCCESS"));

    let all = handle(&svc, "list", &[]).await.unwrap();
    assert_eq!(all["speedrun"]["players"], json!([]));
    assert_eq!(all["speedrun"]["mode"], json!("ffa"));
}

#[tokio::test]
async fn test_domain_failures_surface_as_bare_codes() {
    let svc = service();
    handle(&svc, "create", &[json!("speedrun"), json!("")]).await.unwrap();

    assert_eq!(
        handle(&svc, "create", &[json!("speedrun"), json!("")]).await,
        Err("NameTaken")
    );
    assert_eq!(handle(&svc, "get", &[json!("missing")]).await, Err("NameMissing"));
    assert_eq!(
        handle(&svc, "join", &[json!("speedrun"), json!(""), json!("stranger")]).await,
        Err("UnknownParticipant")
    );
    assert_eq!(
        handle(&svc, "ready", &[json!("speedrun"), json!(true), json!("p1")]).await,
        Err("NoMapSelected")
    );
}

#[tokio::test]
async fn test_get_returns_public_entry_without_secrets() {
    let svc = service();
    handle(&svc, "create", &[json!("private"), json!("hunter2")]).await.unwrap();
    handle(&svc, "join", &[json!("private"), json!("hunter2"), json!("p1")]).await.unwrap();

    let entry = handle(&svc, "get", &[json!("private")]).await.unwrap();
    assert_eq!(entry["players"], json!(["p1"]));
    assert!(entry.get("password").is_none(), "public view carries no secret");

    // The private view does carry the hash, and only the hash.
    let data = handle(&svc, "getdata", &[json!("private")]).await.unwrap();
    let hash = data["password"].as_str().unwrap();
    assert!(hash.starts_with("$argon2"));
}

#[tokio::test]
async fn test_missing_arguments_become_domain_errors() {
    let svc = service();
    // No name at all: same outcome as passing an empty one.
    assert_eq!(handle(&svc, "create", &[]).await, Err("NameInvalid"));
    assert_eq!(handle(&svc, "map", &[]).await, Err("NameMissing"));
}
