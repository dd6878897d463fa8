//! The lobby service: registry operations, the readiness protocol, and the
//! connection lifecycle.
//!
//! One `LobbyService` instance owns all lobby state for a process. Control
//! handlers call its operations directly; connection events arrive through
//! a per-lobby listener task that the service spawns when the lobby's
//! channel is created.
//!
//! # Locking discipline
//!
//! `maps` is the only lock. It is taken for short synchronous sections and
//! never held across a bus round trip, a collaborator call, or a
//! persistence write. Any operation that resumes after an await re-reads
//! every fact it depends on — the lobby may have been renamed, emptied, or
//! deleted in the meantime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use speedlobby_bus::{
    BusConnection, ChannelAuthorizer, ChannelBus, ChannelEvent, ChannelHooks,
};
use speedlobby_protocol::{
    GameClientMessage, GameServerMessage, LobbyEvent, RunResult, RunSubmission, SteamId,
};
use tokio::sync::{Mutex, mpsc};

use crate::config::LobbyConfig;
use crate::context::LobbyContext;
use crate::error::LobbyError;
use crate::external::{IdentityDirectory, RankingService, SnapshotStore, WorkshopIndex};
use crate::registry::{
    DataEntry, DataEntrySnapshot, ListEntry, LobbyId, LobbyMaps, LobbySnapshot, LobbyState,
};
use crate::session::PlayerSession;

/// The bus channel id for a lobby name.
fn channel_id(name: &str) -> String {
    format!("lobby_{name}")
}

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

fn hash_password(password: &str) -> Result<String, LobbyError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LobbyError::Internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// LobbyService
// ---------------------------------------------------------------------------

/// The authoritative lobby registry.
///
/// Construct one per process with [`LobbyService::new`] and share the `Arc`
/// between the control plane and whatever front end feeds the bus. Tests
/// build a fresh instance per case.
pub struct LobbyService {
    self_ref: Weak<LobbyService>,
    config: LobbyConfig,
    bus: Arc<dyn ChannelBus>,
    identities: Arc<dyn IdentityDirectory>,
    workshop: Arc<dyn WorkshopIndex>,
    ranking: Arc<dyn RankingService>,
    store: Option<Arc<dyn SnapshotStore>>,
    maps: Mutex<LobbyMaps>,
    next_lobby_id: AtomicU64,
    next_check_seq: AtomicU64,
}

impl LobbyService {
    pub fn new(
        config: LobbyConfig,
        bus: Arc<dyn ChannelBus>,
        identities: Arc<dyn IdentityDirectory>,
        workshop: Arc<dyn WorkshopIndex>,
        ranking: Arc<dyn RankingService>,
        store: Option<Arc<dyn SnapshotStore>>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            self_ref: me.clone(),
            config,
            bus,
            identities,
            workshop,
            ranking,
            store,
            maps: Mutex::new(LobbyMaps::default()),
            next_lobby_id: AtomicU64::new(1),
            next_check_seq: AtomicU64::new(1),
        })
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// All lobbies' public entries.
    pub async fn list(&self) -> HashMap<String, ListEntry> {
        self.maps.lock().await.list.clone()
    }

    /// One lobby's public entry.
    pub async fn get(&self, name: &str) -> Result<ListEntry, LobbyError> {
        self.maps
            .lock()
            .await
            .list
            .get(name)
            .cloned()
            .ok_or_else(|| LobbyError::NameMissing(name.to_string()))
    }

    /// One lobby's private state, as a snapshot. Carries the password hash;
    /// the caller decides who may see it.
    pub async fn get_data(&self, name: &str) -> Result<DataEntrySnapshot, LobbyError> {
        self.maps
            .lock()
            .await
            .data
            .get(name)
            .map(DataEntry::to_snapshot)
            .ok_or_else(|| LobbyError::NameMissing(name.to_string()))
    }

    // -----------------------------------------------------------------
    // Registry lifecycle
    // -----------------------------------------------------------------

    /// Creates a lobby and registers its channel with the bus.
    pub async fn create(&self, name: &str, password: &str) -> Result<(), LobbyError> {
        let clean = name.trim();
        if clean.is_empty() || clean.chars().count() > self.config.name_max_len {
            return Err(LobbyError::NameInvalid(name.to_string()));
        }

        // Hash before taking the lock; argon2 is deliberately slow. An
        // empty password means an open lobby.
        let password = if password.is_empty() {
            None
        } else {
            Some(hash_password(password)?)
        };

        let id = LobbyId(self.next_lobby_id.fetch_add(1, Ordering::Relaxed));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let snapshot = {
            let mut maps = self.maps.lock().await;
            if maps.contains(clean) {
                return Err(LobbyError::NameTaken(clean.to_string()));
            }
            maps.list.insert(clean.to_string(), ListEntry::new());
            maps.data.insert(
                clean.to_string(),
                DataEntry::new(id, password, LobbyContext::new(clean)),
            );
            maps.snapshot()
        };
        self.persist(snapshot).await;

        // The channel admits only identities currently on the roster; the
        // check runs against live state on every attach.
        let authorizer = Arc::new(RosterAuthorizer { service: self.self_ref.clone(), lobby: id });
        if let Err(e) = self
            .bus
            .create(&channel_id(clean), ChannelHooks::new(authorizer, events_tx))
            .await
        {
            // A colliding channel means the maps and the bus disagree about
            // what exists — undo the reservation rather than leave a lobby
            // nobody can attach to.
            let snapshot = {
                let mut maps = self.maps.lock().await;
                maps.list.remove(clean);
                maps.data.remove(clean);
                maps.snapshot()
            };
            self.persist(snapshot).await;
            return Err(LobbyError::Internal(format!("channel create failed: {e}")));
        }

        tokio::spawn(channel_listener(self.self_ref.clone(), id, events_rx));
        tracing::info!(lobby = clean, %id, "lobby created");
        Ok(())
    }

    /// Adds a participant to a lobby.
    pub async fn join(
        &self,
        name: &str,
        password: &str,
        steamid: &SteamId,
    ) -> Result<(), LobbyError> {
        if self.identities.lookup(steamid).await.is_none() {
            return Err(LobbyError::UnknownParticipant(steamid.clone()));
        }

        // Fetch the stored hash; verification stays outside the lock.
        let stored = {
            let maps = self.maps.lock().await;
            if !maps.contains_both(name) {
                return Err(LobbyError::NameInvalid(name.to_string()));
            }
            if maps.list[name].players.contains(steamid) {
                return Err(LobbyError::AlreadyJoined {
                    lobby: name.to_string(),
                    steamid: steamid.clone(),
                });
            }
            maps.data[name].password.clone()
        };
        if let Some(hash) = stored {
            if !verify_password(password, &hash) {
                return Err(LobbyError::PasswordMismatch(name.to_string()));
            }
        }

        let snapshot = {
            let mut maps = self.maps.lock().await;
            // Re-check: the registry may have changed while verifying.
            if !maps.contains_both(name) {
                return Err(LobbyError::NameInvalid(name.to_string()));
            }
            let Some(list) = maps.list.get_mut(name) else {
                return Err(LobbyError::NameInvalid(name.to_string()));
            };
            if list.players.contains(steamid) {
                return Err(LobbyError::AlreadyJoined {
                    lobby: name.to_string(),
                    steamid: steamid.clone(),
                });
            }
            list.players.push(steamid.clone());
            let Some(data) = maps.data.get_mut(name) else {
                return Err(LobbyError::Internal(format!("list/data desync for {name:?}")));
            };
            data.players.insert(steamid.clone(), PlayerSession::new());
            maps.snapshot()
        };
        self.persist(snapshot).await;
        self.broadcast(name, &LobbyEvent::Join { steamid: steamid.clone() }).await;
        tracing::info!(lobby = name, %steamid, "participant joined");
        Ok(())
    }

    /// Moves a lobby to a new name, atomically in both maps, then moves the
    /// underlying channel.
    pub async fn rename(&self, name: &str, new_name: &str) -> Result<(), LobbyError> {
        let clean = new_name.trim();
        let snapshot = {
            let mut maps = self.maps.lock().await;
            if maps.contains(clean) {
                return Err(LobbyError::NameTaken(clean.to_string()));
            }
            if !maps.contains_both(name) {
                return Err(LobbyError::NameMissing(name.to_string()));
            }
            if clean.is_empty() || clean.chars().count() > self.config.name_max_len {
                return Err(LobbyError::NameInvalid(new_name.to_string()));
            }
            let (Some(list), Some(mut data)) = (maps.list.remove(name), maps.data.remove(name))
            else {
                return Err(LobbyError::Internal(format!("list/data desync for {name:?}")));
            };
            data.context.rename(clean);
            maps.list.insert(clean.to_string(), list);
            maps.data.insert(clean.to_string(), data);
            maps.snapshot()
        };

        // Tell everyone on the old channel, then move the channel itself.
        self.broadcast_on(&channel_id(name), &LobbyEvent::Name { new_name: clean.to_string() })
            .await;
        if let Err(e) = self.bus.rename(&channel_id(name), &channel_id(clean)).await {
            tracing::warn!(lobby = name, error = %e, "channel rename failed");
        }
        self.persist(snapshot).await;
        tracing::info!(old = name, new = clean, "lobby renamed");
        Ok(())
    }

    /// Replaces or clears a lobby's password. Idempotent.
    pub async fn set_password(&self, name: &str, password: &str) -> Result<(), LobbyError> {
        let password = if password.is_empty() {
            None
        } else {
            Some(hash_password(password)?)
        };
        let snapshot = {
            let mut maps = self.maps.lock().await;
            if !maps.contains_both(name) {
                return Err(LobbyError::NameMissing(name.to_string()));
            }
            let Some(data) = maps.data.get_mut(name) else {
                return Err(LobbyError::Internal(format!("list/data desync for {name:?}")));
            };
            data.password = password;
            maps.snapshot()
        };
        self.persist(snapshot).await;
        Ok(())
    }

    /// Selects a lobby's map by workshop id.
    pub async fn set_map(&self, name: &str, map_id: &str) -> Result<(), LobbyError> {
        {
            let maps = self.maps.lock().await;
            if !maps.contains_both(name) {
                return Err(LobbyError::NameMissing(name.to_string()));
            }
        }

        // The active tournament map stays out of lobbies. Upstream sources
        // disagree about whether ids are strings or numbers, so compare the
        // normalized text values, not the incoming type.
        if let Some(reserved) = &self.config.reserved_map_id {
            if reserved.trim() == map_id.trim() {
                return Err(LobbyError::MapReserved(map_id.to_string()));
            }
        }

        let map = self.workshop.fetch_map(map_id).await?;

        let snapshot = {
            let mut maps = self.maps.lock().await;
            // The lobby may have died during the fetch.
            let Some(data) = maps.data.get_mut(name) else {
                return Err(LobbyError::NameMissing(name.to_string()));
            };
            data.context.map = Some(map.clone());
            maps.snapshot()
        };
        self.broadcast(name, &LobbyEvent::Map { new_map: map }).await;
        self.persist(snapshot).await;
        tracing::info!(lobby = name, map = map_id, "lobby map set");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Ready protocol
    // -----------------------------------------------------------------

    /// Changes a member's ready state.
    ///
    /// `force` is the internal reset path (run completion, game-client
    /// disconnect): it only ever requests not-ready and is allowed while a
    /// game is in progress.
    pub async fn ready(
        &self,
        name: &str,
        desired: bool,
        steamid: &SteamId,
        force: bool,
    ) -> Result<(), LobbyError> {
        if desired {
            self.ready_up(name, steamid, force).await
        } else {
            self.unready(name, steamid, force).await
        }
    }

    async fn unready(&self, name: &str, steamid: &SteamId, force: bool) -> Result<(), LobbyError> {
        let snapshot = {
            let mut maps = self.maps.lock().await;
            if !maps.contains_both(name) {
                return Err(LobbyError::NameMissing(name.to_string()));
            }
            let Some(data) = maps.data.get_mut(name) else {
                return Err(LobbyError::Internal(format!("list/data desync for {name:?}")));
            };
            if !force && data.state == LobbyState::InProgress {
                return Err(LobbyError::GameInProgress(name.to_string()));
            }
            let Some(session) = data.players.get_mut(steamid) else {
                return Err(LobbyError::UnknownParticipant(steamid.clone()));
            };
            session.ready = false;
            // Tear down a mid-flight map check; its waiter resolves as
            // cancelled.
            session.pending_check = None;
            if data.players.values().all(|s| !s.ready) {
                if data.state == LobbyState::InProgress {
                    tracing::info!(lobby = name, "no one ready, lobby back to idle");
                }
                data.state = LobbyState::Idle;
            }
            maps.snapshot()
        };
        self.broadcast(name, &LobbyEvent::Ready { steamid: steamid.clone(), ready_state: false })
            .await;
        self.persist(snapshot).await;
        Ok(())
    }

    async fn ready_up(&self, name: &str, steamid: &SteamId, force: bool) -> Result<(), LobbyError> {
        let seq = self.next_check_seq.fetch_add(1, Ordering::Relaxed);

        // Phase 1: validate and arm the pending check. Arming is the last
        // fallible-free step under the lock, so no exit path can leave a
        // pending entry without its waiter. The lock is released before
        // waiting on the game client.
        let (lobby, map_file, game_conn, query, check_rx) = {
            let mut maps = self.maps.lock().await;
            if !maps.contains_both(name) {
                return Err(LobbyError::NameMissing(name.to_string()));
            }
            let Some(data) = maps.data.get_mut(name) else {
                return Err(LobbyError::Internal(format!("list/data desync for {name:?}")));
            };
            if !force && data.state == LobbyState::InProgress {
                return Err(LobbyError::GameInProgress(name.to_string()));
            }
            let Some(map) = &data.context.map else {
                return Err(LobbyError::NoMapSelected(name.to_string()));
            };
            let map_file = map.file.clone();
            let lobby = data.id;
            let query =
                speedlobby_protocol::to_bytes(&GameServerMessage::CheckMap(map_file.clone()))
                    .map_err(|e| LobbyError::Internal(format!("query encode failed: {e}")))?;
            let Some(session) = data.players.get_mut(steamid) else {
                return Err(LobbyError::UnknownParticipant(steamid.clone()));
            };
            let Some(conn) = session.game_conn.clone() else {
                return Err(LobbyError::GameClientNotConnected(steamid.clone()));
            };
            let rx = session.begin_check(seq);
            (lobby, map_file, conn, query, rx)
        };

        game_conn.send(&query);

        let has_map = match tokio::time::timeout(self.config.map_check_timeout, check_rx).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(_)) => {
                // The pending entry was superseded or torn down while we
                // waited; any reply now belongs to the newer request.
                tracing::debug!(%lobby, %steamid, "map check superseded");
                return Err(LobbyError::Timeout(steamid.clone()));
            }
            Err(_) => {
                let mut maps = self.maps.lock().await;
                if let Some(current) = maps.name_of(lobby) {
                    if let Some(session) = maps
                        .data
                        .get_mut(&current)
                        .and_then(|d| d.players.get_mut(steamid))
                    {
                        session.clear_check_if(seq);
                    }
                }
                tracing::debug!(%lobby, %steamid, "map check timed out");
                return Err(LobbyError::Timeout(steamid.clone()));
            }
        };

        if !has_map {
            return Err(LobbyError::MapNotPresent(steamid.clone()));
        }

        // Phase 2: the reply won the race. Re-resolve everything — the
        // lobby may have been renamed and membership may have changed
        // during the round trip.
        let (current, snapshot, started) = {
            let mut maps = self.maps.lock().await;
            let Some(current) = maps.name_of(lobby) else {
                return Err(LobbyError::NameMissing(name.to_string()));
            };
            let Some(data) = maps.data.get_mut(&current) else {
                return Err(LobbyError::NameMissing(current));
            };
            let Some(session) = data.players.get_mut(steamid) else {
                return Err(LobbyError::UnknownParticipant(steamid.clone()));
            };
            session.ready = true;
            // Quorum over the session map as it is right now, not as it
            // was when the check started.
            let everyone_ready = data.players.values().all(|s| s.ready);
            let started = everyone_ready && data.state == LobbyState::Idle;
            if started {
                data.state = LobbyState::InProgress;
            }
            (current, maps.snapshot(), started)
        };

        if started {
            tracing::info!(lobby = %current, "all members ready, starting");
            self.broadcast(&current, &LobbyEvent::Start { map: map_file }).await;
        }
        self.broadcast(&current, &LobbyEvent::Ready { steamid: steamid.clone(), ready_state: true })
            .await;
        self.persist(snapshot).await;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Channel event handling
    // -----------------------------------------------------------------

    async fn handle_channel_event(&self, lobby: LobbyId, event: ChannelEvent) {
        match event {
            ChannelEvent::Message { identity, payload, conn } => {
                match speedlobby_protocol::from_bytes::<GameClientMessage>(&payload) {
                    Ok(GameClientMessage::IsGame) => {
                        self.handle_is_game(lobby, &identity, conn).await;
                    }
                    Ok(GameClientMessage::CheckMap(answer)) => {
                        self.handle_check_reply(lobby, &identity, answer).await;
                    }
                    Ok(GameClientMessage::FinishRun(run)) => {
                        self.handle_finish_run(lobby, &identity, run).await;
                    }
                    Err(e) => {
                        tracing::debug!(
                            %lobby, %identity, error = %e,
                            "undecodable channel message ignored"
                        );
                    }
                }
            }
            ChannelEvent::Closed { identity, conn } => {
                self.handle_closed(lobby, &identity, conn).await;
            }
        }
    }

    /// Role declaration: this connection is the identity's game client.
    async fn handle_is_game(&self, lobby: LobbyId, steamid: &SteamId, conn: BusConnection) {
        let mut maps = self.maps.lock().await;
        let Some(name) = maps.name_of(lobby) else { return };
        let Some(session) = maps
            .data
            .get_mut(&name)
            .and_then(|d| d.players.get_mut(steamid))
        else {
            tracing::debug!(%lobby, %steamid, "role declaration from non-member ignored");
            return;
        };
        // A later declaration silently replaces the former — the old
        // connection is assumed stale.
        session.game_conn = Some(conn);
        tracing::debug!(lobby = %name, %steamid, "game client attached");
    }

    /// Map-check reply: resolve the pending query, or drop it as stale.
    async fn handle_check_reply(&self, lobby: LobbyId, steamid: &SteamId, has_map: bool) {
        let mut maps = self.maps.lock().await;
        let Some(name) = maps.name_of(lobby) else { return };
        let Some(session) = maps
            .data
            .get_mut(&name)
            .and_then(|d| d.players.get_mut(steamid))
        else {
            return;
        };
        if !session.resolve_check(has_map) {
            tracing::debug!(lobby = %name, %steamid, "stale map check reply dropped");
        }
    }

    /// Run completion: submit to the ranking service under the lobby's own
    /// context, tell everyone, and reset the submitter so another round can
    /// start.
    async fn handle_finish_run(&self, lobby: LobbyId, steamid: &SteamId, run: RunResult) {
        let (name, mode, context) = {
            let maps = self.maps.lock().await;
            let Some(name) = maps.name_of(lobby) else { return };
            let (Some(list), Some(data)) = (maps.list.get(&name), maps.data.get(&name)) else {
                return;
            };
            (name, list.mode, data.context.clone())
        };

        if let Err(e) = self.ranking.submit(mode, steamid, &run, "", &context).await {
            tracing::warn!(lobby = %name, %steamid, error = %e, "run submission failed");
            return;
        }
        tracing::info!(lobby = %name, %steamid, time = run.time, "run submitted");

        self.broadcast(
            &name,
            &LobbyEvent::Submit {
                value: RunSubmission {
                    time: run.time,
                    portals: run.portals,
                    steamid: steamid.clone(),
                },
            },
        )
        .await;

        if let Err(e) = self.ready(&name, false, steamid, true).await {
            tracing::warn!(lobby = %name, %steamid, error = %e, "post-run ready reset failed");
        }
    }

    /// Disconnect handling. A game attachment gets a soft disconnect — the
    /// member stays, their readiness resets. Anything else is the browser:
    /// the member leaves, and an emptied lobby starts its deletion grace
    /// timer.
    async fn handle_closed(&self, lobby: LobbyId, steamid: &SteamId, conn: BusConnection) {
        enum Disconnect {
            Game { name: String },
            Browser { name: String, now_empty: bool, snapshot: LobbySnapshot },
        }

        let disconnect = {
            let mut maps = self.maps.lock().await;
            let Some(name) = maps.name_of(lobby) else { return };
            let Some(data) = maps.data.get_mut(&name) else { return };
            let Some(session) = data.players.get_mut(steamid) else {
                // An attachment for someone no longer on the roster.
                return;
            };

            if session.is_game_conn(conn.id()) {
                session.game_conn = None;
                Disconnect::Game { name }
            } else {
                // Dropping the session also cancels any in-flight map check.
                data.players.remove(steamid);
                let Some(list) = maps.list.get_mut(&name) else { return };
                list.players.retain(|p| p != steamid);
                let now_empty = list.players.is_empty();
                Disconnect::Browser { name, now_empty, snapshot: maps.snapshot() }
            }
        };

        match disconnect {
            Disconnect::Game { name } => {
                tracing::info!(lobby = %name, %steamid, "game client detached");
                if let Err(e) = self.ready(&name, false, steamid, true).await {
                    tracing::debug!(
                        lobby = %name, %steamid, error = %e,
                        "ready reset after detach failed"
                    );
                }
            }
            Disconnect::Browser { name, now_empty, snapshot } => {
                tracing::info!(lobby = %name, %steamid, "member left");
                self.broadcast(&name, &LobbyEvent::Leave { steamid: steamid.clone() }).await;
                self.persist(snapshot).await;
                if now_empty {
                    self.schedule_delete(lobby);
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Grace-period deletion
    // -----------------------------------------------------------------

    fn schedule_delete(&self, lobby: LobbyId) {
        let service = self.self_ref.clone();
        let grace = self.config.delete_grace;
        tracing::debug!(%lobby, grace_secs = grace.as_secs(), "deletion scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let Some(service) = service.upgrade() else { return };
            service.delete_if_empty(lobby).await;
        });
    }

    async fn delete_if_empty(&self, lobby: LobbyId) {
        let (name, snapshot) = {
            let mut maps = self.maps.lock().await;
            let Some(name) = maps.name_of(lobby) else {
                // Already gone.
                return;
            };
            // Emptiness is re-checked at fire time: a rejoin during the
            // grace window keeps the lobby.
            if maps.list.get(&name).is_some_and(|l| !l.players.is_empty()) {
                tracing::debug!(lobby = %name, "deletion aborted, lobby repopulated");
                return;
            }
            maps.list.remove(&name);
            maps.data.remove(&name);
            (name, maps.snapshot())
        };
        self.persist(snapshot).await;
        // Another deletion path may have won the race for the channel;
        // that's expected, not a fault.
        if let Err(e) = self.bus.delete(&channel_id(&name)).await {
            tracing::debug!(lobby = %name, error = %e, "channel already removed");
        }
        tracing::info!(lobby = %name, "empty lobby deleted");
    }

    // -----------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------

    async fn persist(&self, snapshot: LobbySnapshot) {
        if let Some(store) = &self.store {
            if let Err(e) = store.persist(&snapshot).await {
                tracing::error!(error = %e, "snapshot persist failed");
            }
        }
    }

    async fn broadcast(&self, name: &str, event: &LobbyEvent) {
        self.broadcast_on(&channel_id(name), event).await;
    }

    async fn broadcast_on(&self, channel: &str, event: &LobbyEvent) {
        let bytes = match speedlobby_protocol::to_bytes(event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(channel, error = %e, "event encode failed");
                return;
            }
        };
        // The channel can vanish between a mutation and its broadcast;
        // nothing to tell anyone then.
        if let Err(e) = self.bus.send(channel, bytes).await {
            tracing::debug!(channel, error = %e, "broadcast skipped");
        }
    }
}

// ---------------------------------------------------------------------------
// Channel plumbing
// ---------------------------------------------------------------------------

/// Admits only identities currently on the lobby's roster.
struct RosterAuthorizer {
    service: Weak<LobbyService>,
    lobby: LobbyId,
}

#[async_trait]
impl ChannelAuthorizer for RosterAuthorizer {
    async fn authorize(&self, identity: &SteamId) -> bool {
        let Some(service) = self.service.upgrade() else { return false };
        let maps = service.maps.lock().await;
        let Some(name) = maps.name_of(self.lobby) else { return false };
        maps.list
            .get(&name)
            .is_some_and(|l| l.players.contains(identity))
    }
}

/// The per-lobby mailbox: channel events are processed one at a time, in
/// arrival order, for the lobby's whole life. Ends when the channel is
/// deleted (the bus drops the event sender) or the service is gone.
async fn channel_listener(
    service: Weak<LobbyService>,
    lobby: LobbyId,
    mut events: mpsc::UnboundedReceiver<ChannelEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(service) = service.upgrade() else { break };
        service.handle_channel_event(lobby, event).await;
    }
    tracing::debug!(%lobby, "channel listener stopped");
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not a phc string"));
    }

    #[test]
    fn test_channel_id_prefix() {
        assert_eq!(channel_id("speedrun"), "lobby_speedrun");
    }
}
