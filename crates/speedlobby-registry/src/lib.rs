//! Lobby coordination for speedlobby.
//!
//! This crate is the authoritative in-memory registry of multiplayer
//! lobbies. Each lobby pairs two connection roles per participant — a
//! browser attachment and an in-title game attachment on the same channel —
//! and coordinates readiness, map selection, and match start across all
//! members before handing finished runs off to the ranking service.
//!
//! # Key types
//!
//! - [`LobbyService`] — the registry instance; all control-plane operations
//!   and connection-event handling go through it
//! - [`ListEntry`] / [`DataEntrySnapshot`] — the public and private views of
//!   a lobby
//! - [`PlayerSession`] — per-member readiness and connection state
//! - [`LobbyConfig`] — timings and limits (map-check timeout, deletion grace)
//! - The traits in [`external`] — the collaborators this crate consumes but
//!   does not implement (identity directory, workshop index, ranking
//!   service, snapshot store)
//!
//! # Concurrency
//!
//! Registry state sits behind one async mutex that is never held across a
//! bus round trip, a collaborator call, or a persistence write. Connection
//! events are funneled through a per-lobby listener task, so one lobby's
//! channel callbacks are processed in arrival order, while control-plane
//! calls interleave at their own suspension points and re-validate
//! everything they touch after each one.

mod config;
mod context;
mod error;
pub mod external;
mod registry;
mod service;
mod session;

pub use config::LobbyConfig;
pub use context::{Category, LobbyContext, ScopedBoard};
pub use error::LobbyError;
pub use external::{
    Identity, IdentityDirectory, JsonFileStore, RankingService, SnapshotStore, WorkshopIndex,
};
pub use registry::{
    DataEntrySnapshot, ListEntry, LobbyId, LobbySnapshot, LobbyState, PlayerSessionSnapshot,
};
pub use service::LobbyService;
pub use session::PlayerSession;
