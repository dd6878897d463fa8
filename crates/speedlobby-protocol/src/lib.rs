//! Wire types for the speedlobby coordination service.
//!
//! This crate defines every shape that crosses a process boundary: the
//! identity types, the messages exchanged with in-title game clients over a
//! lobby's channel, and the events broadcast to every attached connection.
//! Browser and game clients speak JSON, so the serde attributes here pin the
//! exact field names and tag values the client code expects — the tests
//! assert against literal JSON for that reason.

mod codec;
mod error;
mod types;
mod wire;

pub use codec::{from_bytes, to_bytes};
pub use error::ProtocolError;
pub use types::{MapInfo, Mode, RunResult, SteamId};
pub use wire::{GameClientMessage, GameServerMessage, LobbyEvent, RunSubmission};
