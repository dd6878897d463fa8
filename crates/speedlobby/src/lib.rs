//! # speedlobby
//!
//! Multiplayer lobby coordination for workshop speedrun tournaments.
//!
//! A lobby pairs each participant's browser connection with their in-title
//! game connection on one channel, synchronizes map selection and
//! readiness across all members, starts the round when everyone is ready,
//! and hands finished runs off to the ranking service.
//!
//! This meta-crate ties the layers together and provides the control-plane
//! boundary: textual commands in, opaque result codes out. The interesting
//! machinery lives below it:
//!
//! - [`speedlobby_protocol`] — wire types and message shapes
//! - [`speedlobby_bus`] — the named channel bus
//! - [`speedlobby_registry`] — the lobby registry and readiness protocol

pub mod command;
mod error;

pub use command::{ControlCommand, handle};
pub use error::SpeedlobbyError;

pub use speedlobby_bus::{ChannelBus, InMemoryBus};
pub use speedlobby_registry::{LobbyConfig, LobbyService};
