//! Per-member session state.
//!
//! A `PlayerSession` exists for every member of a lobby, from join to leave.
//! It tracks the three things the readiness protocol needs: whether the
//! member is ready, which connection (if any) is their in-title game client,
//! and an in-flight map-presence query.

use speedlobby_bus::{BusConnection, ConnectionId};
use tokio::sync::oneshot;

/// A single-use callback for an outstanding map-presence query.
///
/// The receiving half lives with the task that requested the check, wrapped
/// in its timeout — so every exit route (reply, timeout, supersession,
/// teardown) disposes of the pair. `seq` ties a waiter to its own entry:
/// a timed-out waiter must not clear a successor's pending check.
#[derive(Debug)]
pub(crate) struct PendingMapCheck {
    tx: oneshot::Sender<bool>,
    seq: u64,
}

/// Connection and readiness state for one lobby member.
#[derive(Debug, Default)]
pub struct PlayerSession {
    /// The member answered the most recent map check affirmatively.
    pub ready: bool,
    pub(crate) game_conn: Option<BusConnection>,
    pub(crate) pending_check: Option<PendingMapCheck>,
}

impl PlayerSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live game attachment is recorded for this member.
    pub fn has_game_conn(&self) -> bool {
        self.game_conn.is_some()
    }

    /// Whether `id` is the recorded game attachment.
    pub(crate) fn is_game_conn(&self, id: ConnectionId) -> bool {
        self.game_conn.as_ref().is_some_and(|c| c.id() == id)
    }

    /// Arms a new map-presence callback tagged `seq`, superseding any
    /// pending one. The superseded waiter's receiver resolves as cancelled
    /// the moment its sender drops here — last request wins.
    pub(crate) fn begin_check(&mut self, seq: u64) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        self.pending_check = Some(PendingMapCheck { tx, seq });
        rx
    }

    /// Resolves the pending check with the game client's answer. Returns
    /// `false` when nothing was pending — a stale reply to drop.
    pub(crate) fn resolve_check(&mut self, has_map: bool) -> bool {
        match self.pending_check.take() {
            Some(pending) => {
                let _ = pending.tx.send(has_map);
                true
            }
            None => false,
        }
    }

    /// Clears the pending check only if it is still the one tagged `seq`.
    pub(crate) fn clear_check_if(&mut self, seq: u64) {
        if self.pending_check.as_ref().is_some_and(|p| p.seq == seq) {
            self.pending_check = None;
        }
    }
}
