//! Message shapes for the lobby channel.
//!
//! Three families travel over a lobby's channel:
//!
//! - [`GameClientMessage`] — game client → server. The role declaration,
//!   map-check replies, and finished runs.
//! - [`GameServerMessage`] — server → a single game client. Today that is
//!   only the map-presence query.
//! - [`LobbyEvent`] — server → every attached connection. Lifecycle
//!   broadcasts the browser UI reacts to.
//!
//! The tag values and field names are load-bearing: they are the contract
//! with deployed clients, so every variant has a literal-JSON test below.

use serde::{Deserialize, Serialize};

use crate::types::{MapInfo, RunResult, SteamId};

// ---------------------------------------------------------------------------
// Game channel: client → server
// ---------------------------------------------------------------------------

/// A message sent by an in-title game client over the lobby channel.
///
/// `#[serde(tag = "type", content = "value")]` produces the adjacently
/// tagged form the clients emit: `{"type": "checkMap", "value": true}`.
/// The unit variant `IsGame` has no content, so it collapses to
/// `{"type": "isGame"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum GameClientMessage {
    /// Role declaration — sent right after the connection is authorized.
    /// Everything without this handshake is treated as a browser.
    IsGame,
    /// Reply to the server's map-presence query.
    CheckMap(bool),
    /// A completed run, to be handed off to the ranking service.
    FinishRun(RunResult),
}

// ---------------------------------------------------------------------------
// Game channel: server → client
// ---------------------------------------------------------------------------

/// A query sent by the server to a single game client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum GameServerMessage {
    /// "Do you have this map file?" — answered with
    /// [`GameClientMessage::CheckMap`].
    CheckMap(String),
}

// ---------------------------------------------------------------------------
// Broadcast events
// ---------------------------------------------------------------------------

/// The payload of a `lobby_submit` broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSubmission {
    pub time: f64,
    pub portals: u32,
    pub steamid: SteamId,
}

/// A lifecycle event broadcast to every connection attached to a lobby.
///
/// Internally tagged; the tag values are the historical `lobby_*` strings.
/// `Submit` nests its fields under `value` while the others are flat —
/// that asymmetry is what the deployed browser page parses, so it stays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LobbyEvent {
    /// The lobby was renamed. Sent on the old channel just before the
    /// channel itself moves to the new id.
    #[serde(rename = "lobby_name")]
    Name {
        #[serde(rename = "newName")]
        new_name: String,
    },

    /// A member left (browser attachment closed).
    #[serde(rename = "lobby_leave")]
    Leave { steamid: SteamId },

    /// A participant joined the lobby.
    #[serde(rename = "lobby_join")]
    Join { steamid: SteamId },

    /// The lobby's map selection changed.
    #[serde(rename = "lobby_map")]
    Map {
        #[serde(rename = "newMap")]
        new_map: MapInfo,
    },

    /// A member's ready state changed.
    #[serde(rename = "lobby_ready")]
    Ready {
        steamid: SteamId,
        #[serde(rename = "readyState")]
        ready_state: bool,
    },

    /// Everyone is ready — the round starts on the given map file.
    #[serde(rename = "lobby_start")]
    Start { map: String },

    /// A member submitted a finished run.
    #[serde(rename = "lobby_submit")]
    Submit { value: RunSubmission },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Wire-shape tests. Each asserts the exact JSON the clients expect;
    //! a serde attribute change that alters a tag or field name must fail
    //! here before it ships.

    use super::*;

    fn sid(s: &str) -> SteamId {
        SteamId::new(s)
    }

    // =====================================================================
    // GameClientMessage
    // =====================================================================

    #[test]
    fn test_is_game_json_shape() {
        let json = serde_json::to_value(GameClientMessage::IsGame).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "isGame" }));
    }

    #[test]
    fn test_is_game_parses_from_wire_form() {
        let msg: GameClientMessage = serde_json::from_str(r#"{"type":"isGame"}"#).unwrap();
        assert_eq!(msg, GameClientMessage::IsGame);
    }

    #[test]
    fn test_check_map_reply_json_shape() {
        let json = serde_json::to_value(GameClientMessage::CheckMap(true)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "checkMap", "value": true }));
    }

    #[test]
    fn test_check_map_reply_negative() {
        let msg: GameClientMessage =
            serde_json::from_str(r#"{"type":"checkMap","value":false}"#).unwrap();
        assert_eq!(msg, GameClientMessage::CheckMap(false));
    }

    #[test]
    fn test_finish_run_json_shape() {
        let msg = GameClientMessage::FinishRun(RunResult { time: 83.5, portals: 7 });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "finishRun",
                "value": { "time": 83.5, "portals": 7 }
            })
        );
    }

    #[test]
    fn test_unknown_type_tag_is_an_error() {
        let result: Result<GameClientMessage, _> =
            serde_json::from_str(r#"{"type":"selfDestruct"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_garbage_is_an_error() {
        let result: Result<GameClientMessage, _> = serde_json::from_slice(b"not json");
        assert!(result.is_err());
    }

    // =====================================================================
    // GameServerMessage
    // =====================================================================

    #[test]
    fn test_check_map_query_json_shape() {
        let msg = GameServerMessage::CheckMap("workshop/123/map.bsp".into());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "checkMap", "value": "workshop/123/map.bsp" })
        );
    }

    // =====================================================================
    // LobbyEvent — one shape test per variant
    // =====================================================================

    #[test]
    fn test_lobby_name_event() {
        let ev = LobbyEvent::Name { new_name: "rematch".into() };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "lobby_name", "newName": "rematch" }));
    }

    #[test]
    fn test_lobby_leave_event() {
        let ev = LobbyEvent::Leave { steamid: sid("76561198000000001") };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "lobby_leave", "steamid": "76561198000000001" })
        );
    }

    #[test]
    fn test_lobby_join_event() {
        let ev = LobbyEvent::Join { steamid: sid("1") };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "lobby_join", "steamid": "1" }));
    }

    #[test]
    fn test_lobby_map_event_carries_full_metadata() {
        let ev = LobbyEvent::Map {
            new_map: MapInfo {
                id: "99".into(),
                title: "t".into(),
                author: "a".into(),
                file: "workshop/99/t.bsp".into(),
                thumbnail: "th".into(),
            },
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "lobby_map");
        assert_eq!(json["newMap"]["file"], "workshop/99/t.bsp");
        assert_eq!(json["newMap"]["title"], "t");
    }

    #[test]
    fn test_lobby_ready_event() {
        let ev = LobbyEvent::Ready { steamid: sid("1"), ready_state: true };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "lobby_ready", "steamid": "1", "readyState": true })
        );
    }

    #[test]
    fn test_lobby_start_event() {
        let ev = LobbyEvent::Start { map: "workshop/99/t.bsp".into() };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "lobby_start", "map": "workshop/99/t.bsp" })
        );
    }

    #[test]
    fn test_lobby_submit_event_nests_under_value() {
        let ev = LobbyEvent::Submit {
            value: RunSubmission { time: 45.0, portals: 3, steamid: sid("1") },
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "lobby_submit",
                "value": { "time": 45.0, "portals": 3, "steamid": "1" }
            })
        );
    }

    #[test]
    fn test_lobby_event_round_trip() {
        let ev = LobbyEvent::Ready { steamid: sid("7"), ready_state: false };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: LobbyEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }
}
