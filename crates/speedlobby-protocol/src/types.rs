//! Core identity and metadata types.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SteamId
// ---------------------------------------------------------------------------

/// A participant's Steam identity.
///
/// Newtype over the textual steamid64 so a lobby name or a map id can never
/// be passed where an identity is expected. `#[serde(transparent)]` keeps the
/// JSON representation a plain string — `SteamId("7656...")` serializes as
/// `"7656..."`, which is what the browser and game clients send.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SteamId(pub String);

impl SteamId {
    /// Creates a `SteamId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SteamId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// The play mode of a lobby.
///
/// Free-for-all is the only mode today; the enum exists so the wire format
/// carries a mode string the clients can switch on when more are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Ffa,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ffa => write!(f, "ffa"),
        }
    }
}

// ---------------------------------------------------------------------------
// MapInfo
// ---------------------------------------------------------------------------

/// Workshop map metadata, as resolved by the workshop index.
///
/// `file` is the on-disk map reference that game clients are asked to verify
/// before readying up; the rest is display metadata for the browser UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapInfo {
    /// Workshop item id. Kept as a string — some upstream sources hand
    /// back numbers, and comparisons are done on the normalized text.
    pub id: String,
    pub title: String,
    pub author: String,
    /// Map file reference, e.g. `workshop/<id>/<name>.bsp`.
    pub file: String,
    pub thumbnail: String,
}

// ---------------------------------------------------------------------------
// RunResult
// ---------------------------------------------------------------------------

/// A finished run as reported by a game client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Elapsed time in seconds.
    pub time: f64,
    /// Portal count for the run.
    pub portals: u32,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steamid_serializes_as_plain_string() {
        let json = serde_json::to_string(&SteamId::new("76561198012345678")).unwrap();
        assert_eq!(json, "\"76561198012345678\"");
    }

    #[test]
    fn test_steamid_deserializes_from_plain_string() {
        let id: SteamId = serde_json::from_str("\"76561198012345678\"").unwrap();
        assert_eq!(id, SteamId::new("76561198012345678"));
    }

    #[test]
    fn test_steamid_display() {
        assert_eq!(SteamId::new("42").to_string(), "42");
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        let json = serde_json::to_string(&Mode::Ffa).unwrap();
        assert_eq!(json, "\"ffa\"");
    }

    #[test]
    fn test_mode_default_is_ffa() {
        assert_eq!(Mode::default(), Mode::Ffa);
    }

    #[test]
    fn test_map_info_round_trip() {
        let map = MapInfo {
            id: "3298240625".into(),
            title: "Overgrown".into(),
            author: "someone".into(),
            file: "workshop/3298240625/overgrown.bsp".into(),
            thumbnail: "1234/ABCD".into(),
        };
        let bytes = serde_json::to_vec(&map).unwrap();
        let decoded: MapInfo = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(map, decoded);
    }

    #[test]
    fn test_run_result_json_fields() {
        let run = RunResult { time: 61.25, portals: 14 };
        let json: serde_json::Value = serde_json::to_value(run).unwrap();
        assert_eq!(json["time"], 61.25);
        assert_eq!(json["portals"], 14);
    }
}
