//! JSON encode/decode helpers.
//!
//! Everything on the lobby channel is JSON — it is what the deployed browser
//! page and the game-client plugin both speak, and it keeps payloads
//! inspectable in DevTools. These two helpers are the only place the crate
//! touches `serde_json`, so a future binary format has a single seam.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Serializes a wire value to JSON bytes.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(value).map_err(ProtocolError::Encode)
}

/// Deserializes a wire value from JSON bytes.
pub fn from_bytes<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(data).map_err(ProtocolError::Decode)
}
