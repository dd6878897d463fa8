//! Registry configuration.

use std::time::Duration;

/// Timings and limits for the lobby registry.
///
/// Tests override these to make timeout behavior deterministic; production
/// runs on the defaults.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// Longest allowed lobby name in characters, counted after trimming.
    pub name_max_len: usize,

    /// How long to wait for a game client to answer a map-presence query
    /// before the ready transition fails.
    pub map_check_timeout: Duration,

    /// How long an empty lobby lingers before deletion. A rejoin within
    /// this window keeps the lobby alive.
    pub delete_grace: Duration,

    /// Workshop id of the map reserved for the active tournament round.
    /// Selecting it in a lobby is rejected so lobby runs can't shadow the
    /// official board. `None` disables the guard.
    pub reserved_map_id: Option<String>,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            name_max_len: 50,
            map_check_timeout: Duration::from_secs(15),
            delete_grace: Duration::from_secs(10),
            reserved_map_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LobbyConfig::default();
        assert_eq!(config.name_max_len, 50);
        assert_eq!(config.map_check_timeout, Duration::from_secs(15));
        assert_eq!(config.delete_grace, Duration::from_secs(10));
        assert!(config.reserved_map_id.is_none());
    }
}
