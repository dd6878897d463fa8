//! Per-lobby scoped context.
//!
//! Every lobby runs against its own isolated context: the map its members
//! race on and a minimal category configuration for the ranking service.
//! Runs submitted under a lobby context land on that lobby's board, never
//! on the main tournament dataset.

use serde::{Deserialize, Serialize};
use speedlobby_protocol::MapInfo;

/// One ranked category in a scoped board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub title: String,
    /// Whether the category ranks by portal count rather than time.
    pub portals: bool,
}

/// The category configuration a lobby's runs are recorded against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedBoard {
    pub categories: Vec<Category>,
}

/// The isolated execution context of a single lobby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyContext {
    /// Scope name, `lobby_<name>`. Doubles as the ranking-service scope key.
    pub name: String,
    /// The currently selected map, if any.
    pub map: Option<MapInfo>,
    pub board: ScopedBoard,
}

impl LobbyContext {
    /// Creates the default context for a fresh lobby: no map, one
    /// free-for-all category, nothing else.
    pub fn new(lobby: &str) -> Self {
        Self {
            name: format!("lobby_{lobby}"),
            map: None,
            board: ScopedBoard {
                categories: vec![Category {
                    name: "ffa".to_string(),
                    title: "Free For All".to_string(),
                    portals: false,
                }],
            },
        }
    }

    /// Re-scopes the context after a lobby rename so later submissions
    /// land under the new name.
    pub fn rename(&mut self, lobby: &str) {
        self.name = format!("lobby_{lobby}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_seeds_single_ffa_category() {
        let ctx = LobbyContext::new("speedrun");
        assert_eq!(ctx.name, "lobby_speedrun");
        assert!(ctx.map.is_none());
        assert_eq!(ctx.board.categories.len(), 1);
        let ffa = &ctx.board.categories[0];
        assert_eq!(ffa.name, "ffa");
        assert_eq!(ffa.title, "Free For All");
        assert!(!ffa.portals);
    }

    #[test]
    fn test_rename_rescopes_context() {
        let mut ctx = LobbyContext::new("old");
        ctx.rename("new");
        assert_eq!(ctx.name, "lobby_new");
    }
}
