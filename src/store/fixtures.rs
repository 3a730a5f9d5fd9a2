use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::models::GameData;
use crate::store::{MemoryAuthVerifier, MemoryGameStore, StoreError};

/// Seed data for the in-memory stores: issued tokens and existing games.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Fixtures {
    /// token -> username
    #[serde(default)]
    pub tokens: HashMap<String, String>,
    #[serde(default)]
    pub games: Vec<GameData>,
}

impl Fixtures {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = fs::read_to_string(path).map_err(|e| StoreError::Fixture {
            reason: format!("reading {}", path.display()),
            source: Some(Box::new(e)),
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, StoreError> {
        serde_json::from_str(text).map_err(|e| StoreError::Fixture {
            reason: "invalid fixture json".to_string(),
            source: Some(Box::new(e)),
        })
    }

    /// One open game between alice (white) and bob (black); carol can watch.
    pub fn demo() -> Self {
        let tokens = [("alice-token", "alice"), ("bob-token", "bob"), ("carol-token", "carol")]
            .into_iter()
            .map(|(token, user)| (token.to_string(), user.to_string()))
            .collect();
        Fixtures {
            tokens,
            games: vec![GameData::new(1, "demo").with_players(Some("alice"), Some("bob"))],
        }
    }

    pub fn apply(self, auth: &MemoryAuthVerifier, store: &MemoryGameStore) {
        info!(
            "Seeding {} token(s) and {} game(s)",
            self.tokens.len(),
            self.games.len()
        );
        for (token, username) in self.tokens {
            auth.insert(token, username);
        }
        for game in self.games {
            store.insert(game);
        }
    }
}
