//! Collaborators the dispatcher talks to: token lookup and game persistence.

pub mod fixtures;
pub mod memory;

use thiserror::Error;

use crate::models::GameData;

pub use fixtures::Fixtures;
pub use memory::{MemoryAuthVerifier, MemoryGameStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("game {0} not found")]
    GameNotFound(i32),

    #[error("could not load fixtures: {reason}")]
    Fixture {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Resolves an auth token to the username it was issued for.
pub trait AuthVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<String, StoreError>;
}

/// Storage for [`GameData`] records keyed by game id.
pub trait GameStore: Send + Sync {
    fn get(&self, game_id: i32) -> Result<Option<GameData>, StoreError>;

    /// Replaces an existing record; fails with [`StoreError::GameNotFound`] for unknown ids.
    fn update(&self, data: GameData) -> Result<(), StoreError>;
}
