use log::debug;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::GameData;
use crate::store::{AuthVerifier, GameStore, StoreError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Token table kept in memory.
#[derive(Default)]
pub struct MemoryAuthVerifier {
    tokens: Mutex<HashMap<String, String>>,
}

impl MemoryAuthVerifier {
    pub fn new() -> Self {
        MemoryAuthVerifier::default()
    }

    pub fn insert(&self, token: impl Into<String>, username: impl Into<String>) {
        lock(&self.tokens).insert(token.into(), username.into());
    }
}

impl AuthVerifier for MemoryAuthVerifier {
    fn verify(&self, token: &str) -> Result<String, StoreError> {
        lock(&self.tokens)
            .get(token)
            .cloned()
            .ok_or(StoreError::Unauthorized)
    }
}

/// Game table kept in memory.
#[derive(Default)]
pub struct MemoryGameStore {
    games: Mutex<HashMap<i32, GameData>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        MemoryGameStore::default()
    }

    /// Adds or replaces a game record.
    pub fn insert(&self, data: GameData) {
        debug!("Storing game {} ({})", data.game_id, data.game_name);
        lock(&self.games).insert(data.game_id, data);
    }

    pub fn len(&self) -> usize {
        lock(&self.games).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.games).is_empty()
    }
}

impl GameStore for MemoryGameStore {
    fn get(&self, game_id: i32) -> Result<Option<GameData>, StoreError> {
        Ok(lock(&self.games).get(&game_id).cloned())
    }

    fn update(&self, data: GameData) -> Result<(), StoreError> {
        let mut games = lock(&self.games);
        match games.get_mut(&data.game_id) {
            Some(slot) => {
                *slot = data;
                Ok(())
            }
            None => Err(StoreError::GameNotFound(data.game_id)),
        }
    }
}
