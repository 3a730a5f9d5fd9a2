use serde::{Deserialize, Serialize};

use crate::game::{Color, Game};

/// Persisted record of one game: who sits where plus the game itself.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    #[serde(rename = "gameID")]
    pub game_id: i32,
    #[serde(default)]
    pub white_username: Option<String>,
    #[serde(default)]
    pub black_username: Option<String>,
    pub game_name: String,
    #[serde(default)]
    pub game: Game,
}

impl GameData {
    /// A fresh game with both seats open.
    pub fn new(game_id: i32, game_name: impl Into<String>) -> Self {
        GameData {
            game_id,
            white_username: None,
            black_username: None,
            game_name: game_name.into(),
            game: Game::new(),
        }
    }

    pub fn with_players(mut self, white: Option<&str>, black: Option<&str>) -> Self {
        self.white_username = white.map(str::to_string);
        self.black_username = black.map(str::to_string);
        self
    }

    /// The colour `username` plays in this game, if any.
    pub fn color_of(&self, username: &str) -> Option<Color> {
        if self.white_username.as_deref() == Some(username) {
            Some(Color::White)
        } else if self.black_username.as_deref() == Some(username) {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn username_of(&self, color: Color) -> Option<&str> {
        match color {
            Color::White => self.white_username.as_deref(),
            Color::Black => self.black_username.as_deref(),
        }
    }

    /// Frees the seat of `color`.
    pub fn clear_seat(&mut self, color: Color) {
        match color {
            Color::White => self.white_username = None,
            Color::Black => self.black_username = None,
        }
    }
}
