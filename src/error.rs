use thiserror::Error;

use crate::game::{MoveError, PositionError};
use crate::store::StoreError;

/// Everything that can go wrong while handling one client command.
/// The message is sent back to the originating connection only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unauthorized")]
    Auth,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("could not save game: {0}")]
    Persistence(String),
}

impl DispatchError {
    pub fn validation(message: impl Into<String>) -> Self {
        DispatchError::Validation(message.into())
    }

    pub fn game_not_found(game_id: i32) -> Self {
        DispatchError::NotFound(format!("game {} not found", game_id))
    }
}

impl From<MoveError> for DispatchError {
    fn from(value: MoveError) -> Self {
        DispatchError::Validation(value.to_string())
    }
}

impl From<PositionError> for DispatchError {
    fn from(value: PositionError) -> Self {
        DispatchError::Validation(value.to_string())
    }
}

impl From<StoreError> for DispatchError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unauthorized => DispatchError::Auth,
            StoreError::GameNotFound(game_id) => DispatchError::game_not_found(game_id),
            other => DispatchError::Persistence(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Color;

    #[test]
    fn error_display_messages() {
        assert_eq!(DispatchError::Auth.to_string(), "unauthorized");
        assert_eq!(DispatchError::game_not_found(12).to_string(), "game 12 not found");
        assert_eq!(
            DispatchError::from(MoveError::NotYourTurn(Color::Black)).to_string(),
            "it is not Black's turn"
        );
    }

    #[test]
    fn store_errors_map_onto_the_taxonomy() {
        assert_eq!(DispatchError::from(StoreError::Unauthorized), DispatchError::Auth);
        assert!(matches!(
            DispatchError::from(StoreError::GameNotFound(3)),
            DispatchError::NotFound(_)
        ));
        let fixture = StoreError::Fixture {
            reason: "broken".into(),
            source: None,
        };
        assert!(matches!(
            DispatchError::from(fixture),
            DispatchError::Persistence(_)
        ));
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DispatchError>();
    }
}
