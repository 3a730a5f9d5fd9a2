use actix::Message;
use serde::{Deserialize, Serialize};

use crate::game::{ChessMove, Coordinates, Game, PieceKind, PositionError};

/// Kind of command a client can send over the socket
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    Connect,
    MakeMove,
    Leave,
    Resign,
}

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserGameCommand {
    pub command_type: CommandType,
    pub auth_token: String,
    #[serde(rename = "gameID")]
    pub game_id: i32,
    #[serde(default, rename = "move", skip_serializing_if = "Option::is_none")]
    pub chess_move: Option<MovePayload>,
}

impl UserGameCommand {
    pub fn new(command_type: CommandType, auth_token: impl Into<String>, game_id: i32) -> Self {
        UserGameCommand {
            command_type,
            auth_token: auth_token.into(),
            game_id,
            chess_move: None,
        }
    }

    pub fn make_move(auth_token: impl Into<String>, game_id: i32, payload: MovePayload) -> Self {
        UserGameCommand {
            chess_move: Some(payload),
            ..UserGameCommand::new(CommandType::MakeMove, auth_token, game_id)
        }
    }
}

/// Unchecked move as sent by a client
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    #[serde(alias = "startPosition")]
    pub start: Coordinates,
    #[serde(alias = "endPosition")]
    pub end: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion_piece: Option<PieceKind>,
}

impl MovePayload {
    pub fn new(start: (i32, i32), end: (i32, i32), promotion_piece: Option<PieceKind>) -> Self {
        MovePayload {
            start: Coordinates {
                row: start.0,
                col: start.1,
            },
            end: Coordinates {
                row: end.0,
                col: end.1,
            },
            promotion_piece,
        }
    }

    /// Checks the coordinates and builds the engine's move.
    pub fn to_move(&self) -> Result<ChessMove, PositionError> {
        Ok(ChessMove::new(
            self.start.try_into()?,
            self.end.try_into()?,
            self.promotion_piece,
        ))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessageType {
    LoadGame,
    Error,
    Notification,
}

/// Message sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    pub server_message_type: ServerMessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<Game>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ServerMessage {
    pub fn load_game(game: Game) -> Self {
        ServerMessage {
            server_message_type: ServerMessageType::LoadGame,
            game: Some(game),
            message: None,
            error_message: None,
        }
    }

    pub fn notification(message: impl Into<String>) -> Self {
        ServerMessage {
            server_message_type: ServerMessageType::Notification,
            game: None,
            message: Some(message.into()),
            error_message: None,
        }
    }

    pub fn error(error_message: impl Into<String>) -> Self {
        ServerMessage {
            server_message_type: ServerMessageType::Error,
            game: None,
            message: None,
            error_message: Some(format!("Error: {}", error_message.into())),
        }
    }
}

/// Message type for WebSocket communication
#[derive(Message)]
#[rtype(result = "()")]
pub struct ChessWebSocketMessage(pub String);
