pub mod board;
pub mod pieces;
pub mod rules;
pub mod utils;

// Re-export important types
pub use board::{Board, Coordinates, Position, PositionError};
pub use pieces::{piece_moves, ChessMove, Color, Piece, PieceKind};
pub use rules::{king_in_check, Game, GameStatus, MoveError, Outcome};
