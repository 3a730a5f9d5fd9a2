use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::board::{Board, Position};
use crate::game::pieces::{piece_moves, ChessMove, Color, PieceKind};

/// Why a move or resignation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("the game is over")]
    GameOver,
    #[error("no piece at {0}")]
    NoPiece(Position),
    #[error("it is not {0:?}'s turn")]
    NotYourTurn(Color),
    #[error("illegal move {0}")]
    IllegalMove(ChessMove),
    #[error("move {0} leaves the king in check")]
    LeavesKingInCheck(ChessMove),
    #[error("a pawn reaching the last row must name a promotion piece")]
    PromotionRequired,
    #[error("only a pawn reaching the last row may promote")]
    UnexpectedPromotion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
    Resignation { winner: Color },
}

impl Outcome {
    pub fn winner(&self) -> Option<Color> {
        match self {
            Outcome::Checkmate { winner } | Outcome::Resignation { winner } => Some(*winner),
            Outcome::Stalemate => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Active,
    Over { outcome: Outcome },
}

/// A game of chess: board, side to move and whether it has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    turn: Color,
    status: GameStatus,
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

impl Game {
    /// Standard starting position, White to move.
    pub fn new() -> Self {
        Game {
            board: Board::default_layout(),
            turn: Color::White,
            status: GameStatus::Active,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn set_turn(&mut self, color: Color) {
        self.turn = color;
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// The recorded outcome, falling back to what the board shows right now.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.status {
            GameStatus::Over { outcome } => Some(outcome),
            GameStatus::Active => self.detect_outcome(),
        }
    }

    /// Legal moves for the piece on `start`; empty when the square is empty.
    pub fn valid_moves(&mut self, start: Position) -> Vec<ChessMove> {
        let piece = match self.board.piece_at(start) {
            Some(piece) => piece,
            None => return Vec::new(),
        };

        piece_moves(piece, &self.board, start)
            .into_iter()
            .filter(|mv| {
                self.board
                    .simulate(mv)
                    .map(|sim| !king_in_check(&sim, piece.color))
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn make_move(&mut self, mv: ChessMove) -> Result<(), MoveError> {
        if self.is_game_over() {
            return Err(MoveError::GameOver);
        }
        let piece = self.board.piece_at(mv.start).ok_or(MoveError::NoPiece(mv.start))?;
        if piece.color != self.turn {
            return Err(MoveError::NotYourTurn(piece.color));
        }

        let promotes = piece.kind == PieceKind::Pawn && mv.end.row() == piece.color.promotion_row();
        match (promotes, mv.promotion_piece) {
            (true, None) => return Err(MoveError::PromotionRequired),
            (false, Some(_)) => return Err(MoveError::UnexpectedPromotion),
            _ => {}
        }

        if !self.valid_moves(mv.start).contains(&mv) {
            return Err(MoveError::IllegalMove(mv));
        }

        {
            let mut sim = self
                .board
                .simulate(&mv)
                .ok_or(MoveError::NoPiece(mv.start))?;
            if let Some(kind) = mv.promotion_piece {
                sim.promote(kind);
            }
            if king_in_check(&sim, piece.color) {
                return Err(MoveError::LeavesKingInCheck(mv));
            }
            sim.commit();
        }

        self.turn = self.turn.opponent();
        if let Some(outcome) = self.detect_outcome() {
            debug!("Game finished after {}: {:?}", mv, outcome);
            self.status = GameStatus::Over { outcome };
        }
        Ok(())
    }

    /// `color` gives up; the opponent wins.
    pub fn resign(&mut self, color: Color) -> Result<Outcome, MoveError> {
        if self.is_game_over() {
            return Err(MoveError::GameOver);
        }
        let outcome = Outcome::Resignation {
            winner: color.opponent(),
        };
        self.status = GameStatus::Over { outcome };
        Ok(outcome)
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        king_in_check(&self.board, color)
    }

    pub fn is_in_checkmate(&mut self, color: Color) -> bool {
        self.is_in_check(color) && !self.has_any_valid_move(color)
    }

    pub fn is_in_stalemate(&mut self, color: Color) -> bool {
        !self.is_in_check(color) && !self.has_any_valid_move(color)
    }

    pub fn is_game_over(&self) -> bool {
        match self.status {
            GameStatus::Over { .. } => true,
            GameStatus::Active => self.detect_outcome().is_some(),
        }
    }

    fn has_any_valid_move(&mut self, color: Color) -> bool {
        let positions: Vec<Position> = self
            .board
            .pieces_of(color)
            .into_iter()
            .map(|(position, _)| position)
            .collect();
        positions
            .into_iter()
            .any(|position| !self.valid_moves(position).is_empty())
    }

    // Works on a scratch copy so read-only callers can ask too.
    fn detect_outcome(&self) -> Option<Outcome> {
        let mut scratch = self.clone();
        for color in [self.turn, self.turn.opponent()] {
            if scratch.is_in_checkmate(color) {
                return Some(Outcome::Checkmate {
                    winner: color.opponent(),
                });
            }
            if scratch.is_in_stalemate(color) {
                return Some(Outcome::Stalemate);
            }
        }
        None
    }
}

/// True when any opposing piece attacks `color`'s king. A board without that king is never in check.
pub fn king_in_check(board: &Board, color: Color) -> bool {
    let king = match board.king_position(color) {
        Some(king) => king,
        None => return false,
    };
    board
        .pieces()
        .filter(|(_, piece)| piece.color != color)
        .any(|(position, piece)| {
            piece_moves(piece, board, position)
                .iter()
                .any(|mv| mv.end == king)
        })
}
