use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

use crate::game::pieces::{ChessMove, Color, Piece, PieceKind};

/// Smallest and largest valid row / column index.
pub const MIN_INDEX: i32 = 1;
pub const MAX_INDEX: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("position ({row}, {col}) is off the board")]
    OffBoard { row: i32, col: i32 },
}

/// Raw, unchecked coordinates as they arrive on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub row: i32,
    #[serde(alias = "column")]
    pub col: i32,
}

/// A square on the board. Rows and columns both run 1..=8, row 1 is White's back rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Coordinates")]
pub struct Position {
    row: u8,
    col: u8,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Result<Self, PositionError> {
        if (MIN_INDEX..=MAX_INDEX).contains(&row) && (MIN_INDEX..=MAX_INDEX).contains(&col) {
            Ok(Position {
                row: row as u8,
                col: col as u8,
            })
        } else {
            Err(PositionError::OffBoard { row, col })
        }
    }

    pub fn row(&self) -> i32 {
        self.row as i32
    }

    pub fn col(&self) -> i32 {
        self.col as i32
    }

    /// The square `rows`/`cols` away, or `None` if that falls off the board.
    pub fn offset(&self, rows: i32, cols: i32) -> Option<Position> {
        Position::new(self.row() + rows, self.col() + cols).ok()
    }
}

impl TryFrom<Coordinates> for Position {
    type Error = PositionError;

    fn try_from(value: Coordinates) -> Result<Self, Self::Error> {
        Position::new(value.row, value.col)
    }
}

impl fmt::Display for Position {
    // Algebraic notation, column 1 is file 'a'.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.col - 1) as char;
        write!(f, "{}{}", file, self.row)
    }
}

/// One occupied square, the serialized form of a board entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Square {
    pub position: Position,
    pub piece: Piece,
}

/// Sparse board: only occupied squares are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Square>", into = "Vec<Square>")]
pub struct Board {
    squares: BTreeMap<Position, Piece>,
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Board {
    pub fn new() -> Self {
        Board::default()
    }

    /// A board holding the standard opening layout.
    pub fn default_layout() -> Self {
        let mut board = Board::new();
        board.reset();
        board
    }

    /// Clears the board and sets up both armies.
    pub fn reset(&mut self) {
        self.squares.clear();
        for color in [Color::White, Color::Black] {
            let back_row = color.back_row();
            let pawn_row = color.pawn_home_row();
            for (index, kind) in BACK_RANK.iter().enumerate() {
                let col = index as i32 + 1;
                self.place(back_row, col, Piece::new(color, *kind));
                self.place(pawn_row, col, Piece::new(color, PieceKind::Pawn));
            }
        }
    }

    fn place(&mut self, row: i32, col: i32, piece: Piece) {
        // Layout coordinates are constants inside the board.
        if let Ok(position) = Position::new(row, col) {
            self.squares.insert(position, piece);
        }
    }

    pub fn add_piece(&mut self, position: Position, piece: Piece) {
        self.squares.insert(position, piece);
    }

    pub fn remove_piece(&mut self, position: Position) -> Option<Piece> {
        self.squares.remove(&position)
    }

    pub fn piece_at(&self, position: Position) -> Option<Piece> {
        self.squares.get(&position).copied()
    }

    pub fn is_empty_at(&self, position: Position) -> bool {
        !self.squares.contains_key(&position)
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.squares.iter().map(|(position, piece)| (*position, *piece))
    }

    pub fn pieces_of(&self, color: Color) -> Vec<(Position, Piece)> {
        self.pieces().filter(|(_, piece)| piece.color == color).collect()
    }

    pub fn king_position(&self, color: Color) -> Option<Position> {
        self.pieces()
            .find(|(_, piece)| piece.color == color && piece.kind == PieceKind::King)
            .map(|(position, _)| position)
    }

    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    /// Moves the piece at `mv.start` to `mv.end` and hands back a guard that puts
    /// both squares back when dropped. Returns `None` when `mv.start` is empty.
    pub fn simulate(&mut self, mv: &ChessMove) -> Option<Simulation<'_>> {
        let moved = self.squares.remove(&mv.start)?;
        let captured = self.squares.insert(mv.end, moved);
        Some(Simulation {
            board: self,
            undo: Some(Undo {
                start: mv.start,
                end: mv.end,
                moved,
                captured,
            }),
        })
    }
}

impl From<Vec<Square>> for Board {
    fn from(value: Vec<Square>) -> Self {
        Board {
            squares: value.into_iter().map(|sq| (sq.position, sq.piece)).collect(),
        }
    }
}

impl From<Board> for Vec<Square> {
    fn from(value: Board) -> Self {
        value
            .squares
            .into_iter()
            .map(|(position, piece)| Square { position, piece })
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (MIN_INDEX..=MAX_INDEX).rev() {
            write!(f, "{} ", row)?;
            for col in MIN_INDEX..=MAX_INDEX {
                let symbol = Position::new(row, col)
                    .ok()
                    .and_then(|position| self.piece_at(position))
                    .map(|piece| piece.symbol())
                    .unwrap_or('.');
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        write!(f, "  abcdefgh")
    }
}

#[derive(Debug, Clone, Copy)]
struct Undo {
    start: Position,
    end: Position,
    moved: Piece,
    captured: Option<Piece>,
}

/// A move applied to a board that is reverted on drop unless committed.
pub struct Simulation<'a> {
    board: &'a mut Board,
    undo: Option<Undo>,
}

impl<'a> Simulation<'a> {
    /// Replaces the moved piece on its destination square.
    pub fn promote(&mut self, kind: PieceKind) {
        if let Some(undo) = self.undo {
            self.board
                .squares
                .insert(undo.end, Piece::new(undo.moved.color, kind));
        }
    }

    /// Keeps the move on the board.
    pub fn commit(mut self) {
        self.undo = None;
    }
}

impl<'a> Deref for Simulation<'a> {
    type Target = Board;

    fn deref(&self) -> &Board {
        &*self.board
    }
}

impl<'a> Drop for Simulation<'a> {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            self.board.squares.insert(undo.start, undo.moved);
            match undo.captured {
                Some(piece) => {
                    self.board.squares.insert(undo.end, piece);
                }
                None => {
                    self.board.squares.remove(&undo.end);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: i32, col: i32) -> Position {
        Position::new(row, col).unwrap()
    }

    #[test]
    fn rejects_off_board_positions() {
        assert_eq!(
            Position::new(0, 3),
            Err(PositionError::OffBoard { row: 0, col: 3 })
        );
        assert!(Position::new(8, 9).is_err());
        assert!(pos(1, 1).offset(-1, 0).is_none());
        assert_eq!(pos(4, 4).offset(2, -1), Some(pos(6, 3)));
    }

    #[test]
    fn displays_algebraic_squares() {
        assert_eq!(pos(2, 5).to_string(), "e2");
        assert_eq!(pos(8, 1).to_string(), "a8");
    }

    #[test]
    fn default_layout_is_standard() {
        let board = Board::default_layout();
        assert_eq!(board.len(), 32);
        assert_eq!(
            board.piece_at(pos(1, 5)),
            Some(Piece::new(Color::White, PieceKind::King))
        );
        assert_eq!(
            board.piece_at(pos(8, 4)),
            Some(Piece::new(Color::Black, PieceKind::Queen))
        );
        assert_eq!(
            board.piece_at(pos(7, 8)),
            Some(Piece::new(Color::Black, PieceKind::Pawn))
        );
        assert_eq!(board.piece_at(pos(4, 4)), None);
        assert_eq!(board.king_position(Color::Black), Some(pos(8, 5)));
    }

    #[test]
    fn simulation_reverts_on_drop() {
        let mut board = Board::default_layout();
        board.add_piece(pos(3, 4), Piece::new(Color::Black, PieceKind::Knight));
        let before = board.clone();
        {
            let mv = ChessMove::new(pos(2, 5), pos(3, 4), None);
            let sim = board.simulate(&mv).unwrap();
            assert_eq!(
                sim.piece_at(pos(3, 4)),
                Some(Piece::new(Color::White, PieceKind::Pawn))
            );
            assert!(sim.is_empty_at(pos(2, 5)));
        }
        assert_eq!(board, before);
    }

    #[test]
    fn simulation_reverts_when_unwinding() {
        let mut board = Board::default_layout();
        board.add_piece(pos(3, 4), Piece::new(Color::Black, PieceKind::Knight));
        let before = board.clone();
        let mv = ChessMove::new(pos(2, 5), pos(3, 4), None);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _sim = board.simulate(&mv);
            panic!("check test blew up");
        }));

        assert!(result.is_err());
        assert_eq!(board, before);
    }

    #[test]
    fn committed_simulation_stays() {
        let mut board = Board::default_layout();
        let mv = ChessMove::new(pos(7, 1), pos(5, 1), None);
        board.simulate(&mv).unwrap().commit();
        assert!(board.is_empty_at(pos(7, 1)));
        assert_eq!(
            board.piece_at(pos(5, 1)),
            Some(Piece::new(Color::Black, PieceKind::Pawn))
        );
    }

    #[test]
    fn simulating_from_empty_square_is_none() {
        let mut board = Board::new();
        let mv = ChessMove::new(pos(4, 4), pos(5, 4), None);
        assert!(board.simulate(&mv).is_none());
    }

    #[test]
    fn serializes_as_square_list() {
        let mut board = Board::new();
        board.add_piece(pos(1, 5), Piece::new(Color::White, PieceKind::King));
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"position": {"row": 1, "col": 5}, "piece": {"color": "WHITE", "kind": "KING"}}
            ])
        );
        let back: Board = serde_json::from_value(json).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn refuses_to_deserialize_off_board_square() {
        let json = r#"[{"position": {"row": 9, "col": 1}, "piece": {"color": "WHITE", "kind": "KING"}}]"#;
        assert!(serde_json::from_str::<Board>(json).is_err());
    }
}
