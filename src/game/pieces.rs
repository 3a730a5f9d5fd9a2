use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::board::{Board, Position, MAX_INDEX, MIN_INDEX};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a pawn push.
    pub fn forward(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn back_row(self) -> i32 {
        match self {
            Color::White => MIN_INDEX,
            Color::Black => MAX_INDEX,
        }
    }

    pub fn pawn_home_row(self) -> i32 {
        self.back_row() + self.forward()
    }

    /// The row where this colour's pawns promote.
    pub fn promotion_row(self) -> i32 {
        self.opponent().back_row()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    /// Kinds a pawn may turn into, in the order they are generated.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::King => "king",
            PieceKind::Queen => "queen",
            PieceKind::Rook => "rook",
            PieceKind::Bishop => "bishop",
            PieceKind::Knight => "knight",
            PieceKind::Pawn => "pawn",
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(color: Color, kind: PieceKind) -> Self {
        Piece { color, kind }
    }

    /// FEN-style letter, upper case for White.
    pub fn symbol(&self) -> char {
        let c = match self.kind {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Pawn => 'p',
        };
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChessMove {
    pub start: Position,
    pub end: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion_piece: Option<PieceKind>,
}

impl ChessMove {
    pub fn new(start: Position, end: Position, promotion_piece: Option<PieceKind>) -> Self {
        ChessMove {
            start,
            end,
            promotion_piece,
        }
    }
}

impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.start, self.end)?;
        if let Some(kind) = self.promotion_piece {
            write!(f, "={}", Piece::new(Color::White, kind).symbol())?;
        }
        Ok(())
    }
}

const ROOK_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const KING_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];
const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

/// Pseudo-legal moves for `piece` standing on `from`. Self-check is not considered.
pub fn piece_moves(piece: Piece, board: &Board, from: Position) -> Vec<ChessMove> {
    let mut moves = Vec::new();
    match piece.kind {
        PieceKind::King => step_moves(piece, board, from, &KING_OFFSETS, &mut moves),
        PieceKind::Knight => step_moves(piece, board, from, &KNIGHT_OFFSETS, &mut moves),
        PieceKind::Rook => ray_moves(piece, board, from, &ROOK_DIRECTIONS, &mut moves),
        PieceKind::Bishop => ray_moves(piece, board, from, &BISHOP_DIRECTIONS, &mut moves),
        PieceKind::Queen => {
            ray_moves(piece, board, from, &ROOK_DIRECTIONS, &mut moves);
            ray_moves(piece, board, from, &BISHOP_DIRECTIONS, &mut moves);
        }
        PieceKind::Pawn => pawn_moves(piece, board, from, &mut moves),
    }
    moves
}

fn is_enemy(piece: Piece, board: &Board, position: Position) -> bool {
    board
        .piece_at(position)
        .is_some_and(|other| other.color != piece.color)
}

fn step_moves(
    piece: Piece,
    board: &Board,
    from: Position,
    offsets: &[(i32, i32)],
    moves: &mut Vec<ChessMove>,
) {
    for (rows, cols) in offsets {
        if let Some(to) = from.offset(*rows, *cols) {
            if board.is_empty_at(to) || is_enemy(piece, board, to) {
                moves.push(ChessMove::new(from, to, None));
            }
        }
    }
}

fn ray_moves(
    piece: Piece,
    board: &Board,
    from: Position,
    directions: &[(i32, i32)],
    moves: &mut Vec<ChessMove>,
) {
    for (rows, cols) in directions {
        let mut current = from;
        while let Some(to) = current.offset(*rows, *cols) {
            match board.piece_at(to) {
                None => moves.push(ChessMove::new(from, to, None)),
                Some(other) => {
                    if other.color != piece.color {
                        moves.push(ChessMove::new(from, to, None));
                    }
                    break;
                }
            }
            current = to;
        }
    }
}

fn pawn_moves(piece: Piece, board: &Board, from: Position, moves: &mut Vec<ChessMove>) {
    let forward = piece.color.forward();

    if let Some(one) = from.offset(forward, 0) {
        if board.is_empty_at(one) {
            push_pawn_move(piece, from, one, moves);

            if from.row() == piece.color.pawn_home_row() {
                if let Some(two) = from.offset(2 * forward, 0) {
                    if board.is_empty_at(two) {
                        moves.push(ChessMove::new(from, two, None));
                    }
                }
            }
        }
    }

    for side in [-1, 1] {
        if let Some(to) = from.offset(forward, side) {
            if is_enemy(piece, board, to) {
                push_pawn_move(piece, from, to, moves);
            }
        }
    }
}

fn push_pawn_move(piece: Piece, from: Position, to: Position, moves: &mut Vec<ChessMove>) {
    if to.row() == piece.color.promotion_row() {
        for kind in PieceKind::PROMOTIONS {
            moves.push(ChessMove::new(from, to, Some(kind)));
        }
    } else {
        moves.push(ChessMove::new(from, to, None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pos(row: i32, col: i32) -> Position {
        Position::new(row, col).unwrap()
    }

    fn destinations(moves: &[ChessMove]) -> HashSet<Position> {
        moves.iter().map(|mv| mv.end).collect()
    }

    fn lone(piece: Piece, at: Position) -> Vec<ChessMove> {
        let mut board = Board::new();
        board.add_piece(at, piece);
        piece_moves(piece, &board, at)
    }

    #[test]
    fn king_in_corner_has_three_moves() {
        let moves = lone(Piece::new(Color::White, PieceKind::King), pos(1, 1));
        assert_eq!(
            destinations(&moves),
            HashSet::from([pos(1, 2), pos(2, 1), pos(2, 2)])
        );
    }

    #[test]
    fn knight_in_centre_has_eight_moves() {
        let moves = lone(Piece::new(Color::Black, PieceKind::Knight), pos(4, 4));
        assert_eq!(moves.len(), 8);
        let corner = lone(Piece::new(Color::Black, PieceKind::Knight), pos(8, 8));
        assert_eq!(destinations(&corner), HashSet::from([pos(6, 7), pos(7, 6)]));
    }

    #[test]
    fn queen_on_empty_board_sees_27_squares() {
        let moves = lone(Piece::new(Color::White, PieceKind::Queen), pos(4, 4));
        assert_eq!(moves.len(), 27);
    }

    #[test]
    fn rays_stop_at_first_piece_and_capture_enemies() {
        let rook = Piece::new(Color::White, PieceKind::Rook);
        let mut board = Board::new();
        board.add_piece(pos(1, 1), rook);
        board.add_piece(pos(4, 1), Piece::new(Color::Black, PieceKind::Pawn));
        board.add_piece(pos(1, 3), Piece::new(Color::White, PieceKind::Knight));

        let ends = destinations(&piece_moves(rook, &board, pos(1, 1)));
        assert_eq!(ends, HashSet::from([pos(2, 1), pos(3, 1), pos(4, 1), pos(1, 2)]));
    }

    #[test]
    fn bishop_blocked_by_own_piece() {
        let board = Board::default_layout();
        let bishop = Piece::new(Color::White, PieceKind::Bishop);
        assert!(piece_moves(bishop, &board, pos(1, 3)).is_empty());
    }

    #[test]
    fn pawn_double_push_only_from_home_row() {
        let board = Board::default_layout();
        let white = Piece::new(Color::White, PieceKind::Pawn);
        assert_eq!(
            destinations(&piece_moves(white, &board, pos(2, 5))),
            HashSet::from([pos(3, 5), pos(4, 5)])
        );

        let black = Piece::new(Color::Black, PieceKind::Pawn);
        assert_eq!(
            destinations(&piece_moves(black, &board, pos(7, 2))),
            HashSet::from([pos(6, 2), pos(5, 2)])
        );

        let moved = lone(white, pos(3, 5));
        assert_eq!(destinations(&moved), HashSet::from([pos(4, 5)]));
    }

    #[test]
    fn pawn_double_push_needs_both_squares_empty() {
        let white = Piece::new(Color::White, PieceKind::Pawn);
        let mut board = Board::new();
        board.add_piece(pos(2, 4), white);
        board.add_piece(pos(3, 4), Piece::new(Color::Black, PieceKind::Knight));
        assert!(piece_moves(white, &board, pos(2, 4)).is_empty());

        board.remove_piece(pos(3, 4));
        board.add_piece(pos(4, 4), Piece::new(Color::Black, PieceKind::Knight));
        assert_eq!(
            destinations(&piece_moves(white, &board, pos(2, 4))),
            HashSet::from([pos(3, 4)])
        );
    }

    #[test]
    fn pawn_captures_diagonally_only_enemies() {
        let black = Piece::new(Color::Black, PieceKind::Pawn);
        let mut board = Board::new();
        board.add_piece(pos(5, 5), black);
        board.add_piece(pos(4, 4), Piece::new(Color::White, PieceKind::Bishop));
        board.add_piece(pos(4, 6), Piece::new(Color::Black, PieceKind::Bishop));
        board.add_piece(pos(4, 5), Piece::new(Color::White, PieceKind::Rook));

        let moves = piece_moves(black, &board, pos(5, 5));
        assert_eq!(moves, vec![ChessMove::new(pos(5, 5), pos(4, 4), None)]);
    }

    #[test]
    fn pawn_reaching_last_row_emits_four_promotions() {
        let white = Piece::new(Color::White, PieceKind::Pawn);
        let mut board = Board::new();
        board.add_piece(pos(7, 3), white);
        board.add_piece(pos(8, 4), Piece::new(Color::Black, PieceKind::Rook));

        let moves = piece_moves(white, &board, pos(7, 3));
        assert_eq!(moves.len(), 8);
        assert!(moves.iter().all(|mv| mv.promotion_piece.is_some()));
        assert!(moves.contains(&ChessMove::new(pos(7, 3), pos(8, 4), Some(PieceKind::Knight))));
        assert!(moves.contains(&ChessMove::new(pos(7, 3), pos(8, 3), Some(PieceKind::Queen))));
    }

    #[test]
    fn move_json_uses_camel_case_promotion() {
        let mv = ChessMove::new(pos(7, 3), pos(8, 3), Some(PieceKind::Queen));
        let json = serde_json::to_value(mv).unwrap();
        assert_eq!(json["promotionPiece"], "QUEEN");
        assert_eq!(json["start"], serde_json::json!({"row": 7, "col": 3}));
        assert_eq!(mv.to_string(), "c7c8=Q");
    }
}
