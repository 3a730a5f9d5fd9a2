use crate::game::pieces::{ChessMove, Color, PieceKind};
use crate::game::rules::{Game, Outcome};

/// Convert a chess color to a string
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

/// Get the game status as a string
pub fn get_game_status(game: &Game) -> String {
    match game.outcome() {
        Some(Outcome::Checkmate { winner }) | Some(Outcome::Resignation { winner }) => {
            format!("{}_wins", color_to_string(winner))
        }
        Some(Outcome::Stalemate) => "stalemate".to_string(),
        None => {
            if game.is_in_check(game.turn()) {
                "check".to_string()
            } else {
                format!("{}_turn", color_to_string(game.turn()))
            }
        }
    }
}

/// Human readable summary of a committed move, e.g. "alice moved pawn from e2 to e4."
pub fn describe_move(username: &str, kind: PieceKind, mv: &ChessMove) -> String {
    match mv.promotion_piece {
        Some(promoted) => format!(
            "{} moved {} from {} to {} and promoted to {}.",
            username, kind, mv.start, mv.end, promoted
        ),
        None => format!("{} moved {} from {} to {}.", username, kind, mv.start, mv.end),
    }
}

/// Announcement sent to everybody when a game ends. `name_of` maps a colour to its player.
pub fn game_over_announcement<F>(outcome: &Outcome, name_of: F) -> String
where
    F: Fn(Color) -> String,
{
    match outcome {
        Outcome::Checkmate { winner } => format!(
            "{} is in checkmate. {} wins.",
            name_of(winner.opponent()),
            name_of(*winner)
        ),
        Outcome::Stalemate => "Stalemate. The game is a draw.".to_string(),
        Outcome::Resignation { winner } => format!(
            "{} resigned. {} wins.",
            name_of(winner.opponent()),
            name_of(*winner)
        ),
    }
}
