pub mod app_state;
pub mod game_data;
pub mod messages;

// Re-export important types
pub use app_state::*;
pub use game_data::*;
pub use messages::*;
