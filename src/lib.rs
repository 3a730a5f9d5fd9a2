//! Chess rule engine plus a websocket server that keeps every connection of a
//! game (players and observers) in sync.

pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod store;
pub mod websocket;

pub use error::DispatchError;
pub use websocket::CommandDispatcher;
