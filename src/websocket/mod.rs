pub mod dispatcher;
pub mod handler;
pub mod session;

pub use dispatcher::CommandDispatcher;
pub use handler::{ws_index, ChessWebSocket};
pub use session::{Client, Connection, ConnectionId, MessageSink, SessionRegistry};
