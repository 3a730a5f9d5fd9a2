//! Live connections per game.
//!
//! Every game id with at least one registered connection owns a [`GameRoom`].
//! The room's mutex is the per-game lock: whoever holds it may read the game,
//! change it, persist it and broadcast, and nobody else touching the same game
//! can interleave. Rooms of different games are independent.

use actix::prelude::SendError as ActixSendError;
use actix::Recipient;
use futures::channel::mpsc::UnboundedSender;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ChessWebSocketMessage, ServerMessage};

pub type ConnectionId = Uuid;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("connection closed")]
    Closed,
    #[error("outbound mailbox full")]
    Full,
    #[error("could not encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where outbound messages for one connection go. Sending never blocks.
pub trait MessageSink: Send + Sync {
    fn send(&self, message: &ServerMessage) -> Result<(), SendError>;
}

impl MessageSink for Recipient<ChessWebSocketMessage> {
    fn send(&self, message: &ServerMessage) -> Result<(), SendError> {
        let text = serde_json::to_string(message)?;
        self.try_send(ChessWebSocketMessage(text))
            .map_err(|err| match err {
                ActixSendError::Full(_) => SendError::Full,
                ActixSendError::Closed(_) => SendError::Closed,
            })
    }
}

impl MessageSink for UnboundedSender<ServerMessage> {
    fn send(&self, message: &ServerMessage) -> Result<(), SendError> {
        self.unbounded_send(message.clone())
            .map_err(|_| SendError::Closed)
    }
}

/// The transport side of a socket: its id and where to write to it.
#[derive(Clone)]
pub struct Client {
    pub id: ConnectionId,
    pub sink: Arc<dyn MessageSink>,
}

impl Client {
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Client {
            id: Uuid::new_v4(),
            sink,
        }
    }

    /// Sends straight to this client; used for replies to connections that may not be registered.
    pub fn reply(&self, message: &ServerMessage) {
        if let Err(e) = self.sink.send(message) {
            warn!("Could not reply to connection {}: {}", self.id, e);
        }
    }
}

/// A client registered in a game.
#[derive(Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub username: String,
    pub is_player: bool,
    sink: Arc<dyn MessageSink>,
}

impl Connection {
    pub fn new(client: &Client, username: impl Into<String>, is_player: bool) -> Self {
        Connection {
            id: client.id,
            username: username.into(),
            is_player,
            sink: client.sink.clone(),
        }
    }
}

/// Connections registered in one game. Only reachable through the room lock.
#[derive(Default)]
pub struct Connections {
    by_id: HashMap<ConnectionId, Connection>,
}

impl Connections {
    pub fn insert(&mut self, connection: Connection) {
        self.by_id.insert(connection.id, connection);
    }

    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        self.by_id.remove(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Sends to one registered connection, dropping it if the send fails.
    pub fn send_to(&mut self, id: ConnectionId, message: &ServerMessage) {
        let failed = match self.by_id.get(&id) {
            Some(connection) => deliver(connection, message).is_err(),
            None => false,
        };
        if failed {
            self.by_id.remove(&id);
        }
    }

    /// Sends to every connection except `except`. Connections whose send fails are dropped.
    pub fn broadcast(&mut self, message: &ServerMessage, except: Option<ConnectionId>) {
        let failed: Vec<ConnectionId> = self
            .by_id
            .values()
            .filter(|connection| Some(connection.id) != except)
            .filter(|connection| deliver(connection, message).is_err())
            .map(|connection| connection.id)
            .collect();

        for id in failed {
            self.by_id.remove(&id);
        }
    }
}

fn deliver(connection: &Connection, message: &ServerMessage) -> Result<(), SendError> {
    connection.sink.send(message).map_err(|e| {
        warn!(
            "Dropping connection {} ({}): {}",
            connection.id, connection.username, e
        );
        e
    })
}

pub struct GameRoom {
    game_id: i32,
    connections: Mutex<Connections>,
}

impl GameRoom {
    fn new(game_id: i32) -> Self {
        GameRoom {
            game_id,
            connections: Mutex::new(Connections::default()),
        }
    }

    /// Takes the per-game lock.
    pub fn lock(&self) -> MutexGuard<'_, Connections> {
        // A panic under the lock leaves the connection map intact.
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Game id -> room, for every game with live connections.
#[derive(Default)]
pub struct SessionRegistry {
    rooms: Mutex<HashMap<i32, Arc<GameRoom>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry::default()
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<i32, Arc<GameRoom>>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle on the room of `game_id`, creating it if needed.
    pub fn enter(&self, game_id: i32) -> RoomHandle<'_> {
        let room = self
            .rooms()
            .entry(game_id)
            .or_insert_with(|| {
                debug!("Opening room for game {}", game_id);
                Arc::new(GameRoom::new(game_id))
            })
            .clone();
        RoomHandle {
            registry: self,
            room: Some(room),
        }
    }

    /// Removes `id` from every room it is registered in. Returns the affected game ids.
    pub fn remove_connection(&self, id: ConnectionId) -> Vec<i32> {
        let game_ids: Vec<i32> = self.rooms().keys().copied().collect();
        let mut affected = Vec::new();
        for game_id in game_ids {
            let room = self.enter(game_id);
            if room.lock().remove(id).is_some() {
                info!("Removed connection {} from game {}", id, game_id);
                affected.push(game_id);
            }
        }
        affected
    }

    /// Number of live connections in `game_id`.
    pub fn connection_count(&self, game_id: i32) -> usize {
        let room = self.enter(game_id);
        let count = room.lock().len();
        count
    }

    /// Ids of games that currently have a room.
    pub fn game_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.rooms().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    // Nobody can clone a new handle while we hold the map lock, so a count of one
    // means no other thread is inside or waiting on this room.
    fn prune(&self, game_id: i32) {
        let mut rooms = self.rooms();
        let idle = rooms
            .get(&game_id)
            .map(|room| Arc::strong_count(room) == 1 && room.lock().is_empty())
            .unwrap_or(false);
        if idle {
            debug!("Closing empty room for game {}", game_id);
            rooms.remove(&game_id);
        }
    }
}

/// Shared access to a room; the room is discarded when the last handle goes and it is empty.
pub struct RoomHandle<'r> {
    registry: &'r SessionRegistry,
    room: Option<Arc<GameRoom>>,
}

impl<'r> Deref for RoomHandle<'r> {
    type Target = GameRoom;

    fn deref(&self) -> &GameRoom {
        match self.room {
            Some(ref room) => room,
            None => unreachable!("room handle used after release"),
        }
    }
}

impl<'r> Drop for RoomHandle<'r> {
    fn drop(&mut self) {
        if let Some(room) = self.room.take() {
            let game_id = room.game_id;
            drop(room);
            self.registry.prune(game_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc::{unbounded, UnboundedReceiver};

    fn client() -> (Client, UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = unbounded();
        (Client::new(Arc::new(tx)), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(Some(message)) = rx.try_next() {
            out.push(message);
        }
        out
    }

    #[test]
    fn rooms_exist_only_while_connections_are_registered() {
        let registry = SessionRegistry::new();
        let (alice, _rx) = client();
        {
            let room = registry.enter(5);
            room.lock().insert(Connection::new(&alice, "alice", true));
        }
        assert_eq!(registry.game_ids(), vec![5]);
        assert_eq!(registry.connection_count(5), 1);

        {
            let _room = registry.enter(6);
        }
        assert_eq!(registry.game_ids(), vec![5]);

        assert_eq!(registry.remove_connection(alice.id), vec![5]);
        assert!(registry.game_ids().is_empty());
        assert_eq!(registry.connection_count(5), 0);
    }

    #[test]
    fn broadcast_skips_the_excluded_connection() {
        let registry = SessionRegistry::new();
        let (alice, mut alice_rx) = client();
        let (bob, mut bob_rx) = client();
        let room = registry.enter(1);
        let mut connections = room.lock();
        connections.insert(Connection::new(&alice, "alice", true));
        connections.insert(Connection::new(&bob, "bob", false));

        connections.broadcast(&ServerMessage::notification("hello"), Some(alice.id));
        assert!(drain(&mut alice_rx).is_empty());
        assert_eq!(drain(&mut bob_rx), vec![ServerMessage::notification("hello")]);

        connections.broadcast(&ServerMessage::notification("all"), None);
        assert_eq!(drain(&mut alice_rx).len(), 1);
        assert_eq!(drain(&mut bob_rx).len(), 1);
    }

    #[test]
    fn failed_sends_remove_the_connection() {
        let registry = SessionRegistry::new();
        let (alice, alice_rx) = client();
        let (bob, mut bob_rx) = client();
        drop(alice_rx);

        let room = registry.enter(1);
        let mut connections = room.lock();
        connections.insert(Connection::new(&alice, "alice", true));
        connections.insert(Connection::new(&bob, "bob", true));

        connections.broadcast(&ServerMessage::notification("ping"), None);
        assert_eq!(connections.len(), 1);
        assert!(connections.get(alice.id).is_none());
        assert_eq!(drain(&mut bob_rx).len(), 1);
    }

    #[test]
    fn room_lock_serializes_access() {
        let registry = Arc::new(SessionRegistry::new());
        let (alice, _rx) = client();
        let room = registry.enter(3);
        let guard = room.lock();

        let other = registry.clone();
        let waiter = std::thread::spawn(move || {
            let room = other.enter(3);
            let connections = room.lock();
            connections.len()
        });

        // The spawned thread cannot observe the room until we let go.
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(!waiter.is_finished());
        let mut guard = guard;
        guard.insert(Connection::new(&alice, "alice", true));
        drop(guard);
        drop(room);

        assert_eq!(waiter.join().unwrap(), 1);
    }
}
