use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::DispatchError;
use crate::game::utils::{color_to_string, describe_move, game_over_announcement, get_game_status};
use crate::game::Color;
use crate::models::{CommandType, GameData, MovePayload, ServerMessage, UserGameCommand};
use crate::store::{AuthVerifier, GameStore};
use crate::websocket::session::{Client, Connection, ConnectionId, Connections, SessionRegistry};

/// Routes client commands to the game they name.
///
/// Every command runs under its game's room lock from the moment the stored
/// game is read until the last broadcast went out, so two commands against the
/// same game never interleave. Errors go back to the sender only.
pub struct CommandDispatcher {
    auth: Arc<dyn AuthVerifier>,
    store: Arc<dyn GameStore>,
    registry: SessionRegistry,
}

impl CommandDispatcher {
    pub fn new(auth: Arc<dyn AuthVerifier>, store: Arc<dyn GameStore>) -> Self {
        CommandDispatcher {
            auth,
            store,
            registry: SessionRegistry::new(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Handles one inbound command from `client`.
    pub fn dispatch(&self, client: &Client, command: UserGameCommand) {
        let command_type = command.command_type;
        let game_id = command.game_id;
        debug!(
            "Dispatching {:?} for game {} from {}",
            command_type, game_id, client.id
        );

        if let Err(e) = self.try_dispatch(client, command) {
            warn!(
                "{:?} for game {} from {} failed: {}",
                command_type, game_id, client.id, e
            );
            client.reply(&ServerMessage::error(e.to_string()));
        }
    }

    /// Socket teardown: forget the connection everywhere, seats stay as they are.
    pub fn disconnect(&self, id: ConnectionId) {
        let games = self.registry.remove_connection(id);
        if !games.is_empty() {
            info!("Connection {} closed, left games {:?}", id, games);
        }
    }

    fn try_dispatch(&self, client: &Client, command: UserGameCommand) -> Result<(), DispatchError> {
        let username = self
            .auth
            .verify(&command.auth_token)
            .map_err(|_| DispatchError::Auth)?;

        let room = self.registry.enter(command.game_id);
        let mut connections = room.lock();

        let data = self
            .store
            .get(command.game_id)?
            .ok_or_else(|| DispatchError::game_not_found(command.game_id))?;

        match command.command_type {
            CommandType::Connect => self.handle_connect(client, username, data, &mut connections),
            CommandType::MakeMove => self.handle_move(
                client,
                &username,
                data,
                command.chess_move,
                &mut connections,
            ),
            CommandType::Leave => self.handle_leave(client, &username, data, &mut connections),
            CommandType::Resign => self.handle_resign(client, &username, data, &mut connections),
        }
    }

    fn persist(&self, data: &GameData) -> Result<(), DispatchError> {
        self.store
            .update(data.clone())
            .map_err(|e| DispatchError::Persistence(e.to_string()))
    }

    fn handle_connect(
        &self,
        client: &Client,
        username: String,
        data: GameData,
        connections: &mut Connections,
    ) -> Result<(), DispatchError> {
        let seat = data.color_of(&username);
        let notification = match seat {
            Some(color) => format!("{} joined the game as {}.", username, color_to_string(color)),
            None => format!("{} is observing the game.", username),
        };
        info!("{} connected to game {} ({:?})", username, data.game_id, seat);

        connections.insert(Connection::new(client, username, seat.is_some()));
        connections.send_to(client.id, &ServerMessage::load_game(data.game));
        connections.broadcast(&ServerMessage::notification(notification), Some(client.id));
        Ok(())
    }

    fn handle_move(
        &self,
        client: &Client,
        username: &str,
        mut data: GameData,
        payload: Option<MovePayload>,
        connections: &mut Connections,
    ) -> Result<(), DispatchError> {
        let color = player_color(client, username, &data, connections, "observers cannot make moves")?;

        if data.game.is_game_over() {
            return Err(DispatchError::validation("the game is over"));
        }

        let payload = payload.ok_or_else(|| DispatchError::validation("missing move"))?;
        let mv = payload.to_move()?;

        if data.game.turn() != color {
            return Err(DispatchError::validation("it is not your turn"));
        }
        let piece = data
            .game
            .board()
            .piece_at(mv.start)
            .ok_or_else(|| DispatchError::validation(format!("no piece at {}", mv.start)))?;
        if piece.color != color {
            return Err(DispatchError::validation("you can only move your own pieces"));
        }

        data.game.make_move(mv)?;
        self.persist(&data)?;
        info!(
            "{} played {} in game {} ({})",
            username,
            mv,
            data.game_id,
            get_game_status(&data.game)
        );

        connections.broadcast(&ServerMessage::load_game(data.game.clone()), None);

        match data.game.outcome() {
            Some(outcome) => {
                let announcement = game_over_announcement(&outcome, |c| seat_name(&data, c));
                connections.broadcast(&ServerMessage::notification(announcement), None);
            }
            None => {
                let description = describe_move(username, piece.kind, &mv);
                connections.broadcast(&ServerMessage::notification(description), Some(client.id));

                let defender = data.game.turn();
                if data.game.is_in_check(defender) {
                    let warning = format!("{} is in check.", seat_name(&data, defender));
                    connections.broadcast(&ServerMessage::notification(warning), None);
                }
            }
        }
        Ok(())
    }

    fn handle_leave(
        &self,
        client: &Client,
        username: &str,
        mut data: GameData,
        connections: &mut Connections,
    ) -> Result<(), DispatchError> {
        let registered = connections.get(client.id).is_some();
        let seat = data.color_of(username);
        if !registered && seat.is_none() {
            return Err(DispatchError::validation(format!(
                "not connected to game {}",
                data.game_id
            )));
        }

        if let Some(color) = seat {
            data.clear_seat(color);
            self.persist(&data)?;
        }
        connections.remove(client.id);
        info!("{} left game {}", username, data.game_id);

        connections.broadcast(
            &ServerMessage::notification(format!("{} left the game.", username)),
            None,
        );
        Ok(())
    }

    fn handle_resign(
        &self,
        client: &Client,
        username: &str,
        mut data: GameData,
        connections: &mut Connections,
    ) -> Result<(), DispatchError> {
        let color = player_color(client, username, &data, connections, "observers cannot resign")?;

        if data.game.is_game_over() {
            return Err(DispatchError::validation("the game is already over"));
        }
        let outcome = data.game.resign(color)?;
        self.persist(&data)?;
        info!("{} resigned game {}", username, data.game_id);

        let announcement = game_over_announcement(&outcome, |c| seat_name(&data, c));
        connections.broadcast(&ServerMessage::notification(announcement), None);
        Ok(())
    }
}

/// The colour the sender plays, if it is a registered player of this game.
fn player_color(
    client: &Client,
    username: &str,
    data: &GameData,
    connections: &Connections,
    observer_error: &str,
) -> Result<Color, DispatchError> {
    let connection = connections.get(client.id).ok_or_else(|| {
        DispatchError::validation(format!("not connected to game {}", data.game_id))
    })?;
    if !connection.is_player {
        return Err(DispatchError::validation(observer_error));
    }
    data.color_of(username)
        .ok_or_else(|| DispatchError::validation(observer_error))
}

fn seat_name(data: &GameData, color: Color) -> String {
    data.username_of(color)
        .map(str::to_string)
        .unwrap_or_else(|| color_to_string(color))
}
