use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::{AppState, ChessWebSocketMessage, ServerMessage, UserGameCommand};
use crate::websocket::session::{Client, ConnectionId};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// WebSocket handler for chess games
pub struct ChessWebSocket {
    pub id: ConnectionId,
    pub app_state: web::Data<AppState>,
    client: Option<Client>,
    last_heartbeat: Instant,
}

impl ChessWebSocket {
    pub fn new(app_state: web::Data<AppState>) -> Self {
        ChessWebSocket {
            id: ConnectionId::new_v4(),
            app_state,
            client: None,
            last_heartbeat: Instant::now(),
        }
    }

    // Teardown is noticed here when the peer stops answering pings.
    fn heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > CLIENT_TIMEOUT {
                warn!("WebSocket {} timed out, disconnecting", act.id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    pub fn handle_message(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        let command = match serde_json::from_str::<UserGameCommand>(text) {
            Ok(command) => command,
            Err(e) => {
                warn!("Error parsing client message: {}", e);
                let error = ServerMessage::error(format!("invalid message format: {}", e));
                match serde_json::to_string(&error) {
                    Ok(text) => ctx.text(text),
                    Err(e) => warn!("Failed to serialize error: {}", e),
                }
                return;
            }
        };

        info!(
            "Connection {} sent {:?} for game {}",
            self.id, command.command_type, command.game_id
        );
        match &self.client {
            Some(client) => self.app_state.dispatcher.dispatch(client, command),
            None => warn!("Connection {} is not started yet", self.id),
        }
    }
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        // Outbound traffic reaches the socket through this actor's mailbox
        let recipient: Recipient<ChessWebSocketMessage> = ctx.address().recipient();
        self.client = Some(Client {
            id: self.id,
            sink: Arc::new(recipient),
        });
        self.heartbeat(ctx);
        info!("WebSocket connection started: {}", self.id);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.app_state.dispatcher.disconnect(self.id);
        self.client = None;
        info!("WebSocket connection closed: {}", self.id);
        Running::Stop
    }
}

impl Handler<ChessWebSocketMessage> for ChessWebSocket {
    type Result = ();

    fn handle(&mut self, msg: ChessWebSocketMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                self.handle_message(&text, ctx);
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                let error = ServerMessage::error("binary messages are not supported");
                if let Ok(text) = serde_json::to_string(&error) {
                    ctx.text(text);
                }
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let ws = ChessWebSocket::new(app_state.clone());
    info!("New WebSocket connection: {}", ws.id);
    ws::start(ws, &req, stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::session::MessageSink;

    /// Collects whatever reaches its mailbox.
    struct Collector {
        received: Vec<String>,
    }

    impl Actor for Collector {
        type Context = Context<Self>;
    }

    impl Handler<ChessWebSocketMessage> for Collector {
        type Result = ();

        fn handle(&mut self, msg: ChessWebSocketMessage, _: &mut Self::Context) {
            self.received.push(msg.0);
        }
    }

    #[derive(Message)]
    #[rtype(result = "Vec<String>")]
    struct Take;

    impl Handler<Take> for Collector {
        type Result = MessageResult<Take>;

        fn handle(&mut self, _: Take, _: &mut Self::Context) -> Self::Result {
            MessageResult(std::mem::take(&mut self.received))
        }
    }

    #[actix_rt::test]
    async fn recipient_sink_delivers_json_text() {
        let addr = Collector { received: Vec::new() }.start();
        let sink: Recipient<ChessWebSocketMessage> = addr.clone().recipient();

        MessageSink::send(&sink, &ServerMessage::notification("hi")).unwrap();
        let received = addr.send(Take).await.unwrap();

        assert_eq!(received.len(), 1);
        let parsed: ServerMessage = serde_json::from_str(&received[0]).unwrap();
        assert_eq!(parsed, ServerMessage::notification("hi"));
    }
}
