use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::{error, info};
use std::sync::Arc;

use chess_game_server::config::Args;
use chess_game_server::models::AppState;
use chess_game_server::routes::configure_routes;
use chess_game_server::store::{MemoryAuthVerifier, MemoryGameStore};
use chess_game_server::CommandDispatcher;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(args.log_level.as_str()));

    let auth = Arc::new(MemoryAuthVerifier::new());
    let store = Arc::new(MemoryGameStore::new());
    match args.load_fixtures() {
        Ok(fixtures) => fixtures.apply(&auth, &store),
        Err(e) => {
            error!("{}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    }

    // Create shared application state
    let app_state = web::Data::new(AppState::new(Arc::new(CommandDispatcher::new(
        auth, store,
    ))));

    let (host, port) = args.bind_address();
    info!("Starting chess game server at http://{}:{}", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(configure_routes)
    })
    .bind((host, port))?
    .run()
    .await
}
