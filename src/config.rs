use clap::Parser;
use std::path::PathBuf;

use crate::store::{Fixtures, StoreError};

/// Command line configuration for the server.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "chess_game_server")]
#[command(about = "Live chess games over websockets")]
pub struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// JSON file with auth tokens and games to load at startup; a demo game is used when absent
    #[arg(short, long)]
    pub fixtures: Option<PathBuf>,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn load_fixtures(&self) -> Result<Fixtures, StoreError> {
        match &self.fixtures {
            Some(path) => Fixtures::load(path),
            None => Ok(Fixtures::demo()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["chess_game_server"]);
        assert_eq!(args.bind_address(), ("127.0.0.1".to_string(), 8080));
        assert_eq!(args.fixtures, None);
        assert_eq!(args.log_level, "info");
        assert_eq!(args.load_fixtures().unwrap(), Fixtures::demo());
    }

    #[test]
    fn overrides() {
        let args = Args::parse_from([
            "chess_game_server",
            "--host",
            "0.0.0.0",
            "-p",
            "9000",
            "--fixtures",
            "seed.json",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.bind_address(), ("0.0.0.0".to_string(), 9000));
        assert_eq!(args.fixtures, Some(PathBuf::from("seed.json")));
        assert_eq!(args.log_level, "debug");
    }
}
