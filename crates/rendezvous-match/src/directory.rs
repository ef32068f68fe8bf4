//! Game-server lookup.
//!
//! Rendezvous does not pick servers by load or probe them; it only needs
//! "which address serves this mode?". [`GameServerDirectory`] is that one
//! question, and [`StaticDirectory`] answers it from a fixed list.

use std::path::Path;

use rendezvous_protocol::GameMode;
use serde::{Deserialize, Serialize};

use crate::DirectoryError;

/// Looks up a game server for a mode.
///
/// A pure lookup: implementations should not block on the network.
pub trait GameServerDirectory: Send + Sync + 'static {
    /// Returns the address of a server for `mode`, if one exists.
    fn find_server(&self, mode: GameMode) -> Option<String>;
}

/// One entry in a [`StaticDirectory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameServer {
    /// Where clients should connect to play.
    pub address: String,
    /// The mode this server hosts.
    pub mode: GameMode,
}

/// A fixed list of game servers.
///
/// The first entry for a mode wins. Loads from JSON of the form
/// `[{"address": "192.168.2.2", "mode": 1}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticDirectory {
    servers: Vec<GameServer>,
}

impl StaticDirectory {
    /// Creates a directory from a server list.
    pub fn new(servers: Vec<GameServer>) -> Self {
        Self { servers }
    }

    /// Parses a JSON server list.
    pub fn from_json(json: &str) -> Result<Self, DirectoryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON server list from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Returns the configured servers.
    pub fn servers(&self) -> &[GameServer] {
        &self.servers
    }
}

impl Default for StaticDirectory {
    /// The built-in table: one server each for modes 0, 1 and 2.
    fn default() -> Self {
        Self::new(vec![
            GameServer {
                address: "192.168.1.1".into(),
                mode: GameMode(0),
            },
            GameServer {
                address: "192.168.2.2".into(),
                mode: GameMode(1),
            },
            GameServer {
                address: "10.0.0.5".into(),
                mode: GameMode(2),
            },
        ])
    }
}

impl GameServerDirectory for StaticDirectory {
    fn find_server(&self, mode: GameMode) -> Option<String> {
        self.servers
            .iter()
            .find(|server| server.mode == mode)
            .map(|server| server.address.clone())
    }
}
