//! The record stored per registered client.

use rendezvous_protocol::{ClientId, GameMode};

/// A registered client waiting to be matched.
///
/// Created on a successful "token" registration and owned by the
/// registry until the client disconnects or is deregistered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    /// Remote address of the client's connection (`ip:port`).
    pub address: String,
    /// The identifier issued to that connection.
    pub client_id: ClientId,
    /// The mode the client registered for.
    pub mode: GameMode,
}
