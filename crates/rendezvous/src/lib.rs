//! # Rendezvous
//!
//! A matchmaking rendezvous server. Clients connect over TCP, receive a
//! server-issued identifier, register for a game mode, and ask to be
//! paired with another client of the same mode. A match names the
//! partner's address and the game server assigned to the mode.
//!
//! ```text
//! client                                   server
//!   ── [len]"hello" ─────────────────────────→
//!   ←──────────────────── 36-byte identifier ──
//!   ── [len]"token" + 40-byte header ────────→   register
//!   ── [len]"match" + 40-byte header ────────→   find partner
//!   ←────────────────────── [len]MatchReply ───
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rendezvous::prelude::*;
//!
//! # async fn start() -> Result<(), RendezvousError> {
//! let server = RendezvousServer::builder()
//!     .bind("0.0.0.0:5555")
//!     .build(StaticDirectory::default())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod client;
mod config;
mod error;
mod server;
mod session;

pub use client::RendezvousClient;
pub use config::ServerConfig;
pub use error::RendezvousError;
pub use server::{RendezvousServer, RendezvousServerBuilder};
pub use session::{SessionState, Step};

/// Everything needed to run a server or talk to one.
pub mod prelude {
    pub use crate::{
        RendezvousClient, RendezvousError, RendezvousServer, RendezvousServerBuilder,
        ServerConfig, SessionState,
    };
    pub use rendezvous_match::{
        GameServer, GameServerDirectory, Match, MatchError, MatchOutcome, Matcher,
        StaticDirectory,
    };
    pub use rendezvous_protocol::{ClientId, Command, GameMode, Header, MatchReply, ProtocolVersion};
    pub use rendezvous_registry::{
        ClientRecord, ClientRegistry, IdentityIssuer, Registry, RegistryError, UuidIssuer,
    };
    pub use rendezvous_transport::FrameConfig;
}
