//! Matching for Rendezvous.
//!
//! Given a registered client, find another registered client of the same
//! game mode and look up a game server for that mode.
//!
//! - [`GameServerDirectory`]: the mode → server-address lookup, with a
//!   JSON-loadable [`StaticDirectory`]
//! - [`Matcher`]: runs one match request against a
//!   [`Registry`](rendezvous_registry::Registry)
//!
//! The matcher only computes a pairing. It does not reserve, remove, or
//! notify either client, so the same partner can be handed to several
//! requesters.

mod directory;
mod error;
mod matcher;

pub use directory::{GameServer, GameServerDirectory, StaticDirectory};
pub use error::{DirectoryError, MatchError};
pub use matcher::{Match, MatchOutcome, Matcher};
