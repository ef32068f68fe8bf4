//! Wire protocol for Rendezvous.
//!
//! - **Types** ([`ClientId`], [`GameMode`], [`Command`], [`MatchReply`])
//! - **Header** ([`Header`]): the fixed 40-byte block after "token" and
//!   "match" frames
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how replies become bytes
//! - **Errors** ([`ProtocolError`])
//!
//! ```text
//! Transport (frames, raw bytes) → Protocol (Command, Header) → Session
//! ```

mod codec;
mod error;
pub mod header;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use header::Header;
pub use types::{ClientId, Command, GameMode, MatchReply, ProtocolVersion};
