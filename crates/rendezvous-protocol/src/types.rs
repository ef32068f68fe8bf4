//! Core protocol types for the matchmaking wire format.
//!
//! Identity newtypes, the command vocabulary carried in framed messages,
//! and the reply the server sends after a match request.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A server-issued client identifier.
///
/// Issued identifiers are the 36-character hyphenated form of a UUID. The
/// type itself does not enforce that: identifiers decoded off the wire are
/// kept as sent so they can be compared against the issued one and
/// reported when they differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Length of an issued identifier, and of the header field carrying it.
    pub const LEN: usize = 36;

    /// Wraps an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identifier's bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Returns `true` if this has the length of an issued identifier.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == Self::LEN && self.0.bytes().all(|b| b.is_ascii_graphic())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single-byte game mode. Only clients of equal mode are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameMode(pub u8);

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mode-{}", self.0)
    }
}

/// The 3-byte ASCII protocol version carried in every header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProtocolVersion([u8; 3]);

impl ProtocolVersion {
    /// The version this build speaks.
    pub const CURRENT: Self = Self(*b"003");

    /// Parses a version string.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidVersion`] unless `s` is exactly three
    /// ASCII bytes.
    pub fn new(s: &str) -> Result<Self, ProtocolError> {
        let bytes: [u8; 3] = s
            .as_bytes()
            .try_into()
            .map_err(|_| ProtocolError::InvalidVersion(s.to_string()))?;
        if !bytes.is_ascii() {
            return Err(ProtocolError::InvalidVersion(s.to_string()));
        }
        Ok(Self(bytes))
    }

    /// Returns the raw version bytes.
    pub fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Constructed only from ASCII, so this never loses data.
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

// ---------------------------------------------------------------------------
// Command: the body of a client frame
// ---------------------------------------------------------------------------

/// A client request, parsed from the body of one framed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `"hello"`: ask for an identifier.
    Hello,
    /// `"token"`: register; a raw header follows the frame.
    Token,
    /// `"match"`: look for a partner; a raw header follows the frame.
    Match,
    /// Anything else, kept lossily for logging.
    Unknown(String),
}

impl Command {
    /// Parses a frame body. Matching is exact and case-sensitive.
    pub fn parse(body: &[u8]) -> Self {
        match body {
            b"hello" => Self::Hello,
            b"token" => Self::Token,
            b"match" => Self::Match,
            other => Self::Unknown(String::from_utf8_lossy(other).into_owned()),
        }
    }

    /// Returns the wire spelling of a known command.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Hello => "hello",
            Self::Token => "token",
            Self::Match => "match",
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MatchReply: server → client after "match"
// ---------------------------------------------------------------------------

/// The server's answer to a match request.
///
/// Internally tagged, so `Waiting` encodes as `{"status":"Waiting"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum MatchReply {
    /// A partner of the same mode was found and a game server assigned.
    Matched {
        /// Connection address of the partner.
        partner_address: String,
        /// The partner's identifier.
        partner_id: ClientId,
        /// Address of the game server for this mode.
        game_server: String,
    },

    /// No other client of this mode is registered yet. Ask again later.
    Waiting,

    /// A partner exists but no game server serves this mode.
    NoGameServer {
        /// The mode that has no server.
        mode: GameMode,
    },
}
