//! The matcher: one match request against the shared registry.

use rendezvous_protocol::{ClientId, GameMode, MatchReply};
use rendezvous_registry::{ClientRecord, Registry};

use crate::{GameServerDirectory, MatchError};

/// Two same-mode clients and the server assigned to them.
///
/// A computed result only; nothing about it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// The client that asked.
    pub requester: ClientRecord,
    /// The client it was paired with.
    pub partner: ClientRecord,
    /// Game server for their shared mode.
    pub game_server: String,
}

impl Match {
    /// Returns both clients' connection addresses, requester first.
    pub fn client_addresses(&self) -> (&str, &str) {
        (&self.requester.address, &self.partner.address)
    }
}

/// The result of a match request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A partner and a server were found.
    Matched(Match),
    /// No other client of this mode is registered. Try again later.
    NotFound,
    /// A partner exists but the directory has no server for the mode.
    NoGameServer {
        /// The mode without a server.
        mode: GameMode,
    },
}

impl MatchOutcome {
    /// Builds the reply sent back to the requesting client.
    pub fn to_reply(&self) -> MatchReply {
        match self {
            Self::Matched(m) => MatchReply::Matched {
                partner_address: m.partner.address.clone(),
                partner_id: m.partner.client_id.clone(),
                game_server: m.game_server.clone(),
            },
            Self::NotFound => MatchReply::Waiting,
            Self::NoGameServer { mode } => MatchReply::NoGameServer { mode: *mode },
        }
    }
}

/// Pairs registered clients of the same mode.
///
/// Holds the game-server directory; the registry is passed per call so the
/// caller decides how it is shared.
#[derive(Debug, Clone, Default)]
pub struct Matcher<D> {
    directory: D,
}

impl<D: GameServerDirectory> Matcher<D> {
    /// Creates a matcher that assigns servers from `directory`.
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Returns the directory.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Runs one match request for `requester`.
    ///
    /// The requester's mode comes from its registry record, not from
    /// whatever the request carried. Neither client is removed or reserved,
    /// so concurrent requests may receive the same partner.
    ///
    /// # Errors
    /// Returns [`MatchError::NoToken`] if `requester` is not registered.
    pub fn run<R: Registry + ?Sized>(
        &self,
        registry: &R,
        requester: &ClientId,
    ) -> Result<MatchOutcome, MatchError> {
        let me = registry
            .get(requester)
            .ok_or_else(|| MatchError::NoToken(requester.clone()))?;

        let Some(partner) = registry.find_partner(me.mode, requester) else {
            tracing::debug!(client_id = %requester, mode = me.mode.0, "no partner yet");
            return Ok(MatchOutcome::NotFound);
        };

        let Some(game_server) = self.directory.find_server(me.mode) else {
            tracing::warn!(mode = me.mode.0, "no game server for mode");
            return Ok(MatchOutcome::NoGameServer { mode: me.mode });
        };

        tracing::info!(
            client_id = %requester,
            requester_address = %me.address,
            partner_id = %partner.client_id,
            partner_address = %partner.address,
            %game_server,
            "match created"
        );
        Ok(MatchOutcome::Matched(Match {
            requester: me,
            partner,
            game_server,
        }))
    }
}
