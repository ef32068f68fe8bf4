//! Per-connection session: the hello → token → match state machine.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. A session is strictly sequential: read one
//! frame, act on it, read the next. Concurrency exists only between
//! sessions, through the shared registry.
//!
//! ```text
//!                 hello                  token + header
//! AwaitingHello ───────→ AwaitingToken ────────────────→ Registered
//!                                                            │ match + header
//!                                                            ▼
//!                                                        Matching ◄─┐
//!                                                            └──────┘ match + header
//! ```
//!
//! [`SessionState::step`] is the full transition table. EOF in any state
//! ends the session normally. The connection's registry entry is removed
//! however the session ends, except when a duplicate "token" is rejected.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rendezvous_match::GameServerDirectory;
use rendezvous_protocol::{ClientId, Codec, Command, Header, ProtocolError};
use rendezvous_registry::{IdentityIssuer, Registry};
use rendezvous_transport::{Connection, TransportError};

use crate::server::ServerState;
use crate::{RendezvousError, ServerConfig};

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Where a connection is in the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Connected; nothing received yet.
    AwaitingHello,
    /// An identifier was issued; waiting for the client to register it.
    AwaitingToken {
        /// The identifier sent back on "hello".
        client_id: ClientId,
    },
    /// Registered in the registry; no match requested yet.
    Registered {
        /// The registered identifier.
        client_id: ClientId,
    },
    /// At least one match request handled. Further requests are allowed.
    Matching {
        /// The registered identifier.
        client_id: ClientId,
    },
}

/// What a session does with one command in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Issue an identifier and send it back raw.
    IssueIdentity,
    /// Read a header and register the client.
    Register,
    /// Read a header and run the matcher.
    Match,
    /// Log and stay in the current state.
    Ignore,
    /// Close: this connection already registered.
    RejectDuplicateToken,
    /// Close: the command is not valid in this state.
    RejectUnexpected,
}

impl SessionState {
    /// Returns the transition for `command` in this state.
    pub fn step(&self, command: &Command) -> Step {
        match (self, command) {
            (_, Command::Unknown(_)) => Step::Ignore,

            (Self::AwaitingHello, Command::Hello) => Step::IssueIdentity,
            (Self::AwaitingHello, _) => Step::RejectUnexpected,

            (_, Command::Hello) => Step::RejectUnexpected,

            (Self::AwaitingToken { .. }, Command::Token) => Step::Register,
            (Self::Registered { .. } | Self::Matching { .. }, Command::Token) => {
                Step::RejectDuplicateToken
            }

            // Before registering, the matcher rejects the request with
            // NoToken after the header has been validated.
            (_, Command::Match) => Step::Match,
        }
    }

    /// Returns the state's name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingHello => "AwaitingHello",
            Self::AwaitingToken { .. } => "AwaitingToken",
            Self::Registered { .. } => "Registered",
            Self::Matching { .. } => "Matching",
        }
    }

    /// Returns the identifier issued to this connection, if any.
    pub fn client_id(&self) -> Option<&ClientId> {
        match self {
            Self::AwaitingHello => None,
            Self::AwaitingToken { client_id }
            | Self::Registered { client_id }
            | Self::Matching { client_id } => Some(client_id),
        }
    }

    fn issued(&self) -> Result<ClientId, RendezvousError> {
        self.client_id().cloned().ok_or(RendezvousError::NoIdentity)
    }
}

// ---------------------------------------------------------------------------
// Connection handler
// ---------------------------------------------------------------------------

/// Removes the connection's registry entry when the handler exits,
/// whether by EOF, error, or the task being dropped.
///
/// A rejected duplicate "token" keeps the entry: the rejection must leave
/// the registry exactly as it was.
struct RegistrationGuard<R, D, I>
where
    R: Registry,
    D: GameServerDirectory,
    I: IdentityIssuer,
{
    address: String,
    state: Arc<ServerState<R, D, I>>,
    keep: bool,
}

impl<R, D, I> RegistrationGuard<R, D, I>
where
    R: Registry,
    D: GameServerDirectory,
    I: IdentityIssuer,
{
    fn keep_registration(&mut self) {
        self.keep = true;
    }
}

impl<R, D, I> Drop for RegistrationGuard<R, D, I>
where
    R: Registry,
    D: GameServerDirectory,
    I: IdentityIssuer,
{
    fn drop(&mut self) {
        if !self.keep {
            self.state.registry.unregister(&self.address);
        }
    }
}

/// Handles a single connection from accept to close.
///
/// Returns `Ok(())` when the client closes the stream. Any error means the
/// session was closed because of it.
pub(crate) async fn handle_connection<C, R, D, I>(
    mut conn: C,
    state: Arc<ServerState<R, D, I>>,
) -> Result<(), RendezvousError>
where
    C: Connection,
    R: Registry,
    D: GameServerDirectory,
    I: IdentityIssuer,
{
    let conn_id = conn.id();
    let peer = conn.peer_addr().to_string();
    tracing::info!(%conn_id, %peer, "client connected");

    let mut guard = RegistrationGuard {
        address: peer.clone(),
        state: Arc::clone(&state),
        keep: false,
    };
    let mut session = SessionState::AwaitingHello;

    loop {
        let Some(frame) = with_timeout(state.config.read_timeout, conn.recv_frame()).await??
        else {
            tracing::info!(%peer, "connection closed by client");
            return Ok(());
        };

        let command = Command::parse(&frame);
        tracing::debug!(%peer, %command, state = session.name(), "received message");

        session = match session.step(&command) {
            Step::IssueIdentity => {
                let client_id = state.issuer.issue();
                conn.send_raw(client_id.as_bytes()).await?;
                tracing::debug!(%peer, %client_id, "identifier issued");
                SessionState::AwaitingToken { client_id }
            }

            Step::Register => {
                let client_id = session.issued()?;
                let header = read_header(&mut conn, &state.config).await?;
                check_identity(&client_id, &header)?;
                state
                    .registry
                    .register(client_id.clone(), peer.clone(), header.mode)?;
                SessionState::Registered { client_id }
            }

            Step::Match => {
                let client_id = session.issued()?;
                let header = read_header(&mut conn, &state.config).await?;
                check_identity(&client_id, &header)?;
                tracing::debug!(%peer, %client_id, mode = header.mode.0, "match requested");

                if tracing::enabled!(tracing::Level::DEBUG) {
                    for record in state.registry.snapshot() {
                        tracing::debug!(
                            client_id = %record.client_id,
                            address = %record.address,
                            mode = record.mode.0,
                            "registered client"
                        );
                    }
                }

                let outcome = state.matcher.run(&state.registry, &client_id)?;
                if state.config.reply_to_match {
                    let reply = state.codec.encode(&outcome.to_reply())?;
                    conn.send_frame(&reply).await?;
                }
                SessionState::Matching { client_id }
            }

            Step::Ignore => {
                tracing::info!(%peer, %command, "ignoring unknown message");
                continue;
            }

            Step::RejectDuplicateToken => {
                guard.keep_registration();
                return Err(RendezvousError::DuplicateToken(session.issued()?));
            }

            Step::RejectUnexpected => {
                return Err(RendezvousError::UnexpectedCommand {
                    state: session.name(),
                    command: command.to_string(),
                });
            }
        };
    }
}

/// Reads and validates the raw header that follows "token" and "match".
async fn read_header<C: Connection>(
    conn: &mut C,
    config: &ServerConfig,
) -> Result<Header, RendezvousError> {
    let buf = match with_timeout(config.read_timeout, conn.recv_exact(Header::LEN)).await? {
        Ok(buf) => buf,
        Err(TransportError::Truncated { received, .. }) => {
            return Err(ProtocolError::TruncatedHeader { received }.into());
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Header::decode(&buf, config.protocol_version)?)
}

fn check_identity(issued: &ClientId, header: &Header) -> Result<(), RendezvousError> {
    if header.client_id != *issued {
        return Err(RendezvousError::IdentityMismatch {
            expected: issued.clone(),
            received: header.client_id.clone(),
        });
    }
    Ok(())
}

/// Awaits `fut`, failing with [`RendezvousError::TimedOut`] after `limit`.
async fn with_timeout<F: Future>(
    limit: Option<Duration>,
    fut: F,
) -> Result<F::Output, RendezvousError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| RendezvousError::TimedOut),
        None => Ok(fut.await),
    }
}

// =========================================================================
// Tests
// =========================================================================
