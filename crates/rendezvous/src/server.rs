//! `RendezvousServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session, with the
//! registry and matcher shared by every session through [`ServerState`].

use std::sync::Arc;
use std::time::Duration;

use rendezvous_match::{GameServerDirectory, Matcher, StaticDirectory};
use rendezvous_protocol::{JsonCodec, ProtocolVersion};
use rendezvous_registry::{ClientRegistry, IdentityIssuer, Registry, UuidIssuer};
use rendezvous_transport::{Connection, FrameConfig, TcpTransport, Transport};

use crate::session::handle_connection;
use crate::{RendezvousError, ServerConfig};

/// Pause after a failed accept so a persistent error (e.g. out of file
/// descriptors) does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Shared server state passed to each connection task.
///
/// Wrapped in `Arc`; the registry does its own locking, everything else
/// is read-only.
pub(crate) struct ServerState<R, D, I> {
    pub(crate) registry: R,
    pub(crate) matcher: Matcher<D>,
    pub(crate) issuer: I,
    pub(crate) codec: JsonCodec,
    pub(crate) config: ServerConfig,
}

impl<R, D, I> ServerState<R, D, I>
where
    R: Registry,
    D: GameServerDirectory,
    I: IdentityIssuer,
{
    pub(crate) fn new(registry: R, matcher: Matcher<D>, issuer: I, config: ServerConfig) -> Self {
        Self {
            registry,
            matcher,
            issuer,
            codec: JsonCodec,
            config,
        }
    }
}

/// Builder for configuring and starting a Rendezvous server.
///
/// # Example
///
/// ```rust,no_run
/// use rendezvous::prelude::*;
///
/// # async fn start() -> Result<(), RendezvousError> {
/// let server = RendezvousServer::builder()
///     .bind("0.0.0.0:5555")
///     .build(StaticDirectory::default())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RendezvousServerBuilder {
    config: ServerConfig,
}

impl RendezvousServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the version every header must carry.
    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.config.protocol_version = version;
        self
    }

    /// Closes connections that stay silent for longer than `timeout`.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    /// Turns the framed reply after each "match" request on or off.
    pub fn reply_to_match(mut self, enabled: bool) -> Self {
        self.config.reply_to_match = enabled;
        self
    }

    /// Sets the frame size limits.
    pub fn frame_config(mut self, frame: FrameConfig) -> Self {
        self.config.frame = frame;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the server with an in-memory registry and UUID identifiers.
    pub async fn build<D: GameServerDirectory>(
        self,
        directory: D,
    ) -> Result<RendezvousServer<ClientRegistry, D, UuidIssuer>, RendezvousError> {
        self.build_with(ClientRegistry::new(), directory, UuidIssuer)
            .await
    }

    /// Binds the server with caller-supplied components.
    ///
    /// Pass an `Arc<ClientRegistry>` to keep a handle on the registry from
    /// outside the server.
    pub async fn build_with<R, D, I>(
        self,
        registry: R,
        directory: D,
        issuer: I,
    ) -> Result<RendezvousServer<R, D, I>, RendezvousError>
    where
        R: Registry,
        D: GameServerDirectory,
        I: IdentityIssuer,
    {
        let transport =
            TcpTransport::bind(&self.config.bind_addr, self.config.frame.clone()).await?;
        let state = Arc::new(ServerState::new(
            registry,
            Matcher::new(directory),
            issuer,
            self.config,
        ));
        Ok(RendezvousServer { transport, state })
    }
}

impl Default for RendezvousServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Rendezvous server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RendezvousServer<R, D, I> {
    transport: TcpTransport,
    state: Arc<ServerState<R, D, I>>,
}

impl RendezvousServer<ClientRegistry, StaticDirectory, UuidIssuer> {
    /// Creates a new builder.
    pub fn builder() -> RendezvousServerBuilder {
        RendezvousServerBuilder::new()
    }
}

impl<R, D, I> RendezvousServer<R, D, I>
where
    R: Registry,
    D: GameServerDirectory,
    I: IdentityIssuer,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the shared registry.
    pub fn registry(&self) -> &R {
        &self.state.registry
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Runs the accept loop.
    ///
    /// Spawns one task per connection. A failing session never stops the
    /// loop; neither does a failed accept. Runs until the task is dropped.
    pub async fn run(self) -> Result<(), RendezvousError> {
        tracing::info!(
            addr = %self.state.config.bind_addr,
            version = %self.state.config.protocol_version,
            "rendezvous server running"
        );
        accept_loop(self.transport, self.state).await
    }
}

async fn accept_loop<T, R, D, I>(
    mut transport: T,
    state: Arc<ServerState<R, D, I>>,
) -> Result<(), RendezvousError>
where
    T: Transport,
    R: Registry,
    D: GameServerDirectory,
    I: IdentityIssuer,
{
    loop {
        match transport.accept().await {
            Ok(conn) => {
                let state = Arc::clone(&state);
                let peer = conn.peer_addr().to_string();
                tokio::spawn(async move {
                    match handle_connection(conn, state).await {
                        Ok(()) => {}
                        Err(e) if e.is_protocol_violation() => {
                            tracing::warn!(%peer, error = %e, "closing connection");
                        }
                        Err(e) => {
                            tracing::debug!(%peer, error = %e, "connection ended with error");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}
