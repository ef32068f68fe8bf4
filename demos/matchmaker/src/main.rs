//! Matchmaker: runs a Rendezvous server, or plays one client against it.
//!
//! # Usage
//!
//! ```bash
//! # Serve on 0.0.0.0:5555 with the built-in game-server table
//! matchmaker
//!
//! # Serve elsewhere, with servers from a JSON file
//! RENDEZVOUS_BIND=127.0.0.1:7000 RENDEZVOUS_DIRECTORY=servers.json matchmaker
//!
//! # Register for mode 1 and ask for a partner
//! matchmaker client 127.0.0.1:5555 1
//! ```
//!
//! Log output is controlled by `RUST_LOG` (default `info`).

use std::process::ExitCode;
use std::time::Duration;

use rendezvous::prelude::*;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const BIND_VAR: &str = "RENDEZVOUS_BIND";
const DIRECTORY_VAR: &str = "RENDEZVOUS_DIRECTORY";

/// How often the client asks again while no partner is waiting.
const RETRY_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("client") => run_client(&args[1..]).await,
        None => run_server().await,
        Some(other) => {
            tracing::error!(command = other, "unknown command; expected `client` or nothing");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "matchmaker failed");
            ExitCode::FAILURE
        }
    }
}

async fn run_server() -> Result<(), RendezvousError> {
    let mut config = ServerConfig::default();
    if let Ok(bind) = std::env::var(BIND_VAR) {
        config.bind_addr = bind;
    }

    let directory = match std::env::var(DIRECTORY_VAR) {
        Ok(path) => {
            let directory = StaticDirectory::load(&path)?;
            tracing::info!(%path, servers = directory.servers().len(), "loaded game servers");
            directory
        }
        Err(_) => StaticDirectory::default(),
    };

    let server = RendezvousServer::builder()
        .config(config)
        .build(directory)
        .await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "listening");
    }
    server.run().await
}

/// Runs one client: hello, token, then match until paired.
async fn run_client(args: &[String]) -> Result<(), RendezvousError> {
    let addr = args.first().map(String::as_str).unwrap_or("127.0.0.1:5555");
    let mode = GameMode(args.get(1).and_then(|m| m.parse().ok()).unwrap_or(0));

    let mut client = RendezvousClient::connect(addr).await?;
    let client_id = client.hello().await?;
    tracing::info!(%client_id, "received identifier");

    client.register(mode).await?;
    tracing::info!(%mode, "registered");

    loop {
        match client.find_match(mode).await? {
            MatchReply::Matched {
                partner_address,
                partner_id,
                game_server,
            } => {
                tracing::info!(%partner_id, %partner_address, %game_server, "matched");
                return client.close().await;
            }
            MatchReply::Waiting => {
                tracing::info!("no partner yet");
                tokio::time::sleep(RETRY_INTERVAL).await;
            }
            MatchReply::NoGameServer { mode } => {
                tracing::warn!(%mode, "no game server for mode");
                return client.close().await;
            }
        }
    }
}
