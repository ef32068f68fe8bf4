//! Integration tests for the Rendezvous server over real TCP connections.

use std::sync::Arc;
use std::time::Duration;

use rendezvous::prelude::*;
use rendezvous_transport::FramedConnection;
use tokio::net::TcpStream;

type Client = RendezvousClient<FramedConnection<TcpStream>>;

// =========================================================================
// Helpers
// =========================================================================

/// Starts a server on a random port with an observable registry.
async fn start_server() -> (String, Arc<ClientRegistry>) {
    start_server_with(RendezvousServer::builder()).await
}

async fn start_server_with(builder: RendezvousServerBuilder) -> (String, Arc<ClientRegistry>) {
    let registry = Arc::new(ClientRegistry::new());
    let server = builder
        .bind("127.0.0.1:0")
        .build_with(Arc::clone(&registry), StaticDirectory::default(), UuidIssuer)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, registry)
}

async fn connect(addr: &str) -> Client {
    RendezvousClient::connect(addr)
        .await
        .expect("should connect")
}

/// Connects, says hello, and registers for `mode`.
async fn register(addr: &str, mode: u8) -> Client {
    let mut client = connect(addr).await;
    client.hello().await.expect("hello");
    client.register(GameMode(mode)).await.expect("token");
    client
}

/// Polls until `check` holds, failing after two seconds.
async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

// =========================================================================
// Happy path
// =========================================================================

#[tokio::test]
async fn test_hello_issues_uuid() {
    let (addr, _registry) = start_server().await;
    let mut client = connect(&addr).await;

    let id = client.hello().await.expect("hello");

    assert_eq!(id.as_str().len(), 36);
    assert!(id.is_well_formed());
    assert_eq!(id.as_str().matches('-').count(), 4);
}

#[tokio::test]
async fn test_each_connection_gets_distinct_id() {
    let (addr, _registry) = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;

    assert_ne!(a.hello().await.unwrap(), b.hello().await.unwrap());
}

#[tokio::test]
async fn test_two_clients_mode_one_are_paired() {
    let (addr, registry) = start_server().await;

    let mut a = register(&addr, 1).await;
    assert_eq!(a.find_match(GameMode(1)).await.unwrap(), MatchReply::Waiting);

    let mut b = register(&addr, 1).await;
    let reply = b.find_match(GameMode(1)).await.unwrap();

    let (partner_address, partner_id, game_server) = match reply {
        MatchReply::Matched {
            partner_address,
            partner_id,
            game_server,
        } => (partner_address, partner_id, game_server),
        other => panic!("expected a match, got {other:?}"),
    };
    assert_eq!(&partner_id, a.client_id().unwrap());
    assert!(partner_address.starts_with("127.0.0.1:"));
    assert_eq!(game_server, "192.168.2.2");

    // Matching removes nobody.
    assert_eq!(registry.len(), 2);
}

#[tokio::test]
async fn test_not_found_then_match_after_partner_registers() {
    let (addr, _registry) = start_server().await;

    let mut a = register(&addr, 2).await;
    assert_eq!(a.find_match(GameMode(2)).await.unwrap(), MatchReply::Waiting);

    let mut b = register(&addr, 2).await;
    b.find_match(GameMode(2)).await.unwrap();

    let reply = a.find_match(GameMode(2)).await.unwrap();
    assert!(
        matches!(reply, MatchReply::Matched { ref game_server, ref partner_id, .. }
            if game_server == "10.0.0.5" && Some(partner_id) == b.client_id()),
        "got {reply:?}"
    );
}

#[tokio::test]
async fn test_modes_are_isolated() {
    let (addr, _registry) = start_server().await;

    let mut a = register(&addr, 0).await;
    let mut b = register(&addr, 1).await;
    b.find_match(GameMode(1)).await.unwrap();

    assert_eq!(a.find_match(GameMode(0)).await.unwrap(), MatchReply::Waiting);
}

#[tokio::test]
async fn test_mode_without_game_server() {
    let (addr, _registry) = start_server().await;

    let mut a = register(&addr, 5).await;
    let mut b = register(&addr, 5).await;
    b.find_match(GameMode(5)).await.unwrap();

    assert_eq!(
        a.find_match(GameMode(5)).await.unwrap(),
        MatchReply::NoGameServer { mode: GameMode(5) }
    );
}

#[tokio::test]
async fn test_unknown_message_ignored() {
    let (addr, _registry) = start_server().await;
    let mut client = connect(&addr).await;
    client.hello().await.unwrap();

    client.send_command(b"HELLO").await.unwrap();
    client.send_command(b"").await.unwrap();
    client.register(GameMode(1)).await.unwrap();

    assert_eq!(client.find_match(GameMode(1)).await.unwrap(), MatchReply::Waiting);
}

// =========================================================================
// Rejections
// =========================================================================

#[tokio::test]
async fn test_match_without_token_closes() {
    let (addr, registry) = start_server().await;
    let mut client = connect(&addr).await;
    client.hello().await.unwrap();

    client.request_match(GameMode(1)).await.unwrap();

    assert!(client.is_closed_by_server().await);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_duplicate_token_closes() {
    let (addr, registry) = start_server().await;
    let mut client = register(&addr, 1).await;
    let id = client.client_id().cloned().unwrap();
    eventually(|| registry.has(&id)).await;

    client.register(GameMode(2)).await.unwrap();

    assert!(client.is_closed_by_server().await);
    let entries = registry.snapshot().into_iter().filter(|r| r.client_id == id).count();
    assert_eq!(entries, 1);
}

#[tokio::test]
async fn test_foreign_identity_closes() {
    let (addr, registry) = start_server().await;
    let mut client = connect(&addr).await;
    client.hello().await.unwrap();

    client.send_command(b"token").await.unwrap();
    client
        .send_header(&Header::new(GameMode(1), ClientId::new("0".repeat(36))))
        .await
        .unwrap();

    assert!(client.is_closed_by_server().await);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_version_mismatch_closes() {
    let (addr, registry) = start_server().await;
    let mut client = connect(&addr)
        .await
        .with_version(ProtocolVersion::new("002").unwrap());
    client.hello().await.unwrap();

    client.register(GameMode(1)).await.unwrap();

    assert!(client.is_closed_by_server().await);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_first_message_must_be_hello() {
    let (addr, _registry) = start_server().await;
    let mut client = connect(&addr).await;

    client.send_command(b"match").await.unwrap();

    assert!(client.is_closed_by_server().await);
}

#[tokio::test]
async fn test_bad_session_does_not_affect_others() {
    let (addr, registry) = start_server().await;
    let mut good = register(&addr, 1).await;
    good.find_match(GameMode(1)).await.unwrap();

    let mut bad = connect(&addr).await;
    bad.send_command(b"token").await.unwrap();
    assert!(bad.is_closed_by_server().await);

    assert_eq!(registry.len(), 1);
    assert_eq!(good.find_match(GameMode(1)).await.unwrap(), MatchReply::Waiting);
}

// =========================================================================
// Disconnects and configuration
// =========================================================================

#[tokio::test]
async fn test_disconnect_unregisters_client() {
    let (addr, registry) = start_server().await;
    let mut a = register(&addr, 1).await;
    a.find_match(GameMode(1)).await.unwrap();
    assert_eq!(registry.len(), 1);

    drop(a);
    eventually(|| registry.is_empty()).await;

    let mut b = register(&addr, 1).await;
    assert_eq!(b.find_match(GameMode(1)).await.unwrap(), MatchReply::Waiting);
}

#[tokio::test]
async fn test_many_clients_concurrently() {
    let (addr, registry) = start_server().await;

    let mut handles = Vec::new();
    for n in 0..16u8 {
        let addr = addr.clone();
        handles.push(tokio::spawn(async move {
            let mut client = register(&addr, n % 2).await;
            client.find_match(GameMode(n % 2)).await.unwrap();
            client
        }));
    }
    let mut clients = Vec::new();
    for handle in handles {
        clients.push(handle.await.expect("client task"));
    }
    assert_eq!(registry.len(), 16);

    // With everyone registered, every request finds someone of its mode.
    for (n, client) in clients.iter_mut().enumerate() {
        let reply = client.find_match(GameMode((n % 2) as u8)).await.unwrap();
        assert!(matches!(reply, MatchReply::Matched { .. }), "client {n}: {reply:?}");
    }
}

#[tokio::test]
async fn test_read_timeout_closes_idle_client() {
    let (addr, registry) =
        start_server_with(RendezvousServer::builder().read_timeout(Duration::from_millis(50)))
            .await;
    let mut client = register(&addr, 1).await;
    let id = client.client_id().cloned().unwrap();

    assert!(client.is_closed_by_server().await);
    eventually(|| !registry.has(&id)).await;
}

#[tokio::test]
async fn test_custom_protocol_version() {
    let version = ProtocolVersion::new("004").unwrap();
    let (addr, _registry) =
        start_server_with(RendezvousServer::builder().protocol_version(version)).await;

    let mut client = connect(&addr).await.with_version(version);
    client.hello().await.unwrap();
    client.register(GameMode(0)).await.unwrap();

    assert_eq!(client.find_match(GameMode(0)).await.unwrap(), MatchReply::Waiting);
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let result = RendezvousServer::builder()
        .bind("256.0.0.1:0")
        .build(StaticDirectory::default())
        .await;

    assert!(matches!(result, Err(RendezvousError::Transport(_))));
}
