//! Integration tests for the TCP transport.
//!
//! These spin up a real listener on a random port and exchange frames
//! with a client over loopback.

#[cfg(feature = "tcp")]
mod tcp {
    use rendezvous_transport::{
        Connection, FrameConfig, FramedConnection, TcpTransport, Transport,
    };

    #[tokio::test]
    async fn test_tcp_accept_and_send_receive() {
        // "127.0.0.1:0" tells the OS to pick an available port.
        let mut transport = TcpTransport::bind("127.0.0.1:0", FrameConfig::default())
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr");

        let server_handle =
            tokio::spawn(async move { transport.accept().await.expect("should accept") });

        let mut client = FramedConnection::connect(addr, FrameConfig::default())
            .await
            .expect("client should connect");
        let mut server = server_handle.await.expect("task should complete");

        assert!(server.id().into_inner() > 0);
        assert!(!server.peer_addr().is_empty());

        // --- Client sends, server receives ---
        client.send_frame(b"hello").await.expect("send");
        let got = server.recv_frame().await.expect("recv");
        assert_eq!(got.as_deref(), Some(&b"hello"[..]));

        // --- Server replies with raw bytes, client reads exactly ---
        server.send_raw(&[b'x'; 36]).await.expect("send raw");
        let id = client.recv_exact(36).await.expect("recv exact");
        assert_eq!(id, vec![b'x'; 36]);

        // --- Client closes, server sees a clean EOF ---
        client.close().await.expect("close");
        drop(client);
        let got = server.recv_frame().await.expect("recv after close");
        assert!(got.is_none(), "clean close should yield None");
    }

    #[tokio::test]
    async fn test_tcp_bind_in_use_port_fails() {
        let first = TcpTransport::bind("127.0.0.1:0", FrameConfig::default())
            .await
            .expect("should bind");
        let addr = first.local_addr().expect("local addr").to_string();

        let second = TcpTransport::bind(&addr, FrameConfig::default()).await;
        assert!(second.is_err(), "binding an occupied port must fail");
    }
}
