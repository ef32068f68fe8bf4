//! A minimal client for the rendezvous protocol.
//!
//! Used by the demo binary and the integration tests. Each method sends
//! exactly what a well-behaved client sends; [`send_command`] and
//! [`send_header`] let tests put arbitrary bytes on the wire.
//!
//! [`send_command`]: RendezvousClient::send_command
//! [`send_header`]: RendezvousClient::send_header

use rendezvous_protocol::{
    ClientId, Codec, Command, GameMode, Header, JsonCodec, MatchReply, ProtocolVersion,
};
use rendezvous_transport::{Connection, FrameConfig, FramedConnection, TransportError};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::RendezvousError;

/// Client side of one rendezvous connection.
pub struct RendezvousClient<C> {
    conn: C,
    version: ProtocolVersion,
    client_id: Option<ClientId>,
    codec: JsonCodec,
}

impl RendezvousClient<FramedConnection<TcpStream>> {
    /// Connects to a server over TCP.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, RendezvousError> {
        let conn = FramedConnection::connect(addr, FrameConfig::default()).await?;
        Ok(Self::new(conn))
    }
}

impl<C: Connection> RendezvousClient<C> {
    /// Wraps an established connection.
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            version: ProtocolVersion::CURRENT,
            client_id: None,
            codec: JsonCodec,
        }
    }

    /// Uses `version` in every header this client sends.
    pub fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    /// Returns the identifier received from "hello", if any.
    pub fn client_id(&self) -> Option<&ClientId> {
        self.client_id.as_ref()
    }

    /// Sends "hello" and reads back the issued identifier.
    pub async fn hello(&mut self) -> Result<ClientId, RendezvousError> {
        self.send_command(Command::Hello.as_str().as_bytes()).await?;
        let raw = self.conn.recv_exact(ClientId::LEN).await?;
        let client_id = ClientId::new(String::from_utf8_lossy(&raw).into_owned());
        self.client_id = Some(client_id.clone());
        Ok(client_id)
    }

    /// Sends "token" and a header registering for `mode`.
    ///
    /// The server sends nothing back on success.
    pub async fn register(&mut self, mode: GameMode) -> Result<(), RendezvousError> {
        self.send_with_header(Command::Token, mode).await
    }

    /// Sends "match" and a header without waiting for the reply.
    pub async fn request_match(&mut self, mode: GameMode) -> Result<(), RendezvousError> {
        self.send_with_header(Command::Match, mode).await
    }

    /// Reads one match reply frame.
    pub async fn recv_reply(&mut self) -> Result<MatchReply, RendezvousError> {
        let frame = self
            .conn
            .recv_frame()
            .await?
            .ok_or(TransportError::ConnectionClosed)?;
        Ok(self.codec.decode(&frame)?)
    }

    /// Sends "match" and waits for the server's answer.
    pub async fn find_match(&mut self, mode: GameMode) -> Result<MatchReply, RendezvousError> {
        self.request_match(mode).await?;
        self.recv_reply().await
    }

    /// Sends an arbitrary command frame.
    pub async fn send_command(&mut self, body: &[u8]) -> Result<(), RendezvousError> {
        Ok(self.conn.send_frame(body).await?)
    }

    /// Writes a header as raw bytes.
    pub async fn send_header(&mut self, header: &Header) -> Result<(), RendezvousError> {
        self.send_raw(&header.encode()).await
    }

    /// Writes unframed bytes.
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<(), RendezvousError> {
        Ok(self.conn.send_raw(data).await?)
    }

    /// Waits for the server to end the connection.
    ///
    /// Returns `false` if a frame arrives instead.
    pub async fn is_closed_by_server(&mut self) -> bool {
        matches!(self.conn.recv_frame().await, Ok(None) | Err(_))
    }

    /// Shuts down the sending half. The server treats this as EOF.
    pub async fn close(&mut self) -> Result<(), RendezvousError> {
        Ok(self.conn.close().await?)
    }

    async fn send_with_header(
        &mut self,
        command: Command,
        mode: GameMode,
    ) -> Result<(), RendezvousError> {
        let client_id = self.client_id.clone().ok_or(RendezvousError::NoIdentity)?;
        let mut header = Header::new(mode, client_id);
        header.version = self.version;

        self.send_command(command.as_str().as_bytes()).await?;
        self.send_header(&header).await
    }
}

#[cfg(test)]
mod tests {
    use rendezvous_transport::FramedConnection;
    use tokio::io::duplex;

    use super::*;

    fn pair() -> (
        RendezvousClient<FramedConnection<tokio::io::DuplexStream>>,
        FramedConnection<tokio::io::DuplexStream>,
    ) {
        let (a, b) = duplex(4096);
        (
            RendezvousClient::new(FramedConnection::new(a, "server", FrameConfig::default())),
            FramedConnection::new(b, "client", FrameConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_register_before_hello_returns_no_identity() {
        let (mut client, _server) = pair();

        let err = client.register(GameMode(1)).await.unwrap_err();

        assert!(matches!(err, RendezvousError::NoIdentity));
    }

    #[tokio::test]
    async fn test_hello_then_register_writes_expected_bytes() {
        let (mut client, mut server) = pair();
        let id = "a".repeat(36);

        let hello = tokio::spawn(async move {
            let frame = server.recv_frame().await.unwrap().unwrap();
            assert_eq!(frame, b"hello");
            server.send_raw(id.as_bytes()).await.unwrap();
            server
        });
        let issued = client.hello().await.unwrap();
        let mut server = hello.await.unwrap();
        assert_eq!(issued.as_str(), "a".repeat(36));

        client.register(GameMode(2)).await.unwrap();

        assert_eq!(server.recv_frame().await.unwrap().as_deref(), Some(&b"token"[..]));
        let header = server.recv_exact(Header::LEN).await.unwrap();
        assert_eq!(&header[..3], b"003");
        assert_eq!(header[3], 2);
        assert_eq!(&header[4..], "a".repeat(36).as_bytes());
    }

    #[tokio::test]
    async fn test_with_version_changes_header_version() {
        let (client, mut server) = pair();
        let mut client = client.with_version(ProtocolVersion::new("009").unwrap());
        client.client_id = Some(ClientId::new("b".repeat(36)));

        client.request_match(GameMode(0)).await.unwrap();

        assert_eq!(server.recv_frame().await.unwrap().as_deref(), Some(&b"match"[..]));
        let header = server.recv_exact(Header::LEN).await.unwrap();
        assert_eq!(&header[..3], b"009");
    }

    #[tokio::test]
    async fn test_recv_reply_decodes_json_frame() {
        let (mut client, mut server) = pair();
        server
            .send_frame(br#"{"status":"NoGameServer","mode":4}"#)
            .await
            .unwrap();

        let reply = client.recv_reply().await.unwrap();

        assert_eq!(reply, MatchReply::NoGameServer { mode: GameMode(4) });
    }

    #[tokio::test]
    async fn test_recv_reply_after_close_is_transport_error() {
        let (mut client, server) = pair();
        drop(server);

        let err = client.recv_reply().await.unwrap_err();

        assert!(err.is_transport());
    }
}
