//! Server configuration.

use std::time::Duration;

use rendezvous_protocol::ProtocolVersion;
use rendezvous_transport::FrameConfig;

/// Configuration for a Rendezvous server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on. Default: `0.0.0.0:5555`.
    pub bind_addr: String,

    /// Version every header must carry. Default: `"003"`.
    pub protocol_version: ProtocolVersion,

    /// Frame size limits.
    pub frame: FrameConfig,

    /// Close a connection that sends nothing for this long.
    ///
    /// Default: `None` (wait forever).
    pub read_timeout: Option<Duration>,

    /// Send a framed [`MatchReply`](rendezvous_protocol::MatchReply) after
    /// every "match" request. Default: `true`.
    pub reply_to_match: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5555".to_string(),
            protocol_version: ProtocolVersion::CURRENT,
            frame: FrameConfig::default(),
            read_timeout: None,
            reply_to_match: true,
        }
    }
}
