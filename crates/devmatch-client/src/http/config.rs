//! HTTP backend configuration.

use std::time::Duration;

use devmatch_proto::EngineProtocol;
use thiserror::Error;

/// Settings for [`super::HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Server root, e.g. `http://localhost:3333`.
    pub base_url: String,
    /// Timeout for fetches and decision sends.
    pub request_timeout: Duration,
    /// TCP/TLS connect timeout for REST requests.
    pub connect_timeout: Duration,
    /// Path of the Socket.IO endpoint relative to `base_url`.
    pub socket_path: String,
    /// Engine.IO revision the server speaks.
    pub engine_io: EngineProtocol,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3333".to_string(),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            socket_path: "socket.io".to_string(),
            engine_io: EngineProtocol::default(),
        }
    }
}

/// Errors building an [`super::HttpBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpSetupError {
    /// Base URL cannot be parsed or cannot have paths appended.
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    /// reqwest refused the client configuration.
    #[error("cannot build http client: {0}")]
    Client(String),
}
