//! HTTP backend.
//!
//! Talks to the Devmatch REST API with reqwest:
//!
//! | Operation | Request |
//! |---|---|
//! | fetch | `GET {base}/devs` |
//! | decide | `POST {base}/devs/{id}/likes` or `/dislikes` |
//! | push | Socket.IO websocket at `{base}/socket.io/?user={identity}` |
//!
//! The identity goes in the `user` header on every REST request and in the
//! `user` query parameter of the socket. The socket has no overall timeout;
//! the per-request timeout applies to fetches and decision sends.

mod config;
mod socket;

use async_trait::async_trait;
pub use config::{HttpConfig, HttpSetupError};
use devmatch_core::{
    Backend, ChannelError, Decision, DecisionSendError, FetchError, Identity, Profile, ProfileId,
};
pub use devmatch_proto::EngineProtocol;
use reqwest::{Client, Url};
pub use socket::SocketIoChannel;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};
use tracing::debug;

/// Header carrying the identity.
pub const USER_HEADER: &str = "user";

/// Websocket produced by [`HttpBackend::open_channel`].
pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// [`Backend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
    config: HttpConfig,
}

impl HttpBackend {
    /// Build a backend from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpSetupError`] if the base URL is unusable or the HTTP
    /// client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self, HttpSetupError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| HttpSetupError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(HttpSetupError::InvalidUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| HttpSetupError::Client(e.to_string()))?;

        Ok(Self { client, base, config })
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn socket_url(&self, identity: &Identity) -> Result<Url, ChannelError> {
        let mut url = self.endpoint(self.config.socket_path.split('/').filter(|s| !s.is_empty()));
        if let Ok(mut path) = url.path_segments_mut() {
            path.push("");
        }

        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| ChannelError::Connect(format!("cannot speak {scheme} to {url}")))?;
        url.query_pairs_mut()
            .append_pair("EIO", self.config.engine_io.query_value())
            .append_pair("transport", "websocket")
            .append_pair(USER_HEADER, identity.as_str());
        Ok(url)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    type Channel = SocketIoChannel<Socket>;

    async fn fetch_candidates(&self, identity: &Identity) -> Result<Vec<Profile>, FetchError> {
        let url = self.endpoint(["devs"]);
        debug!(%url, "fetching candidates");

        let response = self
            .client
            .get(url)
            .header(USER_HEADER, identity.as_str())
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.json::<Vec<Profile>>().await.map_err(|e| {
            if e.is_timeout() { FetchError::Timeout } else { FetchError::Decode(e.to_string()) }
        })
    }

    async fn send_decision(
        &self,
        identity: &Identity,
        profile_id: &ProfileId,
        decision: Decision,
    ) -> Result<(), DecisionSendError> {
        let url = self.endpoint(["devs", profile_id.as_str(), decision.path_segment()]);
        debug!(%url, "sending decision");

        let response = self
            .client
            .post(url)
            .header(USER_HEADER, identity.as_str())
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DecisionSendError::Timeout
                } else {
                    DecisionSendError::Network(e.to_string())
                }
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(DecisionSendError::Status(status.as_u16())),
        }
    }

    async fn open_channel(&self, identity: &Identity) -> Result<Self::Channel, ChannelError> {
        let url = self.socket_url(identity)?;
        debug!(%url, "opening push channel");

        let (ws, _) = connect_async(url.as_str()).await.map_err(|e| match e {
            tungstenite::Error::Http(response) => ChannelError::Status(response.status().as_u16()),
            other => ChannelError::Connect(other.to_string()),
        })?;
        SocketIoChannel::handshake(ws, self.config.engine_io).await
    }
}

fn fetch_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() { FetchError::Timeout } else { FetchError::Network(error.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: &str) -> HttpBackend {
        HttpBackend::new(HttpConfig { base_url: base_url.into(), ..HttpConfig::default() }).unwrap()
    }

    #[test]
    fn endpoints_respect_base_path() {
        let b = backend("http://localhost:3333/api");
        assert_eq!(b.endpoint(["devs"]).as_str(), "http://localhost:3333/api/devs");

        let b = backend("http://localhost:3333/");
        assert_eq!(
            b.endpoint(["devs", "5d1f", Decision::Dislike.path_segment()]).as_str(),
            "http://localhost:3333/devs/5d1f/dislikes"
        );
    }

    #[test]
    fn profile_ids_are_escaped() {
        let b = backend("http://localhost:3333");
        assert_eq!(b.endpoint(["devs", "a/b"]).as_str(), "http://localhost:3333/devs/a%2Fb");
    }

    #[test]
    fn socket_url_carries_identity() {
        let ana = Identity::new("ana").unwrap();

        let b = backend("http://localhost:3333");
        assert_eq!(
            b.socket_url(&ana).unwrap().as_str(),
            "ws://localhost:3333/socket.io/?EIO=3&transport=websocket&user=ana"
        );

        let b = HttpBackend::new(HttpConfig {
            base_url: "https://devmatch.test/api".into(),
            engine_io: EngineProtocol::V4,
            ..HttpConfig::default()
        })
        .unwrap();
        assert_eq!(
            b.socket_url(&ana).unwrap().as_str(),
            "wss://devmatch.test/api/socket.io/?EIO=4&transport=websocket&user=ana"
        );
    }

    #[test]
    fn rejects_unusable_base() {
        let err = HttpBackend::new(HttpConfig { base_url: "mailto:x@y".into(), ..HttpConfig::default() });
        assert!(matches!(err, Err(HttpSetupError::InvalidUrl(_))));

        let err = HttpBackend::new(HttpConfig { base_url: "not a url".into(), ..HttpConfig::default() });
        assert!(matches!(err, Err(HttpSetupError::InvalidUrl(_))));
    }
}
