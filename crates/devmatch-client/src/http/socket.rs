//! Push channel over a Socket.IO websocket.

use std::time::Duration;

use async_trait::async_trait;
use devmatch_core::{ChannelError, MatchEvent, PushChannel};
use devmatch_proto::{EngineProtocol, EnginePacket, PushMessage, SocketPacket, socketio};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::{Instant, timeout_at};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, trace, warn};

/// What one inbound frame asks the channel to do.
enum Step {
    Deliver(MatchEvent),
    Pong(String),
    Skip,
    End,
}

/// [`PushChannel`] reading `match` events from a Socket.IO connection.
///
/// Generic over the websocket so tests can drive it over an in-memory pipe.
/// Other events, and frames that do not decode, are skipped. A server close
/// or namespace disconnect ends the channel, as does a missed keep-alive.
pub struct SocketIoChannel<S> {
    ws: Option<S>,
    protocol: EngineProtocol,
    ping_interval: Duration,
    liveness: Duration,
    last_seen: Instant,
    next_ping: Instant,
}

impl<S> SocketIoChannel<S>
where
    S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin + Send,
{
    /// Run the Engine.IO and Socket.IO handshakes on a connected websocket.
    ///
    /// Returns once the default namespace is joined.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Connect`] if the server refuses the namespace or the
    /// connection drops first, [`ChannelError::Decode`] if the open packet is
    /// malformed.
    pub async fn handshake(mut ws: S, protocol: EngineProtocol) -> Result<Self, ChannelError> {
        let handshake = loop {
            match EnginePacket::parse(&recv_text(&mut ws).await?)? {
                EnginePacket::Open(handshake) => break handshake,
                other => trace!(?other, "waiting for engine open"),
            }
        };
        debug!(sid = %handshake.sid, ?protocol, "engine session opened");

        if !protocol.client_pings() {
            send_text(&mut ws, SocketPacket::connect_frame(socketio::DEFAULT_NAMESPACE))
                .await
                .map_err(|e| ChannelError::Connect(e.to_string()))?;
        }

        loop {
            match EnginePacket::parse(&recv_text(&mut ws).await?)? {
                EnginePacket::Message(payload) => match SocketPacket::parse(&payload)? {
                    SocketPacket::Connect { namespace }
                        if namespace == socketio::DEFAULT_NAMESPACE =>
                    {
                        break;
                    },
                    SocketPacket::ConnectError { message, .. } => {
                        return Err(ChannelError::Connect(message));
                    },
                    other => trace!(?other, "waiting for namespace connect"),
                },
                EnginePacket::Ping(data) => {
                    send_text(&mut ws, EnginePacket::Pong(data).encode())
                        .await
                        .map_err(|e| ChannelError::Connect(e.to_string()))?;
                },
                EnginePacket::Close => {
                    return Err(ChannelError::Connect("closed during handshake".into()));
                },
                other => trace!(?other, "waiting for namespace connect"),
            }
        }

        let ping_interval = Duration::from_millis(handshake.ping_interval);
        let now = Instant::now();
        Ok(Self {
            ws: Some(ws),
            protocol,
            ping_interval,
            liveness: ping_interval + Duration::from_millis(handshake.ping_timeout),
            last_seen: now,
            next_ping: now + ping_interval,
        })
    }

    async fn send(&mut self, frame: String) -> Result<(), ChannelError> {
        let Some(ws) = self.ws.as_mut() else {
            return Err(ChannelError::Closed("channel closed".into()));
        };
        send_text(ws, frame).await.map_err(|e| ChannelError::Closed(e.to_string()))
    }

    fn finish(&mut self, failure: Option<ChannelError>) -> Option<Result<MatchEvent, ChannelError>> {
        self.ws = None;
        failure.map(Err)
    }
}

#[async_trait]
impl<S> PushChannel for SocketIoChannel<S>
where
    S: Stream<Item = Result<Message, WsError>>
        + Sink<Message, Error = WsError>
        + Unpin
        + Send
        + 'static,
{
    async fn next_event(&mut self) -> Option<Result<MatchEvent, ChannelError>> {
        loop {
            let deadline = self.last_seen + self.liveness;
            let wake = if self.protocol.client_pings() {
                deadline.min(self.next_ping)
            } else {
                deadline
            };

            let ws = self.ws.as_mut()?;
            let polled = timeout_at(wake, ws.next()).await;
            let message = match polled {
                Ok(Some(Ok(message))) => message,
                Ok(Some(Err(error))) => {
                    return self.finish(Some(ChannelError::Closed(error.to_string())));
                },
                Ok(None) => return self.finish(None),
                Err(_) if Instant::now() >= deadline => {
                    return self.finish(Some(ChannelError::Closed("ping timeout".into())));
                },
                Err(_) => {
                    if let Err(error) = self.send(EnginePacket::Ping(String::new()).encode()).await {
                        return self.finish(Some(error));
                    }
                    self.next_ping = Instant::now() + self.ping_interval;
                    continue;
                },
            };
            self.last_seen = Instant::now();

            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => return self.finish(None),
                _ => continue,
            };

            match classify(text.as_str()) {
                Step::Deliver(event) => return Some(Ok(event)),
                Step::Pong(data) => {
                    if let Err(error) = self.send(EnginePacket::Pong(data).encode()).await {
                        return self.finish(Some(error));
                    }
                },
                Step::Skip => {},
                Step::End => return self.finish(None),
            }
        }
    }

    fn close(&mut self) {
        self.ws = None;
    }
}

fn classify(frame: &str) -> Step {
    let payload = match EnginePacket::parse(frame) {
        Ok(EnginePacket::Message(payload)) => payload,
        Ok(EnginePacket::Ping(data)) => return Step::Pong(data),
        Ok(EnginePacket::Close) => return Step::End,
        Ok(other) => {
            trace!(?other, "engine packet");
            return Step::Skip;
        },
        Err(error) => {
            warn!(%error, "skipping malformed push frame");
            return Step::Skip;
        },
    };

    match SocketPacket::parse(&payload) {
        Ok(SocketPacket::Event { name, args, .. }) => match PushMessage::from_event(&name, args) {
            Ok(PushMessage::Match(event)) => Step::Deliver(event),
            Ok(PushMessage::Other { name }) => {
                debug!(%name, "ignoring push event");
                Step::Skip
            },
            Err(error) => {
                warn!(%error, "skipping malformed push event");
                Step::Skip
            },
        },
        Ok(SocketPacket::Disconnect { namespace })
            if namespace == socketio::DEFAULT_NAMESPACE =>
        {
            Step::End
        },
        Ok(other) => {
            trace!(?other, "socket packet");
            Step::Skip
        },
        Err(error) => {
            warn!(%error, "skipping malformed push frame");
            Step::Skip
        },
    }
}

async fn recv_text<S>(ws: &mut S) -> Result<String, ChannelError>
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_string()),
            Some(Ok(Message::Close(_))) | None => {
                return Err(ChannelError::Connect("closed during handshake".into()));
            },
            Some(Ok(_)) => {},
            Some(Err(error)) => return Err(ChannelError::Connect(error.to_string())),
        }
    }
}

async fn send_text<S>(ws: &mut S, frame: String) -> Result<(), WsError>
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    ws.send(Message::text(frame)).await
}
