//! Engine.IO and Socket.IO packet codec.
//!
//! The push channel is a Socket.IO connection over the Engine.IO websocket
//! transport. Each websocket text frame holds one Engine.IO packet; message
//! packets wrap one Socket.IO packet:
//!
//! ```text
//! 0{"sid":..,"pingInterval":..,"pingTimeout":..}   engine open
//! 2 / 3                                            engine ping / pong
//! 40                                               socket connect, namespace /
//! 42["match",{"_id":..,"name":..}]                 socket event
//! 44{"message":..}                                 socket connect error
//! ```
//!
//! Binary attachments and acknowledgements are not used by the match stream
//! and decode as [`SocketPacket::Other`].

use serde::Deserialize;
use serde_json::Value;

use crate::errors::{ProtocolError, Result};

/// Namespace every Devmatch event is sent on.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Engine.IO protocol revision spoken on the wire.
///
/// Revision 3 is spoken by Socket.IO 2.x servers, revision 4 by 3.x and
/// later. They differ in who pings: in 3 the client pings and the server
/// answers, in 4 the server pings and the client answers. Revision 4 servers
/// also wait for the client to request the namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineProtocol {
    /// `EIO=3`.
    #[default]
    V3,
    /// `EIO=4`.
    V4,
}

impl EngineProtocol {
    /// Value of the `EIO` query parameter.
    pub fn query_value(self) -> &'static str {
        match self {
            Self::V3 => "3",
            Self::V4 => "4",
        }
    }

    /// True if keep-alive pings originate from the client.
    pub fn client_pings(self) -> bool {
        self == Self::V3
    }
}

/// Payload of the Engine.IO open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Engine session id.
    pub sid: String,
    /// Milliseconds between pings.
    pub ping_interval: u64,
    /// Milliseconds to wait for the answering ping or pong.
    pub ping_timeout: u64,
}

/// One Engine.IO packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    /// Session opened.
    Open(Handshake),
    /// Transport is being closed.
    Close,
    /// Keep-alive ping, with optional payload to echo.
    Ping(String),
    /// Keep-alive answer.
    Pong(String),
    /// Socket.IO payload.
    Message(String),
    /// Transport upgrade, unused over a direct websocket.
    Upgrade,
    /// No-op.
    Noop,
}

impl EnginePacket {
    /// Decode one text frame.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::MalformedPacket`] for an empty frame, an unknown
    /// packet type, or an open packet whose handshake is not JSON.
    pub fn parse(frame: &str) -> Result<Self> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or_else(|| malformed("empty engine packet"))?;
        let payload = chars.as_str();

        match kind {
            '0' => serde_json::from_str(payload)
                .map(Self::Open)
                .map_err(|e| malformed(format!("bad handshake: {e}"))),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(payload.to_string())),
            '3' => Ok(Self::Pong(payload.to_string())),
            '4' => Ok(Self::Message(payload.to_string())),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(malformed(format!("unknown engine packet type {other:?}"))),
        }
    }

    /// Encode as a text frame. Open packets are server-only and encode as
    /// their bare type.
    pub fn encode(&self) -> String {
        match self {
            Self::Open(_) => "0".to_string(),
            Self::Close => "1".to_string(),
            Self::Ping(data) => format!("2{data}"),
            Self::Pong(data) => format!("3{data}"),
            Self::Message(data) => format!("4{data}"),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        }
    }
}

/// One Socket.IO packet, carried inside [`EnginePacket::Message`].
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// Namespace joined.
    Connect {
        /// Namespace.
        namespace: String,
    },
    /// Namespace left.
    Disconnect {
        /// Namespace.
        namespace: String,
    },
    /// Named event with JSON arguments.
    Event {
        /// Namespace.
        namespace: String,
        /// Event name.
        name: String,
        /// Arguments after the name.
        args: Vec<Value>,
    },
    /// Server refused the namespace.
    ConnectError {
        /// Namespace.
        namespace: String,
        /// Server message, raw JSON when it is not a plain string.
        message: String,
    },
    /// Acknowledgement or binary packet.
    Other {
        /// Socket.IO packet type.
        kind: u8,
    },
}

impl SocketPacket {
    /// Decode the payload of an engine message packet.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::MalformedPacket`] if the type is unknown or an event
    /// payload is not an array starting with a string name.
    pub fn parse(payload: &str) -> Result<Self> {
        let mut chars = payload.chars();
        let kind = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .and_then(|d| u8::try_from(d).ok())
            .ok_or_else(|| malformed("missing socket packet type"))?;
        let rest = chars.as_str();

        let (namespace, rest) = if rest.starts_with('/') {
            match rest.split_once(',') {
                Some((namespace, data)) => (namespace.to_string(), data),
                None => (rest.to_string(), ""),
            }
        } else {
            (DEFAULT_NAMESPACE.to_string(), rest)
        };
        // Ack id, never requested by the match stream.
        let data = rest.trim_start_matches(|c: char| c.is_ascii_digit());

        match kind {
            0 => Ok(Self::Connect { namespace }),
            1 => Ok(Self::Disconnect { namespace }),
            2 => {
                let mut array = match serde_json::from_str(data) {
                    Ok(Value::Array(array)) => array.into_iter(),
                    Ok(_) => return Err(malformed("event payload is not an array")),
                    Err(e) => return Err(malformed(format!("event payload: {e}"))),
                };
                let Some(Value::String(name)) = array.next() else {
                    return Err(malformed("event without a name"));
                };
                Ok(Self::Event { namespace, name, args: array.collect() })
            },
            4 => {
                let message = match serde_json::from_str::<Value>(data) {
                    Ok(Value::String(message)) => message,
                    Ok(Value::Object(fields)) => match fields.get("message") {
                        Some(Value::String(message)) => message.clone(),
                        _ => data.to_string(),
                    },
                    _ => data.to_string(),
                };
                Ok(Self::ConnectError { namespace, message })
            },
            3 | 5 | 6 => Ok(Self::Other { kind }),
            other => Err(malformed(format!("unknown socket packet type {other}"))),
        }
    }

    /// Engine frame requesting `namespace`, as sent by the client.
    pub fn connect_frame(namespace: &str) -> String {
        if namespace == DEFAULT_NAMESPACE {
            "40".to_string()
        } else {
            format!("40{namespace},")
        }
    }
}

fn malformed(reason: impl Into<String>) -> ProtocolError {
    ProtocolError::MalformedPacket { reason: reason.into() }
}
