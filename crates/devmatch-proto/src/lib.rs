//! Wire format for the Devmatch client.
//!
//! Candidates and match notifications travel as JSON. The server's field
//! names (`_id`, `name`, `avatar`) are mapped onto [`Profile`] here so that no
//! other crate has to know about them.
//!
//! Match notifications arrive as Socket.IO events over an Engine.IO
//! websocket. [`socketio`] frames and unframes the packets and
//! [`PushMessage`] classifies the events. Only events named `match` carry
//! meaning; everything else is surfaced as [`PushMessage::Other`] and ignored
//! upstream.
#![forbid(unsafe_code)]

pub mod decision;
pub mod errors;
pub mod event;
pub mod identity;
pub mod profile;
pub mod socketio;

pub use decision::Decision;
pub use errors::{ProtocolError, Result};
pub use event::{MATCH_EVENT, MatchEvent, PushMessage};
pub use identity::Identity;
pub use profile::{Profile, ProfileId};
pub use socketio::{EngineProtocol, EnginePacket, Handshake, SocketPacket};
