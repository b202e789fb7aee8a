//! Push messages delivered over the match stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::{ProtocolError, Result},
    profile::Profile,
};

/// Name of the push event that announces a mutual match.
pub const MATCH_EVENT: &str = "match";

/// Server notification that the current identity and `profile` liked each
/// other.
///
/// The profile is not necessarily in the local queue: the match may come from
/// a decision made earlier in the session, or from the other side acting on a
/// like we sent in a previous session. On the wire the payload is the bare
/// profile document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchEvent {
    /// The matched profile.
    pub profile: Profile,
}

impl MatchEvent {
    /// Wrap a profile.
    pub fn new(profile: Profile) -> Self {
        Self { profile }
    }

    /// Encode as the websocket frame the server emits for it.
    pub fn to_frame(&self) -> Result<String> {
        let data = serde_json::to_string(&(MATCH_EVENT, &self.profile)).map_err(|e| {
            ProtocolError::InvalidPayload { event: MATCH_EVENT.to_string(), reason: e.to_string() }
        })?;
        Ok(format!("42{data}"))
    }
}

/// A decoded push stream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushMessage {
    /// A `match` event.
    Match(MatchEvent),

    /// Any other named event. Kept so callers can log it.
    Other {
        /// Event name.
        name: String,
    },
}

impl PushMessage {
    /// Classify a Socket.IO event by name and arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidPayload`] if a `match` event does not
    /// carry a profile document as its first argument.
    pub fn from_event(name: &str, args: Vec<Value>) -> Result<Self> {
        if name != MATCH_EVENT {
            return Ok(Self::Other { name: name.to_string() });
        }

        let invalid = |reason: String| ProtocolError::InvalidPayload {
            event: name.to_string(),
            reason,
        };
        let payload =
            args.into_iter().next().ok_or_else(|| invalid("missing profile argument".into()))?;
        let profile: Profile = serde_json::from_value(payload).map_err(|e| invalid(e.to_string()))?;
        Ok(Self::Match(MatchEvent::new(profile)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::socketio::{EnginePacket, SocketPacket};

    #[test]
    fn match_event_carries_profile() {
        let msg = PushMessage::from_event("match", vec![json!({"_id": "z", "name": "Zed"})]).unwrap();
        match msg {
            PushMessage::Match(event) => assert_eq!(event.profile.display_name, "Zed"),
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn other_events_are_not_matches() {
        let msg = PushMessage::from_event("message", vec![json!("hello")]).unwrap();
        assert_eq!(msg, PushMessage::Other { name: "message".into() });
    }

    #[test]
    fn malformed_match_payload_is_an_error() {
        let err = PushMessage::from_event("match", vec![json!("not a profile")]).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { ref event, .. } if event == "match"));

        let err = PushMessage::from_event("match", Vec::new()).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { .. }));
    }

    #[test]
    fn encoded_frame_decodes_back() {
        let event = MatchEvent::new(Profile::new("z", "Zed", "bio", "https://a/z.png"));
        let frame = event.to_frame().unwrap();

        let EnginePacket::Message(payload) = EnginePacket::parse(&frame).unwrap() else {
            panic!("expected engine message in {frame}");
        };
        let SocketPacket::Event { name, args, .. } = SocketPacket::parse(&payload).unwrap() else {
            panic!("expected socket event in {payload}");
        };
        assert_eq!(PushMessage::from_event(&name, args).unwrap(), PushMessage::Match(event));
    }
}
