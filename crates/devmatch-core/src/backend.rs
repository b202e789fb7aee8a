//! I/O seam between the session core and the server.
//!
//! Production uses the HTTP backend in `devmatch-client`, tests use the
//! scripted backend in `devmatch-harness`. The core never calls these
//! directly; a runtime does, in response to [`crate::SessionAction`]s.

use async_trait::async_trait;
use devmatch_proto::{Decision, Identity, MatchEvent, Profile, ProfileId};

use crate::error::{ChannelError, DecisionSendError, FetchError};

/// Server operations for one client.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Push channel produced by [`Backend::open_channel`].
    type Channel: PushChannel;

    /// Retrieve the ordered candidate list for `identity`.
    ///
    /// One request, no retries.
    async fn fetch_candidates(&self, identity: &Identity) -> Result<Vec<Profile>, FetchError>;

    /// Send a decision on `profile_id`. Only success or failure is reported.
    async fn send_decision(
        &self,
        identity: &Identity,
        profile_id: &ProfileId,
        decision: Decision,
    ) -> Result<(), DecisionSendError>;

    /// Open the push channel for `identity`.
    ///
    /// The identity is sent once, at connection time.
    async fn open_channel(&self, identity: &Identity) -> Result<Self::Channel, ChannelError>;
}

/// A live, identity-scoped stream of match events.
///
/// Not restartable: once [`PushChannel::next_event`] returns `None` the
/// channel is finished and a new one must be opened.
#[async_trait]
pub trait PushChannel: Send + 'static {
    /// Wait for the next match.
    ///
    /// Returns `None` when the connection has ended, `Some(Err(_))` for a
    /// failure that ends the stream.
    async fn next_event(&mut self) -> Option<Result<MatchEvent, ChannelError>>;

    /// Close the connection. Further calls to `next_event` return `None`.
    fn close(&mut self);
}
