//! Session lifecycle state machine.
//!
//! Ties the [`Reconciler`] to an identity and turns user input and network
//! completions into [`SessionAction`]s for a runtime to execute.
//!
//! # Architecture: Action-Based State Machine
//!
//! - [`Session::handle`] accepts one [`SessionEvent`] at a time
//! - it returns `Result<Vec<SessionAction>, SessionError>`
//! - the runtime performs the actions and reports completions back as events
//!
//! # Generations
//!
//! Every login starts a new [`Generation`], and so does every logout. Actions
//! carry the generation they were issued under and completions must echo it.
//! A completion from an older generation is dropped, which is how a fetch
//! that finishes after logout, or a match pushed on a channel that has since
//! been replaced, is kept out of the new session.
//!
//! # Lifecycle
//!
//! ```text
//! ┌────────┐  Login   ┌────────┐  Logout / Login(other)  ┌────────┐
//! │ Signed │─────────>│ Active │────────────────────────>│ Signed │
//! │  out   │          │ gen N  │                         │ out or │
//! └────────┘          └────────┘                         │ gen N+1│
//!                                                        └────────┘
//! ```
//!
//! Leaving an active session always emits [`SessionAction::ClosePushChannel`]
//! before anything for the next session.

use std::fmt;

use devmatch_proto::{Decision, Identity, MatchEvent, Profile, ProfileId};
use tracing::{debug, info, warn};

use crate::{
    error::{ChannelError, DecisionSendError, FetchError, SessionError},
    reconciler::{Reconciler, SessionState},
};

/// Session counter used to discard late completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// Raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Progress of the candidate fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueueStatus {
    /// No fetch requested.
    #[default]
    Idle,
    /// Fetch in flight.
    Loading,
    /// Queue populated from the last fetch.
    Ready,
    /// Last fetch failed. The queue is shown empty with this reason.
    Failed {
        /// Human-readable failure.
        reason: String,
    },
}

/// State of the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    /// No channel, e.g. signed out.
    #[default]
    Closed,
    /// Open requested, not yet confirmed.
    Connecting,
    /// Receiving match events.
    Live,
    /// Channel ended. No live match notifications until reconnected.
    Disconnected {
        /// Human-readable cause.
        reason: String,
    },
}

/// Inputs to the session.
///
/// User actions carry no generation; completions carry the generation of the
/// action that started them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Identity became available. Starts a session or replaces the current one.
    Login {
        /// Identity to scope the session to.
        identity: Identity,
    },

    /// End the session and discard its state.
    Logout,

    /// Candidate fetch succeeded.
    CandidatesLoaded {
        /// Generation the fetch was issued under.
        generation: Generation,
        /// Candidates in server order.
        profiles: Vec<Profile>,
    },

    /// Candidate fetch failed.
    CandidatesFailed {
        /// Generation the fetch was issued under.
        generation: Generation,
        /// Failure.
        error: FetchError,
    },

    /// Re-fetch candidates for the current session.
    RetryFetch,

    /// User decided on the head candidate.
    Decide {
        /// Must be the current head.
        profile_id: ProfileId,
        /// Verdict.
        decision: Decision,
    },

    /// A decision send failed after the queue had advanced.
    DecisionFailed {
        /// Generation the send was issued under.
        generation: Generation,
        /// Profile the decision was for.
        profile_id: ProfileId,
        /// Failure.
        error: DecisionSendError,
    },

    /// Push channel is established.
    ChannelOpened {
        /// Generation the channel was opened under.
        generation: Generation,
    },

    /// Push channel delivered a match.
    MatchReceived {
        /// Generation the channel was opened under.
        generation: Generation,
        /// The match.
        event: MatchEvent,
    },

    /// Push channel ended or failed to open.
    ChannelClosed {
        /// Generation the channel was opened under.
        generation: Generation,
        /// Cause, `None` for a clean end of stream.
        error: Option<ChannelError>,
    },

    /// Reopen a disconnected push channel.
    Reconnect,

    /// User acknowledged the match overlay.
    DismissMatch,
}

/// Effects requested by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Fetch candidates and report `CandidatesLoaded` or `CandidatesFailed`.
    FetchCandidates {
        /// Generation to echo back.
        generation: Generation,
        /// Identity to fetch for.
        identity: Identity,
    },

    /// Send a decision. Report `DecisionFailed` only on failure.
    SendDecision {
        /// Generation to echo back.
        generation: Generation,
        /// Identity deciding.
        identity: Identity,
        /// Profile decided on.
        profile_id: ProfileId,
        /// Verdict.
        decision: Decision,
    },

    /// Open the push channel, replacing any open one.
    OpenPushChannel {
        /// Generation to echo back.
        generation: Generation,
        /// Identity sent as connection metadata.
        identity: Identity,
    },

    /// Close the push channel opened under `generation`.
    ClosePushChannel {
        /// Generation of the channel to close.
        generation: Generation,
    },
}

/// Read-only copy of everything a presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    /// Current identity, `None` when signed out.
    pub identity: Option<Identity>,
    /// Current generation.
    pub generation: Generation,
    /// Queue and match overlay.
    pub state: SessionState,
    /// Fetch progress.
    pub queue_status: QueueStatus,
    /// Push channel state.
    pub channel_status: ChannelStatus,
    /// Decision sends that failed and were absorbed this session.
    pub failed_decisions: u64,
}

impl SessionSnapshot {
    /// Head of the queue.
    pub fn head(&self) -> Option<&Profile> {
        self.state.queue().head()
    }
}

/// Session lifecycle manager and owner of the [`Reconciler`].
#[derive(Debug, Default)]
pub struct Session {
    generation: Generation,
    identity: Option<Identity>,
    reconciler: Reconciler,
    queue_status: QueueStatus,
    channel_status: ChannelStatus,
    failed_decisions: u64,
}

impl Session {
    /// Create a signed-out session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Current identity.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Queue and overlay.
    pub fn state(&self) -> &SessionState {
        self.reconciler.state()
    }

    /// Fetch progress.
    pub fn queue_status(&self) -> &QueueStatus {
        &self.queue_status
    }

    /// Push channel state.
    pub fn channel_status(&self) -> &ChannelStatus {
        &self.channel_status
    }

    /// Copy of the renderable state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            identity: self.identity.clone(),
            generation: self.generation,
            state: self.reconciler.state().clone(),
            queue_status: self.queue_status.clone(),
            channel_status: self.channel_status.clone(),
            failed_decisions: self.failed_decisions,
        }
    }

    /// Process one event.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] when a user action violates a precondition
    /// (deciding with no session, on an empty queue, or off the head). State
    /// is unchanged in that case. Network failures are events, not errors.
    pub fn handle(&mut self, event: SessionEvent) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::Login { identity } => Ok(self.login(identity)),
            SessionEvent::Logout => Ok(self.logout()),
            SessionEvent::RetryFetch => self.retry_fetch(),
            SessionEvent::Decide { profile_id, decision } => self.decide(&profile_id, decision),
            SessionEvent::Reconnect => self.reconnect(),
            SessionEvent::DismissMatch => {
                self.reconciler.dismiss_match();
                Ok(vec![])
            },
            completion => {
                self.complete(completion);
                Ok(vec![])
            },
        }
    }

    fn login(&mut self, identity: Identity) -> Vec<SessionAction> {
        if self.identity.as_ref() == Some(&identity) {
            debug!(%identity, "login for current identity ignored");
            return vec![];
        }

        let mut actions = self.logout();

        self.generation = self.generation.next();
        self.identity = Some(identity.clone());
        self.queue_status = QueueStatus::Loading;
        self.channel_status = ChannelStatus::Connecting;
        info!(%identity, generation = %self.generation, "session started");

        actions.push(SessionAction::FetchCandidates {
            generation: self.generation,
            identity: identity.clone(),
        });
        actions.push(SessionAction::OpenPushChannel { generation: self.generation, identity });
        actions
    }

    fn logout(&mut self) -> Vec<SessionAction> {
        let Some(identity) = self.identity.take() else {
            return vec![];
        };

        let closing = self.generation;
        self.generation = self.generation.next();
        self.reconciler = Reconciler::new();
        self.queue_status = QueueStatus::Idle;
        self.channel_status = ChannelStatus::Closed;
        self.failed_decisions = 0;
        info!(%identity, generation = %closing, "session ended");

        vec![SessionAction::ClosePushChannel { generation: closing }]
    }

    fn retry_fetch(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        let identity = self.identity.clone().ok_or(SessionError::NotLoggedIn)?;
        if self.queue_status == QueueStatus::Loading {
            debug!("fetch already in flight");
            return Ok(vec![]);
        }

        self.queue_status = QueueStatus::Loading;
        Ok(vec![SessionAction::FetchCandidates { generation: self.generation, identity }])
    }

    fn decide(
        &mut self,
        profile_id: &ProfileId,
        decision: Decision,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let identity = self.identity.clone().ok_or(SessionError::NotLoggedIn)?;
        let decided = self.reconciler.decide(profile_id, decision)?;

        Ok(vec![SessionAction::SendDecision {
            generation: self.generation,
            identity,
            profile_id: decided.id,
            decision,
        }])
    }

    fn reconnect(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        let identity = self.identity.clone().ok_or(SessionError::NotLoggedIn)?;
        match self.channel_status {
            ChannelStatus::Connecting | ChannelStatus::Live => Ok(vec![]),
            ChannelStatus::Closed | ChannelStatus::Disconnected { .. } => {
                self.channel_status = ChannelStatus::Connecting;
                Ok(vec![SessionAction::OpenPushChannel { generation: self.generation, identity }])
            },
        }
    }

    fn complete(&mut self, event: SessionEvent) {
        let Some(generation) = completion_generation(&event) else {
            return;
        };
        if self.identity.is_none() || generation != self.generation {
            debug!(%generation, current = %self.generation, "dropping stale completion");
            return;
        }

        match event {
            SessionEvent::CandidatesLoaded { profiles, .. } => {
                self.reconciler.populate(profiles);
                self.queue_status = QueueStatus::Ready;
            },
            SessionEvent::CandidatesFailed { error, .. } => {
                warn!(%error, "candidate fetch failed");
                self.queue_status = QueueStatus::Failed { reason: error.to_string() };
            },
            SessionEvent::DecisionFailed { profile_id, error, .. } => {
                warn!(profile = %profile_id, %error, "decision send failed, not retrying");
                self.failed_decisions += 1;
            },
            SessionEvent::ChannelOpened { .. } => {
                self.channel_status = ChannelStatus::Live;
            },
            SessionEvent::MatchReceived { event, .. } => {
                info!(profile = %event.profile.id, "match received");
                self.reconciler.on_match(event);
            },
            SessionEvent::ChannelClosed { error, .. } => {
                let reason = error.map_or_else(|| "stream ended".to_string(), |e| e.to_string());
                warn!(%reason, "push channel lost");
                self.channel_status = ChannelStatus::Disconnected { reason };
            },
            _ => {},
        }
    }
}

fn completion_generation(event: &SessionEvent) -> Option<Generation> {
    match event {
        SessionEvent::CandidatesLoaded { generation, .. }
        | SessionEvent::CandidatesFailed { generation, .. }
        | SessionEvent::DecisionFailed { generation, .. }
        | SessionEvent::ChannelOpened { generation }
        | SessionEvent::MatchReceived { generation, .. }
        | SessionEvent::ChannelClosed { generation, .. } => Some(*generation),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(token: &str) -> Identity {
        Identity::new(token).unwrap()
    }

    fn profile(id: &str) -> Profile {
        Profile::new(id, id.to_uppercase(), "", "")
    }

    fn profiles(ids: &[&str]) -> Vec<Profile> {
        ids.iter().map(|id| profile(id)).collect()
    }

    fn queue_ids(session: &Session) -> Vec<String> {
        session.state().queue().iter().map(|p| p.id.to_string()).collect()
    }

    /// Log in and load `ids`, returning the session generation.
    fn active(session: &mut Session, who: &str, ids: &[&str]) -> Generation {
        session.handle(SessionEvent::Login { identity: identity(who) }).unwrap();
        let generation = session.generation();
        session
            .handle(SessionEvent::CandidatesLoaded { generation, profiles: profiles(ids) })
            .unwrap();
        session.handle(SessionEvent::ChannelOpened { generation }).unwrap();
        generation
    }

    #[test]
    fn login_fetches_and_opens_channel_once() {
        let mut session = Session::new();
        let actions = session.handle(SessionEvent::Login { identity: identity("u1") }).unwrap();

        let generation = session.generation();
        assert_eq!(actions, vec![
            SessionAction::FetchCandidates { generation, identity: identity("u1") },
            SessionAction::OpenPushChannel { generation, identity: identity("u1") },
        ]);
        assert_eq!(session.queue_status(), &QueueStatus::Loading);
        assert_eq!(session.channel_status(), &ChannelStatus::Connecting);

        // Same identity again is a no-op
        let again = session.handle(SessionEvent::Login { identity: identity("u1") }).unwrap();
        assert!(again.is_empty());
        assert_eq!(session.generation(), generation);
    }

    #[test]
    fn fetch_then_decide_scenario() {
        let mut session = Session::new();
        let generation = active(&mut session, "u1", &["a", "b", "c"]);

        let actions = session
            .handle(SessionEvent::Decide { profile_id: "a".into(), decision: Decision::Dislike })
            .unwrap();
        assert_eq!(actions, vec![SessionAction::SendDecision {
            generation,
            identity: identity("u1"),
            profile_id: "a".into(),
            decision: Decision::Dislike,
        }]);
        assert_eq!(queue_ids(&session), ["b", "c"]);

        session
            .handle(SessionEvent::Decide { profile_id: "b".into(), decision: Decision::Like })
            .unwrap();
        assert_eq!(queue_ids(&session), ["c"]);
    }

    #[test]
    fn decide_before_fetch_is_rejected() {
        let mut session = Session::new();
        let decide = SessionEvent::Decide { profile_id: "a".into(), decision: Decision::Like };

        assert_eq!(session.handle(decide.clone()), Err(SessionError::NotLoggedIn));

        session.handle(SessionEvent::Login { identity: identity("u1") }).unwrap();
        assert_eq!(session.handle(decide), Err(SessionError::EmptyQueue));
    }

    #[test]
    fn match_for_unqueued_profile() {
        let mut session = Session::new();
        let generation = active(&mut session, "u1", &["a", "b"]);

        let event = MatchEvent::new(profile("z"));
        session.handle(SessionEvent::MatchReceived { generation, event: event.clone() }).unwrap();

        assert_eq!(session.state().active_match(), Some(&event));
        assert_eq!(queue_ids(&session), ["a", "b"]);
    }

    #[test]
    fn dismiss_leaves_queue_untouched() {
        let mut session = Session::new();
        let generation = active(&mut session, "u1", &["a", "b"]);
        session
            .handle(SessionEvent::MatchReceived { generation, event: MatchEvent::new(profile("z")) })
            .unwrap();

        session.handle(SessionEvent::DismissMatch).unwrap();
        assert!(session.state().active_match().is_none());
        assert_eq!(queue_ids(&session), ["a", "b"]);

        assert!(session.handle(SessionEvent::DismissMatch).unwrap().is_empty());
    }

    #[test]
    fn identity_change_closes_old_channel_first() {
        let mut session = Session::new();
        let old = active(&mut session, "u1", &["a", "b"]);
        session
            .handle(SessionEvent::MatchReceived { generation: old, event: MatchEvent::new(profile("z")) })
            .unwrap();

        let actions = session.handle(SessionEvent::Login { identity: identity("u2") }).unwrap();
        let new = session.generation();
        assert_ne!(old, new);
        assert_eq!(actions, vec![
            SessionAction::ClosePushChannel { generation: old },
            SessionAction::FetchCandidates { generation: new, identity: identity("u2") },
            SessionAction::OpenPushChannel { generation: new, identity: identity("u2") },
        ]);

        // Old session state is gone
        assert!(session.state().queue().is_empty());
        assert!(session.state().active_match().is_none());

        // Old channel emitting after teardown changes nothing
        let before = session.snapshot();
        session
            .handle(SessionEvent::MatchReceived { generation: old, event: MatchEvent::new(profile("y")) })
            .unwrap();
        session
            .handle(SessionEvent::CandidatesLoaded { generation: old, profiles: profiles(&["q"]) })
            .unwrap();
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn logout_discards_everything() {
        let mut session = Session::new();
        let generation = active(&mut session, "u1", &["a"]);
        session
            .handle(SessionEvent::MatchReceived { generation, event: MatchEvent::new(profile("z")) })
            .unwrap();

        let actions = session.handle(SessionEvent::Logout).unwrap();
        assert_eq!(actions, vec![SessionAction::ClosePushChannel { generation }]);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.identity, None);
        assert!(snapshot.head().is_none());
        assert!(snapshot.state.active_match().is_none());
        assert_eq!(snapshot.channel_status, ChannelStatus::Closed);

        // Late completion from the ended session is dropped
        session.handle(SessionEvent::CandidatesLoaded { generation, profiles: profiles(&["a"]) }).unwrap();
        assert!(session.state().queue().is_empty());

        // Logging out twice is harmless
        assert!(session.handle(SessionEvent::Logout).unwrap().is_empty());
    }

    #[test]
    fn decision_failure_is_absorbed() {
        let mut session = Session::new();
        let generation = active(&mut session, "u1", &["a", "b"]);
        session
            .handle(SessionEvent::Decide { profile_id: "a".into(), decision: Decision::Like })
            .unwrap();

        session
            .handle(SessionEvent::DecisionFailed {
                generation,
                profile_id: "a".into(),
                error: DecisionSendError::Timeout,
            })
            .unwrap();

        assert_eq!(queue_ids(&session), ["b"]);
        assert_eq!(session.snapshot().failed_decisions, 1);
    }

    #[test]
    fn fetch_failure_then_retry() {
        let mut session = Session::new();
        session.handle(SessionEvent::Login { identity: identity("u1") }).unwrap();
        let generation = session.generation();

        session
            .handle(SessionEvent::CandidatesFailed { generation, error: FetchError::Status(500) })
            .unwrap();
        assert!(matches!(session.queue_status(), QueueStatus::Failed { .. }));
        assert!(session.state().queue().is_empty());

        let actions = session.handle(SessionEvent::RetryFetch).unwrap();
        assert_eq!(actions, vec![SessionAction::FetchCandidates {
            generation,
            identity: identity("u1"),
        }]);

        // A second retry while loading does not issue another request
        assert!(session.handle(SessionEvent::RetryFetch).unwrap().is_empty());

        session.handle(SessionEvent::CandidatesLoaded { generation, profiles: profiles(&["a"]) }).unwrap();
        assert_eq!(session.queue_status(), &QueueStatus::Ready);
        assert_eq!(queue_ids(&session), ["a"]);
    }

    #[test]
    fn retry_after_decisions_does_not_resurrect() {
        let mut session = Session::new();
        let generation = active(&mut session, "u1", &["a", "b", "c"]);
        session
            .handle(SessionEvent::Decide { profile_id: "a".into(), decision: Decision::Like })
            .unwrap();

        session.handle(SessionEvent::RetryFetch).unwrap();
        session
            .handle(SessionEvent::CandidatesLoaded { generation, profiles: profiles(&["a", "b", "c", "d"]) })
            .unwrap();
        assert_eq!(queue_ids(&session), ["b", "c", "d"]);
    }

    #[test]
    fn channel_loss_then_reconnect() {
        let mut session = Session::new();
        let generation = active(&mut session, "u1", &[]);
        assert_eq!(session.channel_status(), &ChannelStatus::Live);

        // Live channel: reconnect is a no-op
        assert!(session.handle(SessionEvent::Reconnect).unwrap().is_empty());

        session
            .handle(SessionEvent::ChannelClosed {
                generation,
                error: Some(ChannelError::Closed("reset".into())),
            })
            .unwrap();
        assert!(matches!(session.channel_status(), ChannelStatus::Disconnected { .. }));

        let actions = session.handle(SessionEvent::Reconnect).unwrap();
        assert_eq!(actions, vec![SessionAction::OpenPushChannel {
            generation,
            identity: identity("u1"),
        }]);
        assert_eq!(session.channel_status(), &ChannelStatus::Connecting);
    }

    #[test]
    fn signed_out_user_actions() {
        let mut session = Session::new();
        assert_eq!(session.handle(SessionEvent::RetryFetch), Err(SessionError::NotLoggedIn));
        assert_eq!(session.handle(SessionEvent::Reconnect), Err(SessionError::NotLoggedIn));
        assert!(session.handle(SessionEvent::DismissMatch).unwrap().is_empty());
    }
}
