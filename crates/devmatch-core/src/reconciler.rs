//! Queue and match overlay reconciliation.
//!
//! # State Machine
//!
//! ```text
//! queue:        Empty ──populate──> Populated ──decide──> ... ──decide──> Empty
//!
//! active_match: Idle ──on_match──> Shown ──dismiss──> Idle
//!                                   │  ▲
//!                                   └──┘ on_match (last write wins)
//! ```
//!
//! The two machines are orthogonal. A decision advances the queue whether or
//! not a match is shown, and a match can be for any profile: one still
//! queued, one already decided, or one never seen in this session.

use devmatch_proto::{Decision, MatchEvent, Profile, ProfileId};
use tracing::debug;

use crate::{error::SessionError, queue::CandidateQueue};

/// Queue plus overlay, the state a presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    queue: CandidateQueue,
    active_match: Option<MatchEvent>,
}

impl SessionState {
    /// Pending candidates.
    pub fn queue(&self) -> &CandidateQueue {
        &self.queue
    }

    /// Match currently shown, if any.
    pub fn active_match(&self) -> Option<&MatchEvent> {
        self.active_match.as_ref()
    }
}

/// Sole owner and mutator of [`SessionState`].
#[derive(Debug, Default)]
pub struct Reconciler {
    state: SessionState,
}

impl Reconciler {
    /// Create a reconciler with an empty queue and no match shown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Head of the queue.
    pub fn current_head(&self) -> Option<&Profile> {
        self.state.queue.head()
    }

    /// True if there is nothing to decide on.
    pub fn is_empty(&self) -> bool {
        self.state.queue.is_empty()
    }

    /// Replace the queue with a fetch result.
    pub fn populate(&mut self, profiles: Vec<Profile>) {
        let dropped = self.state.queue.replace(profiles);
        debug!(pending = self.state.queue.len(), dropped, "candidate queue populated");
    }

    /// Consume the head for `decision`.
    ///
    /// The head is removed before anything is sent; the caller dispatches the
    /// decision afterwards and does not wait for it.
    ///
    /// # Errors
    ///
    /// - [`SessionError::EmptyQueue`] if there is no head
    /// - [`SessionError::NotHead`] if `profile_id` is not the head
    pub fn decide(
        &mut self,
        profile_id: &ProfileId,
        decision: Decision,
    ) -> Result<Profile, SessionError> {
        let head = self.state.queue.head().ok_or(SessionError::EmptyQueue)?;
        if &head.id != profile_id {
            return Err(SessionError::NotHead {
                expected: head.id.clone(),
                got: profile_id.clone(),
            });
        }

        let head = self.state.queue.pop_head().ok_or(SessionError::EmptyQueue)?;
        debug!(profile = %head.id, %decision, pending = self.state.queue.len(), "queue advanced");
        Ok(head)
    }

    /// Show `event`, replacing any match already shown.
    pub fn on_match(&mut self, event: MatchEvent) {
        if let Some(previous) = self.state.active_match.replace(event) {
            debug!(replaced = %previous.profile.id, "match overlay overwritten");
        }
    }

    /// Hide the match overlay. No effect if nothing is shown.
    pub fn dismiss_match(&mut self) {
        self.state.active_match = None;
    }
}
