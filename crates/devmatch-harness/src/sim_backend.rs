//! Scripted in-memory backend.
//!
//! Tests configure what the "server" returns, drive a runtime against it,
//! then inspect what the client asked for. All state sits behind one mutex
//! that is never held across an await point.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use devmatch_core::{
    Backend, ChannelError, Decision, DecisionSendError, FetchError, Identity, Profile, ProfileId,
};
use tokio::sync::{Notify, Semaphore};
use tracing::debug;

use crate::sim_channel::{self, ChannelController, SimChannel};

/// A decision the client sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDecision {
    /// Who decided.
    pub identity: Identity,
    /// On whom.
    pub profile_id: ProfileId,
    /// Like or dislike.
    pub decision: Decision,
    /// False if the backend was scripted to fail it.
    pub delivered: bool,
}

#[derive(Default)]
struct SimState {
    candidates: HashMap<Identity, Vec<Profile>>,
    fetch_failures: VecDeque<FetchError>,
    fetch_count: usize,
    fetches_served: usize,
    gated: bool,
    failing_decisions: HashSet<ProfileId>,
    decisions_gated: bool,
    decisions: Vec<SentDecision>,
    decisions_settled: usize,
    channel_failures: VecDeque<ChannelError>,
    channels: Vec<ChannelController>,
    peak_live_channels: usize,
}

/// In-memory [`Backend`]. Clones share state.
#[derive(Clone)]
pub struct SimBackend {
    state: Arc<Mutex<SimState>>,
    fetch_gate: Arc<Semaphore>,
    decision_gate: Arc<Semaphore>,
    changed: Arc<Notify>,
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBackend {
    /// Backend with no candidates for anyone.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
            fetch_gate: Arc::new(Semaphore::new(0)),
            decision_gate: Arc::new(Semaphore::new(0)),
            changed: Arc::new(Notify::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn touch(&self) {
        self.changed.notify_waiters();
    }

    /// Candidates served to `identity`, in order.
    pub fn set_candidates(&self, identity: &Identity, profiles: Vec<Profile>) {
        self.state().candidates.insert(identity.clone(), profiles);
    }

    /// Fail the next fetch with `error`. Queued failures are used in order.
    pub fn fail_next_fetch(&self, error: FetchError) {
        self.state().fetch_failures.push_back(error);
    }

    /// Fail every decision on `profile_id`.
    pub fn fail_decisions_for(&self, profile_id: &ProfileId) {
        self.state().failing_decisions.insert(profile_id.clone());
    }

    /// Fail the next channel open with `error`.
    pub fn fail_next_channel(&self, error: ChannelError) {
        self.state().channel_failures.push_back(error);
    }

    /// Make fetches wait until [`SimBackend::release_fetch`] is called.
    pub fn hold_fetches(&self) {
        self.state().gated = true;
    }

    /// Let one held fetch complete.
    pub fn release_fetch(&self) {
        self.fetch_gate.add_permits(1);
    }

    /// Make decision sends wait until [`SimBackend::release_decision`] is
    /// called. The send is recorded in [`SimBackend::decisions`] on arrival.
    pub fn hold_decisions(&self) {
        self.state().decisions_gated = true;
    }

    /// Let one held decision send complete.
    pub fn release_decision(&self) {
        self.decision_gate.add_permits(1);
    }

    /// Fetch requests received so far.
    pub fn fetch_count(&self) -> usize {
        self.state().fetch_count
    }

    /// Fetches that have returned a result, successful or not.
    pub fn fetches_served(&self) -> usize {
        self.state().fetches_served
    }

    /// Decisions received so far, in arrival order.
    pub fn decisions(&self) -> Vec<SentDecision> {
        self.state().decisions.clone()
    }

    /// Every channel ever opened, oldest first.
    pub fn channels(&self) -> Vec<ChannelController> {
        self.state().channels.clone()
    }

    /// Most recently opened channel.
    pub fn latest_channel(&self) -> Option<ChannelController> {
        self.state().channels.last().cloned()
    }

    /// Decision sends that have returned a result, successful or not.
    pub fn decisions_settled(&self) -> usize {
        self.state().decisions_settled
    }

    /// Channels the client has not closed.
    pub fn live_channels(&self) -> usize {
        self.state().channels.iter().filter(|c| !c.is_closed()).count()
    }

    /// Highest number of unclosed channels seen at any open.
    pub fn peak_live_channels(&self) -> usize {
        self.state().peak_live_channels
    }

    /// Resolve once `done` holds.
    ///
    /// Re-checked whenever the backend records a request. Callers bound this
    /// with a timeout.
    pub async fn wait_until(&self, done: impl Fn(&Self) -> bool) {
        loop {
            let notified = self.changed.notified();
            if done(self) {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl Backend for SimBackend {
    type Channel = SimChannel;

    async fn fetch_candidates(&self, identity: &Identity) -> Result<Vec<Profile>, FetchError> {
        let gated = {
            let mut state = self.state();
            state.fetch_count += 1;
            state.gated
        };
        self.touch();

        if gated {
            let permit = self
                .fetch_gate
                .acquire()
                .await
                .map_err(|_| FetchError::Network("fetch gate closed".to_string()))?;
            permit.forget();
        }

        let served = {
            let mut state = self.state();
            state.fetches_served += 1;
            match state.fetch_failures.pop_front() {
                Some(error) => {
                    debug!(%identity, %error, "scripted fetch failure");
                    Err(error)
                },
                None => Ok(state.candidates.get(identity).cloned().unwrap_or_default()),
            }
        };
        self.touch();
        served
    }

    async fn send_decision(
        &self,
        identity: &Identity,
        profile_id: &ProfileId,
        decision: Decision,
    ) -> Result<(), DecisionSendError> {
        let (delivered, gated) = {
            let mut state = self.state();
            let delivered = !state.failing_decisions.contains(profile_id);
            state.decisions.push(SentDecision {
                identity: identity.clone(),
                profile_id: profile_id.clone(),
                decision,
                delivered,
            });
            (delivered, state.decisions_gated)
        };
        self.touch();

        if gated {
            let permit = self
                .decision_gate
                .acquire()
                .await
                .map_err(|_| DecisionSendError::Network("decision gate closed".to_string()))?;
            permit.forget();
        }

        self.state().decisions_settled += 1;
        self.touch();
        if delivered { Ok(()) } else { Err(DecisionSendError::Status(500)) }
    }

    async fn open_channel(&self, identity: &Identity) -> Result<SimChannel, ChannelError> {
        let opened = {
            let mut state = self.state();
            if let Some(error) = state.channel_failures.pop_front() {
                Err(error)
            } else {
                let (channel, controller) = sim_channel::pair(identity.clone());
                state.channels.push(controller);
                let live = state.channels.iter().filter(|c| !c.is_closed()).count();
                state.peak_live_channels = state.peak_live_channels.max(live);
                Ok(channel)
            }
        };
        self.touch();
        opened
    }
}
