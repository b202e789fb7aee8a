//! Decision dispatcher worker.
//!
//! The queue has already advanced by the time a job gets here. Jobs are sent
//! one at a time, in the order they were decided, so the server sees the same
//! order the user swiped in. Failures go back to the session as
//! `DecisionFailed` and are not retried.

use std::{sync::Arc, time::Duration};

use devmatch_core::{
    Backend, Decision, DecisionSendError, Generation, Identity, ProfileId, SessionEvent,
};
use tokio::sync::mpsc;
use tracing::debug;

pub(crate) struct DecisionJob {
    pub generation: Generation,
    pub identity: Identity,
    pub profile_id: ProfileId,
    pub decision: Decision,
}

pub(crate) async fn run<B: Backend>(
    backend: Arc<B>,
    mut jobs: mpsc::UnboundedReceiver<DecisionJob>,
    completions: mpsc::UnboundedSender<SessionEvent>,
    deadline: Duration,
) {
    while let Some(job) = jobs.recv().await {
        let sent = tokio::time::timeout(
            deadline,
            backend.send_decision(&job.identity, &job.profile_id, job.decision),
        )
        .await;

        let error = match sent {
            Ok(Ok(())) => {
                debug!(profile = %job.profile_id, decision = %job.decision, "decision acknowledged");
                continue;
            },
            Ok(Err(error)) => error,
            Err(_) => DecisionSendError::Timeout,
        };

        let _ = completions.send(SessionEvent::DecisionFailed {
            generation: job.generation,
            profile_id: job.profile_id,
            error,
        });
    }
}
