//! Input side of the runtime.

use devmatch_core::{Decision, Identity, ProfileId, SessionError, SessionEvent, SessionSnapshot};
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::ClientError;

pub(crate) enum Command {
    Event { event: SessionEvent, reply: oneshot::Sender<Result<(), SessionError>> },
    Shutdown,
}

/// Cloneable handle the presentation layer uses to drive a [`crate::Runtime`].
///
/// Every method resolves once the runtime has applied the input, so a
/// snapshot read afterwards reflects it. Dropping every handle stops the
/// runtime.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        snapshots: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self { commands, snapshots }
    }

    /// Start a session for `identity`, replacing any current one.
    pub async fn login(&self, identity: Identity) -> Result<(), ClientError> {
        self.send(SessionEvent::Login { identity }).await
    }

    /// End the current session.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.send(SessionEvent::Logout).await
    }

    /// Decide on the head candidate.
    ///
    /// # Errors
    ///
    /// [`ClientError::Session`] if `profile_id` is not the head or the queue
    /// is empty.
    pub async fn decide(&self, profile_id: ProfileId, decision: Decision) -> Result<(), ClientError> {
        self.send(SessionEvent::Decide { profile_id, decision }).await
    }

    /// Decide on whatever is currently at the head.
    pub async fn decide_head(&self, decision: Decision) -> Result<(), ClientError> {
        let snapshot = self.snapshot();
        if snapshot.identity.is_none() {
            return Err(SessionError::NotLoggedIn.into());
        }
        let head = snapshot.head().map(|p| p.id.clone()).ok_or(SessionError::EmptyQueue)?;
        self.decide(head, decision).await
    }

    /// Hide the match overlay.
    pub async fn dismiss_match(&self) -> Result<(), ClientError> {
        self.send(SessionEvent::DismissMatch).await
    }

    /// Re-fetch candidates.
    pub async fn retry_fetch(&self) -> Result<(), ClientError> {
        self.send(SessionEvent::RetryFetch).await
    }

    /// Reopen a disconnected push channel.
    pub async fn reconnect(&self) -> Result<(), ClientError> {
        self.send(SessionEvent::Reconnect).await
    }

    /// Ask the runtime to stop. Pending decision sends are flushed first.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    async fn send(&self, event: SessionEvent) -> Result<(), ClientError> {
        let (reply, applied) = oneshot::channel();
        self.commands.send(Command::Event { event, reply }).map_err(|_| ClientError::Stopped)?;
        applied.await.map_err(|_| ClientError::Stopped)??;
        Ok(())
    }
}
