//! Session runtime.
//!
//! One task owns the [`Session`]. It waits on two inboxes, user commands from
//! [`SessionHandle`]s and completions from network tasks, and handles one
//! input at a time. Nothing else mutates session state.
//!
//! ```text
//!  SessionHandle ──commands──┐
//!                            ▼
//!                    ┌───────────────┐  actions  ┌─────────────────────┐
//!                    │    Runtime    │──────────>│ fetch task          │
//!                    │   (Session)   │           │ decision dispatcher │
//!                    └───────────────┘           │ push channel task   │
//!                      ▲     │                   └─────────────────────┘
//!        completions ──┘     │ snapshots                   │
//!             ▲              ▼                             │
//!             └───────── watch::Receiver ◄─────────────────┘
//! ```

use std::sync::Arc;

use devmatch_core::{Backend, FetchError, Session, SessionAction, SessionError, SessionEvent, SessionSnapshot};
use tokio::{
    sync::{mpsc, watch},
    task::JoinSet,
};
use tracing::{debug, info, warn};

use crate::{
    config::RuntimeConfig,
    dispatcher::{self, DecisionJob},
    handle::{Command, SessionHandle},
    push::ChannelGuard,
};

/// Event loop driving a [`Session`] against a [`Backend`].
pub struct Runtime<B: Backend> {
    backend: Arc<B>,
    config: RuntimeConfig,
    session: Session,
    commands: mpsc::UnboundedReceiver<Command>,
    completions_tx: mpsc::UnboundedSender<SessionEvent>,
    completions: mpsc::UnboundedReceiver<SessionEvent>,
    decisions_tx: mpsc::UnboundedSender<DecisionJob>,
    decisions: Option<mpsc::UnboundedReceiver<DecisionJob>>,
    snapshots: watch::Sender<SessionSnapshot>,
    channel: Option<ChannelGuard>,
    tasks: JoinSet<()>,
}

impl<B: Backend> Runtime<B> {
    /// Create a runtime and the handle that drives it.
    ///
    /// Nothing happens until [`Runtime::run`] is awaited.
    pub fn new(backend: B, config: RuntimeConfig) -> (Self, SessionHandle) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (decisions_tx, decisions) = mpsc::unbounded_channel();
        let (snapshots, snapshots_rx) = watch::channel(SessionSnapshot::default());

        let runtime = Self {
            backend: Arc::new(backend),
            config,
            session: Session::new(),
            commands,
            completions_tx,
            completions,
            decisions_tx,
            decisions: Some(decisions),
            snapshots,
            channel: None,
            tasks: JoinSet::new(),
        };
        (runtime, SessionHandle::new(commands_tx, snapshots_rx))
    }

    /// Run until [`SessionHandle::shutdown`] is called or every handle is
    /// dropped.
    ///
    /// On exit the push channel is closed, in-flight fetches are aborted, and
    /// decision sends already queued are given one request timeout to drain.
    pub async fn run(mut self) {
        let dispatcher = self.decisions.take().map(|jobs| {
            tokio::spawn(dispatcher::run(
                Arc::clone(&self.backend),
                jobs,
                self.completions_tx.clone(),
                self.config.request_timeout,
            ))
        });

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Event { event, reply }) => {
                        let _ = reply.send(self.apply(event).await);
                    },
                    Some(Command::Shutdown) | None => break,
                },
                Some(event) = self.completions.recv() => {
                    let _ = self.apply(event).await;
                },
                Some(_) = self.tasks.join_next(), if !self.tasks.is_empty() => {},
            }
        }

        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
        self.tasks.abort_all();

        let Self { decisions_tx, config, .. } = self;
        drop(decisions_tx);
        if let Some(dispatcher) = dispatcher {
            if tokio::time::timeout(config.request_timeout, dispatcher).await.is_err() {
                warn!("pending decision sends abandoned at shutdown");
            }
        }
        info!("session runtime stopped");
    }

    async fn apply(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        let actions = self.session.handle(event).inspect_err(|error| {
            debug!(%error, "session rejected input");
        })?;

        for action in actions {
            self.execute(action).await;
        }
        self.snapshots.send_replace(self.session.snapshot());
        Ok(())
    }

    async fn execute(&mut self, action: SessionAction) {
        match action {
            SessionAction::FetchCandidates { generation, identity } => {
                let backend = Arc::clone(&self.backend);
                let completions = self.completions_tx.clone();
                let deadline = self.config.request_timeout;

                self.tasks.spawn(async move {
                    let fetched =
                        tokio::time::timeout(deadline, backend.fetch_candidates(&identity)).await;
                    let event = match fetched {
                        Ok(Ok(profiles)) => SessionEvent::CandidatesLoaded { generation, profiles },
                        Ok(Err(error)) => SessionEvent::CandidatesFailed { generation, error },
                        Err(_) => {
                            SessionEvent::CandidatesFailed { generation, error: FetchError::Timeout }
                        },
                    };
                    let _ = completions.send(event);
                });
            },
            SessionAction::SendDecision { generation, identity, profile_id, decision } => {
                let job = DecisionJob { generation, identity, profile_id, decision };
                if self.decisions_tx.send(job).is_err() {
                    warn!("decision dispatcher is gone, decision not sent");
                }
            },
            SessionAction::OpenPushChannel { generation, identity } => {
                // At most one channel: the old one is closed before the new one opens.
                if let Some(old) = self.channel.take() {
                    old.close().await;
                }
                self.channel = Some(ChannelGuard::open(
                    Arc::clone(&self.backend),
                    identity,
                    generation,
                    self.completions_tx.clone(),
                    self.config.channel_open_timeout,
                ));
            },
            SessionAction::ClosePushChannel { generation } => {
                match self.channel.take() {
                    Some(open) if open.generation() == generation => open.close().await,
                    open => {
                        debug!(%generation, "no channel to close for generation");
                        self.channel = open;
                    },
                }
            },
        }
    }
}
