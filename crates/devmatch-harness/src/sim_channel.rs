//! Simulated push channel.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use devmatch_core::{ChannelError, MatchEvent, PushChannel};
use devmatch_proto::Identity;
use tokio::sync::mpsc;

enum Push {
    Match(MatchEvent),
    Fail(ChannelError),
    End,
}

/// Client side of a simulated channel, handed to the runtime.
pub struct SimChannel {
    pushes: mpsc::UnboundedReceiver<Push>,
    closed: Arc<AtomicBool>,
    finished: bool,
}

/// Server side of a simulated channel.
///
/// Keeps working after the client closed the channel, so tests can act as a
/// misbehaving server that keeps pushing after teardown.
#[derive(Clone)]
pub struct ChannelController {
    identity: Identity,
    pushes: mpsc::UnboundedSender<Push>,
    closed: Arc<AtomicBool>,
}

/// Create a connected pair for `identity`.
pub fn pair(identity: Identity) -> (SimChannel, ChannelController) {
    let (tx, rx) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));
    (
        SimChannel { pushes: rx, closed: Arc::clone(&closed), finished: false },
        ChannelController { identity, pushes: tx, closed },
    )
}

impl ChannelController {
    /// Identity the channel was opened with.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Push a match. Returns false if the client side no longer exists.
    pub fn emit(&self, event: MatchEvent) -> bool {
        self.pushes.send(Push::Match(event)).is_ok()
    }

    /// Fail the connection with `error`.
    pub fn fail(&self, error: ChannelError) -> bool {
        self.pushes.send(Push::Fail(error)).is_ok()
    }

    /// End the stream cleanly.
    pub fn end(&self) -> bool {
        self.pushes.send(Push::End).is_ok()
    }

    /// Whether the client called [`PushChannel::close`].
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushChannel for SimChannel {
    async fn next_event(&mut self) -> Option<Result<MatchEvent, ChannelError>> {
        if self.finished || self.closed.load(Ordering::SeqCst) {
            return None;
        }

        match self.pushes.recv().await {
            Some(Push::Match(event)) => Some(Ok(event)),
            Some(Push::Fail(error)) => {
                self.finished = true;
                Some(Err(error))
            },
            Some(Push::End) | None => {
                self.finished = true;
                None
            },
        }
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.pushes.close();
    }
}
