//! Push channel ownership.
//!
//! A [`ChannelGuard`] is the only handle to a running channel task. Dropping
//! it aborts the task, and dropping the task drops the channel, which closes
//! the connection. Whatever path the runtime leaves by, the connection does
//! not outlive its guard.
//!
//! Abort alone is asynchronous. [`ChannelGuard::close`] also waits for the
//! task to be torn down, so once it returns the connection is closed.

use std::{sync::Arc, time::Duration};

use devmatch_core::{Backend, ChannelError, Generation, Identity, PushChannel, SessionEvent};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

pub(crate) struct ChannelGuard {
    generation: Generation,
    task: JoinHandle<()>,
}

impl ChannelGuard {
    pub(crate) fn open<B: Backend>(
        backend: Arc<B>,
        identity: Identity,
        generation: Generation,
        completions: mpsc::UnboundedSender<SessionEvent>,
        open_timeout: Duration,
    ) -> Self {
        let task = tokio::spawn(forward(backend, identity, generation, completions, open_timeout));
        Self { generation, task }
    }

    pub(crate) fn generation(&self) -> Generation {
        self.generation
    }

    pub(crate) async fn close(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        self.task.abort();
        debug!(generation = %self.generation, "push channel released");
    }
}

struct CloseOnDrop<C: PushChannel>(C);

impl<C: PushChannel> Drop for CloseOnDrop<C> {
    fn drop(&mut self) {
        self.0.close();
    }
}

async fn forward<B: Backend>(
    backend: Arc<B>,
    identity: Identity,
    generation: Generation,
    completions: mpsc::UnboundedSender<SessionEvent>,
    open_timeout: Duration,
) {
    let opened = tokio::time::timeout(open_timeout, backend.open_channel(&identity)).await;
    let channel = match opened {
        Ok(Ok(channel)) => channel,
        Ok(Err(error)) => {
            let _ = completions.send(SessionEvent::ChannelClosed { generation, error: Some(error) });
            return;
        },
        Err(_) => {
            let error = ChannelError::Connect(format!("timed out after {open_timeout:?}"));
            let _ = completions.send(SessionEvent::ChannelClosed { generation, error: Some(error) });
            return;
        },
    };

    let mut channel = CloseOnDrop(channel);
    if completions.send(SessionEvent::ChannelOpened { generation }).is_err() {
        return;
    }

    loop {
        let event = match channel.0.next_event().await {
            Some(Ok(event)) => SessionEvent::MatchReceived { generation, event },
            Some(Err(error)) => SessionEvent::ChannelClosed { generation, error: Some(error) },
            None => SessionEvent::ChannelClosed { generation, error: None },
        };
        let last = matches!(event, SessionEvent::ChannelClosed { .. });

        if completions.send(event).is_err() || last {
            return;
        }
    }
}
