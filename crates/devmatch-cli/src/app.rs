//! Input loop.
//!
//! Each line from stdin becomes one [`Command`]. Session state is printed
//! after every command and whenever the runtime publishes a change on its
//! own (a fetch finishing, a match arriving, the channel dropping).

use std::io::{self, Write};

use devmatch_client::{ClientError, SessionHandle};
use devmatch_core::{Decision, Identity, SessionSnapshot};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

use crate::{
    commands::{self, Command, HELP},
    render::render,
};

/// Fatal errors of the terminal client.
#[derive(Debug, Error)]
pub enum CliError {
    /// Backend could not be set up from the arguments.
    #[error(transparent)]
    Setup(#[from] devmatch_client::http::HttpSetupError),

    /// Terminal I/O failed.
    #[error("terminal i/o: {0}")]
    Io(#[from] io::Error),

    /// The runtime stopped underneath the client.
    #[error("session runtime stopped")]
    Stopped,
}

/// Whether to keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Stop.
    Quit,
}

/// Terminal front end over a [`SessionHandle`].
pub struct App<W> {
    handle: SessionHandle,
    out: W,
    last_rendered: Option<String>,
}

impl<W: Write> App<W> {
    /// Front end writing to `out`.
    pub fn new(handle: SessionHandle, out: W) -> Self {
        Self { handle, out, last_rendered: None }
    }

    /// Give back the output sink.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Read commands from `input` until `/quit` or end of input.
    ///
    /// # Errors
    ///
    /// [`CliError::Io`] if reading or writing fails, [`CliError::Stopped`] if
    /// the runtime goes away.
    pub async fn run<R: AsyncRead + Unpin>(&mut self, input: R) -> Result<(), CliError> {
        let mut lines = BufReader::new(input).lines();
        let mut snapshots = self.handle.subscribe();

        self.show(&self.handle.snapshot())?;
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if self.execute(commands::parse(&line)).await? == Flow::Quit {
                        break;
                    }
                },
                changed = snapshots.changed() => {
                    changed.map_err(|_| CliError::Stopped)?;
                    let snapshot = snapshots.borrow_and_update().clone();
                    self.show(&snapshot)?;
                },
            }
        }
        Ok(())
    }

    /// Apply one command.
    ///
    /// Rejected session inputs are reported to the user, not returned.
    ///
    /// # Errors
    ///
    /// [`CliError::Stopped`] if the runtime is gone, [`CliError::Io`] if
    /// output fails.
    pub async fn execute(&mut self, command: Command) -> Result<Flow, CliError> {
        let result = match command {
            Command::Login { identity } => match Identity::new(identity) {
                Ok(identity) => self.handle.login(identity).await,
                Err(error) => {
                    writeln!(self.out, "{error}")?;
                    return Ok(Flow::Continue);
                },
            },
            Command::Logout => self.handle.logout().await,
            Command::Like => self.handle.decide_head(Decision::Like).await,
            Command::Dislike => self.handle.decide_head(Decision::Dislike).await,
            Command::Dismiss => self.handle.dismiss_match().await,
            Command::Retry => self.handle.retry_fetch().await,
            Command::Reconnect => self.handle.reconnect().await,
            Command::Status => {
                self.last_rendered = None;
                Ok(())
            },
            Command::Help => {
                writeln!(self.out, "{HELP}")?;
                return Ok(Flow::Continue);
            },
            Command::Quit => return Ok(Flow::Quit),
            Command::Empty => return Ok(Flow::Continue),
            Command::Unknown { input } => {
                writeln!(self.out, "unknown command: {input} (try /help)")?;
                return Ok(Flow::Continue);
            },
            Command::InvalidArgs { command, error } => {
                writeln!(self.out, "/{command}: {error}")?;
                return Ok(Flow::Continue);
            },
        };

        match result {
            Ok(()) => {},
            Err(ClientError::Stopped) => return Err(CliError::Stopped),
            Err(ClientError::Session(error)) => {
                debug!(%error, "command rejected");
                writeln!(self.out, "{error}")?;
            },
        }

        self.show(&self.handle.snapshot())?;
        Ok(Flow::Continue)
    }

    /// Print `snapshot` unless it renders the same as last time.
    fn show(&mut self, snapshot: &SessionSnapshot) -> Result<(), CliError> {
        let rendered = render(snapshot);
        if self.last_rendered.as_ref() != Some(&rendered) {
            writeln!(self.out, "{rendered}")?;
            self.out.flush()?;
            self.last_rendered = Some(rendered);
        }
        Ok(())
    }
}
