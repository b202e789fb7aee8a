//! Client error types.

use devmatch_core::SessionError;
use thiserror::Error;

/// Errors returned to the presentation layer by [`crate::SessionHandle`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The runtime is no longer running.
    #[error("session runtime stopped")]
    Stopped,

    /// The session rejected the input. Nothing changed.
    #[error(transparent)]
    Session(#[from] SessionError),
}
