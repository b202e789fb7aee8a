//! Error types for the session core.
//!
//! Network failures are split by where they happen because each one degrades
//! differently: a failed fetch leaves an empty queue with an error indicator,
//! a failed decision send is absorbed, and a dropped push channel leaves the
//! session without live match notifications. None of them is fatal.

use devmatch_proto::{ProfileId, ProtocolError};
use thiserror::Error;

/// Failure retrieving the candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a non-success status.
    #[error("server responded with status {0}")]
    Status(u16),

    /// Response body was not a candidate list.
    #[error("invalid candidate list: {0}")]
    Decode(String),

    /// Request did not complete in time.
    #[error("request timed out")]
    Timeout,
}

/// Failure sending a like/dislike.
///
/// The queue has already advanced when this is observed; it is logged and
/// counted, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionSendError {
    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a non-success status.
    #[error("server responded with status {0}")]
    Status(u16),

    /// Request did not complete in time.
    #[error("request timed out")]
    Timeout,
}

/// Failure on the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// Connection could not be established.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Server rejected the stream.
    #[error("server responded with status {0}")]
    Status(u16),

    /// The stream carried data we could not decode.
    #[error("malformed push data: {0}")]
    Decode(#[from] ProtocolError),

    /// The connection dropped.
    #[error("connection closed: {0}")]
    Closed(String),
}

/// Precondition violations by the caller of the session.
///
/// These never change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The operation needs an identity and there is none.
    #[error("no active session")]
    NotLoggedIn,

    /// A decision was attempted with no candidate to decide on.
    #[error("candidate queue is empty")]
    EmptyQueue,

    /// A decision named a profile other than the head of the queue.
    #[error("decision for {got} but head of queue is {expected}")]
    NotHead {
        /// Current head.
        expected: ProfileId,
        /// Profile named by the caller.
        got: ProfileId,
    },
}
