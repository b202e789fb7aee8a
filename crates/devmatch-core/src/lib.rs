//! Devmatch session core
//!
//! Pure state machine logic for a swipe-matching session, decoupled from I/O.
//!
//! # Architecture
//!
//! Two independent pieces of state live here: the candidate queue and the
//! active match overlay. They are driven by discrete events (fetch
//! completion, decision, pushed match, dismiss) and never block each other.
//!
//! State transitions return declarative [`session::SessionAction`]s instead
//! of performing network calls. A runtime executes them against a
//! [`backend::Backend`] and feeds completions back in as events tagged with
//! the [`session::Generation`] they were issued under, so completions that
//! land after a logout or identity change are dropped.
//!
//! # Components
//!
//! - [`queue`]: FIFO candidate queue with the never-re-enters rule
//! - [`reconciler`]: queue + overlay state and its operations
//! - [`session`]: lifecycle state machine keyed to identity
//! - [`backend`]: I/O seam for fetch, decision send and the push channel
//! - [`error`]: error taxonomy

pub mod backend;
pub mod error;
pub mod queue;
pub mod reconciler;
pub mod session;

pub use backend::{Backend, PushChannel};
pub use devmatch_proto::{Decision, Identity, MatchEvent, Profile, ProfileId};
pub use error::{ChannelError, DecisionSendError, FetchError, SessionError};
pub use queue::CandidateQueue;
pub use reconciler::{Reconciler, SessionState};
pub use session::{
    ChannelStatus, Generation, QueueStatus, Session, SessionAction, SessionEvent, SessionSnapshot,
};
