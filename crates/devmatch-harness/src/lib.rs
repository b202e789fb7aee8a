//! Deterministic harness for Devmatch session testing.
//!
//! - [`SimBackend`]: in-memory [`devmatch_core::Backend`] with scripted
//!   candidates, injectable failures, and a record of what the client did
//! - [`ChannelController`]: the server side of one simulated push channel
//! - [`ModelSession`]: reference model of queue and overlay behaviour, for
//!   model-based property tests against [`devmatch_core::Session`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim_backend;
pub mod sim_channel;

pub use model::{ModelSession, ObservableState, Operation, OperationError, OperationResult};
pub use sim_backend::{SentDecision, SimBackend};
pub use sim_channel::{ChannelController, SimChannel};

use devmatch_proto::{Identity, Profile};

/// Profile with id `id` and otherwise derived fields.
pub fn profile(id: &str) -> Profile {
    Profile::new(id, format!("Dev {id}"), format!("bio of {id}"), format!("https://avatars.test/{id}.png"))
}

/// Profiles for each id, in order.
pub fn profiles(ids: &[&str]) -> Vec<Profile> {
    ids.iter().map(|id| profile(id)).collect()
}

/// Identity from a token known to be non-empty.
///
/// # Panics
///
/// If `token` is blank.
#[allow(clippy::expect_used)]
pub fn identity(token: &str) -> Identity {
    Identity::new(token).expect("test identity must not be blank")
}
