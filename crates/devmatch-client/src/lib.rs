//! Devmatch client runtime
//!
//! Executes the actions produced by [`devmatch_core::Session`] against a
//! [`devmatch_core::Backend`] and feeds the completions back in.
//!
//! # Components
//!
//! - [`Runtime`]: single-task event loop that owns the session
//! - [`SessionHandle`]: cloneable input side for the presentation layer, plus
//!   a `watch` feed of [`devmatch_core::SessionSnapshot`]s
//! - `http` (feature `http`): reqwest-backed [`devmatch_core::Backend`] with
//!   a Socket.IO push channel over tokio-tungstenite
//!
//! Network work runs in spawned tasks, but every result is posted back to the
//! event loop, so only one handler touches session state at a time.

mod config;
mod dispatcher;
mod error;
mod handle;
#[cfg(feature = "http")]
pub mod http;
mod push;
mod runtime;

pub use config::RuntimeConfig;
pub use error::ClientError;
pub use handle::SessionHandle;
pub use runtime::Runtime;
