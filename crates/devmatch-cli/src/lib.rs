//! Terminal client for Devmatch.
//!
//! Reads slash commands from stdin, forwards them to a
//! [`devmatch_client::SessionHandle`], and prints the session state whenever
//! it changes.

pub mod app;
pub mod commands;
pub mod render;

pub use app::{App, CliError, Flow};
pub use commands::{Command, parse};
pub use render::render;
