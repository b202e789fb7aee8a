//! Runtime configuration.

use std::time::Duration;

/// Default deadline for a candidate fetch or decision send.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for establishing the push channel.
pub const DEFAULT_CHANNEL_OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadlines the runtime applies on top of whatever the backend does.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Deadline for one fetch or one decision send.
    pub request_timeout: Duration,
    /// Deadline for opening the push channel. Does not bound its lifetime.
    pub channel_open_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            channel_open_timeout: DEFAULT_CHANNEL_OPEN_TIMEOUT,
        }
    }
}
