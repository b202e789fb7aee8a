//! Like/dislike verdicts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A user's verdict on the head-of-queue profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Positive verdict. May produce a match if the other side agrees.
    Like,
    /// Negative verdict.
    Dislike,
}

impl Decision {
    /// Path segment used by the decision endpoint (`/devs/{id}/{segment}`).
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Like => "likes",
            Self::Dislike => "dislikes",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Like => f.write_str("like"),
            Self::Dislike => f.write_str("dislike"),
        }
    }
}
