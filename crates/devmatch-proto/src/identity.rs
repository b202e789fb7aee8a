//! Opaque user identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Opaque token identifying the current user.
///
/// The server scopes candidates, decisions and push events by this value. It
/// is sent out of band: as the `user` header on requests and as a query
/// parameter when the push stream is opened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create an identity, rejecting empty tokens.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ProtocolError::EmptyIdentity);
        }
        Ok(Self(token))
    }

    /// Token as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_tokens() {
        assert_eq!(Identity::new(""), Err(ProtocolError::EmptyIdentity));
        assert_eq!(Identity::new("   "), Err(ProtocolError::EmptyIdentity));
    }

    #[test]
    fn keeps_token_verbatim() {
        let id = Identity::new("5d1f3c").unwrap();
        assert_eq!(id.as_str(), "5d1f3c");
        assert_eq!(id.to_string(), "5d1f3c");
    }
}
