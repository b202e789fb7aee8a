//! Candidate profiles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a candidate profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// Wrap a raw id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw id as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProfileId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A candidate shown to the user for a decision.
///
/// Profiles are immutable once received. The serde names follow the server's
/// document shape; `id` is accepted as an alias for `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Unique id.
    #[serde(rename = "_id", alias = "id")]
    pub id: ProfileId,

    /// Name shown on the card.
    #[serde(rename = "name")]
    pub display_name: String,

    /// Free-form description.
    #[serde(default)]
    pub bio: String,

    /// Avatar image URI.
    #[serde(rename = "avatar", default)]
    pub avatar_ref: String,
}

impl Profile {
    /// Build a profile from its parts.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        bio: impl Into<String>,
        avatar_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: ProfileId::new(id),
            display_name: display_name.into(),
            bio: bio.into(),
            avatar_ref: avatar_ref.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_server_document() {
        let json = r#"{
            "_id": "5d1f3c",
            "name": "Ada",
            "bio": "compilers",
            "avatar": "https://avatars.example/ada.png",
            "user": "ada",
            "likes": [],
            "dislikes": []
        }"#;

        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile, Profile::new("5d1f3c", "Ada", "compilers", "https://avatars.example/ada.png"));
    }

    #[test]
    fn accepts_plain_id_and_missing_optionals() {
        let profile: Profile = serde_json::from_str(r#"{"id":"a","name":"A"}"#).unwrap();
        assert_eq!(profile.id, ProfileId::from("a"));
        assert!(profile.bio.is_empty());
        assert!(profile.avatar_ref.is_empty());
    }

    #[test]
    fn rejects_document_without_name() {
        assert!(serde_json::from_str::<Profile>(r#"{"_id":"a"}"#).is_err());
    }
}
