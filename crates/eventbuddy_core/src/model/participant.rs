//! Participant record.
//!
//! # Invariants
//! - `email` is stored trimmed and lower-cased.
//! - An absent avatar is persisted as an empty string, matching the legacy
//!   wire shape, and read back as `None`.
//! - Decoding keeps every non-empty avatar verbatim; trimming happens only
//!   on input so a stored record re-encodes byte-identically.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a [`Participant`].
pub type ParticipantId = i64;

/// Person that can be invited to events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub email: String,
    /// Short display badge, e.g. initials.
    #[serde(
        default,
        serialize_with = "serialize_avatar",
        deserialize_with = "deserialize_avatar"
    )]
    pub avatar: Option<String>,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        name: impl Into<String>,
        email: impl Into<String>,
        avatar: Option<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: normalize_email(&email.into()),
            avatar: avatar.and_then(|value| normalize_avatar(&value)),
        }
    }

    /// Case-insensitive email comparison used for uniqueness checks.
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.to_lowercase() == normalize_email(email)
    }
}

/// Trims and lower-cases an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Blank avatars collapse to `None`.
pub fn normalize_avatar(avatar: &str) -> Option<String> {
    let trimmed = avatar.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn serialize_avatar<S: Serializer>(avatar: &Option<String>, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_str(avatar.as_deref().unwrap_or(""))
}

fn deserialize_avatar<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.filter(|value| !value.is_empty()))
}
