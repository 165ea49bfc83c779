//! Authenticated organizer identity.

use serde::{Deserialize, Serialize};

use super::participant::normalize_email;
use super::{require_trimmed, ValidationError};

/// Name/email pair supplied by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Persisted current-user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl CurrentUser {
    /// Builds a user from raw identity input.
    ///
    /// Name is trimmed, email is trimmed and lower-cased, and both must be
    /// non-blank.
    pub fn from_identity(id: i64, identity: &Identity) -> Result<Self, ValidationError> {
        let name = require_trimmed(&identity.name, "name")?;
        let email = require_trimmed(&identity.email, "email")?;
        Ok(Self {
            id,
            name,
            email: normalize_email(&email),
        })
    }

    /// Sender line used in invitation mails.
    pub fn signature(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}
