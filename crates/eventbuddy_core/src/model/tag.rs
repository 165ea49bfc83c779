//! Tag record.

use serde::{Deserialize, Serialize};

/// Identifier of a [`Tag`].
pub type TagId = i64;

/// Free-form label attached to events.
///
/// Names are unique by case-insensitive comparison within one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

impl Tag {
    pub fn new(id: TagId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Case-insensitive name comparison used for uniqueness checks.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}
