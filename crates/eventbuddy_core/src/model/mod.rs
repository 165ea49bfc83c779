//! Domain model for events, tags, participants and invitations.
//!
//! # Responsibility
//! - Define canonical records shared by store, engine and persistence layers.
//! - Own the wire shape of every persisted record.
//!
//! # Invariants
//! - Every entity is identified by a process-unique positive integer id.
//! - Ids are never reused or reassigned after creation.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod dataset;
pub mod event;
pub mod participant;
pub mod tag;
pub mod user;

/// Input validation failure for user-supplied entity fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is empty after trimming.
    MissingField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "required field `{field}` is empty"),
        }
    }
}

impl Error for ValidationError {}

/// Trims `value` and rejects blank input for the named field.
pub(crate) fn require_trimmed(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Parses raw checkbox values into a duplicate-free id list.
///
/// Values that are not positive integers are skipped.
pub fn parse_id_list<S: AsRef<str>>(values: &[S]) -> Vec<i64> {
    let ids = values
        .iter()
        .filter_map(|value| value.as_ref().trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .collect::<Vec<_>>();
    dedup_ids(ids)
}

/// Removes repeated ids while keeping first-seen order.
pub(crate) fn dedup_ids(ids: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut out: Vec<i64> = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
