//! Event and invitation records.
//!
//! # Responsibility
//! - Define the persisted event shape, including the per-participant
//!   invitation map.
//! - Normalize raw form input into a validated [`EventDraft`].
//!
//! # Invariants
//! - `tag_ids` and `participant_ids` never contain duplicates.
//! - After every save, `invitations` keys equal `participant_ids` as sets.
//! - Legacy records without `invitations` load with an empty map.
//! - Unknown or null status strings load as the default status instead of
//!   failing the whole record.

use super::participant::ParticipantId;
use super::tag::TagId;
use super::{dedup_ids, parse_id_list, require_trimmed, ValidationError};
use chrono::{DateTime, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Identifier of an [`Event`].
pub type EventId = i64;

static DATETIME_LOCAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}$").expect("valid datetime-local regex")
});

const ACCEPTED_THRESHOLD: f64 = 0.34;
const DECLINED_THRESHOLD: f64 = 0.67;

/// Lifecycle state of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Planned,
    Done,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Done => "done",
        }
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "planned" => Ok(Self::Planned),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown event status `{other}`")),
        }
    }
}

impl Display for EventStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventStatus {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        lenient_status(de)
    }
}

/// Response state of one invitation.
///
/// `Pending` covers both "not answered yet" and "never contacted"; the two
/// are not distinguished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Accepted,
    Declined,
    #[default]
    Pending,
}

impl InvitationStatus {
    /// Maps one uniform draw in `[0, 1)` to a status.
    ///
    /// `< 0.34` is accepted, `< 0.67` declined, everything else pending.
    pub fn from_draw(draw: f64) -> Self {
        if draw < ACCEPTED_THRESHOLD {
            Self::Accepted
        } else if draw < DECLINED_THRESHOLD {
            Self::Declined
        } else {
            Self::Pending
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Pending => "pending",
        }
    }
}

impl FromStr for InvitationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "pending" => Ok(Self::Pending),
            other => Err(format!("unknown invitation status `{other}`")),
        }
    }
}

impl Display for InvitationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InvitationStatus {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        lenient_status(de)
    }
}

/// Reads a status string, mapping null or unknown values to the default.
fn lenient_status<'de, T, D>(de: D) -> Result<T, D::Error>
where
    T: FromStr + Default,
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw
        .and_then(|value| value.parse().ok())
        .unwrap_or_default())
}

/// Invitation sent to one participant of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    #[serde(default)]
    pub status: InvitationStatus,
    /// Rendered message body, displayed verbatim.
    #[serde(default)]
    pub mail: String,
    /// ISO-8601 UTC timestamp of synthesis.
    #[serde(default)]
    pub sent_at: String,
}

/// Canonical event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    /// ISO-8601 local date-time, e.g. `2026-02-22T19:00:00`.
    pub datetime: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    #[serde(default)]
    pub participant_ids: Vec<ParticipantId>,
    /// Keyed by participant id; serialized with string keys.
    #[serde(default)]
    pub invitations: BTreeMap<ParticipantId, Invitation>,
}

impl Event {
    /// Builds a fresh record from a validated draft and a reconciled
    /// invitation map.
    pub fn from_draft(
        id: EventId,
        draft: EventDraft,
        invitations: BTreeMap<ParticipantId, Invitation>,
    ) -> Self {
        Self {
            id,
            title: draft.title,
            datetime: draft.datetime,
            location: draft.location,
            description: draft.description,
            status: draft.status,
            tag_ids: draft.tag_ids,
            participant_ids: draft.participant_ids,
            invitations,
        }
    }

    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tag_ids.contains(&tag_id)
    }

    pub fn has_participant(&self, participant_id: ParticipantId) -> bool {
        self.participant_ids.contains(&participant_id)
    }

    /// Text searched by free-text filters: title, location and description
    /// joined by single spaces.
    pub fn search_haystack(&self) -> String {
        format!("{} {} {}", self.title, self.location, self.description)
    }

    /// `DD.MM.YYYY, HH:MM` rendering of `datetime`.
    pub fn formatted_datetime(&self) -> String {
        format_datetime(&self.datetime)
    }
}

/// Create/update request for an event.
///
/// Construct directly or via [`EventDraft::from_form`], then pass through
/// [`EventDraft::validate`] before use.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventDraft {
    pub title: String,
    pub datetime: String,
    pub location: String,
    pub description: String,
    pub status: EventStatus,
    pub tag_ids: Vec<TagId>,
    pub participant_ids: Vec<ParticipantId>,
}

/// Raw form field values reported by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct EventForm<'a> {
    pub title: &'a str,
    pub datetime: &'a str,
    pub location: &'a str,
    pub description: &'a str,
    pub status: &'a str,
    pub tag_ids: Vec<&'a str>,
    pub participant_ids: Vec<&'a str>,
}

impl EventDraft {
    pub fn new(
        title: impl Into<String>,
        datetime: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            datetime: datetime.into(),
            location: location.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_tags(mut self, tag_ids: impl IntoIterator<Item = TagId>) -> Self {
        self.tag_ids = tag_ids.into_iter().collect();
        self
    }

    pub fn with_participants(
        mut self,
        participant_ids: impl IntoIterator<Item = ParticipantId>,
    ) -> Self {
        self.participant_ids = participant_ids.into_iter().collect();
        self
    }

    /// Converts raw form values. Unknown status values fall back to
    /// `planned`; non-numeric ids are skipped.
    pub fn from_form(form: &EventForm<'_>) -> Self {
        Self {
            title: form.title.to_string(),
            datetime: form.datetime.to_string(),
            location: form.location.to_string(),
            description: form.description.to_string(),
            status: form.status.parse().unwrap_or_default(),
            tag_ids: parse_id_list(&form.tag_ids),
            participant_ids: parse_id_list(&form.participant_ids),
        }
    }

    /// Trims text fields, normalizes `datetime`, and deduplicates id lists.
    ///
    /// # Errors
    /// - `MissingField` for the first empty field among title, datetime and
    ///   location.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let title = require_trimmed(&self.title, "title")?;
        let datetime = normalize_datetime(&require_trimmed(&self.datetime, "datetime")?);
        let location = require_trimmed(&self.location, "location")?;

        Ok(Self {
            title,
            datetime,
            location,
            description: self.description.trim().to_string(),
            status: self.status,
            tag_ids: dedup_ids(self.tag_ids),
            participant_ids: dedup_ids(self.participant_ids),
        })
    }
}

/// Appends `:00` seconds to `YYYY-MM-DDTHH:MM` input; other values pass
/// through unchanged.
pub fn normalize_datetime(value: &str) -> String {
    if DATETIME_LOCAL_RE.is_match(value) {
        format!("{value}:00")
    } else {
        value.to_string()
    }
}

/// Formats an ISO date-time as `DD.MM.YYYY, HH:MM` using its wall-clock
/// fields. Unparseable input is returned verbatim.
pub fn format_datetime(value: &str) -> String {
    parse_wall_clock(value)
        .map(|parsed| parsed.format("%d.%m.%Y, %H:%M").to_string())
        .unwrap_or_else(|| value.to_string())
}

fn parse_wall_clock(value: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}
