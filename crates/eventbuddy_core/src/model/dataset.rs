//! Root persisted record holding every collection.

use super::event::Event;
use super::participant::Participant;
use super::tag::Tag;
use serde::{Deserialize, Serialize};

/// Full dataset persisted as one record.
///
/// Missing collections load as empty; unknown fields are ignored and dropped
/// on the next save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Most recently created first.
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Dataset {
    /// Largest id used by any entity, or 0 for an empty dataset.
    pub fn max_id(&self) -> i64 {
        let tags = self.tags.iter().map(|tag| tag.id);
        let participants = self.participants.iter().map(|participant| participant.id);
        let events = self.events.iter().map(|event| event.id);
        tags.chain(participants).chain(events).max().unwrap_or(0)
    }
}
