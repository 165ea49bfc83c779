//! Conjunctive event filter.
//!
//! # Invariants
//! - Output keeps input order (stable filter, no re-sorting).
//! - An all-`All` predicate with blank text returns the full input.

use crate::model::event::{Event, EventStatus};
use crate::model::participant::ParticipantId;
use crate::model::tag::TagId;
use std::str::FromStr;

/// Form value selecting "no restriction".
pub const ALL: &str = "all";

/// One dimension of a predicate: unrestricted or an exact value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selector<T> {
    #[default]
    All,
    Only(T),
}

impl<T: FromStr> Selector<T> {
    /// Parses a raw form value. `"all"` and unparseable values select `All`.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed == ALL {
            return Self::All;
        }
        trimmed.parse().map_or(Self::All, Self::Only)
    }
}

impl<T: PartialEq> Selector<T> {
    fn admits(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == value,
        }
    }
}

/// Display filter over events. All dimensions are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPredicate {
    pub status: Selector<EventStatus>,
    pub tag: Selector<TagId>,
    pub participant: Selector<ParticipantId>,
    /// Case-insensitive substring; blank matches everything. `from_form`
    /// stores it trimmed and lower-cased.
    pub text: String,
}

impl FilterPredicate {
    /// Predicate matching every event.
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds a predicate from the raw values of the filter controls.
    pub fn from_form(status: &str, tag: &str, participant: &str, text: &str) -> Self {
        Self {
            status: Selector::parse(status),
            tag: Selector::parse(tag),
            participant: Selector::parse(participant),
            text: normalize_needle(text),
        }
    }

    /// Whether this predicate admits `event`.
    pub fn matches(&self, event: &Event) -> bool {
        self.matches_needle(event, &normalize_needle(&self.text))
    }

    fn matches_needle(&self, event: &Event, needle: &str) -> bool {
        if !self.status.admits(&event.status) {
            return false;
        }
        if let Selector::Only(tag_id) = self.tag {
            if !event.has_tag(tag_id) {
                return false;
            }
        }
        if let Selector::Only(participant_id) = self.participant {
            if !event.has_participant(participant_id) {
                return false;
            }
        }
        needle.is_empty() || event.search_haystack().to_lowercase().contains(needle)
    }
}

fn normalize_needle(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Lazily yields the events admitted by `predicate`, in input order.
pub fn filter_events<'a>(
    events: &'a [Event],
    predicate: &'a FilterPredicate,
) -> impl Iterator<Item = &'a Event> + Clone + 'a {
    let needle = normalize_needle(&predicate.text);
    events
        .iter()
        .filter(move |event| predicate.matches_needle(event, &needle))
}

#[cfg(test)]
mod tests {
    use super::{filter_events, FilterPredicate, Selector};
    use crate::model::event::EventStatus;
    use crate::repo::seed::demo_dataset;

    fn ids(predicate: &FilterPredicate) -> Vec<i64> {
        let dataset = demo_dataset(None, "t");
        filter_events(&dataset.events, predicate).map(|e| e.id).collect()
    }

    #[test]
    fn selector_parses_all_and_garbage_as_unrestricted() {
        assert_eq!(Selector::<i64>::parse("all"), Selector::All);
        assert_eq!(Selector::<i64>::parse("abc"), Selector::All);
        assert_eq!(Selector::<i64>::parse(" 3 "), Selector::Only(3));
        assert_eq!(Selector::<EventStatus>::parse("done"), Selector::Only(EventStatus::Done));
    }

    #[test]
    fn each_dimension_restricts() {
        assert_eq!(ids(&FilterPredicate::from_form("done", "all", "all", "")), vec![103]);
        assert_eq!(ids(&FilterPredicate::from_form("all", "2", "all", "")), vec![102]);
        assert_eq!(ids(&FilterPredicate::from_form("all", "all", "1", "")), vec![101, 103]);
        assert_eq!(ids(&FilterPredicate::from_form("all", "all", "all", "  LINZ ")), vec![103]);
    }

    #[test]
    fn dimensions_are_conjunctive() {
        assert_eq!(ids(&FilterPredicate::from_form("planned", "all", "3", "")), vec![102]);
        assert!(ids(&FilterPredicate::from_form("done", "1", "all", "")).is_empty());
    }

    #[test]
    fn from_form_normalizes_text_once_and_raw_text_still_matches() {
        let predicate = FilterPredicate::from_form("all", "all", "all", "  LINZ ");
        assert_eq!(predicate.text, "linz");

        let raw = FilterPredicate {
            text: " Figma ".to_string(),
            ..FilterPredicate::all()
        };
        assert_eq!(ids(&raw), vec![102]);
        let dataset = demo_dataset(None, "t");
        assert!(raw.matches(&dataset.events[1]));
        assert!(!raw.matches(&dataset.events[0]));
    }

    #[test]
    fn text_matches_description_and_spans_joined_fields() {
        assert_eq!(ids(&FilterPredicate::from_form("all", "all", "all", "prototyping")), vec![102]);
        // title and location are joined by one space
        assert_eq!(ids(&FilterPredicate::from_form("all", "all", "all", "party linz")), vec![103]);
    }
}
