//! Demo dataset written on first start.

use crate::mail::{render_invite_mail, MailFields};
use crate::model::dataset::Dataset;
use crate::model::event::{Event, EventStatus, Invitation, InvitationStatus};
use crate::model::participant::{Participant, ParticipantId};
use crate::model::tag::Tag;
use crate::model::user::CurrentUser;
use std::collections::BTreeMap;

/// Builds the fixed demo dataset.
///
/// Mails are rendered for `organizer` (or the fallback organizer line) and
/// stamped with `sent_at`.
pub fn demo_dataset(organizer: Option<&CurrentUser>, sent_at: &str) -> Dataset {
    let tags = vec![
        Tag::new(1, "Verein"),
        Tag::new(2, "Workshop"),
        Tag::new(3, "Party"),
    ];

    let participants = vec![
        Participant::new(1, "Max Mustermann", "max@example.com", Some("MM".into())),
        Participant::new(2, "Anna Beispiel", "anna@example.com", Some("AB".into())),
        Participant::new(3, "Lena Berger", "lena@example.com", Some("LB".into())),
    ];

    let seeds = [
        SeedEvent {
            id: 101,
            title: "Vereinsabend Februar",
            datetime: "2026-02-22T19:00:00",
            location: "Vereinshaus",
            description: "Monatliches Treffen inkl. Planung für Frühjahr.",
            status: EventStatus::Planned,
            tag_ids: &[1],
            invites: &[(1, InvitationStatus::Accepted), (2, InvitationStatus::Pending)],
        },
        SeedEvent {
            id: 102,
            title: "Figma Workshop",
            datetime: "2026-03-01T14:00:00",
            location: "FH Hagenberg",
            description: "UI Komponenten & Prototyping – Hands-on.",
            status: EventStatus::Planned,
            tag_ids: &[2],
            invites: &[(2, InvitationStatus::Declined), (3, InvitationStatus::Accepted)],
        },
        SeedEvent {
            id: 103,
            title: "After-Exam Party",
            datetime: "2026-01-20T22:00:00",
            location: "Linz",
            description: "Feiern nach der Prüfung 🎉",
            status: EventStatus::Done,
            tag_ids: &[3],
            invites: &[
                (1, InvitationStatus::Pending),
                (2, InvitationStatus::Accepted),
                (3, InvitationStatus::Declined),
            ],
        },
    ];

    let events = seeds
        .iter()
        .map(|seed| seed.build(&participants, organizer, sent_at))
        .collect();

    Dataset {
        tags,
        participants,
        events,
    }
}

struct SeedEvent {
    id: i64,
    title: &'static str,
    datetime: &'static str,
    location: &'static str,
    description: &'static str,
    status: EventStatus,
    tag_ids: &'static [i64],
    invites: &'static [(ParticipantId, InvitationStatus)],
}

impl SeedEvent {
    fn build(
        &self,
        participants: &[Participant],
        organizer: Option<&CurrentUser>,
        sent_at: &str,
    ) -> Event {
        let fields = MailFields {
            title: self.title,
            datetime: self.datetime,
            location: self.location,
            description: self.description,
        };
        let invitations = self
            .invites
            .iter()
            .filter_map(|(participant_id, status)| {
                let participant = participants.iter().find(|p| p.id == *participant_id)?;
                Some((
                    *participant_id,
                    Invitation {
                        status: *status,
                        mail: render_invite_mail(participant, fields, organizer),
                        sent_at: sent_at.to_string(),
                    },
                ))
            })
            .collect::<BTreeMap<_, _>>();

        Event {
            id: self.id,
            title: self.title.to_string(),
            datetime: self.datetime.to_string(),
            location: self.location.to_string(),
            description: self.description.to_string(),
            status: self.status,
            tag_ids: self.tag_ids.to_vec(),
            participant_ids: self.invites.iter().map(|(id, _)| *id).collect(),
            invitations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::demo_dataset;

    #[test]
    fn demo_dataset_has_consistent_invitations() {
        let dataset = demo_dataset(None, "2026-01-01T00:00:00.000Z");
        assert_eq!(dataset.tags.len(), 3);
        assert_eq!(dataset.participants.len(), 3);
        assert_eq!(
            dataset.events.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![101, 102, 103]
        );
        for event in &dataset.events {
            let keys = event.invitations.keys().copied().collect::<Vec<_>>();
            let mut ids = event.participant_ids.clone();
            ids.sort_unstable();
            assert_eq!(keys, ids, "event {}", event.id);
        }
        assert_eq!(dataset.max_id(), 103);
    }
}
