//! Invitation engine.
//!
//! # Responsibility
//! - Compute the participant delta of an event save.
//! - Synthesize invitations for newly added participants and drop those of
//!   removed participants.
//!
//! # Invariants
//! - Retained participants keep their existing invitation untouched.
//! - Result keys are exactly the known ids in the new participant list.
//! - The engine performs no I/O and cannot fail; unknown participant ids are
//!   skipped.

use crate::mail::{render_invite_mail, MailFields};
use crate::model::event::{Invitation, InvitationStatus};
use crate::model::participant::{Participant, ParticipantId};
use crate::model::user::CurrentUser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashSet};

/// Source of uniform draws in `[0, 1)` used to pick invitation statuses.
pub trait StatusSource {
    fn next_unit(&mut self) -> f64;

    fn next_status(&mut self) -> InvitationStatus {
        InvitationStatus::from_draw(self.next_unit())
    }
}

/// [`StatusSource`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngStatusSource<R: Rng> {
    rng: R,
}

impl<R: Rng> RngStatusSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngStatusSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible source for tests and demos.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> StatusSource for RngStatusSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, wrapping around at the end.
///
/// An empty list always yields a pending draw.
#[derive(Debug, Clone, Default)]
pub struct SequenceStatusSource {
    draws: Vec<f64>,
    cursor: usize,
}

impl SequenceStatusSource {
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, cursor: 0 }
    }

    /// Builds draws that map back onto the given statuses.
    pub fn from_statuses(statuses: &[InvitationStatus]) -> Self {
        let draws = statuses
            .iter()
            .map(|status| match status {
                InvitationStatus::Accepted => 0.1,
                InvitationStatus::Declined => 0.5,
                InvitationStatus::Pending => 0.9,
            })
            .collect();
        Self::new(draws)
    }
}

impl StatusSource for SequenceStatusSource {
    fn next_unit(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.99;
        }
        let draw = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        draw
    }
}

/// Everything the engine reads for one event save.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    /// Participant ids before the save; empty for a new event.
    pub prior_participants: &'a [ParticipantId],
    /// Participant ids after the save.
    pub new_participants: &'a [ParticipantId],
    pub prior_invitations: &'a BTreeMap<ParticipantId, Invitation>,
    /// Known participant collection used to address mails.
    pub participants: &'a [Participant],
    /// Event fields as they will be saved.
    pub fields: MailFields<'a>,
    pub organizer: Option<&'a CurrentUser>,
    pub sent_at: &'a str,
}

/// Outcome of [`reconcile_invitations`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciliation {
    pub invitations: BTreeMap<ParticipantId, Invitation>,
    /// Ids that received a freshly synthesized invitation.
    pub synthesized: Vec<ParticipantId>,
    /// Ids whose invitation was dropped because they left the event.
    pub removed: Vec<ParticipantId>,
    /// New ids without a matching participant record.
    pub skipped: Vec<ParticipantId>,
}

/// Recomputes an event's invitation map for a participant change.
///
/// Ids present before and after keep their invitation byte-for-byte. Added
/// ids, and retained ids that somehow lack an invitation, get a new one with
/// a status drawn from `status_source`. Draws are consumed in
/// `new_participants` order.
pub fn reconcile_invitations(
    input: &ReconcileInput<'_>,
    status_source: &mut dyn StatusSource,
) -> Reconciliation {
    let prior: HashSet<ParticipantId> = input.prior_participants.iter().copied().collect();
    let next: HashSet<ParticipantId> = input.new_participants.iter().copied().collect();

    let mut outcome = Reconciliation {
        removed: input
            .prior_participants
            .iter()
            .copied()
            .filter(|id| !next.contains(id))
            .collect(),
        ..Reconciliation::default()
    };

    for &participant_id in input.new_participants {
        if prior.contains(&participant_id) {
            if let Some(existing) = input.prior_invitations.get(&participant_id) {
                outcome.invitations.insert(participant_id, existing.clone());
                continue;
            }
        }

        let Some(participant) = input
            .participants
            .iter()
            .find(|participant| participant.id == participant_id)
        else {
            outcome.skipped.push(participant_id);
            continue;
        };

        let invitation = Invitation {
            status: status_source.next_status(),
            mail: render_invite_mail(participant, input.fields, input.organizer),
            sent_at: input.sent_at.to_string(),
        };
        outcome.invitations.insert(participant_id, invitation);
        outcome.synthesized.push(participant_id);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::{
        reconcile_invitations, ReconcileInput, RngStatusSource, SequenceStatusSource,
        StatusSource,
    };
    use crate::mail::MailFields;
    use crate::model::event::{Invitation, InvitationStatus};
    use crate::model::participant::Participant;
    use std::collections::BTreeMap;

    const FIELDS: MailFields<'static> = MailFields {
        title: "Jam",
        datetime: "2026-05-01T18:30:00",
        location: "Linz",
        description: "",
    };

    fn people() -> Vec<Participant> {
        vec![
            Participant::new(1, "Max", "max@example.com", None),
            Participant::new(2, "Anna", "anna@example.com", None),
            Participant::new(3, "Lena", "lena@example.com", None),
        ]
    }

    fn invitation(status: InvitationStatus, mail: &str) -> Invitation {
        Invitation {
            status,
            mail: mail.to_string(),
            sent_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn swap_keeps_retained_and_replaces_others() {
        let participants = people();
        let prior = BTreeMap::from([
            (1, invitation(InvitationStatus::Accepted, "old-1")),
            (2, invitation(InvitationStatus::Declined, "old-2")),
        ]);
        let mut source = SequenceStatusSource::from_statuses(&[InvitationStatus::Pending]);

        let outcome = reconcile_invitations(
            &ReconcileInput {
                prior_participants: &[1, 2],
                new_participants: &[2, 3],
                prior_invitations: &prior,
                participants: &participants,
                fields: FIELDS,
                organizer: None,
                sent_at: "2026-02-02T00:00:00.000Z",
            },
            &mut source,
        );

        assert_eq!(outcome.invitations.keys().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(outcome.invitations[&2], prior[&2]);
        assert_eq!(outcome.invitations[&3].status, InvitationStatus::Pending);
        assert!(outcome.invitations[&3].mail.starts_with("Hallo Lena,"));
        assert_eq!(outcome.invitations[&3].sent_at, "2026-02-02T00:00:00.000Z");
        assert_eq!(outcome.synthesized, vec![3]);
        assert_eq!(outcome.removed, vec![1]);
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let participants = people();
        let prior = BTreeMap::new();
        let mut source = SequenceStatusSource::default();

        let outcome = reconcile_invitations(
            &ReconcileInput {
                prior_participants: &[],
                new_participants: &[1, 99],
                prior_invitations: &prior,
                participants: &participants,
                fields: FIELDS,
                organizer: None,
                sent_at: "now",
            },
            &mut source,
        );

        assert_eq!(outcome.invitations.len(), 1);
        assert_eq!(outcome.skipped, vec![99]);
    }

    #[test]
    fn retained_id_without_invitation_and_stray_keys_are_repaired() {
        let participants = people();
        let prior = BTreeMap::from([(3, invitation(InvitationStatus::Accepted, "stray"))]);
        let mut source = SequenceStatusSource::from_statuses(&[InvitationStatus::Declined]);

        let outcome = reconcile_invitations(
            &ReconcileInput {
                prior_participants: &[1],
                new_participants: &[1],
                prior_invitations: &prior,
                participants: &participants,
                fields: FIELDS,
                organizer: None,
                sent_at: "now",
            },
            &mut source,
        );

        assert_eq!(outcome.invitations.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(outcome.invitations[&1].status, InvitationStatus::Declined);
    }

    #[test]
    fn seeded_rng_source_stays_in_unit_interval() {
        let mut source = RngStatusSource::seeded(7);
        for _ in 0..1000 {
            let draw = source.next_unit();
            assert!((0.0..1.0).contains(&draw));
        }
    }

    #[test]
    fn sequence_source_wraps_and_defaults_to_pending() {
        let mut source = SequenceStatusSource::new(vec![0.0, 0.5]);
        assert_eq!(source.next_status(), InvitationStatus::Accepted);
        assert_eq!(source.next_status(), InvitationStatus::Declined);
        assert_eq!(source.next_status(), InvitationStatus::Accepted);

        let mut empty = SequenceStatusSource::default();
        assert_eq!(empty.next_status(), InvitationStatus::Pending);
    }
}
