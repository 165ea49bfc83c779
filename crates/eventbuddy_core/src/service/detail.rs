//! Event detail read model for the presentation layer.

use crate::model::event::{Event, InvitationStatus};
use crate::model::participant::{Participant, ParticipantId};
use crate::model::tag::Tag;

/// Participant of an event with its displayed invitation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantStatus {
    pub participant: Participant,
    /// `Pending` when the participant has no invitation record.
    pub status: InvitationStatus,
}

/// One rendered invitation, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationMail {
    pub participant_id: ParticipantId,
    /// `Name <email>`, or `participant <id>` when the id no longer resolves.
    pub recipient: String,
    pub status: InvitationStatus,
    pub mail: String,
    pub sent_at: String,
}

/// Selected event with all references resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetail {
    pub event: Event,
    pub formatted_datetime: String,
    /// Tags in `tag_ids` order; unresolved ids are skipped.
    pub tags: Vec<Tag>,
    /// Participants in `participant_ids` order; unresolved ids are skipped.
    pub participants: Vec<ParticipantStatus>,
    /// Invitations in participant-id order.
    pub mails: Vec<InvitationMail>,
}

/// Resolves tag and participant references of `event`.
pub fn build_event_detail(event: &Event, tags: &[Tag], participants: &[Participant]) -> EventDetail {
    let find_participant = |id: ParticipantId| participants.iter().find(|p| p.id == id);

    let resolved_tags = event
        .tag_ids
        .iter()
        .filter_map(|id| tags.iter().find(|tag| tag.id == *id).cloned())
        .collect();

    let resolved_participants = event
        .participant_ids
        .iter()
        .filter_map(|id| {
            let participant = find_participant(*id)?;
            let status = event
                .invitations
                .get(id)
                .map_or(InvitationStatus::Pending, |invitation| invitation.status);
            Some(ParticipantStatus {
                participant: participant.clone(),
                status,
            })
        })
        .collect();

    let mails = event
        .invitations
        .iter()
        .map(|(id, invitation)| InvitationMail {
            participant_id: *id,
            recipient: find_participant(*id).map_or_else(
                || format!("participant {id}"),
                |p| format!("{} <{}>", p.name, p.email),
            ),
            status: invitation.status,
            mail: invitation.mail.clone(),
            sent_at: invitation.sent_at.clone(),
        })
        .collect();

    EventDetail {
        event: event.clone(),
        formatted_datetime: event.formatted_datetime(),
        tags: resolved_tags,
        participants: resolved_participants,
        mails,
    }
}
