//! Invitation message template.
//!
//! # Invariants
//! - Output is a pure function of participant, event fields and organizer.
//! - Line order is fixed; the description line appears only when the
//!   description is non-empty. The result is persisted as
//!   `Invitation::mail` and displayed verbatim, so changing it changes
//!   stored data.

use crate::model::event::format_datetime;
use crate::model::participant::Participant;
use crate::model::user::CurrentUser;

/// Organizer line used when no user is established.
pub const FALLBACK_ORGANIZER: &str = "Organizer";

/// Event fields the template reads.
#[derive(Debug, Clone, Copy)]
pub struct MailFields<'a> {
    pub title: &'a str,
    pub datetime: &'a str,
    pub location: &'a str,
    pub description: &'a str,
}

/// Renders the invitation body addressed to `participant`.
pub fn render_invite_mail(
    participant: &Participant,
    fields: MailFields<'_>,
    organizer: Option<&CurrentUser>,
) -> String {
    let when = format_datetime(fields.datetime);
    let organizer = organizer.map_or_else(|| FALLBACK_ORGANIZER.to_string(), CurrentUser::signature);

    let mut mail = String::new();
    mail.push_str(&format!("Hallo {},\n\n", participant.name));
    mail.push_str("du wurdest zu folgendem Event eingeladen:\n\n");
    mail.push_str(&format!("Event: {}\n", fields.title));
    mail.push_str(&format!("Datum & Uhrzeit: {when}\n"));
    mail.push_str(&format!("Ort: {}\n", fields.location));
    if !fields.description.is_empty() {
        mail.push_str(&format!("Beschreibung: {}\n", fields.description));
    }
    mail.push_str("\nBitte gib Bescheid, ob du teilnehmen kannst.\n\n");
    mail.push_str(&format!("Liebe Grüße\n{organizer}\n"));
    mail
}
