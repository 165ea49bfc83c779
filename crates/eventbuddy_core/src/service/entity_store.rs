//! Entity store: CRUD and cascades over the owned dataset.
//!
//! # Responsibility
//! - Own the in-memory dataset for one session.
//! - Enforce uniqueness, validation and referential cleanup on mutation.
//! - Delegate participant-list changes to the invitation engine.
//! - Persist the full dataset after every successful mutation.
//!
//! # Invariants
//! - Every mutation is all-or-nothing: it edits a working copy, saves it,
//!   and only then replaces the in-memory dataset.
//! - `tag_ids` and `participant_ids` only reference existing records.
//! - For every event, invitation keys equal `participant_ids` after a save.
//! - Ids are strictly increasing and never reused within a dataset; an
//!   exhausted id space is reported, never wrapped.
//! - Status draws consumed by a save that fails to persist are replayed by
//!   the next save.

use crate::clock::{Clock, SystemClock};
use crate::kv::KvStore;
use crate::mail::MailFields;
use crate::model::dataset::Dataset;
use crate::model::event::{Event, EventDraft, EventId, Invitation};
use crate::model::participant::{normalize_avatar, normalize_email, Participant, ParticipantId};
use crate::model::tag::{Tag, TagId};
use crate::model::user::{CurrentUser, Identity};
use crate::model::{require_trimmed, ValidationError};
use crate::repo::dataset_repo::{DatasetRepository, PersistError, StoreConfig};
use crate::service::detail::{build_event_detail, EventDetail};
use crate::service::invitation::{
    reconcile_invitations, ReconcileInput, RngStatusSource, StatusSource,
};
use log::{error, info};
use std::collections::{BTreeMap, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity collection targeted by a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Tag,
    Participant,
    Event,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Tag => "tag",
            Self::Participant => "participant",
            Self::Event => "event",
        })
    }
}

/// Recoverable store failure. The store keeps its pre-operation state.
#[derive(Debug)]
pub enum StoreError {
    /// Required input field is empty.
    Validation(ValidationError),
    /// Another tag already uses this name (case-insensitive).
    DuplicateName(String),
    /// Another participant already uses this email (case-insensitive).
    DuplicateEmail(String),
    /// Explicitly targeted entity does not exist.
    NotFound { kind: EntityKind, id: i64 },
    /// Persistence adapter failure.
    Persist(PersistError),
    /// The next id would overflow `i64`.
    IdsExhausted,
}

impl StoreError {
    /// Stable metadata-only code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::DuplicateName(_) => "duplicate_name",
            Self::DuplicateEmail(_) => "duplicate_email",
            Self::NotFound { .. } => "not_found",
            Self::Persist(_) => "persist_failed",
            Self::IdsExhausted => "ids_exhausted",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateName(name) => write!(f, "tag name already exists: `{name}`"),
            Self::DuplicateEmail(email) => write!(f, "participant email already exists: `{email}`"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Persist(err) => write!(f, "{err}"),
            Self::IdsExhausted => f.write_str("no ids left above the highest stored id"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persist(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistError> for StoreError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

/// Construction options for [`EntityStore::open_with`].
pub struct StoreOptions {
    pub config: StoreConfig,
    pub status_source: Box<dyn StatusSource>,
    pub clock: Box<dyn Clock>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            config: StoreConfig::default(),
            status_source: Box::new(RngStatusSource::from_entropy()),
            clock: Box::new(SystemClock),
        }
    }
}

impl StoreOptions {
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_status_source(mut self, source: impl StatusSource + 'static) -> Self {
        self.status_source = Box::new(source);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }
}

/// Owned dataset plus the collaborators needed to mutate it.
pub struct EntityStore<K: KvStore> {
    repo: DatasetRepository<K>,
    dataset: Dataset,
    current_user: Option<CurrentUser>,
    status_source: Box<dyn StatusSource>,
    clock: Box<dyn Clock>,
    /// Draws taken for saves that did not persist, replayed first.
    unused_draws: VecDeque<f64>,
    last_id: i64,
}

impl<K: KvStore> EntityStore<K> {
    /// Opens a store with system clock, entropy-seeded statuses and default
    /// keys.
    pub fn open(kv: K) -> StoreResult<Self> {
        Self::open_with(kv, StoreOptions::default())
    }

    /// Loads the persisted user, then loads or seeds the dataset.
    ///
    /// # Errors
    /// - `Persist` when a stored record cannot be read or decoded, or when
    ///   the seed cannot be written.
    pub fn open_with(kv: K, options: StoreOptions) -> StoreResult<Self> {
        let mut repo = DatasetRepository::with_config(kv, options.config);
        let current_user = repo.load_user()?;
        let sent_at = options.clock.now_iso();
        let loaded = repo.load_or_seed(current_user.as_ref(), &sent_at)?;

        let user_id = current_user.as_ref().map_or(0, |user| user.id);
        let last_id = loaded.dataset.max_id().max(user_id);
        info!(
            "event=store_open module=store status=ok seeded={} has_user={} events={}",
            loaded.seeded,
            current_user.is_some(),
            loaded.dataset.events.len()
        );

        Ok(Self {
            repo,
            dataset: loaded.dataset,
            current_user,
            status_source: options.status_source,
            clock: options.clock,
            unused_draws: VecDeque::new(),
            last_id,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn tags(&self) -> &[Tag] {
        &self.dataset.tags
    }

    pub fn participants(&self) -> &[Participant] {
        &self.dataset.participants
    }

    /// Events, most recently created first.
    pub fn events(&self) -> &[Event] {
        &self.dataset.events
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.dataset.tags.iter().find(|tag| tag.id == id)
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.dataset.participants.iter().find(|p| p.id == id)
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.dataset.events.iter().find(|event| event.id == id)
    }

    /// Event with resolved tags, participants and invitation mails.
    pub fn event_detail(&self, id: EventId) -> Option<EventDetail> {
        self.event(id).map(|event| {
            build_event_detail(event, &self.dataset.tags, &self.dataset.participants)
        })
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.current_user.as_ref()
    }

    pub fn repository(&self) -> &DatasetRepository<K> {
        &self.repo
    }

    /// Creates and persists the current user from identity input.
    pub fn establish_user(&mut self, identity: &Identity) -> StoreResult<CurrentUser> {
        let user = CurrentUser::from_identity(self.peek_next_id()?, identity)?;
        self.repo.save_user(&user)?;
        self.last_id = user.id;
        info!("event=user_establish module=store status=ok user_id={}", user.id);
        self.current_user = Some(user.clone());
        Ok(user)
    }

    /// Forgets the current user (logout). The dataset is left untouched.
    pub fn clear_user(&mut self) -> StoreResult<()> {
        self.repo.clear_user()?;
        self.current_user = None;
        info!("event=user_clear module=store status=ok");
        Ok(())
    }

    // ---- tags ----

    pub fn add_tag(&mut self, name: &str) -> StoreResult<Tag> {
        let result = self.try_add_tag(name);
        log_outcome("tag_add", &result, |tag| tag.id);
        result
    }

    fn try_add_tag(&mut self, name: &str) -> StoreResult<Tag> {
        let name = require_trimmed(name, "name")?;
        if self.dataset.tags.iter().any(|tag| tag.name_matches(&name)) {
            return Err(StoreError::DuplicateName(name));
        }

        let tag = Tag::new(self.peek_next_id()?, name);
        let mut next = self.dataset.clone();
        next.tags.push(tag.clone());
        self.commit(next)?;
        self.last_id = tag.id;
        Ok(tag)
    }

    /// Renames a tag in place.
    pub fn update_tag(&mut self, id: TagId, name: &str) -> StoreResult<Tag> {
        let result = self.try_update_tag(id, name);
        log_outcome("tag_update", &result, |tag| tag.id);
        result
    }

    fn try_update_tag(&mut self, id: TagId, name: &str) -> StoreResult<Tag> {
        let index = self.tag_index(id)?;
        let name = require_trimmed(name, "name")?;
        if self
            .dataset
            .tags
            .iter()
            .any(|tag| tag.id != id && tag.name_matches(&name))
        {
            return Err(StoreError::DuplicateName(name));
        }

        let tag = Tag::new(id, name);
        let mut next = self.dataset.clone();
        next.tags[index] = tag.clone();
        self.commit(next)?;
        Ok(tag)
    }

    /// Removes a tag and strips it from every event.
    pub fn delete_tag(&mut self, id: TagId) -> StoreResult<Tag> {
        let result = self.try_delete_tag(id);
        log_outcome("tag_delete", &result, |tag| tag.id);
        result
    }

    fn try_delete_tag(&mut self, id: TagId) -> StoreResult<Tag> {
        let index = self.tag_index(id)?;
        let mut next = self.dataset.clone();
        let removed = next.tags.remove(index);

        let mut touched = 0usize;
        for event in &mut next.events {
            let before = event.tag_ids.len();
            event.tag_ids.retain(|tag_id| *tag_id != id);
            if event.tag_ids.len() != before {
                touched += 1;
            }
        }

        self.commit(next)?;
        info!("event=tag_cascade module=store status=ok tag_id={id} events_touched={touched}");
        Ok(removed)
    }

    // ---- participants ----

    pub fn add_participant(
        &mut self,
        name: &str,
        email: &str,
        avatar: Option<&str>,
    ) -> StoreResult<Participant> {
        let result = self.try_add_participant(name, email, avatar);
        log_outcome("participant_add", &result, |p| p.id);
        result
    }

    fn try_add_participant(
        &mut self,
        name: &str,
        email: &str,
        avatar: Option<&str>,
    ) -> StoreResult<Participant> {
        let (name, email, avatar) = normalize_participant_input(name, email, avatar)?;
        if self.dataset.participants.iter().any(|p| p.email_matches(&email)) {
            return Err(StoreError::DuplicateEmail(email));
        }

        let participant = Participant::new(self.peek_next_id()?, name, email, avatar);
        let mut next = self.dataset.clone();
        next.participants.push(participant.clone());
        self.commit(next)?;
        self.last_id = participant.id;
        Ok(participant)
    }

    /// Replaces a participant record in place.
    ///
    /// Existing invitation mails keep the text they were rendered with.
    pub fn update_participant(
        &mut self,
        id: ParticipantId,
        name: &str,
        email: &str,
        avatar: Option<&str>,
    ) -> StoreResult<Participant> {
        let result = self.try_update_participant(id, name, email, avatar);
        log_outcome("participant_update", &result, |p| p.id);
        result
    }

    fn try_update_participant(
        &mut self,
        id: ParticipantId,
        name: &str,
        email: &str,
        avatar: Option<&str>,
    ) -> StoreResult<Participant> {
        let index = self.participant_index(id)?;
        let (name, email, avatar) = normalize_participant_input(name, email, avatar)?;
        if self
            .dataset
            .participants
            .iter()
            .any(|p| p.id != id && p.email_matches(&email))
        {
            return Err(StoreError::DuplicateEmail(email));
        }

        let participant = Participant::new(id, name, email, avatar);
        let mut next = self.dataset.clone();
        next.participants[index] = participant.clone();
        self.commit(next)?;
        Ok(participant)
    }

    /// Removes a participant, its event memberships and its invitations.
    pub fn delete_participant(&mut self, id: ParticipantId) -> StoreResult<Participant> {
        let result = self.try_delete_participant(id);
        log_outcome("participant_delete", &result, |p| p.id);
        result
    }

    fn try_delete_participant(&mut self, id: ParticipantId) -> StoreResult<Participant> {
        let index = self.participant_index(id)?;
        let mut next = self.dataset.clone();
        let removed = next.participants.remove(index);

        let mut touched = 0usize;
        for event in &mut next.events {
            let before = event.participant_ids.len();
            event.participant_ids.retain(|participant_id| *participant_id != id);
            let dropped_invitation = event.invitations.remove(&id).is_some();
            if event.participant_ids.len() != before || dropped_invitation {
                touched += 1;
            }
        }

        self.commit(next)?;
        info!(
            "event=participant_cascade module=store status=ok participant_id={id} events_touched={touched}"
        );
        Ok(removed)
    }

    // ---- events ----

    /// Creates an event at the head of the collection.
    pub fn add_event(&mut self, draft: EventDraft) -> StoreResult<Event> {
        let result = self.try_add_event(draft);
        log_outcome("event_add", &result, |event| event.id);
        result
    }

    fn try_add_event(&mut self, draft: EventDraft) -> StoreResult<Event> {
        let draft = self.prepare_draft(draft)?;
        let id = self.peek_next_id()?;
        let (event, draws) = self.build_event(id, draft, &[], &BTreeMap::new());

        let mut next = self.dataset.clone();
        next.events.insert(0, event.clone());
        self.commit_with_draws(next, draws)?;
        self.last_id = id;
        Ok(event)
    }

    /// Rebuilds an event from `draft`, carrying forward reconciled
    /// invitations.
    pub fn update_event(&mut self, id: EventId, draft: EventDraft) -> StoreResult<Event> {
        let result = self.try_update_event(id, draft);
        log_outcome("event_update", &result, |event| event.id);
        result
    }

    fn try_update_event(&mut self, id: EventId, draft: EventDraft) -> StoreResult<Event> {
        let index = self.event_index(id)?;
        let draft = self.prepare_draft(draft)?;
        let prior = &self.dataset.events[index];
        let prior_participants = prior.participant_ids.clone();
        let prior_invitations = prior.invitations.clone();
        let (event, draws) = self.build_event(id, draft, &prior_participants, &prior_invitations);

        let mut next = self.dataset.clone();
        next.events[index] = event.clone();
        self.commit_with_draws(next, draws)?;
        Ok(event)
    }

    pub fn delete_event(&mut self, id: EventId) -> StoreResult<Event> {
        let result = self.try_delete_event(id);
        log_outcome("event_delete", &result, |event| event.id);
        result
    }

    fn try_delete_event(&mut self, id: EventId) -> StoreResult<Event> {
        let index = self.event_index(id)?;
        let mut next = self.dataset.clone();
        let removed = next.events.remove(index);
        self.commit(next)?;
        Ok(removed)
    }

    // ---- internals ----

    /// Validates a draft and drops ids that reference no existing record.
    fn prepare_draft(&self, draft: EventDraft) -> StoreResult<EventDraft> {
        let mut draft = draft.validate()?;
        draft.tag_ids.retain(|id| self.tag(*id).is_some());
        draft
            .participant_ids
            .retain(|id| self.participant(*id).is_some());
        Ok(draft)
    }

    fn build_event(
        &mut self,
        id: EventId,
        draft: EventDraft,
        prior_participants: &[ParticipantId],
        prior_invitations: &BTreeMap<ParticipantId, Invitation>,
    ) -> (Event, Vec<f64>) {
        let sent_at = self.clock.now_iso();
        let mut source = ReplayingSource {
            replay: &mut self.unused_draws,
            inner: self.status_source.as_mut(),
            taken: Vec::new(),
        };
        let outcome = reconcile_invitations(
            &ReconcileInput {
                prior_participants,
                new_participants: &draft.participant_ids,
                prior_invitations,
                participants: &self.dataset.participants,
                fields: MailFields {
                    title: &draft.title,
                    datetime: &draft.datetime,
                    location: &draft.location,
                    description: &draft.description,
                },
                organizer: self.current_user.as_ref(),
                sent_at: &sent_at,
            },
            &mut source,
        );
        let draws = source.taken;
        info!(
            "event=invitation_reconcile module=store status=ok event_id={} synthesized={} removed={} skipped={}",
            id,
            outcome.synthesized.len(),
            outcome.removed.len(),
            outcome.skipped.len()
        );
        (Event::from_draft(id, draft, outcome.invitations), draws)
    }

    /// Persists `next` and installs it as the current dataset.
    fn commit(&mut self, next: Dataset) -> StoreResult<()> {
        self.repo.save(&next)?;
        self.dataset = next;
        Ok(())
    }

    /// Like [`Self::commit`], but hands `draws` back for replay when the
    /// save fails.
    fn commit_with_draws(&mut self, next: Dataset, draws: Vec<f64>) -> StoreResult<()> {
        let result = self.commit(next);
        if result.is_err() {
            for draw in draws.into_iter().rev() {
                self.unused_draws.push_front(draw);
            }
        }
        result
    }

    /// Next id without consuming it; callers bump `last_id` after commit.
    fn peek_next_id(&self) -> StoreResult<i64> {
        let after_last = self
            .last_id
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted)?;
        Ok(self.clock.now_millis().max(after_last))
    }

    fn tag_index(&self, id: TagId) -> StoreResult<usize> {
        self.dataset
            .tags
            .iter()
            .position(|tag| tag.id == id)
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Tag,
                id,
            })
    }

    fn participant_index(&self, id: ParticipantId) -> StoreResult<usize> {
        self.dataset
            .participants
            .iter()
            .position(|p| p.id == id)
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Participant,
                id,
            })
    }

    fn event_index(&self, id: EventId) -> StoreResult<usize> {
        self.dataset
            .events
            .iter()
            .position(|event| event.id == id)
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Event,
                id,
            })
    }
}

/// Serves replayed draws before asking `inner`, recording everything it
/// hands out.
struct ReplayingSource<'a> {
    replay: &'a mut VecDeque<f64>,
    inner: &'a mut dyn StatusSource,
    taken: Vec<f64>,
}

impl StatusSource for ReplayingSource<'_> {
    fn next_unit(&mut self) -> f64 {
        let draw = match self.replay.pop_front() {
            Some(draw) => draw,
            None => self.inner.next_unit(),
        };
        self.taken.push(draw);
        draw
    }
}

fn normalize_participant_input(
    name: &str,
    email: &str,
    avatar: Option<&str>,
) -> StoreResult<(String, String, Option<String>)> {
    let name = require_trimmed(name, "name")?;
    let email = normalize_email(&require_trimmed(email, "email")?);
    Ok((name, email, avatar.and_then(normalize_avatar)))
}

fn log_outcome<T>(operation: &str, result: &StoreResult<T>, id_of: impl Fn(&T) -> i64) {
    match result {
        Ok(value) => info!(
            "event={operation} module=store status=ok id={}",
            id_of(value)
        ),
        Err(StoreError::Persist(err)) => error!(
            "event={operation} module=store status=error error_code=persist_failed error={err}"
        ),
        Err(err) => info!(
            "event={operation} module=store status=rejected error_code={}",
            err.code()
        ),
    }
}
