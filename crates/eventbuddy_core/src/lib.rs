//! Core domain logic for EventBuddy.
//! This crate is the single source of truth for event, tag, participant and
//! invitation invariants.

pub mod clock;
pub mod kv;
pub mod logging;
pub mod mail;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use kv::{KvError, KvStore, MemoryKvStore, SqliteKvStore};
pub use logging::{default_log_level, init_logging, logging_status};
pub use mail::{render_invite_mail, MailFields};
pub use model::dataset::Dataset;
pub use model::event::{
    Event, EventDraft, EventForm, EventId, EventStatus, Invitation, InvitationStatus,
};
pub use model::participant::{Participant, ParticipantId};
pub use model::tag::{Tag, TagId};
pub use model::user::{CurrentUser, Identity};
pub use model::ValidationError;
pub use repo::dataset_repo::{
    decode_dataset, encode_dataset, DatasetRepository, PersistError, StoreConfig,
};
pub use search::filter::{filter_events, FilterPredicate, Selector};
pub use service::detail::{EventDetail, InvitationMail, ParticipantStatus};
pub use service::entity_store::{EntityKind, EntityStore, StoreError, StoreOptions, StoreResult};
pub use service::invitation::{
    reconcile_invitations, ReconcileInput, Reconciliation, RngStatusSource,
    SequenceStatusSource, StatusSource,
};
pub use service::session::{IdentityProvider, Session, StaticIdentity};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
