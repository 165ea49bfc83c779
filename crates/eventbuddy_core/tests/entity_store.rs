use eventbuddy_core::kv::KvResult;
use eventbuddy_core::{
    EntityKind, EntityStore, EventDraft, FixedClock, InvitationStatus, KvError, KvStore,
    MemoryKvStore, SequenceStatusSource, StoreError, StoreOptions, ValidationError,
};
use std::cell::Cell;
use std::rc::Rc;

const NOW: i64 = 1_771_783_200_000;

fn options() -> StoreOptions {
    StoreOptions::default()
        .with_clock(FixedClock(NOW))
        .with_status_source(SequenceStatusSource::new(vec![0.1]))
}

fn open_store() -> EntityStore<MemoryKvStore> {
    EntityStore::open_with(MemoryKvStore::new(), options()).unwrap()
}

fn assert_invitations_match_participants<K: KvStore>(store: &EntityStore<K>) {
    for event in store.events() {
        let mut ids = event.participant_ids.clone();
        ids.sort_unstable();
        let keys = event.invitations.keys().copied().collect::<Vec<_>>();
        assert_eq!(keys, ids, "event {} invitation keys drifted", event.id);
    }
}

/// Memory store whose writes can be switched to fail.
struct FlakyKv {
    inner: MemoryKvStore,
    fail_writes: Rc<Cell<bool>>,
}

impl KvStore for FlakyKv {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> KvResult<()> {
        if self.fail_writes.get() {
            return Err(KvError::UnsupportedSchema {
                found: 99,
                supported: 1,
            });
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        self.inner.remove(key)
    }
}

#[test]
fn add_tag_appends_with_fresh_id() {
    let mut store = open_store();

    let tag = store.add_tag("  Konzert ").unwrap();
    assert_eq!(tag.name, "Konzert");
    assert_eq!(tag.id, NOW);
    assert_eq!(store.tags().len(), 4);
    assert_eq!(store.tags().last(), Some(&tag));
}

#[test]
fn add_tag_rejects_case_insensitive_duplicate_and_blank_name() {
    let mut store = open_store();

    let err = store.add_tag("VEREIN").unwrap_err();
    assert!(matches!(err, StoreError::DuplicateName(ref name) if name == "VEREIN"));

    let err = store.add_tag("   ").unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::MissingField("name"))
    ));
    assert_eq!(store.tags().len(), 3);
}

#[test]
fn update_tag_replaces_in_place() {
    let mut store = open_store();

    let renamed = store.update_tag(2, " WORKSHOP ").unwrap();
    assert_eq!(renamed.id, 2);
    assert_eq!(store.tags()[1].name, "WORKSHOP");
    assert_eq!(
        store.tags().iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let err = store.update_tag(2, "party").unwrap_err();
    assert!(matches!(err, StoreError::DuplicateName(_)));
    assert_eq!(store.tags()[1].name, "WORKSHOP");
}

#[test]
fn delete_tag_strips_id_from_every_event_without_touching_invitations() {
    let mut store = open_store();
    let event = store
        .add_event(EventDraft::new("Jam", "2026-05-01T18:30", "Linz").with_tags([1, 2]))
        .unwrap();
    let invitations_before = store
        .events()
        .iter()
        .map(|e| e.invitations.clone())
        .collect::<Vec<_>>();

    let removed = store.delete_tag(1).unwrap();
    assert_eq!(removed.name, "Verein");
    assert!(store.tag(1).is_none());
    assert!(store.events().iter().all(|e| !e.has_tag(1)));
    assert_eq!(store.event(event.id).unwrap().tag_ids, vec![2]);
    assert!(store.event(101).unwrap().tag_ids.is_empty());

    let invitations_after = store
        .events()
        .iter()
        .map(|e| e.invitations.clone())
        .collect::<Vec<_>>();
    assert_eq!(invitations_after, invitations_before);
}

#[test]
fn add_participant_rejects_duplicate_email_case_insensitively() {
    let mut store = open_store();

    let err = store
        .add_participant("Max Zwei", "Max@Example.com", None)
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateEmail(ref email) if email == "max@example.com"));
    assert_eq!(store.participants().len(), 3);
}

#[test]
fn add_participant_normalizes_input() {
    let mut store = open_store();

    let participant = store
        .add_participant(" Sam Neu ", " Sam@Example.COM ", Some("  "))
        .unwrap();
    assert_eq!(participant.name, "Sam Neu");
    assert_eq!(participant.email, "sam@example.com");
    assert_eq!(participant.avatar, None);
    assert_eq!(store.participants().last(), Some(&participant));

    let err = store.add_participant("No Mail", "  ", None).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::MissingField("email"))
    ));
}

#[test]
fn update_participant_replaces_in_place_and_checks_other_emails() {
    let mut store = open_store();

    let updated = store
        .update_participant(2, "Anna B.", "ANNA@example.com", Some("AB"))
        .unwrap();
    assert_eq!(updated.email, "anna@example.com");
    assert_eq!(store.participants()[1], updated);

    let err = store
        .update_participant(2, "Anna", "lena@example.com", None)
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateEmail(_)));
    assert_eq!(store.participants()[1].name, "Anna B.");
}

#[test]
fn delete_participant_cascades_through_ids_and_invitations() {
    let mut store = open_store();

    let removed = store.delete_participant(2).unwrap();
    assert_eq!(removed.email, "anna@example.com");
    assert!(store.participant(2).is_none());
    for event in store.events() {
        assert!(!event.has_participant(2), "event {}", event.id);
        assert!(!event.invitations.contains_key(&2), "event {}", event.id);
    }
    assert_eq!(store.event(103).unwrap().participant_ids, vec![1, 3]);
    assert_invitations_match_participants(&store);
}

#[test]
fn explicit_targets_that_do_not_exist_return_not_found() {
    let mut store = open_store();
    let draft = EventDraft::new("x", "2026-01-01T00:00", "y");

    let cases = [
        (store.update_tag(9, "x").unwrap_err(), EntityKind::Tag),
        (store.delete_tag(9).unwrap_err(), EntityKind::Tag),
        (
            store.update_participant(9, "x", "x@y.z", None).unwrap_err(),
            EntityKind::Participant,
        ),
        (store.delete_participant(9).unwrap_err(), EntityKind::Participant),
        (store.update_event(9, draft).unwrap_err(), EntityKind::Event),
        (store.delete_event(9).unwrap_err(), EntityKind::Event),
    ];
    for (err, expected_kind) in cases {
        assert!(
            matches!(err, StoreError::NotFound { kind, id: 9 } if kind == expected_kind),
            "unexpected error: {err}"
        );
    }
}

#[test]
fn add_event_inserts_at_head_and_drops_unknown_references() {
    let mut store = open_store();

    let event = store
        .add_event(
            EventDraft::new(" Jam ", "2026-05-01T18:30", " Linz ")
                .with_tags([2, 77])
                .with_participants([3, 88, 3]),
        )
        .unwrap();

    assert_eq!(store.events()[0], event);
    assert_eq!(
        store.events().iter().map(|e| e.id).collect::<Vec<_>>(),
        vec![event.id, 101, 102, 103]
    );
    assert_eq!(event.title, "Jam");
    assert_eq!(event.datetime, "2026-05-01T18:30:00");
    assert_eq!(event.tag_ids, vec![2]);
    assert_eq!(event.participant_ids, vec![3]);
    assert_invitations_match_participants(&store);
}

#[test]
fn add_event_validation_failure_leaves_store_unchanged() {
    let mut store = open_store();
    let before = store.dataset().clone();

    let err = store
        .add_event(EventDraft::new("Jam", "2026-05-01T18:30", "   "))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::MissingField("location"))
    ));
    assert_eq!(store.dataset(), &before);
}

#[test]
fn delete_event_removes_only_that_event() {
    let mut store = open_store();

    let removed = store.delete_event(102).unwrap();
    assert_eq!(removed.title, "Figma Workshop");
    assert_eq!(
        store.events().iter().map(|e| e.id).collect::<Vec<_>>(),
        vec![101, 103]
    );
    assert_eq!(store.tags().len(), 3);
    assert_eq!(store.participants().len(), 3);
}

#[test]
fn every_successful_mutation_persists_once() {
    let mut store = open_store();
    // seeding writes once
    assert_eq!(store.repository().kv().writes(), 1);

    store.add_tag("Konzert").unwrap();
    assert_eq!(store.repository().kv().writes(), 2);

    store.add_tag("konzert").unwrap_err();
    store.delete_event(404).unwrap_err();
    assert_eq!(store.repository().kv().writes(), 2);

    store.delete_participant(1).unwrap();
    assert_eq!(store.repository().kv().writes(), 3);
}

#[test]
fn ids_are_strictly_increasing_and_never_reused() {
    let mut store = open_store();

    let first = store.add_tag("A").unwrap();
    store.delete_tag(first.id).unwrap();
    let second = store.add_tag("B").unwrap();
    let participant = store.add_participant("C", "c@example.com", None).unwrap();

    assert_eq!(first.id, NOW);
    assert_eq!(second.id, NOW + 1);
    assert_eq!(participant.id, NOW + 2);
}

#[test]
fn persistence_failure_leaves_store_unchanged() {
    let fail_writes = Rc::new(Cell::new(false));
    let kv = FlakyKv {
        inner: MemoryKvStore::new(),
        fail_writes: Rc::clone(&fail_writes),
    };
    let mut store = EntityStore::open_with(kv, options()).unwrap();
    let before = store.dataset().clone();

    fail_writes.set(true);
    assert!(matches!(store.add_tag("Neu"), Err(StoreError::Persist(_))));
    assert!(matches!(store.delete_participant(1), Err(StoreError::Persist(_))));
    assert!(matches!(
        store.add_event(EventDraft::new("Jam", "2026-05-01T18:30", "Linz").with_participants([1])),
        Err(StoreError::Persist(_))
    ));
    assert_eq!(store.dataset(), &before);

    fail_writes.set(false);
    let tag = store.add_tag("Neu").unwrap();
    assert_eq!(tag.id, NOW);
}

#[test]
fn status_draws_of_a_failed_save_are_replayed_by_the_next_one() {
    let fail_writes = Rc::new(Cell::new(false));
    let kv = FlakyKv {
        inner: MemoryKvStore::new(),
        fail_writes: Rc::clone(&fail_writes),
    };
    let options = StoreOptions::default()
        .with_clock(FixedClock(NOW))
        .with_status_source(SequenceStatusSource::from_statuses(&[
            InvitationStatus::Accepted,
            InvitationStatus::Declined,
        ]));
    let mut store = EntityStore::open_with(kv, options).unwrap();
    let draft = || EventDraft::new("Jam", "2026-05-01T18:30", "Linz").with_participants([1]);

    fail_writes.set(true);
    assert!(matches!(store.add_event(draft()), Err(StoreError::Persist(_))));

    fail_writes.set(false);
    let first = store.add_event(draft()).unwrap();
    let second = store.add_event(draft()).unwrap();
    assert_eq!(first.invitations[&1].status, InvitationStatus::Accepted);
    assert_eq!(second.invitations[&1].status, InvitationStatus::Declined);
}
