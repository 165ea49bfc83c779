//! Session facade used by the presentation layer.
//!
//! # Responsibility
//! - Start a session: load user, load or seed data, establish identity once.
//! - Track the selected event and the active list filter.
//!
//! # Invariants
//! - A selection always refers to an existing event.
//! - `visible_events` drops the selection when the filter hides it.

use crate::kv::KvStore;
use crate::model::event::{Event, EventDraft, EventId};
use crate::model::user::Identity;
use crate::search::filter::{filter_events, FilterPredicate};
use crate::service::detail::EventDetail;
use crate::service::entity_store::{EntityKind, EntityStore, StoreError, StoreOptions, StoreResult};
use log::info;

/// Supplies the organizer identity when none is persisted.
pub trait IdentityProvider {
    fn identify(&mut self) -> Identity;
}

/// Provider returning a fixed identity.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub Identity);

impl IdentityProvider for StaticIdentity {
    fn identify(&mut self) -> Identity {
        self.0.clone()
    }
}

/// One user's interactive session over an [`EntityStore`].
pub struct Session<K: KvStore> {
    store: EntityStore<K>,
    selected: Option<EventId>,
    filter: FilterPredicate,
}

impl<K: KvStore> Session<K> {
    /// Opens the store and asks `identity` for a user only if none is
    /// persisted.
    ///
    /// # Errors
    /// - `Validation` when the supplied identity has a blank name or email.
    /// - `Persist` on storage failures.
    pub fn start(
        kv: K,
        identity: &mut dyn IdentityProvider,
        options: StoreOptions,
    ) -> StoreResult<Self> {
        let mut store = EntityStore::open_with(kv, options)?;
        if store.current_user().is_none() {
            store.establish_user(&identity.identify())?;
        }
        info!("event=session_start module=session status=ok");
        Ok(Self::from_store(store))
    }

    pub fn from_store(store: EntityStore<K>) -> Self {
        Self {
            store,
            selected: None,
            filter: FilterPredicate::all(),
        }
    }

    pub fn store(&self) -> &EntityStore<K> {
        &self.store
    }

    /// Direct access for tag/participant management.
    pub fn store_mut(&mut self) -> &mut EntityStore<K> {
        &mut self.store
    }

    pub fn into_store(self) -> EntityStore<K> {
        self.store
    }

    /// Clears the persisted user and the selection.
    pub fn logout(&mut self) -> StoreResult<()> {
        self.store.clear_user()?;
        self.selected = None;
        Ok(())
    }

    pub fn select(&mut self, id: EventId) -> StoreResult<&Event> {
        let event = self.store.event(id).ok_or(StoreError::NotFound {
            kind: EntityKind::Event,
            id,
        })?;
        self.selected = Some(id);
        Ok(event)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<EventId> {
        self.selected
    }

    pub fn selected_detail(&self) -> Option<EventDetail> {
        self.selected.and_then(|id| self.store.event_detail(id))
    }

    pub fn filter(&self) -> &FilterPredicate {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FilterPredicate) {
        self.filter = filter;
    }

    /// Events admitted by the active filter, in collection order.
    pub fn visible_events(&mut self) -> Vec<&Event> {
        if let Some(id) = self.selected {
            let visible = filter_events(self.store.events(), &self.filter).any(|e| e.id == id);
            if !visible {
                self.selected = None;
            }
        }
        filter_events(self.store.events(), &self.filter).collect()
    }

    /// Creates (`existing == None`) or updates an event and selects it.
    pub fn save_event(&mut self, existing: Option<EventId>, draft: EventDraft) -> StoreResult<Event> {
        let saved = match existing {
            Some(id) => self.store.update_event(id, draft)?,
            None => self.store.add_event(draft)?,
        };
        self.selected = Some(saved.id);
        Ok(saved)
    }

    /// Deletes an event, clearing the selection if it pointed there.
    pub fn delete_event(&mut self, id: EventId) -> StoreResult<Event> {
        let removed = self.store.delete_event(id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(removed)
    }

    /// Deletes the selected event, if any.
    pub fn delete_selected(&mut self) -> StoreResult<Option<Event>> {
        match self.selected {
            Some(id) => self.delete_event(id).map(Some),
            None => Ok(None),
        }
    }
}
