//! Persistence store interfaces and their in-memory implementations.
//!
//! The stores enforce the relational constraints the domain relies on:
//! - one volunteer profile per user
//! - one attendance record per `(event, volunteer)`
//! - one feedback record per `(event, volunteer)`
//! - one event report per `(event, author)`
//!
//! Every mutation is applied under a single write lock, so a failed
//! operation never leaves a partial write behind.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use ccvms_attendance::{Attendance, AttendanceKey};
use ccvms_auth::Subject;
use ccvms_communications::Announcement;
use ccvms_core::{Entity, EventId, UserId, VolunteerId};
use ccvms_events::{Event, EventReport, Task};
use ccvms_feedback::{EventFeedback, VolunteerEvaluation};
use ccvms_ministries::{Ministry, Program};
use ccvms_volunteers::VolunteerProfile;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("uniqueness conflict: {0}")]
    Conflict(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Outcome of [`EntityStore::compare_and_swap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Swap<E> {
    Applied,
    /// The stored record no longer equals the expected one; carries what is
    /// stored now (`None` if it was removed).
    Stale(Option<E>),
}

/// CRUD store for one entity type, keyed by the entity's id.
pub trait EntityStore<E: Entity>: Send + Sync {
    fn get(&self, id: &E::Id) -> Result<Option<E>, StoreError>;

    /// Insert a new record. Fails with `Conflict` if the id is taken.
    fn insert(&self, entity: E) -> Result<(), StoreError>;

    /// Insert or overwrite.
    fn put(&self, entity: E) -> Result<(), StoreError>;

    /// Replace `expected` with `next` only if the stored record still equals
    /// `expected`.
    fn compare_and_swap(&self, expected: &E, next: E) -> Result<Swap<E>, StoreError>;

    fn remove(&self, id: &E::Id) -> Result<Option<E>, StoreError>;

    fn list(&self) -> Result<Vec<E>, StoreError>;

    /// Like [`EntityStore::get`], but a missing record is an error.
    fn require(&self, id: &E::Id) -> Result<E, StoreError> {
        self.get(id)?.ok_or(StoreError::NotFound)
    }

    fn find(&self, predicate: &dyn Fn(&E) -> bool) -> Result<Option<E>, StoreError> {
        Ok(self.list()?.into_iter().find(|e| predicate(e)))
    }
}

impl<E, S> EntityStore<E> for Arc<S>
where
    E: Entity,
    S: EntityStore<E> + ?Sized,
{
    fn get(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        (**self).get(id)
    }

    fn insert(&self, entity: E) -> Result<(), StoreError> {
        (**self).insert(entity)
    }

    fn put(&self, entity: E) -> Result<(), StoreError> {
        (**self).put(entity)
    }

    fn compare_and_swap(&self, expected: &E, next: E) -> Result<Swap<E>, StoreError> {
        (**self).compare_and_swap(expected, next)
    }

    fn remove(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        (**self).remove(id)
    }

    fn list(&self) -> Result<Vec<E>, StoreError> {
        (**self).list()
    }
}

/// A secondary uniqueness constraint: no two records may clash.
#[derive(Debug)]
struct UniqueRule<E> {
    name: &'static str,
    clashes: fn(&E, &E) -> bool,
}

/// In-memory entity store for tests/dev.
#[derive(Debug)]
pub struct InMemoryStore<E: Entity> {
    inner: RwLock<HashMap<E::Id, E>>,
    unique: Option<UniqueRule<E>>,
}

impl<E: Entity> InMemoryStore<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            unique: None,
        }
    }

    /// Reject writes where `clashes(new, existing)` holds for another record.
    pub fn with_unique(name: &'static str, clashes: fn(&E, &E) -> bool) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            unique: Some(UniqueRule { name, clashes }),
        }
    }

    fn check_unique(&self, map: &HashMap<E::Id, E>, entity: &E) -> Result<(), StoreError> {
        let Some(rule) = &self.unique else {
            return Ok(());
        };
        let clash = map
            .values()
            .any(|other| other.id() != entity.id() && (rule.clashes)(entity, other));
        if clash {
            return Err(StoreError::Conflict(format!("{} already exists", rule.name)));
        }
        Ok(())
    }
}

impl<E: Entity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EntityStore<E> for InMemoryStore<E>
where
    E: Entity + Clone + PartialEq + Send + Sync,
{
    fn get(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(id).cloned())
    }

    fn insert(&self, entity: E) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if map.contains_key(entity.id()) {
            return Err(StoreError::Conflict(format!("id {:?} already exists", entity.id())));
        }
        self.check_unique(&map, &entity)?;
        map.insert(*entity.id(), entity);
        Ok(())
    }

    fn put(&self, entity: E) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        self.check_unique(&map, &entity)?;
        map.insert(*entity.id(), entity);
        Ok(())
    }

    fn compare_and_swap(&self, expected: &E, next: E) -> Result<Swap<E>, StoreError> {
        if expected.id() != next.id() {
            return Err(StoreError::Conflict("compare-and-swap cannot change an id".to_string()));
        }
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        match map.get(expected.id()) {
            Some(current) if current == expected => {}
            current => return Ok(Swap::Stale(current.cloned())),
        }
        self.check_unique(&map, &next)?;
        map.insert(*next.id(), next);
        Ok(Swap::Applied)
    }

    fn remove(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(id))
    }

    fn list(&self) -> Result<Vec<E>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.values().cloned().collect())
    }
}

/// Store keyed by a natural key, with upsert as its only write.
#[derive(Debug)]
pub struct KeyedStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> KeyedStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for KeyedStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> KeyedStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    /// Create or overwrite the record for `key`.
    ///
    /// `build` sees the current record (if any) and runs under the write
    /// lock, so concurrent upserts on one key converge to a single record.
    pub fn upsert_with<F>(&self, key: K, build: F) -> Result<V, StoreError>
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let next = build(map.get(&key));
        map.insert(key, next.clone());
        Ok(next)
    }

    pub fn remove(&self, key: &K) -> Result<Option<V>, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(key))
    }

    pub fn list(&self) -> Result<Vec<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.values().cloned().collect())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// Every store the workflows touch.
#[derive(Debug)]
pub struct Stores {
    pub users: InMemoryStore<Subject>,
    pub ministries: InMemoryStore<Ministry>,
    pub programs: InMemoryStore<Program>,
    pub profiles: InMemoryStore<VolunteerProfile>,
    pub events: InMemoryStore<Event>,
    pub tasks: InMemoryStore<Task>,
    pub reports: InMemoryStore<EventReport>,
    pub attendance: KeyedStore<AttendanceKey, Attendance>,
    pub evaluations: InMemoryStore<VolunteerEvaluation>,
    pub feedback: KeyedStore<(EventId, VolunteerId), EventFeedback>,
    pub announcements: InMemoryStore<Announcement>,
}

impl Default for Stores {
    fn default() -> Self {
        Self {
            users: InMemoryStore::new(),
            ministries: InMemoryStore::new(),
            programs: InMemoryStore::new(),
            profiles: InMemoryStore::with_unique("volunteer profile for this user", |a, b| {
                a.user_id == b.user_id
            }),
            events: InMemoryStore::new(),
            tasks: InMemoryStore::new(),
            reports: InMemoryStore::with_unique("report by this author for this event", |a, b| {
                a.event_id == b.event_id && a.author == b.author
            }),
            attendance: KeyedStore::new(),
            evaluations: InMemoryStore::new(),
            feedback: KeyedStore::new(),
            announcements: InMemoryStore::new(),
        }
    }
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }

    /// The profile attached to `user`, if any.
    pub fn profile_of(&self, user: UserId) -> Result<Option<VolunteerProfile>, StoreError> {
        self.profiles.find(&|p: &VolunteerProfile| p.user_id == user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccvms_auth::Role;
    use proptest::prelude::*;

    #[test]
    fn insert_rejects_duplicate_ids() {
        let store = InMemoryStore::new();
        let user = Subject::new(UserId::new(), Role::Volunteer);

        store.insert(user.clone()).unwrap();
        assert!(matches!(store.insert(user), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn one_profile_per_user() {
        let stores = Stores::new();
        let user = UserId::new();

        stores.profiles.insert(VolunteerProfile::new(VolunteerId::new(), user)).unwrap();
        let second = stores.profiles.insert(VolunteerProfile::new(VolunteerId::new(), user));
        assert!(matches!(second, Err(StoreError::Conflict(_))));
        assert_eq!(stores.profiles.list().unwrap().len(), 1);
    }

    #[test]
    fn one_report_per_event_and_author() {
        use ccvms_core::ReportId;
        use ccvms_events::ReportContent;

        let stores = Stores::new();
        let (event, author) = (EventId::new(), UserId::new());
        let report = |author| {
            EventReport::create(ReportId::new(), event, author, ReportContent::default(), "draft", chrono::Utc::now())
        };

        stores.reports.insert(report(author)).unwrap();
        assert!(matches!(stores.reports.insert(report(author)), Err(StoreError::Conflict(_))));
        stores.reports.insert(report(UserId::new())).unwrap();
        assert_eq!(stores.reports.list().unwrap().len(), 2);
    }

    #[test]
    fn compare_and_swap_detects_stale_reads() {
        let store = InMemoryStore::new();
        let user = Subject::new(UserId::new(), Role::Volunteer);
        store.insert(user.clone()).unwrap();

        let mut first = user.clone();
        first.is_suspended = true;
        assert_eq!(store.compare_and_swap(&user, first.clone()).unwrap(), Swap::Applied);

        let mut second = user.clone();
        second.is_active = false;
        assert_eq!(store.compare_and_swap(&user, second).unwrap(), Swap::Stale(Some(first)));
    }

    #[test]
    fn keyed_upsert_keeps_one_record() {
        let store: KeyedStore<u8, String> = KeyedStore::new();
        store.upsert_with(1, |_| "first".to_string()).unwrap();
        let merged = store
            .upsert_with(1, |current| format!("{}+second", current.map_or("", String::as_str)))
            .unwrap();

        assert_eq!(merged, "first+second");
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn require_reports_missing_records() {
        let store: InMemoryStore<Subject> = InMemoryStore::new();
        assert_eq!(store.require(&UserId::new()), Err(StoreError::NotFound));
    }

    proptest! {
        #[test]
        fn keyed_store_holds_one_record_per_key(keys in prop::collection::vec(0u8..16, 0..64)) {
            let store: KeyedStore<u8, usize> = KeyedStore::new();
            for key in &keys {
                store.upsert_with(*key, |current| current.map_or(1, |n| n + 1)).unwrap();
            }

            let distinct: std::collections::BTreeSet<_> = keys.iter().collect();
            prop_assert_eq!(store.len().unwrap(), distinct.len());
            for key in distinct {
                let expected = keys.iter().filter(|k| *k == key).count();
                prop_assert_eq!(store.get(key).unwrap(), Some(expected));
            }
        }
    }
}
