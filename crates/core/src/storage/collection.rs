use super::{namespaced_key, KeyValueStore, StoreError};
use crate::domain::records::{Favorite, ScheduledPost};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// An item kept in a persisted, insertion-ordered collection.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Collection name; the storage key is derived from it.
    const COLLECTION: &'static str;

    fn id(&self) -> u64;

    fn assign_id(&mut self, id: u64);
}

impl Record for Favorite {
    const COLLECTION: &'static str = "favorites";

    fn id(&self) -> u64 {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}

impl Record for ScheduledPost {
    const COLLECTION: &'static str = "scheduled_posts";

    fn id(&self) -> u64 {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("{collection} item {id} not found")]
    NotFound { collection: &'static str, id: u64 },

    #[error("failed to persist {key}: {source}")]
    Persistence {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("no {collection} id left above the highest stored one")]
    IdsExhausted { collection: &'static str },

    #[error("stored value for {key} is not a valid list: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Millisecond timestamps, bumped past the last issued id when the clock has not moved.
#[derive(Debug, Clone, Default)]
struct IdSequence {
    last: u64,
}

impl IdSequence {
    /// `None` once the last id is `u64::MAX`.
    fn next(&mut self) -> Option<u64> {
        let bumped = self.last.checked_add(1)?;
        let now = Utc::now().timestamp_millis().max(0) as u64;
        self.last = now.max(bumped);
        Some(self.last)
    }
}

/// In-memory list that writes itself through to a [`KeyValueStore`] on every mutation.
///
/// The in-memory list is authoritative: if a write fails the mutation is kept and the
/// failure is returned as [`CollectionError::Persistence`].
#[derive(Debug, Clone)]
pub struct Collection<T> {
    key: String,
    items: Vec<T>,
    ids: IdSequence,
}

impl<T: Record> Collection<T> {
    pub fn empty() -> Self {
        Self {
            key: namespaced_key(T::COLLECTION),
            items: Vec::new(),
            ids: IdSequence::default(),
        }
    }

    pub fn load(kv: &dyn KeyValueStore) -> Result<Self, CollectionError> {
        let mut out = Self::empty();
        let stored = kv.get(&out.key).map_err(|source| CollectionError::Persistence {
            key: out.key.clone(),
            source,
        })?;
        if let Some(raw) = stored {
            out.items =
                serde_json::from_str(&raw).map_err(|source| CollectionError::Corrupt {
                    key: out.key.clone(),
                    source,
                })?;
        }
        out.ids.last = out.items.iter().map(|item| item.id()).max().unwrap_or(0);
        Ok(out)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn list(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    /// Assigns a fresh id, appends, and persists. Returns the stored item.
    pub fn add(&mut self, kv: &mut dyn KeyValueStore, mut item: T) -> Result<T, CollectionError> {
        let id = self.ids.next().ok_or(CollectionError::IdsExhausted {
            collection: T::COLLECTION,
        })?;
        item.assign_id(id);
        self.items.push(item.clone());
        self.persist(kv)?;
        Ok(item)
    }

    pub fn update<F>(
        &mut self,
        kv: &mut dyn KeyValueStore,
        id: u64,
        mutate: F,
    ) -> Result<T, CollectionError>
    where
        F: FnOnce(&mut T),
    {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or(CollectionError::NotFound {
                collection: T::COLLECTION,
                id,
            })?;
        mutate(item);
        let updated = item.clone();
        self.persist(kv)?;
        Ok(updated)
    }

    pub fn remove(&mut self, kv: &mut dyn KeyValueStore, id: u64) -> Result<T, CollectionError> {
        let idx = self
            .items
            .iter()
            .position(|item| item.id() == id)
            .ok_or(CollectionError::NotFound {
                collection: T::COLLECTION,
                id,
            })?;
        let removed = self.items.remove(idx);
        self.persist(kv)?;
        Ok(removed)
    }

    fn persist(&self, kv: &mut dyn KeyValueStore) -> Result<(), CollectionError> {
        let res = serde_json::to_string(&self.items)
            .map_err(StoreError::from)
            .and_then(|value| kv.set(&self.key, &value));
        if let Err(source) = res {
            tracing::warn!(
                key = %self.key,
                len = self.items.len(),
                error = %source,
                "collection write-through failed; keeping in-memory state"
            );
            return Err(CollectionError::Persistence {
                key: self.key.clone(),
                source,
            });
        }
        Ok(())
    }
}
