//! Named-service registry with first-access memoization.
//!
//! Maps a string id to either a resolved value or a still-deferred
//! [`Lazy`]. The first `get` of a deferred entry forces it and replaces
//! the entry with the result, so every later `get` returns the same
//! value. `set` overwrites unconditionally, including resetting a
//! resolved entry back to deferred.
//!
//! Locking is read-mostly and never held across a force (forcing may
//! re-enter the registry for nested services). Concurrent first-forces of
//! the same id are not coordinated; the last writer wins, matching the
//! single-writer usage this container assumes.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{AnbarError, Result, UnknownServiceError};
use crate::lazy::Lazy;
use crate::value::Value;

/// What a registry slot holds.
#[derive(Clone)]
pub enum Entry {
    Resolved(Value),
    Deferred(Lazy),
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Entry::Resolved(value)
    }
}

impl From<Lazy> for Entry {
    fn from(lazy: Lazy) -> Self {
        Entry::Deferred(lazy)
    }
}

/// Maps service ids to resolved or deferred values.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, Entry>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value or lazy under `id`, overwriting any prior entry.
    pub fn set(&self, id: impl Into<String>, entry: impl Into<Entry>) {
        let id = id.into();
        debug!(id = %id, "service set");
        self.entries.write().insert(id, entry.into());
    }

    /// Whether `id` has an entry, resolved or not.
    pub fn has(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Registered ids, unordered.
    pub fn ids(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Returns the service under `id`, forcing and caching it on first
    /// access.
    ///
    /// # Errors
    /// [`AnbarError::UnknownService`] if `id` was never set.
    pub fn get(&self, id: &str) -> Result<Value> {
        let entry = self.entries.read().get(id).cloned();

        match entry {
            Some(Entry::Resolved(value)) => {
                trace!(id = %id, "service hit");
                Ok(value)
            }
            Some(Entry::Deferred(lazy)) => {
                debug!(id = %id, "forcing deferred service");
                let value = lazy.force()?;
                self.entries
                    .write()
                    .insert(id.to_owned(), Entry::Resolved(Value::clone(&value)));
                Ok(value)
            }
            None => Err(AnbarError::UnknownService(UnknownServiceError {
                id: id.to_owned(),
                suggestions: anbar_support::closest_matches(id, &self.ids(), 3),
            })),
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}
