use crate::clock::Clock;
use crate::types::Document;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Default time-to-live of a cached library: five minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Snapshot of one user's library as last fetched from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub documents: Vec<Document>,
    pub owner_user_id: String,
    pub fetched_at_millis: i64,
}

/// Single-slot cache of the most recently fetched library.
///
/// Holds at most one [`CacheEntry`]. An entry is served only to its owner and
/// only while it is younger than the configured TTL. Asking for a different
/// user drops the entry, since a TTL is only meaningful within one user's
/// session.
///
/// Search results are never stored here; the entry always reflects the
/// library view.
///
/// # Examples
///
/// ```
/// use docstore_core::cache::CacheEntryStore;
/// use docstore_core::clock::ManualClock;
/// use docstore_core::types::Document;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = Arc::new(ManualClock::starting_2024());
/// let cache = CacheEntryStore::new(Duration::from_secs(300), clock.clone());
///
/// cache.put(vec![Document::new("d1", "u1", "A")], "u1");
/// assert!(cache.get("u1").is_some());
///
/// clock.advance(Duration::from_secs(300));
/// assert!(cache.get("u1").is_none());
/// ```
pub struct CacheEntryStore {
    entry: Mutex<Option<CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CacheEntryStore {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: Mutex::new(None),
            ttl,
            clock,
        }
    }

    /// Returns the cached entry if it belongs to `user_id` and is still fresh.
    ///
    /// An entry owned by another user is invalidated before returning `None`.
    pub fn get(&self, user_id: &str) -> Option<CacheEntry> {
        let mut slot = self.entry.lock();
        let entry = slot.as_ref()?;

        if entry.owner_user_id != user_id {
            tracing::debug!(
                "cache owner {} differs from {}, invalidating",
                entry.owner_user_id,
                user_id
            );
            *slot = None;
            return None;
        }

        if !self.is_fresh(entry) {
            tracing::debug!("cache entry for {} is stale", user_id);
            return None;
        }

        Some(entry.clone())
    }

    /// Like [`get`](Self::get), but leaves an entry owned by another user in
    /// place.
    pub fn peek(&self, user_id: &str) -> Option<CacheEntry> {
        self.entry
            .lock()
            .as_ref()
            .filter(|entry| entry.owner_user_id == user_id && self.is_fresh(entry))
            .cloned()
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        let age = self.clock.now_millis() - entry.fetched_at_millis;
        age >= 0 && (age as u128) < self.ttl.as_millis()
    }

    /// Replaces the entry with `documents` owned by `user_id`, fetched now.
    pub fn put(&self, documents: Vec<Document>, user_id: &str) {
        let entry = CacheEntry {
            documents,
            owner_user_id: user_id.to_string(),
            fetched_at_millis: self.clock.now_millis(),
        };
        *self.entry.lock() = Some(entry);
    }

    /// Drops the entry, if any.
    pub fn invalidate(&self) {
        *self.entry.lock() = None;
    }

    /// Applies a local mutation to the cached documents, keeping owner and
    /// fetch time.
    ///
    /// Returns `false` if there is no entry to update.
    pub fn update_documents<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut Vec<Document>),
    {
        match self.entry.lock().as_mut() {
            Some(entry) => {
                f(&mut entry.documents);
                true
            }
            None => false,
        }
    }

    /// Owner of the current entry, fresh or not.
    pub fn owner(&self) -> Option<String> {
        self.entry
            .lock()
            .as_ref()
            .map(|entry| entry.owner_user_id.clone())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns `true` if the store holds no entry.
    pub fn is_empty(&self) -> bool {
        self.entry.lock().is_none()
    }
}

impl std::fmt::Debug for CacheEntryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.entry.lock();
        f.debug_struct("CacheEntryStore")
            .field("ttl", &self.ttl)
            .field("owner", &slot.as_ref().map(|e| &e.owner_user_id))
            .field("documents", &slot.as_ref().map_or(0, |e| e.documents.len()))
            .finish()
    }
}
