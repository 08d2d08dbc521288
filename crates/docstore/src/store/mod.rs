//! Document store.
//!
//! This module provides the stateful layer between the UI and the remote
//! document API:
//! - `state`: the published collection (documents, current document,
//!   loading flag, search mode)
//! - `library`: library loading and the optimistic mutation controller
//! - `search`: single-document loading and search mode

mod library;
mod search;
mod state;

pub use state::{CollectionSnapshot, CollectionState, SearchState};

use crate::config::StoreConfig;
use dashmap::DashMap;
use docstore_core::{CacheEntry, CacheEntryStore, Clock, Document, DocumentApi, SystemClock};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Client-side document store.
///
/// Owns the published [`CollectionState`] and its derived library cache, and
/// mediates every read and write against a [`DocumentApi`]. Operations are
/// `async` and may overlap; the store keeps them from corrupting each other:
///
/// - a library load started for a user that has since been replaced by
///   another user discards its response,
/// - a search superseded by another search or by leaving search mode
///   discards its results,
/// - edits and deletes on the same document id run one at a time.
///
/// # Examples
///
/// ```no_run
/// use docstore::config::StoreConfig;
/// use docstore::DocumentStore;
/// use docstore_core::{ClientOptions, HttpDocumentApi, StaticSession};
/// use std::sync::Arc;
///
/// # async fn example() -> docstore_core::Result<()> {
/// let session = Arc::new(StaticSession::new(Some("u1".into()), Some("token".into())));
/// let api = HttpDocumentApi::new("https://api.example.com", session, ClientOptions::default())?;
/// let store = DocumentStore::new(Arc::new(api), &StoreConfig::default());
///
/// let mut documents = store.subscribe_documents();
/// store.load("u1", false).await?;
/// println!("{} documents", documents.borrow_and_update().len());
/// # Ok(())
/// # }
/// ```
pub struct DocumentStore {
    api: Arc<dyn DocumentApi>,
    clock: Arc<dyn Clock>,
    cache: CacheEntryStore,
    cache_enabled: bool,
    state: CollectionState,
    /// User whose library the published view belongs to.
    active_user: Mutex<Option<String>>,
    /// Incremented whenever the active user changes.
    user_generation: AtomicU64,
    /// Incremented on every search start and every return to library view.
    view_sequence: AtomicU64,
    /// Per-document locks serializing edits and deletes.
    edit_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl DocumentStore {
    /// Creates a store using the system clock.
    pub fn new(api: Arc<dyn DocumentApi>, config: &StoreConfig) -> Self {
        Self::with_clock(api, config, Arc::new(SystemClock))
    }

    /// Creates a store with an explicit time source.
    pub fn with_clock(api: Arc<dyn DocumentApi>, config: &StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            cache: CacheEntryStore::new(config.cache.ttl(), Arc::clone(&clock)),
            cache_enabled: config.cache.enabled,
            clock,
            state: CollectionState::new(),
            active_user: Mutex::new(None),
            user_generation: AtomicU64::new(0),
            view_sequence: AtomicU64::new(0),
            edit_locks: DashMap::new(),
        }
    }

    pub fn subscribe_documents(&self) -> watch::Receiver<Vec<Document>> {
        self.state.subscribe_documents()
    }

    pub fn subscribe_current_document(&self) -> watch::Receiver<Option<Document>> {
        self.state.subscribe_current_document()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.state.subscribe_loading()
    }

    pub fn subscribe_search(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe_search()
    }

    /// Read access to the published collection.
    pub fn state(&self) -> &CollectionState {
        &self.state
    }

    pub fn snapshot(&self) -> CollectionSnapshot {
        self.state.snapshot()
    }

    /// Read-only view of the library cache shadowing the published
    /// collection.
    pub fn cache(&self) -> CacheView<'_> {
        CacheView { cache: &self.cache }
    }

    /// User the published library belongs to, if any load has run.
    pub fn active_user(&self) -> Option<String> {
        self.active_user.lock().clone()
    }

    /// Records `user_id` as the active user and returns the generation the
    /// caller's load belongs to.
    ///
    /// Switching users invalidates the cache and starts a new generation.
    fn enter_user(&self, user_id: &str) -> u64 {
        let mut active = self.active_user.lock();
        if active.as_deref() != Some(user_id) {
            if let Some(previous) = active.as_deref() {
                tracing::info!("active user changed from {} to {}", previous, user_id);
            }
            *active = Some(user_id.to_string());
            self.cache.invalidate();
            self.user_generation.fetch_add(1, Ordering::SeqCst);
        }
        self.user_generation.load(Ordering::SeqCst)
    }

    fn is_current_generation(&self, generation: u64) -> bool {
        self.user_generation.load(Ordering::SeqCst) == generation
    }

    /// Starts a new view (search or library) and returns its sequence number.
    fn next_view(&self) -> u64 {
        self.view_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current_view(&self, sequence: u64) -> bool {
        self.view_sequence.load(Ordering::SeqCst) == sequence
    }

    fn edit_lock<'a>(&'a self, id: &'a str) -> EditLockEntry<'a> {
        let lock = Arc::clone(
            self.edit_locks
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .value(),
        );
        EditLockEntry {
            locks: &self.edit_locks,
            id,
            lock,
        }
    }

    /// Runs `f` while holding the edit lock for document `id`.
    ///
    /// The lock is released and its table entry cleaned up even if the
    /// returned future is dropped before completing.
    async fn with_edit_lock<F, Fut, T>(&self, id: &str, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let entry = self.edit_lock(id);
        let _guard = entry.lock.lock().await;
        f().await
    }

    #[cfg(test)]
    fn edit_lock_count(&self) -> usize {
        self.edit_locks.len()
    }
}

/// One caller's handle on a per-document edit lock.
///
/// Dropping the last handle for an id removes the id from the lock table.
struct EditLockEntry<'a> {
    locks: &'a DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    id: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for EditLockEntry<'_> {
    fn drop(&mut self) {
        // The table's reference plus ours: nobody else holds or waits.
        self.locks.remove_if(self.id, |_, lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2
        });
    }
}

/// Read-only view of a store's library cache.
///
/// Unlike [`CacheEntryStore::get`], looking up another user never drops the
/// entry.
#[derive(Debug, Clone, Copy)]
pub struct CacheView<'a> {
    cache: &'a CacheEntryStore,
}

impl CacheView<'_> {
    /// The cached library of `user_id`, if it is the owner and the entry is
    /// still fresh.
    pub fn get(&self, user_id: &str) -> Option<CacheEntry> {
        self.cache.peek(user_id)
    }

    pub fn owner(&self) -> Option<String> {
        self.cache.owner()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.cache.ttl()
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("state", &self.state)
            .field("cache", &self.cache)
            .field("cache_enabled", &self.cache_enabled)
            .field("active_user", &*self.active_user.lock())
            .field("pending_edits", &self.edit_locks.len())
            .finish()
    }
}
