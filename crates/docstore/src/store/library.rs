//! Library loading and optimistic mutations.

use super::{DocumentStore, SearchState};
use docstore_core::{
    Document, DocumentPatch, Result, SessionProvider, UploadFile, sanitize, sanitize_all,
};
use std::sync::atomic::Ordering;

/// An optimistic edit awaiting server confirmation.
///
/// Holds the pre-edit value of every slot the edit touched: the listed copy,
/// the current document and the cached library copy. Each is restored from
/// its own snapshot, so a current document opened with full content keeps it.
///
/// Dropping a pending edit without [`confirm`](Self::confirm) rolls it back,
/// including when the update future itself is dropped mid-flight.
struct PendingMutation<'a> {
    store: &'a DocumentStore,
    target_id: &'a str,
    prior_listed: Option<Document>,
    prior_current: Option<Document>,
    prior_cached: Option<Document>,
    confirmed: bool,
}

impl PendingMutation<'_> {
    fn confirm(mut self) {
        self.confirmed = true;
    }

    fn is_published(&self) -> bool {
        self.prior_listed.is_some() || self.prior_current.is_some() || self.prior_cached.is_some()
    }
}

impl Drop for PendingMutation<'_> {
    fn drop(&mut self) {
        if self.confirmed || !self.is_published() {
            return;
        }
        tracing::debug!("rolling back optimistic update of {}", self.target_id);
        self.store.state.restore(
            self.target_id,
            self.prior_listed.as_ref(),
            self.prior_current.as_ref(),
        );
        if let Some(prior) = &self.prior_cached {
            self.store.replace_cached(self.target_id, prior);
        }
    }
}

impl DocumentStore {
    /// Loads the library of `user_id`.
    ///
    /// Unless `force_refresh` is set, a fresh cache entry for the same user is
    /// published without a network call. Otherwise the library is fetched,
    /// sanitized, published and cached. Either way the store leaves search
    /// mode.
    ///
    /// On failure an empty library is published and the error is returned.
    /// A response that arrives after another user's load has started is
    /// returned to the caller but neither published nor cached.
    pub async fn load(&self, user_id: &str, force_refresh: bool) -> Result<Vec<Document>> {
        let generation = self.enter_user(user_id);

        if !force_refresh
            && self.cache_enabled
            && let Some(entry) = self.cache.get(user_id)
        {
            tracing::debug!(
                "serving {} cached documents for {}",
                entry.documents.len(),
                user_id
            );
            self.next_view();
            self.state
                .set_view(entry.documents.clone(), SearchState::library());
            return Ok(entry.documents);
        }

        tracing::info!("loading documents for {}", user_id);
        let _loading = self.state.begin_loading();
        let view = self.next_view();
        self.state.set_search(SearchState::library());

        match self.api.fetch_documents(user_id).await {
            Ok(docs) => {
                let docs = sanitize_all(docs);
                if !self.is_current_generation(generation) {
                    tracing::debug!("discarding library response for previous user {}", user_id);
                    return Ok(docs);
                }
                self.cache.put(docs.clone(), user_id);
                if self.is_current_view(view) {
                    self.state.set_documents(docs.clone());
                } else {
                    tracing::debug!("search started during load, library cached only");
                }
                Ok(docs)
            }
            Err(e) => {
                tracing::error!("failed to load documents for {}: {}", user_id, e);
                if self.is_current_generation(generation) && self.is_current_view(view) {
                    self.state.set_documents(Vec::new());
                }
                Err(e)
            }
        }
    }

    /// Loads the library of the session's current user.
    ///
    /// With nobody signed in, the published state and the cache are cleared
    /// and an empty list is returned.
    pub async fn load_for_session(
        &self,
        session: &dyn SessionProvider,
        force_refresh: bool,
    ) -> Result<Vec<Document>> {
        match session.current_user_id() {
            Some(user_id) => self.load(&user_id, force_refresh).await,
            None => {
                tracing::debug!("no signed-in user, clearing document state");
                self.reset();
                Ok(Vec::new())
            }
        }
    }

    /// Forgets the active user, the cached library and everything published.
    ///
    /// Loads still in flight for the previous user discard their responses.
    pub fn reset(&self) {
        *self.active_user.lock() = None;
        self.user_generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate();
        self.next_view();
        self.state.reset();
    }

    /// Uploads a file and puts the created document at the front of the
    /// collection.
    ///
    /// Nothing is published before the server confirms. On failure the
    /// collection is untouched and the error is returned.
    pub async fn upload(&self, file: UploadFile) -> Result<Document> {
        let generation = self.user_generation.load(Ordering::SeqCst);
        let file_name = file.file_name.clone();

        match self.api.create_document(file).await {
            Ok(doc) => {
                let doc = sanitize(doc);
                if self.is_current_generation(generation) {
                    self.state.prepend(doc.clone());
                    self.cache.update_documents(|docs| docs.insert(0, doc.clone()));
                } else {
                    tracing::debug!("user changed during upload of {}, not publishing", file_name);
                }
                Ok(doc)
            }
            Err(e) => {
                tracing::error!("failed to upload {}: {}", file_name, e);
                Err(e)
            }
        }
    }

    /// Deletes a document on the server, then removes it locally.
    ///
    /// Not optimistic: if the server call fails the document stays published.
    pub async fn delete_document(&self, id: &str) -> Result<()> {
        self.with_edit_lock(id, || async move {
            match self.api.delete_document(id).await {
                Ok(()) => {
                    self.state.remove(id);
                    self.cache.update_documents(|docs| docs.retain(|doc| doc.id != id));
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("failed to delete document {}: {}", id, e);
                    Err(e)
                }
            }
        })
        .await
    }

    /// Updates a document's title, author or tag optimistically.
    ///
    /// The patch is applied (with `updated_at` set to now) to the listed
    /// copy, the current document and the cached library copy before the
    /// server is called, each starting from its own value. The server's
    /// response then replaces all of them; on failure each one is restored to
    /// its own pre-edit value and the error is returned. If the document is
    /// not held locally, only the server call and its confirmation happen.
    ///
    /// Edits to the same document run one after another, so a rollback
    /// always restores the state from before its own edit.
    pub async fn update_document_details(
        &self,
        id: &str,
        patch: &DocumentPatch,
    ) -> Result<Document> {
        self.with_edit_lock(id, || async move {
            let pending = self.publish_speculative(id, patch);

            match self.api.update_document(id, patch).await {
                Ok(doc) => {
                    pending.confirm();
                    let doc = sanitize(doc);
                    self.state.replace(id, &doc);
                    self.replace_cached(id, &doc);
                    Ok(doc)
                }
                Err(e) => {
                    tracing::error!("failed to update document {}: {}", id, e);
                    drop(pending);
                    Err(e)
                }
            }
        })
        .await
    }

    /// Publishes the patched copies of `id` and records what they replaced.
    fn publish_speculative<'a>(
        &'a self,
        id: &'a str,
        patch: &DocumentPatch,
    ) -> PendingMutation<'a> {
        let updated_at = self.clock.now_rfc3339();
        let (prior_listed, prior_current) = self.state.patch(id, patch, &updated_at);

        let mut prior_cached = None;
        self.cache.update_documents(|docs| {
            for slot in docs.iter_mut().filter(|d| d.id == id) {
                prior_cached.get_or_insert_with(|| slot.clone());
                *slot = slot.patched(patch, updated_at.clone());
            }
        });

        let pending = PendingMutation {
            store: self,
            target_id: id,
            prior_listed,
            prior_current,
            prior_cached,
            confirmed: false,
        };
        if pending.is_published() {
            tracing::debug!("optimistically updated {}", id);
        }
        pending
    }

    /// Replaces the cached library copy of `id`, if there is one.
    fn replace_cached(&self, id: &str, doc: &Document) {
        self.cache.update_documents(|docs| {
            for slot in docs.iter_mut().filter(|d| d.id == id) {
                slot.clone_from(doc);
            }
        });
    }
}
