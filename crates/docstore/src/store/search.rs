//! Single-document loading and search mode.

use super::{DocumentStore, SearchState};
use docstore_core::{Document, Result, sanitize, sanitize_all};

impl DocumentStore {
    /// Fetches one document and publishes it as the current document.
    ///
    /// The collection and the cache are left alone. On failure the current
    /// document is cleared and the error is returned.
    pub async fn load_one(&self, id: &str) -> Result<Document> {
        match self.api.fetch_document(id).await {
            Ok(doc) => {
                let doc = sanitize(doc);
                self.state.set_current(Some(doc.clone()));
                Ok(doc)
            }
            Err(e) => {
                tracing::error!("failed to load document {}: {}", id, e);
                self.state.set_current(None);
                Err(e)
            }
        }
    }

    /// Switches to search mode and publishes the results for `query`.
    ///
    /// Results replace the visible collection but are never cached, so a
    /// later library load is not affected by them. On failure an empty result
    /// is published (search mode stays on) and the error is returned. A blank
    /// query leaves search mode instead, see [`clear_search`].
    ///
    /// If another search starts, or the store returns to the library view,
    /// before the results arrive, they are returned but not published.
    ///
    /// [`clear_search`]: DocumentStore::clear_search
    pub async fn search(&self, query: &str) -> Result<Vec<Document>> {
        let search = SearchState::query(query);
        if !search.is_active() {
            return Ok(self.clear_search());
        }

        let _loading = self.state.begin_loading();
        let view = self.next_view();
        self.state.set_search(search);

        match self.api.search_documents(query).await {
            Ok(docs) => {
                let docs = sanitize_all(docs);
                if self.is_current_view(view) {
                    self.state.set_documents(docs.clone());
                } else {
                    tracing::debug!("discarding superseded results for {:?}", query);
                }
                Ok(docs)
            }
            Err(e) => {
                tracing::error!("failed to search documents for {:?}: {}", query, e);
                if self.is_current_view(view) {
                    self.state.set_documents(Vec::new());
                }
                Err(e)
            }
        }
    }

    /// Leaves search mode and restores the library view from the cache.
    ///
    /// Returns the restored library. If there is no fresh cached library for
    /// the active user, an empty collection is published and the caller is
    /// expected to [`load`](DocumentStore::load) again.
    pub fn clear_search(&self) -> Vec<Document> {
        self.next_view();
        let library = self
            .active_user()
            .filter(|_| self.cache_enabled)
            .and_then(|user_id| self.cache.get(&user_id))
            .map(|entry| entry.documents)
            .unwrap_or_default();

        tracing::debug!("leaving search mode, restoring {} documents", library.len());
        self.state.set_view(library.clone(), SearchState::library());
        library
    }
}
