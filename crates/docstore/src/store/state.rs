use docstore_core::{Document, DocumentPatch};
use parking_lot::Mutex;
use tokio::sync::watch;

/// Whether the visible sequence is the library or a search result.
///
/// The query is non-empty exactly when search mode is active; the
/// constructors are the only way to build a value, so the two cannot drift.
///
/// # Examples
///
/// ```
/// use docstore::store::SearchState;
///
/// let search = SearchState::query("dune");
/// assert!(search.is_active());
/// assert_eq!(search.text(), "dune");
///
/// assert!(!SearchState::library().is_active());
/// assert_eq!(SearchState::query("   "), SearchState::library());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    query: String,
}

impl SearchState {
    /// Library view.
    pub fn library() -> Self {
        Self::default()
    }

    /// Search view for `query`. A blank query means the library view.
    pub fn query(query: impl Into<String>) -> Self {
        let query = query.into();
        if query.trim().is_empty() {
            Self::library()
        } else {
            Self { query }
        }
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    /// The active query, or `""` in library view.
    pub fn text(&self) -> &str {
        &self.query
    }
}

/// Consistent copy of every published value.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSnapshot {
    pub documents: Vec<Document>,
    pub current_document: Option<Document>,
    pub loading: bool,
    pub search: SearchState,
}

/// The UI-observable document collection.
///
/// Each value is published on its own `watch` channel. Writes that touch
/// several channels run under one publish lock, and [`snapshot`] takes the
/// same lock, so a snapshot never shows half of an update.
///
/// The loading flag is reference counted: overlapping loads and searches
/// each hold a [`LoadingGuard`], and the flag drops back to `false` only when
/// the last guard is released.
///
/// [`snapshot`]: CollectionState::snapshot
pub struct CollectionState {
    documents: watch::Sender<Vec<Document>>,
    current: watch::Sender<Option<Document>>,
    loading: watch::Sender<bool>,
    search: watch::Sender<SearchState>,
    publish: Mutex<()>,
    in_flight: Mutex<usize>,
}

impl CollectionState {
    pub fn new() -> Self {
        Self {
            documents: watch::Sender::new(Vec::new()),
            current: watch::Sender::new(None),
            loading: watch::Sender::new(false),
            search: watch::Sender::new(SearchState::library()),
            publish: Mutex::new(()),
            in_flight: Mutex::new(0),
        }
    }

    pub fn subscribe_documents(&self) -> watch::Receiver<Vec<Document>> {
        self.documents.subscribe()
    }

    pub fn subscribe_current_document(&self) -> watch::Receiver<Option<Document>> {
        self.current.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn subscribe_search(&self) -> watch::Receiver<SearchState> {
        self.search.subscribe()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.borrow().clone()
    }

    pub fn current_document(&self) -> Option<Document> {
        self.current.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn search(&self) -> SearchState {
        self.search.borrow().clone()
    }

    pub fn snapshot(&self) -> CollectionSnapshot {
        let _publish = self.publish.lock();
        CollectionSnapshot {
            documents: self.documents(),
            current_document: self.current_document(),
            loading: self.is_loading(),
            search: self.search(),
        }
    }

    /// Looks up a document by id in the sequence, then in the current
    /// document slot.
    pub fn find(&self, id: &str) -> Option<Document> {
        let _publish = self.publish.lock();
        self.documents
            .borrow()
            .iter()
            .find(|doc| doc.id == id)
            .cloned()
            .or_else(|| self.current.borrow().clone().filter(|doc| doc.id == id))
    }

    pub(crate) fn set_documents(&self, documents: Vec<Document>) {
        let _publish = self.publish.lock();
        self.documents.send_replace(documents);
    }

    /// Publishes `documents` together with a new search state.
    pub(crate) fn set_view(&self, documents: Vec<Document>, search: SearchState) {
        let _publish = self.publish.lock();
        self.search.send_if_modified(|current| replace_if_changed(current, search));
        self.documents.send_replace(documents);
    }

    pub(crate) fn set_search(&self, search: SearchState) {
        let _publish = self.publish.lock();
        self.search.send_if_modified(|current| replace_if_changed(current, search));
    }

    pub(crate) fn set_current(&self, document: Option<Document>) {
        let _publish = self.publish.lock();
        self.current.send_replace(document);
    }

    pub(crate) fn prepend(&self, document: Document) {
        let _publish = self.publish.lock();
        self.documents.send_modify(|docs| docs.insert(0, document));
    }

    /// Replaces every published copy of document `id` with `document`.
    pub(crate) fn replace(&self, id: &str, document: &Document) {
        self.restore(id, Some(document), Some(document));
    }

    /// Applies `patch` to the listed copy and to the current document, each
    /// starting from its own value.
    ///
    /// Returns the listed copy and the current document as they were before,
    /// `None` for a slot that does not hold `id`.
    pub(crate) fn patch(
        &self,
        id: &str,
        patch: &DocumentPatch,
        updated_at: &str,
    ) -> (Option<Document>, Option<Document>) {
        let _publish = self.publish.lock();

        let mut prior_listed = None;
        self.documents.send_if_modified(|docs| {
            for slot in docs.iter_mut().filter(|d| d.id == id) {
                prior_listed.get_or_insert_with(|| slot.clone());
                *slot = slot.patched(patch, updated_at.to_string());
            }
            prior_listed.is_some()
        });

        let mut prior_current = None;
        self.current.send_if_modified(|current| match current {
            Some(doc) if doc.id == id => {
                let patched = doc.patched(patch, updated_at.to_string());
                prior_current = Some(std::mem::replace(doc, patched));
                true
            }
            _ => false,
        });

        (prior_listed, prior_current)
    }

    /// Publishes `listed` in place of the listed copies of `id` and `current`
    /// in place of the current document, if it is `id`. A `None` leaves that
    /// slot alone.
    pub(crate) fn restore(&self, id: &str, listed: Option<&Document>, current: Option<&Document>) {
        let _publish = self.publish.lock();
        if let Some(listed) = listed {
            self.documents.send_if_modified(|docs| {
                let mut changed = false;
                for slot in docs.iter_mut().filter(|d| d.id == id) {
                    slot.clone_from(listed);
                    changed = true;
                }
                changed
            });
        }
        if let Some(replacement) = current {
            self.current.send_if_modified(|current| match current {
                Some(doc) if doc.id == id => {
                    doc.clone_from(replacement);
                    true
                }
                _ => false,
            });
        }
    }

    /// Removes `id` from the sequence and clears it from the current slot.
    pub(crate) fn remove(&self, id: &str) {
        let _publish = self.publish.lock();
        self.documents.send_if_modified(|docs| {
            let before = docs.len();
            docs.retain(|doc| doc.id != id);
            docs.len() != before
        });
        self.current.send_if_modified(|current| {
            if current.as_ref().is_some_and(|doc| doc.id == id) {
                *current = None;
                true
            } else {
                false
            }
        });
    }

    /// Clears the sequence, the current document and search mode.
    pub(crate) fn reset(&self) {
        let _publish = self.publish.lock();
        self.documents.send_replace(Vec::new());
        self.current.send_replace(None);
        self.search.send_replace(SearchState::library());
    }

    /// Marks an operation as in flight until the returned guard is dropped.
    pub(crate) fn begin_loading(&self) -> LoadingGuard<'_> {
        let mut in_flight = self.in_flight.lock();
        *in_flight += 1;
        if *in_flight == 1 {
            self.loading.send_replace(true);
        }
        LoadingGuard { state: self }
    }

    fn end_loading(&self) {
        let mut in_flight = self.in_flight.lock();
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.loading.send_replace(false);
        }
    }
}

impl Default for CollectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CollectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionState")
            .field("documents_count", &self.documents.borrow().len())
            .field(
                "current_document",
                &self.current.borrow().as_ref().map(|d| d.id.clone()),
            )
            .field("loading", &*self.loading.borrow())
            .field("search", &*self.search.borrow())
            .finish()
    }
}

fn replace_if_changed(current: &mut SearchState, next: SearchState) -> bool {
    if *current == next {
        false
    } else {
        *current = next;
        true
    }
}

/// Keeps the loading flag raised while alive.
pub(crate) struct LoadingGuard<'a> {
    state: &'a CollectionState,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.end_loading();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, title: &str) -> Document {
        Document::new(id, "u1", title)
    }

    #[test]
    fn test_initial_state() {
        let state = CollectionState::new();
        let snapshot = state.snapshot();
        assert!(snapshot.documents.is_empty());
        assert!(snapshot.current_document.is_none());
        assert!(!snapshot.loading);
        assert!(!snapshot.search.is_active());
    }

    #[test]
    fn test_loading_guard_is_reference_counted() {
        let state = CollectionState::new();

        let first = state.begin_loading();
        assert!(state.is_loading());
        let second = state.begin_loading();

        drop(first);
        assert!(state.is_loading(), "still loading while one guard is alive");

        drop(second);
        assert!(!state.is_loading());
    }

    #[test]
    fn test_replace_updates_sequence_and_current() {
        let state = CollectionState::new();
        state.set_documents(vec![doc("d1", "A"), doc("d2", "B")]);
        state.set_current(Some(doc("d1", "A")));

        state.replace("d1", &doc("d1", "A2"));

        assert_eq!(state.documents()[0].title, "A2");
        assert_eq!(state.documents()[1].title, "B");
        assert_eq!(state.current_document().unwrap().title, "A2");
    }

    #[test]
    fn test_replace_leaves_other_current_document() {
        let state = CollectionState::new();
        state.set_documents(vec![doc("d1", "A")]);
        state.set_current(Some(doc("d2", "B")));

        state.replace("d1", &doc("d1", "A2"));

        assert_eq!(state.current_document().unwrap().title, "B");
    }

    #[test]
    fn test_patch_and_restore_keep_slots_independent() {
        let state = CollectionState::new();
        let listed = doc("d1", "A");
        let mut opened = doc("d1", "A");
        opened.description = Some("full text".into());
        state.set_documents(vec![listed.clone()]);
        state.set_current(Some(opened.clone()));

        let patch = DocumentPatch::default().title("B");
        let (prior_listed, prior_current) = state.patch("d1", &patch, "2024-02-01T00:00:00Z");

        assert_eq!(prior_listed.as_ref(), Some(&listed));
        assert_eq!(prior_current.as_ref(), Some(&opened));
        let current = state.current_document().unwrap();
        assert_eq!(current.title, "B");
        assert_eq!(current.description.as_deref(), Some("full text"));
        assert_eq!(state.documents()[0].description, None);

        state.restore("d1", prior_listed.as_ref(), prior_current.as_ref());

        assert_eq!(state.documents(), vec![listed]);
        assert_eq!(state.current_document(), Some(opened));
    }

    #[test]
    fn test_patch_missing_document_touches_nothing() {
        let state = CollectionState::new();
        state.set_documents(vec![doc("d1", "A")]);

        let (listed, current) = state.patch("d2", &DocumentPatch::default().title("X"), "");

        assert!(listed.is_none());
        assert!(current.is_none());
        assert_eq!(state.documents()[0].title, "A");
    }

    #[test]
    fn test_remove_clears_matching_current() {
        let state = CollectionState::new();
        state.set_documents(vec![doc("d1", "A"), doc("d2", "B")]);
        state.set_current(Some(doc("d2", "B")));

        state.remove("d2");

        assert_eq!(state.documents().len(), 1);
        assert!(state.current_document().is_none());
    }

    #[test]
    fn test_find_falls_back_to_current() {
        let state = CollectionState::new();
        state.set_documents(vec![doc("d1", "A")]);
        state.set_current(Some(doc("d7", "Open")));

        assert_eq!(state.find("d1").unwrap().title, "A");
        assert_eq!(state.find("d7").unwrap().title, "Open");
        assert!(state.find("missing").is_none());
    }

    #[test]
    fn test_prepend() {
        let state = CollectionState::new();
        state.set_documents(vec![doc("d1", "A")]);
        state.prepend(doc("d2", "B"));
        let ids: Vec<_> = state.documents().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["d2", "d1"]);
    }

    #[tokio::test]
    async fn test_subscribers_observe_publishes() {
        let state = CollectionState::new();
        let mut rx = state.subscribe_documents();
        assert!(!rx.has_changed().unwrap());

        state.set_documents(vec![doc("d1", "A")]);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);
    }

    #[test]
    fn test_unchanged_search_state_does_not_notify() {
        let state = CollectionState::new();
        let mut rx = state.subscribe_search();
        rx.mark_unchanged();

        state.set_search(SearchState::library());
        assert!(!rx.has_changed().unwrap());

        state.set_search(SearchState::query("foo"));
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_reset() {
        let state = CollectionState::new();
        state.set_view(vec![doc("d1", "A")], SearchState::query("a"));
        state.set_current(Some(doc("d1", "A")));

        state.reset();

        let snapshot = state.snapshot();
        assert!(snapshot.documents.is_empty());
        assert!(snapshot.current_document.is_none());
        assert!(!snapshot.search.is_active());
    }
}
