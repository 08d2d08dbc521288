//! Common test utilities for store integration tests.
//!
//! `FakeApi` is a scripted in-memory `DocumentApi`: tests seed libraries and
//! search results, inject failures, and can hold individual calls open with a
//! gate to observe the store while a request is in flight.

#![allow(dead_code)]

use async_trait::async_trait;
use docstore::config::StoreConfig;
use docstore::{DocstoreError, Document, DocumentApi, DocumentPatch, DocumentStore, Result, UploadFile};
use docstore_core::ManualClock;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::oneshot;

/// A call received by [`FakeApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchDocuments(String),
    FetchDocument(String),
    Create(String),
    Update(String, DocumentPatch),
    Delete(String),
    Search(String),
}

/// Operation names used to target failures and gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    FetchDocuments,
    FetchDocument,
    Create,
    Update,
    Delete,
    Search,
}

#[derive(Default)]
struct Inner {
    libraries: HashMap<String, Vec<Document>>,
    documents: HashMap<String, Document>,
    search_results: HashMap<String, Vec<Document>>,
    update_responses: HashMap<String, Document>,
    failing: HashSet<Op>,
    gates: HashMap<Op, VecDeque<oneshot::Receiver<()>>>,
    calls: Vec<Call>,
    next_id: usize,
}

#[derive(Default)]
pub struct FakeApi {
    inner: Mutex<Inner>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_library(&self, user_id: &str, docs: Vec<Document>) -> &Self {
        self.inner.lock().libraries.insert(user_id.to_string(), docs);
        self
    }

    pub fn with_document(&self, doc: Document) -> &Self {
        self.inner.lock().documents.insert(doc.id.clone(), doc);
        self
    }

    pub fn with_search_results(&self, query: &str, docs: Vec<Document>) -> &Self {
        self.inner
            .lock()
            .search_results
            .insert(query.to_string(), docs);
        self
    }

    /// Overrides the document returned by a successful update of `id`.
    pub fn with_update_response(&self, id: &str, doc: Document) -> &Self {
        self.inner
            .lock()
            .update_responses
            .insert(id.to_string(), doc);
        self
    }

    pub fn fail(&self, op: Op) {
        self.inner.lock().failing.insert(op);
    }

    pub fn succeed(&self, op: Op) {
        self.inner.lock().failing.remove(&op);
    }

    /// Holds the next `op` call open until the returned sender fires or is
    /// dropped. Gates queue up in call order.
    pub fn gate(&self, op: Op) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().gates.entry(op).or_default().push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| call_op(call) == op)
            .count()
    }

    /// Records `call`, waits for its gate if one is queued, and reports
    /// whether the call should fail. The failure flag is read after the gate
    /// opens.
    async fn enter(&self, call: Call) -> Result<()> {
        let op = call_op(&call);
        let gate = {
            let mut inner = self.inner.lock();
            inner.calls.push(call);
            inner.gates.get_mut(&op).and_then(VecDeque::pop_front)
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.inner.lock().failing.contains(&op) {
            return Err(transport_error(op));
        }
        Ok(())
    }
}

fn call_op(call: &Call) -> Op {
    match call {
        Call::FetchDocuments(_) => Op::FetchDocuments,
        Call::FetchDocument(_) => Op::FetchDocument,
        Call::Create(_) => Op::Create,
        Call::Update(..) => Op::Update,
        Call::Delete(_) => Op::Delete,
        Call::Search(_) => Op::Search,
    }
}

pub fn transport_error(op: Op) -> DocstoreError {
    DocstoreError::transport(
        format!("{op:?}"),
        std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
    )
}

#[async_trait]
impl DocumentApi for FakeApi {
    async fn fetch_documents(&self, user_id: &str) -> Result<Vec<Document>> {
        self.enter(Call::FetchDocuments(user_id.to_string())).await?;
        Ok(self
            .inner
            .lock()
            .libraries
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_document(&self, id: &str) -> Result<Document> {
        self.enter(Call::FetchDocument(id.to_string())).await?;
        self.inner
            .lock()
            .documents
            .get(id)
            .cloned()
            .ok_or(DocstoreError::Status {
                operation: "fetch document".into(),
                status: 404,
            })
    }

    async fn create_document(&self, file: UploadFile) -> Result<Document> {
        self.enter(Call::Create(file.file_name.clone())).await?;
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let mut doc = Document::new(format!("new-{}", inner.next_id), "u1", file.file_name);
        doc.created_at = "2024-06-01T12:00:00Z".into();
        doc.updated_at = "0001-01-01T00:00:00Z".into();
        Ok(doc)
    }

    async fn update_document(&self, id: &str, patch: &DocumentPatch) -> Result<Document> {
        self.enter(Call::Update(id.to_string(), patch.clone())).await?;
        let inner = self.inner.lock();
        if let Some(doc) = inner.update_responses.get(id) {
            return Ok(doc.clone());
        }
        let base = inner
            .libraries
            .values()
            .flatten()
            .find(|doc| doc.id == id)
            .cloned()
            .unwrap_or_else(|| Document::new(id, "u1", ""));
        Ok(base.patched(patch, "2024-06-02T08:30:00Z".into()))
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        self.enter(Call::Delete(id.to_string())).await
    }

    async fn search_documents(&self, query: &str) -> Result<Vec<Document>> {
        self.enter(Call::Search(query.to_string())).await?;
        Ok(self
            .inner
            .lock()
            .search_results
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}

pub fn doc(id: &str, title: &str) -> Document {
    let mut doc = Document::new(id, "u1", title);
    doc.created_at = "2024-01-10T09:00:00Z".into();
    doc.updated_at = "2024-01-10T09:00:00Z".into();
    doc
}

pub fn ids(docs: &[Document]) -> Vec<String> {
    docs.iter().map(|d| d.id.clone()).collect()
}

/// Store over `api` with the default configuration and a manual clock.
pub fn store_with_clock(api: Arc<FakeApi>) -> (Arc<DocumentStore>, Arc<ManualClock>) {
    store_with_config(api, &StoreConfig::default())
}

pub fn store_with_config(
    api: Arc<FakeApi>,
    config: &StoreConfig,
) -> (Arc<DocumentStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_2024());
    let store = DocumentStore::with_clock(api, config, clock.clone());
    (Arc::new(store), clock)
}

pub fn store(api: Arc<FakeApi>) -> Arc<DocumentStore> {
    store_with_clock(api).0
}
