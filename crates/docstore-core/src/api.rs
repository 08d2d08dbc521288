use crate::error::Result;
use crate::types::{Document, DocumentPatch, UploadFile};
use async_trait::async_trait;
use parking_lot::RwLock;

/// Remote document API.
///
/// Implementors talk to the document backend. Every method fails with a
/// transport error when the request cannot be completed; callers in the store
/// clean up local state and hand the error back unchanged.
///
/// # Examples
///
/// ```no_run
/// use async_trait::async_trait;
/// use docstore_core::{DocumentApi, Document, DocumentPatch, UploadFile, Result};
///
/// struct EmptyApi;
///
/// #[async_trait]
/// impl DocumentApi for EmptyApi {
///     async fn fetch_documents(&self, _user_id: &str) -> Result<Vec<Document>> {
///         Ok(vec![])
///     }
///
///     async fn fetch_document(&self, id: &str) -> Result<Document> {
///         Ok(Document::new(id, "", ""))
///     }
///
///     async fn create_document(&self, file: UploadFile) -> Result<Document> {
///         Ok(Document::new("new", "", file.file_name))
///     }
///
///     async fn update_document(&self, id: &str, _patch: &DocumentPatch) -> Result<Document> {
///         Ok(Document::new(id, "", ""))
///     }
///
///     async fn delete_document(&self, _id: &str) -> Result<()> {
///         Ok(())
///     }
///
///     async fn search_documents(&self, _query: &str) -> Result<Vec<Document>> {
///         Ok(vec![])
///     }
/// }
/// ```
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Fetches every document owned by `user_id`.
    async fn fetch_documents(&self, user_id: &str) -> Result<Vec<Document>>;

    /// Fetches a single document with its full content.
    async fn fetch_document(&self, id: &str) -> Result<Document>;

    /// Uploads a file and returns the document the server created from it.
    async fn create_document(&self, file: UploadFile) -> Result<Document>;

    /// Applies `patch` and returns the server's updated document.
    async fn update_document(&self, id: &str, patch: &DocumentPatch) -> Result<Document>;

    async fn delete_document(&self, id: &str) -> Result<()>;

    /// Full-text search over the caller's documents.
    async fn search_documents(&self, query: &str) -> Result<Vec<Document>>;
}

/// Identity and session provider.
///
/// The store only needs [`current_user_id`](Self::current_user_id); the token
/// methods are used by [`crate::HttpDocumentApi`] to authenticate requests.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Id of the signed-in user, or `None` when signed out.
    fn current_user_id(&self) -> Option<String>;

    /// Bearer token for API requests.
    fn access_token(&self) -> Option<String>;

    /// Attempts to obtain a fresh token after the server rejected the current
    /// one. Returns the new token on success.
    async fn refresh(&self) -> Option<String> {
        None
    }
}

/// Session with a fixed user and a token that can be replaced at runtime.
///
/// # Examples
///
/// ```
/// use docstore_core::{SessionProvider, StaticSession};
///
/// let session = StaticSession::new(Some("u1".into()), Some("token".into()));
/// assert_eq!(session.current_user_id().as_deref(), Some("u1"));
///
/// session.set_user(None);
/// assert!(session.current_user_id().is_none());
/// ```
#[derive(Debug, Default)]
pub struct StaticSession {
    user_id: RwLock<Option<String>>,
    token: RwLock<Option<String>>,
}

impl StaticSession {
    pub fn new(user_id: Option<String>, token: Option<String>) -> Self {
        Self {
            user_id: RwLock::new(user_id),
            token: RwLock::new(token),
        }
    }

    /// A signed-out session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn set_user(&self, user_id: Option<String>) {
        *self.user_id.write() = user_id;
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.read().clone()
    }

    fn access_token(&self) -> Option<String> {
        self.token.read().clone()
    }
}
