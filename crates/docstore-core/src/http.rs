//! reqwest-backed implementation of [`DocumentApi`].
//!
//! Endpoints:
//! - `GET /documents/user/{user_id}` lists a user's library
//! - `GET /documents/{id}` fetches one document
//! - `POST /documents` uploads a file (multipart, field `file`)
//! - `PUT /documents/{id}` updates title, author or tag
//! - `DELETE /documents/{id}` deletes a document
//! - `GET /documents/search?q=` searches the caller's documents
//!
//! Requests carry the session's bearer token. A 401 triggers one session
//! refresh and a single retry with the new token.

use crate::api::{DocumentApi, SessionProvider};
use crate::error::{DocstoreError, Result};
use crate::types::{Document, DocumentPatch, UploadFile};
use crate::wire::{decode_document, decode_documents};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use std::sync::Arc;
use std::time::Duration;

/// Connection settings for [`HttpDocumentApi`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub user_agent: String,
    /// Permit `http://` base URLs (local development and tests).
    pub allow_insecure: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("docstore/", env!("CARGO_PKG_VERSION")).to_string(),
            allow_insecure: false,
        }
    }
}

/// Validates and normalizes the API base URL.
///
/// Only HTTPS is accepted unless `allow_insecure` is set. A trailing slash is
/// removed so endpoint paths can be appended directly.
fn normalize_base_url(url: &str, allow_insecure: bool) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    let secure = url.starts_with("https://");
    let plain = url.starts_with("http://");
    if !secure && !(allow_insecure && plain) {
        return Err(DocstoreError::InvalidUrl(format!(
            "URL must use HTTPS: {}",
            url
        )));
    }
    let host = url.split_once("://").map_or("", |(_, rest)| rest);
    if host.is_empty() {
        return Err(DocstoreError::InvalidUrl(format!("missing host: {}", url)));
    }
    Ok(url.to_string())
}

/// Document API client over HTTP.
///
/// # Examples
///
/// ```no_run
/// use docstore_core::{ClientOptions, DocumentApi, HttpDocumentApi, StaticSession};
/// use std::sync::Arc;
///
/// # async fn example() -> docstore_core::Result<()> {
/// let session = Arc::new(StaticSession::new(Some("u1".into()), Some("token".into())));
/// let api = HttpDocumentApi::new("https://api.example.com", session, ClientOptions::default())?;
///
/// let docs = api.fetch_documents("u1").await?;
/// println!("{} documents", docs.len());
/// # Ok(())
/// # }
/// ```
pub struct HttpDocumentApi {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
}

impl HttpDocumentApi {
    pub fn new(
        base_url: &str,
        session: Arc<dyn SessionProvider>,
        options: ClientOptions,
    ) -> Result<Self> {
        let base_url = normalize_base_url(base_url, options.allow_insecure)?;
        let client = Client::builder()
            .user_agent(options.user_agent)
            .timeout(options.timeout)
            .build()
            .map_err(|e| DocstoreError::transport("build HTTP client", e))?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn document_url(&self, id: &str) -> String {
        self.url(&format!("/documents/{}", urlencoding::encode(id)))
    }

    /// Sends a request built by `build`, retrying once with a refreshed token
    /// if the server answers 401.
    ///
    /// `build` is called again for the retry because request bodies such as
    /// multipart forms cannot be cloned.
    async fn send<F>(&self, operation: &str, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> Result<RequestBuilder> + Send + Sync,
    {
        let token = self.session.access_token();
        let response = self
            .dispatch(operation, build(&self.client)?, token.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            match self.session.refresh().await {
                Some(token) => {
                    tracing::debug!("{}: retrying after session refresh", operation);
                    let retry = self
                        .dispatch(operation, build(&self.client)?, Some(&token))
                        .await?;
                    return ensure_success(operation, retry);
                }
                None => tracing::warn!("{}: unauthorized and session refresh failed", operation),
            }
        }

        ensure_success(operation, response)
    }

    async fn dispatch(
        &self,
        operation: &str,
        request: RequestBuilder,
        token: Option<&str>,
    ) -> Result<Response> {
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        request
            .send()
            .await
            .map_err(|e| DocstoreError::transport(operation, e))
    }

    async fn read_body(operation: &str, response: Response) -> Result<bytes::Bytes> {
        response
            .bytes()
            .await
            .map_err(|e| DocstoreError::transport(operation, e))
    }
}

fn ensure_success(operation: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(DocstoreError::Status {
            operation: operation.to_string(),
            status: status.as_u16(),
        })
    }
}

fn upload_form(file: &UploadFile) -> Result<Form> {
    let mut part = Part::stream(file.bytes.clone()).file_name(file.file_name.clone());
    if let Some(content_type) = &file.content_type {
        part = part
            .mime_str(content_type)
            .map_err(|e| DocstoreError::transport("upload document", e))?;
    }
    Ok(Form::new().part("file", part))
}

#[async_trait]
impl DocumentApi for HttpDocumentApi {
    async fn fetch_documents(&self, user_id: &str) -> Result<Vec<Document>> {
        const OP: &str = "fetch documents";
        let url = self.url(&format!("/documents/user/{}", urlencoding::encode(user_id)));
        let response = self.send(OP, |c| Ok(c.get(&url))).await?;
        decode_documents(&Self::read_body(OP, response).await?)
    }

    async fn fetch_document(&self, id: &str) -> Result<Document> {
        const OP: &str = "fetch document";
        let url = self.document_url(id);
        let response = self.send(OP, |c| Ok(c.get(&url))).await?;
        decode_document(&Self::read_body(OP, response).await?)
    }

    async fn create_document(&self, file: UploadFile) -> Result<Document> {
        const OP: &str = "upload document";
        let url = self.url("/documents");
        let response = self
            .send(OP, |c| Ok(c.post(&url).multipart(upload_form(&file)?)))
            .await?;
        decode_document(&Self::read_body(OP, response).await?)
    }

    async fn update_document(&self, id: &str, patch: &DocumentPatch) -> Result<Document> {
        const OP: &str = "update document";
        let url = self.document_url(id);
        let response = self.send(OP, |c| Ok(c.put(&url).json(patch))).await?;
        decode_document(&Self::read_body(OP, response).await?)
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        const OP: &str = "delete document";
        let url = self.document_url(id);
        self.send(OP, |c| Ok(c.delete(&url))).await?;
        Ok(())
    }

    async fn search_documents(&self, query: &str) -> Result<Vec<Document>> {
        const OP: &str = "search documents";
        let url = self.url("/documents/search");
        let response = self
            .send(OP, |c| {
                Ok(c.get(&url)
                    .query(&[("q", query)])
                    .header(header::ACCEPT, "application/json"))
            })
            .await?;
        decode_documents(&Self::read_body(OP, response).await?)
    }
}
