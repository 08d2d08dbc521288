use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A document as published to UI observers.
///
/// Field names follow the backend's snake_case schema. Timestamps are kept as
/// the backend's strings; after [`crate::sanitize`] each one is either empty
/// (unknown) or a date on or after the year 2000.
///
/// # Examples
///
/// ```
/// use docstore_core::types::Document;
///
/// let doc = Document::new("d1", "u1", "Notes");
/// assert_eq!(doc.title, "Notes");
/// assert!(doc.content.is_empty());
/// assert!(!doc.is_favorite);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub content: Vec<TextBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_position: Option<ReadingPosition>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Document {
    /// Creates a document with the given identity and title and every other
    /// field empty.
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            title: title.into(),
            author: None,
            description: None,
            metadata: DocumentMetadata::default(),
            content: Vec::new(),
            tag: None,
            is_favorite: false,
            reading_position: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    /// Returns a copy with the patch's provided fields overwritten and
    /// `updated_at` set to `updated_at`.
    #[must_use]
    pub fn patched(&self, patch: &DocumentPatch, updated_at: String) -> Self {
        let mut doc = self.clone();
        if let Some(title) = &patch.title {
            doc.title.clone_from(title);
        }
        if let Some(author) = &patch.author {
            doc.author = Some(author.clone());
        }
        if let Some(tag) = &patch.tag {
            doc.tag = Some(tag.clone());
        }
        doc.updated_at = updated_at;
        doc
    }
}

/// Descriptive metadata extracted by the backend at ingestion time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DocumentSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_password: Option<bool>,
}

/// Where a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    Upload,
    Web,
    Note,
}

/// Kind of a content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBlockType {
    Paragraph,
    Heading,
    List,
    Table,
    Quote,
    Code,
}

/// One typed block of document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(rename = "type")]
    pub block_type: TextBlockType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

/// How far a user has read into a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingPosition {
    pub user_id: String,
    pub document_id: String,
    pub progress: f64,
    pub page_number: u32,
    #[serde(default)]
    pub updated_at: String,
}

/// Partial update of a document's editable details.
///
/// Only the fields that are `Some` are sent to the server and applied to the
/// optimistic local copy.
///
/// # Examples
///
/// ```
/// use docstore_core::types::DocumentPatch;
///
/// let patch = DocumentPatch::default().title("Renamed");
/// let json = serde_json::to_string(&patch).unwrap();
/// assert_eq!(json, r#"{"title":"Renamed"}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl DocumentPatch {
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.tag.is_none()
    }
}

/// A file to upload as a new document.
///
/// The body is a [`Bytes`] buffer so the HTTP client can rebuild the
/// multipart form for a retry without copying.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            content_type: None,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}
