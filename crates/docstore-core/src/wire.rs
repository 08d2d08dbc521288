//! Strict decoding of backend document responses.
//!
//! The backend may send `null` or omit any optional field. Each one is
//! defaulted explicitly here; a value of the wrong type is a decode error
//! rather than a silent coercion.

use crate::error::{DocstoreError, Result};
use crate::types::{Document, DocumentMetadata, ReadingPosition, TextBlock};
use serde::Deserialize;

/// Document as sent by the backend.
#[derive(Deserialize)]
struct WireDocument {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    metadata: Option<DocumentMetadata>,
    #[serde(default)]
    content: Option<Vec<TextBlock>>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    is_favorite: Option<bool>,
    #[serde(default)]
    reading_position: Option<ReadingPosition>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl From<WireDocument> for Document {
    fn from(wire: WireDocument) -> Self {
        Self {
            id: wire.id.unwrap_or_default(),
            user_id: wire.user_id.unwrap_or_default(),
            title: wire.title.unwrap_or_default(),
            author: non_empty(wire.author),
            description: non_empty(wire.description),
            metadata: wire.metadata.unwrap_or_default(),
            content: wire.content.unwrap_or_default(),
            tag: non_empty(wire.tag),
            is_favorite: wire.is_favorite.unwrap_or(false),
            reading_position: wire.reading_position,
            created_at: wire.created_at.unwrap_or_default(),
            updated_at: wire.updated_at.unwrap_or_default(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Decodes a single document response body.
pub fn decode_document(data: &[u8]) -> Result<Document> {
    let wire: WireDocument =
        serde_json::from_slice(data).map_err(|e| DocstoreError::decode("document", e))?;
    Ok(wire.into())
}

/// Decodes a document list response body. A `null` body is an empty list.
pub fn decode_documents(data: &[u8]) -> Result<Vec<Document>> {
    let wire: Option<Vec<WireDocument>> =
        serde_json::from_slice(data).map_err(|e| DocstoreError::decode("document list", e))?;
    Ok(wire
        .unwrap_or_default()
        .into_iter()
        .map(Document::from)
        .collect())
}
