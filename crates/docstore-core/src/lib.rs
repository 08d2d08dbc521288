//! Core abstractions for docstore.
//!
//! This crate provides the pieces the document store is built from:
//! - **Types**: `Document` and friends, `DocumentPatch`, `UploadFile`
//! - **Wire decoding**: strict mapping of backend JSON into `Document`
//! - **Sanitizer**: normalization of placeholder backend timestamps
//! - **Cache**: single-slot, per-user, TTL-bounded library cache
//! - **Capabilities**: `DocumentApi` and `SessionProvider` traits, with an
//!   HTTP implementation of `DocumentApi`
//! - **Error Types**: one error enum shared by every layer
//!
//! # Examples
//!
//! ```
//! use docstore_core::{CacheEntryStore, Document, ManualClock, sanitize};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let mut doc = Document::new("d1", "u1", "Notes");
//! doc.created_at = "0001-01-01T00:00:00Z".into();
//! let doc = sanitize(doc);
//! assert_eq!(doc.created_at, "");
//!
//! let cache = CacheEntryStore::new(Duration::from_secs(300), Arc::new(ManualClock::starting_2024()));
//! cache.put(vec![doc], "u1");
//! assert_eq!(cache.get("u1").unwrap().documents.len(), 1);
//! ```

pub mod api;
pub mod cache;
pub mod clock;
pub mod error;
pub mod http;
pub mod sanitize;
pub mod types;
pub mod wire;

// Re-export commonly used types
pub use api::{DocumentApi, SessionProvider, StaticSession};
pub use cache::{CacheEntry, CacheEntryStore, DEFAULT_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DocstoreError, Result};
pub use http::{ClientOptions, HttpDocumentApi};
pub use sanitize::{is_valid_timestamp, sanitize, sanitize_all};
pub use types::{
    Document, DocumentMetadata, DocumentPatch, DocumentSource, ReadingPosition, TextBlock,
    TextBlockType, UploadFile,
};
pub use wire::{decode_document, decode_documents};
