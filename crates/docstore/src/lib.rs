//! Client-side document store.
//!
//! Keeps a user's document library in memory, publishes it to observers
//! through `tokio::sync::watch` channels, and mediates uploads, edits,
//! deletes and searches against a remote [`DocumentApi`].
//!
//! - [`config`]: JSON configuration for the API client and the cache
//! - [`store`]: the [`DocumentStore`] and its published state

pub mod config;
pub mod store;

// Re-export commonly used types
pub use config::StoreConfig;
pub use docstore_core::{
    DocstoreError, Document, DocumentApi, DocumentPatch, Result, SessionProvider, UploadFile,
};
pub use store::{CacheView, CollectionSnapshot, DocumentStore, SearchState};
