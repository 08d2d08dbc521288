use thiserror::Error;

/// Error types for docstore.
///
/// Transport failures (`Transport`, `Status`) come from the remote document
/// API; `Decode` is raised when a response does not match the wire schema.
/// The store never invents error kinds of its own: every operation hands the
/// capability's error back to its caller after local cleanup.
///
/// # Examples
///
/// ```
/// use docstore_core::error::{DocstoreError, Result};
///
/// fn require_id(id: &str) -> Result<&str> {
///     if id.is_empty() {
///         return Err(DocstoreError::InvalidUrl("empty document id".into()));
///     }
///     Ok(id)
/// }
///
/// assert!(require_id("").is_err());
/// ```
#[derive(Error, Debug)]
pub enum DocstoreError {
    #[error("transport request failed for {operation}: {source}")]
    Transport {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{operation} failed with HTTP {status}")]
    Status { operation: String, status: u16 },

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

impl DocstoreError {
    /// Create a transport error from any error type.
    pub fn transport(
        operation: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            operation: operation.into(),
            source: Box::new(error),
        }
    }

    /// Create a decode error for a response body.
    pub fn decode(what: impl Into<String>, error: serde_json::Error) -> Self {
        Self::Decode {
            what: what.into(),
            source: error,
        }
    }

    /// Returns `true` for network and HTTP status failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }

    /// HTTP status code, if the server answered with a non-success status.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience type alias for `Result<T, DocstoreError>`.
pub type Result<T> = std::result::Result<T, DocstoreError>;
