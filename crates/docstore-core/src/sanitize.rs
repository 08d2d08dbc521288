//! Timestamp normalization for backend documents.
//!
//! The backend emits placeholder timestamps (`0001-01-01T00:00:00Z` and
//! similar zero values) for documents whose dates were never recorded. Any
//! timestamp that is empty, unparsable, or dated before 2000 is treated as
//! unknown and replaced with the document's other timestamp when that one is
//! usable, or with an empty string otherwise.

use crate::types::Document;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Earliest calendar year accepted as a real timestamp.
pub const MIN_VALID_YEAR: i32 = 2000;

/// Returns the document with `created_at` and `updated_at` corrected.
///
/// Usable timestamps are kept verbatim, so sanitizing twice yields the same
/// document as sanitizing once.
///
/// # Examples
///
/// ```
/// use docstore_core::sanitize::sanitize;
/// use docstore_core::types::Document;
///
/// let mut doc = Document::new("d1", "u1", "Notes");
/// doc.created_at = "0001-01-01T00:00:00Z".into();
/// doc.updated_at = "2023-05-01".into();
///
/// let doc = sanitize(doc);
/// assert_eq!(doc.created_at, "2023-05-01");
/// assert_eq!(doc.updated_at, "2023-05-01");
/// ```
#[must_use]
pub fn sanitize(mut doc: Document) -> Document {
    if !is_valid_timestamp(&doc.created_at) {
        doc.created_at = if is_valid_timestamp(&doc.updated_at) {
            doc.updated_at.clone()
        } else {
            String::new()
        };
    }
    if !is_valid_timestamp(&doc.updated_at) {
        doc.updated_at.clone_from(&doc.created_at);
    }
    doc
}

/// Sanitizes every document in a list, preserving order.
pub fn sanitize_all(docs: Vec<Document>) -> Vec<Document> {
    docs.into_iter().map(sanitize).collect()
}

/// Returns `true` if `value` parses as a date on or after [`MIN_VALID_YEAR`].
pub fn is_valid_timestamp(value: &str) -> bool {
    parse_year(value).is_some_and(|year| year >= MIN_VALID_YEAR)
}

fn parse_year(value: &str) -> Option<i32> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.year());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.year());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.year());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.year())
}
