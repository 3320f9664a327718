// crates/queue-archive-core/src/core/identifiers.rs
// ============================================================================
// Module: Queue Archive Identifiers
// Description: Stream keys and queue acknowledgment tokens.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque newtypes over strings. [`StreamKey`] names the
//! archive stream a record belongs to and doubles as an object-key segment;
//! [`ReceiptHandle`] is the token the queue hands out with each delivery and
//! requires back for deletion.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Stream Key
// ============================================================================

/// Name of the stream (and archive path segment) a record is grouped under.
///
/// # Invariants
/// - Keys produced by the classifier never contain `/` or `\`.
/// - Construction through [`StreamKey::new`] applies no validation; the
///   archive writer rejects keys that are not a single path segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamKey(String);

impl StreamKey {
    /// Stream name used for records that are not in normalized form.
    pub const MULTIPLEX: &'static str = "multiplex";

    /// Creates a new stream key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the fallback stream key for opaque records.
    #[must_use]
    pub fn multiplex() -> Self {
        Self::new(Self::MULTIPLEX)
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for StreamKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Receipt Handle
// ============================================================================

/// Acknowledgment token returned with a received queue message.
///
/// # Invariants
/// - Opaque; only meaningful to the queue that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    /// Creates a new receipt handle.
    #[must_use]
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Returns the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ReceiptHandle {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
