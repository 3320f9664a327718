// crates/queue-archive-core/src/core/message.rs
// ============================================================================
// Module: Queue Archive Messages
// Description: Raw queue deliveries, buffered stream items, and queue attributes.
// Purpose: Carry message payloads from the queue source through the buffer.
// Dependencies: crate::core::identifiers, serde_json
// ============================================================================

//! ## Overview
//! A [`RawMessage`] is exactly what the queue delivered. Once classified it
//! becomes a [`StreamItem`]: the decoded payload paired with the receipt
//! needed to acknowledge it after archival.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde_json::Value;

use crate::core::identifiers::ReceiptHandle;

// ============================================================================
// SECTION: Messages
// ============================================================================

/// Message as delivered by the queue source.
///
/// # Invariants
/// - Immutable once received; the body is not interpreted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Raw message body.
    pub body: String,
    /// Token required to delete the message.
    pub receipt: ReceiptHandle,
}

impl RawMessage {
    /// Creates a raw message from a body and receipt handle.
    #[must_use]
    pub fn new(body: impl Into<String>, receipt: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            receipt: ReceiptHandle::new(receipt),
        }
    }
}

/// Decoded payload awaiting archival.
///
/// # Invariants
/// - `receipt` is the handle of the raw message `item` was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamItem {
    /// Receipt of the originating message.
    pub receipt: ReceiptHandle,
    /// Decoded data item (normalized or opaque).
    pub item: Value,
}

// ============================================================================
// SECTION: Queue Attributes
// ============================================================================

/// Queue attributes read once at the start of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueAttributes {
    /// Approximate number of visible messages.
    pub approximate_count: u64,
    /// Visibility timeout applied to received messages.
    pub visibility_timeout: Duration,
}
