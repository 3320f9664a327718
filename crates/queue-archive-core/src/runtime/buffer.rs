// crates/queue-archive-core/src/runtime/buffer.rs
// ============================================================================
// Module: Queue Archive Stream Buffer
// Description: In-memory accumulator of pending items keyed by stream.
// Purpose: Hold classified items until their stream is flushed.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`StreamBuffer`] owns every classified item until it is drained for
//! archival. It knows nothing about archiving or acknowledgment.
//! Invariants:
//! - Insertion order is preserved per stream.
//! - Drained streams leave no entry behind, so [`StreamBuffer::keys`] only
//!   lists populated streams.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::StreamItem;
use crate::core::StreamKey;

// ============================================================================
// SECTION: Stream Buffer
// ============================================================================

/// Pending items grouped by stream key.
#[derive(Debug, Default)]
pub struct StreamBuffer {
    /// Buffered items per stream, in arrival order.
    streams: BTreeMap<StreamKey, Vec<StreamItem>>,
}

impl StreamBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item to a stream, creating the stream if absent.
    pub fn add(&mut self, key: StreamKey, item: StreamItem) {
        self.streams.entry(key).or_default().push(item);
    }

    /// Returns the number of items buffered for a stream.
    #[must_use]
    pub fn size_of(&self, key: &StreamKey) -> usize {
        self.streams.get(key).map_or(0, Vec::len)
    }

    /// Removes and returns all items buffered for a stream.
    pub fn drain(&mut self, key: &StreamKey) -> Vec<StreamItem> {
        self.streams.remove(key).unwrap_or_default()
    }

    /// Returns a snapshot of the populated stream keys.
    #[must_use]
    pub fn keys(&self) -> Vec<StreamKey> {
        self.streams.keys().cloned().collect()
    }

    /// Returns the keys of streams holding more than `threshold` items.
    #[must_use]
    pub fn keys_over(&self, threshold: usize) -> Vec<StreamKey> {
        self.streams
            .iter()
            .filter(|(_, items)| items.len() > threshold)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Returns the total number of buffered items across streams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.values().map(Vec::len).sum()
    }

    /// Returns true when no items are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
