// crates/queue-archive-core/src/core/report.rs
// ============================================================================
// Module: Queue Archive Run Report
// Description: Summary counters produced by one drain run.
// Purpose: Report what a run polled, archived, and dropped.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! One [`ArchiveReport`] is returned per completed drain run.

use serde::Deserialize;
use serde::Serialize;

/// Counters describing a completed drain run.
///
/// # Invariants
/// - `archived + dropped <= received`; the remainder was lost from the buffer
///   by an aborted flush and stays un-acknowledged in the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveReport {
    /// Polling iterations performed.
    pub iterations: u64,
    /// Raw messages returned by the queue.
    pub received: u64,
    /// Items persisted to the object store and acknowledged.
    pub archived: u64,
    /// Messages dropped because they could not be classified.
    pub dropped: u64,
    /// Archive objects written.
    pub objects_written: u64,
    /// Approximate queue size observed at the start of the run.
    pub initial_size: u64,
}
