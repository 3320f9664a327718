// crates/queue-archive-core/src/runtime/policy.rs
// ============================================================================
// Module: Queue Archive Drain Policy
// Description: Loop continuation and periodic flush decisions for the drain loop.
// Purpose: Isolate the approximate-count stopping heuristic behind a trait.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Queue size attributes are approximate and eventually consistent, so the
//! drain loop cannot simply poll until the queue reports empty. The
//! [`AdaptivePolicy`] keeps polling while a backlog is still expected and
//! batches keep arriving, tolerates a few extra polls near the tail, and
//! unconditionally stops once half the visibility timeout has elapsed.
//! Invariants:
//! - No iteration starts at or after the time cap.
//! - Periodic flush checks start only after `max_stream_size` messages have
//!   been received, then run on iterations whose absolute count is a
//!   multiple of `flush_check_interval` (not counted from the gate opening).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Progress
// ============================================================================

/// Counters the policy reads to decide whether to keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainProgress {
    /// Approximate queue size at the start of the run.
    pub initial_size: u64,
    /// Polling iterations completed.
    pub iterations: u64,
    /// Raw messages received so far.
    pub received: u64,
    /// Size of the most recent batch; `None` before the first poll.
    pub last_batch: Option<usize>,
    /// Initial size minus messages received; may go negative.
    pub estimated_remaining: i64,
}

impl DrainProgress {
    /// Creates progress for a run starting at `initial_size`.
    #[must_use]
    pub fn new(initial_size: u64) -> Self {
        Self {
            initial_size,
            iterations: 0,
            received: 0,
            last_batch: None,
            estimated_remaining: i64::try_from(initial_size).unwrap_or(i64::MAX),
        }
    }

    /// Records the outcome of one poll.
    pub fn record_batch(&mut self, count: usize) {
        let count_u64 = u64::try_from(count).unwrap_or(u64::MAX);
        let count_i64 = i64::try_from(count).unwrap_or(i64::MAX);
        self.last_batch = Some(count);
        self.received = self.received.saturating_add(count_u64);
        self.estimated_remaining = self.estimated_remaining.saturating_sub(count_i64);
        self.iterations = self.iterations.saturating_add(1);
    }
}

// ============================================================================
// SECTION: Policy Trait
// ============================================================================

/// Decides when the drain loop stops and when it checks for oversized streams.
pub trait DrainPolicy {
    /// Returns true when another polling iteration should run.
    fn should_continue(&self, progress: &DrainProgress, elapsed: Duration) -> bool;

    /// Returns true when oversized streams should be flushed now.
    ///
    /// The interval applies to the absolute iteration count.
    fn flush_due(&self, progress: &DrainProgress) -> bool;

    /// Returns the per-stream size above which a stream is flushed early.
    fn flush_threshold(&self) -> usize;
}

// ============================================================================
// SECTION: Adaptive Policy
// ============================================================================

/// Time-capped, approximate-backlog stopping policy.
///
/// # Invariants
/// - `max_run` is half of the queue visibility timeout.
/// - `flush_check_interval` is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptivePolicy {
    /// Wall-clock budget for polling.
    max_run: Duration,
    /// Per-stream soft size limit.
    max_stream_size: usize,
    /// Iterations between oversized-stream checks.
    flush_check_interval: u64,
}

impl AdaptivePolicy {
    /// Default per-stream soft size limit.
    pub const DEFAULT_MAX_STREAM_SIZE: usize = 10_000;
    /// Default iterations between oversized-stream checks.
    pub const DEFAULT_FLUSH_CHECK_INTERVAL: u64 = 10;

    /// Creates a policy bounded by half of `visibility_timeout`.
    #[must_use]
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            max_run: visibility_timeout / 2,
            max_stream_size: Self::DEFAULT_MAX_STREAM_SIZE,
            flush_check_interval: Self::DEFAULT_FLUSH_CHECK_INTERVAL,
        }
    }

    /// Overrides the per-stream soft size limit.
    #[must_use]
    pub const fn with_max_stream_size(mut self, max_stream_size: usize) -> Self {
        self.max_stream_size = max_stream_size;
        self
    }

    /// Overrides the oversized-stream check interval (clamped to at least 1).
    #[must_use]
    pub fn with_flush_check_interval(mut self, interval: u64) -> Self {
        self.flush_check_interval = interval.max(1);
        self
    }

    /// Returns the polling time budget.
    #[must_use]
    pub const fn max_run(&self) -> Duration {
        self.max_run
    }
}

impl DrainPolicy for AdaptivePolicy {
    fn should_continue(&self, progress: &DrainProgress, elapsed: Duration) -> bool {
        if elapsed >= self.max_run {
            return false;
        }
        let iterations = i64::try_from(progress.iterations).unwrap_or(i64::MAX);
        let backlog_expected = progress.last_batch.is_none_or(|count| count > 0)
            && iterations < progress.estimated_remaining;
        let tail_tolerated = progress.last_batch.is_none_or(|count| count > 1)
            && progress.received <= progress.initial_size;
        backlog_expected || tail_tolerated
    }

    fn flush_due(&self, progress: &DrainProgress) -> bool {
        let threshold = u64::try_from(self.max_stream_size).unwrap_or(u64::MAX);
        progress.iterations > 0
            && progress.received >= threshold
            && progress.iterations % self.flush_check_interval == 0
    }

    fn flush_threshold(&self) -> usize {
        self.max_stream_size
    }
}
