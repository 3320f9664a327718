// crates/queue-archive-core/src/runtime/drain.rs
// ============================================================================
// Module: Queue Archive Drain Loop
// Description: Polling, classification, flush policy, and archive-then-acknowledge.
// Purpose: Drain a queue into stream archives with at-least-once semantics.
// Dependencies: crate::{core, interfaces, runtime}, tracing
// ============================================================================

//! ## Overview
//! [`DrainLoop`] is created fresh for each run. It reads queue attributes
//! once, polls until its [`DrainPolicy`] says stop, flushes oversized streams
//! when the policy asks, and flushes every remaining stream at the end.
//! Invariants:
//! - A stream's messages are deleted only after its archive PUT succeeds.
//! - A failed PUT aborts the run without issuing any delete for that stream;
//!   its messages reappear in the queue after their visibility timeout.
//! - Unclassifiable messages are dropped and left un-acknowledged so the
//!   queue's redrive policy decides their fate.
//! - The time cap is checked only between iterations; an in-progress flush
//!   always completes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::core::ArchiveReport;
use crate::core::StreamKey;
use crate::interfaces::Clock;
use crate::interfaces::ObjectStore;
use crate::interfaces::QueueError;
use crate::interfaces::QueueSource;
use crate::runtime::archive::ArchiveError;
use crate::runtime::archive::ArchiveWriter;
use crate::runtime::buffer::StreamBuffer;
use crate::runtime::classify::classify;
use crate::runtime::policy::AdaptivePolicy;
use crate::runtime::policy::DrainPolicy;
use crate::runtime::policy::DrainProgress;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest batch the queue hands out per receive call.
pub const MAX_RECEIVE_BATCH: usize = 10;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal drain run failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum DrainError {
    /// Queue RPC failed.
    #[error("queue failure: {0}")]
    Queue(#[from] QueueError),
    /// Archiving a stream failed; none of its messages were deleted.
    #[error("archiving stream {stream} failed: {source}")]
    Archive {
        /// Stream that failed to archive.
        stream: StreamKey,
        /// Underlying archive failure.
        source: ArchiveError,
    },
    /// Stream was archived but some deletes failed; those messages will be
    /// archived again when redelivered.
    #[error("{failed} of {total} deletes failed for archived stream {stream}")]
    Acknowledge {
        /// Stream whose acknowledgments failed.
        stream: StreamKey,
        /// Deletes that failed.
        failed: usize,
        /// Deletes attempted.
        total: usize,
    },
}

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Tuning knobs for a drain run.
///
/// # Invariants
/// - `receive_batch_size` is clamped to `1..=MAX_RECEIVE_BATCH` when used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainSettings {
    /// Per-stream soft size limit.
    pub max_stream_size: usize,
    /// Iterations between oversized-stream checks.
    pub flush_check_interval: u64,
    /// Messages requested per receive call.
    pub receive_batch_size: usize,
}

impl Default for DrainSettings {
    fn default() -> Self {
        Self {
            max_stream_size: AdaptivePolicy::DEFAULT_MAX_STREAM_SIZE,
            flush_check_interval: AdaptivePolicy::DEFAULT_FLUSH_CHECK_INTERVAL,
            receive_batch_size: MAX_RECEIVE_BATCH,
        }
    }
}

// ============================================================================
// SECTION: Drain Loop
// ============================================================================

/// Single-run queue drain engine.
pub struct DrainLoop<Q, S, C> {
    /// Queue being drained.
    queue: Q,
    /// Archive writer bound to the destination store.
    writer: ArchiveWriter<S>,
    /// Run clock for the time cap.
    clock: C,
    /// Run settings.
    settings: DrainSettings,
    /// Items awaiting archival.
    buffer: StreamBuffer,
}

impl<Q, S, C> DrainLoop<Q, S, C>
where
    Q: QueueSource,
    S: ObjectStore,
    C: Clock,
{
    /// Creates a drain loop for one run.
    #[must_use]
    pub fn new(queue: Q, writer: ArchiveWriter<S>, clock: C, settings: DrainSettings) -> Self {
        Self {
            queue,
            writer,
            clock,
            settings,
            buffer: StreamBuffer::new(),
        }
    }

    /// Runs the drain using the adaptive policy derived from queue attributes.
    ///
    /// # Errors
    ///
    /// Returns [`DrainError`] when a queue RPC fails or a stream cannot be
    /// archived or acknowledged.
    pub fn run(self) -> Result<ArchiveReport, DrainError> {
        let attributes = self.queue.attributes()?;
        let policy = AdaptivePolicy::new(attributes.visibility_timeout)
            .with_max_stream_size(self.settings.max_stream_size)
            .with_flush_check_interval(self.settings.flush_check_interval);
        info!(
            initial_size = attributes.approximate_count,
            visibility_timeout_secs = attributes.visibility_timeout.as_secs(),
            max_run_secs = policy.max_run().as_secs(),
            "starting drain run"
        );
        self.run_with_policy(&policy, attributes.approximate_count)
    }

    /// Runs the drain under an explicit policy and initial size estimate.
    ///
    /// # Errors
    ///
    /// Returns [`DrainError`] when a queue RPC fails or a stream cannot be
    /// archived or acknowledged.
    pub fn run_with_policy<P: DrainPolicy>(
        mut self,
        policy: &P,
        initial_size: u64,
    ) -> Result<ArchiveReport, DrainError> {
        let batch_size = self.settings.receive_batch_size.clamp(1, MAX_RECEIVE_BATCH);
        let mut progress = DrainProgress::new(initial_size);
        let mut report = ArchiveReport {
            initial_size,
            ..ArchiveReport::default()
        };

        while policy.should_continue(&progress, self.clock.elapsed()) {
            let batch = self.queue.receive(batch_size)?;
            for message in &batch {
                match classify(message) {
                    Ok((key, item)) => self.buffer.add(key, item),
                    Err(err) => {
                        report.dropped += 1;
                        warn!(receipt = %message.receipt, error = %err, "dropping unclassifiable message");
                    }
                }
            }
            progress.record_batch(batch.len());
            debug!(
                iteration = progress.iterations,
                batch = batch.len(),
                buffered = self.buffer.len(),
                "polled queue"
            );
            if policy.flush_due(&progress) {
                for key in self.buffer.keys_over(policy.flush_threshold()) {
                    self.flush_stream(&key, &mut report)?;
                }
            }
        }

        report.iterations = progress.iterations;
        report.received = progress.received;
        for key in self.buffer.keys() {
            self.flush_stream(&key, &mut report)?;
        }
        info!(
            iterations = report.iterations,
            received = report.received,
            archived = report.archived,
            dropped = report.dropped,
            objects = report.objects_written,
            "drain run complete"
        );
        Ok(report)
    }

    /// Archives one stream, then acknowledges its messages.
    fn flush_stream(
        &mut self,
        key: &StreamKey,
        report: &mut ArchiveReport,
    ) -> Result<(), DrainError> {
        let items = self.buffer.drain(key);
        if items.is_empty() {
            return Ok(());
        }
        let object_key = self.writer.write(key, &items).map_err(|source| DrainError::Archive {
            stream: key.clone(),
            source,
        })?;
        let mut failed = 0usize;
        for item in &items {
            if let Err(err) = self.queue.delete(&item.receipt) {
                failed += 1;
                warn!(
                    stream = %key,
                    receipt = %item.receipt,
                    error = %err,
                    "delete failed after archive; message will be archived again on redelivery"
                );
            }
        }
        if failed > 0 {
            return Err(DrainError::Acknowledge {
                stream: key.clone(),
                failed,
                total: items.len(),
            });
        }
        report.archived += u64::try_from(items.len()).unwrap_or(u64::MAX);
        report.objects_written += 1;
        info!(stream = %key, object_key = %object_key, items = items.len(), "archived stream");
        Ok(())
    }
}
