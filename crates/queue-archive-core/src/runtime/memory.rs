// crates/queue-archive-core/src/runtime/memory.rs
// ============================================================================
// Module: Queue Archive In-Memory Backends
// Description: In-memory queue and object store for tests and local runs.
// Purpose: Provide deterministic backends without network dependencies.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryQueue`] and [`InMemoryObjectStore`] record every call so tests
//! can assert on deletes and PUTs. Both are cheap to clone; clones share
//! state. Not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use crate::core::QueueAttributes;
use crate::core::RawMessage;
use crate::core::ReceiptHandle;
use crate::interfaces::ObjectStore;
use crate::interfaces::PutObject;
use crate::interfaces::QueueError;
use crate::interfaces::QueueSource;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Queue
// ============================================================================

/// Shared queue state.
#[derive(Debug, Default)]
struct QueueState {
    /// Visible messages in delivery order.
    pending: VecDeque<RawMessage>,
    /// Received but not yet deleted messages keyed by receipt.
    in_flight: BTreeMap<String, RawMessage>,
    /// Receipts passed to `delete`, in call order.
    deleted: Vec<ReceiptHandle>,
    /// Reported size override; defaults to the pending count.
    approximate_count: Option<u64>,
    /// Reported visibility timeout.
    visibility_timeout: Duration,
    /// Whether deletes fail.
    fail_deletes: bool,
    /// Number of receive calls served.
    receive_calls: u64,
    /// Counter used to mint receipt handles.
    next_receipt: u64,
}

/// In-memory queue with recorded deletes.
///
/// # Invariants
/// - Received messages stay in flight until deleted or explicitly requeued.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueue {
    /// Shared queue state.
    state: Arc<Mutex<QueueState>>,
}

impl InMemoryQueue {
    /// Creates an empty queue reporting the given visibility timeout.
    #[must_use]
    pub fn new(visibility_timeout: Duration) -> Self {
        let queue = Self::default();
        queue.lock().visibility_timeout = visibility_timeout;
        queue
    }

    /// Locks the shared state, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues a message body and returns its receipt handle.
    pub fn push(&self, body: impl Into<String>) -> ReceiptHandle {
        let mut state = self.lock();
        state.next_receipt += 1;
        let receipt = ReceiptHandle::new(format!("receipt-{}", state.next_receipt));
        state.pending.push_back(RawMessage {
            body: body.into(),
            receipt: receipt.clone(),
        });
        receipt
    }

    /// Overrides the approximate size reported by [`QueueSource::attributes`].
    pub fn set_approximate_count(&self, count: u64) {
        self.lock().approximate_count = Some(count);
    }

    /// Makes every subsequent delete fail (or succeed again).
    pub fn fail_deletes(&self, fail: bool) {
        self.lock().fail_deletes = fail;
    }

    /// Moves undeleted in-flight messages back to the visible queue, as if
    /// their visibility timeout expired.
    pub fn requeue_in_flight(&self) {
        let mut state = self.lock();
        let expired = std::mem::take(&mut state.in_flight);
        state.pending.extend(expired.into_values());
    }

    /// Returns every receipt passed to `delete`, in call order.
    #[must_use]
    pub fn deleted(&self) -> Vec<ReceiptHandle> {
        self.lock().deleted.clone()
    }

    /// Returns the number of visible messages.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Returns the number of received but undeleted messages.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Returns the number of receive calls served.
    #[must_use]
    pub fn receive_calls(&self) -> u64 {
        self.lock().receive_calls
    }
}

impl QueueSource for InMemoryQueue {
    fn attributes(&self) -> Result<QueueAttributes, QueueError> {
        let state = self.lock();
        let pending = u64::try_from(state.pending.len()).unwrap_or(u64::MAX);
        Ok(QueueAttributes {
            approximate_count: state.approximate_count.unwrap_or(pending),
            visibility_timeout: state.visibility_timeout,
        })
    }

    fn receive(&self, max_messages: usize) -> Result<Vec<RawMessage>, QueueError> {
        let mut state = self.lock();
        state.receive_calls += 1;
        let take = max_messages.min(state.pending.len());
        let batch: Vec<RawMessage> = state.pending.drain(.. take).collect();
        for message in &batch {
            state.in_flight.insert(message.receipt.as_str().to_string(), message.clone());
        }
        Ok(batch)
    }

    fn delete(&self, receipt: &ReceiptHandle) -> Result<(), QueueError> {
        let mut state = self.lock();
        state.deleted.push(receipt.clone());
        if state.fail_deletes {
            return Err(QueueError::Delete(format!("delete rejected for {receipt}")));
        }
        state.in_flight.remove(receipt.as_str());
        Ok(())
    }
}

// ============================================================================
// SECTION: In-Memory Object Store
// ============================================================================

/// Shared store state.
#[derive(Debug, Default)]
struct StoreState {
    /// Objects written, in write order.
    objects: Vec<PutObject>,
    /// Remaining writes allowed before rejection; `None` means unlimited.
    remaining_writes: Option<usize>,
    /// Number of rejected writes.
    rejected: usize,
}

/// In-memory object store with recorded writes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    /// Shared store state.
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryObjectStore {
    /// Creates an empty store accepting every write.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the shared state, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rejects every write from now on.
    pub fn reject_writes(&self) {
        self.reject_writes_after(0);
    }

    /// Accepts `successes` more writes, then rejects the rest.
    pub fn reject_writes_after(&self, successes: usize) {
        self.lock().remaining_writes = Some(successes);
    }

    /// Returns the objects written, in write order.
    #[must_use]
    pub fn objects(&self) -> Vec<PutObject> {
        self.lock().objects.clone()
    }

    /// Returns the number of rejected writes.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.lock().rejected
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, object: PutObject) -> Result<(), StoreError> {
        let mut state = self.lock();
        match state.remaining_writes {
            Some(0) => {
                state.rejected += 1;
                return Err(StoreError::Rejected(format!("write rejected for {}", object.key)));
            }
            Some(remaining) => state.remaining_writes = Some(remaining - 1),
            None => {}
        }
        state.objects.push(object);
        Ok(())
    }
}
