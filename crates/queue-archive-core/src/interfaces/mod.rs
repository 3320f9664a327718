// crates/queue-archive-core/src/interfaces/mod.rs
// ============================================================================
// Module: Queue Archive Interfaces
// Description: Backend-agnostic seams for queues, object stores, and time.
// Purpose: Keep the drain engine free of network and clock dependencies.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The drain engine talks to the outside world only through these traits.
//! Every call is synchronous and runs to completion before the engine
//! proceeds; adapters that wrap async clients must block internally.
//! Invariants:
//! - Implementations return errors instead of panicking.
//! - [`ObjectStore::put`] either stores the whole object or fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use thiserror::Error;

use crate::core::QueueAttributes;
use crate::core::RawMessage;
use crate::core::ReceiptHandle;

// ============================================================================
// SECTION: Queue Source
// ============================================================================

/// Queue RPC errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Receive call failed.
    #[error("queue receive failed: {0}")]
    Receive(String),
    /// Delete call failed.
    #[error("queue delete failed: {0}")]
    Delete(String),
    /// Attribute lookup failed.
    #[error("queue attributes failed: {0}")]
    Attributes(String),
    /// Attribute was missing or unparseable.
    #[error("queue attribute {name} missing or invalid")]
    InvalidAttribute {
        /// Attribute name.
        name: String,
    },
}

/// Source of queue messages.
pub trait QueueSource: Send + Sync {
    /// Returns the queue's approximate size and visibility timeout.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when attributes cannot be read.
    fn attributes(&self) -> Result<QueueAttributes, QueueError>;

    /// Receives up to `max_messages` messages (short poll; may return none).
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the receive call fails.
    fn receive(&self, max_messages: usize) -> Result<Vec<RawMessage>, QueueError>;

    /// Deletes (acknowledges) a previously received message.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the delete call fails.
    fn delete(&self, receipt: &ReceiptHandle) -> Result<(), QueueError>;
}

// ============================================================================
// SECTION: Object Store
// ============================================================================

/// Object-store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store rejected the write.
    #[error("object store rejected write: {0}")]
    Rejected(String),
    /// Store could not be reached.
    #[error("object store io error: {0}")]
    Io(String),
}

/// Single fully-buffered object write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    /// Destination bucket.
    pub bucket: String,
    /// Destination object key.
    pub key: String,
    /// Object body.
    pub body: Vec<u8>,
    /// `Content-Type` metadata.
    pub content_type: String,
    /// `Content-Encoding` metadata.
    pub content_encoding: String,
}

/// Durable object store.
pub trait ObjectStore: Send + Sync {
    /// Writes one object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on any non-success response.
    fn put(&self, object: PutObject) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Monotonic time since the start of a run.
pub trait Clock: Send + Sync {
    /// Returns the time elapsed since the run started.
    fn elapsed(&self) -> Duration;
}
