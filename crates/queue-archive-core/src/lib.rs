// crates/queue-archive-core/src/lib.rs
// ============================================================================
// Module: Queue Archive Core Library
// Description: Public API surface for the queue drain-and-batch engine.
// Purpose: Expose core types, interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Queue Archive core drains a message queue into compressed, time-partitioned
//! newline-delimited JSON objects. It classifies each message into a named
//! stream, buffers streams in memory, flushes them through an object store,
//! and acknowledges messages only after their archive object is persisted.
//! Invariants:
//! - A message is deleted from the queue only after the PUT containing it succeeds.
//! - Empty streams are never archived.
//! - A run never polls past half of the queue visibility timeout.
//!
//! The engine is backend-agnostic; queue and object-store access goes through
//! the traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::Clock;
pub use interfaces::ObjectStore;
pub use interfaces::PutObject;
pub use interfaces::QueueError;
pub use interfaces::QueueSource;
pub use interfaces::StoreError;
pub use runtime::AdaptivePolicy;
pub use runtime::ArchiveError;
pub use runtime::ArchiveWriter;
pub use runtime::DecodeError;
pub use runtime::DrainError;
pub use runtime::DrainLoop;
pub use runtime::DrainSettings;
pub use runtime::DrainPolicy;
pub use runtime::DrainProgress;
pub use runtime::InMemoryObjectStore;
pub use runtime::InMemoryQueue;
pub use runtime::ManualClock;
pub use runtime::StreamBuffer;
pub use runtime::SystemClock;
