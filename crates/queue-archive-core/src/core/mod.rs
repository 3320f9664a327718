// crates/queue-archive-core/src/core/mod.rs
// ============================================================================
// Module: Queue Archive Core Types
// Description: Shared data model for queue messages, streams, and run reports.
// Purpose: Group the plain data types used by interfaces and runtime.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Core types are plain data: they carry no I/O and no policy. Runtime
//! components in [`crate::runtime`] operate on them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod identifiers;
pub mod message;
pub mod report;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::ReceiptHandle;
pub use identifiers::StreamKey;
pub use message::QueueAttributes;
pub use message::RawMessage;
pub use message::StreamItem;
pub use report::ArchiveReport;
