// crates/queue-archive-core/src/runtime/mod.rs
// ============================================================================
// Module: Queue Archive Runtime
// Description: Classifier, stream buffer, archive writer, and drain loop.
// Purpose: Group the drain-and-batch engine components.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Components, leaf-first: [`classify`] turns raw bodies into stream items,
//! [`buffer`] accumulates them per stream, [`archive`] turns a stream into a
//! compressed object, and [`drain`] runs the polling loop under a
//! [`policy`]. [`clock`] and [`memory`] provide time sources and in-memory
//! backends.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod archive;
pub mod buffer;
pub mod classify;
pub mod clock;
pub mod drain;
pub mod memory;
pub mod policy;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use archive::ArchiveError;
pub use archive::ArchiveWriter;
pub use buffer::StreamBuffer;
pub use classify::DecodeError;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use drain::DrainError;
pub use drain::DrainLoop;
pub use drain::DrainSettings;
pub use drain::MAX_RECEIVE_BATCH;
pub use memory::InMemoryObjectStore;
pub use memory::InMemoryQueue;
pub use policy::AdaptivePolicy;
pub use policy::DrainPolicy;
pub use policy::DrainProgress;
