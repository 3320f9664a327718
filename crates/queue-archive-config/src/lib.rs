// crates/queue-archive-config/src/lib.rs
// ============================================================================
// Module: Queue Archive Config Library
// Description: Canonical config model and validation for the queue archiver.
// Purpose: Single source of truth for queue-archive TOML semantics.
// Dependencies: queue-archive-core, serde, toml
// ============================================================================

//! ## Overview
//! `queue-archive-config` defines the optional TOML configuration for the
//! `queue-archive` binary. Loading is strict and fail-closed: unknown keys,
//! oversized files, and out-of-range values are rejected before any queue or
//! bucket is touched.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
