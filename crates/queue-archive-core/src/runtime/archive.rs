// crates/queue-archive-core/src/runtime/archive.rs
// ============================================================================
// Module: Queue Archive Writer
// Description: Gzip NDJSON serialization and time-partitioned object keys.
// Purpose: Persist one stream's items as a single compressed archive object.
// Dependencies: crate::{core, interfaces, runtime::classify}, flate2, rand, time
// ============================================================================

//! ## Overview
//! [`ArchiveWriter`] turns a drained stream into one gzip-compressed
//! newline-delimited JSON object and writes it with a single PUT. Object
//! keys are partitioned by stream and by the run's start time:
//! `{prefix}/{stream}/{YYYY}/{MM}/{DD}/{YYYY}-{MM}-{DD}-{HH}-{mm}-{stream}-{hex8}.json.gz`.
//! Invariants:
//! - Empty streams are rejected; no empty or header-only object is written.
//! - The body is fully buffered before the PUT is issued.
//! - Keys never start with `/`; the 8-hex suffix comes from an explicitly
//!   supplied random generator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use rand::RngCore;
use rand::rngs::StdRng;
use thiserror::Error;
use time::OffsetDateTime;
use time::UtcOffset;

use crate::core::StreamItem;
use crate::core::StreamKey;
use crate::interfaces::ObjectStore;
use crate::interfaces::PutObject;
use crate::interfaces::StoreError;
use crate::runtime::classify::flatten;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default key prefix for archive objects.
pub const DEFAULT_PREFIX: &str = "customerlogarchive";
/// Content type of archive objects.
pub const CONTENT_TYPE: &str = "application/json";
/// Content encoding of archive objects.
pub const CONTENT_ENCODING: &str = "gzip";
/// Maximum length of a single key segment.
const MAX_SEGMENT_LENGTH: usize = 255;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Archive write failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Attempted to archive a stream with no items.
    #[error("refusing to archive an empty stream")]
    EmptyStream,
    /// Bucket, prefix, or stream key cannot form a valid object key.
    #[error("invalid archive key: {0}")]
    InvalidKey(String),
    /// Serialization or compression failed.
    #[error("archive encoding failed: {0}")]
    Encode(String),
    /// Object store rejected the write.
    #[error("archive write failed: {0}")]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Serialization
// ============================================================================

/// Serializes items as gzip-compressed NDJSON at maximum compression.
///
/// Each line is the flattened form of one item, in input order.
///
/// # Errors
///
/// Returns [`ArchiveError::EmptyStream`] for empty input and
/// [`ArchiveError::Encode`] when serialization or compression fails.
pub fn serialize(items: &[StreamItem]) -> Result<Vec<u8>, ArchiveError> {
    if items.is_empty() {
        return Err(ArchiveError::EmptyStream);
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    for item in items {
        serde_json::to_writer(&mut encoder, &flatten(&item.item))
            .map_err(|err| ArchiveError::Encode(err.to_string()))?;
        encoder.write_all(b"\n").map_err(|err| ArchiveError::Encode(err.to_string()))?;
    }
    encoder.finish().map_err(|err| ArchiveError::Encode(err.to_string()))
}

// ============================================================================
// SECTION: Object Keys
// ============================================================================

/// Builds the destination object key for a stream archive.
///
/// Date and time components come from `run_start` (in UTC), not from the
/// time of the flush.
///
/// # Errors
///
/// Returns [`ArchiveError::InvalidKey`] when the prefix or stream key is not
/// made of valid key segments.
pub fn destination_key(
    stream_key: &StreamKey,
    run_start: OffsetDateTime,
    prefix: &str,
    suffix: u32,
) -> Result<String, ArchiveError> {
    let prefix = normalize_prefix(prefix)?;
    validate_stream_key(stream_key)?;
    let start = run_start.to_offset(UtcOffset::UTC);
    let year = format!("{:04}", start.year());
    let month = format!("{:02}", u8::from(start.month()));
    let day = format!("{:02}", start.day());
    let stamp = format!("{year}-{month}-{day}-{:02}-{:02}", start.hour(), start.minute());
    Ok(format!(
        "{prefix}{stream_key}/{year}/{month}/{day}/{stamp}-{stream_key}-{suffix:08x}.json.gz"
    ))
}

/// Checks that a stream key forms a single valid object key segment.
///
/// # Errors
///
/// Returns [`ArchiveError::InvalidKey`] when the key is empty, a dot segment,
/// too long, or contains a path separator.
pub fn validate_stream_key(stream_key: &StreamKey) -> Result<(), ArchiveError> {
    validate_segment(stream_key.as_str())
}

/// Normalizes a key prefix into `""` or `segment(/segment)*/`.
///
/// # Errors
///
/// Returns [`ArchiveError::InvalidKey`] when a segment is invalid.
pub fn normalize_prefix(prefix: &str) -> Result<String, ArchiveError> {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    for segment in trimmed.split('/') {
        validate_segment(segment)?;
    }
    Ok(format!("{trimmed}/"))
}

/// Validates a single key segment.
fn validate_segment(value: &str) -> Result<(), ArchiveError> {
    if value.is_empty() || value == "." || value == ".." {
        return Err(ArchiveError::InvalidKey(format!("segment '{value}' is invalid")));
    }
    if value.len() > MAX_SEGMENT_LENGTH {
        return Err(ArchiveError::InvalidKey("segment exceeds length limit".to_string()));
    }
    if value.contains(['/', '\\']) {
        return Err(ArchiveError::InvalidKey(format!(
            "segment '{value}' contains a path separator"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Archive Writer
// ============================================================================

/// Writes stream archives to an object store.
///
/// # Invariants
/// - `prefix` is normalized at construction.
/// - `run_start` is fixed for the lifetime of the writer.
pub struct ArchiveWriter<S> {
    /// Destination object store.
    store: S,
    /// Destination bucket.
    bucket: String,
    /// Normalized key prefix (empty or ending in `/`).
    prefix: String,
    /// Start time of the run, used for key partitioning.
    run_start: OffsetDateTime,
    /// Source of filename suffixes.
    rng: StdRng,
}

impl<S: ObjectStore> ArchiveWriter<S> {
    /// Creates a writer bound to a store, bucket, prefix, and run start.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidKey`] when the bucket is blank or the
    /// prefix is invalid.
    pub fn new(
        store: S,
        bucket: impl Into<String>,
        prefix: &str,
        run_start: OffsetDateTime,
        rng: StdRng,
    ) -> Result<Self, ArchiveError> {
        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err(ArchiveError::InvalidKey("bucket must be set".to_string()));
        }
        Ok(Self {
            store,
            bucket,
            prefix: normalize_prefix(prefix)?,
            run_start,
            rng,
        })
    }

    /// Serializes and writes one stream, returning the object key.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] when the stream is empty, the key is invalid,
    /// encoding fails, or the store rejects the write.
    pub fn write(
        &mut self,
        stream_key: &StreamKey,
        items: &[StreamItem],
    ) -> Result<String, ArchiveError> {
        let body = serialize(items)?;
        let key = destination_key(stream_key, self.run_start, &self.prefix, self.rng.next_u32())?;
        self.store.put(PutObject {
            bucket: self.bucket.clone(),
            key: key.clone(),
            body,
            content_type: CONTENT_TYPE.to_string(),
            content_encoding: CONTENT_ENCODING.to_string(),
        })?;
        Ok(key)
    }
}
