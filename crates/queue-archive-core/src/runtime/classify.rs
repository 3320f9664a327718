// crates/queue-archive-core/src/runtime/classify.rs
// ============================================================================
// Module: Queue Archive Classifier
// Description: Envelope unwrapping, stream key derivation, and record flattening.
// Purpose: Turn raw queue bodies into stream-keyed items ready for archival.
// Dependencies: crate::core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Pure functions over JSON values. A raw body may be wrapped in a
//! notification envelope (`Type == "Notification"` with `Message` and
//! `MessageId`); the envelope's `Message` string is then the payload.
//! Payloads shaped as `{Table, Action, Data}` are *normalized* and go to the
//! `{Table}_{Action}` stream; everything else goes to the multiplex stream.
//! Invariants:
//! - Classification either yields a complete item or a [`DecodeError`].
//! - Every classified stream key is a valid object key segment.
//! - Opaque records are archived byte-for-byte as decoded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::RawMessage;
use crate::core::StreamItem;
use crate::core::StreamKey;
use crate::runtime::archive::validate_stream_key;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Envelope type marker for notification-wrapped messages.
const NOTIFICATION_TYPE: &str = "Notification";
/// Normalized record table field.
const TABLE_FIELD: &str = "Table";
/// Normalized record action field.
const ACTION_FIELD: &str = "Action";
/// Normalized record nested data field.
const DATA_FIELD: &str = "Data";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Classification failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Body is not valid JSON.
    #[error("message body is not valid json: {0}")]
    Body(String),
    /// Envelope `Message` field is not a string.
    #[error("notification message field is not a string")]
    EnvelopeMessageType,
    /// Envelope `Message` field is not valid JSON.
    #[error("notification message is not valid json: {0}")]
    EnvelopeMessage(String),
    /// Derived stream key cannot be used as an object key segment.
    #[error("stream key is not archivable: {0}")]
    StreamKey(String),
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Decodes a raw body, unwrapping a notification envelope when present.
///
/// # Errors
///
/// Returns [`DecodeError`] when the body or the wrapped message is not JSON.
pub fn unwrap_envelope(raw: &str) -> Result<Value, DecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(|err| DecodeError::Body(err.to_string()))?;
    if !is_notification_envelope(&value) {
        return Ok(value);
    }
    let message = value
        .get("Message")
        .and_then(Value::as_str)
        .ok_or(DecodeError::EnvelopeMessageType)?;
    serde_json::from_str(message).map_err(|err| DecodeError::EnvelopeMessage(err.to_string()))
}

/// Returns true when the value carries the notification envelope shape.
fn is_notification_envelope(value: &Value) -> bool {
    let Some(fields) = value.as_object() else {
        return false;
    };
    fields.get("Type").and_then(Value::as_str) == Some(NOTIFICATION_TYPE)
        && fields.contains_key("Message")
        && fields.contains_key("MessageId")
}

/// Returns true when the item has `Table`, `Action`, and `Data` fields.
#[must_use]
pub fn is_normalized(item: &Value) -> bool {
    normalized_fields(item).is_some()
}

/// Returns the object fields of a normalized record.
fn normalized_fields(item: &Value) -> Option<&Map<String, Value>> {
    item.as_object().filter(|fields| {
        fields.contains_key(TABLE_FIELD)
            && fields.contains_key(ACTION_FIELD)
            && fields.contains_key(DATA_FIELD)
    })
}

/// Derives the stream key for a data item.
#[must_use]
pub fn stream_key_for(item: &Value) -> StreamKey {
    let Some(fields) = normalized_fields(item) else {
        return StreamKey::multiplex();
    };
    let table = fields.get(TABLE_FIELD).map(key_segment).unwrap_or_default();
    let action = fields.get(ACTION_FIELD).map(key_segment).unwrap_or_default();
    StreamKey::new(format!("{table}_{action}"))
}

/// Renders a field value as part of a stream key.
fn key_segment(value: &Value) -> String {
    let rendered = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    rendered.replace(['/', '\\'], "_")
}

/// Flattens a normalized record; opaque records are returned unchanged.
///
/// Top-level non-object fields are kept and the nested `Data` object is
/// merged in last, so `Data` wins on key collisions. Nested objects other
/// than `Data` are dropped.
#[must_use]
pub fn flatten(item: &Value) -> Value {
    let Some(fields) = normalized_fields(item) else {
        return item.clone();
    };
    let mut flat = Map::new();
    let mut inner = None;
    for (key, value) in fields {
        match value {
            Value::Object(nested) => {
                if key == DATA_FIELD {
                    inner = Some(nested);
                }
            }
            other => {
                flat.insert(key.clone(), other.clone());
            }
        }
    }
    if let Some(inner) = inner {
        for (key, value) in inner {
            flat.insert(key.clone(), value.clone());
        }
    }
    Value::Object(flat)
}

/// Classifies a raw message into its stream key and buffered item.
///
/// # Errors
///
/// Returns [`DecodeError`] when the body cannot be decoded or its stream key
/// cannot form an object key.
pub fn classify(message: &RawMessage) -> Result<(StreamKey, StreamItem), DecodeError> {
    let item = unwrap_envelope(&message.body)?;
    let key = stream_key_for(&item);
    validate_stream_key(&key).map_err(|err| DecodeError::StreamKey(err.to_string()))?;
    Ok((
        key,
        StreamItem {
            receipt: message.receipt.clone(),
            item,
        },
    ))
}
