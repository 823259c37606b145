//! Shared key construction for storage backends.
//!
//! Key format: `{program}/{semester}/{subject}/{millis}-{record_id}-{name}`.
//! The timestamp plus the record id make concurrent uploads of identically
//! named files collision-free by construction.

use chrono::{DateTime, Utc};
use notehive_core::Classification;
use uuid::Uuid;

/// Sanitize a human-supplied filename for use as a path component.
///
/// Takes the final path component, collapses whitespace runs into a single
/// `_`, and collapses dot runs so the result can never carry a `..`
/// traversal token. Empty results fall back to `file`.
pub fn sanitize_object_name(filename: &str) -> String {
    let name_only = std::path::Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let mut sanitized = String::with_capacity(name_only.len());
    let mut last_was_space = false;
    let mut last_was_dot = false;
    for c in name_only.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                sanitized.push('_');
            }
            last_was_space = true;
            last_was_dot = false;
        } else if c == '.' {
            if !last_was_dot {
                sanitized.push('.');
            }
            last_was_space = false;
            last_was_dot = true;
        } else if c == '/' || c == '\\' {
            sanitized.push('_');
            last_was_space = false;
            last_was_dot = false;
        } else {
            sanitized.push(c);
            last_was_space = false;
            last_was_dot = false;
        }
    }

    let trimmed = sanitized.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Construct the hierarchical storage key for one upload.
pub fn build_storage_key(
    classification: &Classification,
    uploaded_at: DateTime<Utc>,
    record_id: Uuid,
    sanitized_name: &str,
) -> String {
    format!(
        "{}/{}/{}/{}-{}-{}",
        classification.program,
        classification.semester,
        classification.subject,
        uploaded_at.timestamp_millis(),
        record_id,
        sanitized_name
    )
}

/// Percent-encode a storage key for URL embedding, keeping `/` separators.
pub fn encode_key_for_url(storage_key: &str) -> String {
    storage_key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
