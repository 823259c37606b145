use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::storage_types::StorageBackend;

/// Catalogued metadata for one uploaded document.
///
/// A record is created exactly once, at successful completion of an upload,
/// and never mutated. The row is denormalized: `storage_backend` plus
/// `storage_key` are sufficient to retrieve the bytes, and `url` is a
/// derived convenience reconstructible from the pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub program: String,
    pub semester: String,
    pub subject: String,
    /// Original, human-supplied filename.
    pub filename: String,
    pub storage_backend: StorageBackend,
    /// Backend-specific locator: filesystem path, object key, or provider file id.
    pub storage_key: String,
    pub url: String,
    pub content_type: String,
    pub file_size: i64,
    pub owner_identity: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// API projection of a FileRecord.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileRecordResponse {
    pub id: Uuid,
    pub program: String,
    pub semester: String,
    pub subject: String,
    pub filename: String,
    pub url: String,
    pub content_type: String,
    pub file_size: i64,
    pub storage_backend: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_identity: Option<String>,
}

impl From<FileRecord> for FileRecordResponse {
    fn from(record: FileRecord) -> Self {
        FileRecordResponse {
            id: record.id,
            program: record.program,
            semester: record.semester,
            subject: record.subject,
            filename: record.filename,
            url: record.url,
            content_type: record.content_type,
            file_size: record.file_size,
            storage_backend: record.storage_backend.to_string(),
            uploaded_at: record.uploaded_at,
            owner_identity: record.owner_identity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_record() -> FileRecord {
        FileRecord {
            id: Uuid::new_v4(),
            program: "Basics".to_string(),
            semester: "1".to_string(),
            subject: "Math".to_string(),
            filename: "notes.pdf".to_string(),
            storage_backend: StorageBackend::Local,
            storage_key: "Basics/1/Math/1700000000000-abc-notes.pdf".to_string(),
            url: "http://localhost:3000/uploads/Basics/1/Math/1700000000000-abc-notes.pdf"
                .to_string(),
            content_type: "application/pdf".to_string(),
            file_size: 2048,
            owner_identity: None,
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_response_from_record() {
        let record = test_record();
        let response = FileRecordResponse::from(record.clone());

        assert_eq!(response.id, record.id);
        assert_eq!(response.filename, "notes.pdf");
        assert_eq!(response.url, record.url);
        assert_eq!(response.storage_backend, "local");
        assert_eq!(response.file_size, 2048);
        assert_eq!(response.uploaded_at, record.uploaded_at);
    }

    #[test]
    fn test_response_omits_absent_owner() {
        let response = FileRecordResponse::from(test_record());
        let json = serde_json::to_value(&response).expect("serialize");
        assert!(json.get("owner_identity").is_none());
        assert!(json.get("url").and_then(|v| v.as_str()).is_some());
    }

    #[test]
    fn test_response_carries_owner_when_present() {
        let mut record = test_record();
        record.owner_identity = Some("alice".to_string());
        let response = FileRecordResponse::from(record);
        assert_eq!(response.owner_identity.as_deref(), Some("alice"));
    }
}
