//! File record store: the catalogue's metadata rows.

use chrono::{DateTime, Utc};
use notehive_core::models::FileRecord;
use notehive_core::{AppError, StorageBackend};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Listing filter. All fields are optional; an empty filter lists everything,
/// most recently uploaded first.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub owner: Option<String>,
    pub program: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Store of catalogued file metadata.
///
/// A record is visible through this store iff its blob write and its
/// metadata insert both succeeded; inserts happen strictly after the blob
/// write.
#[async_trait::async_trait]
pub trait FileRecordStore: Send + Sync {
    async fn insert(&self, record: &FileRecord) -> Result<(), AppError>;

    /// All matching records ordered by `uploaded_at` descending. Zero
    /// matches yield an empty vec, not an error.
    async fn list(&self, filter: &RecordFilter) -> Result<Vec<FileRecord>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// Look a record up by its physical location; used by proxy routes to
    /// refuse streaming objects the catalogue does not reference.
    async fn find_by_location(
        &self,
        backend: StorageBackend,
        storage_key: &str,
    ) -> Result<Option<FileRecord>, AppError>;

    /// Remove the metadata row. Returns whether a row existed. Blob removal
    /// is not coupled to this.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn count(&self) -> Result<i64, AppError>;
}

/// Row type for the file_records table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
struct FileRecordRow {
    id: Uuid,
    program: String,
    semester: String,
    subject: String,
    filename: String,
    storage_backend: String,
    storage_key: String,
    url: String,
    content_type: String,
    file_size: i64,
    owner_identity: Option<String>,
    uploaded_at: DateTime<Utc>,
}

impl FileRecordRow {
    fn into_record(self) -> Result<FileRecord, AppError> {
        let storage_backend: StorageBackend = self.storage_backend.parse().map_err(|_| {
            AppError::Internal(format!(
                "Unknown storage backend '{}' on record {}",
                self.storage_backend, self.id
            ))
        })?;
        Ok(FileRecord {
            id: self.id,
            program: self.program,
            semester: self.semester,
            subject: self.subject,
            filename: self.filename,
            storage_backend,
            storage_key: self.storage_key,
            url: self.url,
            content_type: self.content_type,
            file_size: self.file_size,
            owner_identity: self.owner_identity,
            uploaded_at: self.uploaded_at,
        })
    }
}

const RECORD_COLUMNS: &str = "id, program, semester, subject, filename, storage_backend, \
     storage_key, url, content_type, file_size, owner_identity, uploaded_at";

/// Postgres-backed file record store.
#[derive(Clone)]
pub struct PgFileRecordStore {
    pool: PgPool,
}

impl PgFileRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FileRecordStore for PgFileRecordStore {
    #[tracing::instrument(skip(self, record), fields(db.table = "file_records", db.operation = "insert", record_id = %record.id))]
    async fn insert(&self, record: &FileRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO file_records (
                id, program, semester, subject, filename,
                storage_backend, storage_key, url, content_type, file_size,
                owner_identity, uploaded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(record.id)
        .bind(&record.program)
        .bind(&record.semester)
        .bind(&record.subject)
        .bind(&record.filename)
        .bind(record.storage_backend.to_string())
        .bind(&record.storage_key)
        .bind(&record.url)
        .bind(&record.content_type)
        .bind(record.file_size)
        .bind(&record.owner_identity)
        .bind(record.uploaded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_records", db.operation = "select"))]
    async fn list(&self, filter: &RecordFilter) -> Result<Vec<FileRecord>, AppError> {
        let rows: Vec<FileRecordRow> = sqlx::query_as::<Postgres, FileRecordRow>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM file_records
            WHERE ($1::text IS NULL OR owner_identity = $1)
              AND ($2::text IS NULL OR program = $2)
            ORDER BY uploaded_at DESC, id
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(&filter.owner)
        .bind(&filter.program)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(FileRecordRow::into_record).collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_records", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let row: Option<FileRecordRow> = sqlx::query_as::<Postgres, FileRecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM file_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FileRecordRow::into_record).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_records", db.operation = "select"))]
    async fn find_by_location(
        &self,
        backend: StorageBackend,
        storage_key: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        let row: Option<FileRecordRow> = sqlx::query_as::<Postgres, FileRecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM file_records \
             WHERE storage_backend = $1 AND storage_key = $2 LIMIT 1"
        ))
        .bind(backend.to_string())
        .bind(storage_key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FileRecordRow::into_record).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_records", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM file_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_records", db.operation = "select"))]
    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM file_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
