//! Upload router and metadata indexer.
//!
//! The ingest pipeline: validate → sanitize → construct storage key → route
//! backend by size → write blob → write metadata row → fan out notification.
//!
//! The blob write and the metadata insert are not a transaction. Write order
//! is deliberate: the durable-but-unindexed side goes first, and a metadata
//! failure leaves an orphaned blob that is logged and accepted rather than
//! rolled back (the blob store offers no compensating-delete guarantee worth
//! relying on). A record is therefore visible in listings iff both writes
//! succeeded.

use chrono::Utc;
use notehive_core::models::{FileRecord, NewFileEvent};
use notehive_core::{AppError, Classification, StorageBackend};
use notehive_db::{FileRecordStore, RecordFilter};
use notehive_infra::PushService;
use notehive_storage::keys::{build_storage_key, sanitize_object_name};
use notehive_storage::{ByteStream, StorageError, StorageRouter};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// One upload, as received from the HTTP layer.
pub struct UploadRequest {
    pub program: String,
    pub semester: String,
    pub subject: String,
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: String,
    pub owner_identity: Option<String>,
}

/// How a record's bytes reach the caller.
pub enum Resolved {
    /// Stream the bytes through this service.
    Stream {
        stream: ByteStream,
        content_type: String,
        filename: String,
    },
    /// The caller can fetch this URL directly.
    Redirect(String),
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolved::Stream {
                content_type,
                filename,
                ..
            } => f
                .debug_struct("Stream")
                .field("content_type", content_type)
                .field("filename", filename)
                .finish_non_exhaustive(),
            Resolved::Redirect(url) => f.debug_tuple("Redirect").field(url).finish(),
        }
    }
}

const PRESIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// Upload router and metadata indexer.
#[derive(Clone)]
pub struct IngestService {
    records: Arc<dyn FileRecordStore>,
    storage: Arc<StorageRouter>,
    push: Option<PushService>,
}

impl IngestService {
    pub fn new(
        records: Arc<dyn FileRecordStore>,
        storage: Arc<StorageRouter>,
        push: Option<PushService>,
    ) -> Self {
        Self {
            records,
            storage,
            push,
        }
    }

    /// Catalogue one upload: blob write, then metadata insert, then
    /// fire-and-forget notification.
    #[tracing::instrument(
        skip(self, request),
        fields(program = %request.program, filename = %request.filename)
    )]
    pub async fn ingest(&self, request: UploadRequest) -> Result<FileRecord, AppError> {
        let classification =
            Classification::new(request.program, request.semester, request.subject)?;

        if request.data.is_empty() {
            return Err(AppError::InvalidInput("Missing file".to_string()));
        }

        let id = Uuid::new_v4();
        let uploaded_at = Utc::now();
        let sanitized = sanitize_object_name(&request.filename);
        let storage_key = build_storage_key(&classification, uploaded_at, id, &sanitized);

        let backend = self.storage.select(request.data.len());
        let file_size = request.data.len() as i64;

        let stored = backend
            .put(&storage_key, &request.content_type, request.data)
            .await
            .map_err(|e| AppError::Storage(format!("Blob write failed: {}", e)))?;

        let record = FileRecord {
            id,
            program: classification.program,
            semester: classification.semester,
            subject: classification.subject,
            filename: request.filename,
            storage_backend: backend.backend_type(),
            storage_key: stored.key,
            url: stored.url,
            content_type: request.content_type,
            file_size,
            owner_identity: request.owner_identity,
            uploaded_at,
        };

        if let Err(e) = self.records.insert(&record).await {
            tracing::warn!(
                record_id = %record.id,
                storage_key = %record.storage_key,
                backend = %record.storage_backend,
                error = %e,
                "Metadata write failed after blob write; blob is orphaned"
            );
            return Err(AppError::Metadata(format!(
                "Metadata write failed after blob write: {}",
                e
            )));
        }

        tracing::info!(
            record_id = %record.id,
            storage_key = %record.storage_key,
            backend = %record.storage_backend,
            size_bytes = file_size,
            "Upload catalogued"
        );

        self.notify(&record);

        Ok(record)
    }

    /// Fan the new-file event out without blocking or failing the upload.
    fn notify(&self, record: &FileRecord) {
        let Some(push) = self.push.clone() else {
            return;
        };
        let event = NewFileEvent {
            record_id: record.id,
            program: record.program.clone(),
            semester: record.semester.clone(),
            subject: record.subject.clone(),
            filename: record.filename.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = push.notify_new_file(event).await {
                tracing::warn!(error = %e, "Push fan-out failed");
            }
        });
    }

    /// Catalogue listing, most recently uploaded first.
    pub async fn list(&self, filter: &RecordFilter) -> Result<Vec<FileRecord>, AppError> {
        self.records.list(filter).await
    }

    /// Produce the record's bytes, dispatching on its backend tag: local
    /// files stream from disk, object storage redirects to a public or
    /// presigned URL, and the drive proxies an authenticated stream.
    pub async fn resolve(&self, id: Uuid) -> Result<(FileRecord, Resolved), AppError> {
        let record = self
            .records
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("File record not found".to_string()))?;

        let backend = self
            .storage
            .get(record.storage_backend)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let resolved = match record.storage_backend {
            StorageBackend::S3 => {
                if backend.serves_publicly() {
                    Resolved::Redirect(backend.public_url(&record.storage_key))
                } else {
                    let url = backend
                        .presigned_url(&record.storage_key, PRESIGNED_URL_TTL)
                        .await
                        .map_err(|e| AppError::Storage(e.to_string()))?;
                    Resolved::Redirect(url)
                }
            }
            StorageBackend::Local | StorageBackend::Drive => {
                let stream = backend
                    .download_stream(&record.storage_key)
                    .await
                    .map_err(|e| match e {
                        StorageError::NotFound(key) => AppError::NotFound(format!(
                            "Backing object missing from storage: {}",
                            key
                        )),
                        other => AppError::Storage(other.to_string()),
                    })?;
                Resolved::Stream {
                    stream,
                    content_type: record.content_type.clone(),
                    filename: record.filename.clone(),
                }
            }
        };

        Ok((record, resolved))
    }

    /// Administrative delete: removes the metadata row, then attempts the
    /// blob delete best-effort. The two are uncoupled; a failed blob delete
    /// only logs.
    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let record = self
            .records
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("File record not found".to_string()))?;

        if !self.records.delete(id).await? {
            return Err(AppError::NotFound("File record not found".to_string()));
        }

        if let Ok(backend) = self.storage.get(record.storage_backend) {
            let backend = backend.clone();
            let storage_key = record.storage_key.clone();
            tokio::spawn(async move {
                if let Err(e) = backend.delete(&storage_key).await {
                    tracing::debug!(
                        storage_key = %storage_key,
                        error = %e,
                        "Blob delete after record removal failed"
                    );
                }
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use notehive_db::{InMemoryFileRecordStore, SubscriptionStore};
    use notehive_storage::{LocalStorage, Storage, StorageResult, StoredObject};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    struct Harness {
        service: IngestService,
        records: Arc<InMemoryFileRecordStore>,
        storage: Arc<dyn Storage>,
        _dir: TempDir,
    }

    async fn harness() -> Harness {
        let dir = tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(dir.path(), "http://localhost:3000/uploads".to_string())
                .await
                .unwrap(),
        );
        let mut backends: HashMap<StorageBackend, Arc<dyn Storage>> = HashMap::new();
        backends.insert(StorageBackend::Local, storage.clone());
        let router = Arc::new(StorageRouter::new(StorageBackend::Local, backends).unwrap());

        let records = Arc::new(InMemoryFileRecordStore::new());
        let service = IngestService::new(records.clone(), router, None);

        Harness {
            service,
            records,
            storage,
            _dir: dir,
        }
    }

    fn upload(program: &str, filename: &str, data: &[u8]) -> UploadRequest {
        UploadRequest {
            program: program.to_string(),
            semester: "1".to_string(),
            subject: "Math".to_string(),
            data: data.to_vec(),
            filename: filename.to_string(),
            content_type: "application/pdf".to_string(),
            owner_identity: None,
        }
    }

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_ingest_round_trips_bytes() {
        let h = harness().await;
        let data = b"0123456789".to_vec();

        let record = h
            .service
            .ingest(upload("Basics", "notes.pdf", &data))
            .await
            .unwrap();

        assert_eq!(record.file_size, 10);
        assert!(record.url.contains("notes.pdf"));
        assert_eq!(record.storage_backend, StorageBackend::Local);

        let (_, resolved) = h.service.resolve(record.id).await.unwrap();
        match resolved {
            Resolved::Stream { stream, content_type, filename } => {
                assert_eq!(content_type, "application/pdf");
                assert_eq!(filename, "notes.pdf");
                assert_eq!(collect(stream).await, data);
            }
            Resolved::Redirect(_) => panic!("Local records stream directly"),
        }

        let listed = h.service.list(&RecordFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, record.id);
    }

    #[tokio::test]
    async fn test_concurrent_identical_uploads_coexist() {
        let h = harness().await;

        let (a, b) = tokio::join!(
            h.service.ingest(upload("Basics", "notes.pdf", b"first contents")),
            h.service.ingest(upload("Basics", "notes.pdf", b"second bytes")),
        );
        let a = a.unwrap();
        let b = b.unwrap();

        assert_ne!(a.id, b.id);
        assert_ne!(a.storage_key, b.storage_key);

        let listed = h.service.list(&RecordFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_program_writes_nothing() {
        let h = harness().await;

        let err = h
            .service
            .ingest(upload("Invalid", "notes.pdf", b"data"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        assert_eq!(h.records.count().await.unwrap(), 0);
        let listed = h.service.list(&RecordFilter::default()).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_empty_file_rejected() {
        let h = harness().await;
        let err = h
            .service
            .ingest(upload("Basics", "notes.pdf", b""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(h.records.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let h = harness().await;
        let mut request = upload("Basics", "notes.pdf", b"data");
        request.subject = String::new();
        let err = h.service.ingest(request).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_listing_is_recency_ordered() {
        let h = harness().await;

        let mut ids = Vec::new();
        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            let record = h.service.ingest(upload("Basics", name, b"data")).await.unwrap();
            ids.push(record.id);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let listed = h.service.list(&RecordFilter::default()).await.unwrap();
        let listed_ids: Vec<Uuid> = listed.iter().map(|r| r.id).collect();
        ids.reverse();
        assert_eq!(listed_ids, ids);
    }

    #[tokio::test]
    async fn test_listing_filters_by_program() {
        let h = harness().await;
        h.service.ingest(upload("Basics", "a.pdf", b"x")).await.unwrap();
        h.service
            .ingest(upload("Diploma in ICT", "b.pdf", b"x"))
            .await
            .unwrap();

        let basics = h
            .service
            .list(&RecordFilter {
                program: Some("Basics".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(basics.len(), 1);
        assert_eq!(basics[0].program, "Basics");

        let none = h
            .service
            .list(&RecordFilter {
                program: Some("Bachelors of Arts".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_basics_scenario() {
        let h = harness().await;

        let record = h
            .service
            .ingest(UploadRequest {
                program: "Basics".to_string(),
                semester: "1".to_string(),
                subject: "Math".to_string(),
                data: b"0123456789".to_vec(),
                filename: "notes.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                owner_identity: None,
            })
            .await
            .unwrap();

        assert!(record.url.contains("notes.pdf"));
        assert!(record.storage_key.starts_with("Basics/1/Math/"));

        let listed = h.service.list(&RecordFilter::default()).await.unwrap();
        assert_eq!(listed[0].id, record.id);
    }

    // ----- failure doubles -----

    /// Blob backend that rejects every write.
    struct FailingStorage;

    #[async_trait::async_trait]
    impl Storage for FailingStorage {
        async fn put(
            &self,
            _storage_key: &str,
            _content_type: &str,
            _data: Vec<u8>,
        ) -> StorageResult<StoredObject> {
            Err(StorageError::UploadFailed("backend unreachable".to_string()))
        }

        async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
            Err(StorageError::NotFound(key.to_string()))
        }

        async fn download_stream(&self, key: &str) -> StorageResult<ByteStream> {
            Err(StorageError::NotFound(key.to_string()))
        }

        async fn delete(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }

        async fn exists(&self, _key: &str) -> StorageResult<bool> {
            Ok(false)
        }

        fn public_url(&self, key: &str) -> String {
            format!("failing://{}", key)
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Local
        }

        fn serves_publicly(&self) -> bool {
            true
        }
    }

    /// Record store whose inserts fail, capturing the attempted record.
    struct FailingRecordStore {
        inner: InMemoryFileRecordStore,
        last_attempted: Mutex<Option<FileRecord>>,
    }

    #[async_trait::async_trait]
    impl FileRecordStore for FailingRecordStore {
        async fn insert(&self, record: &FileRecord) -> Result<(), AppError> {
            *self.last_attempted.lock().unwrap() = Some(record.clone());
            Err(AppError::Internal("metadata store down".to_string()))
        }

        async fn list(&self, filter: &RecordFilter) -> Result<Vec<FileRecord>, AppError> {
            self.inner.list(filter).await
        }

        async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
            self.inner.get(id).await
        }

        async fn find_by_location(
            &self,
            backend: StorageBackend,
            storage_key: &str,
        ) -> Result<Option<FileRecord>, AppError> {
            self.inner.find_by_location(backend, storage_key).await
        }

        async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
            self.inner.delete(id).await
        }

        async fn count(&self) -> Result<i64, AppError> {
            self.inner.count().await
        }
    }

    #[tokio::test]
    async fn test_blob_failure_creates_no_metadata() {
        let records = Arc::new(InMemoryFileRecordStore::new());
        let mut backends: HashMap<StorageBackend, Arc<dyn Storage>> = HashMap::new();
        backends.insert(StorageBackend::Local, Arc::new(FailingStorage));
        let router = Arc::new(StorageRouter::new(StorageBackend::Local, backends).unwrap());
        let service = IngestService::new(records.clone(), router, None);

        let err = service
            .ingest(upload("Basics", "notes.pdf", b"data"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(records.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_metadata_failure_leaves_documented_orphan() {
        let dir = tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(dir.path(), "http://localhost:3000/uploads".to_string())
                .await
                .unwrap(),
        );
        let mut backends: HashMap<StorageBackend, Arc<dyn Storage>> = HashMap::new();
        backends.insert(StorageBackend::Local, storage.clone());
        let router = Arc::new(StorageRouter::new(StorageBackend::Local, backends).unwrap());

        let records = Arc::new(FailingRecordStore {
            inner: InMemoryFileRecordStore::new(),
            last_attempted: Mutex::new(None),
        });
        let service = IngestService::new(records.clone(), router, None);

        let err = service
            .ingest(upload("Basics", "notes.pdf", b"data"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Metadata(_)));

        // The blob is physically present but absent from listings.
        let attempted = records.last_attempted.lock().unwrap().clone().unwrap();
        assert!(storage.exists(&attempted.storage_key).await.unwrap());
        assert!(service.list(&RecordFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_distinguishes_unknown_id_from_missing_blob() {
        let h = harness().await;

        let err = h.service.resolve(Uuid::new_v4()).await.unwrap_err();
        match err {
            AppError::NotFound(msg) => assert!(msg.contains("record")),
            _ => panic!("Expected NotFound"),
        }

        let record = h
            .service
            .ingest(upload("Basics", "notes.pdf", b"data"))
            .await
            .unwrap();
        h.storage.delete(&record.storage_key).await.unwrap();

        let err = h.service.resolve(record.id).await.unwrap_err();
        match err {
            AppError::NotFound(msg) => assert!(msg.contains("storage")),
            _ => panic!("Expected NotFound"),
        }
    }

    #[tokio::test]
    async fn test_remove_deletes_row() {
        let h = harness().await;
        let record = h
            .service
            .ingest(upload("Basics", "notes.pdf", b"data"))
            .await
            .unwrap();

        h.service.remove(record.id).await.unwrap();
        assert!(h.service.list(&RecordFilter::default()).await.unwrap().is_empty());

        let err = h.service.remove(record.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sizes_route_to_overflow_backend() {
        let dir = tempdir().unwrap();
        let small: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(dir.path().join("small"), "http://localhost/small".to_string())
                .await
                .unwrap(),
        );
        let big: Arc<dyn Storage> = Arc::new(
            RelabeledStorage {
                inner: LocalStorage::new(dir.path().join("big"), "http://localhost/big".to_string())
                    .await
                    .unwrap(),
            },
        );
        let mut backends: HashMap<StorageBackend, Arc<dyn Storage>> = HashMap::new();
        backends.insert(StorageBackend::Local, small);
        backends.insert(StorageBackend::Drive, big);
        let router = Arc::new(
            StorageRouter::new(StorageBackend::Local, backends)
                .unwrap()
                .with_overflow(16, StorageBackend::Drive)
                .unwrap(),
        );
        let records = Arc::new(InMemoryFileRecordStore::new());
        let service = IngestService::new(records, router, None);

        let small_record = service
            .ingest(upload("Basics", "small.pdf", b"tiny"))
            .await
            .unwrap();
        assert_eq!(small_record.storage_backend, StorageBackend::Local);

        let big_record = service
            .ingest(upload("Basics", "big.pdf", &[0u8; 64]))
            .await
            .unwrap();
        assert_eq!(big_record.storage_backend, StorageBackend::Drive);
    }

    /// Local storage reporting itself as the drive backend, for routing tests.
    struct RelabeledStorage {
        inner: LocalStorage,
    }

    #[async_trait::async_trait]
    impl Storage for RelabeledStorage {
        async fn put(
            &self,
            storage_key: &str,
            content_type: &str,
            data: Vec<u8>,
        ) -> StorageResult<StoredObject> {
            self.inner.put(storage_key, content_type, data).await
        }

        async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
            self.inner.download(key).await
        }

        async fn download_stream(&self, key: &str) -> StorageResult<ByteStream> {
            self.inner.download_stream(key).await
        }

        async fn delete(&self, key: &str) -> StorageResult<()> {
            self.inner.delete(key).await
        }

        async fn exists(&self, key: &str) -> StorageResult<bool> {
            self.inner.exists(key).await
        }

        fn public_url(&self, key: &str) -> String {
            self.inner.public_url(key)
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Drive
        }

        fn serves_publicly(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_notify_prunes_nothing_and_never_fails_ingest() {
        // Push configured against an unroutable endpoint: ingest must still succeed.
        let dir = tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(dir.path(), "http://localhost:3000/uploads".to_string())
                .await
                .unwrap(),
        );
        let mut backends: HashMap<StorageBackend, Arc<dyn Storage>> = HashMap::new();
        backends.insert(StorageBackend::Local, storage);
        let router = Arc::new(StorageRouter::new(StorageBackend::Local, backends).unwrap());

        let subscriptions = Arc::new(notehive_db::InMemorySubscriptionStore::new());
        subscriptions.upsert("token-1", None).await.unwrap();
        let push = PushService::new(
            subscriptions,
            notehive_infra::PushServiceConfig {
                api_url: "http://127.0.0.1:1/unroutable".to_string(),
                server_key: "test".to_string(),
                timeout_seconds: 1,
                max_concurrent_deliveries: 2,
            },
        )
        .unwrap();

        let records = Arc::new(InMemoryFileRecordStore::new());
        let service = IngestService::new(records, router, Some(push));

        let record = service
            .ingest(upload("Basics", "notes.pdf", b"data"))
            .await
            .unwrap();
        assert_eq!(record.filename, "notes.pdf");
    }
}
