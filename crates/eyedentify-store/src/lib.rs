use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyedentify_types::ScanRecord;

mod memory;
mod query;
mod subscription;

pub use memory::MemoryStore;
pub use query::RecordQuery;
pub use subscription::{Snapshot, Subscription, SubscriptionSink};

/// Scan history persistence interface
///
/// Writes are single-shot. Reads come back as live [`Subscription`]s that
/// re-emit the full result set after every change.
#[async_trait]
pub trait ScanRecordStore: Send + Sync {
    /// Store a new record and return its id. A blank id is replaced with a fresh UUID.
    async fn insert(&self, record: &ScanRecord) -> Result<String, StoreError>;

    /// Live view of records matching `query`
    async fn query(&self, query: RecordQuery) -> Result<Subscription, StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<ScanRecord>, StoreError>;

    /// Full replace keyed by id. Blank ids are rejected.
    async fn update(&self, record: &ScanRecord) -> Result<(), StoreError>;

    /// Remove the record. Records without an id are ignored.
    async fn delete(&self, record: &ScanRecord) -> Result<(), StoreError>;

    async fn delete_all(&self) -> Result<(), StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    /// All records, newest first
    async fn subscribe(&self) -> Result<Subscription, StoreError> {
        self.query(RecordQuery::All).await
    }

    /// Records whose text starts with `prefix`, ordered by text
    async fn query_by_text_prefix(&self, prefix: &str) -> Result<Subscription, StoreError> {
        self.query(RecordQuery::TextPrefix(prefix.to_string())).await
    }

    /// Records with `start <= timestamp <= end`, newest first
    async fn query_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Subscription, StoreError> {
        self.query(RecordQuery::TimeRange { start, end }).await
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Record id must not be blank for update")]
    MissingId,

    #[error("Store closed")]
    Closed,

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Malformed document {id}: {message}")]
    Serialization { id: String, message: String },
}
