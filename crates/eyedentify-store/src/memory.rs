use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use eyedentify_config::store::StoreConfig;
use eyedentify_types::ScanRecord;
use serde_json::Value;
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;

use crate::{RecordQuery, ScanRecordStore, StoreError, Subscription};

/// In-process document collection with live queries.
///
/// Documents are kept in their serialized form, keyed by id, the way the
/// remote collection stores them. Every write bumps a change counter that
/// wakes the subscription pumps.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    collection: String,
    documents: RwLock<HashMap<String, Value>>,
    changes: watch::Sender<u64>,
    closed: CancellationToken,
    subscription_capacity: usize,
}

impl MemoryStore {
    pub fn new(config: &StoreConfig) -> Self {
        let (changes, _) = watch::channel(0);

        Self {
            inner: Arc::new(Inner {
                collection: config.collection.clone(),
                documents: RwLock::new(HashMap::new()),
                changes,
                closed: CancellationToken::new(),
                subscription_capacity: config.subscription_capacity,
            }),
        }
    }

    /// Make the store unavailable: live subscriptions report [`StoreError::Closed`]
    /// once and end, later calls fail with the same error.
    pub fn close(&self) {
        tracing::warn!("Closing collection {}", self.inner.collection);
        self.inner.closed.cancel();
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.inner.closed.is_cancelled() {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

impl Inner {
    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    async fn snapshot(&self, query: &RecordQuery) -> Vec<ScanRecord> {
        let documents = self.documents.read().await;
        let records = documents.iter().filter_map(|(id, doc)| match decode(id, doc) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping document in {}: {}", self.collection, e);
                None
            }
        });
        query.apply(records)
    }
}

fn encode(id: &str, record: &ScanRecord) -> Result<Value, StoreError> {
    let document = ScanRecord {
        id: id.to_string(),
        ..record.clone()
    };

    serde_json::to_value(&document).map_err(|e| StoreError::Serialization {
        id: id.to_string(),
        message: e.to_string(),
    })
}

fn decode(id: &str, document: &Value) -> Result<ScanRecord, StoreError> {
    let mut record: ScanRecord =
        serde_json::from_value(document.clone()).map_err(|e| StoreError::Serialization {
            id: id.to_string(),
            message: e.to_string(),
        })?;
    // The document key is authoritative
    record.id = id.to_string();
    Ok(record)
}

#[async_trait]
impl ScanRecordStore for MemoryStore {
    async fn insert(&self, record: &ScanRecord) -> Result<String, StoreError> {
        self.ensure_open()?;

        let id = if record.has_id() {
            record.id.clone()
        } else {
            uuid::Uuid::new_v4().to_string()
        };

        let document = encode(&id, record)?;
        self.inner.documents.write().await.insert(id.clone(), document);
        self.inner.notify();

        tracing::debug!("Scan saved to {} (id={})", self.inner.collection, id);
        Ok(id)
    }

    async fn query(&self, query: RecordQuery) -> Result<Subscription, StoreError> {
        self.ensure_open()?;

        let (sink, subscription) = Subscription::channel(self.inner.subscription_capacity);
        let inner = Arc::clone(&self.inner);
        let mut changes = inner.changes.subscribe();

        tokio::spawn(async move {
            loop {
                if inner.closed.is_cancelled() {
                    sink.fail(StoreError::Closed).await;
                    return;
                }

                changes.borrow_and_update();
                let snapshot = inner.snapshot(&query).await;
                if !sink.emit(snapshot).await {
                    break;
                }

                tokio::select! {
                    biased;
                    _ = sink.cancelled() => break,
                    _ = inner.closed.cancelled() => {
                        sink.fail(StoreError::Closed).await;
                        return;
                    }
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            tracing::debug!("Live query on {} unsubscribed", inner.collection);
        });

        Ok(subscription)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<ScanRecord>, StoreError> {
        self.ensure_open()?;

        let documents = self.inner.documents.read().await;
        documents.get(id).map(|doc| decode(id, doc)).transpose()
    }

    async fn update(&self, record: &ScanRecord) -> Result<(), StoreError> {
        if !record.has_id() {
            return Err(StoreError::MissingId);
        }
        self.ensure_open()?;

        let document = encode(&record.id, record)?;
        self.inner
            .documents
            .write()
            .await
            .insert(record.id.clone(), document);
        self.inner.notify();

        tracing::debug!("Scan updated (id={})", record.id);
        Ok(())
    }

    async fn delete(&self, record: &ScanRecord) -> Result<(), StoreError> {
        if !record.has_id() {
            return Ok(());
        }
        self.ensure_open()?;

        if self.inner.documents.write().await.remove(&record.id).is_some() {
            self.inner.notify();
            tracing::debug!("Scan deleted (id={})", record.id);
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.ensure_open()?;

        let removed = {
            let mut documents = self.inner.documents.write().await;
            let removed = documents.len();
            documents.clear();
            removed
        };
        self.inner.notify();

        tracing::info!("All scans deleted from {} ({} removed)", self.inner.collection, removed);
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.ensure_open()?;
        Ok(self.inner.documents.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use tokio::time::timeout;

    use super::*;
    use crate::Snapshot;

    async fn next(subscription: &mut Subscription) -> Snapshot {
        timeout(Duration::from_secs(2), subscription.next())
            .await
            .expect("timed out waiting for snapshot")
            .expect("subscription ended")
    }

    fn record(text: &str) -> ScanRecord {
        ScanRecord::new("file:///scans/photo.jpg", text, vec!["cup (90%)".to_string()])
    }

    #[tokio::test]
    async fn blank_id_gets_unique_id() {
        let store = MemoryStore::default();

        let mut ids = HashSet::new();
        for _ in 0..20 {
            let id = store.insert(&record("hello")).await.unwrap();
            assert!(!id.trim().is_empty());
            assert!(ids.insert(id.clone()));

            let stored = store.get_by_id(&id).await.unwrap().unwrap();
            assert_eq!(stored.id, id);
            assert_eq!(stored.detected_text, "hello");
            assert_eq!(stored.detected_objects, ["cup (90%)"]);
        }
        assert_eq!(store.count().await.unwrap(), 20);
    }

    #[tokio::test]
    async fn insert_keeps_existing_id() {
        let store = MemoryStore::default();
        let mut scan = record("kept");
        scan.id = "scan-1".into();

        assert_eq!(store.insert(&scan).await.unwrap(), "scan-1");
        assert!(store.get_by_id("scan-1").await.unwrap().is_some());
        assert!(store.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn subscription_emits_full_set_on_change() {
        let store = MemoryStore::default();
        let mut first = record("first");
        first.timestamp = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        store.insert(&first).await.unwrap();

        let mut live = store.subscribe().await.unwrap();
        assert_eq!(next(&mut live).await.unwrap().len(), 1);

        store.insert(&record("second")).await.unwrap();
        let snapshot = next(&mut live).await.unwrap();
        let texts: Vec<_> = snapshot.iter().map(|r| r.detected_text.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);
    }

    #[tokio::test]
    async fn delete_all_then_subscribe_emits_empty() {
        let store = MemoryStore::default();
        store.insert(&record("a")).await.unwrap();
        store.insert(&record("b")).await.unwrap();

        store.delete_all().await.unwrap();

        let mut live = store.subscribe().await.unwrap();
        assert!(next(&mut live).await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_requires_id_and_replaces() {
        let store = MemoryStore::default();
        assert!(matches!(
            store.update(&record("no id")).await,
            Err(StoreError::MissingId)
        ));

        let id = store.insert(&record("before")).await.unwrap();
        let mut scan = store.get_by_id(&id).await.unwrap().unwrap();
        scan.detected_text = "after".into();
        scan.detected_objects.clear();
        store.update(&scan).await.unwrap();

        let stored = store.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.detected_text, "after");
        assert!(stored.detected_objects.is_empty());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_ignores_blank_id() {
        let store = MemoryStore::default();
        let id = store.insert(&record("a")).await.unwrap();

        store.delete(&record("a")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        let scan = store.get_by_id(&id).await.unwrap().unwrap();
        store.delete(&scan).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn text_prefix_query_tracks_changes() {
        let store = MemoryStore::default();
        store.insert(&record("EXIT")).await.unwrap();
        store.insert(&record("No text detected")).await.unwrap();

        let mut live = store.query_by_text_prefix("EX").await.unwrap();
        assert_eq!(next(&mut live).await.unwrap().len(), 1);

        store.insert(&record("EXPRESS")).await.unwrap();
        let texts: Vec<_> = next(&mut live)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.detected_text)
            .collect();
        assert_eq!(texts, ["EXIT", "EXPRESS"]);
    }

    #[tokio::test]
    async fn time_range_query_filters() {
        let store = MemoryStore::default();
        for day in 1..=3 {
            let mut scan = record(&format!("day {day}"));
            scan.timestamp = Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap();
            store.insert(&scan).await.unwrap();
        }

        let mut live = store
            .query_by_time_range(
                Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 3, 3, 23, 59, 59).unwrap(),
            )
            .await
            .unwrap();
        let texts: Vec<_> = next(&mut live)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.detected_text)
            .collect();
        assert_eq!(texts, ["day 3", "day 2"]);
    }

    #[tokio::test]
    async fn close_surfaces_error_once() {
        let store = MemoryStore::default();
        let mut live = store.subscribe().await.unwrap();
        assert!(next(&mut live).await.unwrap().is_empty());

        store.close();

        assert!(matches!(next(&mut live).await, Err(StoreError::Closed)));
        assert!(live.next().await.is_none());
        assert!(matches!(store.insert(&record("late")).await, Err(StoreError::Closed)));
        assert!(matches!(store.subscribe().await, Err(StoreError::Closed)));
    }

    #[tokio::test]
    async fn malformed_documents_are_skipped() {
        let store = MemoryStore::default();
        store.insert(&record("good")).await.unwrap();
        store
            .inner
            .documents
            .write()
            .await
            .insert("broken".into(), serde_json::json!({ "imageUri": 42 }));

        let mut live = store.subscribe().await.unwrap();
        assert_eq!(next(&mut live).await.unwrap().len(), 1);
        assert!(matches!(
            store.get_by_id("broken").await,
            Err(StoreError::Serialization { .. })
        ));
    }
}
