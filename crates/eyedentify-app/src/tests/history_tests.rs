//! History watcher recovery when the store refuses subscriptions

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use eyedentify_config::Config;
use eyedentify_core::{FsImageSource, ScanWorkflow};
use eyedentify_detect::FallbackDetector;
use eyedentify_ocr::DisabledRecognizer;
use eyedentify_store::{MemoryStore, RecordQuery, ScanRecordStore, StoreError, Subscription};
use eyedentify_types::{AppEvent, ScanRecord};
use kanal::{AsyncReceiver, unbounded_async};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::history::history_loop;
use crate::state::AppState;

/// Refuses the first `failures` queries, then behaves like the wrapped store
struct FlakyStore {
    inner: MemoryStore,
    failures: usize,
    queries: AtomicUsize,
}

#[async_trait]
impl ScanRecordStore for FlakyStore {
    async fn insert(&self, record: &ScanRecord) -> Result<String, StoreError> {
        self.inner.insert(record).await
    }

    async fn query(&self, query: RecordQuery) -> Result<Subscription, StoreError> {
        if self.queries.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(StoreError::Backend("connection reset".into()));
        }
        self.inner.query(query).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<ScanRecord>, StoreError> {
        self.inner.get_by_id(id).await
    }

    async fn update(&self, record: &ScanRecord) -> Result<(), StoreError> {
        self.inner.update(record).await
    }

    async fn delete(&self, record: &ScanRecord) -> Result<(), StoreError> {
        self.inner.delete(record).await
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.inner.delete_all().await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.inner.count().await
    }
}

fn watch(
    store: Arc<dyn ScanRecordStore>,
) -> (AsyncReceiver<AppEvent>, CancellationToken, JoinHandle<anyhow::Result<()>>) {
    let workflow = ScanWorkflow::new(
        Arc::new(FsImageSource),
        Arc::new(FallbackDetector::default()),
        Arc::new(DisabledRecognizer),
        store,
    );
    let config = Config {
        delta_time: 5,
        ..Config::default()
    };
    let state = Arc::new(AppState::with_workflow(config, workflow));

    let (ui_tx, ui) = unbounded_async::<AppEvent>();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(history_loop(state, ui_tx, cancel.child_token()));
    (ui, cancel, task)
}

async fn next_event(ui: &AsyncReceiver<AppEvent>) -> AppEvent {
    timeout(Duration::from_secs(2), ui.recv())
        .await
        .expect("Timeout waiting for UI event")
        .expect("ui channel open")
}

#[tokio::test]
async fn refused_subscription_is_retried() {
    let inner = MemoryStore::default();
    inner
        .insert(&ScanRecord::new("a.jpg", "hi", vec![]))
        .await
        .unwrap();
    let store = Arc::new(FlakyStore {
        inner,
        failures: 1,
        queries: AtomicUsize::new(0),
    });
    let (ui, cancel, task) = watch(store.clone());

    assert!(matches!(
        next_event(&ui).await,
        AppEvent::StatusUpdate { ref status, scanning: false } if status == "Error loading history"
    ));
    match next_event(&ui).await {
        AppEvent::HistoryUpdated(records) => assert_eq!(records.len(), 1),
        other => panic!("Expected history, got {:?}", other),
    }
    assert_eq!(store.queries.load(Ordering::SeqCst), 2);
    assert!(!task.is_finished());

    cancel.cancel();
    let result = timeout(Duration::from_secs(2), task)
        .await
        .expect("watcher should stop on cancel")
        .expect("watcher panicked");
    assert!(result.is_ok());
}

#[tokio::test]
async fn closed_store_keeps_watcher_alive_and_reports_once() {
    let store = MemoryStore::default();
    store.close();
    let (ui, cancel, task) = watch(Arc::new(store));

    assert!(matches!(
        next_event(&ui).await,
        AppEvent::StatusUpdate { ref status, .. } if status == "Error loading history"
    ));

    // Many 50ms retry rounds pass without another status or an exit
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!task.is_finished());
    assert!(matches!(ui.try_recv(), Ok(None)));

    cancel.cancel();
    let result = timeout(Duration::from_secs(2), task)
        .await
        .expect("watcher should stop on cancel")
        .expect("watcher panicked");
    assert!(result.is_ok());
}
