use std::sync::Arc;

use eyedentify_config::Config;
use eyedentify_core::{FsImageSource, ScanWorkflow};
use eyedentify_store::{MemoryStore, ScanRecordStore};
use eyedentify_types::ScanRecord;
use tokio::sync::RwLock;

use crate::detectors;
use crate::status::AppStatus;

pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    pub workflow: ScanWorkflow,
    /// Latest snapshot delivered by the history subscription
    pub history: RwLock<Vec<ScanRecord>>,
    pub status: AppStatus,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let detector = detectors::build_detector_chain(&config)?;
        let recognizer = detectors::build_recognizer(&config)?;
        let store: Arc<dyn ScanRecordStore> = Arc::new(MemoryStore::new(&config.store));

        let workflow = ScanWorkflow::new(
            Arc::new(FsImageSource),
            Arc::new(detector),
            recognizer,
            store,
        );

        Ok(Self::with_workflow(config, workflow))
    }

    pub fn with_workflow(config: Config, workflow: ScanWorkflow) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            workflow,
            history: RwLock::new(Vec::new()),
            status: AppStatus::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ScanRecordStore> {
        self.workflow.store()
    }
}
