use std::sync::Arc;

use eyedentify_detect::FallbackDetector;
use eyedentify_ocr::TextRecognizer;
use eyedentify_store::{ScanRecordStore, StoreError};
use eyedentify_types::{NO_TEXT_DETECTED, ScanRecord};
use image::DynamicImage;
use tokio_util::sync::CancellationToken;

use crate::image_source::{ImageLoadError, ImageSource};

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Failed to load image: {0}")]
    ImageLoadFailed(#[source] ImageLoadError),

    #[error("Failed to save scan: {0}")]
    PersistFailed(#[source] StoreError),

    #[error("Scan cancelled")]
    Cancelled,
}

impl ProcessingError {
    /// Whether asking the user to try again makes sense
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProcessingError::PersistFailed(_))
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ProcessingError::ImageLoadFailed(_) => "Failed to load image",
            ProcessingError::PersistFailed(_) => "Failed to save scan data",
            ProcessingError::Cancelled => "Scan cancelled",
        }
    }
}

/// Turns one captured image into one persisted [`ScanRecord`].
///
/// Object detection and text recognition run concurrently and are joined
/// before anything is written. The record is inserted exactly once.
#[derive(Clone)]
pub struct ScanWorkflow {
    images: Arc<dyn ImageSource>,
    detector: Arc<FallbackDetector>,
    recognizer: Arc<dyn TextRecognizer>,
    store: Arc<dyn ScanRecordStore>,
}

impl ScanWorkflow {
    pub fn new(
        images: Arc<dyn ImageSource>,
        detector: Arc<FallbackDetector>,
        recognizer: Arc<dyn TextRecognizer>,
        store: Arc<dyn ScanRecordStore>,
    ) -> Self {
        Self {
            images,
            detector,
            recognizer,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn ScanRecordStore> {
        &self.store
    }

    pub async fn process(&self, image_uri: &str) -> Result<ScanRecord, ProcessingError> {
        self.process_with_cancel(image_uri, &CancellationToken::new())
            .await
    }

    /// Like [`ScanWorkflow::process`], abandoning the analyses when `cancel` fires.
    /// A cancelled scan is never persisted.
    pub async fn process_with_cancel(
        &self,
        image_uri: &str,
        cancel: &CancellationToken,
    ) -> Result<ScanRecord, ProcessingError> {
        tracing::debug!("Starting to process image: {}", image_uri);

        let mut record = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Scan of {} cancelled during analysis", image_uri);
                return Err(ProcessingError::Cancelled);
            }
            record = self.analyze(image_uri) => record?,
        };

        if cancel.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }

        let id = self.store.insert(&record).await.map_err(|e| {
            tracing::error!("Error saving scan of {}: {}", image_uri, e);
            ProcessingError::PersistFailed(e)
        })?;
        record.id = id;

        tracing::info!(
            "Scan saved (id={}): {} objects, text: {}",
            record.id,
            record.detected_objects.len(),
            record.has_text()
        );
        Ok(record)
    }

    async fn analyze(&self, image_uri: &str) -> Result<ScanRecord, ProcessingError> {
        let image = self.images.load(image_uri).await.map_err(|e| {
            tracing::error!("Failed to load image {}: {}", image_uri, e);
            ProcessingError::ImageLoadFailed(e)
        })?;
        let image = Arc::new(image);

        let (objects, text) = tokio::join!(
            self.detector.detect_objects(Arc::clone(&image)),
            self.recognize_text(image),
        );

        Ok(ScanRecord::new(image_uri, text, objects))
    }

    async fn recognize_text(&self, image: Arc<DynamicImage>) -> String {
        match self.recognizer.recognize(image).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => NO_TEXT_DETECTED.to_string(),
            Err(e) => {
                tracing::warn!("Text detection with {} failed: {}", self.recognizer.name(), e);
                NO_TEXT_DETECTED.to_string()
            }
        }
    }
}
