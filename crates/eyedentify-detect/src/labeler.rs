use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;

use crate::{DetectError, DetectionResult, Detector};

/// Whole-image label from an in-process model
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub confidence: f32,
}

/// In-process image labeling model
pub trait LabelModel: Send + Sync + 'static {
    /// Label the image. Called on the blocking pool.
    fn label(&self, image: &DynamicImage) -> Result<Vec<Label>, DetectError>;
}

/// Detector running a [`LabelModel`] locally, without network access
pub struct OnDeviceLabeler<M> {
    model: Arc<M>,
    confidence_threshold: f32,
}

impl<M: LabelModel> OnDeviceLabeler<M> {
    pub fn new(model: M, confidence_threshold: f32) -> Self {
        Self {
            model: Arc::new(model),
            confidence_threshold,
        }
    }
}

#[async_trait]
impl<M: LabelModel> Detector for OnDeviceLabeler<M> {
    fn name(&self) -> &str {
        "on-device"
    }

    async fn detect(&self, image: Arc<DynamicImage>) -> Result<Vec<DetectionResult>, DetectError> {
        let model = Arc::clone(&self.model);
        let labels = tokio::task::spawn_blocking(move || model.label(&image))
            .await
            .map_err(|e| DetectError::Inference(format!("labeling task failed: {}", e)))??;

        let total = labels.len();
        let results: Vec<DetectionResult> = labels
            .into_iter()
            .filter(|l| l.confidence >= self.confidence_threshold)
            .map(|l| DetectionResult::new(l.text, l.confidence))
            .collect();

        tracing::debug!(
            "On-device labeler kept {}/{} labels above {}",
            results.len(),
            total,
            self.confidence_threshold
        );

        Ok(results)
    }
}
