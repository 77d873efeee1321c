use std::sync::Arc;

use image::DynamicImage;

pub use eyedentify_types::{BoundingBox, DetectionResult, format_detection};

mod cloud;
mod encode;
mod fallback;
mod inference;
mod labeler;
mod onnx;

pub use cloud::CloudDetector;
pub use encode::{encode_jpeg, jpeg_base64};
pub use fallback::{Attempt, AttemptOutcome, DetectionReport, FallbackDetector};
pub use inference::InferenceClient;
pub use labeler::{Label, LabelModel, OnDeviceLabeler};
pub use onnx::OnnxLabelModel;

/// Object detection strategy interface
#[async_trait::async_trait]
pub trait Detector: Send + Sync {
    /// Short name used in logs and detection reports
    fn name(&self) -> &str;

    /// Detect objects in the image, in the order the provider ranks them
    async fn detect(&self, image: Arc<DynamicImage>) -> Result<Vec<DetectionResult>, DetectError>;

    /// Fail-closed variant of [`Detector::detect`]: errors become an empty result
    async fn detect_or_empty(&self, image: Arc<DynamicImage>) -> Vec<DetectionResult> {
        match self.detect(image).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("{} detection failed: {}", self.name(), e);
                Vec::new()
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Authentication error")]
    Authentication,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Image encoding failed: {0}")]
    Encode(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}
