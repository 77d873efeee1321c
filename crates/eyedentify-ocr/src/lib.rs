use std::sync::Arc;

use image::DynamicImage;

mod cloud;

pub use cloud::CloudTextRecognizer;

/// Text recognition provider interface
#[async_trait::async_trait]
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &str;

    /// Recognize all text in the image. Empty string when there is none.
    async fn recognize(&self, image: Arc<DynamicImage>) -> Result<String, RecognizeError>;
}

/// Recognizer used when text recognition is switched off
pub struct DisabledRecognizer;

#[async_trait::async_trait]
impl TextRecognizer for DisabledRecognizer {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn recognize(&self, _image: Arc<DynamicImage>) -> Result<String, RecognizeError> {
        Err(RecognizeError::Disabled)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecognizeError {
    #[error("Recognition backend error: {0}")]
    Backend(#[from] eyedentify_detect::DetectError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Text recognition disabled")]
    Disabled,
}
