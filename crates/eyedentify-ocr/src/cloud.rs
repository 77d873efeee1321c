use std::sync::Arc;

use async_trait::async_trait;
use eyedentify_config::detector::DetectorConfig;
use eyedentify_config::ocr::OcrConfig;
use eyedentify_detect::{InferenceClient, jpeg_base64};
use image::DynamicImage;
use serde::Deserialize;

use crate::{RecognizeError, TextRecognizer};

/// Text recognizer backed by a hosted image-to-text model
#[derive(Clone)]
pub struct CloudTextRecognizer {
    client: InferenceClient,
    model: String,
    jpeg_quality: u8,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecognitionResponse {
    Generated(Vec<GeneratedText>),
    Plain { text: String },
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

impl RecognitionResponse {
    fn into_text(self) -> String {
        match self {
            RecognitionResponse::Generated(items) => items
                .into_iter()
                .map(|g| g.generated_text.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            RecognitionResponse::Plain { text } => text.trim().to_string(),
        }
    }
}

impl CloudTextRecognizer {
    pub fn new(client: InferenceClient, model: String, jpeg_quality: u8) -> Self {
        Self {
            client,
            model,
            jpeg_quality,
        }
    }

    /// Shares the detector's endpoint and credentials, with the OCR model
    pub fn from_config(detector: &DetectorConfig, ocr: &OcrConfig) -> Result<Self, RecognizeError> {
        Ok(Self::new(
            InferenceClient::from_config(detector)?,
            ocr.model.clone(),
            detector.jpeg_quality,
        ))
    }
}

fn parse_text(body: serde_json::Value) -> Result<String, RecognizeError> {
    serde_json::from_value::<RecognitionResponse>(body)
        .map(RecognitionResponse::into_text)
        .map_err(|e| RecognizeError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl TextRecognizer for CloudTextRecognizer {
    fn name(&self) -> &str {
        "cloud-ocr"
    }

    async fn recognize(&self, image: Arc<DynamicImage>) -> Result<String, RecognizeError> {
        let encoded = jpeg_base64(image, self.jpeg_quality).await?;
        let body: serde_json::Value = self.client.post_image(&self.model, &encoded).await?;

        let text = parse_text(body)?;
        tracing::debug!("Text recognition completed: {} chars", text.len());
        Ok(text)
    }
}
