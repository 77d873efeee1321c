use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

fn default_base_url() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_model() -> String {
    "facebook/detr-resnet-50".to_string()
}

fn default_fallback_models() -> Vec<String> {
    vec!["hustvl/yolos-tiny".to_string()]
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_confidence_threshold() -> f32 {
    0.7
}

/// Cloud detector and on-device labeler settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DetectorConfig {
    #[serde(default = "default_enabled")]
    pub cloud_enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Models tried in order when the primary model fails or finds nothing
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,
    /// Bearer token for the inference endpoint
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// ONNX image classifier run on-device after every cloud model
    #[serde(default)]
    pub labeler_model_path: Option<PathBuf>,
    /// Class names for the classifier, one per line in output order
    #[serde(default)]
    pub labeler_labels_path: Option<PathBuf>,
    /// Labels below this confidence are dropped by the on-device labeler
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            cloud_enabled: default_enabled(),
            base_url: default_base_url(),
            model: default_model(),
            fallback_models: default_fallback_models(),
            api_token: String::new(),
            timeout_seconds: default_timeout_seconds(),
            jpeg_quality: default_jpeg_quality(),
            labeler_model_path: None,
            labeler_labels_path: None,
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

impl DetectorConfig {
    pub fn new() -> Self {
        let defaults = Self::default();

        Self {
            cloud_enabled: crate::env_parse("DETECTOR_CLOUD_ENABLED")
                .unwrap_or(defaults.cloud_enabled),
            base_url: env::var("DETECTOR_BASE_URL").unwrap_or(defaults.base_url),
            model: env::var("DETECTOR_MODEL").unwrap_or(defaults.model),
            fallback_models: env::var("DETECTOR_FALLBACK_MODELS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or(defaults.fallback_models),
            api_token: env::var("HF_API_TOKEN").unwrap_or_default(),
            timeout_seconds: crate::env_parse("DETECTOR_TIMEOUT_SECONDS")
                .unwrap_or(defaults.timeout_seconds),
            jpeg_quality: crate::env_parse("JPEG_QUALITY")
                .map(|q: u8| q.clamp(1, 100))
                .unwrap_or(defaults.jpeg_quality),
            labeler_model_path: env::var_os("LABELER_MODEL_PATH").map(PathBuf::from),
            labeler_labels_path: env::var_os("LABELER_LABELS_PATH").map(PathBuf::from),
            confidence_threshold: crate::env_parse("LABELER_CONFIDENCE_THRESHOLD")
                .unwrap_or(defaults.confidence_threshold),
        }
    }

    /// Full endpoint URL for the configured model
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), self.model)
    }
}
