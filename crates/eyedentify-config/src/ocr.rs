use std::env;

use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

fn default_model() -> String {
    "microsoft/trocr-base-printed".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OcrConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Text recognition model served by the same inference endpoint as the detector
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            model: default_model(),
        }
    }
}

impl OcrConfig {
    pub fn new() -> Self {
        Self {
            enabled: crate::env_parse("OCR_ENABLED").unwrap_or_else(default_enabled),
            model: env::var("OCR_MODEL").unwrap_or_else(|_| default_model()),
        }
    }
}
