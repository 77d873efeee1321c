use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use self::detector::DetectorConfig;
use self::ocr::OcrConfig;
use self::store::StoreConfig;

pub mod detector;
pub mod ocr;
pub mod store;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detector: DetectorConfig,
    pub ocr: OcrConfig,
    pub store: StoreConfig,

    /// App main loop delta time
    pub delta_time: u64,
    /// Emit logs as JSON lines instead of human readable text
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            ocr: OcrConfig::default(),
            store: StoreConfig::default(),
            delta_time: 100,
            log_json: false,
        }
    }
}

impl Config {
    /// Build the config from environment variables, falling back to defaults
    pub fn new() -> Self {
        let delta_time = env_parse("DELTA_TIME_MS").unwrap_or(100); // 100ms default
        let log_json = env_parse("LOG_JSON").unwrap_or(false);

        Config {
            detector: DetectorConfig::new(),
            ocr: OcrConfig::new(),
            store: StoreConfig::new(),

            delta_time,
            log_json,
        }
    }

    /// Load a JSON profile. Missing fields take their defaults.
    ///
    /// The API token is secret and usually lives in the environment, so an
    /// empty token in the file is filled from `HF_API_TOKEN`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!("Loading config from {}", path.display());
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut config: Config = serde_json::from_reader(reader)?;

        if config.detector.api_token.is_empty()
            && let Ok(token) = env::var("HF_API_TOKEN")
        {
            config.detector.api_token = token;
        }

        Ok(config)
    }
}

pub(crate) fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
