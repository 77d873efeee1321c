use std::env;

use serde::{Deserialize, Serialize};

fn default_collection() -> String {
    "scan_history".to_string()
}

fn default_subscription_capacity() -> usize {
    16
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// Document collection holding scan records
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Snapshots buffered per live subscription before the producer waits
    #[serde(default = "default_subscription_capacity")]
    pub subscription_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            subscription_capacity: default_subscription_capacity(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self {
            collection: env::var("STORE_COLLECTION").unwrap_or_else(|_| default_collection()),
            subscription_capacity: crate::env_parse("SUBSCRIPTION_CAPACITY")
                .filter(|c: &usize| *c > 0)
                .unwrap_or_else(default_subscription_capacity),
        }
    }
}
