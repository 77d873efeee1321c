use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;

/// Scan status information
#[derive(Clone, Debug, Default)]
pub struct ScanStatus {
    /// Scans currently in flight
    pub in_flight: usize,
    pub last_scan_time: Option<SystemTime>,
    pub scan_count: u64,
    pub error_count: u64,
    pub current_message: String,
}

impl ScanStatus {
    pub fn started(&mut self) {
        self.in_flight += 1;
        self.current_message = "Scanning...".to_string();
    }

    pub fn finished(&mut self, ok: bool, message: impl Into<String>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.last_scan_time = Some(SystemTime::now());
        if ok {
            self.scan_count += 1;
        } else {
            self.error_count += 1;
        }
        self.current_message = message.into();
    }

    pub fn scanning(&self) -> bool {
        self.in_flight > 0
    }
}

/// Application status
pub struct AppStatus {
    pub scan: Arc<RwLock<ScanStatus>>,
}

impl AppStatus {
    pub fn new() -> Self {
        Self {
            scan: Arc::new(RwLock::new(ScanStatus::default())),
        }
    }
}

impl Default for AppStatus {
    fn default() -> Self {
        Self::new()
    }
}
