use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored in place of recognized text when recognition fails or finds nothing
pub const NO_TEXT_DETECTED: &str = "No text detected";

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A photo was captured and should be scanned
    Capture {
        image_uri: String,
    },
    ClearHistory,
    ShowHistory,
    ScanCompleted(ScanRecord),
    ScanFailed {
        image_uri: String,
        message: String,
        retryable: bool,
    },
    HistoryUpdated(Vec<ScanRecord>),
    StatusUpdate {
        status: String,
        scanning: bool,
    },
    Quit,
}

/// Rectangle in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl BoundingBox {
    /// Build a box, swapping corners so that min <= max on both axes
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            xmin: x1.min(x2),
            ymin: y1.min(y2),
            xmax: x1.max(x2),
            ymax: y1.max(y2),
        }
    }

    /// Restrict the box to `[0, width] x [0, height]`
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            xmin: self.xmin.clamp(0.0, w),
            ymin: self.ymin.clamp(0.0, h),
            xmax: self.xmax.clamp(0.0, w),
            ymax: self.ymax.clamp(0.0, h),
        }
    }

    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }
}

/// One labeled detection produced by a detector
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub label: String,
    /// Conventionally 0.0..=1.0
    pub confidence: f32,
    pub bounding_box: Option<BoundingBox>,
}

impl DetectionResult {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            bounding_box: None,
        }
    }

    pub fn with_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    /// `"<label> (<percent>%)"`
    pub fn formatted(&self) -> String {
        format_detection(&self.label, self.confidence)
    }
}

/// Render a label with its confidence as a rounded integer percentage
pub fn format_detection(label: &str, confidence: f32) -> String {
    // f32 stores decimal halves slightly low (0.285 is 0.28499999..), so snap
    // to 1e-4 of a percent, well above f32 error and below any real score step
    let scaled = ((f64::from(confidence) * 100.0 * 1e4).round() / 1e4).round();
    format!("{} ({}%)", label, scaled as i64)
}

/// One persisted scan, stored in the `scan_history` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    /// Blank until the store assigns one on first insert
    #[serde(default)]
    pub id: String,
    pub image_uri: String,
    #[serde(default)]
    pub detected_text: String,
    #[serde(default)]
    pub detected_objects: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ScanRecord {
    pub fn new(
        image_uri: impl Into<String>,
        detected_text: impl Into<String>,
        detected_objects: Vec<String>,
    ) -> Self {
        Self {
            id: String::new(),
            image_uri: image_uri.into(),
            detected_text: detected_text.into(),
            detected_objects,
            timestamp: Utc::now(),
        }
    }

    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// List identity: two records are the same document when their ids match
    pub fn same_document(&self, other: &ScanRecord) -> bool {
        self.has_id() && self.id == other.id
    }

    pub fn has_text(&self) -> bool {
        !self.detected_text.is_empty() && self.detected_text != NO_TEXT_DETECTED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_rounded_percentages() {
        assert_eq!(format_detection("cup", 0.873), "cup (87%)");
        assert_eq!(format_detection("cup", 0.9), "cup (90%)");
        assert_eq!(format_detection("cup", 0.995), "cup (100%)");
        assert_eq!(format_detection("cup", 0.004), "cup (0%)");
        assert_eq!(format_detection("Dining Table", 1.0), "Dining Table (100%)");
    }

    #[test]
    fn halves_round_up() {
        assert_eq!(format_detection("x", 0.005), "x (1%)");
        assert_eq!(format_detection("x", 0.015), "x (2%)");
        assert_eq!(format_detection("x", 0.285), "x (29%)");
        assert_eq!(format_detection("x", 0.575), "x (58%)");
        assert_eq!(format_detection("x", 0.4949), "x (49%)");
    }

    #[test]
    fn bounding_box_normalizes_corners() {
        let bbox = BoundingBox::new(30.0, 40.0, 10.0, 5.0);
        assert_eq!(bbox.xmin, 10.0);
        assert_eq!(bbox.ymin, 5.0);
        assert_eq!(bbox.xmax, 30.0);
        assert_eq!(bbox.ymax, 40.0);

        let clamped = BoundingBox::new(-4.0, 2.0, 120.0, 50.0).clamp_to(100, 40);
        assert_eq!(clamped.xmin, 0.0);
        assert_eq!(clamped.xmax, 100.0);
        assert_eq!(clamped.ymax, 40.0);
        assert_eq!(clamped.width(), 100.0);
    }

    #[test]
    fn record_serializes_document_fields() {
        let mut record = ScanRecord::new("file:///tmp/a.jpg", "hello", vec!["cup (90%)".into()]);
        record.id = "abc".into();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["imageUri"], "file:///tmp/a.jpg");
        assert_eq!(json["detectedText"], "hello");
        assert_eq!(json["detectedObjects"][0], "cup (90%)");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn same_document_requires_an_id() {
        let a = ScanRecord::new("a", "", vec![]);
        let b = a.clone();
        assert!(!a.same_document(&b));

        let mut c = a.clone();
        c.id = "1".into();
        let mut d = b.clone();
        d.id = "1".into();
        d.detected_text = "changed".into();
        assert!(c.same_document(&d));
    }
}
