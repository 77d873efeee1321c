use std::fmt;

use eyedentify_types::{NO_TEXT_DETECTED, ScanRecord};

/// User-facing wording for one scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSummary {
    pub objects_text: String,
    pub recognized_text: String,
}

impl ScanSummary {
    pub fn from_record(record: &ScanRecord) -> Self {
        let objects_text = if record.detected_objects.is_empty() {
            "No objects detected".to_string()
        } else {
            format!("Objects found: {}", record.detected_objects.join(", "))
        };

        let recognized_text = if record.detected_text.trim().is_empty() {
            NO_TEXT_DETECTED.to_string()
        } else {
            record.detected_text.clone()
        };

        Self {
            objects_text,
            recognized_text,
        }
    }

    /// Line handed to speech synthesis
    pub fn spoken(&self) -> String {
        format!("{}. {}", self.objects_text, self.recognized_text)
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.objects_text)?;
        write!(f, "Text found: {}", self.recognized_text)
    }
}
