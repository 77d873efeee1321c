use chrono::{DateTime, Utc};
use eyedentify_types::ScanRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordQuery {
    All,
    TextPrefix(String),
    TimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl RecordQuery {
    pub fn matches(&self, record: &ScanRecord) -> bool {
        match self {
            RecordQuery::All => true,
            RecordQuery::TextPrefix(prefix) => record.detected_text.starts_with(prefix.as_str()),
            RecordQuery::TimeRange { start, end } => {
                record.timestamp >= *start && record.timestamp <= *end
            }
        }
    }

    /// Filter and order records the way the collection query would
    pub fn apply(&self, records: impl IntoIterator<Item = ScanRecord>) -> Vec<ScanRecord> {
        let mut matched: Vec<ScanRecord> = records.into_iter().filter(|r| self.matches(r)).collect();

        match self {
            RecordQuery::TextPrefix(_) => matched.sort_by(|a, b| {
                a.detected_text
                    .cmp(&b.detected_text)
                    .then_with(|| a.id.cmp(&b.id))
            }),
            RecordQuery::All | RecordQuery::TimeRange { .. } => matched.sort_by(|a, b| {
                b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id))
            }),
        }

        matched
    }
}
