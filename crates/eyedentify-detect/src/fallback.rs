use std::sync::Arc;

use image::DynamicImage;

use crate::{DetectionResult, Detector};

/// What happened when one detector was tried
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Found(usize),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub detector: String,
    pub outcome: AttemptOutcome,
}

/// Result of a fallback run, keeping "found nothing" apart from "failed"
#[derive(Debug, Clone, Default)]
pub struct DetectionReport {
    /// Name of the detector whose results were used
    pub answered_by: Option<String>,
    pub results: Vec<DetectionResult>,
    pub attempts: Vec<Attempt>,
}

impl DetectionReport {
    pub fn formatted(&self) -> Vec<String> {
        self.results.iter().map(DetectionResult::formatted).collect()
    }

    /// True when every attempted detector errored
    pub fn all_failed(&self) -> bool {
        !self.attempts.is_empty()
            && self
                .attempts
                .iter()
                .all(|a| matches!(a.outcome, AttemptOutcome::Failed(_)))
    }
}

/// Tries detectors in priority order and keeps the first non-empty answer.
///
/// Later detectors are fallbacks, not supplements: once one returns results
/// the rest are never called. Detector errors never reach the caller.
#[derive(Clone, Default)]
pub struct FallbackDetector {
    detectors: Vec<Arc<dyn Detector>>,
}

impl FallbackDetector {
    pub fn new(detectors: Vec<Arc<dyn Detector>>) -> Self {
        Self { detectors }
    }

    pub fn with_detector(mut self, detector: Arc<dyn Detector>) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Detector names in the order they are tried
    pub fn names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Formatted `"<label> (<percent>%)"` strings, empty when nothing was found
    pub async fn detect_objects(&self, image: Arc<DynamicImage>) -> Vec<String> {
        self.detect_with_report(image).await.formatted()
    }

    pub async fn detect_with_report(&self, image: Arc<DynamicImage>) -> DetectionReport {
        let mut report = DetectionReport::default();

        for detector in &self.detectors {
            let name = detector.name().to_string();
            tracing::debug!("Attempting detection with {}", name);

            match detector.detect(Arc::clone(&image)).await {
                Ok(results) if !results.is_empty() => {
                    tracing::info!("{} detection successful with {} results", name, results.len());
                    report.attempts.push(Attempt {
                        detector: name.clone(),
                        outcome: AttemptOutcome::Found(results.len()),
                    });
                    report.answered_by = Some(name);
                    report.results = results;
                    return report;
                }
                Ok(_) => {
                    tracing::info!("{} returned no results, falling back", name);
                    report.attempts.push(Attempt {
                        detector: name,
                        outcome: AttemptOutcome::Empty,
                    });
                }
                Err(e) => {
                    tracing::warn!("{} detection failed, falling back: {}", name, e);
                    report.attempts.push(Attempt {
                        detector: name,
                        outcome: AttemptOutcome::Failed(e.to_string()),
                    });
                }
            }
        }

        if report.all_failed() {
            tracing::warn!("All {} detectors failed", report.attempts.len());
        } else {
            tracing::info!("No objects detected by any detector");
        }

        report
    }
}
