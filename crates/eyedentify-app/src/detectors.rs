use std::sync::Arc;

use eyedentify_config::Config;
use eyedentify_config::detector::DetectorConfig;
use eyedentify_detect::{
    CloudDetector, Detector, FallbackDetector, InferenceClient, LabelModel, OnDeviceLabeler,
    OnnxLabelModel,
};
use eyedentify_ocr::{CloudTextRecognizer, DisabledRecognizer, TextRecognizer};

/// Primary cloud model first, then the configured fallback models, then the
/// on-device labeler when a model is configured
pub fn build_detector_chain(config: &Config) -> anyhow::Result<FallbackDetector> {
    assemble_chain(&config.detector, load_on_device_labeler(&config.detector))
}

/// Wraps `model` with the configured confidence threshold
pub fn on_device_labeler<M: LabelModel>(model: M, detector: &DetectorConfig) -> Arc<dyn Detector> {
    Arc::new(OnDeviceLabeler::new(model, detector.confidence_threshold))
}

fn load_on_device_labeler(detector: &DetectorConfig) -> Option<Arc<dyn Detector>> {
    let (Some(model_path), Some(labels_path)) =
        (&detector.labeler_model_path, &detector.labeler_labels_path)
    else {
        if detector.labeler_model_path.is_some() {
            tracing::warn!("LABELER_MODEL_PATH set without LABELER_LABELS_PATH, on-device labeling off");
        }
        return None;
    };

    match OnnxLabelModel::load(model_path, labels_path) {
        Ok(model) => Some(on_device_labeler(model, detector)),
        Err(e) => {
            tracing::warn!("On-device labeler unavailable: {}", e);
            None
        }
    }
}

pub(crate) fn assemble_chain(
    detector: &DetectorConfig,
    on_device: Option<Arc<dyn Detector>>,
) -> anyhow::Result<FallbackDetector> {
    let mut detectors: Vec<Arc<dyn Detector>> = Vec::new();

    if detector.cloud_enabled {
        if detector.api_token.is_empty() {
            tracing::warn!("HF_API_TOKEN not set, cloud detection will fail and fall through");
        }
        tracing::info!("Cloud detection via {}", detector.endpoint());

        let client = InferenceClient::from_config(detector)?;
        detectors.extend(
            std::iter::once(&detector.model)
                .chain(detector.fallback_models.iter())
                .map(|model| {
                    Arc::new(CloudDetector::new(
                        client.clone(),
                        model.clone(),
                        detector.jpeg_quality,
                    )) as Arc<dyn Detector>
                }),
        );
    }

    detectors.extend(on_device);
    let chain = FallbackDetector::new(detectors);

    if chain.is_empty() {
        tracing::warn!("No detectors configured, no objects will be detected");
    } else {
        tracing::info!("Detector chain: {}", chain.names().join(" -> "));
    }

    Ok(chain)
}

pub fn build_recognizer(config: &Config) -> anyhow::Result<Arc<dyn TextRecognizer>> {
    if !config.ocr.enabled {
        tracing::warn!("Text recognition disabled");
        return Ok(Arc::new(DisabledRecognizer));
    }

    Ok(Arc::new(CloudTextRecognizer::from_config(
        &config.detector,
        &config.ocr,
    )?))
}
