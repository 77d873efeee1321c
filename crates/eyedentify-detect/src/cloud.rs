use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use serde::Deserialize;

use crate::{BoundingBox, DetectError, DetectionResult, Detector, InferenceClient, jpeg_base64};

/// Object detector backed by a hosted inference endpoint
#[derive(Clone)]
pub struct CloudDetector {
    client: InferenceClient,
    model: String,
    jpeg_quality: u8,
}

#[derive(Deserialize)]
struct DetectionResponse {
    score: f32,
    label: String,
    #[serde(rename = "box")]
    bounding_box: ResponseBox,
}

#[derive(Deserialize)]
struct ResponseBox {
    xmin: f32,
    ymin: f32,
    xmax: f32,
    ymax: f32,
}

impl CloudDetector {
    pub fn new(client: InferenceClient, model: String, jpeg_quality: u8) -> Self {
        Self {
            client,
            model,
            jpeg_quality,
        }
    }
}

fn into_results(response: Vec<DetectionResponse>, width: u32, height: u32) -> Vec<DetectionResult> {
    response
        .into_iter()
        .map(|d| {
            let b = d.bounding_box;
            DetectionResult::new(d.label, d.score)
                .with_box(BoundingBox::new(b.xmin, b.ymin, b.xmax, b.ymax).clamp_to(width, height))
        })
        .collect()
}

#[async_trait]
impl Detector for CloudDetector {
    fn name(&self) -> &str {
        &self.model
    }

    async fn detect(&self, image: Arc<DynamicImage>) -> Result<Vec<DetectionResult>, DetectError> {
        let (width, height) = (image.width(), image.height());
        let encoded = jpeg_base64(image, self.jpeg_quality).await?;

        let response: Vec<DetectionResponse> = self.client.post_image(&self.model, &encoded).await?;
        tracing::debug!("{} returned {} detections", self.model, response.len());

        Ok(into_results(response, width, height))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn parses_detection_response() {
        let body = r#"[
            {"score": 0.98, "label": "cup", "box": {"xmin": 10, "ymin": 20, "xmax": 50, "ymax": 80}},
            {"score": 0.71, "label": "laptop", "box": {"xmin": 90.5, "ymin": 0, "xmax": 400, "ymax": 30}}
        ]"#;
        let response: Vec<DetectionResponse> = serde_json::from_str(body).unwrap();
        let results = into_results(response, 200, 100);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, "cup");
        assert_eq!(results[0].formatted(), "cup (98%)");
        let cup = results[0].bounding_box.unwrap();
        assert_eq!((cup.xmin, cup.ymin, cup.xmax, cup.ymax), (10.0, 20.0, 50.0, 80.0));

        // Clamped to the 200x100 image
        let laptop = results[1].bounding_box.unwrap();
        assert_eq!(laptop.xmax, 200.0);
        assert_eq!(laptop.xmin, 90.5);
    }

    #[test]
    fn half_percent_scores_round_up() {
        let body = r#"[
            {"score": 0.005, "label": "x", "box": {"xmin": 0, "ymin": 0, "xmax": 1, "ymax": 1}},
            {"score": 0.575, "label": "y", "box": {"xmin": 0, "ymin": 0, "xmax": 1, "ymax": 1}}
        ]"#;
        let response: Vec<DetectionResponse> = serde_json::from_str(body).unwrap();
        let results = into_results(response, 10, 10);

        assert_eq!(results[0].formatted(), "x (1%)");
        assert_eq!(results[1].formatted(), "y (58%)");
    }

    #[test]
    fn rejects_malformed_entries() {
        let body = r#"[{"label": "cup"}]"#;
        assert!(serde_json::from_str::<Vec<DetectionResponse>>(body).is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_closed() {
        let client = InferenceClient::new(
            "http://127.0.0.1:9".into(),
            "token".into(),
            Duration::from_secs(2),
        )
        .unwrap();
        let detector = CloudDetector::new(client, "facebook/detr-resnet-50".into(), 80);
        let image = Arc::new(DynamicImage::new_rgb8(8, 8));

        assert!(detector.detect(image.clone()).await.is_err());
        assert!(detector.detect_or_empty(image).await.is_empty());
    }
}
