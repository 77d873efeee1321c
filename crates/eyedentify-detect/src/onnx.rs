use std::fmt::Display;
use std::path::Path;
use std::sync::Mutex;

use image::DynamicImage;
use image::imageops::FilterType;
use ndarray::Array4;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;

use crate::{DetectError, Label, LabelModel};

/// Square input side of ImageNet-style classifiers
const INPUT_SIZE: u32 = 224;
/// Labels handed to the threshold filter per image
const TOP_K: usize = 5;

const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Image classifier run through ONNX Runtime.
///
/// Expects one NCHW float input of `1x3x224x224` (ImageNet normalization)
/// and one output of class scores, either logits or probabilities, in the
/// order of the labels file.
pub struct OnnxLabelModel {
    // `Session::run` needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    labels: Vec<String>,
}

fn inference_error(e: impl Display) -> DetectError {
    DetectError::Inference(e.to_string())
}

impl OnnxLabelModel {
    pub fn load(model_path: &Path, labels_path: &Path) -> Result<Self, DetectError> {
        let labels = std::fs::read_to_string(labels_path)
            .map(|text| parse_labels(&text))
            .map_err(|e| {
                DetectError::Inference(format!("Failed to read labels {}: {}", labels_path.display(), e))
            })?;

        tracing::info!("Loading ONNX labeler from {}", model_path.display());
        let session = Session::builder()
            .map_err(inference_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(inference_error)?
            .with_intra_threads(2)
            .map_err(inference_error)?
            .commit_from_file(model_path)
            .map_err(inference_error)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| DetectError::Inference("model has no inputs".into()))?;
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| DetectError::Inference("model has no outputs".into()))?;

        tracing::info!(
            "Labeler ready: input {}, output {}, {} classes",
            input_name,
            output_name,
            labels.len()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            labels,
        })
    }
}

impl LabelModel for OnnxLabelModel {
    fn label(&self, image: &DynamicImage) -> Result<Vec<Label>, DetectError> {
        let input = Tensor::from_array(preprocess(image, INPUT_SIZE)).map_err(inference_error)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectError::Inference("labeler session poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(inference_error)?;
        let scores: Vec<f32> = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(inference_error)?
            .iter()
            .copied()
            .collect();

        Ok(top_labels(&probabilities(scores), &self.labels, TOP_K))
    }
}

/// One class name per line; blank lines are skipped
fn parse_labels(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Resize to `size`x`size` and lay out as normalized NCHW floats
fn preprocess(image: &DynamicImage, size: u32) -> Array4<f32> {
    let rgb = image::imageops::resize(&image.to_rgb8(), size, size, FilterType::Triangle);
    let mut input = Array4::<f32>::zeros((1, 3, size as usize, size as usize));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            input[[0, c, y as usize, x as usize]] = (f32::from(pixel[c]) / 255.0 - MEAN[c]) / STD[c];
        }
    }

    input
}

/// Softmax over logits; scores already forming a distribution pass through
fn probabilities(scores: Vec<f32>) -> Vec<f32> {
    let sum: f32 = scores.iter().sum();
    if scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() < 1e-3 {
        return scores;
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exp.iter().sum();
    exp.into_iter().map(|e| e / total).collect()
}

fn top_labels(probabilities: &[f32], labels: &[String], k: usize) -> Vec<Label> {
    let mut ranked: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .filter_map(|(index, confidence)| {
            labels.get(index).map(|text| Label {
                text: text.clone(),
                confidence,
            })
        })
        .take(k)
        .collect()
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    fn names(labels: &[Label]) -> Vec<&str> {
        labels.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn labels_file_skips_blank_lines() {
        assert_eq!(parse_labels("tench\n\n goldfish \r\ncup\n"), ["tench", "goldfish", "cup"]);
    }

    #[test]
    fn preprocess_resizes_and_normalizes() {
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 10, Rgb([255, 255, 255])));
        let input = preprocess(&white, 8);

        assert_eq!(input.shape(), &[1, 3, 8, 8]);
        for c in 0..3 {
            let expected = (1.0 - MEAN[c]) / STD[c];
            assert!((input[[0, c, 7, 7]] - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn logits_become_a_distribution() {
        let probs = probabilities(vec![2.0, 1.0, 0.1]);

        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }

    #[test]
    fn existing_distribution_is_kept() {
        assert_eq!(probabilities(vec![0.7, 0.2, 0.1]), [0.7, 0.2, 0.1]);
    }

    #[test]
    fn top_labels_are_ranked_and_capped() {
        let labels: Vec<String> = ["cat", "cup", "dog", "pen"].map(String::from).to_vec();
        let top = top_labels(&[0.1, 0.6, 0.25, 0.05], &labels, 2);

        assert_eq!(names(&top), ["cup", "dog"]);
        assert!((top[0].confidence - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn scores_without_a_label_are_ignored() {
        let labels = vec!["cat".to_string()];
        let top = top_labels(&[0.2, 0.8], &labels, 5);

        assert_eq!(names(&top), ["cat"]);
    }

    #[test]
    fn missing_labels_file_fails_before_loading_model() {
        let dir = std::env::temp_dir().join("eyedentify-no-such-dir");
        let result = OnnxLabelModel::load(&dir.join("model.onnx"), &dir.join("labels.txt"));

        assert!(matches!(result, Err(DetectError::Inference(msg)) if msg.contains("labels.txt")));
    }
}
