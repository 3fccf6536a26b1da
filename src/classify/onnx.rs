//! ONNX-backed image classifier.
//!
//! Wraps a pretrained ImageNet-style classifier loaded with tract. The
//! model is compiled once at construction and treated as read-only for
//! all subsequent classification calls.

use image::imageops::FilterType;
use std::path::PathBuf;
use tract_onnx::prelude::*;

use super::labels::load_labels;
use super::types::{Classification, ClassifierSettings, ClassifyError};

/// A compiled, runnable tract plan.
type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Number of ranked predictions returned per classification call.
const TOP_K: usize = 5;

/// Per-channel normalization constants (ImageNet convention).
const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Pretrained image classifier with a fixed label table.
pub struct OnnxClassifier {
    plan: OnnxPlan,
    labels: Vec<String>,
    input_size: u32,
    model_path: PathBuf,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("model_path", &self.model_path)
            .field("labels", &self.labels.len())
            .field("input_size", &self.input_size)
            .finish()
    }
}

impl OnnxClassifier {
    /// Load and compile the model and its label table.
    ///
    /// # Errors
    /// * `ClassifyError::ModelLoad` - model file missing, unreadable, or
    ///   not compilable for a `[1, 3, N, N]` f32 input
    /// * `ClassifyError::Labels` - labels file missing or unreadable
    pub fn load(settings: &ClassifierSettings) -> Result<Self, ClassifyError> {
        let labels = load_labels(&settings.labels_path)?;

        let size = settings.input_size as i64;
        let model_load = |message: String| ClassifyError::ModelLoad {
            path: settings.model_path.clone(),
            message,
        };

        let plan = tract_onnx::onnx()
            .model_for_path(&settings.model_path)
            .map_err(|e| model_load(e.to_string()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .map_err(|e| model_load(e.to_string()))?
            .into_optimized()
            .map_err(|e| model_load(e.to_string()))?
            .into_runnable()
            .map_err(|e| model_load(e.to_string()))?;

        log::info!(
            "Loaded classifier model '{}' ({} labels, input {}x{})",
            settings.model_path.display(),
            labels.len(),
            settings.input_size,
            settings.input_size,
        );

        Ok(Self {
            plan,
            labels,
            input_size: settings.input_size,
            model_path: settings.model_path.clone(),
        })
    }

    /// Classify one encoded image.
    ///
    /// Returns predictions ranked by confidence descending, at most
    /// [`TOP_K`] entries.
    ///
    /// # Errors
    /// * `ClassifyError::DecodeImage` - bytes are not a decodable image
    /// * `ClassifyError::Inference` - the model run itself failed
    pub fn classify(&self, image_data: &[u8]) -> Result<Vec<Classification>, ClassifyError> {
        let image = image::load_from_memory(image_data)
            .map_err(|e| ClassifyError::DecodeImage(e.to_string()))?
            .to_rgb8();

        let resized = image::imageops::resize(
            &image,
            self.input_size,
            self.input_size,
            FilterType::Triangle,
        );

        let size = self.input_size as usize;
        let input: Tensor =
            tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
                let px = resized[(x as u32, y as u32)][c] as f32 / 255.0;
                (px - CHANNEL_MEAN[c]) / CHANNEL_STD[c]
            })
            .into();

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;

        let scores = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;
        let scores: Vec<f32> = scores.iter().copied().collect();

        Ok(self.rank(scores))
    }

    /// Turn a raw score vector into ranked labeled confidences.
    fn rank(&self, scores: Vec<f32>) -> Vec<Classification> {
        let probs = to_probabilities(scores);

        let mut indexed: Vec<(usize, f32)> = probs.into_iter().enumerate().collect();
        // Stable ordering: ties keep the lower class index first
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        indexed
            .into_iter()
            .take(TOP_K)
            .map(|(i, confidence)| {
                let label = self
                    .labels
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("class {}", i));
                Classification { label, confidence }
            })
            .collect()
    }
}

/// Convert model output scores to probabilities.
///
/// Exported classifiers ship with or without a softmax head; when the
/// scores already look like a probability distribution they pass through
/// untouched, otherwise a softmax is applied.
fn to_probabilities(scores: Vec<f32>) -> Vec<f32> {
    if scores.is_empty() {
        return scores;
    }

    let in_unit_range = scores.iter().all(|s| (0.0..=1.0).contains(s));
    let sum: f32 = scores.iter().sum();
    if in_unit_range && (sum - 1.0).abs() < 0.01 {
        return scores;
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_to_probabilities_passthrough_for_distribution() {
        let probs = to_probabilities(vec![0.7, 0.2, 0.1]);
        assert_eq!(probs, vec![0.7, 0.2, 0.1]);
    }

    #[test]
    fn test_to_probabilities_softmaxes_logits() {
        let probs = to_probabilities(vec![3.0, 1.0, -2.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1]);
        assert!(probs[1] > probs[2]);
    }

    #[test]
    fn test_to_probabilities_empty() {
        assert!(to_probabilities(Vec::new()).is_empty());
    }

    #[test]
    fn test_load_missing_model_reports_model_load() {
        let mut labels = tempfile::NamedTempFile::new().unwrap();
        writeln!(labels, "tench").unwrap();

        let settings = ClassifierSettings {
            model_path: PathBuf::from("/nonexistent/model.onnx"),
            labels_path: labels.path().to_path_buf(),
            input_size: 224,
        };
        let result = OnnxClassifier::load(&settings);
        assert!(matches!(result, Err(ClassifyError::ModelLoad { .. })));
    }

    #[test]
    fn test_load_missing_labels_reports_labels_error() {
        let settings = ClassifierSettings {
            model_path: PathBuf::from("/nonexistent/model.onnx"),
            labels_path: PathBuf::from("/nonexistent/labels.txt"),
            input_size: 224,
        };
        // Labels are read before the model is touched
        let result = OnnxClassifier::load(&settings);
        assert!(matches!(result, Err(ClassifyError::Labels { .. })));
    }
}
