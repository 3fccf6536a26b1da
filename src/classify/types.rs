//! Classifier types and errors.

use std::path::PathBuf;
use thiserror::Error;

/// One ranked prediction from the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Human-readable class label
    pub label: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Settings for constructing the classifier.
#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    /// Path to the pretrained ONNX model file
    pub model_path: PathBuf,
    /// Path to the labels file (one label per line, ranked by class index)
    pub labels_path: PathBuf,
    /// Square input size the model expects (224 for most ImageNet models)
    pub input_size: u32,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/squeezenet1.1.onnx"),
            labels_path: PathBuf::from("models/labels.txt"),
            input_size: 224,
        }
    }
}

/// Errors that can occur while loading or running the classifier.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The model file could not be loaded or compiled
    #[error("Failed to load model '{path}': {message}")]
    ModelLoad { path: PathBuf, message: String },

    /// The labels file could not be read
    #[error("Failed to read labels file '{path}': {source}")]
    Labels {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The image bytes could not be decoded
    #[error("Could not decode image data: {0}")]
    DecodeImage(String),

    /// Inference over valid image bytes failed
    #[error("Inference failed: {0}")]
    Inference(String),

    /// A classification was requested but the model never loaded
    #[error("Classifier model is not loaded")]
    NotLoaded,
}
