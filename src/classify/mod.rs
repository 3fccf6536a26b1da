//! Image classification module.
//!
//! Wraps a pretrained ONNX classifier behind a background worker:
//! - Model + labels loading via [`OnnxClassifier`]
//! - Request/response plumbing via [`ClassifyWorker`] and [`ClassifySubmitter`]

mod labels;
mod onnx;
mod types;
mod worker;

pub use labels::load_labels;
pub use onnx::OnnxClassifier;
pub use types::{Classification, ClassifierSettings, ClassifyError};
pub use worker::{ClassifyCallback, ClassifySubmitter, ClassifyWorker};
