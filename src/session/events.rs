//! Completion signals flowing back into the session controller.

use crate::camera::{CameraError, CapturedImage};
use crate::classify::{Classification, ClassifyError};

/// Asynchronous completion signal from one pipeline stage.
///
/// Each stage (capture, classify, announce) issues its request and later
/// posts exactly one of these back to the controller's event channel.
#[derive(Debug)]
pub enum PipelineEvent {
    /// A photo capture request resolved
    PhotoCaptured(Result<CapturedImage, CameraError>),
    /// A classification request resolved
    Classified(Result<Vec<Classification>, ClassifyError>),
    /// An utterance finished playing (or was skipped while disabled)
    SpeechFinished,
}
