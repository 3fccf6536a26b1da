//! Service seams between the controller and the platform components.
//!
//! The controller talks to capture, classification, and speech through
//! these traits so the state machine can be exercised in tests with mock
//! services. The real implementations adapt the camera thread, the
//! classify worker, and the speech synthesizer, posting their completion
//! signals onto the controller's event channel.

use tokio::sync::mpsc::UnboundedSender;

use super::events::PipelineEvent;
use crate::camera::{CameraError, CapturedImage, FlashMode, PhotoRequester};
use crate::classify::ClassifySubmitter;
use crate::speech::SpeechSynthesizer;

/// Channel on which services post completion events.
pub type EventSender = UnboundedSender<PipelineEvent>;

/// Issues one-shot photo capture requests.
pub trait CaptureService: Send {
    /// Request a capture with the given flash mode; exactly one
    /// `PipelineEvent::PhotoCaptured` must follow.
    fn request_capture(&mut self, flash: FlashMode);
}

/// Submits captured images for classification.
pub trait ClassifyService: Send {
    /// Request classification; exactly one `PipelineEvent::Classified`
    /// must follow.
    fn request_classify(&mut self, image: &CapturedImage);
}

/// Speaks announcement sentences.
pub trait AnnounceService: Send {
    /// Request an announcement; exactly one `PipelineEvent::SpeechFinished`
    /// must follow. When `enabled` is false the completion fires without
    /// audible output.
    fn request_announce(&mut self, text: &str, enabled: bool);
}

/// Capture service backed by the camera capture thread.
///
/// When the camera failed to configure at startup there is no requester;
/// capture requests then resolve immediately with an error so the pipeline
/// still reaches its idle terminal state.
pub struct CameraCaptureService {
    requester: Option<PhotoRequester>,
    events: EventSender,
}

impl CameraCaptureService {
    pub fn new(requester: Option<PhotoRequester>, events: EventSender) -> Self {
        Self { requester, events }
    }
}

impl CaptureService for CameraCaptureService {
    fn request_capture(&mut self, flash: FlashMode) {
        match &self.requester {
            Some(requester) => {
                let events = self.events.clone();
                requester.request(
                    flash,
                    Box::new(move |result| {
                        let _ = events.send(PipelineEvent::PhotoCaptured(result));
                    }),
                );
            }
            None => {
                let _ = self
                    .events
                    .send(PipelineEvent::PhotoCaptured(Err(CameraError::NoDevices)));
            }
        }
    }
}

/// Classification service backed by the background classify worker.
pub struct WorkerClassifyService {
    submitter: ClassifySubmitter,
    events: EventSender,
}

impl WorkerClassifyService {
    pub fn new(submitter: ClassifySubmitter, events: EventSender) -> Self {
        Self { submitter, events }
    }
}

impl ClassifyService for WorkerClassifyService {
    fn request_classify(&mut self, image: &CapturedImage) {
        let events = self.events.clone();
        self.submitter.submit(
            image.data.clone(),
            Box::new(move |result| {
                let _ = events.send(PipelineEvent::Classified(result));
            }),
        );
    }
}

/// Announcement service backed by the speech synthesizer.
pub struct SynthesizerAnnounceService {
    synthesizer: SpeechSynthesizer,
    events: EventSender,
}

impl SynthesizerAnnounceService {
    pub fn new(synthesizer: SpeechSynthesizer, events: EventSender) -> Self {
        Self {
            synthesizer,
            events,
        }
    }
}

impl AnnounceService for SynthesizerAnnounceService {
    fn request_announce(&mut self, text: &str, enabled: bool) {
        let events = self.events.clone();
        self.synthesizer.speak(
            text,
            enabled,
            Box::new(move || {
                let _ = events.send(PipelineEvent::SpeechFinished);
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_capture_service_without_camera_posts_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut service = CameraCaptureService::new(None, tx);
        service.request_capture(FlashMode::Off);

        match rx.try_recv().expect("completion must be posted") {
            PipelineEvent::PhotoCaptured(Err(CameraError::NoDevices)) => {}
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_disabled_announce_posts_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut service = SynthesizerAnnounceService::new(SpeechSynthesizer::default(), tx);
        service.request_announce("This looks like a test", false);

        match rx.try_recv().expect("completion must be posted") {
            PipelineEvent::SpeechFinished => {}
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
