//! Session orchestration: the capture → classify → announce state machine
//! and the service seams it drives.

mod controller;
mod events;
mod services;

pub use controller::{
    announcement_sentence, confidence_percent, confidence_text, DisplayState, SessionController,
    SessionOptions, SessionState, CONFIDENCE_THRESHOLD, DEFAULT_UNKNOWN_MESSAGE, STAGE_TIMEOUT,
};
pub use events::PipelineEvent;
pub use services::{
    AnnounceService, CameraCaptureService, CaptureService, ClassifyService, EventSender,
    SynthesizerAnnounceService, WorkerClassifyService,
};
