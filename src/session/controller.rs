//! The session controller state machine.
//!
//! Orchestrates one capture → classify → announce pipeline run per capture
//! tap. The machine holds the busy state for the whole run and releases it
//! on every exit path: success, stage error, or stage timeout. All service
//! calls are asynchronous; completions come back as [`PipelineEvent`]s.

use std::time::{Duration, Instant};

use super::events::PipelineEvent;
use super::services::{AnnounceService, CaptureService, ClassifyService};
use crate::camera::{CapturedImage, FlashMode};
use crate::classify::Classification;

/// Top-rank confidence below this takes the unknown-object path.
/// Exactly 0.5 counts as confident.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Shown and spoken when the classifier is not confident about anything.
pub const DEFAULT_UNKNOWN_MESSAGE: &str = "I'm not sure what this is. Please try again.";

/// A stage that produces no completion within this window aborts the run,
/// so a hung external service can never leave the UI permanently busy.
pub const STAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Pipeline state for one run. `Idle` is both the initial and the terminal
/// state; every other state blocks further capture taps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Capturing,
    Classifying,
    Announcing,
}

impl SessionState {
    /// Whether user interaction with the capture surface is blocked.
    pub fn is_busy(self) -> bool {
        self != SessionState::Idle
    }

    /// Short name for the status line.
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Capturing => "capturing",
            SessionState::Classifying => "identifying",
            SessionState::Announcing => "announcing",
        }
    }
}

/// What the result panel currently shows.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    /// Identification label text (empty until the first confident run)
    pub identification: String,
    /// Confidence label text ("Confidence: N%" or empty)
    pub confidence: String,
    /// Most recent captured photo, for the thumbnail panel
    pub photo: Option<CapturedImage>,
    /// Bumped each time `photo` is replaced, so the UI can re-render lazily
    pub photo_seq: u64,
}

/// Initial toggle values and fixed strings for a controller.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub flash: FlashMode,
    pub speech_enabled: bool,
    pub unknown_message: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            flash: FlashMode::Off,
            speech_enabled: false,
            unknown_message: DEFAULT_UNKNOWN_MESSAGE.to_string(),
        }
    }
}

/// Orchestrates capture, classification, and speech for one run at a time.
pub struct SessionController {
    state: SessionState,
    flash: FlashMode,
    speech_enabled: bool,
    unknown_message: String,
    display: DisplayState,
    /// When the in-flight stage was entered; `None` while idle
    stage_started: Option<Instant>,
    capture: Box<dyn CaptureService>,
    classify: Box<dyn ClassifyService>,
    announce: Box<dyn AnnounceService>,
}

impl SessionController {
    pub fn new(
        capture: Box<dyn CaptureService>,
        classify: Box<dyn ClassifyService>,
        announce: Box<dyn AnnounceService>,
        options: SessionOptions,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            flash: options.flash,
            speech_enabled: options.speech_enabled,
            unknown_message: options.unknown_message,
            display: DisplayState::default(),
            stage_started: None,
            capture,
            classify,
            announce,
        }
    }

    /// Current pipeline state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a pipeline run is in flight.
    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Current display state for the result panel.
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Flash toggle label text.
    pub fn flash_label(&self) -> &'static str {
        self.flash.label()
    }

    /// Speech toggle label text.
    pub fn speech_label(&self) -> &'static str {
        if self.speech_enabled {
            "Speech: On"
        } else {
            "Speech: Off"
        }
    }

    /// Current flash mode.
    pub fn flash(&self) -> FlashMode {
        self.flash
    }

    /// Whether announcements are enabled.
    pub fn speech_enabled(&self) -> bool {
        self.speech_enabled
    }

    /// Handle a capture tap.
    ///
    /// Starts a pipeline run from `Idle`; while a run is in flight this is
    /// a no-op so a second tap can never start an overlapping run.
    pub fn tap(&mut self) {
        if self.is_busy() {
            log::debug!("ignoring capture tap while {}", self.state.name());
            return;
        }

        self.enter(SessionState::Capturing);
        let flash = self.flash;
        self.capture.request_capture(flash);
    }

    /// Toggle the flash mode. Allowed in any state; takes effect at the
    /// next capture request.
    pub fn toggle_flash(&mut self) {
        self.flash = self.flash.toggled();
        log::debug!("{}", self.flash_label());
    }

    /// Toggle announcements. Allowed in any state; read at announce time.
    pub fn toggle_speech(&mut self) {
        self.speech_enabled = !self.speech_enabled;
        log::debug!("{}", self.speech_label());
    }

    /// Feed one completion event into the state machine.
    pub fn handle_event(&mut self, event: PipelineEvent) {
        match (self.state, event) {
            (SessionState::Capturing, PipelineEvent::PhotoCaptured(Ok(photo))) => {
                self.enter(SessionState::Classifying);
                self.classify.request_classify(&photo);
                self.display.photo = Some(photo);
                self.display.photo_seq += 1;
            }
            (SessionState::Capturing, PipelineEvent::PhotoCaptured(Err(e))) => {
                log::error!("Capture failed: {}", e);
                self.finish_run();
            }
            (SessionState::Classifying, PipelineEvent::Classified(Ok(results))) => {
                let sentence = self.apply_classification(&results);
                self.enter(SessionState::Announcing);
                let enabled = self.speech_enabled;
                self.announce.request_announce(&sentence, enabled);
            }
            (SessionState::Classifying, PipelineEvent::Classified(Err(e))) => {
                log::error!("Classification failed: {}", e);
                self.finish_run();
            }
            (SessionState::Announcing, PipelineEvent::SpeechFinished) => {
                self.finish_run();
            }
            (state, event) => {
                // Stale completion from an aborted run, or a service
                // misbehaving; never let it disturb the current run.
                log::warn!("discarding {:?} while {}", event, state.name());
            }
        }
    }

    /// Abort the run if the in-flight stage has exceeded `limit`.
    ///
    /// Returns true when an abort happened. Call this periodically from
    /// the event loop; it is a no-op while idle.
    pub fn poll_timeout(&mut self, limit: Duration) -> bool {
        let timed_out = self
            .stage_started
            .is_some_and(|started| started.elapsed() >= limit);
        if timed_out {
            log::error!("{} stage timed out, aborting run", self.state.name());
            self.finish_run();
        }
        timed_out
    }

    /// Apply a classification result to the display and build the sentence
    /// to announce.
    ///
    /// Only the single top-ranked pair is inspected; ties were already
    /// resolved by the adapter's ordering. An empty result or a top
    /// confidence below the threshold takes the unknown-object path, which
    /// announces the unknown message itself.
    fn apply_classification(&mut self, results: &[Classification]) -> String {
        match results.first() {
            Some(top) if top.confidence >= CONFIDENCE_THRESHOLD => {
                let percent = confidence_percent(top.confidence);
                self.display.identification = top.label.clone();
                self.display.confidence = confidence_text(percent);
                announcement_sentence(&top.label, percent)
            }
            _ => {
                self.display.identification = self.unknown_message.clone();
                self.display.confidence.clear();
                self.unknown_message.clone()
            }
        }
    }

    fn enter(&mut self, state: SessionState) {
        self.state = state;
        self.stage_started = Some(Instant::now());
    }

    /// Terminal transition for one run: release the busy state so the
    /// capture surface accepts the next tap. Every exit path funnels here.
    fn finish_run(&mut self) {
        self.state = SessionState::Idle;
        self.stage_started = None;
    }
}

/// Percentage shown and spoken for a confidence value.
pub fn confidence_percent(confidence: f32) -> u32 {
    (confidence * 100.0).round() as u32
}

/// Confidence label text.
pub fn confidence_text(percent: u32) -> String {
    format!("Confidence: {}%", percent)
}

/// The spoken sentence for a confident identification.
pub fn announcement_sentence(label: &str, percent: u32) -> String {
    format!(
        "This looks like a {} and I am {} percent sure",
        label, percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraError, FlashMode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Services that only count requests; completions are fed manually.
    #[derive(Default)]
    struct CountingServices {
        captures: Arc<AtomicUsize>,
        classifies: Arc<AtomicUsize>,
        announces: Arc<AtomicUsize>,
    }

    struct CountingCapture(Arc<AtomicUsize>);
    impl CaptureService for CountingCapture {
        fn request_capture(&mut self, _flash: FlashMode) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingClassify(Arc<AtomicUsize>);
    impl ClassifyService for CountingClassify {
        fn request_classify(&mut self, _image: &CapturedImage) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingAnnounce(Arc<AtomicUsize>);
    impl AnnounceService for CountingAnnounce {
        fn request_announce(&mut self, _text: &str, _enabled: bool) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn controller_with_counters(options: SessionOptions) -> (SessionController, CountingServices) {
        let counters = CountingServices::default();
        let controller = SessionController::new(
            Box::new(CountingCapture(Arc::clone(&counters.captures))),
            Box::new(CountingClassify(Arc::clone(&counters.classifies))),
            Box::new(CountingAnnounce(Arc::clone(&counters.announces))),
            options,
        );
        (controller, counters)
    }

    fn photo() -> CapturedImage {
        CapturedImage {
            data: vec![0xFF, 0xD8, 0xFF],
            width: 4,
            height: 4,
            flash: FlashMode::Off,
        }
    }

    #[test]
    fn test_initial_state_is_idle() {
        let (controller, _) = controller_with_counters(SessionOptions::default());
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(!controller.is_busy());
        assert_eq!(controller.display().identification, "");
        assert_eq!(controller.display().confidence, "");
    }

    #[test]
    fn test_tap_enters_capturing_and_requests_once() {
        let (mut controller, counters) = controller_with_counters(SessionOptions::default());
        controller.tap();
        assert_eq!(controller.state(), SessionState::Capturing);
        assert_eq!(counters.captures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_second_tap_while_busy_is_noop() {
        let (mut controller, counters) = controller_with_counters(SessionOptions::default());
        controller.tap();
        controller.tap();
        controller.tap();
        assert_eq!(counters.captures.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state(), SessionState::Capturing);
    }

    #[test]
    fn test_capture_error_returns_to_idle_without_display_change() {
        let (mut controller, counters) = controller_with_counters(SessionOptions::default());
        controller.tap();
        controller.handle_event(PipelineEvent::PhotoCaptured(Err(CameraError::NoFrame)));
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(controller.display().identification, "");
        assert_eq!(counters.classifies.load(Ordering::SeqCst), 0);
        assert_eq!(counters.announces.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_full_run_busy_released_exactly_once() {
        let (mut controller, _) = controller_with_counters(SessionOptions::default());
        controller.tap();
        controller.handle_event(PipelineEvent::PhotoCaptured(Ok(photo())));
        assert_eq!(controller.state(), SessionState::Classifying);
        controller.handle_event(PipelineEvent::Classified(Ok(vec![Classification::new(
            "golden retriever",
            0.92,
        )])));
        assert_eq!(controller.state(), SessionState::Announcing);
        controller.handle_event(PipelineEvent::SpeechFinished);
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_confident_result_sets_both_labels() {
        let (mut controller, _) = controller_with_counters(SessionOptions::default());
        controller.tap();
        controller.handle_event(PipelineEvent::PhotoCaptured(Ok(photo())));
        controller.handle_event(PipelineEvent::Classified(Ok(vec![Classification::new(
            "golden retriever",
            0.92,
        )])));
        assert_eq!(controller.display().identification, "golden retriever");
        assert_eq!(controller.display().confidence, "Confidence: 92%");
    }

    #[test]
    fn test_threshold_boundary_is_confident() {
        let (mut controller, _) = controller_with_counters(SessionOptions::default());
        controller.tap();
        controller.handle_event(PipelineEvent::PhotoCaptured(Ok(photo())));
        controller.handle_event(PipelineEvent::Classified(Ok(vec![Classification::new(
            "sponge", 0.5,
        )])));
        assert_eq!(controller.display().identification, "sponge");
        assert_eq!(controller.display().confidence, "Confidence: 50%");
    }

    #[test]
    fn test_low_confidence_takes_unknown_path() {
        let (mut controller, _) = controller_with_counters(SessionOptions::default());
        controller.tap();
        controller.handle_event(PipelineEvent::PhotoCaptured(Ok(photo())));
        controller.handle_event(PipelineEvent::Classified(Ok(vec![Classification::new(
            "sponge", 0.31,
        )])));
        assert_eq!(controller.display().identification, DEFAULT_UNKNOWN_MESSAGE);
        assert_eq!(controller.display().confidence, "");
    }

    #[test]
    fn test_empty_result_takes_unknown_path() {
        let (mut controller, _) = controller_with_counters(SessionOptions::default());
        controller.tap();
        controller.handle_event(PipelineEvent::PhotoCaptured(Ok(photo())));
        controller.handle_event(PipelineEvent::Classified(Ok(Vec::new())));
        assert_eq!(controller.display().identification, DEFAULT_UNKNOWN_MESSAGE);
        assert_eq!(controller.display().confidence, "");
        assert_eq!(controller.state(), SessionState::Announcing);
    }

    #[test]
    fn test_unknown_path_clears_previous_confidence() {
        let (mut controller, _) = controller_with_counters(SessionOptions::default());
        // First run: confident
        controller.tap();
        controller.handle_event(PipelineEvent::PhotoCaptured(Ok(photo())));
        controller.handle_event(PipelineEvent::Classified(Ok(vec![Classification::new(
            "golden retriever",
            0.92,
        )])));
        controller.handle_event(PipelineEvent::SpeechFinished);
        // Second run: not confident
        controller.tap();
        controller.handle_event(PipelineEvent::PhotoCaptured(Ok(photo())));
        controller.handle_event(PipelineEvent::Classified(Ok(vec![Classification::new(
            "sponge", 0.2,
        )])));
        assert_eq!(controller.display().identification, DEFAULT_UNKNOWN_MESSAGE);
        assert_eq!(controller.display().confidence, "");
    }

    #[test]
    fn test_classification_error_leaves_labels_untouched() {
        let (mut controller, counters) = controller_with_counters(SessionOptions::default());
        // Seed the display with a prior result
        controller.tap();
        controller.handle_event(PipelineEvent::PhotoCaptured(Ok(photo())));
        controller.handle_event(PipelineEvent::Classified(Ok(vec![Classification::new(
            "golden retriever",
            0.92,
        )])));
        controller.handle_event(PipelineEvent::SpeechFinished);

        controller.tap();
        controller.handle_event(PipelineEvent::PhotoCaptured(Ok(photo())));
        controller.handle_event(PipelineEvent::Classified(Err(
            crate::classify::ClassifyError::NotLoaded,
        )));
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(controller.display().identification, "golden retriever");
        assert_eq!(controller.display().confidence, "Confidence: 92%");
        // Announce was requested only for the first run
        assert_eq!(counters.announces.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_toggles_are_idempotent_in_pairs() {
        let (mut controller, _) = controller_with_counters(SessionOptions::default());
        assert_eq!(controller.flash_label(), "Flash: Off");
        controller.toggle_flash();
        assert_eq!(controller.flash_label(), "Flash: On");
        controller.toggle_flash();
        assert_eq!(controller.flash_label(), "Flash: Off");

        assert_eq!(controller.speech_label(), "Speech: Off");
        controller.toggle_speech();
        assert_eq!(controller.speech_label(), "Speech: On");
        controller.toggle_speech();
        assert_eq!(controller.speech_label(), "Speech: Off");
    }

    #[test]
    fn test_toggles_do_not_change_pipeline_state() {
        let (mut controller, _) = controller_with_counters(SessionOptions::default());
        controller.tap();
        controller.toggle_flash();
        controller.toggle_speech();
        assert_eq!(controller.state(), SessionState::Capturing);
    }

    #[test]
    fn test_stage_timeout_aborts_run() {
        let (mut controller, _) = controller_with_counters(SessionOptions::default());
        controller.tap();
        assert!(controller.poll_timeout(Duration::ZERO));
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_poll_timeout_is_noop_while_idle() {
        let (mut controller, _) = controller_with_counters(SessionOptions::default());
        assert!(!controller.poll_timeout(Duration::ZERO));
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_stale_event_after_timeout_is_discarded() {
        let (mut controller, counters) = controller_with_counters(SessionOptions::default());
        controller.tap();
        controller.poll_timeout(Duration::ZERO);
        // The aborted run's completion arrives late
        controller.handle_event(PipelineEvent::PhotoCaptured(Ok(photo())));
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(counters.classifies.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_confidence_formatting() {
        assert_eq!(confidence_percent(0.92), 92);
        assert_eq!(confidence_percent(0.505), 51);
        assert_eq!(confidence_percent(1.0), 100);
        assert_eq!(confidence_text(92), "Confidence: 92%");
        assert_eq!(
            announcement_sentence("golden retriever", 92),
            "This looks like a golden retriever and I am 92 percent sure"
        );
    }

    #[test]
    fn test_custom_unknown_message() {
        let options = SessionOptions {
            unknown_message: "No idea, sorry.".to_string(),
            ..SessionOptions::default()
        };
        let (mut controller, _) = controller_with_counters(options);
        controller.tap();
        controller.handle_event(PipelineEvent::PhotoCaptured(Ok(photo())));
        controller.handle_event(PipelineEvent::Classified(Ok(Vec::new())));
        assert_eq!(controller.display().identification, "No idea, sorry.");
    }

    #[test]
    fn test_photo_seq_bumps_on_each_capture() {
        let (mut controller, _) = controller_with_counters(SessionOptions::default());
        assert_eq!(controller.display().photo_seq, 0);
        controller.tap();
        controller.handle_event(PipelineEvent::PhotoCaptured(Ok(photo())));
        assert_eq!(controller.display().photo_seq, 1);
    }
}
