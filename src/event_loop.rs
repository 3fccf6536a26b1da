//! Async main loop for concurrent handling of keyboard input, pipeline
//! completion events, and preview rendering.
//!
//! The loop multiplexes three concerns with `tokio::select!`:
//! 1. Terminal events (keyboard) via crossterm's EventStream
//! 2. Pipeline completion signals from the capture/classify/speech services
//! 3. A UI tick (~15 FPS) that renders the preview and polls the stage
//!    timeout

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::camera::CameraCapture;
use crate::preview::{self, AsciiImage};
use crate::session::{PipelineEvent, SessionController, STAGE_TIMEOUT};
use crate::ui::{self, ScreenState, Tui};

/// UI refresh interval (~15 FPS).
const UI_TICK: Duration = Duration::from_millis(67);

/// What a key press means on the single screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Trigger one pipeline run (the "tap" on the capture surface)
    Capture,
    /// Toggle the flash mode
    ToggleFlash,
    /// Toggle spoken announcements
    ToggleSpeech,
    /// Leave the application
    Quit,
    /// Ignored
    None,
}

/// Map a key event to its action.
///
/// Space or Enter captures, `f` and `s` drive the two toggles, and
/// `q`, Esc, or Ctrl+C quits.
pub fn key_action(event: &KeyEvent) -> KeyAction {
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return match event.code {
            KeyCode::Char('c') | KeyCode::Char('C') => KeyAction::Quit,
            _ => KeyAction::None,
        };
    }

    match event.code {
        KeyCode::Char(' ') | KeyCode::Enter => KeyAction::Capture,
        KeyCode::Char('f') | KeyCode::Char('F') => KeyAction::ToggleFlash,
        KeyCode::Char('s') | KeyCode::Char('S') => KeyAction::ToggleSpeech,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
        _ => KeyAction::None,
    }
}

/// Run the application loop until quit.
///
/// `camera` is `None` when the capture session failed to configure at
/// startup; the screen then shows the unavailable banner and capture taps
/// resolve as errors through the normal pipeline path.
pub async fn run(
    tui: &mut Tui,
    controller: &mut SessionController,
    camera: Option<&CameraCapture>,
    mut completions: UnboundedReceiver<PipelineEvent>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut event_stream = crossterm::event::EventStream::new();

    let mut ui_interval = tokio::time::interval(UI_TICK);
    ui_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let camera_ok = camera.is_some();
    let mut spinner_tick = 0usize;

    // Thumbnail is re-rendered only when a new photo lands
    let mut thumbnail: Option<AsciiImage> = None;
    let mut thumbnail_seq = 0u64;

    loop {
        tokio::select! {
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        match key_action(&key) {
                            KeyAction::Capture => controller.tap(),
                            KeyAction::ToggleFlash => controller.toggle_flash(),
                            KeyAction::ToggleSpeech => controller.toggle_speech(),
                            KeyAction::Quit => break,
                            KeyAction::None => {}
                        }
                    }
                    Some(Ok(_)) => {
                        // Resize and other events are absorbed by the next draw
                    }
                    Some(Err(e)) => return Err(Box::new(e)),
                    None => break,
                }
            }

            maybe_completion = completions.recv() => {
                match maybe_completion {
                    Some(event) => controller.handle_event(event),
                    // All service handles dropped - nothing can complete anymore
                    None => break,
                }
            }

            _ = ui_interval.tick() => {
                spinner_tick = spinner_tick.wrapping_add(1);
                controller.poll_timeout(STAGE_TIMEOUT);

                if controller.display().photo_seq != thumbnail_seq {
                    thumbnail_seq = controller.display().photo_seq;
                    let (cols, rows) = ui::thumbnail_dimensions();
                    thumbnail = controller
                        .display()
                        .photo
                        .as_ref()
                        .and_then(|photo| preview::render_photo(photo, cols, rows));
                }

                let (term_cols, term_rows) = crossterm::terminal::size().unwrap_or((80, 24));
                let (cols, rows) = ui::preview_dimensions(term_cols, term_rows);
                let preview_image = camera
                    .and_then(|cam| cam.latest_frame())
                    .map(|frame| preview::render_frame(&frame, cols, rows))
                    .unwrap_or_else(|| AsciiImage::blank(cols, rows));

                let state = ScreenState {
                    preview: &preview_image,
                    thumbnail: thumbnail.as_ref(),
                    identification: &controller.display().identification,
                    confidence: &controller.display().confidence,
                    flash_label: controller.flash_label(),
                    speech_label: controller.speech_label(),
                    busy: controller.is_busy(),
                    stage: controller.state().name(),
                    spinner_tick,
                    camera_ok,
                };
                tui.terminal().draw(|frame| ui::draw(frame, &state))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_capture_keys() {
        assert_eq!(key_action(&key(KeyCode::Char(' '))), KeyAction::Capture);
        assert_eq!(key_action(&key(KeyCode::Enter)), KeyAction::Capture);
    }

    #[test]
    fn test_toggle_keys() {
        assert_eq!(key_action(&key(KeyCode::Char('f'))), KeyAction::ToggleFlash);
        assert_eq!(key_action(&key(KeyCode::Char('F'))), KeyAction::ToggleFlash);
        assert_eq!(key_action(&key(KeyCode::Char('s'))), KeyAction::ToggleSpeech);
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(key_action(&key(KeyCode::Char('q'))), KeyAction::Quit);
        assert_eq!(key_action(&key(KeyCode::Esc)), KeyAction::Quit);
        assert_eq!(
            key_action(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyAction::Quit
        );
    }

    #[test]
    fn test_unknown_keys_ignored() {
        assert_eq!(key_action(&key(KeyCode::Char('x'))), KeyAction::None);
        assert_eq!(key_action(&key(KeyCode::Tab)), KeyAction::None);
    }
}
