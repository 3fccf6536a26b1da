//! Speech engine subprocess handling.

use std::process::{Command, Stdio};
use thiserror::Error;

/// Callback invoked when an utterance has finished (or was skipped).
pub type SpeechCallback = Box<dyn FnOnce() + Send>;

/// Default speech engine on macOS.
#[cfg(target_os = "macos")]
const DEFAULT_ENGINE: &str = "say";

/// Default speech engine elsewhere.
#[cfg(not(target_os = "macos"))]
const DEFAULT_ENGINE: &str = "espeak";

/// Errors that can occur when driving the speech engine.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// The engine binary was not found on PATH
    #[error("Speech engine '{0}' not found. Install it or set speech.command in the config")]
    EngineNotFound(String),

    /// The engine process could not be spawned
    #[error("Failed to spawn speech engine '{engine}': {source}")]
    SpawnFailed {
        engine: String,
        source: std::io::Error,
    },

    /// The engine process exited with a non-zero status
    #[error("Speech engine '{engine}' exited with {status}")]
    EngineFailed {
        engine: String,
        status: std::process::ExitStatus,
    },

    /// The configured command was empty
    #[error("Speech command is empty")]
    EmptyCommand,
}

/// Speaks sentences through an external engine, one utterance at a time.
///
/// The caller holds the speech-enabled flag and passes it at request time;
/// a disabled announcement is a no-op whose completion fires immediately,
/// so the pipeline's idle transition never blocks on a muted announcer.
#[derive(Debug, Clone)]
pub struct SpeechSynthesizer {
    /// Engine program followed by its fixed arguments
    command: Vec<String>,
}

impl Default for SpeechSynthesizer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SpeechSynthesizer {
    /// Create a synthesizer for the given engine command.
    ///
    /// `command` is a whitespace-separated program plus fixed arguments
    /// (e.g. `"espeak -v en -s 150"`); the utterance text is appended as
    /// one final argument. `None` selects the platform default engine.
    pub fn new(command: Option<&str>) -> Self {
        let command = command
            .map(|c| c.split_whitespace().map(String::from).collect::<Vec<_>>())
            .filter(|parts| !parts.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_ENGINE.to_string()]);
        Self { command }
    }

    /// The engine program name.
    pub fn engine(&self) -> &str {
        &self.command[0]
    }

    /// Speak `text`, invoking `on_done` when playback finishes.
    ///
    /// When `enabled` is false nothing is spawned and `on_done` fires
    /// immediately. Engine failures are logged and still complete: a broken
    /// speech engine must never leave the pipeline busy.
    pub fn speak(&self, text: &str, enabled: bool, on_done: SpeechCallback) {
        if !enabled {
            log::debug!("speech disabled, skipping utterance");
            on_done();
            return;
        }

        let command = self.command.clone();
        let text = text.to_string();
        std::thread::spawn(move || {
            if let Err(e) = run_engine(&command, &text) {
                log::error!("{}", e);
            }
            on_done();
        });
    }
}

/// Run the engine to completion for one utterance.
fn run_engine(command: &[String], text: &str) -> Result<(), SpeechError> {
    let (engine, fixed_args) = command.split_first().ok_or(SpeechError::EmptyCommand)?;

    let status = Command::new(engine)
        .args(fixed_args)
        .arg(text)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpeechError::EngineNotFound(engine.clone())
            } else {
                SpeechError::SpawnFailed {
                    engine: engine.clone(),
                    source: e,
                }
            }
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(SpeechError::EngineFailed {
            engine: engine.clone(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_disabled_announcement_completes_immediately() {
        let synth = SpeechSynthesizer::default();
        let (tx, rx) = mpsc::channel();
        synth.speak(
            "This looks like a test",
            false,
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        // No subprocess involved, so this resolves without any real delay
        rx.recv_timeout(Duration::from_millis(100))
            .expect("disabled announce must complete immediately");
    }

    #[test]
    fn test_missing_engine_still_completes() {
        let synth = SpeechSynthesizer::new(Some("definitely-not-a-real-engine-xyz"));
        let (tx, rx) = mpsc::channel();
        synth.speak(
            "hello",
            true,
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        rx.recv_timeout(Duration::from_secs(5))
            .expect("announce must complete even when the engine is missing");
    }

    #[test]
    fn test_command_parsing() {
        let synth = SpeechSynthesizer::new(Some("espeak -v en -s 150"));
        assert_eq!(synth.engine(), "espeak");

        let synth = SpeechSynthesizer::new(Some("   "));
        assert_eq!(synth.engine(), super::DEFAULT_ENGINE);
    }

    #[test]
    fn test_run_engine_true_binary_succeeds() {
        // `true` ignores its arguments and exits 0, standing in for an engine
        let result = run_engine(&["true".to_string()], "hello");
        assert!(result.is_ok());
    }

    #[test]
    fn test_run_engine_false_binary_reports_failure() {
        let result = run_engine(&["false".to_string()], "hello");
        assert!(matches!(result, Err(SpeechError::EngineFailed { .. })));
    }
}
