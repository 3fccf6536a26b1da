//! Text-to-speech announcer backed by an external speech engine.
//!
//! Utterances are spoken by spawning the configured engine binary
//! (`espeak` by default on Linux, `say` on macOS) with the sentence as its
//! final argument. Completion is signaled when the process exits, which is
//! when audio playback finishes for both default engines.

mod synthesizer;

pub use synthesizer::{SpeechCallback, SpeechError, SpeechSynthesizer};
