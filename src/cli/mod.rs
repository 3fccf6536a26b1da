//! Command-line interface: argument parsing, settings resolution, and
//! the non-TUI subcommands.

mod args;
mod commands;

pub use args::{Args, Command, ConfigAction, ResolutionPreset};
pub use commands::{run_config, run_list_cameras};

use crate::camera::{CameraSettings, FlashMode};
use crate::classify::ClassifierSettings;
use crate::config::Config;
use crate::session::{SessionOptions, DEFAULT_UNKNOWN_MESSAGE};

/// Fully resolved settings for one app run. Command-line flags win over
/// config file values, which win over built-in defaults.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub camera: CameraSettings,
    pub classifier: ClassifierSettings,
    pub speech_command: Option<String>,
    pub session: SessionOptions,
}

/// Resolve the layered configuration into concrete settings.
pub fn resolve(args: &Args, config: &Config) -> AppSettings {
    let mut camera = config.camera_settings();
    if let Some(device) = args.camera {
        camera.device_index = device;
    }
    if let Some(preset) = args.resolution {
        camera.resolution = match preset {
            ResolutionPreset::Low => crate::camera::Resolution::LOW,
            ResolutionPreset::Medium => crate::camera::Resolution::MEDIUM,
            ResolutionPreset::High => crate::camera::Resolution::HIGH,
        };
    }
    if let Some(fps) = args.fps {
        camera.fps = fps;
    }

    let mut classifier = config.classifier_settings();
    if let Some(model) = &args.model {
        classifier.model_path = model.clone();
    }
    if let Some(labels) = &args.labels {
        classifier.labels_path = labels.clone();
    }

    let flash = if args.flash || config.camera.flash {
        FlashMode::On
    } else {
        FlashMode::Off
    };
    let speech_enabled = args.speech || config.speech.enabled;
    let unknown_message = config
        .ui
        .unknown_message
        .clone()
        .unwrap_or_else(|| DEFAULT_UNKNOWN_MESSAGE.to_string());

    let speech_command = args
        .speech_cmd
        .clone()
        .or_else(|| config.speech.command.clone());

    AppSettings {
        camera,
        classifier,
        speech_command,
        session: SessionOptions {
            flash,
            speech_enabled,
            unknown_message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Resolution;
    use clap::Parser;

    #[test]
    fn test_resolve_defaults() {
        let args = Args::parse_from(["spotter"]);
        let settings = resolve(&args, &Config::default());
        assert_eq!(settings.camera.device_index, 0);
        assert_eq!(settings.camera.resolution, Resolution::MEDIUM);
        assert_eq!(settings.session.flash, FlashMode::Off);
        assert!(!settings.session.speech_enabled);
        assert_eq!(settings.session.unknown_message, DEFAULT_UNKNOWN_MESSAGE);
        assert!(settings.speech_command.is_none());
    }

    #[test]
    fn test_cli_overrides_config() {
        let config: Config = toml::from_str(
            r#"
[camera]
device = 1
resolution = "low"

[speech]
command = "say"
"#,
        )
        .unwrap();

        let args = Args::parse_from([
            "spotter",
            "--camera",
            "3",
            "--resolution",
            "high",
            "--speech-cmd",
            "espeak",
        ]);
        let settings = resolve(&args, &config);
        assert_eq!(settings.camera.device_index, 3);
        assert_eq!(settings.camera.resolution, Resolution::HIGH);
        assert_eq!(settings.speech_command.as_deref(), Some("espeak"));
    }

    #[test]
    fn test_config_values_survive_without_flags() {
        let config: Config = toml::from_str(
            r#"
[camera]
flash = true

[speech]
enabled = true

[ui]
unknown_message = "Beats me."
"#,
        )
        .unwrap();

        let args = Args::parse_from(["spotter"]);
        let settings = resolve(&args, &config);
        assert_eq!(settings.session.flash, FlashMode::On);
        assert!(settings.session.speech_enabled);
        assert_eq!(settings.session.unknown_message, "Beats me.");
    }
}
