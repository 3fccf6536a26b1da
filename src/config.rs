//! Configuration file handling for spotter.
//!
//! Loads configuration from `~/.config/spotter/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::camera::{CameraSettings, Resolution};
use crate::classify::ClassifierSettings;

/// Configuration file structure for spotter.
/// Loaded from ~/.config/spotter/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct CameraConfig {
    /// Camera device index (see `spotter list-cameras`)
    #[serde(default)]
    pub device: u32,
    /// Resolution preset: "low", "medium", or "high"
    #[serde(default)]
    pub resolution: Option<String>,
    /// Target frame rate
    #[serde(default)]
    pub fps: Option<u32>,
    /// Start with flash on
    #[serde(default)]
    pub flash: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct ClassifierConfig {
    /// Path to the pretrained ONNX model
    #[serde(default)]
    pub model: Option<PathBuf>,
    /// Path to the labels file (one label per class index)
    #[serde(default)]
    pub labels: Option<PathBuf>,
    /// Square input size the model expects
    #[serde(default)]
    pub input_size: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SpeechConfig {
    /// Start with announcements enabled
    #[serde(default)]
    pub enabled: bool,
    /// Speech engine command, e.g. "espeak -v en" (platform default if unset)
    #[serde(default)]
    pub command: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UiConfig {
    /// Override for the unknown-object message
    #[serde(default)]
    pub unknown_message: Option<String>,
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Resolve camera settings, parsing the resolution preset.
    ///
    /// Unknown presets fall back to medium with a warning rather than
    /// refusing to start.
    pub fn camera_settings(&self) -> CameraSettings {
        let resolution = match self.camera.resolution.as_deref() {
            None => Resolution::default(),
            Some("low") => Resolution::LOW,
            Some("medium") => Resolution::MEDIUM,
            Some("high") => Resolution::HIGH,
            Some(other) => {
                log::warn!("Unknown resolution preset '{}', using medium", other);
                Resolution::MEDIUM
            }
        };

        CameraSettings {
            device_index: self.camera.device,
            resolution,
            fps: self.camera.fps.unwrap_or(30),
        }
    }

    /// Resolve classifier settings, filling defaults for unset fields.
    pub fn classifier_settings(&self) -> ClassifierSettings {
        let defaults = ClassifierSettings::default();
        ClassifierSettings {
            model_path: self.classifier.model.clone().unwrap_or(defaults.model_path),
            labels_path: self
                .classifier
                .labels
                .clone()
                .unwrap_or(defaults.labels_path),
            input_size: self.classifier.input_size.unwrap_or(defaults.input_size),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("spotter").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/spotter/config.toml")
        })
}

/// Template written by `spotter config init`.
pub const CONFIG_TEMPLATE: &str = "\
# spotter configuration

[camera]
# device = 0
# resolution = \"medium\"   # low | medium | high
# fps = 30
# flash = false

[classifier]
# model = \"models/squeezenet1.1.onnx\"
# labels = \"models/labels.txt\"
# input_size = 224

[speech]
# enabled = false
# command = \"espeak\"

[ui]
# unknown_message = \"I'm not sure what this is. Please try again.\"
";

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.camera.device, 0);
        assert!(!config.speech.enabled);
        assert!(config.classifier.model.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[camera]
device = 2
resolution = "high"
fps = 15
flash = true

[classifier]
model = "my/model.onnx"
labels = "my/labels.txt"
input_size = 299

[speech]
enabled = true
command = "espeak -v en"

[ui]
unknown_message = "Beats me."
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.camera.device, 2);
        assert!(config.camera.flash);
        assert!(config.speech.enabled);
        assert_eq!(config.speech.command.as_deref(), Some("espeak -v en"));
        assert_eq!(config.ui.unknown_message.as_deref(), Some("Beats me."));

        let camera = config.camera_settings();
        assert_eq!(camera.resolution, Resolution::HIGH);
        assert_eq!(camera.fps, 15);

        let classifier = config.classifier_settings();
        assert_eq!(classifier.model_path, PathBuf::from("my/model.onnx"));
        assert_eq!(classifier.input_size, 299);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[camera\ndevice = ").unwrap();
        let result = Config::load(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_unknown_resolution_preset_falls_back() {
        let config = Config {
            camera: CameraConfig {
                resolution: Some("gigantic".to_string()),
                ..CameraConfig::default()
            },
            ..Config::default()
        };
        assert_eq!(config.camera_settings().resolution, Resolution::MEDIUM);
    }

    #[test]
    fn test_config_template_parses() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.camera.device, 0);
    }
}
