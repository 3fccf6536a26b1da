//! CLI argument parsing with clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Resolution preset selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResolutionPreset {
    Low,
    Medium,
    High,
}

impl ResolutionPreset {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionPreset::Low => "low",
            ResolutionPreset::Medium => "medium",
            ResolutionPreset::High => "high",
        }
    }
}

/// Terminal viewfinder that identifies what the camera sees and says it out loud
#[derive(Parser, Debug)]
#[command(name = "spotter")]
#[command(version, about = "Point a camera at something, press a key, hear what it is", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Camera device index (from list-cameras)
    #[arg(long)]
    pub camera: Option<u32>,

    /// Camera resolution preset
    #[arg(long, value_enum)]
    pub resolution: Option<ResolutionPreset>,

    /// Target frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Path to the pretrained ONNX classifier model
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Path to the labels file (one label per class index)
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Start with flash on
    #[arg(long)]
    pub flash: bool,

    /// Start with spoken announcements on
    #[arg(long)]
    pub speech: bool,

    /// Speech engine command (e.g. "espeak -v en")
    #[arg(long)]
    pub speech_cmd: Option<String>,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available cameras
    ListCameras,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
