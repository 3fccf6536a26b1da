use clap::Parser;
use std::fs::File;
use std::path::PathBuf;

use spotter::camera::CameraCapture;
use spotter::classify::ClassifyWorker;
use spotter::cli::{self, Args, Command};
use spotter::config::Config;
use spotter::event_loop;
use spotter::session::{
    CameraCaptureService, SessionController, SynthesizerAnnounceService, WorkerClassifyService,
};
use spotter::speech::SpeechSynthesizer;
use spotter::ui::Tui;

/// Where log output goes while the TUI owns the terminal.
fn log_file_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("spotter")
        .join("spotter.log")
}

/// Route log output to a file so it does not corrupt the alternate screen.
fn init_tui_logging() {
    let path = log_file_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match File::create(&path) {
        Ok(file) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        Err(_) => {
            // Fall back to stderr; the screen may flicker but logs survive
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .init();
        }
    }
}

fn run_app(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tui_logging();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) if args.config.is_some() => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Warning: failed to load config file: {}", e);
            eprintln!("Using default settings.\n");
            Config::default()
        }
    };
    let settings = cli::resolve(&args, &config);

    // The classifier loads its model on a background thread so the screen
    // comes up immediately even with a slow model file.
    let worker = ClassifyWorker::spawn(settings.classifier);
    let synthesizer = SpeechSynthesizer::new(settings.speech_command.as_deref());

    // A camera failure is not fatal. The screen shows the unavailable
    // banner and capture taps resolve as device errors.
    let camera = match CameraCapture::open(settings.camera) {
        Ok(mut capture) => match capture.start() {
            Ok(()) => Some(capture),
            Err(e) => {
                log::error!("Failed to start camera stream: {}", e);
                None
            }
        },
        Err(e) => {
            log::error!("Failed to open camera: {}", e);
            None
        }
    };

    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
    let requester = camera.as_ref().and_then(|cam| cam.photo_requester());

    let mut controller = SessionController::new(
        Box::new(CameraCaptureService::new(requester, events_tx.clone())),
        Box::new(WorkerClassifyService::new(worker.submitter(), events_tx.clone())),
        Box::new(SynthesizerAnnounceService::new(synthesizer, events_tx)),
        settings.session,
    );

    let mut tui = Tui::new()?;

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(event_loop::run(
        &mut tui,
        &mut controller,
        camera.as_ref(),
        events_rx,
    ));

    tui.restore()?;
    drop(camera);
    drop(worker);

    result
}

fn main() {
    let args = Args::parse();

    match args.command {
        Some(Command::ListCameras) => {
            env_logger::init();
            if let Err(e) = cli::run_list_cameras() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Command::Config { ref action }) => {
            env_logger::init();
            if let Err(e) = cli::run_config(action, args.config.as_deref()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            if let Err(e) = run_app(args) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
