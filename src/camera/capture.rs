//! Capture session handle and public API.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use super::capture_loop::{run_capture_loop, CaptureCommand, PhotoCallback};
use super::device::find_device;
use super::types::{CameraError, CameraSettings, FlashMode, Frame, Resolution};

/// Handle for requesting one-shot photo captures from the capture thread.
///
/// Cheap to clone; the session controller holds one and issues at most one
/// request per pipeline run (the busy state enforces single-flight, not
/// this handle).
#[derive(Clone)]
pub struct PhotoRequester {
    tx: Sender<CaptureCommand>,
}

impl PhotoRequester {
    /// Request a single photo with the given flash mode.
    ///
    /// The callback fires on the capture thread with either the encoded
    /// image bytes or a `CameraError`. If the capture thread is gone, the
    /// callback fires immediately with `CameraError::StreamFailed`.
    pub fn request(&self, flash: FlashMode, on_done: PhotoCallback) {
        if let Err(send_err) = self.tx.send(CaptureCommand::TakePhoto { flash, on_done }) {
            if let CaptureCommand::TakePhoto { on_done, .. } = send_err.0 {
                on_done(Err(CameraError::StreamFailed(
                    "capture thread has exited".to_string(),
                )));
            }
        }
    }
}

/// Camera capture session.
///
/// Owns the camera exclusively for the life of the app: a background thread
/// continuously streams frames into a shared latest-frame buffer for the
/// preview surface, and serves photo capture requests on demand. Call
/// `start()` to begin streaming, `latest_frame()` for preview frames, and
/// `photo_requester()` for the still-capture handle.
pub struct CameraCapture {
    /// Latest streamed frame (shared with capture thread)
    frame_buffer: Arc<Mutex<Option<Frame>>>,
    /// Capture thread handle
    capture_thread: Option<JoinHandle<()>>,
    /// Channel to send commands to capture thread
    command_tx: Option<Sender<CaptureCommand>>,
    /// Signal to stop capture thread
    stop_signal: Arc<AtomicBool>,
    /// Current settings
    settings: CameraSettings,
    /// Actual resolution (set after camera opens)
    actual_resolution: Option<Resolution>,
    /// Actual FPS (set after camera opens)
    actual_fps: Option<u32>,
}

impl std::fmt::Debug for CameraCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraCapture")
            .field("settings", &self.settings)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CameraCapture {
    /// Open a capture session with the specified settings.
    ///
    /// This validates that the camera exists but doesn't actually open
    /// the camera stream until `start()` is called. The camera is opened
    /// inside the background thread to avoid thread-safety issues.
    ///
    /// # Errors
    /// * `CameraError::NoDevices` - If no camera is present at all
    /// * `CameraError::DeviceNotFound` - If the device index doesn't exist
    pub fn open(settings: CameraSettings) -> Result<Self, CameraError> {
        find_device(settings.device_index)?;

        Ok(Self {
            frame_buffer: Arc::new(Mutex::new(None)),
            capture_thread: None,
            command_tx: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
            settings,
            actual_resolution: None,
            actual_fps: None,
        })
    }

    /// Get the current camera settings.
    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Get the actual resolution the camera is using.
    ///
    /// Returns `None` if the camera hasn't been started yet. This may
    /// differ from the requested resolution if the camera doesn't support
    /// it exactly.
    pub fn actual_resolution(&self) -> Option<Resolution> {
        self.actual_resolution
    }

    /// Get the actual frame rate the camera is using.
    pub fn actual_fps(&self) -> Option<u32> {
        self.actual_fps
    }

    /// Start streaming frames in a background thread.
    ///
    /// # Errors
    /// * `CameraError::AlreadyRunning` - If capture is already running
    /// * `CameraError::StreamFailed` - If the camera stream fails to start
    /// * `CameraError::PermissionDenied` - If camera access is denied (macOS)
    /// * `CameraError::OpenFailed` - If camera fails to open for other reasons
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.is_running() {
            return Err(CameraError::AlreadyRunning);
        }

        // Reset stop signal
        self.stop_signal.store(false, Ordering::SeqCst);

        // Create channel for commands
        let (tx, rx) = mpsc::channel();
        self.command_tx = Some(tx);

        // Clone values for the capture thread
        let buffer = Arc::clone(&self.frame_buffer);
        let stop = Arc::clone(&self.stop_signal);
        let settings = self.settings.clone();

        // Channel to receive actual resolution/fps from thread
        let (info_tx, info_rx) = mpsc::channel::<Result<(Resolution, u32), CameraError>>();

        // Spawn background capture thread
        let handle = std::thread::spawn(move || {
            run_capture_loop(settings, buffer, stop, rx, info_tx);
        });

        self.capture_thread = Some(handle);

        // Wait for the thread to report success or failure
        match info_rx.recv() {
            Ok(Ok((res, fps))) => {
                self.actual_resolution = Some(res);
                self.actual_fps = Some(fps);
                Ok(())
            }
            Ok(Err(e)) => {
                // Thread encountered an error, clean up
                self.stop_signal.store(true, Ordering::SeqCst);
                if let Some(h) = self.capture_thread.take() {
                    let _ = h.join();
                }
                self.command_tx = None;
                Err(e)
            }
            Err(_) => {
                // Channel closed unexpectedly
                self.stop_signal.store(true, Ordering::SeqCst);
                if let Some(h) = self.capture_thread.take() {
                    let _ = h.join();
                }
                self.command_tx = None;
                Err(CameraError::StreamFailed(
                    "Capture thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    /// Get a handle for issuing photo capture requests.
    ///
    /// Returns `None` until `start()` has succeeded.
    pub fn photo_requester(&self) -> Option<PhotoRequester> {
        self.command_tx
            .as_ref()
            .map(|tx| PhotoRequester { tx: tx.clone() })
    }

    /// Stop the capture thread.
    ///
    /// Signals the background thread to stop and waits for it to finish.
    pub fn stop(&mut self) {
        // Signal the thread to stop via atomic flag
        self.stop_signal.store(true, Ordering::SeqCst);

        // Also send stop command via channel (in case thread is blocked)
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(CaptureCommand::Stop);
        }

        // Wait for thread to finish
        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
    }

    /// Get the latest streamed frame for the preview surface.
    ///
    /// Returns `None` if no frame has been captured yet or if streaming
    /// is not running.
    pub fn latest_frame(&self) -> Option<Frame> {
        let buffer = self.frame_buffer.lock().ok()?;
        buffer.clone()
    }

    /// Check if the capture thread is currently running.
    pub fn is_running(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_open_invalid_device() {
        // Use a device index that is very unlikely to exist
        let settings = CameraSettings {
            device_index: 999,
            resolution: Resolution::default(),
            fps: 30,
        };
        let result = CameraCapture::open(settings);
        assert!(result.is_err());
    }

    #[test]
    fn test_photo_requester_absent_before_start() {
        // Only meaningful on machines with a camera at index 0
        if let Ok(capture) = CameraCapture::open(CameraSettings::default()) {
            assert!(capture.photo_requester().is_none());
        }
    }

    #[test]
    fn test_requester_on_dead_thread_fails_fast() {
        use super::super::types::CapturedImage;
        use std::sync::mpsc;

        // Build a requester whose receiving end is already gone
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let requester = PhotoRequester { tx };

        let (result_tx, result_rx) = mpsc::channel::<Result<CapturedImage, CameraError>>();
        requester.request(
            FlashMode::Off,
            Box::new(move |result| {
                let _ = result_tx.send(result);
            }),
        );

        let result = result_rx.recv().unwrap();
        assert!(matches!(result, Err(CameraError::StreamFailed(_))));
    }
}
