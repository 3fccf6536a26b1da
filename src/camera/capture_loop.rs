//! Background capture thread implementation.
//!
//! The thread streams continuous preview frames into a shared buffer and
//! serves one-shot photo capture requests sent over the command channel.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::frame_utils::{convert_to_rgb, encode_photo};
use super::types::{CameraError, CameraSettings, CapturedImage, FlashMode, Frame, Resolution};

/// Callback invoked with the outcome of one photo capture request.
pub type PhotoCallback = Box<dyn FnOnce(Result<CapturedImage, CameraError>) + Send>;

/// Commands sent to the capture thread.
pub enum CaptureCommand {
    /// Capture one still photo with the given flash mode.
    TakePhoto {
        flash: FlashMode,
        on_done: PhotoCallback,
    },
    Stop,
}

/// How long a photo request will wait for a usable frame.
const PHOTO_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

/// A preview frame younger than this is fresh enough to serve as the photo.
const PHOTO_FRESHNESS: Duration = Duration::from_millis(150);

/// Run the capture loop in a background thread.
pub fn run_capture_loop(
    settings: CameraSettings,
    buffer: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
    rx: Receiver<CaptureCommand>,
    info_tx: Sender<Result<(Resolution, u32), CameraError>>,
) {
    let index = CameraIndex::Index(settings.device_index);

    // Try multiple format strategies in order of preference
    let mut camera = match open_camera_with_fallback(&index, &settings) {
        Ok(cam) => cam,
        Err(e) => {
            let _ = info_tx.send(Err(e));
            return;
        }
    };

    // Open stream
    if let Err(e) = camera.open_stream() {
        let _ = info_tx.send(Err(CameraError::StreamFailed(e.to_string())));
        return;
    }

    // Send back the actual resolution and fps
    let res = camera.resolution();
    let actual_res = Resolution {
        width: res.width(),
        height: res.height(),
    };
    let actual_fps = camera.frame_rate();
    let _ = info_tx.send(Ok((actual_res, actual_fps)));

    // Stream loop
    while !stop.load(Ordering::Relaxed) {
        // Check for commands (non-blocking)
        match rx.try_recv() {
            Ok(CaptureCommand::Stop) => break,
            Ok(CaptureCommand::TakePhoto { flash, on_done }) => {
                let result = take_photo(&mut camera, &buffer, flash);
                on_done(result);
            }
            Err(_) => {}
        }

        // Pull the next preview frame
        if let Ok(raw_frame) = camera.frame() {
            // Convert to RGB Frame (handles MJPEG, YUYV, and other formats)
            if let Some(frame) = convert_to_rgb(&raw_frame) {
                // Store in shared buffer
                if let Ok(mut buf) = buffer.lock() {
                    *buf = Some(frame);
                }
            }
            // If conversion fails, silently skip this frame and try the next one
        }

        // Small sleep to allow checking the stop signal
        thread::sleep(Duration::from_millis(1));
    }

    // Clean up
    let _ = camera.stop_stream();
}

/// Serve one photo request: use the latest preview frame if it is fresh,
/// otherwise pull frames until one converts or the timeout expires.
fn take_photo(
    camera: &mut Camera,
    buffer: &Arc<Mutex<Option<Frame>>>,
    flash: FlashMode,
) -> Result<CapturedImage, CameraError> {
    if flash == FlashMode::On {
        // Webcams have no torch control; the mode still travels with the
        // capture so downstream consumers see what was requested.
        log::debug!("flash requested for capture (no torch on this device class)");
    }

    if let Ok(buf) = buffer.lock() {
        if let Some(frame) = buf.as_ref() {
            if frame.timestamp.elapsed() < PHOTO_FRESHNESS {
                return encode_photo(frame, flash);
            }
        }
    }

    let deadline = Instant::now() + PHOTO_FRAME_TIMEOUT;
    while Instant::now() < deadline {
        if let Ok(raw_frame) = camera.frame() {
            if let Some(frame) = convert_to_rgb(&raw_frame) {
                return encode_photo(&frame, flash);
            }
        }
        thread::sleep(Duration::from_millis(10));
    }

    Err(CameraError::NoFrame)
}

/// Try to open a camera with multiple format fallback strategies.
fn open_camera_with_fallback(
    index: &CameraIndex,
    settings: &CameraSettings,
) -> Result<Camera, CameraError> {
    // Try multiple format strategies in order of preference:
    // 1. Closest match with NV12 (common on macOS)
    // 2. Closest match with MJPEG (widely supported)
    // 3. Highest resolution available (let camera decide format)
    let format_attempts: Vec<RequestedFormat> = vec![
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height),
            NokhwaFrameFormat::NV12,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height),
            NokhwaFrameFormat::MJPEG,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;

    for requested in format_attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    let e = last_error.unwrap();
    let msg = e.to_string().to_lowercase();
    if msg.contains("permission")
        || msg.contains("denied")
        || msg.contains("authorization")
        || msg.contains("access")
    {
        Err(CameraError::PermissionDenied)
    } else {
        Err(CameraError::OpenFailed(e.to_string()))
    }
}
