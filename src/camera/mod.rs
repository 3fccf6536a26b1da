//! Camera capture module: device enumeration, continuous preview
//! streaming, and one-shot photo captures.
//!
//! - Device enumeration via [`list_devices`]
//! - Capture session via [`CameraCapture`]
//! - Photo requests via [`PhotoRequester`]
//! - Configuration via [`CameraSettings`], [`Resolution`], and [`FlashMode`]

mod capture;
mod capture_loop;
mod device;
mod frame_utils;
mod types;

pub use capture::{CameraCapture, PhotoRequester};
pub use capture_loop::PhotoCallback;
pub use device::{find_device, list_devices};
pub use frame_utils::{convert_to_rgb, encode_photo};
pub use types::{
    CameraError, CameraInfo, CameraSettings, CapturedImage, FlashMode, Frame, FrameFormat,
    Resolution,
};
