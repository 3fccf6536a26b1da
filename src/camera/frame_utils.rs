//! Frame conversion and photo encoding utilities.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use nokhwa::pixel_format::RgbFormat;
use std::time::Instant;

use super::types::{CameraError, CapturedImage, FlashMode, Frame, FrameFormat};

/// JPEG quality used for still photos.
const JPEG_QUALITY: u8 = 90;

/// Convert a nokhwa buffer to our RGB Frame format.
///
/// Handles various camera formats (MJPEG, YUYV, NV12, etc.) by using
/// nokhwa's built-in decode_image which automatically converts from
/// the camera's native format to RGB.
///
/// Returns `None` if the conversion fails (unsupported format or corrupt data).
pub fn convert_to_rgb(buffer: &nokhwa::Buffer) -> Option<Frame> {
    let decoded = buffer.decode_image::<RgbFormat>().ok()?;
    let resolution = buffer.resolution();

    Some(Frame {
        data: decoded.into_raw(),
        width: resolution.width(),
        height: resolution.height(),
        format: FrameFormat::Rgb,
        timestamp: Instant::now(),
    })
}

/// Encode an RGB frame as a JPEG still photo.
///
/// The flash mode is recorded on the result; webcams expose no torch
/// control, so the mode is carried as capture metadata only.
pub fn encode_photo(frame: &Frame, flash: FlashMode) -> Result<CapturedImage, CameraError> {
    let expected = frame.width as usize * frame.height as usize * frame.bytes_per_pixel();
    if frame.data.len() != expected {
        return Err(CameraError::CaptureFailed(format!(
            "frame buffer has {} bytes, expected {}",
            frame.data.len(),
            expected
        )));
    }

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    encoder
        .write_image(
            &frame.data,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

    Ok(CapturedImage {
        data: jpeg,
        width: frame.width,
        height: frame.height,
        flash,
    })
}
