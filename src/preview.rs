//! ASCII rendering for the live preview surface and the photo thumbnail.
//!
//! Camera frames are converted to a character grid in three steps:
//! grayscale (ITU-R BT.601 luminance), box-average downsample to the cell
//! grid, and brightness-to-character mapping over a density ramp.

use crate::camera::{CapturedImage, Frame, FrameFormat};

/// Density ramp ordered from darkest (space) to brightest (@).
pub const PREVIEW_CHARSET: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// A rendered character grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiImage {
    pub cols: u16,
    pub rows: u16,
    chars: Vec<char>,
}

impl AsciiImage {
    /// Rows of the grid as strings, top to bottom.
    pub fn lines(&self) -> Vec<String> {
        self.chars
            .chunks(self.cols.max(1) as usize)
            .map(|row| row.iter().collect())
            .collect()
    }

    /// An all-blank grid (used while no frame has arrived yet).
    pub fn blank(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            chars: vec![' '; cols as usize * rows as usize],
        }
    }
}

/// Render a streamed camera frame to a `cols` x `rows` character grid.
pub fn render_frame(frame: &Frame, cols: u16, rows: u16) -> AsciiImage {
    debug_assert_eq!(frame.format, FrameFormat::Rgb);
    render_rgb(&frame.data, frame.width, frame.height, cols, rows)
}

/// Render a captured JPEG photo to a character grid.
///
/// Returns `None` if the photo bytes cannot be decoded.
pub fn render_photo(photo: &CapturedImage, cols: u16, rows: u16) -> Option<AsciiImage> {
    let rgb = image::load_from_memory(&photo.data).ok()?.to_rgb8();
    let (width, height) = rgb.dimensions();
    Some(render_rgb(&rgb.into_raw(), width, height, cols, rows))
}

/// Render raw RGB pixel data to a character grid.
pub fn render_rgb(data: &[u8], width: u32, height: u32, cols: u16, rows: u16) -> AsciiImage {
    if cols == 0 || rows == 0 || width == 0 || height == 0 || data.is_empty() {
        return AsciiImage::blank(cols, rows);
    }

    let gray = to_grayscale(data);
    let brightness = downsample(&gray, width, height, cols, rows);
    let chars = brightness.iter().map(|&b| brightness_char(b)).collect();

    AsciiImage { cols, rows, chars }
}

/// RGB triplets to luminance bytes, integer math in the hot path.
/// Y = 0.299*R + 0.587*G + 0.114*B, coefficients scaled by 1000.
fn to_grayscale(data: &[u8]) -> Vec<u8> {
    let mut gray = Vec::with_capacity(data.len() / 3);
    for rgb in data.chunks_exact(3) {
        let r = rgb[0] as u32;
        let g = rgb[1] as u32;
        let b = rgb[2] as u32;
        gray.push(((299 * r + 587 * g + 114 * b) / 1000) as u8);
    }
    gray
}

/// Box-average a grayscale image down to one brightness value per cell.
fn downsample(gray: &[u8], img_width: u32, img_height: u32, cols: u16, rows: u16) -> Vec<u8> {
    let cell_w = img_width as f32 / cols as f32;
    let cell_h = img_height as f32 / rows as f32;

    let mut result = Vec::with_capacity(cols as usize * rows as usize);

    for cy in 0..rows {
        for cx in 0..cols {
            let start_x = (cx as f32 * cell_w) as u32;
            let end_x = ((cx + 1) as f32 * cell_w) as u32;
            let start_y = (cy as f32 * cell_h) as u32;
            let end_y = ((cy + 1) as f32 * cell_h) as u32;

            let mut sum = 0u32;
            let mut count = 0u32;
            for py in start_y..end_y.min(img_height) {
                for px in start_x..end_x.min(img_width) {
                    let idx = (py * img_width + px) as usize;
                    if idx < gray.len() {
                        sum += gray[idx] as u32;
                        count += 1;
                    }
                }
            }

            result.push(if count > 0 { (sum / count) as u8 } else { 0 });
        }
    }

    result
}

/// Map one brightness value onto the density ramp.
fn brightness_char(brightness: u8) -> char {
    let last = PREVIEW_CHARSET.len() - 1;
    let idx = (brightness as usize * last + 127) / 255;
    PREVIEW_CHARSET[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FlashMode;
    use std::time::Instant;

    fn solid_rgb(width: u32, height: u32, value: u8) -> Vec<u8> {
        vec![value; (width * height * 3) as usize]
    }

    #[test]
    fn test_brightness_char_extremes() {
        assert_eq!(brightness_char(0), ' ');
        assert_eq!(brightness_char(255), '@');
    }

    #[test]
    fn test_black_frame_renders_blank() {
        let img = render_rgb(&solid_rgb(8, 8, 0), 8, 8, 4, 2);
        assert_eq!(img.lines(), vec!["    ", "    "]);
    }

    #[test]
    fn test_white_frame_renders_dense() {
        let img = render_rgb(&solid_rgb(8, 8, 255), 8, 8, 4, 2);
        assert_eq!(img.lines(), vec!["@@@@", "@@@@"]);
    }

    #[test]
    fn test_render_handles_zero_dimensions() {
        let img = render_rgb(&[], 0, 0, 4, 2);
        assert_eq!(img.cols, 4);
        assert_eq!(img.rows, 2);
        assert_eq!(img.lines(), vec!["    ", "    "]);
    }

    #[test]
    fn test_render_frame_wrapper() {
        let frame = Frame {
            data: solid_rgb(4, 4, 128),
            width: 4,
            height: 4,
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        };
        let img = render_frame(&frame, 2, 2);
        assert_eq!(img.lines().len(), 2);
        assert_eq!(img.lines()[0].chars().count(), 2);
    }

    #[test]
    fn test_render_photo_rejects_garbage() {
        let photo = CapturedImage {
            data: vec![1, 2, 3, 4],
            width: 4,
            height: 4,
            flash: FlashMode::Off,
        };
        assert!(render_photo(&photo, 4, 4).is_none());
    }

    #[test]
    fn test_downsample_grid_size() {
        let gray = vec![100u8; 64];
        let cells = downsample(&gray, 8, 8, 5, 3);
        assert_eq!(cells.len(), 15);
    }
}
