use image::{imageops, ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// Represents a single video frame
///
/// This is a simple wrapper around an RGB image buffer that provides
/// the cropping and pasting the clips need.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with black
    pub fn new_black(width: u32, height: u32) -> Self {
        let buffer = ImageBuffer::new(width, height);
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb(color));
        Self { buffer }
    }

    /// Get the width of the frame
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Get the height of the frame
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Raw interleaved RGB bytes, row-major
    pub fn as_rgb_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Create a frame from raw RGB bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data)
            .map(|buffer| Self { buffer })
    }

    /// Copy a region of `source` onto a black canvas of `width` x `height`.
    ///
    /// The region is clamped to both the source bounds and the canvas, so the
    /// result always has the requested size.
    pub fn crop_onto_canvas(
        source: &RgbImage,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Self {
        let mut canvas = Self::new_black(width, height);

        let x = x.min(source.width());
        let y = y.min(source.height());
        let crop_w = width.min(source.width() - x);
        let crop_h = height.min(source.height() - y);

        let src_stride = source.width() as usize * 3;
        let dst_stride = width as usize * 3;
        let row_len = crop_w as usize * 3;
        let src = source.as_raw();
        let dst: &mut [u8] = &mut canvas.buffer;

        for row in 0..crop_h as usize {
            let src_start = (y as usize + row) * src_stride + x as usize * 3;
            let dst_start = row * dst_stride;
            dst[dst_start..dst_start + row_len]
                .copy_from_slice(&src[src_start..src_start + row_len]);
        }

        canvas
    }

    /// Resize to exactly `width` x `height` if the frame differs
    pub fn resized(self, width: u32, height: u32) -> Self {
        if self.width() == width && self.height() == height {
            return self;
        }
        let resized = imageops::resize(&self.buffer, width, height, imageops::FilterType::Triangle);
        Self::new(resized)
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

/// Video output parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoParams {
    /// Target frame rate for output
    pub fps: f64,

    /// Target resolution (width, height); also the pan viewport
    pub resolution: (u32, u32),

    /// FFmpeg video encoder name
    pub codec: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,
}

impl Default for VideoParams {
    fn default() -> Self {
        Self {
            fps: 30.0,
            resolution: (1920, 1080),
            codec: "libx264".to_string(),
            quality: 85,
        }
    }
}

impl VideoParams {
    /// Number of frames needed to cover `duration` seconds
    pub fn frame_count(&self, duration: f64) -> usize {
        (duration * self.fps).round().max(0.0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_inside_bounds() {
        let source = RgbImage::from_fn(10, 4, |x, _| Rgb([x as u8, 0, 0]));
        let frame = Frame::crop_onto_canvas(&source, 3, 0, 4, 4);

        assert_eq!((frame.width(), frame.height()), (4, 4));
        assert_eq!(frame.get_pixel(0, 0), [3, 0, 0]);
        assert_eq!(frame.get_pixel(3, 3), [6, 0, 0]);
    }

    #[test]
    fn test_crop_pads_when_source_is_small() {
        let source = RgbImage::from_pixel(3, 2, Rgb([200, 200, 200]));
        let frame = Frame::crop_onto_canvas(&source, 0, 0, 8, 6);

        assert_eq!((frame.width(), frame.height()), (8, 6));
        assert_eq!(frame.get_pixel(2, 1), [200, 200, 200]);
        assert_eq!(frame.get_pixel(3, 1), [0, 0, 0]);
        assert_eq!(frame.get_pixel(0, 2), [0, 0, 0]);
    }

    #[test]
    fn test_crop_offset_past_edge_is_black() {
        let source = RgbImage::from_pixel(3, 3, Rgb([9, 9, 9]));
        let frame = Frame::crop_onto_canvas(&source, 50, 0, 4, 4);
        assert!(frame.as_rgb_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_frame_count() {
        let params = VideoParams::default();
        assert_eq!(params.frame_count(1.0), 30);
        assert_eq!(params.frame_count(10.5), 315);
        assert_eq!(params.frame_count(0.0), 0);
    }
}
