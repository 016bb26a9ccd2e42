use std::sync::Arc;

use image::RgbImage;
use tracing::debug;

use crate::error::{InputError, Result};
use crate::video::clip::{Clip, HoldClip};
use crate::video::types::Frame;

/// Generated clip that pans across the panorama at constant speed.
///
/// At `t = 0` the viewport's left edge sits on the panorama's left edge; at
/// `t = duration` its right edge sits on the panorama's right edge.
#[derive(Debug, Clone)]
pub struct PanClip {
    panorama: Arc<RgbImage>,
    duration: f64,
    viewport: (u32, u32),
}

impl PanClip {
    pub fn new(panorama: Arc<RgbImage>, duration: f64, viewport: (u32, u32)) -> Result<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(InputError::InvalidDuration {
                details: format!("pan duration must be positive, got {}", duration),
            }.into());
        }

        if panorama.width() <= viewport.0 {
            debug!("Panorama ({}px) fits in viewport ({}px), pan is stationary",
                   panorama.width(), viewport.0);
        }

        Ok(Self { panorama, duration, viewport })
    }

    /// Total horizontal travel in pixels
    pub fn travel(&self) -> u32 {
        self.panorama.width().saturating_sub(self.viewport.0)
    }

    /// Left edge of the viewport at time `t`
    pub fn offset_at(&self, t: f64) -> u32 {
        let progress = (t / self.duration).clamp(0.0, 1.0);
        let offset = (self.travel() as f64 * progress).floor() as u32;
        offset.min(self.travel())
    }

    /// Still of the first pan frame
    pub fn pre_roll(&mut self, duration: f64) -> Result<HoldClip> {
        let frame = self.frame_at(0.0)?;
        Ok(HoldClip::new("pre_roll", frame, duration))
    }

    /// Still of the last pan frame, sampled one frame before the end
    pub fn post_roll(&mut self, duration: f64, fps: f64) -> Result<HoldClip> {
        let last = (self.duration - 1.0 / fps).max(0.0);
        let frame = self.frame_at(last)?;
        Ok(HoldClip::new("post_roll", frame, duration))
    }
}

impl Clip for PanClip {
    fn name(&self) -> &str {
        "pan"
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn frame_at(&mut self, t: f64) -> Result<Frame> {
        let (width, height) = self.viewport;
        Ok(Frame::crop_onto_canvas(&self.panorama, self.offset_at(t), 0, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> Arc<RgbImage> {
        Arc::new(RgbImage::from_fn(width, height, |x, _| {
            Rgb([(x % 256) as u8, (x / 256) as u8, 0])
        }))
    }

    #[test]
    fn test_offset_endpoints() {
        let pan = PanClip::new(gradient(5000, 10), 20.0, (1920, 10)).unwrap();

        assert_eq!(pan.offset_at(0.0), 0);
        assert_eq!(pan.offset_at(20.0), 5000 - 1920);
        assert_eq!(pan.offset_at(10.0), (5000 - 1920) / 2);
    }

    #[test]
    fn test_offset_is_monotonic() {
        let pan = PanClip::new(gradient(4321, 4), 7.0, (640, 4)).unwrap();
        let fps = 30.0;

        let mut previous = 0;
        for i in 0..(7.0 * fps) as usize {
            let offset = pan.offset_at(i as f64 / fps);
            assert!(offset >= previous);
            assert!(offset <= pan.travel());
            previous = offset;
        }
        // approaches the full travel as t -> duration
        assert!(pan.travel() - pan.offset_at(7.0 - 1e-9) <= 1);
    }

    #[test]
    fn test_frame_content_follows_offset() {
        let mut pan = PanClip::new(gradient(1000, 8), 10.0, (200, 8)).unwrap();

        let start = pan.frame_at(0.0).unwrap();
        assert_eq!(start.get_pixel(0, 0), [0, 0, 0]);

        let end = pan.frame_at(10.0).unwrap();
        // x = 800 -> (800 % 256, 800 / 256)
        assert_eq!(end.get_pixel(0, 0), [32, 3, 0]);
        assert_eq!(end.get_pixel(199, 7), [(999 % 256) as u8, 3, 0]);
    }

    #[test]
    fn test_narrow_panorama_clamps_and_pads() {
        // 3 images of 600x600 against a Full HD viewport
        let panorama = Arc::new(RgbImage::from_pixel(1800, 600, Rgb([50, 60, 70])));
        let mut pan = PanClip::new(panorama, 15.0, (1920, 1080)).unwrap();

        assert_eq!(pan.travel(), 0);
        for t in [0.0, 3.3, 7.5, 14.99] {
            assert_eq!(pan.offset_at(t), 0);
            let frame = pan.frame_at(t).unwrap();
            assert_eq!((frame.width(), frame.height()), (1920, 1080));
            assert_eq!(frame.get_pixel(1799, 599), [50, 60, 70]);
            assert_eq!(frame.get_pixel(1800, 0), [0, 0, 0]);
            assert_eq!(frame.get_pixel(0, 600), [0, 0, 0]);
        }
    }

    #[test]
    fn test_hold_clips_sample_endpoints() {
        let mut pan = PanClip::new(gradient(900, 2), 3.0, (300, 2)).unwrap();

        let mut pre = pan.pre_roll(3.0).unwrap();
        assert_eq!(pre.duration(), 3.0);
        assert_eq!(pre.frame_at(1.0).unwrap(), pan.frame_at(0.0).unwrap());

        let mut post = pan.post_roll(5.0, 30.0).unwrap();
        assert_eq!(post.duration(), 5.0);
        let expected = pan.frame_at(3.0 - 1.0 / 30.0).unwrap();
        assert_eq!(post.frame_at(4.0).unwrap(), expected);
    }

    #[test]
    fn test_zero_duration_rejected() {
        assert!(PanClip::new(gradient(10, 10), 0.0, (4, 4)).is_err());
    }
}
