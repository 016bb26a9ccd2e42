use crate::config::ChromaKeyConfig;
use crate::video::types::Frame;

/// Green-screen matte and compositing for the action overlay.
///
/// Alpha for a pixel at color distance `d` from the key is
/// `d^s / (thr^s + d^s)`: near the key it falls to 0, far from it it rises
/// to 1, and `softness` controls how sharp the transition is.
#[derive(Debug, Clone)]
pub struct ChromaKey {
    color: [f32; 3],
    threshold: f32,
    softness: f32,
}

impl ChromaKey {
    pub fn new(config: &ChromaKeyConfig) -> Self {
        Self {
            color: config.color.map(f32::from),
            threshold: config.threshold,
            softness: config.softness,
        }
    }

    /// Opacity of an overlay pixel in `[0, 1]`
    pub fn alpha(&self, pixel: [u8; 3]) -> f32 {
        let distance = pixel
            .iter()
            .zip(self.color.iter())
            .map(|(&p, &c)| {
                let diff = f32::from(p) - c;
                diff * diff
            })
            .sum::<f32>()
            .sqrt();

        if self.threshold == 0.0 {
            return if distance > 0.0 { 1.0 } else { 0.0 };
        }

        let d = distance.powf(self.softness);
        let t = self.threshold.powf(self.softness);
        if !d.is_finite() {
            return 1.0;
        }
        d / (t + d)
    }

    /// Blend `overlay` onto `base`, centered
    pub fn composite_centered(&self, base: &mut Frame, overlay: &Frame) {
        let offset_x = (base.width() as i64 - overlay.width() as i64) / 2;
        let offset_y = (base.height() as i64 - overlay.height() as i64) / 2;

        for oy in 0..overlay.height() {
            let by = oy as i64 + offset_y;
            if by < 0 || by >= base.height() as i64 {
                continue;
            }
            for ox in 0..overlay.width() {
                let bx = ox as i64 + offset_x;
                if bx < 0 || bx >= base.width() as i64 {
                    continue;
                }

                let top = overlay.get_pixel(ox, oy);
                let alpha = self.alpha(top);
                if alpha <= 0.0 {
                    continue;
                }

                let (bx, by) = (bx as u32, by as u32);
                let bottom = base.get_pixel(bx, by);
                let mixed = [0, 1, 2].map(|i| {
                    let value = f32::from(top[i]) * alpha + f32::from(bottom[i]) * (1.0 - alpha);
                    value.round().clamp(0.0, 255.0) as u8
                });
                base.set_pixel(bx, by, mixed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_key() -> ChromaKey {
        ChromaKey::new(&ChromaKeyConfig::default())
    }

    #[test]
    fn test_key_color_is_transparent() {
        let key = default_key();
        assert_eq!(key.alpha([0, 255, 22]), 0.0);
    }

    #[test]
    fn test_distant_color_is_opaque() {
        let key = default_key();
        assert!(key.alpha([255, 0, 255]) > 0.999);
        assert!(key.alpha([0, 0, 0]) > 0.99);
    }

    #[test]
    fn test_threshold_distance_is_half() {
        let key = default_key();
        // distance exactly 100 from the key color
        let alpha = key.alpha([0, 155, 22]);
        assert!((alpha - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_zero_threshold_is_binary() {
        let key = ChromaKey::new(&ChromaKeyConfig {
            color: [10, 10, 10],
            threshold: 0.0,
            softness: 5.0,
        });
        assert_eq!(key.alpha([10, 10, 10]), 0.0);
        assert_eq!(key.alpha([10, 10, 11]), 1.0);
    }

    #[test]
    fn test_composite_keeps_background_behind_green() {
        let key = default_key();
        let mut base = Frame::new_filled(4, 4, [100, 100, 100]);
        let mut overlay = Frame::new_filled(4, 4, [0, 255, 22]);
        overlay.set_pixel(1, 1, [255, 0, 0]);

        key.composite_centered(&mut base, &overlay);

        assert_eq!(base.get_pixel(0, 0), [100, 100, 100]);
        assert_eq!(base.get_pixel(1, 1), [255, 0, 0]);
    }

    #[test]
    fn test_composite_centers_smaller_overlay() {
        let key = default_key();
        let mut base = Frame::new_filled(6, 6, [0, 0, 0]);
        let overlay = Frame::new_filled(2, 2, [255, 255, 255]);

        key.composite_centered(&mut base, &overlay);

        assert_eq!(base.get_pixel(2, 2), [255, 255, 255]);
        assert_eq!(base.get_pixel(3, 3), [255, 255, 255]);
        assert_eq!(base.get_pixel(1, 1), [0, 0, 0]);
        assert_eq!(base.get_pixel(4, 4), [0, 0, 0]);
    }
}
