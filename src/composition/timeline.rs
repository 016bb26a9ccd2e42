use tracing::debug;

use crate::error::{EncodingError, Result};
use crate::video::{ChromaKey, Clip, Frame};

struct Placed {
    start: f64,
    clip: Box<dyn Clip>,
}

/// Clip laid over the base timeline from a fixed offset
pub struct Overlay {
    clip: Box<dyn Clip>,
    start: f64,
    key: ChromaKey,
}

impl Overlay {
    pub fn new(clip: Box<dyn Clip>, start: f64, key: ChromaKey) -> Self {
        Self { clip, start: start.max(0.0), key }
    }
}

/// Where a base clip sits on the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentInfo {
    pub name: String,
    pub start: f64,
    pub duration: f64,
}

/// Base clips laid end-to-end plus an optional keyed overlay.
///
/// The timeline's duration is the base duration; the overlay never extends
/// it.
pub struct Timeline {
    frame_size: (u32, u32),
    base: Vec<Placed>,
    duration: f64,
    overlay: Option<Overlay>,
}

impl Timeline {
    pub fn new(frame_size: (u32, u32)) -> Self {
        Self {
            frame_size,
            base: Vec::new(),
            duration: 0.0,
            overlay: None,
        }
    }

    /// Append a clip to the base timeline; empty clips are dropped
    pub fn push(&mut self, clip: Box<dyn Clip>) -> Result<()> {
        let duration = clip.duration();
        if !duration.is_finite() || duration < 0.0 {
            return Err(EncodingError::InvalidTimeline {
                details: format!("clip '{}' has invalid duration {}", clip.name(), duration),
            }.into());
        }
        if duration == 0.0 {
            debug!("Dropping empty clip '{}'", clip.name());
            return Ok(());
        }

        debug!("Timeline: '{}' at {:.3}s for {:.3}s", clip.name(), self.duration, duration);
        self.base.push(Placed { start: self.duration, clip });
        self.duration += duration;
        Ok(())
    }

    pub fn set_overlay(&mut self, overlay: Overlay) {
        self.overlay = Some(overlay);
    }

    /// Base timeline length, which is also the composite length
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn segments(&self) -> Vec<SegmentInfo> {
        self.base
            .iter()
            .map(|placed| SegmentInfo {
                name: placed.clip.name().to_string(),
                start: placed.start,
                duration: placed.clip.duration(),
            })
            .collect()
    }

    /// Interval during which the overlay is visible, clipped to the timeline
    pub fn overlay_window(&self) -> Option<(f64, f64)> {
        let overlay = self.overlay.as_ref()?;
        let end = (overlay.start + overlay.clip.duration()).min(self.duration);
        if overlay.start >= end {
            return None;
        }
        Some((overlay.start, end))
    }

    /// Composite frame at timeline time `t`
    pub fn frame_at(&mut self, t: f64) -> Result<Frame> {
        if self.base.is_empty() {
            return Err(EncodingError::InvalidTimeline {
                details: "timeline has no clips".to_string(),
            }.into());
        }

        let t = t.clamp(0.0, self.duration);
        let index = self
            .base
            .iter()
            .rposition(|placed| placed.start <= t)
            .unwrap_or(0);

        let window = self.overlay_window();
        let (width, height) = self.frame_size;

        let placed = &mut self.base[index];
        let local = (t - placed.start).clamp(0.0, placed.clip.duration());
        let mut frame = placed.clip.frame_at(local)?.resized(width, height);

        if let (Some((start, end)), Some(overlay)) = (window, self.overlay.as_mut()) {
            if t >= start && t < end {
                let top = overlay.clip.frame_at(t - start)?;
                overlay.key.composite_centered(&mut frame, &top);
            }
        }

        Ok(frame)
    }

    /// Pull every frame at `fps` into `sink`, returning the frame count
    pub fn render<F>(&mut self, fps: f64, mut sink: F) -> Result<usize>
    where
        F: FnMut(&Frame) -> Result<()>,
    {
        let frame_count = (self.duration * fps).round() as usize;
        for index in 0..frame_count {
            let t = index as f64 / fps;
            let frame = self.frame_at(t)?;
            sink(&frame)?;

            if index > 0 && index % (fps.round().max(1.0) as usize * 10) == 0 {
                debug!("Rendered {}/{} frames ({:.0}s)", index, frame_count, t);
            }
        }
        Ok(frame_count)
    }
}
