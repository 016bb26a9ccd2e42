use crate::error::Result;
use crate::video::types::Frame;

/// A unit of video that can produce its frame at any time inside its duration.
///
/// Frames are pulled one at a time by the encoder, so implementations compute
/// or decode only what is requested. Times outside `[0, duration)` are clamped
/// by the caller.
pub trait Clip {
    /// Identifier used in log output
    fn name(&self) -> &str;

    /// Length of the clip in seconds
    fn duration(&self) -> f64;

    /// Produce the frame shown `t` seconds after the clip starts
    fn frame_at(&mut self, t: f64) -> Result<Frame>;
}

/// One still frame repeated for a fixed duration
#[derive(Debug, Clone)]
pub struct HoldClip {
    name: String,
    frame: Frame,
    duration: f64,
}

impl HoldClip {
    pub fn new<S: Into<String>>(name: S, frame: Frame, duration: f64) -> Self {
        Self {
            name: name.into(),
            frame,
            duration: duration.max(0.0),
        }
    }
}

impl Clip for HoldClip {
    fn name(&self) -> &str {
        &self.name
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn frame_at(&mut self, _t: f64) -> Result<Frame> {
        Ok(self.frame.clone())
    }
}
