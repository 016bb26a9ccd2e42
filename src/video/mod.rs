//! # Video Processing Module
//!
//! Panorama stitching, the clip types the timeline is built from, chroma
//! keying and the ffmpeg encoder.

pub mod assembler;
pub mod chroma;
pub mod clip;
pub mod encoder;
pub mod file_clip;
pub mod pan;
pub mod types;

pub use assembler::{Panorama, PanoramaAssembler};
pub use chroma::ChromaKey;
pub use clip::{Clip, HoldClip};
pub use encoder::{EncodedVideo, FfmpegEncoder};
pub use file_clip::{FileClip, VideoProbe};
pub use pan::PanClip;
pub use types::{Frame, VideoParams};
