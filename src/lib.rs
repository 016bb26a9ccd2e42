//! # Panorama-Reel
//!
//! Turn a folder of stamped stills into a panning panorama video with a
//! music bed, an outro and a green-screen action overlay.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use panorama_reel::{composition::CompositionEngine, config::Config};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let engine = CompositionEngine::new(config).with_seed(7);
//!
//! let video = engine.compose().await?;
//! println!("{} frames written to {:?}", video.frame_count, video.path);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`video`] - Panorama stitching, clips, chroma keying and encoding
//! - [`audio`] - Music decoding, track synthesis and mixing
//! - [`composition`] - Timeline and the render pipeline
//! - [`config`] - Configuration management
//!
//! ## Custom Clips
//!
//! Anything that can produce a frame for a point in time can sit on the
//! timeline by implementing the [`Clip`](video::Clip) trait:
//!
//! ```rust,no_run
//! use panorama_reel::video::{Clip, Frame};
//! use panorama_reel::Result;
//!
//! struct Flash {
//!     seconds: f64,
//! }
//!
//! impl Clip for Flash {
//!     fn name(&self) -> &str {
//!         "flash"
//!     }
//!
//!     fn duration(&self) -> f64 {
//!         self.seconds
//!     }
//!
//!     fn frame_at(&mut self, t: f64) -> Result<Frame> {
//!         let level = (255.0 * (1.0 - t / self.seconds)) as u8;
//!         Ok(Frame::new_filled(1920, 1080, [level; 3]))
//!     }
//! }
//! ```

pub mod audio;
pub mod composition;
pub mod config;
pub mod error;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    composition::CompositionEngine,
    config::Config,
    error::{ReelError, Result},
};
