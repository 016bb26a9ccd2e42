//! # Audio Module
//!
//! Decoding, background-track synthesis and final mixing.
//!
//! ## Core Features
//!
//! - **Loading**: WAV through `hound`, MP3/FLAC/OGG/AAC and MP4 audio through Symphonia
//! - **Synthesis**: shuffled music looped and truncated to an exact duration
//! - **Mixing**: music plus clip audio placed on the final timeline
//!
//! ## Usage
//!
//! ```rust,no_run
//! use panorama_reel::audio::AudioTrackSynthesizer;
//! use panorama_reel::config::AudioConfig;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let mut synth = AudioTrackSynthesizer::seeded(AudioConfig::default(), 42);
//! let track = synth.synthesize("music/", 23.0).await?;
//!
//! println!("{} segments, {:.1}s", track.segments.len(), track.duration());
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod mixer;
pub mod synthesizer;
pub mod types;

pub use loader::AudioLoader;
pub use mixer::AudioMixer;
pub use synthesizer::AudioTrackSynthesizer;
pub use types::{AudioData, AudioTrack, TrackSegment};
