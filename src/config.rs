use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    video::VideoParams,
};

/// Main configuration for panorama-reel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Output video settings
    #[serde(default)]
    pub video: VideoConfig,

    /// Segment durations and overlay scheduling
    #[serde(default)]
    pub timing: TimingConfig,

    /// Background music and mixing settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Green-screen removal for the action overlay
    #[serde(default)]
    pub chroma_key: ChromaKeyConfig,

    /// Input and output locations
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.video.validate()?;
        self.timing.validate()?;
        self.audio.validate()?;
        self.chroma_key.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Output video configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Resolution, frame rate and codec of the rendered file
    pub params: VideoParams,
}

impl VideoConfig {
    fn validate(&self) -> Result<()> {
        let (width, height) = self.params.resolution;
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            // yuv420p output needs even dimensions
            return Err(invalid("video.params.resolution", format!("{}x{}", width, height)).into());
        }

        if !self.params.fps.is_finite() || self.params.fps <= 0.0 {
            return Err(invalid("video.params.fps", self.params.fps).into());
        }

        if self.params.quality > 100 {
            return Err(invalid("video.params.quality", self.params.quality).into());
        }

        if self.params.codec.trim().is_empty() {
            return Err(invalid("video.params.codec", "<empty>").into());
        }

        Ok(())
    }
}

/// Timeline timing configuration (all values in seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Still hold of the first pan frame before motion starts
    pub pre_roll: f64,

    /// Still hold of the last pan frame after motion ends
    pub post_roll: f64,

    /// Pan time allotted to each stamped image
    pub per_image_seconds: f64,

    /// Timeline offset at which the action overlay starts
    pub overlay_start: f64,

    /// Override for the outro length; the file's own duration when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outro_duration: Option<f64>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            pre_roll: 3.0,
            post_roll: 5.0,
            per_image_seconds: 5.0,
            overlay_start: 15.0,
            outro_duration: None,
        }
    }
}

impl TimingConfig {
    fn validate(&self) -> Result<()> {
        let non_negative = [
            ("timing.pre_roll", self.pre_roll),
            ("timing.post_roll", self.post_roll),
            ("timing.overlay_start", self.overlay_start),
        ];
        for (key, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(key, value).into());
            }
        }

        if !self.per_image_seconds.is_finite() || self.per_image_seconds <= 0.0 {
            return Err(invalid("timing.per_image_seconds", self.per_image_seconds).into());
        }

        if let Some(outro) = self.outro_duration {
            if !outro.is_finite() || outro <= 0.0 {
                return Err(invalid("timing.outro_duration", outro).into());
            }
        }

        Ok(())
    }
}

/// Background music configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Gain applied to every music clip
    pub volume: f32,

    /// Sample rate of the mixed output track (Hz)
    pub sample_rate: u32,

    /// Channel count of the mixed output track
    pub channels: u16,

    /// File extensions picked up from the music directory
    pub extensions: Vec<String>,

    /// Mix the outro's and action clip's own audio under the music
    pub include_clip_audio: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume: 0.4,
            sample_rate: 44100,
            channels: 2,
            extensions: vec!["mp3".to_string(), "wav".to_string()],
            include_clip_audio: true,
        }
    }
}

impl AudioConfig {
    fn validate(&self) -> Result<()> {
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(invalid("audio.volume", self.volume).into());
        }

        if self.sample_rate == 0 {
            return Err(invalid("audio.sample_rate", self.sample_rate).into());
        }

        if !(1..=2).contains(&self.channels) {
            return Err(invalid("audio.channels", self.channels).into());
        }

        if self.extensions.is_empty() {
            return Err(invalid("audio.extensions", "[]").into());
        }

        Ok(())
    }

    /// Whether a file should be treated as music
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Chroma key parameters for the action overlay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromaKeyConfig {
    /// Key color removed from the overlay (RGB)
    pub color: [u8; 3],

    /// Color distance at which a pixel becomes half transparent
    pub threshold: f32,

    /// Steepness of the matte edge
    pub softness: f32,
}

impl Default for ChromaKeyConfig {
    fn default() -> Self {
        Self {
            color: [0, 255, 22],
            threshold: 100.0,
            softness: 5.0,
        }
    }
}

impl ChromaKeyConfig {
    fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(invalid("chroma_key.threshold", self.threshold).into());
        }

        if !self.softness.is_finite() || self.softness <= 0.0 {
            return Err(invalid("chroma_key.softness", self.softness).into());
        }

        Ok(())
    }
}

/// Input and output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Stamped still images from the image stage
    pub images_dir: PathBuf,

    /// Background music files
    pub music_dir: PathBuf,

    /// Outro clip appended after the post-roll
    pub outro: PathBuf,

    /// Green-screen action footage
    pub action: PathBuf,

    /// Where the stitched panorama is written (overwritten every run)
    pub panorama: PathBuf,

    /// Final rendered video
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("input/images"),
            music_dir: PathBuf::from("input/music"),
            outro: PathBuf::from("input/video/outro.mp4"),
            action: PathBuf::from("input/video/action.mp4"),
            panorama: PathBuf::from("work/panorama.png"),
            output: PathBuf::from("output/comparison.mp4"),
        }
    }
}
