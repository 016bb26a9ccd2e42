use thiserror::Error;

/// Main error type for the panorama-reel library
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Missing, empty or undecodable image and audio sources
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("No images found in directory: {path}")]
    NoImages { path: String },

    #[error("Failed to load image {path}: {reason}")]
    ImageLoadFailed { path: String, reason: String },

    #[error("No music files found in directory: {path}")]
    NoMusic { path: String },

    #[error("Failed to load audio file: {path}")]
    AudioLoadFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Music files contain no audio samples: {path}")]
    EmptyAudio { path: String },

    #[error("Invalid duration: {details}")]
    InvalidDuration { details: String },
}

/// Fixed assets the pipeline cannot run without (outro, action footage)
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Required file not found: {path}")]
    NotFound { path: String },

    #[error("Failed to probe {path}: {reason}")]
    ProbeFailed { path: String, reason: String },

    #[error("File has no video stream: {path}")]
    NoVideoStream { path: String },
}

/// Failures while producing the panorama artifact or the final output
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("FFmpeg not found. Please install FFmpeg and make sure it is on PATH")]
    FfmpegMissing,

    #[error("Failed to spawn FFmpeg process: {reason}")]
    SpawnFailed { reason: String },

    #[error("Failed to write to FFmpeg: {reason}")]
    WriteFailed { reason: String },

    #[error("FFmpeg failed: {reason}")]
    FfmpegFailed { reason: String },

    #[error("Frame generation failed at {time:.3}s: {reason}")]
    FrameFailed { time: f64, reason: String },

    #[error("Failed to save panorama to {path}: {reason}")]
    PanoramaSaveFailed { path: String, reason: String },

    #[error("Failed to write audio track: {reason}")]
    AudioWriteFailed { reason: String },

    #[error("Invalid timeline: {details}")]
    InvalidTimeline { details: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using ReelError
pub type Result<T> = std::result::Result<T, ReelError>;

impl ReelError {
    /// Pipeline stage the error belongs to, used as log context
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Input(InputError::NoMusic { .. })
            | Self::Input(InputError::AudioLoadFailed { .. })
            | Self::Input(InputError::UnsupportedFormat { .. })
            | Self::Input(InputError::EmptyAudio { .. }) => "audio",
            Self::Input(_) => "panorama",
            Self::Resource(_) => "resources",
            Self::Encoding(_) => "render",
            Self::Config(_) => "config",
            Self::Io(_) => "pipeline",
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Input(InputError::NoImages { path }) => {
                format!("No stamped images in '{}'. Run the image stamping step first.", path)
            }
            Self::Input(InputError::NoMusic { path }) => {
                format!("No music in '{}'. Add at least one .mp3 or .wav file.", path)
            }
            Self::Resource(ResourceError::NotFound { path }) => {
                format!("Could not find '{}'. The outro and action clips are required.", path)
            }
            Self::Encoding(EncodingError::FfmpegMissing) => {
                "FFmpeg is required to render the video. Install it and retry.".to_string()
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
