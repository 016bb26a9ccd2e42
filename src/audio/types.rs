use std::path::PathBuf;

/// Raw audio data with metadata
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples (interleaved for stereo, mono for single channel)
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Duration in seconds
    pub duration: f64,

    /// Original file path
    pub file_path: PathBuf,
}

impl AudioData {
    /// Build from interleaved samples, deriving the duration
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, channels: u16, file_path: PathBuf) -> Self {
        let duration = if sample_rate == 0 || channels == 0 {
            0.0
        } else {
            samples.len() as f64 / (sample_rate as f64 * channels as f64)
        };
        Self { samples, sample_rate, channels, duration, file_path }
    }

    /// Number of sample frames (one sample per channel)
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Get mono mix of all channels
    pub fn mono_samples(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks(self.channels as usize)
            .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
            .collect()
    }

    /// Convert to the given sample rate and channel layout.
    ///
    /// Channels are mixed down to mono or duplicated up as needed; rate
    /// conversion is linear interpolation.
    pub fn conform(&self, sample_rate: u32, channels: u16) -> AudioData {
        let layout = self.with_channels(channels);
        let samples = if layout.sample_rate == sample_rate {
            layout.samples
        } else {
            resample_linear(&layout.samples, channels as usize, layout.sample_rate, sample_rate)
        };
        AudioData::from_samples(samples, sample_rate, channels, self.file_path.clone())
    }

    fn with_channels(&self, channels: u16) -> AudioData {
        if self.channels == channels {
            return self.clone();
        }

        let mono = self.mono_samples();
        let samples = if channels == 1 {
            mono
        } else {
            mono.iter()
                .flat_map(|&s| std::iter::repeat(s).take(channels as usize))
                .collect()
        };
        AudioData::from_samples(samples, self.sample_rate, channels, self.file_path.clone())
    }

    /// Multiply every sample by `gain`
    pub fn scale(&mut self, gain: f32) {
        for sample in self.samples.iter_mut() {
            *sample *= gain;
        }
    }
}

fn resample_linear(samples: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Vec<f32> {
    let in_frames = samples.len() / channels;
    if in_frames == 0 || from_rate == 0 {
        return Vec::new();
    }

    let out_frames = ((in_frames as u64 * to_rate as u64) as f64 / from_rate as f64).round() as usize;
    let ratio = from_rate as f64 / to_rate as f64;
    let mut out = Vec::with_capacity(out_frames * channels);

    for i in 0..out_frames {
        let position = i as f64 * ratio;
        let index = (position.floor() as usize).min(in_frames - 1);
        let next = (index + 1).min(in_frames - 1);
        let frac = (position - index as f64) as f32;

        for ch in 0..channels {
            let a = samples[index * channels + ch];
            let b = samples[next * channels + ch];
            out.push(a + (b - a) * frac);
        }
    }

    out
}

/// One music file's contribution to a synthesized track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSegment {
    /// Source music file
    pub source: PathBuf,

    /// Offset of the segment inside the track (seconds)
    pub start: f64,

    /// Length of the segment after truncation (seconds)
    pub duration: f64,
}

/// Background track of an exact target length
#[derive(Debug, Clone)]
pub struct AudioTrack {
    /// Track samples at the output layout
    pub data: AudioData,

    /// Files in playback order, including repeats
    pub segments: Vec<TrackSegment>,
}

impl AudioTrack {
    pub fn duration(&self) -> f64 {
        self.data.duration
    }

    pub fn channels(&self) -> u16 {
        self.data.channels
    }
}
