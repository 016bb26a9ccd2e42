use std::path::Path;

use tracing::debug;

use crate::audio::types::AudioData;
use crate::error::{EncodingError, Result};

/// Sums audio sources onto a fixed-length output buffer.
///
/// Sources are placed at timeline offsets; anything past the end of the
/// buffer is dropped, so the result always has the length it was created
/// with.
pub struct AudioMixer {
    sample_rate: u32,
    channels: u16,
    buffer: Vec<f32>,
}

impl AudioMixer {
    pub fn new(sample_rate: u32, channels: u16, duration: f64) -> Self {
        let frames = (duration.max(0.0) * sample_rate as f64).round() as usize;
        Self {
            sample_rate,
            channels,
            buffer: vec![0.0; frames * channels as usize],
        }
    }

    pub fn duration(&self) -> f64 {
        self.buffer.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Add `audio` starting at `start` seconds, scaled by `gain`
    pub fn place(&mut self, audio: &AudioData, start: f64, gain: f32) {
        let audio = audio.conform(self.sample_rate, self.channels);
        let ch = self.channels as usize;
        let offset = (start.max(0.0) * self.sample_rate as f64).round() as usize * ch;
        if offset >= self.buffer.len() {
            debug!("{} starts after the mix ends, skipped", audio.file_path.display());
            return;
        }

        let available = self.buffer.len() - offset;
        let count = audio.samples.len().min(available);
        for (dst, src) in self.buffer[offset..offset + count].iter_mut().zip(&audio.samples) {
            *dst += src * gain;
        }
        debug!("Mixed {:.2}s of {} at {:.2}s",
               (count / ch) as f64 / self.sample_rate as f64, audio.file_path.display(), start);
    }

    /// Final mix, hard-clipped to [-1, 1]
    pub fn finish(self) -> AudioData {
        let samples = self.buffer.into_iter().map(|s| s.clamp(-1.0, 1.0)).collect();
        AudioData::from_samples(samples, self.sample_rate, self.channels, "mix".into())
    }
}

/// Write `audio` as a 32-bit float WAV for the encoder to mux
pub fn write_wav<P: AsRef<Path>>(audio: &AudioData, path: P) -> Result<()> {
    let write_failed = |e: hound::Error| EncodingError::AudioWriteFailed {
        reason: e.to_string(),
    };

    let spec = hound::WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path.as_ref(), spec).map_err(write_failed)?;
    for &sample in &audio.samples {
        writer.write_sample(sample).map_err(write_failed)?;
    }
    writer.finalize().map_err(write_failed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn constant(value: f32, seconds: f64, rate: u32) -> AudioData {
        let samples = vec![value; (seconds * rate as f64) as usize];
        AudioData::from_samples(samples, rate, 1, PathBuf::from("constant"))
    }

    #[test]
    fn test_mix_length_is_fixed() {
        let mut mixer = AudioMixer::new(100, 1, 4.0);
        mixer.place(&constant(0.1, 10.0, 100), 0.0, 1.0);
        let mix = mixer.finish();
        assert_eq!(mix.samples.len(), 400);
        assert_eq!(mix.duration, 4.0);
    }

    #[test]
    fn test_sources_sum_at_offsets() {
        let mut mixer = AudioMixer::new(10, 1, 3.0);
        mixer.place(&constant(0.25, 3.0, 10), 0.0, 1.0);
        mixer.place(&constant(0.5, 1.0, 10), 2.0, 1.0);
        let mix = mixer.finish();

        assert_eq!(mix.samples[0], 0.25);
        assert_eq!(mix.samples[19], 0.25);
        assert_eq!(mix.samples[20], 0.75);
        assert_eq!(mix.samples[29], 0.75);
    }

    #[test]
    fn test_source_past_end_is_ignored() {
        let mut mixer = AudioMixer::new(10, 2, 1.0);
        mixer.place(&constant(0.9, 1.0, 10), 5.0, 1.0);
        assert!(mixer.finish().samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_mix_is_clipped() {
        let mut mixer = AudioMixer::new(10, 1, 1.0);
        mixer.place(&constant(0.8, 1.0, 10), 0.0, 1.0);
        mixer.place(&constant(0.8, 1.0, 10), 0.0, 1.0);
        assert!(mixer.finish().samples.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_write_wav_roundtrip_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mix.wav");
        let audio = AudioData::from_samples(vec![0.5; 44100 * 2], 44100, 2, "mix".into());

        write_wav(&audio, &path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.duration(), 44100);
    }
}
