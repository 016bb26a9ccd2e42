use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::audio::loader::AudioLoader;
use crate::audio::types::{AudioData, AudioTrack, TrackSegment};
use crate::config::AudioConfig;
use crate::error::{InputError, Result};

/// Builds a background track of an exact length from a folder of music.
///
/// Files are shuffled once per synthesis, then played in that order,
/// wrapping around to the start of the same order until the target is
/// reached. The last segment is truncated so the track ends exactly at the
/// target.
pub struct AudioTrackSynthesizer<R = StdRng> {
    config: AudioConfig,
    rng: R,
}

impl AudioTrackSynthesizer<StdRng> {
    /// Synthesizer with a system-seeded shuffle
    pub fn new(config: AudioConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Synthesizer whose shuffle order is fully determined by `seed`
    pub fn seeded(config: AudioConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> AudioTrackSynthesizer<R> {
    pub fn with_rng(config: AudioConfig, rng: R) -> Self {
        Self { config, rng }
    }

    /// Music files in `dir`, sorted by path
    pub fn discover<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let no_music = || InputError::NoMusic {
            path: dir.display().to_string(),
        };

        if !dir.is_dir() {
            return Err(no_music().into());
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && self.config.accepts(&path) {
                files.push(path);
            }
        }

        if files.is_empty() {
            return Err(no_music().into());
        }

        files.sort();
        Ok(files)
    }

    /// Produce a track of exactly `target` seconds from the music in `dir`
    pub async fn synthesize<P: AsRef<Path>>(&mut self, dir: P, target: f64) -> Result<AudioTrack> {
        let dir = dir.as_ref();
        if !target.is_finite() || target < 0.0 {
            return Err(InputError::InvalidDuration {
                details: format!("audio target must be non-negative, got {}", target),
            }.into());
        }

        let mut order = self.discover(dir)?;
        order.shuffle(&mut self.rng);
        info!("Shuffled {} music files for a {:.2}s track", order.len(), target);

        let rate = self.config.sample_rate;
        let channels = self.config.channels;
        let ch = channels as usize;
        let target_frames = (target * rate as f64).round() as usize;
        let target_samples = target_frames * ch;

        let mut decoded: Vec<Option<AudioData>> = (0..order.len()).map(|_| None).collect();
        let mut samples: Vec<f32> = Vec::with_capacity(target_samples);
        let mut segments = Vec::new();

        'passes: while samples.len() < target_samples {
            let mut added_this_pass = 0;

            for (index, path) in order.iter().enumerate() {
                if decoded[index].is_none() {
                    decoded[index] = Some(self.prepare(path).await?);
                }
                let Some(clip) = decoded[index].as_ref() else {
                    continue;
                };

                let remaining = target_samples - samples.len();
                let take = clip.samples.len().min(remaining);
                if take == 0 {
                    continue;
                }

                let start_frame = samples.len() / ch;
                samples.extend_from_slice(&clip.samples[..take]);
                segments.push(TrackSegment {
                    source: path.clone(),
                    start: start_frame as f64 / rate as f64,
                    duration: (take / ch) as f64 / rate as f64,
                });
                added_this_pass += take;

                debug!("Track segment {}: {} ({:.2}s)",
                       segments.len(), path.display(), (take / ch) as f64 / rate as f64);

                if samples.len() >= target_samples {
                    break 'passes;
                }
            }

            if added_this_pass == 0 {
                return Err(InputError::EmptyAudio {
                    path: dir.display().to_string(),
                }.into());
            }
        }

        info!("Built {:.2}s music track from {} segments", target, segments.len());
        let data = AudioData::from_samples(samples, rate, channels, dir.to_path_buf());
        Ok(AudioTrack { data, segments })
    }

    /// Decode one file into the track layout at the configured volume
    async fn prepare(&self, path: &Path) -> Result<AudioData> {
        let raw = AudioLoader::load(path).await?;
        debug!("Loaded {}: {:.2}s, {} Hz, {} ch",
               path.display(), raw.duration, raw.sample_rate, raw.channels);

        let mut clip = raw.conform(self.config.sample_rate, self.config.channels);
        clip.scale(self.config.volume);
        Ok(clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReelError;
    use tempfile::tempdir;

    const RATE: u32 = 8000;

    fn test_config() -> AudioConfig {
        AudioConfig {
            sample_rate: RATE,
            channels: 1,
            volume: 0.5,
            ..AudioConfig::default()
        }
    }

    fn write_wav(dir: &Path, name: &str, seconds: f64, value: i16) -> PathBuf {
        let path = dir.join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..(seconds * RATE as f64) as usize {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[tokio::test]
    async fn test_short_file_loops_to_target() {
        let dir = tempdir().unwrap();
        write_wav(dir.path(), "loop.wav", 3.0, 16384);

        let mut synth = AudioTrackSynthesizer::seeded(test_config(), 7);
        let track = synth.synthesize(dir.path(), 10.0).await.unwrap();

        assert_eq!(track.data.samples.len(), 10 * RATE as usize);
        assert_eq!(track.duration(), 10.0);
        assert_eq!(track.segments.len(), 4);
        assert!(track.segments.iter().all(|s| s.source.ends_with("loop.wav")));
        assert_eq!(track.segments[3].start, 9.0);
        assert_eq!(track.segments[3].duration, 1.0);
        // volume applied
        assert_eq!(track.data.samples[0], 0.25);
    }

    #[tokio::test]
    async fn test_target_shorter_than_one_file() {
        let dir = tempdir().unwrap();
        write_wav(dir.path(), "long.wav", 5.0, 1000);

        let mut synth = AudioTrackSynthesizer::seeded(test_config(), 1);
        let track = synth.synthesize(dir.path(), 1.5).await.unwrap();

        assert_eq!(track.data.samples.len(), 12000);
        assert_eq!(track.duration(), 1.5);
        assert_eq!(track.segments.len(), 1);
    }

    #[tokio::test]
    async fn test_wraps_with_same_order() {
        let dir = tempdir().unwrap();
        write_wav(dir.path(), "a.wav", 1.0, 100);
        write_wav(dir.path(), "b.wav", 1.0, 200);
        write_wav(dir.path(), "c.wav", 1.0, 300);

        let mut synth = AudioTrackSynthesizer::seeded(test_config(), 42);
        let track = synth.synthesize(dir.path(), 7.0).await.unwrap();

        assert_eq!(track.duration(), 7.0);
        assert_eq!(track.segments.len(), 7);
        let names: Vec<_> = track.segments.iter().map(|s| s.source.clone()).collect();
        assert_eq!(names[0..3], names[3..6]);
        assert_eq!(names[6], names[0]);
    }

    #[tokio::test]
    async fn test_seed_makes_order_reproducible() {
        let dir = tempdir().unwrap();
        for i in 0..6 {
            write_wav(dir.path(), &format!("{}.wav", i), 0.5, 10 * i as i16);
        }

        let order = |seed| {
            let path = dir.path().to_path_buf();
            async move {
                let mut synth = AudioTrackSynthesizer::seeded(test_config(), seed);
                let track = synth.synthesize(&path, 3.0).await.unwrap();
                track.segments.into_iter().map(|s| s.source).collect::<Vec<_>>()
            }
        };

        assert_eq!(order(99).await, order(99).await);
    }

    #[tokio::test]
    async fn test_ignores_other_files() {
        let dir = tempdir().unwrap();
        write_wav(dir.path(), "track.wav", 1.0, 1);
        std::fs::write(dir.path().join("cover.jpg"), b"jpeg").unwrap();

        let synth = AudioTrackSynthesizer::seeded(test_config(), 0);
        let files = synth.discover(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_directory_fails() {
        let dir = tempdir().unwrap();
        let mut synth = AudioTrackSynthesizer::seeded(test_config(), 0);
        let result = synth.synthesize(dir.path(), 5.0).await;
        assert!(matches!(result, Err(ReelError::Input(InputError::NoMusic { .. }))));
    }

    #[tokio::test]
    async fn test_silent_files_do_not_loop_forever() {
        let dir = tempdir().unwrap();
        write_wav(dir.path(), "empty.wav", 0.0, 0);

        let mut synth = AudioTrackSynthesizer::seeded(test_config(), 0);
        let result = synth.synthesize(dir.path(), 2.0).await;
        assert!(matches!(result, Err(ReelError::Input(InputError::EmptyAudio { .. }))));
    }

    #[tokio::test]
    async fn test_resamples_to_track_rate() {
        let dir = tempdir().unwrap();
        write_wav(dir.path(), "tone.wav", 2.0, 8192);

        let config = AudioConfig {
            sample_rate: 16000,
            channels: 2,
            volume: 1.0,
            ..AudioConfig::default()
        };
        let mut synth = AudioTrackSynthesizer::seeded(config, 3);
        let track = synth.synthesize(dir.path(), 3.0).await.unwrap();

        assert_eq!(track.data.samples.len(), 3 * 16000 * 2);
        assert_eq!(track.channels(), 2);
        assert_eq!(track.duration(), 3.0);
    }
}
