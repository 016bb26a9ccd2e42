use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::audio::types::AudioData;
use crate::error::{InputError, Result};

/// Audio file loader supporting multiple formats
pub struct AudioLoader;

impl AudioLoader {
    /// Load an audio file and return raw audio data
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<AudioData> {
        let path = path.as_ref();
        let extension = Self::detect_format(path).unwrap_or_default();

        match extension.as_str() {
            "wav" => Self::load_wav(path),
            ext if Self::is_format_supported(ext) => {
                Self::load_with_symphonia(path)?.ok_or_else(|| {
                    InputError::AudioLoadFailed {
                        path: path.display().to_string(),
                    }.into()
                })
            }
            _ => Err(InputError::UnsupportedFormat {
                format: extension
            }.into()),
        }
    }

    /// Load the audio track embedded in a video file, if one can be decoded
    pub async fn load_embedded<P: AsRef<Path>>(path: P) -> Option<AudioData> {
        let path = path.as_ref();
        match Self::load_with_symphonia(path) {
            Ok(Some(audio)) => Some(audio),
            Ok(None) => {
                warn!("No decodable audio track in {}", path.display());
                None
            }
            Err(e) => {
                warn!("Ignoring audio of {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load WAV files using the hound crate (most reliable for WAV)
    fn load_wav(path: &Path) -> Result<AudioData> {
        let load_failed = || InputError::AudioLoadFailed {
            path: path.display().to_string()
        };

        let reader = hound::WavReader::open(path).map_err(|_| load_failed())?;

        let spec = reader.spec();
        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                reader.into_samples::<f32>()
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|_| load_failed())?
            }
            hound::SampleFormat::Int => {
                let bit_depth = spec.bits_per_sample;
                reader.into_samples::<i32>()
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|_| load_failed())?
                    .into_iter()
                    .map(|sample| Self::int_to_float(sample, bit_depth))
                    .collect()
            }
        };

        debug!("Decoded {} ({} Hz, {} ch) with hound", path.display(), spec.sample_rate, spec.channels);
        Ok(AudioData::from_samples(samples, spec.sample_rate, spec.channels, path.to_path_buf()))
    }

    /// Decode the first audio track with Symphonia; `None` if the container has none
    fn load_with_symphonia(path: &Path) -> Result<Option<AudioData>> {
        let load_failed = || InputError::AudioLoadFailed {
            path: path.display().to_string()
        };

        let file = File::open(path).map_err(|_| load_failed())?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create a probe hint using the file extension
        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|_| load_failed())?;

        let mut format = probed.format;

        // Find the first audio track with a known (decodable) codec
        let Some(track) = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        else {
            return Ok(None);
        };

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params.sample_rate.unwrap_or(44100);

        let dec_opts: DecoderOptions = Default::default();
        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &dec_opts)
            .map_err(|_| load_failed())?;

        let mut samples = Vec::new();
        let mut channels = codec_params.channels.map(|c| c.count() as u16);

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                // End of stream
                Err(SymphoniaError::IoError(_)) => break,
                Err(_) => break,
            };

            // Consume any new metadata
            while !format.metadata().is_latest() {
                format.metadata().pop();
            }

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    channels.get_or_insert(spec.channels.count() as u16);

                    let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buffer.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buffer.samples());
                }
                Err(SymphoniaError::IoError(_)) => break,
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!("Skipping undecodable packet in {}: {}", path.display(), e);
                    continue;
                }
                Err(_) => break,
            }
        }

        let channels = channels.unwrap_or(2);
        debug!("Decoded {} ({} Hz, {} ch) with symphonia", path.display(), sample_rate, channels);
        Ok(Some(AudioData::from_samples(samples, sample_rate, channels, path.to_path_buf())))
    }

    /// Convert integer sample to float (-1.0 to 1.0)
    fn int_to_float(sample: i32, bit_depth: u16) -> f32 {
        match bit_depth {
            // hound already recentres unsigned 8-bit samples around zero
            8 => sample as f32 / 128.0,
            16 => sample as f32 / 32768.0,
            24 => sample as f32 / 8388608.0,
            32 => sample as f32 / 2147483648.0,
            _ => sample as f32 / 32768.0, // Default to 16-bit
        }
    }

    /// Detect audio format from file extension
    pub fn detect_format<P: AsRef<Path>>(path: P) -> Option<String> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// Check if a file format is supported
    pub fn is_format_supported(extension: &str) -> bool {
        matches!(
            extension.to_lowercase().as_str(),
            "wav" | "mp3" | "flac" | "ogg" | "m4a" | "aac" | "mp4" | "mov"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReelError;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_format_detection() {
        assert_eq!(AudioLoader::detect_format("test.wav"), Some("wav".to_string()));
        assert_eq!(AudioLoader::detect_format("test.MP3"), Some("mp3".to_string()));
        assert_eq!(AudioLoader::detect_format("test"), None);
    }

    #[test]
    fn test_format_support() {
        assert!(AudioLoader::is_format_supported("wav"));
        assert!(AudioLoader::is_format_supported("mp3"));
        assert!(AudioLoader::is_format_supported("MP4"));
        assert!(!AudioLoader::is_format_supported("xyz"));
    }

    #[test]
    fn test_int_to_float_conversion() {
        assert_eq!(AudioLoader::int_to_float(0, 16), 0.0);
        assert_eq!(AudioLoader::int_to_float(32767, 16), 32767.0 / 32768.0);
        assert_eq!(AudioLoader::int_to_float(-32768, 16), -1.0);

        assert_eq!(AudioLoader::int_to_float(0, 8), 0.0);
        assert_eq!(AudioLoader::int_to_float(-128, 8), -1.0);
        assert_eq!(AudioLoader::int_to_float(64, 8), 0.5);
    }

    #[tokio::test]
    async fn test_load_8bit_wav_is_centred() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quiet.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 8,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(0i8).unwrap();
        }
        writer.write_sample(64i8).unwrap();
        writer.finalize().unwrap();

        let audio = AudioLoader::load(&path).await.unwrap();
        assert_eq!(audio.samples.len(), 101);
        assert!(audio.samples[..100].iter().all(|&s| s == 0.0));
        assert_eq!(audio.samples[100], 0.5);
    }

    #[tokio::test]
    async fn test_load_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..8000 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(-16384i16).unwrap();
        }
        writer.finalize().unwrap();

        let audio = AudioLoader::load(&path).await.unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.duration, 1.0);
        assert_eq!(audio.samples[0], 0.5);
        assert_eq!(audio.samples[1], -0.5);
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test.xyz");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"dummy content").unwrap();

        let result = AudioLoader::load(&file_path).await;
        if let Err(ReelError::Input(InputError::UnsupportedFormat { format })) = result {
            assert_eq!(format, "xyz");
        } else {
            panic!("Expected UnsupportedFormat error");
        }
    }

    #[tokio::test]
    async fn test_corrupt_mp3_fails() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("broken.mp3");
        std::fs::write(&file_path, b"definitely not audio").unwrap();

        let result = AudioLoader::load(&file_path).await;
        assert!(matches!(result, Err(ReelError::Input(InputError::AudioLoadFailed { .. }))));
    }
}
