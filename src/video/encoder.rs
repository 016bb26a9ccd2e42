use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};

use tracing::{debug, info, warn};

use crate::error::{EncodingError, Result};
use crate::video::types::{Frame, VideoParams};

/// Represents an encoded video output
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub duration: f64,
    pub frame_count: usize,
    pub file_size: u64,
}

/// Streams raw RGB frames into a system `ffmpeg` process.
///
/// Output goes to a hidden `.partial` sibling of the target path and is
/// renamed into place by [`FfmpegEncoder::finish`]. If the encoder is dropped
/// before that, the partial file is removed.
pub struct FfmpegEncoder {
    params: VideoParams,
    output_path: PathBuf,
    partial_path: PathBuf,
    duration: f64,
    child: Child,
    stdin: Option<ChildStdin>,
    frames_written: usize,
    finished: bool,
}

impl FfmpegEncoder {
    pub fn check_ffmpeg_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Start ffmpeg for a video of `duration` seconds, muxing `audio_path` if given
    pub fn start<P: AsRef<Path>>(
        params: VideoParams,
        output_path: P,
        audio_path: Option<&Path>,
        duration: f64,
    ) -> Result<Self> {
        if !Self::check_ffmpeg_available() {
            return Err(EncodingError::FfmpegMissing.into());
        }

        let output_path = output_path.as_ref().to_path_buf();
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let partial_path = partial_path_for(&output_path);

        let (width, height) = params.resolution;
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.args([
            "-y",
            "-loglevel", "error",
            "-f", "rawvideo",
            "-pix_fmt", "rgb24",
            "-s", &format!("{}x{}", width, height),
            "-r", &params.fps.to_string(),
            "-i", "pipe:0",
        ]);

        if let Some(audio) = audio_path {
            cmd.arg("-i").arg(audio);
            cmd.args(["-map", "0:v:0", "-map", "1:a:0", "-c:a", "aac", "-b:a", "192k"]);
        } else {
            cmd.arg("-an");
        }

        cmd.args([
            "-c:v", &params.codec,
            "-pix_fmt", "yuv420p",
            "-crf", &quality_to_crf(params.quality).to_string(),
            "-r", &params.fps.to_string(),
            "-t", &format!("{:.6}", duration),
        ]);

        // The partial name hides the real extension, so name the container explicitly
        match container_format(&output_path) {
            Some(format @ ("mp4" | "mov")) => {
                cmd.args(["-movflags", "+faststart", "-f", format]);
            }
            Some(format) => {
                cmd.args(["-f", format]);
            }
            None => {
                cmd.args(["-f", "mp4"]);
            }
        }
        cmd.arg(&partial_path);

        debug!("Spawning ffmpeg: {:?}", cmd);
        let mut child = cmd.spawn().map_err(|e| EncodingError::SpawnFailed {
            reason: e.to_string(),
        })?;

        let stdin = child.stdin.take().ok_or_else(|| EncodingError::SpawnFailed {
            reason: "failed to open ffmpeg stdin".to_string(),
        })?;

        info!("Encoding {}x{} @ {}fps to {}", width, height, params.fps, output_path.display());

        Ok(Self {
            params,
            output_path,
            partial_path,
            duration,
            child,
            stdin: Some(stdin),
            frames_written: 0,
            finished: false,
        })
    }

    pub fn encode_frame(&mut self, frame: &Frame) -> Result<()> {
        let (width, height) = self.params.resolution;
        if frame.width() != width || frame.height() != height {
            return Err(EncodingError::WriteFailed {
                reason: format!(
                    "frame size mismatch: got {}x{}, expected {}x{}",
                    frame.width(), frame.height(), width, height
                ),
            }.into());
        }

        let stdin = self.stdin.as_mut().ok_or_else(|| EncodingError::WriteFailed {
            reason: "encoder already finished".to_string(),
        })?;

        if let Err(e) = stdin.write_all(frame.as_rgb_bytes()) {
            return Err(self.write_failure(e));
        }

        self.frames_written += 1;
        Ok(())
    }

    /// A failed write usually means ffmpeg exited; its stderr says why
    fn write_failure(&mut self, error: std::io::Error) -> crate::error::ReelError {
        drop(self.stdin.take());
        let reason = match wait_for_exit(&mut self.child) {
            Ok((status, stderr)) if !stderr.trim().is_empty() => {
                format!("{} (ffmpeg {}: {})", error, status, stderr.trim())
            }
            Ok((status, _)) => format!("{} (ffmpeg {})", error, status),
            Err(_) => error.to_string(),
        };
        EncodingError::WriteFailed { reason }.into()
    }

    /// Close the stream, wait for ffmpeg and publish the output file
    pub fn finish(mut self) -> Result<EncodedVideo> {
        drop(self.stdin.take());

        let (status, stderr) = wait_for_exit(&mut self.child)?;
        if !status.success() {
            return Err(EncodingError::FfmpegFailed {
                reason: format!("exit status {}: {}", status, stderr.trim()),
            }.into());
        }

        std::fs::rename(&self.partial_path, &self.output_path)?;
        self.finished = true;

        let file_size = std::fs::metadata(&self.output_path)?.len();
        Ok(EncodedVideo {
            path: self.output_path.clone(),
            duration: self.duration,
            frame_count: self.frames_written,
            file_size,
        })
    }
}

fn wait_for_exit(child: &mut Child) -> Result<(ExitStatus, String)> {
    let mut stderr = String::new();
    if let Some(mut pipe) = child.stderr.take() {
        let _ = pipe.read_to_string(&mut stderr);
    }
    let status = child.wait().map_err(|e| EncodingError::FfmpegFailed {
        reason: format!("failed to wait for ffmpeg: {}", e),
    })?;
    Ok((status, stderr))
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        if self.partial_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.partial_path) {
                warn!("Failed to remove partial output {}: {}", self.partial_path.display(), e);
            }
        }
    }
}

fn partial_path_for(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!(".{}.partial", name))
}

fn container_format(output: &Path) -> Option<&'static str> {
    let ext = output.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "mp4" | "m4v" => Some("mp4"),
        "mov" => Some("mov"),
        "mkv" => Some("matroska"),
        "webm" => Some("webm"),
        "avi" => Some("avi"),
        _ => None,
    }
}

fn quality_to_crf(quality: u8) -> u8 {
    (51 - ((quality.min(100) as f32 / 100.0) * 51.0) as u8).clamp(0, 51)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_quality_to_crf() {
        assert_eq!(quality_to_crf(100), 0);
        assert_eq!(quality_to_crf(0), 51);
        assert_eq!(quality_to_crf(85), 8);
    }

    #[test]
    fn test_partial_path_is_hidden_sibling() {
        let partial = partial_path_for(Path::new("out/Video title.mp4"));
        assert_eq!(partial, PathBuf::from("out/.Video title.mp4.partial"));
    }

    #[test]
    fn test_container_format() {
        assert_eq!(container_format(Path::new("a.mp4")), Some("mp4"));
        assert_eq!(container_format(Path::new("a.MKV")), Some("matroska"));
        assert_eq!(container_format(Path::new("a")), None);
    }

    #[test]
    fn test_encode_small_video() {
        if !FfmpegEncoder::check_ffmpeg_available() {
            return;
        }

        let dir = tempdir().unwrap();
        let output = dir.path().join("tiny.mp4");
        let params = VideoParams {
            fps: 10.0,
            resolution: (64, 32),
            ..VideoParams::default()
        };

        let mut encoder = FfmpegEncoder::start(params, &output, None, 1.0).unwrap();
        for i in 0..10u8 {
            encoder.encode_frame(&Frame::new_filled(64, 32, [i * 20, 0, 0])).unwrap();
        }
        let encoded = encoder.finish().unwrap();

        assert_eq!(encoded.frame_count, 10);
        assert!(output.exists());
        assert!(!partial_path_for(&output).exists());
        assert!(encoded.file_size > 0);
    }

    #[test]
    fn test_ffmpeg_exit_reports_stderr() {
        if !FfmpegEncoder::check_ffmpeg_available() {
            return;
        }

        let dir = tempdir().unwrap();
        let output = dir.path().join("broken.mp4");
        let params = VideoParams {
            fps: 10.0,
            resolution: (320, 240),
            codec: "no_such_encoder".to_string(),
            ..VideoParams::default()
        };

        let mut encoder = FfmpegEncoder::start(params, &output, None, 10.0).unwrap();
        let frame = Frame::new_black(320, 240);
        let failure = (0..100)
            .find_map(|_| encoder.encode_frame(&frame).err())
            .map(|e| e.to_string());
        let message = match failure {
            Some(message) => message,
            None => encoder.finish().unwrap_err().to_string(),
        };

        assert!(message.contains("no_such_encoder"), "{}", message);
        assert!(!output.exists());
    }

    #[test]
    fn test_dropped_encoder_leaves_no_output() {
        if !FfmpegEncoder::check_ffmpeg_available() {
            return;
        }

        let dir = tempdir().unwrap();
        let output = dir.path().join("aborted.mp4");
        let params = VideoParams {
            fps: 10.0,
            resolution: (32, 32),
            ..VideoParams::default()
        };

        let mut encoder = FfmpegEncoder::start(params, &output, None, 1.0).unwrap();
        encoder.encode_frame(&Frame::new_black(32, 32)).unwrap();
        assert!(encoder.encode_frame(&Frame::new_black(16, 16)).is_err());
        drop(encoder);

        assert!(!output.exists());
        assert!(!partial_path_for(&output).exists());
    }
}
