use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{EncodingError, ResourceError, Result};
use crate::video::clip::Clip;
use crate::video::types::Frame;

/// Stream information reported by ffprobe
#[derive(Debug, Clone)]
pub struct VideoProbe {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration: f64,
    pub has_audio: bool,
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

impl VideoProbe {
    /// Probe a video file; a missing or unreadable file is a resource error
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ResourceError::NotFound {
                path: path.display().to_string(),
            }.into());
        }

        let probe_failed = |reason: String| ResourceError::ProbeFailed {
            path: path.display().to_string(),
            reason,
        };

        let output = Command::new("ffprobe")
            .args(["-v", "error", "-print_format", "json", "-show_streams", "-show_format"])
            .arg(path)
            .output()
            .map_err(|e| probe_failed(format!("failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(probe_failed(stderr.trim().to_string()).into());
        }

        Self::from_json(path, &output.stdout)
    }

    fn from_json(path: &Path, json: &[u8]) -> Result<Self> {
        let parsed: ProbeOutput = serde_json::from_slice(json).map_err(|e| {
            ResourceError::ProbeFailed {
                path: path.display().to_string(),
                reason: format!("invalid ffprobe output: {}", e),
            }
        })?;

        let video = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| ResourceError::NoVideoStream {
                path: path.display().to_string(),
            })?;

        let (width, height) = match (video.width, video.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(ResourceError::ProbeFailed {
                    path: path.display().to_string(),
                    reason: "missing video dimensions".to_string(),
                }.into())
            }
        };

        let fps = video
            .avg_frame_rate
            .as_deref()
            .and_then(parse_ratio)
            .unwrap_or(30.0);

        let duration = parsed
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .or(video.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| ResourceError::ProbeFailed {
                path: path.display().to_string(),
                reason: "missing duration".to_string(),
            })?;

        let has_audio = parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio"));

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            fps,
            duration,
            has_audio,
        })
    }
}

fn parse_ratio(value: &str) -> Option<f64> {
    let (num, den) = value.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 || num <= 0.0 {
        return None;
    }
    Some(num / den)
}

/// Clip backed by a video file, decoded sequentially through ffmpeg.
///
/// The decoder scales every frame to the output size and resamples to the
/// output frame rate, so frame `i` of the stream is the frame shown at
/// `t = i / fps`. Requests past the end of the stream hold the last frame;
/// a request earlier than the current position restarts the decoder.
pub struct FileClip {
    name: String,
    probe: VideoProbe,
    duration: f64,
    size: (u32, u32),
    fps: f64,
    decoder: Option<FrameDecoder>,
    last_frame: Option<Frame>,
}

struct FrameDecoder {
    child: Child,
    stdout: BufReader<ChildStdout>,
    next_index: usize,
    exhausted: bool,
}

impl FileClip {
    /// Clip over a probed file, rendered at `size` and `fps`
    pub fn from_probe(probe: VideoProbe, size: (u32, u32), fps: f64) -> Self {
        let name = probe
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "clip".to_string());

        info!("Opened {}: {}x{} @ {:.2}fps, {:.2}s{}",
              probe.path.display(), probe.width, probe.height, probe.fps, probe.duration,
              if probe.has_audio { ", with audio" } else { "" });

        Self {
            name,
            duration: probe.duration,
            probe,
            size,
            fps,
            decoder: None,
            last_frame: None,
        }
    }

    /// Play for `duration` seconds instead of the file's own length
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    fn frame_len(&self) -> usize {
        self.size.0 as usize * self.size.1 as usize * 3
    }

    fn spawn_decoder(&self) -> Result<FrameDecoder> {
        let filter = format!("scale={}:{},fps={}", self.size.0, self.size.1, self.fps);
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(&self.probe.path)
            .args(["-an", "-vf", &filter, "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| EncodingError::SpawnFailed {
                reason: format!("ffmpeg decoder for {}: {}", self.probe.path.display(), e),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| EncodingError::SpawnFailed {
            reason: "failed to open ffmpeg stdout".to_string(),
        })?;

        debug!("Started decoder for {}", self.probe.path.display());
        Ok(FrameDecoder {
            child,
            stdout: BufReader::new(stdout),
            next_index: 0,
            exhausted: false,
        })
    }

    fn read_next(&mut self, time: f64) -> Result<bool> {
        let frame_len = self.frame_len();
        let (width, height) = self.size;
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(false);
        };
        if decoder.exhausted {
            return Ok(false);
        }

        let mut buffer = vec![0u8; frame_len];
        match read_full(&mut decoder.stdout, &mut buffer) {
            Ok(true) => {
                decoder.next_index += 1;
                self.last_frame = Frame::from_rgb_bytes(width, height, buffer);
                Ok(true)
            }
            Ok(false) => {
                decoder.exhausted = true;
                debug!("{} ended after {} frames", self.name, decoder.next_index);
                Ok(false)
            }
            Err(e) => Err(EncodingError::FrameFailed {
                time,
                reason: format!("reading {}: {}", self.probe.path.display(), e),
            }.into()),
        }
    }
}

/// Fill `buffer` completely; `Ok(false)` on a clean end of stream
fn read_full<R: Read>(reader: &mut R, buffer: &mut [u8]) -> std::io::Result<bool> {
    let mut filled = 0;
    while filled < buffer.len() {
        let read = reader.read(&mut buffer[filled..])?;
        if read == 0 {
            return Ok(false);
        }
        filled += read;
    }
    Ok(true)
}

impl Clip for FileClip {
    fn name(&self) -> &str {
        &self.name
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn frame_at(&mut self, t: f64) -> Result<Frame> {
        let wanted = (t * self.fps + 1e-6).floor().max(0.0) as usize;

        let needs_restart = match &self.decoder {
            None => true,
            Some(decoder) => wanted + 1 < decoder.next_index,
        };
        if needs_restart {
            if let Some(mut old) = self.decoder.take() {
                let _ = old.child.kill();
                let _ = old.child.wait();
            }
            self.last_frame = None;
            self.decoder = Some(self.spawn_decoder()?);
        }

        while self.decoder.as_ref().map(|d| d.next_index <= wanted).unwrap_or(false) {
            if !self.read_next(t)? {
                break;
            }
        }

        match &self.last_frame {
            Some(frame) => Ok(frame.clone()),
            None => {
                warn!("{} produced no frames", self.name);
                Err(EncodingError::FrameFailed {
                    time: t,
                    reason: format!("{} produced no frames", self.probe.path.display()),
                }.into())
            }
        }
    }
}

impl Drop for FileClip {
    fn drop(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            let _ = decoder.child.kill();
            let _ = decoder.child.wait();
        }
    }
}
