use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    audio::{mixer, AudioLoader, AudioMixer, AudioTrack, AudioTrackSynthesizer},
    composition::timeline::{Overlay, Timeline},
    config::Config,
    error::{EncodingError, Result},
    video::{
        ChromaKey, EncodedVideo, FfmpegEncoder, FileClip, Panorama, PanoramaAssembler, PanClip,
        VideoProbe,
    },
};

/// Orchestrates a full panorama reel render.
///
/// The pipeline runs strictly in order:
/// 1. Resource check - probe the outro and action clips, look for ffmpeg
/// 2. Panorama - stitch the stamped images and save the artifact
/// 3. Timeline - pre-roll, pan, post-roll and outro plus the keyed overlay
/// 4. Audio - synthesized music track mixed with the clips' own audio
/// 5. Render - stream every frame into ffmpeg and publish the output
pub struct CompositionEngine {
    config: Config,
    seed: Option<u64>,
}

/// Probed fixed assets, checked before any other work starts
struct Resources {
    outro: VideoProbe,
    action: VideoProbe,
}

impl CompositionEngine {
    pub fn new(config: Config) -> Self {
        Self { config, seed: None }
    }

    /// Fix the music shuffle so repeated runs produce the same track
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run the whole pipeline and return the published video
    pub async fn compose(&self) -> Result<EncodedVideo> {
        self.config.validate()?;
        let paths = &self.config.paths;

        info!("🎬 Starting panorama-reel composition");
        info!("   Images: {:?}", paths.images_dir);
        info!("   Music: {:?}", paths.music_dir);
        info!("   Outro: {:?}", paths.outro);
        info!("   Action: {:?}", paths.action);
        info!("   Output: {:?}", paths.output);

        // Pipeline Step 1: Resource Check
        let resources = self.check_resources()?;

        // Pipeline Step 2: Panorama
        let panorama = self.assemble_panorama()?;

        // Pipeline Step 3: Timeline
        let (timeline, music_duration) = self.build_timeline(&panorama, &resources)?;

        // Pipeline Step 4: Audio
        let mix_path = mix_path_for(&paths.output);
        self.build_audio(&timeline, music_duration, &resources, &mix_path).await?;

        // Pipeline Step 5: Render
        let result = self.render(timeline, &mix_path);
        if let Err(e) = std::fs::remove_file(&mix_path) {
            debug!("Could not remove {}: {}", mix_path.display(), e);
        }
        let video = result?;

        info!("🎉 Composition complete! Output saved to: {:?}", video.path);
        Ok(video)
    }

    // ==========================================
    // PIPELINE STEP 1: RESOURCE CHECK
    // ==========================================

    fn check_resources(&self) -> Result<Resources> {
        info!("🔍 Step 1: Checking resources...");

        let outro = VideoProbe::probe(&self.config.paths.outro)?;
        info!("   Outro: {}x{}, {:.2}s", outro.width, outro.height, outro.duration);

        let action = VideoProbe::probe(&self.config.paths.action)?;
        info!("   Action: {}x{}, {:.2}s", action.width, action.height, action.duration);

        if !FfmpegEncoder::check_ffmpeg_available() {
            return Err(EncodingError::FfmpegMissing.into());
        }

        Ok(Resources { outro, action })
    }

    // ==========================================
    // PIPELINE STEP 2: PANORAMA
    // ==========================================

    fn assemble_panorama(&self) -> Result<Panorama> {
        info!("🖼️  Step 2: Assembling panorama...");

        let assembler = PanoramaAssembler::new(
            &self.config.paths.panorama,
            self.config.timing.per_image_seconds,
        );
        let panorama = assembler.assemble_directory(&self.config.paths.images_dir)?;

        info!("   ✅ {} images stitched into {}x{}, pan {:.1}s",
              panorama.image_count, panorama.width(), panorama.height(),
              panorama.suggested_duration);
        Ok(panorama)
    }

    // ==========================================
    // PIPELINE STEP 3: TIMELINE
    // ==========================================

    /// Base timeline and overlay; also returns the music length
    fn build_timeline(&self, panorama: &Panorama, resources: &Resources) -> Result<(Timeline, f64)> {
        info!("🎞️  Step 3: Building timeline...");

        let params = &self.config.video.params;
        let timing = &self.config.timing;
        let size = params.resolution;

        let mut pan = PanClip::new(panorama.image.clone(), panorama.suggested_duration, size)?;
        let pre_roll = pan.pre_roll(timing.pre_roll)?;
        let post_roll = pan.post_roll(timing.post_roll, params.fps)?;
        let music_duration = timing.pre_roll + panorama.suggested_duration + timing.post_roll;

        let mut outro = FileClip::from_probe(resources.outro.clone(), size, params.fps);
        if let Some(duration) = timing.outro_duration {
            debug!("Outro length overridden: {:.2}s (native {:.2}s)",
                   duration, resources.outro.duration);
            outro = outro.with_duration(duration);
        }

        let mut timeline = Timeline::new(size);
        timeline.push(Box::new(pre_roll))?;
        timeline.push(Box::new(pan))?;
        timeline.push(Box::new(post_roll))?;
        timeline.push(Box::new(outro))?;

        let action = FileClip::from_probe(resources.action.clone(), size, params.fps);
        let key = ChromaKey::new(&self.config.chroma_key);
        timeline.set_overlay(Overlay::new(Box::new(action), timing.overlay_start, key));

        for segment in timeline.segments() {
            info!("   {:<10} {:>7.2}s - {:>7.2}s",
                  segment.name, segment.start, segment.start + segment.duration);
        }
        match timeline.overlay_window() {
            Some((start, end)) => info!("   overlay    {:>7.2}s - {:>7.2}s", start, end),
            None => warn!("Action clip starts at {:.2}s, after the video ends at {:.2}s; it will not be shown",
                          timing.overlay_start, timeline.duration()),
        }
        info!("   ✅ Total duration: {:.2}s", timeline.duration());

        Ok((timeline, music_duration))
    }

    // ==========================================
    // PIPELINE STEP 4: AUDIO
    // ==========================================

    async fn build_audio(
        &self,
        timeline: &Timeline,
        music_duration: f64,
        resources: &Resources,
        mix_path: &Path,
    ) -> Result<()> {
        info!("🎵 Step 4: Building audio track...");

        let audio = &self.config.audio;
        let track = self.synthesize_music(music_duration).await?;
        info!("   Music: {} segments, {:.2}s", track.segments.len(), track.duration());

        let mut mix = AudioMixer::new(audio.sample_rate, audio.channels, timeline.duration());
        mix.place(&track.data, 0.0, 1.0);

        if audio.include_clip_audio {
            let placements = [
                (&resources.outro, music_duration),
                (&resources.action, self.config.timing.overlay_start),
            ];
            for (probe, start) in placements {
                if !probe.has_audio {
                    debug!("{} has no audio stream", probe.path.display());
                    continue;
                }
                if let Some(clip_audio) = AudioLoader::load_embedded(&probe.path).await {
                    mix.place(&clip_audio, start, 1.0);
                }
            }
        }

        let mix = mix.finish();
        mixer::write_wav(&mix, mix_path)?;
        debug!("Mixed audio written to {}", mix_path.display());
        info!("   ✅ Audio ready: {:.2}s", mix.duration);
        Ok(())
    }

    async fn synthesize_music(&self, duration: f64) -> Result<AudioTrack> {
        let audio = self.config.audio.clone();
        let music_dir = &self.config.paths.music_dir;
        match self.seed {
            Some(seed) => {
                debug!("Music shuffle seed: {}", seed);
                AudioTrackSynthesizer::seeded(audio, seed).synthesize(music_dir, duration).await
            }
            None => AudioTrackSynthesizer::new(audio).synthesize(music_dir, duration).await,
        }
    }

    // ==========================================
    // PIPELINE STEP 5: RENDER
    // ==========================================

    fn render(&self, mut timeline: Timeline, mix_path: &Path) -> Result<EncodedVideo> {
        info!("📼 Step 5: Rendering video...");

        let params = self.config.video.params.clone();
        let fps = params.fps;
        let duration = timeline.duration();
        info!("   {} frames at {}x{} @ {}fps",
              params.frame_count(duration), params.resolution.0, params.resolution.1, fps);

        let mut encoder = FfmpegEncoder::start(params, &self.config.paths.output, Some(mix_path), duration)?;
        timeline.render(fps, |frame| encoder.encode_frame(frame))?;
        let video = encoder.finish()?;

        info!("   ✅ {} frames, {:.1} MB", video.frame_count, video.file_size as f64 / 1_048_576.0);
        Ok(video)
    }
}

/// Scratch WAV next to the output, removed once the render ends
fn mix_path_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!(".{}.mix.wav", stem))
}
