use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tempfile::TempDir;

use crate::app_config::Config;
use crate::compiler::CaptionCompiler;
use crate::cue_track::CueTrack;
use crate::errors::Result;
use crate::file_utils::{FileManager, FileType};
use crate::filter_graph::FilterGraph;
use crate::fonts::FontRegistry;
use crate::media::MediaTools;
use crate::providers::{AudioPayload, Transcriber, TranscriptionService};
use crate::renderer::Renderer;
use crate::style::CaptionStyle;

// @module: Orchestration of transcription, compilation and rendering

/// Where the cues for a render come from
#[derive(Debug, Clone)]
pub enum CaptionSource {
    /// An already built track
    Track(CueTrack),
    /// SRT content held in memory
    SrtText(String),
    /// Path to an SRT file
    SrtFile(PathBuf),
}

impl From<CueTrack> for CaptionSource {
    fn from(track: CueTrack) -> Self {
        Self::Track(track)
    }
}

impl CaptionSource {
    fn into_track(self) -> Result<CueTrack> {
        match self {
            Self::Track(track) => Ok(track),
            Self::SrtText(content) => CueTrack::parse_srt(&content),
            Self::SrtFile(path) => CueTrack::from_srt_file(path),
        }
    }
}

/// Per-call transcription options; unset fields come from the config
#[derive(Debug, Clone, Default)]
pub struct TranscriptionRequest {
    pub service: Option<TranscriptionService>,
    pub api_key: Option<String>,
    /// Pre-extracted audio to send instead of the media file's audio
    pub audio: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl TranscriptionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service(mut self, service: TranscriptionService) -> Self {
        self.service = Some(service);
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn audio(mut self, audio: impl Into<PathBuf>) -> Self {
        self.audio = Some(audio.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Main entry point: one instance per configuration
#[derive(Debug, Clone)]
pub struct Captioner {
    // @field: App configuration
    config: Config,
    // @field: Validated style used for every render
    style: CaptionStyle,
    fonts: FontRegistry,
    tools: MediaTools,
    renderer: Renderer,
}

impl Captioner {
    // @method: Create a captioner with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let style = config.caption_style()?;
        let fonts = FontRegistry::discover(config.render.fonts_dir.as_deref());
        debug!("Found {} font(s)", fonts.len());

        Ok(Self {
            tools: config.render.media_tools(),
            renderer: config.render.renderer(),
            style,
            fonts,
            config,
        })
    }

    /// Replace the configured style
    pub fn with_style(mut self, style: CaptionStyle) -> Self {
        self.style = style;
        self
    }

    /// Replace the configured style with a named preset
    pub fn with_preset(self, name: &str) -> Result<Self> {
        Ok(self.with_style(CaptionStyle::preset(name)?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn style(&self) -> &CaptionStyle {
        &self.style
    }

    /// Compile a track into the ffmpeg filter script for the current style
    pub fn filter_script(&self, track: &CueTrack) -> Result<String> {
        let instructions = CaptionCompiler::new(&self.style)?.compile(track)?;
        let fontfile = self.fonts.resolve(self.style.font());
        if fontfile.is_none() {
            debug!("No font file for {:?}, leaving lookup to fontconfig", self.style.font());
        }
        Ok(FilterGraph::build(&instructions, &self.style, fontfile))
    }

    /// Burn captions into `video`; returns the written path
    pub async fn add_captions(&self, video: &Path, source: CaptionSource, output: Option<&Path>) -> Result<PathBuf> {
        FileManager::require_file(video)?;
        let track = source.into_track()?;
        let track = self.clamp_to_media(video, track).await;

        let script = self.filter_script(&track)?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| FileManager::captioned_output_path(video));

        let start_time = Instant::now();
        self.renderer.render(video, &script, &output).await?;
        info!("Captioned {} cues in {:.1}s", track.len(), start_time.elapsed().as_secs_f64());
        Ok(output)
    }

    /// Transcribe the audio of `media` into a cue track
    pub async fn transcribe(&self, media: &Path, request: &TranscriptionRequest) -> Result<CueTrack> {
        FileManager::require_file(media)?;
        if let Some(audio) = &request.audio {
            FileManager::require_file(audio)?;
        }

        let transcription = &self.config.transcription;
        let service = request.service.unwrap_or(transcription.service);
        let settings = transcription.provider_settings(service, request.api_key.as_deref())?;
        let timeout = request.timeout.unwrap_or_else(|| transcription.timeout(service));

        // The scratch dir holds extracted audio until the upload is done
        let (audio_path, _scratch): (PathBuf, Option<TempDir>) = match &request.audio {
            Some(audio) => (audio.clone(), None),
            None if FileManager::detect_file_type(media) == FileType::Audio => (media.to_path_buf(), None),
            None => {
                let dir = TempDir::new()?;
                let extracted = dir.path().join("audio.m4a");
                self.tools
                    .extract_audio(media, &extracted, self.config.render.timeout())
                    .await?;
                (extracted, Some(dir))
            }
        };

        let payload = AudioPayload::from_file(&audio_path).await?;
        Transcriber::new(service, settings)
            .transcribe_to_track(&payload, &self.config.grouping, timeout)
            .await
    }

    /// Transcribe `video` and burn the result into it
    pub async fn process_video(
        &self,
        video: &Path,
        request: &TranscriptionRequest,
        output: Option<&Path>,
    ) -> Result<PathBuf> {
        let track = self.transcribe(video, request).await?;
        self.add_captions(video, CaptionSource::Track(track), output).await
    }

    /// Transcribe `media` and write the cues as SRT; defaults to `<stem>.srt`
    pub async fn extract_subtitles(
        &self,
        media: &Path,
        request: &TranscriptionRequest,
        output: Option<&Path>,
    ) -> Result<PathBuf> {
        let track = self.transcribe(media, request).await?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| media.with_extension("srt"));
        track.write_srt_file(&output)?;
        info!("Wrote {} cues to {:?}", track.len(), output);
        Ok(output)
    }

    async fn clamp_to_media(&self, media: &Path, track: CueTrack) -> CueTrack {
        match self.tools.probe_duration_ms(media, self.config.render.probe_timeout()).await {
            Ok(duration_ms) if duration_ms > 0 => track.clamp_to(duration_ms),
            Ok(_) => track,
            Err(e) => {
                warn!("Could not probe duration of {:?}, cues left as is: {}", media, e);
                track
            }
        }
    }
}
