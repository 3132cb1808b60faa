use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::captioner::{CaptionSource, Captioner, TranscriptionRequest};
use crate::cue_track::CueTrack;
use crate::errors::{CaptionError, Result};
use crate::file_utils::FileManager;

/// A video file plus the cues that will be burned into it
#[derive(Debug, Clone)]
pub struct Video {
    path: PathBuf,
    captioner: Captioner,
    cues: Option<CueTrack>,
}

impl Video {
    /// Open an existing video with the given configuration
    pub fn open(path: impl Into<PathBuf>, config: Config) -> Result<Self> {
        Self::with_captioner(path, Captioner::with_config(config)?)
    }

    pub fn with_captioner(path: impl Into<PathBuf>, captioner: Captioner) -> Result<Self> {
        let path = path.into();
        FileManager::require_file(&path)?;
        Ok(Self {
            path,
            captioner,
            cues: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn captioner(&self) -> &Captioner {
        &self.captioner
    }

    /// Transcribe the video's audio and keep the result
    pub async fn transcribe(&mut self, request: &TranscriptionRequest) -> Result<&CueTrack> {
        let track = self.captioner.transcribe(&self.path, request).await?;
        Ok(self.cues.insert(track))
    }

    pub fn set_cues(&mut self, track: CueTrack) {
        self.cues = Some(track);
    }

    /// Load cues from an SRT file
    pub fn load_srt(&mut self, path: impl AsRef<Path>) -> Result<&CueTrack> {
        let track = CueTrack::from_srt_file(path)?;
        Ok(self.cues.insert(track))
    }

    pub fn cues(&self) -> Option<&CueTrack> {
        self.cues.as_ref()
    }

    /// Burn the current cues into the video
    pub async fn add_captions(&self, output: Option<&Path>) -> Result<PathBuf> {
        let track = self.require_cues()?.clone();
        self.captioner
            .add_captions(&self.path, CaptionSource::Track(track), output)
            .await
    }

    /// Write the current cues as SRT
    pub fn save_srt(&self, path: impl AsRef<Path>) -> Result<()> {
        self.require_cues()?.write_srt_file(path)
    }

    fn require_cues(&self) -> Result<&CueTrack> {
        self.cues.as_ref().ok_or_else(|| {
            CaptionError::Config("no cues loaded: transcribe, set_cues or load_srt first".to_string())
        })
    }
}
