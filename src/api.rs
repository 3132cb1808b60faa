//! Functional entry points.
//!
//! Each function builds a [`Captioner`] from `config` and runs one operation.
//! Callers doing several operations with one config should hold a
//! `Captioner` (or a [`crate::video::Video`]) instead.

use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::captioner::{CaptionSource, Captioner, TranscriptionRequest};
use crate::cue_track::CueTrack;
use crate::errors::Result;

/// Burn captions from `source` into `video`
pub async fn add_captions(
    video: impl AsRef<Path>,
    source: CaptionSource,
    output: Option<&Path>,
    config: &Config,
) -> Result<PathBuf> {
    Captioner::with_config(config.clone())?
        .add_captions(video.as_ref(), source, output)
        .await
}

/// Transcribe `media` into a cue track
pub async fn transcribe(media: impl AsRef<Path>, request: &TranscriptionRequest, config: &Config) -> Result<CueTrack> {
    Captioner::with_config(config.clone())?
        .transcribe(media.as_ref(), request)
        .await
}

/// Transcribe `video` and burn the captions into it
pub async fn process_video(
    video: impl AsRef<Path>,
    request: &TranscriptionRequest,
    output: Option<&Path>,
    config: &Config,
) -> Result<PathBuf> {
    Captioner::with_config(config.clone())?
        .process_video(video.as_ref(), request, output)
        .await
}

/// Transcribe `media` and save the cues as an SRT file
pub async fn extract_subtitles(
    media: impl AsRef<Path>,
    request: &TranscriptionRequest,
    output: Option<&Path>,
    config: &Config,
) -> Result<PathBuf> {
    Captioner::with_config(config.clone())?
        .extract_subtitles(media.as_ref(), request, output)
        .await
}
