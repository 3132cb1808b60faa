use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use log::{debug, error, info};
use tokio::process::Command;

use crate::errors::{CaptionError, Result};

/// Thin wrapper over the ffmpeg and ffprobe binaries
#[derive(Debug, Clone)]
pub struct MediaTools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for MediaTools {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl MediaTools {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    /// Run ffmpeg, failing with a filtered stderr on non-zero exit
    pub async fn run_ffmpeg(&self, args: Vec<OsString>, operation: &'static str, timeout: Duration) -> Result<Output> {
        let output = run_with_timeout(&self.ffmpeg, args, operation, timeout).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("{} failed: {}", operation, filtered);
            return Err(CaptionError::Render { cause: filtered });
        }
        Ok(output)
    }

    /// Extract the audio track of `video` into `output` as AAC
    pub async fn extract_audio(&self, video: &Path, output: &Path, timeout: Duration) -> Result<()> {
        let args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-y".into(),
            "-i".into(),
            video.as_os_str().to_owned(),
            "-vn".into(),
            "-acodec".into(),
            "aac".into(),
            "-b:a".into(),
            "192k".into(),
            output.as_os_str().to_owned(),
        ];
        self.run_ffmpeg(args, "audio extraction", timeout).await?;
        info!("Extracted audio from {:?} to {:?}", video, output);
        Ok(())
    }

    /// Container duration in whole milliseconds, truncated
    pub async fn probe_duration_ms(&self, media: &Path, timeout: Duration) -> Result<u64> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "default=noprint_wrappers=1:nokey=1".into(),
            media.as_os_str().to_owned(),
        ];
        let output = run_with_timeout(&self.ffprobe, args, "duration probe", timeout).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptionError::Render {
                cause: format!("ffprobe failed: {}", stderr.trim()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_duration_ms(&stdout).ok_or_else(|| CaptionError::Render {
            cause: format!("ffprobe returned no usable duration: {:?}", stdout.trim()),
        })
    }
}

/// Run a program to completion, killing it if `timeout` expires
pub async fn run_with_timeout(
    program: &Path,
    args: Vec<OsString>,
    operation: &'static str,
    timeout: Duration,
) -> Result<Output> {
    debug!("Running {:?} {:?}", program, args);
    let future = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result.map_err(|e| CaptionError::Render {
            cause: format!("failed to launch {:?}: {}", program, e),
        }),
        Err(_) => {
            error!("{} timed out after {:?}", operation, timeout);
            Err(CaptionError::Timeout {
                operation,
                after: timeout,
            })
        }
    }
}

fn parse_duration_ms(stdout: &str) -> Option<u64> {
    let seconds: f64 = stdout.lines().map(str::trim).find(|l| !l.is_empty())?.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds * 1000.0) as u64)
}

/// Keep only the stderr lines that say what went wrong, dropping the
/// version banner, build configuration and stream metadata.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "title",
        "BPS",
        "DURATION",
        "NUMBER_OF",
        "_STATISTICS",
        "encoder",
        "handler_name",
        "Output #",
        "Stream mapping:",
        "Press [q]",
        "frame=",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
