//! Burns a filter script into a video with ffmpeg.
//!
//! ffmpeg writes to a staging file beside the destination; the staging file
//! is renamed into place only after ffmpeg exits successfully, so a failed or
//! timed-out render never leaves a partial file at the destination.

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use log::info;
use tempfile::Builder;

use crate::errors::Result;
use crate::file_utils::FileManager;
use crate::media::MediaTools;

#[derive(Debug, Clone)]
pub struct Renderer {
    tools: MediaTools,
    preset: String,
    timeout: Duration,
}

impl Renderer {
    pub fn new(tools: MediaTools, preset: impl Into<String>, timeout: Duration) -> Self {
        Self {
            tools,
            preset: preset.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Render `source` with `filter_script` applied and publish to `destination`
    pub async fn render(&self, source: &Path, filter_script: &str, destination: &Path) -> Result<()> {
        FileManager::require_file(source)?;

        let mut script = Builder::new().prefix("captionkit-filter-").suffix(".txt").tempfile()?;
        script.write_all(filter_script.as_bytes())?;
        script.flush()?;

        let staged = FileManager::staging_file(destination)?;
        let args = render_args(source, script.path(), staged.path(), &self.preset);

        info!("Rendering {:?} -> {:?}", source, destination);
        self.tools.run_ffmpeg(args, "render", self.timeout).await?;

        FileManager::publish(staged, destination)?;
        info!("Wrote {:?}", destination);
        Ok(())
    }
}

/// ffmpeg argument list for one render
pub fn render_args(source: &Path, script: &Path, output: &Path, preset: &str) -> Vec<OsString> {
    vec![
        "-hide_banner".into(),
        "-y".into(),
        "-i".into(),
        source.as_os_str().to_owned(),
        "-filter_script:v".into(),
        script.as_os_str().to_owned(),
        "-c:a".into(),
        "copy".into(),
        "-preset".into(),
        preset.into(),
        "-movflags".into(),
        "+faststart".into(),
        output.as_os_str().to_owned(),
    ]
}
