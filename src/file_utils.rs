use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::{Builder, NamedTempFile};
use walkdir::WalkDir;

use crate::errors::{CaptionError, Result};

// @module: File and directory utilities

// @const: Extensions ffmpeg reads as audio-only input
const AUDIO_EXTENSIONS: [&str; 8] = ["mp3", "wav", "m4a", "aac", "flac", "ogg", "opus", "wma"];

// @const: Common video containers
const VIDEO_EXTENSIONS: [&str; 14] = [
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ogv", "ts", "mts", "m2ts",
];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Input file exists, as a typed error
    pub fn require_file<P: AsRef<Path>>(path: P) -> Result<()> {
        if Self::file_exists(&path) {
            Ok(())
        } else {
            Err(CaptionError::NotFound(path.as_ref().to_path_buf()))
        }
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Default output path "<stem>_captioned.<ext>" next to the input
    pub fn captioned_output_path<P: AsRef<Path>>(input_file: P) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();

        let mut output_filename = format!("{}_captioned", stem);
        if let Some(ext) = input_file.extension() {
            output_filename.push('.');
            output_filename.push_str(&ext.to_string_lossy());
        }

        input_file.with_file_name(output_filename)
    }

    /// Create an empty temp file beside `destination`, keeping its extension.
    ///
    /// The file lives on the same filesystem as the destination so that
    /// `persist` is a rename. It is deleted when dropped without persisting.
    pub fn staging_file(destination: &Path) -> Result<NamedTempFile> {
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::ensure_dir(&parent)?;

        let suffix = destination
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let file = Builder::new()
            .prefix(".captionkit-")
            .suffix(&suffix)
            .tempfile_in(&parent)?;
        debug!("Staging {:?} at {:?}", destination, file.path());
        Ok(file)
    }

    /// Move a staged file into place
    pub fn publish(staged: NamedTempFile, destination: &Path) -> Result<()> {
        staged
            .persist(destination)
            .map_err(|e| CaptionError::Io(e.error))?;
        Ok(())
    }

    /// Write bytes so readers only ever see the old or the complete new file
    pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
        let mut staged = Self::staging_file(path)?;
        staged.write_all(content)?;
        staged.flush()?;
        Self::publish(staged, path)
    }

    /// Find files with any of the given extensions in a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.map_err(|e| CaptionError::Io(e.into()))?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy();
                    if extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted)) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        // WalkDir order depends on the filesystem
        result.sort();
        Ok(result)
    }

    /// Classify a media path by its extension
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> FileType {
        let Some(ext) = path.as_ref().extension() else {
            return FileType::Unknown;
        };
        let ext_str = ext.to_string_lossy().to_lowercase();

        if ext_str == "srt" {
            FileType::Subtitle
        } else if AUDIO_EXTENSIONS.contains(&ext_str.as_str()) {
            FileType::Audio
        } else if VIDEO_EXTENSIONS.contains(&ext_str.as_str()) {
            FileType::Video
        } else {
            FileType::Unknown
        }
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FileType {
    /// Subtitle file (SRT)
    Subtitle,
    /// Audio-only file
    Audio,
    /// Video file supported by ffmpeg
    Video,
    /// Unknown file type
    Unknown,
}
