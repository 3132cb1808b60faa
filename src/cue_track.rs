use std::fmt;
use std::path::Path;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{CaptionError, Result};
use crate::file_utils::FileManager;

// @module: Timed caption cues and the SRT interchange format

// @const: SRT timing line, optional trailing position hints are ignored
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2})[,.](\d{1,9})\s*-->\s*(\d+):(\d{2}):(\d{2})[,.](\d{1,9})(?:\s+.*)?$")
        .expect("timing regex is valid")
});

// @const: Font and other HTML-like markup tags
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^>]*>").expect("tag regex is valid"));

// @const: Leading diarization label such as "Speaker A: "
static SPEAKER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Speaker [^:\n]{1,20}:\s*").expect("speaker regex is valid"));

// @struct: Single timed caption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    // @field: Start time in ms (inclusive)
    start_ms: u64,

    // @field: End time in ms (exclusive)
    end_ms: u64,

    // @field: Caption text, one entry per line
    text: String,
}

impl Cue {
    /// Create a cue, rejecting empty or inverted time windows and empty text.
    ///
    /// Text is normalized line by line: surrounding whitespace is trimmed and
    /// blank lines are dropped, since a blank line terminates an SRT block.
    pub fn new(start_ms: u64, end_ms: u64, text: impl AsRef<str>) -> Result<Self> {
        if start_ms >= end_ms {
            return Err(CaptionError::InvariantViolation {
                cue_index: 0,
                message: format!("start {}ms is not before end {}ms", start_ms, end_ms),
            });
        }

        let text = normalize_text(text.as_ref());
        if text.is_empty() {
            return Err(CaptionError::InvariantViolation {
                cue_index: 0,
                message: format!("cue at {}ms has no text", start_ms),
            });
        }

        Ok(Self { start_ms, end_ms, text })
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> u64 {
        self.end_ms
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    /// Lines of the caption text
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}

fn normalize_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Parse a single SRT timestamp (`HH:MM:SS,mmm`) to milliseconds.
///
/// Fractions finer than a millisecond are truncated, never rounded up.
pub fn parse_timestamp(timestamp: &str) -> Option<u64> {
    let (clock, fraction) = timestamp.trim().split_once([',', '.'])?;
    let mut parts = clock.split(':');
    let hours = parts.next()?;
    let minutes = parts.next()?;
    let seconds = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    timestamp_from_parts(hours, minutes, seconds, fraction)
}

fn timestamp_from_parts(hours: &str, minutes: &str, seconds: &str, fraction: &str) -> Option<u64> {
    if fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: u64 = hours.parse().ok()?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    // "5" is half a second, "123456" keeps only the millisecond digits
    let millis_digits: String = fraction.chars().chain("00".chars()).take(3).collect();
    let millis: u64 = millis_digits.parse().ok()?;

    hours
        .checked_mul(3_600_000)?
        .checked_add(minutes * 60_000 + seconds * 1_000 + millis)
}

/// Remove font/HTML markup and a leading speaker label from caption text
pub fn strip_markup(text: &str) -> String {
    let without_tags = TAG_REGEX.replace_all(text, "");
    let lines: Vec<String> = without_tags
        .lines()
        .map(|line| SPEAKER_REGEX.replace(line.trim(), "").into_owned())
        .filter(|line| !line.is_empty())
        .collect();
    lines.join("\n")
}

/// Ordered, non-overlapping sequence of cues
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueTrack {
    cues: Vec<Cue>,
}

impl CueTrack {
    /// Build a track, sorting by start time (stable) and rejecting overlaps
    pub fn new(mut cues: Vec<Cue>) -> Result<Self> {
        cues.sort_by_key(|cue| cue.start_ms);

        if let Some(index) = first_overlap(&cues) {
            return Err(CaptionError::InvariantViolation {
                cue_index: index,
                message: format!(
                    "cue ends at {} but the next cue starts at {}",
                    format_timestamp(cues[index].end_ms),
                    format_timestamp(cues[index + 1].start_ms)
                ),
            });
        }

        Ok(Self { cues })
    }

    /// Build a track from machine generated cues, trimming overlaps.
    ///
    /// Each cue that runs into its successor is cut at the successor's start;
    /// cues that become empty are dropped.
    pub fn reconciled(mut cues: Vec<Cue>) -> Self {
        cues.sort_by_key(|cue| cue.start_ms);

        let mut result: Vec<Cue> = Vec::with_capacity(cues.len());
        let mut iter = cues.into_iter().peekable();
        while let Some(mut cue) = iter.next() {
            if let Some(next) = iter.peek() {
                if cue.end_ms > next.start_ms {
                    cue.end_ms = next.start_ms;
                }
            }
            if cue.start_ms < cue.end_ms {
                result.push(cue);
            } else {
                debug!("Dropping cue at {}ms swallowed by its successor", cue.start_ms);
            }
        }

        Self { cues: result }
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// End of the last cue, or zero for an empty track
    pub fn end_ms(&self) -> u64 {
        self.cues.last().map_or(0, |cue| cue.end_ms)
    }

    /// Restrict the track to media of the given length
    pub fn clamp_to(&self, duration_ms: u64) -> Self {
        let cues = self
            .cues
            .iter()
            .filter(|cue| cue.start_ms < duration_ms)
            .map(|cue| Cue {
                start_ms: cue.start_ms,
                end_ms: cue.end_ms.min(duration_ms),
                text: cue.text.clone(),
            })
            .collect::<Vec<_>>();

        let dropped = self.cues.len() - cues.len();
        if dropped > 0 {
            warn!("Dropped {} cue(s) starting after the end of the media", dropped);
        }

        Self { cues }
    }

    /// Parse SRT text into a track
    pub fn parse_srt(content: &str) -> Result<Self> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let lines: Vec<&str> = content.lines().collect();

        let mut parsed: Vec<(usize, Cue)> = Vec::new();
        for block in split_blocks(&lines) {
            parsed.push(parse_block(&lines, &block)?);
        }

        // Stable sort keeps input order for cues sharing a start time
        parsed.sort_by_key(|(_, cue)| cue.start_ms);

        for pair in parsed.windows(2) {
            let (line, cue) = &pair[0];
            let (next_line, next) = &pair[1];
            if cue.end_ms > next.start_ms {
                return Err(CaptionError::format(
                    *next_line,
                    format!(
                        "cue starting at {} overlaps the cue at line {} ending at {}",
                        format_timestamp(next.start_ms),
                        line,
                        format_timestamp(cue.end_ms)
                    ),
                ));
            }
        }

        if parsed.is_empty() {
            warn!("No subtitle cues found in SRT content");
        }

        Ok(Self {
            cues: parsed.into_iter().map(|(_, cue)| cue).collect(),
        })
    }

    /// Serialize to SRT text, regenerating 1-based indices
    pub fn to_srt(&self) -> String {
        self.to_string()
    }

    /// Load a track from an SRT file
    pub fn from_srt_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CaptionError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse_srt(&content)
    }

    /// Write the track to an SRT file without ever exposing a partial file
    pub fn write_srt_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        FileManager::write_atomic(path.as_ref(), self.to_srt().as_bytes())
    }
}

impl<'a> IntoIterator for &'a CueTrack {
    type Item = &'a Cue;
    type IntoIter = std::slice::Iter<'a, Cue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}

impl fmt::Display for CueTrack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, cue) in self.cues.iter().enumerate() {
            writeln!(f, "{}", i + 1)?;
            writeln!(f, "{} --> {}", format_timestamp(cue.start_ms), format_timestamp(cue.end_ms))?;
            writeln!(f, "{}", cue.text)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

fn first_overlap(cues: &[Cue]) -> Option<usize> {
    cues.windows(2).position(|pair| pair[0].end_ms > pair[1].start_ms)
}

/// Line index ranges of the non-blank blocks.
///
/// A block is also split where an index line directly followed by a timing
/// line appears inside it, which recovers files missing a blank separator.
fn split_blocks(lines: &[&str]) -> Vec<std::ops::Range<usize>> {
    let mut blocks = Vec::new();
    let mut start: Option<usize> = None;

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                blocks.push(s..i);
            }
            continue;
        }

        match start {
            None => start = Some(i),
            Some(s) if i >= s + 2 && is_index_line(line) => {
                if lines.get(i + 1).is_some_and(|next| TIMING_REGEX.is_match(next.trim())) {
                    blocks.push(s..i);
                    start = Some(i);
                }
            }
            Some(_) => {}
        }
    }

    if let Some(s) = start {
        blocks.push(s..lines.len());
    }

    blocks
}

fn is_index_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

/// Parse one block; returns the 1-based line of its index with the cue
fn parse_block(lines: &[&str], block: &std::ops::Range<usize>) -> Result<(usize, Cue)> {
    let index_line = block.start + 1;
    let index = lines[block.start].trim();
    if !is_index_line(index) {
        return Err(CaptionError::format(
            index_line,
            format!("expected a numeric cue index, found {:?}", index),
        ));
    }

    let timing_line = index_line + 1;
    let Some(timing) = lines.get(block.start + 1).filter(|_| block.len() > 1) else {
        return Err(CaptionError::format(timing_line, "missing timing line after cue index"));
    };
    let timing = timing.trim();
    let caps = TIMING_REGEX
        .captures(timing)
        .ok_or_else(|| CaptionError::format(timing_line, format!("malformed timing line {:?}", timing)))?;

    let start_ms = timestamp_from_parts(&caps[1], &caps[2], &caps[3], &caps[4])
        .ok_or_else(|| CaptionError::format(timing_line, "invalid start timestamp"))?;
    let end_ms = timestamp_from_parts(&caps[5], &caps[6], &caps[7], &caps[8])
        .ok_or_else(|| CaptionError::format(timing_line, "invalid end timestamp"))?;

    if start_ms >= end_ms {
        return Err(CaptionError::format(
            timing_line,
            format!(
                "start {} is not before end {}",
                format_timestamp(start_ms),
                format_timestamp(end_ms)
            ),
        ));
    }

    let text = normalize_text(&lines[block.start + 2..block.end].join("\n"));
    if text.is_empty() {
        return Err(CaptionError::format(index_line, "cue has no text"));
    }
    let cue = Cue { start_ms, end_ms, text };

    Ok((index_line, cue))
}
