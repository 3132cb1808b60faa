/*!
 * Caption compiler.
 *
 * Turns a cue track and a caption style into the ordered list of render
 * instructions consumed by the filter graph writer. Compilation is pure:
 * the same track and style always produce the same instructions.
 */

use log::debug;

use crate::animation::{Animation, Frame};
use crate::cue_track::{Cue, CueTrack, strip_markup};
use crate::errors::{CaptionError, Result};
use crate::style::{CaptionStyle, Layout, VerticalPosition};

/// Where a caption block is anchored vertically
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    Top,
    Middle,
    Bottom,
    /// Block center as a fraction of frame height from the top
    Offset(f64),
}

impl Anchor {
    fn for_style(style: &CaptionStyle) -> Self {
        match (style.offset(), style.position()) {
            (Some(offset), _) => Self::Offset(offset),
            (None, VerticalPosition::Top) => Self::Top,
            (None, VerticalPosition::Middle) => Self::Middle,
            (None, VerticalPosition::Bottom) => Self::Bottom,
        }
    }
}

/// Per-instruction placement; only this varies across a cue's sub-windows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub anchor: Anchor,
    pub scale: f64,
    /// Font size after scaling, in pixels
    pub font_size: u32,
    /// Distance between baselines, in pixels
    pub line_height: u32,
}

/// One timed draw command
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInstruction {
    /// Position of the source cue in its track
    pub cue_index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub geometry: Geometry,
    pub lines: Vec<String>,
}

/// Compiles cue tracks for one caption style
#[derive(Debug)]
pub struct CaptionCompiler<'a> {
    style: &'a CaptionStyle,
    animation: Animation,
    anchor: Anchor,
}

impl<'a> CaptionCompiler<'a> {
    pub fn new(style: &'a CaptionStyle) -> Result<Self> {
        Ok(Self {
            style,
            animation: Animation::for_style(style)?,
            anchor: Anchor::for_style(style),
        })
    }

    /// Compile a whole track; any broken cue fails the whole compilation
    pub fn compile(&self, track: &CueTrack) -> Result<Vec<RenderInstruction>> {
        let layout = self.style.layout();
        let mut instructions = Vec::with_capacity(track.len());
        let mut previous_end = 0;

        for (cue_index, cue) in track.iter().enumerate() {
            let frames = self.animation.expand(cue);
            verify_windows(cue_index, cue, &frames)?;

            if frames[0].start_ms < previous_end {
                return Err(CaptionError::InvariantViolation {
                    cue_index,
                    message: format!(
                        "starts at {}ms before the previous cue ends at {}ms",
                        frames[0].start_ms, previous_end
                    ),
                });
            }
            previous_end = cue.end_ms();

            let lines = layout_lines(cue.text(), &layout);
            for frame in frames {
                instructions.push(RenderInstruction {
                    cue_index,
                    start_ms: frame.start_ms,
                    end_ms: frame.end_ms,
                    geometry: self.geometry(frame.scale),
                    lines: lines.clone(),
                });
            }
        }

        debug!(
            "Compiled {} cues into {} render instructions",
            track.len(),
            instructions.len()
        );
        Ok(instructions)
    }

    fn geometry(&self, scale: f64) -> Geometry {
        let font_size = (f64::from(self.style.font_size()) * scale).round().max(1.0) as u32;
        let line_height = (f64::from(font_size) * self.style.layout().line_spacing).round() as u32;
        Geometry {
            anchor: self.anchor,
            scale,
            font_size,
            line_height,
        }
    }
}

/// Compile `track` with `style`
pub fn compile(track: &CueTrack, style: &CaptionStyle) -> Result<Vec<RenderInstruction>> {
    CaptionCompiler::new(style)?.compile(track)
}

/// Frames must be non-empty, contiguous and cover the cue window exactly
pub(crate) fn verify_windows(cue_index: usize, cue: &Cue, frames: &[Frame]) -> Result<()> {
    let violation = |message: String| CaptionError::InvariantViolation { cue_index, message };

    let (Some(first), Some(last)) = (frames.first(), frames.last()) else {
        return Err(violation("animation produced no frames".to_string()));
    };
    if first.start_ms != cue.start_ms() || last.end_ms != cue.end_ms() {
        return Err(violation(format!(
            "frames cover [{}, {}) instead of [{}, {})",
            first.start_ms,
            last.end_ms,
            cue.start_ms(),
            cue.end_ms()
        )));
    }
    for (i, frame) in frames.iter().enumerate() {
        if frame.start_ms >= frame.end_ms {
            return Err(violation(format!("frame {} has an empty window", i)));
        }
    }
    for (i, pair) in frames.windows(2).enumerate() {
        if pair[0].end_ms != pair[1].start_ms {
            return Err(violation(format!(
                "frames {} and {} leave a gap or overlap ({}ms vs {}ms)",
                i,
                i + 1,
                pair[0].end_ms,
                pair[1].start_ms
            )));
        }
    }
    Ok(())
}

/// Strip markup if configured and wrap each line of the cue
pub fn layout_lines(text: &str, layout: &Layout) -> Vec<String> {
    let text = if layout.strip_speaker_labels {
        strip_markup(text)
    } else {
        text.to_string()
    };

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .flat_map(|line| wrap(line, layout.max_line_chars))
        .collect()
}

/// Greedy word wrap; words longer than the limit stay whole
pub fn wrap(line: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
