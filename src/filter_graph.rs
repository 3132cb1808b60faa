//! Serializes render instructions into an ffmpeg `drawtext` filter script.
//!
//! Every rendered line becomes one `drawtext` filter gated by an `enable`
//! expression over its half-open window. The output is plain text so it can
//! be handed to ffmpeg through `-filter_script:v`.

use std::path::Path;

use crate::compiler::{Anchor, RenderInstruction};
use crate::style::CaptionStyle;

/// Filter used when there is nothing to draw
pub const PASSTHROUGH_FILTER: &str = "null";

/// Escape drawtext's own text expansion, where `%{...}` calls a function
fn escape_drawtext_text(raw: &str) -> String {
    raw.replace('\\', r"\\").replace('%', r"\%")
}

/// Quote a value for the option parser, which splits on `:`.
/// Inside quotes everything is literal, so a `'` closes, escapes and reopens.
fn quote_option(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

/// Escape a whole argument list for the graph parser, which splits filters
/// on `,` and `;`, reads `[...]` as link labels and strips one escape level.
fn escape_graph_args(args: &str) -> String {
    let mut escaped = String::with_capacity(args.len() + args.len() / 4);
    for c in args.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Milliseconds as seconds with exactly three decimals
fn seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

pub struct FilterGraph;

impl FilterGraph {
    /// Build the filter script for a compiled caption track
    pub fn build(instructions: &[RenderInstruction], style: &CaptionStyle, fontfile: Option<&Path>) -> String {
        if instructions.is_empty() {
            return PASSTHROUGH_FILTER.to_string();
        }

        let font = match fontfile {
            Some(path) => format!("fontfile={}", quote_option(&path.to_string_lossy())),
            None => format!("font={}", quote_option(style.font())),
        };
        let fontcolor = style.text_color().to_ffmpeg();
        let bordercolor = style.outline_color().to_ffmpeg();
        let borderw = style.outline_width().round() as u32;
        let margin = style.layout().margin;

        let mut filters = Vec::new();
        for instruction in instructions {
            let geometry = &instruction.geometry;
            let line_height = u64::from(geometry.line_height);
            let block = line_height * instruction.lines.len() as u64;
            let enable = format!(
                "enable={}",
                quote_option(&format!(
                    "gte(t,{})*lt(t,{})",
                    seconds(instruction.start_ms),
                    seconds(instruction.end_ms)
                ))
            );

            for (k, line) in instruction.lines.iter().enumerate() {
                let line_offset = k as u64 * line_height;
                let y = match geometry.anchor {
                    Anchor::Top => format!("{}", u64::from(margin) + line_offset),
                    Anchor::Middle => format!("(h-{})/2+{}", block, line_offset),
                    Anchor::Bottom => format!("h-{}-{}+{}", block, margin, line_offset),
                    Anchor::Offset(fraction) => format!("h*{:.4}-{}+{}", fraction, block / 2, line_offset),
                };

                let args = format!(
                    "{}:text={}:fontsize={}:fontcolor={}:borderw={}:bordercolor={}:x=(w-text_w)/2:y={}:{}",
                    font,
                    quote_option(&escape_drawtext_text(line)),
                    geometry.font_size,
                    fontcolor,
                    borderw,
                    bordercolor,
                    y,
                    enable
                );
                filters.push(format!("drawtext={}", escape_graph_args(&args)));
            }
        }

        filters.join(",\n")
    }
}
