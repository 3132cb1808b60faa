/*!
 * Tests for the caption compiler and the filter script it feeds
 */

use std::path::Path;

use anyhow::Result;
use captionkit::compiler::{Anchor, CaptionCompiler, compile, layout_lines};
use captionkit::cue_track::{Cue, CueTrack};
use captionkit::filter_graph::{FilterGraph, PASSTHROUGH_FILTER};
use captionkit::style::{CaptionStyle, StyleConfig};
use crate::common;

const HELLO_SRT: &str = "1\n00:00:00,000 --> 00:00:02,000\nHello\n\n";

fn style(config: StyleConfig) -> Result<CaptionStyle> {
    Ok(CaptionStyle::from_config(&config)?)
}

fn static_style() -> Result<CaptionStyle> {
    style(StyleConfig {
        animation: "none".to_string(),
        ..StyleConfig::default()
    })
}

/// Test that a static style compiles a cue to one instruction over its window
#[test]
fn test_compile_withStaticStyle_shouldEmitOneInstruction() -> Result<()> {
    let track = CueTrack::parse_srt(HELLO_SRT)?;
    let instructions = compile(&track, &static_style()?)?;

    assert_eq!(instructions.len(), 1);
    let instruction = &instructions[0];
    assert_eq!(instruction.cue_index, 0);
    assert_eq!((instruction.start_ms, instruction.end_ms), (0, 2_000));
    assert_eq!(instruction.lines, vec!["Hello".to_string()]);
    assert_eq!(instruction.geometry.scale, 1.0);
    Ok(())
}

/// Test that a bounce style expands the cue into contiguous sub-windows
#[test]
fn test_compile_withBounceStyle_shouldPartitionCue() -> Result<()> {
    let track = CueTrack::parse_srt(HELLO_SRT)?;
    let instructions = compile(&track, &CaptionStyle::default())?;

    assert!(instructions.len() > 1);
    assert_eq!(instructions[0].start_ms, 0);
    assert_eq!(instructions[instructions.len() - 1].end_ms, 2_000);
    for pair in instructions.windows(2) {
        assert_eq!(pair[0].end_ms, pair[1].start_ms);
    }
    assert_eq!(instructions[0].geometry.scale, 1.0);
    assert_eq!(instructions[instructions.len() - 1].geometry.scale, 1.0);
    assert!(instructions.iter().all(|i| i.lines == vec!["Hello".to_string()]));
    Ok(())
}

/// Test that a very short cue compiles to a single instruction under bounce
#[test]
fn test_compile_withShortCueAndBounce_shouldEmitOneInstruction() -> Result<()> {
    let track = CueTrack::new(vec![Cue::new(0, 100, "Hi")?])?;
    let instructions = compile(&track, &CaptionStyle::default())?;

    assert_eq!(instructions.len(), 1);
    assert_eq!((instructions[0].start_ms, instructions[0].end_ms), (0, 100));
    Ok(())
}

/// Test that a static style yields one instruction per cue across a track
#[test]
fn test_compile_withStaticStyle_shouldMatchCueCount() -> Result<()> {
    let track = CueTrack::parse_srt(crate::common::SAMPLE_SRT)?;
    let instructions = compile(&track, &static_style()?)?;

    assert_eq!(instructions.len(), track.len());
    for (instruction, cue) in instructions.iter().zip(track.iter()) {
        assert_eq!((instruction.start_ms, instruction.end_ms), (cue.start_ms(), cue.end_ms()));
    }
    Ok(())
}

/// Test that compilation is deterministic down to the filter script
#[test]
fn test_compile_withSameInput_shouldBeIdentical() -> Result<()> {
    let track = CueTrack::parse_srt(crate::common::SAMPLE_SRT)?;
    let style = CaptionStyle::preset("karaoke")?;
    let compiler = CaptionCompiler::new(&style)?;

    let first = compiler.compile(&track)?;
    let second = compiler.compile(&track)?;
    assert_eq!(first, second);
    assert_eq!(
        FilterGraph::build(&first, &style, None),
        FilterGraph::build(&second, &style, None)
    );
    Ok(())
}

/// Test that only geometry varies between a cue's sub-windows
#[test]
fn test_compile_withBounce_shouldOnlyVaryGeometry() -> Result<()> {
    let track = CueTrack::parse_srt(HELLO_SRT)?;
    let instructions = compile(&track, &CaptionStyle::default())?;

    let scales: Vec<f64> = instructions.iter().map(|i| i.geometry.scale).collect();
    assert!(scales.iter().any(|s| *s > 1.0));
    assert!(instructions.iter().all(|i| i.geometry.anchor == Anchor::Bottom));
    assert!(instructions.iter().all(|i| i.cue_index == 0));
    Ok(())
}

/// Test that an explicit offset overrides the named position
#[test]
fn test_compile_withOffset_shouldAnchorAtFraction() -> Result<()> {
    let style = style(StyleConfig {
        offset: Some(0.25),
        animation: "none".to_string(),
        ..StyleConfig::default()
    })?;
    let track = CueTrack::parse_srt(HELLO_SRT)?;

    let instructions = compile(&track, &style)?;
    assert_eq!(instructions[0].geometry.anchor, Anchor::Offset(0.25));
    Ok(())
}

/// Test wrapping and label stripping during layout
#[test]
fn test_layout_lines_withLongLabelledText_shouldWrapAndStrip() {
    let layout = CaptionStyle::preset("karaoke").map(|s| s.layout()).unwrap();
    let lines = layout_lines("Speaker B: this sentence is rather long for karaoke", &layout);

    assert_eq!(lines, vec!["this sentence is", "rather long for", "karaoke"]);
    assert!(lines.iter().all(|l| l.chars().count() <= layout.max_line_chars));
}

/// Test the drawtext script for a single static cue
#[test]
fn test_filter_graph_withStaticCue_shouldWriteDrawtext() -> Result<()> {
    let style = static_style()?;
    let track = CueTrack::parse_srt("1\n00:00:01,500 --> 00:00:02,000\nIt's 100%: done\n")?;
    let instructions = compile(&track, &style)?;

    let script = FilterGraph::build(&instructions, &style, Some(Path::new("/fonts/Montserrat-Bold.ttf")));

    assert_eq!(script.lines().count(), 1);
    let filters = common::parse_filter_script(&script);
    assert_eq!(filters.len(), 1);
    let drawtext = &filters[0];
    assert_eq!(drawtext.name, "drawtext");
    assert_eq!(drawtext.option("fontfile"), Some("/fonts/Montserrat-Bold.ttf"));
    assert_eq!(drawtext.text().as_deref(), Some("It's 100%: done"));
    assert_eq!(drawtext.option("fontsize"), Some("72"));
    assert_eq!(drawtext.option("fontcolor"), Some("0xFFFFFFFF"));
    assert_eq!(drawtext.option("bordercolor"), Some("0x000000FF"));
    assert_eq!(drawtext.option("x"), Some("(w-text_w)/2"));
    assert_eq!(drawtext.option("y"), Some("h-86-60+0"));
    assert_eq!(drawtext.option("enable"), Some("gte(t,1.500)*lt(t,2.000)"));
    assert_eq!(drawtext.options.last().map(|(k, _)| k.as_str()), Some("enable"));
    Ok(())
}

/// Test that quotes, separators and expansion characters survive both ffmpeg parsing levels
#[test]
fn test_filter_graph_withSpecialCharacters_shouldKeepTextAndGating() -> Result<()> {
    let style = static_style()?;
    let texts = [
        "Don't stop",
        "Note: hello",
        "50% [off], today; only",
        r"back\slash 'quoted'",
        "%{pts} stays literal",
    ];

    for text in texts {
        let track = CueTrack::parse_srt(&format!("1\n00:00:01,000 --> 00:00:02,000\n{}\n", text))?;
        let script = FilterGraph::build(
            &compile(&track, &style)?,
            &style,
            Some(Path::new("/fonts/it's, [odd]:name.ttf")),
        );

        let filters = common::parse_filter_script(&script);
        assert_eq!(filters.len(), 1, "{}", script);
        let drawtext = &filters[0];
        let keys: Vec<&str> = drawtext.options.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["fontfile", "text", "fontsize", "fontcolor", "borderw", "bordercolor", "x", "y", "enable"]
        );
        assert_eq!(drawtext.text().as_deref(), Some(text));
        assert_eq!(drawtext.option("fontfile"), Some("/fonts/it's, [odd]:name.ttf"));
        assert_eq!(drawtext.option("enable"), Some("gte(t,1.000)*lt(t,2.000)"));
    }
    Ok(())
}

/// Test that multi-line cues produce one filter per line
#[test]
fn test_filter_graph_withTwoLines_shouldStackLines() -> Result<()> {
    let style = style(StyleConfig {
        animation: "none".to_string(),
        position: "top".to_string(),
        ..StyleConfig::default()
    })?;
    let track = CueTrack::parse_srt("1\n00:00:00,000 --> 00:00:01,000\nfirst\nsecond\n")?;
    let script = FilterGraph::build(&compile(&track, &style)?, &style, None);

    let filters = common::parse_filter_script(&script);
    assert_eq!(filters.len(), 2);
    assert_eq!(filters[0].option("font"), Some("Montserrat"));
    assert_eq!(filters[0].text().as_deref(), Some("first"));
    assert_eq!(filters[0].option("y"), Some("60"));
    assert_eq!(filters[1].text().as_deref(), Some("second"));
    assert_eq!(filters[1].option("y"), Some("146"));
    Ok(())
}

/// Test that an empty track renders as a passthrough filter
#[test]
fn test_filter_graph_withNoInstructions_shouldPassThrough() {
    assert_eq!(FilterGraph::build(&[], &CaptionStyle::default(), None), PASSTHROUGH_FILTER);
}
