/*!
 * Tests for caption style validation and presets
 */

use anyhow::Result;
use captionkit::errors::{CaptionError, ErrorKind};
use captionkit::style::{AnimationKind, CaptionStyle, Color, StyleConfig, VerticalPosition, preset_names};

/// Test that the default config validates to the default style
#[test]
fn test_from_config_withDefaults_shouldSucceed() -> Result<()> {
    let style = CaptionStyle::from_config(&StyleConfig::default())?;

    assert_eq!(style.font(), "Montserrat");
    assert_eq!(style.text_color(), Color::rgb(255, 255, 255));
    assert_eq!(style.position(), VerticalPosition::Bottom);
    assert_eq!(style.animation(), AnimationKind::Bounce);
    Ok(())
}

/// Test that a negative outline width is reported by field name
#[test]
fn test_from_config_withNegativeOutline_shouldNameOutlineWidth() {
    let config = StyleConfig {
        outline_width: -1.0,
        ..StyleConfig::default()
    };
    let err = CaptionStyle::from_config(&config).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidStyle);
    assert_eq!(err.style_fields(), vec!["outline_width"]);
    assert!(err.to_string().contains("outline_width"));
}

/// Test that every invalid field is reported, not just the first
#[test]
fn test_from_config_withSeveralInvalidFields_shouldReportAll() {
    let config = StyleConfig {
        font: "  ".to_string(),
        color: "not-a-color".to_string(),
        outline_width: -2.0,
        position: "left".to_string(),
        animation: "wobble".to_string(),
        ..StyleConfig::default()
    };
    let err = CaptionStyle::from_config(&config).unwrap_err();

    let fields = err.style_fields();
    for expected in ["font", "color", "outline_width", "position", "animation"] {
        assert!(fields.contains(&expected), "missing {} in {:?}", expected, fields);
    }
}

/// Test that bounce and layout parameters are validated
#[test]
fn test_from_config_withBadBounceAndLayout_shouldFail() {
    let mut config = StyleConfig::default();
    config.bounce.keyframes = 2;
    config.bounce.overshoot = 0.4;
    config.layout.max_line_chars = 0;
    let err = CaptionStyle::from_config(&config).unwrap_err();

    let fields = err.style_fields();
    assert!(fields.contains(&"bounce.keyframes"));
    assert!(fields.contains(&"bounce.overshoot"));
    assert!(fields.contains(&"layout.max_line_chars"));
}

/// Test that an explicit offset must be a frame fraction
#[test]
fn test_from_config_withOffsetOutOfRange_shouldFail() {
    let config = StyleConfig {
        offset: Some(1.5),
        ..StyleConfig::default()
    };
    let err = CaptionStyle::from_config(&config).unwrap_err();
    assert_eq!(err.style_fields(), vec!["offset"]);
}

/// Test that an overshoot above the configured maximum is rejected
#[test]
fn test_from_config_withOvershootAboveMax_shouldFail() {
    let mut config = StyleConfig::default();
    config.bounce.max_overshoot = 0.1;
    config.bounce.overshoot = 0.15;

    let err = CaptionStyle::from_config(&config).unwrap_err();
    assert_eq!(err.style_fields(), vec!["bounce.overshoot"]);
}

/// Test enum parsing aliases and case handling
#[test]
fn test_from_config_withCaseAndAliases_shouldNormalize() -> Result<()> {
    let config = StyleConfig {
        position: "Center".to_string(),
        animation: "NONE".to_string(),
        ..StyleConfig::default()
    };
    let style = CaptionStyle::from_config(&config)?;

    assert_eq!(style.position(), VerticalPosition::Middle);
    assert_eq!(style.animation(), AnimationKind::None);
    Ok(())
}

/// Test the accepted color syntaxes
#[test]
fn test_color_parse_withSupportedSyntaxes_shouldResolve() {
    assert_eq!(Color::parse("Yellow"), Some(Color::rgb(255, 255, 0)));
    assert_eq!(Color::parse("#FF8000"), Some(Color::rgb(255, 128, 0)));
    assert_eq!(Color::parse("0x00000080").map(|c| c.a), Some(0x80));
    assert_eq!(Color::parse("&H0000FF&"), Some(Color::rgb(255, 0, 0)));
    assert_eq!(Color::parse("#12345"), None);
    assert_eq!(Color::parse("chartreuse-ish"), None);
}

/// Test the ffmpeg color syntax
#[test]
fn test_color_to_ffmpeg_shouldIncludeAlpha() {
    assert_eq!(Color::rgb(255, 128, 0).to_ffmpeg(), "0xFF8000FF");
}

/// Test that all presets resolve and differ from each other
#[test]
fn test_preset_withKnownNames_shouldResolve() -> Result<()> {
    let default = CaptionStyle::preset("default")?;
    assert_eq!(default, CaptionStyle::default());

    let classic = CaptionStyle::preset("Classic")?;
    assert_eq!(classic.animation(), AnimationKind::None);

    let karaoke = CaptionStyle::preset("karaoke")?;
    assert_eq!(karaoke.position(), VerticalPosition::Middle);
    assert_eq!(karaoke.bounce().keyframes, 10);

    assert_eq!(preset_names().len(), 4);
    Ok(())
}

/// Test that an unknown preset fails instead of falling back
#[test]
fn test_preset_withUnknownName_shouldFail() {
    let err = CaptionStyle::preset("neon").unwrap_err();
    assert!(matches!(err, CaptionError::UnknownPreset(ref name) if name == "neon"));
}

/// Test that a style converts back to an equivalent config
#[test]
fn test_to_config_withPreset_shouldValidateToSameStyle() -> Result<()> {
    for name in preset_names() {
        let style = CaptionStyle::preset(name)?;
        let rebuilt = CaptionStyle::try_from(&style.to_config())?;
        assert_eq!(rebuilt, style, "preset {}", name);
    }
    Ok(())
}

/// Test that a partial JSON style fills the remaining fields with defaults
#[test]
fn test_style_config_withPartialJson_shouldUseDefaults() -> Result<()> {
    let config: StyleConfig = serde_json::from_str(r#"{"font": "Arial", "bounce": {"keyframes": 5}}"#)?;

    assert_eq!(config.font, "Arial");
    assert_eq!(config.font_size, 72);
    assert_eq!(config.bounce.keyframes, 5);
    assert_eq!(config.bounce.overshoot, 0.15);
    Ok(())
}
