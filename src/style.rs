/*!
 * Caption style descriptor.
 *
 * `StyleConfig` is the raw, serializable configuration surface. It is turned
 * into an immutable `CaptionStyle` through a fallible constructor that reports
 * every invalid field at once. Named presets are pre-validated styles.
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{CaptionError, Result, StyleViolation};

/// Upper bound accepted for `max_overshoot`; larger bounces leave the safe area
pub const OVERSHOOT_CEILING: f64 = 0.5;

/// Minimum number of bounce sub-windows (rise, fall, settle)
pub const MIN_BOUNCE_KEYFRAMES: u32 = 3;

/// An RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// Resolve a color name, `#RRGGBB[AA]`, `0xRRGGBB[AA]` or ASS `&H[AA]BBGGRR&`
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(color) = Self::named(&value.to_lowercase()) {
            return Some(color);
        }

        if let Some(hex) = value.strip_prefix('#').or_else(|| value.strip_prefix("0x")) {
            return Self::from_rgba_hex(hex);
        }

        let upper = value.to_uppercase();
        if let Some(hex) = upper.strip_prefix("&H") {
            return Self::from_ass_hex(hex.trim_end_matches('&'));
        }

        None
    }

    fn named(name: &str) -> Option<Self> {
        let color = match name {
            "white" => Self::rgb(0xFF, 0xFF, 0xFF),
            "black" => Self::rgb(0x00, 0x00, 0x00),
            "yellow" => Self::rgb(0xFF, 0xFF, 0x00),
            "red" => Self::rgb(0xFF, 0x00, 0x00),
            "blue" => Self::rgb(0x00, 0x00, 0xFF),
            "green" => Self::rgb(0x00, 0xFF, 0x00),
            "purple" => Self::rgb(0x80, 0x00, 0x80),
            "orange" => Self::rgb(0xFF, 0xA5, 0x00),
            "cyan" => Self::rgb(0x00, 0xFF, 0xFF),
            "magenta" => Self::rgb(0xFF, 0x00, 0xFF),
            "gray" | "grey" => Self::rgb(0x80, 0x80, 0x80),
            _ => return None,
        };
        Some(color)
    }

    fn from_rgba_hex(hex: &str) -> Option<Self> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => None,
        }
    }

    // ASS stores blue first and alpha as transparency (00 = opaque)
    fn from_ass_hex(hex: &str) -> Option<Self> {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(byte(&hex[4..6])?, byte(&hex[2..4])?, byte(&hex[0..2])?)),
            8 => Some(Self {
                r: byte(&hex[6..8])?,
                g: byte(&hex[4..6])?,
                b: byte(&hex[2..4])?,
                a: 0xFF - byte(&hex[0..2])?,
            }),
            _ => None,
        }
    }

    /// Color in the `0xRRGGBBAA` syntax accepted by ffmpeg filters
    pub fn to_ffmpeg(&self) -> String {
        format!("0x{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 0xFF {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Vertical anchor of the caption block
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerticalPosition {
    Top,
    Middle,
    #[default]
    Bottom,
}

impl fmt::Display for VerticalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Bottom => "bottom",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for VerticalPosition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "middle" | "center" => Ok(Self::Middle),
            "bottom" => Ok(Self::Bottom),
            other => Err(format!("unknown position {:?} (expected top, middle or bottom)", other)),
        }
    }
}

/// Animation applied to each cue
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    None,
    #[default]
    Bounce,
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Bounce => write!(f, "bounce"),
        }
    }
}

impl FromStr for AnimationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "bounce" => Ok(Self::Bounce),
            other => Err(format!("unknown animation {:?} (expected none or bounce)", other)),
        }
    }
}

/// Bounce animation tuning
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BounceConfig {
    /// Number of sub-windows each cue is split into
    #[serde(default = "default_keyframes")]
    pub keyframes: u32,

    /// Peak scale deviation from 1.0
    #[serde(default = "default_overshoot")]
    pub overshoot: f64,

    /// Largest overshoot allowed before captions risk leaving the safe area
    #[serde(default = "default_max_overshoot")]
    pub max_overshoot: f64,
}

impl Default for BounceConfig {
    fn default() -> Self {
        Self {
            keyframes: default_keyframes(),
            overshoot: default_overshoot(),
            max_overshoot: default_max_overshoot(),
        }
    }
}

/// Text layout settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Wrap lines longer than this many characters
    #[serde(default = "default_max_line_chars")]
    pub max_line_chars: usize,

    /// Line height as a multiple of the font size
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f64,

    /// Distance in pixels from the top/bottom frame edge
    #[serde(default = "default_margin")]
    pub margin: u32,

    /// Remove `<font>` tags and "Speaker X:" prefixes before drawing
    #[serde(default = "default_true")]
    pub strip_speaker_labels: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_line_chars: default_max_line_chars(),
            line_spacing: default_line_spacing(),
            margin: default_margin(),
            strip_speaker_labels: default_true(),
        }
    }
}

/// Raw caption style as read from configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StyleConfig {
    #[serde(default = "default_font")]
    pub font: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_outline_color")]
    pub outline_color: String,

    #[serde(default = "default_outline_width")]
    pub outline_width: f64,

    #[serde(default = "default_position")]
    pub position: String,

    /// Explicit vertical center as a fraction of frame height, overrides `position`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,

    #[serde(default = "default_animation")]
    pub animation: String,

    #[serde(default)]
    pub bounce: BounceConfig,

    #[serde(default)]
    pub layout: LayoutConfig,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font: default_font(),
            font_size: default_font_size(),
            color: default_color(),
            outline_color: default_outline_color(),
            outline_width: default_outline_width(),
            position: default_position(),
            offset: None,
            animation: default_animation(),
            bounce: BounceConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

fn default_font() -> String {
    "Montserrat".to_string()
}

fn default_font_size() -> u32 {
    72
}

fn default_color() -> String {
    "white".to_string()
}

fn default_outline_color() -> String {
    "black".to_string()
}

fn default_outline_width() -> f64 {
    2.0
}

fn default_position() -> String {
    "bottom".to_string()
}

fn default_animation() -> String {
    "bounce".to_string()
}

fn default_keyframes() -> u32 {
    8
}

fn default_overshoot() -> f64 {
    0.15
}

fn default_max_overshoot() -> f64 {
    0.25
}

fn default_max_line_chars() -> usize {
    32
}

fn default_line_spacing() -> f64 {
    1.2
}

fn default_margin() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

/// Validated bounce parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceParams {
    pub keyframes: u32,
    pub overshoot: f64,
    pub max_overshoot: f64,
}

/// Validated layout parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub max_line_chars: usize,
    pub line_spacing: f64,
    pub margin: u32,
    pub strip_speaker_labels: bool,
}

/// Immutable, validated caption style shared by every cue of a render
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionStyle {
    font: String,
    font_size: u32,
    text_color: Color,
    outline_color: Color,
    outline_width: f64,
    position: VerticalPosition,
    offset: Option<f64>,
    animation: AnimationKind,
    bounce: BounceParams,
    layout: Layout,
}

impl CaptionStyle {
    /// Validate a raw style, collecting every violation
    pub fn from_config(config: &StyleConfig) -> Result<Self> {
        let mut violations = Vec::new();

        let font = config.font.trim();
        if font.is_empty() {
            violations.push(StyleViolation::new("font", "font name must not be empty"));
        }

        if config.font_size == 0 {
            violations.push(StyleViolation::new("font_size", "font size must be positive"));
        }

        let text_color = Color::parse(&config.color);
        if text_color.is_none() {
            violations.push(StyleViolation::new(
                "color",
                format!("cannot resolve color {:?}", config.color),
            ));
        }

        let outline_color = Color::parse(&config.outline_color);
        if outline_color.is_none() {
            violations.push(StyleViolation::new(
                "outline_color",
                format!("cannot resolve color {:?}", config.outline_color),
            ));
        }

        if !config.outline_width.is_finite() || config.outline_width < 0.0 {
            violations.push(StyleViolation::new(
                "outline_width",
                format!("must be a non-negative number, got {}", config.outline_width),
            ));
        }

        let position = config
            .position
            .parse::<VerticalPosition>()
            .map_err(|e| violations.push(StyleViolation::new("position", e)))
            .ok();

        if let Some(offset) = config.offset {
            if !(0.0..=1.0).contains(&offset) {
                violations.push(StyleViolation::new(
                    "offset",
                    format!("must be a fraction between 0 and 1, got {}", offset),
                ));
            }
        }

        let animation = config
            .animation
            .parse::<AnimationKind>()
            .map_err(|e| violations.push(StyleViolation::new("animation", e)))
            .ok();

        let bounce = &config.bounce;
        if bounce.keyframes < MIN_BOUNCE_KEYFRAMES {
            violations.push(StyleViolation::new(
                "bounce.keyframes",
                format!("must be at least {}, got {}", MIN_BOUNCE_KEYFRAMES, bounce.keyframes),
            ));
        }
        let max_overshoot_valid = bounce.max_overshoot > 0.0 && bounce.max_overshoot <= OVERSHOOT_CEILING;
        if !max_overshoot_valid {
            violations.push(StyleViolation::new(
                "bounce.max_overshoot",
                format!("must be in (0, {}], got {}", OVERSHOOT_CEILING, bounce.max_overshoot),
            ));
        }
        if !(bounce.overshoot > 0.0 && bounce.overshoot <= bounce.max_overshoot.min(OVERSHOOT_CEILING)) {
            violations.push(StyleViolation::new(
                "bounce.overshoot",
                format!(
                    "must be in (0, {}], got {}",
                    bounce.max_overshoot.min(OVERSHOOT_CEILING),
                    bounce.overshoot
                ),
            ));
        }

        let layout = &config.layout;
        if layout.max_line_chars == 0 {
            violations.push(StyleViolation::new("layout.max_line_chars", "must be positive"));
        }
        if !layout.line_spacing.is_finite() || layout.line_spacing <= 0.0 {
            violations.push(StyleViolation::new(
                "layout.line_spacing",
                format!("must be positive, got {}", layout.line_spacing),
            ));
        }

        match (text_color, outline_color, position, animation) {
            (Some(text_color), Some(outline_color), Some(position), Some(animation)) if violations.is_empty() => {
                Ok(Self {
                    font: font.to_string(),
                    font_size: config.font_size,
                    text_color,
                    outline_color,
                    outline_width: config.outline_width,
                    position,
                    offset: config.offset,
                    animation,
                    bounce: BounceParams {
                        keyframes: bounce.keyframes,
                        overshoot: bounce.overshoot,
                        max_overshoot: bounce.max_overshoot,
                    },
                    layout: Layout {
                        max_line_chars: layout.max_line_chars,
                        line_spacing: layout.line_spacing,
                        margin: layout.margin,
                        strip_speaker_labels: layout.strip_speaker_labels,
                    },
                })
            }
            _ => Err(CaptionError::InvalidStyle { violations }),
        }
    }

    /// Look up a named preset
    pub fn preset(name: &str) -> Result<Self> {
        let config = preset_config(name).ok_or_else(|| CaptionError::UnknownPreset(name.to_string()))?;
        Self::from_config(&config)
    }

    pub fn font(&self) -> &str {
        &self.font
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    pub fn text_color(&self) -> Color {
        self.text_color
    }

    pub fn outline_color(&self) -> Color {
        self.outline_color
    }

    pub fn outline_width(&self) -> f64 {
        self.outline_width
    }

    pub fn position(&self) -> VerticalPosition {
        self.position
    }

    pub fn offset(&self) -> Option<f64> {
        self.offset
    }

    pub fn animation(&self) -> AnimationKind {
        self.animation
    }

    pub fn bounce(&self) -> BounceParams {
        self.bounce
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Raw configuration equivalent of this style
    pub fn to_config(&self) -> StyleConfig {
        StyleConfig {
            font: self.font.clone(),
            font_size: self.font_size,
            color: self.text_color.to_string(),
            outline_color: self.outline_color.to_string(),
            outline_width: self.outline_width,
            position: self.position.to_string(),
            offset: self.offset,
            animation: self.animation.to_string(),
            bounce: BounceConfig {
                keyframes: self.bounce.keyframes,
                overshoot: self.bounce.overshoot,
                max_overshoot: self.bounce.max_overshoot,
            },
            layout: LayoutConfig {
                max_line_chars: self.layout.max_line_chars,
                line_spacing: self.layout.line_spacing,
                margin: self.layout.margin,
                strip_speaker_labels: self.layout.strip_speaker_labels,
            },
        }
    }
}

impl Default for CaptionStyle {
    fn default() -> Self {
        // Mirrors StyleConfig::default(), kept in sync by test
        Self {
            font: default_font(),
            font_size: default_font_size(),
            text_color: Color::rgb(0xFF, 0xFF, 0xFF),
            outline_color: Color::rgb(0, 0, 0),
            outline_width: default_outline_width(),
            position: VerticalPosition::Bottom,
            offset: None,
            animation: AnimationKind::Bounce,
            bounce: BounceParams {
                keyframes: default_keyframes(),
                overshoot: default_overshoot(),
                max_overshoot: default_max_overshoot(),
            },
            layout: Layout {
                max_line_chars: default_max_line_chars(),
                line_spacing: default_line_spacing(),
                margin: default_margin(),
                strip_speaker_labels: default_true(),
            },
        }
    }
}

impl TryFrom<&StyleConfig> for CaptionStyle {
    type Error = CaptionError;

    fn try_from(config: &StyleConfig) -> Result<Self> {
        Self::from_config(config)
    }
}

/// Names of the built-in presets
pub fn preset_names() -> &'static [&'static str] {
    &["default", "classic", "minimal", "karaoke"]
}

fn preset_config(name: &str) -> Option<StyleConfig> {
    let config = match name.trim().to_lowercase().as_str() {
        "default" => StyleConfig::default(),
        "classic" => StyleConfig {
            font: "Arial".to_string(),
            font_size: 48,
            outline_width: 1.5,
            animation: "none".to_string(),
            ..StyleConfig::default()
        },
        "minimal" => StyleConfig {
            font: "Helvetica".to_string(),
            font_size: 40,
            outline_width: 0.0,
            animation: "none".to_string(),
            layout: LayoutConfig {
                margin: 40,
                ..LayoutConfig::default()
            },
            ..StyleConfig::default()
        },
        "karaoke" => StyleConfig {
            font: "Komika Axis".to_string(),
            font_size: 96,
            color: "yellow".to_string(),
            outline_width: 4.0,
            position: "middle".to_string(),
            bounce: BounceConfig {
                keyframes: 10,
                overshoot: 0.2,
                max_overshoot: 0.25,
            },
            layout: LayoutConfig {
                max_line_chars: 18,
                ..LayoutConfig::default()
            },
            ..StyleConfig::default()
        },
        _ => return None,
    };
    Some(config)
}
