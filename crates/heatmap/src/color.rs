//! RGBA colors and CSS-style color parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HeatmapError, HeatmapResult};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "ColorSpec", into = "ColorSpec")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse a CSS-like color: `#rgb`, `#rrggbb`, `#rrggbbaa` or a named color.
    pub fn parse(s: &str) -> HeatmapResult<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| HeatmapError::InvalidColor(s.to_string()));
        }
        named_color(s).ok_or_else(|| HeatmapError::InvalidColor(s.to_string()))
    }

    /// Linear interpolation between two colors, `t` clamped to [0, 1].
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let lerp_u8 =
            |a: u8, b: u8| -> u8 { ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8 };

        Color::new(
            lerp_u8(self.r, other.r),
            lerp_u8(self.g, other.g),
            lerp_u8(self.b, other.b),
            lerp_u8(self.a, other.a),
        )
    }
}

impl FromStr for Color {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Wire representations accepted for a color in configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    /// Hex string or CSS name
    Text(String),

    /// RGB array: [r, g, b] or [r, g, b, a]
    Array(Vec<u8>),

    /// Explicit RGBA
    Rgba {
        r: u8,
        g: u8,
        b: u8,
        #[serde(default = "opaque")]
        a: u8,
    },
}

fn opaque() -> u8 {
    255
}

impl TryFrom<ColorSpec> for Color {
    type Error = HeatmapError;

    fn try_from(spec: ColorSpec) -> Result<Self, Self::Error> {
        match spec {
            ColorSpec::Text(s) => Color::parse(&s),
            ColorSpec::Array(arr) => match arr.as_slice() {
                [r, g, b] => Ok(Color::rgb(*r, *g, *b)),
                [r, g, b, a] => Ok(Color::new(*r, *g, *b, *a)),
                _ => Err(HeatmapError::InvalidColor(format!(
                    "expected 3 or 4 components, got {}",
                    arr.len()
                ))),
            },
            ColorSpec::Rgba { r, g, b, a } => Ok(Color::new(r, g, b, a)),
        }
    }
}

impl From<Color> for ColorSpec {
    fn from(color: Color) -> Self {
        ColorSpec::Text(color.to_string())
    }
}

fn parse_hex(s: &str) -> Option<Color> {
    if !s.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
    let short = |i: usize| u8::from_str_radix(&s[i..i + 1], 16).ok().map(|v| v * 17);

    match s.len() {
        3 => Some(Color::rgb(short(0)?, short(1)?, short(2)?)),
        6 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Some(Color::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Color> {
    let color = match name.to_ascii_lowercase().as_str() {
        "transparent" => Color::transparent(),
        "black" => Color::rgb(0, 0, 0),
        "white" => Color::rgb(255, 255, 255),
        "red" => Color::rgb(255, 0, 0),
        "lime" => Color::rgb(0, 255, 0),
        "green" => Color::rgb(0, 128, 0),
        "blue" => Color::rgb(0, 0, 255),
        "yellow" => Color::rgb(255, 255, 0),
        "cyan" | "aqua" => Color::rgb(0, 255, 255),
        "magenta" | "fuchsia" => Color::rgb(255, 0, 255),
        "orange" => Color::rgb(255, 165, 0),
        "purple" => Color::rgb(128, 0, 128),
        "navy" => Color::rgb(0, 0, 128),
        "teal" => Color::rgb(0, 128, 128),
        "maroon" => Color::rgb(128, 0, 0),
        "olive" => Color::rgb(128, 128, 0),
        "silver" => Color::rgb(192, 192, 192),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        _ => return None,
    };
    Some(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parsing() {
        assert_eq!(Color::parse("#FF5500").unwrap(), Color::rgb(255, 85, 0));
        assert_eq!(Color::parse("#f50").unwrap(), Color::rgb(255, 85, 0));
        assert_eq!(Color::parse("#FF550080").unwrap(), Color::new(255, 85, 0, 128));
        assert_eq!(Color::parse("lime").unwrap(), Color::rgb(0, 255, 0));
        assert_eq!(Color::parse("Blue").unwrap(), Color::rgb(0, 0, 255));
        assert!(Color::parse("#GGGGGG").is_err());
        assert!(Color::parse("chartreuse-ish").is_err());
    }

    #[test]
    fn test_color_deserialize_forms() {
        let c: Color = serde_json::from_str(r##""#134E5E""##).unwrap();
        assert_eq!(c, Color::rgb(0x13, 0x4e, 0x5e));

        let c: Color = serde_json::from_str("[100, 150, 200]").unwrap();
        assert_eq!(c, Color::rgb(100, 150, 200));

        let c: Color = serde_json::from_str(r#"{"r": 1, "g": 2, "b": 3, "a": 4}"#).unwrap();
        assert_eq!(c, Color::new(1, 2, 3, 4));

        assert!(serde_json::from_str::<Color>("[1, 2]").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        let c = Color::new(18, 52, 86, 120);
        assert_eq!(Color::parse(&c.to_string()).unwrap(), c);
        assert_eq!(Color::rgb(255, 0, 0).to_string(), "#ff0000");
    }

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        let blue = Color::rgb(0, 0, 255);
        let red = Color::rgb(255, 0, 0);
        assert_eq!(blue.lerp(red, 0.0), blue);
        assert_eq!(blue.lerp(red, 1.0), red);
        assert_eq!(blue.lerp(red, 0.5), Color::rgb(128, 0, 128));
        assert_eq!(blue.lerp(red, 7.0), red);
    }
}
