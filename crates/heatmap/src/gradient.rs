//! Gradient color stops and the 256-entry lookup table used for colorization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::HeatmapError;

/// Number of entries in a gradient lookup table (one per normalized alpha value).
pub const TABLE_SIZE: usize = 256;

/// Color stop for gradient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position in [0, 1]
    pub position: f64,
    pub color: Color,
}

/// Sparse mapping from position to color.
///
/// Stops may arrive in any order and need not cover [0, 1]. In configuration
/// files a gradient is written as an object keyed by position:
/// `{"0.4": "blue", "1.0": "red"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Color>",
    into = "BTreeMap<String, Color>"
)]
pub struct Gradient {
    stops: Vec<ColorStop>,
}

impl Gradient {
    /// Build a gradient from `(position, color)` pairs.
    ///
    /// Positions are clamped into [0, 1]; non-finite positions are dropped.
    pub fn new(stops: impl IntoIterator<Item = (f64, Color)>) -> Self {
        let mut stops: Vec<ColorStop> = stops
            .into_iter()
            .filter(|(position, _)| position.is_finite())
            .map(|(position, color)| ColorStop {
                position: position.clamp(0.0, 1.0),
                color,
            })
            .collect();
        // Stable sort keeps insertion order for duplicate positions
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self { stops }
    }

    /// Build a gradient from CSS color strings.
    pub fn from_css<'a>(
        stops: impl IntoIterator<Item = (f64, &'a str)>,
    ) -> Result<Self, HeatmapError> {
        let parsed = stops
            .into_iter()
            .map(|(position, css)| Color::parse(css).map(|color| (position, color)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(parsed))
    }

    /// Stops sorted by position.
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Interpolate the color at `position`.
    ///
    /// Positions before the first stop or after the last one take that
    /// stop's color. An empty gradient yields transparent.
    pub fn color_at(&self, position: f64) -> Color {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Color::transparent(),
        };

        if position <= first.position {
            return first.color;
        }
        if position >= last.position {
            return last.color;
        }

        // Find bracketing stops
        for pair in self.stops.windows(2) {
            let (low, high) = (&pair[0], &pair[1]);
            if position <= high.position {
                let span = high.position - low.position;
                if span <= f64::EPSILON {
                    return high.color;
                }
                let t = (position - low.position) / span;
                return low.color.lerp(high.color, t);
            }
        }

        last.color
    }

    /// Expand into a lookup table; entry `i` samples position `i / 255`.
    pub fn build_table(&self) -> GradientTable {
        let mut entries = [Color::transparent(); TABLE_SIZE];
        for (i, entry) in entries.iter_mut().enumerate() {
            *entry = self.color_at(i as f64 / (TABLE_SIZE - 1) as f64);
        }
        GradientTable { entries }
    }
}

impl Default for Gradient {
    /// Blue through red, with the low 40% of the range held at blue.
    fn default() -> Self {
        Self::new([
            (0.4, Color::rgb(0, 0, 255)),
            (0.6, Color::rgb(0, 255, 255)),
            (0.7, Color::rgb(0, 255, 0)),
            (0.8, Color::rgb(255, 255, 0)),
            (1.0, Color::rgb(255, 0, 0)),
        ])
    }
}

impl TryFrom<BTreeMap<String, Color>> for Gradient {
    type Error = HeatmapError;

    fn try_from(map: BTreeMap<String, Color>) -> Result<Self, Self::Error> {
        let stops = map
            .into_iter()
            .map(|(key, color)| {
                let position: f64 = key
                    .trim()
                    .parse()
                    .map_err(|_| HeatmapError::InvalidStopPosition(key.clone()))?;
                if !(0.0..=1.0).contains(&position) {
                    return Err(HeatmapError::InvalidStopPosition(key));
                }
                Ok((position, color))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(stops))
    }
}

impl From<Gradient> for BTreeMap<String, Color> {
    fn from(gradient: Gradient) -> Self {
        gradient
            .stops
            .into_iter()
            .map(|stop| (stop.position.to_string(), stop.color))
            .collect()
    }
}

/// Build the 256-entry lookup table for a gradient.
pub fn build_gradient_table(gradient: &Gradient) -> GradientTable {
    gradient.build_table()
}

/// 256-entry RGBA lookup table indexed by normalized alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradientTable {
    entries: [Color; TABLE_SIZE],
}

impl GradientTable {
    #[inline]
    pub fn get(&self, index: u8) -> Color {
        self.entries[index as usize]
    }

    pub fn entries(&self) -> &[Color; TABLE_SIZE] {
        &self.entries
    }

    /// Palette of the colors a heat layer can contain.
    ///
    /// Entry `i` is the gradient RGB at index `i` with alpha `i`, which is
    /// exactly the pixel colorization produces for normalized alpha `i`.
    /// Entry 0 is fully transparent black.
    pub fn heat_palette(&self) -> Vec<(u8, u8, u8, u8)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i == 0 {
                    (0, 0, 0, 0)
                } else {
                    (c.r, c.g, c.b, i as u8)
                }
            })
            .collect()
    }
}
