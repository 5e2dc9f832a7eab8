//! Renderer configuration loaded from JSON.
//!
//! ```json
//! {
//!   "width": 640,
//!   "height": 640,
//!   "radius": 25,
//!   "blur": 35,
//!   "gradient": { "0.4": "blue", "0.6": "cyan", "0.7": "lime", "0.8": "yellow", "1.0": "red" },
//!   "background": { "fill": "#000000", "image": "assets/img.jpg" },
//!   "interactive": { "scale_factor": 1.1 }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{HeatmapError, HeatmapResult};
use crate::gradient::Gradient;
use crate::stamp::MAX_EXTENT;
use crate::viewport::ViewportConfig;

/// Default disc radius in pixels.
pub const DEFAULT_RADIUS: f64 = 25.0;

/// Default blur width in pixels.
pub const DEFAULT_BLUR: f64 = 35.0;

/// Per-point alpha floor for static heatmaps.
pub const DEFAULT_MIN_ALPHA: f64 = 0.1;

/// Per-point alpha floor for pan/zoom heatmaps.
pub const INTERACTIVE_MIN_ALPHA: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapConfig {
    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,

    #[serde(default = "default_radius")]
    pub radius: f64,

    #[serde(default = "default_blur")]
    pub blur: f64,

    #[serde(default)]
    pub gradient: Gradient,

    /// Lower bound on the per-point compositing alpha. Unset means
    /// [`DEFAULT_MIN_ALPHA`], or [`INTERACTIVE_MIN_ALPHA`] with pan/zoom.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_alpha: Option<f64>,

    #[serde(default)]
    pub background: BackgroundConfig,

    /// Enables pan/zoom and point capture when present
    #[serde(default)]
    pub interactive: Option<ViewportConfig>,
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS
}
fn default_blur() -> f64 {
    DEFAULT_BLUR
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundConfig {
    /// Color under the heat layer (and under the image)
    #[serde(default)]
    pub fill: Color,

    /// Image drawn at the world origin
    #[serde(default)]
    pub image: Option<PathBuf>,
}

impl HeatmapConfig {
    /// Static heatmap with default radius, blur and gradient.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            radius: DEFAULT_RADIUS,
            blur: DEFAULT_BLUR,
            gradient: Gradient::default(),
            min_alpha: None,
            background: BackgroundConfig::default(),
            interactive: None,
        }
    }

    /// Pan/zoom heatmap with default viewport settings.
    pub fn interactive(width: u32, height: u32) -> Self {
        Self {
            interactive: Some(ViewportConfig::default()),
            ..Self::new(width, height)
        }
    }

    /// Parse configuration from JSON string.
    pub fn from_json(json: &str) -> HeatmapResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> HeatmapResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Per-point alpha floor after applying the variant default.
    pub fn resolved_min_alpha(&self) -> f64 {
        self.min_alpha
            .unwrap_or_else(|| default_min_alpha(self.interactive.is_some()))
    }

    pub fn to_json(&self) -> HeatmapResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that cannot describe a drawable heatmap.
    pub fn validate(&self) -> HeatmapResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(HeatmapError::invalid_config(
                "width/height",
                format!("display must be non-empty, got {}x{}", self.width, self.height),
            ));
        }
        for (field, value) in [("radius", self.radius), ("blur", self.blur)] {
            if !(0.0..=MAX_EXTENT).contains(&value) {
                return Err(HeatmapError::invalid_config(
                    field,
                    format!("must be within [0, {}], got {}", MAX_EXTENT, value),
                ));
            }
        }
        if let Some(min_alpha) = self.min_alpha {
            if !(0.0..=1.0).contains(&min_alpha) {
                return Err(HeatmapError::invalid_config(
                    "min_alpha",
                    format!("must be within [0, 1], got {}", min_alpha),
                ));
            }
        }
        if let Some(viewport) = &self.interactive {
            viewport
                .validate()
                .map_err(|e| HeatmapError::invalid_config("interactive", e))?;
        }
        Ok(())
    }
}

/// Per-point alpha floor used when none is configured.
pub(crate) fn default_min_alpha(interactive: bool) -> f64 {
    if interactive {
        INTERACTIVE_MIN_ALPHA
    } else {
        DEFAULT_MIN_ALPHA
    }
}

/// Replace an unusable radius/blur with something drawable.
///
/// Non-finite values fall back to `default`; negative values clamp to 0 and
/// values above [`MAX_EXTENT`] clamp to it.
pub(crate) fn sanitize_extent(field: &str, value: f64, default: f64) -> f64 {
    if !value.is_finite() {
        tracing::warn!(field, value, default, "Non-finite value, using default");
        default
    } else if value < 0.0 {
        tracing::warn!(field, value, "Negative value, clamping to 0");
        0.0
    } else if value > MAX_EXTENT {
        tracing::warn!(field, value, max = MAX_EXTENT, "Value too large, clamping");
        MAX_EXTENT
    } else {
        value
    }
}
