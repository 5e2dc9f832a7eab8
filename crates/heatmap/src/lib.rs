//! Heatmap overlay rendering.
//!
//! Points are stamped with a soft disc, composited source-over into an alpha
//! buffer, normalized against the peak and false-colored through a 256-entry
//! gradient table. The result is presented over a fill color or background
//! image, optionally through a pan/zoom viewport.

pub mod background;
pub mod color;
pub mod composite;
pub mod config;
pub mod error;
pub mod gradient;
pub mod heatmap;
pub mod png;
pub mod point;
pub mod present;
pub mod stamp;
pub mod transform;
pub mod viewport;

pub use background::{Background, BackgroundImage, Readiness};
pub use color::Color;
pub use composite::{render, HeatLayer, Region};
pub use config::{BackgroundConfig, HeatmapConfig};
pub use error::{HeatmapError, HeatmapResult};
pub use gradient::{build_gradient_table, ColorStop, Gradient, GradientTable};
pub use heatmap::{Heatmap, RenderStatus};
pub use point::Point;
pub use stamp::{build_stamp, Stamp};
pub use transform::Affine;
pub use viewport::{Interaction, PointerEvent, Viewport, ViewportConfig};
