//! Pan/zoom view state and pointer interaction.
//!
//! The viewport maps world coordinates (where points live) to display
//! pixels through a translate + uniform-scale [`Affine`]. Pointer input is
//! fed in display coordinates:
//!
//! - wheel: zoom by `scale_factor^delta` about the pointer
//! - drag (down, move while held): pan by the pointer delta
//! - click (down then up without a drag): zoom one step in, or out with a
//!   modifier held
//! - capture mode: every move also records the pointer's world position

use serde::{Deserialize, Serialize};

use crate::composite::Region;
use crate::point::Point;
use crate::transform::Affine;

/// Pan/zoom tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// Scale multiplier per zoom step
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,

    /// Smallest allowed scale (zoomed out)
    #[serde(default = "default_min_scale")]
    pub min_scale: f64,

    /// Largest allowed scale (zoomed in)
    #[serde(default = "default_max_scale")]
    pub max_scale: f64,
}

fn default_scale_factor() -> f64 {
    1.1
}
fn default_min_scale() -> f64 {
    0.25
}
fn default_max_scale() -> f64 {
    32.0
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            scale_factor: default_scale_factor(),
            min_scale: default_min_scale(),
            max_scale: default_max_scale(),
        }
    }
}

impl ViewportConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 || self.scale_factor == 1.0 {
            return Err("scale_factor must be positive and not 1".to_string());
        }
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err("min_scale must be positive".to_string());
        }
        if !(self.max_scale.is_finite() && self.max_scale >= self.min_scale) {
            return Err("max_scale must be finite and >= min_scale".to_string());
        }
        Ok(())
    }

    /// Replace unusable values with defaults and order the scale limits.
    pub fn sanitized(self) -> Self {
        if let Err(reason) = self.validate() {
            tracing::warn!(
                scale_factor = self.scale_factor,
                min_scale = self.min_scale,
                max_scale = self.max_scale,
                %reason,
                "Invalid viewport config, sanitizing"
            );
        }
        let positive = |v: f64, default: f64| if v.is_finite() && v > 0.0 { v } else { default };

        let scale_factor = if self.scale_factor == 1.0 {
            default_scale_factor()
        } else {
            positive(self.scale_factor, default_scale_factor())
        };
        let min_scale = positive(self.min_scale, default_min_scale());
        let max_scale = positive(self.max_scale, default_max_scale());

        Self {
            scale_factor,
            min_scale: min_scale.min(max_scale),
            max_scale: min_scale.max(max_scale),
        }
    }
}

/// Pointer input in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { pos: Point },
    Move { pos: Point, buttons_held: bool },
    Up { pos: Point, modifier: bool },
    Wheel { pos: Point, delta: f64 },
}

/// Outcome of one pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Interaction {
    /// The view transform changed
    pub view_changed: bool,
    /// World position recorded by capture mode
    pub captured: Option<Point>,
}

impl Interaction {
    pub fn needs_redraw(&self) -> bool {
        self.view_changed || self.captured.is_some()
    }
}

/// View transform plus the pointer state needed to drive it.
#[derive(Debug, Clone)]
pub struct Viewport {
    config: ViewportConfig,
    transform: Affine,
    last_pointer: Point,
    drag_anchor: Option<Point>,
    dragged: bool,
    capture: bool,
}

impl Viewport {
    /// Invalid configs are sanitized with a warning.
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config: config.sanitized(),
            transform: Affine::identity(),
            last_pointer: Point::default(),
            drag_anchor: None,
            dragged: false,
            capture: false,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// World to display transform.
    pub fn transform(&self) -> &Affine {
        &self.transform
    }

    pub fn scale(&self) -> f64 {
        self.transform.scale()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture
    }

    pub fn last_pointer(&self) -> Point {
        self.last_pointer
    }

    /// Display position to world position.
    pub fn to_world(&self, display: Point) -> Point {
        match self.transform.invert() {
            Some(inv) => inv.apply(display),
            None => display,
        }
    }

    pub fn to_display(&self, world: Point) -> Point {
        self.transform.apply(world)
    }

    /// Zoom by `steps` about the last pointer position.
    pub fn zoom(&mut self, steps: f64) -> bool {
        self.zoom_at(steps, self.last_pointer)
    }

    /// Zoom by `scale_factor^steps` keeping `pivot` (display coords) fixed.
    ///
    /// The resulting scale is clamped to `[min_scale, max_scale]`. Returns
    /// whether the view changed.
    pub fn zoom_at(&mut self, steps: f64, pivot: Point) -> bool {
        if steps == 0.0 || !steps.is_finite() || !pivot.is_finite() {
            return false;
        }
        let current = self.scale();
        let target = (current * self.config.scale_factor.powf(steps))
            .clamp(self.config.min_scale, self.config.max_scale);
        let factor = target / current;
        if !factor.is_finite() || (factor - 1.0).abs() < 1e-12 {
            return false;
        }

        self.transform = self
            .transform
            .compose(&Affine::scaling_about(factor, pivot));
        tracing::debug!(scale = target, pivot_x = pivot.x, pivot_y = pivot.y, "Zoomed view");
        true
    }

    /// Shift the view by a display-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        if (dx == 0.0 && dy == 0.0) || !dx.is_finite() || !dy.is_finite() {
            return false;
        }
        self.transform = self.transform.compose(&Affine::translation(dx, dy));
        true
    }

    pub fn toggle_capture(&mut self) -> bool {
        self.capture = !self.capture;
        tracing::debug!(capture = self.capture, "Toggled point capture");
        self.capture
    }

    /// Back to the identity view; pointer state is kept.
    pub fn reset(&mut self) {
        self.transform = Affine::identity();
    }

    /// Feed one pointer event.
    pub fn handle(&mut self, event: PointerEvent) -> Interaction {
        let mut outcome = Interaction::default();

        match event {
            PointerEvent::Down { pos } => {
                self.last_pointer = pos;
                self.drag_anchor = Some(pos);
                self.dragged = false;
            }
            PointerEvent::Move { pos, buttons_held } => {
                if buttons_held && self.drag_anchor.is_some() {
                    let (dx, dy) = (pos.x - self.last_pointer.x, pos.y - self.last_pointer.y);
                    outcome.view_changed = self.pan(dx, dy);
                    self.dragged = true;
                }
                self.last_pointer = pos;
                if self.capture && pos.is_finite() {
                    outcome.captured = Some(self.to_world(pos));
                }
            }
            PointerEvent::Up { pos, modifier } => {
                self.last_pointer = pos;
                if self.drag_anchor.take().is_some() && !self.dragged {
                    let steps = if modifier { -1.0 } else { 1.0 };
                    outcome.view_changed = self.zoom_at(steps, pos);
                }
            }
            PointerEvent::Wheel { pos, delta } => {
                self.last_pointer = pos;
                outcome.view_changed = self.zoom_at(delta, pos);
            }
        }

        outcome
    }

    /// World-space pixel rectangle visible on a `width`×`height` display.
    pub fn visible_region(&self, width: u32, height: u32) -> Region {
        let inv = match self.transform.invert() {
            Some(inv) => inv,
            None => return Region::sized(width, height),
        };
        let a = inv.apply(Point::new(0.0, 0.0));
        let b = inv.apply(Point::new(width as f64, height as f64));

        // Snap away float noise so a restored view yields the same region
        const SNAP: f64 = 1e-6;
        let x0 = (a.x.min(b.x) + SNAP).floor();
        let y0 = (a.y.min(b.y) + SNAP).floor();
        let x1 = (a.x.max(b.x) - SNAP).ceil();
        let y1 = (a.y.max(b.y) - SNAP).ceil();

        // Far from the origin float precision inflates the span
        let scale = self.transform.scale();
        let max_w = (width as f64 / scale).ceil() + 1.0;
        let max_h = (height as f64 / scale).ceil() + 1.0;

        Region::new(
            x0 as i64,
            y0 as i64,
            (x1 - x0).clamp(0.0, max_w) as u32,
            (y1 - y0).clamp(0.0, max_h) as u32,
        )
    }
}
