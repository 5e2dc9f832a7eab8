//! The heatmap renderer: owns points, caches and the presented frame.
//!
//! Capabilities are opt-in. A background image (possibly still loading) sits
//! under the heat layer, and a [`Viewport`] adds pan/zoom and point capture.
//! Setters only record state; nothing is drawn until [`Heatmap::render`].

use image::RgbaImage;

use crate::background::{Backdrop, Background, BackgroundImage, Readiness};
use crate::composite::{accumulate, cull_points, point_alpha, HeatLayer, Region};
use crate::config::{default_min_alpha, sanitize_extent, HeatmapConfig, DEFAULT_BLUR, DEFAULT_RADIUS};
use crate::error::{HeatmapError, HeatmapResult};
use crate::gradient::{Gradient, GradientTable};
use crate::png;
use crate::point::Point;
use crate::present::present;
use crate::stamp::{build_stamp, Stamp};
use crate::transform::Affine;
use crate::viewport::{PointerEvent, Viewport, ViewportConfig};

/// Outcome of a render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The frame was recomputed
    Rendered,
    /// The background image is still loading; the previous frame is kept
    Deferred,
}

#[derive(Debug)]
pub struct Heatmap {
    width: u32,
    height: u32,
    radius: f64,
    blur: f64,
    gradient: Gradient,
    /// Explicit per-point alpha floor; `None` follows the variant default
    min_alpha: Option<f64>,
    points: Vec<Point>,

    // Caches; `None` means stale
    stamp: Option<Stamp>,
    table: Option<GradientTable>,

    background: Background,
    viewport: Option<Viewport>,

    frame: RgbaImage,
    heat: Option<HeatLayer>,
}

impl Heatmap {
    /// Static heatmap with default radius, blur and gradient and a
    /// transparent background.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            radius: DEFAULT_RADIUS,
            blur: DEFAULT_BLUR,
            gradient: Gradient::default(),
            min_alpha: None,
            points: Vec::new(),
            stamp: None,
            table: None,
            background: Background::default(),
            viewport: None,
            frame: RgbaImage::new(width, height),
            heat: None,
        }
    }

    /// Build a heatmap from validated configuration.
    ///
    /// A configured background image starts decoding in the background;
    /// renders are deferred until it is ready (see [`Heatmap::render_when_ready`]).
    pub fn from_config(config: &HeatmapConfig) -> HeatmapResult<Self> {
        config.validate()?;

        let mut background = Background::fill(config.background.fill);
        if let Some(path) = &config.background.image {
            background = background.with_image(BackgroundImage::open(path));
        }

        let mut heatmap = Self::new(config.width, config.height).with_background(background);
        heatmap.radius = config.radius;
        heatmap.blur = config.blur;
        heatmap.gradient = config.gradient.clone();
        heatmap.min_alpha = config.min_alpha;
        if let Some(viewport) = &config.interactive {
            heatmap = heatmap.with_viewport(*viewport);
        }

        tracing::debug!(
            width = config.width,
            height = config.height,
            interactive = heatmap.viewport.is_some(),
            "Heatmap created from config"
        );
        Ok(heatmap)
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    /// Enable pan/zoom and point capture.
    pub fn with_viewport(mut self, config: ViewportConfig) -> Self {
        self.viewport = Some(Viewport::new(config));
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn blur(&self) -> f64 {
        self.blur
    }

    pub fn gradient(&self) -> &Gradient {
        &self.gradient
    }

    /// Per-point alpha floor in effect: the explicit value if one was set,
    /// otherwise the static or pan/zoom default.
    pub fn min_alpha(&self) -> f64 {
        self.min_alpha
            .unwrap_or_else(|| default_min_alpha(self.viewport.is_some()))
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// Last presented frame (transparent before the first render).
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    /// Normalized heat layer of the last render.
    pub fn heat_layer(&self) -> Option<&HeatLayer> {
        self.heat.as_ref()
    }

    /// Stamp cache, if built and current.
    pub fn stamp(&self) -> Option<&Stamp> {
        self.stamp.as_ref()
    }

    /// Gradient table cache, if built and current.
    pub fn gradient_table(&self) -> Option<&GradientTable> {
        self.table.as_ref()
    }

    pub fn add_point(&mut self, x: f64, y: f64) {
        self.points.push(Point::new(x, y));
    }

    pub fn set_points<P: Into<Point>>(&mut self, points: impl IntoIterator<Item = P>) {
        self.points = points.into_iter().map(Into::into).collect();
    }

    pub fn clear_points(&mut self) {
        self.points.clear();
    }

    pub fn set_radius(&mut self, radius: f64) {
        let radius = sanitize_extent("radius", radius, DEFAULT_RADIUS);
        if radius.to_bits() != self.radius.to_bits() {
            self.radius = radius;
            self.stamp = None;
        }
    }

    pub fn set_blur(&mut self, blur: f64) {
        let blur = sanitize_extent("blur", blur, DEFAULT_BLUR);
        if blur.to_bits() != self.blur.to_bits() {
            self.blur = blur;
            self.stamp = None;
        }
    }

    pub fn set_gradient(&mut self, gradient: Gradient) {
        if gradient != self.gradient {
            self.gradient = gradient;
            self.table = None;
        }
    }

    /// Set the per-point alpha floor. Values outside [0, 1] are clamped;
    /// non-finite values fall back to the variant default.
    pub fn set_min_alpha(&mut self, min_alpha: f64) {
        self.min_alpha = if min_alpha.is_finite() {
            Some(min_alpha.clamp(0.0, 1.0))
        } else {
            tracing::warn!(min_alpha, "Non-finite min_alpha, using default");
            None
        };
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// Recompute the frame.
    ///
    /// Never blocks: while the background image is loading this returns
    /// [`RenderStatus::Deferred`] and keeps the previous frame. A failed
    /// background load renders over the fill color. `force_rebuild`
    /// regenerates the stamp and gradient table even when they are current.
    pub fn render(&mut self, force_rebuild: bool) -> RenderStatus {
        let readiness = self.background.image.as_ref().map(BackgroundImage::poll_ready);
        let image = match readiness {
            Some(Readiness::Pending) => {
                tracing::debug!("Background image not ready, deferring render");
                return RenderStatus::Deferred;
            }
            Some(Readiness::Ready(image)) => Some(image),
            Some(Readiness::Failed) | None => None,
        };

        self.draw(force_rebuild, image.as_deref());
        RenderStatus::Rendered
    }

    /// Wait for the background image to settle, then render.
    pub async fn render_when_ready(&mut self, force_rebuild: bool) -> RenderStatus {
        if let Some(image) = &self.background.image {
            image.wait().await;
        }
        self.render(force_rebuild)
    }

    fn draw(&mut self, force_rebuild: bool, image: Option<&RgbaImage>) {
        if force_rebuild {
            self.stamp = None;
            self.table = None;
        }

        let (radius, blur) = (self.radius, self.blur);
        let min_alpha = self.min_alpha();
        let stamp = &*self.stamp.get_or_insert_with(|| build_stamp(radius, blur));
        let gradient = &self.gradient;
        let table = &*self.table.get_or_insert_with(|| {
            tracing::debug!(stops = gradient.stops().len(), "Rebuilding gradient table");
            gradient.build_table()
        });

        let (region, view) = match &self.viewport {
            Some(viewport) => (
                viewport.visible_region(self.width, self.height),
                *viewport.transform(),
            ),
            None => (Region::sized(self.width, self.height), Affine::identity()),
        };

        // Alpha comes from the full point count so culling cannot change it
        let alpha = point_alpha(self.points.len(), min_alpha);
        let acc = if self.viewport.is_some() {
            let visible = cull_points(&self.points, stamp, &region);
            tracing::trace!(
                total = self.points.len(),
                visible = visible.len(),
                "Culled points to visible region"
            );
            accumulate(&visible, stamp, alpha, &region)
        } else {
            accumulate(&self.points, stamp, alpha, &region)
        };

        let heat = HeatLayer::normalize(&acc, region);
        let colored = heat.colorize(table);
        let backdrop = Backdrop {
            fill: self.background.fill,
            image,
        };
        self.frame = present(&colored, region, &backdrop, &view, self.width, self.height);

        tracing::trace!(
            points = self.points.len(),
            peak = heat.peak(),
            region_width = region.width,
            region_height = region.height,
            "Frame rendered"
        );
        self.heat = Some(heat);
    }

    /// Zoom about the last pointer position and redraw.
    ///
    /// Returns `None` when nothing changed: the heatmap is not interactive or
    /// the scale is already at its limit.
    pub fn zoom(&mut self, steps: f64) -> Option<RenderStatus> {
        let changed = self.viewport.as_mut()?.zoom(steps);
        changed.then(|| self.render(false))
    }

    /// Flip point-capture mode, returning the new state. Always `false`
    /// for a static heatmap.
    pub fn toggle_capture_mode(&mut self) -> bool {
        self.viewport
            .as_mut()
            .map(Viewport::toggle_capture)
            .unwrap_or(false)
    }

    /// Feed a pointer event. Captured points are appended; returns the
    /// redraw outcome when the event changed anything.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<RenderStatus> {
        let interaction = self.viewport.as_mut()?.handle(event);
        if let Some(point) = interaction.captured {
            self.points.push(point);
        }
        if interaction.view_changed {
            tracing::debug!(scale = self.viewport.as_ref().map(Viewport::scale), "View changed");
        }
        interaction.needs_redraw().then(|| self.render(false))
    }

    /// Back to the identity view and redraw.
    pub fn reset_view(&mut self) -> Option<RenderStatus> {
        self.viewport.as_mut()?.reset();
        Some(self.render(false))
    }

    /// Encode the presented frame as PNG.
    pub fn encode_png(&self) -> HeatmapResult<Vec<u8>> {
        png::encode_frame(&self.frame)
    }

    /// Encode the last heat layer (world space, no background) as an
    /// indexed PNG.
    pub fn encode_heat_png(&self) -> HeatmapResult<Vec<u8>> {
        match (&self.heat, &self.table) {
            (Some(heat), Some(table)) => png::encode_heat_layer(heat, table),
            _ => Err(HeatmapError::Encode(
                "no heat layer rendered yet".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::config::{DEFAULT_MIN_ALPHA, INTERACTIVE_MIN_ALPHA};
    use crate::stamp::MAX_EXTENT;

    fn alpha_at(heatmap: &Heatmap, x: u32, y: u32) -> u8 {
        heatmap.frame().get_pixel(x, y).0[3]
    }

    #[test]
    fn test_new_has_no_caches() {
        let heatmap = Heatmap::new(10, 10);
        assert!(heatmap.stamp().is_none());
        assert!(heatmap.gradient_table().is_none());
        assert!(heatmap.frame().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_render_builds_caches() {
        let mut heatmap = Heatmap::new(50, 50);
        heatmap.add_point(25.0, 25.0);
        assert_eq!(heatmap.render(false), RenderStatus::Rendered);
        assert!(heatmap.stamp().is_some());
        assert!(heatmap.gradient_table().is_some());
        assert!(alpha_at(&heatmap, 25, 25) > 0);
    }

    #[test]
    fn test_setters_invalidate_only_on_change() {
        let mut heatmap = Heatmap::new(20, 20);
        heatmap.render(false);

        heatmap.set_radius(DEFAULT_RADIUS);
        assert!(heatmap.stamp().is_some());

        heatmap.set_radius(10.0);
        assert!(heatmap.stamp().is_none());
        assert!(heatmap.gradient_table().is_some());

        heatmap.render(false);
        heatmap.set_gradient(Gradient::from_css([(0.0, "black"), (1.0, "white")]).unwrap());
        assert!(heatmap.gradient_table().is_none());
        assert!(heatmap.stamp().is_some());
    }

    #[test]
    fn test_rendered_stamp_follows_setters() {
        let mut heatmap = Heatmap::new(20, 20);
        heatmap.set_radius(4.0);
        heatmap.set_blur(2.0);
        heatmap.render(false);
        assert!(heatmap.stamp().unwrap().matches(4.0, 2.0));
    }

    #[test]
    fn test_invalid_extents_are_sanitized() {
        let mut heatmap = Heatmap::new(20, 20);
        heatmap.set_blur(f64::NAN);
        assert_eq!(heatmap.blur(), DEFAULT_BLUR);
        heatmap.set_radius(-5.0);
        assert_eq!(heatmap.radius(), 0.0);

        heatmap.add_point(10.0, 10.0);
        assert_eq!(heatmap.render(false), RenderStatus::Rendered);
        // Zero radius draws nothing
        assert!(heatmap.frame().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_min_alpha_clamped() {
        let mut heatmap = Heatmap::new(1, 1);
        heatmap.set_min_alpha(3.0);
        assert_eq!(heatmap.min_alpha(), 1.0);
        heatmap.set_min_alpha(f64::INFINITY);
        assert_eq!(heatmap.min_alpha(), DEFAULT_MIN_ALPHA);
    }

    #[test]
    fn test_viewport_raises_default_min_alpha() {
        let heatmap = Heatmap::new(10, 10).with_viewport(ViewportConfig::default());
        assert_eq!(heatmap.min_alpha(), INTERACTIVE_MIN_ALPHA);

        let mut heatmap = Heatmap::new(10, 10);
        heatmap.set_min_alpha(0.3);
        let heatmap = heatmap.with_viewport(ViewportConfig::default());
        assert_eq!(heatmap.min_alpha(), 0.3);
    }

    #[test]
    fn test_extreme_extents_still_render() {
        let mut heatmap = Heatmap::new(20, 20);
        heatmap.add_point(10.0, 10.0);

        heatmap.set_blur(1e-50);
        assert_eq!(heatmap.render(false), RenderStatus::Rendered);
        assert_eq!(heatmap.frame().get_pixel(10, 10).0[3], 255);

        heatmap.set_radius(1e12);
        assert_eq!(heatmap.radius(), MAX_EXTENT);
        assert_eq!(heatmap.render(false), RenderStatus::Rendered);
        assert!(heatmap.frame().pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn test_far_off_points_do_not_panic() {
        let mut heatmap = Heatmap::new(20, 20);
        heatmap.add_point(1e300, 5.0);
        heatmap.add_point(-1e300, f64::MAX);
        assert_eq!(heatmap.render(false), RenderStatus::Rendered);
        assert!(heatmap.frame().pixels().all(|p| p.0[3] == 0));

        let mut heatmap = Heatmap::new(20, 20).with_viewport(ViewportConfig::default());
        heatmap.add_point(1e300, 5.0);
        heatmap.handle_pointer(PointerEvent::Down { pos: Point::new(0.0, 0.0) });
        let status = heatmap.handle_pointer(PointerEvent::Move {
            pos: Point::new(7.0, -3.0),
            buttons_held: true,
        });
        assert_eq!(status, Some(RenderStatus::Rendered));
        assert!(heatmap.frame().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_inverted_scale_limits_do_not_panic() {
        let config = ViewportConfig {
            scale_factor: 1.1,
            min_scale: 4.0,
            max_scale: 2.0,
        };
        let mut heatmap = Heatmap::new(20, 20).with_viewport(config);
        assert_eq!(heatmap.zoom(1.0), Some(RenderStatus::Rendered));
        let scale = heatmap.viewport().unwrap().scale();
        assert!((2.0..=4.0).contains(&scale));
    }

    #[test]
    fn test_fill_shows_through() {
        let mut heatmap = Heatmap::new(8, 8).with_background(Background::fill(Color::rgb(0, 0, 40)));
        heatmap.render(false);
        assert!(heatmap.frame().pixels().all(|p| p.0 == [0, 0, 40, 255]));
    }

    #[test]
    fn test_static_heatmap_ignores_interaction() {
        let mut heatmap = Heatmap::new(8, 8);
        assert_eq!(heatmap.zoom(1.0), None);
        assert!(!heatmap.toggle_capture_mode());
        assert_eq!(
            heatmap.handle_pointer(PointerEvent::Wheel {
                pos: Point::new(1.0, 1.0),
                delta: 1.0
            }),
            None
        );
        assert_eq!(heatmap.reset_view(), None);
    }

    #[test]
    fn test_capture_appends_world_points() {
        let mut heatmap = Heatmap::new(40, 40).with_viewport(ViewportConfig::default());
        assert!(heatmap.toggle_capture_mode());

        let status = heatmap.handle_pointer(PointerEvent::Move {
            pos: Point::new(12.0, 7.0),
            buttons_held: false,
        });
        assert_eq!(status, Some(RenderStatus::Rendered));
        assert_eq!(heatmap.points(), &[Point::new(12.0, 7.0)]);

        assert!(!heatmap.toggle_capture_mode());
        let status = heatmap.handle_pointer(PointerEvent::Move {
            pos: Point::new(13.0, 7.0),
            buttons_held: false,
        });
        assert_eq!(status, None);
        assert_eq!(heatmap.points().len(), 1);
    }

    #[test]
    fn test_heat_png_requires_render() {
        let mut heatmap = Heatmap::new(4, 4);
        assert!(heatmap.encode_heat_png().is_err());
        heatmap.render(false);
        assert!(heatmap.encode_heat_png().is_ok());
    }
}
