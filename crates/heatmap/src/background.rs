//! Background under the heat layer: a fill color and an optional image.
//!
//! A background image may still be loading when a frame is requested. Its
//! readiness is a shared future: [`BackgroundImage::poll_ready`] checks it
//! without blocking, [`BackgroundImage::wait`] awaits it. Files are decoded
//! on the rayon pool. A failed load is logged and the frame falls back to the
//! fill color.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt, Shared};
use image::RgbaImage;

use crate::color::Color;
use crate::error::{HeatmapError, HeatmapResult};

type LoadFuture = Shared<BoxFuture<'static, Option<Arc<RgbaImage>>>>;

/// Load state of a background image.
#[derive(Debug, Clone)]
pub enum Readiness {
    Pending,
    Ready(Arc<RgbaImage>),
    /// Load failed; the fill color is used instead
    Failed,
}

/// Background image whose pixels may arrive later.
#[derive(Clone)]
pub struct BackgroundImage {
    source: String,
    load: LoadFuture,
}

impl std::fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundImage")
            .field("source", &self.source)
            .field("loaded", &self.load.peek().is_some())
            .finish()
    }
}

impl BackgroundImage {
    /// An image that is already decoded.
    pub fn ready(image: RgbaImage) -> Self {
        let image = Some(Arc::new(image));
        Self {
            source: "memory".to_string(),
            load: futures::future::ready(image).boxed().shared(),
        }
    }

    /// An image produced by `load`, e.g. a download or a decode task.
    pub fn from_future<F>(source: impl Into<String>, load: F) -> Self
    where
        F: Future<Output = HeatmapResult<RgbaImage>> + Send + 'static,
    {
        let source = source.into();
        let label = source.clone();
        let load = load
            .map(move |result| match result {
                Ok(image) => {
                    tracing::debug!(
                        source = %label,
                        width = image.width(),
                        height = image.height(),
                        "Background image loaded"
                    );
                    Some(Arc::new(image))
                }
                Err(e) => {
                    tracing::warn!(source = %label, error = %e, "Background image failed to load");
                    None
                }
            })
            .boxed()
            .shared();
        Self { source, load }
    }

    /// Read and decode an image file on the rayon pool.
    ///
    /// Decoding starts immediately and never runs on the rendering thread;
    /// renders are deferred until it finishes.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path: PathBuf = path.as_ref().to_path_buf();
        let source = path.display().to_string();

        let (tx, rx) = oneshot::channel();
        rayon::spawn(move || {
            let decoded = image::open(&path)
                .map(|image| image.to_rgba8())
                .map_err(HeatmapError::from);
            // The receiver is gone only when the image was dropped
            let _ = tx.send(decoded);
        });

        Self::from_future(source, async move {
            rx.await
                .map_err(|_| HeatmapError::ImageDecode("decode task was cancelled".to_string()))?
        })
    }

    /// Decode an encoded image (PNG, JPEG, ...) held in memory.
    pub fn decode(bytes: &[u8]) -> HeatmapResult<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| HeatmapError::ImageDecode(e.to_string()))?
            .to_rgba8();
        Ok(Self::ready(image))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check readiness without blocking.
    pub fn poll_ready(&self) -> Readiness {
        match self.load.clone().now_or_never() {
            None => Readiness::Pending,
            Some(Some(image)) => Readiness::Ready(image),
            Some(None) => Readiness::Failed,
        }
    }

    /// Wait for the load to settle. `None` means it failed.
    pub async fn wait(&self) -> Option<Arc<RgbaImage>> {
        self.load.clone().await
    }
}

/// Fill color plus optional image, drawn at the world origin.
#[derive(Debug, Clone, Default)]
pub struct Background {
    pub fill: Color,
    pub image: Option<BackgroundImage>,
}

impl Background {
    pub fn fill(fill: Color) -> Self {
        Self { fill, image: None }
    }

    pub fn with_image(mut self, image: BackgroundImage) -> Self {
        self.image = Some(image);
        self
    }
}

/// Resolved background for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Backdrop<'a> {
    pub fill: Color,
    pub image: Option<&'a RgbaImage>,
}

impl Backdrop<'_> {
    /// Background color at a world pixel: the image over the fill.
    #[inline]
    pub fn sample(&self, wx: i64, wy: i64) -> [u8; 4] {
        let fill = self.fill.to_rgba();
        match self.image {
            Some(img) if wx >= 0 && wy >= 0 && wx < img.width() as i64 && wy < img.height() as i64 => {
                source_over(img.get_pixel(wx as u32, wy as u32).0, fill)
            }
            _ => fill,
        }
    }
}

/// Non-premultiplied source-over compositing of `src` onto `dst`.
#[inline]
pub fn source_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    if src[3] == 255 || dst[3] == 0 {
        return src;
    }
    if src[3] == 0 {
        return dst;
    }

    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| -> u8 {
        ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_over_shortcuts() {
        assert_eq!(source_over([1, 2, 3, 255], [9, 9, 9, 255]), [1, 2, 3, 255]);
        assert_eq!(source_over([1, 2, 3, 0], [9, 9, 9, 255]), [9, 9, 9, 255]);
        assert_eq!(source_over([1, 2, 3, 40], [0, 0, 0, 0]), [1, 2, 3, 40]);
    }

    #[test]
    fn test_source_over_half_alpha_on_opaque() {
        let out = source_over([255, 0, 0, 128], [0, 0, 255, 255]);
        assert_eq!(out[3], 255);
        assert_eq!(out[0], 128);
        assert_eq!(out[2], 127);
    }

    #[test]
    fn test_ready_image_is_ready() {
        let bg = BackgroundImage::ready(RgbaImage::new(2, 2));
        assert!(matches!(bg.poll_ready(), Readiness::Ready(_)));
    }

    #[test]
    fn test_missing_file_fails_softly() {
        let bg = BackgroundImage::open("/definitely/not/here.png");
        assert!(futures::executor::block_on(bg.wait()).is_none());
        assert!(matches!(bg.poll_ready(), Readiness::Failed));
    }

    #[test]
    fn test_open_decodes_off_thread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        RgbaImage::from_pixel(3, 2, image::Rgba([7, 8, 9, 255])).save(&path).unwrap();

        let bg = BackgroundImage::open(&path);
        let image = futures::executor::block_on(bg.wait()).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert!(matches!(bg.poll_ready(), Readiness::Ready(_)));
    }

    #[test]
    fn test_backdrop_sample_outside_image_uses_fill() {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        let backdrop = Backdrop {
            fill: Color::rgb(1, 1, 1),
            image: Some(&img),
        };
        assert_eq!(backdrop.sample(1, 1), [10, 20, 30, 255]);
        assert_eq!(backdrop.sample(2, 0), [1, 1, 1, 255]);
        assert_eq!(backdrop.sample(-1, 0), [1, 1, 1, 255]);
    }
}
