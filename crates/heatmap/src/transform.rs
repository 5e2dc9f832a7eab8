//! 2D affine transform between world (point) space and display space.
//!
//! Stores six components `[sx, shy, shx, sy, tx, ty]`:
//!
//! ```text
//!   | sx  shx tx |
//!   | shy  sy ty |
//!   |  0    0  1 |
//! ```
//!
//! `x' = x*sx + y*shx + tx`, `y' = x*shy + y*sy + ty`.

use crate::point::Point;

/// Determinants smaller than this are treated as singular.
pub const AFFINE_EPSILON: f64 = 1e-14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub sx: f64,
    pub shy: f64,
    pub shx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine {
    pub const fn identity() -> Self {
        Self {
            sx: 1.0,
            shy: 0.0,
            shx: 0.0,
            sy: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub const fn translation(x: f64, y: f64) -> Self {
        Self {
            tx: x,
            ty: y,
            ..Self::identity()
        }
    }

    pub const fn scaling(s: f64) -> Self {
        Self {
            sx: s,
            sy: s,
            ..Self::identity()
        }
    }

    /// Uniform scale about `pivot`: the pivot maps to itself.
    pub fn scaling_about(s: f64, pivot: Point) -> Self {
        Self::translation(-pivot.x, -pivot.y)
            .compose(&Self::scaling(s))
            .compose(&Self::translation(pivot.x, pivot.y))
    }

    /// Transform a point.
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            p.x * self.sx + p.y * self.shx + self.tx,
            p.x * self.shy + p.y * self.sy + self.ty,
        )
    }

    /// Transform that applies `self` first, then `next`.
    pub fn compose(&self, next: &Affine) -> Affine {
        Affine {
            sx: self.sx * next.sx + self.shy * next.shx,
            shy: self.sx * next.shy + self.shy * next.sy,
            shx: self.shx * next.sx + self.sy * next.shx,
            sy: self.shx * next.shy + self.sy * next.sy,
            tx: self.tx * next.sx + self.ty * next.shx + next.tx,
            ty: self.tx * next.shy + self.ty * next.sy + next.ty,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.sx * self.sy - self.shy * self.shx
    }

    /// Inverse transform, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Affine> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < AFFINE_EPSILON {
            return None;
        }
        let d = 1.0 / det;

        let sx = self.sy * d;
        let sy = self.sx * d;
        let shy = -self.shy * d;
        let shx = -self.shx * d;
        Some(Affine {
            sx,
            shy,
            shx,
            sy,
            tx: -self.tx * sx - self.ty * shx,
            ty: -self.tx * shy - self.ty * sy,
        })
    }

    /// Average scale factor (exact for uniform scales).
    pub fn scale(&self) -> f64 {
        let x = (self.sx * self.sx + self.shy * self.shy).sqrt();
        let y = (self.shx * self.shx + self.sy * self.sy).sqrt();
        (x + y) / 2.0
    }

    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.approx_eq(&Self::identity(), epsilon)
    }

    pub fn approx_eq(&self, other: &Affine, epsilon: f64) -> bool {
        (self.sx - other.sx).abs() <= epsilon
            && (self.shy - other.shy).abs() <= epsilon
            && (self.shx - other.shx).abs() <= epsilon
            && (self.sy - other.sy).abs() <= epsilon
            && (self.tx - other.tx).abs() <= epsilon
            && (self.ty - other.ty).abs() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, assert_coords_approx_eq};

    #[test]
    fn test_apply_translation_then_scale() {
        let t = Affine::translation(10.0, 20.0).compose(&Affine::scaling(2.0));
        assert_eq!(t.apply(Point::new(1.0, 1.0)), Point::new(22.0, 42.0));
    }

    #[test]
    fn test_invert_round_trip() {
        let t = Affine::translation(-3.5, 8.0).compose(&Affine::scaling(1.75));
        let inv = t.invert().unwrap();
        let p = Point::new(12.25, -40.0);
        let back = inv.apply(t.apply(p));
        assert_coords_approx_eq!((back.x, back.y), (p.x, p.y), 1e-9);
        assert!(t.compose(&inv).is_identity(1e-12));
    }

    #[test]
    fn test_singular_has_no_inverse() {
        assert!(Affine::scaling(0.0).invert().is_none());
    }

    #[test]
    fn test_scaling_about_keeps_pivot() {
        let pivot = Point::new(30.0, 40.0);
        let t = Affine::scaling_about(3.0, pivot);
        let mapped = t.apply(pivot);
        assert_coords_approx_eq!((mapped.x, mapped.y), (pivot.x, pivot.y), 1e-12);
        assert_approx_eq!(t.scale(), 3.0, 1e-12);
    }
}
