//! Point generators for synthetic heatmap inputs.
//!
//! All generators are seeded so a failing test reproduces exactly.
//! Points are returned as `[x, y]` pairs, which convert into the renderer's
//! point type.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniformly distributed points inside a `width`×`height` surface.
///
/// # Example
///
/// ```
/// use test_utils::random_points;
///
/// let points = random_points(100, 640.0, 480.0, 7);
/// assert_eq!(points.len(), 100);
/// assert!(points.iter().all(|[x, y]| (0.0..640.0).contains(x) && (0.0..480.0).contains(y)));
/// ```
pub fn random_points(count: usize, width: f64, height: f64, seed: u64) -> Vec<[f64; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| [rng.gen_range(0.0..width), rng.gen_range(0.0..height)])
        .collect()
}

/// Points scattered around `centers`, each within `spread` pixels of one.
///
/// Centers are used round-robin, so every cluster receives about
/// `count / centers.len()` points.
pub fn clustered_points(
    count: usize,
    centers: &[[f64; 2]],
    spread: f64,
    seed: u64,
) -> Vec<[f64; 2]> {
    if centers.is_empty() {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let [cx, cy] = centers[i % centers.len()];
            let angle = rng.gen_range(0.0..std::f64::consts::TAU);
            let dist = rng.gen_range(0.0..=spread);
            [cx + dist * angle.cos(), cy + dist * angle.sin()]
        })
        .collect()
}

/// A regular lattice of `cols`×`rows` points, `spacing` apart, starting at
/// `(spacing / 2, spacing / 2)`.
pub fn grid_points(cols: usize, rows: usize, spacing: f64) -> Vec<[f64; 2]> {
    let mut points = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            points.push([
                (col as f64 + 0.5) * spacing,
                (row as f64 + 0.5) * spacing,
            ]);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_points_is_seeded() {
        assert_eq!(random_points(20, 100.0, 50.0, 1), random_points(20, 100.0, 50.0, 1));
        assert_ne!(random_points(20, 100.0, 50.0, 1), random_points(20, 100.0, 50.0, 2));
    }

    #[test]
    fn test_clustered_points_stay_near_centers() {
        let centers = [[10.0, 10.0], [200.0, 100.0]];
        let points = clustered_points(50, &centers, 5.0, 3);
        assert_eq!(points.len(), 50);
        for (i, [x, y]) in points.iter().enumerate() {
            let [cx, cy] = centers[i % 2];
            assert!(((x - cx).powi(2) + (y - cy).powi(2)).sqrt() <= 5.0 + 1e-9);
        }
        assert!(clustered_points(5, &[], 1.0, 0).is_empty());
    }

    #[test]
    fn test_grid_points_layout() {
        let points = grid_points(3, 2, 10.0);
        assert_eq!(points.len(), 6);
        assert_eq!(points[0], [5.0, 5.0]);
        assert_eq!(points[5], [25.0, 15.0]);
    }
}
