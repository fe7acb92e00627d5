//! Density-adaptive rescaling.
//!
//! Each point is scaled about the origin by a factor between the compression
//! floor (sparsest neighborhood) and 1 (densest neighborhood), then the whole
//! set is re-centered on its centroid.

use crate::items::Point2D;
use crate::physics::SpatialGrid;

pub const DEFAULT_DENSITY_RADIUS: f32 = 15.0;
pub const DEFAULT_COMPRESSION_FACTOR: f32 = 0.4;

pub fn normalize_density(points: &[Point2D]) -> Vec<Point2D> {
    normalize_density_with(points, DEFAULT_DENSITY_RADIUS, DEFAULT_COMPRESSION_FACTOR)
}

/// Rescale `points` by local density and re-center them at the origin.
///
/// A non-positive or non-finite `radius` falls back to the default; the
/// compression factor is clamped into `[0, 1]`. Non-finite points are treated
/// as the origin.
pub fn normalize_density_with(points: &[Point2D], radius: f32, compression_factor: f32) -> Vec<Point2D> {
    match points.len() {
        0 => return Vec::new(),
        1 => return vec![Point2D::ORIGIN],
        _ => {}
    }

    let radius = if radius.is_finite() && radius > 0.0 {
        radius
    } else {
        DEFAULT_DENSITY_RADIUS
    };
    let compression = if compression_factor.is_finite() {
        compression_factor.clamp(0.0, 1.0)
    } else {
        DEFAULT_COMPRESSION_FACTOR
    };

    let points: Vec<Point2D> = points
        .iter()
        .map(|p| if p.is_finite() { *p } else { Point2D::ORIGIN })
        .collect();
    let counts = neighbor_counts(&points, radius);
    let max_count = counts.iter().copied().max().unwrap_or(0);

    let scaled: Vec<Point2D> = points
        .iter()
        .zip(&counts)
        .map(|(point, &count)| {
            let density = if max_count > 0 {
                count as f32 / max_count as f32
            } else {
                0.0
            };
            *point * (compression + (1.0 - compression) * density)
        })
        .collect();

    let centroid = scaled.iter().fold(Point2D::ORIGIN, |acc, p| acc + *p) / scaled.len() as f32;
    tracing::debug!(points = scaled.len(), max_count, "density normalized");
    scaled.into_iter().map(|p| p - centroid).collect()
}

/// Neighbors within `radius` of each point, the point itself excluded.
fn neighbor_counts(points: &[Point2D], radius: f32) -> Vec<usize> {
    let grid: SpatialGrid<usize> = {
        let mut grid = SpatialGrid::new(radius);
        grid.extend(points.iter().copied().enumerate());
        grid
    };
    let radius_sq = radius * radius;
    points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            grid.neighbors(*point)
                .filter(|&&other| other != index && (points[other] - *point).length_sq() <= radius_sq)
                .count()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_inputs() {
        assert!(normalize_density(&[]).is_empty());
        assert_eq!(normalize_density(&[Point2D::new(5.0, 5.0)]), vec![Point2D::ORIGIN]);
    }

    #[test]
    fn counts_exclude_self_and_respect_radius() {
        let points = [
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(0.0, 14.0),
            Point2D::new(100.0, 100.0),
        ];
        assert_eq!(neighbor_counts(&points, 15.0), vec![2, 1, 1, 0]);
    }

    #[test]
    fn result_is_centered() {
        let points = [
            Point2D::new(1.0, 1.0),
            Point2D::new(2.0, 1.0),
            Point2D::new(60.0, -40.0),
            Point2D::new(-30.0, 20.0),
        ];
        let out = normalize_density(&points);
        let sum = out.iter().fold(Point2D::ORIGIN, |acc, p| acc + *p);
        assert!(sum.length() < 1e-3);
    }

    #[test]
    fn sparse_points_compress_more_than_dense() {
        let points = [
            Point2D::new(10.0, 0.0),
            Point2D::new(11.0, 0.0),
            Point2D::new(10.0, 1.0),
            Point2D::new(-100.0, 0.0),
        ];
        let out = normalize_density(&points);
        // dense trio keeps full scale, the outlier shrinks to the floor
        let dense_span = out[0].distance(out[1]);
        assert!((dense_span - 1.0).abs() < 1e-4);
        let outlier_gap = out[3].distance(out[0]);
        assert!((outlier_gap - (10.0 + 100.0 * 0.4)).abs() < 1e-3);
    }

    #[test]
    fn bad_parameters_fall_back() {
        let points = [Point2D::new(0.0, 0.0), Point2D::new(100.0, 0.0)];
        let out = normalize_density_with(&points, f32::NAN, 7.0);
        // compression clamps to 1: pure re-centering
        assert_eq!(out, vec![Point2D::new(-50.0, 0.0), Point2D::new(50.0, 0.0)]);
    }
}
