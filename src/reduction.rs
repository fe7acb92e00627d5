//! Dimensionality reduction for embeddings.
//!
//! Projects high-dimensional vectors onto their top principal directions via
//! power iteration on the implicit covariance `Xᵀ X` (the D×D matrix is never
//! formed), then rescales so the bounding box's longest side spans a fixed
//! width. Iteration starts from a random vector, so two runs agree on
//! geometry up to rotation/reflection, not bit for bit.
//!
//! [`place_new_point`] positions one extra vector relative to an existing
//! projection without recomputing it.

use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use std::cmp::Ordering;

use crate::config::ReductionConfig;
use crate::items::{Point2D, Point3D};

const NORM_EPSILON: f64 = 1e-12;

/// Project embeddings onto the plane of maximal variance.
pub fn reduce_to_plane<E: AsRef<[f32]>>(embeddings: &[E]) -> Vec<Point2D> {
    reduce_to_plane_with(embeddings, &ReductionConfig::default(), &mut rand::thread_rng())
}

/// [`reduce_to_plane`] with explicit configuration and random source.
pub fn reduce_to_plane_with<E: AsRef<[f32]>, R: Rng>(
    embeddings: &[E],
    config: &ReductionConfig,
    rng: &mut R,
) -> Vec<Point2D> {
    let coords = principal_coordinates(embeddings, 2, config, rng);
    coords
        .rows()
        .into_iter()
        .map(|row| Point2D::new(row[0] as f32, row[1] as f32))
        .collect()
}

/// Project embeddings onto the three top variance directions.
pub fn reduce_to_space<E: AsRef<[f32]>>(embeddings: &[E]) -> Vec<Point3D> {
    reduce_to_space_with(embeddings, &ReductionConfig::default(), &mut rand::thread_rng())
}

/// [`reduce_to_space`] with explicit configuration and random source.
pub fn reduce_to_space_with<E: AsRef<[f32]>, R: Rng>(
    embeddings: &[E],
    config: &ReductionConfig,
    rng: &mut R,
) -> Vec<Point3D> {
    let coords = principal_coordinates(embeddings, 3, config, rng);
    coords
        .rows()
        .into_iter()
        .map(|row| Point3D::new(row[0] as f32, row[1] as f32, row[2] as f32))
        .collect()
}

/// Place a new embedding at the centroid of its nearest existing neighbors.
///
/// Uses `k = min(5, N)` neighbors by Euclidean distance in embedding space.
pub fn place_new_point<E: AsRef<[f32]>>(
    new_embedding: &[f32],
    existing_embeddings: &[E],
    existing_points: &[Point2D],
) -> Point2D {
    place_new_point_with_k(
        new_embedding,
        existing_embeddings,
        existing_points,
        ReductionConfig::default().neighbors,
    )
}

/// [`place_new_point`] with an explicit neighbor count.
///
/// Existing entries whose dimensionality differs from `new_embedding` are
/// ignored; with no usable neighbors the result is the origin.
pub fn place_new_point_with_k<E: AsRef<[f32]>>(
    new_embedding: &[f32],
    existing_embeddings: &[E],
    existing_points: &[Point2D],
    k: usize,
) -> Point2D {
    let mut candidates: Vec<(f32, Point2D)> = existing_embeddings
        .iter()
        .zip(existing_points)
        .filter(|(embedding, _)| embedding.as_ref().len() == new_embedding.len())
        .map(|(embedding, point)| (euclidean_distance(new_embedding, embedding.as_ref()), *point))
        .filter(|(distance, point)| distance.is_finite() && point.is_finite())
        .collect();

    let k = k.min(candidates.len());
    if k == 0 {
        return Point2D::ORIGIN;
    }

    candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    let sum = candidates[..k]
        .iter()
        .fold(Point2D::ORIGIN, |acc, (_, point)| acc + *point);
    sum / k as f32
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Centered data projected onto `dims` principal directions, normalized to
/// `config.target_span`. Degenerate input yields all-zero rows.
fn principal_coordinates<E: AsRef<[f32]>, R: Rng>(
    embeddings: &[E],
    dims: usize,
    config: &ReductionConfig,
    rng: &mut R,
) -> Array2<f64> {
    let n = embeddings.len();
    let mut coords = Array2::<f64>::zeros((n, dims));
    if n < 2 {
        return coords;
    }

    let dim = embeddings[0].as_ref().len();
    if dim == 0 {
        return coords;
    }
    if let Some(bad) = embeddings.iter().find(|e| e.as_ref().len() != dim) {
        tracing::warn!(
            expected = dim,
            found = bad.as_ref().len(),
            "embedding dimension mismatch, placing all points at origin"
        );
        return coords;
    }

    let mut data = Array2::<f64>::zeros((n, dim));
    for (i, embedding) in embeddings.iter().enumerate() {
        for (j, &value) in embedding.as_ref().iter().enumerate() {
            data[[i, j]] = if value.is_finite() { value as f64 } else { 0.0 };
        }
    }

    let Some(mean) = data.mean_axis(Axis(0)) else {
        return coords;
    };
    data -= &mean;

    let mut components: Vec<Array1<f64>> = Vec::with_capacity(dims);
    for _ in 0..dims {
        let direction = power_iteration(&data, &components, config.iterations, rng);
        components.push(direction);
    }

    for (k, component) in components.iter().enumerate() {
        let projected = data.dot(component);
        coords.column_mut(k).assign(&projected);
    }

    normalize_span(&mut coords, config.target_span as f64);
    tracing::debug!(points = n, dim, dims, "embeddings reduced");
    coords
}

/// Dominant direction of `data`'s covariance orthogonal to `found`.
///
/// Returns a zero vector when the remaining variance vanishes.
fn power_iteration<R: Rng>(
    data: &Array2<f64>,
    found: &[Array1<f64>],
    iterations: usize,
    rng: &mut R,
) -> Array1<f64> {
    let dim = data.ncols();
    let mut v = Array1::from_shape_fn(dim, |_| rng.gen_range(-1.0..1.0));
    project_out(&mut v, found);
    if !normalize(&mut v) {
        return Array1::zeros(dim);
    }

    for _ in 0..iterations.max(1) {
        let mut next = data.t().dot(&data.dot(&v));
        project_out(&mut next, found);
        if !normalize(&mut next) {
            return Array1::zeros(dim);
        }
        v = next;
    }

    v
}

fn project_out(v: &mut Array1<f64>, found: &[Array1<f64>]) {
    for component in found {
        let along = component.dot(v);
        v.scaled_add(-along, component);
    }
}

fn normalize(v: &mut Array1<f64>) -> bool {
    let norm = v.dot(v).sqrt();
    if !norm.is_finite() || norm < NORM_EPSILON {
        return false;
    }
    *v /= norm;
    true
}

/// Center the bounding box at the origin and scale its longest side to `span`.
fn normalize_span(coords: &mut Array2<f64>, span: f64) {
    let dims = coords.ncols();
    let mut mins = vec![f64::INFINITY; dims];
    let mut maxs = vec![f64::NEG_INFINITY; dims];
    for row in coords.rows() {
        for (k, &value) in row.iter().enumerate() {
            mins[k] = mins[k].min(value);
            maxs[k] = maxs[k].max(value);
        }
    }

    let longest = mins
        .iter()
        .zip(&maxs)
        .map(|(lo, hi)| hi - lo)
        .fold(0.0_f64, f64::max);
    if !longest.is_finite() || longest < NORM_EPSILON {
        coords.fill(0.0);
        return;
    }

    let scale = span / longest;
    for mut row in coords.rows_mut() {
        for (k, value) in row.iter_mut().enumerate() {
            let center = (mins[k] + maxs[k]) / 2.0;
            *value = (*value - center) * scale;
        }
    }
}
