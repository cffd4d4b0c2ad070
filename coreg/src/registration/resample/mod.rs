//! Raster resampling through an affine transform.
//!
//! Output pixel `(col, row)` is sampled from the source at
//! `transform.apply_inverse((col, row))`. Pixel centres sit at integer
//! coordinates, so the identity transform reproduces the source exactly.

#[cfg(test)]
mod tests;

use glam::DVec2;
use rayon::prelude::*;

use crate::raster::Raster;
use crate::registration::config::{InterpolationMethod, WarpConfig};
use crate::registration::transform::AffineTransform;

/// Number of rows to process per parallel chunk.
const ROWS_PER_CHUNK: usize = 16;

/// Resample `source` onto a `target_shape = (rows, cols)` grid.
///
/// Samples falling outside the source take `config.fill_value`. NaN source
/// samples propagate. The output keeps the source pixel type; integer types
/// are rounded and clamped to their range.
pub fn resample(
    source: &Raster,
    transform: &AffineTransform,
    target_shape: (usize, usize),
    config: &WarpConfig,
) -> Raster {
    let (rows, cols) = target_shape;
    let mut samples = vec![0.0f64; rows * cols];

    if cols > 0 {
        samples
            .par_chunks_mut(cols * ROWS_PER_CHUNK)
            .enumerate()
            .for_each(|(chunk_idx, chunk)| {
                let start_row = chunk_idx * ROWS_PER_CHUNK;
                for (row_in_chunk, row) in chunk.chunks_exact_mut(cols).enumerate() {
                    let y = (start_row + row_in_chunk) as f64;
                    for (x, out) in row.iter_mut().enumerate() {
                        let src = transform.apply_inverse(DVec2::new(x as f64, y));
                        *out = sample(source, src, config);
                    }
                }
            });
    }

    // Raster::new rounds and clamps integer pixel types
    Raster::new(cols, rows, samples, source.pixel_type())
}

/// Resample every raster in `sources` with the same transform and target grid.
pub fn resample_all(
    sources: &[Raster],
    transform: &AffineTransform,
    target_shape: (usize, usize),
    config: &WarpConfig,
) -> Vec<Raster> {
    sources
        .iter()
        .map(|source| resample(source, transform, target_shape, config))
        .collect()
}

#[inline]
fn sample(source: &Raster, p: DVec2, config: &WarpConfig) -> f64 {
    match config.method {
        InterpolationMethod::Nearest => sample_nearest(source, p, config.fill_value),
        InterpolationMethod::Bilinear => sample_bilinear(source, p, config.fill_value),
    }
}

#[inline]
fn sample_or_fill(source: &Raster, x: i64, y: i64, fill: f64) -> f64 {
    source.try_get(x, y).unwrap_or(fill)
}

#[inline]
fn sample_nearest(source: &Raster, p: DVec2, fill: f64) -> f64 {
    if !p.is_finite() {
        return fill;
    }
    sample_or_fill(source, p.x.round() as i64, p.y.round() as i64, fill)
}

/// Bilinear sample. Neighbours outside the source contribute `fill`;
/// neighbours with zero weight are not read, so integer positions return the
/// exact source sample.
#[inline]
fn sample_bilinear(source: &Raster, p: DVec2, fill: f64) -> f64 {
    if !p.is_finite() {
        return fill;
    }
    let x0 = p.x.floor();
    let y0 = p.y.floor();
    let fx = p.x - x0;
    let fy = p.y - y0;
    let x0 = x0 as i64;
    let y0 = y0 as i64;

    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1, y0, fx * (1.0 - fy)),
        (x0, y0 + 1, (1.0 - fx) * fy),
        (x0 + 1, y0 + 1, fx * fy),
    ];

    let mut sum = 0.0;
    for (x, y, weight) in taps {
        if weight != 0.0 {
            sum += weight * sample_or_fill(source, x, y, fill);
        }
    }
    sum
}
