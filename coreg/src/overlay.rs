//! Weighted overlay of two co-registered rasters for visual checking.

use crate::error::{Error, Result};
use crate::raster::{PixelType, Raster};

/// Default weight of the first raster in [`blend_even`].
pub const DEFAULT_WEIGHT: f64 = 0.5;

/// Linear stretch of the finite samples to `[0, 1]`.
///
/// A constant (or entirely non-finite) raster maps to zeros. NaN samples stay
/// NaN. The result is always `F64`.
pub fn normalize(raster: &Raster) -> Raster {
    match raster.min_max() {
        Some((min, max)) if max > min => {
            let range = max - min;
            raster.map(PixelType::F64, |&v| (v - min) / range)
        }
        _ => raster.map(PixelType::F64, |&v| if v.is_nan() { v } else { 0.0 }),
    }
}

/// `weight_a * normalize(a) + (1 - weight_a) * normalize(b)`.
///
/// # Errors
/// `ShapeMismatch` when the rasters differ in shape.
///
/// # Panics
/// Panics if `weight_a` is outside `[0, 1]`.
pub fn blend(a: &Raster, b: &Raster, weight_a: f64) -> Result<Raster> {
    assert!(
        (0.0..=1.0).contains(&weight_a),
        "blend weight must be in [0, 1], got {}",
        weight_a
    );
    if a.shape() != b.shape() {
        return Err(Error::ShapeMismatch {
            left: a.shape(),
            right: b.shape(),
        });
    }

    let norm_a = normalize(a);
    let norm_b = normalize(b);
    let weight_b = 1.0 - weight_a;
    let samples = norm_a
        .samples()
        .iter()
        .zip(norm_b.samples())
        .map(|(&va, &vb)| weight_a * va + weight_b * vb)
        .collect();

    tracing::debug!(
        "Blended {:?} rasters with weight {:.2}",
        a.shape(),
        weight_a
    );
    Ok(Raster::new(a.width(), a.height(), samples, PixelType::F64))
}

/// Equal-weight blend.
pub fn blend_even(a: &Raster, b: &Raster) -> Result<Raster> {
    blend(a, b, DEFAULT_WEIGHT)
}
