//! Small linear-algebra helpers shared by the estimator and resampler.

mod dmat3;

pub use dmat3::DMat3;

use glam::DVec2;

/// Arithmetic mean of a point set. Returns the origin for an empty slice.
pub(crate) fn centroid(points: &[DVec2]) -> DVec2 {
    if points.is_empty() {
        return DVec2::ZERO;
    }
    points.iter().copied().sum::<DVec2>() / points.len() as f64
}
