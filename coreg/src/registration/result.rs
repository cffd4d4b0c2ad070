//! Registration result and fit diagnostics.

use crate::registration::correspondence::{CorrespondenceSet, FitKind};
use crate::registration::transform::{AffineTransform, Decomposition};

/// Result of fitting a transform to a correspondence set.
#[derive(Debug, Clone)]
pub struct RegistrationResult {
    /// Fitted moving → fixed transform.
    pub transform: AffineTransform,

    /// Rotation, scale and translation readouts of `transform`.
    pub decomposition: Decomposition,

    /// Estimator that produced the transform.
    pub method: FitKind,

    /// Indices of pairs accepted as inliers. Every pair for least squares.
    pub inliers: Vec<usize>,

    /// Per-pair residual `|T(moving_i) - fixed_i|` in pixels, for all pairs.
    pub residuals: Vec<f64>,

    /// RMS of the inlier residuals in pixels.
    pub rms_error: f64,

    /// Largest inlier residual in pixels.
    pub max_error: f64,

    /// Minimal samples evaluated. Zero for least squares.
    pub iterations: usize,
}

impl RegistrationResult {
    pub fn new(
        transform: AffineTransform,
        method: FitKind,
        inliers: Vec<usize>,
        residuals: Vec<f64>,
        iterations: usize,
    ) -> Self {
        let (rms_error, max_error) = if inliers.is_empty() {
            (0.0, 0.0)
        } else {
            let sum_sq: f64 = inliers.iter().map(|&i| residuals[i] * residuals[i]).sum();
            let max = inliers.iter().map(|&i| residuals[i]).fold(0.0, f64::max);
            ((sum_sq / inliers.len() as f64).sqrt(), max)
        };

        Self {
            decomposition: transform.decompose(),
            transform,
            method,
            inliers,
            residuals,
            rms_error,
            max_error,
            iterations,
        }
    }

    pub fn num_inliers(&self) -> usize {
        self.inliers.len()
    }

    pub fn inlier_ratio(&self) -> f64 {
        if self.residuals.is_empty() {
            0.0
        } else {
            self.inliers.len() as f64 / self.residuals.len() as f64
        }
    }

    pub fn is_inlier(&self, index: usize) -> bool {
        self.inliers.binary_search(&index).is_ok()
    }
}

/// `|T(moving_i) - fixed_i|` for every pair.
pub(crate) fn pair_residuals(transform: &AffineTransform, set: &CorrespondenceSet) -> Vec<f64> {
    set.pairs()
        .map(|(fixed, moving)| (transform.apply(moving) - fixed).length())
        .collect()
}
