//! Configuration types for the registration module.

use serde::{Deserialize, Serialize};

use crate::registration::correspondence::MIN_PAIRS;

// =============================================================================
// Resampling configuration
// =============================================================================

/// Interpolation method for raster resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMethod {
    /// Nearest neighbor - keeps original sample values, blocky edges
    Nearest,
    /// Bilinear interpolation - default
    #[default]
    Bilinear,
}

/// Configuration for resampling a raster through a transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    pub method: InterpolationMethod,
    /// Value used for samples that fall outside the source raster.
    pub fill_value: f64,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            method: InterpolationMethod::default(),
            fill_value: 0.0,
        }
    }
}

// =============================================================================
// RANSAC configuration
// =============================================================================

/// Robust affine fit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacConfig {
    /// Upper bound on minimal samples tried. When every 3-pair combination
    /// fits under this bound, all of them are tried in order instead.
    pub max_iterations: usize,
    /// Inlier distance threshold in pixels (inclusive).
    pub inlier_threshold: f64,
    /// Fewest inliers the best model must have.
    pub min_inliers: usize,
    /// Re-fit the winning model by least squares on its inliers.
    /// With `false` the exact 3-pair model is returned.
    pub refit_on_inliers: bool,
    /// Random seed for reproducibility (None for random).
    pub seed: Option<u64>,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            inlier_threshold: 2.0,
            min_inliers: MIN_PAIRS,
            refit_on_inliers: true,
            seed: None,
        }
    }
}

impl RansacConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) {
        assert!(
            self.max_iterations > 0,
            "RANSAC max_iterations must be positive, got {}",
            self.max_iterations
        );
        assert!(
            self.inlier_threshold.is_finite() && self.inlier_threshold > 0.0,
            "RANSAC inlier_threshold must be positive, got {}",
            self.inlier_threshold
        );
        assert!(
            self.min_inliers >= MIN_PAIRS,
            "RANSAC min_inliers must be at least {}, got {}",
            MIN_PAIRS,
            self.min_inliers
        );
    }
}
