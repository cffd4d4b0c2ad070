//! Landmark-based affine registration.
//!
//! A collaborator picks corresponding points on a fixed and a moving raster;
//! the estimators fit the affine transform mapping moving coordinates onto
//! fixed coordinates, and the resampler pulls the moving raster (plus any
//! auxiliary rasters on the same grid) onto the fixed grid.
//!
//! | Stage | Entry point |
//! |-------|-------------|
//! | Landmarks | [`CorrespondenceSet`] |
//! | Least squares | [`estimate_affine`] |
//! | Robust (RANSAC) | [`estimate_affine_robust`] |
//! | Warping | [`resample`], [`resample_all`] |
//!
//! # Example
//!
//! ```ignore
//! use coreg::registration::{CorrespondenceSet, Role, estimate_affine, resample};
//!
//! let mut points = CorrespondenceSet::new();
//! points.add(Role::Fixed, DVec2::new(10.0, 12.0));
//! points.add(Role::Moving, DVec2::new(14.5, 9.0));
//! // ... at least three pairs
//!
//! let result = estimate_affine(&points)?;
//! println!("{} (RMS {:.3} px)", result.transform, result.rms_error);
//! let registered = resample(&moving, &result.transform, fixed.shape(), &WarpConfig::default());
//! ```

pub mod config;
pub mod correspondence;
pub mod estimate;
pub mod ransac;
pub mod resample;
pub mod result;
pub mod transform;

pub use config::{InterpolationMethod, RansacConfig, WarpConfig};
pub use correspondence::{
    CorrespondenceSet, FitKind, FitReadiness, MIN_PAIRS, RECOMMENDED_ROBUST_PAIRS, Role,
};
pub use estimate::estimate_affine;
pub use ransac::estimate_affine_robust;
pub use resample::{resample, resample_all};
pub use result::RegistrationResult;
pub use transform::{AffineTransform, Decomposition};
