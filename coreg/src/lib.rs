//! Coreg - correlative registration of EBSD and Raman scan rasters.
//!
//! This library provides the pieces needed to bring a moving dataset (for
//! example a Raman/LRS intensity map) onto the grid of a fixed one (an EBSD
//! intensity image):
//! - `.ang` grid file parsing and tabular scan pivoting into rasters
//! - Landmark correspondences and affine estimation (least squares, RANSAC)
//! - Inverse-mapping resampling of the moving raster and its auxiliaries
//! - A normalized overlay for visual checking
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use coreg::{FitMode, Role, Session, WarpConfig};
//!
//! let mut session = Session::new();
//! session.load_fixed_grid(Path::new("scan.ang"))?;
//! session.load_moving_image(Path::new("raman.png"))?;
//!
//! session.add_point(Role::Fixed, 40.0, 32.0);
//! session.add_point(Role::Moving, 51.5, 20.0);
//! // ... at least three pairs
//!
//! let result = session.register(&FitMode::Affine)?;
//! println!("{}", result.transform);
//!
//! session.apply(&WarpConfig::default())?;
//! session.overlay(0.5)?;
//! session.export(Path::new("out"))?;
//! ```

pub mod error;
pub mod grid;
pub(crate) mod math;
pub mod overlay;
pub mod raster;
pub mod registration;
pub mod scan_table;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use std::path::Path;

// ============================================================================
// Errors
// ============================================================================

pub use error::{DegenerateReason, Error, Result};

// ============================================================================
// Input data
// ============================================================================

pub use grid::{EbsdHeader, GridParse, GridTable, SizeCheck};
pub use raster::{PixelType, Raster, load_delimited, save_delimited};
pub use scan_table::{ScanGrid, ScanLayer, ScanTable};

// ============================================================================
// Registration
// ============================================================================

pub use math::DMat3;
pub use registration::{
    // Core types
    AffineTransform,
    CorrespondenceSet,
    Decomposition,
    FitKind,
    FitReadiness,
    // Configuration
    InterpolationMethod,
    RansacConfig,
    // Results
    RegistrationResult,
    Role,
    WarpConfig,
    // Top-level functions
    estimate_affine,
    estimate_affine_robust,
    resample,
    resample_all,
};

// ============================================================================
// Overlay and session
// ============================================================================

pub use overlay::{blend, blend_even, normalize};
pub use session::{FitMode, RegisteredOutputs, Session};

/// Parse an `.ang` grid file into its header and intensity raster.
pub fn load_grid_file(path: &Path) -> Result<GridParse> {
    grid::parse(path)
}

/// Load a grayscale raster from any supported image file.
pub fn load_image(path: &Path) -> Result<Raster> {
    raster::load_image(path)
}

/// Write a raster as an image, format chosen by the file extension.
pub fn save_raster(raster: &Raster, path: &Path) -> Result<()> {
    raster::save_image(raster, path)
}
