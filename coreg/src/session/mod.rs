//! Registration session: rasters, landmarks and the derived results.
//!
//! A [`Session`] holds everything a collaborator (interactive front end or
//! the command-line driver) manipulates while registering a moving dataset
//! onto a fixed one:
//!
//! - the fixed raster (image or `.ang` grid) and its grid header, if any,
//! - the moving raster plus named auxiliary rasters sharing its grid,
//! - the landmark [`CorrespondenceSet`],
//! - the last [`RegistrationResult`] and the last [`RegisteredOutputs`].
//!
//! Operations either succeed completely or return an error with the session
//! unchanged. Loading a raster or re-fitting discards outputs computed from
//! the previous state.


use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glam::DVec2;

use crate::error::{Error, Result};
use crate::grid::{self, EbsdHeader, SizeCheck};
use crate::overlay;
use crate::raster::{self, Raster};
use crate::registration::config::{RansacConfig, WarpConfig};
use crate::registration::correspondence::{CorrespondenceSet, FitKind, FitReadiness, Role};
use crate::registration::estimate::estimate_affine;
use crate::registration::ransac::estimate_affine_robust;
use crate::registration::resample::resample;
use crate::registration::result::RegistrationResult;
use crate::scan_table::{ScanLayer, ScanTable};

/// File name of the exported registered raster.
pub const REGISTERED_FILE: &str = "registered.png";
/// File name of the exported overlay.
pub const OVERLAY_FILE: &str = "overlay.png";

/// Which estimator [`Session::register`] runs.
#[derive(Debug, Clone, PartialEq)]
pub enum FitMode {
    Affine,
    Robust(RansacConfig),
}

/// Rasters produced by [`Session::apply`], all on the fixed raster's grid.
#[derive(Debug, Clone)]
pub struct RegisteredOutputs {
    pub primary: Raster,
    pub auxiliary: Vec<ScanLayer>,
    /// Set by [`Session::overlay`].
    pub overlay: Option<Raster>,
}

#[derive(Debug, Default)]
pub struct Session {
    fixed: Option<Raster>,
    fixed_header: Option<EbsdHeader>,
    moving: Option<Raster>,
    auxiliary: Vec<ScanLayer>,
    points: CorrespondenceSet,
    result: Option<RegistrationResult>,
    outputs: Option<RegisteredOutputs>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- rasters ----

    /// Load an `.ang` grid as the fixed raster. Returns how the declared
    /// grid size was reconciled.
    pub fn load_fixed_grid(&mut self, path: &Path) -> Result<SizeCheck> {
        let parsed = grid::parse(path)?;
        let size_check = parsed.size_check;
        self.fixed = Some(parsed.raster);
        self.fixed_header = Some(parsed.header);
        self.outputs = None;
        Ok(size_check)
    }

    pub fn load_fixed_image(&mut self, path: &Path) -> Result<()> {
        let raster = raster::load_image(path)?;
        self.set_fixed(raster);
        Ok(())
    }

    /// Load a moving image. Auxiliary rasters of a previous moving scan are
    /// dropped.
    pub fn load_moving_image(&mut self, path: &Path) -> Result<()> {
        let raster = raster::load_image(path)?;
        self.set_moving(raster);
        Ok(())
    }

    /// Load a moving scan table, pivoting `primary` into the moving raster
    /// and each of `auxiliary` into a co-registered auxiliary raster.
    pub fn load_moving_scan(
        &mut self,
        path: &Path,
        x_column: &str,
        y_column: &str,
        primary: &str,
        auxiliary: &[&str],
    ) -> Result<()> {
        let table = ScanTable::read(path)?;
        let mut signals = Vec::with_capacity(auxiliary.len() + 1);
        signals.push(primary);
        signals.extend_from_slice(auxiliary);

        let mut layers = table.pivot(x_column, y_column, &signals)?.layers.into_iter();
        let primary_layer = layers
            .next()
            .ok_or_else(|| Error::schema(path.display().to_string(), "no primary layer"))?;

        self.moving = Some(primary_layer.raster);
        self.auxiliary = layers.collect();
        self.outputs = None;
        Ok(())
    }

    pub fn set_fixed(&mut self, raster: Raster) {
        self.fixed = Some(raster);
        self.fixed_header = None;
        self.outputs = None;
    }

    /// Replace the moving raster. Auxiliary rasters are dropped.
    pub fn set_moving(&mut self, raster: Raster) {
        self.moving = Some(raster);
        self.auxiliary.clear();
        self.outputs = None;
    }

    /// Add an auxiliary raster on the moving grid.
    ///
    /// # Errors
    /// `MissingRaster` without a moving raster, `ShapeMismatch` when the
    /// shapes differ.
    pub fn add_auxiliary(&mut self, name: impl Into<String>, raster: Raster) -> Result<()> {
        let moving = self.moving.as_ref().ok_or(Error::MissingRaster { slot: "moving" })?;
        if moving.shape() != raster.shape() {
            return Err(Error::ShapeMismatch {
                left: moving.shape(),
                right: raster.shape(),
            });
        }
        self.auxiliary.push(ScanLayer {
            name: name.into(),
            raster,
        });
        self.outputs = None;
        Ok(())
    }

    pub fn fixed(&self) -> Option<&Raster> {
        self.fixed.as_ref()
    }

    /// Header of the fixed grid, when it was loaded from an `.ang` file.
    pub fn fixed_header(&self) -> Option<&EbsdHeader> {
        self.fixed_header.as_ref()
    }

    pub fn moving(&self) -> Option<&Raster> {
        self.moving.as_ref()
    }

    pub fn auxiliary(&self) -> &[ScanLayer] {
        &self.auxiliary
    }

    // ---- landmarks ----

    pub fn add_point(&mut self, role: Role, x: f64, y: f64) -> usize {
        let index = self.points.add(role, DVec2::new(x, y));
        tracing::debug!("Added {} point {} at ({:.1}, {:.1})", role, index, x, y);
        index
    }

    /// Remove a landmark. Out of range is a no-op.
    pub fn remove_point(&mut self, role: Role, index: usize) -> Option<DVec2> {
        let removed = self.points.remove(role, index);
        if removed.is_some() {
            tracing::debug!("Removed {} point {}", role, index);
        }
        removed
    }

    pub fn clear_points(&mut self, role: Role) {
        self.points.clear(role);
    }

    pub fn points(&self) -> &CorrespondenceSet {
        &self.points
    }

    pub fn readiness(&self, mode: &FitMode) -> FitReadiness {
        let kind = match mode {
            FitMode::Affine => FitKind::LeastSquares,
            FitMode::Robust(_) => FitKind::Robust,
        };
        self.points.validate_for_fit(kind)
    }

    // ---- registration ----

    /// Fit a transform to the current landmarks.
    pub fn register(&mut self, mode: &FitMode) -> Result<&RegistrationResult> {
        if let FitReadiness::BelowRecommended { pairs, recommended } = self.readiness(mode) {
            tracing::warn!(
                "Robust fit with {} pairs; {} or more recommended",
                pairs,
                recommended
            );
        }

        let result = match mode {
            FitMode::Affine => estimate_affine(&self.points)?,
            FitMode::Robust(config) => estimate_affine_robust(&self.points, config)?,
        };
        self.outputs = None;
        Ok(&*self.result.insert(result))
    }

    pub fn result(&self) -> Option<&RegistrationResult> {
        self.result.as_ref()
    }

    /// Resample the moving raster and its auxiliaries onto the fixed grid
    /// with the last fitted transform.
    pub fn apply(&mut self, config: &WarpConfig) -> Result<&RegisteredOutputs> {
        let result = self.result.as_ref().ok_or(Error::MissingTransform)?;
        let fixed = self.fixed.as_ref().ok_or(Error::MissingRaster { slot: "fixed" })?;
        let moving = self.moving.as_ref().ok_or(Error::MissingRaster { slot: "moving" })?;

        let target_shape = fixed.shape();
        let transform = &result.transform;
        let primary = resample(moving, transform, target_shape, config);
        let auxiliary = self
            .auxiliary
            .iter()
            .map(|layer| ScanLayer {
                name: layer.name.clone(),
                raster: resample(&layer.raster, transform, target_shape, config),
            })
            .collect::<Vec<_>>();

        tracing::info!(
            "Resampled moving raster and {} auxiliary raster(s) onto {:?} grid",
            auxiliary.len(),
            target_shape
        );
        Ok(&*self.outputs.insert(RegisteredOutputs {
            primary,
            auxiliary,
            overlay: None,
        }))
    }

    pub fn outputs(&self) -> Option<&RegisteredOutputs> {
        self.outputs.as_ref()
    }

    /// Blend the fixed raster with the registered raster,
    /// `weight_fixed * fixed + (1 - weight_fixed) * registered`.
    pub fn overlay(&mut self, weight_fixed: f64) -> Result<&Raster> {
        let fixed = self.fixed.as_ref().ok_or(Error::MissingRaster { slot: "fixed" })?;
        let outputs = self
            .outputs
            .as_mut()
            .ok_or(Error::MissingRaster { slot: "registered" })?;

        let blended = overlay::blend(fixed, &outputs.primary, weight_fixed)?;
        Ok(&*outputs.overlay.insert(blended))
    }

    /// Write the registered outputs into `dir`: the primary raster as
    /// `registered.png`, the overlay (if built) as `overlay.png`, and every
    /// auxiliary raster as `<name>.txt` delimited text. Names that map to the
    /// same file get a `_2`, `_3`, ... suffix.
    ///
    /// Returns the written paths.
    pub fn export(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let outputs = self
            .outputs
            .as_ref()
            .ok_or(Error::MissingRaster { slot: "registered" })?;
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

        let mut written = Vec::new();

        let path = dir.join(REGISTERED_FILE);
        raster::save_image(&outputs.primary, &path)?;
        written.push(path);

        if let Some(overlay) = &outputs.overlay {
            let path = dir.join(OVERLAY_FILE);
            raster::save_image(overlay, &path)?;
            written.push(path);
        }

        let mut used_stems = HashSet::new();
        for layer in &outputs.auxiliary {
            let stem = unique_stem(file_stem_for(&layer.name), &mut used_stems);
            let path = dir.join(format!("{stem}.txt"));
            raster::save_delimited(&layer.raster, &path)?;
            written.push(path);
        }

        tracing::info!("Exported {} file(s) to '{}'", written.len(), dir.display());
        Ok(written)
    }
}

/// Column names may contain characters unsuitable for file names.
fn file_stem_for(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "auxiliary".to_string()
    } else {
        stem
    }
}

/// `stem`, or `stem_N` with the smallest `N >= 2` not yet in `used`.
fn unique_stem(stem: String, used: &mut HashSet<String>) -> String {
    let mut candidate = stem.clone();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{stem}_{n}");
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}
