//! Session description file read by `coreg register`.
//!
//! ```yaml
//! fixed:
//!   grid: scan.ang
//! moving:
//!   scan:
//!     path: lrs.csv
//!     x_column: X
//!     y_column: Y
//!     primary: Intensity
//!     auxiliary: [Wavenumber]
//! points:
//!   fixed: [[40.0, 32.0], [120.5, 30.0], [80.0, 95.0]]
//!   moving: [[51.5, 20.0], [130.0, 22.5], [88.0, 84.0]]
//! fit: robust
//! ransac:
//!   inlier_threshold: 1.5
//! output: out
//! ```
//!
//! Relative paths are resolved against the directory of the session file.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use coreg::{CorrespondenceSet, FitMode, RansacConfig, WarpConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedSource {
    /// EBSD `.ang` grid file
    Grid(PathBuf),
    Image(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovingSource {
    Image(PathBuf),
    /// Delimited scan table pivoted on two coordinate columns
    Scan(ScanSource),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSource {
    pub path: PathBuf,
    pub x_column: String,
    pub y_column: String,
    pub primary: String,
    #[serde(default)]
    pub auxiliary: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    #[default]
    Affine,
    Robust,
}

fn default_overlay_weight() -> f64 {
    coreg::overlay::DEFAULT_WEIGHT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFile {
    pub fixed: FixedSource,
    pub moving: MovingSource,
    pub points: CorrespondenceSet,
    #[serde(default)]
    pub fit: FitMethod,
    #[serde(default)]
    pub ransac: RansacConfig,
    #[serde(default)]
    pub warp: WarpConfig,
    /// Weight of the fixed raster in the overlay.
    #[serde(default = "default_overlay_weight")]
    pub overlay_weight: f64,
    pub output: PathBuf,
}

impl SessionFile {
    /// Load a YAML or JSON session file and resolve its relative paths.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut session: SessionFile = common::serde::load_file(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        session.resolve_paths(base);
        session
            .check()
            .with_context(|| format!("Invalid session file {}", path.display()))?;
        Ok(session)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        match &mut self.fixed {
            FixedSource::Grid(p) | FixedSource::Image(p) => resolve(p),
        }
        match &mut self.moving {
            MovingSource::Image(p) => resolve(p),
            MovingSource::Scan(scan) => resolve(&mut scan.path),
        }
        resolve(&mut self.output);
    }

    /// Reject values the library treats as programmer errors.
    pub fn check(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.overlay_weight) {
            bail!("overlay_weight must be in [0, 1], got {}", self.overlay_weight);
        }
        if self.fit == FitMethod::Robust {
            let ransac = &self.ransac;
            if ransac.max_iterations == 0 {
                bail!("ransac.max_iterations must be positive");
            }
            if !ransac.inlier_threshold.is_finite() || ransac.inlier_threshold <= 0.0 {
                bail!(
                    "ransac.inlier_threshold must be a positive finite distance, got {}",
                    ransac.inlier_threshold
                );
            }
            if ransac.min_inliers < coreg::registration::MIN_PAIRS {
                bail!(
                    "ransac.min_inliers must be at least {}, got {}",
                    coreg::registration::MIN_PAIRS,
                    ransac.min_inliers
                );
            }
        }
        Ok(())
    }

    pub fn fit_mode(&self) -> FitMode {
        match self.fit {
            FitMethod::Affine => FitMode::Affine,
            FitMethod::Robust => FitMode::Robust(self.ransac.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::FileFormat;
    use glam::DVec2;

    const YAML: &str = r#"
fixed:
  grid: scan.ang
moving:
  scan:
    path: lrs.csv
    x_column: X
    y_column: Y
    primary: Intensity
    auxiliary: [Wavenumber]
points:
  fixed: [[40.0, 32.0], [120.5, 30.0], [80.0, 95.0]]
  moving: [[51.5, 20.0], [130.0, 22.5], [88.0, 84.0]]
fit: robust
ransac:
  inlier_threshold: 1.5
output: out
"#;

    #[test]
    fn test_parse_yaml_with_defaults() {
        let session: SessionFile =
            common::serde::deserialize(YAML.as_bytes(), FileFormat::Yaml).unwrap();

        assert_eq!(session.fixed, FixedSource::Grid(PathBuf::from("scan.ang")));
        assert_eq!(session.points.pair_count(), 3);
        assert_eq!(session.points.moving()[0], DVec2::new(51.5, 20.0));
        assert_eq!(session.overlay_weight, 0.5);
        assert_eq!(session.warp, WarpConfig::default());

        match session.fit_mode() {
            FitMode::Robust(config) => {
                assert_eq!(config.inlier_threshold, 1.5);
                assert_eq!(config.max_iterations, RansacConfig::default().max_iterations);
            }
            FitMode::Affine => panic!("expected robust fit"),
        }
    }

    #[test]
    fn test_resolve_paths_keeps_absolute() {
        let mut session: SessionFile =
            common::serde::deserialize(YAML.as_bytes(), FileFormat::Yaml).unwrap();
        session.output = PathBuf::from("/tmp/coreg-out");
        session.resolve_paths(Path::new("/data/run1"));

        assert_eq!(
            session.fixed,
            FixedSource::Grid(PathBuf::from("/data/run1/scan.ang"))
        );
        match &session.moving {
            MovingSource::Scan(scan) => assert_eq!(scan.path, Path::new("/data/run1/lrs.csv")),
            MovingSource::Image(_) => panic!("expected scan source"),
        }
        assert_eq!(session.output, Path::new("/tmp/coreg-out"));
    }

    #[test]
    fn test_check_rejects_bad_values() {
        let mut session: SessionFile =
            common::serde::deserialize(YAML.as_bytes(), FileFormat::Yaml).unwrap();
        assert!(session.check().is_ok());

        session.ransac.min_inliers = 2;
        assert!(session.check().is_err());

        session.ransac.min_inliers = 3;
        session.overlay_weight = 1.5;
        assert!(session.check().is_err());
    }

    #[test]
    fn test_check_rejects_infinite_threshold() {
        let text = YAML.replace("inlier_threshold: 1.5", "inlier_threshold: .inf");
        let session: SessionFile =
            common::serde::deserialize(text.as_bytes(), FileFormat::Yaml).unwrap();
        assert!(session.ransac.inlier_threshold.is_infinite());
        assert!(session.check().is_err());
    }
}
