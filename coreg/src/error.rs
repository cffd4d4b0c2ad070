use std::path::PathBuf;

use thiserror::Error;

use crate::grid::GridTable;

/// Why a transform could not be fitted from the given points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateReason {
    /// Fewer correspondences than the model needs.
    InsufficientPoints { found: usize, required: usize },
    /// Moving points are collinear or coincident; the system is rank deficient.
    Collinear,
    /// The fitted linear part is singular and cannot be inverted.
    SingularTransform,
}

impl std::fmt::Display for DegenerateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegenerateReason::InsufficientPoints { found, required } => {
                write!(f, "{} point pairs given, at least {} required", found, required)
            }
            DegenerateReason::Collinear => write!(f, "moving points are collinear"),
            DegenerateReason::SingularTransform => write!(f, "fitted transform is singular"),
        }
    }
}

/// Errors surfaced to the collaborator. None of them leave a session in a
/// partially updated state.
#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    #[error("Schema error in {context}: {reason}")]
    Schema { context: String, reason: String },

    #[error("Grid size mismatch: header declares {expected} samples, file has {actual}")]
    SizeMismatch {
        expected: usize,
        actual: usize,
        /// Parsed header and samples, for callers that want to reshape themselves.
        table: Box<GridTable>,
    },

    #[error("Degenerate fit: {reason}")]
    DegenerateFit { reason: DegenerateReason },

    #[error("Correspondence lists differ in length: {fixed} fixed, {moving} moving")]
    MismatchedPairs { fixed: usize, moving: usize },

    #[error(
        "No consensus: best model has {best_inliers} inliers, need {required} ({iterations} samples tried)"
    )]
    NoConsensus {
        best_inliers: usize,
        required: usize,
        iterations: usize,
    },

    #[error("Raster shapes differ: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("No {slot} raster loaded")]
    MissingRaster { slot: &'static str },

    #[error("No transform has been estimated yet")]
    MissingTransform,

    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to process image '{path}': {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to read table '{path}': {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

impl Error {
    pub(crate) fn schema(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Schema {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn degenerate(reason: DegenerateReason) -> Self {
        Error::DegenerateFit { reason }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Fail with [`Error::FileNotFound`] unless `path` is an existing regular file.
pub(crate) fn ensure_file_exists(path: &std::path::Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}
