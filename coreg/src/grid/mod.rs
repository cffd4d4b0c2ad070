//! EBSD scan-grid (`.ang`) parser.
//!
//! An `.ang` file starts with `# KEY: value` header lines followed by a
//! whitespace-delimited numeric table with one row per scan point. Column 5
//! (the sixth) carries the image-quality signal that becomes the intensity
//! raster.
//!
//! Parsing is split into two stages so a caller can intervene when the
//! declared grid and the data disagree:
//!
//! 1. [`GridTable::read`] collects the header and the numeric rows.
//! 2. [`GridTable::into_raster`] reconciles the declared `NROWS x NCOLS_ODD`
//!    with the number of samples and reshapes.
//!
//! A table exactly one `NCOLS_ODD` row short of the header is a known
//! header defect: the row count is corrected and reported through
//! [`SizeCheck::RowTrimmed`]. Any other disagreement is
//! [`Error::SizeMismatch`], which carries the parsed table.

mod header;


pub use header::{EbsdHeader, HEADER_KEYS};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result, ensure_file_exists};
use crate::raster::{PixelType, Raster};

/// Zero-based index of the image-quality column.
pub const INTENSITY_COLUMN: usize = 5;

/// How the sample count matched the declared grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCheck {
    /// `NROWS * NCOLS_ODD` samples, as declared.
    Exact,
    /// One full row short; `NROWS` was reduced to `used_rows`.
    RowTrimmed {
        declared_rows: usize,
        used_rows: usize,
    },
}

/// Successful parse: header (possibly corrected), raster and how the size
/// was reconciled.
#[derive(Debug, Clone)]
pub struct GridParse {
    pub header: EbsdHeader,
    pub raster: Raster,
    pub size_check: SizeCheck,
}

/// Header and numeric rows of a grid file, before reshaping.
#[derive(Debug, Clone, PartialEq)]
pub struct GridTable {
    source: PathBuf,
    header: EbsdHeader,
    rows: Vec<Vec<f64>>,
    skipped_rows: usize,
}

impl GridTable {
    /// Read header and table from `path`.
    pub fn read(path: &Path) -> Result<Self> {
        ensure_file_exists(path)?;
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let table = Self::from_reader(BufReader::new(file), path)?;

        tracing::debug!(
            "Read grid '{}': {} rows, {} skipped, header {:?}",
            path.display(),
            table.rows.len(),
            table.skipped_rows,
            table.header
        );
        Ok(table)
    }

    /// Parse from any buffered reader; `source` names the input in errors.
    pub fn from_reader(reader: impl BufRead, source: &Path) -> Result<Self> {
        let mut header = EbsdHeader::default();
        let mut rows = Vec::new();
        let mut skipped_rows = 0;

        for line in reader.lines() {
            let line = line.map_err(|e| Error::io(source, e))?;
            let line = line.trim_start();

            if line.starts_with('#') {
                header.accept_line(line);
                continue;
            }

            let data = match line.split_once('#') {
                Some((data, _comment)) => data,
                None => line,
            };
            if data.trim().is_empty() {
                continue;
            }

            match data
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vec<f64>, _>>()
            {
                Ok(values) => rows.push(values),
                Err(_) => skipped_rows += 1,
            }
        }

        if skipped_rows > 0 {
            tracing::debug!(
                "Skipped {} unparsable rows in '{}'",
                skipped_rows,
                source.display()
            );
        }

        Ok(Self {
            source: source.to_path_buf(),
            header,
            rows,
            skipped_rows,
        })
    }

    pub fn header(&self) -> &EbsdHeader {
        &self.header
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Parsed numeric rows in file order.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of data rows dropped because a token was not a number.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Values of `index` from every row long enough to have it.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.get(index).copied())
            .collect()
    }

    /// Reshape the intensity column into the declared grid.
    pub fn into_raster(self) -> Result<GridParse> {
        match self.reshape(INTENSITY_COLUMN)? {
            Reshaped::Grid(parsed) => Ok(parsed),
            Reshaped::Mismatch { expected, actual } => Err(Error::SizeMismatch {
                expected,
                actual,
                table: Box::new(self),
            }),
        }
    }

    /// Reshape any column, leaving the table in place. Useful for the
    /// confidence-index or phase columns of the same scan.
    pub fn column_raster(&self, index: usize) -> Result<GridParse> {
        match self.reshape(index)? {
            Reshaped::Grid(parsed) => Ok(parsed),
            Reshaped::Mismatch { expected, actual } => Err(Error::SizeMismatch {
                expected,
                actual,
                table: Box::new(self.clone()),
            }),
        }
    }

    fn reshape(&self, index: usize) -> Result<Reshaped> {
        let samples = self.column(index);
        if samples.is_empty() {
            return Err(self.missing_column(index));
        }

        Ok(match reconcile(&self.header, samples.len(), &self.source)? {
            Reconciled::Fits {
                rows,
                cols,
                size_check,
            } => Reshaped::Grid(self.build(samples, rows, cols, size_check)),
            Reconciled::Mismatch { expected, actual } => Reshaped::Mismatch { expected, actual },
        })
    }

    fn build(&self, samples: Vec<f64>, rows: usize, cols: usize, size_check: SizeCheck) -> GridParse {
        let mut header = self.header;
        match size_check {
            SizeCheck::Exact => {
                tracing::info!(
                    "Grid '{}' matches header: {} x {}",
                    self.source.display(),
                    rows,
                    cols
                );
            }
            SizeCheck::RowTrimmed {
                declared_rows,
                used_rows,
            } => {
                header.nrows = Some(used_rows as f64);
                tracing::warn!(
                    "Grid '{}' is one row short: reducing rows from {} to {}",
                    self.source.display(),
                    declared_rows,
                    used_rows
                );
            }
        }

        GridParse {
            header,
            raster: Raster::new(cols, rows, samples, PixelType::F64),
            size_check,
        }
    }

    fn missing_column(&self, index: usize) -> Error {
        Error::schema(
            self.source.display().to_string(),
            format!("column {} not found in data", index + 1),
        )
    }
}

enum Reshaped {
    Grid(GridParse),
    Mismatch { expected: usize, actual: usize },
}

enum Reconciled {
    Fits {
        rows: usize,
        cols: usize,
        size_check: SizeCheck,
    },
    Mismatch {
        expected: usize,
        actual: usize,
    },
}

fn reconcile(header: &EbsdHeader, actual: usize, source: &Path) -> Result<Reconciled> {
    let rows = grid_dimension(header.nrows, "NROWS", source)?;
    let cols = grid_dimension(header.ncols_odd, "NCOLS_ODD", source)?;
    let too_large = || {
        Error::schema(
            source.display().to_string(),
            format!("declared grid {rows} x {cols} is too large"),
        )
    };
    let expected = rows.checked_mul(cols).ok_or_else(too_large)?;

    if actual == expected {
        Ok(Reconciled::Fits {
            rows,
            cols,
            size_check: SizeCheck::Exact,
        })
    } else if rows > 1 && actual == (rows - 1) * cols {
        Ok(Reconciled::Fits {
            rows: rows - 1,
            cols,
            size_check: SizeCheck::RowTrimmed {
                declared_rows: rows,
                used_rows: rows - 1,
            },
        })
    } else {
        tracing::warn!(
            "Grid '{}' size mismatch: expected {} samples, got {}",
            source.display(),
            expected,
            actual
        );
        Ok(Reconciled::Mismatch { expected, actual })
    }
}

fn grid_dimension(value: Option<f64>, key: &str, source: &Path) -> Result<usize> {
    let context = || source.display().to_string();
    let value = value.ok_or_else(|| Error::schema(context(), format!("header key {key} missing")))?;
    if !value.is_finite() || value < 1.0 {
        return Err(Error::schema(
            context(),
            format!("header key {key} must be a positive count, got {value}"),
        ));
    }
    Ok(value as usize)
}

/// Parse a grid file into its intensity raster.
pub fn parse(path: &Path) -> Result<GridParse> {
    GridTable::read(path)?.into_raster()
}
