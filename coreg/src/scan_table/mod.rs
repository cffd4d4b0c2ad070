//! Tabular scan data (Raman/LRS maps) pivoted into rasters.
//!
//! A scan table has a header row of column names, two spatial coordinate
//! columns and any number of signal columns (intensity, peak wavenumber,
//! peak shift, ...). Pivoting places every record at the raster cell given by
//! the rank of its x value among the distinct x values (column) and of its y
//! value among the distinct y values (row). Every signal column becomes its
//! own raster on that shared grid, so all layers stay co-registered.

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use crate::error::{Error, Result, ensure_file_exists};
use crate::raster::{PixelType, Raster};

/// One pivoted signal column.
#[derive(Debug, Clone)]
pub struct ScanLayer {
    pub name: String,
    pub raster: Raster,
}

/// Signal layers on the grid spanned by the distinct coordinate values.
#[derive(Debug, Clone)]
pub struct ScanGrid {
    /// Sorted distinct x values; index = raster column.
    pub x_values: Vec<f64>,
    /// Sorted distinct y values; index = raster row.
    pub y_values: Vec<f64>,
    pub layers: Vec<ScanLayer>,
}

impl ScanGrid {
    pub fn layer(&self, name: &str) -> Option<&Raster> {
        self.layers
            .iter()
            .find(|layer| layer.name == name)
            .map(|layer| &layer.raster)
    }

    /// `(rows, cols)` of every layer.
    pub fn shape(&self) -> (usize, usize) {
        (self.y_values.len(), self.x_values.len())
    }
}

/// Delimited table with named columns, held as text until pivoted.
#[derive(Debug, Clone)]
pub struct ScanTable {
    source: PathBuf,
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl ScanTable {
    /// Read a table, picking the delimiter from the extension: tab for
    /// `.tsv` and `.txt`, semicolon for `.ssv`, comma otherwise.
    pub fn read(path: &Path) -> Result<Self> {
        let delimiter = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("tsv") | Some("txt") => b'\t',
            Some("ssv") => b';',
            _ => b',',
        };
        Self::read_with_delimiter(path, delimiter)
    }

    pub fn read_with_delimiter(path: &Path, delimiter: u8) -> Result<Self> {
        ensure_file_exists(path)?;
        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_path(path)
            .map_err(|source| Error::Csv {
                path: path.to_path_buf(),
                source,
            })?;
        let table = Self::from_csv_reader(reader, path)?;

        tracing::debug!(
            "Read scan table '{}': {} records, columns {:?}",
            path.display(),
            table.records.len(),
            table.headers
        );
        Ok(table)
    }

    /// Parse from an in-memory string with the given delimiter.
    pub fn from_str_with_delimiter(text: &str, delimiter: u8, source: &Path) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(text.as_bytes());
        Self::from_csv_reader(reader, source)
    }

    fn from_csv_reader<R: std::io::Read>(mut reader: csv::Reader<R>, source: &Path) -> Result<Self> {
        let csv_error = |source_err: csv::Error| Error::Csv {
            path: source.to_path_buf(),
            source: source_err,
        };

        let headers = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            records.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self {
            source: source.to_path_buf(),
            headers,
            records,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.headers.iter().position(|h| h == name).ok_or_else(|| {
            Error::schema(
                self.source.display().to_string(),
                format!("column '{}' not found (have {:?})", name, self.headers),
            )
        })
    }

    /// Pivot `signals` onto the grid spanned by `x_column` and `y_column`.
    ///
    /// Records with a non-numeric value in any used column are skipped.
    /// Grid cells without a record are NaN; a repeated cell keeps the last
    /// record.
    pub fn pivot(&self, x_column: &str, y_column: &str, signals: &[&str]) -> Result<ScanGrid> {
        let x_idx = self.column_index(x_column)?;
        let y_idx = self.column_index(y_column)?;
        let signal_idx = signals
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;

        let mut points = Vec::with_capacity(self.records.len());
        let mut skipped = 0;
        for record in &self.records {
            let parsed = parse_record(record, x_idx, y_idx, &signal_idx);
            match parsed {
                Some(point) => points.push(point),
                None => skipped += 1,
            }
        }

        if points.is_empty() {
            return Err(Error::schema(
                self.source.display().to_string(),
                "no numeric records to pivot",
            ));
        }

        let x_values = distinct_sorted(points.iter().map(|p| p.0));
        let y_values = distinct_sorted(points.iter().map(|p| p.1));
        let cols = x_values.len();
        let rows = y_values.len();

        let mut layers: Vec<Vec<f64>> = vec![vec![f64::NAN; rows * cols]; signals.len()];
        let mut filled = vec![false; rows * cols];
        let mut duplicates = 0;
        for (x, y, values) in &points {
            let col = rank_of(&x_values, *x);
            let row = rank_of(&y_values, *y);
            let cell = row * cols + col;
            if filled[cell] {
                duplicates += 1;
            }
            filled[cell] = true;
            for (layer, value) in layers.iter_mut().zip(values) {
                layer[cell] = *value;
            }
        }

        if skipped > 0 || duplicates > 0 {
            tracing::debug!(
                "Pivot of '{}': {} records skipped, {} duplicate cells",
                self.source.display(),
                skipped,
                duplicates
            );
        }
        tracing::info!(
            "Pivoted {} records of '{}' into {} layer(s) of {} x {}",
            points.len(),
            self.source.display(),
            signals.len(),
            rows,
            cols
        );

        Ok(ScanGrid {
            layers: signals
                .iter()
                .zip(layers)
                .map(|(name, samples)| ScanLayer {
                    name: name.to_string(),
                    raster: Raster::new(cols, rows, samples, PixelType::F64),
                })
                .collect(),
            x_values,
            y_values,
        })
    }
}

fn parse_record(
    record: &[String],
    x_idx: usize,
    y_idx: usize,
    signal_idx: &[usize],
) -> Option<(f64, f64, Vec<f64>)> {
    let value = |idx: usize| record.get(idx).and_then(|s| s.parse::<f64>().ok());
    let x = value(x_idx).filter(|v| v.is_finite())?;
    let y = value(y_idx).filter(|v| v.is_finite())?;
    let signals = signal_idx
        .iter()
        .map(|&i| value(i))
        .collect::<Option<Vec<f64>>>()?;
    Some((x, y, signals))
}

// Adding 0.0 folds -0.0 into 0.0 so sort order and lookup agree.
fn distinct_sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut values: Vec<f64> = values.map(|v| v + 0.0).collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

fn rank_of(sorted: &[f64], value: f64) -> usize {
    sorted
        .binary_search_by(|probe| probe.total_cmp(&(value + 0.0)))
        .unwrap_or_else(|insert_at| insert_at)
}
