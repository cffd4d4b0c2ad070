//! Raster import and export: image files and delimited numeric text.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use image::{ColorType, GrayImage, Luma};

use crate::error::{Error, Result, ensure_file_exists};
use crate::raster::{PixelType, Raster};

/// Luma weights for RGB to grayscale (ITU-R BT.709).
const LUMA_WEIGHTS: [f32; 3] = [0.2125, 0.7154, 0.0721];

/// Load any supported image file as a single-channel raster.
///
/// 8-bit sources become `U8`, 16-bit sources `U16`, 32-bit float sources
/// `F32`. Colour images are converted to luma.
pub fn load_image(path: &Path) -> Result<Raster> {
    ensure_file_exists(path)?;

    let img = image::open(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let width = img.width() as usize;
    let height = img.height() as usize;

    let raster = match img.color() {
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => {
            let luma = img.to_luma16();
            let samples = luma.into_raw().into_iter().map(f64::from).collect();
            Raster::new(width, height, samples, PixelType::U16)
        }
        ColorType::Rgb32F | ColorType::Rgba32F => {
            let rgb = img.to_rgb32f();
            let samples = rgb
                .pixels()
                .map(|p| {
                    let [r, g, b] = p.0;
                    (LUMA_WEIGHTS[0] * r + LUMA_WEIGHTS[1] * g + LUMA_WEIGHTS[2] * b) as f64
                })
                .collect();
            Raster::new(width, height, samples, PixelType::F32)
        }
        _ => {
            let luma = img.to_luma8();
            let samples = luma.into_raw().into_iter().map(f64::from).collect();
            Raster::new(width, height, samples, PixelType::U8)
        }
    };

    tracing::debug!(
        "Loaded image '{}' ({}x{}, {:?})",
        path.display(),
        width,
        height,
        raster.pixel_type()
    );

    Ok(raster)
}

/// Write a raster as an 8-bit grayscale image; the format follows the extension.
///
/// Integer rasters whose values already fit `0..=255` are written unchanged.
/// Anything else is min/max stretched to `0..=255`, with NaN written as 0.
pub fn save_image(raster: &Raster, path: &Path) -> Result<()> {
    let bytes = to_display_bytes(raster);
    let width = raster.width();
    let img = GrayImage::from_fn(raster.width() as u32, raster.height() as u32, |x, y| {
        Luma([bytes[y as usize * width + x as usize]])
    });

    img.save(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Saved raster {:?} to '{}'", raster.shape(), path.display());
    Ok(())
}

fn to_display_bytes(raster: &Raster) -> Vec<u8> {
    let range = raster.min_max();

    if raster.pixel_type().is_integer()
        && let Some((lo, hi)) = range
        && lo >= 0.0
        && hi <= 255.0
    {
        return raster.samples().iter().map(|&v| v as u8).collect();
    }

    match range {
        Some((lo, hi)) if hi > lo => {
            let scale = 255.0 / (hi - lo);
            raster
                .samples()
                .iter()
                .map(|&v| {
                    if v.is_finite() {
                        ((v - lo) * scale).round().clamp(0.0, 255.0) as u8
                    } else {
                        0
                    }
                })
                .collect()
        }
        _ => vec![0; raster.samples().len()],
    }
}

/// Write a raster as delimited text.
///
/// The first line records the shape as `(rows, cols)`; each following line
/// is one raster row with space-separated values at two decimal places.
pub fn save_delimited(raster: &Raster, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let (rows, cols) = raster.shape();

    let write_all = |writer: &mut BufWriter<File>| -> std::io::Result<()> {
        writeln!(writer, "({}, {})", rows, cols)?;
        for row in raster.data().rows() {
            let mut first = true;
            for value in row {
                if !first {
                    writer.write_all(b" ")?;
                }
                write!(writer, "{:.2}", value)?;
                first = false;
            }
            writer.write_all(b"\n")?;
        }
        writer.flush()
    };

    write_all(&mut writer).map_err(|e| Error::io(path, e))?;

    tracing::info!(
        "Saved delimited raster ({}, {}) to '{}'",
        rows,
        cols,
        path.display()
    );
    Ok(())
}

/// Read a raster written by [`save_delimited`]. Values may be separated by
/// whitespace or commas. The result is `F64`.
pub fn load_delimited(path: &Path) -> Result<Raster> {
    ensure_file_exists(path)?;
    let context = || path.display().to_string();

    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut lines = BufReader::new(file).lines();

    let header = match lines.next() {
        Some(line) => line.map_err(|e| Error::io(path, e))?,
        None => return Err(Error::schema(context(), "empty file")),
    };
    let (rows, cols) = parse_shape_header(&header)
        .ok_or_else(|| Error::schema(context(), format!("invalid shape header '{header}'")))?;

    let mut samples = Vec::with_capacity(rows * cols);
    let mut row_count = 0;
    for (line_no, line) in lines.enumerate() {
        let line = line.map_err(|e| Error::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let before = samples.len();
        for token in line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let value: f64 = token.parse().map_err(|_| {
                Error::schema(
                    context(),
                    format!("line {}: '{}' is not a number", line_no + 2, token),
                )
            })?;
            samples.push(value);
        }
        if samples.len() - before != cols {
            return Err(Error::schema(
                context(),
                format!(
                    "line {}: expected {} values, found {}",
                    line_no + 2,
                    cols,
                    samples.len() - before
                ),
            ));
        }
        row_count += 1;
    }

    if row_count != rows {
        return Err(Error::schema(
            context(),
            format!("header declares {rows} rows, found {row_count}"),
        ));
    }

    Ok(Raster::new(cols, rows, samples, PixelType::F64))
}

fn parse_shape_header(line: &str) -> Option<(usize, usize)> {
    let inner = line.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (rows, cols) = inner.split_once(',')?;
    Some((rows.trim().parse().ok()?, cols.trim().parse().ok()?))
}
