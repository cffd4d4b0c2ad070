//! Raster type shared by the parser, resampler and overlay builder.
//!
//! Samples are stored as `f64` in row-major order regardless of the source
//! element type; [`PixelType`] records the original dtype class so that
//! integer data can be rounded and clamped back into range after resampling.

mod io;


pub use io::{load_delimited, load_image, save_delimited, save_image};

use common::Buffer2;

/// Element type of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelType {
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit signed integer
    I32,
    /// 32-bit float
    F32,
    /// 64-bit float
    #[default]
    F64,
}

impl PixelType {
    pub fn is_integer(&self) -> bool {
        matches!(self, PixelType::U8 | PixelType::U16 | PixelType::I32)
    }

    /// Representable range for integer types, `None` for floating types.
    pub fn range(&self) -> Option<(f64, f64)> {
        match self {
            PixelType::U8 => Some((0.0, u8::MAX as f64)),
            PixelType::U16 => Some((0.0, u16::MAX as f64)),
            PixelType::I32 => Some((i32::MIN as f64, i32::MAX as f64)),
            PixelType::F32 | PixelType::F64 => None,
        }
    }

    /// Convert an intermediate floating value into this type's value set.
    ///
    /// Integer types round to nearest and clamp; NaN becomes the lower bound.
    /// `F32` rounds to single precision; `F64` is unchanged.
    #[inline]
    pub fn quantize(&self, value: f64) -> f64 {
        match self.range() {
            Some((lo, hi)) => {
                if value.is_nan() {
                    lo
                } else {
                    value.round().clamp(lo, hi)
                }
            }
            None => match self {
                PixelType::F32 => value as f32 as f64,
                _ => value,
            },
        }
    }
}

/// 2D numeric raster. `shape()` is `(rows, cols)`; `x` indexes columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    data: Buffer2<f64>,
    pixel_type: PixelType,
}

impl Raster {
    /// Create a raster from row-major samples. Samples are quantized to
    /// `pixel_type`.
    ///
    /// # Panics
    /// Panics if `samples.len() != width * height`.
    pub fn new(width: usize, height: usize, samples: Vec<f64>, pixel_type: PixelType) -> Self {
        let mut samples = samples;
        if pixel_type != PixelType::F64 {
            samples.iter_mut().for_each(|v| *v = pixel_type.quantize(*v));
        }
        Self {
            data: Buffer2::new(width, height, samples),
            pixel_type,
        }
    }

    pub fn from_buffer(data: Buffer2<f64>, pixel_type: PixelType) -> Self {
        Self::new(data.width(), data.height(), data.into_vec(), pixel_type)
    }

    pub fn filled(width: usize, height: usize, value: f64, pixel_type: PixelType) -> Self {
        Self {
            data: Buffer2::new_filled(width, height, pixel_type.quantize(value)),
            pixel_type,
        }
    }

    pub fn from_fn(
        width: usize,
        height: usize,
        pixel_type: PixelType,
        f: impl FnMut(usize, usize) -> f64,
    ) -> Self {
        Self::from_buffer(Buffer2::from_fn(width, height, f), pixel_type)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.data.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.data.height()
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.data.height(), self.data.width())
    }

    #[inline]
    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        *self.data.get(x, y)
    }

    /// Sample at signed coordinates, `None` outside the raster.
    #[inline]
    pub fn try_get(&self, x: i64, y: i64) -> Option<f64> {
        self.data.try_get(x, y).copied()
    }

    #[inline]
    pub fn samples(&self) -> &[f64] {
        self.data.pixels()
    }

    #[inline]
    pub fn data(&self) -> &Buffer2<f64> {
        &self.data
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.data.into_vec()
    }

    /// Minimum and maximum over finite samples, `None` if there are none.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// New raster of the same shape with `f` applied to every sample.
    pub fn map(&self, pixel_type: PixelType, f: impl FnMut(&f64) -> f64) -> Raster {
        Raster::from_buffer(self.data.map(f), pixel_type)
    }
}
