//! Affine transform with its precomputed inverse.

use glam::DVec2;

use crate::error::{DegenerateReason, Error, Result};
use crate::math::DMat3;

/// 2D affine map `p' = A p + t` in homogeneous form, plus its inverse.
///
/// ```text
/// | a  b  tx |
/// | c  d  ty |
/// | 0  0  1  |
/// ```
///
/// Transforms estimated from a correspondence set map MOVING coordinates to
/// FIXED coordinates. Resampling a moving raster onto the fixed grid samples
/// the moving raster at `apply_inverse(fixed_pixel)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    matrix: DMat3,
    inverse: DMat3,
}

/// Rotation, scale and translation read off an affine matrix.
///
/// `rotation_deg` and `scale` come from the first column
/// (`atan2(c, a)` and `sqrt(a² + c²)`); they are exact for similarity
/// transforms and an approximation once shear or anisotropic scaling is
/// present. `scale_x` and `scale_y` are the norms of the two rows of the
/// linear part, the per-axis readout some tools report instead. The two readouts
/// agree only when the linear part is a scaled rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decomposition {
    pub rotation_deg: f64,
    pub scale: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub translation: DVec2,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::fmt::Display for AffineTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let d = self.decompose();
        write!(
            f,
            "Affine(dx={:.2}, dy={:.2}, rot={:.3}°, scale={:.4})",
            d.translation.x, d.translation.y, d.rotation_deg, d.scale
        )
    }
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self {
            matrix: DMat3::identity(),
            inverse: DMat3::identity(),
        }
    }

    /// Build from a homogeneous matrix. Fails if the bottom row is not
    /// `[0, 0, 1]`, an element is not finite, or the matrix is singular.
    pub fn from_matrix(matrix: DMat3) -> Result<Self> {
        if !matrix.is_affine() || !matrix.is_finite() {
            return Err(Error::degenerate(DegenerateReason::SingularTransform));
        }
        let inverse = matrix
            .inverse()
            .ok_or(Error::degenerate(DegenerateReason::SingularTransform))?;
        Ok(Self { matrix, inverse })
    }

    /// Build from `[a, b, tx, c, d, ty]`.
    pub fn from_params(params: [f64; 6]) -> Result<Self> {
        Self::from_matrix(DMat3::from_affine_params(params))
    }

    /// Rotation by `angle_deg` (counter-clockwise in x-right/y-up axes),
    /// uniform `scale`, then translation.
    ///
    /// # Panics
    /// Panics if `scale` is not a positive finite number.
    pub fn similarity(translation: DVec2, angle_deg: f64, scale: f64) -> Self {
        assert!(
            scale.is_finite() && scale > 0.0,
            "similarity scale must be positive, got {}",
            scale
        );
        let (sin_a, cos_a) = angle_deg.to_radians().sin_cos();
        let a = cos_a * scale;
        let c = sin_a * scale;
        let matrix = DMat3::from_affine_params([a, -c, translation.x, c, a, translation.y]);
        let inv_scale = 1.0 / scale;
        let ia = cos_a * inv_scale;
        let ic = sin_a * inv_scale;
        // (sR)^-1 = R^T / s, translation -(sR)^-1 t
        let inverse = DMat3::from_affine_params([
            ia,
            ic,
            -(ia * translation.x + ic * translation.y),
            -ic,
            ia,
            -(-ic * translation.x + ia * translation.y),
        ]);
        Self { matrix, inverse }
    }

    pub fn translation(t: DVec2) -> Self {
        Self {
            matrix: DMat3::from_affine_params([1.0, 0.0, t.x, 0.0, 1.0, t.y]),
            inverse: DMat3::from_affine_params([1.0, 0.0, -t.x, 0.0, 1.0, -t.y]),
        }
    }

    pub fn matrix(&self) -> &DMat3 {
        &self.matrix
    }

    pub fn inverse_matrix(&self) -> &DMat3 {
        &self.inverse
    }

    /// `[a, b, tx, c, d, ty]`.
    pub fn params(&self) -> [f64; 6] {
        self.matrix.affine_params()
    }

    /// Map a moving-space point to fixed space.
    #[inline]
    pub fn apply(&self, p: DVec2) -> DVec2 {
        self.matrix.transform_point(p)
    }

    /// Map a fixed-space point back to moving space.
    #[inline]
    pub fn apply_inverse(&self, p: DVec2) -> DVec2 {
        self.inverse.transform_point(p)
    }

    /// The inverse map.
    pub fn inverse(&self) -> Self {
        Self {
            matrix: self.inverse,
            inverse: self.matrix,
        }
    }

    /// `self ∘ other`: apply `other` first, then `self`.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            matrix: self.matrix.mul_mat(&other.matrix),
            inverse: other.inverse.mul_mat(&self.inverse),
        }
    }

    pub fn translation_components(&self) -> DVec2 {
        DVec2::new(self.matrix[2], self.matrix[5])
    }

    /// Rotation in degrees, `atan2(c, a)`.
    pub fn rotation_deg(&self) -> f64 {
        self.matrix[3].atan2(self.matrix[0]).to_degrees()
    }

    /// Isotropic scale, `sqrt(a² + c²)`.
    pub fn scale_factor(&self) -> f64 {
        let a = self.matrix[0];
        let c = self.matrix[3];
        (a * a + c * c).sqrt()
    }

    pub fn decompose(&self) -> Decomposition {
        let [a, b, tx, c, d, ty] = self.params();
        Decomposition {
            rotation_deg: self.rotation_deg(),
            scale: self.scale_factor(),
            scale_x: (a * a + b * b).sqrt(),
            scale_y: (c * c + d * d).sqrt(),
            translation: DVec2::new(tx, ty),
        }
    }

    /// Largest element-wise difference between the two matrices.
    pub fn max_param_diff(&self, other: &Self) -> f64 {
        self.matrix.max_abs_diff(&other.matrix)
    }
}
