//! Row-major 3x3 matrix for 2D homogeneous transforms.

use glam::DVec2;
use std::ops::Index;

/// Row-major 3x3 matrix of f64 values.
///
/// For an affine map the layout is:
/// ```text
/// | a  b  tx |   | m[0] m[1] m[2] |
/// | c  d  ty | = | m[3] m[4] m[5] |
/// | 0  0  1  |   | m[6] m[7] m[8] |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DMat3 {
    data: [f64; 9],
}

impl DMat3 {
    #[inline]
    pub const fn from_array(data: [f64; 9]) -> Self {
        Self { data }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self {
            data: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Affine matrix from `[a, b, tx, c, d, ty]`.
    #[inline]
    pub const fn from_affine_params(p: [f64; 6]) -> Self {
        Self {
            data: [p[0], p[1], p[2], p[3], p[4], p[5], 0.0, 0.0, 1.0],
        }
    }

    #[inline]
    pub const fn as_array(&self) -> &[f64; 9] {
        &self.data
    }

    /// Top two rows as `[a, b, tx, c, d, ty]`.
    #[inline]
    pub fn affine_params(&self) -> [f64; 6] {
        let d = &self.data;
        [d[0], d[1], d[2], d[3], d[4], d[5]]
    }

    /// Element at `(row, col)`.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * 3 + col]
    }

    /// Matrix product `self * rhs`.
    pub fn mul_mat(&self, rhs: &DMat3) -> DMat3 {
        let a = &self.data;
        let b = &rhs.data;
        let mut out = [0.0; 9];
        for row in 0..3 {
            for col in 0..3 {
                out[row * 3 + col] = a[row * 3] * b[col]
                    + a[row * 3 + 1] * b[3 + col]
                    + a[row * 3 + 2] * b[6 + col];
            }
        }
        DMat3 { data: out }
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        let d = &self.data;
        d[0] * (d[4] * d[8] - d[5] * d[7]) - d[1] * (d[3] * d[8] - d[5] * d[6])
            + d[2] * (d[3] * d[7] - d[4] * d[6])
    }

    /// Whether the bottom row is exactly `[0, 0, 1]`.
    #[inline]
    pub fn is_affine(&self) -> bool {
        self.data[6] == 0.0 && self.data[7] == 0.0 && self.data[8] == 1.0
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Matrix inverse, or `None` when the matrix is singular.
    ///
    /// Singularity is judged relative to the magnitude of the linear part so
    /// that both micron-scale and pixel-scale maps are handled.
    pub fn inverse(&self) -> Option<DMat3> {
        let det = self.determinant();
        let d = &self.data;
        let magnitude = d[0].abs().max(d[1].abs()).max(d[3].abs()).max(d[4].abs());
        if !det.is_finite() || magnitude == 0.0 || det.abs() <= 1e-12 * magnitude * magnitude {
            return None;
        }
        let inv_det = 1.0 / det;
        if self.is_affine() {
            // Bottom row stays exactly [0, 0, 1]
            let a = d[4] * inv_det;
            let b = -d[1] * inv_det;
            let c = -d[3] * inv_det;
            let e = d[0] * inv_det;
            return Some(DMat3::from_affine_params([
                a,
                b,
                -(a * d[2] + b * d[5]),
                c,
                e,
                -(c * d[2] + e * d[5]),
            ]));
        }
        Some(DMat3 {
            data: [
                (d[4] * d[8] - d[5] * d[7]) * inv_det,
                (d[2] * d[7] - d[1] * d[8]) * inv_det,
                (d[1] * d[5] - d[2] * d[4]) * inv_det,
                (d[5] * d[6] - d[3] * d[8]) * inv_det,
                (d[0] * d[8] - d[2] * d[6]) * inv_det,
                (d[2] * d[3] - d[0] * d[5]) * inv_det,
                (d[3] * d[7] - d[4] * d[6]) * inv_det,
                (d[1] * d[6] - d[0] * d[7]) * inv_det,
                (d[0] * d[4] - d[1] * d[3]) * inv_det,
            ],
        })
    }

    /// Map a point through the affine part (bottom row ignored).
    #[inline]
    pub fn transform_point(&self, p: DVec2) -> DVec2 {
        let d = &self.data;
        debug_assert!(self.is_affine(), "transform_point expects an affine matrix");
        DVec2::new(
            d[0] * p.x + d[1] * p.y + d[2],
            d[3] * p.x + d[4] * p.y + d[5],
        )
    }

    /// Largest absolute element-wise difference.
    pub fn max_abs_diff(&self, other: &DMat3) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl Default for DMat3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Index<usize> for DMat3 {
    type Output = f64;

    #[inline]
    fn index(&self, idx: usize) -> &f64 {
        &self.data[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_identity_maps_point_to_itself() {
        let p = DMat3::identity().transform_point(DVec2::new(3.5, -2.0));
        assert_eq!(p, DVec2::new(3.5, -2.0));
    }

    #[test]
    fn test_mul_mat_applies_right_operand_first() {
        let translate = DMat3::from_affine_params([1.0, 0.0, 10.0, 0.0, 1.0, 5.0]);
        let scale = DMat3::from_affine_params([2.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
        let p = translate.mul_mat(&scale).transform_point(DVec2::new(1.0, 1.0));
        assert!((p - DVec2::new(12.0, 7.0)).length() < EPSILON);
    }

    #[test]
    fn test_inverse_round_trip() {
        let m = DMat3::from_affine_params([1.2, 0.3, 5.0, -0.1, 0.9, -3.0]);
        let inv = m.inverse().unwrap();
        assert!(m.mul_mat(&inv).max_abs_diff(&DMat3::identity()) < 1e-12);
    }

    #[test]
    fn test_inverse_of_affine_keeps_exact_bottom_row() {
        for k in 0..200 {
            let k = k as f64 / 100.0;
            let m = DMat3::from_affine_params([
                1.0 + k,
                0.1 * k,
                4.0,
                -0.05 * k,
                0.98 + 0.5 * k,
                -2.0,
            ]);
            let inv = m.inverse().unwrap();
            assert!(inv.is_affine(), "k = {k}: {:?}", inv.as_array());

            let p = DVec2::new(17.0, -3.5);
            let back = inv.transform_point(m.transform_point(p));
            assert!((back - p).length() < 1e-9);
        }
    }

    #[test]
    fn test_inverse_of_singular_is_none() {
        let m = DMat3::from_affine_params([1.0, 2.0, 0.0, 2.0, 4.0, 0.0]);
        assert!(m.inverse().is_none());
        assert!(DMat3::from_affine_params([0.0; 6]).inverse().is_none());
    }

    #[test]
    fn test_inverse_small_scale_is_not_singular() {
        // 1 µm per pixel: determinant 1e-12, still well conditioned
        let m = DMat3::from_affine_params([1e-6, 0.0, 0.0, 0.0, 1e-6, 0.0]);
        let inv = m.inverse().unwrap();
        assert!((inv.at(0, 0) - 1e6).abs() < 1e-3);
    }

    #[test]
    fn test_affine_params_layout() {
        let m = DMat3::from_affine_params([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(m.at(0, 2), 3.0);
        assert_eq!(m.at(1, 0), 4.0);
        assert_eq!(m[8], 1.0);
        assert_eq!(m.affine_params(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(m.is_affine());
    }
}
