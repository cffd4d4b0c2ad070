//! Least-squares affine estimation from point pairs.

use glam::DVec2;
use nalgebra::{DMatrix, SVD};

use crate::error::{DegenerateReason, Error, Result};
use crate::math::centroid;
use crate::registration::correspondence::{CorrespondenceSet, FitKind, MIN_PAIRS};
use crate::registration::result::{RegistrationResult, pair_residuals};
use crate::registration::transform::AffineTransform;

/// Smallest / largest singular value ratio below which the design matrix is
/// treated as rank deficient.
const RANK_TOLERANCE: f64 = 1e-9;

/// Check that the set can be fitted; returns the pair count.
pub(crate) fn check_pairs(set: &CorrespondenceSet) -> Result<usize> {
    let fixed = set.fixed().len();
    let moving = set.moving().len();
    if fixed != moving {
        return Err(Error::MismatchedPairs { fixed, moving });
    }
    if fixed < MIN_PAIRS {
        return Err(Error::degenerate(DegenerateReason::InsufficientPoints {
            found: fixed,
            required: MIN_PAIRS,
        }));
    }
    Ok(fixed)
}

/// Least-squares affine map taking `moving` onto `fixed`.
///
/// Moving points are centred on their centroid and scaled to an average
/// distance of √2 before the `n × 3` design matrix is solved by SVD, once for
/// each output coordinate. The solution is then mapped back to pixel units.
///
/// Fails with `Collinear` when the moving points are collinear or coincident,
/// and with `SingularTransform` when the fitted linear part cannot be inverted
/// (collinear fixed points).
pub(crate) fn fit_affine(moving: &[DVec2], fixed: &[DVec2]) -> Result<AffineTransform> {
    debug_assert_eq!(moving.len(), fixed.len());
    let n = moving.len();
    if n < MIN_PAIRS {
        return Err(Error::degenerate(DegenerateReason::InsufficientPoints {
            found: n,
            required: MIN_PAIRS,
        }));
    }

    let c = centroid(moving);
    let avg_dist = moving.iter().map(|p| (*p - c).length()).sum::<f64>() / n as f64;
    if !avg_dist.is_finite() || avg_dist < f64::EPSILON {
        return Err(Error::degenerate(DegenerateReason::Collinear));
    }
    let scale = std::f64::consts::SQRT_2 / avg_dist;

    let design = DMatrix::from_fn(n, 3, |row, col| match col {
        0 => (moving[row].x - c.x) * scale,
        1 => (moving[row].y - c.y) * scale,
        _ => 1.0,
    });
    let targets = DMatrix::from_fn(n, 2, |row, col| match col {
        0 => fixed[row].x,
        _ => fixed[row].y,
    });

    let svd = SVD::new(design, true, true);
    let sv = &svd.singular_values;
    let sv_max = sv.max();
    let sv_min = sv.min();
    if sv_max <= 0.0 || sv_min / sv_max < RANK_TOLERANCE {
        return Err(Error::degenerate(DegenerateReason::Collinear));
    }

    let solution = svd
        .solve(&targets, sv_max * RANK_TOLERANCE)
        .map_err(|_| Error::degenerate(DegenerateReason::Collinear))?;

    // Normalized model: fixed = p0 * u + p1 * v + p2 with u, v the scaled
    // centred moving coordinates.
    let undo = |col: usize| -> [f64; 3] {
        let a = solution[(0, col)] * scale;
        let b = solution[(1, col)] * scale;
        let t = solution[(2, col)] - a * c.x - b * c.y;
        [a, b, t]
    };
    let [a, b, tx] = undo(0);
    let [cc, d, ty] = undo(1);

    AffineTransform::from_params([a, b, tx, cc, d, ty])
}

/// Ordinary least-squares affine fit over every pair of `set`.
///
/// Every pair is reported as an inlier. Exact for three non-collinear pairs.
pub fn estimate_affine(set: &CorrespondenceSet) -> Result<RegistrationResult> {
    let n = check_pairs(set)?;
    let transform = fit_affine(set.moving(), set.fixed())?;
    let residuals = pair_residuals(&transform, set);
    let result = RegistrationResult::new(
        transform,
        FitKind::LeastSquares,
        (0..n).collect(),
        residuals,
        0,
    );

    tracing::info!(
        "Least-squares affine fit on {} pairs: {}, RMS {:.3} px, max {:.3} px",
        n,
        result.transform,
        result.rms_error,
        result.max_error
    );
    Ok(result)
}
