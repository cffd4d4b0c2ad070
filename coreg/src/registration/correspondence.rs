//! Ordered landmark pairs picked on the fixed and moving rasters.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Minimum number of pairs for an affine fit.
pub const MIN_PAIRS: usize = 3;

/// Pairs recommended before trusting a robust fit.
pub const RECOMMENDED_ROBUST_PAIRS: usize = 4;

/// Which list a point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Reference raster the moving data is registered onto
    Fixed,
    /// Raster being transformed
    Moving,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Fixed => write!(f, "fixed"),
            Role::Moving => write!(f, "moving"),
        }
    }
}

/// Which estimator the points are being validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitKind {
    LeastSquares,
    Robust,
}

/// Outcome of [`CorrespondenceSet::validate_for_fit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitReadiness {
    Ready,
    /// Enough for a robust fit, but fewer pairs than recommended.
    BelowRecommended { pairs: usize, recommended: usize },
    NotEnoughPoints {
        fixed: usize,
        moving: usize,
        required: usize,
    },
    /// Both lists are long enough but differ in length.
    Unpaired { fixed: usize, moving: usize },
}

impl FitReadiness {
    /// Whether a fit may be attempted.
    pub fn can_fit(&self) -> bool {
        matches!(
            self,
            FitReadiness::Ready | FitReadiness::BelowRecommended { .. }
        )
    }
}

/// Fixed and moving landmarks, paired by index.
///
/// Lists may differ in length while points are being picked; fitting
/// requires equal lengths of at least [`MIN_PAIRS`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceSet {
    fixed: Vec<DVec2>,
    moving: Vec<DVec2>,
}

impl CorrespondenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from two point lists.
    pub fn from_points(fixed: Vec<DVec2>, moving: Vec<DVec2>) -> Self {
        Self { fixed, moving }
    }

    pub fn fixed(&self) -> &[DVec2] {
        &self.fixed
    }

    pub fn moving(&self) -> &[DVec2] {
        &self.moving
    }

    pub fn points(&self, role: Role) -> &[DVec2] {
        match role {
            Role::Fixed => &self.fixed,
            Role::Moving => &self.moving,
        }
    }

    fn points_mut(&mut self, role: Role) -> &mut Vec<DVec2> {
        match role {
            Role::Fixed => &mut self.fixed,
            Role::Moving => &mut self.moving,
        }
    }

    pub fn len(&self, role: Role) -> usize {
        self.points(role).len()
    }

    /// Number of complete pairs.
    pub fn pair_count(&self) -> usize {
        self.fixed.len().min(self.moving.len())
    }

    /// Append a point; returns its index in the list.
    pub fn add(&mut self, role: Role, point: DVec2) -> usize {
        let points = self.points_mut(role);
        points.push(point);
        points.len() - 1
    }

    /// Remove the point at `index`. Out of range is a no-op returning `None`.
    pub fn remove(&mut self, role: Role, index: usize) -> Option<DVec2> {
        let points = self.points_mut(role);
        if index < points.len() {
            Some(points.remove(index))
        } else {
            None
        }
    }

    /// "Delete selected": no selection is a no-op.
    pub fn remove_selected(&mut self, role: Role, selection: Option<usize>) -> Option<DVec2> {
        selection.and_then(|index| self.remove(role, index))
    }

    pub fn clear(&mut self, role: Role) {
        self.points_mut(role).clear();
    }

    /// Complete `(fixed, moving)` pairs in index order.
    pub fn pairs(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        self.fixed.iter().copied().zip(self.moving.iter().copied())
    }

    pub fn validate_for_fit(&self, kind: FitKind) -> FitReadiness {
        let fixed = self.fixed.len();
        let moving = self.moving.len();

        if fixed < MIN_PAIRS || moving < MIN_PAIRS {
            return FitReadiness::NotEnoughPoints {
                fixed,
                moving,
                required: MIN_PAIRS,
            };
        }
        if fixed != moving {
            return FitReadiness::Unpaired { fixed, moving };
        }
        if kind == FitKind::Robust && fixed < RECOMMENDED_ROBUST_PAIRS {
            return FitReadiness::BelowRecommended {
                pairs: fixed,
                recommended: RECOMMENDED_ROBUST_PAIRS,
            };
        }
        FitReadiness::Ready
    }

    /// Shorthand for `validate_for_fit(kind).can_fit()`.
    pub fn is_ready(&self, kind: FitKind) -> bool {
        self.validate_for_fit(kind).can_fit()
    }
}
