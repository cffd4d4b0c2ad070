//! RANSAC (Random Sample Consensus) for robust affine estimation.
//!
//! Picked landmarks are few (tens at most) and occasionally wrong, so the
//! estimator:
//! 1. Draws minimal samples of 3 pairs
//! 2. Fits the exact affine map of each sample
//! 3. Counts inliers (pairs whose residual is within the threshold)
//! 4. Keeps the model with the most inliers (first found wins ties)
//! 5. Re-fits by least squares on the winning inlier set
//!
//! When every 3-pair combination fits within `max_iterations`, all of them
//! are evaluated in lexicographic order and the result is deterministic
//! regardless of the seed.

#[cfg(test)]
mod tests;

use glam::DVec2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::error::{DegenerateReason, Error, Result};
use crate::registration::config::RansacConfig;
use crate::registration::correspondence::{CorrespondenceSet, FitKind};
use crate::registration::estimate::{check_pairs, fit_affine};
use crate::registration::result::{RegistrationResult, pair_residuals};
use crate::registration::transform::AffineTransform;

const SAMPLE_SIZE: usize = 3;

/// Robust affine fit of `set`.
///
/// # Errors
/// `MismatchedPairs` / `DegenerateFit` as for the least-squares fit,
/// `DegenerateFit` (collinear) when no sample yields a model, and
/// `NoConsensus` when the best model has fewer than `min_inliers` inliers.
///
/// # Panics
/// Panics if `config` is invalid (see [`RansacConfig::validate`]).
pub fn estimate_affine_robust(
    set: &CorrespondenceSet,
    config: &RansacConfig,
) -> Result<RegistrationResult> {
    config.validate();
    let n = check_pairs(set)?;
    let fixed = set.fixed();
    let moving = set.moving();

    let mut sampler = Sampler::new(n, config);
    let exhaustive = matches!(sampler, Sampler::Exhaustive { .. });

    let mut best: Option<(AffineTransform, Vec<usize>)> = None;
    let mut iterations = 0;
    let mut degenerate = 0;

    let mut sample_moving = [DVec2::ZERO; SAMPLE_SIZE];
    let mut sample_fixed = [DVec2::ZERO; SAMPLE_SIZE];

    while let Some(sample) = sampler.next_sample() {
        iterations += 1;
        for (slot, &i) in sample.iter().enumerate() {
            sample_moving[slot] = moving[i];
            sample_fixed[slot] = fixed[i];
        }

        let model = match fit_affine(&sample_moving, &sample_fixed) {
            Ok(model) => model,
            Err(_) => {
                degenerate += 1;
                continue;
            }
        };

        let inliers = count_inliers(moving, fixed, &model, config.inlier_threshold);
        let best_count = best.as_ref().map_or(0, |(_, b)| b.len());
        if inliers.len() > best_count {
            best = Some((model, inliers));
        }
    }

    tracing::debug!(
        "RANSAC evaluated {} samples ({}), {} degenerate",
        iterations,
        if exhaustive { "exhaustive" } else { "random" },
        degenerate
    );

    let Some((model, inliers)) = best else {
        return Err(Error::degenerate(DegenerateReason::Collinear));
    };
    if inliers.len() < config.min_inliers {
        return Err(Error::NoConsensus {
            best_inliers: inliers.len(),
            required: config.min_inliers,
            iterations,
        });
    }

    let (transform, inliers) = if config.refit_on_inliers {
        refit(moving, fixed, model, inliers, config)
    } else {
        (model, inliers)
    };

    let residuals = pair_residuals(&transform, set);
    let result = RegistrationResult::new(transform, FitKind::Robust, inliers, residuals, iterations);

    tracing::info!(
        "Robust affine fit: {} of {} pairs inliers, {}, RMS {:.3} px, max {:.3} px",
        result.num_inliers(),
        n,
        result.transform,
        result.rms_error,
        result.max_error
    );
    Ok(result)
}

/// Least-squares re-fit on the inlier set, with inliers recounted.
///
/// Keeps the minimal-sample model if the re-fit fails or loses consensus.
fn refit(
    moving: &[DVec2],
    fixed: &[DVec2],
    model: AffineTransform,
    inliers: Vec<usize>,
    config: &RansacConfig,
) -> (AffineTransform, Vec<usize>) {
    let inlier_moving: Vec<DVec2> = inliers.iter().map(|&i| moving[i]).collect();
    let inlier_fixed: Vec<DVec2> = inliers.iter().map(|&i| fixed[i]).collect();

    match fit_affine(&inlier_moving, &inlier_fixed) {
        Ok(refined) => {
            let recounted = count_inliers(moving, fixed, &refined, config.inlier_threshold);
            if recounted.len() >= config.min_inliers {
                (refined, recounted)
            } else {
                tracing::debug!(
                    "Inlier re-fit kept only {} inliers, using minimal-sample model",
                    recounted.len()
                );
                (model, inliers)
            }
        }
        Err(e) => {
            tracing::debug!("Inlier re-fit failed ({}), using minimal-sample model", e);
            (model, inliers)
        }
    }
}

/// Indices of pairs with `|T(moving_i) - fixed_i| <= threshold`, ascending.
fn count_inliers(
    moving: &[DVec2],
    fixed: &[DVec2],
    transform: &AffineTransform,
    threshold: f64,
) -> Vec<usize> {
    moving
        .iter()
        .zip(fixed)
        .enumerate()
        .filter(|(_, (m, f))| (transform.apply(**m) - **f).length() <= threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Number of distinct 3-subsets of `n` items.
fn combinations_of_three(n: usize) -> u128 {
    let n = n as u128;
    if n < 3 {
        return 0;
    }
    n * (n - 1) * (n - 2) / 6
}

/// Source of minimal samples.
enum Sampler {
    /// Every combination in lexicographic order.
    Exhaustive { next: Option<[usize; SAMPLE_SIZE]>, n: usize },
    /// `remaining` uniform random samples without replacement.
    Random {
        rng: ChaCha8Rng,
        n: usize,
        remaining: usize,
        buffer: Vec<usize>,
    },
}

impl Sampler {
    fn new(n: usize, config: &RansacConfig) -> Self {
        debug_assert!(n >= SAMPLE_SIZE);
        if combinations_of_three(n) <= config.max_iterations as u128 {
            return Sampler::Exhaustive {
                next: Some([0, 1, 2]),
                n,
            };
        }

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        Sampler::Random {
            rng,
            n,
            remaining: config.max_iterations,
            buffer: Vec::with_capacity(SAMPLE_SIZE),
        }
    }

    fn next_sample(&mut self) -> Option<[usize; SAMPLE_SIZE]> {
        match self {
            Sampler::Exhaustive { next, n } => {
                let current = (*next)?;
                *next = next_combination(current, *n);
                Some(current)
            }
            Sampler::Random {
                rng,
                n,
                remaining,
                buffer,
            } => {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                random_sample_into(rng, *n, SAMPLE_SIZE, buffer);
                Some([buffer[0], buffer[1], buffer[2]])
            }
        }
    }
}

/// Lexicographic successor of a sorted 3-combination of `0..n`.
fn next_combination([i, j, k]: [usize; 3], n: usize) -> Option<[usize; 3]> {
    if k + 1 < n {
        Some([i, j, k + 1])
    } else if j + 2 < n {
        Some([i, j + 1, j + 2])
    } else if i + 3 < n {
        Some([i + 1, i + 2, i + 3])
    } else {
        None
    }
}

/// Random sampling of `k` unique indices from `0..n` using Floyd's algorithm.
fn random_sample_into<R: Rng>(rng: &mut R, n: usize, k: usize, buffer: &mut Vec<usize>) {
    debug_assert!(k <= n, "Cannot sample {} indices from {}", k, n);
    buffer.clear();
    for j in (n - k)..n {
        let t = rng.random_range(0..=j);
        if buffer.contains(&t) {
            buffer.push(j);
        } else {
            buffer.push(t);
        }
    }
}
