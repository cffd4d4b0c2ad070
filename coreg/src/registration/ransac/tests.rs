//! Tests for the RANSAC module.

use super::*;
use crate::registration::estimate::estimate_affine;

const EPSILON: f64 = 1e-6;

fn truth() -> AffineTransform {
    AffineTransform::similarity(DVec2::new(5.0, 3.0), 10.0, 1.2)
}

/// Well-spread moving points, no three collinear among the first eight.
fn spread_points(n: usize) -> Vec<DVec2> {
    (0..n)
        .map(|i| {
            let x = (i * i * 17 + i * 37) % 211 + 5;
            let y = (i * i * 29 + i * 71) % 173 + 9;
            DVec2::new(x as f64, y as f64)
        })
        .collect()
}

fn exact_set(moving: &[DVec2], transform: &AffineTransform) -> CorrespondenceSet {
    CorrespondenceSet::from_points(
        moving.iter().map(|&p| transform.apply(p)).collect(),
        moving.to_vec(),
    )
}

fn with_outliers(set: &CorrespondenceSet, outliers: &[usize]) -> CorrespondenceSet {
    let mut fixed = set.fixed().to_vec();
    for (k, &i) in outliers.iter().enumerate() {
        fixed[i] += DVec2::new(40.0 + 13.0 * k as f64, -55.0 + 7.0 * k as f64);
    }
    CorrespondenceSet::from_points(fixed, set.moving().to_vec())
}

#[test]
fn test_next_combination_enumerates_all() {
    let mut current = Some([0, 1, 2]);
    let mut all = Vec::new();
    while let Some(c) = current {
        all.push(c);
        current = next_combination(c, 5);
    }
    assert_eq!(all.len(), 10);
    assert_eq!(all[0], [0, 1, 2]);
    assert_eq!(all[1], [0, 1, 3]);
    assert_eq!(all[3], [0, 2, 3]);
    assert_eq!(all[9], [2, 3, 4]);
    assert_eq!(combinations_of_three(5), 10);
    assert_eq!(combinations_of_three(2), 0);
}

#[test]
fn test_random_sample_unique_indices() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut buffer = Vec::new();
    for _ in 0..200 {
        random_sample_into(&mut rng, 7, 3, &mut buffer);
        assert_eq!(buffer.len(), 3);
        assert!(buffer.iter().all(|&i| i < 7));
        assert_ne!(buffer[0], buffer[1]);
        assert_ne!(buffer[0], buffer[2]);
        assert_ne!(buffer[1], buffer[2]);
    }
}

#[test]
fn test_one_outlier_in_six_matches_clean_fit() {
    let moving = spread_points(6);
    let clean = exact_set(&moving, &truth());
    let noisy = with_outliers(&clean, &[4]);

    let robust = estimate_affine_robust(&noisy, &RansacConfig::default()).unwrap();

    assert_eq!(robust.inliers, vec![0, 1, 2, 3, 5]);
    assert_eq!(robust.method, FitKind::Robust);
    // Exhaustive: C(6, 3) = 20 samples
    assert_eq!(robust.iterations, 20);

    let clean_five = CorrespondenceSet::from_points(
        [0, 1, 2, 3, 5].iter().map(|&i| clean.fixed()[i]).collect(),
        [0, 1, 2, 3, 5].iter().map(|&i| clean.moving()[i]).collect(),
    );
    let least_squares = estimate_affine(&clean_five).unwrap();
    assert!(robust.transform.max_param_diff(&least_squares.transform) < EPSILON);
    assert!(robust.transform.max_param_diff(&truth()) < EPSILON);
    assert!(robust.residuals[4] > 10.0);
    assert!(robust.rms_error < EPSILON);
}

#[test]
fn test_exhaustive_mode_ignores_seed() {
    let moving = spread_points(8);
    let noisy = with_outliers(&exact_set(&moving, &truth()), &[1, 6]);

    let a = estimate_affine_robust(
        &noisy,
        &RansacConfig {
            seed: Some(1),
            ..Default::default()
        },
    )
    .unwrap();
    let b = estimate_affine_robust(&noisy, &RansacConfig::default()).unwrap();

    assert_eq!(a.inliers, b.inliers);
    assert_eq!(a.transform, b.transform);
    assert_eq!(a.inliers, vec![0, 2, 3, 4, 5, 7]);
}

#[test]
fn test_random_sampling_with_seed() {
    // C(30, 3) = 4060 > 1000 forces random sampling
    let moving = spread_points(30);
    let outliers = [2, 9, 15, 22, 27];
    let noisy = with_outliers(&exact_set(&moving, &truth()), &outliers);
    let config = RansacConfig {
        seed: Some(42),
        ..Default::default()
    };

    let first = estimate_affine_robust(&noisy, &config).unwrap();
    let second = estimate_affine_robust(&noisy, &config).unwrap();

    assert_eq!(first.iterations, 1000);
    assert_eq!(first.num_inliers(), 25);
    assert!(outliers.iter().all(|i| !first.is_inlier(*i)));
    assert!(first.transform.max_param_diff(&truth()) < EPSILON);
    assert_eq!(first.inliers, second.inliers);
    assert_eq!(first.transform, second.transform);
}

#[test]
fn test_threshold_is_inclusive() {
    let moving = spread_points(4);
    let mut fixed = moving.clone();
    fixed[3] += DVec2::new(2.0, 0.0);
    fixed[1] += DVec2::new(0.0, 2.0 + 1e-9);

    let inliers = count_inliers(&moving, &fixed, &AffineTransform::identity(), 2.0);
    assert_eq!(inliers, vec![0, 2, 3]);
}

#[test]
fn test_compatibility_mode_returns_minimal_sample_model() {
    let moving = spread_points(7);
    let clean = exact_set(&moving, &truth());
    let mut fixed = clean.fixed().to_vec();
    for (i, p) in fixed.iter_mut().enumerate() {
        let jitter = ((i * 7) % 5) as f64 * 0.1 - 0.2;
        *p += DVec2::new(jitter, -jitter);
    }
    let set = CorrespondenceSet::from_points(fixed, clean.moving().to_vec());

    let minimal = estimate_affine_robust(
        &set,
        &RansacConfig {
            refit_on_inliers: false,
            ..Default::default()
        },
    )
    .unwrap();
    let exact_pairs = minimal.residuals.iter().filter(|&&r| r < 1e-9).count();
    assert!(exact_pairs >= 3);

    let refit = estimate_affine_robust(&set, &RansacConfig::default()).unwrap();
    assert_eq!(refit.num_inliers(), 7);
    let least_squares = estimate_affine(&set).unwrap();
    assert!(refit.transform.max_param_diff(&least_squares.transform) < 1e-9);
}

#[test]
fn test_no_consensus() {
    let moving = spread_points(5);
    let noisy = with_outliers(&exact_set(&moving, &truth()), &[0, 3]);
    let config = RansacConfig {
        min_inliers: 5,
        ..Default::default()
    };

    match estimate_affine_robust(&noisy, &config) {
        Err(Error::NoConsensus {
            best_inliers,
            required,
            iterations,
        }) => {
            assert_eq!(best_inliers, 3);
            assert_eq!(required, 5);
            assert_eq!(iterations, 10);
        }
        other => panic!("expected NoConsensus, got {other:?}"),
    }
}

#[test]
fn test_all_samples_degenerate() {
    let moving: Vec<DVec2> = (0..5).map(|i| DVec2::new(i as f64, 2.0 * i as f64)).collect();
    let set = exact_set(&moving, &truth());
    assert!(matches!(
        estimate_affine_robust(&set, &RansacConfig::default()),
        Err(Error::DegenerateFit {
            reason: DegenerateReason::Collinear
        })
    ));
}

#[test]
fn test_rejects_unpaired_lists() {
    let moving = spread_points(5);
    let mut set = exact_set(&moving, &truth());
    set.remove(crate::registration::correspondence::Role::Moving, 0);
    assert!(matches!(
        estimate_affine_robust(&set, &RansacConfig::default()),
        Err(Error::MismatchedPairs {
            fixed: 5,
            moving: 4
        })
    ));
}
