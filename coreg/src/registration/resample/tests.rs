use super::*;
use crate::raster::PixelType;
use crate::registration::correspondence::CorrespondenceSet;
use crate::registration::estimate::estimate_affine;
use crate::testing::{shapes_raster, smooth_field};

fn nearest() -> WarpConfig {
    WarpConfig {
        method: InterpolationMethod::Nearest,
        ..Default::default()
    }
}

#[test]
fn test_identity_keeps_raster_unchanged() {
    // 48 rows spans several parallel chunks
    let source = shapes_raster(64, 48);
    for config in [nearest(), WarpConfig::default()] {
        let out = resample(&source, &AffineTransform::identity(), source.shape(), &config);
        assert_eq!(out, source);
    }
}

#[test]
fn test_identity_does_not_spread_nan() {
    let mut samples = vec![1.0; 9];
    samples[4] = f64::NAN;
    let source = Raster::new(3, 3, samples, PixelType::F64);

    let out = resample(
        &source,
        &AffineTransform::identity(),
        (3, 3),
        &WarpConfig::default(),
    );

    assert!(out.get(1, 1).is_nan());
    assert_eq!(out.samples().iter().filter(|v| v.is_nan()).count(), 1);
}

#[test]
fn test_nan_propagates_to_interpolated_neighbours() {
    let mut samples = vec![1.0; 9];
    samples[4] = f64::NAN;
    let source = Raster::new(3, 3, samples, PixelType::F64);

    let shift = AffineTransform::translation(DVec2::new(0.5, 0.0));
    let out = resample(&source, &shift, (3, 3), &WarpConfig::default());

    // Output column 1 samples source x = 0.5, column 2 samples x = 1.5
    assert!(out.get(1, 1).is_nan());
    assert!(out.get(2, 1).is_nan());
    assert_eq!(out.get(1, 0), 1.0);
}

#[test]
fn test_integer_translation_nearest() {
    let source = Raster::from_fn(5, 4, PixelType::F64, |x, y| (y * 10 + x) as f64);
    let shift = AffineTransform::translation(DVec2::new(2.0, -1.0));
    let config = WarpConfig {
        method: InterpolationMethod::Nearest,
        fill_value: -1.0,
    };

    let out = resample(&source, &shift, (4, 5), &config);

    // out(x, y) = source(x - 2, y + 1)
    assert_eq!(out.get(2, 0), source.get(0, 1));
    assert_eq!(out.get(4, 2), source.get(2, 3));
    assert_eq!(out.get(1, 0), -1.0);
    assert_eq!(out.get(3, 3), -1.0);
}

#[test]
fn test_bilinear_half_pixel_and_fill() {
    let source = Raster::new(2, 1, vec![0.0, 10.0], PixelType::F64);
    let shift = AffineTransform::translation(DVec2::new(0.5, 0.0));
    let config = WarpConfig {
        method: InterpolationMethod::Bilinear,
        fill_value: -4.0,
    };

    let out = resample(&source, &shift, (1, 3), &config);

    // x = -0.5 mixes fill and source(0); x = 0.5 mixes source(0) and source(1)
    assert_eq!(out.get(0, 0), -2.0);
    assert_eq!(out.get(1, 0), 5.0);
    assert_eq!(out.get(2, 0), 3.0);
}

#[test]
fn test_target_shape_sets_output_grid() {
    let source = smooth_field(20, 10);
    let out = resample(
        &source,
        &AffineTransform::identity(),
        (6, 30),
        &WarpConfig::default(),
    );
    assert_eq!(out.shape(), (6, 30));
    assert_eq!(out.get(19, 5), source.get(19, 5));
    assert_eq!(out.get(25, 5), 0.0);

    let empty = resample(
        &source,
        &AffineTransform::identity(),
        (0, 0),
        &WarpConfig::default(),
    );
    assert_eq!(empty.shape(), (0, 0));
}

#[test]
fn test_integer_output_is_rounded_and_clamped() {
    let source = Raster::new(2, 1, vec![0.0, 255.0], PixelType::U8);
    let shift = AffineTransform::translation(DVec2::new(0.5, 0.0));
    let config = WarpConfig {
        method: InterpolationMethod::Bilinear,
        fill_value: 1000.0,
    };

    let out = resample(&source, &shift, (1, 3), &config);

    assert_eq!(out.pixel_type(), PixelType::U8);
    // 0.5 * 0 + 0.5 * 255 = 127.5 rounds up
    assert_eq!(out.get(1, 0), 128.0);
    // Fill value is clamped to the type range
    assert_eq!(out.get(0, 0), 255.0);
    assert!(out.samples().iter().all(|v| (0.0..=255.0).contains(v)));
}

#[test]
fn test_nearest_keeps_source_values() {
    let source = shapes_raster(100, 100);
    let t = AffineTransform::similarity(DVec2::new(4.0, -3.0), 7.0, 1.1);
    let out = resample(&source, &t, source.shape(), &nearest());

    assert!(
        out.samples()
            .iter()
            .all(|v| [0.0, 85.0, 170.0, 255.0].contains(v))
    );
}

#[test]
fn test_forward_then_inverse_reconstructs_interior() {
    let source = smooth_field(80, 60);
    let t = AffineTransform::similarity(DVec2::new(3.0, 2.0), 4.0, 1.05);
    let config = WarpConfig::default();

    let forward = resample(&source, &t, source.shape(), &config);
    let back = resample(&forward, &t.inverse(), source.shape(), &config);

    let margin = 15;
    for y in margin..source.height() - margin {
        for x in margin..source.width() - margin {
            let diff = (back.get(x, y) - source.get(x, y)).abs();
            assert!(diff < 1.0, "({x}, {y}) differs by {diff}");
        }
    }
}

#[test]
fn test_resample_all_applies_same_mapping() {
    let primary = shapes_raster(40, 30);
    let aux = smooth_field(40, 30);
    let t = AffineTransform::similarity(DVec2::new(1.5, 0.5), -3.0, 0.95);
    let config = WarpConfig::default();

    let outputs = resample_all(&[primary.clone(), aux.clone()], &t, (25, 35), &config);

    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0], resample(&primary, &t, (25, 35), &config));
    assert_eq!(outputs[1], resample(&aux, &t, (25, 35), &config));
    assert_eq!(outputs[1].pixel_type(), PixelType::F64);
}

#[test]
fn test_resample_through_fitted_sheared_transform() {
    let source = smooth_field(60, 40);
    let mut checked = 0;
    for k in 0..50 {
        let k = k as f64 / 25.0;
        let truth =
            AffineTransform::from_params([1.0 + k, 0.1 * k, 4.0, -0.05 * k, 0.98 + 0.5 * k, -2.0])
                .unwrap();
        let moving = vec![
            DVec2::new(3.0, 4.0),
            DVec2::new(50.0, 6.0),
            DVec2::new(28.0, 35.0),
            DVec2::new(10.0, 30.0),
        ];
        let fixed = moving.iter().map(|&p| truth.apply(p)).collect();
        let fitted = estimate_affine(&CorrespondenceSet::from_points(fixed, moving)).unwrap();

        let out = resample(&source, &fitted.transform, (40, 60), &WarpConfig::default());
        assert_eq!(out.shape(), (40, 60));
        let inverse = fitted.transform.inverse();
        assert!(inverse.matrix().is_affine());
        let p = DVec2::new(7.0, 9.0);
        assert!((inverse.apply(fitted.transform.apply(p)) - p).length() < 1e-9);
        checked += 1;
    }
    assert_eq!(checked, 50);
}
