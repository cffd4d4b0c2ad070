//! Testing utilities for coreg.

#![allow(dead_code)]

use glam::DVec2;

use crate::raster::{PixelType, Raster};

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
/// Respects RUST_LOG env var, defaults to "info".
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}

/// Synthetic 8-bit scene: a filled square, disc and triangle on black.
///
/// Shapes are laid out on a 500 x 500 design grid and scaled to the
/// requested size, so landmarks (shape corners, disc centre) are known.
pub fn shapes_raster(width: usize, height: usize) -> Raster {
    let sx = width as f64 / 500.0;
    let sy = height as f64 / 500.0;
    let triangle = [
        DVec2::new(200.0, 400.0),
        DVec2::new(250.0, 350.0),
        DVec2::new(300.0, 400.0),
    ];

    Raster::from_fn(width, height, PixelType::U8, |x, y| {
        // Back to design-grid coordinates
        let p = DVec2::new(x as f64 / sx, y as f64 / sy);
        if (50.0..=150.0).contains(&p.x) && (50.0..=150.0).contains(&p.y) {
            255.0
        } else if p.distance(DVec2::new(300.0, 300.0)) <= 50.0 {
            170.0
        } else if in_triangle(p, &triangle) {
            85.0
        } else {
            0.0
        }
    })
}

/// Design-grid landmarks of [`shapes_raster`]: square corners, disc centre
/// and triangle apex.
pub fn shapes_landmarks(width: usize, height: usize) -> Vec<DVec2> {
    let scale = DVec2::new(width as f64 / 500.0, height as f64 / 500.0);
    [
        DVec2::new(50.0, 50.0),
        DVec2::new(150.0, 50.0),
        DVec2::new(150.0, 150.0),
        DVec2::new(300.0, 300.0),
        DVec2::new(250.0, 350.0),
    ]
    .into_iter()
    .map(|p| p * scale)
    .collect()
}

/// Smooth floating-point field, well suited to bilinear round trips.
pub fn smooth_field(width: usize, height: usize) -> Raster {
    Raster::from_fn(width, height, PixelType::F64, |x, y| {
        100.0 + 50.0 * (x as f64 / 9.0).sin() * (y as f64 / 7.0).cos()
    })
}

fn in_triangle(p: DVec2, [a, b, c]: &[DVec2; 3]) -> bool {
    let cross = |o: DVec2, u: DVec2, v: DVec2| (u - o).perp_dot(v - o);
    let d1 = cross(p, *a, *b);
    let d2 = cross(p, *b, *c);
    let d3 = cross(p, *c, *a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
