//! Deterministic synthetic fields shared by the unit tests.

use std::f64::consts::TAU;

use glam::DVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::field::{MotionField, ScalarField};

/// `(kx, ky, amplitude, phase)` of the Fourier modes of [`periodic_pattern`].
const PATTERN_MODES: [(i32, i32, f64, f64); 8] = [
    (1, 0, 1.0, 0.3),
    (0, 1, 0.8, 1.1),
    (1, 1, 0.6, -0.7),
    (-1, 2, 0.5, 2.0),
    (2, 1, 0.4, 0.5),
    (1, -2, 0.35, -1.3),
    (3, 0, 0.3, 0.9),
    (2, -1, 0.25, 0.1),
];

/// Band-limited pattern, periodic over a `width x height` domain.
///
/// Every mode has `|kx|, |ky| <= 3`, so the pattern is represented exactly by
/// a small number of Fourier coefficients.
pub(crate) fn periodic_pattern(width: usize, height: usize, x: f64, y: f64) -> f64 {
    let (w, h) = (width as f64, height as f64);
    PATTERN_MODES
        .iter()
        .map(|&(kx, ky, amplitude, phase)| {
            amplitude * (TAU * (kx as f64 * x / w + ky as f64 * y / h) + phase).cos()
        })
        .sum::<f64>()
        + 2.0
}

/// `frames` snapshots of [`periodic_pattern`] moving with constant `velocity`.
///
/// Frame `t` samples the pattern at `(x, y) - t * velocity`, evaluated
/// analytically, so there is no interpolation error.
pub(crate) fn translated_sequence(
    width: usize,
    height: usize,
    frames: usize,
    velocity: DVec2,
) -> Vec<ScalarField> {
    (0..frames)
        .map(|t| {
            let shift = velocity * t as f64;
            ScalarField::from_fn(width, height, |x, y| {
                periodic_pattern(width, height, x as f64 - shift.x, y as f64 - shift.y)
            })
        })
        .collect()
}

/// Sum of two Gaussian blobs on a zero background.
pub(crate) fn smooth_field(width: usize, height: usize) -> ScalarField {
    let (w, h) = (width as f64, height as f64);
    let blobs = [
        (DVec2::new(0.4 * w, 0.45 * h), 0.15 * w.min(h), 1.0),
        (DVec2::new(0.65 * w, 0.6 * h), 0.1 * w.min(h), 0.6),
    ];
    ScalarField::from_fn(width, height, |x, y| {
        let p = DVec2::new(x as f64, y as f64);
        blobs
            .iter()
            .map(|&(center, sigma, amplitude)| {
                amplitude * (-(p - center).length_squared() / (2.0 * sigma * sigma)).exp()
            })
            .sum()
    })
}

/// Flow diverging from the grid centre, `rate * (p - centre)`.
pub(crate) fn radial_flow(width: usize, height: usize, rate: f64) -> MotionField {
    let center = DVec2::new((width as f64 - 1.0) / 2.0, (height as f64 - 1.0) / 2.0);
    MotionField::from_fn(width, height, |x, y| {
        (DVec2::new(x as f64, y as f64) - center) * rate
    })
}

/// Add uniform noise in `[-amplitude, amplitude)` from a seeded generator.
pub(crate) fn add_noise(frames: &mut [ScalarField], amplitude: f64, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for frame in frames {
        for value in frame.iter_mut() {
            *value += rng.random_range(-amplitude..amplitude);
        }
    }
}

pub(crate) fn count_missing(field: &ScalarField) -> usize {
    field.iter().filter(|v| !v.is_finite()).count()
}
