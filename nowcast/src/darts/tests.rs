use super::*;
use crate::field::ScalarField;
use crate::testing::{add_noise, periodic_pattern, translated_sequence};
use common::float_ext::FloatExt;

fn estimator(truncation: SpectralTruncation) -> DartsEstimator {
    DartsEstimator::new(DartsConfig::with_truncation(truncation)).unwrap()
}

/// Largest deviation of any vector from `expected`.
fn max_error(motion: &MotionField, expected: DVec2) -> f64 {
    motion
        .iter()
        .map(|m| (*m - expected).abs().max_element())
        .fold(0.0, f64::max)
}

#[test]
fn test_output_shape_matches_input() {
    let mut frames: Vec<ScalarField> = (0..5)
        .map(|t| ScalarField::from_fn(12, 10, |x, y| ((x + 2 * y + t) % 7) as f64))
        .collect();
    add_noise(&mut frames, 0.5, 7);
    let seq = FieldSequence::new(&frames).unwrap();

    let estimate = estimator(SpectralTruncation::new(3, 2, 2, 1, 1))
        .estimate_with_diagnostics(&seq)
        .unwrap();
    assert_eq!(estimate.motion.shape(), (12, 10));
    assert!(estimate.motion.iter().all(|m| m.is_finite()));
    assert_eq!(estimate.diagnostics.equations, 7 * 5 * 5);
    assert_eq!(estimate.diagnostics.unknowns, 18);
    assert!(estimate.diagnostics.rank <= 18);
}

#[test]
fn test_constant_sequence_gives_zero_motion() {
    let frame = ScalarField::from_fn(8, 8, |x, y| periodic_pattern(8, 8, x as f64, y as f64));
    let frames = vec![frame; 3];
    let seq = FieldSequence::new(&frames).unwrap();

    let motion = estimator(SpectralTruncation::new(2, 2, 1, 1, 1))
        .estimate(&seq)
        .unwrap();
    for m in motion.iter() {
        assert!(
            m.x.approximately_eq(0.0) && m.y.approximately_eq(0.0),
            "expected zero motion, got {m}"
        );
    }
}

#[test]
fn test_recovers_subpixel_translation() {
    // u0 * T = W and v0 * T = 2H, so the sequence is periodic in time as well.
    let velocity = DVec2::new(0.25, 0.5);
    let frames = translated_sequence(16, 16, 64, velocity);
    let seq = FieldSequence::new(&frames).unwrap();

    let estimate = estimator(SpectralTruncation::new(4, 4, 4, 1, 1))
        .estimate_with_diagnostics(&seq)
        .unwrap();
    let error = max_error(&estimate.motion, velocity);
    assert!(error < 0.05, "max error {error} pixels/frame");
    assert!(
        estimate.diagnostics.max_imaginary < 1e-6,
        "imaginary residual {}",
        estimate.diagnostics.max_imaginary
    );
}

#[test]
fn test_short_aperiodic_sequence_gives_biased_but_aligned_mean() {
    // Nine frames do not close the temporal period, so the spectrum leaks and
    // the estimate is only approximate.
    let velocity = DVec2::new(0.25, 0.5);
    let frames = translated_sequence(16, 16, 9, velocity);
    let seq = FieldSequence::new(&frames).unwrap();

    let motion = estimator(SpectralTruncation::new(4, 4, 4, 1, 1))
        .estimate(&seq)
        .unwrap();
    assert!(motion.iter().all(|m| m.is_finite()));
    let mean = motion.iter().copied().sum::<DVec2>() / motion.len() as f64;

    let alignment = mean.normalize().dot(velocity.normalize());
    assert!(alignment > 0.95, "mean {mean} points away from {velocity}");
    let ratio = mean.length() / velocity.length();
    assert!((0.5..1.2).contains(&ratio), "mean {mean}, speed ratio {ratio}");
}

#[test]
fn test_translation_with_noise() {
    let velocity = DVec2::new(0.25, 0.5);
    let mut frames = translated_sequence(16, 16, 64, velocity);
    add_noise(&mut frames, 0.01, 42);
    let seq = FieldSequence::new(&frames).unwrap();

    let motion = estimator(SpectralTruncation::new(4, 4, 4, 1, 1))
        .estimate(&seq)
        .unwrap();
    let error = max_error(&motion, velocity);
    assert!(error < 0.05, "max error {error} pixels/frame");
}

#[test]
fn test_missing_samples_are_replaced() {
    let velocity = DVec2::new(0.25, 0.5);
    let mut frames = translated_sequence(16, 16, 64, velocity);
    frames[3][(5, 5)] = f64::NAN;
    frames[40][(0, 15)] = f64::INFINITY;
    let seq = FieldSequence::new(&frames).unwrap();

    let estimate = estimator(SpectralTruncation::new(4, 4, 4, 1, 1))
        .estimate_with_diagnostics(&seq)
        .unwrap();
    assert_eq!(estimate.diagnostics.missing_replaced, 2);
    assert!(estimate.motion.iter().all(|m| m.is_finite()));
}

#[test]
fn test_all_zero_sequence_is_rank_deficient_not_an_error() {
    let frames = vec![ScalarField::new_filled(8, 8, 0.0); 4];
    let seq = FieldSequence::new(&frames).unwrap();

    let estimate = estimator(SpectralTruncation::new(2, 2, 1, 1, 1))
        .estimate_with_diagnostics(&seq)
        .unwrap();
    assert_eq!(estimate.diagnostics.rank, 0);
    assert!(estimate.motion.iter().all(|&m| m == DVec2::ZERO));
}

#[test]
fn test_underdetermined_system_is_solved() {
    // One equation, eighteen unknowns.
    let frames = translated_sequence(8, 8, 3, DVec2::new(0.5, 0.0));
    let seq = FieldSequence::new(&frames).unwrap();

    let estimate = estimator(SpectralTruncation::new(0, 0, 0, 1, 1))
        .estimate_with_diagnostics(&seq)
        .unwrap();
    assert_eq!(estimate.diagnostics.equations, 1);
    assert_eq!(estimate.diagnostics.unknowns, 18);
    assert!(estimate.diagnostics.rank <= 1);
    assert!(estimate.motion.iter().all(|m| m.is_finite()));
}

#[test]
fn test_rejects_truncation_beyond_sequence() {
    let frames = translated_sequence(10, 10, 9, DVec2::ZERO);
    let seq = FieldSequence::new(&frames).unwrap();

    let err = estimator(SpectralTruncation::new(5, 2, 2, 1, 1))
        .estimate(&seq)
        .unwrap_err();
    assert!(matches!(err, NowcastError::InvalidParameter { name: "nx/mx", .. }));

    let err = estimator(SpectralTruncation::new(2, 2, 5, 1, 1))
        .estimate(&seq)
        .unwrap_err();
    assert!(matches!(err, NowcastError::InvalidParameter { name: "nt", .. }));
}

#[test]
fn test_rejects_single_frame() {
    let frames = vec![ScalarField::new_filled(10, 10, 1.0)];
    let seq = FieldSequence::new(&frames).unwrap();
    assert!(matches!(
        estimator(SpectralTruncation::new(1, 1, 0, 1, 1)).estimate(&seq),
        Err(NowcastError::InvalidParameter { name: "sequence", .. })
    ));
}

#[test]
fn test_rejects_invalid_config() {
    let config = DartsConfig {
        imaginary_tolerance: -1.0,
        ..Default::default()
    };
    assert!(matches!(
        DartsEstimator::new(config),
        Err(NowcastError::InvalidParameter { name: "imaginary_tolerance", .. })
    ));
}

#[test]
fn test_free_function_matches_estimator() {
    let frames = translated_sequence(12, 12, 5, DVec2::new(0.2, -0.1));
    let seq = FieldSequence::new(&frames).unwrap();
    let config = DartsConfig::with_truncation(SpectralTruncation::new(3, 3, 2, 1, 1));

    let a = estimate_motion_darts(&seq, &config).unwrap();
    let b = DartsEstimator::new(config).unwrap().estimate(&seq).unwrap();
    assert_eq!(a, b);
}
