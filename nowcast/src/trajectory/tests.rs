use super::*;
use common::float_ext::FloatExt;

fn integrator(n_steps: usize, n_iter: usize) -> TrajectoryIntegrator {
    TrajectoryIntegrator::new(n_steps, n_iter, InterpolationMethod::Bilinear).unwrap()
}

#[test]
fn test_rejects_zero_steps_and_iterations() {
    assert!(matches!(
        TrajectoryIntegrator::new(0, 3, InterpolationMethod::Bilinear),
        Err(NowcastError::InvalidParameter { name: "n_steps", .. })
    ));
    assert!(matches!(
        TrajectoryIntegrator::new(5, 0, InterpolationMethod::Bilinear),
        Err(NowcastError::InvalidParameter { name: "n_iter", .. })
    ));
}

#[test]
fn test_rejects_non_finite_lead_time() {
    let motion = MotionField::new_filled(4, 4, DVec2::ZERO);
    for t in [f64::NAN, f64::INFINITY] {
        assert!(matches!(
            integrator(3, 3).integrate(&motion, Direction::Inverse, t),
            Err(NowcastError::InvalidParameter { name: "lead_time", .. })
        ));
    }
}

#[test]
fn test_zero_motion_gives_zero_displacement() {
    let motion = MotionField::new_filled(12, 9, DVec2::ZERO);
    for direction in [Direction::Forward, Direction::Inverse] {
        let d = integrator(7, 2).integrate(&motion, direction, 3.5).unwrap();
        assert_eq!(d.shape(), (12, 9));
        assert!(d.iter().all(|&v| v == DVec2::ZERO));
    }
}

#[test]
fn test_zero_lead_time_gives_zero_displacement() {
    let motion = MotionField::new_filled(6, 6, DVec2::new(2.0, -1.0));
    let d = integrator(4, 3).integrate(&motion, Direction::Forward, 0.0).unwrap();
    assert!(d.iter().all(|&v| v == DVec2::ZERO));
}

#[test]
fn test_constant_motion_displacement() {
    let motion = MotionField::new_filled(20, 40, DVec2::new(0.5, 0.25));
    let forward = integrator(8, 3).integrate(&motion, Direction::Forward, 2.0).unwrap();
    let inverse = integrator(8, 3).integrate(&motion, Direction::Inverse, 2.0).unwrap();

    // Pixels well inside the grid, away from any trajectory exit.
    for y in 2..38 {
        for x in 2..18 {
            let f = forward[(x, y)];
            let i = inverse[(x, y)];
            assert!(f.x.within(1.0, 1e-12) && f.y.within(0.5, 1e-12), "forward at ({x}, {y}): {f}");
            assert!(i.x.within(-1.0, 1e-12) && i.y.within(-0.5, 1e-12), "inverse at ({x}, {y}): {i}");
        }
    }
}

#[test]
fn test_negative_lead_time_reverses_direction() {
    let motion = MotionField::new_filled(16, 16, DVec2::new(-0.75, 0.5));
    let a = integrator(5, 3).integrate(&motion, Direction::Forward, -2.0).unwrap();
    let b = integrator(5, 3).integrate(&motion, Direction::Inverse, 2.0).unwrap();
    for y in 3..13 {
        for x in 3..13 {
            assert!((a[(x, y)] - b[(x, y)]).length() < 1e-12);
        }
    }
}

#[test]
fn test_trajectory_leaving_grid_is_missing() {
    let motion = MotionField::new_filled(10, 4, DVec2::new(1.0, 0.0));
    let d = integrator(3, 2).integrate(&motion, Direction::Forward, 3.0).unwrap();
    for y in 0..4 {
        assert!(d[(9, y)].is_nan(), "last column should leave the grid");
        assert!(d[(0, y)].x.within(3.0, 1e-12));
        assert!(d[(0, y)].y.within(0.0, 1e-12));
    }
}

#[test]
fn test_rotation_stays_on_circle() {
    // Solid-body rotation around the centre of a 41x41 grid.
    let omega = 0.1;
    let center = DVec2::new(20.0, 20.0);
    let motion = MotionField::from_fn(41, 41, |x, y| {
        let r = DVec2::new(x as f64, y as f64) - center;
        DVec2::new(-r.y, r.x) * omega
    });
    let lead_time = 5.0;
    let d = integrator(20, 3)
        .integrate(&motion, Direction::Inverse, lead_time)
        .unwrap();

    // Inverse integration rotates every point by -omega * t.
    let angle = -omega * lead_time;
    let rotation = DVec2::from_angle(angle);
    for (x, y) in [(30, 20), (20, 28), (14, 14), (25, 17)] {
        let origin = DVec2::new(x as f64, y as f64);
        let expected = center + rotation.rotate(origin - center);
        let end = origin + d[(x, y)];
        assert!(
            (end - expected).length() < 1e-2,
            "({x}, {y}) ended at {end}, expected {expected}"
        );
    }
}

#[test]
fn test_from_config_uses_config_values() {
    let config = ExtrapolationConfig {
        n_steps: 4,
        n_iter: 2,
        ..Default::default()
    };
    let integrator = TrajectoryIntegrator::from_config(&config).unwrap();
    assert_eq!(integrator.n_steps(), 4);
    assert_eq!(integrator.n_iter(), 2);
}
