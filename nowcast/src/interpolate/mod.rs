//! Motion-compensated temporal interpolation between two fields.
//!
//! At relative time `t` the first field is warped by `t * backward` and the
//! second by `(1 - t) * forward`; both then show the content where it would
//! be at `t`, and the result is their cross-dissolve
//! `(1 - t) * first + t * second`. With a zero forward field this reduces to
//! a plain linear blend.

use rayon::prelude::*;

use crate::config::InterpolationConfig;
use crate::error::{NowcastError, Result};
use crate::field::{MotionField, ScalarField, ensure_non_empty, ensure_same_shape};
use crate::warp::FrameWarper;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpolator {
    config: InterpolationConfig,
    warper: FrameWarper,
}

impl Interpolator {
    pub fn new(config: InterpolationConfig) -> Self {
        Self {
            config,
            warper: FrameWarper::new(config.method, config.boundary),
        }
    }

    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    /// Blend `first` and `second` at relative time `t` in `[0, 1]`.
    ///
    /// `backward` defaults to the negated `forward` field.
    pub fn morph(
        &self,
        first: &ScalarField,
        second: &ScalarField,
        forward: &MotionField,
        backward: Option<&MotionField>,
        t: f64,
    ) -> Result<ScalarField> {
        validate_inputs(first, second, forward, backward)?;
        if !(0.0..=1.0).contains(&t) {
            return Err(NowcastError::invalid(
                "t",
                format!("must lie in [0, 1], got {}", t),
            ));
        }
        self.blend(first, second, forward, backward, t)
    }

    /// `n` frames strictly between `first` and `second`, at relative times
    /// `k / (n + 1)` for `k = 1..=n`. The inputs are not included.
    pub fn interpolate(
        &self,
        first: &ScalarField,
        second: &ScalarField,
        forward: &MotionField,
        n: usize,
        backward: Option<&MotionField>,
    ) -> Result<Vec<ScalarField>> {
        validate_inputs(first, second, forward, backward)?;
        if n == 0 {
            return Err(NowcastError::invalid("n", "must be at least 1"));
        }

        tracing::debug!(
            n,
            width = first.width(),
            height = first.height(),
            explicit_backward = backward.is_some(),
            "interpolating frames"
        );

        (1..=n)
            .into_par_iter()
            .map(|k| {
                let t = k as f64 / (n + 1) as f64;
                self.blend(first, second, forward, backward, t)
            })
            .collect()
    }

    fn blend(
        &self,
        first: &ScalarField,
        second: &ScalarField,
        forward: &MotionField,
        backward: Option<&MotionField>,
        t: f64,
    ) -> Result<ScalarField> {
        // Without an explicit backward field, t * (-forward) is forward scaled by -t.
        let first_warped = match backward {
            Some(backward) => self.warper.warp_displaced(first, backward, t)?,
            None => self.warper.warp_displaced(first, forward, -t)?,
        };
        let second_warped = self.warper.warp_displaced(second, forward, 1.0 - t)?;
        Ok(first_warped.zip_map(&second_warped, |&a, &b| (1.0 - t) * a + t * b))
    }
}

fn validate_inputs(
    first: &ScalarField,
    second: &ScalarField,
    forward: &MotionField,
    backward: Option<&MotionField>,
) -> Result<()> {
    ensure_non_empty("first field", first)?;
    ensure_same_shape("second field", first, second)?;
    ensure_same_shape("forward motion", first, forward)?;
    if let Some(backward) = backward {
        ensure_same_shape("backward motion", first, backward)?;
    }
    Ok(())
}

/// Interpolate `n` frames between `first` and `second`.
///
/// See [`Interpolator::interpolate`].
pub fn interpolate(
    first: &ScalarField,
    second: &ScalarField,
    forward: &MotionField,
    n: usize,
    backward: Option<&MotionField>,
    config: &InterpolationConfig,
) -> Result<Vec<ScalarField>> {
    Interpolator::new(*config).interpolate(first, second, forward, n, backward)
}

/// Single blended frame at relative time `t`. See [`Interpolator::morph`].
pub fn morph(
    first: &ScalarField,
    second: &ScalarField,
    forward: &MotionField,
    backward: Option<&MotionField>,
    t: f64,
    config: &InterpolationConfig,
) -> Result<ScalarField> {
    Interpolator::new(*config).morph(first, second, forward, backward, t)
}
