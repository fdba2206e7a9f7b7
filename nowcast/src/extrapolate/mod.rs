//! Semi-Lagrangian extrapolation of a field along a motion field.

use crate::config::{BoundaryPolicy, ExtrapolationConfig};
use crate::error::{NowcastError, Result};
use crate::field::{MotionField, ScalarField, ensure_non_empty, ensure_same_shape, is_missing};
use crate::trajectory::TrajectoryIntegrator;
use crate::warp::FrameWarper;


/// Advects fields along a motion field to arbitrary lead times.
///
/// Pixels whose trajectory leaves the grid are missing in the output, so the
/// missing band along the inflow boundaries widens with the lead time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extrapolator {
    config: ExtrapolationConfig,
    integrator: TrajectoryIntegrator,
    warper: FrameWarper,
}

impl Extrapolator {
    pub fn new(config: ExtrapolationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            integrator: TrajectoryIntegrator::from_config(&config)?,
            warper: FrameWarper::new(config.method, BoundaryPolicy::Fill),
        })
    }

    pub fn config(&self) -> &ExtrapolationConfig {
        &self.config
    }

    /// Forecast `field` at `lead_time`, in the time unit of `motion`.
    pub fn extrapolate(
        &self,
        field: &ScalarField,
        motion: &MotionField,
        lead_time: f64,
    ) -> Result<ScalarField> {
        ensure_non_empty("field", field)?;
        ensure_same_shape("motion", field, motion)?;

        let displacement = self
            .integrator
            .integrate(motion, self.config.direction, lead_time)?;
        let output = self.warper.warp_displaced(field, &displacement, 1.0)?;

        tracing::debug!(
            lead_time,
            missing = output.iter().filter(|&&v| is_missing(v)).count(),
            "extrapolated field"
        );
        Ok(output)
    }

    /// One forecast per entry of `lead_times`, in the same order.
    ///
    /// All lead times are validated before any forecast is computed.
    pub fn extrapolate_sequence(
        &self,
        field: &ScalarField,
        motion: &MotionField,
        lead_times: &[f64],
    ) -> Result<Vec<ScalarField>> {
        ensure_non_empty("field", field)?;
        ensure_same_shape("motion", field, motion)?;
        if let Some(&t) = lead_times.iter().find(|t| !t.is_finite()) {
            return Err(NowcastError::invalid(
                "lead_time",
                format!("must be finite, got {}", t),
            ));
        }

        lead_times
            .iter()
            .map(|&t| self.extrapolate(field, motion, t))
            .collect()
    }
}

/// Forecast `field` at `lead_time` by following `motion` backward or forward
/// as `config.direction` selects.
pub fn extrapolate(
    field: &ScalarField,
    motion: &MotionField,
    lead_time: f64,
    config: &ExtrapolationConfig,
) -> Result<ScalarField> {
    Extrapolator::new(*config)?.extrapolate(field, motion, lead_time)
}

/// Forecasts of `field` at each of `lead_times`.
pub fn extrapolate_sequence(
    field: &ScalarField,
    motion: &MotionField,
    lead_times: &[f64],
    config: &ExtrapolationConfig,
) -> Result<Vec<ScalarField>> {
    Extrapolator::new(*config)?.extrapolate_sequence(field, motion, lead_times)
}
