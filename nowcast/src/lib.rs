//! Motion estimation and advection-based nowcasting of 2D scalar fields.
//!
//! The crate estimates a dense motion field from a sequence of frames with the
//! spectral DARTS method, and uses a motion field to
//!
//! - **extrapolate** a frame to an arbitrary lead time by semi-Lagrangian
//!   advection ([`extrapolate`]), and
//! - **interpolate** motion-compensated frames between two observations
//!   ([`interpolate`]).
//!
//! ```text
//! FieldSequence -> DartsEstimator -> MotionField -> Extrapolator -> ScalarField
//!                                                -> Interpolator -> [ScalarField]
//! ```
//!
//! Fields are [`common::buffer2::Buffer2`] grids addressed `(x, y)`. Missing
//! samples are NaN. Motion is measured in grid cells per frame interval.
//!
//! All operations are synchronous and free of shared state; the per-pixel and
//! per-frequency work is parallelized internally with rayon. The library logs
//! through `tracing` and never installs a subscriber.

pub mod config;
pub mod darts;
pub mod error;
pub mod extrapolate;
pub mod field;
pub mod interpolate;
pub mod trajectory;
pub mod warp;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{
    BoundaryPolicy, Config, DartsConfig, Direction, ExtrapolationConfig, InterpolationConfig,
    InterpolationMethod, SpectralTruncation,
};
pub use darts::{DartsDiagnostics, DartsEstimate, DartsEstimator, estimate_motion_darts};
pub use error::{NowcastError, Result};
pub use extrapolate::{Extrapolator, extrapolate, extrapolate_sequence};
pub use field::{
    DisplacementField, FieldSequence, MISSING, MotionField, MotionFieldExt, ScalarField,
    coordinate_grid, is_missing,
};
pub use interpolate::{Interpolator, interpolate, morph};
pub use trajectory::TrajectoryIntegrator;
pub use warp::{FrameWarper, Sample};
