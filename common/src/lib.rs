//! Shared infrastructure for the nowcast workspace.

pub mod buffer2;
pub mod float_ext;
pub mod log_setup;

/// Default absolute tolerance used by [`float_ext::FloatExt::approximately_eq`].
pub const EPSILON: f64 = 1e-6;
