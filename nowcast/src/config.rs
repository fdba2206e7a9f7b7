//! Configuration types.
//!
//! All configuration structs and related enums are consolidated here. Every
//! struct has documented defaults and a `validate` method; operations call
//! `validate` before touching any data.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NowcastError, Result};

// =============================================================================
// Resampling
// =============================================================================

/// Interpolation kernel used when sampling a field at fractional coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMethod {
    /// Nearest sample, no blending.
    Nearest,
    /// Bilinear blend of the 2x2 neighbourhood.
    #[default]
    Bilinear,
    /// Catmull-Rom bicubic over the 4x4 neighbourhood.
    Bicubic,
}

/// What a sample outside the grid evaluates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Coordinates outside `[0, width) x [0, height)` produce the missing marker.
    Fill,
    /// Coordinates are clamped onto the grid and take the nearest edge value.
    Clamp,
}

// =============================================================================
// Spectral estimation
// =============================================================================

/// Truncation orders of the Fourier series used by the spectral estimator.
///
/// `nx`, `ny`, `nt` bound the input representation: frequency triples with
/// `|kx| <= nx`, `|ky| <= ny`, `|kt| <= nt` form the equations. `mx`, `my`
/// bound the output motion field: `|kpx| <= mx`, `|kpy| <= my` are the
/// unknowns. The equation system has `(2nx+1)(2ny+1)(2nt+1)` rows and
/// `2(2mx+1)(2my+1)` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralTruncation {
    pub nx: usize,
    pub ny: usize,
    pub nt: usize,
    pub mx: usize,
    pub my: usize,
}

impl Default for SpectralTruncation {
    fn default() -> Self {
        Self {
            nx: 30,
            ny: 30,
            nt: 4,
            mx: 1,
            my: 1,
        }
    }
}

impl SpectralTruncation {
    pub fn new(nx: usize, ny: usize, nt: usize, mx: usize, my: usize) -> Self {
        Self { nx, ny, nt, mx, my }
    }

    /// Number of equations (rows of the design matrix).
    #[inline]
    pub fn equations(&self) -> usize {
        (2 * self.nx + 1) * (2 * self.ny + 1) * (2 * self.nt + 1)
    }

    /// Number of output coefficients per motion component.
    #[inline]
    pub fn coefficients(&self) -> usize {
        (2 * self.mx + 1) * (2 * self.my + 1)
    }

    /// Check that a `width x height x frames` sequence resolves every
    /// frequency the system samples without aliasing.
    ///
    /// The design matrix reads the spectrum at `kx - kpx` and `ky - kpy`, so
    /// the spatial extents must hold `2(nx+mx)+1` and `2(ny+my)+1` distinct
    /// frequencies; the temporal extent must hold `2nt+1`.
    pub fn validate_for(&self, width: usize, height: usize, frames: usize) -> Result<()> {
        if frames < 2 {
            return Err(NowcastError::invalid(
                "sequence",
                format!("motion estimation needs at least 2 frames, got {}", frames),
            ));
        }
        let span_x = 2 * (self.nx + self.mx) + 1;
        if span_x > width {
            return Err(NowcastError::invalid(
                "nx/mx",
                format!(
                    "nx={} and mx={} need width >= {}, got {}",
                    self.nx, self.mx, span_x, width
                ),
            ));
        }
        let span_y = 2 * (self.ny + self.my) + 1;
        if span_y > height {
            return Err(NowcastError::invalid(
                "ny/my",
                format!(
                    "ny={} and my={} need height >= {}, got {}",
                    self.ny, self.my, span_y, height
                ),
            ));
        }
        let span_t = 2 * self.nt + 1;
        if span_t > frames {
            return Err(NowcastError::invalid(
                "nt",
                format!("nt={} needs at least {} frames, got {}", self.nt, span_t, frames),
            ));
        }
        Ok(())
    }
}

/// Configuration of the spectral (DARTS) motion estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DartsConfig {
    pub truncation: SpectralTruncation,
    /// Relative cutoff below which singular values are treated as zero.
    /// `None` uses `max(rows, cols) * f64::EPSILON`.
    pub rcond: Option<f64>,
    /// Largest tolerated ratio of discarded imaginary to kept real magnitude
    /// after the inverse transform; larger ratios are logged as warnings.
    pub imaginary_tolerance: f64,
    /// Value substituted for missing samples before the transform.
    pub missing_fill: f64,
}

impl Default for DartsConfig {
    fn default() -> Self {
        Self {
            truncation: SpectralTruncation::default(),
            rcond: None,
            imaginary_tolerance: 1e-6,
            missing_fill: 0.0,
        }
    }
}

impl DartsConfig {
    pub fn with_truncation(truncation: SpectralTruncation) -> Self {
        Self {
            truncation,
            ..Default::default()
        }
    }

    /// Validate the parameters that do not depend on the input sequence.
    pub fn validate(&self) -> Result<()> {
        if let Some(rcond) = self.rcond {
            if !(rcond.is_finite() && rcond >= 0.0) {
                return Err(NowcastError::invalid(
                    "rcond",
                    format!("must be finite and non-negative, got {}", rcond),
                ));
            }
        }
        if !(self.imaginary_tolerance.is_finite() && self.imaginary_tolerance >= 0.0) {
            return Err(NowcastError::invalid(
                "imaginary_tolerance",
                format!(
                    "must be finite and non-negative, got {}",
                    self.imaginary_tolerance
                ),
            ));
        }
        if !self.missing_fill.is_finite() {
            return Err(NowcastError::invalid(
                "missing_fill",
                format!("must be finite, got {}", self.missing_fill),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Extrapolation
// =============================================================================

/// Direction in which trajectories are integrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Accumulate displacement along the motion field (`s = +1`).
    Forward,
    /// Accumulate displacement against the motion field (`s = -1`).
    #[default]
    Inverse,
}

impl Direction {
    pub fn from_inverse(inverse: bool) -> Self {
        if inverse {
            Direction::Inverse
        } else {
            Direction::Forward
        }
    }

    #[inline]
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Inverse => -1.0,
        }
    }
}

/// Configuration of semi-Lagrangian extrapolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrapolationConfig {
    /// Number of sub-intervals the lead time is split into.
    pub n_steps: usize,
    /// Fixed-point passes refining each sub-interval's displacement.
    pub n_iter: usize,
    pub direction: Direction,
    /// Kernel used for sampling both the motion field and the advected field.
    pub method: InterpolationMethod,
}

impl Default for ExtrapolationConfig {
    fn default() -> Self {
        Self {
            n_steps: 15,
            n_iter: 3,
            direction: Direction::default(),
            method: InterpolationMethod::default(),
        }
    }
}

impl ExtrapolationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_steps == 0 {
            return Err(NowcastError::invalid("n_steps", "must be at least 1"));
        }
        if self.n_iter == 0 {
            return Err(NowcastError::invalid("n_iter", "must be at least 1"));
        }
        Ok(())
    }
}

// =============================================================================
// Interpolation
// =============================================================================

/// Configuration of motion-compensated temporal interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationConfig {
    /// Boundary handling of both warps. Clamp keeps the output dense.
    pub boundary: BoundaryPolicy,
    pub method: InterpolationMethod,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            boundary: BoundaryPolicy::Clamp,
            method: InterpolationMethod::default(),
        }
    }
}

// =============================================================================
// Top-level
// =============================================================================

/// Complete configuration, loadable from YAML.
///
/// ```yaml
/// darts:
///   truncation: { nx: 8, ny: 8, nt: 2, mx: 1, my: 1 }
/// extrapolation:
///   n_steps: 10
///   direction: forward
/// interpolation:
///   boundary: fill
/// ```
///
/// Omitted sections and fields take their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub darts: DartsConfig,
    pub extrapolation: ExtrapolationConfig,
    pub interpolation: InterpolationConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.darts.validate()?;
        self.extrapolation.validate()?;
        Ok(())
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Config = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| NowcastError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }
}
