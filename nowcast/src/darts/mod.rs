//! DARTS spectral motion estimation.
//!
//! The advection equation `dI/dt + u dI/dx + v dI/dy = 0` is written in the
//! Fourier domain with `u` and `v` expanded as truncated Fourier series. Each
//! input frequency triple `(kx, ky, kt)` then gives one linear equation in the
//! unknown motion coefficients:
//!
//! ```text
//! kt F[ky, kx, kt] = sum over (kpy, kpx) of
//!     c/H (ky-kpy) F[ky-kpy, kx-kpx, kt] V[kpy, kpx]
//!   + c/W (kx-kpx) F[ky-kpy, kx-kpx, kt] U[kpy, kpx]
//! ```
//!
//! with `c = -T / (W H)`. The overdetermined complex system is solved in the
//! least-squares sense through an SVD, which also gives the minimum-norm
//! solution when the system is rank deficient. The coefficients are placed
//! into full `H x W` spectra and transformed back to the spatial domain.
//!
//! The transform assumes the sequence is periodic in space and time, so the
//! estimate degrades on short sequences that do not wrap around in time.
//!
//! Reference: E. Ruzanski, V. Chandrasekar and Y. Wang, 2011: The CASA
//! Nowcasting System, J. Atmos. Oceanic Technol., 28(5), 640-655.

mod spectrum;

#[cfg(test)]
mod tests;

use glam::DVec2;
use nalgebra::{DMatrix, DVector, SVD};
use rayon::prelude::*;
use rustfft::FftPlanner;
use rustfft::num_complex::Complex64;

use common::buffer2::Buffer2;

use crate::config::{DartsConfig, SpectralTruncation};
use crate::error::{NowcastError, Result};
use crate::field::{FieldSequence, MotionField};
use spectrum::{Spectrum3, inverse_2d};

/// Quality figures of one estimation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DartsDiagnostics {
    /// Rows of the equation system, `(2nx+1)(2ny+1)(2nt+1)`.
    pub equations: usize,
    /// Columns of the equation system, `2(2mx+1)(2my+1)`.
    pub unknowns: usize,
    /// Numerical rank of the design matrix at the solver cutoff.
    pub rank: usize,
    /// Euclidean norm of the least-squares residual.
    pub residual_norm: f64,
    /// Largest imaginary magnitude of the reconstructed motion components,
    /// relative to the largest real magnitude. Near zero for a consistent
    /// spectral model.
    pub max_imaginary: f64,
    /// Missing input samples that were replaced before the transform.
    pub missing_replaced: usize,
}

/// Motion field together with the diagnostics of the solve that produced it.
#[derive(Debug, Clone)]
pub struct DartsEstimate {
    pub motion: MotionField,
    pub diagnostics: DartsDiagnostics,
}

/// Spectral motion estimator.
#[derive(Debug, Clone)]
pub struct DartsEstimator {
    config: DartsConfig,
}

impl DartsEstimator {
    pub fn new(config: DartsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DartsConfig {
        &self.config
    }

    /// Estimate the motion field of `sequence`, in grid cells per frame interval.
    ///
    /// The discrete Fourier transform treats the sequence as periodic in
    /// space and in time. Content that wraps around the grid edges and a
    /// sequence whose last frame leads back into its first give the most
    /// accurate estimates. Short sequences that do not close the temporal
    /// period leak spectral energy. The recovered motion then keeps its
    /// direction but usually underestimates the speed.
    pub fn estimate(&self, sequence: &FieldSequence) -> Result<MotionField> {
        Ok(self.estimate_with_diagnostics(sequence)?.motion)
    }

    pub fn estimate_with_diagnostics(&self, sequence: &FieldSequence) -> Result<DartsEstimate> {
        let width = sequence.width();
        let height = sequence.height();
        let frames = sequence.len();
        let truncation = self.config.truncation;
        truncation.validate_for(width, height, frames)?;

        let mut planner = FftPlanner::<f64>::new();
        let (spectrum, missing_replaced) =
            Spectrum3::forward(&mut planner, sequence, self.config.missing_fill);
        if missing_replaced > 0 {
            tracing::debug!(
                missing_replaced,
                fill = self.config.missing_fill,
                "replaced missing samples before transform"
            );
        }
        tracing::debug!(width, height, frames, "computed 3D spectrum");

        let (design, rhs) = assemble_system(&spectrum, &truncation, width, height, frames);
        let equations = design.nrows();
        let unknowns = design.ncols();
        tracing::debug!(equations, unknowns, "assembled spectral system");

        let svd = SVD::new(design.clone(), true, true);
        let max_sv = svd.singular_values.max();
        let rcond = self
            .config
            .rcond
            .unwrap_or(equations.max(unknowns) as f64 * f64::EPSILON);
        let eps = rcond * max_sv;
        let rank = svd.rank(eps);
        let solution = svd.solve(&rhs, eps).map_err(NowcastError::Solver)?;
        let residual_norm = (&design * &solution - &rhs).norm();
        tracing::debug!(rank, residual_norm, "solved least-squares system");

        let n = truncation.coefficients();
        let (v_coefs, u_coefs) = solution.as_slice().split_at(n);
        let v = coefficients_to_field(&mut planner, &truncation, v_coefs, width, height);
        let u = coefficients_to_field(&mut planner, &truncation, u_coefs, width, height);

        let max_real = u.iter().chain(&v).map(|c| c.re.abs()).fold(0.0, f64::max);
        let max_imag = u.iter().chain(&v).map(|c| c.im.abs()).fold(0.0, f64::max);
        let max_imaginary = if max_real > 0.0 {
            max_imag / max_real
        } else {
            max_imag
        };
        if max_imaginary > self.config.imaginary_tolerance {
            tracing::warn!(
                max_imaginary,
                tolerance = self.config.imaginary_tolerance,
                "discarding a significant imaginary part of the motion field"
            );
        }

        let motion = Buffer2::new(
            width,
            height,
            u.iter().zip(&v).map(|(u, v)| DVec2::new(u.re, v.re)).collect(),
        );

        Ok(DartsEstimate {
            motion,
            diagnostics: DartsDiagnostics {
                equations,
                unknowns,
                rank,
                residual_norm,
                max_imaginary,
                missing_replaced,
            },
        })
    }
}

/// Estimate a dense motion field from `sequence` with the DARTS method.
pub fn estimate_motion_darts(
    sequence: &FieldSequence,
    config: &DartsConfig,
) -> Result<MotionField> {
    DartsEstimator::new(config.clone())?.estimate(sequence)
}

/// Build the design matrix `[A | B]` and right-hand side of the spectral system.
///
/// Rows enumerate `(ky, kx, kt)` with `kt` varying fastest; columns enumerate
/// `(kpy, kpx)` with `kpx` varying fastest, first for `V` (block `A`) then
/// for `U` (block `B`).
fn assemble_system(
    spectrum: &Spectrum3,
    truncation: &SpectralTruncation,
    width: usize,
    height: usize,
    frames: usize,
) -> (DMatrix<Complex64>, DVector<Complex64>) {
    let SpectralTruncation { nx, ny, nt, mx, my } = *truncation;
    let (nx, ny, nt, mx, my) = (nx as i64, ny as i64, nt as i64, mx as i64, my as i64);
    let t_len = (2 * nt + 1) as usize;
    let x_len = (2 * nx + 1) as usize;
    let mx_len = (2 * mx + 1) as usize;

    let m = truncation.equations();
    let n = truncation.coefficients();
    let c = -(frames as f64) / (width * height) as f64;
    let scale_v = c / height as f64;
    let scale_u = c / width as f64;

    let mut design = vec![Complex64::default(); m * 2 * n];
    design
        .par_chunks_mut(2 * n)
        .enumerate()
        .for_each(|(i, row)| {
            let kt = (i % t_len) as i64 - nt;
            let kx = ((i / t_len) % x_len) as i64 - nx;
            let ky = (i / (t_len * x_len)) as i64 - ny;
            for j in 0..n {
                let kpx = (j % mx_len) as i64 - mx;
                let kpy = (j / mx_len) as i64 - my;
                let dy = ky - kpy;
                let dx = kx - kpx;
                let f = spectrum.at(dy, dx, kt);
                row[j] = f * (scale_v * dy as f64);
                row[n + j] = f * (scale_u * dx as f64);
            }
        });

    let rhs = DVector::from_iterator(
        m,
        (0..m).map(|i| {
            let kt = (i % t_len) as i64 - nt;
            let kx = ((i / t_len) % x_len) as i64 - nx;
            let ky = (i / (t_len * x_len)) as i64 - ny;
            spectrum.at(ky, kx, kt) * kt as f64
        }),
    );

    (DMatrix::from_row_slice(m, 2 * n, &design), rhs)
}

/// Zero-pad the `(kpy, kpx)` coefficients into a full spectrum with the zero
/// frequency at index `(0, 0)` and transform it to the spatial domain.
fn coefficients_to_field(
    planner: &mut FftPlanner<f64>,
    truncation: &SpectralTruncation,
    coefficients: &[Complex64],
    width: usize,
    height: usize,
) -> Vec<Complex64> {
    let mx_len = 2 * truncation.mx + 1;
    let (mx, my) = (truncation.mx as i64, truncation.my as i64);

    let mut full = vec![Complex64::default(); width * height];
    for (j, &coef) in coefficients.iter().enumerate() {
        let kpx = (j % mx_len) as i64 - mx;
        let kpy = (j / mx_len) as i64 - my;
        let x = kpx.rem_euclid(width as i64) as usize;
        let y = kpy.rem_euclid(height as i64) as usize;
        full[y * width + x] = coef;
    }
    inverse_2d(planner, full, width, height)
}
