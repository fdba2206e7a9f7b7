//! Field resampling at fractional coordinates.
//!
//! # Interpolation Methods
//!
//! - **Nearest**: no blending, picks the closest sample.
//! - **Bilinear**: linear in both axes over the 2x2 neighbourhood (default).
//! - **Bicubic**: Catmull-Rom spline over the 4x4 neighbourhood.
//!
//! # Boundaries
//!
//! With [`BoundaryPolicy::Fill`] a coordinate outside `[0, width) x [0, height)`
//! yields the missing marker. With [`BoundaryPolicy::Clamp`] the coordinate is
//! clamped onto the grid first. In both cases kernel taps that fall outside
//! the grid replicate the edge, and taps with zero weight are skipped so that
//! sampling exactly on a pixel returns that pixel even next to missing data.
//!
//! Sampling is generic over [`Sample`], so the same kernels resample scalar
//! fields and motion fields.

use std::ops::{Add, Mul};

use common::buffer2::Buffer2;
use glam::DVec2;
use rayon::prelude::*;

use crate::config::{BoundaryPolicy, InterpolationMethod};
use crate::error::Result;
use crate::field::{ensure_non_empty, ensure_same_shape};

/// Number of rows to process per parallel chunk.
const ROWS_PER_CHUNK: usize = 32;


/// A value that can be blended by an interpolation kernel.
pub trait Sample: Copy + Send + Sync + Add<Output = Self> + Mul<f64, Output = Self> {
    const ZERO: Self;
    /// Produced for samples with no defined value.
    const MISSING: Self;
}

impl Sample for f64 {
    const ZERO: Self = 0.0;
    const MISSING: Self = f64::NAN;
}

impl Sample for DVec2 {
    const ZERO: Self = DVec2::ZERO;
    const MISSING: Self = DVec2::NAN;
}

/// Bicubic kernel value (Catmull-Rom spline).
///
/// W(x) = (a+2)|x|^3 - (a+3)|x|^2 + 1       for |x| <= 1
/// W(x) = a|x|^3 - 5a|x|^2 + 8a|x| - 4a     for 1 < |x| < 2
/// W(x) = 0                                  otherwise
///
/// where a = -0.5
#[inline]
pub(crate) fn bicubic_kernel(x: f64) -> f64 {
    const A: f64 = -0.5;

    let abs_x = x.abs();

    if abs_x <= 1.0 {
        ((A + 2.0) * abs_x - (A + 3.0)) * abs_x * abs_x + 1.0
    } else if abs_x < 2.0 {
        ((A * abs_x - 5.0 * A) * abs_x + 8.0 * A) * abs_x - 4.0 * A
    } else {
        0.0
    }
}

/// Read a kernel tap, replicating the edge for out-of-grid indices.
#[inline]
fn tap<T: Sample>(field: &Buffer2<T>, x: i64, y: i64) -> T {
    let xi = x.clamp(0, field.width() as i64 - 1) as usize;
    let yi = y.clamp(0, field.height() as i64 - 1) as usize;
    field[(xi, yi)]
}

#[inline]
fn sample_nearest<T: Sample>(field: &Buffer2<T>, x: f64, y: f64) -> T {
    tap(field, x.round() as i64, y.round() as i64)
}

#[inline]
fn sample_bilinear<T: Sample>(field: &Buffer2<T>, x: f64, y: f64) -> T {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let mut acc = T::ZERO;
    for (dy, wy) in [(0, 1.0 - fy), (1, fy)] {
        if wy == 0.0 {
            continue;
        }
        for (dx, wx) in [(0, 1.0 - fx), (1, fx)] {
            if wx == 0.0 {
                continue;
            }
            acc = acc + tap(field, x0 + dx, y0 + dy) * (wx * wy);
        }
    }
    acc
}

fn sample_bicubic<T: Sample>(field: &Buffer2<T>, x: f64, y: f64) -> T {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let wx = [
        bicubic_kernel(fx + 1.0),
        bicubic_kernel(fx),
        bicubic_kernel(fx - 1.0),
        bicubic_kernel(fx - 2.0),
    ];
    let wy = [
        bicubic_kernel(fy + 1.0),
        bicubic_kernel(fy),
        bicubic_kernel(fy - 1.0),
        bicubic_kernel(fy - 2.0),
    ];

    let mut acc = T::ZERO;
    for (j, &wyj) in wy.iter().enumerate() {
        if wyj == 0.0 {
            continue;
        }
        let py = y0 - 1 + j as i64;
        for (i, &wxi) in wx.iter().enumerate() {
            if wxi == 0.0 {
                continue;
            }
            let px = x0 - 1 + i as i64;
            acc = acc + tap(field, px, py) * (wxi * wyj);
        }
    }
    acc
}

/// Stateless resampler: a kernel plus a boundary policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameWarper {
    method: InterpolationMethod,
    boundary: BoundaryPolicy,
}

impl FrameWarper {
    pub fn new(method: InterpolationMethod, boundary: BoundaryPolicy) -> Self {
        Self { method, boundary }
    }

    #[inline]
    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    #[inline]
    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// Sample `field` at `(x, y)`. Non-finite coordinates and empty fields
    /// yield the missing marker.
    #[inline]
    pub fn sample<T: Sample>(&self, field: &Buffer2<T>, x: f64, y: f64) -> T {
        if field.is_empty() || !(x.is_finite() && y.is_finite()) {
            return T::MISSING;
        }

        let width = field.width() as f64;
        let height = field.height() as f64;
        let (x, y) = match self.boundary {
            BoundaryPolicy::Fill => {
                if x < 0.0 || y < 0.0 || x >= width || y >= height {
                    return T::MISSING;
                }
                (x, y)
            }
            BoundaryPolicy::Clamp => (x.clamp(0.0, width - 1.0), y.clamp(0.0, height - 1.0)),
        };

        match self.method {
            InterpolationMethod::Nearest => sample_nearest(field, x, y),
            InterpolationMethod::Bilinear => sample_bilinear(field, x, y),
            InterpolationMethod::Bicubic => sample_bicubic(field, x, y),
        }
    }

    /// Sample `field` at every coordinate of `coords`.
    ///
    /// The output has the shape of `coords`, which may differ from `field`.
    pub fn warp<T: Sample>(&self, field: &Buffer2<T>, coords: &Buffer2<DVec2>) -> Result<Buffer2<T>> {
        ensure_non_empty("field", field)?;

        let width = coords.width();
        let mut output = vec![T::ZERO; coords.len()];
        if width > 0 {
            output
                .par_chunks_mut(width * ROWS_PER_CHUNK)
                .zip(coords.pixels().par_chunks(width * ROWS_PER_CHUNK))
                .for_each(|(chunk, coord_chunk)| {
                    for (out, c) in chunk.iter_mut().zip(coord_chunk) {
                        *out = self.sample(field, c.x, c.y);
                    }
                });
        }
        Ok(Buffer2::new(width, coords.height(), output))
    }

    /// Sample `field` at `(x, y) + scale * displacement(x, y)` for every pixel.
    ///
    /// `displacement` must have the shape of `field`.
    pub fn warp_displaced<T: Sample>(
        &self,
        field: &Buffer2<T>,
        displacement: &Buffer2<DVec2>,
        scale: f64,
    ) -> Result<Buffer2<T>> {
        ensure_non_empty("field", field)?;
        ensure_same_shape("displacement", field, displacement)?;

        let width = field.width();
        let mut output = vec![T::ZERO; field.len()];
        output
            .par_chunks_mut(width * ROWS_PER_CHUNK)
            .enumerate()
            .for_each(|(chunk_idx, chunk)| {
                let start_y = chunk_idx * ROWS_PER_CHUNK;
                for (i, out) in chunk.iter_mut().enumerate() {
                    let x = i % width;
                    let y = start_y + i / width;
                    let d = displacement[(x, y)];
                    *out = self.sample(field, x as f64 + scale * d.x, y as f64 + scale * d.y);
                }
            });
        Ok(Buffer2::new(width, field.height(), output))
    }
}
