//! Multi-dimensional FFT over row-major complex buffers.
//!
//! rustfft only transforms contiguous 1D lanes, so an N-D transform is done
//! axis by axis: every lane along the axis is gathered, transformed with a
//! per-worker scratch buffer, and scattered back.

use std::sync::Arc;

use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::field::{FieldSequence, is_missing};

/// 3D spectrum of a [`FieldSequence`], indexed `(ky, kx, kt)` with periodic wrap.
///
/// Storage is row-major over `[height, width, frames]`, so the sample of
/// pixel `(x, y)` at frame `t` lives at `(y * width + x) * frames + t`.
#[derive(Debug, Clone)]
pub(crate) struct Spectrum3 {
    data: Vec<Complex64>,
    width: usize,
    height: usize,
    frames: usize,
}

impl Spectrum3 {
    /// Forward 3D DFT of `sequence` (unnormalized, `exp(-2 pi i k n / N)` kernel).
    ///
    /// Missing samples are replaced by `missing_fill`. Returns the spectrum
    /// and the number of samples replaced.
    pub(crate) fn forward(
        planner: &mut FftPlanner<f64>,
        sequence: &FieldSequence,
        missing_fill: f64,
    ) -> (Self, usize) {
        let width = sequence.width();
        let height = sequence.height();
        let frames = sequence.len();

        let mut replaced = 0;
        let mut data = vec![Complex64::default(); width * height * frames];
        for (t, frame) in sequence.frames().iter().enumerate() {
            for (offset, &value) in frame.iter().enumerate() {
                let value = if is_missing(value) {
                    replaced += 1;
                    missing_fill
                } else {
                    value
                };
                data[offset * frames + t] = Complex64::new(value, 0.0);
            }
        }

        let shape = [height, width, frames];
        for (axis, &len) in shape.iter().enumerate().rev() {
            let fft = planner.plan_fft_forward(len);
            fft_axis(&mut data, shape, axis, &fft);
        }

        (
            Self {
                data,
                width,
                height,
                frames,
            },
            replaced,
        )
    }

    /// Coefficient at signed frequencies, wrapped periodically into range.
    #[inline]
    pub(crate) fn at(&self, ky: i64, kx: i64, kt: i64) -> Complex64 {
        let y = ky.rem_euclid(self.height as i64) as usize;
        let x = kx.rem_euclid(self.width as i64) as usize;
        let t = kt.rem_euclid(self.frames as i64) as usize;
        self.data[(y * self.width + x) * self.frames + t]
    }
}

/// Inverse 2D DFT of a row-major `height x width` spectrum, normalized by
/// `1 / (width * height)`.
pub(crate) fn inverse_2d(
    planner: &mut FftPlanner<f64>,
    mut spectrum: Vec<Complex64>,
    width: usize,
    height: usize,
) -> Vec<Complex64> {
    debug_assert_eq!(spectrum.len(), width * height);

    let shape = [height, width, 1];
    for axis in [1, 0] {
        let fft = planner.plan_fft_inverse(shape[axis]);
        fft_axis(&mut spectrum, shape, axis, &fft);
    }

    let norm = 1.0 / (width * height) as f64;
    spectrum.iter_mut().for_each(|c| *c *= norm);
    spectrum
}

/// Transform every lane of `data` along `axis` of a row-major 3D `shape`.
fn fft_axis(data: &mut [Complex64], shape: [usize; 3], axis: usize, fft: &Arc<dyn Fft<f64>>) {
    let len = shape[axis];
    if len <= 1 {
        return;
    }
    let strides = [shape[1] * shape[2], shape[2], 1];
    let stride = strides[axis];

    // Offsets of the first element of every lane.
    let starts: Vec<usize> = (0..data.len())
        .filter(|&i| (i / stride) % len == 0)
        .collect();

    let source: &[Complex64] = &*data;
    let lanes: Vec<Vec<Complex64>> = starts
        .par_iter()
        .map_init(
            || vec![Complex64::default(); fft.get_inplace_scratch_len()],
            |scratch, &start| {
                let mut lane: Vec<Complex64> =
                    (0..len).map(|k| source[start + k * stride]).collect();
                fft.process_with_scratch(&mut lane, scratch);
                lane
            },
        )
        .collect();

    for (&start, lane) in starts.iter().zip(lanes) {
        for (k, value) in lane.into_iter().enumerate() {
            data[start + k * stride] = value;
        }
    }
}
