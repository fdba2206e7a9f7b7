//! Field types shared by every stage.
//!
//! Grids are addressed `(x, y)`: `x` is the column in `[0, width)`, `y` the
//! row in `[0, height)`. Motion vectors store the horizontal component `u` in
//! `DVec2::x` and the vertical component `v` in `DVec2::y`, in grid cells per
//! sampling interval of the sequence they were estimated from.

use common::buffer2::Buffer2;
use glam::DVec2;

use crate::error::{NowcastError, Result};

/// Dense 2D grid of real samples. Non-finite samples mark missing data.
pub type ScalarField = Buffer2<f64>;

/// Dense 2D grid of `(u, v)` velocity vectors.
pub type MotionField = Buffer2<DVec2>;

/// Dense 2D grid of accumulated per-pixel displacements.
pub type DisplacementField = Buffer2<DVec2>;

/// Marker written into pixels whose value is undefined.
pub const MISSING: f64 = f64::NAN;

#[inline]
pub fn is_missing(value: f64) -> bool {
    !value.is_finite()
}

/// Fail with [`NowcastError::ShapeMismatch`] unless both grids share `(width, height)`.
pub(crate) fn ensure_same_shape<A, B>(
    what: &'static str,
    reference: &Buffer2<A>,
    other: &Buffer2<B>,
) -> Result<()> {
    if reference.same_shape(other) {
        Ok(())
    } else {
        Err(NowcastError::ShapeMismatch {
            what,
            expected: reference.shape(),
            actual: other.shape(),
        })
    }
}

pub(crate) fn ensure_non_empty<T>(what: &'static str, field: &Buffer2<T>) -> Result<()> {
    if field.width() == 0 || field.height() == 0 {
        return Err(NowcastError::invalid(
            what,
            format!("field must not be empty, got {:?}", field.shape()),
        ));
    }
    Ok(())
}

/// Grid whose every cell holds its own `(x, y)` coordinate.
pub fn coordinate_grid(width: usize, height: usize) -> Buffer2<DVec2> {
    Buffer2::from_fn(width, height, |x, y| DVec2::new(x as f64, y as f64))
}

/// An ordered, uniformly spaced sequence of equally shaped frames.
///
/// Borrows the caller's frames; construction validates that there is at
/// least one frame and that all frames share the same shape.
#[derive(Debug, Clone, Copy)]
pub struct FieldSequence<'a> {
    frames: &'a [ScalarField],
    width: usize,
    height: usize,
}

impl<'a> FieldSequence<'a> {
    pub fn new(frames: &'a [ScalarField]) -> Result<Self> {
        let first = frames
            .first()
            .ok_or_else(|| NowcastError::invalid("sequence", "at least one frame is required"))?;
        ensure_non_empty("sequence", first)?;
        for frame in &frames[1..] {
            ensure_same_shape("sequence frame", first, frame)?;
        }
        Ok(Self {
            frames,
            width: first.width(),
            height: first.height(),
        })
    }

    /// Number of frames `T`.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn frames(&self) -> &'a [ScalarField] {
        self.frames
    }

    /// Number of missing samples across all frames.
    pub fn missing_count(&self) -> usize {
        self.frames
            .iter()
            .map(|frame| frame.iter().filter(|&&v| is_missing(v)).count())
            .sum()
    }
}

/// Convenience operations on [`MotionField`].
pub trait MotionFieldExt: Sized {
    /// Stack separate `u` (horizontal) and `v` (vertical) grids.
    fn from_components(u: &ScalarField, v: &ScalarField) -> Result<Self>;

    /// Split into `(u, v)` component grids.
    fn components(&self) -> (ScalarField, ScalarField);

    /// Element-wise negation, the default backward field of a forward field.
    fn negated(&self) -> Self;

    /// Largest finite vector magnitude, `0.0` for an all-missing field.
    fn max_speed(&self) -> f64;
}

impl MotionFieldExt for MotionField {
    fn from_components(u: &ScalarField, v: &ScalarField) -> Result<Self> {
        ensure_same_shape("v component", u, v)?;
        Ok(u.zip_map(v, |&u, &v| DVec2::new(u, v)))
    }

    fn components(&self) -> (ScalarField, ScalarField) {
        (self.map(|m| m.x), self.map(|m| m.y))
    }

    fn negated(&self) -> Self {
        self.map(|&m| -m)
    }

    fn max_speed(&self) -> f64 {
        self.iter()
            .map(|m| m.length())
            .filter(|s| s.is_finite())
            .fold(0.0, f64::max)
    }
}
