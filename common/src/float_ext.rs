//! Tolerance-based float comparison.

pub trait FloatExt {
    /// `true` when `|self - other| < EPSILON`. NaN never compares equal.
    fn approximately_eq(self, other: Self) -> bool;

    /// `true` when `|self - other| <= tol`. NaN never compares equal.
    fn within(self, other: Self, tol: Self) -> bool;
}

impl FloatExt for f32 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON as f32
    }

    fn within(self, other: Self, tol: Self) -> bool {
        (self - other).abs() <= tol
    }
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON
    }

    fn within(self, other: Self, tol: Self) -> bool {
        (self - other).abs() <= tol
    }
}
