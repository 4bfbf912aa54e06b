//! Scalar helpers shared by the curve, resampling and deep-image code.

use super::color::Color;
use super::core::{Point3, Vec3};

/// Values that support straight-line blending.
pub trait Lerp: Copy {
    #[must_use]
    fn lerp(self, rhs: Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(self, rhs: Self, t: f64) -> Self {
        self + (rhs - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp(self, rhs: Self, t: f64) -> Self {
        Vec3::lerp(self, rhs, t)
    }
}

impl Lerp for Point3 {
    fn lerp(self, rhs: Self, t: f64) -> Self {
        Point3::lerp(self, rhs, t)
    }
}

impl Lerp for Color {
    fn lerp(self, rhs: Self, t: f64) -> Self {
        Color::lerp(self, rhs, t)
    }
}

/// Fraction of the way `value` lies from `low` to `high`.
///
/// Returns 0 when the span is too small for the division to be meaningful,
/// which covers coincident sample positions.
#[must_use]
pub fn lerp_factor(value: f64, low: f64, high: f64) -> f64 {
    let d = high - low;
    let n = value - low;
    if d.abs() > 1.0 || n.abs() < f64::MAX * d.abs() {
        n / d
    } else {
        0.0
    }
}

/// Maps a `[0,1]` fraction onto the `[low, high]` range.
#[must_use]
pub fn fit01<T: Lerp>(t: f64, low: T, high: T) -> T {
    low.lerp(high, t)
}

/// Bilinear blend of four corner values. `v10` is the `+x` neighbour of `v00`,
/// `v01` the `+y` neighbour.
#[must_use]
pub fn lerp2d<T: Lerp>(tx: f64, ty: f64, v00: T, v10: T, v01: T, v11: T) -> T {
    let bottom = v00.lerp(v10, tx);
    let top = v01.lerp(v11, tx);
    bottom.lerp(top, ty)
}
