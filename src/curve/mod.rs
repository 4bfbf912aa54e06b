//! Sampled function curves.
//!
//! A [`SampledCurve`] is an ordered list of `(position, value)` samples with
//! piecewise interpolation between neighbours and clamping outside the sampled
//! range. Positions are usually depth or shutter time, but the container puts
//! no restriction on them.
//!
//! How values blend is decided by the value type through [`Interpolable`]:
//! scalars, vectors and colours blend linearly, rotations spherically.
//!
//! # Example
//!
//! ```ignore
//! use deep_volume::curve::FloatCurve;
//!
//! let mut curve = FloatCurve::new();
//! curve.add_sample(0.0, 0.0);
//! curve.add_sample(1.0, 10.0);
//! assert_eq!(curve.interpolate(0.5), 5.0);
//! assert_eq!(curve.interpolate(2.0), 10.0);
//! ```

mod resample;

pub use resample::{
    DEFAULT_SAMPLE_COUNT, DirectionTest, NonMonotonicPolicy, ResampleDiagnostics, ResampleError,
    ResampleOptions, resample_transmittance,
};

use crate::geom::{Color, Point3, Quat, Vec3, lerp_factor};

/// Per-type blend policy used by [`SampledCurve::interpolate`].
pub trait Interpolable: Clone {
    /// Value of a curve with no samples.
    fn default_value() -> Self;

    /// Blend `self` towards `other`. `t` is the fraction in `[0, 1]`,
    /// measured along the blend path (arc length for rotations).
    #[must_use]
    fn blend(&self, other: &Self, t: f64) -> Self;
}

impl Interpolable for f64 {
    fn default_value() -> Self {
        0.0
    }

    fn blend(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Interpolable for Vec3 {
    fn default_value() -> Self {
        Vec3::ZERO
    }

    fn blend(&self, other: &Self, t: f64) -> Self {
        self.lerp(*other, t)
    }
}

impl Interpolable for Point3 {
    fn default_value() -> Self {
        Point3::ORIGIN
    }

    fn blend(&self, other: &Self, t: f64) -> Self {
        self.lerp(*other, t)
    }
}

impl Interpolable for Color {
    fn default_value() -> Self {
        Color::ZERO
    }

    fn blend(&self, other: &Self, t: f64) -> Self {
        self.lerp(*other, t)
    }
}

impl Interpolable for Quat {
    fn default_value() -> Self {
        Quat::IDENTITY
    }

    fn blend(&self, other: &Self, t: f64) -> Self {
        self.slerp(*other, t)
    }
}

/// One curve anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<T> {
    pub position: f64,
    pub value: T,
}

impl<T> Sample<T> {
    #[must_use]
    pub const fn new(position: f64, value: T) -> Self {
        Self { position, value }
    }
}

/// Samples kept sorted ascending by position.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledCurve<T> {
    samples: Vec<Sample<T>>,
}

pub type FloatCurve = SampledCurve<f64>;
pub type VectorCurve = SampledCurve<Vec3>;
pub type ColorCurve = SampledCurve<Color>;
pub type QuatCurve = SampledCurve<Quat>;

/// Depth-to-transmittance function of one deep pixel.
pub type TransmittanceFunction = ColorCurve;

impl<T> Default for SampledCurve<T> {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
        }
    }
}

impl<T: Interpolable> SampledCurve<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Curve holding `value` at position 0.
    #[must_use]
    pub fn with_initial_value(value: T) -> Self {
        let mut curve = Self::new();
        curve.add_sample(0.0, value);
        curve
    }

    /// `count` copies of `value` spread over `[0, 1]` (position 0 when
    /// `count == 1`).
    #[must_use]
    pub fn constant(count: usize, value: &T) -> Self {
        let denom = count.saturating_sub(1).max(1);
        let samples = (0..count)
            .map(|i| Sample::new(unit_fraction(i, denom), value.clone()))
            .collect();
        Self { samples }
    }

    /// Inserts before the first sample whose position is strictly greater,
    /// so samples sharing a position keep their insertion order.
    pub fn add_sample(&mut self, position: f64, value: T) {
        let idx = self.upper_index(position);
        self.samples.insert(idx, Sample::new(position, value));
    }

    /// Value at `position`; clamps to the end values outside the sampled range.
    #[must_use]
    pub fn interpolate(&self, position: f64) -> T {
        let (first, last) = match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return T::default_value(),
        };

        let idx = self.upper_index(position);
        if idx == self.samples.len() {
            return last.value.clone();
        }
        if idx == 0 {
            return first.value.clone();
        }

        let upper = &self.samples[idx];
        let lower = &self.samples[idx - 1];
        let t = lerp_factor(position, lower.position, upper.position);
        lower.value.blend(&upper.value, t)
    }

    /// Index of the first sample positioned strictly after `position`.
    fn upper_index(&self, position: f64) -> usize {
        self.samples.partition_point(|s| s.position <= position)
    }
}

impl<T> SampledCurve<T> {
    #[must_use]
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample<T>] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample<T>> {
        self.samples.iter()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Sample<T>> {
        self.samples.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Sample<T>> {
        self.samples.last()
    }

    /// `(first, last)` sample positions.
    #[must_use]
    pub fn position_range(&self) -> Option<(f64, f64)> {
        Some((self.samples.first()?.position, self.samples.last()?.position))
    }
}

impl<'a, T> IntoIterator for &'a SampledCurve<T> {
    type Item = &'a Sample<T>;
    type IntoIter = std::slice::Iter<'a, Sample<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn unit_fraction(i: usize, denom: usize) -> f64 {
    i as f64 / denom as f64
}
