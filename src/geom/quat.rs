use std::ops::{Add, Mul, Sub};

use super::core::Vec3;

/// Unit quaternion `w + xi + yj + zk` describing a rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quat {
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Rotation of `angle` radians about `axis`. `None` for a zero axis.
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Option<Self> {
        let axis = axis.normalized()?;
        let (s, c) = (angle * 0.5).sin_cos();
        Some(Self::new(c, axis.x * s, axis.y * s, axis.z * s))
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.w * rhs.w + self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            self * (1.0 / len)
        } else {
            Self::IDENTITY
        }
    }

    /// Angle between the two quaternions seen as 4D vectors.
    ///
    /// The `atan2` form stays accurate for nearly parallel inputs where
    /// `acos(dot)` loses precision.
    #[must_use]
    pub fn angle_to(self, rhs: Self) -> f64 {
        let d = (self - rhs).length();
        let s = (self + rhs).length();
        2.0 * d.atan2(s)
    }

    /// Spherical linear interpolation. `t` is the fraction of the arc between
    /// the two orientations. No shortest-path flip is applied.
    #[must_use]
    pub fn slerp(self, rhs: Self, t: f64) -> Self {
        let a = self.angle_to(rhs);
        let s = 1.0 - t;
        let denom = sinx_over_x(a);
        let q = self * (sinx_over_x(s * a) / denom * s) + rhs * (sinx_over_x(t * a) / denom * t);
        q.normalized()
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Add for Quat {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.w + rhs.w, self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Quat {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.w - rhs.w, self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Quat {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.w * rhs, self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

fn sinx_over_x(x: f64) -> f64 {
    if x * x < f64::EPSILON {
        1.0
    } else {
        x.sin() / x
    }
}
