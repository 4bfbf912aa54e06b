//! Rays, ray-parameter intervals and half-space planes.

use super::core::{Point3, Transform, Vec3};

/// `origin + t * direction`. The direction need not be unit length; its
/// scale defines the units of `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vec3,
}

impl Ray {
    #[must_use]
    pub const fn new(origin: Point3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    #[must_use]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Maps the ray through an affine transform. The parameterization is
    /// preserved: `xf(self.at(t)) == self.transformed(xf).at(t)`.
    #[must_use]
    pub fn transformed(&self, xf: Transform) -> Self {
        Self::new(xf.apply_point(self.origin), xf.apply_vec(self.direction))
    }
}

/// Closed range `[t_min, t_max]` of ray parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub t_min: f64,
    pub t_max: f64,
}

impl Interval {
    #[must_use]
    pub const fn new(t_min: f64, t_max: f64) -> Self {
        Self { t_min, t_max }
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.t_max - self.t_min
    }

    #[must_use]
    pub fn contains(&self, t: f64) -> bool {
        self.t_min <= t && t <= self.t_max
    }
}

/// Disjoint, ascending ray segments.
pub type IntervalVec = Vec<Interval>;

/// Plane `dot(normal, p) == distance`. The enclosed half-space is
/// `dot(normal, p) <= distance`, so `normal` points outward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f64,
}

impl Plane {
    #[must_use]
    pub const fn new(normal: Vec3, distance: f64) -> Self {
        Self { normal, distance }
    }

    #[must_use]
    pub fn from_point_normal(point: Point3, normal: Vec3) -> Self {
        Self::new(normal, normal.dot(point.to_vec3()))
    }

    /// Plane through three points, normal following `(b - a) x (c - a)`.
    /// `None` if the points are collinear.
    #[must_use]
    pub fn from_points(a: Point3, b: Point3, c: Point3) -> Option<Self> {
        let normal = (b - a).cross(c - a).normalized()?;
        Some(Self::from_point_normal(a, normal))
    }

    /// Positive outside the half-space, negative inside.
    #[must_use]
    pub fn signed_distance(&self, p: Point3) -> f64 {
        self.normal.dot(p.to_vec3()) - self.distance
    }

    #[must_use]
    pub fn contains(&self, p: Point3) -> bool {
        self.signed_distance(p) <= 0.0
    }

    #[must_use]
    pub fn flipped(&self) -> Self {
        Self::new(-self.normal, -self.distance)
    }
}
