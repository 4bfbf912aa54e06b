use std::ops::{Add, Div, Mul, Neg, Sub};

// ─────────────────────────────────────────────────────────────────────────────
// Vec3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[must_use]
    pub const fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, `None` for zero or non-finite input.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        (len > 0.0 && len.is_finite()).then(|| self / len)
    }

    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        self + (rhs - self) * t
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, s: f64) -> Self::Output {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, s: f64) -> Self::Output {
        Self::new(self.x / s, self.y / s, self.z / s)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        self + (rhs - self) * t
    }

    /// Mean of `points`, `None` when empty.
    #[must_use]
    pub fn centroid(points: &[Self]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let sum = points.iter().fold(Vec3::ZERO, |acc, p| acc + p.to_vec3());
        #[allow(clippy::cast_precision_loss)]
        let n = points.len() as f64;
        Some(Self::ORIGIN + sum / n)
    }
}

impl Add<Vec3> for Point3 {
    type Output = Self;
    fn add(self, v: Vec3) -> Self::Output {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl Sub for Point3 {
    type Output = Vec3;
    fn sub(self, rhs: Self) -> Self::Output {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transform
// ─────────────────────────────────────────────────────────────────────────────

/// Affine map stored as the images of the three basis vectors plus a
/// translation: `p' = x_axis * p.x + y_axis * p.y + z_axis * p.z + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    x_axis: Vec3,
    y_axis: Vec3,
    z_axis: Vec3,
    translation: Vec3,
}

impl Transform {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            x_axis: Vec3::X,
            y_axis: Vec3::Y,
            z_axis: Vec3::Z,
            translation: Vec3::ZERO,
        }
    }

    #[must_use]
    pub const fn translate(offset: Vec3) -> Self {
        Self {
            translation: offset,
            ..Self::identity()
        }
    }

    #[must_use]
    pub const fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            x_axis: Vec3::new(sx, 0.0, 0.0),
            y_axis: Vec3::new(0.0, sy, 0.0),
            z_axis: Vec3::new(0.0, 0.0, sz),
            translation: Vec3::ZERO,
        }
    }

    /// `None` when the linear part is singular relative to its own scale.
    #[must_use]
    pub fn inverse(self) -> Option<Self> {
        let (a, b, c) = (self.x_axis, self.y_axis, self.z_axis);
        let det = a.dot(b.cross(c));
        let scale = a.length() * b.length() * c.length();
        if !det.is_finite() || det.abs() <= f64::EPSILON * scale {
            return None;
        }

        // Rows of the inverse linear part.
        let r0 = b.cross(c) / det;
        let r1 = c.cross(a) / det;
        let r2 = a.cross(b) / det;

        let linear = Self {
            x_axis: Vec3::new(r0.x, r1.x, r2.x),
            y_axis: Vec3::new(r0.y, r1.y, r2.y),
            z_axis: Vec3::new(r0.z, r1.z, r2.z),
            translation: Vec3::ZERO,
        };
        Some(Self {
            translation: -linear.apply_vec(self.translation),
            ..linear
        })
    }

    #[must_use]
    pub fn apply_point(self, p: Point3) -> Point3 {
        Point3::ORIGIN + self.apply_vec(p.to_vec3()) + self.translation
    }

    #[must_use]
    pub fn apply_vec(self, v: Vec3) -> Vec3 {
        self.x_axis * v.x + self.y_axis * v.y + self.z_axis * v.z
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// `a * b` applies `b` first.
impl Mul for Transform {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            x_axis: self.apply_vec(rhs.x_axis),
            y_axis: self.apply_vec(rhs.y_axis),
            z_axis: self.apply_vec(rhs.z_axis),
            translation: self.apply_point(Point3::ORIGIN + rhs.translation).to_vec3(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BBox
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Point3,
    pub max: Point3,
}

impl BBox {
    #[must_use]
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// The `[0,1]³` cube, the local domain of a uniform field mapping.
    #[must_use]
    pub const fn unit() -> Self {
        Self::new(Point3::ORIGIN, Point3::new(1.0, 1.0, 1.0))
    }

    /// Slab test. Returns the `(t_enter, t_exit)` range of `origin + t * dir`
    /// inside the box, unbounded in `t`, or `None` on a miss.
    ///
    /// Only an exactly zero direction component counts as parallel; `t` is in
    /// units of `dir`, so tiny directions produce large but valid parameters.
    #[must_use]
    pub fn clip_ray(self, origin: Point3, dir: Vec3) -> Option<(f64, f64)> {
        let slabs = [
            (origin.x, dir.x, self.min.x, self.max.x),
            (origin.y, dir.y, self.min.y, self.max.y),
            (origin.z, dir.z, self.min.z, self.max.z),
        ];

        let mut t_enter = f64::NEG_INFINITY;
        let mut t_exit = f64::INFINITY;
        for (o, d, lo, hi) in slabs {
            if !o.is_finite() || !d.is_finite() {
                return None;
            }
            if d == 0.0 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let (t0, t1) = ((lo - o) / d, (hi - o) / d);
            t_enter = t_enter.max(t0.min(t1));
            t_exit = t_exit.min(t0.max(t1));
            if t_exit < t_enter {
                return None;
            }
        }

        // A zero direction never leaves the slabs' unbounded range.
        (t_enter.is_finite() && t_exit.is_finite()).then_some((t_enter, t_exit))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Absolute tolerance for numeric comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    pub const DEFAULT: Self = Self::new(1e-9);
    pub const LOOSE: Self = Self::new(1e-6);

    #[must_use]
    pub const fn new(eps: f64) -> Self {
        Self { eps }
    }

    #[must_use]
    pub fn approx_eq_f64(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.eps
    }

    #[must_use]
    pub fn approx_eq_point3(self, a: Point3, b: Point3) -> bool {
        (a - b).length() <= self.eps
    }

    #[must_use]
    pub fn approx_eq_vec3(self, a: Vec3, b: Vec3) -> bool {
        (a - b).length() <= self.eps
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
