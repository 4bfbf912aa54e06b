mod color;
mod core;
mod interp;
mod quat;
mod ray;

pub use color::Color;
pub use core::{BBox, Point3, Tolerance, Transform, Vec3};
pub use interp::{Lerp, fit01, lerp2d, lerp_factor};
pub use quat::Quat;
pub use ray::{Interval, IntervalVec, Plane, Ray};
