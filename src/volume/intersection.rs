//! Ray/bounds intersection for voxel buffers.
//!
//! Each mapping kind gets its own handler; [`BufferIntersection`] is the
//! closed set of handlers so callers can match on it or just call
//! [`BufferIntersection::intersect`].

use log::debug;

use super::mapping::{FieldMapping, FrustumMapping, MatrixMapping};
use super::{VolumeError, VolumeResult};
use crate::geom::{BBox, Interval, IntervalVec, Plane, Ray, Transform};

#[derive(Debug, Clone, PartialEq)]
pub enum BufferIntersection {
    Uniform(UniformMappingIntersection),
    Frustum(FrustumMappingIntersection),
}

impl BufferIntersection {
    /// Handler matching the buffer's mapping kind.
    ///
    /// # Errors
    /// Returns [`VolumeError::UnsupportedMapping`] for mappings that have no
    /// spatial extent.
    pub fn for_mapping(mapping: &FieldMapping) -> VolumeResult<Self> {
        match mapping {
            FieldMapping::Matrix(m) => Ok(Self::Uniform(UniformMappingIntersection::new(m))),
            FieldMapping::Frustum(f) => Ok(Self::Frustum(FrustumMappingIntersection::new(f))),
            FieldMapping::Null => Err(VolumeError::UnsupportedMapping {
                kind: mapping.kind_name(),
            }),
        }
    }

    /// Parameter ranges along `ray` (in the ray's own units) that lie inside
    /// the buffer. Mappings are static, so `time` does not change the result.
    #[must_use]
    pub fn intersect(&self, ray: &Ray, time: f64) -> IntervalVec {
        match self {
            Self::Uniform(u) => u.intersect(ray, time),
            Self::Frustum(f) => f.intersect(ray, time),
        }
    }
}

/// Intersection against the unit cube of a [`MatrixMapping`].
///
/// Keeps the mapping's transforms so marchers can move hit points between
/// world, local and voxel space without going back to the mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformMappingIntersection {
    local_to_world: Transform,
    world_to_local: Transform,
    world_to_voxel: Transform,
}

impl UniformMappingIntersection {
    #[must_use]
    pub fn new(mapping: &MatrixMapping) -> Self {
        Self {
            local_to_world: mapping.local_to_world(),
            world_to_local: mapping.world_to_local(),
            world_to_voxel: mapping.world_to_voxel(),
        }
    }

    #[must_use]
    pub const fn local_to_world(&self) -> Transform {
        self.local_to_world
    }

    #[must_use]
    pub const fn world_to_local(&self) -> Transform {
        self.world_to_local
    }

    #[must_use]
    pub const fn world_to_voxel(&self) -> Transform {
        self.world_to_voxel
    }

    #[must_use]
    pub fn intersect(&self, ray: &Ray, _time: f64) -> IntervalVec {
        // An affine map keeps t, so the local hit range is the world one.
        let local = ray.transformed(self.world_to_local);
        match BBox::unit().clip_ray(local.origin, local.direction) {
            Some((t_min, t_max)) => vec![Interval::new(t_min, t_max)],
            None => IntervalVec::new(),
        }
    }
}

/// Intersection against the six bounding planes of a [`FrustumMapping`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrustumMappingIntersection {
    planes: [Plane; 6],
}

impl FrustumMappingIntersection {
    #[must_use]
    pub fn new(mapping: &FrustumMapping) -> Self {
        Self::from_planes(mapping.planes())
    }

    /// Planes must face outward; order does not matter.
    #[must_use]
    pub const fn from_planes(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    #[must_use]
    pub const fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    #[must_use]
    pub fn intersect(&self, ray: &Ray, _time: f64) -> IntervalVec {
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;

        for plane in &self.planes {
            let denom = plane.normal.dot(ray.direction);
            let num = plane.distance - plane.normal.dot(ray.origin.to_vec3());

            // `t` is in units of the direction, so only an exact zero is
            // parallel: either entirely inside this half-space or a miss.
            if denom == 0.0 {
                if num < 0.0 {
                    return IntervalVec::new();
                }
                continue;
            }

            let t = num / denom;
            if denom > 0.0 {
                t_max = t_max.min(t);
            } else {
                t_min = t_min.max(t);
            }
        }

        if t_min > t_max {
            debug!("frustum miss: t_min {t_min} > t_max {t_max}");
            return IntervalVec::new();
        }
        vec![Interval::new(t_min, t_max)]
    }
}
