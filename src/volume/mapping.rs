//! World-space placement of voxel buffers.

use super::{VolumeError, VolumeResult};
use crate::geom::{Plane, Point3, Transform, Vec3};

/// Affine placement: the buffer's local `[0,1]³` cube is mapped to world
/// space by `local_to_world`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixMapping {
    local_to_world: Transform,
    world_to_local: Transform,
    resolution: [usize; 3],
}

impl MatrixMapping {
    /// # Errors
    /// Returns [`VolumeError::SingularTransform`] if `local_to_world` cannot be
    /// inverted and [`VolumeError::EmptyResolution`] if any axis has no voxels.
    pub fn new(local_to_world: Transform, resolution: [usize; 3]) -> VolumeResult<Self> {
        check_resolution(resolution)?;
        let world_to_local = local_to_world
            .inverse()
            .ok_or(VolumeError::SingularTransform)?;
        Ok(Self {
            local_to_world,
            world_to_local,
            resolution,
        })
    }

    /// Axis-aligned placement spanning `min..max` in world space.
    ///
    /// # Errors
    /// See [`MatrixMapping::new`]; a flat box is singular.
    pub fn from_bounds(min: Point3, max: Point3, resolution: [usize; 3]) -> VolumeResult<Self> {
        let size = max - min;
        let xf = Transform::translate(min.to_vec3()) * Transform::scale(size.x, size.y, size.z);
        Self::new(xf, resolution)
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
    pub const fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    /// World space to continuous voxel coordinates (`[0, res]` per axis).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn world_to_voxel(&self) -> Transform {
        let [nx, ny, nz] = self.resolution;
        Transform::scale(nx as f64, ny as f64, nz as f64) * self.world_to_local
    }

    /// World-space edge lengths of a single voxel.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn voxel_size(&self) -> Vec3 {
        let [nx, ny, nz] = self.resolution;
        Vec3::new(
            self.local_to_world.apply_vec(Vec3::X).length() / nx as f64,
            self.local_to_world.apply_vec(Vec3::Y).length() / ny as f64,
            self.local_to_world.apply_vec(Vec3::Z).length() / nz as f64,
        )
    }
}

/// Camera-frustum placement. Voxel columns follow the camera's raster,
/// voxel slices its depth.
///
/// Corners are stored near quad first, then far quad, each ordered
/// left-bottom, right-bottom, right-top, left-top as seen from the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumMapping {
    near: [Point3; 4],
    far: [Point3; 4],
    planes: [Plane; 6],
    resolution: [usize; 3],
}

impl FrustumMapping {
    pub const LEFT: usize = 0;
    pub const RIGHT: usize = 1;
    pub const BOTTOM: usize = 2;
    pub const TOP: usize = 3;
    pub const NEAR: usize = 4;
    pub const FAR: usize = 5;

    /// # Errors
    /// Returns [`VolumeError::DegenerateFrustum`] if a face collapses to a line
    /// and [`VolumeError::EmptyResolution`] if any axis has no voxels.
    pub fn from_corners(
        near: [Point3; 4],
        far: [Point3; 4],
        resolution: [usize; 3],
    ) -> VolumeResult<Self> {
        check_resolution(resolution)?;

        let corners: Vec<Point3> = near.iter().chain(far.iter()).copied().collect();
        let center = Point3::centroid(&corners).ok_or(VolumeError::DegenerateFrustum)?;

        // Far-quad edges anchor the side planes so a pinched near quad is fine.
        let faces = [
            (far[0], far[3], near[0]),
            (far[1], far[2], near[1]),
            (far[0], far[1], near[0]),
            (far[3], far[2], near[3]),
            (near[0], near[1], near[2]),
            (far[0], far[1], far[2]),
        ];

        let mut planes = [Plane::new(Vec3::ZERO, 0.0); 6];
        for (slot, (a, b, c)) in planes.iter_mut().zip(faces) {
            let plane = Plane::from_points(a, b, c).ok_or(VolumeError::DegenerateFrustum)?;
            *slot = if plane.contains(center) {
                plane
            } else {
                plane.flipped()
            };
        }

        Ok(Self {
            near,
            far,
            planes,
            resolution,
        })
    }

    /// Symmetric perspective frustum of a camera looking down its local `-Z`.
    ///
    /// # Errors
    /// Returns [`VolumeError::InvalidFrustum`] for non-positive clip distances,
    /// `far <= near`, a field of view outside `(0, π)` or a non-positive
    /// aspect ratio.
    pub fn perspective(
        camera_to_world: Transform,
        fov_y: f64,
        aspect: f64,
        near: f64,
        far: f64,
        resolution: [usize; 3],
    ) -> VolumeResult<Self> {
        if !(near > 0.0 && far > near) {
            return Err(VolumeError::InvalidFrustum {
                reason: "clip distances must satisfy 0 < near < far",
            });
        }
        if !(fov_y > 0.0 && fov_y < std::f64::consts::PI) {
            return Err(VolumeError::InvalidFrustum {
                reason: "vertical field of view must lie in (0, pi)",
            });
        }
        if !(aspect > 0.0 && aspect.is_finite()) {
            return Err(VolumeError::InvalidFrustum {
                reason: "aspect ratio must be positive",
            });
        }

        let tan_half = (fov_y * 0.5).tan();
        let quad = |depth: f64| {
            let h = depth * tan_half;
            let w = h * aspect;
            [
                Point3::new(-w, -h, -depth),
                Point3::new(w, -h, -depth),
                Point3::new(w, h, -depth),
                Point3::new(-w, h, -depth),
            ]
            .map(|p| camera_to_world.apply_point(p))
        };

        Self::from_corners(quad(near), quad(far), resolution)
    }

    /// Outward-facing planes in left, right, bottom, top, near, far order.
    #[must_use]
    pub const fn planes(&self) -> [Plane; 6] {
        self.planes
    }

    #[must_use]
    pub const fn near_corners(&self) -> [Point3; 4] {
        self.near
    }

    #[must_use]
    pub const fn far_corners(&self) -> [Point3; 4] {
        self.far
    }

    #[must_use]
    pub const fn resolution(&self) -> [usize; 3] {
        self.resolution
    }
}

/// Placement of a voxel buffer in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldMapping {
    Matrix(MatrixMapping),
    Frustum(FrustumMapping),
    /// Voxel data with no spatial placement.
    Null,
}

impl FieldMapping {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Matrix(_) => "matrix",
            Self::Frustum(_) => "frustum",
            Self::Null => "null",
        }
    }
}

impl From<MatrixMapping> for FieldMapping {
    fn from(mapping: MatrixMapping) -> Self {
        Self::Matrix(mapping)
    }
}

impl From<FrustumMapping> for FieldMapping {
    fn from(mapping: FrustumMapping) -> Self {
        Self::Frustum(mapping)
    }
}

fn check_resolution(resolution: [usize; 3]) -> VolumeResult<()> {
    if resolution.contains(&0) {
        return Err(VolumeError::EmptyResolution { resolution });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;
    use crate::geom::Tolerance;

    #[test]
    fn world_to_voxel_scales_local_coordinates() {
        let mapping = MatrixMapping::new(Transform::identity(), [10, 20, 30]).unwrap();
        let v = mapping.world_to_voxel().apply_point(Point3::new(0.5, 0.5, 0.5));
        assert!(Tolerance::DEFAULT.approx_eq_point3(v, Point3::new(5.0, 10.0, 15.0)));
    }

    #[test]
    fn from_bounds_maps_corners_to_unit_cube() {
        let mapping = MatrixMapping::from_bounds(
            Point3::new(-2.0, 0.0, 1.0),
            Point3::new(2.0, 1.0, 3.0),
            [8, 2, 4],
        )
        .unwrap();
        let tol = Tolerance::DEFAULT;
        let lo = mapping.world_to_local().apply_point(Point3::new(-2.0, 0.0, 1.0));
        let hi = mapping.world_to_local().apply_point(Point3::new(2.0, 1.0, 3.0));
        assert!(tol.approx_eq_point3(lo, Point3::ORIGIN));
        assert!(tol.approx_eq_point3(hi, Point3::new(1.0, 1.0, 1.0)));
        assert!(tol.approx_eq_vec3(mapping.voxel_size(), Vec3::new(0.5, 0.5, 0.5)));
    }

    #[test]
    fn singular_and_empty_mappings_are_rejected() {
        assert_eq!(
            MatrixMapping::new(Transform::scale(1.0, 0.0, 1.0), [1, 1, 1]),
            Err(VolumeError::SingularTransform)
        );
        assert_eq!(
            MatrixMapping::new(Transform::identity(), [4, 0, 4]),
            Err(VolumeError::EmptyResolution {
                resolution: [4, 0, 4]
            })
        );
    }

    #[test]
    fn frustum_planes_face_outward() {
        let mapping =
            FrustumMapping::perspective(Transform::identity(), FRAC_PI_2, 1.5, 0.5, 20.0, [64, 48, 32])
                .unwrap();
        let inside = Point3::new(0.0, 0.0, -5.0);
        for plane in mapping.planes() {
            assert!(plane.contains(inside));
        }

        let planes = mapping.planes();
        assert!(!planes[FrustumMapping::NEAR].contains(Point3::new(0.0, 0.0, -0.1)));
        assert!(!planes[FrustumMapping::FAR].contains(Point3::new(0.0, 0.0, -25.0)));
        assert!(!planes[FrustumMapping::LEFT].contains(Point3::new(-9.0, 0.0, -5.0)));
        assert!(!planes[FrustumMapping::TOP].contains(Point3::new(0.0, 6.0, -5.0)));
    }

    #[test]
    fn perspective_validates_parameters() {
        let bad = [
            (FRAC_PI_2, 1.0, 0.0, 10.0),
            (FRAC_PI_2, 1.0, 5.0, 2.0),
            (0.0, 1.0, 1.0, 10.0),
            (FRAC_PI_2, -1.0, 1.0, 10.0),
        ];
        for (fov, aspect, near, far) in bad {
            let result =
                FrustumMapping::perspective(Transform::identity(), fov, aspect, near, far, [1, 1, 1]);
            assert!(matches!(result, Err(VolumeError::InvalidFrustum { .. })));
        }
    }

    #[test]
    fn collapsed_frustum_is_degenerate() {
        let p = Point3::ORIGIN;
        let result = FrustumMapping::from_corners([p; 4], [p; 4], [1, 1, 1]);
        assert_eq!(result, Err(VolumeError::DegenerateFrustum));
    }
}
