//! Voxel-field reconstruction.
//!
//! Samples are taken in continuous voxel space (the output of
//! [`MatrixMapping::world_to_voxel`](super::MatrixMapping::world_to_voxel)),
//! where voxel `(i, j, k)` covers `[i, i + 1)` and its value sits at the centre
//! `i + 0.5`. Neighbours outside the grid are clamped to the nearest edge
//! voxel.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::{VolumeError, VolumeResult};
use crate::geom::{Lerp, Point3};

/// Values a voxel field can hold and reconstruct.
pub trait VoxelValue:
    Lerp + Add<Output = Self> + Sub<Output = Self> + Mul<f64, Output = Self>
{
}

impl<T> VoxelValue for T where
    T: Lerp + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>
{
}

/// Borrowed dense voxel data, `x` varying fastest.
#[derive(Debug, Clone, Copy)]
pub struct VoxelGrid<'a, T> {
    data: &'a [T],
    resolution: [usize; 3],
}

impl<'a, T: Copy> VoxelGrid<'a, T> {
    /// # Errors
    /// Returns [`VolumeError::EmptyResolution`] if any axis has no voxels and
    /// [`VolumeError::VoxelCountMismatch`] unless `data` holds exactly one
    /// value per voxel.
    pub fn new(data: &'a [T], resolution: [usize; 3]) -> VolumeResult<Self> {
        if resolution.contains(&0) {
            return Err(VolumeError::EmptyResolution { resolution });
        }
        let expected = resolution.iter().fold(1_usize, |n, &r| n.saturating_mul(r));
        if data.len() != expected {
            return Err(VolumeError::VoxelCountMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, resolution })
    }

    #[must_use]
    pub const fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    /// Value of voxel `(i, j, k)`, `None` outside the grid.
    #[must_use]
    pub fn value(&self, i: usize, j: usize, k: usize) -> Option<T> {
        let [nx, ny, nz] = self.resolution;
        (i < nx && j < ny && k < nz).then(|| self.data[i + nx * (j + ny * k)])
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn clamped(&self, i: i64, j: i64, k: i64) -> T {
        let [nx, ny, nz] = self.resolution;
        let clamp = |c: i64, n: usize| c.clamp(0, n as i64 - 1) as usize;
        let (i, j, k) = (clamp(i, nx), clamp(j, ny), clamp(k, nz));
        self.data[i + nx * (j + ny * k)]
    }
}

/// Reconstruction filter for [`VoxelGrid`] lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldInterp {
    #[default]
    Trilinear,
    /// Catmull-Rom over the 4×4×4 neighbourhood. Can overshoot the data range.
    Tricubic,
}

impl FieldInterp {
    #[must_use]
    pub fn sample<T: VoxelValue>(self, grid: &VoxelGrid<'_, T>, vs_p: Point3) -> T {
        match self {
            Self::Trilinear => trilinear(grid, vs_p),
            Self::Tricubic => tricubic(grid, vs_p),
        }
    }
}

/// Index of the voxel centre at or below `coord`, and the fraction past it.
#[allow(clippy::cast_possible_truncation)]
fn cell(coord: f64) -> (i64, f64) {
    let shifted = coord - 0.5;
    let base = shifted.floor();
    (base as i64, shifted - base)
}

/// Linear blend of the 2×2×2 voxel centres around `vs_p`.
#[must_use]
pub fn trilinear<T: VoxelValue>(grid: &VoxelGrid<'_, T>, vs_p: Point3) -> T {
    let (cx, fx) = cell(vs_p.x);
    let (cy, fy) = cell(vs_p.y);
    let (cz, fz) = cell(vs_p.z);
    let at = |di, dj, dk| grid.clamped(cx + di, cy + dj, cz + dk);

    let plane = |di| {
        let near = at(di, 0, 0).lerp(at(di, 0, 1), fz);
        let far = at(di, 1, 0).lerp(at(di, 1, 1), fz);
        near.lerp(far, fy)
    };
    plane(0).lerp(plane(1), fx)
}

/// Catmull-Rom blend of the 4×4×4 voxel centres around `vs_p`.
#[must_use]
pub fn tricubic<T: VoxelValue>(grid: &VoxelGrid<'_, T>, vs_p: Point3) -> T {
    let (cx, fx) = cell(vs_p.x);
    let (cy, fy) = cell(vs_p.y);
    let (cz, fz) = cell(vs_p.z);
    let at = |di, dj, dk| grid.clamped(cx - 1 + di, cy - 1 + dj, cz - 1 + dk);

    let column = |di, dj| catmull_rom(fz, [0, 1, 2, 3].map(|dk| at(di, dj, dk)));
    let plane = |di| catmull_rom(fy, [0, 1, 2, 3].map(|dj| column(di, dj)));
    catmull_rom(fx, [0, 1, 2, 3].map(plane))
}

/// Interpolates between `p[1]` (at 0) and `p[2]` (at 1).
fn catmull_rom<T: VoxelValue>(x: f64, p: [T; 4]) -> T {
    let [p0, p1, p2, p3] = p;
    let c1 = p2 - p0;
    let c2 = p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3;
    let c3 = (p1 - p2) * 3.0 + p3 - p0;
    p1 + (c1 + (c2 + c3 * x) * x) * (0.5 * x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Color, Tolerance};

    /// Field whose value is the voxel's `x` index.
    fn ramp(nx: usize) -> Vec<f64> {
        (0..nx).map(|i| f64::from(u32::try_from(i).unwrap())).collect()
    }

    #[test]
    fn grid_validates_shape() {
        let data = [0.0; 6];
        assert!(VoxelGrid::new(&data, [3, 2, 1]).is_ok());
        assert_eq!(
            VoxelGrid::new(&data, [4, 2, 1]).err(),
            Some(VolumeError::VoxelCountMismatch {
                expected: 8,
                actual: 6
            })
        );
        assert_eq!(
            VoxelGrid::new(&data, [6, 0, 1]).err(),
            Some(VolumeError::EmptyResolution {
                resolution: [6, 0, 1]
            })
        );
    }

    #[test]
    fn value_indexes_x_fastest() {
        let data: Vec<f64> = (0_u32..8).map(f64::from).collect();
        let grid = VoxelGrid::new(&data, [2, 2, 2]).unwrap();
        assert_eq!(grid.value(1, 0, 0), Some(1.0));
        assert_eq!(grid.value(0, 1, 0), Some(2.0));
        assert_eq!(grid.value(0, 0, 1), Some(4.0));
        assert_eq!(grid.value(2, 0, 0), None);
    }

    #[test]
    fn voxel_centres_reproduce_stored_values() {
        let data: Vec<f64> = (0_u32..27).map(|i| f64::from(i) * 0.5).collect();
        let grid = VoxelGrid::new(&data, [3, 3, 3]).unwrap();
        for (i, j, k) in [(0_u32, 0_u32, 0_u32), (1, 2, 0), (2, 1, 2)] {
            let centre = Point3::new(
                f64::from(i) + 0.5,
                f64::from(j) + 0.5,
                f64::from(k) + 0.5,
            );
            let stored = grid.value(i as usize, j as usize, k as usize).unwrap();
            assert_eq!(trilinear(&grid, centre), stored);
            assert_eq!(tricubic(&grid, centre), stored);
        }
    }

    #[test]
    fn trilinear_blends_between_centres() {
        let data = ramp(4);
        let grid = VoxelGrid::new(&data, [4, 1, 1]).unwrap();
        let tol = Tolerance::DEFAULT;
        assert!(tol.approx_eq_f64(trilinear(&grid, Point3::new(1.0, 0.5, 0.5)), 0.5));
        assert!(tol.approx_eq_f64(trilinear(&grid, Point3::new(2.25, 0.1, 0.9)), 1.75));
    }

    #[test]
    fn lookups_clamp_to_edge_voxels() {
        let data = ramp(4);
        let grid = VoxelGrid::new(&data, [4, 1, 1]).unwrap();
        assert_eq!(trilinear(&grid, Point3::new(0.2, 0.5, 0.5)), 0.0);
        assert_eq!(trilinear(&grid, Point3::new(3.9, 0.5, 0.5)), 3.0);
        for interp in [FieldInterp::Trilinear, FieldInterp::Tricubic] {
            assert_eq!(interp.sample(&grid, Point3::new(-7.0, 0.5, 0.5)), 0.0);
            assert_eq!(interp.sample(&grid, Point3::new(12.0, -3.0, 8.0)), 3.0);
        }
    }

    #[test]
    fn tricubic_reproduces_linear_data() {
        let data = ramp(8);
        let grid = VoxelGrid::new(&data, [8, 1, 1]).unwrap();
        let tol = Tolerance::DEFAULT;
        for x in [2.6, 3.75, 5.1] {
            let p = Point3::new(x, 0.5, 0.5);
            assert!(tol.approx_eq_f64(tricubic(&grid, p), x - 0.5));
            assert!(tol.approx_eq_f64(trilinear(&grid, p), x - 0.5));
        }
    }

    #[test]
    fn tricubic_overshoots_a_step() {
        let data = [0.0, 0.0, 1.0, 1.0];
        let grid = VoxelGrid::new(&data, [4, 1, 1]).unwrap();
        let below = tricubic(&grid, Point3::new(1.25, 0.5, 0.5));
        assert!(below < 0.0);
        assert!(trilinear(&grid, Point3::new(1.25, 0.5, 0.5)) >= 0.0);
    }

    #[test]
    fn constant_colour_field_is_preserved() {
        let value = Color::new(0.2, 0.4, 0.8);
        let data = vec![value; 2 * 3 * 4];
        let grid = VoxelGrid::new(&data, [2, 3, 4]).unwrap();
        let p = Point3::new(1.3, 0.7, 2.9);
        let tol = Tolerance::new(1e-12);
        for interp in [FieldInterp::Trilinear, FieldInterp::Tricubic] {
            let got = interp.sample(&grid, p);
            assert!(tol.approx_eq_f64(got.r, value.r));
            assert!(tol.approx_eq_f64(got.g, value.g));
            assert!(tol.approx_eq_f64(got.b, value.b));
        }
    }
}
