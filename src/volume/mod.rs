//! Voxel volumes and their ray bounds.
//!
//! A [`VoxelVolume`] wraps one voxel buffer's metadata and keeps an
//! intersection handler matching the buffer's [`FieldMapping`]. Voxel data
//! itself is not loaded here; the volume only answers which parts of a ray
//! the buffer covers. Dense voxel data borrowed as a [`VoxelGrid`] can be
//! sampled in voxel space with [`trilinear`] or [`tricubic`].

mod intersection;
mod interp;
mod mapping;

pub use intersection::{BufferIntersection, FrustumMappingIntersection, UniformMappingIntersection};
pub use interp::{FieldInterp, VoxelGrid, VoxelValue, tricubic, trilinear};
pub use mapping::{FieldMapping, FrustumMapping, MatrixMapping};

use log::debug;
use thiserror::Error;

use crate::geom::{IntervalVec, Ray};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VolumeError {
    #[error("volume has no voxel buffer")]
    MissingBuffer,
    #[error("voxel buffer has no mapping")]
    MissingMapping,
    #[error("unsupported mapping type `{kind}`")]
    UnsupportedMapping { kind: &'static str },
    #[error("mapping transform is not invertible")]
    SingularTransform,
    #[error("voxel resolution must be non-zero on every axis, got {resolution:?}")]
    EmptyResolution { resolution: [usize; 3] },
    #[error("expected {expected} voxel values, got {actual}")]
    VoxelCountMismatch { expected: usize, actual: usize },
    #[error("invalid frustum: {reason}")]
    InvalidFrustum { reason: &'static str },
    #[error("frustum corners do not span a volume")]
    DegenerateFrustum,
}

pub type VolumeResult<T> = Result<T, VolumeError>;

/// Metadata of a voxel buffer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VoxelBufferInfo {
    pub name: String,
    pub mapping: Option<FieldMapping>,
}

impl VoxelBufferInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, mapping: FieldMapping) -> Self {
        Self {
            name: name.into(),
            mapping: Some(mapping),
        }
    }

    /// Buffer without any placement.
    #[must_use]
    pub fn unmapped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mapping: None,
        }
    }
}

/// A volume backed by at most one voxel buffer.
#[derive(Debug, Clone, Default)]
pub struct VoxelVolume {
    buffer: Option<VoxelBufferInfo>,
    handler: Option<BufferIntersection>,
}

impl VoxelVolume {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// See [`VoxelVolume::set_buffer`].
    pub fn with_buffer(buffer: VoxelBufferInfo) -> VolumeResult<Self> {
        let mut volume = Self::new();
        volume.set_buffer(buffer)?;
        Ok(volume)
    }

    /// Replaces the buffer and rebuilds the intersection handler. On error
    /// the volume keeps its previous buffer.
    ///
    /// # Errors
    /// Returns [`VolumeError::MissingMapping`] when the buffer carries no
    /// mapping and [`VolumeError::UnsupportedMapping`] when no handler exists
    /// for its mapping kind.
    pub fn set_buffer(&mut self, buffer: VoxelBufferInfo) -> VolumeResult<()> {
        let mapping = buffer.mapping.as_ref().ok_or(VolumeError::MissingMapping)?;
        let handler = BufferIntersection::for_mapping(mapping)?;
        debug!(
            "voxel volume: buffer `{}` uses {} mapping",
            buffer.name,
            mapping.kind_name()
        );
        self.buffer = Some(buffer);
        self.handler = Some(handler);
        Ok(())
    }

    #[must_use]
    pub fn buffer(&self) -> Option<&VoxelBufferInfo> {
        self.buffer.as_ref()
    }

    #[must_use]
    pub fn intersection_handler(&self) -> Option<&BufferIntersection> {
        self.handler.as_ref()
    }

    /// Ray parameter ranges covered by the buffer.
    ///
    /// # Errors
    /// Returns [`VolumeError::MissingBuffer`] before a buffer has been set.
    pub fn intersect(&self, ray: &Ray, time: f64) -> VolumeResult<IntervalVec> {
        let handler = self.handler.as_ref().ok_or(VolumeError::MissingBuffer)?;
        Ok(handler.intersect(ray, time))
    }
}
