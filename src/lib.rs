#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Deep transmittance images and voxel-volume ray bounds.
//!
//! - [`curve`]: sampled curves and transmittance resampling.
//! - [`deep`]: a grid of per-pixel transmittance functions with filtered lookup.
//! - [`volume`]: ray intersection against voxel buffers placed by matrix or
//!   frustum mappings.
//! - [`geom`]: the small math layer the rest is built on.

pub mod curve;
pub mod deep;
pub mod geom;
pub mod volume;

pub use curve::{
    ColorCurve, FloatCurve, Interpolable, QuatCurve, SampledCurve, TransmittanceFunction,
    VectorCurve,
};
pub use deep::{DeepImageError, DeepImageStats, DeepPixelGrid};
pub use volume::{BufferIntersection, VolumeError, VoxelBufferInfo, VoxelVolume};
