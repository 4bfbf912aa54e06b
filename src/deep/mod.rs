//! Per-pixel deep storage of transmittance functions.
//!
//! A [`DeepPixelGrid`] holds one [`ColorCurve`] per pixel, each compacted to a
//! fixed sample budget with [`resample_transmittance`] when it is assigned.
//! The grid is filled once during precomputation and then only read; lookups
//! take `&self` and can be shared across render threads.
//!
//! # Example
//!
//! ```ignore
//! use deep_volume::deep::DeepPixelGrid;
//!
//! let mut grid = DeepPixelGrid::with_size(640, 480)?;
//! grid.set_num_samples(16)?;
//! grid.set_pixel(10, 20, &raw_transmittance)?;
//! let t = grid.lookup(10.25, 20.5, depth);
//! println!("{}", grid.statistics());
//! ```

use std::fmt;
use std::mem::size_of;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::curve::{
    ColorCurve, ResampleDiagnostics, ResampleError, ResampleOptions, resample_transmittance,
};
use crate::geom::{Color, lerp2d};

/// Bytes per stored sample: a depth plus a colour.
const BYTES_PER_SAMPLE: usize = size_of::<f64>() + size_of::<Color>();

/// Errors raised by [`DeepPixelGrid`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeepImageError {
    /// The pixel coordinate lies outside the grid.
    #[error("pixel ({x}, {y}) is outside the {width}x{height} grid")]
    PixelOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// A grid needs at least one pixel.
    #[error("deep image dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: usize, height: usize },

    /// Bulk assignment received the wrong number of curves.
    #[error("expected {expected} pixel curves, got {actual}")]
    PixelCountMismatch { expected: usize, actual: usize },

    /// The configured sample budget is invalid.
    #[error(transparent)]
    Resample(#[from] ResampleError),
}

pub type DeepImageResult<T> = Result<T, DeepImageError>;

/// Summary of a bulk [`DeepPixelGrid::set_pixels`] call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepFillDiagnostics {
    /// Number of pixels written.
    pub pixel_count: usize,
    /// Pixels whose curve was replaced by a fallback.
    pub non_monotonic_pixel_count: usize,
    /// Warnings, prefixed with the pixel coordinate they came from.
    pub warnings: Vec<String>,
}

/// Memory and sample-count report for a [`DeepPixelGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeepImageStats {
    pub width: usize,
    pub height: usize,
    /// Samples summed over every pixel.
    pub total_samples: usize,
    pub average_samples_per_pixel: f64,
    /// `total_samples` times the size of one (depth, colour) pair.
    pub approximate_bytes: usize,
}

impl DeepImageStats {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn approximate_megabytes(&self) -> f64 {
        self.approximate_bytes as f64 / (1024.0 * 1024.0)
    }
}

impl fmt::Display for DeepImageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deep image stats:")?;
        writeln!(
            f,
            "  Average # samples per pixel: {}",
            self.average_samples_per_pixel
        )?;
        write!(
            f,
            "  Approximate memory use: {:.3} MB",
            self.approximate_megabytes()
        )
    }
}

/// Width × height grid of fixed-budget transmittance functions.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepPixelGrid {
    width: usize,
    height: usize,
    options: ResampleOptions,
    pixels: Vec<ColorCurve>,
}

impl Default for DeepPixelGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl DeepPixelGrid {
    /// A 2×2 grid of empty curves with the default sample budget.
    #[must_use]
    pub fn new() -> Self {
        Self {
            width: 2,
            height: 2,
            options: ResampleOptions::default(),
            pixels: vec![ColorCurve::new(); 4],
        }
    }

    /// # Errors
    /// Returns [`DeepImageError::EmptyDimensions`] if either dimension is zero.
    pub fn with_size(width: usize, height: usize) -> DeepImageResult<Self> {
        let mut grid = Self::new();
        grid.set_size(width, height)?;
        Ok(grid)
    }

    /// Discards every pixel curve and allocates `width * height` empty ones.
    ///
    /// # Errors
    /// Returns [`DeepImageError::EmptyDimensions`] if either dimension is zero.
    pub fn set_size(&mut self, width: usize, height: usize) -> DeepImageResult<()> {
        if width == 0 || height == 0 {
            return Err(DeepImageError::EmptyDimensions { width, height });
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![ColorCurve::new(); width * height];
        Ok(())
    }

    /// `(width, height)`.
    #[must_use]
    pub const fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Sample budget applied to curves assigned from now on.
    #[must_use]
    pub const fn num_samples(&self) -> usize {
        self.options.sample_count
    }

    /// # Errors
    /// Returns [`DeepImageError::Resample`] if `num_samples` is zero.
    pub fn set_num_samples(&mut self, num_samples: usize) -> DeepImageResult<()> {
        if num_samples == 0 {
            return Err(ResampleError::ZeroSampleCount.into());
        }
        self.options.sample_count = num_samples;
        Ok(())
    }

    #[must_use]
    pub const fn resample_options(&self) -> ResampleOptions {
        self.options
    }

    /// # Errors
    /// Returns [`DeepImageError::Resample`] if the sample count is zero.
    pub fn set_resample_options(&mut self, options: ResampleOptions) -> DeepImageResult<()> {
        if options.sample_count == 0 {
            return Err(ResampleError::ZeroSampleCount.into());
        }
        self.options = options;
        Ok(())
    }

    /// Resamples `curve` to the grid's budget and stores it at `(x, y)`.
    ///
    /// # Errors
    /// Returns [`DeepImageError::PixelOutOfBounds`] for a coordinate outside
    /// the grid.
    pub fn set_pixel(
        &mut self,
        x: usize,
        y: usize,
        curve: &ColorCurve,
    ) -> DeepImageResult<ResampleDiagnostics> {
        let idx = self.index(x, y)?;
        let (fixed, diag) = resample_transmittance(curve, self.options)?;
        self.pixels[idx] = fixed;
        Ok(diag)
    }

    /// Stores a constant function of `value` at `(x, y)`.
    ///
    /// # Errors
    /// Returns [`DeepImageError::PixelOutOfBounds`] for a coordinate outside
    /// the grid.
    pub fn set_pixel_constant(&mut self, x: usize, y: usize, value: Color) -> DeepImageResult<()> {
        self.set_pixel(x, y, &ColorCurve::with_initial_value(value))
            .map(|_| ())
    }

    /// Replaces every pixel from `curves`, given in row-major order.
    ///
    /// Resampling runs on the rayon pool when the `parallel` feature is on.
    ///
    /// # Errors
    /// Returns [`DeepImageError::PixelCountMismatch`] unless exactly
    /// `width * height` curves are supplied.
    pub fn set_pixels(&mut self, curves: &[ColorCurve]) -> DeepImageResult<DeepFillDiagnostics> {
        let expected = self.pixels.len();
        if curves.len() != expected {
            return Err(DeepImageError::PixelCountMismatch {
                expected,
                actual: curves.len(),
            });
        }

        let resampled = resample_all(curves, self.options)?;
        let mut diag = DeepFillDiagnostics {
            pixel_count: resampled.len(),
            ..DeepFillDiagnostics::default()
        };

        for (idx, (fixed, pixel_diag)) in resampled.into_iter().enumerate() {
            if !pixel_diag.monotonic {
                diag.non_monotonic_pixel_count += 1;
            }
            let (x, y) = (idx % self.width, idx / self.width);
            diag.warnings.extend(
                pixel_diag
                    .warnings
                    .into_iter()
                    .map(|w| format!("pixel ({x}, {y}): {w}")),
            );
            self.pixels[idx] = fixed;
        }

        log::debug!(
            "filled {}x{} deep image, {} non-monotonic pixels",
            self.width,
            self.height,
            diag.non_monotonic_pixel_count
        );
        Ok(diag)
    }

    /// Owned copy of the curve stored at `(x, y)`.
    ///
    /// # Errors
    /// Returns [`DeepImageError::PixelOutOfBounds`] for a coordinate outside
    /// the grid.
    pub fn pixel_function(&self, x: usize, y: usize) -> DeepImageResult<ColorCurve> {
        let idx = self.index(x, y)?;
        Ok(self.pixels[idx].clone())
    }

    /// Quad-linear lookup at raster position `(rs_x, rs_y)` and `depth`.
    ///
    /// The four pixels around the raster position are clamped into the grid,
    /// each evaluated at `depth`, and the results blended bilinearly.
    #[must_use]
    pub fn lookup(&self, rs_x: f64, rs_y: f64, depth: f64) -> Color {
        let (x_min, x_max) = bracket(rs_x, self.width);
        let (y_min, y_max) = bracket(rs_y, self.height);
        #[allow(clippy::cast_precision_loss)]
        let (tx, ty) = (rs_x - x_min as f64, rs_y - y_min as f64);

        lerp2d(
            tx,
            ty,
            self.pixel(x_min, y_min).interpolate(depth),
            self.pixel(x_max, y_min).interpolate(depth),
            self.pixel(x_min, y_max).interpolate(depth),
            self.pixel(x_max, y_max).interpolate(depth),
        )
    }

    #[must_use]
    pub fn statistics(&self) -> DeepImageStats {
        let total_samples: usize = self.pixels.iter().map(ColorCurve::num_samples).sum();
        #[allow(clippy::cast_precision_loss)]
        let average = total_samples as f64 / self.pixels.len().max(1) as f64;
        DeepImageStats {
            width: self.width,
            height: self.height,
            total_samples,
            average_samples_per_pixel: average,
            approximate_bytes: total_samples * BYTES_PER_SAMPLE,
        }
    }

    fn index(&self, x: usize, y: usize) -> DeepImageResult<usize> {
        if x >= self.width || y >= self.height {
            return Err(DeepImageError::PixelOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(x + y * self.width)
    }

    fn pixel(&self, x: usize, y: usize) -> &ColorCurve {
        &self.pixels[x + y * self.width]
    }
}

/// Floor and ceiling pixel indices of `coord`, clamped to `[0, size - 1]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn bracket(coord: f64, size: usize) -> (usize, usize) {
    let hi = size.saturating_sub(1) as f64;
    let lo = coord.floor().clamp(0.0, hi) as usize;
    let up = coord.ceil().clamp(0.0, hi) as usize;
    (lo, up)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "parallel")] {
        use rayon::prelude::*;

        fn resample_all(
            curves: &[ColorCurve],
            options: ResampleOptions,
        ) -> Result<Vec<(ColorCurve, ResampleDiagnostics)>, ResampleError> {
            curves
                .par_iter()
                .map(|curve| resample_transmittance(curve, options))
                .collect()
        }
    } else {
        fn resample_all(
            curves: &[ColorCurve],
            options: ResampleOptions,
        ) -> Result<Vec<(ColorCurve, ResampleDiagnostics)>, ResampleError> {
            curves
                .iter()
                .map(|curve| resample_transmittance(curve, options))
                .collect()
        }
    }
}
