//! Fixed-count resampling of deep transmittance functions.
//!
//! Raw transmittance curves produced by ray marching have one sample per step,
//! which is far too many to store per pixel. [`resample_transmittance`]
//! compacts a curve to a fixed number of samples spaced evenly in *average
//! transmittance* rather than in depth, so most samples land where the curve
//! actually changes.
//!
//! # Example
//!
//! ```ignore
//! use deep_volume::curve::{ColorCurve, ResampleOptions, resample_transmittance};
//!
//! let (fixed, diag) = resample_transmittance(&raw, ResampleOptions::new(16))?;
//! assert_eq!(fixed.num_samples(), 16);
//! for warning in &diag.warnings {
//!     log::warn!("{warning}");
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::{ColorCurve, Sample, unit_fraction};
use crate::geom::{Color, fit01, lerp_factor};

/// Sample budget used when none is configured.
pub const DEFAULT_SAMPLE_COUNT: usize = 32;

/// What to do with a curve whose channels do not move in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NonMonotonicPolicy {
    /// Replace the curve with `sample_count` zero samples.
    #[default]
    ZeroFill,
    /// Sample the curve at `sample_count` positions spaced evenly in depth.
    UniformDepth,
}

/// How each source sample is checked against its predecessor.
///
/// `sign` is `+1` when the red channel does not rise from the first to the last
/// sample, `-1` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DirectionTest {
    /// A channel fails when it exceeds `sign * previous`. Falling curves pass;
    /// rising curves with positive channels always fail and are treated as
    /// non-monotonic.
    #[default]
    SignScaled,
    /// A channel fails when it steps against `sign`, so steadily rising
    /// curves are resampled the same way as falling ones.
    Symmetric,
}

/// Options for [`resample_transmittance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResampleOptions {
    /// Number of samples in the output curve. Must be at least 1.
    pub sample_count: usize,
    /// Handling of non-monotonic input.
    pub non_monotonic: NonMonotonicPolicy,
    /// Per-sample direction check.
    pub direction: DirectionTest,
}

impl ResampleOptions {
    #[must_use]
    pub const fn new(sample_count: usize) -> Self {
        Self {
            sample_count,
            non_monotonic: NonMonotonicPolicy::ZeroFill,
            direction: DirectionTest::SignScaled,
        }
    }

    #[must_use]
    pub const fn with_non_monotonic(mut self, policy: NonMonotonicPolicy) -> Self {
        self.non_monotonic = policy;
        self
    }

    #[must_use]
    pub const fn with_direction(mut self, direction: DirectionTest) -> Self {
        self.direction = direction;
        self
    }
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_COUNT)
    }
}

/// Errors that can occur during resampling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResampleError {
    /// The requested sample budget was zero.
    #[error("resample count must be at least 1")]
    ZeroSampleCount,
}

/// Diagnostics for a resampling pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResampleDiagnostics {
    /// Number of samples in the source curve.
    pub input_sample_count: usize,
    /// Number of samples in the resampled curve.
    pub output_sample_count: usize,
    /// Whether every channel of the source moved in one direction.
    pub monotonic: bool,
    /// Policy applied when the source was not monotonic.
    pub fallback: Option<NonMonotonicPolicy>,
    /// Data-quality warnings produced while resampling.
    pub warnings: Vec<String>,
}

impl ResampleDiagnostics {
    #[must_use]
    pub fn fallback_used(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Resamples `curve` to exactly `options.sample_count` samples.
///
/// - No samples: zero colour everywhere.
/// - One sample: that value everywhere.
/// - Monotonic: samples spaced evenly between the first and last value's
///   mean, the first source sample copied verbatim.
/// - Non-monotonic: handled per [`NonMonotonicPolicy`], with a warning in the
///   returned diagnostics.
///
/// # Errors
/// Returns [`ResampleError::ZeroSampleCount`] if the sample budget is zero.
pub fn resample_transmittance(
    curve: &ColorCurve,
    options: ResampleOptions,
) -> Result<(ColorCurve, ResampleDiagnostics), ResampleError> {
    let count = options.sample_count;
    if count == 0 {
        return Err(ResampleError::ZeroSampleCount);
    }

    let samples = curve.samples();
    let mut diag = ResampleDiagnostics {
        input_sample_count: samples.len(),
        monotonic: true,
        ..ResampleDiagnostics::default()
    };

    let result = match samples {
        [] => ColorCurve::constant(count, &Color::ZERO),
        [only] => ColorCurve::constant(count, &only.value),
        _ => {
            let sign = direction_sign(samples);
            match first_direction_violation(samples, sign, options.direction) {
                None => resample_monotonic(samples, count, sign, options.direction),
                Some(idx) => {
                    let warning = format!(
                        "non-monotonic transmittance at sample {idx} of {}",
                        samples.len()
                    );
                    log::debug!("{warning}, applying {:?}", options.non_monotonic);
                    diag.monotonic = false;
                    diag.fallback = Some(options.non_monotonic);
                    diag.warnings.push(warning);
                    match options.non_monotonic {
                        NonMonotonicPolicy::ZeroFill => ColorCurve::constant(count, &Color::ZERO),
                        NonMonotonicPolicy::UniformDepth => resample_uniform_depth(curve, count),
                    }
                }
            }
        }
    };

    diag.output_sample_count = result.num_samples();
    Ok((result, diag))
}

/// `1.0` for curves whose red channel falls from first to last sample,
/// `-1.0` for rising ones.
fn direction_sign(samples: &[Sample<Color>]) -> f64 {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) if first.value.r < last.value.r => -1.0,
        _ => 1.0,
    }
}

/// Index of the first sample failing `test` against its predecessor.
fn first_direction_violation(
    samples: &[Sample<Color>],
    sign: f64,
    test: DirectionTest,
) -> Option<usize> {
    samples
        .windows(2)
        .position(|pair| {
            let (prev, cur) = (pair[0].value.to_array(), pair[1].value.to_array());
            prev.iter().zip(cur).any(|(&p, c)| match test {
                DirectionTest::SignScaled => c > sign * p,
                DirectionTest::Symmetric => (c - p) * sign > 0.0,
            })
        })
        .map(|i| i + 1)
}

fn resample_monotonic(
    samples: &[Sample<Color>],
    count: usize,
    sign: f64,
    test: DirectionTest,
) -> ColorCurve {
    let first = samples[0].value;
    let last = samples[samples.len() - 1].value;
    let end = samples.len() - 1;
    let denom = count.saturating_sub(1).max(1);

    // Whether a source mean still lies before `target` along the curve.
    let before = |mean: f64, target: f64| match test {
        DirectionTest::SignScaled => mean > target * sign,
        DirectionTest::Symmetric => sign * mean > sign * target,
    };

    let mut result = ColorCurve::new();
    result.add_sample(samples[0].position, first);

    // Scan pointer carried across output samples; targets only move forward.
    let mut p = 0;
    for i in 1..count {
        let target = fit01(unit_fraction(i, denom), first, last).mean();
        while p < end && before(samples[p].value.mean(), target) {
            p += 1;
        }

        let upper = &samples[p.max(1)];
        let lower = &samples[p.max(1) - 1];
        let factor = lerp_factor(target, lower.value.mean(), upper.value.mean());
        result.add_sample(
            fit01(factor, lower.position, upper.position),
            fit01(factor, lower.value, upper.value),
        );
    }
    result
}

fn resample_uniform_depth(curve: &ColorCurve, count: usize) -> ColorCurve {
    let (start, end) = curve.position_range().unwrap_or((0.0, 0.0));
    let denom = count.saturating_sub(1).max(1);

    let mut result = ColorCurve::new();
    for i in 0..count {
        let position = fit01(unit_fraction(i, denom), start, end);
        result.add_sample(position, curve.interpolate(position));
    }
    result
}
