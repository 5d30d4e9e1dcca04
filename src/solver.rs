//! Chunk shape selection for dense N-dimensional arrays.
//!
//! Given an array shape and a chunk volume budget in bytes,
//! find a chunk shape whose extents each divide the corresponding array axis,
//! whose volume is close to the budget,
//! and whose aspect ratio follows the array's own.
//!
//! The computation runs in three passes:
//!
//! 1. the isotropic extent `(volume / element_width)^(1/N)` is redistributed
//!    across axes in proportion to each axis' elongation relative to the shortest one;
//! 2. axes are resolved left to right, each taking the largest divisor of its length
//!    not exceeding its guess; any shortfall is carried forward and spread over the
//!    axes not yet resolved;
//! 3. if the result undershoots the budget by more than the tolerance allows,
//!    the last axis alone is widened to the largest divisor which compensates.
//!
//! Only the last axis is ever widened by the final pass.

use crate::divisor::largest_divisor_at_most;
use crate::report::ChunkReport;

/// Bytes per element assumed when none is given (single-precision floats).
pub const DEFAULT_ELEMENT_WIDTH: u64 = 4;

/// Fraction of the requested volume below which the last axis is widened.
pub const DEFAULT_TOLERANCE: f64 = 0.8;

/// Parameters for computing chunk shapes.
///
/// The solver holds no state between calls;
/// the same solver can be shared between threads and used for any number of arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkShapeSolver {
    volume: f64,
    element_width: u64,
    tolerance: f64,
}

impl ChunkShapeSolver {
    /// Solver for a chunk volume budget in bytes,
    /// with the default element width and tolerance.
    pub fn new(volume: f64) -> Self {
        Self {
            volume,
            element_width: DEFAULT_ELEMENT_WIDTH,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Bytes per array element.
    ///
    /// Need not match the array's stored data type, which may be changed on write.
    pub fn with_element_width(mut self, element_width: u64) -> Self {
        self.element_width = element_width;
        self
    }

    /// Minimum fraction of the volume budget to achieve before widening the last axis.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn element_width(&self) -> u64 {
        self.element_width
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Check the solver parameters, independent of any shape.
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.volume.is_finite() && self.volume > 0.0) {
            return Err(crate::Error::configuration(format!(
                "chunk volume must be a positive number of bytes, got {}",
                self.volume
            )));
        }
        if self.element_width == 0 {
            return Err(crate::Error::configuration("element width must be positive"));
        }
        if !(self.tolerance > 0.0 && self.tolerance <= 1.0) {
            return Err(crate::Error::configuration(format!(
                "tolerance must be in (0, 1], got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Compute the chunk shape for an array of the given shape.
    pub fn compute(&self, shape: &[u64]) -> crate::Result<Vec<u64>> {
        self.compute_with_report(shape).map(|(chunk, _)| chunk)
    }

    /// Compute the chunk shape along with diagnostics about how well it fits the budget.
    ///
    /// The report is also emitted through the `log` facade.
    pub fn compute_with_report(&self, shape: &[u64]) -> crate::Result<(Vec<u64>, ChunkReport)> {
        self.validate()?;
        validate_shape(shape)?;

        let target = self.volume / self.element_width as f64;
        let array_elements: f64 = shape.iter().map(|&n| n as f64).product();

        let (chunk, degenerate_axes, topped_up) = if target >= array_elements {
            (shape.to_vec(), Vec::new(), false)
        } else {
            let ideal = ideal_extents(shape, target);
            let (mut chunk, degenerate_axes) = resolve_axes(shape, &ideal);
            let topped_up = top_up_last_axis(shape, &mut chunk, target, self.tolerance);
            (chunk, degenerate_axes, topped_up)
        };

        let report = ChunkReport::new(
            shape,
            &chunk,
            self.element_width,
            self.volume,
            degenerate_axes,
            topped_up,
            self.tolerance,
        );
        report.log();
        Ok((chunk, report))
    }
}

/// Compute a chunk shape for `shape` holding roughly `volume` bytes
/// of `element_width`-byte elements.
///
/// See [ChunkShapeSolver] for reusable parameters and diagnostics.
pub fn compute(
    shape: &[u64],
    volume: f64,
    element_width: u64,
    tolerance: f64,
) -> crate::Result<Vec<u64>> {
    ChunkShapeSolver::new(volume)
        .with_element_width(element_width)
        .with_tolerance(tolerance)
        .compute(shape)
}

fn validate_shape(shape: &[u64]) -> crate::Result<()> {
    if shape.len() < 2 {
        return Err(crate::Error::configuration(format!(
            "array must have at least 2 dimensions, got shape {shape:?}"
        )));
    }
    if let Some(axis) = shape.iter().position(|&n| n == 0) {
        return Err(crate::Error::configuration(format!(
            "axis {axis} of shape {shape:?} has zero length"
        )));
    }
    Ok(())
}

/// Per-axis chunk extents before divisibility is considered.
///
/// Each axis is stretched by its elongation relative to the shortest axis,
/// and every other axis shrunk by that elongation's `(N-1)`th root,
/// so the product stays at `target`.
fn ideal_extents(shape: &[u64], target: f64) -> Vec<f64> {
    let ndim = shape.len();
    let root = target.powf(1.0 / ndim as f64);
    let shortest = shape.iter().copied().min().unwrap_or(1) as f64;
    let spread = 1.0 / (ndim - 1) as f64;

    let mut extents = vec![root; ndim];
    for (axis, &len) in shape.iter().enumerate() {
        let ratio = len as f64 / shortest;
        let factor = ratio.powf(spread);
        for (other, extent) in extents.iter_mut().enumerate() {
            if other == axis {
                *extent *= ratio;
            } else {
                *extent /= factor;
            }
        }
    }
    extents
}

/// Outcome of resolving a single axis.
#[derive(Debug, Clone, Copy)]
struct AxisResolution {
    guess: u64,
    extent: u64,
}

impl AxisResolution {
    fn new(len: u64, ideal: f64, deficit: f64) -> Self {
        let guess = ((ideal * deficit).ceil() as u64).max(1);
        let extent = if len % guess == 0 {
            guess
        } else {
            largest_divisor_at_most(len, guess)
        };
        Self { guess, extent }
    }

    /// How much smaller the accepted extent is than the guess.
    fn shortfall(&self) -> f64 {
        self.guess as f64 / self.extent as f64
    }

    fn is_degenerate(&self) -> bool {
        self.extent == 1 && self.guess > 1
    }
}

/// Resolve axes left to right, spreading each axis' shortfall over the axes after it.
///
/// Returns the chunk shape and the axes which collapsed to 1.
fn resolve_axes(shape: &[u64], ideal: &[f64]) -> (Vec<u64>, Vec<usize>) {
    let ndim = shape.len();
    let (chunk, degenerate, _) = shape.iter().zip(ideal).enumerate().fold(
        (Vec::with_capacity(ndim), Vec::new(), 1.0f64),
        |(mut chunk, mut degenerate, deficit), (axis, (&len, &extent))| {
            let resolution = AxisResolution::new(len, extent, deficit);
            log::trace!(
                "axis {axis}: length {len}, guess {}, extent {}, carried deficit {deficit}",
                resolution.guess,
                resolution.extent
            );
            if resolution.is_degenerate() {
                degenerate.push(axis);
            }
            chunk.push(resolution.extent);

            let remaining = ndim - axis - 1;
            let deficit = if remaining > 0 {
                deficit * resolution.shortfall().powf(1.0 / remaining as f64)
            } else {
                deficit
            };
            (chunk, degenerate, deficit)
        },
    );
    (chunk, degenerate)
}

/// Widen the last axis if the chunk volume falls too far short of `target` elements.
///
/// Returns whether the pass was applied.
fn top_up_last_axis(shape: &[u64], chunk: &mut [u64], target: f64, tolerance: f64) -> bool {
    let achieved: f64 = chunk.iter().map(|&n| n as f64).product();
    let fraction = achieved / target;
    if fraction >= tolerance {
        return false;
    }
    let (Some(&len), Some(last)) = (shape.last(), chunk.last_mut()) else {
        return false;
    };
    let constraint = (*last as f64 / fraction).floor() as u64;
    let widened = largest_divisor_at_most(len, constraint);
    log::trace!("widening last axis from {last} to {widened} (constraint {constraint})");
    *last = widened;
    true
}
