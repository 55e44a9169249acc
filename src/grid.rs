//! # Depth Axis and Grid Packaging
//!
//! Output-side types for the interpolation engine: the regular depth axis,
//! the per-variable grid with its axes and status, and the run container
//! handed back to the renderer.

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Outcome of one variable's interpolation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridStatus {
    /// Grid built from a properly reconciled time axis
    Ok,
    /// Variable absent from every sensor; no grid produced
    SkippedMissingVariable,
    /// Sensors shared no timestamps; grid built on the first sensor's axis
    DegradedNoCommonTime,
}

/// Generate the regular depth axis `0, Δd, 2Δd, …` up to `max_depth`.
///
/// The axis stops at the largest multiple of `resolution` that does not
/// exceed `max_depth` (within floating-point tolerance of the endpoint), so
/// its length is always `floor(max_depth / resolution) + 1`. It never
/// includes a point beyond `max_depth`. Assumes a validated configuration:
/// `resolution > 0`, `max_depth >= 0`.
pub fn depth_axis(resolution: f64, max_depth: f64) -> Vec<f64> {
    let ratio = max_depth / resolution;
    // Relative tolerance so that 0.3/0.1 = 2.999… still lands on 3 steps.
    let steps = (ratio + ratio * 1e-9 + 1e-9).floor() as usize;
    (0..=steps).map(|i| i as f64 * resolution).collect()
}

/// One variable's dense depth-by-time grid.
///
/// `values` is indexed `[depth_index, time_index]` and its shape always
/// equals `(depths.len(), times.len())`. Missing cells are NaN. A grid is
/// produced once per run and replaced wholesale on re-run, never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterpolatedGrid {
    /// Interpolated values, `[depth_index, time_index]`, NaN where missing
    pub values: Array2<f64>,
    /// Depth axis in meters, shallow to deep
    pub depths: Vec<f64>,
    /// Common time axis the grid was built on
    pub times: Vec<DateTime<Utc>>,
}

impl InterpolatedGrid {
    /// Minimum and maximum over the non-missing cells.
    ///
    /// This is what a renderer feeds to auto color normalization. Returns
    /// `None` when every cell is missing.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let (min, max) = self
            .values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
                (min.min(v), max.max(v))
            });
        (min <= max).then_some((min, max))
    }
}

/// Per-variable result: status plus the grid, unless the run was skipped.
///
/// `grid` is `None` exactly when `status` is
/// [`GridStatus::SkippedMissingVariable`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariableResult {
    pub variable: String,
    pub status: GridStatus,
    pub grid: Option<InterpolatedGrid>,
}

/// Everything one engine invocation produced, in variable-name order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InterpolationRun {
    pub results: Vec<VariableResult>,
}

impl InterpolationRun {
    /// Grid for a variable, if one was produced.
    pub fn grid(&self, variable: &str) -> Option<&InterpolatedGrid> {
        self.results
            .iter()
            .find(|r| r.variable == variable)
            .and_then(|r| r.grid.as_ref())
    }

    /// Names of the variables that were skipped for want of data.
    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|r| r.status == GridStatus::SkippedMissingVariable)
            .map(|r| r.variable.as_str())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
