//! # Column Profiler Core Library
//!
//! This library turns irregular, sensor-indexed water-column time series into
//! dense depth-by-time grids suitable for contour visualization. Sensors sit
//! at fixed nominal depths in the column; each one reports a time-stamped
//! series of measurements for one or more variables (temperature, dissolved
//! oxygen, and so on). The engine reconciles the sensors' time axes,
//! interpolates linearly between the two nearest bracketing sensors at every
//! time step, and optionally extends the shallowest and deepest readings
//! outward to cover the whole depth axis.
//!
//! ## Design Philosophy
//!
//! ### Pure transformation
//! The engine is a stateless function of its inputs: identical
//! (registry, configuration) pairs always produce bit-identical grids. There
//! is no hidden state, no I/O, and no randomness inside the computation,
//! which is what makes the optional `parallel` feature safe — time columns
//! have no cross-dependency and can be computed concurrently.
//!
//! ### Typed at the boundary
//! Loaders hand over [`SensorFrame`] values that are validated once, at
//! construction: strictly increasing timestamps, every column exactly as
//! long as the time axis. Past that boundary the engine never has to guess
//! about shape. Missing readings are `f64::NAN` end-to-end, matching the
//! grid representation, so callers test cells with `is_nan()`.
//!
//! ### Recoverable by policy, not by exception
//! Disagreeing time axes, a variable absent from every sensor, and sparse
//! instants with fewer than two readings all resolve to deterministic
//! policies surfaced as [`grid::GridStatus`] values and log warnings. The
//! only hard failure is malformed configuration, rejected before any work.
//!
//! ## Data Flow
//! 1. **Load** (external): parse files, type-convert, resample, build one
//!    [`SensorFrame`] per deployment depth, insert into a [`Registry`]
//! 2. **Reconcile**: derive one common time axis across sensors
//! 3. **Interpolate**: one depth-by-time grid per requested variable
//! 4. **Render** (external): draw the grids, using the depth and time axes
//!    returned alongside the values
//!
//! ## Core Types
//!
//! - [`SensorSeries`]: one (depth, variable) time series
//! - [`SensorFrame`]: all variables measured by one sensor, sharing an axis
//! - [`Registry`]: insertion-ordered depth → frame map for one deployment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

// Module declarations
pub mod config;
pub mod grid;
pub mod interpolate;
pub mod timeline;

// Cross-module test suite
#[cfg(test)]
mod tests;

pub use config::{ConfigError, GridConfig};
pub use grid::{GridStatus, InterpolatedGrid, InterpolationRun, VariableResult};
pub use interpolate::build_grids;

/// Errors raised while assembling sensor data structures.
///
/// These fire at the loader boundary, when frames are built from parsed
/// input, never inside the interpolation engine itself.
#[derive(Error, Debug)]
pub enum FrameError {
    /// Timestamps must be strictly increasing (no duplicates, no reordering)
    #[error("timestamps must be strictly increasing")]
    UnorderedTimestamps,

    /// A value sequence does not line up with its time axis
    #[error("series has {got} values for {expected} timestamps")]
    SeriesLength { got: usize, expected: usize },

    /// A named frame column does not line up with the frame's time axis
    #[error("column '{name}' has {got} values for {expected} timestamps")]
    ColumnLength {
        name: String,
        got: usize,
        expected: usize,
    },
}

fn check_strictly_increasing(timestamps: &[DateTime<Utc>]) -> Result<(), FrameError> {
    if timestamps.windows(2).all(|w| w[0] < w[1]) {
        Ok(())
    } else {
        Err(FrameError::UnorderedTimestamps)
    }
}

/// One sensor's time series for a single variable.
///
/// A strictly increasing time axis paired with a value sequence of the same
/// length. Gaps in the record are `f64::NAN`. Immutable after construction:
/// editing a sensor's deployment depth happens at the [`Registry`] level and
/// never touches series contents.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use column_profiler_lib::SensorSeries;
///
/// let series = SensorSeries::new(
///     vec![
///         Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
///         Utc.with_ymd_and_hms(2024, 6, 1, 1, 0, 0).unwrap(),
///     ],
///     vec![12.5, f64::NAN],
/// )
/// .unwrap();
///
/// assert_eq!(series.len(), 2);
/// assert!(series.values()[1].is_nan());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SensorSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl SensorSeries {
    /// Build a series, validating axis order and length agreement.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self, FrameError> {
        check_strictly_increasing(&timestamps)?;
        if values.len() != timestamps.len() {
            return Err(FrameError::SeriesLength {
                got: values.len(),
                expected: timestamps.len(),
            });
        }
        Ok(Self { timestamps, values })
    }

    /// The series' own time axis, strictly increasing.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Measured values, NaN where the sensor has no reading.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at an exact timestamp, NaN when the axis lacks it.
    ///
    /// Exact-match lookup only — this is the reindex primitive used to align
    /// a sensor onto the common time axis, not an interpolator.
    pub fn value_at(&self, ts: DateTime<Utc>) -> f64 {
        match self.timestamps.binary_search(&ts) {
            Ok(i) => self.values[i],
            Err(_) => f64::NAN,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Everything one sensor measured: a shared time axis plus named columns.
///
/// This is the record the loader hands over, the typed replacement for the
/// per-depth data frame of the original processing pipeline. Every column is
/// exactly as long as the time axis; the axis is strictly increasing. Both
/// invariants are checked when columns are added, so downstream code can
/// index freely.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SensorFrame {
    timestamps: Vec<DateTime<Utc>>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl SensorFrame {
    /// Start a frame from a time axis. Fails on unordered timestamps.
    pub fn new(timestamps: Vec<DateTime<Utc>>) -> Result<Self, FrameError> {
        check_strictly_increasing(&timestamps)?;
        Ok(Self {
            timestamps,
            columns: BTreeMap::new(),
        })
    }

    /// Builder-style column insertion.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use column_profiler_lib::SensorFrame;
    ///
    /// let frame = SensorFrame::new(vec![
    ///     Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
    /// ])
    /// .unwrap()
    /// .with_column("Temperature", vec![14.2])
    /// .unwrap();
    ///
    /// assert_eq!(frame.column("Temperature"), Some(&[14.2][..]));
    /// ```
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, FrameError> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Add or replace a column. Fails unless it matches the time axis length.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), FrameError> {
        let name = name.into();
        if values.len() != self.timestamps.len() {
            return Err(FrameError::ColumnLength {
                name,
                got: values.len(),
                expected: self.timestamps.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Raw values for a variable, if this sensor measured it.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Extract one variable as a standalone [`SensorSeries`].
    ///
    /// Returns `None` when this sensor never measured the variable — the
    /// engine then simply leaves the sensor out of that variable's run.
    pub fn series(&self, name: &str) -> Option<SensorSeries> {
        self.columns.get(name).map(|values| SensorSeries {
            timestamps: self.timestamps.clone(),
            values: values.clone(),
        })
    }

    /// Names of the variables this sensor measured.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Number of time steps in this frame.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Insertion-ordered map from deployment depth (meters) to sensor frame.
///
/// Depth is the identity of a sensor within a deployment: inserting at an
/// already-registered depth replaces that sensor's frame in place. Iteration
/// order is insertion order — a documented contract, because time-axis
/// reconciliation falls back to the *first* registered sensor's axis when
/// the sensors share no common timestamps. Depth keys compare by exact
/// `f64` equality and should be finite.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Registry {
    entries: Vec<(f64, SensorFrame)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sensor frame at a depth.
    ///
    /// A duplicate depth overwrites the existing frame without changing its
    /// position in the iteration order.
    pub fn insert(&mut self, depth: f64, frame: SensorFrame) {
        match self.entries.iter_mut().find(|(d, _)| *d == depth) {
            Some(entry) => entry.1 = frame,
            None => self.entries.push((depth, frame)),
        }
    }

    /// Frame registered at an exact depth, if any.
    pub fn get(&self, depth: f64) -> Option<&SensorFrame> {
        self.entries
            .iter()
            .find(|(d, _)| *d == depth)
            .map(|(_, frame)| frame)
    }

    /// Change a sensor's depth key without touching its series.
    ///
    /// This is the "edit sensor depths" operation: a correction of the
    /// nominal deployment depth after loading. If another sensor already
    /// sits at `new_depth` it is dropped, consistent with duplicate depths
    /// overwriting on insert. Returns false when `old_depth` is not
    /// registered.
    pub fn rekey(&mut self, old_depth: f64, new_depth: f64) -> bool {
        let Some(idx) = self.entries.iter().position(|(d, _)| *d == old_depth) else {
            return false;
        };
        // Locate any entry already holding the new key before rewriting.
        let dup = self
            .entries
            .iter()
            .position(|(d, _)| *d == new_depth)
            .filter(|&dup| dup != idx);
        self.entries[idx].0 = new_depth;
        if let Some(dup) = dup {
            self.entries.remove(dup);
        }
        true
    }

    /// All registered depths, sorted shallow to deep.
    pub fn depths(&self) -> Vec<f64> {
        let mut depths: Vec<f64> = self.entries.iter().map(|(d, _)| *d).collect();
        depths.sort_by(f64::total_cmp);
        depths
    }

    /// Union of variable names across all registered sensors.
    pub fn variables(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .flat_map(|(_, frame)| frame.variables().map(str::to_owned))
            .collect()
    }

    /// Iterate (depth, frame) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &SensorFrame)> {
        self.entries.iter().map(|(d, frame)| (*d, frame))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
