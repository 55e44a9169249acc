//! # Depth-Time Interpolation Engine
//!
//! This module reconstructs a dense, regularly-sampled depth profile at
//! every time step from the handful of fixed-depth sensors a deployment
//! actually has. It is the algorithmic core of the crate; everything else
//! feeds it or packages its output.
//!
//! ## Processing Pipeline
//! 1. **Reconcile**: derive one common time axis across sensors
//!    ([`crate::timeline`])
//! 2. **Align**: reindex every sensor's series onto that axis, NaN where a
//!    sensor has no reading
//! 3. **Interpolate**: per time column, blend the two bracketing sensors at
//!    each depth-axis point
//! 4. **Fill**: optionally extend the shallowest/deepest values to the ends
//!    of the depth axis
//!
//! ## Interpolation Algorithm
//! At a given instant, the sensors with non-missing readings form an
//! ordered set of (depth, value) control points. For a depth-axis point `d`
//! strictly between control depths `d_below < d < d_above`:
//!
//! ```text
//! w = (d - d_below) / (d_above - d_below)
//! value(d) = (1 - w) * v_below + w * v_above
//! ```
//!
//! Piecewise-linear, not a spline: no overshoot, C0-continuous, monotone
//! between adjacent control points whenever the readings are. A depth-axis
//! point that coincides with a control depth echoes that reading exactly.
//!
//! ## Sparse Instants
//! - **No valid readings**: the whole column is missing.
//! - **One valid reading**: that single value fills the whole column —
//!   downstream products rely on this degenerate policy, so it is load-bearing
//!   and must not be "improved" silently.
//! - **Two or more**: normal bracketed interpolation; depths outside the
//!   covered range stay missing unless the fill pass runs.
//!
//! ## Purity and Parallelism
//! The engine is a pure function of (registry, config): no I/O, no hidden
//! state, bit-identical output for identical input. Time columns are
//! mutually independent, so with the `parallel` feature the per-column loop
//! runs on rayon; serial and parallel builds produce identical grids.

use crate::config::GridConfig;
use crate::grid::{self, GridStatus, InterpolatedGrid, InterpolationRun, VariableResult};
use crate::timeline::{self, CommonTimeAxis};
use crate::{ConfigError, Registry, SensorSeries};
use chrono::{DateTime, Utc};
use log::warn;
use ndarray::Array2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Build one depth-by-time grid per requested variable.
///
/// This is the engine's entry point. Configuration is validated up front —
/// on failure nothing is computed. The common time axis is reconciled once
/// and shared by every variable; each variable then gets its own
/// [`VariableResult`], in sorted variable order. An empty
/// `config.variables` set means "every variable the registry knows about".
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use column_profiler_lib::{build_grids, GridConfig, Registry, SensorFrame};
///
/// let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
/// let mut registry = Registry::new();
/// registry.insert(
///     2.0,
///     SensorFrame::new(vec![t0])
///         .unwrap()
///         .with_column("Temperature", vec![18.0])
///         .unwrap(),
/// );
/// registry.insert(
///     10.0,
///     SensorFrame::new(vec![t0])
///         .unwrap()
///         .with_column("Temperature", vec![10.0])
///         .unwrap(),
/// );
///
/// let config = GridConfig {
///     depth_resolution: 1.0,
///     max_depth: 12.0,
///     ..GridConfig::default()
/// };
/// let run = build_grids(&registry, &config).unwrap();
/// let grid = run.grid("Temperature").unwrap();
/// assert_eq!(grid.values.dim(), (13, 1));
/// // Halfway between the sensors: halfway between the readings
/// assert_eq!(grid.values[[6, 0]], 14.0);
/// ```
pub fn build_grids(
    registry: &Registry,
    config: &GridConfig,
) -> Result<InterpolationRun, ConfigError> {
    config.validate()?;

    let axis = timeline::reconcile(registry);
    let depth_axis = grid::depth_axis(config.depth_resolution, config.max_depth);

    let variables: Vec<String> = if config.variables.is_empty() {
        registry.variables().into_iter().collect()
    } else {
        config.variables.iter().cloned().collect()
    };

    let results = variables
        .into_iter()
        .map(|var| interpolate_variable(registry, &axis, &depth_axis, var, config.fill_extrapolated))
        .collect();

    Ok(InterpolationRun { results })
}

/// Compute one variable's grid against an already-reconciled time axis.
fn interpolate_variable(
    registry: &Registry,
    axis: &CommonTimeAxis,
    depth_axis: &[f64],
    variable: String,
    fill_extrapolated: bool,
) -> VariableResult {
    // Align every sensor that measured this variable onto the common axis.
    // Sensors without the variable are simply left out.
    let sensors: Vec<(f64, Vec<f64>)> = registry
        .iter()
        .filter_map(|(depth, frame)| {
            frame
                .series(&variable)
                .map(|series| (depth, align(&series, &axis.timestamps)))
        })
        .collect();

    if sensors.is_empty() {
        warn!("variable '{variable}' not found in any sensor data; skipping");
        return VariableResult {
            variable,
            status: GridStatus::SkippedMissingVariable,
            grid: None,
        };
    }

    let columns = compute_columns(&sensors, depth_axis, axis.len(), fill_extrapolated);

    // Pack the per-time columns into the [depth, time] array.
    let mut values = Array2::from_elem((depth_axis.len(), axis.len()), f64::NAN);
    for (t_idx, column) in columns.iter().enumerate() {
        for (d_idx, &v) in column.iter().enumerate() {
            values[[d_idx, t_idx]] = v;
        }
    }

    let status = if axis.degraded {
        GridStatus::DegradedNoCommonTime
    } else {
        GridStatus::Ok
    };

    VariableResult {
        variable,
        status,
        grid: Some(InterpolatedGrid {
            values,
            depths: depth_axis.to_vec(),
            times: axis.timestamps.clone(),
        }),
    }
}

/// Reindex a sensor's series onto the common time axis.
///
/// When the sensor's own axis already is the common axis the values pass
/// through untouched; otherwise each common timestamp is looked up exactly,
/// yielding NaN where the sensor has no record.
fn align(series: &SensorSeries, common: &[DateTime<Utc>]) -> Vec<f64> {
    if series.timestamps() == common {
        return series.values().to_vec();
    }
    common.iter().map(|&ts| series.value_at(ts)).collect()
}

/// Compute every time column. Columns are independent, so the parallel
/// build fans them out across rayon workers; both paths yield identical
/// results.
#[cfg(feature = "parallel")]
fn compute_columns(
    sensors: &[(f64, Vec<f64>)],
    depth_axis: &[f64],
    time_len: usize,
    fill_extrapolated: bool,
) -> Vec<Vec<f64>> {
    (0..time_len)
        .into_par_iter()
        .map(|t_idx| column_at(sensors, depth_axis, t_idx, fill_extrapolated))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn compute_columns(
    sensors: &[(f64, Vec<f64>)],
    depth_axis: &[f64],
    time_len: usize,
    fill_extrapolated: bool,
) -> Vec<Vec<f64>> {
    (0..time_len)
        .map(|t_idx| column_at(sensors, depth_axis, t_idx, fill_extrapolated))
        .collect()
}

/// Interpolate a single time column across the depth axis.
fn column_at(
    sensors: &[(f64, Vec<f64>)],
    depth_axis: &[f64],
    t_idx: usize,
    fill_extrapolated: bool,
) -> Vec<f64> {
    // Valid readings at this instant: sensors whose aligned series has a
    // real value here.
    let mut valid: Vec<(f64, f64)> = sensors
        .iter()
        .filter_map(|(depth, aligned)| {
            let v = aligned[t_idx];
            (!v.is_nan()).then_some((*depth, v))
        })
        .collect();

    let mut column = vec![f64::NAN; depth_axis.len()];

    match valid.len() {
        // No sensor reports here: the whole column stays missing.
        0 => {}
        // Degenerate single-sensor instant: one value determines the column.
        1 => column.fill(valid[0].1),
        _ => {
            valid.sort_by(|a, b| a.0.total_cmp(&b.0));
            let shallowest = valid[0].0;
            let deepest = valid[valid.len() - 1].0;

            for (d_idx, &d) in depth_axis.iter().enumerate() {
                if d < shallowest || d > deepest {
                    // Outside the sensor range; the fill pass may cover it.
                    continue;
                }
                // First control point at or below d in depth order.
                let idx_above = valid.partition_point(|&(depth, _)| depth < d);
                column[d_idx] = if idx_above == valid.len() {
                    valid[valid.len() - 1].1
                } else if valid[idx_above].0 == d {
                    // Exactly at a sensor depth: echo the reading, no blend.
                    valid[idx_above].1
                } else {
                    let (d_below, v_below) = valid[idx_above - 1];
                    let (d_above, v_above) = valid[idx_above];
                    let w = (d - d_below) / (d_above - d_below);
                    (1.0 - w) * v_below + w * v_above
                };
            }
        }
    }

    if fill_extrapolated {
        fill_column(&mut column);
    }

    column
}

/// Boundary fill pass: constant extension of the shallowest and deepest
/// non-missing cells to the ends of the column. A no-op for all-missing
/// columns.
fn fill_column(column: &mut [f64]) {
    let Some(first) = column.iter().position(|v| !v.is_nan()) else {
        return;
    };
    let Some(last) = column.iter().rposition(|v| !v.is_nan()) else {
        return;
    };

    let top = column[first];
    for v in &mut column[..first] {
        *v = top;
    }
    let bottom = column[last];
    for v in &mut column[last + 1..] {
        *v = bottom;
    }
}
