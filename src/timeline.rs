//! # Time-Axis Reconciliation
//!
//! Sensors in one deployment rarely agree perfectly about time: loggers
//! start at different moments, drop records, or get trimmed differently
//! during preprocessing. The interpolation engine needs a single time axis
//! shared by every sensor, so this module derives one:
//!
//! 1. If every sensor reports the identical axis, use it as-is.
//! 2. Otherwise use the ordered intersection of all axes — the instants
//!    every sensor actually covers.
//! 3. If that intersection is empty, fall back to the first registered
//!    sensor's axis and flag the result as degraded. Interpolation still
//!    runs, using whichever sensors have readings at those instants.
//!
//! The returned axis is always strictly increasing with no duplicates.

use crate::Registry;
use chrono::{DateTime, Utc};
use log::warn;

/// The timestamp sequence shared across all sensors for one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommonTimeAxis {
    /// Reconciled timestamps, strictly increasing
    pub timestamps: Vec<DateTime<Utc>>,
    /// True when the sensors shared no timestamps and the first sensor's
    /// axis was used instead
    pub degraded: bool,
}

impl CommonTimeAxis {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Derive the common time axis for a registry.
///
/// An empty registry yields an empty, non-degraded axis; the engine then
/// produces empty grids rather than failing.
pub fn reconcile(registry: &Registry) -> CommonTimeAxis {
    let axes: Vec<&[DateTime<Utc>]> = registry.iter().map(|(_, frame)| frame.timestamps()).collect();

    let Some((&first, rest)) = axes.split_first() else {
        return CommonTimeAxis::default();
    };

    // Identical axes are the overwhelmingly common case for a single
    // deployment processed in one batch; keep it cheap.
    if rest.iter().all(|axis| *axis == first) {
        return CommonTimeAxis {
            timestamps: first.to_vec(),
            degraded: false,
        };
    }

    // Ordered set-intersection across all axes. Each axis is strictly
    // increasing, so membership checks can binary-search.
    let intersection: Vec<DateTime<Utc>> = first
        .iter()
        .copied()
        .filter(|ts| rest.iter().all(|axis| axis.binary_search(ts).is_ok()))
        .collect();

    if intersection.is_empty() {
        warn!(
            "no common timestamps across {} sensors; falling back to the first sensor's axis",
            registry.len()
        );
        return CommonTimeAxis {
            timestamps: first.to_vec(),
            degraded: true,
        };
    }

    CommonTimeAxis {
        timestamps: intersection,
        degraded: false,
    }
}
