//! Data-model contract tests: frame validation, registry ordering, rekeying.

use crate::{FrameError, Registry, SensorFrame, SensorSeries};
use chrono::{DateTime, TimeZone, Utc};

fn ts(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
}

fn simple_frame(hours: &[u32], values: Vec<f64>) -> SensorFrame {
    SensorFrame::new(hours.iter().map(|&h| ts(h)).collect())
        .unwrap()
        .with_column("Temperature", values)
        .unwrap()
}

/// Frames must reject a time axis that is not strictly increasing,
/// including duplicates — a duplicate timestamp would make exact-lookup
/// alignment ambiguous.
#[test]
fn frame_rejects_unordered_and_duplicate_timestamps() {
    let unordered = SensorFrame::new(vec![ts(2), ts(1)]);
    assert!(matches!(unordered, Err(FrameError::UnorderedTimestamps)));

    let duplicated = SensorFrame::new(vec![ts(1), ts(1), ts(2)]);
    assert!(matches!(duplicated, Err(FrameError::UnorderedTimestamps)));
}

/// Every column must be exactly as long as the frame's time axis.
#[test]
fn frame_rejects_column_length_mismatch() {
    let result = SensorFrame::new(vec![ts(0), ts(1), ts(2)])
        .unwrap()
        .with_column("Temperature", vec![1.0, 2.0]);

    match result {
        Err(FrameError::ColumnLength {
            name,
            got,
            expected,
        }) => {
            assert_eq!(name, "Temperature");
            assert_eq!(got, 2);
            assert_eq!(expected, 3);
        }
        other => panic!("expected ColumnLength error, got {other:?}"),
    }
}

/// Standalone series carry the same validation as frames.
#[test]
fn series_rejects_length_mismatch() {
    let result = SensorSeries::new(vec![ts(0), ts(1)], vec![1.0]);
    assert!(matches!(
        result,
        Err(FrameError::SeriesLength {
            got: 1,
            expected: 2
        })
    ));
}

/// Exact-timestamp lookup returns the reading or NaN, never interpolates.
#[test]
fn series_value_at_is_exact_lookup() {
    let series = SensorSeries::new(vec![ts(0), ts(2), ts(4)], vec![1.0, 2.0, 3.0]).unwrap();

    assert_eq!(series.value_at(ts(2)), 2.0);
    // Between two timestamps: missing, not blended
    assert!(series.value_at(ts(1)).is_nan());
    assert!(series.value_at(ts(9)).is_nan());
}

/// Inserting at an already-registered depth replaces the frame but keeps
/// the sensor's position in the iteration order.
#[test]
fn registry_duplicate_depth_overwrites_in_place() {
    let mut registry = Registry::new();
    registry.insert(5.0, simple_frame(&[0], vec![1.0]));
    registry.insert(10.0, simple_frame(&[0], vec![2.0]));
    registry.insert(5.0, simple_frame(&[0], vec![9.0]));

    assert_eq!(registry.len(), 2);
    let order: Vec<f64> = registry.iter().map(|(d, _)| d).collect();
    assert_eq!(order, vec![5.0, 10.0], "insertion order must be stable");
    assert_eq!(registry.get(5.0).unwrap().column("Temperature"), Some(&[9.0][..]));
}

/// Rekeying changes only the depth key; the series contents are untouched.
#[test]
fn registry_rekey_preserves_series() {
    let mut registry = Registry::new();
    registry.insert(5.0, simple_frame(&[0, 1], vec![1.5, 2.5]));

    assert!(registry.rekey(5.0, 6.2));
    assert!(registry.get(5.0).is_none());
    assert_eq!(
        registry.get(6.2).unwrap().column("Temperature"),
        Some(&[1.5, 2.5][..])
    );

    // Unknown depth: no-op, reported as such
    assert!(!registry.rekey(99.0, 1.0));
}

/// Rekeying onto an occupied depth drops the previous occupant, matching
/// the overwrite semantics of insert.
#[test]
fn registry_rekey_collision_overwrites() {
    let mut registry = Registry::new();
    registry.insert(5.0, simple_frame(&[0], vec![1.0]));
    registry.insert(10.0, simple_frame(&[0], vec![2.0]));

    assert!(registry.rekey(5.0, 10.0));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get(10.0).unwrap().column("Temperature"), Some(&[1.0][..]));
}

/// depths() sorts shallow-to-deep regardless of registration order.
#[test]
fn registry_depths_are_sorted() {
    let mut registry = Registry::new();
    registry.insert(10.0, simple_frame(&[0], vec![1.0]));
    registry.insert(1.5, simple_frame(&[0], vec![2.0]));
    registry.insert(5.0, simple_frame(&[0], vec![3.0]));

    assert_eq!(registry.depths(), vec![1.5, 5.0, 10.0]);
}

/// variables() reports the union of columns across sensors.
#[test]
fn registry_variables_are_unioned() {
    let mut registry = Registry::new();
    registry.insert(1.0, simple_frame(&[0], vec![1.0]));
    registry.insert(
        2.0,
        SensorFrame::new(vec![ts(0)])
            .unwrap()
            .with_column("Dissolved Oxygen", vec![8.0])
            .unwrap(),
    );

    let vars: Vec<String> = registry.variables().into_iter().collect();
    assert_eq!(vars, vec!["Dissolved Oxygen", "Temperature"]);
}

/// Registries survive a serialization round trip, preserving order. Gaps
/// are kept out of this fixture: JSON has no NaN literal, so persisted
/// registries are expected to be gap-free or use a binary format.
#[test]
fn registry_serde_roundtrip() {
    let mut registry = Registry::new();
    registry.insert(5.0, simple_frame(&[0, 1], vec![1.0, 2.0]));
    registry.insert(1.0, simple_frame(&[0, 1], vec![3.0, 4.0]));

    let data = serde_json::to_vec(&registry).unwrap();
    let loaded: Registry = serde_json::from_slice(&data).unwrap();

    let order: Vec<f64> = loaded.iter().map(|(d, _)| d).collect();
    assert_eq!(order, vec![5.0, 1.0]);
    let col = loaded.get(5.0).unwrap().column("Temperature").unwrap();
    assert_eq!(col, &[1.0, 2.0][..]);
}
