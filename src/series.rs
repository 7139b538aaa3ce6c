//! Derivation of a single-measurement series from raw records.
//!
//! Charts plot one measurement at a time; this turns a batch of records
//! into the series points the downsampler expects.

use crate::models::{Measurement, RawSensorRecord, RawSeriesPoint, is_reserved_key};
use tracing::debug;

/// Build a series for `measurement`, skipping records that lack it.
///
/// Each point keeps the record's non-coordinate properties, minus the
/// measurement itself which becomes `value`.
pub fn extract_series(records: &[RawSensorRecord], measurement: Measurement) -> Vec<RawSeriesPoint> {
    let key = measurement.key();

    let points: Vec<RawSeriesPoint> = records
        .iter()
        .filter_map(|record| {
            let value = record.measurement(measurement)?;
            let fields = record
                .properties
                .iter()
                .filter(|(k, _)| k.as_str() != key && !is_reserved_key(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Some(RawSeriesPoint::new(value, fields))
        })
        .collect();

    if points.len() < records.len() {
        debug!(
            "{} of {} records carry no {} value",
            records.len() - points.len(),
            records.len(),
            key
        );
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Properties;
    use serde_json::json;

    fn record(props: serde_json::Value) -> RawSensorRecord {
        let properties: Properties = serde_json::from_value(props).unwrap();
        RawSensorRecord::new("1.0", "2.0", properties)
    }

    #[test]
    fn test_extracts_value_and_keeps_context() {
        let records = vec![
            record(json!({"id": 1, "timestamp": "t0", "ph": 7.0, "turbidity": 2.0})),
            record(json!({"id": 2, "timestamp": "t1", "ph": "7.4", "turbidity": 3.0})),
        ];

        let series = extract_series(&records, Measurement::Ph);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].value, 7.0);
        assert_eq!(series[1].value, 7.4);
        assert_eq!(series[1].fields["timestamp"], json!("t1"));
        assert!(!series[0].fields.contains_key("ph"));
        assert_eq!(series[0].fields["turbidity"], json!(2.0));
    }

    #[test]
    fn test_records_without_measurement_are_skipped() {
        let records = vec![
            record(json!({"id": 1, "speed": 1.5})),
            record(json!({"id": 2})),
            record(json!({"id": 3, "speed": null})),
        ];
        let series = extract_series(&records, Measurement::Speed);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].fields["id"], json!(1));
    }

    #[test]
    fn test_every_measurement_has_distinct_key() {
        let mut keys: Vec<_> = Measurement::ALL.iter().map(|m| m.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), Measurement::ALL.len());
    }
}
