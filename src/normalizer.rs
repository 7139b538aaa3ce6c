//! Conversion of raw sensor records into a GeoJSON feature collection.
//!
//! Every record becomes one `Point` feature with `[longitude, latitude]`
//! coordinates and the record's remaining fields as properties. The
//! malformed coordinate policy decides what happens to records whose
//! coordinates are missing, not strings, or cannot be parsed.

use crate::config::MalformedCoordinatePolicy;
use crate::coordinates::parse_coordinate_value;
use crate::error::{AquamonError, CoordinateAxis, Result};
use crate::models::RawSensorRecord;
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoValue};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Result of normalizing one batch of records
#[derive(Debug, Clone)]
pub struct NormalizeOutcome {
    pub collection: FeatureCollection,
    /// Records dropped under [`MalformedCoordinatePolicy::Skip`]
    pub skipped: usize,
    /// Records emitted with a NaN axis under [`MalformedCoordinatePolicy::Sentinel`]
    pub sentinels: usize,
}

/// Stateless record-to-feature converter
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateNormalizer {
    policy: MalformedCoordinatePolicy,
}

impl CoordinateNormalizer {
    pub fn new(policy: MalformedCoordinatePolicy) -> Self {
        Self { policy }
    }

    /// Normalize a batch, preserving input order
    pub fn normalize(
        &self,
        records: Vec<RawSensorRecord>,
        cancellation_token: &CancellationToken,
    ) -> Result<NormalizeOutcome> {
        let total = records.len();
        let mut features = Vec::with_capacity(total);
        let mut skipped = 0usize;
        let mut sentinels = 0usize;

        for (index, record) in records.into_iter().enumerate() {
            if cancellation_token.is_cancelled() {
                return Err(AquamonError::Cancelled);
            }

            let latitude = parse_axis(index, CoordinateAxis::Latitude, record.latitude.as_ref());
            let longitude = parse_axis(index, CoordinateAxis::Longitude, record.longitude.as_ref());

            // Latitude is reported when both axes are malformed
            let (lat, lon) = match (latitude, longitude, self.policy) {
                (Ok(lat), Ok(lon), _) => (lat, lon),
                (Err(e), _, MalformedCoordinatePolicy::Abort)
                | (_, Err(e), MalformedCoordinatePolicy::Abort) => return Err(e),
                (_, _, MalformedCoordinatePolicy::Skip) => {
                    warn!("Record {} has malformed coordinates, skipping", index);
                    skipped += 1;
                    continue;
                }
                (lat, lon, MalformedCoordinatePolicy::Sentinel) => {
                    warn!("Record {} has malformed coordinates, emitting NaN", index);
                    sentinels += 1;
                    (lat.unwrap_or(f64::NAN), lon.unwrap_or(f64::NAN))
                }
            };

            features.push(point_feature(lon, lat, record));
        }

        debug!(
            "Normalized {} records into {} features ({} skipped, {} sentinel)",
            total,
            features.len(),
            skipped,
            sentinels
        );

        Ok(NormalizeOutcome {
            collection: FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            },
            skipped,
            sentinels,
        })
    }
}

fn parse_axis(index: usize, axis: CoordinateAxis, raw: Option<&Value>) -> Result<f64> {
    parse_coordinate_value(raw).map_err(|e| AquamonError::MalformedCoordinate {
        index,
        axis,
        value: match raw {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        },
        reason: e.to_string(),
    })
}

/// Build a `Point` feature; GeoJSON positions are longitude first
fn point_feature(lon: f64, lat: f64, record: RawSensorRecord) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoValue::Point(vec![lon, lat]))),
        id: None,
        properties: Some(record.properties),
        foreign_members: None,
    }
}
