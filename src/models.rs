//! Core data structures for sensor payload processing.
//!
//! Defines the raw records and series points handed over by the dashboard,
//! the sampled output points, the measurement catalogue and processing
//! statistics used throughout the library.

use crate::constants::{LATITUDE_KEY, LONGITUDE_KEY, VALUE_KEY};
use crate::error::{AquamonError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Property bag carried through processing untouched
pub type Properties = Map<String, Value>;

/// A raw sensor reading as delivered by the monitoring API.
///
/// Only the coordinates are interpreted; the reading id, location id,
/// timestamp and measurements stay in `properties` exactly as received.
/// Coordinates are kept as raw JSON so a missing, `null` or non-string value
/// reaches the normalizer instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSensorRecord {
    #[serde(
        rename = "lat",
        alias = "latitude",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<Value>,
    #[serde(
        rename = "lon",
        alias = "longitude",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<Value>,
    #[serde(flatten)]
    pub properties: Properties,
}

impl RawSensorRecord {
    /// Create a record from coordinate strings and a property bag
    pub fn new(
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        properties: Properties,
    ) -> Self {
        Self {
            latitude: Some(Value::String(latitude.into())),
            longitude: Some(Value::String(longitude.into())),
            properties,
        }
    }

    /// Read a measurement, accepting both JSON numbers and numeric strings
    pub fn measurement(&self, measurement: Measurement) -> Option<f64> {
        match self.properties.get(measurement.key())? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

/// One point of a raw time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeriesPoint {
    pub value: f64,
    #[serde(flatten)]
    pub fields: Properties,
}

impl RawSeriesPoint {
    pub fn new(value: f64, fields: Properties) -> Self {
        Self { value, fields }
    }
}

/// One averaged point of a downsampled series.
///
/// Carries every field of the first point in its window, with `value`
/// replaced by the window mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledSeriesPoint {
    pub value: f64,
    #[serde(flatten)]
    pub fields: Properties,
}

/// Downsampling parameters as sent by the chart screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(rename = "SAMPLING_INTERVAL")]
    pub sampling_interval: i64,
}

impl SamplingConfig {
    pub fn new(sampling_interval: i64) -> Self {
        Self { sampling_interval }
    }

    /// Validate the interval into a usable window size
    pub fn window_size(&self) -> Result<NonZeroUsize> {
        usize::try_from(self.sampling_interval)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or(AquamonError::InvalidWindowSize {
                size: self.sampling_interval,
            })
    }
}

/// Measurements the dashboard can chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    Ph,
    Turbidity,
    Temperature,
    AccelX,
    AccelY,
    AccelZ,
    Speed,
}

impl Measurement {
    pub const ALL: [Measurement; 7] = [
        Measurement::Ph,
        Measurement::Turbidity,
        Measurement::Temperature,
        Measurement::AccelX,
        Measurement::AccelY,
        Measurement::AccelZ,
        Measurement::Speed,
    ];

    /// Property key holding this measurement in a raw record
    pub fn key(&self) -> &'static str {
        match self {
            Measurement::Ph => "ph",
            Measurement::Turbidity => "turbidity",
            Measurement::Temperature => "temperature",
            Measurement::AccelX => "accel_x",
            Measurement::AccelY => "accel_y",
            Measurement::AccelZ => "accel_z",
            Measurement::Speed => "speed",
        }
    }

    /// Display unit used by the chart axis
    pub fn unit(&self) -> &'static str {
        match self {
            Measurement::Ph => "pH",
            Measurement::Turbidity => "NTU",
            Measurement::Temperature => "°C",
            Measurement::AccelX | Measurement::AccelY | Measurement::AccelZ => "m/s²",
            Measurement::Speed => "m/s",
        }
    }
}

/// Whether a property key is one of the coordinate or value keys
pub fn is_reserved_key(key: &str) -> bool {
    key == LATITUDE_KEY || key == LONGITUDE_KEY || key == VALUE_KEY
}

/// Processing statistics for a batch run
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub items_in: usize,
    pub items_out: usize,
    pub records_skipped: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}
