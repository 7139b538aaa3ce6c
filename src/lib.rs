//! Aquamon Processor Library
//!
//! Background processing core for water-quality sensor dashboards. Map and
//! chart screens hand whole payloads to single-shot workers and await one
//! reply each, so large datasets never block the caller.
//!
//! This library provides tools for:
//! - Parsing locale-formatted coordinate strings (`"6.123.456"` -> `6.123456`)
//! - Converting raw sensor records into GeoJSON point feature collections
//! - Downsampling long series into fixed-window averages for charting
//! - Extracting a single measurement series from raw records
//! - Dispatching work to background workers with cooperative cancellation
//! - Batch processing payload files with bounded concurrency

pub mod cli;
pub mod config;
pub mod constants;
pub mod coordinates;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod processor;
pub mod sampler;
pub mod series;
pub mod worker;

pub use config::{AquamonConfig, MalformedCoordinatePolicy};
pub use error::{AquamonError, Result};
pub use models::{Measurement, RawSensorRecord, RawSeriesPoint, SampledSeriesPoint, SamplingConfig};
pub use normalizer::CoordinateNormalizer;
pub use sampler::SeriesDownsampler;
