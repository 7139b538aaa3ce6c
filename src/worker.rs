//! Single-shot background workers and their message contract.
//!
//! A worker receives one request carrying the whole payload, runs on
//! Tokio's blocking pool and replies exactly once with the whole result.
//! Callers only await the [`WorkerHandle`]; their own task never blocks
//! on the computation. Jobs are consumed by value, so a worker instance
//! cannot be handed a second payload.
//!
//! # Example
//!
//! ```rust
//! use aquamon_processor::models::{RawSeriesPoint, SamplingConfig};
//! use aquamon_processor::worker::{dispatch, SampleJob};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> aquamon_processor::Result<()> {
//! let points = (1..=5)
//!     .map(|v| RawSeriesPoint::new(v as f64, Default::default()))
//!     .collect();
//! let job = SampleJob::new(points, SamplingConfig::new(2));
//!
//! let sampled = dispatch(job, CancellationToken::new()).recv().await?;
//! assert_eq!(sampled.len(), 3);
//! # Ok(())
//! # }
//! ```

use crate::error::{AquamonError, Result};
use crate::models::{
    Measurement, RawSensorRecord, RawSeriesPoint, SampledSeriesPoint, SamplingConfig,
};
use crate::normalizer::{CoordinateNormalizer, NormalizeOutcome};
use crate::sampler::SeriesDownsampler;
use crate::series::extract_series;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A unit of CPU-bound work run once on a background thread
pub trait Job: Send + 'static {
    type Output: Send + 'static;

    /// Short name used in logs and failure messages
    fn name(&self) -> &'static str;

    /// Number of input items, for statistics
    fn input_len(&self) -> usize;

    fn run(self, cancellation_token: &CancellationToken) -> Result<Self::Output>;
}

/// Pending reply from a dispatched worker
#[derive(Debug)]
pub struct WorkerHandle<T> {
    name: &'static str,
    reply: oneshot::Receiver<Result<T>>,
}

impl<T> WorkerHandle<T> {
    /// Wait for the single reply.
    ///
    /// A worker that panicked or was torn down before replying surfaces as
    /// [`AquamonError::WorkerFailed`].
    pub async fn recv(self) -> Result<T> {
        let name = self.name;
        self.reply.await.map_err(|_| {
            AquamonError::worker_failed(format!("{} worker exited without replying", name))
        })?
    }
}

/// Run a job on the blocking pool and return a handle to its reply.
///
/// Must be called from within a Tokio runtime.
pub fn dispatch<J: Job>(job: J, cancellation_token: CancellationToken) -> WorkerHandle<J::Output> {
    let (tx, rx) = oneshot::channel();
    let name = job.name();

    task::spawn_blocking(move || {
        debug!("{} worker started with {} items", name, job.input_len());
        let result = job.run(&cancellation_token);
        if tx.send(result).is_err() {
            debug!("{} worker reply dropped, caller no longer waiting", name);
        }
    });

    WorkerHandle { name, reply: rx }
}

/// Run independent jobs concurrently and return results in input order.
///
/// Each job is its own worker invocation; at most `concurrency` run at once.
pub async fn dispatch_all<J: Job>(
    jobs: Vec<J>,
    concurrency: usize,
    cancellation_token: CancellationToken,
) -> Vec<Result<J::Output>> {
    let mut tagged: Vec<(usize, Result<J::Output>)> = stream::iter(jobs.into_iter().enumerate())
        .map(|(index, job)| {
            let token = cancellation_token.clone();
            async move { (index, dispatch(job, token).recv().await) }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    tagged.sort_by_key(|(index, _)| *index);
    tagged.into_iter().map(|(_, result)| result).collect()
}

/// Inbound message for the coordinate normalizer: a bare array of records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizeRequest {
    pub records: Vec<RawSensorRecord>,
}

/// Inbound message for the downsampler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRequest {
    #[serde(rename = "rawData")]
    pub raw_data: Vec<RawSeriesPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SamplingConfig>,
}

impl SampleRequest {
    pub fn new(raw_data: Vec<RawSeriesPoint>, config: SamplingConfig) -> Self {
        Self {
            raw_data,
            config: Some(config),
        }
    }

    /// Resolve the window config: override, then payload, then fallback
    pub fn effective_config(&self, override_interval: Option<i64>, fallback: i64) -> SamplingConfig {
        match (override_interval, self.config) {
            (Some(interval), _) => SamplingConfig::new(interval),
            (None, Some(config)) => config,
            (None, None) => SamplingConfig::new(fallback),
        }
    }
}

/// Normalize records into a feature collection
#[derive(Debug, Clone)]
pub struct NormalizeJob {
    records: Vec<RawSensorRecord>,
    normalizer: CoordinateNormalizer,
}

impl NormalizeJob {
    pub fn new(request: NormalizeRequest, normalizer: CoordinateNormalizer) -> Self {
        Self {
            records: request.records,
            normalizer,
        }
    }
}

impl Job for NormalizeJob {
    type Output = NormalizeOutcome;

    fn name(&self) -> &'static str {
        "normalize"
    }

    fn input_len(&self) -> usize {
        self.records.len()
    }

    fn run(self, cancellation_token: &CancellationToken) -> Result<Self::Output> {
        self.normalizer.normalize(self.records, cancellation_token)
    }
}

/// Downsample one series
#[derive(Debug, Clone)]
pub struct SampleJob {
    raw_data: Vec<RawSeriesPoint>,
    config: SamplingConfig,
}

impl SampleJob {
    pub fn new(raw_data: Vec<RawSeriesPoint>, config: SamplingConfig) -> Self {
        Self { raw_data, config }
    }

    /// Build from a request whose config has already been resolved
    pub fn from_request(request: SampleRequest, config: SamplingConfig) -> Self {
        Self::new(request.raw_data, config)
    }
}

impl Job for SampleJob {
    type Output = Vec<SampledSeriesPoint>;

    fn name(&self) -> &'static str {
        "sample"
    }

    fn input_len(&self) -> usize {
        self.raw_data.len()
    }

    fn run(self, cancellation_token: &CancellationToken) -> Result<Self::Output> {
        // Window size is validated before any point is touched
        let downsampler = SeriesDownsampler::from_config(&self.config)?;
        downsampler.downsample(&self.raw_data, cancellation_token)
    }
}

/// Extract one measurement from records, then downsample it
#[derive(Debug, Clone)]
pub struct ExtractJob {
    records: Vec<RawSensorRecord>,
    measurement: Measurement,
    config: SamplingConfig,
}

impl ExtractJob {
    pub fn new(records: Vec<RawSensorRecord>, measurement: Measurement, config: SamplingConfig) -> Self {
        Self {
            records,
            measurement,
            config,
        }
    }
}

impl Job for ExtractJob {
    type Output = Vec<SampledSeriesPoint>;

    fn name(&self) -> &'static str {
        "extract"
    }

    fn input_len(&self) -> usize {
        self.records.len()
    }

    fn run(self, cancellation_token: &CancellationToken) -> Result<Self::Output> {
        let downsampler = SeriesDownsampler::from_config(&self.config)?;
        let series = extract_series(&self.records, self.measurement);
        downsampler.downsample(&series, cancellation_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MalformedCoordinatePolicy;
    use serde_json::json;

    struct PanickingJob;

    impl Job for PanickingJob {
        type Output = ();

        fn name(&self) -> &'static str {
            "panicking"
        }

        fn input_len(&self) -> usize {
            0
        }

        fn run(self, _cancellation_token: &CancellationToken) -> Result<()> {
            panic!("worker blew up");
        }
    }

    fn sample_request(values: &[f64], interval: i64) -> SampleRequest {
        serde_json::from_value(json!({
            "rawData": values.iter().map(|v| json!({"value": v})).collect::<Vec<_>>(),
            "config": {"SAMPLING_INTERVAL": interval}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_sample_round_trip_through_worker() {
        let request = sample_request(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
        let config = request.effective_config(None, 10);
        let out = dispatch(SampleJob::from_request(request, config), CancellationToken::new())
            .recv()
            .await
            .unwrap();

        let values: Vec<f64> = out.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.5, 3.5, 5.0]);
    }

    #[tokio::test]
    async fn test_invalid_window_reported_through_worker() {
        let request = sample_request(&[1.0, 2.0], 0);
        let config = request.effective_config(None, 10);
        let result = dispatch(SampleJob::from_request(request, config), CancellationToken::new())
            .recv()
            .await;

        assert!(matches!(
            result,
            Err(AquamonError::InvalidWindowSize { size: 0 })
        ));
    }

    #[tokio::test]
    async fn test_panicking_worker_surfaces_as_failure() {
        let result = dispatch(PanickingJob, CancellationToken::new()).recv().await;
        assert!(matches!(result, Err(AquamonError::WorkerFailed { .. })));
    }

    #[tokio::test]
    async fn test_normalize_through_worker() {
        let request: NormalizeRequest = serde_json::from_value(json!([
            {"lat": "6.200.000", "lon": "106.800.000", "id_ph": "A"}
        ]))
        .unwrap();
        let job = NormalizeJob::new(
            request,
            CoordinateNormalizer::new(MalformedCoordinatePolicy::Abort),
        );

        let outcome = dispatch(job, CancellationToken::new()).recv().await.unwrap();
        let value = serde_json::to_value(&outcome.collection).unwrap();
        assert_eq!(
            value["features"][0]["geometry"]["coordinates"],
            json!([106.8, 6.2])
        );
    }

    #[tokio::test]
    async fn test_dispatch_all_keeps_input_order() {
        let jobs: Vec<SampleJob> = (1..=12)
            .map(|n| {
                let points = (0..n * 50)
                    .map(|_| RawSeriesPoint::new(n as f64, Default::default()))
                    .collect();
                SampleJob::new(points, SamplingConfig::new(7))
            })
            .collect();

        let results = dispatch_all(jobs, 4, CancellationToken::new()).await;
        assert_eq!(results.len(), 12);
        for (i, result) in results.into_iter().enumerate() {
            let sampled = result.unwrap();
            assert_eq!(sampled.len(), ((i + 1) * 50).div_ceil(7));
            assert!(sampled.iter().all(|p| p.value == (i + 1) as f64));
        }
    }

    #[tokio::test]
    async fn test_extract_job() {
        let records: Vec<RawSensorRecord> = serde_json::from_value(json!([
            {"lat": "1", "lon": "2", "timestamp": "t0", "temperature": 20.0},
            {"lat": "1", "lon": "2", "timestamp": "t1", "temperature": 22.0},
            {"lat": "1", "lon": "2", "timestamp": "t2"},
            {"lat": "1", "lon": "2", "timestamp": "t3", "temperature": 30.0}
        ]))
        .unwrap();

        let job = ExtractJob::new(records, Measurement::Temperature, SamplingConfig::new(2));
        let out = dispatch(job, CancellationToken::new()).recv().await.unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].value, 21.0);
        assert_eq!(out[0].fields["timestamp"], json!("t0"));
        assert_eq!(out[1].value, 30.0);
        assert_eq!(out[1].fields["timestamp"], json!("t3"));
    }

    #[test]
    fn test_effective_config_precedence() {
        let request = sample_request(&[1.0], 3);
        assert_eq!(request.effective_config(Some(5), 10).sampling_interval, 5);
        assert_eq!(request.effective_config(None, 10).sampling_interval, 3);

        let bare: SampleRequest = serde_json::from_value(json!({"rawData": []})).unwrap();
        assert!(bare.config.is_none());
        assert_eq!(bare.effective_config(None, 10).sampling_interval, 10);
    }
}
