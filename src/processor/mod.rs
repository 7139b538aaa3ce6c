//! Batch processing of payload files.
//!
//! Discovers payload files, hands each to its own single-shot worker with
//! bounded concurrency and writes every response to the output directory.
//! A failing file is logged and counted; it does not stop the batch.

pub mod discovery;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::{discovery::PayloadDiscovery, writer::OutputWriter};

use crate::config::AquamonConfig;
use crate::constants::{GEOJSON_SUFFIX, SAMPLED_SUFFIX};
use crate::error::{AquamonError, Result};
use crate::models::{Measurement, ProcessingStats, RawSensorRecord, SamplingConfig};
use crate::normalizer::CoordinateNormalizer;
use crate::worker::{ExtractJob, NormalizeJob, NormalizeRequest, SampleJob, SampleRequest, dispatch};

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// What each payload file contains and which worker handles it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Record arrays turned into GeoJSON
    Normalize,
    /// `{rawData, config}` series requests
    Sample,
    /// Record arrays reduced to one downsampled measurement
    Extract(Measurement),
}

impl PayloadKind {
    fn output_suffix(&self) -> String {
        match self {
            PayloadKind::Normalize => GEOJSON_SUFFIX.to_string(),
            PayloadKind::Sample => SAMPLED_SUFFIX.to_string(),
            PayloadKind::Extract(measurement) => {
                format!("{}.{}", measurement.key(), SAMPLED_SUFFIX)
            }
        }
    }
}

/// Per-file counters folded into [`ProcessingStats`]
#[derive(Debug, Default, Clone, Copy)]
struct FileOutcome {
    items_in: usize,
    items_out: usize,
    skipped: usize,
}

/// Main processor for batches of payload files
#[derive(Debug)]
pub struct BatchProcessor {
    input_path: PathBuf,
    kind: PayloadKind,
    config: AquamonConfig,
    interval_override: Option<i64>,
    show_progress: bool,
    discovery: PayloadDiscovery,
    writer: OutputWriter,
}

impl BatchProcessor {
    /// Create a processor; output defaults to `processed/` beside the input
    pub fn new(input_path: PathBuf, output_dir: Option<PathBuf>, kind: PayloadKind) -> Result<Self> {
        if !input_path.exists() {
            return Err(AquamonError::InputNotFound { path: input_path });
        }

        let output_dir = output_dir.unwrap_or_else(|| {
            let base = if input_path.is_file() {
                input_path.parent().unwrap_or_else(|| Path::new("."))
            } else {
                input_path.as_path()
            };
            base.join("processed")
        });

        let config = AquamonConfig::default();

        Ok(Self {
            discovery: PayloadDiscovery::new(input_path.clone()).excluding(output_dir.clone()),
            writer: OutputWriter::new(output_dir, config.pretty_output),
            input_path,
            kind,
            config,
            interval_override: None,
            show_progress: false,
        })
    }

    /// Configure the processor
    pub fn with_config(mut self, config: AquamonConfig) -> Self {
        self.writer = OutputWriter::new(self.writer.output_dir().to_path_buf(), config.pretty_output);
        self.config = config;
        self
    }

    /// Force a sampling interval regardless of payload config
    pub fn with_interval_override(mut self, interval: Option<i64>) -> Self {
        self.interval_override = interval;
        self
    }

    /// Show a progress bar while processing
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn output_dir(&self) -> &Path {
        self.writer.output_dir()
    }

    /// Main processing entry point
    pub async fn process(&self, cancellation_token: CancellationToken) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        self.config.validate()?;

        info!(
            "Processing {:?} payloads from {}",
            self.kind,
            self.input_path.display()
        );

        let files = self.discovery.discover_payload_files().await?;
        let mut stats = ProcessingStats {
            output_path: self.output_dir().to_path_buf(),
            ..Default::default()
        };

        if files.is_empty() {
            info!("No payload files found");
            stats.processing_time_ms = start_time.elapsed().as_millis();
            return Ok(stats);
        }

        let pb = if self.show_progress {
            let pb = ProgressBar::new(files.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let concurrent_limit = self.config.max_concurrent_workers.min(files.len()).max(1);
        debug!("Dispatching {} files with concurrency {}", files.len(), concurrent_limit);

        stats = stream::iter(&files)
            .map(|file_path| {
                let pb = pb.clone();
                let token = cancellation_token.clone();
                async move {
                    if let Some(file_name) = file_path.file_name() {
                        pb.set_message(format!("Processing: {}", file_name.to_string_lossy()));
                    }
                    let result = self.process_file(file_path, token).await;
                    pb.inc(1);

                    if let Err(e) = &result {
                        error!("Failed to process {}: {:#}", file_path.display(), e);
                    }
                    result
                }
            })
            .buffer_unordered(concurrent_limit)
            .fold(stats, |mut stats, result| async move {
                match result {
                    Ok(outcome) => {
                        stats.files_processed += 1;
                        stats.items_in += outcome.items_in;
                        stats.items_out += outcome.items_out;
                        stats.records_skipped += outcome.skipped;
                    }
                    Err(_) => stats.files_failed += 1,
                }
                stats
            })
            .await;

        pb.finish_with_message("Processing complete");

        if cancellation_token.is_cancelled() {
            return Err(AquamonError::Cancelled);
        }

        stats.processing_time_ms = start_time.elapsed().as_millis();
        info!(
            "Processed {} files ({} failed): {} items in, {} out",
            stats.files_processed, stats.files_failed, stats.items_in, stats.items_out
        );
        Ok(stats)
    }

    /// Run one payload file through its worker and write the response
    async fn process_file(
        &self,
        file_path: &Path,
        cancellation_token: CancellationToken,
    ) -> Result<FileOutcome> {
        let output_path =
            self.writer
                .output_path_for(file_path, self.discovery.root(), &self.kind.output_suffix());

        match self.kind {
            PayloadKind::Normalize => {
                let request: NormalizeRequest = read_payload(file_path).await?;
                let items_in = request.records.len();
                let job = NormalizeJob::new(
                    request,
                    CoordinateNormalizer::new(self.config.coordinate_policy),
                );
                let outcome = dispatch(job, cancellation_token).recv().await?;
                self.writer.write_json(&output_path, &outcome.collection).await?;

                Ok(FileOutcome {
                    items_in,
                    items_out: outcome.collection.features.len(),
                    skipped: outcome.skipped,
                })
            }
            PayloadKind::Sample => {
                let request: SampleRequest = read_payload(file_path).await?;
                let items_in = request.raw_data.len();
                let config = request
                    .effective_config(self.interval_override, self.fallback_interval());
                let sampled = dispatch(SampleJob::from_request(request, config), cancellation_token)
                    .recv()
                    .await?;
                self.writer.write_json(&output_path, &sampled).await?;

                Ok(FileOutcome {
                    items_in,
                    items_out: sampled.len(),
                    skipped: 0,
                })
            }
            PayloadKind::Extract(measurement) => {
                let records: Vec<RawSensorRecord> = read_payload(file_path).await?;
                let items_in = records.len();
                let config = SamplingConfig::new(
                    self.interval_override.unwrap_or_else(|| self.fallback_interval()),
                );
                let sampled = dispatch(ExtractJob::new(records, measurement, config), cancellation_token)
                    .recv()
                    .await?;
                self.writer.write_json(&output_path, &sampled).await?;

                Ok(FileOutcome {
                    items_in,
                    items_out: sampled.len(),
                    skipped: 0,
                })
            }
        }
    }

    fn fallback_interval(&self) -> i64 {
        i64::try_from(self.config.sampling_interval).unwrap_or(i64::MAX)
    }
}

async fn read_payload<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|e| AquamonError::InvalidPayload {
        path: path.to_path_buf(),
        source: e,
    })
}
