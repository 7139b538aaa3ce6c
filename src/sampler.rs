//! Fixed-window downsampling of raw series for charting.
//!
//! The series is cut into consecutive, non-overlapping windows of the
//! configured size. Each window collapses into one point that keeps every
//! field of the window's first point and carries the window mean as its
//! value. The trailing window may be short and is averaged over its actual
//! length.

use crate::error::{AquamonError, Result};
use crate::models::{RawSeriesPoint, SampledSeriesPoint, SamplingConfig};
use std::num::NonZeroUsize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Stateless windowed averager
#[derive(Debug, Clone, Copy)]
pub struct SeriesDownsampler {
    window_size: NonZeroUsize,
}

impl SeriesDownsampler {
    pub fn new(window_size: NonZeroUsize) -> Self {
        Self { window_size }
    }

    /// Build from wire config, rejecting zero or negative intervals up front
    pub fn from_config(config: &SamplingConfig) -> Result<Self> {
        Ok(Self::new(config.window_size()?))
    }

    /// Number of output points produced for an input of `len` points
    pub fn output_len(&self, len: usize) -> usize {
        len.div_ceil(self.window_size.get())
    }

    /// Downsample a series, checking for cancellation between windows
    pub fn downsample(
        &self,
        points: &[RawSeriesPoint],
        cancellation_token: &CancellationToken,
    ) -> Result<Vec<SampledSeriesPoint>> {
        let mut sampled = Vec::with_capacity(self.output_len(points.len()));

        for (window_index, window) in points.chunks(self.window_size.get()).enumerate() {
            if cancellation_token.is_cancelled() {
                return Err(AquamonError::Cancelled);
            }

            match sample_window(window) {
                Some(point) => sampled.push(point),
                None => warn!("Skipping empty window {}", window_index),
            }
        }

        debug!(
            "Downsampled {} points into {} windows of up to {}",
            points.len(),
            sampled.len(),
            self.window_size
        );

        Ok(sampled)
    }
}

/// Collapse one window into its first point carrying the window mean
fn sample_window(window: &[RawSeriesPoint]) -> Option<SampledSeriesPoint> {
    let first = window.first()?;
    let sum: f64 = window.iter().map(|p| p.value).sum();

    Some(SampledSeriesPoint {
        value: sum / window.len() as f64,
        fields: first.fields.clone(),
    })
}
