//! Result writing for processed payloads
//!
//! Writes each worker response as JSON next to a mirrored copy of the
//! input's relative path inside the output directory.

use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// JSON result writer
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
    pretty: bool,
}

impl OutputWriter {
    pub fn new(output_dir: PathBuf, pretty: bool) -> Self {
        Self { output_dir, pretty }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Output location for `input`, mirrored relative to `root`
    pub fn output_path_for(&self, input: &Path, root: &Path, suffix: &str) -> PathBuf {
        let relative_parent = input
            .parent()
            .and_then(|parent| parent.strip_prefix(root).ok())
            .unwrap_or_else(|| Path::new(""));
        let stem = input
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        self.output_dir
            .join(relative_parent)
            .join(format!("{}.{}", stem, suffix))
    }

    /// Serialize `value` and write it to `path`, creating parent directories
    pub async fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<u64> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, &bytes).await?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(bytes.len() as u64)
    }
}
