//! Payload file discovery
//!
//! Finds JSON payload files under an input path. A single file is taken
//! as-is; a directory is walked recursively, skipping the output directory
//! so a rerun never picks up its own results.

use crate::constants::PAYLOAD_EXTENSION;
use crate::error::{AquamonError, Result};
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// File discovery component for payload inputs
#[derive(Debug, Clone)]
pub struct PayloadDiscovery {
    input_path: PathBuf,
    exclude: Option<PathBuf>,
}

impl PayloadDiscovery {
    pub fn new(input_path: PathBuf) -> Self {
        Self {
            input_path,
            exclude: None,
        }
    }

    /// Skip everything below `path` while walking
    pub fn excluding(mut self, path: PathBuf) -> Self {
        self.exclude = Some(path);
        self
    }

    /// Root that output paths are mirrored relative to
    pub fn root(&self) -> &Path {
        if self.input_path.is_file() {
            self.input_path.parent().unwrap_or_else(|| Path::new("."))
        } else {
            &self.input_path
        }
    }

    /// Discover payload files, sorted for stable processing order
    pub async fn discover_payload_files(&self) -> Result<Vec<PathBuf>> {
        if !self.input_path.exists() {
            return Err(AquamonError::InputNotFound {
                path: self.input_path.clone(),
            });
        }

        if self.input_path.is_file() {
            return Ok(vec![self.input_path.clone()]);
        }

        let root = self.input_path.clone();
        let exclude = self.exclude.clone();

        let files = task::spawn_blocking(move || walk_payloads(&root, exclude.as_deref()))
            .await
            .map_err(|e| AquamonError::worker_failed(format!("discovery task failed: {}", e)))??;

        debug!(
            "Discovered {} payload files in {}",
            files.len(),
            self.input_path.display()
        );
        Ok(files)
    }
}

fn walk_payloads(root: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    // Relative and absolute spellings of the same directory must match
    let exclude =
        exclude.map(|path| std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()));

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_excluded(entry, exclude.as_deref()));

    for entry in walker {
        let entry = entry.map_err(|e| AquamonError::Io(e.into()))?;
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == PAYLOAD_EXTENSION)
        {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn is_excluded(entry: &DirEntry, exclude: Option<&Path>) -> bool {
    let Some(excluded) = exclude else {
        return false;
    };
    entry.file_type().is_dir()
        && (entry.path() == excluded
            || std::fs::canonicalize(entry.path()).is_ok_and(|path| path == excluded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_walks_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("site-a").join("2024");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp_dir.path().join("b.json"), "[]").unwrap();
        fs::write(nested.join("a.json"), "[]").unwrap();
        fs::write(nested.join("notes.txt"), "ignore").unwrap();

        let files = PayloadDiscovery::new(temp_dir.path().to_path_buf())
            .discover_payload_files()
            .await
            .unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "json"));
    }

    #[tokio::test]
    async fn test_excluded_directory_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("processed");
        fs::create_dir_all(&output).unwrap();
        fs::write(temp_dir.path().join("in.json"), "[]").unwrap();
        fs::write(output.join("in.sampled.json"), "[]").unwrap();

        let files = PayloadDiscovery::new(temp_dir.path().to_path_buf())
            .excluding(output)
            .discover_payload_files()
            .await
            .unwrap();

        assert_eq!(files, vec![temp_dir.path().join("in.json")]);
    }

    #[tokio::test]
    async fn test_excluded_directory_matched_through_other_spelling() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("processed");
        fs::create_dir_all(&output).unwrap();
        fs::create_dir_all(temp_dir.path().join("site")).unwrap();
        fs::write(temp_dir.path().join("in.json"), "[]").unwrap();
        fs::write(output.join("in.sampled.json"), "[]").unwrap();

        // Walk from `site/..` so entries never equal `output` textually
        let root = temp_dir.path().join("site").join("..");
        let files = PayloadDiscovery::new(root.clone())
            .excluding(output)
            .discover_payload_files()
            .await
            .unwrap();

        assert_eq!(files, vec![root.join("in.json")]);
    }

    #[tokio::test]
    async fn test_single_file_input() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("one.json");
        fs::write(&file, "[]").unwrap();

        let discovery = PayloadDiscovery::new(file.clone());
        assert_eq!(discovery.root(), temp_dir.path());
        assert_eq!(discovery.discover_payload_files().await.unwrap(), vec![file]);
    }

    #[tokio::test]
    async fn test_missing_input() {
        let result = PayloadDiscovery::new(PathBuf::from("/nonexistent/payloads"))
            .discover_payload_files()
            .await;
        assert!(matches!(result, Err(AquamonError::InputNotFound { .. })));
    }
}
