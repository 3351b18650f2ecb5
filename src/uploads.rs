//! Upload storage: per-request temporary files and retained outputs.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::debug;

use crate::error::GatewayError;

/// Directory holding request uploads and generated documents.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

/// An uploaded file on disk, deleted when dropped.
#[derive(Debug)]
pub struct TempUpload {
    path: TempPath,
}

impl TempUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        debug!("Removing temporary upload {}", self.path.display());
    }
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it does not exist yet.
    pub fn ensure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// Persist upload bytes under a randomized `temp_<random>_<name>` file.
    pub async fn persist(&self, file_name: &str, bytes: Vec<u8>) -> Result<TempUpload, GatewayError> {
        let root = self.root.clone();
        let suffix = format!("_{}", sanitize_file_name(file_name));

        let path = tokio::task::spawn_blocking(move || -> std::io::Result<TempPath> {
            std::fs::create_dir_all(&root)?;
            let mut file = tempfile::Builder::new()
                .prefix("temp_")
                .suffix(&suffix)
                .rand_bytes(8)
                .tempfile_in(&root)?;
            file.write_all(&bytes)?;
            file.flush()?;
            Ok(file.into_temp_path())
        })
        .await
        .map_err(|e| GatewayError::Internal(format!("Upload task failed: {}", e)))??;

        debug!("Stored upload at {}", path.display());
        Ok(TempUpload { path })
    }

    /// Write a generated file that outlives the request.
    pub async fn write_output(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, GatewayError> {
        let path = self.root.join(sanitize_file_name(file_name));
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

/// Keep only the final path component, restricted to a safe character set.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
