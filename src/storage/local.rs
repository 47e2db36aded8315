//! Local filesystem storage implementation.
//!
//! Writes the batch as a pretty-printed JSON array (4-space indent) of
//! `{title, description}` objects. Writes go to a sibling `<name>.tmp` file
//! that is then renamed over the target, so readers never observe a
//! half-written batch.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::TrendBatch;
use crate::storage::{SaveMetadata, TrendStorage};

const INDENT: &[u8] = b"    ";

/// Single-file JSON storage backend.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Create a storage writing to the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Sibling temp file: the full file name with `.tmp` appended.
    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Write bytes atomically (write to temp, then rename).
    ///
    /// The temp file is removed if either step fails.
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.tmp_path();
        if let Err(e) = write_and_rename(&tmp, &self.path, bytes).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Failed to remove temp file {}: {cleanup}", tmp.display());
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

async fn write_and_rename(tmp: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = tokio::fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(tmp, target).await?;
    Ok(())
}

/// Serialize with a fixed 4-space indent.
fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut serializer)?;
    Ok(out)
}

#[async_trait]
impl TrendStorage for JsonFileStorage {
    async fn save(&self, batch: &TrendBatch) -> Result<SaveMetadata> {
        let bytes = to_pretty_json(batch)?;
        self.write_bytes(&bytes).await?;

        Ok(SaveMetadata {
            count: batch.len(),
            location: self.path.clone(),
            timestamp: Utc::now(),
        })
    }

    async fn load(&self) -> Result<TrendBatch> {
        match self.read_bytes().await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => {
                log::warn!("No saved trends found at {}", self.path.display());
                Ok(TrendBatch::new())
            }
        }
    }
}
