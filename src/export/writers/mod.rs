//! Format writers for export operations
//!
//! This module provides a unified interface for writing documents to the
//! export formats (JSON array, CSV, BSON records, SQL script).

use async_trait::async_trait;
use mongodb::bson::Document;
use std::path::Path;
use tokio::fs::File;
use tokio::io::BufWriter;

use crate::error::{ExecutionError, Result};

pub mod bson;
pub mod csv;
pub mod json;
pub mod sql;

pub use self::bson::BsonWriter;
pub use self::csv::CsvWriter;
pub use self::json::JsonArrayWriter;
pub use self::sql::SqlScriptWriter;

/// Trait for writing documents to different file formats
#[async_trait]
pub trait FormatWriter: Send {
    /// Write a batch of documents
    ///
    /// # Arguments
    /// * `docs` - Slice of documents to write
    ///
    /// # Returns
    /// * `Result<usize>` - Number of documents written
    async fn write_batch(&mut self, docs: &[Document]) -> Result<usize>;

    /// Finalize the output (write footers, flush buffers)
    async fn finalize(&mut self) -> Result<()>;

    /// Current size of the output file in bytes
    async fn file_size(&self) -> Result<u64>;
}

/// Create a buffered file writer
///
/// # Arguments
/// * `path` - File path to create
///
/// # Returns
/// * `Result<BufWriter<File>>` - Buffered writer or error
pub(crate) async fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).await.map_err(|e| {
        ExecutionError::OutputFailed(format!("Failed to create {}: {}", path.display(), e))
    })?;
    Ok(BufWriter::with_capacity(1024 * 1024, file))
}

/// Check that the parent directory of `path` exists
pub(crate) fn validate_path(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ExecutionError::OutputFailed(format!(
                "Directory does not exist: {}",
                parent.display()
            ))
            .into());
        }
    }
    Ok(())
}

/// Size of the file at `path`
pub(crate) async fn file_size(path: &Path) -> Result<u64> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        ExecutionError::OutputFailed(format!("Failed to get file metadata: {}", e))
    })?;
    Ok(metadata.len())
}

/// Map a write error to an output failure naming the file
pub(crate) fn write_failed(path: &Path, e: std::io::Error) -> ExecutionError {
    ExecutionError::OutputFailed(format!("Failed to write {}: {}", path.display(), e))
}
