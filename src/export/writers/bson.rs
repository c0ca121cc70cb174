//! BSON record writer
//!
//! Appends each document as one encoded BSON record, the layout
//! `mongodump` uses for collection files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bson::Document;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::error::{ExecutionError, Result};

use super::{FormatWriter, create_writer, file_size, validate_path, write_failed};

/// Writer for concatenated BSON records
pub struct BsonWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    written: usize,
}

impl BsonWriter {
    pub async fn new(path: &Path) -> Result<Self> {
        validate_path(path)?;
        let writer = create_writer(path).await?;
        debug!("Created BSON writer for: {}", path.display());
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            written: 0,
        })
    }
}

#[async_trait]
impl FormatWriter for BsonWriter {
    async fn write_batch(&mut self, docs: &[Document]) -> Result<usize> {
        for doc in docs {
            let bytes = bson::to_vec(doc)
                .map_err(|e| ExecutionError::OutputFailed(format!("Failed to encode document: {e}")))?;
            self.writer
                .write_all(&bytes)
                .await
                .map_err(|e| write_failed(&self.path, e))?;
        }
        self.written += docs.len();
        Ok(docs.len())
    }

    async fn finalize(&mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| write_failed(&self.path, e))?;
        debug!(
            "Finalized BSON file: {} ({} documents)",
            self.path.display(),
            self.written
        );
        Ok(())
    }

    async fn file_size(&self) -> Result<u64> {
        file_size(&self.path).await
    }
}
