//! Export coordinator for one collection
//!
//! Brings together a streaming query, the metadata policy and a format
//! writer: batches are pulled until the stream is exhausted and handed to
//! the writer as they arrive.

use std::time::Instant;

use tracing::{debug, info};

use crate::error::Result;
use crate::source::StreamingQuery;

use super::metadata::apply_policy;
use super::writers::FormatWriter;

/// Result of streaming one collection
#[derive(Debug)]
pub struct ExportResult {
    /// Number of documents exported
    pub documents_exported: u64,
    /// Time taken for export
    pub elapsed_ms: u64,
}

/// Streams one collection into a writer
///
/// The writer is borrowed so that a script spanning several collections
/// can outlive the coordinator.
pub struct ExportCoordinator<'w> {
    query: Box<dyn StreamingQuery>,
    writer: &'w mut dyn FormatWriter,
    include_metadata: bool,
}

impl<'w> ExportCoordinator<'w> {
    /// Create a new export coordinator
    pub fn new(query: Box<dyn StreamingQuery>, writer: &'w mut dyn FormatWriter) -> Self {
        Self {
            query,
            writer,
            include_metadata: true,
        }
    }

    /// Strip metadata fields from every document unless `include` is set
    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    /// Execute the export
    ///
    /// On success the writer has been finalized. On failure the query is
    /// closed and the writer is left for the caller to clean up.
    pub async fn execute(mut self) -> Result<ExportResult> {
        let start_time = Instant::now();
        let result = self.stream_all().await;
        let closed = self.query.close().await;
        let exported = result?;
        closed?;

        self.writer.finalize().await?;

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        let file_size_bytes = self.writer.file_size().await.unwrap_or(0);
        info!(
            "Export completed: {} documents, {} bytes, {} ms",
            exported, file_size_bytes, elapsed_ms
        );

        Ok(ExportResult {
            documents_exported: exported,
            elapsed_ms,
        })
    }

    async fn stream_all(&mut self) -> Result<u64> {
        let mut exported = 0u64;
        let mut batch_count = 0u32;

        while let Some(mut docs) = self.query.next_batch().await? {
            debug!("Received batch #{} of {} documents", batch_count + 1, docs.len());
            apply_policy(&mut docs, self.include_metadata);
            self.writer.write_batch(&docs).await?;

            exported += docs.len() as u64;
            batch_count += 1;
            if batch_count % 10 == 0 {
                info!(
                    "Progress: {} documents exported ({} batches)",
                    exported, batch_count
                );
            }
        }

        Ok(exported)
    }
}
