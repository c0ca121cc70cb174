//! Bulk import of files into collections
//!
//! Each file goes into the collection named after its stem. Files are
//! processed one at a time; a file that fails is logged and skipped.

use std::path::{Path, PathBuf};

use mongodb::bson::Document;
use tracing::{debug, info, warn};

use crate::config::ImportConfig;
use crate::error::{ExecutionError, Result};
use crate::jobs::channel::{ProgressSender, percent};
use crate::source::{ConnectionTarget, DocumentSource};

pub mod paste;
pub mod readers;

pub use paste::{parse_csv, parse_pasted};
pub use readers::{FileKind, JsonContent};

/// Everything an import needs, fixed when the job starts
#[derive(Debug, Clone)]
pub struct ImportJob {
    pub target: ConnectionTarget,
    pub files: Vec<PathBuf>,
    pub settings: ImportConfig,
}

/// Collection a file is imported into
pub fn collection_for(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ExecutionError::InvalidParameters(format!("no file name in {}", path.display())).into()
        })
}

async fn insert_chunked(
    source: &dyn DocumentSource,
    collection: &str,
    docs: Vec<Document>,
    batch_size: usize,
) -> Result<usize> {
    let total = docs.len();
    let batch_size = batch_size.max(1);
    let mut docs = docs.into_iter().peekable();
    while docs.peek().is_some() {
        let batch: Vec<Document> = docs.by_ref().take(batch_size).collect();
        source.insert_many(collection, batch).await?;
    }
    Ok(total)
}

/// Import one file
///
/// # Returns
/// * `Result<usize>` - Number of documents inserted
pub async fn import_file(
    source: &dyn DocumentSource,
    path: &Path,
    settings: &ImportConfig,
) -> Result<usize> {
    let kind = FileKind::from_path(path)?;
    let collection = collection_for(path)?;
    debug!("Importing {} as {:?} into {}", path.display(), kind, collection);

    match kind {
        FileKind::Json => {
            let text = tokio::fs::read_to_string(path).await?;
            match readers::decode_json(&text)? {
                JsonContent::Single(doc) => {
                    source.insert_one(&collection, doc).await?;
                    Ok(1)
                }
                JsonContent::Many(docs) => {
                    insert_chunked(source, &collection, docs, settings.json_batch_size).await
                }
            }
        }
        FileKind::JsonLines => {
            let text = tokio::fs::read_to_string(path).await?;
            let docs = readers::decode_json_lines(&text)?;
            insert_chunked(source, &collection, docs, settings.json_batch_size).await
        }
        FileKind::Bson => {
            let bytes = tokio::fs::read(path).await?;
            let docs = readers::decode_bson(&bytes)?;
            insert_chunked(source, &collection, docs, settings.bson_batch_size).await
        }
        FileKind::Csv => {
            let text = tokio::fs::read_to_string(path).await?;
            let docs = parse_csv(&text)?;
            insert_chunked(source, &collection, docs, settings.json_batch_size).await
        }
    }
}

/// Run an import against an open source
///
/// # Returns
/// * `Result<String>` - Summary for the terminal `finished` message
pub async fn run_import(
    job: &ImportJob,
    source: &dyn DocumentSource,
    progress: &ProgressSender,
) -> Result<String> {
    let total = job.files.len();
    let mut imported = 0usize;

    for (index, path) in job.files.iter().enumerate() {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        progress
            .progress(format!("Importing {}...", file_name), percent(index, total))
            .await;

        match import_file(source, path, &job.settings).await {
            Ok(count) => {
                info!("Imported {} documents from {}", count, file_name);
                imported += 1;
            }
            Err(e) => {
                warn!("Import of {} failed: {}", file_name, e);
                progress
                    .log(format!("ERROR importing {}: {}", file_name, e))
                    .await;
            }
        }
    }

    Ok(format!(
        "Import job finished. Successfully imported {}/{} files.",
        imported, total
    ))
}
