//! Streaming export of whole collections
//!
//! This module provides:
//! - [`ExportJob`]: the immutable description of one export
//! - [`run_export`]: the job body, one collection at a time
//! - [`ExportCoordinator`]: streams one collection into a [`FormatWriter`]
//!
//! A failing collection is logged with the stage it failed in and the job
//! moves on. Only listing the collections or creating the SQL script can
//! fail the job as a whole.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{info, warn};

use crate::config::ExportConfig;
use crate::error::{ExecutionError, MongoportError, Result};
use crate::jobs::channel::{ProgressSender, percent};
use crate::schema::{DocumentSampler, FieldTypeCollector, SampleMode};
use crate::source::{ConnectionTarget, DocumentSource};

pub mod coordinator;
pub mod metadata;
pub mod writers;

pub use coordinator::{ExportCoordinator, ExportResult};
pub use metadata::strip_metadata;
pub use writers::{BsonWriter, CsvWriter, FormatWriter, JsonArrayWriter, SqlScriptWriter};

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Sql,
    Csv,
    Bson,
}

impl ExportFormat {
    /// File extension for per-collection files
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Sql => "sql",
            ExportFormat::Csv => "csv",
            ExportFormat::Bson => "bson",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = MongoportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "sql" | "postgresql" => Ok(ExportFormat::Sql),
            "csv" => Ok(ExportFormat::Csv),
            "bson" => Ok(ExportFormat::Bson),
            other => Err(ExecutionError::InvalidParameters(format!(
                "unknown export format '{other}' (expected json, sql, postgresql, csv or bson)"
            ))
            .into()),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Everything an export needs, fixed when the job starts
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub target: ConnectionTarget,
    pub destination: PathBuf,
    pub format: ExportFormat,
    pub include_metadata: bool,
    /// Explicit subset; empty means every user collection
    pub collections: Vec<String>,
    pub settings: ExportConfig,
}

/// Where a collection export failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Analyzing,
    Writing,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStage::Analyzing => f.write_str("analyzing"),
            ExportStage::Writing => f.write_str("writing"),
        }
    }
}

struct StageFailure {
    stage: ExportStage,
    error: MongoportError,
}

type StageResult<T> = std::result::Result<T, StageFailure>;

fn at(stage: ExportStage) -> impl FnOnce(MongoportError) -> StageFailure {
    move |error| StageFailure { stage, error }
}

/// System and GridFS side collections skipped by full exports
pub fn is_internal_collection(name: &str) -> bool {
    name.starts_with("system.")
        || name.ends_with("metadata")
        || name.ends_with("chunks")
        || name.ends_with("files")
}

/// Pick the collections to export, in server order
pub fn select_collections(all: Vec<String>, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        all.into_iter()
            .filter(|name| !is_internal_collection(name))
            .collect()
    } else {
        all.into_iter()
            .filter(|name| requested.contains(name))
            .collect()
    }
}

/// Run an export against an open source
///
/// # Returns
/// * `Result<String>` - Summary for the terminal `finished` message
pub async fn run_export(
    job: &ExportJob,
    source: &dyn DocumentSource,
    progress: &ProgressSender,
) -> Result<String> {
    let names = select_collections(source.list_collection_names().await?, &job.collections);
    if names.is_empty() {
        return Ok("No collections found to export.".to_string());
    }

    let total = names.len();
    info!(
        "Exporting {} collections from {} as {}",
        total,
        source.database_name(),
        job.format
    );

    let mut script = match job.format {
        ExportFormat::Sql => Some(create_script(job, source.database_name()).await?),
        _ => None,
    };

    let mut exported = 0usize;
    for (index, name) in names.iter().enumerate() {
        progress
            .progress(format!("Exporting {}...", name), percent(index, total))
            .await;

        let outcome = match script.as_mut() {
            Some(script) => export_sql_table(job, source, script, name).await,
            None => export_file(job, source, name).await,
        };

        match outcome {
            Ok(()) => exported += 1,
            Err(failure) => {
                warn!("Export of {} failed while {}: {}", name, failure.stage, failure.error);
                progress
                    .log(format!(
                        "Error exporting collection '{}' while {}: {}",
                        name, failure.stage, failure.error
                    ))
                    .await;
            }
        }
    }

    if let Some(mut script) = script {
        script.commit().await?;
    }

    Ok(format!(
        "Bulk export complete: {}/{} collections exported.",
        exported, total
    ))
}

async fn create_script(job: &ExportJob, database: &str) -> Result<SqlScriptWriter> {
    let now = chrono::Local::now();
    let file_name = format!("dump_{}_{}.sql", database, now.timestamp());
    let path = job.destination.join(file_name);
    let created = now.format("%a %b %e %H:%M:%S %Y").to_string();
    SqlScriptWriter::create(&path, database, &created).await
}

async fn export_sql_table(
    job: &ExportJob,
    source: &dyn DocumentSource,
    script: &mut SqlScriptWriter,
    name: &str,
) -> StageResult<()> {
    let mut sample = DocumentSampler::new(source)
        .sample(name, job.settings.sample_size, SampleMode::Prefix)
        .await
        .map_err(at(ExportStage::Analyzing))?;
    if sample.is_empty() {
        return Ok(());
    }
    metadata::apply_policy(&mut sample, job.include_metadata);

    let mut collector = FieldTypeCollector::new();
    for doc in &sample {
        collector.observe(doc);
    }
    let columns = collector.into_columns(job.include_metadata);
    if columns.is_empty() {
        return Ok(());
    }

    let written = write_sql_rows(job, source, script, name, columns).await;
    if let Err(failure) = &written {
        // keep the script parseable for the collections that follow
        if let Err(e) = script.abort_table(&failure.error.to_string()).await {
            warn!("Could not close table {} in SQL script: {}", name, e);
        }
    }
    written
}

async fn write_sql_rows(
    job: &ExportJob,
    source: &dyn DocumentSource,
    script: &mut SqlScriptWriter,
    name: &str,
    columns: Vec<crate::schema::ResolvedColumn>,
) -> StageResult<()> {
    script
        .begin_table(name, columns)
        .await
        .map_err(at(ExportStage::Writing))?;
    let query = source
        .stream(name, job.settings.sql_batch_size)
        .await
        .map_err(at(ExportStage::Writing))?;
    ExportCoordinator::new(query, script)
        .with_metadata(job.include_metadata)
        .execute()
        .await
        .map_err(at(ExportStage::Writing))?;
    Ok(())
}

async fn export_file(job: &ExportJob, source: &dyn DocumentSource, name: &str) -> StageResult<()> {
    let path = job
        .destination
        .join(format!("{}.{}", name, job.format.extension()));

    let mut writer: Box<dyn FormatWriter> = match job.format {
        ExportFormat::Csv => {
            let mut sample = DocumentSampler::new(source)
                .sample(name, job.settings.sample_size, SampleMode::Prefix)
                .await
                .map_err(at(ExportStage::Analyzing))?;
            metadata::apply_policy(&mut sample, job.include_metadata);
            if sample.is_empty() {
                return Ok(());
            }
            let headers = writers::csv::collect_headers(&sample);
            Box::new(
                CsvWriter::new(&path, headers)
                    .await
                    .map_err(at(ExportStage::Writing))?,
            )
        }
        ExportFormat::Bson => Box::new(BsonWriter::new(&path).await.map_err(at(ExportStage::Writing))?),
        _ => Box::new(
            JsonArrayWriter::new(&path)
                .await
                .map_err(at(ExportStage::Writing))?,
        ),
    };

    let query = source
        .stream(name, job.settings.stream_batch_size)
        .await
        .map_err(at(ExportStage::Writing))?;
    ExportCoordinator::new(query, writer.as_mut())
        .with_metadata(job.include_metadata)
        .execute()
        .await
        .map_err(at(ExportStage::Writing))?;
    Ok(())
}
