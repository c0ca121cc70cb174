//! Job bodies as run inside the worker task

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::channel::ProgressSender;
use crate::error::Result;
use crate::export::{ExportJob, run_export};
use crate::import::{ImportJob, run_import};
use crate::schema::scan_schema;
use crate::source::{ConnectionTarget, Connector, DocumentSource};

/// Summary sent when a schema scan completes
pub const SCHEMA_SCAN_FINISHED: &str = "Schema Analysis Complete.";

/// Parameters of a schema scan
#[derive(Debug, Clone)]
pub struct SchemaScanJob {
    pub target: ConnectionTarget,
    pub sample_size: usize,
}

/// Kind of background job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Export,
    Import,
    SchemaScan,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Export => write!(f, "export"),
            JobKind::Import => write!(f, "import"),
            JobKind::SchemaScan => write!(f, "schema scan"),
        }
    }
}

/// A job ready to run
#[derive(Debug, Clone)]
pub enum JobSpec {
    Export(ExportJob),
    Import(ImportJob),
    SchemaScan(SchemaScanJob),
}

impl JobSpec {
    pub fn kind(&self) -> JobKind {
        match self {
            JobSpec::Export(_) => JobKind::Export,
            JobSpec::Import(_) => JobKind::Import,
            JobSpec::SchemaScan(_) => JobKind::SchemaScan,
        }
    }

    pub fn target(&self) -> &ConnectionTarget {
        match self {
            JobSpec::Export(job) => &job.target,
            JobSpec::Import(job) => &job.target,
            JobSpec::SchemaScan(job) => &job.target,
        }
    }
}

/// Run one job to its terminal message
///
/// Opens a private connection, runs the job body, closes the connection
/// and then sends exactly one `finished` or `error` message.
pub async fn run_job(spec: JobSpec, connector: Arc<dyn Connector>, progress: ProgressSender) {
    let source = match connector.connect(spec.target()).await {
        Ok(source) => source,
        Err(e) => {
            warn!("{} job could not connect: {}", spec.kind(), e);
            progress.error(e.to_string()).await;
            return;
        }
    };

    let outcome = dispatch(&spec, source.as_ref(), &progress).await;

    if let Err(e) = source.close().await {
        warn!("Failed to close connection: {}", e);
    }

    match outcome {
        Ok(summary) => {
            info!("{} job finished: {}", spec.kind(), summary);
            progress.finished(summary).await;
        }
        Err(e) => {
            warn!("{} job failed: {}", spec.kind(), e);
            progress.error(e.to_string()).await;
        }
    }
}

async fn dispatch(
    spec: &JobSpec,
    source: &dyn DocumentSource,
    progress: &ProgressSender,
) -> Result<String> {
    debug!("Running {} job on database {}", spec.kind(), source.database_name());
    match spec {
        JobSpec::Export(job) => run_export(job, source, progress).await,
        JobSpec::Import(job) => run_import(job, source, progress).await,
        JobSpec::SchemaScan(job) => {
            let schema = scan_schema(source, job.sample_size, progress).await?;
            progress.schema_result(schema).await;
            Ok(SCHEMA_SCAN_FINISHED.to_string())
        }
    }
}
