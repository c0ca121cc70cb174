//! mongoport library
//!
//! Moves data between MongoDB and files, and maps a database's implicit
//! structure.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `connection`: MongoDB connections behind the [`source::Connector`] seam
//! - `error`: Error types and handling
//! - `export`: Streaming export to SQL, JSON, CSV and BSON files
//! - `formatter`: BSON value rendering for SQL literals, CSV cells and JSON
//! - `history`: Query history and bookmarks
//! - `import`: File and pasted-text import
//! - `jobs`: Background job runner and progress channel
//! - `schema`: Type resolution, sampling, relationship inference and layout
//! - `source`: Document source abstraction and the in-memory source
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mongoport::config::Config;
//! use mongoport::connection::MongoConnector;
//! use mongoport::jobs::{JobRunner, JobSpec, SchemaScanJob};
//! use mongoport::source::ConnectionTarget;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let connector = Arc::new(MongoConnector::new(config.connection.clone()));
//!     let mut runner = JobRunner::new(connector, &config.jobs);
//!
//!     runner.start(JobSpec::SchemaScan(SchemaScanJob {
//!         target: ConnectionTarget::new("mongodb://localhost:27017/shop"),
//!         sample_size: config.schema.sample_size,
//!     }))?;
//!     let last = runner.run_to_completion(|msg| println!("{msg:?}")).await?;
//!     println!("{last:?}");
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod export;
pub mod formatter;
pub mod history;
pub mod import;
pub mod jobs;
pub mod schema;
pub mod source;

// Re-export commonly used types
pub use config::Config;
pub use error::{MongoportError, Result};
pub use jobs::{JobRunner, JobSpec, ProgressMessage};
pub use source::{ConnectionTarget, Connector, DocumentSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
