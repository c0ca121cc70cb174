//! Document source abstraction
//!
//! Export, import and schema jobs never talk to the driver directly. They
//! go through [`DocumentSource`], which the MongoDB connection implements
//! and [`memory::MemorySource`] implements in-process.
//!
//! Every job opens its own source through a [`Connector`] and closes it on
//! every exit path.

use async_trait::async_trait;
use mongodb::bson::Document;

use crate::error::Result;

pub mod memory;
pub mod streaming;

pub use memory::{MemoryConnector, MemorySource};
pub use streaming::{CursorStreamingQuery, StreamingQuery, VecStreamingQuery};

/// Where a job connects to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    /// MongoDB connection URI
    pub uri: String,
    /// Database used when the URI names none
    pub fallback_database: Option<String>,
}

impl ConnectionTarget {
    /// Target that requires the URI to name a database
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            fallback_database: None,
        }
    }

    /// Use `database` when the URI names none
    pub fn with_fallback_database(mut self, database: impl Into<String>) -> Self {
        self.fallback_database = Some(database.into());
        self
    }
}

/// Read/write access to the collections of one database
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Name of the database this source is bound to
    fn database_name(&self) -> &str;

    /// List collection names in server order
    async fn list_collection_names(&self) -> Result<Vec<String>>;

    /// Server-side random sample of at most `size` documents
    async fn random_sample(&self, collection: &str, size: usize) -> Result<Vec<Document>>;

    /// The first `size` documents in natural order
    async fn prefix_sample(&self, collection: &str, size: usize) -> Result<Vec<Document>>;

    /// Stream every document of a collection in batches of `batch_size`
    async fn stream(
        &self,
        collection: &str,
        batch_size: usize,
    ) -> Result<Box<dyn StreamingQuery>>;

    /// Insert a single document
    async fn insert_one(&self, collection: &str, doc: Document) -> Result<()>;

    /// Insert a batch of documents
    async fn insert_many(&self, collection: &str, docs: Vec<Document>) -> Result<()>;

    /// Release the underlying connection
    async fn close(&self) -> Result<()>;
}

/// Opens a private [`DocumentSource`] for one job
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `target`, failing with a connection error when the server
    /// is unreachable or no database can be selected
    async fn connect(&self, target: &ConnectionTarget) -> Result<Box<dyn DocumentSource>>;
}
