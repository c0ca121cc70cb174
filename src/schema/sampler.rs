//! Bounded document sampling

use mongodb::bson::Document;
use tracing::{debug, warn};

use crate::error::Result;
use crate::source::DocumentSource;

/// How a sample is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Server-side `$sample`, falling back to a prefix scan
    Random,
    /// The leading documents in natural order
    Prefix,
}

/// Pulls bounded samples from the collections of a [`DocumentSource`]
pub struct DocumentSampler<'a> {
    source: &'a dyn DocumentSource,
}

impl<'a> DocumentSampler<'a> {
    pub fn new(source: &'a dyn DocumentSource) -> Self {
        Self { source }
    }

    /// Sample at most `size` documents from `collection`
    ///
    /// Collections smaller than `size` return every document. Errors are
    /// returned to the caller, which decides whether to skip the collection.
    pub async fn sample(
        &self,
        collection: &str,
        size: usize,
        mode: SampleMode,
    ) -> Result<Vec<Document>> {
        let docs = match mode {
            SampleMode::Prefix => self.source.prefix_sample(collection, size).await?,
            SampleMode::Random => match self.source.random_sample(collection, size).await {
                Ok(docs) => docs,
                Err(e) => {
                    warn!(
                        "Random sampling of {} failed ({}), using the first {} documents",
                        collection, e, size
                    );
                    self.source.prefix_sample(collection, size).await?
                }
            },
        };
        debug!("Sampled {} documents from {}", docs.len(), collection);
        Ok(docs)
    }
}
