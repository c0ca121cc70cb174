//! In-memory document source
//!
//! Holds collections in process memory. Individual collections can be
//! marked as failing, and server-side sampling can be switched off, which
//! makes it possible to exercise the per-item failure and fallback paths
//! of the jobs without a server.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mongodb::bson::Document;

use super::streaming::{StreamingQuery, VecStreamingQuery};
use super::{ConnectionTarget, Connector, DocumentSource};
use crate::error::{ConnectionError, MongoportError, Result};

#[derive(Debug, Default)]
struct MemoryState {
    collections: Vec<(String, Vec<Document>)>,
    failing: HashSet<String>,
    random_sample_unsupported: bool,
    insert_batches: Vec<(String, usize)>,
    close_count: usize,
}

impl MemoryState {
    fn check(&self, collection: &str) -> Result<()> {
        if self.failing.contains(collection) {
            return Err(MongoportError::Generic(format!(
                "not authorized to access collection '{collection}'"
            )));
        }
        Ok(())
    }

    fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, docs)| docs.clone())
            .unwrap_or_default()
    }

    fn push(&mut self, collection: &str, docs: Vec<Document>) {
        match self.collections.iter_mut().find(|(name, _)| name == collection) {
            Some((_, existing)) => existing.extend(docs),
            None => self.collections.push((collection.to_string(), docs)),
        }
    }
}

/// Document source backed by process memory
///
/// Cloning is cheap and clones share the same collections.
#[derive(Debug, Clone)]
pub struct MemorySource {
    database: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySource {
    /// Create an empty source for `database`
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    /// Add a collection (builder style)
    pub fn with_collection(self, name: &str, docs: Vec<Document>) -> Self {
        self.lock().push(name, docs);
        self
    }

    /// Make every read and write on `name` fail
    pub fn fail_collection(&self, name: &str) {
        self.lock().failing.insert(name.to_string());
    }

    /// Make `random_sample` fail as on servers without `$sample`
    pub fn disable_random_sample(&self) {
        self.lock().random_sample_unsupported = true;
    }

    /// Snapshot of a collection's documents
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock().documents(collection)
    }

    /// Sizes of the batches inserted into `collection`, in call order
    pub fn insert_batch_sizes(&self, collection: &str) -> Vec<usize> {
        self.lock()
            .insert_batches
            .iter()
            .filter(|(name, _)| name == collection)
            .map(|(_, size)| *size)
            .collect()
    }

    /// How many times `close` was called
    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn list_collection_names(&self) -> Result<Vec<String>> {
        Ok(self
            .lock()
            .collections
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    /// Memory has no random order to offer; the leading documents stand in
    /// for the sample.
    async fn random_sample(&self, collection: &str, size: usize) -> Result<Vec<Document>> {
        let state = self.lock();
        if state.random_sample_unsupported {
            return Err(MongoportError::Generic(
                "Unrecognized pipeline stage name: '$sample'".to_string(),
            ));
        }
        state.check(collection)?;
        Ok(state.documents(collection).into_iter().take(size).collect())
    }

    async fn prefix_sample(&self, collection: &str, size: usize) -> Result<Vec<Document>> {
        let state = self.lock();
        state.check(collection)?;
        Ok(state.documents(collection).into_iter().take(size).collect())
    }

    async fn stream(
        &self,
        collection: &str,
        batch_size: usize,
    ) -> Result<Box<dyn StreamingQuery>> {
        let state = self.lock();
        state.check(collection)?;
        Ok(Box::new(VecStreamingQuery::new(
            state.documents(collection),
            batch_size,
        )))
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<()> {
        let mut state = self.lock();
        state.check(collection)?;
        state.insert_batches.push((collection.to_string(), 1));
        state.push(collection, vec![doc]);
        Ok(())
    }

    async fn insert_many(&self, collection: &str, docs: Vec<Document>) -> Result<()> {
        let mut state = self.lock();
        state.check(collection)?;
        state.insert_batches.push((collection.to_string(), docs.len()));
        state.push(collection, docs);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.lock().close_count += 1;
        Ok(())
    }
}

/// Connector handing out a shared [`MemorySource`]
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    source: MemorySource,
    unreachable: bool,
}

impl MemoryConnector {
    /// Connector that always returns `source`
    pub fn new(source: MemorySource) -> Self {
        Self {
            source,
            unreachable: false,
        }
    }

    /// Connector whose every connection attempt fails
    pub fn unreachable(source: MemorySource) -> Self {
        Self {
            source,
            unreachable: true,
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, target: &ConnectionTarget) -> Result<Box<dyn DocumentSource>> {
        if self.unreachable {
            return Err(ConnectionError::ConnectionFailed(format!(
                "{}: server selection timed out",
                target.uri
            ))
            .into());
        }
        Ok(Box::new(self.source.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn test_collections_keep_insertion_order() {
        let source = MemorySource::new("app")
            .with_collection("zeta", vec![])
            .with_collection("alpha", vec![]);
        let names = source.list_collection_names().await.unwrap();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[tokio::test]
    async fn test_failing_collection() {
        let source = MemorySource::new("app").with_collection("secret", vec![doc! { "a": 1 }]);
        source.fail_collection("secret");
        assert!(source.prefix_sample("secret", 10).await.is_err());
        assert!(source.stream("secret", 10).await.is_err());
    }

    #[tokio::test]
    async fn test_insert_records_batches() {
        let source = MemorySource::new("app");
        source
            .insert_many("items", vec![doc! { "a": 1 }, doc! { "a": 2 }])
            .await
            .unwrap();
        source.insert_one("items", doc! { "a": 3 }).await.unwrap();

        assert_eq!(source.documents("items").len(), 3);
        assert_eq!(source.insert_batch_sizes("items"), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_unreachable_connector() {
        let connector = MemoryConnector::unreachable(MemorySource::new("app"));
        let result = connector.connect(&ConnectionTarget::new("mongodb://nowhere/app")).await;
        assert!(result.is_err());
    }
}
