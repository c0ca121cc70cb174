//! Batched document streams
//!
//! Exports never materialize a whole collection: they pull fixed-size
//! batches from a [`StreamingQuery`] until it is exhausted.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Cursor;
use mongodb::bson::Document;
use tracing::debug;

use crate::error::{ExecutionError, Result};

/// Trait for streaming query results in batches
#[async_trait]
pub trait StreamingQuery: Send {
    /// Fetch the next batch of documents
    ///
    /// # Returns
    /// * `Result<Option<Vec<Document>>>` - Next batch of documents, or None if exhausted
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>>;

    /// Close the query and release server resources
    async fn close(&mut self) -> Result<()>;
}

/// Cursor-backed streaming query over a `find` on a whole collection
pub struct CursorStreamingQuery {
    cursor: Option<Cursor<Document>>,
    batch_size: usize,
    total_fetched: u64,
    collection: String,
}

impl CursorStreamingQuery {
    /// Create a new cursor streaming query
    ///
    /// # Arguments
    /// * `cursor` - MongoDB cursor from a find operation
    /// * `batch_size` - Number of documents to return per batch
    /// * `collection` - Collection name for logging
    pub fn new(cursor: Cursor<Document>, batch_size: usize, collection: impl Into<String>) -> Self {
        Self {
            cursor: Some(cursor),
            batch_size: batch_size.max(1),
            total_fetched: 0,
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl StreamingQuery for CursorStreamingQuery {
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>> {
        let cursor = match self.cursor.as_mut() {
            Some(c) => c,
            None => return Ok(None),
        };

        let mut batch = Vec::with_capacity(self.batch_size);

        while batch.len() < self.batch_size {
            match cursor.try_next().await {
                Ok(Some(doc)) => batch.push(doc),
                Ok(None) => break,
                Err(e) => {
                    // Drop the cursor so the server side is released
                    self.cursor = None;
                    return Err(ExecutionError::CursorError(format!(
                        "{} after {} documents: {}",
                        self.collection, self.total_fetched, e
                    ))
                    .into());
                }
            }
        }

        if batch.is_empty() {
            debug!(
                "Stream over {} exhausted after {} documents",
                self.collection, self.total_fetched
            );
            self.cursor = None;
            Ok(None)
        } else {
            self.total_fetched += batch.len() as u64;
            debug!(
                "Fetched batch of {} documents from {} (total: {})",
                batch.len(),
                self.collection,
                self.total_fetched
            );
            Ok(Some(batch))
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.cursor.take().is_some() {
            debug!(
                "Closed stream over {} after {} documents",
                self.collection, self.total_fetched
            );
        }
        Ok(())
    }
}

/// Streaming query over documents already held in memory
pub struct VecStreamingQuery {
    remaining: VecDeque<Document>,
    batch_size: usize,
}

impl VecStreamingQuery {
    /// Create a stream returning `docs` in batches of `batch_size`
    pub fn new(docs: Vec<Document>, batch_size: usize) -> Self {
        Self {
            remaining: docs.into(),
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl StreamingQuery for VecStreamingQuery {
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>> {
        if self.remaining.is_empty() {
            return Ok(None);
        }
        let take = self.batch_size.min(self.remaining.len());
        Ok(Some(self.remaining.drain(..take).collect()))
    }

    async fn close(&mut self) -> Result<()> {
        self.remaining.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_streaming_query_trait_object() {
        fn _accepts_streaming_query(_query: Box<dyn StreamingQuery>) {}
    }

    #[tokio::test]
    async fn test_vec_stream_batches() {
        let docs: Vec<Document> = (0..5).map(|i| doc! { "i": i }).collect();
        let mut query = VecStreamingQuery::new(docs, 2);

        let mut sizes = Vec::new();
        while let Some(batch) = query.next_batch().await.unwrap() {
            sizes.push(batch.len());
        }
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_vec_stream_exact_multiple() {
        let docs: Vec<Document> = (0..4).map(|i| doc! { "i": i }).collect();
        let mut query = VecStreamingQuery::new(docs, 2);

        let mut total = 0;
        let mut batches = 0;
        while let Some(batch) = query.next_batch().await.unwrap() {
            total += batch.len();
            batches += 1;
        }
        assert_eq!(total, 4);
        assert_eq!(batches, 2);
    }

    #[tokio::test]
    async fn test_vec_stream_empty() {
        let mut query = VecStreamingQuery::new(Vec::new(), 10);
        assert!(query.next_batch().await.unwrap().is_none());
        query.close().await.unwrap();
    }
}
