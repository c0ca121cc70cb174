//! JSON array writer for export operations
//!
//! Writes one JSON array per collection, element by element, so the
//! collection never has to fit in memory. Elements are relaxed extended
//! JSON, which keeps ObjectIds and dates recoverable on import.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mongodb::bson::Document;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::error::Result;
use crate::formatter::{BsonConverter, ExtendedJsonConverter};

use super::{FormatWriter, create_writer, file_size, validate_path, write_failed};

/// Writer for a JSON array file
pub struct JsonArrayWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    written: usize,
    converter: ExtendedJsonConverter,
}

impl JsonArrayWriter {
    /// Create the file and write the opening bracket
    pub async fn new(path: &Path) -> Result<Self> {
        validate_path(path)?;
        let mut writer = create_writer(path).await?;
        writer
            .write_all(b"[\n")
            .await
            .map_err(|e| write_failed(path, e))?;

        debug!("Created JSON writer for: {}", path.display());

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            written: 0,
            converter: ExtendedJsonConverter::new(),
        })
    }
}

#[async_trait]
impl FormatWriter for JsonArrayWriter {
    async fn write_batch(&mut self, docs: &[Document]) -> Result<usize> {
        for doc in docs {
            let json = self.converter.convert_document(doc).to_string();
            if self.written > 0 {
                self.writer
                    .write_all(b",\n")
                    .await
                    .map_err(|e| write_failed(&self.path, e))?;
            }
            self.writer
                .write_all(json.as_bytes())
                .await
                .map_err(|e| write_failed(&self.path, e))?;
            self.written += 1;
        }

        debug!(
            "Wrote {} documents to JSON (total: {})",
            docs.len(),
            self.written
        );
        Ok(docs.len())
    }

    async fn finalize(&mut self) -> Result<()> {
        self.writer
            .write_all(b"\n]")
            .await
            .map_err(|e| write_failed(&self.path, e))?;
        self.writer
            .flush()
            .await
            .map_err(|e| write_failed(&self.path, e))?;

        debug!(
            "Finalized JSON file: {} ({} documents)",
            self.path.display(),
            self.written
        );
        Ok(())
    }

    async fn file_size(&self) -> Result<u64> {
        file_size(&self.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{Bson, DateTime, doc, oid::ObjectId};
    use tokio::fs;

    #[tokio::test]
    async fn test_json_writer_produces_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        let mut writer = JsonArrayWriter::new(&path).await.unwrap();

        writer.write_batch(&[doc! { "name": "Ann" }]).await.unwrap();
        writer.write_batch(&[doc! { "name": "Bob" }]).await.unwrap();
        writer.finalize().await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "[\n{\"name\":\"Ann\"},\n{\"name\":\"Bob\"}\n]");

        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_json_writer_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        let mut writer = JsonArrayWriter::new(&path).await.unwrap();
        writer.finalize().await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_json_writer_keeps_bson_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typed.json");
        let oid = ObjectId::new();
        let mut writer = JsonArrayWriter::new(&path).await.unwrap();

        writer
            .write_batch(&[doc! { "_id": oid, "at": DateTime::from_millis(0) }])
            .await
            .unwrap();
        writer.finalize().await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        let element = parsed[0].clone();
        assert_eq!(element["_id"]["$oid"], oid.to_hex());

        let back = Bson::try_from(element).unwrap();
        assert_eq!(back.as_document().unwrap().get_object_id("_id").unwrap(), oid);
    }
}
