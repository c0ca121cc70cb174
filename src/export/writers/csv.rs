//! CSV writer for export operations
//!
//! Headers are fixed up front from a sample of the collection. Rows are
//! written for every streamed document: fields outside the header are
//! dropped and missing fields are left blank.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mongodb::bson::Document;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::error::Result;
use crate::formatter::helpers::escape_csv_value;
use crate::formatter::{BsonConverter, PlainTextConverter};

use super::{FormatWriter, create_writer, file_size, validate_path, write_failed};

/// Sorted union of the keys of `sample`
pub fn collect_headers(sample: &[Document]) -> Vec<String> {
    let mut fields = BTreeSet::new();
    for doc in sample {
        for key in doc.keys() {
            fields.insert(key.clone());
        }
    }
    fields.into_iter().collect()
}

/// Writer for CSV format
pub struct CsvWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    headers: Vec<String>,
    written: usize,
    converter: PlainTextConverter,
}

impl CsvWriter {
    /// Create the file and write the header row
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `headers` - Column names, in output order
    pub async fn new(path: &Path, headers: Vec<String>) -> Result<Self> {
        validate_path(path)?;
        let writer = create_writer(path).await?;

        let mut this = Self {
            writer,
            path: path.to_path_buf(),
            headers,
            written: 0,
            converter: PlainTextConverter::new(),
        };
        let header_line = this
            .headers
            .iter()
            .map(|h| escape_csv_value(h))
            .collect::<Vec<_>>()
            .join(",");
        this.write_line(&header_line).await?;

        debug!(
            "Created CSV writer for: {} ({} columns)",
            path.display(),
            this.headers.len()
        );
        Ok(this)
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| write_failed(&self.path, e))?;
        self.writer
            .write_all(b"\r\n")
            .await
            .map_err(|e| write_failed(&self.path, e))?;
        Ok(())
    }

    fn format_row(&self, doc: &Document) -> String {
        self.headers
            .iter()
            .map(|field| escape_csv_value(&self.converter.convert_optional(doc.get(field))))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[async_trait]
impl FormatWriter for CsvWriter {
    async fn write_batch(&mut self, docs: &[Document]) -> Result<usize> {
        for doc in docs {
            let row = self.format_row(doc);
            self.write_line(&row).await?;
        }

        self.written += docs.len();
        debug!("Wrote {} documents to CSV (total: {})", docs.len(), self.written);
        Ok(docs.len())
    }

    async fn finalize(&mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| write_failed(&self.path, e))?;

        debug!(
            "Finalized CSV file: {} ({} documents)",
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
    use mongodb::bson::doc;
    use tokio::fs;

    #[test]
    fn test_collect_headers_sorted_union() {
        let sample = vec![doc! { "name": "Ann", "age": 3 }, doc! { "city": "Oslo", "age": 4 }];
        assert_eq!(collect_headers(&sample), vec!["age", "city", "name"]);
    }

    #[tokio::test]
    async fn test_csv_rows_follow_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        let headers = vec!["age".to_string(), "name".to_string()];
        let mut writer = CsvWriter::new(&path, headers).await.unwrap();

        writer
            .write_batch(&[
                doc! { "name": "Ann", "age": 30, "extra": true },
                doc! { "name": "Bob" },
            ])
            .await
            .unwrap();
        writer.finalize().await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "age,name\r\n30,Ann\r\n,Bob\r\n");
    }

    #[tokio::test]
    async fn test_csv_quoting_and_nested_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.csv");
        let headers = vec!["meta".to_string(), "text".to_string()];
        let mut writer = CsvWriter::new(&path, headers).await.unwrap();

        writer
            .write_batch(&[
                doc! { "text": "Hello, world!", "meta": { "k": 1 } },
                doc! { "text": "Quote: \"x\"" },
                doc! { "text": "line\nbreak" },
            ])
            .await
            .unwrap();
        writer.finalize().await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("\"{\"\"k\"\":1}\",\"Hello, world!\""));
        assert!(content.contains(",\"Quote: \"\"x\"\"\""));
        assert!(content.contains(",\"line\nbreak\""));
    }
}
