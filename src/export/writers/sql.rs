//! SQL script writer
//!
//! A whole database goes into one script wrapped in a transaction. Each
//! collection becomes a `DROP TABLE` / `CREATE TABLE` pair followed by a
//! single multi-row `INSERT`, written one row group per streamed batch.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mongodb::bson::Document;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::error::{ExecutionError, Result};
use crate::formatter::helpers::quote_identifier;
use crate::formatter::{BsonConverter, SqlLiteralConverter};
use crate::schema::ResolvedColumn;

use super::{FormatWriter, create_writer, file_size, validate_path, write_failed};

struct OpenTable {
    name: String,
    columns: Vec<ResolvedColumn>,
    rows: usize,
}

/// Writer for a transactional SQL dump
pub struct SqlScriptWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    table: Option<OpenTable>,
    converter: SqlLiteralConverter,
}

impl SqlScriptWriter {
    /// Create the script and write the header and `BEGIN;`
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `database` - Database name for the header comment
    /// * `created` - Human readable export time for the header comment
    pub async fn create(path: &Path, database: &str, created: &str) -> Result<Self> {
        validate_path(path)?;
        let writer = create_writer(path).await?;
        let mut this = Self {
            writer,
            path: path.to_path_buf(),
            table: None,
            converter: SqlLiteralConverter::new(),
        };
        this.write_str(&format!(
            "-- Export: {database} | {created}\n-- Format: SQL\nBEGIN;\n\n"
        ))
        .await?;
        debug!("Created SQL script: {}", path.display());
        Ok(this)
    }

    async fn write_str(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_all(text.as_bytes())
            .await
            .map_err(|e| write_failed(&self.path, e))?;
        Ok(())
    }

    /// Write the table definition and open the table for rows
    pub async fn begin_table(&mut self, name: &str, columns: Vec<ResolvedColumn>) -> Result<()> {
        if self.table.is_some() {
            return Err(ExecutionError::InvalidParameters(format!(
                "table {name} started while another table is open"
            ))
            .into());
        }

        let table = quote_identifier(name);
        let definitions = columns
            .iter()
            .map(|c| c.definition())
            .collect::<Vec<_>>()
            .join(",\n    ");
        self.write_str(&format!(
            "-- Table: {name}\nDROP TABLE IF EXISTS {table};\nCREATE TABLE {table} (\n    {definitions}\n);\n"
        ))
        .await?;

        self.table = Some(OpenTable {
            name: name.to_string(),
            columns,
            rows: 0,
        });
        Ok(())
    }

    /// Close the open table after a failure
    ///
    /// Terminates a pending `INSERT` and leaves a comment naming the
    /// reason, so the script still parses.
    pub async fn abort_table(&mut self, reason: &str) -> Result<()> {
        let Some(table) = self.table.take() else {
            return Ok(());
        };
        let terminator = if table.rows > 0 { ";\n" } else { "" };
        let reason = reason.replace(['\n', '\r'], " ");
        self.write_str(&format!(
            "{terminator}-- Export of {} aborted after {} rows: {reason}\n\n",
            table.name, table.rows
        ))
        .await
    }

    /// Write `COMMIT;` and flush the script
    pub async fn commit(&mut self) -> Result<()> {
        if self.table.is_some() {
            self.abort_table("script closed with an open table").await?;
        }
        self.write_str("COMMIT;\n").await?;
        self.writer
            .flush()
            .await
            .map_err(|e| write_failed(&self.path, e))?;
        debug!("Committed SQL script: {}", self.path.display());
        Ok(())
    }

    fn format_row(&self, columns: &[ResolvedColumn], doc: &Document) -> String {
        let values = columns
            .iter()
            .map(|c| self.converter.convert_optional(doc.get(&c.name)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("({values})")
    }
}

#[async_trait]
impl FormatWriter for SqlScriptWriter {
    /// Append one row group to the open table's `INSERT`
    async fn write_batch(&mut self, docs: &[Document]) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }
        let Some(table) = self.table.as_ref() else {
            return Err(ExecutionError::InvalidParameters(
                "rows written without an open table".to_string(),
            )
            .into());
        };

        let mut chunk = String::new();
        if table.rows == 0 {
            let names = table
                .columns
                .iter()
                .map(|c| quote_identifier(&c.name))
                .collect::<Vec<_>>()
                .join(", ");
            chunk.push_str(&format!(
                "INSERT INTO {} ({names}) VALUES\n",
                quote_identifier(&table.name)
            ));
        } else {
            chunk.push_str(",\n");
        }
        let rows = docs
            .iter()
            .map(|doc| self.format_row(&table.columns, doc))
            .collect::<Vec<_>>()
            .join(",\n");
        chunk.push_str(&rows);

        self.write_str(&chunk).await?;
        if let Some(table) = self.table.as_mut() {
            table.rows += docs.len();
        }
        Ok(docs.len())
    }

    /// Terminate the open table's `INSERT`
    async fn finalize(&mut self) -> Result<()> {
        let Some(table) = self.table.take() else {
            return Ok(());
        };
        let footer = if table.rows > 0 { ";\n\n" } else { "\n" };
        self.write_str(footer).await?;
        debug!("Wrote {} rows to table {}", table.rows, table.name);
        Ok(())
    }

    async fn file_size(&self) -> Result<u64> {
        file_size(&self.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use mongodb::bson::{DateTime, doc, oid::ObjectId};
    use tokio::fs;

    fn column(name: &str, column_type: ColumnType) -> ResolvedColumn {
        ResolvedColumn {
            name: name.to_string(),
            column_type,
            primary_key: false,
        }
    }

    #[tokio::test]
    async fn test_script_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.sql");
        let mut writer = SqlScriptWriter::create(&path, "shop", "now").await.unwrap();

        writer
            .begin_table(
                "users",
                vec![column("name", ColumnType::Text), column("age", ColumnType::BigInt)],
            )
            .await
            .unwrap();
        writer
            .write_batch(&[doc! { "name": "O'Hara", "age": 3 }])
            .await
            .unwrap();
        writer.write_batch(&[doc! { "name": "Bob" }]).await.unwrap();
        writer.finalize().await.unwrap();
        writer.commit().await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        let expected = "-- Export: shop | now\n\
            -- Format: SQL\n\
            BEGIN;\n\
            \n\
            -- Table: users\n\
            DROP TABLE IF EXISTS \"users\";\n\
            CREATE TABLE \"users\" (\n    \"name\" TEXT,\n    \"age\" BIGINT\n);\n\
            INSERT INTO \"users\" (\"name\", \"age\") VALUES\n\
            ('O''Hara', '3'),\n\
            ('Bob', NULL);\n\
            \n\
            COMMIT;\n";
        assert_eq!(content, expected);
    }

    #[tokio::test]
    async fn test_no_insert_without_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.sql");
        let mut writer = SqlScriptWriter::create(&path, "shop", "now").await.unwrap();

        writer
            .begin_table("empty", vec![column("a", ColumnType::Text)])
            .await
            .unwrap();
        writer.finalize().await.unwrap();
        writer.commit().await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert!(!content.contains("INSERT"));
        assert!(content.ends_with("COMMIT;\n"));
    }

    #[tokio::test]
    async fn test_abort_terminates_insert() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.sql");
        let mut writer = SqlScriptWriter::create(&path, "shop", "now").await.unwrap();

        writer
            .begin_table("logs", vec![column("msg", ColumnType::Text)])
            .await
            .unwrap();
        writer.write_batch(&[doc! { "msg": "a" }]).await.unwrap();
        writer.abort_table("cursor killed").await.unwrap();
        writer.commit().await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("('a');\n-- Export of logs aborted after 1 rows: cursor killed\n"));
        assert!(content.ends_with("COMMIT;\n"));
    }

    #[tokio::test]
    async fn test_value_escaping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.sql");
        let oid = ObjectId::parse_str("64b7f0c2a1b2c3d4e5f60718").unwrap();
        let mut writer = SqlScriptWriter::create(&path, "shop", "now").await.unwrap();

        writer
            .begin_table(
                "t",
                vec![
                    column("id", ColumnType::Text),
                    column("ok", ColumnType::Boolean),
                    column("at", ColumnType::Timestamp),
                    column("doc", ColumnType::Jsonb),
                ],
            )
            .await
            .unwrap();
        writer
            .write_batch(&[doc! {
                "id": oid,
                "ok": false,
                "at": DateTime::from_millis(0),
                "doc": { "q": "it's" },
            }])
            .await
            .unwrap();
        writer.finalize().await.unwrap();
        writer.commit().await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert!(content.contains(
            "('64b7f0c2a1b2c3d4e5f60718', FALSE, '1970-01-01T00:00:00Z', '{\"q\":\"it''s\"}')"
        ));
    }

    #[tokio::test]
    async fn test_rows_require_open_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.sql");
        let mut writer = SqlScriptWriter::create(&path, "shop", "now").await.unwrap();
        assert!(writer.write_batch(&[doc! { "a": 1 }]).await.is_err());
    }
}
