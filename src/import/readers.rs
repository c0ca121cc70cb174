//! File decoders for imports
//!
//! JSON is read as relaxed or canonical extended JSON, so `$oid`, `$date`
//! and friends come back as their BSON types.

use std::io::Cursor;
use std::path::Path;

use mongodb::bson::{Bson, Document};
use serde_json::Value as JsonValue;

use crate::error::{ExecutionError, ParseError, Result};

/// Supported import file kinds, by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// One JSON value, or JSON lines as a fallback
    Json,
    JsonLines,
    Bson,
    Csv,
}

impl FileKind {
    /// Detect the kind from the file extension, ignoring case
    pub fn from_path(path: &Path) -> Result<FileKind> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(FileKind::Json),
            "jsonl" | "ndjson" => Ok(FileKind::JsonLines),
            "bson" => Ok(FileKind::Bson),
            "csv" => Ok(FileKind::Csv),
            _ => {
                let shown = if ext.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{ext}")
                };
                Err(ExecutionError::UnsupportedFormat(shown).into())
            }
        }
    }
}

/// Decoded content of a JSON file
#[derive(Debug, PartialEq)]
pub enum JsonContent {
    /// The file held one document
    Single(Document),
    /// The file held an array, or one document per line
    Many(Vec<Document>),
}

/// Name of a JSON value's type, for error messages
fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Convert one extended JSON object into a document
pub fn json_to_document(value: JsonValue) -> Result<Document> {
    if !value.is_object() {
        return Err(ParseError::NotADocument(json_type_name(&value).to_string()).into());
    }
    match Bson::try_from(value) {
        Ok(Bson::Document(doc)) => Ok(doc),
        // a lone `{"$oid": ...}` and similar decode to scalars
        Ok(other) => Err(ParseError::NotADocument(format!("{:?}", other.element_type())).into()),
        Err(e) => Err(ParseError::InvalidJson(e.to_string()).into()),
    }
}

/// Convert a JSON array of objects into documents
pub fn json_value_to_documents(value: JsonValue) -> Result<Vec<Document>> {
    match value {
        JsonValue::Array(items) => items.into_iter().map(json_to_document).collect(),
        other => Ok(vec![json_to_document(other)?]),
    }
}

/// Decode newline-delimited JSON, skipping blank lines
pub fn decode_json_lines(text: &str) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: JsonValue = serde_json::from_str(line)
            .map_err(|e| ParseError::InvalidJson(format!("line {}: {}", index + 1, e)))?;
        docs.push(json_to_document(value)?);
    }
    Ok(docs)
}

/// Decode a `.json` file
///
/// The whole text is parsed as one value first; when that fails it is
/// read as JSON lines. Top-level scalars are rejected.
pub fn decode_json(text: &str) -> Result<JsonContent> {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(value @ JsonValue::Object(_)) => Ok(JsonContent::Single(json_to_document(value)?)),
        Ok(value @ JsonValue::Array(_)) => Ok(JsonContent::Many(json_value_to_documents(value)?)),
        Ok(other) => Err(ParseError::NotADocument(json_type_name(&other).to_string()).into()),
        Err(_) => Ok(JsonContent::Many(decode_json_lines(text)?)),
    }
}

/// Decode concatenated BSON records
pub fn decode_bson(bytes: &[u8]) -> Result<Vec<Document>> {
    let mut cursor = Cursor::new(bytes);
    let mut docs = Vec::new();
    while (cursor.position() as usize) < bytes.len() {
        let offset = cursor.position();
        let doc = Document::from_reader(&mut cursor).map_err(|e| {
            ParseError::InvalidBson(format!("record {} at byte {}: {}", docs.len() + 1, offset, e))
        })?;
        docs.push(doc);
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MongoportError;
    use mongodb::bson::{self, DateTime, doc, oid::ObjectId};

    #[test]
    fn test_file_kind_detection() {
        assert_eq!(FileKind::from_path(Path::new("a/users.JSON")).unwrap(), FileKind::Json);
        assert_eq!(FileKind::from_path(Path::new("x.ndjson")).unwrap(), FileKind::JsonLines);
        assert_eq!(FileKind::from_path(Path::new("x.Bson")).unwrap(), FileKind::Bson);
        let err = FileKind::from_path(Path::new("notes.txt")).unwrap_err();
        assert_eq!(err.to_string(), "Execution error: Unsupported file extension: .txt");
    }

    #[test]
    fn test_decode_json_object_and_array() {
        assert_eq!(
            decode_json(r#"{"a": 1}"#).unwrap(),
            JsonContent::Single(doc! { "a": 1 })
        );
        assert_eq!(
            decode_json(r#"[{"a": 1}, {"a": 2}]"#).unwrap(),
            JsonContent::Many(vec![doc! { "a": 1 }, doc! { "a": 2 }])
        );
    }

    #[test]
    fn test_decode_json_falls_back_to_lines() {
        let text = "{\"a\": 1}\n\n{\"a\": 2}\n";
        assert_eq!(
            decode_json(text).unwrap(),
            JsonContent::Many(vec![doc! { "a": 1 }, doc! { "a": 2 }])
        );
    }

    #[test]
    fn test_decode_json_rejects_scalars() {
        let err = decode_json("42").unwrap_err();
        assert!(matches!(err, MongoportError::Parse(ParseError::NotADocument(_))));
        assert!(decode_json(r#"[{"a": 1}, 2]"#).is_err());
    }

    #[test]
    fn test_json_lines_error_names_line() {
        let err = decode_json_lines("{\"a\": 1}\n{broken\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_extended_json_types() {
        let oid = ObjectId::new();
        let text = format!(
            r#"{{"_id": {{"$oid": "{}"}}, "at": {{"$date": "2024-01-02T03:04:05Z"}}}}"#,
            oid.to_hex()
        );
        let JsonContent::Single(doc) = decode_json(&text).unwrap() else {
            panic!("expected a single document");
        };
        assert_eq!(doc.get_object_id("_id").unwrap(), oid);
        assert!(matches!(doc.get("at"), Some(Bson::DateTime(_))));
    }

    #[test]
    fn test_decode_bson_records() {
        let docs = vec![doc! { "a": 1 }, doc! { "at": DateTime::from_millis(5) }];
        let mut bytes = Vec::new();
        for doc in &docs {
            bytes.extend(bson::to_vec(doc).unwrap());
        }
        assert_eq!(decode_bson(&bytes).unwrap(), docs);
        assert!(decode_bson(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_bson_truncated() {
        let mut bytes = bson::to_vec(&doc! { "a": 1 }).unwrap();
        bytes.extend_from_slice(&[10, 0, 0]);
        let err = decode_bson(&bytes).unwrap_err();
        assert!(matches!(err, MongoportError::Parse(ParseError::InvalidBson(_))));
    }
}
