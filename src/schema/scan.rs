//! Schema scan: field type labels per collection

use std::collections::BTreeMap;

use mongodb::bson::Bson;
use tracing::info;

use super::sampler::{DocumentSampler, SampleMode};
use crate::error::Result;
use crate::jobs::channel::{ProgressSender, percent};
use crate::source::DocumentSource;

/// Collection name to (field name to type label)
pub type SchemaMap = BTreeMap<String, BTreeMap<String, String>>;

/// BSON type name of a value
pub fn type_label(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "Double",
        Bson::String(_) => "String",
        Bson::Array(_) => "Array",
        Bson::Document(_) => "Document",
        Bson::Boolean(_) => "Boolean",
        Bson::Null => "Null",
        Bson::RegularExpression(_) => "Regex",
        Bson::JavaScriptCode(_) => "JavaScript",
        Bson::JavaScriptCodeWithScope(_) => "JavaScriptWithScope",
        Bson::Int32(_) => "Int32",
        Bson::Int64(_) => "Int64",
        Bson::Timestamp(_) => "Timestamp",
        Bson::Binary(_) => "Binary",
        Bson::ObjectId(_) => "ObjectId",
        Bson::DateTime(_) => "Date",
        Bson::Symbol(_) => "Symbol",
        Bson::Decimal128(_) => "Decimal128",
        Bson::Undefined => "Undefined",
        Bson::MaxKey => "MaxKey",
        Bson::MinKey => "MinKey",
        Bson::DbPointer(_) => "DBPointer",
    }
}

/// Sample every visible collection and record one type label per field
///
/// The label of a field is the type of its last sampled occurrence.
/// Collections whose sample fails are logged and left out; only failing
/// to list the collections is an error.
pub async fn scan_schema(
    source: &dyn DocumentSource,
    sample_size: usize,
    progress: &ProgressSender,
) -> Result<SchemaMap> {
    let names: Vec<String> = source
        .list_collection_names()
        .await?
        .into_iter()
        .filter(|name| !name.starts_with("system."))
        .collect();

    let sampler = DocumentSampler::new(source);
    let total = names.len();
    let mut schema = SchemaMap::new();

    for (index, name) in names.iter().enumerate() {
        progress
            .progress(format!("Analyzing {}...", name), percent(index, total))
            .await;

        let docs = match sampler.sample(name, sample_size, SampleMode::Random).await {
            Ok(docs) => docs,
            Err(e) => {
                progress
                    .log(format!("Schema scan failed for {}: {}", name, e))
                    .await;
                continue;
            }
        };

        let mut fields = BTreeMap::new();
        for doc in &docs {
            for (key, value) in doc {
                fields.insert(key.clone(), type_label(value).to_string());
            }
        }
        schema.insert(name.clone(), fields);
    }

    info!("Schema scan covered {} of {} collections", schema.len(), total);
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::channel::{ProgressMessage, progress_channel};
    use crate::source::MemorySource;
    use mongodb::bson::{DateTime, doc, oid::ObjectId};

    #[test]
    fn test_type_labels() {
        assert_eq!(type_label(&Bson::ObjectId(ObjectId::new())), "ObjectId");
        assert_eq!(type_label(&Bson::DateTime(DateTime::now())), "Date");
        assert_eq!(type_label(&Bson::Int32(1)), "Int32");
        assert_eq!(type_label(&Bson::Document(doc! {})), "Document");
    }

    #[tokio::test]
    async fn test_scan_builds_schema_map() {
        let source = MemorySource::new("shop")
            .with_collection(
                "users",
                vec![doc! { "_id": ObjectId::new(), "name": "Ann", "age": 31 }],
            )
            .with_collection(
                "orders",
                vec![
                    doc! { "_id": ObjectId::new(), "user_id": ObjectId::new(), "total": 10 },
                    doc! { "_id": ObjectId::new(), "user_id": ObjectId::new(), "total": 9.5 },
                ],
            )
            .with_collection("system.views", vec![doc! { "a": 1 }]);
        let (tx, mut rx) = progress_channel(16);

        let schema = scan_schema(&source, 20, &tx).await.unwrap();

        assert_eq!(schema.len(), 2);
        assert_eq!(schema["users"]["name"], "String");
        assert_eq!(schema["orders"]["user_id"], "ObjectId");
        // last occurrence wins
        assert_eq!(schema["orders"]["total"], "Double");

        drop(tx);
        let mut descriptions = Vec::new();
        while let Some(msg) = rx.recv().await {
            if let ProgressMessage::Progress { description, .. } = msg {
                descriptions.push(description);
            }
        }
        assert_eq!(descriptions, vec!["Analyzing users...", "Analyzing orders..."]);
    }

    #[tokio::test]
    async fn test_failing_collection_is_logged_and_skipped() {
        let source = MemorySource::new("shop")
            .with_collection("a", vec![doc! { "x": 1 }])
            .with_collection("b", vec![doc! { "y": 1 }]);
        source.fail_collection("a");
        let (tx, mut rx) = progress_channel(16);

        let schema = scan_schema(&source, 20, &tx).await.unwrap();
        assert!(!schema.contains_key("a"));
        assert!(schema.contains_key("b"));

        drop(tx);
        let mut logs = Vec::new();
        while let Some(msg) = rx.recv().await {
            if let ProgressMessage::Log(text) = msg {
                logs.push(text);
            }
        }
        assert_eq!(logs.len(), 1);
        assert!(logs[0].starts_with("Schema scan failed for a:"));
    }
}
