//! Column type resolution
//!
//! Decides a relational column type for each field of a schemaless
//! collection from the kinds of values seen in a sample.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use mongodb::bson::{Bson, Document};
use serde::Serialize;

use crate::export::metadata::ID_FIELD;
use crate::formatter::helpers::quote_identifier;

/// Semantic kind of a non-null value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Boolean,
    Integer,
    Float,
    Timestamp,
    Document,
    Array,
    ObjectId,
    Text,
    Other,
}

impl Kind {
    /// Classify a value; `None` for null and undefined
    pub fn of(value: &Bson) -> Option<Kind> {
        let kind = match value {
            Bson::Null | Bson::Undefined => return None,
            Bson::Boolean(_) => Kind::Boolean,
            Bson::Int32(_) | Bson::Int64(_) => Kind::Integer,
            Bson::Double(_) | Bson::Decimal128(_) => Kind::Float,
            Bson::DateTime(_) => Kind::Timestamp,
            Bson::Document(_) => Kind::Document,
            Bson::Array(_) => Kind::Array,
            Bson::ObjectId(_) => Kind::ObjectId,
            Bson::String(_) | Bson::Symbol(_) => Kind::Text,
            _ => Kind::Other,
        };
        Some(kind)
    }

    fn is_numeric(self) -> bool {
        matches!(self, Kind::Integer | Kind::Float)
    }

    fn is_container(self) -> bool {
        matches!(self, Kind::Document | Kind::Array)
    }
}

/// Distinct kinds observed for one field
pub type FieldTypeSet = BTreeSet<Kind>;

/// Target column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Boolean,
    BigInt,
    Numeric,
    Timestamp,
    Jsonb,
    Text,
}

impl ColumnType {
    /// SQL spelling of the type
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Numeric => "NUMERIC",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Jsonb => "JSONB",
            ColumnType::Text => "TEXT",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Pick the column type for a set of observed kinds
///
/// Mixed kinds never narrow: integers and floats widen to NUMERIC,
/// documents and arrays share JSONB, and any other mix is TEXT.
pub fn resolve(types: &FieldTypeSet) -> ColumnType {
    let mut kinds = types.iter().copied();
    let first = match kinds.next() {
        // only nulls were seen
        None => return ColumnType::Text,
        Some(kind) => kind,
    };

    if types.len() == 1 {
        return match first {
            Kind::Boolean => ColumnType::Boolean,
            Kind::Integer => ColumnType::BigInt,
            Kind::Float => ColumnType::Numeric,
            Kind::Timestamp => ColumnType::Timestamp,
            Kind::Document | Kind::Array => ColumnType::Jsonb,
            _ => ColumnType::Text,
        };
    }

    if types.iter().all(|k| k.is_numeric()) {
        ColumnType::Numeric
    } else if types.iter().all(|k| k.is_container()) {
        ColumnType::Jsonb
    } else {
        ColumnType::Text
    }
}

/// A field with its resolved column type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub primary_key: bool,
}

impl ResolvedColumn {
    /// Column definition for a CREATE TABLE statement
    pub fn definition(&self) -> String {
        let mut def = format!("{} {}", quote_identifier(&self.name), self.column_type);
        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        def
    }
}

/// Accumulates a [`FieldTypeSet`] per field across sampled documents
///
/// Fields keep the order in which they were first seen.
#[derive(Debug, Default)]
pub struct FieldTypeCollector {
    order: Vec<String>,
    kinds: HashMap<String, FieldTypeSet>,
}

impl FieldTypeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the kinds of one document's top-level values
    ///
    /// The identifier field and null values are ignored.
    pub fn observe(&mut self, doc: &Document) {
        for (key, value) in doc {
            if key == ID_FIELD {
                continue;
            }
            let kind = match Kind::of(value) {
                Some(kind) => kind,
                None => continue,
            };
            if !self.kinds.contains_key(key) {
                self.order.push(key.clone());
            }
            self.kinds.entry(key.clone()).or_default().insert(kind);
        }
    }

    /// Resolve every observed field
    ///
    /// With `include_identifier`, a TEXT primary key column for the
    /// identifier field comes first.
    pub fn into_columns(self, include_identifier: bool) -> Vec<ResolvedColumn> {
        let mut columns = Vec::with_capacity(self.order.len() + 1);
        if include_identifier {
            columns.push(ResolvedColumn {
                name: ID_FIELD.to_string(),
                column_type: ColumnType::Text,
                primary_key: true,
            });
        }
        for name in self.order {
            let column_type = self
                .kinds
                .get(&name)
                .map(resolve)
                .unwrap_or(ColumnType::Text);
            columns.push(ResolvedColumn {
                name,
                column_type,
                primary_key: false,
            });
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{DateTime, doc, oid::ObjectId};

    fn set(kinds: &[Kind]) -> FieldTypeSet {
        kinds.iter().copied().collect()
    }

    #[test]
    fn test_empty_set_is_text() {
        assert_eq!(resolve(&set(&[])), ColumnType::Text);
    }

    #[test]
    fn test_singletons() {
        assert_eq!(resolve(&set(&[Kind::Boolean])), ColumnType::Boolean);
        assert_eq!(resolve(&set(&[Kind::Integer])), ColumnType::BigInt);
        assert_eq!(resolve(&set(&[Kind::Float])), ColumnType::Numeric);
        assert_eq!(resolve(&set(&[Kind::Timestamp])), ColumnType::Timestamp);
        assert_eq!(resolve(&set(&[Kind::Document])), ColumnType::Jsonb);
        assert_eq!(resolve(&set(&[Kind::Array])), ColumnType::Jsonb);
        assert_eq!(resolve(&set(&[Kind::Text])), ColumnType::Text);
        assert_eq!(resolve(&set(&[Kind::ObjectId])), ColumnType::Text);
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(resolve(&set(&[Kind::Integer, Kind::Float])), ColumnType::Numeric);
    }

    #[test]
    fn test_containers_share_jsonb() {
        assert_eq!(resolve(&set(&[Kind::Document, Kind::Array])), ColumnType::Jsonb);
    }

    #[test]
    fn test_mixed_kinds_fall_back_to_text() {
        assert_eq!(resolve(&set(&[Kind::Integer, Kind::Text])), ColumnType::Text);
        assert_eq!(resolve(&set(&[Kind::Boolean, Kind::Integer])), ColumnType::Text);
        assert_eq!(resolve(&set(&[Kind::Float, Kind::Array])), ColumnType::Text);
    }

    #[test]
    fn test_resolution_is_total_and_deterministic() {
        let universe = [
            Kind::Boolean,
            Kind::Integer,
            Kind::Float,
            Kind::Timestamp,
            Kind::Document,
            Kind::Array,
            Kind::Text,
        ];
        // every subset of the seven kinds
        for mask in 0u32..(1 << universe.len()) {
            let types: FieldTypeSet = universe
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, k)| *k)
                .collect();
            let first = resolve(&types);
            assert_eq!(first, resolve(&types));
            if types.iter().any(|k| !k.is_numeric()) {
                assert_ne!(first, ColumnType::BigInt);
                if types.len() > 1 {
                    assert_ne!(first, ColumnType::Numeric);
                }
            }
        }
    }

    #[test]
    fn test_kind_of_values() {
        assert_eq!(Kind::of(&Bson::Null), None);
        assert_eq!(Kind::of(&Bson::Int64(1)), Some(Kind::Integer));
        assert_eq!(Kind::of(&Bson::DateTime(DateTime::now())), Some(Kind::Timestamp));
        assert_eq!(Kind::of(&Bson::ObjectId(ObjectId::new())), Some(Kind::ObjectId));
    }

    #[test]
    fn test_collector_skips_id_and_nulls() {
        let mut collector = FieldTypeCollector::new();
        collector.observe(&doc! { "_id": ObjectId::new(), "age": 30, "nick": Bson::Null });
        collector.observe(&doc! { "_id": ObjectId::new(), "age": 30.5, "name": "Ann" });

        let columns = collector.into_columns(false);
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["age", "name"]);
        assert_eq!(columns[0].column_type, ColumnType::Numeric);
        assert_eq!(columns[1].column_type, ColumnType::Text);
    }

    #[test]
    fn test_collector_identifier_first() {
        let mut collector = FieldTypeCollector::new();
        collector.observe(&doc! { "active": true });

        let columns = collector.into_columns(true);
        assert_eq!(columns[0].definition(), "\"_id\" TEXT PRIMARY KEY");
        assert_eq!(columns[1].definition(), "\"active\" BOOLEAN");
    }
}
