//! Relationship inference by naming convention
//!
//! A field such as `user_id` or `authorId` is taken as a foreign key into
//! the collection its base name points at (`user`, `users`, `useres`).
//! The guess is advisory; irregular plurals are not handled.

use std::collections::HashSet;

use mongodb::bson::{Bson, Document, doc, oid::ObjectId};
use serde::Serialize;

use super::scan::SchemaMap;
use crate::export::metadata::ID_FIELD;

/// Inferred foreign-key edge between two collections
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RelationshipEdge {
    pub source: String,
    pub target: String,
    pub field: String,
}

/// Whether a field name looks like a reference
fn is_reference_field(field: &str) -> bool {
    field != ID_FIELD && field.to_lowercase().ends_with("id")
}

/// Candidate collection names for a reference field, in preference order
fn candidates(field: &str) -> Vec<String> {
    let cut = field.len().saturating_sub(2);
    let base = if field.is_char_boundary(cut) { &field[..cut] } else { "" };
    let base = base.strip_suffix('_').unwrap_or(base);

    let mut out = Vec::with_capacity(4);
    if !base.is_empty() {
        out.push(base.to_string());
        out.push(format!("{base}s"));
        out.push(format!("{base}es"));
    }
    out.push(field.to_string());
    out
}

/// First candidate naming a collection, exact match before case-insensitive
fn match_collection<'a, I>(field: &str, collections: I, exclude: Option<&str>) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    for candidate in candidates(field) {
        let allowed = |name: &&str| Some(*name) != exclude;
        let exact = collections
            .clone()
            .into_iter()
            .filter(allowed)
            .find(|name| *name == candidate);
        if exact.is_some() {
            return exact;
        }
        let folded = collections
            .clone()
            .into_iter()
            .filter(allowed)
            .find(|name| name.eq_ignore_ascii_case(&candidate));
        if folded.is_some() {
            return folded;
        }
    }
    None
}

/// Guess foreign-key edges between the collections of a schema map
///
/// At most one edge is kept per ordered (source, target) pair, from the
/// first field in field order.
pub fn infer_relationships(schema: &SchemaMap) -> Vec<RelationshipEdge> {
    let names = schema.keys().map(String::as_str);
    let mut seen = HashSet::new();
    let mut edges = Vec::new();

    for (collection, fields) in schema {
        for field in fields.keys().filter(|f| is_reference_field(f)) {
            let Some(target) = match_collection(field, names.clone(), Some(collection)) else {
                continue;
            };
            if seen.insert((collection.as_str(), target)) {
                edges.push(RelationshipEdge {
                    source: collection.clone(),
                    target: target.to_string(),
                    field: field.clone(),
                });
            }
        }
    }

    edges
}

/// Where a foreign-key cell points
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTarget {
    pub collection: String,
    pub filter: Document,
}

/// Resolve the collection and lookup filter for a reference value
///
/// Values that parse as an ObjectId are looked up as one; anything else
/// is matched as a plain string identifier.
pub fn resolve_link(field: &str, value: &str, collections: &[String]) -> Option<LinkTarget> {
    if !is_reference_field(field) {
        return None;
    }
    let target = match_collection(field, collections.iter().map(String::as_str), None)?;

    let id = match ObjectId::parse_str(value) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(value.to_string()),
    };
    Some(LinkTarget {
        collection: target.to_string(),
        filter: doc! { ID_FIELD: id },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn schema(entries: &[(&str, &[&str])]) -> SchemaMap {
        entries
            .iter()
            .map(|(coll, fields)| {
                let fields: BTreeMap<String, String> = fields
                    .iter()
                    .map(|f| (f.to_string(), "ObjectId".to_string()))
                    .collect();
                (coll.to_string(), fields)
            })
            .collect()
    }

    #[test]
    fn test_candidates() {
        assert_eq!(candidates("user_id"), vec!["user", "users", "useres", "user_id"]);
        assert_eq!(candidates("authorId"), vec!["author", "authors", "authores", "authorId"]);
        assert_eq!(candidates("id"), vec!["id"]);
    }

    #[test]
    fn test_orders_point_to_users() {
        let schema = schema(&[("orders", &["_id", "user_id"]), ("users", &["_id", "name"])]);
        let edges = infer_relationships(&schema);
        assert_eq!(
            edges,
            vec![RelationshipEdge {
                source: "orders".to_string(),
                target: "users".to_string(),
                field: "user_id".to_string(),
            }]
        );
    }

    #[test]
    fn test_es_plural_and_case_insensitive() {
        let schema = schema(&[("Addresses", &["_id"]), ("people", &["addressId"])]);
        let edges = infer_relationships(&schema);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, "Addresses");
    }

    #[test]
    fn test_no_self_edges() {
        let schema = schema(&[("users", &["_id", "user_id"])]);
        assert!(infer_relationships(&schema).is_empty());
    }

    #[test]
    fn test_one_edge_per_pair() {
        let schema = schema(&[
            ("orders", &["buyer_user_id", "user_id", "userId"]),
            ("users", &["_id"]),
        ]);
        let edges = infer_relationships(&schema);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].field, "userId");
    }

    #[test]
    fn test_unmatched_fields_ignored() {
        let schema = schema(&[("orders", &["paid", "warehouse_id"]), ("users", &["_id"])]);
        assert!(infer_relationships(&schema).is_empty());
    }

    #[test]
    fn test_resolve_link_object_id() {
        let collections = vec!["users".to_string(), "orders".to_string()];
        let hex = "64b7f0c2a1b2c3d4e5f60718";
        let link = resolve_link("user_id", hex, &collections).unwrap();
        assert_eq!(link.collection, "users");
        assert_eq!(
            link.filter,
            doc! { "_id": ObjectId::parse_str(hex).unwrap() }
        );
    }

    #[test]
    fn test_resolve_link_string_id() {
        let collections = vec!["users".to_string()];
        let link = resolve_link("userId", "u-42", &collections).unwrap();
        assert_eq!(link.filter, doc! { "_id": "u-42" });
    }

    #[test]
    fn test_resolve_link_non_reference() {
        let collections = vec!["users".to_string()];
        assert!(resolve_link("name", "Ann", &collections).is_none());
        assert!(resolve_link("_id", "x", &collections).is_none());
    }
}
