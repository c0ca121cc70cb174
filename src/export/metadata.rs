//! Metadata field policy

use mongodb::bson::Document;

/// Document identifier field
pub const ID_FIELD: &str = "_id";

/// ODM version key
pub const VERSION_FIELD: &str = "__v";

/// Remove the identifier and version fields from a document
///
/// Applying it twice is the same as applying it once.
pub fn strip_metadata(doc: &mut Document) {
    doc.remove(ID_FIELD);
    doc.remove(VERSION_FIELD);
}

/// Apply the metadata policy to a batch
pub fn apply_policy(docs: &mut [Document], include_metadata: bool) {
    if include_metadata {
        return;
    }
    for doc in docs.iter_mut() {
        strip_metadata(doc);
    }
}
