//! Core converter trait for BSON value conversion
//!
//! Every output format that needs a textual or JSON rendering of a BSON
//! value implements this trait with its own escaping rules.

use mongodb::bson::{Bson, Document};

/// Core trait for BSON value conversion
///
/// This trait allows different conversion strategies to be implemented
/// for the export formats (SQL literals, CSV cells, extended JSON).
pub trait BsonConverter {
    /// Output type of the conversion
    type Output;

    /// Convert a BSON value to the output type
    fn convert(&self, value: &Bson) -> Self::Output;

    /// Convert an optional BSON value
    ///
    /// Missing values map to the output type's default.
    fn convert_optional(&self, value: Option<&Bson>) -> Self::Output
    where
        Self::Output: Default,
    {
        value.map(|v| self.convert(v)).unwrap_or_default()
    }

    /// Convert a whole BSON document
    fn convert_document(&self, doc: &Document) -> Self::Output {
        self.convert(&Bson::Document(doc.clone()))
    }
}
