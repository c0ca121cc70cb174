//! Strategy implementations for BSON conversion
//!
//! - PlainTextConverter: cell text for CSV output
//! - SqlLiteralConverter: escaped literals for SQL INSERT statements
//! - ExtendedJsonConverter: relaxed extended JSON values

use mongodb::bson::Bson;
use serde_json::Value as JsonValue;

use super::converter::BsonConverter;
use super::helpers::*;

/// Plain text converter for CSV cells
///
/// Scalars render as their natural text; documents and arrays render as
/// compact extended JSON so they survive a round trip through a cell.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextConverter;

impl PlainTextConverter {
    /// Create a new plain text converter
    pub fn new() -> Self {
        Self
    }
}

impl BsonConverter for PlainTextConverter {
    type Output = String;

    fn convert(&self, value: &Bson) -> String {
        match value {
            Bson::String(s) => s.clone(),
            Bson::Int32(n) => n.to_string(),
            Bson::Int64(n) => n.to_string(),
            Bson::Double(f) => f.to_string(),
            Bson::Boolean(b) => b.to_string(),
            Bson::Null | Bson::Undefined => String::new(),
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::DateTime(dt) => datetime_to_iso_string(dt),
            Bson::Decimal128(d) => d.to_string(),
            Bson::Binary(bin) => binary_to_hex(bin),
            Bson::RegularExpression(regex) => format!("/{}/{}", regex.pattern, regex.options),
            Bson::Timestamp(ts) => format!("Timestamp({}, {})", ts.time, ts.increment),
            Bson::Symbol(s) => s.clone(),
            Bson::JavaScriptCode(code) => code.clone(),
            other => to_extended_json(other),
        }
    }
}

/// SQL literal converter
///
/// Produces a value ready to be placed inside `VALUES (...)`:
/// - null becomes `NULL`
/// - booleans become `TRUE` / `FALSE`
/// - documents and arrays become quoted extended JSON
/// - datetimes become quoted ISO 8601 strings
/// - everything else becomes its quoted plain text
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlLiteralConverter {
    text: PlainTextConverter,
}

impl SqlLiteralConverter {
    /// Create a new SQL literal converter
    pub fn new() -> Self {
        Self::default()
    }
}

impl BsonConverter for SqlLiteralConverter {
    type Output = String;

    fn convert(&self, value: &Bson) -> String {
        match value {
            Bson::Null | Bson::Undefined => "NULL".to_string(),
            Bson::Boolean(true) => "TRUE".to_string(),
            Bson::Boolean(false) => "FALSE".to_string(),
            Bson::Document(_) | Bson::Array(_) => quote_sql_string(&to_extended_json(value)),
            Bson::DateTime(dt) => quote_sql_string(&datetime_to_iso_string(dt)),
            Bson::ObjectId(oid) => quote_sql_string(&oid.to_hex()),
            other => quote_sql_string(&self.text.convert(other)),
        }
    }

    fn convert_optional(&self, value: Option<&Bson>) -> String {
        match value {
            Some(v) => self.convert(v),
            None => "NULL".to_string(),
        }
    }
}

/// Relaxed extended JSON converter
///
/// Keeps ObjectIds, dates and other BSON-only types recoverable on import
/// (`{"$oid": ...}`, `{"$date": ...}`).
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtendedJsonConverter;

impl ExtendedJsonConverter {
    /// Create a new extended JSON converter
    pub fn new() -> Self {
        Self
    }
}

impl BsonConverter for ExtendedJsonConverter {
    type Output = JsonValue;

    fn convert(&self, value: &Bson) -> JsonValue {
        value.clone().into_relaxed_extjson()
    }
}
