//! Helper functions for BSON value conversion
//!
//! Quoting and escaping primitives shared by the converters and writers.

use mongodb::bson::{Binary, Bson, DateTime};

/// Convert DateTime to ISO 8601 string
///
/// Dates outside the RFC 3339 range fall back to epoch milliseconds.
pub fn datetime_to_iso_string(dt: &DateTime) -> String {
    dt.try_to_rfc3339_string()
        .unwrap_or_else(|_| format!("{}", dt.timestamp_millis()))
}

/// Convert Binary data to hexadecimal string
pub fn binary_to_hex(bin: &Binary) -> String {
    hex::encode(&bin.bytes)
}

/// Render a value as compact relaxed extended JSON text
///
/// This is the canonical text form used for nested values in SQL and CSV
/// output, and for every document in JSON exports.
pub fn to_extended_json(value: &Bson) -> String {
    value.clone().into_relaxed_extjson().to_string()
}

/// Quote a string as a SQL literal, doubling embedded single quotes
pub fn quote_sql_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quote a SQL identifier, doubling embedded double quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Escape a CSV value if necessary
///
/// Values containing a delimiter, quote or line break are wrapped in quotes
/// with internal quotes doubled.
pub fn escape_csv_value(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
