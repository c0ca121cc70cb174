//! BSON value conversion for export output
//!
//! The module uses a strategy pattern with a common trait `BsonConverter`
//! so each writer picks the escaping rules of its format:
//! - `SqlLiteralConverter` for SQL scripts
//! - `PlainTextConverter` for CSV cells
//! - `ExtendedJsonConverter` for JSON documents

mod converter;
pub mod helpers;
mod strategies;

pub use converter::BsonConverter;
pub use strategies::{ExtendedJsonConverter, PlainTextConverter, SqlLiteralConverter};

#[cfg(test)]
mod tests;
