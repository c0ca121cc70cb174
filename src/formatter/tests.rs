//! Tests for BSON conversion strategies

use super::helpers::*;
use super::*;
use mongodb::bson::{Binary, Bson, DateTime, doc, oid::ObjectId, spec::BinarySubtype};
use serde_json::json;

// ===== Helper Function Tests =====

#[test]
fn test_datetime_to_iso_string() {
    let dt = DateTime::from_millis(0);
    assert_eq!(datetime_to_iso_string(&dt), "1970-01-01T00:00:00Z");
}

#[test]
fn test_binary_to_hex() {
    let bin = Binary {
        subtype: BinarySubtype::Generic,
        bytes: vec![0x01, 0x02, 0x03, 0xff],
    };
    assert_eq!(binary_to_hex(&bin), "010203ff");
}

#[test]
fn test_quote_sql_string() {
    assert_eq!(quote_sql_string("plain"), "'plain'");
    assert_eq!(quote_sql_string("O'Brien"), "'O''Brien'");
    assert_eq!(quote_sql_string("''"), "''''''");
}

#[test]
fn test_quote_identifier() {
    assert_eq!(quote_identifier("users"), "\"users\"");
    assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
}

#[test]
fn test_escape_csv_value() {
    assert_eq!(escape_csv_value("simple"), "simple");
    assert_eq!(escape_csv_value("with,comma"), "\"with,comma\"");
    assert_eq!(escape_csv_value("with\"quote"), "\"with\"\"quote\"");
    assert_eq!(escape_csv_value("with\nnewline"), "\"with\nnewline\"");
}

// ===== SQL Literal Tests =====

#[test]
fn test_sql_null_and_missing() {
    let conv = SqlLiteralConverter::new();
    assert_eq!(conv.convert(&Bson::Null), "NULL");
    assert_eq!(conv.convert_optional(None), "NULL");
}

#[test]
fn test_sql_booleans() {
    let conv = SqlLiteralConverter::new();
    assert_eq!(conv.convert(&Bson::Boolean(true)), "TRUE");
    assert_eq!(conv.convert(&Bson::Boolean(false)), "FALSE");
}

#[test]
fn test_sql_scalars_are_quoted() {
    let conv = SqlLiteralConverter::new();
    assert_eq!(conv.convert(&Bson::Int32(42)), "'42'");
    assert_eq!(conv.convert(&Bson::Int64(-7)), "'-7'");
    assert_eq!(conv.convert(&Bson::Double(2.5)), "'2.5'");
    assert_eq!(conv.convert(&Bson::String("it's".into())), "'it''s'");
}

#[test]
fn test_sql_object_id_and_datetime() {
    let conv = SqlLiteralConverter::new();
    let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
    assert_eq!(
        conv.convert(&Bson::ObjectId(oid)),
        "'507f1f77bcf86cd799439011'"
    );
    assert_eq!(
        conv.convert(&Bson::DateTime(DateTime::from_millis(0))),
        "'1970-01-01T00:00:00Z'"
    );
}

#[test]
fn test_sql_containers_are_json_with_escaped_quotes() {
    let conv = SqlLiteralConverter::new();
    let value = Bson::Document(doc! { "note": "don't", "n": 1 });
    assert_eq!(conv.convert(&value), r#"'{"note":"don''t","n":1}'"#);

    let array = Bson::Array(vec![Bson::Int32(1), Bson::String("a".into())]);
    assert_eq!(conv.convert(&array), r#"'[1,"a"]'"#);
}

// ===== Plain Text Tests =====

#[test]
fn test_plain_text_scalars() {
    let conv = PlainTextConverter::new();
    assert_eq!(conv.convert(&Bson::String("x".into())), "x");
    assert_eq!(conv.convert(&Bson::Boolean(true)), "true");
    assert_eq!(conv.convert(&Bson::Null), "");
    assert_eq!(conv.convert_optional(None), "");
}

#[test]
fn test_plain_text_nested_is_json() {
    let conv = PlainTextConverter::new();
    let value = Bson::Document(doc! { "city": "Oslo" });
    assert_eq!(conv.convert(&value), r#"{"city":"Oslo"}"#);
}

// ===== Extended JSON Tests =====

#[test]
fn test_extended_json_keeps_object_id() {
    let conv = ExtendedJsonConverter::new();
    let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
    let value = conv.convert_document(&doc! { "_id": oid, "n": 3 });
    assert_eq!(
        value,
        json!({ "_id": { "$oid": "507f1f77bcf86cd799439011" }, "n": 3 })
    );
}
