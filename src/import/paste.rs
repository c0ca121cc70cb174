//! Pasted text and CSV decoding
//!
//! Pasted text is tried as JSON first (a document or a list of documents)
//! and read as CSV with a header row otherwise. CSV cells made only of
//! digits become integers and `true` / `false` become booleans.

use mongodb::bson::{Bson, Document};

use super::readers::{json_to_document, json_value_to_documents};
use crate::error::{ParseError, Result};

/// Split CSV text into records
///
/// Quoted fields may contain the delimiter, doubled quotes and line
/// breaks. Unquoted fields are trimmed. Blank lines are skipped.
pub fn parse_csv_records(text: &str, delimiter: char) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut line = 1usize;
    let mut chars = text.chars().peekable();

    let finish_field = |current: &mut String, quoted: &mut bool, record: &mut Vec<String>| {
        let value = if *quoted {
            std::mem::take(current)
        } else {
            let trimmed = current.trim().to_string();
            current.clear();
            trimmed
        };
        record.push(value);
        *quoted = false;
    };

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    // Escaped quote
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                if c == '\n' {
                    line += 1;
                }
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
            quoted = true;
        } else if c == delimiter {
            finish_field(&mut current, &mut quoted, &mut record);
        } else if c == '\r' && chars.peek() == Some(&'\n') {
            // CRLF: the newline closes the record
        } else if c == '\n' {
            finish_field(&mut current, &mut quoted, &mut record);
            if !(record.len() == 1 && record[0].is_empty()) {
                records.push(std::mem::take(&mut record));
            }
            record.clear();
            line += 1;
        } else {
            current.push(c);
        }
    }

    if in_quotes {
        return Err(ParseError::InvalidCsv {
            line,
            message: "unterminated quoted field".to_string(),
        }
        .into());
    }

    finish_field(&mut current, &mut quoted, &mut record);
    if !(record.len() == 1 && record[0].is_empty()) {
        records.push(record);
    }
    Ok(records)
}

/// Coerce a CSV cell: digits to an integer, true/false to a boolean
pub fn coerce_cell(cell: &str) -> Bson {
    if !cell.is_empty() && cell.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = cell.parse::<i64>() {
            return if let Ok(small) = i32::try_from(n) {
                Bson::Int32(small)
            } else {
                Bson::Int64(n)
            };
        }
    }
    if cell.eq_ignore_ascii_case("true") {
        return Bson::Boolean(true);
    }
    if cell.eq_ignore_ascii_case("false") {
        return Bson::Boolean(false);
    }
    Bson::String(cell.to_string())
}

/// Decode CSV text with a header row into documents
///
/// Rows shorter than the header get nulls for the missing cells; extra
/// cells are ignored.
pub fn parse_csv(text: &str) -> Result<Vec<Document>> {
    let mut records = parse_csv_records(text, ',')?.into_iter();
    let headers = match records.next() {
        Some(headers) if headers.iter().any(|h| !h.is_empty()) => headers,
        _ => return Ok(Vec::new()),
    };

    let docs = records
        .map(|row| {
            let mut doc = Document::new();
            for (i, header) in headers.iter().enumerate() {
                let value = row.get(i).map(|cell| coerce_cell(cell)).unwrap_or(Bson::Null);
                doc.insert(header.clone(), value);
            }
            doc
        })
        .collect();
    Ok(docs)
}

/// Turn pasted text into documents
///
/// Nothing is inserted here; the caller inserts the whole result or
/// nothing.
pub fn parse_pasted(text: &str) -> Result<Vec<Document>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::EmptyInput.into());
    }

    let docs = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value @ serde_json::Value::Array(_)) => json_value_to_documents(value)?,
        Ok(value @ serde_json::Value::Object(_)) => vec![json_to_document(value)?],
        Ok(_) => Vec::new(),
        Err(_) => parse_csv(text).unwrap_or_default(),
    };

    if docs.is_empty() {
        return Err(ParseError::UnrecognizedFormat.into());
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MongoportError;
    use mongodb::bson::{doc, oid::ObjectId};

    #[test]
    fn test_paste_json_array() {
        let docs = parse_pasted(r#"[{"a": 1}, {"b": "x"}]"#).unwrap();
        assert_eq!(docs, vec![doc! { "a": 1 }, doc! { "b": "x" }]);
    }

    #[test]
    fn test_paste_json_object_with_extended_types() {
        let docs = parse_pasted(r#" {"_id": {"$oid": "64b7f0c2a1b2c3d4e5f60718"}} "#).unwrap();
        assert_eq!(
            docs[0].get_object_id("_id").unwrap(),
            ObjectId::parse_str("64b7f0c2a1b2c3d4e5f60718").unwrap()
        );
    }

    #[test]
    fn test_paste_csv_coercion() {
        let docs = parse_pasted("name,age,active,zip\nAnn,31,TRUE,-5\nBob,007,false,1.5").unwrap();
        assert_eq!(
            docs,
            vec![
                doc! { "name": "Ann", "age": 31, "active": true, "zip": "-5" },
                doc! { "name": "Bob", "age": 7, "active": false, "zip": "1.5" },
            ]
        );
    }

    #[test]
    fn test_paste_empty() {
        let err = parse_pasted("   \n ").unwrap_err();
        assert!(matches!(err, MongoportError::Parse(ParseError::EmptyInput)));
    }

    #[test]
    fn test_paste_neither_json_nor_csv() {
        // a header with no rows
        let err = parse_pasted("just one line").unwrap_err();
        assert_eq!(err.to_string(), "Could not detect valid JSON or CSV data");

        let err = parse_pasted("42").unwrap_err();
        assert!(matches!(err, MongoportError::Parse(ParseError::UnrecognizedFormat)));

        let err = parse_pasted("[]").unwrap_err();
        assert!(matches!(err, MongoportError::Parse(ParseError::UnrecognizedFormat)));
    }

    #[test]
    fn test_csv_records_quoting() {
        let records =
            parse_csv_records("a,b\r\n\"x, y\",\"say \"\"hi\"\"\"\r\n\"multi\nline\", z \r\n\r\n", ',')
                .unwrap();
        assert_eq!(
            records,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["x, y".to_string(), "say \"hi\"".to_string()],
                vec!["multi\nline".to_string(), "z".to_string()],
            ]
        );
    }

    #[test]
    fn test_csv_unterminated_quote() {
        let err = parse_csv_records("a\n\"open", ',').unwrap_err();
        assert!(matches!(
            err,
            MongoportError::Parse(ParseError::InvalidCsv { line: 2, .. })
        ));
    }

    #[test]
    fn test_short_rows_get_nulls() {
        let docs = parse_csv("a,b\n1").unwrap();
        assert_eq!(docs, vec![doc! { "a": 1, "b": Bson::Null }]);
    }
}
