use std::fmt;

use serde::Serialize;

/// Condensed view of a MongoDB driver error.
///
/// Job workers report failures as single log lines, so the driver's nested
/// error kinds are flattened into an optional code, a symbolic name and a
/// message.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub message: String,
}

impl fmt::Display for ErrorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.name) {
            (Some(code), Some(name)) => write!(f, "[{code} {name}] {}", self.message),
            (Some(code), None) => write!(f, "[{code}] {}", self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Format a MongoDB error as a single line.
///
/// Used by the parent module's `Display` implementation for
/// `MongoportError::MongoDb`.
pub fn format_mongodb_error(
    f: &mut fmt::Formatter<'_>,
    error: &mongodb::error::Error,
) -> fmt::Result {
    write!(f, "MongoDB error: {}", summarize(error))
}

/// Extract code, name and message from a MongoDB error using the driver API.
pub fn summarize(error: &mongodb::error::Error) -> ErrorSummary {
    use mongodb::error::{ErrorKind, WriteFailure};

    let (code, message) = match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            (Some(write_error.code), write_error.message.clone())
        }
        ErrorKind::Write(WriteFailure::WriteConcernError(wc_error)) => {
            (Some(wc_error.code), wc_error.message.clone())
        }
        ErrorKind::Command(command_error) => {
            (Some(command_error.code), command_error.message.clone())
        }
        ErrorKind::InsertMany(insert_error) => {
            let first = insert_error
                .write_errors
                .as_ref()
                .and_then(|errors| errors.first())
                .map(|e| (Some(e.code), e.message.clone()));
            match first {
                Some(found) => found,
                None => match &insert_error.write_concern_error {
                    Some(wc_error) => (Some(wc_error.code), wc_error.message.clone()),
                    None => (None, error.to_string()),
                },
            }
        }
        ErrorKind::Authentication { message, .. } => (None, message.clone()),
        ErrorKind::InvalidArgument { message, .. } => (None, message.clone()),
        ErrorKind::ServerSelection { message, .. } => (None, message.clone()),
        _ => (None, error.to_string()),
    };

    let name = code.and_then(error_name);
    let message = match code {
        // the server message repeats the key pattern at length
        Some(11000) | Some(11001) => "Duplicate key error".to_string(),
        Some(121) => "Data violates schema validation rules".to_string(),
        _ => message,
    };

    ErrorSummary {
        code,
        name,
        message,
    }
}

/// Get a human-readable error name from a MongoDB error code.
fn error_name(code: i32) -> Option<String> {
    let name = match code {
        11000 | 11001 => "DuplicateKey",
        13 => "Unauthorized",
        18 => "AuthenticationFailed",
        26 => "NamespaceNotFound",
        50 => "MaxTimeMSExpired",
        121 => "DocumentValidationFailure",
        _ => return None,
    };

    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_name_known_codes() {
        assert_eq!(error_name(11000).as_deref(), Some("DuplicateKey"));
        assert_eq!(error_name(121).as_deref(), Some("DocumentValidationFailure"));
        assert_eq!(error_name(9999), None);
    }

    #[test]
    fn test_summary_display() {
        let summary = ErrorSummary {
            code: Some(13),
            name: Some("Unauthorized".into()),
            message: "not authorized on db".into(),
        };
        assert_eq!(summary.to_string(), "[13 Unauthorized] not authorized on db");

        let bare = ErrorSummary {
            code: None,
            name: None,
            message: "timed out".into(),
        };
        assert_eq!(bare.to_string(), "timed out");
    }
}
