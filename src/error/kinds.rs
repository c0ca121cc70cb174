use std::{fmt, io};

use crate::error::mongo::format_mongodb_error;

/// Crate-wide `Result` type using [`MongoportError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, MongoportError>;

/// Top-level error type for mongoport operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum MongoportError {
    /// Connection-related errors. Fatal to a whole job.
    Connection(ConnectionError),

    /// Malformed user input or undecodable file content.
    Parse(ParseError),

    /// Export/import execution errors.
    Execution(ExecutionError),

    /// Configuration errors.
    Config(ConfigError),

    /// Background job control errors.
    Job(JobError),

    /// I/O errors.
    Io(io::Error),

    /// MongoDB driver errors.
    MongoDb(mongodb::error::Error),

    /// JSON (de)serialization errors.
    Json(serde_json::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Connection-specific errors.
#[derive(Debug)]
pub enum ConnectionError {
    /// Failed to establish a connection.
    ConnectionFailed(String),

    /// Invalid connection URI.
    InvalidUri(String),

    /// The URI names no database and no fallback applies.
    MissingDatabase,

    /// Ping command failed.
    PingFailed(String),
}

/// Parsing-specific errors.
#[derive(Debug)]
pub enum ParseError {
    /// Invalid JSON text.
    InvalidJson(String),

    /// JSON was valid but not a document (or list of documents).
    NotADocument(String),

    /// Invalid BSON record.
    InvalidBson(String),

    /// Invalid CSV text.
    InvalidCsv { line: usize, message: String },

    /// Pasted text is empty.
    EmptyInput,

    /// Text is neither JSON nor CSV.
    UnrecognizedFormat,
}

/// Execution-specific errors.
#[derive(Debug)]
pub enum ExecutionError {
    /// File could not be created or written.
    OutputFailed(String),

    /// File extension has no importer.
    UnsupportedFormat(String),

    /// Invalid operation parameters.
    InvalidParameters(String),

    /// Cursor error.
    CursorError(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/// Background job errors.
#[derive(Debug)]
pub enum JobError {
    /// A job is already running in this session.
    Busy,

    /// The worker went away without a terminal message.
    WorkerLost(String),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for MongoportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MongoportError::Connection(e) => write!(f, "Connection error: {e}"),
            MongoportError::Parse(e) => write!(f, "{e}"),
            MongoportError::Execution(e) => write!(f, "Execution error: {e}"),
            MongoportError::Config(e) => write!(f, "Configuration error: {e}"),
            MongoportError::Job(e) => write!(f, "Job error: {e}"),
            MongoportError::Io(e) => write!(f, "I/O error: {e}"),
            MongoportError::MongoDb(e) => format_mongodb_error(f, e),
            MongoportError::Json(e) => write!(f, "JSON error: {e}"),
            MongoportError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::ConnectionFailed(msg) => write!(f, "Failed to connect: {msg}"),
            ConnectionError::InvalidUri(uri) => write!(f, "Invalid connection URI: {uri}"),
            ConnectionError::MissingDatabase => {
                write!(f, "Database name missing in connection string")
            }
            ConnectionError::PingFailed(msg) => write!(f, "Ping failed: {msg}"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidJson(msg) => write!(f, "Invalid JSON: {msg}"),
            ParseError::NotADocument(found) => {
                write!(f, "Expected a document or a list of documents, found {found}")
            }
            ParseError::InvalidBson(msg) => write!(f, "Invalid BSON: {msg}"),
            ParseError::InvalidCsv { line, message } => {
                write!(f, "Invalid CSV at line {line}: {message}")
            }
            ParseError::EmptyInput => write!(f, "Clipboard is empty"),
            ParseError::UnrecognizedFormat => {
                write!(f, "Could not detect valid JSON or CSV data")
            }
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::OutputFailed(msg) => write!(f, "Output failed: {msg}"),
            ExecutionError::UnsupportedFormat(ext) => {
                write!(f, "Unsupported file extension: {ext}")
            }
            ExecutionError::InvalidParameters(msg) => write!(f, "Invalid parameters: {msg}"),
            ExecutionError::CursorError(msg) => write!(f, "Cursor error: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::Busy => write!(f, "Background task running"),
            JobError::WorkerLost(msg) => write!(f, "Worker exited unexpectedly: {msg}"),
        }
    }
}

impl std::error::Error for MongoportError {}
impl std::error::Error for ConnectionError {}
impl std::error::Error for ParseError {}
impl std::error::Error for ExecutionError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for JobError {}

/* ========================= Conversions to MongoportError ========================= */

impl From<io::Error> for MongoportError {
    fn from(err: io::Error) -> Self {
        MongoportError::Io(err)
    }
}

impl From<mongodb::error::Error> for MongoportError {
    fn from(err: mongodb::error::Error) -> Self {
        MongoportError::MongoDb(err)
    }
}

impl From<serde_json::Error> for MongoportError {
    fn from(err: serde_json::Error) -> Self {
        MongoportError::Json(err)
    }
}

impl From<ConnectionError> for MongoportError {
    fn from(err: ConnectionError) -> Self {
        MongoportError::Connection(err)
    }
}

impl From<ParseError> for MongoportError {
    fn from(err: ParseError) -> Self {
        MongoportError::Parse(err)
    }
}

impl From<ExecutionError> for MongoportError {
    fn from(err: ExecutionError) -> Self {
        MongoportError::Execution(err)
    }
}

impl From<ConfigError> for MongoportError {
    fn from(err: ConfigError) -> Self {
        MongoportError::Config(err)
    }
}

impl From<JobError> for MongoportError {
    fn from(err: JobError) -> Self {
        MongoportError::Job(err)
    }
}

impl From<String> for MongoportError {
    fn from(msg: String) -> Self {
        MongoportError::Generic(msg)
    }
}

impl From<&str> for MongoportError {
    fn from(msg: &str) -> Self {
        MongoportError::Generic(msg.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_is_bare() {
        let err: MongoportError = ParseError::UnrecognizedFormat.into();
        assert_eq!(err.to_string(), "Could not detect valid JSON or CSV data");
    }

    #[test]
    fn test_connection_error_display() {
        let err: MongoportError = ConnectionError::MissingDatabase.into();
        assert_eq!(
            err.to_string(),
            "Connection error: Database name missing in connection string"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: MongoportError = io.into();
        assert!(matches!(err, MongoportError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }
}
