//! Error handling for mongoport.
//!
//! This module provides:
//! - A crate-wide error enum wrapping connection, parse, execution, config
//!   and job errors
//! - Single-line summaries of MongoDB driver errors for job log messages
//!
//! # Example
//!
//! ```rust,no_run
//! use mongoport::error::{ParseError, Result};
//!
//! fn check(text: &str) -> Result<()> {
//!     if text.trim().is_empty() {
//!         return Err(ParseError::EmptyInput.into());
//!     }
//!     Ok(())
//! }
//! ```

pub mod kinds;
pub mod mongo;

// Re-export commonly used types
pub use kinds::{
    ConfigError, ConnectionError, ExecutionError, JobError, MongoportError, ParseError, Result,
};
pub use mongo::{ErrorSummary, summarize};
