//! Caller-facing error types.
//!
//! Malformed schema input is never reported through these types; it lands in
//! the [`ErrorCollection`](crate::diagnostics::ErrorCollection) instead. This
//! module covers the failures around a parse run: file I/O and callers that
//! want a hard `Result` boundary once diagnostics contain errors.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors surrounding a schema parse run.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a schema file.
    #[error("failed to read schema file: {path}")]
    #[diagnostic(code(erd::schema::io_error))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The parse run produced error-severity diagnostics.
    #[error("schema validation failed with {count} error(s)")]
    #[diagnostic(code(erd::schema::validation_failed))]
    ValidationFailed { count: usize },

    /// The input exceeds the configured size cap.
    #[error("schema source is {len} bytes, which exceeds the limit of {max}")]
    #[diagnostic(code(erd::schema::source_too_large))]
    SourceTooLarge { len: usize, max: usize },
}
