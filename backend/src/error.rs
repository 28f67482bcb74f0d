//! Error types for the Salesload ingestion pipeline.
//!
//! This module defines the error hierarchy used across the crate:
//!
//! - [`DecodeError`] - Payload could not be decoded in its declared kind
//! - [`SchemaError`] - Decoded table does not carry the expected columns
//! - [`IngestError`] - Top-level upload orchestration errors
//! - [`ExportError`] - Export and template generation errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Decoding Errors
// =============================================================================

/// Errors while turning raw file bytes into a flat table or JSON object.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload does not parse as the declared kind.
    #[error("Invalid {kind} payload: {message}")]
    Format { kind: &'static str, message: String },

    /// The file extension is neither structured text nor a spreadsheet.
    #[error("Unsupported file type '{0}', expected .json, .xlsx, .xls or .csv")]
    UnsupportedKind(String),

    /// Failed to read the file from disk.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    pub fn format(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Format {
            kind,
            message: message.into(),
        }
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors raised while resolving the header row of a flat table.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// One or more required columns are absent from the header row.
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

// =============================================================================
// Ingest Errors (top-level)
// =============================================================================

/// Top-level upload errors.
///
/// Every variant leaves the current dashboard model untouched.
#[derive(Debug, Error)]
pub enum IngestError {
    /// No file was supplied with the upload.
    #[error("No file selected, please choose a file first")]
    MissingInput,

    /// Decoding error.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Header resolution error.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The transformed model could not be converted to its JSON form.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while exporting the current model or generating a template.
#[derive(Debug, Error)]
pub enum ExportError {
    /// There is no current model to export.
    #[error("No data to export")]
    NoData,

    /// Spreadsheet writer error.
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for ingest operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // DecodeError -> IngestError
        let decode_err = DecodeError::UnsupportedKind("pdf".into());
        let ingest_err: IngestError = decode_err.into();
        assert!(ingest_err.to_string().contains("pdf"));

        // SchemaError -> IngestError
        let schema_err = SchemaError::MissingColumns(vec!["Month".into(), "Orders".into()]);
        let ingest_err: IngestError = schema_err.into();
        assert!(ingest_err.to_string().contains("Month, Orders"));

        // io::Error -> ServerError
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let server_err: ServerError = io_err.into();
        assert!(server_err.to_string().contains("port taken"));
    }

    #[test]
    fn test_format_error_message() {
        let err = DecodeError::format("JSON", "expected value at line 1 column 1");
        let msg = err.to_string();
        assert!(msg.contains("JSON"));
        assert!(msg.contains("line 1 column 1"));
    }

    #[test]
    fn test_missing_input_message() {
        assert!(IngestError::MissingInput.to_string().contains("No file"));
    }
}
