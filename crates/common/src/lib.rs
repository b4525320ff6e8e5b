//! Common types and utilities for apiport
//!
//! This crate contains the canonical collection model that every importer
//! writes into and every exporter reads from, together with the warning
//! records, the format registry and the shared error type.

pub mod format;
pub mod model;
pub mod url;
pub mod warning;

pub use format::{get_supported_formats, ExportFormat, FormatInfo, SourceFormat};
pub use model::{
    ApiKeyLocation, Auth, Body, Collection, Environment, FieldKind, Folder, KeyValue, OAuth2Auth,
    Request, Variable, VariableType,
};
pub use warning::{ImportWarning, WarningKind};

use thiserror::Error;

/// Errors that can occur while importing or exporting a collection
#[derive(Error, Debug)]
pub enum ApiportError {
    /// Malformed input, missing required fields or an unsupported version.
    /// The message is meant to be shown to the user as-is.
    #[error("{0}")]
    Validation(String),

    /// A known input shape whose support is deliberately not implemented
    #[error("{0}")]
    UnsupportedFeature(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for import and export operations
pub type Result<T> = std::result::Result<T, ApiportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = ApiportError::Validation("Missing info.schema".to_string());
        assert_eq!(err.to_string(), "Missing info.schema");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ApiportError = json_err.into();
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
