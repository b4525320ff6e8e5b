//! Export of canonical collections
//!
//! This crate serializes the `apiport-common` model into formats other
//! tools can read back.
//!
//! ## Targets
//! - `native`: the canonical model as pretty-printed JSON
//! - `postman`: Postman collection v2.1
//! - `openapi`: OpenAPI 3.0.3
//! - `curl`: one shell command per request
//!
//! Environments export in Postman environment format.
//!
//! ## Usage
//! ```rust,ignore
//! use apiport_common::ExportFormat;
//! use apiport_exporter::export_collection;
//!
//! let text = export_collection(&collection, ExportFormat::Postman)?;
//! ```

mod curl;
mod native;
mod openapi;
mod postman;

pub use curl::{request_to_curl, to_curl};
pub use native::to_native;
pub use openapi::to_openapi;
pub use postman::{environment_to_postman, to_postman};

use apiport_common::{Collection, Environment, ExportFormat, Result};
use tracing::debug;

/// Serialize a collection into the given format
pub fn export_collection(collection: &Collection, format: ExportFormat) -> Result<String> {
    debug!(
        "Exporting '{}' ({} request(s)) as {}",
        collection.name,
        collection.request_count(),
        format
    );
    match format {
        ExportFormat::Native => to_native(collection),
        ExportFormat::Postman => to_postman(collection),
        ExportFormat::OpenApi => to_openapi(collection),
        ExportFormat::Curl => Ok(to_curl(collection)),
    }
}

/// Serialize an environment as a Postman environment document
pub fn export_environment(environment: &Environment) -> Result<String> {
    environment_to_postman(environment)
}
