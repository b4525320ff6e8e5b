//! Parsing of API collection exports
//!
//! This crate turns exports from other API tools into the canonical model
//! defined in `apiport-common`.
//!
//! ## Supported Inputs
//! - Postman collections (v2.0 / v2.1), environments and globals
//! - Insomnia v4 exports
//! - OpenAPI 3.x and Swagger 2.0 (JSON)
//! - cURL commands, one or many
//! - HAR (detected, not converted)
//!
//! ## Pipeline
//! 1. [`detect`] sniffs the input format (or a hint overrides it)
//! 2. a [`FormatParser`] from the [`ParserRegistry`] converts the input
//! 3. [`Importer`] normalizes variable names, maps collection variables
//!    to an environment and validates references
//!
//! ## Usage
//! ```rust,ignore
//! use apiport_parser::import_file;
//!
//! let result = import_file(&text, None)?;
//! for warning in &result.warnings {
//!     println!("{}", warning);
//! }
//! ```

pub mod curl;
pub mod detector;
pub mod har;
pub mod importer;
pub mod insomnia;
pub mod openapi;
pub mod postman;
pub mod variables;

mod regex_util;

pub use detector::detect;
pub use importer::{
    import_file, FormatParser, ImportData, ImportKind, ImportResult, Importer, ParserId,
    ParserRegistry,
};
