//! Insomnia export parser
//!
//! Parses Insomnia v4 exports (*Application → Preferences → Data → Export*)
//! into canonical collections and environments.
//!
//! ## Resource mapping
//! - `workspace` → Collection
//! - `request_group` → Folder
//! - `request` → Request
//! - `environment` → Environment
//!
//! Other resource types are skipped with a warning.
//!
//! ## Usage
//! ```rust,ignore
//! use apiport_parser::insomnia::InsomniaParser;
//!
//! let result = InsomniaParser::from_json(&text)?.parse();
//! ```

mod converter;
mod parser;
mod types;

pub use converter::rewrite_variables;
pub use parser::{InsomniaFormat, InsomniaParser};
pub use types::*;
