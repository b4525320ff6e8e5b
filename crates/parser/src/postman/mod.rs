//! Postman collection and environment parser
//!
//! Parses Postman collection exports (schema v2.0.0 and v2.1.0) and
//! environment or globals exports into the canonical model.
//!
//! ## Sources
//! - Collections: *Export* on a collection in the Postman app
//! - Environments: *Export* on an environment, or *Globals → Export*
//!
//! ## Usage
//! ```rust,ignore
//! use apiport_parser::postman::PostmanParser;
//!
//! let result = PostmanParser::from_json(&text)?.parse();
//! ```

mod converter;
mod parser;
mod types;

pub use parser::{
    PostmanCollectionFormat, PostmanEnvironmentFormat, PostmanEnvironmentParser, PostmanParser,
};
pub use types::*;
