//! OpenAPI 3.x / Swagger 2.0 parser
//!
//! Turns an API description into a collection with one request per
//! path and method. Requests are grouped into folders by their first tag
//! and addressed relative to a `{{baseUrl}}` collection variable.
//!
//! ## Example values
//! Parameter values and request bodies come from literal examples when the
//! document has them and are synthesized from schemas otherwise. `$ref`
//! schemas are not resolved.
//!
//! ## Usage
//! ```rust,ignore
//! use apiport_parser::openapi::OpenApiParser;
//!
//! let parser = OpenApiParser::from_json(&text)?;
//! let result = parser.parse();
//! ```

mod converter;
mod example;
mod parser;
mod types;

pub use converter::{base_url, convert_path_template};
pub use example::{render_value, ExampleBuilder};
pub use parser::{OpenApiFormat, OpenApiParser};
pub use types::*;
