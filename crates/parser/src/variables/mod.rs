//! Variable syntax mapping
//!
//! Cross-cutting helpers for interpolation variables: detecting and
//! converting the syntax a source uses, classifying secrets, validating
//! which variables are used and defined, surfacing non-static constructs,
//! and normalizing variable names.
//!
//! ## Syntaxes
//! - `{{name}}`: canonical (Postman, Insomnia)
//! - `${NAME}`, `$NAME`: shell style, seen in pasted cURL commands
//! - `:name`: path-segment style, seen in route definitions
//!
//! ## Usage
//! ```rust
//! use apiport_parser::variables::{convert_variable_syntax, detect_variable_syntax, VariableSyntax};
//!
//! let url = "https://${HOST}/users";
//! let syntax = detect_variable_syntax(url).unwrap();
//! assert_eq!(syntax, VariableSyntax::DollarBrace);
//! assert_eq!(
//!     convert_variable_syntax(url, syntax, VariableSyntax::DoubleBrace),
//!     "https://{{HOST}}/users"
//! );
//! ```

mod naming;
mod syntax;
mod usage;

pub use naming::{
    map_collection_variables, map_global_variables, normalize_variable_name,
    normalize_variable_names,
};
pub use syntax::{
    classify_variable, convert_variable_syntax, detect_variable_syntax, extract_variables,
    is_secret_name, VariableSyntax,
};
pub use usage::{
    check_dynamic_variables, check_insomnia_template_tags, extract_used_variables,
    request_texts, validate_variables,
};
