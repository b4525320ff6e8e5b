//! cURL command parser
//!
//! Turns commands copied from a terminal or a browser's *Copy as cURL*
//! into requests. Input may hold one command or several separated by
//! newlines, `;`, `&&` or `|`.
//!
//! ## Option mapping
//! - `-X` → method; `-G`, `-I` and data flags pick a method when `-X` is absent
//! - `-H`, `-A`, `-e`, `-b` → headers
//! - `-d`, `--data-*` → body, or query string with `-G`
//! - `-F`, `--form-string` → multipart body
//! - `-u`, `--oauth2-bearer`, `Authorization:` → auth
//!
//! Transport options such as `-k` or `--max-time` are dropped with a note.
//!
//! ## Usage
//! ```rust,ignore
//! use apiport_parser::curl::CurlParser;
//!
//! let result = CurlParser::from_command("curl -X POST https://api.example.com/users")?.parse()?;
//! ```

mod converter;
mod parser;
mod tokenizer;

pub use converter::convert_command;
pub use parser::{
    count_commands, parse_command, parse_multi, parse_words, split_commands, CurlCommand,
    CurlFormat, CurlMultiFormat, CurlParser, DataKind, DataPart, FormPart, COLLECTION_NAME,
};
pub use tokenizer::tokenize;
