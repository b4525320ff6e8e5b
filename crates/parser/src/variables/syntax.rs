//! Detection and conversion of interpolation syntax, secret classification

use crate::regex_util::static_regex;
use apiport_common::VariableType;
use regex::Regex;
use std::fmt;

static_regex!(fn double_brace_pattern, r"\{\{\s*([^{}\s]+)\s*\}\}");
static_regex!(fn dollar_brace_pattern, r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}");
static_regex!(fn dollar_pattern, r"\$([A-Z_][A-Z0-9_]*)\b");
static_regex!(fn colon_pattern, r"(^|/):([A-Za-z_][A-Za-z0-9_]*)");
static_regex!(
    fn secret_pattern,
    r"(?i)api[_-]?key|password|secret|token|auth|credential|private[_-]?key|access[_-]?key|bearer"
);

/// Interpolation dialects, in detection priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableSyntax {
    /// `{{name}}`, the canonical form
    DoubleBrace,
    /// `${NAME}`
    DollarBrace,
    /// `$NAME` (upper case, digits and underscores only)
    Dollar,
    /// `:name` as a URL path segment
    Colon,
}

impl VariableSyntax {
    fn pattern(&self) -> &'static Regex {
        match self {
            VariableSyntax::DoubleBrace => double_brace_pattern(),
            VariableSyntax::DollarBrace => dollar_brace_pattern(),
            VariableSyntax::Dollar => dollar_pattern(),
            VariableSyntax::Colon => colon_pattern(),
        }
    }
}

impl fmt::Display for VariableSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let example = match self {
            VariableSyntax::DoubleBrace => "{{var}}",
            VariableSyntax::DollarBrace => "${VAR}",
            VariableSyntax::Dollar => "$VAR",
            VariableSyntax::Colon => ":var",
        };
        f.write_str(example)
    }
}

/// Detect which interpolation syntax `text` uses
///
/// Patterns are tried in a fixed priority order and the first that matches
/// wins, so text mixing `{{a}}` and `$B` reports [`VariableSyntax::DoubleBrace`].
pub fn detect_variable_syntax(text: &str) -> Option<VariableSyntax> {
    [
        VariableSyntax::DoubleBrace,
        VariableSyntax::DollarBrace,
        VariableSyntax::Dollar,
        VariableSyntax::Colon,
    ]
    .into_iter()
    .find(|syntax| syntax.pattern().is_match(text))
}

/// Rewrite references written in `from` syntax into `to` syntax
///
/// Only conversion into the canonical double-brace form is supported; any
/// other target returns the text unchanged.
pub fn convert_variable_syntax(text: &str, from: VariableSyntax, to: VariableSyntax) -> String {
    if to != VariableSyntax::DoubleBrace || from == VariableSyntax::DoubleBrace {
        return text.to_string();
    }

    let replacement = match from {
        VariableSyntax::Colon => "${1}{{${2}}}",
        _ => "{{${1}}}",
    };
    from.pattern().replace_all(text, replacement).into_owned()
}

/// Whether a variable name looks like it holds a credential
pub fn is_secret_name(name: &str) -> bool {
    secret_pattern().is_match(name)
}

/// Classify a variable by its name
pub fn classify_variable(name: &str) -> VariableType {
    if is_secret_name(name) {
        VariableType::Secret
    } else {
        VariableType::Text
    }
}

/// Names referenced with canonical `{{name}}` syntax, in order of first use
///
/// Dynamic variables (names starting with `$`) are excluded.
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in double_brace_pattern().captures_iter(text) {
        let name = &caps[1];
        if name.starts_with('$') || names.iter().any(|n| n == name) {
            continue;
        }
        names.push(name.to_string());
    }
    names
}
