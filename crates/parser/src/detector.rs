//! Format detection
//!
//! Classifies raw text into one of the known source formats. Detection is
//! total: arbitrary input, including empty input, yields
//! [`SourceFormat::Unknown`] rather than an error.

use apiport_common::SourceFormat;
use serde_json::Value;

/// Detect the source format of `text`
///
/// Checks run in order and the first match wins:
/// 1. a `curl` command
/// 2. JSON documents, by their marker fields
/// 3. YAML-looking OpenAPI/Swagger text (substring heuristic only)
pub fn detect(text: &str) -> SourceFormat {
    if looks_like_curl(text) {
        return SourceFormat::Curl;
    }

    match serde_json::from_str::<Value>(text) {
        Ok(value) => detect_json(&value),
        Err(_) => {
            if text.contains("openapi:") || text.contains("swagger:") || text.contains("paths:") {
                SourceFormat::OpenApi
            } else {
                SourceFormat::Unknown
            }
        }
    }
}

fn looks_like_curl(text: &str) -> bool {
    let trimmed = text.trim();
    let Some(prefix) = trimmed.get(..4) else {
        return false;
    };
    if !prefix.eq_ignore_ascii_case("curl") {
        return false;
    }
    // "curl" alone, or followed by whitespace
    trimmed[4..]
        .chars()
        .next()
        .map_or(true, char::is_whitespace)
}

fn detect_json(value: &Value) -> SourceFormat {
    if value.get("_type").and_then(Value::as_str) == Some("export")
        && value.get("__export_format").is_some()
    {
        return SourceFormat::Insomnia;
    }

    let is_postman_collection = value
        .get("info")
        .and_then(|info| info.get("schema"))
        .and_then(Value::as_str)
        .is_some_and(|schema| schema.contains("postman"));
    if is_postman_collection {
        return SourceFormat::Postman;
    }

    if is_postman_environment(value) {
        return SourceFormat::Postman;
    }

    if let Some(log) = value.get("log") {
        if log.get("version").is_some() && log.get("entries").is_some() {
            return SourceFormat::Har;
        }
    }

    if value.get("openapi").is_some() || value.get("swagger").is_some() {
        return SourceFormat::OpenApi;
    }

    SourceFormat::Unknown
}

/// A Postman environment (or globals) document: `name` plus a `values` array
pub(crate) fn is_postman_environment(value: &Value) -> bool {
    value.get("name").is_some() && value.get("values").is_some_and(Value::is_array)
}
