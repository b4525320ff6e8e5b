//! OpenAPI / Swagger document loader

use super::converter::convert_spec;
use super::types::OpenApiSpec;
use crate::importer::{FormatParser, ImportData, ImportResult, ParserId};
use apiport_common::{ApiportError, Result};
use serde_json::Value;

/// OpenAPI 3.x and Swagger 2.0 parser (JSON documents only)
pub struct OpenApiParser {
    /// Loaded document
    spec: OpenApiSpec,
}

impl OpenApiParser {
    /// Parse a document from JSON text
    ///
    /// YAML input is recognised but not parsed.
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = OpenApiParser::from_json(&text)?;
    /// let result = parser.parse();
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = match serde_json::from_str(json) {
            Ok(value) => value,
            Err(e) if json.trim_start().starts_with('{') => {
                return Err(ApiportError::Validation(format!("Invalid JSON: {}", e)));
            }
            Err(_) => {
                return Err(ApiportError::UnsupportedFeature(
                    "OpenAPI/Swagger YAML requires additional parsing; please convert to JSON"
                        .to_string(),
                ));
            }
        };

        let openapi = value.get("openapi").and_then(Value::as_str);
        let swagger = value.get("swagger").and_then(Value::as_str);
        match (openapi, swagger) {
            (Some(version), _) if !version.starts_with('3') => {
                return Err(ApiportError::Validation(format!(
                    "Unsupported OpenAPI version: {} (only 3.x is supported)",
                    version
                )));
            }
            (None, Some(version)) if !version.starts_with('2') => {
                return Err(ApiportError::Validation(format!(
                    "Unsupported Swagger version: {} (only 2.0 is supported)",
                    version
                )));
            }
            (None, None) => {
                return Err(ApiportError::Validation(
                    "Invalid OpenAPI document: missing 'openapi' or 'swagger' version field"
                        .to_string(),
                ));
            }
            _ => {}
        }

        let spec: OpenApiSpec = serde_json::from_value(value).map_err(|e| {
            ApiportError::Validation(format!("Invalid OpenAPI document: {}", e))
        })?;
        Ok(Self { spec })
    }

    /// Convert into the canonical model
    pub fn parse(&self) -> ImportResult {
        let (collection, warnings) = convert_spec(&self.spec);
        ImportResult::new(ImportData::Collection(collection)).with_warnings(warnings)
    }

    /// Get reference to the underlying document
    pub fn spec(&self) -> &OpenApiSpec {
        &self.spec
    }
}

/// Registry entry for OpenAPI and Swagger documents
pub struct OpenApiFormat;

impl FormatParser for OpenApiFormat {
    fn id(&self) -> ParserId {
        ParserId::OpenApi
    }

    fn parse(&self, text: &str) -> Result<ImportResult> {
        Ok(OpenApiParser::from_json(text)?.parse())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_openapi() {
        let openapi_json = r#"{
            "openapi": "3.0.0",
            "info": {
                "title": "Test API",
                "version": "1.0.0"
            },
            "paths": {}
        }"#;

        let parser = OpenApiParser::from_json(openapi_json);
        assert!(parser.is_ok());

        let parser = parser.unwrap();
        assert_eq!(parser.spec().openapi.as_deref(), Some("3.0.0"));
        assert_eq!(parser.spec().info.title.as_deref(), Some("Test API"));

        let result = parser.parse();
        let collection = result.collections()[0];
        assert_eq!(collection.name, "Test API");
        assert_eq!(
            collection.variable("baseUrl").map(|v| v.value.as_str()),
            Some("https://api.example.com")
        );
    }

    #[test]
    fn test_yaml_is_unsupported() {
        let yaml = "openapi: 3.0.0\ninfo:\n  title: Pets\npaths: {}\n";
        let err = OpenApiParser::from_json(yaml).err().unwrap();
        assert!(matches!(err, ApiportError::UnsupportedFeature(_)));
        assert_eq!(
            err.to_string(),
            "OpenAPI/Swagger YAML requires additional parsing; please convert to JSON"
        );
    }

    #[test]
    fn test_missing_version_field() {
        let err = OpenApiParser::from_json(r#"{"info": {"title": "x"}}"#)
            .err()
            .unwrap();
        assert!(matches!(err, ApiportError::Validation(_)));
    }
}
