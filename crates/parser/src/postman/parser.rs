//! Postman collection and environment loaders

use super::converter::{convert_collection, convert_environment};
use super::types::{PostmanCollection, PostmanEnvironment};
use crate::importer::{FormatParser, ImportData, ImportResult, ParserId};
use crate::variables::map_global_variables;
use apiport_common::{ApiportError, Environment, Result};
use serde_json::Value;
use tracing::debug;

const SUPPORTED_SCHEMAS: [&str; 2] = ["v2.0.0", "v2.1.0"];

/// Postman collection parser (schema v2.0 and v2.1)
pub struct PostmanParser {
    collection: PostmanCollection,
}

impl PostmanParser {
    /// Parse and validate a collection document
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = PostmanParser::from_json(&text)?;
    /// let result = parser.parse();
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ApiportError::Validation(format!("Invalid JSON: {}", e)))?;

        let schema = value
            .get("info")
            .and_then(|info| info.get("schema"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ApiportError::Validation(
                    "Invalid Postman collection: missing info.schema".to_string(),
                )
            })?;
        if !SUPPORTED_SCHEMAS.iter().any(|v| schema.contains(v)) {
            return Err(ApiportError::Validation(format!(
                "Unsupported Postman collection schema: {} (only v2.0.0 and v2.1.0 are supported)",
                schema
            )));
        }

        let collection: PostmanCollection = serde_json::from_value(value).map_err(|e| {
            ApiportError::Validation(format!("Invalid Postman collection: {}", e))
        })?;
        Ok(Self { collection })
    }

    /// Convert into the canonical model
    pub fn parse(&self) -> ImportResult {
        let (collection, warnings) = convert_collection(&self.collection);
        debug!(
            "Postman collection '{}': {} request(s), {} folder(s)",
            collection.name,
            collection.request_count(),
            collection.folder_count()
        );
        ImportResult::new(ImportData::Collection(collection)).with_warnings(warnings)
    }

    /// Get reference to the underlying document
    pub fn collection(&self) -> &PostmanCollection {
        &self.collection
    }
}

/// Postman environment (or globals) parser
pub struct PostmanEnvironmentParser {
    environment: PostmanEnvironment,
}

impl PostmanEnvironmentParser {
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ApiportError::Validation(format!("Invalid JSON: {}", e)))?;

        if !crate::detector::is_postman_environment(&value) {
            return Err(ApiportError::Validation(
                "Invalid Postman environment: expected 'name' and a 'values' array".to_string(),
            ));
        }

        let environment: PostmanEnvironment = serde_json::from_value(value).map_err(|e| {
            ApiportError::Validation(format!("Invalid Postman environment: {}", e))
        })?;
        Ok(Self { environment })
    }

    pub fn parse(&self) -> ImportResult {
        let variables = convert_environment(&self.environment);
        let environment = if self.environment.scope.as_deref() == Some("globals") {
            map_global_variables(&variables)
        } else {
            Environment::new(self.environment.name.as_str(), variables)
        };
        debug!(
            "Postman environment '{}': {} variable(s)",
            environment.name,
            environment.variables.len()
        );
        ImportResult::new(ImportData::Environment(environment))
    }
}

/// Registry entry for Postman collections
pub struct PostmanCollectionFormat;

impl FormatParser for PostmanCollectionFormat {
    fn id(&self) -> ParserId {
        ParserId::PostmanCollection
    }

    fn parse(&self, text: &str) -> Result<ImportResult> {
        Ok(PostmanParser::from_json(text)?.parse())
    }
}

/// Registry entry for Postman environments and globals
pub struct PostmanEnvironmentFormat;

impl FormatParser for PostmanEnvironmentFormat {
    fn id(&self) -> ParserId {
        ParserId::PostmanEnvironment
    }

    fn parse(&self, text: &str) -> Result<ImportResult> {
        Ok(PostmanEnvironmentParser::from_json(text)?.parse())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiport_common::VariableType;

    #[test]
    fn test_parse_minimal_collection() {
        let json = r#"{
            "info": {
                "name": "Minimal",
                "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
            },
            "item": []
        }"#;

        let parser = PostmanParser::from_json(json).unwrap();
        assert_eq!(parser.collection().info.name, "Minimal");
        let result = parser.parse();
        assert_eq!(result.collections()[0].request_count(), 0);
    }

    #[test]
    fn test_rejects_unsupported_schema() {
        let json = r#"{"info": {"name": "Old", "schema": "https://schema.getpostman.com/json/collection/v1.0.0/collection.json"}}"#;
        let err = PostmanParser::from_json(json).err().unwrap();
        assert!(err.to_string().contains("v1.0.0"));
    }

    #[test]
    fn test_rejects_invalid_json() {
        let err = PostmanParser::from_json("{not json").err().unwrap();
        assert!(err.to_string().starts_with("Invalid JSON"));
    }

    #[test]
    fn test_environment_values() {
        let json = r#"{
            "name": "Dev",
            "values": [
                {"key": "host", "value": "localhost"},
                {"key": "password", "value": "pw", "enabled": false},
                {"key": "session", "value": "s", "type": "secret"},
                {"key": "port", "value": 8080}
            ],
            "_postman_variable_scope": "environment"
        }"#;
        let result = PostmanEnvironmentParser::from_json(json).unwrap().parse();
        let ImportData::Environment(env) = result.data else {
            panic!("expected an environment");
        };
        assert_eq!(env.name, "Dev");
        assert!(env.variables[0].enabled);
        assert_eq!(env.variables[0].var_type, VariableType::Text);
        assert!(!env.variables[1].enabled);
        assert_eq!(env.variables[1].var_type, VariableType::Secret);
        assert_eq!(env.variables[2].var_type, VariableType::Secret);
        assert_eq!(env.variables[3].value, "8080");
    }

    #[test]
    fn test_globals_scope() {
        let json = r#"{"name": "My Workspace Globals", "values": [], "_postman_variable_scope": "globals"}"#;
        let result = PostmanEnvironmentParser::from_json(json).unwrap().parse();
        let ImportData::Environment(env) = result.data else {
            panic!("expected an environment");
        };
        assert_eq!(env.name, "Global Variables");
    }

    #[test]
    fn test_environment_requires_values() {
        assert!(PostmanEnvironmentParser::from_json(r#"{"name": "x"}"#).is_err());
    }
}
