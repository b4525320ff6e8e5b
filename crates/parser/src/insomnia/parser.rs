//! Insomnia export loader

use super::converter::convert_resources;
use super::types::{InsomniaExport, Resource};
use crate::importer::{FormatParser, ImportData, ImportResult, ParserId};
use apiport_common::{ApiportError, Result};
use tracing::debug;

const SUPPORTED_EXPORT_FORMAT: i64 = 4;

/// Insomnia v4 export parser
pub struct InsomniaParser {
    resources: Vec<Resource>,
}

impl InsomniaParser {
    /// Parse and validate an export document
    pub fn from_json(json: &str) -> Result<Self> {
        let export: InsomniaExport = serde_json::from_str(json)
            .map_err(|e| ApiportError::Validation(format!("Invalid Insomnia export: {}", e)))?;

        if export.export_type != "export" {
            return Err(ApiportError::Validation(format!(
                "Invalid Insomnia export: expected _type 'export', found '{}'",
                export.export_type
            )));
        }

        let version = export.export_format.as_ref().ok_or_else(|| {
            ApiportError::Validation("Invalid Insomnia export: missing __export_format".to_string())
        })?;
        if version.as_i64() != Some(SUPPORTED_EXPORT_FORMAT) {
            return Err(ApiportError::Validation(format!(
                "Unsupported Insomnia export format version: {} (only version 4 is supported)",
                version
            )));
        }

        let resources = export
            .resources
            .into_iter()
            .map(|value| {
                let id = value
                    .get("_id")
                    .and_then(|id| id.as_str())
                    .unwrap_or("?")
                    .to_string();
                Resource::from_value(value).map_err(|e| {
                    ApiportError::Validation(format!("Invalid Insomnia resource '{}': {}", id, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { resources })
    }

    /// Convert into the canonical model
    ///
    /// A single workspace yields one collection; several yield one each.
    pub fn parse(&self) -> ImportResult {
        let converted = convert_resources(&self.resources);
        debug!(
            "Insomnia export: {} collection(s), {} environment(s)",
            converted.collections.len(),
            converted.environments.len()
        );

        let mut collections = converted.collections;
        let data = if collections.len() == 1 {
            ImportData::Collection(collections.remove(0))
        } else {
            ImportData::Collections(collections)
        };

        ImportResult::new(data)
            .with_warnings(converted.warnings)
            .with_environments(converted.environments)
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }
}

/// Registry entry for Insomnia exports
pub struct InsomniaFormat;

impl FormatParser for InsomniaFormat {
    fn id(&self) -> ParserId {
        ParserId::Insomnia
    }

    fn parse(&self, text: &str) -> Result<ImportResult> {
        Ok(InsomniaParser::from_json(text)?.parse())
    }
}
