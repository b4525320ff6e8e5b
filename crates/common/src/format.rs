//! Source and export format identifiers plus the registry used by pickers

use crate::ApiportError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format of an artifact to import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Postman collection or environment JSON
    Postman,
    /// Insomnia workspace export JSON
    Insomnia,
    /// OpenAPI 3.x or Swagger 2.0
    OpenApi,
    /// Shell `curl` invocation(s)
    Curl,
    /// HTTP Archive, recognized but not importable
    Har,
    Unknown,
}

impl SourceFormat {
    pub fn id(&self) -> &'static str {
        match self {
            SourceFormat::Postman => "postman",
            SourceFormat::Insomnia => "insomnia",
            SourceFormat::OpenApi => "openapi",
            SourceFormat::Curl => "curl",
            SourceFormat::Har => "har",
            SourceFormat::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SourceFormat {
    type Err = ApiportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postman" => Ok(SourceFormat::Postman),
            "insomnia" => Ok(SourceFormat::Insomnia),
            "openapi" | "swagger" => Ok(SourceFormat::OpenApi),
            "curl" => Ok(SourceFormat::Curl),
            "har" => Ok(SourceFormat::Har),
            other => {
                let ids: Vec<&str> = get_supported_formats().iter().map(|f| f.id).collect();
                Err(ApiportError::Validation(format!(
                    "Unknown format '{}'. Supported formats: {}",
                    other,
                    ids.join(", ")
                )))
            }
        }
    }
}

/// Target of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Pretty-printed canonical JSON
    Native,
    /// Postman collection v2.1
    Postman,
    /// OpenAPI 3.0.3
    OpenApi,
    /// One `curl` command per request
    Curl,
}

impl ExportFormat {
    pub fn id(&self) -> &'static str {
        match self {
            ExportFormat::Native => "native",
            ExportFormat::Postman => "postman",
            ExportFormat::OpenApi => "openapi",
            ExportFormat::Curl => "curl",
        }
    }

    /// Conventional file extension for the exported text
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Native | ExportFormat::Postman | ExportFormat::OpenApi => "json",
            ExportFormat::Curl => "sh",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ExportFormat {
    type Err = ApiportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "apiport" => Ok(ExportFormat::Native),
            "postman" => Ok(ExportFormat::Postman),
            "openapi" => Ok(ExportFormat::OpenApi),
            "curl" => Ok(ExportFormat::Curl),
            other => Err(ApiportError::Validation(format!(
                "Unknown export format '{}'. Supported formats: native, postman, openapi, curl",
                other
            ))),
        }
    }
}

/// Registry entry describing an importable format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub extensions: &'static [&'static str],
    /// `false` for formats that are recognized but cannot be imported yet
    pub supported: bool,
}

static SUPPORTED_FORMATS: [FormatInfo; 5] = [
    FormatInfo {
        id: "postman",
        name: "Postman",
        description: "Postman Collection v2.0/v2.1 or Postman Environment",
        extensions: &[".json", ".postman_collection.json", ".postman_environment.json"],
        supported: true,
    },
    FormatInfo {
        id: "insomnia",
        name: "Insomnia",
        description: "Insomnia export (format version 4)",
        extensions: &[".json"],
        supported: true,
    },
    FormatInfo {
        id: "openapi",
        name: "OpenAPI / Swagger",
        description: "OpenAPI 3.x or Swagger 2.0 specification (JSON)",
        extensions: &[".json", ".yaml", ".yml"],
        supported: true,
    },
    FormatInfo {
        id: "curl",
        name: "cURL",
        description: "One or more curl commands",
        extensions: &[".sh", ".txt", ".curl"],
        supported: true,
    },
    FormatInfo {
        id: "har",
        name: "HAR",
        description: "HTTP Archive (not yet supported)",
        extensions: &[".har"],
        supported: false,
    },
];

/// Static registry of importable formats, for building format pickers
pub fn get_supported_formats() -> &'static [FormatInfo] {
    &SUPPORTED_FORMATS
}
