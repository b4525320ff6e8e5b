//! Non-fatal import warnings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an import warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A variable is referenced but never defined
    UndefinedVariable,
    /// A variable is defined but never referenced
    UnusedVariable,
    /// A runtime-generated placeholder such as `{{$guid}}`
    DynamicVariable,
    /// An Insomnia `{% tag %}` with no static value
    TemplateTag,
    /// A value pulled from another request's response
    ChainedRequest,
    /// Source content that has no canonical counterpart and was skipped
    UnsupportedFeature,
    VariableRenamed,
    DuplicateVariable,
    /// Semantics that change or get lost during conversion
    ConversionNote,
    /// Variable references rewritten to `{{name}}` syntax
    SyntaxConverted,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::UndefinedVariable => "undefined_variable",
            WarningKind::UnusedVariable => "unused_variable",
            WarningKind::DynamicVariable => "dynamic_variable",
            WarningKind::TemplateTag => "template_tag",
            WarningKind::ChainedRequest => "chained_request",
            WarningKind::UnsupportedFeature => "unsupported_feature",
            WarningKind::VariableRenamed => "variable_renamed",
            WarningKind::DuplicateVariable => "duplicate_variable",
            WarningKind::ConversionNote => "conversion_note",
            WarningKind::SyntaxConverted => "syntax_converted",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured note about a lossy or ambiguous conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportWarning {
    #[serde(rename = "type")]
    pub kind: WarningKind,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
}

impl ImportWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            variable_name: None,
            resource_id: None,
            resource_name: None,
            original_name: None,
            new_name: None,
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>) -> Self {
        self.variable_name = Some(name.into());
        self
    }

    pub fn with_resource(mut self, id: Option<String>, name: impl Into<String>) -> Self {
        self.resource_id = id;
        self.resource_name = Some(name.into());
        self
    }

    pub fn with_rename(mut self, original: impl Into<String>, new: impl Into<String>) -> Self {
        self.original_name = Some(original.into());
        self.new_name = Some(new.into());
        self
    }
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_serializes_snake_case_kind() {
        let warning = ImportWarning::new(WarningKind::UndefinedVariable, "missing")
            .with_variable("base_url");
        let value = serde_json::to_value(&warning).unwrap();
        assert_eq!(value["type"], "undefined_variable");
        assert_eq!(value["variableName"], "base_url");
        assert!(value.get("newName").is_none());
    }

    #[test]
    fn test_display_matches_serialized_name() {
        for kind in [
            WarningKind::ChainedRequest,
            WarningKind::SyntaxConverted,
            WarningKind::UnsupportedFeature,
        ] {
            let serialized = serde_json::to_value(kind).unwrap();
            assert_eq!(serialized, kind.as_str());
        }
    }
}
