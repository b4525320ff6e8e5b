//! Import orchestration
//!
//! Detects (or accepts a hint for) the source format, dispatches to the
//! matching [`FormatParser`] from a [`ParserRegistry`], and post-processes
//! the canonical result: template and dynamic variable checks, variable
//! name normalization and, optionally, variable validation.
//!
//! ## Usage
//! ```rust,ignore
//! use apiport_parser::Importer;
//!
//! let result = Importer::new()
//!     .with_format_hint("postman")
//!     .with_variable_validation(false)
//!     .import(&text)?;
//! ```

use crate::curl::{self, CurlFormat, CurlMultiFormat};
use crate::detector::{detect, is_postman_environment};
use crate::har::HarFormat;
use crate::insomnia::InsomniaFormat;
use crate::openapi::OpenApiFormat;
use crate::postman::{PostmanCollectionFormat, PostmanEnvironmentFormat};
use crate::variables::{
    check_dynamic_variables, check_insomnia_template_tags, extract_used_variables,
    map_collection_variables, normalize_variable_names, validate_variables,
};
use apiport_common::{
    ApiportError, Collection, Environment, ImportWarning, Result, SourceFormat,
};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

/// Payload of a successful import
#[derive(Debug, Clone, PartialEq)]
pub enum ImportData {
    Collection(Collection),
    /// Multi-workspace sources (Insomnia) yield one collection per workspace
    Collections(Vec<Collection>),
    Environment(Environment),
}

/// Shape of an [`ImportData`] payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Collection,
    Collections,
    Environment,
}

impl ImportData {
    pub fn kind(&self) -> ImportKind {
        match self {
            ImportData::Collection(_) => ImportKind::Collection,
            ImportData::Collections(_) => ImportKind::Collections,
            ImportData::Environment(_) => ImportKind::Environment,
        }
    }
}

/// Outcome of an import: the payload, non-fatal warnings and any
/// environments found alongside it
#[derive(Debug, Clone, PartialEq)]
pub struct ImportResult {
    pub data: ImportData,
    pub warnings: Vec<ImportWarning>,
    pub environments: Vec<Environment>,
}

impl ImportResult {
    pub fn new(data: ImportData) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            environments: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<ImportWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_environments(mut self, environments: Vec<Environment>) -> Self {
        self.environments = environments;
        self
    }

    pub fn kind(&self) -> ImportKind {
        self.data.kind()
    }

    /// Imported collections, in source order
    pub fn collections(&self) -> Vec<&Collection> {
        match &self.data {
            ImportData::Collection(collection) => vec![collection],
            ImportData::Collections(collections) => collections.iter().collect(),
            ImportData::Environment(_) => Vec::new(),
        }
    }
}

/// Identifies one concrete parser strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserId {
    PostmanCollection,
    PostmanEnvironment,
    Insomnia,
    OpenApi,
    /// A single `curl` command
    Curl,
    /// Several `curl` commands in one input
    CurlMulti,
    Har,
}

impl fmt::Display for ParserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParserId::PostmanCollection => "postman-collection",
            ParserId::PostmanEnvironment => "postman-environment",
            ParserId::Insomnia => "insomnia",
            ParserId::OpenApi => "openapi",
            ParserId::Curl => "curl",
            ParserId::CurlMulti => "curl-multi",
            ParserId::Har => "har",
        };
        f.write_str(name)
    }
}

/// A parser from one source format into the canonical model
#[cfg_attr(test, mockall::automock)]
pub trait FormatParser: Send + Sync {
    fn id(&self) -> ParserId;

    fn parse(&self, text: &str) -> Result<ImportResult>;
}

/// Parser strategies keyed by [`ParserId`]
pub struct ParserRegistry {
    parsers: HashMap<ParserId, Box<dyn FormatParser>>,
}

impl ParserRegistry {
    /// A registry with no parsers
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Add a parser, replacing any parser registered under the same id
    pub fn register(&mut self, parser: Box<dyn FormatParser>) {
        self.parsers.insert(parser.id(), parser);
    }

    pub fn get(&self, id: ParserId) -> Option<&dyn FormatParser> {
        self.parsers.get(&id).map(|parser| parser.as_ref())
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl Default for ParserRegistry {
    /// All built-in parsers
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(PostmanCollectionFormat));
        registry.register(Box::new(PostmanEnvironmentFormat));
        registry.register(Box::new(InsomniaFormat));
        registry.register(Box::new(OpenApiFormat));
        registry.register(Box::new(CurlFormat));
        registry.register(Box::new(CurlMultiFormat));
        registry.register(Box::new(HarFormat));
        registry
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<String> = self.parsers.keys().map(ParserId::to_string).collect();
        ids.sort();
        f.debug_struct("ParserRegistry").field("parsers", &ids).finish()
    }
}

/// Configurable import pipeline
#[derive(Debug)]
pub struct Importer {
    format_hint: Option<String>,
    validate_variables: bool,
    registry: ParserRegistry,
}

impl Default for Importer {
    fn default() -> Self {
        Self::new()
    }
}

impl Importer {
    /// Auto-detecting importer with variable validation enabled
    pub fn new() -> Self {
        Self {
            format_hint: None,
            validate_variables: true,
            registry: ParserRegistry::default(),
        }
    }

    /// Skip detection and parse as the given format id
    pub fn with_format_hint(mut self, hint: impl Into<String>) -> Self {
        self.format_hint = Some(hint.into());
        self
    }

    pub fn with_variable_validation(mut self, enabled: bool) -> Self {
        self.validate_variables = enabled;
        self
    }

    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Run the full pipeline on `text`
    pub fn import(&self, text: &str) -> Result<ImportResult> {
        let format = match &self.format_hint {
            Some(hint) => hint.parse::<SourceFormat>()?,
            None => detect(text),
        };
        debug!("Source format: {}", format);

        let parser_id = route(format, text)?;
        let parser = self.registry.get(parser_id).ok_or_else(|| {
            ApiportError::Validation(format!("No parser registered for {}", parser_id))
        })?;
        debug!("Dispatching to {} parser", parser_id);

        let result = parser.parse(text)?;
        Ok(self.post_process(format, result))
    }

    fn post_process(&self, format: SourceFormat, result: ImportResult) -> ImportResult {
        let ImportResult {
            mut data,
            mut warnings,
            mut environments,
        } = result;

        for environment in &mut environments {
            normalize_environment(environment, &mut warnings);
        }

        match &mut data {
            ImportData::Collection(collection) => {
                self.process_collection(format, collection, &mut environments, &mut warnings);
            }
            ImportData::Collections(collections) => {
                for collection in collections.iter_mut() {
                    self.process_collection(format, collection, &mut environments, &mut warnings);
                }
            }
            ImportData::Environment(environment) => {
                normalize_environment(environment, &mut warnings);
            }
        }

        debug!("Import finished with {} warning(s)", warnings.len());
        ImportResult {
            data,
            warnings,
            environments,
        }
    }

    fn process_collection(
        &self,
        format: SourceFormat,
        collection: &mut Collection,
        environments: &mut Vec<Environment>,
        warnings: &mut Vec<ImportWarning>,
    ) {
        if format == SourceFormat::Insomnia {
            warnings.extend(check_insomnia_template_tags(collection));
        }
        warnings.extend(check_dynamic_variables(collection));

        let (variables, renames) = normalize_variable_names(std::mem::take(&mut collection.variables));
        collection.variables = variables;
        warnings.extend(renames);

        if format == SourceFormat::Postman && !collection.variables.is_empty() {
            let (environment, notes) = map_collection_variables(&collection.variables);
            environments.push(environment);
            warnings.extend(notes);
        }

        let has_definitions = !collection.variables.is_empty()
            || environments.iter().any(|env| !env.variables.is_empty());
        if self.validate_variables && has_definitions {
            let used = extract_used_variables(collection);
            let defined: BTreeSet<&str> = collection
                .variables
                .iter()
                .chain(environments.iter().flat_map(|env| env.variables.iter()))
                .map(|var| var.key.as_str())
                .collect();
            warnings.extend(validate_variables(&used, &defined));
        }
    }
}

fn normalize_environment(environment: &mut Environment, warnings: &mut Vec<ImportWarning>) {
    let (variables, renames) = normalize_variable_names(std::mem::take(&mut environment.variables));
    environment.variables = variables;
    warnings.extend(renames);
}

/// Choose the concrete parser for a detected or hinted format
fn route(format: SourceFormat, text: &str) -> Result<ParserId> {
    match format {
        SourceFormat::Postman => {
            let is_environment = serde_json::from_str::<serde_json::Value>(text)
                .map(|value| is_postman_environment(&value))
                .unwrap_or(false);
            Ok(if is_environment {
                ParserId::PostmanEnvironment
            } else {
                ParserId::PostmanCollection
            })
        }
        SourceFormat::Insomnia => Ok(ParserId::Insomnia),
        SourceFormat::OpenApi => Ok(ParserId::OpenApi),
        SourceFormat::Curl => Ok(if curl::count_commands(text) > 1 {
            ParserId::CurlMulti
        } else {
            ParserId::Curl
        }),
        SourceFormat::Har => Ok(ParserId::Har),
        SourceFormat::Unknown => Err(ApiportError::Validation(
            "Unable to detect file format. Please specify the format explicitly.".to_string(),
        )),
    }
}

/// Import `text`, auto-detecting the format unless `format_hint` names one
pub fn import_file(text: &str, format_hint: Option<&str>) -> Result<ImportResult> {
    let mut importer = Importer::new();
    if let Some(hint) = format_hint {
        importer = importer.with_format_hint(hint);
    }
    importer.import(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiport_common::{Request, Variable, WarningKind};

    fn mock_returning(id: ParserId, collection: Collection) -> MockFormatParser {
        let mut parser = MockFormatParser::new();
        parser.expect_id().return_const(id);
        parser
            .expect_parse()
            .times(1)
            .returning(move |_| Ok(ImportResult::new(ImportData::Collection(collection.clone()))));
        parser
    }

    #[test]
    fn test_default_registry_has_every_parser() {
        let registry = ParserRegistry::default();
        assert_eq!(registry.len(), 7);
        for id in [
            ParserId::PostmanCollection,
            ParserId::PostmanEnvironment,
            ParserId::Insomnia,
            ParserId::OpenApi,
            ParserId::Curl,
            ParserId::CurlMulti,
            ParserId::Har,
        ] {
            assert_eq!(registry.get(id).map(|p| p.id()), Some(id));
        }
    }

    #[test]
    fn test_dispatches_single_curl_to_curl_parser() {
        let mut registry = ParserRegistry::empty();
        registry.register(Box::new(mock_returning(
            ParserId::Curl,
            Collection::new("single"),
        )));

        let result = Importer::new()
            .with_registry(registry)
            .import("curl https://x.test/ping")
            .unwrap();
        assert_eq!(result.collections()[0].name, "single");
    }

    #[test]
    fn test_dispatches_multiple_curl_commands_to_multi_parser() {
        let mut registry = ParserRegistry::empty();
        registry.register(Box::new(mock_returning(
            ParserId::CurlMulti,
            Collection::new("multi"),
        )));

        let result = Importer::new()
            .with_registry(registry)
            .import("curl https://x.test/a\ncurl https://x.test/b")
            .unwrap();
        assert_eq!(result.collections()[0].name, "multi");
    }

    #[test]
    fn test_dispatches_postman_environment() {
        let mut registry = ParserRegistry::empty();
        let mut parser = MockFormatParser::new();
        parser.expect_id().return_const(ParserId::PostmanEnvironment);
        parser.expect_parse().times(1).returning(|_| {
            Ok(ImportResult::new(ImportData::Environment(Environment::new(
                "Dev",
                vec![Variable::new("base-url", "x")],
            ))))
        });
        registry.register(Box::new(parser));

        let result = Importer::new()
            .with_registry(registry)
            .import(r#"{"name": "Dev", "values": []}"#)
            .unwrap();
        let ImportData::Environment(env) = &result.data else {
            panic!("expected an environment");
        };
        assert_eq!(env.variables[0].key, "baseurl");
        assert_eq!(result.warnings[0].kind, WarningKind::VariableRenamed);
    }

    #[test]
    fn test_missing_parser_is_reported() {
        let err = Importer::new()
            .with_registry(ParserRegistry::empty())
            .import("curl x.test")
            .unwrap_err();
        assert_eq!(err.to_string(), "No parser registered for curl");
    }

    #[test]
    fn test_unknown_format_error() {
        let err = import_file("hello world", None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to detect file format. Please specify the format explicitly."
        );
    }

    #[test]
    fn test_invalid_hint_lists_ids() {
        let err = import_file("{}", Some("soap")).unwrap_err();
        assert!(matches!(err, ApiportError::Validation(_)));
        assert!(err.to_string().contains("postman, insomnia, openapi, curl, har"));
    }

    #[test]
    fn test_validation_runs_only_with_definitions() {
        let mut collection = Collection::new("c");
        collection
            .requests
            .push(Request::new("r", "GET", "{{host}}/x"));
        let mut registry = ParserRegistry::empty();
        registry.register(Box::new(mock_returning(ParserId::Curl, collection.clone())));
        let result = Importer::new()
            .with_registry(registry)
            .import("curl x")
            .unwrap();
        assert!(result.warnings.is_empty());

        collection.variables.push(Variable::new("other", "1"));
        let mut registry = ParserRegistry::empty();
        registry.register(Box::new(mock_returning(ParserId::Curl, collection.clone())));
        let result = Importer::new()
            .with_registry(registry)
            .import("curl x")
            .unwrap();
        let kinds: Vec<WarningKind> = result.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![WarningKind::UndefinedVariable, WarningKind::UnusedVariable]
        );

        let mut registry = ParserRegistry::empty();
        registry.register(Box::new(mock_returning(ParserId::Curl, collection)));
        let result = Importer::new()
            .with_registry(registry)
            .with_variable_validation(false)
            .import("curl x")
            .unwrap();
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_har_is_unsupported() {
        let err = import_file(r#"{"log": {"version": "1.2", "entries": []}}"#, None).unwrap_err();
        assert!(matches!(err, ApiportError::UnsupportedFeature(_)));
        assert_eq!(err.to_string(), "HAR import is not yet supported");
    }
}
