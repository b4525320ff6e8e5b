//! OpenAPI 3.x and Swagger 2.0 type definitions
//!
//! One document type covers both versions; fields that only exist in one
//! of them are optional. Maps use `IndexMap` so paths, media types and
//! properties keep document order.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::ops::Deref;

/// Document root
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiSpec {
    /// OpenAPI version (e.g., "3.0.3")
    #[serde(default)]
    pub openapi: Option<String>,

    /// Swagger version ("2.0")
    #[serde(default)]
    pub swagger: Option<String>,

    #[serde(default)]
    pub info: Info,

    /// Servers (OpenAPI 3)
    #[serde(default)]
    pub servers: Vec<Server>,

    /// Host (Swagger 2.0)
    #[serde(default)]
    pub host: Option<String>,

    /// Base path (Swagger 2.0)
    #[serde(default)]
    pub base_path: Option<String>,

    /// Schemes (Swagger 2.0)
    #[serde(default)]
    pub schemes: Vec<String>,

    /// Default request media types (Swagger 2.0)
    #[serde(default)]
    pub consumes: Vec<String>,

    #[serde(default)]
    pub paths: Entries<PathItem>,

    #[serde(default)]
    pub components: Option<Components>,

    /// Security schemes (Swagger 2.0)
    #[serde(default)]
    pub security_definitions: Entries<SecurityScheme>,

    /// Document-wide security requirements
    #[serde(default)]
    pub security: Option<Vec<SecurityRequirement>>,

    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl OpenApiSpec {
    /// True for Swagger 2.0 documents
    pub fn is_swagger(&self) -> bool {
        self.openapi.is_none() && self.swagger.is_some()
    }

    /// Security schemes from whichever location the version uses
    pub fn security_schemes(&self) -> &Entries<SecurityScheme> {
        match &self.components {
            Some(components) if !self.is_swagger() => &components.security_schemes,
            _ => &self.security_definitions,
        }
    }
}

/// Map decoded entry by entry
///
/// `x-` extension keys are ignored. Entries that do not decode as `T`
/// (a `$ref` security scheme, a malformed path item) are set aside in
/// `skipped` instead of rejecting the document.
#[derive(Debug, Clone)]
pub struct Entries<T> {
    items: IndexMap<String, T>,
    skipped: Vec<String>,
}

impl<T> Entries<T> {
    /// Keys of entries that could not be read
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Deref for Entries<T> {
    type Target = IndexMap<String, T>;

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a Entries<T> {
    type Item = (&'a String, &'a T);
    type IntoIter = indexmap::map::Iter<'a, String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Entries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut entries = Entries::default();
        for (key, value) in raw {
            if key.starts_with("x-") {
                continue;
            }
            match serde_json::from_value(value) {
                Ok(item) => {
                    entries.items.insert(key, item);
                }
                Err(_) => entries.skipped.push(key),
            }
        }
        Ok(entries)
    }
}

/// API information
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Server information
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Substitutions for `{name}` placeholders in `url`
    #[serde(default)]
    pub variables: IndexMap<String, ServerVariable>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerVariable {
    #[serde(default)]
    pub default: Option<Value>,
}

impl Server {
    /// URL with server variables replaced by their defaults
    pub fn resolved_url(&self) -> String {
        let mut url = self.url.clone();
        for (name, variable) in &self.variables {
            if let Some(default) = variable.default.as_ref().and_then(Value::as_str) {
                url = url.replace(&format!("{{{}}}", name), default);
            }
        }
        url
    }
}

/// Tag declaration
#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Operations for a single path
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub get: Option<Operation>,

    #[serde(default)]
    pub put: Option<Operation>,

    #[serde(default)]
    pub post: Option<Operation>,

    #[serde(default)]
    pub delete: Option<Operation>,

    #[serde(default)]
    pub options: Option<Operation>,

    #[serde(default)]
    pub head: Option<Operation>,

    #[serde(default)]
    pub patch: Option<Operation>,

    #[serde(default)]
    pub trace: Option<Operation>,

    /// Parameters shared by every operation on this path
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl PathItem {
    /// `(METHOD, operation)` pairs in fixed method order
    pub fn operations(&self) -> Vec<(&'static str, &Operation)> {
        [
            ("GET", &self.get),
            ("PUT", &self.put),
            ("POST", &self.post),
            ("DELETE", &self.delete),
            ("OPTIONS", &self.options),
            ("HEAD", &self.head),
            ("PATCH", &self.patch),
            ("TRACE", &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, operation)| operation.as_ref().map(|op| (method, op)))
        .collect()
    }
}

/// HTTP operation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Request body (OpenAPI 3)
    #[serde(default)]
    pub request_body: Option<RequestBody>,

    /// Tags; the first one picks the folder
    #[serde(default)]
    pub tags: Vec<String>,

    /// Request media types (Swagger 2.0)
    #[serde(default)]
    pub consumes: Vec<String>,

    /// Overrides the document-wide requirements; an empty list means none
    #[serde(default)]
    pub security: Option<Vec<SecurityRequirement>>,
}

/// Parameter definition
///
/// Swagger 2.0 puts `type`/`format`/`enum` on the parameter itself instead
/// of under `schema`. A `$ref` parameter deserializes with an empty name
/// and is skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,

    /// query, header, path, cookie, body or formData
    #[serde(rename = "in")]
    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub schema: Option<Schema>,

    #[serde(default)]
    pub example: Option<Value>,

    #[serde(rename = "type")]
    #[serde(default)]
    pub param_type: Option<String>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub default: Option<Value>,

    #[serde(rename = "enum")]
    #[serde(default)]
    pub enum_values: Vec<Value>,

    #[serde(default)]
    pub items: Option<Box<Schema>>,
}

impl Parameter {
    /// The parameter's schema, or one assembled from Swagger 2.0 inline fields
    pub fn effective_schema(&self) -> Schema {
        match &self.schema {
            Some(schema) => schema.clone(),
            None => Schema {
                schema_type: self.param_type.clone().map(Value::String),
                format: self.format.clone(),
                default: self.default.clone(),
                enum_values: self.enum_values.clone(),
                items: self.items.clone(),
                ..Default::default()
            },
        }
    }
}

/// Request body (OpenAPI 3)
#[derive(Debug, Clone, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub description: Option<String>,

    /// Media type → content description; empty for `$ref` bodies
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,

    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<Schema>,

    #[serde(default)]
    pub example: Option<Value>,

    /// Named examples; the first one's `value` is used
    #[serde(default)]
    pub examples: IndexMap<String, Value>,
}

impl MediaType {
    /// Literal example: `example`, else the first named example's value
    pub fn literal_example(&self) -> Option<&Value> {
        self.example.as_ref().or_else(|| {
            self.examples
                .values()
                .next()
                .and_then(|example| example.get("value"))
        })
    }
}

/// Schema definition (the subset needed for example synthesis)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// A string, or a list of strings in OpenAPI 3.1
    #[serde(rename = "type")]
    #[serde(default)]
    pub schema_type: Option<Value>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub example: Option<Value>,

    #[serde(default)]
    pub default: Option<Value>,

    #[serde(rename = "enum")]
    #[serde(default)]
    pub enum_values: Vec<Value>,

    #[serde(default)]
    pub properties: IndexMap<String, Schema>,

    #[serde(default)]
    pub items: Option<Box<Schema>>,

    #[serde(default)]
    pub all_of: Vec<Schema>,

    #[serde(default)]
    pub one_of: Vec<Schema>,

    #[serde(default)]
    pub any_of: Vec<Schema>,

    /// Unresolved reference
    #[serde(rename = "$ref")]
    #[serde(default)]
    pub ref_path: Option<String>,
}

impl Schema {
    /// Primary type name; the first non-"null" entry for list types
    pub fn type_name(&self) -> Option<&str> {
        match self.schema_type.as_ref()? {
            Value::String(name) => Some(name.as_str()),
            Value::Array(names) => names
                .iter()
                .filter_map(Value::as_str)
                .find(|name| *name != "null"),
            _ => None,
        }
    }
}

/// Reusable components (only security schemes are read)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default)]
    pub security_schemes: Entries<SecurityScheme>,
}

/// Scheme name → required scopes
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Security scheme (OpenAPI 3 `securitySchemes` or Swagger `securityDefinitions`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    /// http, apiKey, oauth2, openIdConnect (3.x); basic, apiKey, oauth2 (2.0)
    #[serde(rename = "type")]
    pub scheme_type: String,

    /// HTTP auth scheme, e.g. "bearer" or "basic"
    #[serde(default)]
    pub scheme: Option<String>,

    /// Header or query parameter name for apiKey
    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "in")]
    #[serde(default)]
    pub location: Option<String>,

    /// OAuth2 flows (OpenAPI 3)
    #[serde(default)]
    pub flows: IndexMap<String, OAuthFlow>,

    /// OAuth2 flow name (Swagger 2.0)
    #[serde(default)]
    pub flow: Option<String>,

    #[serde(default)]
    pub authorization_url: Option<String>,

    #[serde(default)]
    pub token_url: Option<String>,

    #[serde(default)]
    pub scopes: IndexMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    #[serde(default)]
    pub authorization_url: Option<String>,

    #[serde(default)]
    pub token_url: Option<String>,

    #[serde(default)]
    pub scopes: IndexMap<String, String>,
}
