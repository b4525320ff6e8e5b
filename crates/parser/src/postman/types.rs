//! Postman collection v2.0 / v2.1 and environment type definitions
//!
//! Many Postman fields accept more than one shape (a URL is a string or an
//! object, a description is a string or `{content}`); those are modelled as
//! untagged enums.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Collection document root
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanCollection {
    pub info: Info,

    #[serde(default)]
    pub item: Vec<Item>,

    /// Collection variables
    #[serde(default)]
    pub variable: Vec<PostmanVariable>,

    #[serde(default)]
    pub auth: Option<PostmanAuth>,

    #[serde(default)]
    pub event: Vec<Event>,
}

/// Collection metadata
#[derive(Debug, Clone, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub name: String,

    /// Schema URL, e.g. `https://schema.getpostman.com/json/collection/v2.1.0/collection.json`
    #[serde(default)]
    pub schema: String,

    #[serde(default)]
    pub description: Option<Description>,
}

/// Description as plain text or a `{content, type}` object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Description {
    Text(String),
    Object {
        #[serde(default)]
        content: Option<String>,
    },
}

impl Description {
    pub fn text(&self) -> Option<String> {
        match self {
            Description::Text(text) => Some(text.clone()),
            Description::Object { content } => content.clone(),
        }
        .filter(|text| !text.is_empty())
    }
}

/// An item is a folder when `item` is present, a request when `request` is
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<Description>,

    /// Child items (folders only)
    #[serde(default)]
    pub item: Option<Vec<Item>>,

    #[serde(default)]
    pub request: Option<RequestOrUrl>,

    #[serde(default)]
    pub event: Vec<Event>,

    /// Folder- or request-level auth as stored on the item
    #[serde(default)]
    pub auth: Option<PostmanAuth>,
}

/// v2.0 allows a request to be just its URL
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RequestOrUrl {
    Url(String),
    Request(Box<PostmanRequest>),
}

/// Request definition
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanRequest {
    #[serde(default)]
    pub url: Option<Url>,

    #[serde(default)]
    pub method: Option<String>,

    #[serde(default)]
    pub header: Option<Headers>,

    #[serde(default)]
    pub body: Option<PostmanBody>,

    #[serde(default)]
    pub auth: Option<PostmanAuth>,

    #[serde(default)]
    pub description: Option<Description>,
}

/// Header list, or a v2.0 newline-separated `Key: Value` block
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Headers {
    List(Vec<Header>),
    Raw(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub key: String,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub description: Option<Description>,
}

/// URL as a raw string or a structured object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Url {
    Raw(String),
    Object(UrlObject),
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlObject {
    #[serde(default)]
    pub raw: Option<String>,

    #[serde(default)]
    pub protocol: Option<String>,

    #[serde(default)]
    pub host: Option<Segments>,

    #[serde(default)]
    pub port: Option<String>,

    #[serde(default)]
    pub path: Option<Segments>,

    #[serde(default)]
    pub query: Vec<QueryParam>,
}

/// `host` and `path` are a joined string or a list of segments
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Segments {
    Joined(String),
    List(Vec<Segment>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Text(String),
    Object {
        #[serde(default)]
        value: Option<String>,
    },
}

impl Segments {
    /// Segments joined with `separator`
    pub fn join(&self, separator: &str) -> String {
        match self {
            Segments::Joined(text) => text.clone(),
            Segments::List(segments) => segments
                .iter()
                .map(|segment| match segment {
                    Segment::Text(text) => text.clone(),
                    Segment::Object { value } => value.clone().unwrap_or_default(),
                })
                .collect::<Vec<_>>()
                .join(separator),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryParam {
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub description: Option<Description>,
}

/// Request body; which fields are set depends on `mode`
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanBody {
    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub raw: Option<String>,

    #[serde(default)]
    pub options: Option<BodyOptions>,

    #[serde(default)]
    pub urlencoded: Vec<FormParam>,

    #[serde(default)]
    pub formdata: Vec<FormParam>,

    #[serde(default)]
    pub file: Option<FileRef>,

    #[serde(default)]
    pub graphql: Option<GraphQlBody>,

    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BodyOptions {
    #[serde(default)]
    pub raw: Option<RawOptions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOptions {
    /// json, xml, html, javascript or text
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormParam {
    pub key: String,

    #[serde(default)]
    pub value: Option<String>,

    /// File path(s) for `type: file` entries; a string, a list or null
    #[serde(default)]
    pub src: Option<Value>,

    #[serde(rename = "type")]
    #[serde(default)]
    pub param_type: Option<String>,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub description: Option<Description>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    #[serde(default)]
    pub src: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlBody {
    #[serde(default)]
    pub query: Option<String>,

    /// Usually a JSON string, occasionally an inline object
    #[serde(default)]
    pub variables: Option<Value>,
}

/// Auth block: `type` plus a parameter list stored under the type's name
///
/// v2.1 stores parameters as `[{key, value}]`, v2.0 as a plain object.
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanAuth {
    #[serde(rename = "type")]
    pub auth_type: String,

    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl PostmanAuth {
    /// Look up a parameter of the active auth type by key
    pub fn param(&self, key: &str) -> Option<String> {
        let params = self.params.get(&self.auth_type)?;
        let value = match params {
            Value::Array(entries) => entries
                .iter()
                .find(|entry| entry.get("key").and_then(Value::as_str) == Some(key))
                .and_then(|entry| entry.get("value")),
            Value::Object(map) => map.get(key),
            _ => None,
        }?;
        value_to_string(value)
    }
}

/// Script attached to the `prerequest` or `test` hook
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub listen: String,

    #[serde(default)]
    pub script: Option<Script>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub exec: Option<ScriptSource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScriptSource {
    Text(String),
    Lines(Vec<String>),
}

impl ScriptSource {
    pub fn joined(&self) -> String {
        match self {
            ScriptSource::Text(text) => text.clone(),
            ScriptSource::Lines(lines) => lines.join("\n"),
        }
    }
}

/// Collection variable
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanVariable {
    #[serde(default)]
    pub key: Option<String>,

    /// v2.0 collections sometimes only carry `id`
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub value: Option<Value>,

    #[serde(rename = "type")]
    #[serde(default)]
    pub var_type: Option<String>,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub description: Option<Description>,
}

/// Environment (or globals) document
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanEnvironment {
    pub name: String,

    pub values: Vec<EnvironmentValue>,

    /// `environment` or `globals`
    #[serde(rename = "_postman_variable_scope")]
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentValue {
    pub key: String,

    #[serde(default)]
    pub value: Option<Value>,

    #[serde(default)]
    pub enabled: Option<bool>,

    /// `default` or `secret`
    #[serde(rename = "type")]
    #[serde(default)]
    pub var_type: Option<String>,
}

/// Render a JSON scalar as a variable value; non-strings are stringified
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
