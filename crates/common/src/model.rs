//! Canonical collection model
//!
//! Every importer produces these shapes and every exporter consumes them.
//! The tree is owned top-down: a [`Collection`] owns its [`Folder`]s and
//! [`Request`]s by value and folders never point back at their parent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generate a fresh identifier for a model entity
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_true() -> bool {
    true
}

/// Root container of an imported API collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(default = "new_id")]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub folders: Vec<Folder>,

    #[serde(default)]
    pub requests: Vec<Request>,

    #[serde(default)]
    pub variables: Vec<Variable>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    /// Create an empty collection stamped with the current time
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            description: None,
            folders: Vec::new(),
            requests: Vec::new(),
            variables: Vec::new(),
            auth: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total number of requests, including those nested in folders
    pub fn request_count(&self) -> usize {
        self.requests.len()
            + self
                .folders
                .iter()
                .map(Folder::request_count)
                .sum::<usize>()
    }

    /// Total number of folders at every depth
    pub fn folder_count(&self) -> usize {
        self.folders.len()
            + self
                .folders
                .iter()
                .map(Folder::folder_count)
                .sum::<usize>()
    }

    /// All requests in the tree: root requests first, then each folder depth-first
    pub fn all_requests(&self) -> Vec<&Request> {
        let mut out: Vec<&Request> = self.requests.iter().collect();
        for folder in &self.folders {
            folder.collect_requests(&mut out);
        }
        out
    }

    /// Mutable counterpart of [`Collection::all_requests`]
    pub fn all_requests_mut(&mut self) -> Vec<&mut Request> {
        let mut out: Vec<&mut Request> = self.requests.iter_mut().collect();
        for folder in &mut self.folders {
            folder.collect_requests_mut(&mut out);
        }
        out
    }

    /// Look up a collection variable by key
    pub fn variable(&self, key: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.key == key)
    }
}

/// A named group of requests and sub-folders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    #[serde(default = "new_id")]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub folders: Vec<Folder>,

    #[serde(default)]
    pub requests: Vec<Request>,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            description: None,
            folders: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
            + self
                .folders
                .iter()
                .map(Folder::request_count)
                .sum::<usize>()
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
            + self
                .folders
                .iter()
                .map(Folder::folder_count)
                .sum::<usize>()
    }

    fn collect_requests<'a>(&'a self, out: &mut Vec<&'a Request>) {
        out.extend(self.requests.iter());
        for folder in &self.folders {
            folder.collect_requests(out);
        }
    }

    fn collect_requests_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Request>) {
        out.extend(self.requests.iter_mut());
        for folder in &mut self.folders {
            folder.collect_requests_mut(out);
        }
    }
}

/// A single HTTP request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(default = "new_id")]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Upper-cased HTTP method (e.g., "GET")
    pub method: String,

    /// Full URL, including the query string when there is one
    pub url: String,

    #[serde(default)]
    pub headers: Vec<KeyValue>,

    /// Query parameters mirroring the query string of `url`
    #[serde(default)]
    pub params: Vec<KeyValue>,

    #[serde(default, skip_serializing_if = "Body::is_none")]
    pub body: Body,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_request_script: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_script: Option<String>,
}

impl Request {
    pub fn new(name: impl Into<String>, method: &str, url: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            description: None,
            method: method.to_uppercase(),
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
            body: Body::None,
            auth: None,
            pre_request_script: None,
            test_script: None,
        }
    }

    /// Case-insensitive lookup of an enabled header
    pub fn header(&self, name: &str) -> Option<&KeyValue> {
        self.headers
            .iter()
            .find(|h| h.enabled && h.key.eq_ignore_ascii_case(name))
    }

    /// The URL with any query string and fragment removed
    pub fn url_without_query(&self) -> &str {
        let end = self.url.find(['?', '#']).unwrap_or(self.url.len());
        &self.url[..end]
    }
}

/// Kind of a form field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    /// The value is a file path
    File,
}

impl FieldKind {
    pub fn is_text(&self) -> bool {
        matches!(self, FieldKind::Text)
    }
}

/// Key/value pair used for headers, query parameters and form fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(default = "new_id")]
    pub id: String,

    pub key: String,

    #[serde(default)]
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "FieldKind::is_text")]
    pub kind: FieldKind,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            key: key.into(),
            value: value.into(),
            description: None,
            enabled: true,
            kind: FieldKind::Text,
        }
    }

    /// A form field whose value is a file path
    pub fn file(key: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::File,
            ..Self::new(key, path)
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.is_empty());
        self
    }
}

/// Request body, one shape per body type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Body {
    #[default]
    None,
    Json {
        content: String,
    },
    Text {
        content: String,
    },
    Xml {
        content: String,
    },
    Html {
        content: String,
    },
    FormUrlencoded {
        #[serde(rename = "formData", default)]
        form_data: Vec<KeyValue>,
    },
    FormData {
        #[serde(rename = "formData", default)]
        form_data: Vec<KeyValue>,
    },
    /// `content` holds the path of the file to send
    Binary {
        content: String,
    },
    #[serde(rename = "graphql")]
    GraphQl {
        query: String,
        #[serde(default)]
        variables: String,
    },
}

impl Body {
    pub fn is_none(&self) -> bool {
        matches!(self, Body::None)
    }

    /// MIME type implied by the body shape
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Body::None => None,
            Body::Json { .. } | Body::GraphQl { .. } => Some("application/json"),
            Body::Text { .. } => Some("text/plain"),
            Body::Xml { .. } => Some("application/xml"),
            Body::Html { .. } => Some("text/html"),
            Body::FormUrlencoded { .. } => Some("application/x-www-form-urlencoded"),
            Body::FormData { .. } => Some("multipart/form-data"),
            Body::Binary { .. } => Some("application/octet-stream"),
        }
    }

    /// Textual content for the raw body variants
    pub fn raw_content(&self) -> Option<&str> {
        match self {
            Body::Json { content }
            | Body::Text { content }
            | Body::Xml { content }
            | Body::Html { content } => Some(content),
            _ => None,
        }
    }

    /// Form fields for the two form variants
    pub fn form_fields(&self) -> Option<&[KeyValue]> {
        match self {
            Body::FormUrlencoded { form_data } | Body::FormData { form_data } => Some(form_data),
            _ => None,
        }
    }
}

/// Where an API key is sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    #[default]
    Header,
    Query,
}

/// OAuth 2.0 settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Auth {
    #[serde(default)]
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Authentication settings, one shape per auth type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Auth {
    None,
    Bearer {
        token: String,
    },
    Basic {
        username: String,
        #[serde(default)]
        password: String,
    },
    ApiKey {
        key: String,
        value: String,
        #[serde(rename = "in", default)]
        location: ApiKeyLocation,
    },
    #[serde(rename = "oauth2")]
    OAuth2(OAuth2Auth),
}

impl Auth {
    /// Identifier of the auth type as used in serialized output
    pub fn type_name(&self) -> &'static str {
        match self {
            Auth::None => "none",
            Auth::Bearer { .. } => "bearer",
            Auth::Basic { .. } => "basic",
            Auth::ApiKey { .. } => "api-key",
            Auth::OAuth2(_) => "oauth2",
        }
    }
}

/// Classification of a variable's value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    #[default]
    Text,
    Secret,
}

/// A named interpolation variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    #[serde(default = "new_id")]
    pub id: String,

    pub key: String,

    #[serde(default)]
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(rename = "type", default)]
    pub var_type: VariableType,

    /// Key as found in the source, set only when normalization renamed it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_key: Option<String>,
}

impl Variable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            key: key.into(),
            value: value.into(),
            description: None,
            enabled: true,
            var_type: VariableType::Text,
            original_key: None,
        }
    }

    pub fn with_type(mut self, var_type: VariableType) -> Self {
        self.var_type = var_type;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.is_empty());
        self
    }
}

/// A named set of variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default = "new_id")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub variables: Vec<Variable>,
}

impl Environment {
    pub fn new(name: impl Into<String>, variables: Vec<Variable>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            variables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_collection() -> Collection {
        let mut collection = Collection::new("Sample");
        collection
            .requests
            .push(Request::new("Root", "get", "https://x.test/"));

        let mut inner = Folder::new("Inner");
        inner
            .requests
            .push(Request::new("Deep", "DELETE", "https://x.test/a/1"));

        let mut outer = Folder::new("Outer");
        outer
            .requests
            .push(Request::new("Shallow", "POST", "https://x.test/a"));
        outer.folders.push(inner);
        collection.folders.push(outer);
        collection
    }

    #[test]
    fn test_counts_are_recursive() {
        let collection = sample_collection();
        assert_eq!(collection.request_count(), 3);
        assert_eq!(collection.folder_count(), 2);
    }

    #[test]
    fn test_all_requests_order() {
        let collection = sample_collection();
        let names: Vec<&str> = collection
            .all_requests()
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["Root", "Shallow", "Deep"]);
    }

    #[test]
    fn test_request_method_is_uppercased() {
        let request = Request::new("r", "patch", "https://x.test");
        assert_eq!(request.method, "PATCH");
    }

    #[test]
    fn test_url_without_query() {
        let request = Request::new("r", "GET", "https://x.test/a?b=1#frag");
        assert_eq!(request.url_without_query(), "https://x.test/a");
    }

    #[test]
    fn test_body_serializes_with_type_tag() {
        let body = Body::FormUrlencoded {
            form_data: vec![KeyValue::new("a", "1")],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["type"], "form-urlencoded");
        assert_eq!(value["formData"][0]["key"], "a");

        let graphql = Body::GraphQl {
            query: "{ me { id } }".to_string(),
            variables: String::new(),
        };
        assert_eq!(serde_json::to_value(&graphql).unwrap()["type"], "graphql");
    }

    #[test]
    fn test_auth_serializes_with_type_tag() {
        let auth = Auth::ApiKey {
            key: "X-Key".to_string(),
            value: "abc".to_string(),
            location: ApiKeyLocation::Query,
        };
        let value = serde_json::to_value(&auth).unwrap();
        assert_eq!(value["type"], "api-key");
        assert_eq!(value["in"], "query");

        let oauth = Auth::OAuth2(OAuth2Auth {
            access_token: "t".to_string(),
            ..Default::default()
        });
        let value = serde_json::to_value(&oauth).unwrap();
        assert_eq!(value["type"], "oauth2");
        assert_eq!(value["accessToken"], "t");
    }

    #[test]
    fn test_key_value_defaults_enabled_on_deserialize() {
        let kv: KeyValue = serde_json::from_str(r#"{"key":"a","value":"b"}"#).unwrap();
        assert!(kv.enabled);
        assert!(!kv.id.is_empty());
        assert_eq!(kv.kind, FieldKind::Text);
    }

    #[test]
    fn test_collection_json_roundtrip_keeps_structure() {
        let collection = sample_collection();
        let json = serde_json::to_string(&collection).unwrap();
        let back: Collection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, collection);
    }
}
