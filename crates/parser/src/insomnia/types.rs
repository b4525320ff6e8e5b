//! Insomnia v4 export type definitions
//!
//! An export is a flat list of resources tagged by `_type`; the hierarchy
//! is rebuilt from `parentId`.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Export document root
#[derive(Debug, Clone, Deserialize)]
pub struct InsomniaExport {
    /// Always "export"
    #[serde(rename = "_type")]
    pub export_type: String,

    /// Export format version (4 for current exports)
    #[serde(rename = "__export_format")]
    #[serde(default)]
    pub export_format: Option<Value>,

    /// Resources, still untyped; see [`Resource::from_value`]
    #[serde(default)]
    pub resources: Vec<Value>,
}

/// A typed resource from the `resources` list
#[derive(Debug, Clone)]
pub enum Resource {
    Workspace(Workspace),
    RequestGroup(RequestGroup),
    Request(Box<InsomniaRequest>),
    Environment(InsomniaEnvironment),
    /// Any other `_type` (cookie_jar, api_spec, unit_test, ...)
    Other(String),
}

impl Resource {
    /// Decode a resource by its `_type` tag
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let kind = value
            .get("_type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(match kind.as_str() {
            "workspace" => Resource::Workspace(serde_json::from_value(value)?),
            "request_group" => Resource::RequestGroup(serde_json::from_value(value)?),
            "request" => Resource::Request(Box::new(serde_json::from_value(value)?)),
            "environment" => Resource::Environment(serde_json::from_value(value)?),
            _ => Resource::Other(kind),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Workspace {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Folder
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestGroup {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub meta_sort_key: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsomniaRequest {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub method: Option<String>,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub headers: Vec<Pair>,

    /// Query parameters, kept apart from `url`
    #[serde(default)]
    pub parameters: Vec<Pair>,

    #[serde(default)]
    pub body: Option<InsomniaBody>,

    #[serde(default)]
    pub authentication: Option<InsomniaAuth>,

    #[serde(default)]
    pub meta_sort_key: Option<f64>,
}

/// Header, query parameter or form field
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub description: Option<String>,

    /// `file` for multipart file fields
    #[serde(rename = "type")]
    #[serde(default)]
    pub param_type: Option<String>,

    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsomniaBody {
    #[serde(default)]
    pub mime_type: Option<String>,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub params: Vec<Pair>,

    #[serde(default)]
    pub file_name: Option<String>,
}

/// Authentication block; which fields are set depends on `type`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsomniaAuth {
    #[serde(rename = "type")]
    #[serde(default)]
    pub auth_type: Option<String>,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub prefix: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub value: Option<String>,

    /// `header` or `queryParams`
    #[serde(default)]
    pub add_to: Option<String>,

    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub grant_type: Option<String>,

    #[serde(default)]
    pub authorization_url: Option<String>,

    #[serde(default)]
    pub access_token_url: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsomniaEnvironment {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub name: String,

    /// Variable values in document order
    #[serde(default)]
    pub data: IndexMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_from_value_dispatches_on_type() {
        let request = serde_json::json!({
            "_id": "req_1",
            "_type": "request",
            "parentId": "wrk_1",
            "name": "List",
            "method": "GET",
            "url": "https://x.test",
            "metaSortKey": -10
        });
        match Resource::from_value(request).unwrap() {
            Resource::Request(request) => {
                assert_eq!(request.parent_id.as_deref(), Some("wrk_1"));
                assert_eq!(request.meta_sort_key, Some(-10.0));
            }
            other => panic!("unexpected resource: {:?}", other),
        }

        let jar = serde_json::json!({"_id": "jar_1", "_type": "cookie_jar"});
        assert!(matches!(
            Resource::from_value(jar).unwrap(),
            Resource::Other(kind) if kind == "cookie_jar"
        ));
    }

    #[test]
    fn test_environment_data_keeps_order() {
        let env: InsomniaEnvironment = serde_json::from_str(
            r#"{"_id": "env_1", "name": "Base", "data": {"zeta": 1, "alpha": "a"}}"#,
        )
        .unwrap();
        let keys: Vec<&String> = env.data.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
