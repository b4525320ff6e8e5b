//! OpenAPI 3.0.3 output
//!
//! Each request becomes one operation keyed by its URL path and method.
//! Requests are tagged with their top-level folder. Only the information
//! the canonical model carries is emitted: there are no response schemas,
//! and request schemas are inferred from example bodies.

use apiport_common::url::split_origin;
use apiport_common::{ApiKeyLocation, Auth, Body, Collection, Folder, KeyValue, Request, Result};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

const OPENAPI_VERSION: &str = "3.0.3";
const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

#[derive(Debug, Serialize)]
struct Document {
    openapi: &'static str,
    info: Info,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    servers: Vec<Server>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<Tag>,
    paths: IndexMap<String, IndexMap<String, Operation>>,
    #[serde(skip_serializing_if = "Components::is_empty")]
    components: Components,
    #[serde(skip_serializing_if = "Option::is_none")]
    security: Option<Vec<SecurityRequirement>>,
}

#[derive(Debug, Serialize)]
struct Info {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct Server {
    url: String,
}

#[derive(Debug, Serialize)]
struct Tag {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Operation {
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_body: Option<RequestBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    security: Option<Vec<SecurityRequirement>>,
    responses: IndexMap<String, Response>,
}

#[derive(Debug, Serialize)]
struct Parameter {
    name: String,
    #[serde(rename = "in")]
    location: &'static str,
    required: bool,
    schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct RequestBody {
    content: IndexMap<String, MediaType>,
}

#[derive(Debug, Serialize)]
struct MediaType {
    schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    example: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Response {
    description: &'static str,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct Components {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    security_schemes: IndexMap<String, Value>,
}

impl Components {
    fn is_empty(&self) -> bool {
        self.security_schemes.is_empty()
    }
}

type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Serialize a collection as an OpenAPI 3.0.3 document
pub fn to_openapi(collection: &Collection) -> Result<String> {
    let mut builder = Builder::default();
    let security = collection
        .auth
        .as_ref()
        .map(|auth| builder.security(auth));

    for request in &collection.requests {
        builder.add(request, None);
    }
    let mut tags = Vec::new();
    for folder in &collection.folders {
        tags.push(Tag {
            name: folder.name.clone(),
            description: folder.description.clone(),
        });
        builder.add_folder(folder, &folder.name);
    }

    let servers = collection
        .variable("baseUrl")
        .map(|var| var.value.trim())
        .filter(|url| !url.is_empty())
        .map(|url| vec![Server { url: url.to_string() }])
        .unwrap_or_default();

    let document = Document {
        openapi: OPENAPI_VERSION,
        info: Info {
            title: collection.name.clone(),
            description: collection.description.clone(),
            version: "1.0.0",
        },
        servers,
        tags,
        paths: builder.paths,
        components: builder.components,
        security,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

#[derive(Default)]
struct Builder {
    paths: IndexMap<String, IndexMap<String, Operation>>,
    components: Components,
}

impl Builder {
    fn add_folder(&mut self, folder: &Folder, tag: &str) {
        for request in &folder.requests {
            self.add(request, Some(tag));
        }
        for sub in &folder.folders {
            self.add_folder(sub, tag);
        }
    }

    fn add(&mut self, request: &Request, tag: Option<&str>) {
        let method = request.method.to_ascii_lowercase();
        if !METHODS.contains(&method.as_str()) {
            debug!(
                "Skipping '{}': method {} has no OpenAPI operation",
                request.name, request.method
            );
            return;
        }

        let (path, path_params) = openapi_path(&request.url);
        let mut parameters: Vec<Parameter> = path_params
            .into_iter()
            .map(|name| Parameter {
                name,
                location: "path",
                required: true,
                schema: json!({"type": "string"}),
                example: None,
                description: None,
            })
            .collect();
        parameters.extend(
            request
                .params
                .iter()
                .filter(|p| p.enabled)
                .map(|p| parameter(p, "query")),
        );
        parameters.extend(
            request
                .headers
                .iter()
                .filter(|h| h.enabled)
                .filter(|h| {
                    !h.key.eq_ignore_ascii_case("content-type")
                        && !h.key.eq_ignore_ascii_case("authorization")
                })
                .map(|h| parameter(h, "header")),
        );

        let security = request.auth.as_ref().map(|auth| self.security(auth));
        let operation = Operation {
            summary: request.name.clone(),
            description: request.description.clone(),
            tags: tag.map(|t| vec![t.to_string()]).unwrap_or_default(),
            parameters,
            request_body: request_body(request),
            security,
            responses: IndexMap::from([(
                "200".to_string(),
                Response {
                    description: "Successful response",
                },
            )]),
        };

        let operations = self.paths.entry(path.clone()).or_default();
        if operations.insert(method.clone(), operation).is_some() {
            debug!(
                "Duplicate operation {} {}; keeping '{}'",
                method.to_uppercase(),
                path,
                request.name
            );
        }
    }

    /// Register the scheme for `auth` and return the requirement list
    ///
    /// `Auth::None` yields an empty list, which marks an operation public.
    fn security(&mut self, auth: &Auth) -> Vec<SecurityRequirement> {
        let (name, scheme) = match auth {
            Auth::None => return Vec::new(),
            Auth::Bearer { .. } => (
                "bearerAuth".to_string(),
                json!({"type": "http", "scheme": "bearer"}),
            ),
            Auth::Basic { .. } => (
                "basicAuth".to_string(),
                json!({"type": "http", "scheme": "basic"}),
            ),
            Auth::ApiKey { key, location, .. } => {
                let location = match location {
                    ApiKeyLocation::Header => "header",
                    ApiKeyLocation::Query => "query",
                };
                (
                    "apiKeyAuth".to_string(),
                    json!({"type": "apiKey", "name": key, "in": location}),
                )
            }
            Auth::OAuth2(oauth) => {
                let flow_name = match oauth.grant_type.as_deref() {
                    Some("client_credentials") => "clientCredentials",
                    Some("password") => "password",
                    Some("implicit") => "implicit",
                    _ => "authorizationCode",
                };
                let mut flow = serde_json::Map::new();
                if matches!(flow_name, "authorizationCode" | "implicit") {
                    flow.insert(
                        "authorizationUrl".into(),
                        json!(oauth.auth_url.clone().unwrap_or_default()),
                    );
                }
                if flow_name != "implicit" {
                    flow.insert(
                        "tokenUrl".into(),
                        json!(oauth.access_token_url.clone().unwrap_or_default()),
                    );
                }
                let scopes: serde_json::Map<String, Value> = oauth
                    .scope
                    .as_deref()
                    .unwrap_or_default()
                    .split_whitespace()
                    .map(|scope| (scope.to_string(), json!("")))
                    .collect();
                flow.insert("scopes".into(), Value::Object(scopes));
                (
                    "oauth2Auth".to_string(),
                    json!({"type": "oauth2", "flows": {(flow_name): Value::Object(flow)}}),
                )
            }
        };

        let name = self.register_scheme(name, scheme);
        vec![IndexMap::from([(name, Vec::new())])]
    }

    /// Insert a scheme, suffixing the name when a different scheme holds it
    fn register_scheme(&mut self, base: String, scheme: Value) -> String {
        let schemes = &mut self.components.security_schemes;
        let mut name = base.clone();
        let mut counter = 2;
        loop {
            match schemes.get(&name) {
                None => {
                    schemes.insert(name.clone(), scheme);
                    return name;
                }
                Some(existing) if *existing == scheme => return name,
                Some(_) => {
                    name = format!("{}{}", base, counter);
                    counter += 1;
                }
            }
        }
    }
}

fn parameter(kv: &KeyValue, location: &'static str) -> Parameter {
    Parameter {
        name: kv.key.clone(),
        location,
        required: false,
        schema: json!({"type": "string"}),
        example: Some(kv.value.clone()).filter(|v| !v.is_empty()),
        description: kv.description.clone(),
    }
}

/// URL path with `{{var}}` segments turned into `{var}`, plus their names
fn openapi_path(url: &str) -> (String, Vec<String>) {
    let (_, path) = split_origin(url);
    let mut names = Vec::new();
    let segments: Vec<String> = path
        .split('/')
        .map(|segment| {
            let name = segment
                .strip_prefix("{{")
                .and_then(|s| s.strip_suffix("}}"))
                .map(str::trim)
                .filter(|name| !name.is_empty() && !name.contains(['{', '}']));
            match name {
                Some(name) => {
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                    format!("{{{}}}", name)
                }
                None => segment.to_string(),
            }
        })
        .collect();
    (segments.join("/"), names)
}

fn request_body(request: &Request) -> Option<RequestBody> {
    let declared = request
        .header("Content-Type")
        .map(|h| h.value.split(';').next().unwrap_or_default().trim().to_string())
        .filter(|v| !v.is_empty());

    let (media_type, schema, example) = match &request.body {
        Body::None => return None,
        Body::Json { content } => match serde_json::from_str::<Value>(content) {
            Ok(value) => ("application/json".to_string(), infer_schema(&value), value),
            Err(_) => (
                "application/json".to_string(),
                json!({"type": "string"}),
                json!(content),
            ),
        },
        Body::Text { content } | Body::Xml { content } | Body::Html { content } => (
            declared
                .clone()
                .or_else(|| request.body.content_type().map(str::to_string))
                .unwrap_or_else(|| "text/plain".to_string()),
            json!({"type": "string"}),
            json!(content),
        ),
        Body::FormUrlencoded { form_data } | Body::FormData { form_data } => {
            let media_type = request.body.content_type().unwrap_or_default().to_string();
            let properties: serde_json::Map<String, Value> = form_data
                .iter()
                .filter(|f| f.enabled)
                .map(|field| {
                    let schema = if field.kind.is_text() {
                        json!({"type": "string"})
                    } else {
                        json!({"type": "string", "format": "binary"})
                    };
                    (field.key.clone(), schema)
                })
                .collect();
            let example: serde_json::Map<String, Value> = form_data
                .iter()
                .filter(|f| f.enabled && f.kind.is_text())
                .map(|f| (f.key.clone(), json!(f.value)))
                .collect();
            (
                media_type,
                json!({"type": "object", "properties": properties}),
                Value::Object(example),
            )
        }
        Body::Binary { .. } => (
            "application/octet-stream".to_string(),
            json!({"type": "string", "format": "binary"}),
            Value::Null,
        ),
        Body::GraphQl { query, variables } => {
            let variables = serde_json::from_str::<Value>(variables).unwrap_or(Value::Null);
            let example = json!({"query": query, "variables": variables});
            ("application/json".to_string(), infer_schema(&example), example)
        }
    };

    let example = Some(example).filter(|e| !e.is_null());
    Some(RequestBody {
        content: IndexMap::from([(media_type, MediaType { schema, example })]),
    })
}

/// A JSON schema describing the shape of an example value
fn infer_schema(value: &Value) -> Value {
    match value {
        Value::Null => json!({"nullable": true}),
        Value::Bool(_) => json!({"type": "boolean"}),
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({"type": "integer"}),
        Value::Number(_) => json!({"type": "number"}),
        Value::String(_) => json!({"type": "string"}),
        Value::Array(items) => {
            let items = items.first().map(infer_schema).unwrap_or_else(|| json!({}));
            json!({"type": "array", "items": items})
        }
        Value::Object(map) => {
            let properties: serde_json::Map<String, Value> = map
                .iter()
                .map(|(key, value)| (key.clone(), infer_schema(value)))
                .collect();
            json!({"type": "object", "properties": properties})
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiport_common::Variable;

    fn export(collection: &Collection) -> Value {
        serde_json::from_str(&to_openapi(collection).unwrap()).unwrap()
    }

    #[test]
    fn test_openapi_path() {
        assert_eq!(
            openapi_path("{{baseUrl}}/pets/{{petId}}?x=1"),
            ("/pets/{petId}".to_string(), vec!["petId".to_string()])
        );
        assert_eq!(
            openapi_path("https://x.test:8080/a/b"),
            ("/a/b".to_string(), Vec::new())
        );
        assert_eq!(openapi_path("https://x.test"), ("/".to_string(), Vec::new()));
    }

    #[test]
    fn test_document_shape() {
        let mut collection = Collection::new("Pets");
        collection
            .variables
            .push(Variable::new("baseUrl", "https://pets.test/v1"));
        let mut folder = Folder::new("pets");
        let mut get = Request::new("Get pet", "GET", "{{baseUrl}}/pets/{{petId}}?expand=owner");
        get.params = vec![KeyValue::new("expand", "owner")];
        get.headers = vec![KeyValue::new("X-Trace", "1")];
        folder.requests.push(get);
        collection.folders.push(folder);

        let value = export(&collection);
        assert_eq!(value["openapi"], "3.0.3");
        assert_eq!(value["info"]["title"], "Pets");
        assert_eq!(value["servers"][0]["url"], "https://pets.test/v1");

        let operation = &value["paths"]["/pets/{petId}"]["get"];
        assert_eq!(operation["summary"], "Get pet");
        assert_eq!(operation["tags"], json!(["pets"]));
        let locations: Vec<&str> = operation["parameters"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["in"].as_str().unwrap())
            .collect();
        assert_eq!(locations, vec!["path", "query", "header"]);
        assert_eq!(operation["parameters"][0]["required"], true);
    }

    #[test]
    fn test_json_body_schema_is_inferred() {
        let mut collection = Collection::new("Body");
        let mut post = Request::new("Create", "POST", "{{baseUrl}}/items");
        post.body = Body::Json {
            content: r#"{"name": "a", "count": 2, "tags": ["x"]}"#.to_string(),
        };
        collection.requests.push(post);

        let value = export(&collection);
        let media = &value["paths"]["/items"]["post"]["requestBody"]["content"]["application/json"];
        assert_eq!(media["schema"]["properties"]["count"]["type"], "integer");
        assert_eq!(media["schema"]["properties"]["tags"]["items"]["type"], "string");
        assert_eq!(media["example"]["name"], "a");
    }

    #[test]
    fn test_security_schemes() {
        let mut collection = Collection::new("Secure");
        collection.auth = Some(Auth::Bearer {
            token: "{{token}}".to_string(),
        });
        let mut public = Request::new("Health", "GET", "{{baseUrl}}/health");
        public.auth = Some(Auth::None);
        collection.requests.push(public);
        let mut keyed = Request::new("Key", "GET", "{{baseUrl}}/key");
        keyed.auth = Some(Auth::ApiKey {
            key: "X-Key".to_string(),
            value: "{{key}}".to_string(),
            location: ApiKeyLocation::Header,
        });
        collection.requests.push(keyed);

        let value = export(&collection);
        assert_eq!(value["security"], json!([{"bearerAuth": []}]));
        assert_eq!(value["paths"]["/health"]["get"]["security"], json!([]));
        assert_eq!(
            value["paths"]["/key"]["get"]["security"],
            json!([{"apiKeyAuth": []}])
        );
        assert_eq!(
            value["components"]["securitySchemes"]["apiKeyAuth"]["name"],
            "X-Key"
        );
    }

    #[test]
    fn test_conflicting_api_keys_get_distinct_names() {
        let mut builder = Builder::default();
        let header = Auth::ApiKey {
            key: "A".to_string(),
            value: String::new(),
            location: ApiKeyLocation::Header,
        };
        let query = Auth::ApiKey {
            key: "B".to_string(),
            value: String::new(),
            location: ApiKeyLocation::Query,
        };
        builder.security(&header);
        let second = builder.security(&query);
        assert!(second[0].contains_key("apiKeyAuth2"));
        assert_eq!(builder.security(&header)[0].keys().next().unwrap(), "apiKeyAuth");
    }
}
