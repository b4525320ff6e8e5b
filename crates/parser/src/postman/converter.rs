//! Converts Postman documents to the canonical model

use super::types::{
    Event, Headers, Item, PostmanAuth, PostmanBody, PostmanCollection, PostmanEnvironment,
    PostmanVariable, RequestOrUrl, Url, UrlObject, value_to_string,
};
use crate::variables::classify_variable;
use apiport_common::url::{query_params, with_query};
use apiport_common::{
    ApiKeyLocation, Auth, Body, Collection, Environment, Folder, ImportWarning, KeyValue,
    OAuth2Auth, Request, Variable, VariableType, WarningKind,
};
use std::collections::BTreeSet;

/// Accumulates warnings while walking a collection
#[derive(Default)]
struct Conversion {
    warnings: Vec<ImportWarning>,
    unsupported_auth: BTreeSet<String>,
}

/// Convert a Postman collection into a canonical collection
pub fn convert_collection(doc: &PostmanCollection) -> (Collection, Vec<ImportWarning>) {
    let mut conversion = Conversion::default();

    let name = if doc.info.name.is_empty() {
        "Imported Collection".to_string()
    } else {
        doc.info.name.clone()
    };
    let mut collection = Collection::new(name);
    collection.description = doc.info.description.as_ref().and_then(|d| d.text());
    collection.variables = doc.variable.iter().filter_map(convert_variable).collect();
    collection.auth = doc
        .auth
        .as_ref()
        .and_then(|auth| conversion.auth(auth));

    if !doc.event.is_empty() {
        conversion.warnings.push(ImportWarning::new(
            WarningKind::UnsupportedFeature,
            "Collection-level scripts are not supported and were skipped",
        ));
    }

    for item in &doc.item {
        match conversion.item(item) {
            Some(Node::Folder(folder)) => collection.folders.push(folder),
            Some(Node::Request(request)) => collection.requests.push(request),
            None => {}
        }
    }

    (collection, conversion.warnings)
}

/// Convert a Postman environment or globals file
pub fn convert_environment(doc: &PostmanEnvironment) -> Vec<Variable> {
    doc.values
        .iter()
        .map(|value| {
            let var_type = if value.var_type.as_deref() == Some("secret") {
                VariableType::Secret
            } else {
                classify_variable(&value.key)
            };
            Variable::new(
                value.key.as_str(),
                value
                    .value
                    .as_ref()
                    .and_then(value_to_string)
                    .unwrap_or_default(),
            )
            .with_type(var_type)
            .with_enabled(value.enabled != Some(false))
        })
        .collect()
}

fn convert_variable(var: &PostmanVariable) -> Option<Variable> {
    let key = var.key.clone().or_else(|| var.id.clone())?;
    let var_type = if var.var_type.as_deref() == Some("secret") {
        VariableType::Secret
    } else {
        classify_variable(&key)
    };
    let value = var
        .value
        .as_ref()
        .and_then(value_to_string)
        .unwrap_or_default();

    Some(
        Variable::new(key, value)
            .with_type(var_type)
            .with_enabled(!var.disabled)
            .with_description(var.description.as_ref().and_then(|d| d.text())),
    )
}

enum Node {
    Folder(Folder),
    Request(Request),
}

impl Conversion {
    fn item(&mut self, item: &Item) -> Option<Node> {
        if let Some(children) = &item.item {
            return Some(Node::Folder(self.folder(item, children)));
        }
        let request = item.request.as_ref()?;
        Some(Node::Request(self.request(item, request)))
    }

    fn folder(&mut self, item: &Item, children: &[Item]) -> Folder {
        let mut folder = Folder::new(item.name.as_str());
        folder.description = item.description.as_ref().and_then(|d| d.text());

        if item.auth.is_some() {
            self.warnings.push(
                ImportWarning::new(
                    WarningKind::UnsupportedFeature,
                    format!(
                        "Folder-level auth on '{}' is not supported; set auth on its requests instead",
                        item.name
                    ),
                )
                .with_resource(None, item.name.as_str()),
            );
        }
        if !item.event.is_empty() {
            self.warnings.push(
                ImportWarning::new(
                    WarningKind::UnsupportedFeature,
                    format!(
                        "Folder-level scripts on '{}' are not supported and were skipped",
                        item.name
                    ),
                )
                .with_resource(None, item.name.as_str()),
            );
        }

        for child in children {
            match self.item(child) {
                Some(Node::Folder(sub)) => folder.folders.push(sub),
                Some(Node::Request(request)) => folder.requests.push(request),
                None => {}
            }
        }
        folder
    }

    fn request(&mut self, item: &Item, source: &RequestOrUrl) -> Request {
        let name = if item.name.is_empty() {
            "Untitled Request"
        } else {
            item.name.as_str()
        };

        let source = match source {
            RequestOrUrl::Url(url) => {
                let mut request = Request::new(name, "GET", url.as_str());
                request.params = query_params(url);
                return request;
            }
            RequestOrUrl::Request(source) => source.as_ref(),
        };

        let (url, params) = convert_url(source.url.as_ref());
        let method = source.method.as_deref().unwrap_or("GET");
        let mut request = Request::new(name, method, url);
        request.params = params;
        request.description = item
            .description
            .as_ref()
            .or(source.description.as_ref())
            .and_then(|d| d.text());
        request.headers = convert_headers(source.header.as_ref());
        request.body = source
            .body
            .as_ref()
            .map(|body| convert_body(body, &request.headers))
            .unwrap_or_default();
        request.auth = source.auth.as_ref().and_then(|auth| self.auth(auth));
        request.pre_request_script = script(&item.event, "prerequest");
        request.test_script = script(&item.event, "test");
        request
    }

    fn auth(&mut self, auth: &PostmanAuth) -> Option<Auth> {
        let param = |key: &str| auth.param(key).unwrap_or_default();
        let optional = |key: &str| auth.param(key).filter(|v| !v.is_empty());

        match auth.auth_type.as_str() {
            "noauth" => Some(Auth::None),
            "bearer" => Some(Auth::Bearer {
                token: param("token"),
            }),
            "basic" => Some(Auth::Basic {
                username: param("username"),
                password: param("password"),
            }),
            "apikey" => Some(Auth::ApiKey {
                key: param("key"),
                value: param("value"),
                location: if param("in") == "query" {
                    ApiKeyLocation::Query
                } else {
                    ApiKeyLocation::Header
                },
            }),
            "oauth2" => Some(Auth::OAuth2(OAuth2Auth {
                access_token: param("accessToken"),
                token_type: optional("tokenType").or_else(|| optional("headerPrefix")),
                grant_type: optional("grant_type"),
                auth_url: optional("authUrl"),
                access_token_url: optional("accessTokenUrl"),
                client_id: optional("clientId"),
                client_secret: optional("clientSecret"),
                scope: optional("scope"),
            })),
            other => {
                if self.unsupported_auth.insert(other.to_string()) {
                    self.warnings.push(ImportWarning::new(
                        WarningKind::UnsupportedFeature,
                        format!("Auth type '{}' is not supported and was dropped", other),
                    ));
                }
                None
            }
        }
    }
}

/// Resolve a Postman URL into `(url, params)`
fn convert_url(url: Option<&Url>) -> (String, Vec<KeyValue>) {
    match url {
        None => (String::new(), Vec::new()),
        Some(Url::Raw(raw)) => (raw.clone(), query_params(raw)),
        Some(Url::Object(object)) => {
            let params: Vec<KeyValue> = if object.query.is_empty() {
                object.raw.as_deref().map(query_params).unwrap_or_default()
            } else {
                object
                    .query
                    .iter()
                    .filter_map(|q| {
                        let key = q.key.clone()?;
                        Some(
                            KeyValue::new(key, q.value.clone().unwrap_or_default())
                                .with_enabled(!q.disabled)
                                .with_description(q.description.as_ref().and_then(|d| d.text())),
                        )
                    })
                    .collect()
            };

            let url = match &object.raw {
                Some(raw) => raw.clone(),
                None => with_query(&rebuild_url(object), &params),
            };
            (url, params)
        }
    }
}

/// `protocol://host.joined.with.dots[:port]/path/joined/with/slashes`
fn rebuild_url(object: &UrlObject) -> String {
    let mut url = String::new();
    if let Some(protocol) = &object.protocol {
        url.push_str(protocol);
        url.push_str("://");
    }
    if let Some(host) = &object.host {
        url.push_str(&host.join("."));
    }
    if let Some(port) = &object.port {
        url.push(':');
        url.push_str(port);
    }
    if let Some(path) = &object.path {
        let joined = path.join("/");
        if !joined.is_empty() {
            if !joined.starts_with('/') {
                url.push('/');
            }
            url.push_str(&joined);
        }
    }
    url
}

fn convert_headers(headers: Option<&Headers>) -> Vec<KeyValue> {
    match headers {
        None => Vec::new(),
        Some(Headers::List(list)) => list
            .iter()
            .map(|h| {
                KeyValue::new(h.key.as_str(), h.value.as_str())
                    .with_enabled(!h.disabled)
                    .with_description(h.description.as_ref().and_then(|d| d.text()))
            })
            .collect(),
        Some(Headers::Raw(raw)) => raw
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                let (enabled, line) = match line.strip_prefix("//") {
                    Some(rest) => (false, rest.trim()),
                    None => (true, line),
                };
                let (key, value) = line.split_once(':')?;
                Some(KeyValue::new(key.trim(), value.trim()).with_enabled(enabled))
            })
            .collect(),
    }
}

fn convert_body(body: &PostmanBody, headers: &[KeyValue]) -> Body {
    if body.disabled {
        return Body::None;
    }

    match body.mode.as_deref() {
        Some("raw") => {
            let content = body.raw.clone().unwrap_or_default();
            if content.is_empty() {
                return Body::None;
            }
            let language = body
                .options
                .as_ref()
                .and_then(|o| o.raw.as_ref())
                .and_then(|r| r.language.clone());
            raw_body(content, language.as_deref(), headers)
        }
        Some("urlencoded") => Body::FormUrlencoded {
            form_data: body
                .urlencoded
                .iter()
                .map(|p| {
                    KeyValue::new(p.key.as_str(), p.value.clone().unwrap_or_default())
                        .with_enabled(!p.disabled)
                        .with_description(p.description.as_ref().and_then(|d| d.text()))
                })
                .collect(),
        },
        Some("formdata") => Body::FormData {
            form_data: body
                .formdata
                .iter()
                .map(|p| {
                    let field = if p.param_type.as_deref() == Some("file") {
                        KeyValue::file(p.key.as_str(), file_src(p.src.as_ref()))
                    } else {
                        KeyValue::new(p.key.as_str(), p.value.clone().unwrap_or_default())
                    };
                    field
                        .with_enabled(!p.disabled)
                        .with_description(p.description.as_ref().and_then(|d| d.text()))
                })
                .collect(),
        },
        Some("graphql") => {
            let graphql = body.graphql.as_ref();
            Body::GraphQl {
                query: graphql
                    .and_then(|g| g.query.clone())
                    .unwrap_or_default(),
                variables: graphql
                    .and_then(|g| g.variables.as_ref())
                    .and_then(value_to_string)
                    .unwrap_or_default(),
            }
        }
        Some("file") => Body::Binary {
            content: body
                .file
                .as_ref()
                .and_then(|f| f.src.clone())
                .unwrap_or_default(),
        },
        _ => Body::None,
    }
}

/// Pick the raw body variant from the language hint, else the Content-Type header
fn raw_body(content: String, language: Option<&str>, headers: &[KeyValue]) -> Body {
    let hint = match language {
        Some(language) => language.to_ascii_lowercase(),
        None => headers
            .iter()
            .find(|h| h.enabled && h.key.eq_ignore_ascii_case("content-type"))
            .map(|h| h.value.to_ascii_lowercase())
            .unwrap_or_default(),
    };

    if hint.contains("json") {
        Body::Json { content }
    } else if hint.contains("xml") {
        Body::Xml { content }
    } else if hint.contains("html") {
        Body::Html { content }
    } else {
        Body::Text { content }
    }
}

fn file_src(src: Option<&serde_json::Value>) -> String {
    match src {
        Some(serde_json::Value::String(path)) => path.clone(),
        Some(serde_json::Value::Array(paths)) => paths
            .first()
            .and_then(|p| p.as_str())
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

fn script(events: &[Event], listen: &str) -> Option<String> {
    events
        .iter()
        .find(|event| event.listen == listen)
        .and_then(|event| event.script.as_ref())
        .and_then(|script| script.exec.as_ref())
        .map(|exec| exec.joined())
        .filter(|text| !text.trim().is_empty())
}
