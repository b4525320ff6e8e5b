//! Rebuilds the Insomnia resource tree as canonical collections

use super::types::{
    InsomniaAuth, InsomniaBody, InsomniaEnvironment, InsomniaRequest, Pair, RequestGroup,
    Resource, Workspace,
};
use crate::postman::value_to_string;
use crate::regex_util::static_regex;
use crate::variables::classify_variable;
use apiport_common::url::{build_query, query_params};
use apiport_common::{
    ApiKeyLocation, Auth, Body, Collection, Environment, Folder, ImportWarning, KeyValue,
    OAuth2Auth, Request, Variable, WarningKind,
};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

static_regex!(fn insomnia_variable_regex, r"\{\{\s*_\.([A-Za-z0-9_\-.]+)\s*\}\}");

/// Converted export: collections in workspace order plus environments
pub struct Converted {
    pub collections: Vec<Collection>,
    pub environments: Vec<Environment>,
    pub warnings: Vec<ImportWarning>,
}

/// Rewrite `{{ _.name }}` references to `{{name}}`
pub fn rewrite_variables(text: &str) -> String {
    insomnia_variable_regex()
        .replace_all(text, "{{${1}}}")
        .into_owned()
}

/// Folder or request resource placed under a parent
#[derive(Clone, Copy)]
enum Child<'a> {
    Group(&'a RequestGroup),
    Request(&'a InsomniaRequest),
}

impl<'a> Child<'a> {
    fn parent_id(&self) -> Option<&'a str> {
        match *self {
            Child::Group(group) => group.parent_id.as_deref(),
            Child::Request(request) => request.parent_id.as_deref(),
        }
    }

    fn sort_key(&self) -> Option<f64> {
        match *self {
            Child::Group(group) => group.meta_sort_key,
            Child::Request(request) => request.meta_sort_key,
        }
    }
}

struct Tree<'a> {
    children: Vec<Child<'a>>,
    warnings: Vec<ImportWarning>,
    unsupported_auth: BTreeSet<String>,
    visited: HashSet<&'a str>,
}

/// Convert typed resources into collections and environments
pub fn convert_resources(resources: &[Resource]) -> Converted {
    let mut workspaces: Vec<&Workspace> = Vec::new();
    let mut children: Vec<Child<'_>> = Vec::new();
    let mut environments: Vec<&InsomniaEnvironment> = Vec::new();
    let mut skipped: BTreeSet<&str> = BTreeSet::new();

    for resource in resources {
        match resource {
            Resource::Workspace(workspace) => workspaces.push(workspace),
            Resource::RequestGroup(group) => children.push(Child::Group(group)),
            Resource::Request(request) => children.push(Child::Request(request)),
            Resource::Environment(environment) => environments.push(environment),
            Resource::Other(kind) => {
                skipped.insert(kind.as_str());
            }
        }
    }

    let mut warnings: Vec<ImportWarning> = skipped
        .iter()
        .map(|kind| {
            debug!("Skipping Insomnia resources of type '{}'", kind);
            ImportWarning::new(
                WarningKind::UnsupportedFeature,
                format!("Insomnia resources of type '{}' are not supported and were skipped", kind),
            )
        })
        .collect();

    // stable sort: ascending key, missing keys last
    children.sort_by(|a, b| match (a.sort_key(), b.sort_key()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let mut tree = Tree {
        children,
        warnings: Vec::new(),
        unsupported_auth: BTreeSet::new(),
        visited: HashSet::new(),
    };

    // parents that are neither a known group nor a workspace
    let known: HashSet<&str> = tree
        .children
        .iter()
        .filter_map(|child| match child {
            Child::Group(group) => Some(group.id.as_str()),
            Child::Request(_) => None,
        })
        .chain(workspaces.iter().map(|workspace| workspace.id.as_str()))
        .collect();
    let roots: Vec<Option<&str>> = tree
        .children
        .iter()
        .map(Child::parent_id)
        .filter(|parent| parent.map_or(true, |id| !known.contains(id)))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut collections = if workspaces.is_empty() {
        let mut collection = Collection::new("Insomnia Import");
        for &root in &roots {
            let (folders, requests) = tree.build(root);
            collection.folders.extend(folders);
            collection.requests.extend(requests);
        }
        vec![collection]
    } else {
        workspaces
            .iter()
            .map(|workspace| {
                let name = if workspace.name.is_empty() {
                    "Insomnia Import"
                } else {
                    workspace.name.as_str()
                };
                let mut collection = Collection::new(name);
                collection.description = non_empty(workspace.description.as_deref());
                let (folders, requests) = tree.build(Some(workspace.id.as_str()));
                collection.folders = folders;
                collection.requests = requests;
                collection
            })
            .collect()
    };

    // requests with no reachable workspace land in the first one
    if !workspaces.is_empty() {
        if let Some(first) = collections.first_mut() {
            for root in roots {
                let (folders, requests) = tree.build(root);
                if folders.is_empty() && requests.is_empty() {
                    continue;
                }
                let count =
                    requests.len() + folders.iter().map(Folder::request_count).sum::<usize>();
                tree.warnings.push(ImportWarning::new(
                    WarningKind::ConversionNote,
                    format!(
                        "{} request(s) under unknown parent '{}' were placed at the root of '{}'",
                        count,
                        root.unwrap_or("none"),
                        first.name
                    ),
                ));
                first.folders.extend(folders);
                first.requests.extend(requests);
            }
        }
    }

    warnings.append(&mut tree.warnings);

    Converted {
        collections,
        environments: environments.into_iter().map(convert_environment).collect(),
        warnings,
    }
}

impl<'a> Tree<'a> {
    /// Folders and requests directly under `parent`
    fn build(&mut self, parent: Option<&str>) -> (Vec<Folder>, Vec<Request>) {
        let mut folders = Vec::new();
        let mut requests = Vec::new();

        let matching: Vec<usize> = (0..self.children.len())
            .filter(|&i| self.children[i].parent_id() == parent)
            .collect();

        for index in matching {
            match self.children[index] {
                Child::Group(group) => {
                    if !self.visited.insert(group.id.as_str()) {
                        continue;
                    }
                    let mut folder = Folder::new(group.name.as_str());
                    folder.description = non_empty(group.description.as_deref());
                    let (sub_folders, sub_requests) = self.build(Some(group.id.as_str()));
                    folder.folders = sub_folders;
                    folder.requests = sub_requests;
                    folders.push(folder);
                }
                Child::Request(request) => requests.push(self.request(request)),
            }
        }

        (folders, requests)
    }

    fn request(&mut self, source: &InsomniaRequest) -> Request {
        let name = if source.name.is_empty() {
            "Untitled Request"
        } else {
            source.name.as_str()
        };
        let method = source.method.as_deref().unwrap_or("GET");

        let base_url = rewrite_variables(&source.url);
        let mut params = query_params(&base_url);
        let extra: Vec<KeyValue> = source.parameters.iter().map(pair).collect();
        let extra_query = build_query(&extra);
        let url = if extra_query.is_empty() {
            base_url
        } else if base_url.contains('?') {
            format!("{}&{}", base_url, extra_query)
        } else {
            format!("{}?{}", base_url, extra_query)
        };
        params.extend(extra);

        let mut request = Request::new(name, method, url);
        request.description = non_empty(source.description.as_deref());
        request.params = params;
        request.headers = source.headers.iter().map(pair).collect();
        request.body = source.body.as_ref().map(convert_body).unwrap_or_default();
        request.auth = source
            .authentication
            .as_ref()
            .and_then(|auth| self.auth(auth, name));
        request
    }

    fn auth(&mut self, auth: &InsomniaAuth, request_name: &str) -> Option<Auth> {
        let auth_type = auth.auth_type.as_deref()?;
        if auth.disabled {
            return Some(Auth::None);
        }
        let text = |value: &Option<String>| rewrite_variables(value.as_deref().unwrap_or_default());
        let optional = |value: &Option<String>| non_empty(value.as_deref()).map(|v| rewrite_variables(&v));

        match auth_type {
            "none" => Some(Auth::None),
            "bearer" => Some(Auth::Bearer {
                token: text(&auth.token),
            }),
            "basic" => Some(Auth::Basic {
                username: text(&auth.username),
                password: text(&auth.password),
            }),
            "apikey" => Some(Auth::ApiKey {
                key: text(&auth.key),
                value: text(&auth.value),
                location: if auth.add_to.as_deref() == Some("queryParams") {
                    ApiKeyLocation::Query
                } else {
                    ApiKeyLocation::Header
                },
            }),
            "oauth2" => Some(Auth::OAuth2(OAuth2Auth {
                access_token: text(&auth.access_token),
                token_type: None,
                grant_type: optional(&auth.grant_type),
                auth_url: optional(&auth.authorization_url),
                access_token_url: optional(&auth.access_token_url),
                client_id: optional(&auth.client_id),
                client_secret: optional(&auth.client_secret),
                scope: optional(&auth.scope),
            })),
            other => {
                if self.unsupported_auth.insert(other.to_string()) {
                    self.warnings.push(
                        ImportWarning::new(
                            WarningKind::UnsupportedFeature,
                            format!("Auth type '{}' is not supported and was dropped", other),
                        )
                        .with_resource(None, request_name),
                    );
                }
                None
            }
        }
    }
}

fn pair(pair: &Pair) -> KeyValue {
    KeyValue::new(rewrite_variables(&pair.name), rewrite_variables(&pair.value))
        .with_enabled(!pair.disabled)
        .with_description(pair.description.clone())
}

fn convert_body(body: &InsomniaBody) -> Body {
    let mime = body
        .mime_type
        .as_deref()
        .unwrap_or_default()
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let text = rewrite_variables(body.text.as_deref().unwrap_or_default());

    match mime.as_str() {
        "application/json" => Body::Json { content: text },
        "application/xml" | "text/xml" => Body::Xml { content: text },
        "text/html" => Body::Html { content: text },
        "application/x-www-form-urlencoded" => Body::FormUrlencoded {
            form_data: body.params.iter().map(pair).collect(),
        },
        "multipart/form-data" => Body::FormData {
            form_data: body
                .params
                .iter()
                .map(|p| {
                    if p.param_type.as_deref() == Some("file") {
                        KeyValue::file(
                            rewrite_variables(&p.name),
                            p.file_name.clone().unwrap_or_default(),
                        )
                        .with_enabled(!p.disabled)
                        .with_description(p.description.clone())
                    } else {
                        pair(p)
                    }
                })
                .collect(),
        },
        "application/graphql" => graphql_body(&text),
        "application/octet-stream" => Body::Binary {
            content: body.file_name.clone().unwrap_or_default(),
        },
        _ if text.is_empty() => Body::None,
        _ => Body::Text { content: text },
    }
}

/// GraphQL bodies store `{"query": ..., "variables": ...}` as text
fn graphql_body(text: &str) -> Body {
    let parsed: Option<serde_json::Value> = serde_json::from_str(text).ok();
    match parsed {
        Some(value) => Body::GraphQl {
            query: value
                .get("query")
                .and_then(|q| q.as_str())
                .unwrap_or_default()
                .to_string(),
            variables: value
                .get("variables")
                .and_then(value_to_string)
                .unwrap_or_default(),
        },
        None => Body::GraphQl {
            query: text.to_string(),
            variables: String::new(),
        },
    }
}

fn convert_environment(environment: &InsomniaEnvironment) -> Environment {
    let variables = environment
        .data
        .iter()
        .map(|(key, value)| {
            Variable::new(key.as_str(), value_to_string(value).unwrap_or_default())
                .with_type(classify_variable(key))
        })
        .collect();
    let name = if environment.name.is_empty() {
        "Insomnia Environment"
    } else {
        environment.name.as_str()
    };
    Environment::new(name, variables)
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_variables() {
        assert_eq!(
            rewrite_variables("{{ _.base_url }}/users/{{_.id}}"),
            "{{base_url}}/users/{{id}}"
        );
        assert_eq!(rewrite_variables("{{ plain }}"), "{{ plain }}");
    }

    #[test]
    fn test_body_mime_table() {
        let body = |mime: &str, text: &str| InsomniaBody {
            mime_type: Some(mime.to_string()),
            text: Some(text.to_string()),
            ..Default::default()
        };
        assert!(matches!(convert_body(&body("application/json", "{}")), Body::Json { .. }));
        assert!(matches!(convert_body(&body("text/xml", "<a/>")), Body::Xml { .. }));
        assert!(matches!(convert_body(&body("", "hello")), Body::Text { .. }));
        assert!(convert_body(&body("", "")).is_none());

        let graphql = convert_body(&body(
            "application/graphql",
            r#"{"query": "{ me { id } }", "variables": {"a": 1}}"#,
        ));
        assert_eq!(
            graphql,
            Body::GraphQl {
                query: "{ me { id } }".to_string(),
                variables: r#"{"a":1}"#.to_string(),
            }
        );
    }

    #[test]
    fn test_children_sorted_by_meta_sort_key() {
        let resources: Vec<Resource> = [
            serde_json::json!({"_id": "wrk", "_type": "workspace", "name": "W"}),
            serde_json::json!({"_id": "r3", "_type": "request", "parentId": "wrk", "name": "none", "url": "/c"}),
            serde_json::json!({"_id": "r2", "_type": "request", "parentId": "wrk", "name": "second", "url": "/b", "metaSortKey": 5}),
            serde_json::json!({"_id": "r1", "_type": "request", "parentId": "wrk", "name": "first", "url": "/a", "metaSortKey": -5}),
        ]
        .into_iter()
        .map(|v| Resource::from_value(v).unwrap())
        .collect();

        let converted = convert_resources(&resources);
        let names: Vec<&str> = converted.collections[0]
            .requests
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second", "none"]);
    }

    #[test]
    fn test_parameters_are_appended_to_url() {
        let resources = vec![Resource::from_value(serde_json::json!({
            "_id": "r1", "_type": "request", "name": "search",
            "url": "https://x.test/search?q=a",
            "parameters": [{"name": "page", "value": "2"}, {"name": "off", "value": "1", "disabled": true}]
        }))
        .unwrap()];
        let converted = convert_resources(&resources);
        let request = &converted.collections[0].requests[0];
        assert_eq!(request.url, "https://x.test/search?q=a&page=2");
        assert_eq!(request.params.len(), 3);
    }
}
