//! Converts OpenAPI / Swagger documents to a canonical collection

use super::example::{render_value, ExampleBuilder};
use super::types::{
    MediaType, OpenApiSpec, Operation, Parameter, RequestBody, SecurityRequirement,
    SecurityScheme,
};
use crate::regex_util::static_regex;
use crate::variables::classify_variable;
use apiport_common::url::with_query;
use apiport_common::{
    ApiKeyLocation, Auth, Body, Collection, Folder, ImportWarning, KeyValue, OAuth2Auth, Request,
    Variable, WarningKind,
};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

static_regex!(fn path_param_regex, r"\{([^{}/]+)\}");

const DEFAULT_BASE_URL: &str = "https://api.example.com";

/// Request media types in order of preference
const MEDIA_PRIORITY: [&str; 6] = [
    "application/json",
    "application/x-www-form-urlencoded",
    "multipart/form-data",
    "application/xml",
    "text/xml",
    "text/plain",
];

struct Converter<'a> {
    spec: &'a OpenApiSpec,
    examples: ExampleBuilder,
    placeholders: Vec<&'static str>,
    unsupported_schemes: BTreeSet<String>,
    warnings: Vec<ImportWarning>,
}

/// Convert an OpenAPI 3.x or Swagger 2.0 document
pub fn convert_spec(spec: &OpenApiSpec) -> (Collection, Vec<ImportWarning>) {
    let mut converter = Converter {
        spec,
        examples: ExampleBuilder::new(),
        placeholders: Vec::new(),
        unsupported_schemes: BTreeSet::new(),
        warnings: Vec::new(),
    };
    let collection = converter.collection();
    (collection, converter.warnings)
}

/// `{name}` path templates become `{{name}}`
pub fn convert_path_template(path: &str) -> String {
    path_param_regex()
        .replace_all(path, "{{${1}}}")
        .into_owned()
}

/// Base URL of the API, without a trailing slash
pub fn base_url(spec: &OpenApiSpec) -> String {
    let url = if spec.is_swagger() {
        let scheme = spec.schemes.first().map_or("https", String::as_str);
        let host = spec.host.as_deref().unwrap_or("api.example.com");
        let base_path = spec.base_path.as_deref().unwrap_or_default();
        format!("{}://{}{}", scheme, host, base_path)
    } else {
        spec.servers
            .first()
            .map(|server| server.resolved_url())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    };
    url.trim_end_matches('/').to_string()
}

impl Converter<'_> {
    fn collection(&mut self) -> Collection {
        let spec = self.spec;
        let name = spec
            .info
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("Imported API");
        let mut collection = Collection::new(name);
        collection.description = spec.info.description.clone().filter(|d| !d.is_empty());
        collection
            .variables
            .push(Variable::new("baseUrl", base_url(spec)));

        collection.auth = spec
            .security
            .as_deref()
            .and_then(|requirements| self.resolve_security(requirements));

        let mut folders: IndexMap<String, Folder> = IndexMap::new();
        for (path, item) in &spec.paths {
            for (method, operation) in item.operations() {
                let request = self.request(path, method, operation, &item.parameters);
                match operation.tags.first() {
                    Some(tag) => folders
                        .entry(tag.clone())
                        .or_insert_with(|| self.folder(tag))
                        .requests
                        .push(request),
                    None => collection.requests.push(request),
                }
            }
        }
        collection.folders = folders.into_values().collect();

        for placeholder in &self.placeholders {
            if collection.variable(placeholder).is_none() {
                collection.variables.push(
                    Variable::new(*placeholder, "").with_type(classify_variable(placeholder)),
                );
            }
        }

        let skipped: Vec<String> = spec
            .paths
            .skipped()
            .iter()
            .map(|key| format!("path '{}'", key))
            .chain(
                spec.security_schemes()
                    .skipped()
                    .iter()
                    .map(|key| format!("security scheme '{}'", key)),
            )
            .collect();
        if !skipped.is_empty() {
            self.warnings.push(ImportWarning::new(
                WarningKind::ConversionNote,
                format!("Skipped unreadable entries: {}", skipped.join(", ")),
            ));
        }

        if self.examples.unresolved_refs > 0 {
            self.warnings.push(ImportWarning::new(
                WarningKind::ConversionNote,
                format!(
                    "{} schema reference(s) were not resolved; their examples are empty objects",
                    self.examples.unresolved_refs
                ),
            ));
        }

        debug!(
            "OpenAPI '{}': {} request(s) in {} folder(s)",
            collection.name,
            collection.request_count(),
            collection.folders.len()
        );
        collection
    }

    fn folder(&self, tag: &str) -> Folder {
        let mut folder = Folder::new(tag);
        folder.description = self
            .spec
            .tags
            .iter()
            .find(|t| t.name == tag)
            .and_then(|t| t.description.clone())
            .filter(|d| !d.is_empty());
        folder
    }

    fn request(
        &mut self,
        path: &str,
        method: &str,
        operation: &Operation,
        shared: &[Parameter],
    ) -> Request {
        let name = operation
            .summary
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(operation.operation_id.as_deref().filter(|s| !s.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {}", method, path));

        let parameters = merge_parameters(shared, &operation.parameters);

        let mut params = Vec::new();
        let mut headers = Vec::new();
        for parameter in &parameters {
            match parameter.location.as_str() {
                "query" => params.push(self.parameter_value(parameter)),
                "header" => headers.push(self.parameter_value(parameter)),
                _ => {}
            }
        }

        let url = with_query(
            &format!("{{{{baseUrl}}}}{}", convert_path_template(path)),
            &params,
        );
        let mut request = Request::new(name, method, url);
        request.description = operation
            .description
            .clone()
            .filter(|d| !d.is_empty());
        request.params = params;
        request.headers = headers;

        let (body, content_type) = if self.spec.is_swagger() {
            self.swagger_body(operation, &parameters)
        } else {
            match &operation.request_body {
                Some(body) => self.request_body(body),
                None => (Body::None, None),
            }
        };
        request.body = body;
        if let Some(content_type) = content_type {
            if request.header("Content-Type").is_none() {
                request
                    .headers
                    .push(KeyValue::new("Content-Type", content_type));
            }
        }

        if let Some(requirements) = &operation.security {
            request.auth = Some(
                self.resolve_security(requirements)
                    .unwrap_or(Auth::None),
            );
        }
        request
    }

    fn parameter_value(&mut self, parameter: &Parameter) -> KeyValue {
        let value = match &parameter.example {
            Some(example) => example.clone(),
            None => {
                let schema = parameter.effective_schema();
                self.examples.build(&schema)
            }
        };
        KeyValue::new(parameter.name.as_str(), render_value(&value))
            .with_description(parameter.description.clone())
    }

    /// Pick a media type by priority and build the body for it
    fn request_body(&mut self, body: &RequestBody) -> (Body, Option<String>) {
        let chosen = MEDIA_PRIORITY.iter().find_map(|wanted| {
            body.content
                .iter()
                .find(|(media, _)| media_essence(media) == *wanted)
        });
        let Some((media, content)) = chosen else {
            if !body.content.is_empty() {
                debug!(
                    "No supported request media type among {:?}",
                    body.content.keys().collect::<Vec<_>>()
                );
            }
            return (Body::None, None);
        };

        let essence = media_essence(media);
        let body = match essence.as_str() {
            "application/json" => Body::Json {
                content: self.json_example(content),
            },
            "application/x-www-form-urlencoded" => Body::FormUrlencoded {
                form_data: self.form_fields(content, false),
            },
            "multipart/form-data" => Body::FormData {
                form_data: self.form_fields(content, true),
            },
            "application/xml" | "text/xml" => Body::Xml {
                content: literal_text(content),
            },
            _ => Body::Text {
                content: literal_text(content),
            },
        };
        (body, Some(essence))
    }

    fn json_example(&mut self, content: &MediaType) -> String {
        let value = match (content.literal_example(), &content.schema) {
            (Some(example), _) => example.clone(),
            (None, Some(schema)) => self.examples.build(schema),
            (None, None) => serde_json::json!({}),
        };
        serde_json::to_string_pretty(&value).unwrap_or_default()
    }

    fn form_fields(&mut self, content: &MediaType, multipart: bool) -> Vec<KeyValue> {
        let Some(schema) = &content.schema else {
            return Vec::new();
        };
        schema
            .properties
            .iter()
            .map(|(name, property)| {
                let is_file = multipart
                    && matches!(property.format.as_deref(), Some("binary") | Some("base64"));
                if is_file {
                    KeyValue::file(name.as_str(), "")
                } else {
                    KeyValue::new(name.as_str(), render_value(&self.examples.build(property)))
                }
            })
            .collect()
    }

    /// Swagger 2.0: `in: body` → JSON, `in: formData` → form fields
    fn swagger_body(
        &mut self,
        operation: &Operation,
        parameters: &[&Parameter],
    ) -> (Body, Option<String>) {
        if let Some(body) = parameters.iter().find(|p| p.location == "body") {
            let value = match (&body.example, &body.schema) {
                (Some(example), _) => example.clone(),
                (None, Some(schema)) => self.examples.build(schema),
                (None, None) => serde_json::json!({}),
            };
            return (
                Body::Json {
                    content: serde_json::to_string_pretty(&value).unwrap_or_default(),
                },
                Some("application/json".to_string()),
            );
        }

        let form: Vec<&&Parameter> = parameters
            .iter()
            .filter(|p| p.location == "formData")
            .collect();
        if form.is_empty() {
            return (Body::None, None);
        }

        let consumes = if operation.consumes.is_empty() {
            &self.spec.consumes
        } else {
            &operation.consumes
        };
        let multipart = consumes.iter().any(|c| c.contains("multipart"))
            || form.iter().any(|p| p.param_type.as_deref() == Some("file"));

        let fields: Vec<KeyValue> = form
            .iter()
            .map(|p| {
                if p.param_type.as_deref() == Some("file") {
                    KeyValue::file(p.name.as_str(), "").with_description(p.description.clone())
                } else {
                    self.parameter_value(p)
                }
            })
            .collect();

        if multipart {
            (
                Body::FormData { form_data: fields },
                Some("multipart/form-data".to_string()),
            )
        } else {
            (
                Body::FormUrlencoded { form_data: fields },
                Some("application/x-www-form-urlencoded".to_string()),
            )
        }
    }

    /// Auth for the first requirement whose first scheme is usable
    fn resolve_security(&mut self, requirements: &[SecurityRequirement]) -> Option<Auth> {
        let spec = self.spec;
        let schemes = spec.security_schemes();
        requirements
            .iter()
            .filter_map(|requirement| requirement.keys().next())
            .find_map(|name| {
                let scheme = schemes.get(name)?;
                self.scheme_auth(name, scheme)
            })
    }

    fn scheme_auth(&mut self, name: &str, scheme: &SecurityScheme) -> Option<Auth> {
        let http_scheme = scheme.scheme.as_deref().map(str::to_ascii_lowercase);
        match (scheme.scheme_type.as_str(), http_scheme.as_deref()) {
            ("http", Some("bearer")) => Some(Auth::Bearer {
                token: self.placeholder("bearerToken"),
            }),
            ("http", Some("basic")) | ("basic", _) => Some(Auth::Basic {
                username: self.placeholder("username"),
                password: self.placeholder("password"),
            }),
            ("apiKey", _) => Some(Auth::ApiKey {
                key: scheme.name.clone().unwrap_or_default(),
                value: self.placeholder("apiKey"),
                location: if scheme.location.as_deref() == Some("query") {
                    ApiKeyLocation::Query
                } else {
                    ApiKeyLocation::Header
                },
            }),
            ("oauth2", _) => Some(Auth::OAuth2(self.oauth2(scheme))),
            (other, _) => {
                if self.unsupported_schemes.insert(name.to_string()) {
                    self.warnings.push(ImportWarning::new(
                        WarningKind::UnsupportedFeature,
                        format!(
                            "Security scheme '{}' of type '{}' is not supported and was skipped",
                            name, other
                        ),
                    ));
                }
                None
            }
        }
    }

    fn oauth2(&mut self, scheme: &SecurityScheme) -> OAuth2Auth {
        let access_token = self.placeholder("accessToken");
        let (grant, auth_url, token_url, scopes) = match scheme.flows.iter().next() {
            Some((flow, details)) => (
                Some(flow.as_str()),
                details.authorization_url.clone(),
                details.token_url.clone(),
                &details.scopes,
            ),
            None => (
                scheme.flow.as_deref(),
                scheme.authorization_url.clone(),
                scheme.token_url.clone(),
                &scheme.scopes,
            ),
        };
        let scope = scopes.keys().cloned().collect::<Vec<_>>().join(" ");

        OAuth2Auth {
            access_token,
            token_type: None,
            grant_type: grant.map(grant_type),
            auth_url,
            access_token_url: token_url,
            client_id: None,
            client_secret: None,
            scope: Some(scope).filter(|s| !s.is_empty()),
        }
    }

    /// `{{name}}`, remembering the name so a collection variable is declared for it
    fn placeholder(&mut self, name: &'static str) -> String {
        if !self.placeholders.contains(&name) {
            self.placeholders.push(name);
        }
        format!("{{{{{}}}}}", name)
    }
}

/// Path-level parameters overridden by operation-level ones on (name, in)
fn merge_parameters<'p>(shared: &'p [Parameter], own: &'p [Parameter]) -> Vec<&'p Parameter> {
    let mut merged: Vec<&Parameter> = shared.iter().filter(|p| !p.name.is_empty()).collect();
    for parameter in own.iter().filter(|p| !p.name.is_empty()) {
        match merged
            .iter()
            .position(|p| p.name == parameter.name && p.location == parameter.location)
        {
            Some(index) => merged[index] = parameter,
            None => merged.push(parameter),
        }
    }
    merged
}

/// OAuth2 flow name → token endpoint grant type
fn grant_type(flow: &str) -> String {
    match flow {
        "authorizationCode" | "accessCode" => "authorization_code",
        "clientCredentials" | "application" => "client_credentials",
        other => other,
    }
    .to_string()
}

/// `application/json; charset=utf-8` → `application/json`
fn media_essence(media: &str) -> String {
    media
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn literal_text(content: &MediaType) -> String {
    content
        .literal_example()
        .or(content.schema.as_ref().and_then(|s| s.example.as_ref()))
        .and_then(|example| example.as_str())
        .unwrap_or_default()
        .to_string()
}
