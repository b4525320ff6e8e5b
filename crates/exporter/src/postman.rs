//! Postman collection v2.1 and environment output

use apiport_common::url::split_origin;
use apiport_common::{
    ApiKeyLocation, Auth, Body, Collection, Environment, Folder, KeyValue, Request, Result,
    VariableType,
};
use serde_json::{json, Map, Value};

const SCHEMA_V21: &str = "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// Serialize a collection as Postman v2.1
pub fn to_postman(collection: &Collection) -> Result<String> {
    let mut info = Map::new();
    info.insert("_postman_id".into(), json!(collection.id));
    info.insert("name".into(), json!(collection.name));
    if let Some(description) = &collection.description {
        info.insert("description".into(), json!(description));
    }
    info.insert("schema".into(), json!(SCHEMA_V21));

    let mut document = Map::new();
    document.insert("info".into(), Value::Object(info));
    document.insert(
        "item".into(),
        Value::Array(items(&collection.folders, &collection.requests)),
    );
    if let Some(auth) = &collection.auth {
        document.insert("auth".into(), auth_value(auth));
    }
    if !collection.variables.is_empty() {
        let variables = collection
            .variables
            .iter()
            .map(|var| {
                let mut entry = Map::new();
                entry.insert("key".into(), json!(var.key));
                entry.insert("value".into(), json!(var.value));
                entry.insert("type".into(), json!(variable_type(var.var_type, "string")));
                if !var.enabled {
                    entry.insert("disabled".into(), json!(true));
                }
                Value::Object(entry)
            })
            .collect();
        document.insert("variable".into(), Value::Array(variables));
    }

    Ok(serde_json::to_string_pretty(&Value::Object(document))?)
}

/// Serialize an environment as a Postman environment export
pub fn environment_to_postman(environment: &Environment) -> Result<String> {
    let values: Vec<Value> = environment
        .variables
        .iter()
        .map(|var| {
            json!({
                "key": var.key,
                "value": var.value,
                "type": variable_type(var.var_type, "default"),
                "enabled": var.enabled,
            })
        })
        .collect();
    let document = json!({
        "id": environment.id,
        "name": environment.name,
        "values": values,
        "_postman_variable_scope": "environment",
    });
    Ok(serde_json::to_string_pretty(&document)?)
}

fn variable_type(var_type: VariableType, plain: &'static str) -> &'static str {
    match var_type {
        VariableType::Secret => "secret",
        VariableType::Text => plain,
    }
}

/// Folders first, then requests
fn items(folders: &[Folder], requests: &[Request]) -> Vec<Value> {
    folders
        .iter()
        .map(folder_item)
        .chain(requests.iter().map(request_item))
        .collect()
}

fn folder_item(folder: &Folder) -> Value {
    let mut item = Map::new();
    item.insert("name".into(), json!(folder.name));
    if let Some(description) = &folder.description {
        item.insert("description".into(), json!(description));
    }
    item.insert(
        "item".into(),
        Value::Array(items(&folder.folders, &folder.requests)),
    );
    Value::Object(item)
}

fn request_item(request: &Request) -> Value {
    let mut inner = Map::new();
    inner.insert("method".into(), json!(request.method));
    inner.insert(
        "header".into(),
        Value::Array(request.headers.iter().map(pair).collect()),
    );
    if let Some(body) = body_value(&request.body) {
        inner.insert("body".into(), body);
    }
    inner.insert("url".into(), url_value(request));
    if let Some(auth) = &request.auth {
        inner.insert("auth".into(), auth_value(auth));
    }
    if let Some(description) = &request.description {
        inner.insert("description".into(), json!(description));
    }

    let mut item = Map::new();
    item.insert("name".into(), json!(request.name));
    item.insert("request".into(), Value::Object(inner));

    let events: Vec<Value> = [
        ("prerequest", &request.pre_request_script),
        ("test", &request.test_script),
    ]
    .into_iter()
    .filter_map(|(listen, script)| {
        let script = script.as_deref()?;
        Some(json!({
            "listen": listen,
            "script": {
                "type": "text/javascript",
                "exec": script.split('\n').collect::<Vec<_>>(),
            },
        }))
    })
    .collect();
    if !events.is_empty() {
        item.insert("event".into(), Value::Array(events));
    }
    Value::Object(item)
}

fn pair(kv: &KeyValue) -> Value {
    let mut entry = Map::new();
    entry.insert("key".into(), json!(kv.key));
    entry.insert("value".into(), json!(kv.value));
    if let Some(description) = &kv.description {
        entry.insert("description".into(), json!(description));
    }
    if !kv.enabled {
        entry.insert("disabled".into(), json!(true));
    }
    Value::Object(entry)
}

/// `raw` plus the parsed protocol, host, port, path and query
fn url_value(request: &Request) -> Value {
    let (origin, path) = split_origin(&request.url);
    let mut url = Map::new();
    url.insert("raw".into(), json!(request.url));

    let host_port = match origin.split_once("://") {
        Some((protocol, rest)) => {
            url.insert("protocol".into(), json!(protocol));
            rest
        }
        None => origin,
    };
    let host = match host_port.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
            url.insert("port".into(), json!(port));
            host
        }
        _ => host_port,
    };
    if !host.is_empty() {
        url.insert("host".into(), json!(host.split('.').collect::<Vec<_>>()));
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    url.insert("path".into(), json!(segments));
    if !request.params.is_empty() {
        url.insert(
            "query".into(),
            Value::Array(request.params.iter().map(pair).collect()),
        );
    }
    Value::Object(url)
}

fn body_value(body: &Body) -> Option<Value> {
    let raw = |content: &str, language: &str| {
        json!({
            "mode": "raw",
            "raw": content,
            "options": {"raw": {"language": language}},
        })
    };

    let value = match body {
        Body::None => return None,
        Body::Json { content } => raw(content, "json"),
        Body::Text { content } => raw(content, "text"),
        Body::Xml { content } => raw(content, "xml"),
        Body::Html { content } => raw(content, "html"),
        Body::FormUrlencoded { form_data } => json!({
            "mode": "urlencoded",
            "urlencoded": form_data.iter().map(pair).collect::<Vec<_>>(),
        }),
        Body::FormData { form_data } => json!({
            "mode": "formdata",
            "formdata": form_data.iter().map(form_field).collect::<Vec<_>>(),
        }),
        Body::Binary { content } => json!({
            "mode": "file",
            "file": {"src": content},
        }),
        Body::GraphQl { query, variables } => json!({
            "mode": "graphql",
            "graphql": {"query": query, "variables": variables},
        }),
    };
    Some(value)
}

fn form_field(kv: &KeyValue) -> Value {
    let mut entry = Map::new();
    entry.insert("key".into(), json!(kv.key));
    if kv.kind.is_text() {
        entry.insert("value".into(), json!(kv.value));
        entry.insert("type".into(), json!("text"));
    } else {
        entry.insert("src".into(), json!(kv.value));
        entry.insert("type".into(), json!("file"));
    }
    if !kv.enabled {
        entry.insert("disabled".into(), json!(true));
    }
    Value::Object(entry)
}

/// Postman stores auth parameters as `[{key, value, type}]` under the type name
fn auth_value(auth: &Auth) -> Value {
    let params = |entries: &[(&str, &str)]| -> Value {
        entries
            .iter()
            .map(|(key, value)| json!({"key": key, "value": value, "type": "string"}))
            .collect()
    };

    match auth {
        Auth::None => json!({"type": "noauth"}),
        Auth::Bearer { token } => json!({
            "type": "bearer",
            "bearer": params(&[("token", token.as_str())]),
        }),
        Auth::Basic { username, password } => json!({
            "type": "basic",
            "basic": params(&[
                ("username", username.as_str()),
                ("password", password.as_str()),
            ]),
        }),
        Auth::ApiKey {
            key,
            value,
            location,
        } => {
            let location = match location {
                ApiKeyLocation::Header => "header",
                ApiKeyLocation::Query => "query",
            };
            json!({
                "type": "apikey",
                "apikey": params(&[
                    ("key", key.as_str()),
                    ("value", value.as_str()),
                    ("in", location),
                ]),
            })
        }
        Auth::OAuth2(oauth) => {
            let mut entries = vec![("accessToken", oauth.access_token.as_str())];
            let optional = [
                ("tokenType", &oauth.token_type),
                ("grant_type", &oauth.grant_type),
                ("authUrl", &oauth.auth_url),
                ("accessTokenUrl", &oauth.access_token_url),
                ("clientId", &oauth.client_id),
                ("clientSecret", &oauth.client_secret),
                ("scope", &oauth.scope),
            ];
            entries.extend(
                optional
                    .iter()
                    .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v))),
            );
            json!({
                "type": "oauth2",
                "oauth2": params(&entries),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiport_common::Variable;

    fn export(collection: &Collection) -> Value {
        serde_json::from_str(&to_postman(collection).unwrap()).unwrap()
    }

    #[test]
    fn test_url_object() {
        let mut collection = Collection::new("Urls");
        let mut request = Request::new("Get", "GET", "http://localhost:8080/a/b?x=1");
        request.params = vec![KeyValue::new("x", "1")];
        collection.requests.push(request);

        let value = export(&collection);
        let url = &value["item"][0]["request"]["url"];
        assert_eq!(url["raw"], "http://localhost:8080/a/b?x=1");
        assert_eq!(url["protocol"], "http");
        assert_eq!(url["port"], "8080");
        assert_eq!(url["host"], json!(["localhost"]));
        assert_eq!(url["path"], json!(["a", "b"]));
        assert_eq!(url["query"][0]["key"], "x");
    }

    #[test]
    fn test_folders_nest_and_come_first() {
        let mut collection = Collection::new("Tree");
        collection
            .requests
            .push(Request::new("Root", "GET", "{{baseUrl}}/"));
        let mut folder = Folder::new("Users");
        folder
            .requests
            .push(Request::new("List", "GET", "{{baseUrl}}/users"));
        collection.folders.push(folder);

        let value = export(&collection);
        assert_eq!(value["item"][0]["name"], "Users");
        assert_eq!(value["item"][0]["item"][0]["name"], "List");
        assert_eq!(value["item"][1]["name"], "Root");
        assert_eq!(value["item"][0]["item"][0]["request"]["url"]["host"], json!(["{{baseUrl}}"]));
    }

    #[test]
    fn test_auth_and_variables() {
        let mut collection = Collection::new("Auth");
        collection.auth = Some(Auth::ApiKey {
            key: "X-Key".to_string(),
            value: "{{key}}".to_string(),
            location: ApiKeyLocation::Query,
        });
        collection
            .variables
            .push(Variable::new("key", "s3cr3t").with_type(VariableType::Secret));

        let value = export(&collection);
        assert_eq!(value["info"]["schema"], SCHEMA_V21);
        assert_eq!(value["auth"]["type"], "apikey");
        assert_eq!(value["auth"]["apikey"][2]["value"], "query");
        assert_eq!(value["variable"][0]["type"], "secret");
    }

    #[test]
    fn test_scripts_become_events() {
        let mut collection = Collection::new("Scripts");
        let mut request = Request::new("Check", "GET", "https://x.test");
        request.test_script = Some("pm.test('a');\npm.test('b');".to_string());
        collection.requests.push(request);

        let value = export(&collection);
        let event = &value["item"][0]["event"][0];
        assert_eq!(event["listen"], "test");
        assert_eq!(event["script"]["exec"], json!(["pm.test('a');", "pm.test('b');"]));
    }

    #[test]
    fn test_script_lines_keep_carriage_returns_and_trailing_newline() {
        let mut collection = Collection::new("Scripts");
        let mut request = Request::new("Check", "GET", "https://x.test");
        request.pre_request_script = Some("a();\r\nb();\n".to_string());
        collection.requests.push(request);

        let value = export(&collection);
        let event = &value["item"][0]["event"][0];
        assert_eq!(event["listen"], "prerequest");
        assert_eq!(event["script"]["exec"], json!(["a();\r", "b();", ""]));
    }

    #[test]
    fn test_environment_export() {
        let environment = Environment::new(
            "Dev",
            vec![
                Variable::new("host", "x.test"),
                Variable::new("token", "t").with_type(VariableType::Secret),
            ],
        );
        let value: Value =
            serde_json::from_str(&environment_to_postman(&environment).unwrap()).unwrap();
        assert_eq!(value["name"], "Dev");
        assert_eq!(value["values"][0]["type"], "default");
        assert_eq!(value["values"][1]["type"], "secret");
        assert_eq!(value["_postman_variable_scope"], "environment");
    }
}
