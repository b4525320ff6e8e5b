//! Variable usage scanning and validation

use super::syntax::extract_variables;
use crate::regex_util::static_regex;
use apiport_common::{Auth, Body, Collection, ImportWarning, Request, WarningKind};
use regex::Regex;
use std::collections::BTreeSet;

static_regex!(fn dynamic_pattern, r"\{\{\s*\$([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}");
static_regex!(fn template_tag_pattern, r"\{%\s*([A-Za-z_][A-Za-z0-9_-]*)[^%]*%\}");

/// Every user-editable text field of a request that may hold variable references
pub fn request_texts(request: &Request) -> Vec<&str> {
    let mut texts = vec![request.url.as_str()];

    for kv in request.headers.iter().chain(request.params.iter()) {
        texts.push(&kv.key);
        texts.push(&kv.value);
    }

    match &request.body {
        Body::None => {}
        Body::Json { content }
        | Body::Text { content }
        | Body::Xml { content }
        | Body::Html { content }
        | Body::Binary { content } => texts.push(content),
        Body::FormUrlencoded { form_data } | Body::FormData { form_data } => {
            for field in form_data {
                texts.push(&field.key);
                texts.push(&field.value);
            }
        }
        Body::GraphQl { query, variables } => {
            texts.push(query);
            texts.push(variables);
        }
    }

    if let Some(auth) = &request.auth {
        texts.extend(auth_texts(auth));
    }

    texts
}

fn auth_texts(auth: &Auth) -> Vec<&str> {
    match auth {
        Auth::None => vec![],
        Auth::Bearer { token } => vec![token],
        Auth::Basic { username, password } => vec![username, password],
        Auth::ApiKey { key, value, .. } => vec![key, value],
        Auth::OAuth2(oauth) => {
            let mut texts = vec![oauth.access_token.as_str()];
            texts.extend(
                [
                    &oauth.auth_url,
                    &oauth.access_token_url,
                    &oauth.client_id,
                    &oauth.client_secret,
                ]
                .into_iter()
                .flatten()
                .map(String::as_str),
            );
            texts
        }
    }
}

fn collection_texts(collection: &Collection) -> Vec<&str> {
    let mut texts: Vec<&str> = collection
        .all_requests()
        .into_iter()
        .flat_map(request_texts)
        .collect();
    if let Some(auth) = &collection.auth {
        texts.extend(auth_texts(auth));
    }
    texts
}

/// All `{{name}}` references in the collection, excluding dynamic variables
pub fn extract_used_variables(collection: &Collection) -> BTreeSet<String> {
    collection_texts(collection)
        .into_iter()
        .flat_map(extract_variables)
        .collect()
}

/// Compare used and defined variable names in both directions
///
/// Produces one `undefined_variable` warning per name that is used but not
/// defined and one `unused_variable` warning per name that is defined but
/// never used. Warnings come out sorted by name within each kind.
pub fn validate_variables<U, D>(used: U, defined: D) -> Vec<ImportWarning>
where
    U: IntoIterator,
    U::Item: AsRef<str>,
    D: IntoIterator,
    D::Item: AsRef<str>,
{
    let used: BTreeSet<String> = used.into_iter().map(|s| s.as_ref().to_string()).collect();
    let defined: BTreeSet<String> = defined
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect();

    let undefined = used.difference(&defined).map(|name| {
        ImportWarning::new(
            WarningKind::UndefinedVariable,
            format!("Variable '{}' is used but not defined", name),
        )
        .with_variable(name.as_str())
    });

    let unused = defined.difference(&used).map(|name| {
        ImportWarning::new(
            WarningKind::UnusedVariable,
            format!("Variable '{}' is defined but never used", name),
        )
        .with_variable(name.as_str())
    });

    undefined.chain(unused).collect()
}

/// One warning per distinct dynamic variable (`{{$guid}}`, `{{$timestamp}}`, ...)
pub fn check_dynamic_variables(collection: &Collection) -> Vec<ImportWarning> {
    let names: BTreeSet<String> = collection_texts(collection)
        .into_iter()
        .flat_map(|text| {
            dynamic_pattern()
                .captures_iter(text)
                .map(|caps| caps[1].to_string())
                .collect::<Vec<_>>()
        })
        .collect();

    names
        .into_iter()
        .map(|name| {
            ImportWarning::new(
                WarningKind::DynamicVariable,
                format!(
                    "Dynamic variable '{{{{${}}}}}' has no static value and is generated at send time",
                    name
                ),
            )
            .with_variable(format!("${}", name))
        })
        .collect()
}

/// One warning per distinct Insomnia template tag (`{% tag ... %}`)
///
/// Tags whose name starts with `response` read values from another
/// request's response and also get a `chained_request` warning.
pub fn check_insomnia_template_tags(collection: &Collection) -> Vec<ImportWarning> {
    let tags: BTreeSet<String> = collection_texts(collection)
        .into_iter()
        .flat_map(|text| {
            template_tag_pattern()
                .captures_iter(text)
                .map(|caps| caps[1].to_string())
                .collect::<Vec<_>>()
        })
        .collect();

    let mut warnings = Vec::new();
    for tag in tags {
        warnings.push(
            ImportWarning::new(
                WarningKind::TemplateTag,
                format!(
                    "Template tag '{}' cannot be converted and was left as-is",
                    tag
                ),
            )
            .with_variable(tag.as_str()),
        );
        if tag.starts_with("response") {
            warnings.push(
                ImportWarning::new(
                    WarningKind::ChainedRequest,
                    format!(
                        "Template tag '{}' chains a value from another request's response; \
                         there is no static equivalent",
                        tag
                    ),
                )
                .with_variable(tag.as_str()),
            );
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiport_common::KeyValue;

    fn collection_with(request: Request) -> Collection {
        let mut collection = Collection::new("c");
        collection.requests.push(request);
        collection
    }

    #[test]
    fn test_validate_variables_bidirectional() {
        let warnings = validate_variables(["A", "B"], ["B", "C"]);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].kind, WarningKind::UndefinedVariable);
        assert_eq!(warnings[0].variable_name.as_deref(), Some("A"));
        assert_eq!(warnings[1].kind, WarningKind::UnusedVariable);
        assert_eq!(warnings[1].variable_name.as_deref(), Some("C"));
    }

    #[test]
    fn test_extract_used_variables_scans_all_fields() {
        let mut request = Request::new("r", "POST", "{{base}}/users");
        request.headers.push(KeyValue::new("X-{{hdr}}", "{{token}}"));
        request.params.push(KeyValue::new("page", "{{page}}"));
        request.body = Body::FormData {
            form_data: vec![KeyValue::new("name", "{{name}}")],
        };
        request.auth = Some(Auth::Bearer {
            token: "{{bearer}}".to_string(),
        });

        let used = extract_used_variables(&collection_with(request));
        let expected: BTreeSet<String> = ["base", "hdr", "token", "page", "name", "bearer"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(used, expected);
    }

    #[test]
    fn test_dynamic_variables_aggregate_by_name() {
        let mut request = Request::new("r", "GET", "https://x.test?a={{$guid}}&b={{$guid}}");
        request
            .headers
            .push(KeyValue::new("X-Time", "{{$timestamp}}"));

        let warnings = check_dynamic_variables(&collection_with(request));
        assert_eq!(warnings.len(), 2);
        assert!(warnings
            .iter()
            .all(|w| w.kind == WarningKind::DynamicVariable));
        assert_eq!(warnings[0].variable_name.as_deref(), Some("$guid"));
        assert!(warnings[0].message.contains("{{$guid}}"));
    }

    #[test]
    fn test_template_tags_aggregate_and_flag_chaining() {
        let mut request = Request::new("r", "GET", "https://x.test/{% uuid 'v4' %}");
        request.headers.push(KeyValue::new(
            "Authorization",
            "{% response 'body', 'req_1', 'b64::JC50b2tlbg==::46b', 'never' %}",
        ));
        request.params.push(KeyValue::new("id", "{% uuid 'v4' %}"));

        let warnings = check_insomnia_template_tags(&collection_with(request));
        let kinds: Vec<WarningKind> = warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![
                WarningKind::TemplateTag,
                WarningKind::ChainedRequest,
                WarningKind::TemplateTag
            ]
        );
        assert_eq!(warnings[0].variable_name.as_deref(), Some("response"));
        assert_eq!(warnings[2].variable_name.as_deref(), Some("uuid"));
    }
}
