//! End-to-end tests for detection, dispatch and post-processing

use apiport_common::{SourceFormat, VariableType, WarningKind};
use apiport_parser::variables::{classify_variable, validate_variables};
use apiport_parser::{detect, import_file, ImportKind, Importer};

const POSTMAN: &str = r#"{
    "info": {
        "name": "Vars",
        "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
    },
    "item": [
        {
            "name": "Me",
            "request": {
                "method": "GET",
                "header": [{"key": "X-Id", "value": "{{$guid}}"}],
                "url": "{{base-url}}/me?token={{missing}}"
            }
        }
    ],
    "variable": [
        {"key": "base-url", "value": "https://x.test"},
        {"key": "unused", "value": "1"}
    ]
}"#;

#[test]
fn test_detect_all_formats() {
    assert_eq!(detect(POSTMAN), SourceFormat::Postman);
    assert_eq!(detect("curl https://x.test"), SourceFormat::Curl);
    assert_eq!(
        detect(r#"{"_type": "export", "__export_format": 4, "resources": []}"#),
        SourceFormat::Insomnia
    );
    assert_eq!(
        detect(r#"{"openapi": "3.0.0", "info": {}, "paths": {}}"#),
        SourceFormat::OpenApi
    );
    assert_eq!(detect("openapi: 3.0.0\npaths: {}"), SourceFormat::OpenApi);
    assert_eq!(detect(""), SourceFormat::Unknown);
    assert_eq!(detect("just some text"), SourceFormat::Unknown);
}

#[test]
fn test_postman_post_processing() {
    let result = import_file(POSTMAN, None).unwrap();
    assert_eq!(result.kind(), ImportKind::Collection);

    let collection = result.collections()[0];
    assert_eq!(collection.variables[0].key, "baseurl");
    assert_eq!(
        collection.variables[0].original_key.as_deref(),
        Some("base-url")
    );

    assert_eq!(result.environments.len(), 1);
    assert_eq!(result.environments[0].name, "Collection Variables");

    let kinds: Vec<WarningKind> = result.warnings.iter().map(|w| w.kind).collect();
    assert!(kinds.contains(&WarningKind::VariableRenamed));
    assert!(kinds.contains(&WarningKind::DynamicVariable));
    assert!(kinds.contains(&WarningKind::ConversionNote));

    let undefined: Vec<&str> = result
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::UndefinedVariable)
        .filter_map(|w| w.variable_name.as_deref())
        .collect();
    // references keep the source spelling; only definitions are renamed
    assert_eq!(undefined, vec!["base-url", "missing"]);

    let unused: Vec<&str> = result
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::UnusedVariable)
        .filter_map(|w| w.variable_name.as_deref())
        .collect();
    assert_eq!(unused, vec!["baseurl", "unused"]);
}

#[test]
fn test_validation_can_be_disabled() {
    let result = Importer::new()
        .with_variable_validation(false)
        .import(POSTMAN)
        .unwrap();
    assert!(!result.warnings.iter().any(|w| matches!(
        w.kind,
        WarningKind::UndefinedVariable | WarningKind::UnusedVariable
    )));
}

#[test]
fn test_import_is_repeatable() {
    let first = import_file(POSTMAN, None).unwrap();
    let second = import_file(POSTMAN, None).unwrap();

    let shape = |result: &apiport_parser::ImportResult| {
        let collection = result.collections()[0];
        let requests: Vec<(String, String, String)> = collection
            .all_requests()
            .iter()
            .map(|r| (r.name.clone(), r.method.clone(), r.url.clone()))
            .collect();
        let warnings: Vec<String> = result.warnings.iter().map(|w| w.to_string()).collect();
        (requests, warnings)
    };
    assert_eq!(shape(&first), shape(&second));
}

#[test]
fn test_insomnia_template_tags_aggregate() {
    let json = r#"{
        "_type": "export",
        "__export_format": 4,
        "resources": [
            {"_id": "wrk_1", "_type": "workspace", "name": "Tags"},
            {
                "_id": "req_1", "_type": "request", "parentId": "wrk_1", "name": "one",
                "method": "GET", "url": "https://x.test/{% uuid 'v4' %}",
                "headers": [{"name": "X-Now", "value": "{% now 'iso-8601' %}"}]
            },
            {
                "_id": "req_2", "_type": "request", "parentId": "wrk_1", "name": "two",
                "method": "GET", "url": "https://x.test/{% uuid 'v4' %}?t={% response 'body', 'req_1', '$.token' %}"
            }
        ]
    }"#;
    let result = import_file(json, None).unwrap();

    let tags: Vec<&str> = result
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::TemplateTag)
        .filter_map(|w| w.variable_name.as_deref())
        .collect();
    assert_eq!(tags, vec!["now", "response", "uuid"]);
    assert_eq!(
        result
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::ChainedRequest)
            .count(),
        1
    );
}

#[test]
fn test_format_hint_and_errors() {
    let result = import_file("curl https://x.test/a", Some("curl")).unwrap();
    assert_eq!(result.collections()[0].requests.len(), 1);

    let err = import_file("{}", Some("soap")).err().unwrap();
    assert!(err.to_string().starts_with("Unknown format 'soap'"));

    let err = import_file("hello", None).err().unwrap();
    assert_eq!(
        err.to_string(),
        "Unable to detect file format. Please specify the format explicitly."
    );

    let err = import_file(r#"{"log": {"version": "1.2", "entries": []}}"#, None)
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "HAR import is not yet supported");
}

#[test]
fn test_multiple_curl_commands_are_routed() {
    let result = import_file("curl https://x.test/a && curl https://x.test/b", None).unwrap();
    assert_eq!(result.collections()[0].requests.len(), 2);
}

#[test]
fn test_validate_variables_both_directions() {
    let warnings = validate_variables(["a", "b"], ["b", "c"]);
    let summary: Vec<(WarningKind, &str)> = warnings
        .iter()
        .map(|w| (w.kind, w.variable_name.as_deref().unwrap_or_default()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (WarningKind::UndefinedVariable, "a"),
            (WarningKind::UnusedVariable, "c"),
        ]
    );
}

#[test]
fn test_classify_variable() {
    assert_eq!(classify_variable("API_KEY"), VariableType::Secret);
    assert_eq!(classify_variable("client_secret"), VariableType::Secret);
    assert_eq!(classify_variable("base_url"), VariableType::Text);
}
