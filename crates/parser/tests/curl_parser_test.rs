//! Integration tests for the cURL parser

use apiport_common::{Auth, Body, WarningKind};
use apiport_parser::curl::{parse_multi, CurlParser, COLLECTION_NAME};

#[test]
fn test_ping() {
    let result = CurlParser::from_command("curl https://api.example.com/ping")
        .unwrap()
        .parse()
        .unwrap();
    let collection = result.collections()[0];
    assert_eq!(collection.name, COLLECTION_NAME);
    assert_eq!(collection.requests.len(), 1);

    let request = &collection.requests[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.url, "https://api.example.com/ping");
    assert!(request.headers.is_empty());
    assert!(request.body.is_none());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_post_json_from_browser_copy() {
    let command = r#"curl 'https://api.example.com/users' \
  -H 'Content-Type: application/json' \
  --data-raw '{"name":"Ada","admin":false}' \
  --compressed"#;
    let result = CurlParser::from_command(command).unwrap().parse().unwrap();
    let request = &result.collections()[0].requests[0];

    assert_eq!(request.method, "POST");
    assert_eq!(request.name, "POST /users");
    assert_eq!(request.headers.len(), 1);
    assert_eq!(
        request.body,
        Body::Json {
            content: r#"{"name":"Ada","admin":false}"#.to_string()
        }
    );
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].kind, WarningKind::ConversionNote);
}

#[test]
fn test_user_flag_wins_over_authorization_header() {
    let command =
        "curl -u alice:wonderland -H 'Authorization: Basic Ym9iOmJ1aWxkZXI=' https://x.test/me";
    let result = CurlParser::from_command(command).unwrap().parse().unwrap();
    let request = &result.collections()[0].requests[0];
    assert_eq!(
        request.auth,
        Some(Auth::Basic {
            username: "alice".to_string(),
            password: "wonderland".to_string()
        })
    );
    assert!(request.header("Authorization").is_none());
}

#[test]
fn test_urlencoded_data() {
    let command = "curl --data-urlencode 'q=hello world' --data-urlencode lang=en https://x.test/search";
    let result = CurlParser::from_command(command).unwrap().parse().unwrap();
    let request = &result.collections()[0].requests[0];
    let Body::FormUrlencoded { form_data } = &request.body else {
        panic!("expected an urlencoded body");
    };
    assert_eq!(form_data.len(), 2);
    assert_eq!(form_data[0].value, "hello world");
}

#[test]
fn test_plain_text_body_with_content_type() {
    let command = "curl -H 'Content-Type: text/plain' -d 'hello' https://x.test/echo";
    let result = CurlParser::from_command(command).unwrap().parse().unwrap();
    assert_eq!(
        result.collections()[0].requests[0].body,
        Body::Text {
            content: "hello".to_string()
        }
    );
}

#[test]
fn test_multiple_commands() {
    let text = "curl https://x.test/a\ncurl -X DELETE https://x.test/b/1\n\ncurl -I https://x.test/c";
    let result = parse_multi(text).unwrap();
    let collection = result.collections()[0];
    let summary: Vec<(&str, &str)> = collection
        .requests
        .iter()
        .map(|r| (r.method.as_str(), r.url.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("GET", "https://x.test/a"),
            ("DELETE", "https://x.test/b/1"),
            ("HEAD", "https://x.test/c"),
        ]
    );
}

#[test]
fn test_invalid_commands() {
    assert!(CurlParser::from_command("curl -d 'oops https://x.test").is_err());
    assert!(CurlParser::from_command("curl -H 'A: b'").unwrap().parse().is_err());
    assert!(parse_multi("echo hello").is_err());
}
