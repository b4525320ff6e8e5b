//! cURL command output

use apiport_common::{ApiKeyLocation, Auth, Body, Collection, Request};
use serde_json::{json, Value};

const CONTINUATION: &str = " \\\n  ";

/// One command per request, depth-first, newline separated
///
/// Requests without their own auth use the collection's.
pub fn to_curl(collection: &Collection) -> String {
    collection
        .all_requests()
        .into_iter()
        .map(|request| request_to_curl(request, collection.auth.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a single request as a multi-line `curl` command
pub fn request_to_curl(request: &Request, inherited_auth: Option<&Auth>) -> String {
    let auth = request.auth.as_ref().or(inherited_auth);
    let mut url = request.url.clone();
    let mut options: Vec<String> = Vec::new();

    for header in request.headers.iter().filter(|h| h.enabled) {
        options.push(header_option(&header.key, &header.value));
    }

    match auth {
        Some(Auth::Basic { username, password }) => {
            options.push(format!("-u {}", quote(&format!("{}:{}", username, password))));
        }
        Some(Auth::Bearer { token }) => {
            options.push(header_option("Authorization", &format!("Bearer {}", token)));
        }
        Some(Auth::ApiKey {
            key,
            value,
            location: ApiKeyLocation::Header,
        }) => options.push(header_option(key, value)),
        Some(Auth::ApiKey {
            key,
            value,
            location: ApiKeyLocation::Query,
        }) => {
            let separator = if url.contains('?') { '&' } else { '?' };
            url = format!("{}{}{}={}", url, separator, key, value);
        }
        Some(Auth::OAuth2(oauth)) if !oauth.access_token.is_empty() => {
            let prefix = oauth.token_type.as_deref().unwrap_or("Bearer");
            options.push(header_option(
                "Authorization",
                &format!("{} {}", prefix, oauth.access_token),
            ));
        }
        _ => {}
    }

    let has_content_type = request.header("Content-Type").is_some();
    match &request.body {
        Body::None => {}
        Body::Json { content } | Body::Text { content } => {
            options.push(format!("--data-raw {}", quote(content)));
        }
        Body::Xml { content } | Body::Html { content } => {
            // without a header the type would be lost on re-import
            if !has_content_type {
                if let Some(content_type) = request.body.content_type() {
                    options.push(header_option("Content-Type", content_type));
                }
            }
            options.push(format!("--data-raw {}", quote(content)));
        }
        Body::FormUrlencoded { form_data } => {
            for field in form_data.iter().filter(|f| f.enabled) {
                options.push(format!(
                    "--data-urlencode {}",
                    quote(&format!("{}={}", field.key, field.value))
                ));
            }
        }
        Body::FormData { form_data } => {
            for field in form_data.iter().filter(|f| f.enabled) {
                // --form-string keeps a leading `@` or `<` literal
                let option = if field.kind.is_text() {
                    format!(
                        "--form-string {}",
                        quote(&format!("{}={}", field.key, field.value))
                    )
                } else {
                    format!("-F {}", quote(&format!("{}=@{}", field.key, field.value)))
                };
                options.push(option);
            }
        }
        Body::Binary { content } => {
            options.push(format!("--data-binary {}", quote(&format!("@{}", content))));
        }
        Body::GraphQl { query, variables } => {
            if !has_content_type {
                options.push(header_option("Content-Type", "application/json"));
            }
            let variables = serde_json::from_str::<Value>(variables).unwrap_or(Value::Null);
            let payload = json!({"query": query, "variables": variables});
            options.push(format!("--data-raw {}", quote(&payload.to_string())));
        }
    }

    let mut command = String::from("curl");
    if request.method != "GET" {
        command.push_str(" -X ");
        command.push_str(&request.method);
    }
    command.push(' ');
    command.push_str(&quote(&url));
    for option in options {
        command.push_str(CONTINUATION);
        command.push_str(&option);
    }
    command
}

fn header_option(name: &str, value: &str) -> String {
    format!("-H {}", quote(&format!("{}: {}", name, value)))
}

/// Single-quote for a POSIX shell; embedded quotes become `'\''`
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiport_common::{Folder, KeyValue};

    #[test]
    fn test_get_has_no_method_flag() {
        let request = Request::new("Ping", "GET", "https://x.test/ping");
        assert_eq!(request_to_curl(&request, None), "curl 'https://x.test/ping'");
    }

    #[test]
    fn test_post_json_with_headers() {
        let mut request = Request::new("Create", "POST", "https://x.test/users");
        request.headers = vec![
            KeyValue::new("Content-Type", "application/json"),
            KeyValue::new("X-Off", "1").with_enabled(false),
        ];
        request.body = Body::Json {
            content: r#"{"name":"O'Brien"}"#.to_string(),
        };

        assert_eq!(
            request_to_curl(&request, None),
            "curl -X POST 'https://x.test/users' \\\n  \
             -H 'Content-Type: application/json' \\\n  \
             --data-raw '{\"name\":\"O'\\''Brien\"}'"
        );
    }

    #[test]
    fn test_auth_rendering() {
        let request = Request::new("Me", "GET", "https://x.test/me");

        let basic = Auth::Basic {
            username: "u".to_string(),
            password: "p".to_string(),
        };
        assert!(request_to_curl(&request, Some(&basic)).ends_with("-u 'u:p'"));

        let query_key = Auth::ApiKey {
            key: "api_key".to_string(),
            value: "{{key}}".to_string(),
            location: ApiKeyLocation::Query,
        };
        assert!(request_to_curl(&request, Some(&query_key))
            .starts_with("curl 'https://x.test/me?api_key={{key}}'"));

        let mut public = request.clone();
        public.auth = Some(Auth::None);
        assert_eq!(
            request_to_curl(&public, Some(&basic)),
            "curl 'https://x.test/me'"
        );
    }

    #[test]
    fn test_form_bodies() {
        let mut request = Request::new("Upload", "POST", "https://x.test/u");
        request.body = Body::FormData {
            form_data: vec![
                KeyValue::new("a", "1"),
                KeyValue::new("handle", "@ada"),
                KeyValue::file("f", "/tmp/x.png"),
            ],
        };
        let command = request_to_curl(&request, None);
        assert!(command.contains("--form-string 'a=1'"));
        assert!(command.contains("--form-string 'handle=@ada'"));
        assert!(command.contains("-F 'f=@/tmp/x.png'"));
    }

    #[test]
    fn test_collection_commands_are_newline_joined() {
        let mut collection = Collection::new("Two");
        collection
            .requests
            .push(Request::new("A", "GET", "https://x.test/a"));
        let mut folder = Folder::new("F");
        folder
            .requests
            .push(Request::new("B", "DELETE", "https://x.test/b"));
        collection.folders.push(folder);

        let text = to_curl(&collection);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(text.contains("curl -X DELETE 'https://x.test/b'"));
    }
}
