//! Maps parsed `curl` options onto a canonical request

use super::parser::{CurlCommand, DataKind, DataPart, FormPart};
use crate::regex_util::static_regex;
use crate::variables::{convert_variable_syntax, VariableSyntax};
use apiport_common::url::{parse_query, query_params, split_origin, split_query};
use apiport_common::{
    ApiportError, Auth, Body, ImportWarning, KeyValue, Request, Result, WarningKind,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;

static_regex!(fn form_pairs_regex, r"^[^=&\s]+=[^&]*(&[^=&\s]+=[^&]*)*$");

/// Build a request from parsed options
///
/// Returns the request together with any syntax or dropped-option warnings.
pub fn convert_command(command: &CurlCommand) -> Result<(Request, Vec<ImportWarning>)> {
    let mut warnings = Vec::new();
    let mut shell = ShellVariables::default();

    let url = command
        .url
        .as_deref()
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiportError::Validation("Invalid cURL command: no URL found".to_string()))?;
    let mut url = shell.convert_url(url);

    let has_data = !command.data.is_empty() || !command.form.is_empty();
    let method = match &command.method {
        Some(method) => method.clone(),
        None if command.head => "HEAD".to_string(),
        None if command.get => "GET".to_string(),
        None if has_data => "POST".to_string(),
        None => "GET".to_string(),
    };

    // -G moves the data into the query string
    let data: Vec<DataPart> = command
        .data
        .iter()
        .map(|part| DataPart {
            kind: part.kind,
            value: shell.convert(&part.value),
        })
        .collect();
    let mut body_data = data.as_slice();
    if command.get && !data.is_empty() {
        let joined = data
            .iter()
            .map(query_part)
            .collect::<Vec<_>>()
            .join("&");
        url = if url.contains('?') {
            format!("{}&{}", url, joined)
        } else {
            format!("{}?{}", url, joined)
        };
        body_data = &[];
    }

    let mut headers: Vec<KeyValue> = command
        .headers
        .iter()
        .filter_map(|raw| parse_header(&shell.convert(raw)))
        .collect();
    if let Some(agent) = &command.user_agent {
        headers.push(KeyValue::new("User-Agent", agent.as_str()));
    }
    if let Some(referer) = &command.referer {
        headers.push(KeyValue::new("Referer", referer.as_str()));
    }
    let cookies: Vec<&str> = command
        .cookies
        .iter()
        .map(String::as_str)
        .filter(|cookie| cookie.contains('='))
        .collect();
    if !cookies.is_empty() {
        headers.push(KeyValue::new("Cookie", cookies.join("; ")));
    }

    let auth = extract_auth(command, &mut headers, &mut shell);

    let body = if !command.form.is_empty() {
        form_body(&command.form, &mut shell)
    } else {
        data_body(body_data, &headers)
    };

    let name = format!("{} {}", method, split_origin(&url).1);
    let mut request = Request::new(name, &method, url.as_str());
    request.params = query_params(&url);
    request.headers = headers;
    request.body = body;
    request.auth = auth;

    if shell.converted {
        warnings.push(
            ImportWarning::new(
                WarningKind::SyntaxConverted,
                "Shell variables were converted to {{variable}} syntax",
            )
            .with_resource(Some(request.id.clone()), request.name.as_str()),
        );
    }
    if !command.dropped.is_empty() {
        let names: Vec<&str> = command.dropped.iter().copied().collect();
        warnings.push(
            ImportWarning::new(
                WarningKind::ConversionNote,
                format!(
                    "cURL options with no request equivalent were ignored: {}",
                    names.join(", ")
                ),
            )
            .with_resource(Some(request.id.clone()), request.name.as_str()),
        );
    }

    Ok((request, warnings))
}

/// Rewrites `${VAR}`, `$VAR` and (in URLs) `:var` to `{{VAR}}`
#[derive(Default)]
struct ShellVariables {
    converted: bool,
}

impl ShellVariables {
    fn convert(&mut self, text: &str) -> String {
        let out = [VariableSyntax::DollarBrace, VariableSyntax::Dollar]
            .into_iter()
            .fold(text.to_string(), |acc, syntax| {
                convert_variable_syntax(&acc, syntax, VariableSyntax::DoubleBrace)
            });
        self.converted |= out != text;
        out
    }

    fn convert_url(&mut self, url: &str) -> String {
        let converted = self.convert(url);
        let (base, query) = split_query(&converted);
        let path = convert_variable_syntax(base, VariableSyntax::Colon, VariableSyntax::DoubleBrace);
        if path == base {
            return converted;
        }
        self.converted = true;
        match query {
            Some(query) => format!("{}?{}", path, query),
            None => path,
        }
    }
}

/// `Name: value`; `Name;` sends an empty header; `Name:` alone removes it
fn parse_header(raw: &str) -> Option<KeyValue> {
    if let Some((name, value)) = raw.split_once(':') {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        return Some(KeyValue::new(name.trim(), value));
    }
    raw.strip_suffix(';')
        .map(|name| KeyValue::new(name.trim(), ""))
}

/// Auth from `-u`, `--oauth2-bearer` or an `Authorization` header
///
/// A converted `Authorization` header is removed; `-u` wins over it.
fn extract_auth(
    command: &CurlCommand,
    headers: &mut Vec<KeyValue>,
    shell: &mut ShellVariables,
) -> Option<Auth> {
    let position = headers
        .iter()
        .position(|h| h.key.eq_ignore_ascii_case("authorization"));
    let header_auth = position.and_then(|index| {
        let value = headers[index].value.trim();
        let (scheme, credentials) = value.split_once(char::is_whitespace)?;
        let credentials = credentials.trim();
        if scheme.eq_ignore_ascii_case("bearer") {
            Some(Auth::Bearer {
                token: credentials.to_string(),
            })
        } else if scheme.eq_ignore_ascii_case("basic") {
            decode_basic(credentials)
        } else {
            None
        }
    });
    if let (Some(index), Some(_)) = (position, &header_auth) {
        headers.remove(index);
    }

    if let Some(user) = &command.user {
        let user = shell.convert(user);
        let (username, password) = user.split_once(':').unwrap_or((user.as_str(), ""));
        return Some(Auth::Basic {
            username: username.to_string(),
            password: password.to_string(),
        });
    }
    if let Some(token) = &command.bearer {
        return Some(Auth::Bearer {
            token: shell.convert(token),
        });
    }
    header_auth
}

fn decode_basic(encoded: &str) -> Option<Auth> {
    let bytes = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    let (username, password) = decoded.split_once(':').unwrap_or((decoded.as_str(), ""));
    Some(Auth::Basic {
        username: username.to_string(),
        password: password.to_string(),
    })
}

fn form_body(parts: &[FormPart], shell: &mut ShellVariables) -> Body {
    let form_data = parts
        .iter()
        .filter_map(|part| {
            let (name, value) = part.value.split_once('=')?;
            let value = shell.convert(value);
            let field = match value.strip_prefix('@') {
                Some(path) if !part.literal => {
                    // name=@path;type=image/png
                    let path = path.split(';').next().unwrap_or_default();
                    KeyValue::file(name, path)
                }
                _ => KeyValue::new(name, value),
            };
            Some(field)
        })
        .collect();
    Body::FormData { form_data }
}

/// `--data-urlencode` parts are percent-encoded the way curl sends them:
/// `content`, `=content` and `name=content` encode the content only.
/// `{{var}}` references are left readable.
fn query_part(part: &DataPart) -> String {
    if part.kind != DataKind::Urlencode {
        return part.value.clone();
    }
    match part.value.split_once('=') {
        Some(("", content)) => encode_preserving_variables(content),
        Some((name, content)) => format!("{}={}", name, encode_preserving_variables(content)),
        None => encode_preserving_variables(&part.value),
    }
}

fn encode_preserving_variables(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start..].find("}}") else {
            break;
        };
        let end = start + len + 2;
        encoded.push_str(&urlencoding::encode(&rest[..start]));
        encoded.push_str(&rest[start..end]);
        rest = &rest[end..];
    }
    encoded.push_str(&urlencoding::encode(rest));
    encoded
}

fn join_data(parts: &[DataPart]) -> String {
    parts
        .iter()
        .map(|part| part.value.as_str())
        .collect::<Vec<_>>()
        .join("&")
}

fn data_body(parts: &[DataPart], headers: &[KeyValue]) -> Body {
    if parts.is_empty() {
        return Body::None;
    }

    if parts.iter().all(|part| part.kind == DataKind::Urlencode) {
        return Body::FormUrlencoded {
            form_data: parts
                .iter()
                .map(|part| match part.value.split_once('=') {
                    Some((name, value)) => KeyValue::new(name, value),
                    None => KeyValue::new(part.value.as_str(), ""),
                })
                .collect(),
        };
    }

    if let [single] = parts {
        let reads_file = matches!(single.kind, DataKind::Ascii | DataKind::Binary);
        if let Some(path) = single.value.strip_prefix('@').filter(|_| reads_file) {
            return Body::Binary {
                content: path.to_string(),
            };
        }
    }

    let content = join_data(parts);
    let content_type = headers
        .iter()
        .find(|h| h.key.eq_ignore_ascii_case("content-type"))
        .map(|h| h.value.to_ascii_lowercase());

    match content_type {
        Some(ct) if ct.contains("json") => Body::Json { content },
        Some(ct) if ct.contains("xml") => Body::Xml { content },
        Some(ct) if ct.contains("html") => Body::Html { content },
        Some(ct) if ct.contains("x-www-form-urlencoded") => Body::FormUrlencoded {
            form_data: parse_query(&content),
        },
        Some(_) => Body::Text { content },
        None => sniff_body(content),
    }
}

/// Body type for data sent without a Content-Type header
fn sniff_body(content: String) -> Body {
    let trimmed = content.trim_start();
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(&content).is_ok()
    {
        Body::Json { content }
    } else if form_pairs_regex().is_match(&content) {
        Body::FormUrlencoded {
            form_data: parse_query(&content),
        }
    } else {
        Body::Text { content }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curl::parse_command;

    fn convert(text: &str) -> (Request, Vec<ImportWarning>) {
        convert_command(&parse_command(text).unwrap()).unwrap()
    }

    #[test]
    fn test_simple_get() {
        let (request, warnings) = convert("curl https://example.com/ping");
        assert_eq!(request.method, "GET");
        assert_eq!(request.url, "https://example.com/ping");
        assert_eq!(request.name, "GET /ping");
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_data_forces_post_and_sniffs_json() {
        let (request, _) = convert(r#"curl -d '{"a":1}' https://x.test/y"#);
        assert_eq!(request.method, "POST");
        assert_eq!(
            request.body,
            Body::Json {
                content: r#"{"a":1}"#.to_string()
            }
        );
    }

    #[test]
    fn test_explicit_method_is_kept() {
        let (request, _) = convert("curl -X PUT -d a=1 https://x.test/y");
        assert_eq!(request.method, "PUT");
        assert!(matches!(request.body, Body::FormUrlencoded { .. }));
    }

    #[test]
    fn test_get_flag_moves_data_to_query() {
        let (request, _) = convert("curl -G -d q=rust -d page=2 https://x.test/search");
        assert_eq!(request.method, "GET");
        assert_eq!(request.url, "https://x.test/search?q=rust&page=2");
        assert_eq!(request.params.len(), 2);
        assert!(request.body.is_none());
    }

    #[test]
    fn test_get_flag_percent_encodes_urlencode_data() {
        let (request, _) = convert(
            "curl -G --data-urlencode 'q=hello world&x' --data-urlencode 'tag={{tag}} 1' https://x.test/s",
        );
        assert_eq!(
            request.url,
            "https://x.test/s?q=hello%20world%26x&tag={{tag}}%201"
        );
        assert_eq!(request.params[0].key, "q");
        assert!(!request.url.contains(' '));
    }

    #[test]
    fn test_head_flag() {
        let (request, _) = convert("curl -I https://x.test");
        assert_eq!(request.method, "HEAD");
        assert_eq!(request.name, "HEAD /");
    }

    #[test]
    fn test_bearer_header_becomes_auth() {
        let (request, _) = convert("curl -H 'Authorization: Bearer abc123' https://x.test");
        assert_eq!(
            request.auth,
            Some(Auth::Bearer {
                token: "abc123".to_string()
            })
        );
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_user_flag_beats_basic_header() {
        // dXNlcjpwYXNz = user:pass
        let (request, _) = convert(
            "curl -u admin:secret -H 'Authorization: Basic dXNlcjpwYXNz' https://x.test",
        );
        assert_eq!(
            request.auth,
            Some(Auth::Basic {
                username: "admin".to_string(),
                password: "secret".to_string()
            })
        );
        assert!(request.header("Authorization").is_none());
    }

    #[test]
    fn test_basic_header_is_decoded() {
        let (request, _) = convert("curl -H 'Authorization: Basic dXNlcjpwYXNz' https://x.test");
        assert_eq!(
            request.auth,
            Some(Auth::Basic {
                username: "user".to_string(),
                password: "pass".to_string()
            })
        );
    }

    #[test]
    fn test_form_with_file() {
        let (request, _) = convert("curl -F 'avatar=@me.png;type=image/png' -F name=x https://x.test/u");
        let Body::FormData { form_data } = &request.body else {
            panic!("expected form data");
        };
        assert_eq!(form_data[0].value, "me.png");
        assert!(!form_data[0].kind.is_text());
        assert_eq!(form_data[1].value, "x");
        assert_eq!(request.method, "POST");
    }

    #[test]
    fn test_binary_file_body() {
        let (request, _) = convert("curl --data-binary @payload.bin https://x.test/up");
        assert_eq!(
            request.body,
            Body::Binary {
                content: "payload.bin".to_string()
            }
        );
    }

    #[test]
    fn test_agent_referer_cookie_headers() {
        let (request, _) = convert(
            "curl -A 'bot/1.0' -e https://ref.test -b 'a=1' -b cookies.txt https://x.test",
        );
        let keys: Vec<&str> = request.headers.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["User-Agent", "Referer", "Cookie"]);
        assert_eq!(request.header("cookie").unwrap().value, "a=1");
    }

    #[test]
    fn test_dropped_options_are_aggregated() {
        let (_, warnings) = convert("curl -k -L --max-time 5 https://x.test");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::ConversionNote);
        assert!(warnings[0].message.contains("--insecure"));
        assert!(warnings[0].message.contains("--max-time"));
    }

    #[test]
    fn test_shell_variables_converted() {
        let (request, warnings) =
            convert(r#"curl -H "Authorization: Bearer $TOKEN" "https://${HOST}/users/:id""#);
        assert_eq!(request.url, "https://{{HOST}}/users/{{id}}");
        assert_eq!(
            request.auth,
            Some(Auth::Bearer {
                token: "{{TOKEN}}".to_string()
            })
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::SyntaxConverted);
    }

    #[test]
    fn test_missing_url() {
        let command = parse_command("curl -X GET").unwrap();
        assert!(convert_command(&command).is_err());
    }
}
