//! Minimal URL helpers that tolerate `{{variable}}` placeholders
//!
//! Imported URLs are frequently not valid URLs (`{{baseUrl}}/users`), so
//! these helpers work on plain string structure instead of a strict parser.

use crate::KeyValue;

/// Split a URL into `(base, query)`; the fragment is dropped
pub fn split_query(url: &str) -> (&str, Option<&str>) {
    let without_fragment = match url.find('#') {
        Some(index) => &url[..index],
        None => url,
    };
    match without_fragment.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (without_fragment, None),
    }
}

/// Parse `a=1&b=2` into enabled key/value pairs; values are kept as written
pub fn parse_query(query: &str) -> Vec<KeyValue> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => KeyValue::new(key, value),
            None => KeyValue::new(pair, ""),
        })
        .collect()
}

/// Query parameters of a URL
pub fn query_params(url: &str) -> Vec<KeyValue> {
    split_query(url).1.map(parse_query).unwrap_or_default()
}

/// Render enabled parameters as `a=1&b=2`
pub fn build_query(params: &[KeyValue]) -> String {
    params
        .iter()
        .filter(|p| p.enabled)
        .map(|p| {
            if p.value.is_empty() {
                p.key.clone()
            } else {
                format!("{}={}", p.key, p.value)
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Append enabled parameters to a URL that has no query string yet
pub fn with_query(base: &str, params: &[KeyValue]) -> String {
    let query = build_query(params);
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, query)
    }
}

/// Split a URL into `(origin, path)`
///
/// The origin is `scheme://host[:port]`, or a leading `{{variable}}`
/// placeholder. The path always starts with `/`.
pub fn split_origin(url: &str) -> (&str, String) {
    let (base, _) = split_query(url);

    let path_start = if base.starts_with("{{") {
        base.find("}}").map(|end| end + 2)
    } else if let Some(scheme_end) = base.find("://") {
        let host_start = scheme_end + 3;
        Some(
            base[host_start..]
                .find('/')
                .map_or(base.len(), |i| host_start + i),
        )
    } else if base.starts_with('/') {
        Some(0)
    } else {
        // host/path without a scheme
        Some(base.find('/').unwrap_or(base.len()))
    };

    let index = path_start.unwrap_or(0);
    let path = &base[index..];
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    (&base[..index], path)
}
