//! Canonical JSON

use apiport_common::{Collection, Result};

/// The collection exactly as modelled, pretty-printed
pub fn to_native(collection: &Collection) -> Result<String> {
    Ok(serde_json::to_string_pretty(collection)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiport_common::{Auth, Body, Request};

    #[test]
    fn test_native_reads_back() {
        let mut collection = Collection::new("Native");
        let mut request = Request::new("Create", "POST", "{{baseUrl}}/items");
        request.body = Body::Json {
            content: "{\"a\": 1}".to_string(),
        };
        request.auth = Some(Auth::Bearer {
            token: "{{token}}".to_string(),
        });
        collection.requests.push(request);

        let text = to_native(&collection).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["requests"][0]["body"]["type"], "json");
        assert_eq!(value["requests"][0]["auth"]["type"], "bearer");

        let back: Collection = serde_json::from_str(&text).unwrap();
        assert_eq!(back, collection);
    }
}
