//! Sample values synthesized from schemas

use super::types::Schema;
use serde_json::{json, Map, Value};

/// Recursion limit for nested objects and arrays
const MAX_DEPTH: usize = 8;

/// Builds example values; counts the `$ref` schemas it had to leave unresolved
#[derive(Debug, Default)]
pub struct ExampleBuilder {
    pub unresolved_refs: usize,
}

impl ExampleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Example for `schema`: its literal example, else a synthesized value
    pub fn build(&mut self, schema: &Schema) -> Value {
        self.synthesize(schema, 0)
    }

    fn synthesize(&mut self, schema: &Schema, depth: usize) -> Value {
        if let Some(example) = &schema.example {
            return example.clone();
        }
        if schema.ref_path.is_some() {
            self.unresolved_refs += 1;
            return json!({});
        }
        if depth >= MAX_DEPTH {
            return Value::Null;
        }
        if let Some(default) = &schema.default {
            return default.clone();
        }
        if let Some(first) = schema.enum_values.first() {
            return first.clone();
        }

        if !schema.all_of.is_empty() {
            let mut merged = Map::new();
            for part in &schema.all_of {
                match self.synthesize(part, depth + 1) {
                    Value::Object(fields) => merged.extend(fields),
                    other if merged.is_empty() => return other,
                    _ => {}
                }
            }
            return Value::Object(merged);
        }
        if let Some(first) = schema.one_of.first().or_else(|| schema.any_of.first()) {
            return self.synthesize(first, depth + 1);
        }

        match schema.type_name() {
            Some("string") => Value::String(string_example(schema.format.as_deref()).to_string()),
            Some("integer") | Some("number") => json!(0),
            Some("boolean") => json!(true),
            Some("array") => {
                let item = match &schema.items {
                    Some(items) => self.synthesize(items, depth + 1),
                    None => Value::String("string".to_string()),
                };
                Value::Array(vec![item])
            }
            Some("object") => self.object(schema, depth),
            None if !schema.properties.is_empty() => self.object(schema, depth),
            _ => Value::Null,
        }
    }

    fn object(&mut self, schema: &Schema, depth: usize) -> Value {
        let mut fields = Map::new();
        for (name, property) in &schema.properties {
            fields.insert(name.clone(), self.synthesize(property, depth + 1));
        }
        Value::Object(fields)
    }
}

fn string_example(format: Option<&str>) -> &'static str {
    match format {
        Some("date") => "2024-01-01",
        Some("date-time") => "2024-01-01T00:00:00Z",
        Some("email") => "user@example.com",
        Some("uuid") => "00000000-0000-0000-0000-000000000000",
        Some("uri") | Some("url") => "https://example.com",
        _ => "string",
    }
}

/// Render a JSON value as a header, query or form value
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(json: &str) -> Schema {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_string_formats() {
        let mut builder = ExampleBuilder::new();
        for (format, expected) in [
            ("date", "2024-01-01"),
            ("date-time", "2024-01-01T00:00:00Z"),
            ("email", "user@example.com"),
            ("uuid", "00000000-0000-0000-0000-000000000000"),
            ("uri", "https://example.com"),
            ("password", "string"),
        ] {
            let s = schema(&format!(r#"{{"type": "string", "format": "{}"}}"#, format));
            assert_eq!(builder.build(&s), json!(expected));
        }
    }

    #[test]
    fn test_object_with_nested_array() {
        let s = schema(
            r#"{
                "type": "object",
                "properties": {
                    "id": {"type": "integer"},
                    "name": {"type": "string", "example": "Rex"},
                    "status": {"type": "string", "enum": ["available", "sold"]},
                    "tags": {"type": "array", "items": {"type": "boolean"}}
                }
            }"#,
        );
        assert_eq!(
            ExampleBuilder::new().build(&s),
            json!({"id": 0, "name": "Rex", "status": "available", "tags": [true]})
        );
    }

    #[test]
    fn test_ref_is_left_unresolved() {
        let s = schema(
            r##"{"type": "object", "properties": {"owner": {"$ref": "#/components/schemas/User"}}}"##,
        );
        let mut builder = ExampleBuilder::new();
        assert_eq!(builder.build(&s), json!({"owner": {}}));
        assert_eq!(builder.unresolved_refs, 1);
    }

    #[test]
    fn test_depth_is_capped() {
        let mut s = schema(r#"{"type": "string"}"#);
        for _ in 0..12 {
            let mut outer = schema(r#"{"type": "object"}"#);
            outer.properties.insert("child".to_string(), s);
            s = outer;
        }
        let value = ExampleBuilder::new().build(&s);
        let mut depth = 0;
        let mut cursor = &value;
        while let Some(child) = cursor.get("child") {
            depth += 1;
            cursor = child;
        }
        assert_eq!(depth, MAX_DEPTH);
        assert_eq!(cursor, &Value::Null);
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&json!("a")), "a");
        assert_eq!(render_value(&json!(5)), "5");
        assert_eq!(render_value(&Value::Null), "");
    }
}
