//! Dialect-specific shaping of parameters and responses
//!
//! Annotations store parameters in OpenAPI 3 shape (as produced by the schema
//! library) and responses with a bare `schema` key. These helpers move the
//! schema to wherever the target document dialect expects it, and point
//! `$ref`s at the dialect's definitions section.

use crate::merge::merge_recursive;
use crate::spec::Dialect;
use serde_json::{json, Map, Value};

/// Keys describing a primitive type, valid inline in a Swagger 2.0 parameter
const INLINE_SCHEMA_KEYS: &[&str] = &[
    "type",
    "format",
    "items",
    "enum",
    "default",
    "minimum",
    "maximum",
    "minLength",
    "maxLength",
    "pattern",
];

/// JSON pointer prefixes of named schema definitions in either dialect
const REF_PREFIXES: &[&str] = &["#/components/schemas/", "#/definitions/"];

/// Point every `$ref` to a named schema at the definitions of `dialect`
pub fn rewrite_refs(value: &mut Value, dialect: Dialect) {
    match value {
        Value::Object(object) => {
            for (key, child) in object.iter_mut() {
                if key == "$ref" {
                    if let Value::String(reference) = child {
                        if let Some(name) = REF_PREFIXES
                            .iter()
                            .find_map(|prefix| reference.strip_prefix(prefix))
                        {
                            *reference = format!("{}{}", dialect.schema_ref_prefix(), name);
                        }
                    }
                } else {
                    rewrite_refs(child, dialect);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_refs(item, dialect);
            }
        }
        _ => {}
    }
}

/// Parameter object for one rule argument
///
/// `converter` is the URL rule converter name (`int`, `float`, `uuid`, ...);
/// `overrides` are merged on top of the generated fields.
pub fn path_parameter(name: &str, converter: &str, overrides: Option<&Value>, dialect: Dialect) -> Value {
    let schema = match converter {
        "int" => json!({ "type": "integer" }),
        "float" => json!({ "type": "number" }),
        "uuid" => json!({ "type": "string", "format": "uuid" }),
        _ => json!({ "type": "string" }),
    };

    let base = json!({
        "in": "path",
        "name": name,
        "required": true,
        "schema": schema,
    });
    let base = parameter_for_dialect(base, dialect);

    match overrides {
        Some(overrides) => merge_recursive(vec![overrides.clone(), base]),
        None => base,
    }
}

/// Reshape a parameter object for the target dialect
pub fn parameter_for_dialect(mut parameter: Value, dialect: Dialect) -> Value {
    rewrite_refs(&mut parameter, dialect);
    let Value::Object(mut parameter) = parameter else {
        return parameter;
    };

    match dialect {
        Dialect::Swagger2 => {
            for key in ["style", "explode", "allowReserved", "example"] {
                parameter.remove(key);
            }
            let is_body = parameter.get("in").and_then(Value::as_str) == Some("body");
            if !is_body {
                if let Some(Value::Object(schema)) = parameter.remove("schema") {
                    for (key, value) in schema {
                        parameter.entry(key).or_insert(value);
                    }
                }
            }
        }
        Dialect::OpenApi3 => {
            if !parameter.contains_key("schema") {
                let mut schema = Map::new();
                for key in INLINE_SCHEMA_KEYS {
                    if let Some(value) = parameter.remove(*key) {
                        schema.insert((*key).to_string(), value);
                    }
                }
                if !schema.is_empty() {
                    parameter.insert("schema".to_string(), Value::Object(schema));
                }
            }
        }
    }

    Value::Object(parameter)
}

/// Reshape a `{code: response}` object for the target dialect
pub fn responses_for_dialect(responses: Value, dialect: Dialect) -> Value {
    let Value::Object(responses) = responses else {
        return responses;
    };

    let reshaped = responses
        .into_iter()
        .map(|(code, response)| (code, response_for_dialect(response, dialect)))
        .collect::<Map<_, _>>();
    Value::Object(reshaped)
}

fn response_for_dialect(mut response: Value, dialect: Dialect) -> Value {
    rewrite_refs(&mut response, dialect);
    let Value::Object(mut response) = response else {
        return response;
    };

    match dialect {
        Dialect::Swagger2 => {
            if !response.contains_key("schema") {
                let schema = response
                    .get_mut("content")
                    .and_then(|content| content.get_mut("application/json"))
                    .and_then(|media| media.as_object_mut())
                    .and_then(|media| media.remove("schema"));
                if let Some(schema) = schema {
                    response.remove("content");
                    response.insert("schema".to_string(), schema);
                }
            }
        }
        Dialect::OpenApi3 => {
            if let Some(schema) = response.remove("schema") {
                response.insert(
                    "content".to_string(),
                    json!({ "application/json": { "schema": schema } }),
                );
            }
        }
    }

    Value::Object(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_path_parameter_swagger2() {
        let param = path_parameter("band_id", "int", None, Dialect::Swagger2);
        assert_eq!(
            param,
            json!({"in": "path", "name": "band_id", "required": true, "type": "integer"})
        );
    }

    #[test]
    fn uuid_path_parameter_openapi3() {
        let param = path_parameter("id", "uuid", None, Dialect::OpenApi3);
        assert_eq!(param["schema"], json!({"type": "string", "format": "uuid"}));
        assert!(param.get("type").is_none());
    }

    #[test]
    fn overrides_win_over_generated_fields() {
        let overrides = json!({"description": "Band identifier", "type": "string"});
        let param = path_parameter("band_id", "int", Some(&overrides), Dialect::Swagger2);
        assert_eq!(param["description"], "Band identifier");
        assert_eq!(param["type"], "string");
        assert_eq!(param["required"], json!(true));
    }

    #[test]
    fn query_parameter_hoisted_for_swagger2() {
        let param = json!({
            "name": "limit",
            "in": "query",
            "required": false,
            "style": "form",
            "schema": {"type": "integer", "format": "int32"}
        });
        let param = parameter_for_dialect(param, Dialect::Swagger2);
        assert_eq!(param["type"], "integer");
        assert_eq!(param["format"], "int32");
        assert!(param.get("schema").is_none());
        assert!(param.get("style").is_none());
    }

    #[test]
    fn inline_type_moved_into_schema_for_openapi3() {
        let param = json!({"name": "q", "in": "query", "type": "string"});
        let param = parameter_for_dialect(param, Dialect::OpenApi3);
        assert_eq!(param["schema"], json!({"type": "string"}));
    }

    #[test]
    fn response_schema_under_content_for_openapi3() {
        let responses = json!({"200": {"description": "OK", "schema": {"type": "object"}}});
        let responses = responses_for_dialect(responses, Dialect::OpenApi3);
        assert_eq!(
            responses["200"]["content"]["application/json"]["schema"],
            json!({"type": "object"})
        );
        assert!(responses["200"].get("schema").is_none());
    }

    #[test]
    fn response_schema_hoisted_for_swagger2() {
        let responses = json!({"200": {
            "description": "OK",
            "content": {"application/json": {"schema": {"type": "string"}}}
        }});
        let responses = responses_for_dialect(responses, Dialect::Swagger2);
        assert_eq!(responses["200"], json!({"description": "OK", "schema": {"type": "string"}}));
    }

    #[test]
    fn nested_refs_follow_swagger2_definitions() {
        let responses = json!({"200": {
            "description": "OK",
            "schema": {
                "type": "object",
                "properties": {
                    "albums": {"type": "array", "items": {"$ref": "#/components/schemas/Album"}}
                }
            }
        }});
        let responses = responses_for_dialect(responses, Dialect::Swagger2);
        assert_eq!(
            responses["200"]["schema"]["properties"]["albums"]["items"]["$ref"],
            "#/definitions/Album"
        );
    }

    #[test]
    fn refs_follow_openapi3_components() {
        let mut schema = json!({"allOf": [{"$ref": "#/definitions/Album"}, {"$ref": "https://x/y"}]});
        rewrite_refs(&mut schema, Dialect::OpenApi3);
        assert_eq!(schema["allOf"][0]["$ref"], "#/components/schemas/Album");
        assert_eq!(schema["allOf"][1]["$ref"], "https://x/y");
    }
}
