use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Types that can be requested as OpenAI strict structured output.
///
/// Implemented for every `JsonSchema + DeserializeOwned` type. The generated
/// schema is rewritten to satisfy strict mode: every object gets
/// `additionalProperties: false`, every property is listed in `required`,
/// `$ref`s are inlined, and `default` / `format` keywords (which strict mode
/// rejects) are dropped.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    fn openai_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        close_object_schemas(&mut value);
        inline_refs(&mut value);
        strip_unsupported_keywords(&mut value);

        if let Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
        }

        value
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn close_object_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                let keys: Option<Vec<Value>> = map
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().cloned().map(Value::String).collect());
                if let Some(keys) = keys {
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }

            for (_, v) in map.iter_mut() {
                close_object_schemas(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(close_object_schemas),
        _ => {}
    }
}

fn strip_unsupported_keywords(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("default");
            if map.get("format").is_some_and(Value::is_string) {
                map.remove("format");
            }
            for (key, v) in map.iter_mut() {
                match (key.as_str(), v) {
                    // Keys of `properties` are field names, not keywords.
                    ("properties", Value::Object(props)) => {
                        props.values_mut().for_each(strip_unsupported_keywords)
                    }
                    (_, v) => strip_unsupported_keywords(v),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_unsupported_keywords),
        _ => {}
    }
}

fn inline_refs(value: &mut Value) {
    let definitions = value.get("definitions").cloned();
    if let Some(defs) = definitions {
        inline_refs_with(value, &defs);
    }
}

fn inline_refs_with(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix("#/definitions/"))
                .and_then(|name| definitions.get(name))
                .cloned();
            if let Some(def) = target {
                *value = def;
                inline_refs_with(value, definitions);
                return;
            }

            let single_all_of = match map.get("allOf") {
                Some(Value::Array(all_of)) if all_of.len() == 1 => Some(all_of[0].clone()),
                _ => None,
            };
            if let Some(inner) = single_all_of {
                *value = inner;
                inline_refs_with(value, definitions);
                return;
            }

            for (_, v) in map.iter_mut() {
                inline_refs_with(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                inline_refs_with(item, definitions);
            }
        }
        _ => {}
    }
}
