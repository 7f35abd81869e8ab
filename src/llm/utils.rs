use schemars::JsonSchema;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::schema::Transaction;
use crate::utils::short_id;

/// JSON Schema for `T` in the OpenAPI subset Gemini accepts for
/// `responseSchema`: definitions inlined, nullable unions collapsed and
/// unsupported keywords dropped.
pub fn gemini_schema<T: JsonSchema>() -> Result<Value> {
    let root = schemars::schema_for!(T);
    let value = serde_json::to_value(&root)?;
    let definitions = value
        .get("definitions")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    Ok(sanitize_schema(value, &definitions))
}

fn sanitize_schema(value: Value, definitions: &Value) -> Value {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                let name = reference.trim_start_matches("#/definitions/");
                if let Some(definition) = definitions.get(name) {
                    return sanitize_schema(definition.clone(), definitions);
                }
            }

            let mut out = Map::new();
            for (key, val) in map {
                match key.as_str() {
                    "$schema" | "$ref" | "title" | "definitions" | "format" | "default"
                    | "additionalProperties" => {}
                    "type" => match collapse_nullable(&val) {
                        Some((single, nullable)) => {
                            out.insert(key, single);
                            if nullable {
                                out.insert("nullable".to_string(), Value::Bool(true));
                            }
                        }
                        None => {
                            out.insert(key, val);
                        }
                    },
                    // Property names are user data, not keywords.
                    "properties" => {
                        let props = match val {
                            Value::Object(props) => props
                                .into_iter()
                                .map(|(name, schema)| (name, sanitize_schema(schema, definitions)))
                                .collect(),
                            _ => Map::new(),
                        };
                        out.insert(key, Value::Object(props));
                    }
                    _ => {
                        out.insert(key, sanitize_schema(val, definitions));
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| sanitize_schema(item, definitions))
                .collect(),
        ),
        other => other,
    }
}

/// `["string", "null"]` becomes `("string", true)`.
fn collapse_nullable(types: &Value) -> Option<(Value, bool)> {
    let Value::Array(types) = types else {
        return None;
    };
    let concrete: Vec<&Value> = types
        .iter()
        .filter(|t| t.as_str() != Some("null"))
        .collect();
    match concrete.as_slice() {
        [single] => Some(((*single).clone(), concrete.len() < types.len())),
        _ => None,
    }
}

/// One compact line per transaction, used as model context.
pub fn encode_transactions(transactions: &[Transaction]) -> String {
    transactions
        .iter()
        .map(|t| {
            format!(
                "[{}] {} | {} | {:.2} | {}{}",
                short_id(&t.id),
                t.date,
                t.description.replace('\n', " "),
                t.amount,
                t.category_or_default(),
                if t.is_subscription { " | SUB" } else { "" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strips markdown fences or chatter around a JSON object.
pub fn clean_json_output(raw: &str) -> &str {
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            return &raw[start..=end];
        }
    }
    raw.trim()
}
