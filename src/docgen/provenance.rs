//! Provenance metadata recorded with every generated document.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::context::Context;

/// Prompt version recorded for AI-written documents.
pub const PROMPT_VERSION_LLM: &str = "v2-llm-legal";
/// Prompt version recorded for template and fallback documents.
pub const PROMPT_VERSION_BASE: &str = "v1";

/// Serialize with object keys sorted at every depth and no whitespace.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// SHA-256 hex digest of the canonical generation inputs. The context only
/// takes part when the caller supplied one.
pub fn inputs_hash(
    process_id: i64,
    zone_id: Option<i64>,
    form: &Value,
    photos: &[Value],
    context: Option<&Context>,
) -> String {
    let mut payload = json!({
        "process_id": process_id,
        "zone_id": zone_id,
        "form": form,
        "photos": photos,
    });
    if let (Some(ctx), Some(map)) = (context, payload.as_object_mut()) {
        map.insert("context".to_string(), Value::Object(ctx.clone()));
    }

    let digest = Sha256::digest(canonical_json(&payload).as_bytes());
    format!("{:x}", digest)
}
