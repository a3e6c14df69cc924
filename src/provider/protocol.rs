use serde_json::Value;

use super::{AdapterError, ExtractionResult};
use crate::prd::PrdFragment;

/// JSON schema the provider is asked to follow (and re-asked during repair)
pub const EXTRACTION_SCHEMA: &str = r#"{
  "type": "object",
  "required": ["assistant_text", "questions", "prd"],
  "properties": {
    "assistant_text": { "type": "string" },
    "questions": { "type": "array", "items": { "type": "string" } },
    "prd": {
      "type": "object",
      "required": ["problem", "users", "goals", "metrics", "requirements", "open_questions"],
      "properties": {
        "problem": { "type": "string" },
        "users": { "type": "array", "items": { "type": "string" } },
        "goals": { "type": "array", "items": { "type": "string" } },
        "metrics": { "type": "array", "items": { "type": "string" } },
        "requirements": { "type": "array", "items": { "type": "string" } },
        "open_questions": { "type": "array", "items": { "type": "string" } }
      }
    }
  }
}"#;

/// Strip a surrounding markdown code fence (```json ... ``` or ``` ... ```)
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let without_prefix = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_prefix
        .strip_suffix("```")
        .unwrap_or(without_prefix)
        .trim()
}

/// Best-effort: parse the outermost `{ ... }` span of the reply as a JSON object.
/// Tolerates leading prose and code fences around the object.
pub fn extract_json_object(raw: &str) -> Result<Value, String> {
    let text = strip_code_fences(raw);

    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err("no JSON object found in provider output".to_string());
    };
    if end <= start {
        return Err("no JSON object found in provider output".to_string());
    }

    let value: Value =
        serde_json::from_str(&text[start..=end]).map_err(|e| format!("invalid JSON: {}", e))?;
    if !value.is_object() {
        return Err("provider output is not a JSON object".to_string());
    }
    Ok(value)
}

/// Read an extraction out of a parsed reply. Fields of the wrong shape fall
/// back to empty values rather than failing.
pub fn extraction_from_value(value: &Value) -> ExtractionResult {
    let assistant_text = value
        .get("assistant_text")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let questions = value
        .get("questions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let prd_fragment = value
        .get("prd")
        .map(PrdFragment::from_value)
        .unwrap_or_default();

    ExtractionResult {
        assistant_text,
        questions,
        prd_fragment,
    }
}

/// Parse raw provider text; the error keeps the raw text for diagnostics
pub fn parse_extraction(raw: &str) -> Result<ExtractionResult, AdapterError> {
    extract_json_object(raw)
        .map(|value| extraction_from_value(&value))
        .map_err(|reason| AdapterError::MalformedOutput {
            reason,
            raw_output: raw.to_string(),
        })
}
