use std::collections::HashSet;

use serde_json::Value;

use crate::prd::{ListField, PrdDocument, PrdFragment, normalize_entry};

/// Fold one turn's fragment into the running document.
///
/// Total: a fragment can only add to list fields, replace `problem` with a
/// non-blank value, and add or replace passthrough keys with non-empty values.
/// Applying the same fragment twice gives the same document as applying it once.
pub fn merge(fragment: &PrdFragment, current: &PrdDocument) -> PrdDocument {
    let mut merged = current.clone();

    if let Some(problem) = fragment.problem.as_deref() {
        let problem = problem.trim();
        if !problem.is_empty() {
            merged.problem = problem.to_string();
        }
    }

    for field in ListField::ALL {
        if let Some(incoming) = fragment.list(field) {
            union_into(merged.list_mut(field), incoming);
        }
    }

    for (key, value) in &fragment.extra {
        if merged.extra.contains_key(key) && !has_content(value) {
            continue;
        }
        merged.extra.insert(key.clone(), value.clone());
    }

    merged
}

/// Append entries not already present (case-insensitive, trimmed), keeping
/// existing order and the casing each entry was first seen with.
fn union_into(existing: &mut Vec<String>, incoming: &[String]) {
    let mut seen: HashSet<String> = existing.iter().map(|e| normalize_entry(e)).collect();

    for entry in incoming {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if seen.insert(normalize_entry(entry)) {
            existing.push(entry.to_string());
        }
    }
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
