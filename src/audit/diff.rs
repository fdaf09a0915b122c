//! Field-level diffs for audit entries

use serde_json::{Map, Value};

/// Bookkeeping fields that change on every write and are left out of diffs
const IGNORED_FIELDS: [&str; 2] = ["created_at", "updated_at"];

const MAX_TEXT: usize = 48;

/// Summarise the top-level fields that differ between two serialized records
///
/// Returns `None` when nothing but bookkeeping fields changed.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let changes = match (before, after) {
        (Value::Object(old), Value::Object(new)) => object_changes(old, new),
        _ if before != after => vec![format!("{} -> {}", render(before), render(after))],
        _ => Vec::new(),
    };

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn object_changes(old: &Map<String, Value>, new: &Map<String, Value>) -> Vec<String> {
    let mut keys: Vec<&String> = old.keys().chain(new.keys()).collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter(|key| !IGNORED_FIELDS.contains(&key.as_str()))
        .filter_map(|key| match (old.get(key), new.get(key)) {
            (Some(a), Some(b)) if a != b => Some(format!("{}: {} -> {}", key, render(a), render(b))),
            (Some(a), None) => Some(format!("{}: {} -> (removed)", key, render(a))),
            (None, Some(b)) => Some(format!("{}: (added) -> {}", key, render(b))),
            _ => None,
        })
        .collect()
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) if s.chars().count() > MAX_TEXT => {
            let head: String = s.chars().take(MAX_TEXT - 3).collect();
            format!("\"{}...\"", head)
        }
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(fields) => format!("{{{} fields}}", fields.len()),
        other => other.to_string(),
    }
}
