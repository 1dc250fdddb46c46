//! Lenient accessors over `serde_json::Value`.
//!
//! Every report field is optional and may arrive in snake_case or camelCase,
//! so lookups never fail: a missing or mistyped field reads as empty.

use serde_json::Value;

/// Look up a field, trying snake_case first then camelCase. `null` counts as
/// absent.
pub(crate) fn field<'a>(v: &'a Value, snake_key: &str) -> Option<&'a Value> {
    let obj = v.as_object()?;
    if let Some(found) = obj.get(snake_key).filter(|x| !x.is_null()) {
        return Some(found);
    }
    let camel = snake_to_camel(snake_key);
    obj.get(&camel).filter(|x| !x.is_null())
}

pub(crate) fn field_in<'a>(v: Option<&'a Value>, snake_key: &str) -> Option<&'a Value> {
    v.and_then(|v| field(v, snake_key))
}

pub(crate) fn snake_to_camel(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = false;
    for ch in s.chars() {
        if ch == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(ch);
        }
    }
    result
}

/// String field, empty when absent.
pub(crate) fn get_str(v: &Value, key: &str) -> String {
    field(v, key).and_then(scalar_text).unwrap_or_default()
}

/// String field, `None` when absent or blank.
pub(crate) fn opt_str(v: &Value, key: &str) -> Option<String> {
    field(v, key)
        .and_then(scalar_text)
        .filter(|s| !s.is_empty())
}

pub(crate) fn get_bool(v: &Value, key: &str) -> bool {
    match field(v, key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim(), "true" | "yes" | "1"),
        _ => false,
    }
}

pub(crate) fn get_array<'a>(v: &'a Value, key: &str) -> &'a [Value] {
    field(v, key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Text of a scalar: strings trimmed, numbers and booleans stringified.
pub(crate) fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Coerce a string or a list into a list of non-empty strings.
pub(crate) fn string_list(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Some(other) => scalar_text(other)
            .filter(|s| !s.is_empty())
            .into_iter()
            .collect(),
        None => Vec::new(),
    }
}

/// Name of a tree entry: the string itself, or its `name` field.
pub(crate) fn node_name(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        _ => opt_str(v, "name"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snake_to_camel_converts_correctly() {
        assert_eq!(snake_to_camel("bot_directory"), "botDirectory");
        assert_eq!(snake_to_camel("run_examples"), "runExamples");
        assert_eq!(snake_to_camel("story_file_exists"), "storyFileExists");
        assert_eq!(snake_to_camel("scope"), "scope");
    }

    #[test]
    fn field_prefers_snake_then_camel_and_skips_null() {
        let v = json!({"botDirectory": "/camel", "workspace_name": null, "workspaceName": "ws"});
        assert_eq!(get_str(&v, "bot_directory"), "/camel");
        assert_eq!(get_str(&v, "workspace_name"), "ws");
        assert_eq!(opt_str(&v, "missing"), None);
    }

    #[test]
    fn string_list_coerces_shapes() {
        assert_eq!(string_list(Some(&json!("one"))), vec!["one"]);
        assert_eq!(
            string_list(Some(&json!(["a", "", 3, {"x": 1}]))),
            vec!["a", "3"]
        );
        assert!(string_list(Some(&json!("   "))).is_empty());
        assert!(string_list(None).is_empty());
    }

    #[test]
    fn get_bool_accepts_string_flags() {
        let v = json!({"a": true, "b": "yes", "c": "no", "d": 1});
        assert!(get_bool(&v, "a"));
        assert!(get_bool(&v, "b"));
        assert!(!get_bool(&v, "c"));
        assert!(!get_bool(&v, "d"));
    }
}
