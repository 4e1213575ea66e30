//! Layered configuration merge

use serde_json::{Map, Value};

use crate::schema::PATH_SEPARATOR;

/// Merge configuration layers, lowest precedence first
///
/// Objects merge key by key, recursively. Anything else in a higher layer
/// (arrays, strings, numbers, booleans, nested nulls) replaces the lower
/// value wholesale. A top-level `null` layer counts as absent.
pub fn deep_merge<'a>(layers: impl IntoIterator<Item = &'a Value>) -> Value {
    let mut merged = Value::Object(Map::new());
    for layer in layers {
        if !layer.is_null() {
            merge_into(&mut merged, layer);
        }
    }
    merged
}

/// Merge `overlay` into `target` in place
pub fn merge_into(target: &mut Value, overlay: &Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match target.get_mut(key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, overlay) => *target = overlay.clone(),
    }
}

/// Set the value at a dot-path, creating intermediate objects
///
/// Non-object values met along the way are replaced by objects.
pub fn set_path(target: &mut Value, path: &str, value: Value) {
    let mut current = target;
    let mut segments = path.split(PATH_SEPARATOR).peekable();
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_precedence() {
        let template_base = json!({"a": 1, "b": 1});
        let caller_base = json!({"b": 2});
        let default_user = json!({"c": 1});
        let caller_user = json!({"c": 2, "d": 1});
        let merged = deep_merge([&template_base, &caller_base, &default_user, &caller_user]);
        assert_eq!(merged, json!({"a": 1, "b": 2, "c": 2, "d": 1}));
    }

    #[test]
    fn test_nested_objects_merge() {
        let merged = deep_merge([
            &json!({"standard": {"spacing": {"top": "sm", "bottom": "sm"}}}),
            &json!({"standard": {"spacing": {"top": "lg"}}}),
        ]);
        assert_eq!(merged, json!({"standard": {"spacing": {"top": "lg", "bottom": "sm"}}}));
    }

    #[test]
    fn test_arrays_replace() {
        let merged = deep_merge([&json!({"items": [1, 2, 3]}), &json!({"items": [4]})]);
        assert_eq!(merged, json!({"items": [4]}));
    }

    #[test]
    fn test_null_layer_is_skipped() {
        let merged = deep_merge([&json!({"a": 1}), &Value::Null]);
        assert_eq!(merged, json!({"a": 1}));
    }

    #[test]
    fn test_nested_null_replaces() {
        let merged = deep_merge([&json!({"a": {"b": 1}}), &json!({"a": null})]);
        assert_eq!(merged, json!({"a": null}));
    }

    #[test]
    fn test_set_path() {
        let mut value = json!({"splash": "old", "keep": 1});
        set_path(&mut value, "splash.url", json!("https://cdn/a"));
        set_path(&mut value, "media.hero.format", json!("image"));
        assert_eq!(
            value,
            json!({
                "splash": {"url": "https://cdn/a"},
                "keep": 1,
                "media": {"hero": {"format": "image"}}
            })
        );
    }

    #[test]
    fn test_object_replaces_primitive() {
        let merged = deep_merge([&json!({"a": "x"}), &json!({"a": {"b": 1}})]);
        assert_eq!(merged, json!({"a": {"b": 1}}));
    }
}
