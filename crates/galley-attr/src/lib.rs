//! Attribute tree deep-merge for Galley.
//!
//! Node attributes are nested JSON-like trees (`serde_json::Value`). During
//! run-list expansion each applied role contributes a default and an override
//! tree, merged on top of whatever has accumulated so far. The merge contract:
//!
//! - two maps merge key-by-key, recursively;
//! - any non-map value from the incoming tree (scalar or array) replaces the
//!   accumulated value at that key.
//!
//! Incoming values always win at the leaf level, so precedence between roles
//! is purely a question of merge order.

use serde_json::Value;

/// Merge `other` on top of `base`, consuming both.
///
/// ```
/// use serde_json::json;
/// use galley_attr::deep_merge;
///
/// let base = json!({"apache": {"port": 80, "modules": ["ssl"]}});
/// let other = json!({"apache": {"port": 8080}});
/// let merged = deep_merge(base, other);
/// assert_eq!(merged, json!({"apache": {"port": 8080, "modules": ["ssl"]}}));
/// ```
pub fn deep_merge(base: Value, other: Value) -> Value {
    match (base, other) {
        (Value::Object(mut base_map), Value::Object(other_map)) => {
            for (key, other_value) in other_map {
                match base_map.remove(&key) {
                    Some(base_value) => {
                        base_map.insert(key, deep_merge(base_value, other_value));
                    }
                    None => {
                        base_map.insert(key, other_value);
                    }
                }
            }
            Value::Object(base_map)
        }
        // Non-map incoming values replace wholesale, arrays included.
        (_, other) => other,
    }
}

/// Merge `other` into `base` in place.
///
/// Equivalent to `*base = deep_merge(base.take(), other.clone())` but only
/// clones the subtrees of `other` that actually land in `base`.
pub fn deep_merge_into(base: &mut Value, other: &Value) {
    match (base, other) {
        (Value::Object(base_map), Value::Object(other_map)) => {
            for (key, other_value) in other_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_into(base_value, other_value),
                    None => {
                        base_map.insert(key.clone(), other_value.clone());
                    }
                }
            }
        }
        (base, other) => *base = other.clone(),
    }
}

/// Look up a nested value by `::`-free slash path, e.g. `"apache/port"`.
///
/// Returns `None` if any path segment is missing or a non-map is traversed.
pub fn value_at_path<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = tree;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merges_disjoint_keys() {
        let merged = deep_merge(json!({"a": 1}), json!({"b": 2}));
        assert_eq!(merged, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn incoming_leaf_wins() {
        let merged = deep_merge(json!({"foo": "bar"}), json!({"foo": "boo"}));
        assert_eq!(merged, json!({"foo": "boo"}));
    }

    #[test]
    fn nested_maps_merge_key_by_key() {
        let base = json!({"db": {"host": "localhost", "port": 5432}});
        let other = json!({"db": {"port": 5433, "name": "galley"}});
        assert_eq!(
            deep_merge(base, other),
            json!({"db": {"host": "localhost", "port": 5433, "name": "galley"}})
        );
    }

    #[test]
    fn arrays_replace_wholesale() {
        let base = json!({"modules": ["a", "b"]});
        let other = json!({"modules": ["c"]});
        assert_eq!(deep_merge(base, other), json!({"modules": ["c"]}));
    }

    #[test]
    fn map_replaces_scalar_and_vice_versa() {
        assert_eq!(
            deep_merge(json!({"x": 1}), json!({"x": {"y": 2}})),
            json!({"x": {"y": 2}})
        );
        assert_eq!(
            deep_merge(json!({"x": {"y": 2}}), json!({"x": 1})),
            json!({"x": 1})
        );
    }

    #[test]
    fn in_place_merge_matches_owned_merge() {
        let base = json!({"a": {"b": 1, "c": [1, 2]}, "d": true});
        let other = json!({"a": {"c": [3]}, "e": null});

        let mut in_place = base.clone();
        deep_merge_into(&mut in_place, &other);
        assert_eq!(in_place, deep_merge(base, other));
    }

    #[test]
    fn path_lookup() {
        let tree = json!({"apache": {"listen": {"port": 8080}}});
        assert_eq!(
            value_at_path(&tree, "apache/listen/port"),
            Some(&json!(8080))
        );
        assert_eq!(value_at_path(&tree, "apache/missing"), None);
        assert_eq!(value_at_path(&tree, "apache/listen/port/deeper"), None);
    }
}
