//! Recursive merging of metadata mappings.
//!
//! Values on the override side always win. Where both sides hold a mapping under
//! the same key the two mappings are merged recursively instead; sequences and
//! scalars are never merged, only replaced.

use serde_json::{Map, Value};
use tracing::trace;

/// Merges `override_` on top of `base`, returning a new value. Neither input is
/// modified.
///
/// If `override_` is not a mapping it replaces `base` entirely.
pub fn merge(base: &Value, override_: &Value) -> Value {
    let mut result = base.clone();
    merge_into(&mut result, override_);
    result
}

/// In-place form of [`merge`]: `target` becomes `merge(target, override_)`.
pub fn merge_into(target: &mut Value, override_: &Value) {
    let Value::Object(overrides) = override_ else {
        *target = override_.clone();
        return;
    };

    // A non-mapping base has no keys to keep
    if !target.is_object() {
        trace!("Replacing non-mapping base {} with a mapping", target);
        *target = Value::Object(Map::new());
    }

    if let Value::Object(fields) = target {
        merge_fields(fields, overrides);
    }
}

fn merge_fields(fields: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (key, value) in overrides {
        match fields.get_mut(key) {
            Some(existing) if existing.is_object() => merge_into(existing, value),
            _ => {
                fields.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod merge_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn inputs_are_untouched() {
        let a = json!({"core:sample_rate": 1e6, "nested": {"x": 1, "y": [1, 2]}});
        let b = json!({"nested": {"y": [3], "z": null}, "extra": "v"});
        let a_before = a.clone();
        let b_before = b.clone();

        let _ = merge(&a, &b);

        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn override_leaf_wins() {
        let a = json!({"k": 1, "keep": true});
        let b = json!({"k": "two"});
        assert_eq!(merge(&a, &b), json!({"k": "two", "keep": true}));
    }

    #[test]
    fn nested_mappings_merge_recursively() {
        let a = json!({"capture": {"freq": 915e6, "gain": {"rf": 10, "if": 20}}});
        let b = json!({"capture": {"gain": {"rf": 30}, "label": "burst"}});
        assert_eq!(
            merge(&a, &b),
            json!({"capture": {"freq": 915e6, "gain": {"rf": 30, "if": 20}, "label": "burst"}})
        );
    }

    #[test]
    fn sequences_are_replaced_not_merged() {
        let a = json!({"list": [1, 2, 3]});
        let b = json!({"list": [4]});
        assert_eq!(merge(&a, &b), json!({"list": [4]}));
    }

    #[test]
    fn mapping_replaces_scalar_and_scalar_replaces_mapping() {
        let a = json!({"m": 5, "s": {"deep": 1}});
        let b = json!({"m": {"now": "map"}, "s": 7});
        assert_eq!(merge(&a, &b), json!({"m": {"now": "map"}, "s": 7}));
    }

    #[test]
    fn non_mapping_override_replaces_base() {
        let a = json!({"a": 1});
        assert_eq!(merge(&a, &json!(42)), json!(42));
        assert_eq!(merge(&a, &json!([1, 2])), json!([1, 2]));
        assert_eq!(merge(&a, &Value::Null), Value::Null);
    }

    #[test]
    fn non_mapping_base_is_treated_as_empty() {
        assert_eq!(merge(&json!("text"), &json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn every_override_key_is_present() {
        let a = json!({"x": {"y": 1}, "z": 0});
        let b = json!({"x": {"w": 2}, "z": [9], "n": null});
        let merged = merge(&a, &b);
        assert_eq!(merged["z"], b["z"]);
        assert_eq!(merged["n"], b["n"]);
        assert_eq!(merged["x"], json!({"y": 1, "w": 2}));
    }

    #[test]
    fn merge_into_matches_merge() {
        let a = json!({"a": {"b": 1}, "c": 2});
        let b = json!({"a": {"d": 3}});
        let mut target = a.clone();
        merge_into(&mut target, &b);
        assert_eq!(target, merge(&a, &b));
    }
}
