use serde_json::json;

use super::*;

#[test]
fn nested_objects_merge_key_wise() {
    let base = json!({ "colors": { "accent": { "primary": "#111", "secondary": "#222" } } });
    let over = json!({ "colors": { "accent": { "primary": "#999" } } });
    let out = deep_merge(&base, &over);
    assert_eq!(out["colors"]["accent"]["primary"], "#999");
    assert_eq!(out["colors"]["accent"]["secondary"], "#222");
}

#[test]
fn arrays_and_scalars_replace_wholesale() {
    let base = json!({ "stops": [1, 2, 3], "radius": 4, "obj": { "a": 1 } });
    let over = json!({ "stops": [9], "radius": { "md": 8 }, "obj": 5 });
    let out = deep_merge(&base, &over);
    assert_eq!(out["stops"], json!([9]));
    assert_eq!(out["radius"], json!({ "md": 8 }));
    assert_eq!(out["obj"], json!(5));
}

#[test]
fn base_is_not_mutated() {
    let base = json!({ "a": { "b": 1 } });
    let _ = deep_merge(&base, &json!({ "a": { "b": 2 } }));
    assert_eq!(base, json!({ "a": { "b": 1 } }));
}

#[test]
fn merge_all_applies_in_order() {
    let a = json!({ "x": 1, "y": { "z": 1 } });
    let b = json!({ "y": { "w": 2 } });
    let c = json!({ "x": 3 });
    let out = merge_all([&a, &b, &c]);
    assert_eq!(out, json!({ "x": 3, "y": { "z": 1, "w": 2 } }));
    assert_eq!(merge_all(std::iter::empty()), json!({}));
}
