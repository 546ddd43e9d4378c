use serde_json::Value;

/// Recursively merge `overlay` onto a copy of `base`.
///
/// Objects merge key-wise; every other value (arrays included) in `overlay` replaces the base value
/// wholesale.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    let mut out = base.clone();
    merge_into(&mut out, overlay);
    out
}

/// In-place form of [`deep_merge`].
pub fn merge_into(target: &mut Value, overlay: &Value) {
    match (target, overlay) {
        (Value::Object(dst), Value::Object(src)) => {
            for (k, v) in src {
                let both_objects = v.is_object() && dst.get(k).is_some_and(Value::is_object);
                if both_objects && let Some(existing) = dst.get_mut(k) {
                    merge_into(existing, v);
                } else {
                    dst.insert(k.clone(), v.clone());
                }
            }
        }
        (dst, src) => *dst = src.clone(),
    }
}

/// Merge fragments left to right, later fragments winning. An empty input yields `{}`.
pub fn merge_all<'a>(fragments: impl IntoIterator<Item = &'a Value>) -> Value {
    let mut out = Value::Object(serde_json::Map::new());
    for f in fragments {
        merge_into(&mut out, f);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/theme/merge.rs"]
mod tests;
