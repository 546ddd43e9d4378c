use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use super::*;

fn ctx(pairs: &[(&str, Value)]) -> TokenMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

#[test]
fn computed_shadows_static_in_get() {
    let mut store = TokenStore::new();
    store.define("accent.primary", json!("#111111"));
    store.define_computed("accent.primary", |_, _| json!("#222222"));

    let got = store.get("accent.primary", &TokenMap::new(), None);
    assert_eq!(got, Some(json!("#222222")));
}

#[test]
fn define_replaces_computed() {
    let mut store = TokenStore::new();
    store.define_computed("x", |_, _| json!(1));
    store.define("x", json!(2));
    assert_eq!(store.get("x", &TokenMap::new(), None), Some(json!(2)));
    assert_eq!(store.len(), 1);
}

#[test]
fn get_falls_back_when_missing() {
    let store = TokenStore::new();
    assert_eq!(
        store.get("nope", &TokenMap::new(), Some(json!("fb"))),
        Some(json!("fb"))
    );
    assert_eq!(store.get("nope", &TokenMap::new(), None), None);
}

#[test]
fn resolve_precedence_is_static_then_context_then_computed() {
    let mut store = TokenStore::new();
    store.define("a", json!("static"));
    store.define("b", json!("static"));
    store.define("c", json!("static"));
    store.define_computed("c", |_, _| json!("computed"));

    let out = store.resolve(&ctx(&[
        ("b", json!("context")),
        ("c", json!("context")),
        ("extra", json!(true)),
    ]));

    assert_eq!(out["a"], json!("static"));
    assert_eq!(out["b"], json!("context"));
    assert_eq!(out["c"], json!("computed"));
    // Context keys are not filtered against any schema.
    assert_eq!(out["extra"], json!(true));
}

#[test]
fn computed_reads_context_and_other_tokens() {
    let mut store = TokenStore::new();
    store.define("progress.max", json!(200));
    store.define_computed("progress.ratio", |cx, s| {
        let xp = cx.get("xp").and_then(Value::as_f64).unwrap_or(0.0);
        let max = s
            .get("progress.max", cx, None)
            .and_then(|v| v.as_f64())
            .unwrap_or(1.0);
        json!(xp / max)
    });

    let out = store.resolve(&ctx(&[("xp", json!(50))]));
    assert_eq!(out["progress.ratio"], json!(0.25));
}

#[test]
fn computed_is_not_cached_across_calls() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    let mut store = TokenStore::new();
    store.define_computed("n", |_, _| json!(CALLS.fetch_add(1, Ordering::SeqCst)));

    let empty = TokenMap::new();
    let first = store.get("n", &empty, None);
    let second = store.get("n", &empty, None);
    assert_ne!(first, second);
}

#[test]
fn clone_is_independent_for_definitions() {
    let mut store = TokenStore::new();
    store.define("a", json!(1));
    let mut copy = store.clone();
    copy.define("a", json!(2));
    copy.define_computed("b", |_, _| json!(3));

    assert_eq!(store.get("a", &TokenMap::new(), None), Some(json!(1)));
    assert!(!store.contains("b"));
    assert!(copy.contains("b"));
}
