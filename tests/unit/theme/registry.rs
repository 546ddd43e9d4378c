use serde_json::json;

use super::*;
use crate::theme::THEME_TOKEN_KEYS;

#[test]
fn unknown_names_fall_back_to_default() {
    let reg = ThemeRegistry::new();
    let got = reg.get("does-not-exist");
    assert_eq!(got["name"], "default");
}

#[test]
fn unknown_names_ignore_a_reregistered_default() {
    let mut reg = ThemeRegistry::new();
    reg.register("default", json!({ "name": "custom", "colors": { "accent": { "primary": "#123456" } } }), None)
        .unwrap();
    assert_eq!(reg.get("default")["name"], "custom");
    assert_eq!(reg.get("does-not-exist")["name"], "default");
    assert_eq!(reg.flatten("does-not-exist")["accent.primary"], "#5865f2");
}

#[test]
fn register_with_base_deep_merges_once() {
    let mut reg = ThemeRegistry::new();
    reg.register("base", json!({ "colors": { "accent": { "primary": "#111111" } } }), None)
        .unwrap();
    reg.register(
        "child",
        json!({ "colors": { "text": { "primary": "#222222" } } }),
        Some("base"),
    )
    .unwrap();

    let child = reg.get("child");
    assert_eq!(child["colors"]["accent"]["primary"], "#111111");
    assert_eq!(child["colors"]["text"]["primary"], "#222222");

    // Later changes to the base do not propagate.
    reg.register("base", json!({ "colors": { "accent": { "primary": "#999999" } } }), None)
        .unwrap();
    assert_eq!(reg.get("child")["colors"]["accent"]["primary"], "#111111");
}

#[test]
fn unknown_base_stores_as_is() {
    let mut reg = ThemeRegistry::new();
    let stored = reg
        .register("solo", json!({ "colors": {} }), Some("missing"))
        .unwrap();
    assert_eq!(*stored, json!({ "colors": {} }));
}

#[test]
fn self_inheritance_is_rejected() {
    let mut reg = ThemeRegistry::new();
    let err = reg
        .register("loop", json!({}), Some("loop"))
        .unwrap_err();
    assert_eq!(err.code(), "SELF_INHERITANCE");
    assert!(!reg.contains("loop"));
}

#[test]
fn non_object_documents_are_rejected() {
    let mut reg = ThemeRegistry::new();
    assert!(reg.register("bad", json!([1, 2]), None).is_err());
}

#[test]
fn extend_returns_produced_document() {
    let mut reg = ThemeRegistry::new();
    let doc = reg
        .extend("discord", "sunset", json!({ "colors": { "accent": { "primary": "#ff7e5f" } } }))
        .unwrap();
    assert_eq!(doc["colors"]["accent"]["primary"], "#ff7e5f");
    assert_eq!(doc["colors"]["accent"]["secondary"], "#eb459e");
    assert!(reg.contains("sunset"));
}

#[test]
fn sunset_differs_from_discord_only_in_accent_derived_keys() {
    let mut reg = ThemeRegistry::new();
    reg.register(
        "sunset",
        json!({ "colors": { "accent": { "primary": "#ff7e5f" } } }),
        Some("discord"),
    )
    .unwrap();

    let sunset = reg.flatten("sunset");
    let discord = reg.flatten("discord");
    let allowed = ["accent.primary", "gradientStart", "progress.fill", "glow.color"];
    for key in THEME_TOKEN_KEYS {
        if sunset[*key] != discord[*key] {
            assert!(allowed.contains(key), "unexpected difference in {key}");
        }
    }
    assert_eq!(sunset["accent.primary"], "#ff7e5f");
    assert_ne!(sunset["accent.primary"], discord["accent.primary"]);
}

#[test]
fn merge_is_deterministic_against_manual_snapshot() {
    let mut reg = ThemeRegistry::new();
    let overrides = json!({ "colors": { "accent": { "primary": "#123456" } }, "radii": { "md": 3 } });
    let snapshot = reg.get("discord");
    reg.register("derived", overrides.clone(), Some("discord")).unwrap();

    let manual = crate::theme::flatten_theme(&crate::theme::deep_merge(&snapshot, &overrides));
    assert_eq!(reg.flatten("derived"), manual);
}

#[test]
fn set_active_requires_known_theme() {
    let mut reg = ThemeRegistry::new();
    assert_eq!(reg.active(), "default");
    reg.set_active("discord").unwrap();
    assert_eq!(reg.active(), "discord");
    assert!(reg.set_active("nope").is_err());
    assert_eq!(reg.active(), "discord");
}
