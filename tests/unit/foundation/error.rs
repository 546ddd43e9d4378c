use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CardError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        CardError::asset("a.png", "x")
            .to_string()
            .contains("asset error:")
    );
    assert!(
        CardError::render("ENCODE_FAILED", "x")
            .to_string()
            .contains("render error [ENCODE_FAILED]:")
    );
    assert!(
        CardError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn unknown_component_names_type_and_hint() {
    let msg = CardError::unknown_component("sparkle").to_string();
    assert!(msg.contains("'sparkle'"));
    assert!(msg.contains("ComponentRegistry::register"));
}

#[test]
fn with_context_only_touches_wrapper_variants() {
    let err = CardError::plugin("HOOK_FAILED", "boom")
        .with_context(serde_json::json!({ "hook": "before_render" }));
    let CardError::Plugin { context, .. } = &err else {
        panic!("expected plugin error");
    };
    assert_eq!(context["hook"], "before_render");
    assert_eq!(err.code(), "HOOK_FAILED");

    let v = CardError::validation("x").with_context(serde_json::json!({ "a": 1 }));
    assert_eq!(v.code(), "VALIDATION");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CardError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
