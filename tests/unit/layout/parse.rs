use serde_json::json;

use super::*;

#[test]
fn normalizes_to_canonical_shape() {
    let doc = parse(r#"{ "type": "text" }"#).unwrap();
    assert_eq!(doc.root.kind, "text");
    assert!(doc.root.props.is_empty());
    assert!(doc.root.style.is_empty());
    assert!(doc.root.children.is_empty());
    assert_eq!(doc.root.bounds, None);
    assert!(doc.tokens.is_empty() && doc.effects.is_empty());
}

#[test]
fn promotes_legacy_keys_without_overriding_props() {
    let doc = parse(json!({
        "type": "image",
        "x": 10, "width": 50, "src": "a.png", "text": "hi",
        "props": { "width": 99 }
    }))
    .unwrap();
    let p = &doc.root.props;
    assert_eq!(p["x"], 10);
    assert_eq!(p["width"], 99);
    assert_eq!(p["src"], "a.png");
    assert_eq!(p["text"], "hi");
}

#[test]
fn props_style_is_merged_over_style() {
    let doc = parse(json!({
        "type": "rect",
        "style": { "fill": "#000000", "radius": 4, "shadow": { "x": 1, "y": 2 } },
        "props": { "style": { "fill": "#ffffff", "shadow": { "y": 9 } } }
    }))
    .unwrap();
    let s = &doc.root.style;
    assert_eq!(s["fill"], "#ffffff");
    assert_eq!(s["radius"], 4);
    assert_eq!(s["shadow"], json!({ "x": 1, "y": 9 }));
    assert!(!doc.root.props.contains_key("style"));
}

#[test]
fn untyped_node_with_props_becomes_container() {
    let doc = parse(json!({ "props": { "padding": 8 } })).unwrap();
    assert_eq!(doc.root.kind, "container");
}

#[test]
fn present_type_must_be_a_non_empty_string() {
    for bad in [json!(5), json!(""), json!("   "), json!(null), json!({})] {
        let layout = json!({
            "type": "container",
            "children": [{ "type": bad, "props": { "width": 10 } }]
        });
        let err = parse(layout.clone()).unwrap_err();
        assert!(matches!(err, CardError::Validation(_)), "{err}");
        assert!(err.to_string().contains("root.children[0]"), "{err}");
        assert!(!validate(&layout), "{layout}");
    }
}

#[test]
fn rejects_malformed_nodes() {
    assert!(parse("[1, 2]").is_err());
    assert!(parse("{ not json").is_err());
    assert!(parse(json!({ "children": [] })).is_err());
    assert!(parse(json!({ "type": "x", "props": 3 })).is_err());
    assert!(parse(json!({ "type": "x", "children": {} })).is_err());

    let err = parse(json!({ "type": "x", "children": [{ "type": "y" }, 7] })).unwrap_err();
    assert!(err.to_string().contains("root.children[1]"), "{err}");
}

#[test]
fn reads_tokens_and_effects_in_both_forms() {
    let plain = parse(json!({
        "type": "container",
        "tokens": { "accent.primary": "#ff0000" },
        "effects": ["vignette"]
    }))
    .unwrap();
    let wrapped = parse(json!({
        "root": { "type": "container" },
        "tokens": { "accent.primary": "#ff0000" },
        "effects": ["vignette"]
    }))
    .unwrap();
    assert_eq!(plain, wrapped);
    assert!(parse(json!({ "type": "c", "tokens": [] })).is_err());
    assert!(parse(json!({ "type": "c", "effects": {} })).is_err());
}

#[test]
fn round_trips_through_wrapped_form() {
    let doc = parse(json!({
        "type": "card",
        "props": { "padding": [8, 12] },
        "tokens": { "x": 1 },
        "children": [
            { "type": "text", "text": "{{ username }}", "style": { "color": "text.primary" } },
            { "type": "row", "props": { "gap": 4 }, "children": [{ "type": "avatar", "props": { "src": "a.png" } }] }
        ]
    }))
    .unwrap();
    let again = parse(doc.to_value().unwrap()).unwrap();
    assert_eq!(doc, again);
}

#[test]
fn extracts_assets_deduplicated_in_preorder() {
    let doc = parse(json!({
        "type": "container",
        "props": { "image": "bg.png" },
        "children": [
            { "type": "avatar", "props": { "avatar": "me.png", "src": "bg.png" } },
            { "type": "image", "src": "" },
            { "type": "image", "props": { "src": "icon.svg" } }
        ]
    }))
    .unwrap();
    assert_eq!(extract_assets(&doc.root), vec!["bg.png", "me.png", "icon.svg"]);
}

#[test]
fn validate_is_structural_and_never_fails() {
    assert!(validate(&json!({ "type": "x" })));
    assert!(validate(&json!({ "props": {} })));
    assert!(validate(&json!({ "root": { "type": "x", "children": [{ "type": "y" }] } })));
    assert!(!validate(&json!({ "type": 3 })));
    assert!(!validate(&json!({ "type": 3, "props": {} })));
    assert!(!validate(&json!({ "type": " ", "props": {} })));
    assert!(!validate(&json!({ "type": "x", "children": [{}] })));
    assert!(!validate(&json!({ "type": "x", "children": "nope" })));
    assert!(!validate(&json!("text")));
}
