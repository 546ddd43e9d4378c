use super::*;
use serde_json::json;

#[test]
fn parses_hex_forms() {
    assert_eq!(Rgba8::parse_str("#ff0000").unwrap(), Rgba8::rgba(255, 0, 0, 255));
    assert_eq!(Rgba8::parse_str("#0000ff80").unwrap(), Rgba8::rgba(0, 0, 255, 128));
    assert_eq!(Rgba8::parse_str("#fff").unwrap(), Rgba8::WHITE);
    assert_eq!(Rgba8::parse_str("#0008").unwrap(), Rgba8::rgba(0, 0, 0, 136));
    assert!(Rgba8::parse_str("#12345").is_err());
}

#[test]
fn parses_functional_and_json_forms() {
    assert_eq!(
        Rgba8::parse_str("rgba(10, 20, 30, 0.5)").unwrap(),
        Rgba8::rgba(10, 20, 30, 128)
    );
    assert_eq!(Rgba8::parse_str("RGB(1,2,3)").unwrap(), Rgba8::rgba(1, 2, 3, 255));
    assert_eq!(Rgba8::parse(&json!([1, 2, 3])), Some(Rgba8::rgba(1, 2, 3, 255)));
    assert_eq!(
        Rgba8::parse(&json!({"r": 255, "g": 0, "b": 0, "a": 0.0})),
        Some(Rgba8::rgba(255, 0, 0, 0))
    );
    assert_eq!(Rgba8::parse(&json!(12)), None);
}

#[test]
fn resolve_color_follows_token_references() {
    let mut tokens = TokenMap::new();
    tokens.insert("accent.primary".to_owned(), json!("#5865f2"));
    tokens.insert("progress.fill".to_owned(), json!("accent.primary"));

    assert_eq!(
        resolve_color(Some(&json!("accent.primary")), &tokens),
        Some(Rgba8::rgba(0x58, 0x65, 0xf2, 255))
    );
    assert_eq!(
        resolve_color(Some(&json!("progress.fill")), &tokens),
        Some(Rgba8::rgba(0x58, 0x65, 0xf2, 255))
    );
    assert_eq!(
        resolve_color(Some(&json!("#000")), &tokens),
        Some(Rgba8::BLACK)
    );
    assert_eq!(resolve_color(None, &tokens), None);
}

#[test]
fn premul_and_hex_round_out() {
    assert_eq!(Rgba8::rgba(255, 255, 255, 128).to_premul(), [128, 128, 128, 128]);
    assert_eq!(Rgba8::rgba(1, 2, 3, 255).to_hex(), "#010203");
    assert_eq!(Rgba8::WHITE.with_opacity(0.5).a, 128);
}
