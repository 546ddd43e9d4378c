use serde_json::{Value, json};

use crate::foundation::core::TokenMap;

/// Every key produced by [`flatten_theme`], in output order.
pub const THEME_TOKEN_KEYS: &[&str] = &[
    "background.primary",
    "background.secondary",
    "background.tertiary",
    "text.primary",
    "text.secondary",
    "text.muted",
    "accent.primary",
    "accent.secondary",
    "accent.success",
    "accent.warning",
    "accent.error",
    "gradientStart",
    "gradientEnd",
    "progress.fill",
    "progress.track",
    "border.color",
    "overlay.color",
    "glow.color",
    "font.family",
    "font.size.title",
    "font.size.subtitle",
    "font.size.body",
    "font.size.caption",
    "font.weight.regular",
    "font.weight.bold",
    "spacing.xs",
    "spacing.sm",
    "spacing.md",
    "spacing.lg",
    "spacing.xl",
    "radius.sm",
    "radius.md",
    "radius.lg",
    "radius.full",
    "effects.glow",
    "effects.glowIntensity",
    "effects.glowRadius",
    "effects.shadow",
    "effects.blur",
];

#[derive(Clone, Copy)]
enum Kind {
    Color,
    Number,
    Flag,
    Text,
}

/// Flatten a nested theme document into a token table.
///
/// Every key in [`THEME_TOKEN_KEYS`] is always present. Missing or mistyped values take a hard
/// default, except for the derived colors which fall back to a sibling token first:
///
/// | token              | falls back to          |
/// |--------------------|------------------------|
/// | `accent.secondary` | `accent.primary`       |
/// | `text.muted`       | `text.secondary`       |
/// | `gradientStart`    | `accent.primary`       |
/// | `gradientEnd`      | `accent.secondary`     |
/// | `progress.fill`    | `accent.primary`       |
/// | `progress.track`   | `background.tertiary`  |
/// | `border.color`     | `background.tertiary`  |
/// | `glow.color`       | `accent.primary`       |
pub fn flatten_theme(doc: &Value) -> TokenMap {
    let mut out = TokenMap::new();
    let mut put = |key: &str, path: &str, kind: Kind, default: Value| {
        let v = pick(doc, path, kind).unwrap_or(default);
        out.insert(key.to_owned(), v);
    };

    put("background.primary", "colors.background.primary", Kind::Color, json!("#1e1f22"));
    put("background.secondary", "colors.background.secondary", Kind::Color, json!("#2b2d31"));
    put("background.tertiary", "colors.background.tertiary", Kind::Color, json!("#313338"));
    put("text.primary", "colors.text.primary", Kind::Color, json!("#ffffff"));
    put("text.secondary", "colors.text.secondary", Kind::Color, json!("#b5bac1"));
    put("accent.primary", "colors.accent.primary", Kind::Color, json!("#5865f2"));
    put("accent.success", "colors.accent.success", Kind::Color, json!("#23a55a"));
    put("accent.warning", "colors.accent.warning", Kind::Color, json!("#f0b232"));
    put("accent.error", "colors.accent.error", Kind::Color, json!("#f23f43"));
    put("overlay.color", "colors.overlay", Kind::Color, json!("#00000066"));

    put("font.family", "fonts.family", Kind::Text, json!("sans-serif"));
    put("font.size.title", "fonts.sizes.title", Kind::Number, json!(32));
    put("font.size.subtitle", "fonts.sizes.subtitle", Kind::Number, json!(22));
    put("font.size.body", "fonts.sizes.body", Kind::Number, json!(16));
    put("font.size.caption", "fonts.sizes.caption", Kind::Number, json!(12));
    put("font.weight.regular", "fonts.weights.regular", Kind::Number, json!(400));
    put("font.weight.bold", "fonts.weights.bold", Kind::Number, json!(700));

    put("spacing.xs", "spacing.xs", Kind::Number, json!(4));
    put("spacing.sm", "spacing.sm", Kind::Number, json!(8));
    put("spacing.md", "spacing.md", Kind::Number, json!(16));
    put("spacing.lg", "spacing.lg", Kind::Number, json!(24));
    put("spacing.xl", "spacing.xl", Kind::Number, json!(32));

    put("radius.sm", "radii.sm", Kind::Number, json!(4));
    put("radius.md", "radii.md", Kind::Number, json!(8));
    put("radius.lg", "radii.lg", Kind::Number, json!(16));
    put("radius.full", "radii.full", Kind::Number, json!(9999));

    put("effects.glow", "effects.glow", Kind::Flag, json!(false));
    put("effects.glowIntensity", "effects.glowIntensity", Kind::Number, json!(0.6));
    put("effects.glowRadius", "effects.glowRadius", Kind::Number, json!(12));
    put("effects.shadow", "effects.shadow", Kind::Flag, json!(true));
    put("effects.blur", "effects.blur", Kind::Number, json!(0));

    // Derived colors, in dependency order.
    let derived: [(&str, &str, &str); 8] = [
        ("accent.secondary", "colors.accent.secondary", "accent.primary"),
        ("text.muted", "colors.text.muted", "text.secondary"),
        ("gradientStart", "colors.gradient.start", "accent.primary"),
        ("gradientEnd", "colors.gradient.end", "accent.secondary"),
        ("progress.fill", "colors.progress.fill", "accent.primary"),
        ("progress.track", "colors.progress.track", "background.tertiary"),
        ("border.color", "colors.border", "background.tertiary"),
        ("glow.color", "effects.glowColor", "accent.primary"),
    ];
    for (key, path, sibling) in derived {
        let v = pick(doc, path, Kind::Color)
            .or_else(|| out.get(sibling).cloned())
            .unwrap_or(Value::Null);
        out.insert(key.to_owned(), v);
    }

    out
}

fn pick(doc: &Value, path: &str, kind: Kind) -> Option<Value> {
    let mut cur = doc;
    for seg in path.split('.') {
        cur = cur.as_object()?.get(seg)?;
    }
    let ok = match kind {
        Kind::Color | Kind::Text => cur.as_str().is_some_and(|s| !s.trim().is_empty()),
        Kind::Number => cur.as_f64().is_some_and(f64::is_finite),
        Kind::Flag => cur.is_boolean(),
    };
    ok.then(|| cur.clone())
}

#[cfg(test)]
#[path = "../../tests/unit/theme/flatten.rs"]
mod tests;
