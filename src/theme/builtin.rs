use serde_json::{Value, json};

/// Name of the theme substituted for unknown names.
pub const DEFAULT_THEME: &str = "default";

/// Built-in theme documents, registered by [`ThemeRegistry::new`](super::ThemeRegistry::new).
pub(crate) fn builtin_themes() -> Vec<(&'static str, Value)> {
    vec![
        (DEFAULT_THEME, default_theme()),
        ("discord", discord_theme()),
        ("light", light_theme()),
    ]
}

pub(crate) fn default_theme() -> Value {
    json!({
        "name": "default",
        "colors": {
            "background": { "primary": "#1e1f22", "secondary": "#2b2d31", "tertiary": "#313338" },
            "text": { "primary": "#ffffff", "secondary": "#b5bac1" },
            "accent": {
                "primary": "#5865f2",
                "success": "#23a55a",
                "warning": "#f0b232",
                "error": "#f23f43"
            },
            "overlay": "#00000066"
        },
        "fonts": {
            "family": "sans-serif",
            "sizes": { "title": 32, "subtitle": 22, "body": 16, "caption": 12 },
            "weights": { "regular": 400, "bold": 700 }
        },
        "spacing": { "xs": 4, "sm": 8, "md": 16, "lg": 24, "xl": 32 },
        "radii": { "sm": 4, "md": 8, "lg": 16, "full": 9999 },
        "effects": { "glow": false, "shadow": true }
    })
}

fn discord_theme() -> Value {
    json!({
        "name": "discord",
        "colors": {
            "background": { "primary": "#23272a", "secondary": "#2c2f33", "tertiary": "#40444b" },
            "text": { "primary": "#ffffff", "secondary": "#99aab5", "muted": "#72767d" },
            "accent": {
                "primary": "#5865f2",
                "secondary": "#eb459e",
                "success": "#57f287",
                "warning": "#fee75c",
                "error": "#ed4245"
            }
        },
        "fonts": { "family": "sans-serif", "sizes": { "title": 30, "body": 16 } },
        "radii": { "md": 10, "lg": 20 },
        "effects": { "glow": true, "glowIntensity": 0.5 }
    })
}

fn light_theme() -> Value {
    json!({
        "name": "light",
        "colors": {
            "background": { "primary": "#ffffff", "secondary": "#f2f3f5", "tertiary": "#e3e5e8" },
            "text": { "primary": "#060607", "secondary": "#4e5058" },
            "accent": { "primary": "#4752c4" },
            "overlay": "#ffffff55"
        },
        "effects": { "shadow": false }
    })
}
