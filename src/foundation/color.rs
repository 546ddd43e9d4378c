use serde_json::Value;

use crate::foundation::core::TokenMap;

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);

    /// Construct from channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Multiply alpha by `f` (clamped to `0..=1`).
    pub fn with_opacity(self, f: f32) -> Self {
        let f = if f.is_finite() { f.clamp(0.0, 1.0) } else { 1.0 };
        Self {
            a: ((self.a as f32) * f).round() as u8,
            ..self
        }
    }

    /// Solid paint for `vello_cpu`.
    pub fn to_paint(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    /// Premultiplied `[r, g, b, a]`.
    pub fn to_premul(self) -> [u8; 4] {
        let a = u16::from(self.a);
        let premul = |c: u8| -> u8 { (((u16::from(c) * a) + 127) / 255) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }

    /// Parse a CSS-like color string.
    ///
    /// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)` (alpha
    /// in `0..=1`) and `transparent`.
    pub fn parse_str(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") {
            return Ok(Self::TRANSPARENT);
        }
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(body) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts = body
                .split(',')
                .map(|p| p.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| format!("invalid rgb() component in \"{s}\""))?;
            return from_components(&parts).ok_or_else(|| format!("invalid rgb() color \"{s}\""));
        }
        Err(format!("unrecognized color \"{s}\""))
    }

    /// Parse a JSON color: a string (see [`Rgba8::parse_str`]), `[r, g, b]` / `[r, g, b, a]`, or
    /// `{ "r", "g", "b", "a"? }`. Channels are `0..=255`, alpha is `0..=1`.
    pub fn parse(v: &Value) -> Option<Self> {
        match v {
            Value::String(s) => Self::parse_str(s).ok(),
            Value::Array(items) => {
                let parts = items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>()?;
                from_components(&parts)
            }
            Value::Object(m) => {
                let r = m.get("r")?.as_f64()?;
                let g = m.get("g")?.as_f64()?;
                let b = m.get("b")?.as_f64()?;
                let a = m.get("a").and_then(Value::as_f64).unwrap_or(1.0);
                from_components(&[r, g, b, a])
            }
            _ => None,
        }
    }

    /// Lowercase `#rrggbb` / `#rrggbbaa` form.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Resolve a style value to a color.
///
/// A string naming a token (`"accent.primary"`) is looked up in `tokens` first; anything else is
/// parsed as a literal color. Token values may themselves name one more token.
pub fn resolve_color(v: Option<&Value>, tokens: &TokenMap) -> Option<Rgba8> {
    let v = v?;
    if let Value::String(name) = v
        && let Some(target) = tokens.get(name.as_str())
    {
        if let Value::String(inner) = target
            && let Some(next) = tokens.get(inner.as_str())
        {
            return Rgba8::parse(next);
        }
        return Rgba8::parse(target);
    }
    Rgba8::parse(v)
}

fn from_components(parts: &[f64]) -> Option<Rgba8> {
    fn channel(x: f64) -> u8 {
        x.clamp(0.0, 255.0).round() as u8
    }

    match parts {
        [r, g, b] => Some(Rgba8::rgba(channel(*r), channel(*g), channel(*b), 255)),
        [r, g, b, a] => Some(Rgba8::rgba(
            channel(*r),
            channel(*g),
            channel(*b),
            (a.clamp(0.0, 1.0) * 255.0).round() as u8,
        )),
        _ => None,
    }
}

fn parse_hex(s: &str) -> Result<Rgba8, String> {
    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }
    fn hex_nibble(c: &str) -> Result<u8, String> {
        let v = u8::from_str_radix(c, 16).map_err(|_| format!("invalid hex digit \"{c}\""))?;
        Ok(v * 17)
    }

    if !s.is_ascii() {
        return Err("hex color must be ASCII".to_owned());
    }
    match s.len() {
        3 | 4 => {
            let r = hex_nibble(&s[0..1])?;
            let g = hex_nibble(&s[1..2])?;
            let b = hex_nibble(&s[2..3])?;
            let a = if s.len() == 4 {
                hex_nibble(&s[3..4])?
            } else {
                255
            };
            Ok(Rgba8::rgba(r, g, b, a))
        }
        6 | 8 => {
            let r = hex_byte(&s[0..2])?;
            let g = hex_byte(&s[2..4])?;
            let b = hex_byte(&s[4..6])?;
            let a = if s.len() == 8 {
                hex_byte(&s[6..8])?
            } else {
                255
            };
            Ok(Rgba8::rgba(r, g, b, a))
        }
        _ => Err("hex color must be #RGB, #RGBA, #RRGGBB or #RRGGBBAA".to_owned()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
