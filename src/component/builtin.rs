use serde_json::{Map, Value};

use crate::component::contract::{Component, DrawCx};
use crate::component::registry::ComponentRegistry;
use crate::foundation::color::Rgba8;
use crate::foundation::core::Bounds;
use crate::foundation::error::CardResult;
use crate::render::surface::{ClipShape, ImageFit};
use crate::render::text::{TextAlign, draw_text_block};

/// Register container/row/column/stack/card, rect, text, image, avatar and progress.
pub(crate) fn register_builtins(r: &mut ComponentRegistry) {
    for kind in ["container", "row", "column", "stack"] {
        r.register(kind, |_: &Map<String, Value>| {
            Ok(Box::new(Panel { card: false }) as Box<dyn Component>)
        });
    }
    r.register("card", |_: &Map<String, Value>| {
        Ok(Box::new(Panel { card: true }) as Box<dyn Component>)
    });
    r.register("rect", |_: &Map<String, Value>| Ok(Box::new(RectShape) as Box<dyn Component>));
    r.register("text", |_: &Map<String, Value>| Ok(Box::new(Text) as Box<dyn Component>));
    r.register("image", |_: &Map<String, Value>| {
        Ok(Box::new(Picture { avatar: false }) as Box<dyn Component>)
    });
    r.register("avatar", |_: &Map<String, Value>| {
        Ok(Box::new(Picture { avatar: true }) as Box<dyn Component>)
    });
    r.register("progress", |_: &Map<String, Value>| {
        Ok(Box::new(Progress) as Box<dyn Component>)
    });
}

fn radius(cx: &DrawCx<'_>, default_token: Option<&str>) -> f64 {
    cx.number("radius")
        .or_else(|| cx.number("borderRadius"))
        .or_else(|| default_token.and_then(|t| cx.deref_number(&Value::String(t.to_owned()))))
        .unwrap_or(0.0)
        .max(0.0)
}

fn opacity(cx: &DrawCx<'_>) -> f32 {
    cx.number("opacity").unwrap_or(1.0).clamp(0.0, 1.0) as f32
}

fn paint_box(cx: &mut DrawCx<'_>, fill: Option<Rgba8>, r: f64) {
    let b = cx.bounds;
    let alpha = opacity(cx);
    if cx.flag("gradient").unwrap_or(false) {
        let from = cx.color_or_token(&["gradientStart"], "gradientStart");
        let to = cx.color_or_token(&["gradientEnd"], "gradientEnd");
        if let (Some(from), Some(to)) = (from, to) {
            cx.surface
                .fill_gradient(b, r, from.with_opacity(alpha), to.with_opacity(alpha));
        }
    } else if let Some(c) = fill {
        cx.surface.fill_rounded(b, r, c.with_opacity(alpha));
    }

    let border_w = cx.number("borderWidth").unwrap_or(0.0);
    if border_w > 0.0
        && let Some(c) = cx.color_or_token(&["borderColor"], "border.color")
    {
        cx.surface.stroke_rounded(b, r, border_w, c.with_opacity(alpha));
    }
}

/// Layout containers. Paint an optional background and border; `card` defaults both from tokens.
struct Panel {
    card: bool,
}

impl Component for Panel {
    fn draw(&mut self, cx: &mut DrawCx<'_>) -> CardResult<()> {
        let fill = if self.card {
            cx.color_or_token(&["background", "color"], "background.secondary")
        } else {
            cx.color("background")
        };
        let r = radius(cx, self.card.then_some("radius.lg"));
        paint_box(cx, fill, r);
        Ok(())
    }
}

struct RectShape;

impl Component for RectShape {
    fn draw(&mut self, cx: &mut DrawCx<'_>) -> CardResult<()> {
        let fill = cx.color_or_token(&["fill", "color", "background"], "accent.primary");
        let r = radius(cx, None);
        paint_box(cx, fill, r);
        Ok(())
    }
}

struct Text;

impl Text {
    fn font_size(cx: &DrawCx<'_>) -> f64 {
        cx.number("fontSize")
            .or_else(|| cx.number("size"))
            .or_else(|| cx.tokens.get("font.size.body").and_then(Value::as_f64))
            .unwrap_or(16.0)
    }

    fn font_weight(cx: &DrawCx<'_>) -> u16 {
        let w = match cx.value("fontWeight") {
            Some(Value::String(s)) if s == "bold" => cx.deref_number(&Value::from("font.weight.bold")),
            Some(Value::String(s)) if s == "regular" || s == "normal" => {
                cx.deref_number(&Value::from("font.weight.regular"))
            }
            Some(v) => cx.deref_number(v),
            None => cx.deref_number(&Value::from("font.weight.regular")),
        };
        w.unwrap_or(400.0).clamp(1.0, 1000.0) as u16
    }
}

impl Component for Text {
    fn draw(&mut self, cx: &mut DrawCx<'_>) -> CardResult<()> {
        let Some(template) = cx.text("text") else {
            return Ok(());
        };
        let content = cx.interpolate(template);
        if content.trim().is_empty() {
            return Ok(());
        }

        let size = Self::font_size(cx);
        let weight = Self::font_weight(cx);
        let family = cx
            .text("fontFamily")
            .map(|f| cx.tokens.get(f).and_then(Value::as_str).unwrap_or(f))
            .or_else(|| cx.tokens.get("font.family").and_then(Value::as_str))
            .unwrap_or("sans-serif")
            .to_owned();
        let color = cx
            .color_or_token(&["color"], "text.primary")
            .unwrap_or(Rgba8::WHITE)
            .with_opacity(opacity(cx));
        let align = TextAlign::parse(cx.text("align").or_else(|| cx.text("textAlign")));
        let b = cx.bounds;

        let face = cx.fonts.resolve(&family, weight)?;
        let max_w = (b.width > 0.0).then_some(b.width as f32);
        let block = cx
            .surface
            .text_engine()
            .layout(&face, &content, size as f32, color, max_w, align)?;
        let h = f64::from(block.height());
        let y = match cx.text("valign").or_else(|| cx.text("verticalAlign")) {
            Some("middle" | "center") => b.y + (b.height - h) * 0.5,
            Some("bottom") => b.bottom() - h,
            _ => b.y,
        };
        let origin = cx.surface.transform_at(b.x, y);
        draw_text_block(cx.surface.ctx(), &block, origin);
        let base = cx.surface.transform_at(0.0, 0.0);
        cx.surface.ctx().set_transform(base);
        Ok(())
    }
}

/// `image` (rectangular, fitted) and `avatar` (circular). A missing image draws a placeholder.
struct Picture {
    avatar: bool,
}

impl Component for Picture {
    fn draw(&mut self, cx: &mut DrawCx<'_>) -> CardResult<()> {
        let b = cx.bounds;
        let source = ["src", "avatar", "image"]
            .iter()
            .find_map(|k| cx.node.prop_str(k))
            .filter(|s| !s.trim().is_empty());
        let clip = if self.avatar {
            ClipShape::Circle
        } else {
            match radius(cx, None) {
                r if r > 0.0 => ClipShape::Rounded(r),
                _ => ClipShape::Rect,
            }
        };

        match source.and_then(|s| cx.asset(s)).cloned() {
            Some(img) => {
                let fit = ImageFit::parse(cx.text("fit").or_else(|| cx.text("objectFit")));
                let alpha = opacity(cx);
                cx.surface.draw_image(&img, b, fit, clip, alpha);
            }
            None => {
                let placeholder = cx
                    .color_or_token(&["placeholder", "placeholderColor"], "background.tertiary")
                    .unwrap_or(Rgba8::rgba(128, 128, 128, 255));
                let r = match clip {
                    ClipShape::Circle => b.width.min(b.height) * 0.5,
                    ClipShape::Rounded(r) => r,
                    ClipShape::Rect => 0.0,
                };
                let sq = if self.avatar { square(b) } else { b };
                cx.surface.fill_rounded(sq, r, placeholder);
            }
        }

        let ring = cx.number("ringWidth").unwrap_or(0.0);
        if self.avatar
            && ring > 0.0
            && let Some(c) = cx.color_or_token(&["ringColor"], "accent.primary")
        {
            let sq = square(b);
            cx.surface.stroke_rounded(sq, sq.width * 0.5, ring, c);
        }
        Ok(())
    }
}

fn square(b: Bounds) -> Bounds {
    let s = b.width.min(b.height);
    Bounds::new(
        b.x + (b.width - s) * 0.5,
        b.y + (b.height - s) * 0.5,
        s,
        s,
    )
}

/// Horizontal bar filled to `value / max`, clamped. `max` defaults to 100, so a bare `value` is a
/// percentage.
struct Progress;

impl Progress {
    fn fraction(cx: &DrawCx<'_>) -> f64 {
        let value = cx.number("value").unwrap_or(0.0);
        let max = cx.number("max").filter(|m| *m > 0.0).unwrap_or(100.0);
        (value / max).clamp(0.0, 1.0)
    }
}

impl Component for Progress {
    fn draw(&mut self, cx: &mut DrawCx<'_>) -> CardResult<()> {
        let b = cx.bounds;
        let r = cx
            .number("radius")
            .unwrap_or(b.height * 0.5)
            .max(0.0);
        let alpha = opacity(cx);
        if let Some(track) = cx.color_or_token(&["trackColor", "track"], "progress.track") {
            cx.surface.fill_rounded(b, r, track.with_opacity(alpha));
        }

        let frac = Self::fraction(cx);
        if frac <= 0.0 {
            return Ok(());
        }
        let filled = Bounds::new(b.x, b.y, b.width * frac, b.height);
        if cx.flag("gradient").unwrap_or(false) {
            let from = cx.color_or_token(&["gradientStart"], "gradientStart");
            let to = cx.color_or_token(&["gradientEnd"], "gradientEnd");
            if let (Some(from), Some(to)) = (from, to) {
                cx.surface
                    .fill_gradient(filled, r, from.with_opacity(alpha), to.with_opacity(alpha));
                return Ok(());
            }
        }
        if let Some(fill) = cx.color_or_token(&["fillColor", "fill", "color"], "progress.fill") {
            cx.surface.fill_rounded(filled, r, fill.with_opacity(alpha));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/component/builtin.rs"]
mod tests;
