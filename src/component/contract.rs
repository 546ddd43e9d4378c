use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::assets::decode::LoadedImage;
use crate::foundation::color::{Rgba8, resolve_color};
use crate::foundation::core::{Bounds, TokenMap};
use crate::foundation::error::{CardError, CardResult};
use crate::layout::node::LayoutNode;
use crate::render::surface::Surface;
use crate::render::text::FontBook;
use crate::style::resolver::NodeStyle;

/// Everything a component may read or draw into while painting one node.
pub struct DrawCx<'a> {
    pub surface: &'a mut Surface,
    pub node: &'a LayoutNode,
    /// Pre-order index of `node`.
    pub index: usize,
    pub bounds: Bounds,
    pub style: NodeStyle<'a>,
    /// Fully resolved token table for this render.
    pub tokens: &'a TokenMap,
    /// Images preloaded for this render, keyed by source.
    pub assets: &'a BTreeMap<String, Arc<LoadedImage>>,
    pub fonts: &'a FontBook,
}

impl<'a> DrawCx<'a> {
    /// Raw value for `key`: node props first, then the node's computed style.
    pub fn value(&self, key: &str) -> Option<&'a Value> {
        self.node.props.get(key).or_else(|| self.style.get(key))
    }

    /// Number for `key`. A string value naming a numeric token (`"radius.md"`) is dereferenced.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.value(key).and_then(|v| self.deref_number(v))
    }

    pub fn deref_number(&self, v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => self
                .tokens
                .get(s.as_str())
                .and_then(Value::as_f64)
                .or_else(|| s.trim().parse::<f64>().ok()),
            _ => None,
        }
        .filter(|f| f.is_finite())
    }

    /// Color for `key`, resolving token names.
    pub fn color(&self, key: &str) -> Option<Rgba8> {
        resolve_color(self.value(key), self.tokens)
    }

    /// Color for the first of `keys` that is set, else the token `fallback`.
    pub fn color_or_token(&self, keys: &[&str], fallback: &str) -> Option<Rgba8> {
        keys.iter()
            .find_map(|k| self.color(k))
            .or_else(|| resolve_color(self.tokens.get(fallback), self.tokens))
    }

    pub fn text(&self, key: &str) -> Option<&'a str> {
        self.value(key).and_then(Value::as_str)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.value(key).and_then(Value::as_bool)
    }

    /// Preloaded image for `source`, if it loaded.
    pub fn asset(&self, source: &str) -> Option<&'a Arc<LoadedImage>> {
        self.assets.get(source)
    }

    /// Replace `{{ name }}` placeholders with token values. Unknown names render empty.
    pub fn interpolate(&self, template: &str) -> String {
        interpolate(template, self.tokens)
    }
}

pub(crate) fn interpolate(template: &str, tokens: &TokenMap) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = after[..end].trim();
        match tokens.get(name) {
            Some(Value::String(s)) => out.push_str(s),
            Some(Value::Null) | None => {}
            Some(other) => out.push_str(&other.to_string()),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// A drawing unit bound to one layout node.
///
/// Components paint only themselves; the pipeline walks children after the parent returns.
pub trait Component: Send {
    fn draw(&mut self, cx: &mut DrawCx<'_>) -> CardResult<()>;
}

/// Hook run around a component's draw.
pub type DrawHook = Arc<dyn Fn(&mut DrawCx<'_>) -> CardResult<()> + Send + Sync>;

/// Observer called with a draw failure. Cannot suppress it.
pub type ErrorHook = Arc<dyn Fn(&DrawCx<'_>, &CardError) + Send + Sync>;

/// Per-type hooks attached to every instance of a component type.
#[derive(Clone, Default)]
pub struct ComponentHooks {
    before_render: Vec<DrawHook>,
    after_render: Vec<DrawHook>,
    on_error: Vec<ErrorHook>,
}

impl std::fmt::Debug for ComponentHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentHooks")
            .field("before_render", &self.before_render.len())
            .field("after_render", &self.after_render.len())
            .field("on_error", &self.on_error.len())
            .finish()
    }
}

impl ComponentHooks {
    pub fn before_render<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut DrawCx<'_>) -> CardResult<()> + Send + Sync + 'static,
    {
        self.before_render.push(Arc::new(f));
        self
    }

    pub fn after_render<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut DrawCx<'_>) -> CardResult<()> + Send + Sync + 'static,
    {
        self.after_render.push(Arc::new(f));
        self
    }

    pub fn on_error<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&DrawCx<'_>, &CardError) + Send + Sync + 'static,
    {
        self.on_error.push(Arc::new(f));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.before_render.is_empty() && self.after_render.is_empty() && self.on_error.is_empty()
    }
}

/// A created component plus the hooks of its type.
pub struct ComponentInstance {
    kind: String,
    component: Box<dyn Component>,
    hooks: ComponentHooks,
}

impl std::fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("kind", &self.kind)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl ComponentInstance {
    pub fn new(kind: impl Into<String>, component: Box<dyn Component>, hooks: ComponentHooks) -> Self {
        Self {
            kind: kind.into(),
            component,
            hooks,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Run `before_render` hooks, draw, then `after_render` hooks.
    ///
    /// If drawing fails, every `on_error` hook observes the error and the same error is returned.
    /// Failures in `before_render`/`after_render` hooks propagate as-is.
    pub fn render(&mut self, cx: &mut DrawCx<'_>) -> CardResult<()> {
        for hook in &self.hooks.before_render {
            hook(&mut *cx)?;
        }
        if let Err(err) = self.component.draw(cx) {
            for hook in &self.hooks.on_error {
                hook(&*cx, &err);
            }
            return Err(err);
        }
        for hook in &self.hooks.after_render {
            hook(&mut *cx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/component/contract.rs"]
mod tests;
