use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::assets::cache::{AssetCache, AssetFailure};
use crate::assets::decode::LoadedImage;
use crate::component::contract::DrawCx;
use crate::component::registry::ComponentRegistry;
use crate::foundation::color::{Rgba8, resolve_color};
use crate::foundation::core::{Bounds, TokenMap};
use crate::foundation::error::{CardError, CardResult};
use crate::layout::node::{LayoutDocument, LayoutNode};
use crate::layout::parse::{LayoutSource, parse};
use crate::layout::resolve::resolve;
use crate::render::encode::{OutputFormat, encode_rgba8};
use crate::render::fx::{Effect, parse_effects};
use crate::render::hooks::HookList;
use crate::render::pool::ContextPool;
use crate::render::surface::Surface;
use crate::render::text::FontBook;
use crate::style::resolver::{ComputedStyles, StyleResolver};
use crate::theme::registry::ThemeRegistry;
use crate::tokens::store::TokenStore;

/// Largest accepted canvas side, in canvas pixels.
pub const MAX_CANVAS_PX: u32 = 4096;
/// Largest accepted DPI factor.
pub const MAX_DPI: f64 = 4.0;

/// Per-call render options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Canvas width in canvas pixels.
    pub width: u32,
    /// Canvas height in canvas pixels.
    pub height: u32,
    /// Device pixels per canvas pixel.
    pub dpi: f64,
    /// Theme name; the registry's active theme when `None`.
    pub theme: Option<String>,
    /// `png`, `jpeg` / `jpg` or `webp`, case-insensitive.
    pub format: String,
    /// JPEG quality, `1..=100`.
    pub quality: u8,
    /// Abort on the first asset failure instead of collecting failures.
    #[serde(alias = "throwOnError")]
    pub throw_on_asset_error: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 300,
            dpi: 1.0,
            theme: None,
            format: "png".to_owned(),
            quality: 90,
            throw_on_asset_error: false,
        }
    }
}

impl RenderOptions {
    /// Check every option. The format is checked first.
    pub fn validate(&self) -> CardResult<OutputFormat> {
        let format = OutputFormat::parse(&self.format)?;
        for (name, v) in [("width", self.width), ("height", self.height)] {
            if v == 0 || v > MAX_CANVAS_PX {
                return Err(CardError::validation(format!(
                    "{name} {v} outside 1..={MAX_CANVAS_PX}"
                )));
            }
        }
        if !self.dpi.is_finite() || self.dpi <= 0.0 || self.dpi > MAX_DPI {
            return Err(CardError::validation(format!(
                "dpi {} outside (0, {MAX_DPI}]",
                self.dpi
            )));
        }
        if self.quality == 0 || self.quality > 100 {
            return Err(CardError::validation(format!(
                "quality {} outside 1..=100",
                self.quality
            )));
        }
        Ok(format)
    }

    /// Device-pixel size of the target surface.
    pub fn device_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((f64::from(v) * self.dpi).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

/// The nine pipeline phases, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderPhase {
    Layout,
    Tokens,
    Styles,
    Assets,
    BeforeRender,
    Components,
    Effects,
    AfterRender,
    Encode,
}

/// Straight-alpha RGBA8 pixels of the finished card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Shared context threaded through every phase and handed to pipeline hooks.
#[derive(Clone, Debug)]
pub struct RenderState {
    pub phase: RenderPhase,
    pub options: RenderOptions,
    pub format: OutputFormat,
    /// Theme actually used (after active-theme substitution).
    pub theme: String,
    /// Runtime data supplied by the caller.
    pub data: TokenMap,
    /// Parsed layout; bounds are populated after `post_layout`.
    pub document: LayoutDocument,
    /// Resolved tokens, from phase 2.
    pub tokens: TokenMap,
    /// Per-node styles, from phase 3. Recomputed when a `before_render` hook edits `document`,
    /// which discards any style edits made by the same hooks.
    pub styles: ComputedStyles,
    /// Preloaded images, from phase 4.
    pub assets: BTreeMap<String, Arc<LoadedImage>>,
    /// Tolerated asset failures.
    pub asset_errors: Vec<AssetFailure>,
    /// Post effects for phase 7.
    pub effects: Vec<Effect>,
    /// Finished pixels, available from `after_render` on.
    pub frame: Option<Frame>,
    /// Scratch space for hooks.
    pub extras: Map<String, Value>,
}

/// Read-only view of one node, handed to component-pass hooks.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeVisit {
    /// Pre-order index.
    pub index: usize,
    pub depth: usize,
    pub kind: String,
    pub bounds: Bounds,
    pub props: Map<String, Value>,
}

/// Ordered hook lists for every pipeline extension point.
#[derive(Clone, Debug)]
pub struct PipelineHooks {
    pub pre_layout: HookList<RenderState>,
    pub post_layout: HookList<RenderState>,
    pub before_render: HookList<RenderState>,
    pub after_render: HookList<RenderState>,
    pub before_component: HookList<NodeVisit>,
    pub after_component: HookList<NodeVisit>,
}

impl Default for PipelineHooks {
    fn default() -> Self {
        Self {
            pre_layout: HookList::new("pre_layout"),
            post_layout: HookList::new("post_layout"),
            before_render: HookList::new("before_render"),
            after_render: HookList::new("after_render"),
            before_component: HookList::new("before_component"),
            after_component: HookList::new("after_component"),
        }
    }
}

/// Encoded card plus what the caller may want to know about how it was produced.
#[derive(Clone, Debug)]
pub struct RenderOutput {
    pub buffer: Vec<u8>,
    pub format: OutputFormat,
    /// Device-pixel width.
    pub width: u32,
    /// Device-pixel height.
    pub height: u32,
    /// Asset failures tolerated during preload.
    pub asset_errors: Vec<AssetFailure>,
}

/// One render's view of the engine's collaborators.
pub struct RenderPipeline<'a> {
    pub themes: &'a ThemeRegistry,
    pub tokens: &'a TokenStore,
    pub components: &'a ComponentRegistry,
    pub assets: &'a AssetCache,
    pub pool: &'a ContextPool,
    pub fonts: &'a FontBook,
    pub hooks: &'a PipelineHooks,
}

impl RenderPipeline<'_> {
    /// Run all nine phases and return the encoded card.
    ///
    /// Options are validated before any other work. The pooled surface is returned to the pool on
    /// every exit path.
    #[tracing::instrument(skip_all, fields(width = options.width, height = options.height, format = %options.format))]
    pub fn execute(
        &self,
        layout: impl Into<LayoutSource>,
        data: &TokenMap,
        options: &RenderOptions,
    ) -> CardResult<RenderOutput> {
        let format = options.validate()?;
        let theme = options
            .theme
            .clone()
            .unwrap_or_else(|| self.themes.active().to_owned());

        // 1. Layout.
        let document = parse(layout)?;
        self.check_components(&document.root)?;
        let effects = parse_effects(&document.effects)?;
        let mut state = RenderState {
            phase: RenderPhase::Layout,
            options: options.clone(),
            format,
            theme,
            data: data.clone(),
            document,
            tokens: TokenMap::new(),
            styles: ComputedStyles::default(),
            assets: BTreeMap::new(),
            asset_errors: Vec::new(),
            effects,
            frame: None,
            extras: Map::new(),
        };
        self.hooks.pre_layout.run(&mut state)?;
        let canvas = Bounds::new(
            0.0,
            0.0,
            f64::from(options.width),
            f64::from(options.height),
        );
        resolve(&mut state.document.root, canvas);
        self.hooks.post_layout.run(&mut state)?;
        tracing::debug!(nodes = state.document.root.count(), "layout resolved");

        // 2. Tokens.
        state.phase = RenderPhase::Tokens;
        let theme_tokens = self.themes.flatten(&state.theme);
        let mut context = TokenMap::new();
        for (k, v) in &state.document.tokens {
            context.insert(k.clone(), v.clone());
        }
        for (k, v) in &state.data {
            context.insert(k.clone(), v.clone());
        }
        state.tokens = self.tokens.layered_over(&theme_tokens).resolve(&context);
        if state.tokens.get("effects.glow") == Some(&Value::Bool(true))
            && !state.effects.iter().any(|e| matches!(e, Effect::Glow { .. }))
        {
            state.effects.insert(
                0,
                Effect::Glow {
                    color: None,
                    radius: None,
                    intensity: None,
                },
            );
        }
        tracing::debug!(tokens = state.tokens.len(), theme = %state.theme, "tokens resolved");

        // 3. Styles.
        state.phase = RenderPhase::Styles;
        state.styles = StyleResolver.compute_resolved(&state.document, &state.tokens);

        // 4. Assets.
        state.phase = RenderPhase::Assets;
        let report = self
            .assets
            .preload_from_layout(&state.document.root, options.throw_on_asset_error)?;
        state.assets = report.loaded;
        state.asset_errors = report.errors;

        // 5. Before-render hooks.
        state.phase = RenderPhase::BeforeRender;
        if !self.hooks.before_render.is_empty() {
            let snapshot = state.document.clone();
            self.hooks.before_render.run(&mut state)?;
            if state.document != snapshot {
                tracing::debug!("document edited before render; recomputing styles");
                state.styles = StyleResolver.compute_resolved(&state.document, &state.tokens);
            }
        }

        // 6. Components.
        state.phase = RenderPhase::Components;
        let (dw, dh) = options.device_size();
        let mut surface = self.pool.checkout(dw, dh, options.dpi)?;
        let background = resolve_color(state.tokens.get("background"), &state.tokens)
            .or_else(|| resolve_color(state.tokens.get("background.primary"), &state.tokens))
            .unwrap_or(Rgba8::BLACK);
        surface.fill_rect(canvas, background);
        let mut index = 0usize;
        self.draw_node(&state, &mut surface, &state.document.root, 0, &mut index)?;
        surface.flush();

        // 7. Effects.
        state.phase = RenderPhase::Effects;
        for effect in &state.effects {
            tracing::debug!(effect = effect.name(), "applying effect");
            effect.apply(surface.pixels_mut(), dw, dh, options.dpi, &state.tokens)?;
        }
        state.frame = Some(Frame {
            width: dw,
            height: dh,
            rgba: surface.to_rgba8(),
        });

        // 8. After-render hooks.
        state.phase = RenderPhase::AfterRender;
        self.hooks.after_render.run(&mut state)?;

        // 9. Encode.
        state.phase = RenderPhase::Encode;
        let frame = state
            .frame
            .take()
            .ok_or_else(|| CardError::render("NO_FRAME", "after_render hook removed the frame"))?;
        let buffer = encode_rgba8(&frame.rgba, frame.width, frame.height, format, options.quality)?;
        drop(surface);
        tracing::debug!(bytes = buffer.len(), "encoded card");

        Ok(RenderOutput {
            buffer,
            format,
            width: frame.width,
            height: frame.height,
            asset_errors: state.asset_errors,
        })
    }

    fn check_components(&self, root: &LayoutNode) -> CardResult<()> {
        let mut missing: Option<String> = None;
        root.walk(&mut |n| {
            if missing.is_none() && !self.components.contains(&n.kind) {
                missing = Some(n.kind.clone());
            }
        });
        match missing {
            Some(kind) => Err(CardError::unknown_component(kind)),
            None => Ok(()),
        }
    }

    fn draw_node(
        &self,
        state: &RenderState,
        surface: &mut Surface,
        node: &LayoutNode,
        depth: usize,
        index: &mut usize,
    ) -> CardResult<()> {
        let i = *index;
        *index += 1;
        let bounds = node.bounds_or_default();

        let mut visit = (!self.hooks.before_component.is_empty()
            || !self.hooks.after_component.is_empty())
        .then(|| NodeVisit {
            index: i,
            depth,
            kind: node.kind.clone(),
            bounds,
            props: node.props.clone(),
        });
        if let Some(v) = visit.as_mut() {
            self.hooks.before_component.run(v)?;
        }

        let mut instance = self.components.create(&node.kind, &node.props)?;
        {
            let mut cx = DrawCx {
                surface: &mut *surface,
                node,
                index: i,
                bounds,
                style: state.styles.node(i),
                tokens: &state.tokens,
                assets: &state.assets,
                fonts: self.fonts,
            };
            instance.render(&mut cx)?;
        }

        if let Some(v) = visit.as_mut() {
            self.hooks.after_component.run(v)?;
        }

        for child in &node.children {
            self.draw_node(state, surface, child, depth + 1, index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
