//! Cardstock renders declarative cards to raster images.
//!
//! A card is a JSON layout tree plus a flat data object plus a theme. A render runs nine ordered
//! phases and returns an encoded PNG, JPEG or WebP buffer:
//!
//! - Parse and resolve the layout into absolute bounds
//! - Resolve design tokens (theme, layout tokens, runtime data, computed tokens)
//! - Compute per-node styles
//! - Preload referenced images through the deduplicating [`AssetCache`]
//! - Draw every node with its registered [`Component`], apply post effects, encode
//!
//! Everything long-lived is owned by a [`CardEngine`]; construct one and reuse it across renders
//! and threads.
#![forbid(unsafe_code)]

mod foundation;

pub mod assets;
pub mod component;
mod engine;
pub mod layout;
pub mod render;
pub mod style;
pub mod theme;
pub mod tokens;

pub use crate::foundation::color::{Rgba8, resolve_color};
pub use crate::foundation::core::{Bounds, Insets, TokenMap};
pub use crate::foundation::error::{CardError, CardResult};

pub use crate::assets::{AssetCache, AssetCacheOpts, AssetLoader, LoadedImage, SourceLoaderOpts};
pub use crate::component::{Component, ComponentRegistry, DrawCx};
pub use crate::engine::{CardEngine, EngineOpts};
pub use crate::layout::{LayoutDocument, LayoutNode};
pub use crate::render::{
    ContextPoolOpts, NodeVisit, OutputFormat, PipelineHooks, RenderOptions, RenderOutput,
    RenderState,
};
pub use crate::theme::{DEFAULT_THEME, ThemeRegistry};
pub use crate::tokens::TokenStore;
