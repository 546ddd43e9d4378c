//! Drawing surfaces, text, post effects, encoding and the render pipeline.

pub(crate) mod encode;
pub(crate) mod fx;
pub(crate) mod hooks;
pub(crate) mod pipeline;
pub(crate) mod pool;
pub(crate) mod surface;
pub(crate) mod text;

pub use encode::{OutputFormat, encode_rgba8};
pub use fx::{Effect, parse_effects};
pub use hooks::{Hook, HookList};
pub use pipeline::{
    Frame, MAX_CANVAS_PX, MAX_DPI, NodeVisit, PipelineHooks, RenderOptions, RenderOutput,
    RenderPhase, RenderPipeline, RenderState,
};
pub use pool::{ContextPool, ContextPoolOpts, ContextPoolStats, PooledSurface};
pub use surface::{ClipShape, ImageFit, Surface};
pub use text::{FontBook, FontFace, TextAlign, TextBlock, TextEngine};
