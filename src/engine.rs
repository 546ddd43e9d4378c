use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde_json::{Map, Value};

use crate::assets::cache::{AssetCache, AssetCacheOpts};
use crate::assets::loader::{AssetLoader, SourceLoader, SourceLoaderOpts};
use crate::component::contract::{Component, ComponentHooks};
use crate::component::registry::ComponentRegistry;
use crate::foundation::core::TokenMap;
use crate::foundation::error::CardResult;
use crate::layout::parse::LayoutSource;
use crate::render::pipeline::{PipelineHooks, RenderOptions, RenderOutput, RenderPipeline};
use crate::render::pool::{ContextPool, ContextPoolOpts};
use crate::render::text::FontBook;
use crate::theme::registry::ThemeRegistry;
use crate::tokens::store::TokenStore;

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct EngineOpts {
    pub cache: AssetCacheOpts,
    pub pool: ContextPoolOpts,
    /// Options for the default [`SourceLoader`]. Ignored by [`CardEngine::with_loader`].
    pub loader: SourceLoaderOpts,
    /// Extra directories scanned for fonts.
    pub font_dirs: Vec<PathBuf>,
    /// Load the system font collection.
    pub system_fonts: bool,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            cache: AssetCacheOpts::default(),
            pool: ContextPoolOpts::default(),
            loader: SourceLoaderOpts::default(),
            font_dirs: Vec::new(),
            system_fonts: true,
        }
    }
}

impl EngineOpts {
    /// Defaults overridden by `CARDSTOCK_*` environment variables.
    ///
    /// Unparseable or non-positive numeric values are ignored.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var_os(name))
    }

    /// [`EngineOpts::from_env`] over an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let num = |name: &str| {
            lookup(name)
                .and_then(|v| v.to_str().and_then(|s| s.trim().parse::<u64>().ok()))
                .filter(|&n| n > 0)
        };
        let mut opts = Self::default();
        if let Some(n) = num("CARDSTOCK_CACHE_CAPACITY") {
            opts.cache.capacity = n as usize;
        }
        if let Some(secs) = num("CARDSTOCK_CACHE_TTL_SECS") {
            opts.cache.ttl = Some(Duration::from_secs(secs));
        }
        if let Some(n) = num("CARDSTOCK_MAX_CONTEXTS") {
            opts.pool.max_contexts = n as usize;
        }
        if let Some(root) = lookup("CARDSTOCK_ASSET_ROOT") {
            opts.loader.asset_root = PathBuf::from(root);
        }
        if let Some(dirs) = lookup("CARDSTOCK_FONT_DIR") {
            opts.font_dirs.extend(std::env::split_paths(&dirs));
        }
        opts
    }
}

/// Owner of every long-lived collaborator a render needs.
///
/// Construct once and share (`&CardEngine` or `Arc<CardEngine>`) across threads. Each render
/// snapshots the theme, token, component and hook registries, so registrations made while a
/// render is running take effect from the next render on. The asset cache, surface pool and font
/// book are shared by all renders.
pub struct CardEngine {
    themes: RwLock<ThemeRegistry>,
    tokens: RwLock<TokenStore>,
    components: RwLock<ComponentRegistry>,
    hooks: RwLock<PipelineHooks>,
    cache: AssetCache,
    pool: ContextPool,
    fonts: FontBook,
}

impl std::fmt::Debug for CardEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardEngine")
            .field("cache", &self.cache)
            .field("pool", &self.pool)
            .field("fonts", &self.fonts)
            .finish_non_exhaustive()
    }
}

impl Default for CardEngine {
    fn default() -> Self {
        Self::new(EngineOpts::default())
    }
}

impl CardEngine {
    /// Engine with the default [`SourceLoader`].
    pub fn new(opts: EngineOpts) -> Self {
        let loader = SourceLoader::new(opts.loader.clone());
        Self::with_loader(opts, loader)
    }

    /// Engine with a custom asset loader.
    pub fn with_loader(opts: EngineOpts, loader: impl AssetLoader + 'static) -> Self {
        let fonts = if opts.system_fonts {
            FontBook::new(&opts.font_dirs)
        } else {
            let mut db = usvg::fontdb::Database::new();
            for dir in &opts.font_dirs {
                db.load_fonts_dir(dir);
            }
            FontBook::from_database(db)
        };
        Self::with_parts(opts, Arc::new(loader), fonts)
    }

    /// Engine over a prepared loader and font book.
    pub fn with_parts(opts: EngineOpts, loader: Arc<dyn AssetLoader>, fonts: FontBook) -> Self {
        tracing::debug!(
            capacity = opts.cache.capacity,
            max_contexts = opts.pool.max_contexts,
            "created card engine"
        );
        Self {
            themes: RwLock::new(ThemeRegistry::new()),
            tokens: RwLock::new(TokenStore::new()),
            components: RwLock::new(ComponentRegistry::with_builtins()),
            hooks: RwLock::new(PipelineHooks::default()),
            cache: AssetCache::new(opts.cache, loader),
            pool: ContextPool::new(opts.pool),
            fonts,
        }
    }

    /// Render `layout` with `data` and return the encoded card.
    pub fn render(
        &self,
        layout: impl Into<LayoutSource>,
        data: &TokenMap,
        options: &RenderOptions,
    ) -> CardResult<RenderOutput> {
        let themes = read(&self.themes).clone();
        let tokens = read(&self.tokens).clone();
        let components = read(&self.components).clone();
        let hooks = read(&self.hooks).clone();
        RenderPipeline {
            themes: &themes,
            tokens: &tokens,
            components: &components,
            assets: &self.cache,
            pool: &self.pool,
            fonts: &self.fonts,
            hooks: &hooks,
        }
        .execute(layout, data, options)
    }

    pub fn register_theme(
        &self,
        name: &str,
        doc: Value,
        base: Option<&str>,
    ) -> CardResult<Arc<Value>> {
        write(&self.themes).register(name, doc, base)
    }

    pub fn extend_theme(
        &self,
        base_name: &str,
        new_name: &str,
        overrides: Value,
    ) -> CardResult<Arc<Value>> {
        write(&self.themes).extend(base_name, new_name, overrides)
    }

    pub fn set_active_theme(&self, name: &str) -> CardResult<()> {
        write(&self.themes).set_active(name)
    }

    pub fn active_theme(&self) -> String {
        read(&self.themes).active().to_owned()
    }

    pub fn theme_names(&self) -> Vec<String> {
        read(&self.themes)
            .names()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// The named theme (or `default`) flattened to tokens.
    pub fn theme_tokens(&self, name: &str) -> TokenMap {
        read(&self.themes).flatten(name)
    }

    pub fn register_component<F>(&self, kind: impl Into<String>, ctor: F)
    where
        F: Fn(&Map<String, Value>) -> CardResult<Box<dyn Component>> + Send + Sync + 'static,
    {
        write(&self.components).register(kind, ctor);
    }

    /// Edit the hooks attached to every instance of `kind`.
    pub fn component_hooks(&self, kind: &str, edit: impl FnOnce(&mut ComponentHooks)) {
        edit(write(&self.components).hooks_mut(kind));
    }

    pub fn component_types(&self) -> Vec<String> {
        read(&self.components)
            .types()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Define a static token shared by every render. Theme tokens sit below it.
    pub fn define_token(&self, name: impl Into<String>, value: Value) {
        write(&self.tokens).define(name, value);
    }

    pub fn define_computed_token<F>(&self, name: impl Into<String>, resolver: F)
    where
        F: Fn(&TokenMap, &TokenStore) -> Value + Send + Sync + 'static,
    {
        write(&self.tokens).define_computed(name, resolver);
    }

    pub fn remove_token(&self, name: &str) -> bool {
        write(&self.tokens).remove(name)
    }

    /// Edit the pipeline hook lists.
    pub fn hooks(&self, edit: impl FnOnce(&mut PipelineHooks)) {
        edit(&mut write(&self.hooks));
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Drop idle surfaces and every cached image and error. The engine stays usable.
    pub fn shutdown(&self) {
        let drained = self.pool.drain();
        self.cache.clear();
        tracing::debug!(drained, "engine shut down");
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "../tests/unit/engine.rs"]
mod tests;
