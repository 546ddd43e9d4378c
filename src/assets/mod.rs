//! Image loading: decode, pluggable loaders, and the deduplicating asset cache.

pub(crate) mod cache;
pub(crate) mod decode;
pub(crate) mod loader;
pub(crate) mod lru;

pub use cache::{AssetCache, AssetCacheOpts, AssetCacheStats, AssetFailure, LoadReport};
pub use decode::{LoadedImage, decode_any, decode_image, decode_svg};
pub use loader::{AssetLoader, SourceLoader, SourceLoaderOpts, is_remote, normalize_rel_path};
