//! Themes: named, inheritable design documents and their flattening into tokens.

pub(crate) mod builtin;
pub(crate) mod flatten;
pub(crate) mod merge;
pub(crate) mod registry;

pub use builtin::DEFAULT_THEME;
pub use flatten::{THEME_TOKEN_KEYS, flatten_theme};
pub use merge::{deep_merge, merge_all};
pub use registry::ThemeRegistry;
