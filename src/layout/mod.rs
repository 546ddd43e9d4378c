//! Declarative layout tree: parsing, normalization and bounds resolution.

pub(crate) mod node;
pub(crate) mod parse;
pub(crate) mod resolve;

pub use node::{LayoutDocument, LayoutNode};
pub use parse::{LayoutSource, extract_assets, parse, validate};
pub use resolve::resolve;
