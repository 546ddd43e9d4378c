//! Per-node computed styles.

pub(crate) mod resolver;

pub use resolver::{ComputedStyles, NodeStyle, StyleResolver};
