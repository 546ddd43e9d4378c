use serde_json::Value;

use crate::foundation::core::TokenMap;
use crate::layout::node::{LayoutDocument, LayoutNode};
use crate::theme::merge::{merge_all, merge_into};

/// Styles for every node of a layout, indexed in pre-order.
///
/// Each node stores only its own inline style; lookups fall through to the shared base table
/// (theme tokens, then layout tokens, then runtime data).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComputedStyles {
    base: TokenMap,
    nodes: Vec<TokenMap>,
}

impl ComputedStyles {
    /// Shared base table.
    pub fn base(&self) -> &TokenMap {
        &self.base
    }

    /// Number of nodes covered.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Style view for the node at pre-order `index`. Out-of-range indices see only the base.
    pub fn node(&self, index: usize) -> NodeStyle<'_> {
        NodeStyle {
            base: &self.base,
            own: self.nodes.get(index),
        }
    }
}

/// Layered style lookup for one node.
#[derive(Clone, Copy, Debug)]
pub struct NodeStyle<'a> {
    base: &'a TokenMap,
    own: Option<&'a TokenMap>,
}

impl<'a> NodeStyle<'a> {
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.own
            .and_then(|m| m.get(key))
            .or_else(|| self.base.get(key))
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    }

    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Only the node's own inline entries.
    pub fn own(&self) -> Option<&'a TokenMap> {
        self.own
    }

    /// Materialize the full layered map.
    pub fn to_map(&self) -> TokenMap {
        let mut out = self.base.clone();
        if let Some(own) = self.own {
            overlay(&mut out, own);
        }
        out
    }
}

/// Computes per-node styles by layering token sources under each node's inline style.
#[derive(Clone, Copy, Debug, Default)]
pub struct StyleResolver;

impl StyleResolver {
    /// Layer, lowest to highest: `theme_tokens`, the layout's own `tokens`, runtime `data`, then
    /// each node's inline style.
    pub fn compute(
        &self,
        document: &LayoutDocument,
        theme_tokens: &TokenMap,
        data: &TokenMap,
    ) -> ComputedStyles {
        let mut base = theme_tokens.clone();
        for (k, v) in &document.tokens {
            base.insert(k.clone(), v.clone());
        }
        overlay(&mut base, data);
        self.compute_resolved(document, &base)
    }

    /// Same as [`StyleResolver::compute`], from an already-layered token table.
    pub fn compute_resolved(&self, document: &LayoutDocument, tokens: &TokenMap) -> ComputedStyles {
        let mut nodes = Vec::with_capacity(document.root.count());
        collect(&document.root, &mut nodes);
        tracing::debug!(nodes = nodes.len(), "computed styles");
        ComputedStyles {
            base: tokens.clone(),
            nodes,
        }
    }

    /// Recursive merge of style fragments, later fragments winning.
    pub fn merge<'a>(&self, fragments: impl IntoIterator<Item = &'a Value>) -> Value {
        merge_all(fragments)
    }
}

fn collect(node: &LayoutNode, out: &mut Vec<TokenMap>) {
    out.push(
        node.style
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    );
    for c in &node.children {
        collect(c, out);
    }
}

fn overlay(dst: &mut TokenMap, src: &TokenMap) {
    for (k, v) in src {
        let both_objects = v.is_object() && dst.get(k).is_some_and(Value::is_object);
        if both_objects && let Some(existing) = dst.get_mut(k) {
            merge_into(existing, v);
        } else {
            dst.insert(k.clone(), v.clone());
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/style/resolver.rs"]
mod tests;
