use serde_json::{Map, Value};

use crate::foundation::core::Bounds;
use crate::foundation::error::CardResult;

/// Node of the declarative card tree, in canonical shape.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayoutNode {
    /// Component type, looked up in the component registry.
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque component properties, including layout props and an optional `slot` tag.
    #[serde(default)]
    pub props: Map<String, Value>,
    /// Inline style (already merged with `props.style` by the parser).
    #[serde(default)]
    pub style: Map<String, Value>,
    /// Ordered children.
    #[serde(default)]
    pub children: Vec<LayoutNode>,
    /// Absolute bounds, `None` until resolved.
    #[serde(default)]
    pub bounds: Option<Bounds>,
}

impl LayoutNode {
    /// Bare node of `kind` with no props, style or children.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            props: Map::new(),
            style: Map::new(),
            children: Vec::new(),
            bounds: None,
        }
    }

    /// Builder-style prop setter, mostly for tests and programmatic trees.
    pub fn with_prop(mut self, key: &str, value: Value) -> Self {
        self.props.insert(key.to_owned(), value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: LayoutNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    pub fn prop_f64(&self, key: &str) -> Option<f64> {
        self.props
            .get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    }

    /// Resolved bounds, or an empty rectangle for an unresolved node.
    pub fn bounds_or_default(&self) -> Bounds {
        self.bounds.unwrap_or_default()
    }

    /// Visit this node and every descendant in pre-order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a LayoutNode)) {
        f(self);
        for c in &self.children {
            c.walk(f);
        }
    }

    /// Number of nodes in this subtree.
    pub fn count(&self) -> usize {
        let mut n = 0;
        self.walk(&mut |_| n += 1);
        n
    }
}

/// A parsed layout: root node plus document-level tokens and post effects.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayoutDocument {
    pub root: LayoutNode,
    /// Layout-declared token overrides.
    #[serde(default)]
    pub tokens: Map<String, Value>,
    /// Post effects applied after the component pass, in order.
    #[serde(default)]
    pub effects: Vec<Value>,
}

impl LayoutDocument {
    pub fn new(root: LayoutNode) -> Self {
        Self {
            root,
            tokens: Map::new(),
            effects: Vec::new(),
        }
    }

    /// Serialize to the wrapped `{root, tokens, effects}` form accepted by the parser.
    pub fn to_value(&self) -> CardResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
