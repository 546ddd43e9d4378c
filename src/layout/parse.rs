use serde_json::{Map, Value};

use crate::foundation::error::{CardError, CardResult};
use crate::layout::node::{LayoutDocument, LayoutNode};
use crate::theme::merge::merge_into;

/// Top-level node fields promoted into `props` when the node does not set them there.
pub const LEGACY_PROP_KEYS: &[&str] = &["x", "y", "width", "height", "src", "text"];

/// Prop keys that reference an image asset.
pub const ASSET_PROP_KEYS: &[&str] = &["src", "avatar", "image"];

/// Caller-supplied layout input: JSON text or an already-parsed value.
#[derive(Clone, Debug)]
pub enum LayoutSource {
    Json(String),
    Value(Value),
}

impl From<&str> for LayoutSource {
    fn from(s: &str) -> Self {
        Self::Json(s.to_owned())
    }
}

impl From<String> for LayoutSource {
    fn from(s: String) -> Self {
        Self::Json(s)
    }
}

impl From<Value> for LayoutSource {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<&Value> for LayoutSource {
    fn from(v: &Value) -> Self {
        Self::Value(v.clone())
    }
}

/// Parse and normalize a layout.
///
/// Accepts either a root node object (which may carry `tokens` and `effects` keys) or the wrapped
/// `{root, tokens, effects}` form. Every node comes out as `{type, props, style, children,
/// bounds: None}`.
#[tracing::instrument(skip_all)]
pub fn parse(input: impl Into<LayoutSource>) -> CardResult<LayoutDocument> {
    let value = match input.into() {
        LayoutSource::Json(s) => serde_json::from_str::<Value>(&s)?,
        LayoutSource::Value(v) => v,
    };
    let Some(obj) = value.as_object() else {
        return Err(CardError::validation("layout must be a JSON object"));
    };

    let wrapped = !obj.contains_key("type") && obj.get("root").is_some_and(Value::is_object);
    let root_val = if wrapped { &obj["root"] } else { &value };

    let tokens = match obj.get("tokens") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(m)) => m.clone(),
        Some(_) => return Err(CardError::validation("layout `tokens` must be an object")),
    };
    let effects = match obj.get("effects") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(a)) => a.clone(),
        Some(_) => return Err(CardError::validation("layout `effects` must be an array")),
    };

    let root = normalize_node(root_val, "root")?;
    tracing::debug!(nodes = root.count(), "parsed layout");
    Ok(LayoutDocument {
        root,
        tokens,
        effects,
    })
}

fn normalize_node(v: &Value, path: &str) -> CardResult<LayoutNode> {
    let Some(obj) = v.as_object() else {
        return Err(CardError::validation(format!(
            "layout node at {path} must be an object"
        )));
    };

    let props = match obj.get("props") {
        None | Some(Value::Null) => None,
        Some(Value::Object(m)) => Some(m.clone()),
        Some(_) => {
            return Err(CardError::validation(format!(
                "layout node at {path}: `props` must be an object"
            )));
        }
    };

    let kind = match obj.get("type") {
        Some(Value::String(t)) if !t.trim().is_empty() => t.clone(),
        Some(other) => {
            return Err(CardError::validation(format!(
                "layout node at {path}: `type` must be a non-empty string, got {other}"
            )));
        }
        None if props.is_some() => "container".to_owned(),
        None => {
            return Err(CardError::validation(format!(
                "layout node at {path} has neither `type` nor `props`"
            )));
        }
    };
    let mut props = props.unwrap_or_default();

    for key in LEGACY_PROP_KEYS {
        if let Some(val) = obj.get(*key)
            && !props.contains_key(*key)
        {
            props.insert((*key).to_owned(), val.clone());
        }
    }

    let mut style = Value::Object(match obj.get("style") {
        Some(Value::Object(m)) => m.clone(),
        _ => Map::new(),
    });
    if let Some(inline) = props.remove("style")
        && inline.is_object()
    {
        merge_into(&mut style, &inline);
    }
    let style = match style {
        Value::Object(m) => m,
        _ => Map::new(),
    };

    let children = match obj.get("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, c)| normalize_node(c, &format!("{path}.children[{i}]")))
            .collect::<CardResult<Vec<_>>>()?,
        Some(_) => {
            return Err(CardError::validation(format!(
                "layout node at {path}: `children` must be an array"
            )));
        }
    };

    Ok(LayoutNode {
        kind,
        props,
        style,
        children,
        bounds: None,
    })
}

/// Every image reference in the tree, deduplicated, in first-seen pre-order.
pub fn extract_assets(root: &LayoutNode) -> Vec<String> {
    let mut out = Vec::<String>::new();
    root.walk(&mut |node| {
        for key in ASSET_PROP_KEYS {
            if let Some(src) = node.prop_str(key)
                && !src.trim().is_empty()
                && !out.iter().any(|s| s == src)
            {
                out.push(src.to_owned());
            }
        }
    });
    out
}

/// Structural check of a raw layout value. Never fails; returns `false` for malformed trees.
///
/// A node is valid when it is an object with a non-empty string `type` (or no `type` and an
/// object `props`), and its `children`, when present, is an array of valid nodes. The wrapped
/// `{root, ..}` form is validated through its root.
pub fn validate(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) if !obj.contains_key("type") && obj.get("root").is_some_and(Value::is_object) => {
            validate_node(&obj["root"])
        }
        Some(_) => validate_node(value),
        None => false,
    }
}

fn validate_node(v: &Value) -> bool {
    let Some(obj) = v.as_object() else {
        return false;
    };
    let has_props = obj.get("props").is_some_and(Value::is_object);
    let typed = match obj.get("type") {
        Some(Value::String(t)) => !t.trim().is_empty(),
        Some(_) => return false,
        None => has_props,
    };
    if !typed {
        return false;
    }
    match obj.get("children") {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.iter().all(validate_node),
        Some(_) => false,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/parse.rs"]
mod tests;
