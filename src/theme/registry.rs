use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Value, json};

use crate::foundation::core::TokenMap;
use crate::foundation::error::{CardError, CardResult};
use crate::theme::builtin::{DEFAULT_THEME, builtin_themes, default_theme};
use crate::theme::flatten::flatten_theme;
use crate::theme::merge::deep_merge;

/// Named, inheritable theme documents plus the process-wide active theme name.
///
/// Inheritance is resolved once, at registration: the stored document is fully self-contained and
/// later changes to its base do not propagate.
#[derive(Clone, Debug)]
pub struct ThemeRegistry {
    themes: BTreeMap<String, Arc<Value>>,
    active: String,
    fallback: Arc<Value>,
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeRegistry {
    /// Registry holding the built-in themes, with `default` active.
    pub fn new() -> Self {
        let mut themes = BTreeMap::new();
        for (name, doc) in builtin_themes() {
            themes.insert(name.to_owned(), Arc::new(doc));
        }
        Self {
            themes,
            active: DEFAULT_THEME.to_owned(),
            fallback: Arc::new(default_theme()),
        }
    }

    /// Register `doc` under `name`, deep-merged onto `base` when `base` names a known theme.
    ///
    /// An unknown `base` is ignored and `doc` is stored as-is. A theme cannot inherit from itself.
    pub fn register(
        &mut self,
        name: &str,
        doc: Value,
        base: Option<&str>,
    ) -> CardResult<Arc<Value>> {
        if name.trim().is_empty() {
            return Err(CardError::validation("theme name must be non-empty"));
        }
        if !doc.is_object() {
            return Err(
                CardError::theme("INVALID_THEME", "theme document must be a JSON object")
                    .with_context(json!({ "theme": name })),
            );
        }
        if base == Some(name) {
            return Err(CardError::theme(
                "SELF_INHERITANCE",
                format!("theme '{name}' cannot use itself as its base"),
            )
            .with_context(json!({ "theme": name })));
        }

        let merged = match base {
            Some(b) => match self.themes.get(b) {
                Some(base_doc) => deep_merge(base_doc, &doc),
                None => {
                    tracing::warn!(theme = name, base = b, "unknown base theme; storing as-is");
                    doc
                }
            },
            None => doc,
        };

        let stored = Arc::new(merged);
        self.themes.insert(name.to_owned(), stored.clone());
        tracing::debug!(theme = name, base = ?base, "registered theme");
        Ok(stored)
    }

    /// Return the named theme, or the built-in `default` theme when the name is unknown.
    ///
    /// The substitute is always the built-in document, even if `default` has been re-registered.
    pub fn get(&self, name: &str) -> Arc<Value> {
        if let Some(t) = self.themes.get(name) {
            return t.clone();
        }
        tracing::debug!(theme = name, "unknown theme; substituting built-in default");
        self.fallback.clone()
    }

    /// Register `new_name` as `base_name` with `overrides` applied, returning the stored document.
    pub fn extend(
        &mut self,
        base_name: &str,
        new_name: &str,
        overrides: Value,
    ) -> CardResult<Arc<Value>> {
        self.register(new_name, overrides, Some(base_name))
    }

    /// Make `name` the theme used by renders that do not name one.
    pub fn set_active(&mut self, name: &str) -> CardResult<()> {
        if !self.themes.contains_key(name) {
            return Err(CardError::validation(format!("unknown theme '{name}'")));
        }
        self.active = name.to_owned();
        Ok(())
    }

    /// Name of the active theme.
    pub fn active(&self) -> &str {
        &self.active
    }

    /// Return `true` when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.themes.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.themes.keys().map(String::as_str).collect()
    }

    /// Flatten the named theme (with `default` substitution) into tokens.
    pub fn flatten(&self, name: &str) -> TokenMap {
        flatten_theme(&self.get(name))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/theme/registry.rs"]
mod tests;
