use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::foundation::core::TokenMap;

/// Resolver for a computed token: a pure function of the evaluation context and the store.
///
/// Resolvers may read other tokens through [`TokenStore::get`]. Read cycles between computed
/// tokens are not detected and recurse without bound.
pub type ComputedToken = Arc<dyn Fn(&TokenMap, &TokenStore) -> Value + Send + Sync>;

/// Table of static and computed design tokens.
///
/// Precedence is fixed: computed definitions shadow static ones of the same name, and
/// [`TokenStore::resolve`] lets context keys override statics but not computed tokens.
#[derive(Clone, Default)]
pub struct TokenStore {
    statics: TokenMap,
    computed: BTreeMap<String, ComputedToken>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("statics", &self.statics)
            .field("computed", &self.computed.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TokenStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with static tokens.
    pub fn from_static(tokens: TokenMap) -> Self {
        Self {
            statics: tokens,
            computed: BTreeMap::new(),
        }
    }

    /// Set a static token, dropping any computed definition of the same name.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.computed.remove(&name);
        self.statics.insert(name, value);
    }

    /// Register a computed token. It is evaluated on every `get`/`resolve`.
    pub fn define_computed<F>(&mut self, name: impl Into<String>, resolver: F)
    where
        F: Fn(&TokenMap, &TokenStore) -> Value + Send + Sync + 'static,
    {
        self.computed.insert(name.into(), Arc::new(resolver));
    }

    /// Remove a token of either kind. Returns `true` when something was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let a = self.statics.remove(name).is_some();
        let b = self.computed.remove(name).is_some();
        a || b
    }

    /// Return `true` if a static or computed token has this name.
    pub fn contains(&self, name: &str) -> bool {
        self.computed.contains_key(name) || self.statics.contains_key(name)
    }

    /// Number of distinct token names.
    pub fn len(&self) -> usize {
        self.statics.len()
            + self
                .computed
                .keys()
                .filter(|k| !self.statics.contains_key(*k))
                .count()
    }

    /// Return `true` when no tokens are defined.
    pub fn is_empty(&self) -> bool {
        self.statics.is_empty() && self.computed.is_empty()
    }

    /// Borrow the static table.
    pub fn static_tokens(&self) -> &TokenMap {
        &self.statics
    }

    /// Copy whose static table is `base` overlaid with this store's statics. Computed tokens are
    /// shared.
    pub fn layered_over(&self, base: &TokenMap) -> Self {
        let mut statics = base.clone();
        for (k, v) in &self.statics {
            statics.insert(k.clone(), v.clone());
        }
        Self {
            statics,
            computed: self.computed.clone(),
        }
    }

    /// Look up one token: computed first, then static, then `fallback`.
    pub fn get(&self, name: &str, context: &TokenMap, fallback: Option<Value>) -> Option<Value> {
        if let Some(resolver) = self.computed.get(name) {
            return Some(resolver(context, self));
        }
        self.statics.get(name).cloned().or(fallback)
    }

    /// Flat snapshot: statics, then every `context` key verbatim, then every computed token.
    pub fn resolve(&self, context: &TokenMap) -> TokenMap {
        let mut out = self.statics.clone();
        for (k, v) in context {
            out.insert(k.clone(), v.clone());
        }
        for (name, resolver) in &self.computed {
            out.insert(name.clone(), resolver(context, self));
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tokens/store.rs"]
mod tests;
