use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::component::builtin;
use crate::component::contract::{Component, ComponentHooks, ComponentInstance};
use crate::foundation::error::{CardError, CardResult};

/// Constructor for a component type, given the node's props.
pub type ComponentCtor =
    Arc<dyn Fn(&Map<String, Value>) -> CardResult<Box<dyn Component>> + Send + Sync>;

/// String-keyed table of component constructors.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    ctors: BTreeMap<String, ComponentCtor>,
    hooks: BTreeMap<String, ComponentHooks>,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("types", &self.types())
            .finish_non_exhaustive()
    }
}

impl ComponentRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in components.
    pub fn with_builtins() -> Self {
        let mut r = Self::new();
        builtin::register_builtins(&mut r);
        r
    }

    /// Register (or replace) the constructor for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, ctor: F)
    where
        F: Fn(&Map<String, Value>) -> CardResult<Box<dyn Component>> + Send + Sync + 'static,
    {
        let kind = kind.into();
        tracing::debug!(kind = %kind, "registered component");
        self.ctors.insert(kind, Arc::new(ctor));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.ctors.contains_key(kind)
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> Vec<&str> {
        self.ctors.keys().map(String::as_str).collect()
    }

    /// Hooks for every instance of `kind`, created on first access.
    pub fn hooks_mut(&mut self, kind: &str) -> &mut ComponentHooks {
        self.hooks.entry(kind.to_owned()).or_default()
    }

    /// Instantiate `kind`. Unregistered types are an error.
    pub fn create(&self, kind: &str, props: &Map<String, Value>) -> CardResult<ComponentInstance> {
        let ctor = self
            .ctors
            .get(kind)
            .ok_or_else(|| CardError::unknown_component(kind))?;
        let component = ctor(props)?;
        let hooks = self.hooks.get(kind).cloned().unwrap_or_default();
        Ok(ComponentInstance::new(kind, component, hooks))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/component/registry.rs"]
mod tests;
