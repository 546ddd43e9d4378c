use std::sync::Arc;

use serde_json::json;

use crate::foundation::error::{CardError, CardResult};

/// One hook callback. Runs synchronously on the rendering thread.
pub type Hook<T> = Arc<dyn Fn(&mut T) -> CardResult<()> + Send + Sync>;

/// Ordered list of callbacks for one extension point.
///
/// Hooks run in registration order. The first failure stops the list and is returned wrapped as a
/// `HOOK_FAILED` plugin error naming the extension point.
pub struct HookList<T> {
    name: &'static str,
    hooks: Vec<Hook<T>>,
}

impl<T> Clone for HookList<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            hooks: self.hooks.clone(),
        }
    }
}

impl<T> std::fmt::Debug for HookList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookList")
            .field("name", &self.name)
            .field("len", &self.hooks.len())
            .finish()
    }
}

impl<T> HookList<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            hooks: Vec::new(),
        }
    }

    /// Extension point name, used in error context.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn push<F>(&mut self, hook: F)
    where
        F: Fn(&mut T) -> CardResult<()> + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn clear(&mut self) {
        self.hooks.clear();
    }

    /// Run every hook in order against `target`.
    pub fn run(&self, target: &mut T) -> CardResult<()> {
        for (i, hook) in self.hooks.iter().enumerate() {
            hook(target).map_err(|e| hook_failed(self.name, i, e))?;
        }
        Ok(())
    }
}

fn hook_failed(hook: &str, index: usize, err: CardError) -> CardError {
    CardError::plugin("HOOK_FAILED", format!("{hook} hook #{index} failed: {err}")).with_context(
        json!({
            "hook": hook,
            "index": index,
            "error": err.to_string(),
        }),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/hooks.rs"]
mod tests;
