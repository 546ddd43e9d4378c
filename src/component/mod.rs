//! Components: drawing units keyed by node type, their hooks and the registry.

pub(crate) mod builtin;
pub(crate) mod contract;
pub(crate) mod registry;

pub use contract::{
    Component, ComponentHooks, ComponentInstance, DrawCx, DrawHook, ErrorHook,
};
pub use registry::{ComponentCtor, ComponentRegistry};
