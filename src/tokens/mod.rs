//! Design tokens: named values resolved through a layered precedence chain.

pub(crate) mod store;

pub use store::{ComputedToken, TokenStore};
