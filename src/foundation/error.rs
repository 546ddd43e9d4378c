/// Result alias used throughout the crate.
pub type CardResult<T> = Result<T, CardError>;

/// Error type returned by every fallible operation in the crate.
///
/// A render call fails with exactly one of these; no partial buffer is ever produced.
#[derive(thiserror::Error, Debug)]
pub enum CardError {
    /// Bad caller input (size out of range, unknown theme name, malformed layout).
    #[error("validation error: {0}")]
    Validation(String),

    /// A layout node names a component type that was never registered.
    #[error(
        "component error: unknown component '{kind}' (register it with ComponentRegistry::register before rendering)"
    )]
    Component {
        /// The offending node type.
        kind: String,
    },

    /// An image could not be fetched or decoded.
    #[error("asset error: '{url}': {reason}")]
    Asset {
        /// Source key of the asset.
        url: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// A pipeline stage failed.
    #[error("render error [{code}]: {message}")]
    Render {
        /// Machine-readable code.
        code: String,
        /// Human-readable message.
        message: String,
        /// Free-form context.
        context: serde_json::Value,
    },

    /// Theme registration or lookup failed.
    #[error("theme error [{code}]: {message}")]
    Theme {
        /// Machine-readable code.
        code: String,
        /// Human-readable message.
        message: String,
        /// Free-form context.
        context: serde_json::Value,
    },

    /// A hook or other extension failed.
    #[error("plugin error [{code}]: {message}")]
    Plugin {
        /// Machine-readable code.
        code: String,
        /// Human-readable message.
        message: String,
        /// Free-form context.
        context: serde_json::Value,
    },

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with the original source preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CardError {
    /// Build a [`CardError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CardError::Component`] for an unregistered type.
    pub fn unknown_component(kind: impl Into<String>) -> Self {
        Self::Component { kind: kind.into() }
    }

    /// Build a [`CardError::Asset`].
    pub fn asset(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Asset {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`CardError::Render`] with an empty context.
    pub fn render(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Render {
            code: code.into(),
            message: msg.into(),
            context: serde_json::Value::Null,
        }
    }

    /// Build a [`CardError::Theme`] with an empty context.
    pub fn theme(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Theme {
            code: code.into(),
            message: msg.into(),
            context: serde_json::Value::Null,
        }
    }

    /// Build a [`CardError::Plugin`] with an empty context.
    pub fn plugin(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Plugin {
            code: code.into(),
            message: msg.into(),
            context: serde_json::Value::Null,
        }
    }

    /// Build a [`CardError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Attach a context object. Variants without a context slot are returned unchanged.
    pub fn with_context(mut self, ctx: serde_json::Value) -> Self {
        match &mut self {
            Self::Render { context, .. }
            | Self::Theme { context, .. }
            | Self::Plugin { context, .. } => *context = ctx,
            _ => {}
        }
        self
    }

    /// Machine-readable code for the wrapper variants, or a fixed tag for the others.
    pub fn code(&self) -> &str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::Component { .. } => "UNKNOWN_COMPONENT",
            Self::Asset { .. } => "ASSET",
            Self::Render { code, .. } | Self::Theme { code, .. } | Self::Plugin { code, .. } => {
                code
            }
            Self::Serde(_) => "SERDE",
            Self::Other(_) => "OTHER",
        }
    }
}

impl From<serde_json::Error> for CardError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
