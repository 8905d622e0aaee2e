//! Error types for reveal operations

use serde::{Deserialize, Serialize};

/// Errors surfaced at the operation boundary (play, prepare, reset, register).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RevealError {
    /// Selector or element id resolved to nothing
    #[error("Element not found: {target}")]
    ElementNotFound { target: String },

    /// Effect type is not registered
    #[error("Unknown effect: {name}")]
    UnknownEffect { name: String },

    /// No usable configuration could be produced
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// Registration rejected
    #[error("Invalid effect '{name}': {reason}")]
    InvalidEffect { name: String, reason: String },

    /// An effect's initial_state or animate step failed
    #[error("Effect '{effect}' failed: {reason}")]
    EffectRuntime { effect: String, reason: String },
}

impl RevealError {
    pub fn element_not_found(target: impl Into<String>) -> Self {
        Self::ElementNotFound {
            target: target.into(),
        }
    }

    pub fn unknown_effect(name: impl Into<String>) -> Self {
        Self::UnknownEffect { name: name.into() }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn invalid_effect(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEffect {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn effect_runtime(effect: impl Into<String>, fault: &EffectFault) -> Self {
        Self::EffectRuntime {
            effect: effect.into(),
            reason: fault.0.clone(),
        }
    }

    /// Stable short name of the error kind, used in log fields.
    #[inline]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ElementNotFound { .. } => "element_not_found",
            Self::UnknownEffect { .. } => "unknown_effect",
            Self::Configuration { .. } => "configuration",
            Self::InvalidEffect { .. } => "invalid_effect",
            Self::EffectRuntime { .. } => "effect_runtime",
        }
    }
}

/// Result alias for reveal operations.
pub type RevealResult<T> = core::result::Result<T, RevealError>;

/// Failure raised from inside an effect function.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct EffectFault(pub String);

impl EffectFault {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Result alias for effect functions.
pub type EffectResult<T> = core::result::Result<T, EffectFault>;
