//! Effect registry.
//!
//! Effects are plain data: a pair of function pointers plus metadata. They carry no captured
//! context; anything an effect needs to remember between calls is stored on the target as an
//! attribute.

pub mod builtin;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::element::ElementConfig;
use crate::error::{EffectResult, RevealError, RevealResult};
use crate::host::Paintable;

/// Idempotent setup applied before an effect starts.
pub type InitialStateFn = fn(&mut dyn Paintable, &ElementConfig) -> EffectResult<()>;

/// `progress == None`: one-shot declarative application (transition effects).
/// `progress == Some(p)`: frame step at normalized progress `p`; returns `true` when done.
pub type AnimateFn = fn(&mut dyn Paintable, &ElementConfig, Option<f64>) -> EffectResult<bool>;

/// Descriptive metadata for listing and validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectMeta {
    pub name: String,
    pub description: String,
    pub author: String,
    pub version: String,
    /// Recognised parameter keys (flat keys and group names).
    pub params: Vec<String>,
}

/// Registered behavior for a named effect.
#[derive(Debug, Clone, Default)]
pub struct EffectDefinition {
    pub initial_state: Option<InitialStateFn>,
    pub animate: Option<AnimateFn>,
    pub uses_frame_sampling: bool,
    pub meta: EffectMeta,
}

impl EffectDefinition {
    /// Declarative effect driven by a host transition.
    pub fn transition(animate: AnimateFn) -> Self {
        Self {
            animate: Some(animate),
            uses_frame_sampling: false,
            ..Self::default()
        }
    }

    /// Effect stepped on every frame with normalized progress.
    pub fn frame_sampled(animate: AnimateFn) -> Self {
        Self {
            animate: Some(animate),
            uses_frame_sampling: true,
            ..Self::default()
        }
    }

    pub fn with_initial_state(mut self, initial_state: InitialStateFn) -> Self {
        self.initial_state = Some(initial_state);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.meta.description = description.to_string();
        self
    }

    pub fn with_author(mut self, author: &str, version: &str) -> Self {
        self.meta.author = author.to_string();
        self.meta.version = version.to_string();
        self
    }

    pub fn with_params(mut self, params: &[&str]) -> Self {
        self.meta.params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    #[inline]
    pub fn accepts_param(&self, key: &str) -> bool {
        self.meta.params.iter().any(|p| p == key)
    }
}

/// Name → definition, iterated in registration order.
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    effects: IndexMap<String, EffectDefinition>,
}

impl EffectRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in catalogue.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    /// Register (or silently replace) an effect. Replacing keeps the original listing slot.
    pub fn register(&mut self, name: &str, mut definition: EffectDefinition) -> RevealResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RevealError::invalid_effect(name, "effect name is empty"));
        }
        if definition.animate.is_none() {
            return Err(RevealError::invalid_effect(
                name,
                "definition has no animate function",
            ));
        }
        definition.meta.name = name.to_string();
        if self.effects.insert(name.to_string(), definition).is_some() {
            debug!("effect '{}' replaced", name);
        }
        Ok(())
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<&EffectDefinition> {
        self.effects.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.effects.contains_key(name)
    }

    /// Metadata of every effect in registration order. The iterator is cheap to clone,
    /// so it can be restarted.
    pub fn list(&self) -> impl Iterator<Item = &EffectMeta> + Clone + '_ {
        self.effects.values().map(|d| &d.meta)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.effects.keys().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut dyn Paintable, _: &ElementConfig, _: Option<f64>) -> EffectResult<bool> {
        Ok(true)
    }

    #[test]
    fn register_then_lookup() {
        let mut registry = EffectRegistry::new();
        registry
            .register("pulse", EffectDefinition::frame_sampled(noop))
            .unwrap();
        let def = registry.lookup("pulse").expect("registered");
        assert!(def.animate.is_some());
        assert!(def.uses_frame_sampling);
        assert_eq!(def.meta.name, "pulse");
    }

    #[test]
    fn rejects_empty_name_and_missing_animate() {
        let mut registry = EffectRegistry::new();
        let err = registry
            .register("  ", EffectDefinition::transition(noop))
            .unwrap_err();
        assert!(matches!(err, RevealError::InvalidEffect { .. }));
        let err = registry
            .register("ghost", EffectDefinition::default())
            .unwrap_err();
        assert!(matches!(err, RevealError::InvalidEffect { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn overwrite_keeps_listing_order() {
        let mut registry = EffectRegistry::new();
        for name in ["a", "b", "c"] {
            registry
                .register(name, EffectDefinition::transition(noop))
                .unwrap();
        }
        registry
            .register(
                "a",
                EffectDefinition::frame_sampled(noop).with_description("again"),
            )
            .unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(registry.lookup("a").unwrap().uses_frame_sampling);
    }

    #[test]
    fn list_is_restartable() {
        let registry = EffectRegistry::with_builtins();
        let listing = registry.list();
        let first: Vec<String> = listing.clone().map(|m| m.name.clone()).collect();
        let second: Vec<String> = listing.map(|m| m.name.clone()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), registry.len());
        assert_eq!(first[0], "fadeIn");
    }
}
