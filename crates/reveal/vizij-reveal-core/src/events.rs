//! Notifications dispatched on targets for external observation.

use serde::{Deserialize, Serialize};

use crate::element::ElementConfig;
use crate::ids::ElementId;

/// Kinds of reveal notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Effect playback started
    Start,
    /// Effect playback completed
    Complete,
    /// Element was reset to its initial state
    Reset,
}

impl EventType {
    /// Name of the event as dispatched on the target
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "reveal:start",
            Self::Complete => "reveal:complete",
            Self::Reset => "reveal:reset",
        }
    }
}

/// Notification payload: effect type and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealEvent {
    pub kind: EventType,
    pub element: ElementId,
    pub effect_type: String,
    pub duration_ms: f64,
    pub delay_ms: f64,
}

impl RevealEvent {
    pub fn new(kind: EventType, element: ElementId, config: &ElementConfig) -> Self {
        Self {
            kind,
            element,
            effect_type: config.effect_type.clone(),
            duration_ms: config.duration_ms(),
            delay_ms: config.delay_ms(),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// JSON form for hosts that forward events across an FFI/JS boundary.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": self.kind.name(),
            "detail": {
                "element": self.element.0,
                "effectType": self.effect_type,
                "duration": self.duration_ms,
                "delay": self.delay_ms,
            }
        })
    }
}
