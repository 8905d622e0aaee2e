//! Global configuration for the reveal system

use serde::{Deserialize, Serialize};

use crate::error::{RevealError, RevealResult};
use crate::timing::parse_time_ms;

/// Reduced-motion policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReducedMotion {
    /// Follow the host's media preference
    #[default]
    Auto,
    /// Always skip straight to the end state
    Always,
    /// Always animate
    Never,
}

/// Global options; per-element configuration falls back to these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalConfig {
    /// Fraction of the element that must be visible to trigger
    pub threshold: f64,
    /// Margin around the visibility root, CSS shorthand
    pub root_margin: String,
    /// Trigger only on the first visibility enter
    pub once: bool,
    /// Default effect duration
    pub duration: String,
    /// Default effect delay
    pub delay: String,
    /// Default easing curve name
    pub easing: String,
    /// Promote lifecycle logging from debug to info
    pub debug: bool,
    pub reduced_motion: ReducedMotion,
    /// Attribute carrying the per-element configuration string
    pub attribute: String,
    /// Effect used when a configuration names none
    pub default_effect: String,
    /// Reject unknown effect names and parameters instead of falling back
    pub strict: bool,
    /// Delay between the reset and re-play of consecutive elements in `replay_all`
    pub replay_stagger_ms: f64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            root_margin: "0px".to_string(),
            once: true,
            duration: "0.5s".to_string(),
            delay: "0s".to_string(),
            easing: "ease-out".to_string(),
            debug: false,
            reduced_motion: ReducedMotion::Auto,
            attribute: "data-reveal".to_string(),
            default_effect: "fadeIn".to_string(),
            strict: false,
            replay_stagger_ms: 50.0,
        }
    }
}

impl GlobalConfig {
    /// Parse from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> RevealResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| RevealError::configuration(format!("invalid global config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> RevealResult<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(RevealError::configuration(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        parse_time_ms(&self.duration)?;
        parse_time_ms(&self.delay)?;
        if !self.replay_stagger_ms.is_finite() || self.replay_stagger_ms < 0.0 {
            return Err(RevealError::configuration(format!(
                "replayStaggerMs {} must be a non-negative number",
                self.replay_stagger_ms
            )));
        }
        if self.attribute.trim().is_empty() {
            return Err(RevealError::configuration("attribute name is empty"));
        }
        Ok(())
    }

    /// Merge a patch over this configuration.
    pub fn apply(&mut self, patch: ConfigPatch) {
        let ConfigPatch {
            threshold,
            root_margin,
            once,
            duration,
            delay,
            easing,
            debug,
            reduced_motion,
            attribute,
            default_effect,
            strict,
            replay_stagger_ms,
        } = patch;
        if let Some(v) = threshold {
            self.threshold = v;
        }
        if let Some(v) = root_margin {
            self.root_margin = v;
        }
        if let Some(v) = once {
            self.once = v;
        }
        if let Some(v) = duration {
            self.duration = v;
        }
        if let Some(v) = delay {
            self.delay = v;
        }
        if let Some(v) = easing {
            self.easing = v;
        }
        if let Some(v) = debug {
            self.debug = v;
        }
        if let Some(v) = reduced_motion {
            self.reduced_motion = v;
        }
        if let Some(v) = attribute {
            self.attribute = v;
        }
        if let Some(v) = default_effect {
            self.default_effect = v;
        }
        if let Some(v) = strict {
            self.strict = v;
        }
        if let Some(v) = replay_stagger_ms {
            self.replay_stagger_ms = v;
        }
    }

    /// Resolve the reduced-motion policy against the host preference.
    #[inline]
    pub fn reduce_motion(&self, host_prefers_reduced: bool) -> bool {
        match self.reduced_motion {
            ReducedMotion::Auto => host_prefers_reduced,
            ReducedMotion::Always => true,
            ReducedMotion::Never => false,
        }
    }
}

/// Partial update for [`GlobalConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigPatch {
    pub threshold: Option<f64>,
    pub root_margin: Option<String>,
    pub once: Option<bool>,
    pub duration: Option<String>,
    pub delay: Option<String>,
    pub easing: Option<String>,
    pub debug: Option<bool>,
    pub reduced_motion: Option<ReducedMotion>,
    pub attribute: Option<String>,
    pub default_effect: Option<String>,
    pub strict: Option<bool>,
    pub replay_stagger_ms: Option<f64>,
}

impl ConfigPatch {
    pub fn from_json(json: &str) -> RevealResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| RevealError::configuration(format!("invalid config patch: {e}")))
    }
}
