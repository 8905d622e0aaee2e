//! Per-element configuration: parsing of the configuration text and resolution against the
//! registry and global defaults.
//!
//! Text form: comma-separated tokens, each either a bare effect name or `key=value`.
//! `slideUp, duration=300ms, easing=cubic-bezier(0.2, 0, 0, 1), stroke.color=red`

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GlobalConfig;
use crate::effects::EffectRegistry;
use crate::error::{RevealError, RevealResult};
use crate::host::ObserveGeometry;
use crate::timing::{parse_time_ms, Easing};

/// Parameter value: a flat string or a named group of strings (`group.key=value`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Group(IndexMap<String, String>),
}

impl ParamValue {
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Group(_) => None,
        }
    }
}

/// Effect parameters in declaration order.
pub type Params = IndexMap<String, ParamValue>;

/// Unresolved configuration as written on the element (or passed as a per-call override).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawConfig {
    /// Bare tokens in order of appearance.
    pub bare: Vec<String>,
    pub duration: Option<String>,
    pub delay: Option<String>,
    pub easing: Option<String>,
    pub once: Option<String>,
    pub threshold: Option<String>,
    pub root_margin: Option<String>,
    pub params: Params,
}

impl RawConfig {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Tokenize configuration text. Never fails; values are validated by [`resolve`].
pub fn parse(text: &str) -> RawConfig {
    let mut raw = RawConfig::default();
    for token in split_top_level(text) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let Some((key, value)) = token.split_once('=') else {
            raw.bare.push(token.to_string());
            continue;
        };
        let key = key.trim();
        let value = value.trim().to_string();
        if key.is_empty() {
            debug!("ignoring token '{}' with empty key", token);
            continue;
        }
        match key {
            "duration" => raw.duration = Some(value),
            "delay" => raw.delay = Some(value),
            "easing" => raw.easing = Some(value),
            "once" => raw.once = Some(value),
            "threshold" => raw.threshold = Some(value),
            "rootMargin" => raw.root_margin = Some(value),
            _ => match key.split_once('.') {
                Some((group, name)) if !group.is_empty() && !name.is_empty() => {
                    let entry = raw
                        .params
                        .entry(group.to_string())
                        .or_insert_with(|| ParamValue::Group(IndexMap::new()));
                    if let ParamValue::Text(_) = entry {
                        *entry = ParamValue::Group(IndexMap::new());
                    }
                    if let ParamValue::Group(map) = entry {
                        map.insert(name.to_string(), value);
                    }
                }
                _ => {
                    raw.params.insert(key.to_string(), ParamValue::Text(value));
                }
            },
        }
    }
    raw
}

// Commas inside parentheses belong to the value: `easing=cubic-bezier(0.4, 0, 0.2, 1)`.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Case-insensitive boolean coercion (`true/false/yes/no/1/0/on/off`).
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Fully resolved settings for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementConfig {
    pub effect_type: String,
    /// Time string as written (`"300ms"`, `"0.5s"`)
    pub duration: String,
    /// Time string as written (`"0s"`)
    pub delay: String,
    pub easing: Easing,
    /// Element-level trigger-once flag; `None` defers to the global setting.
    pub once: Option<bool>,
    pub threshold: f64,
    pub root_margin: String,
    pub params: Params,
    /// Copied from the registry entry.
    pub uses_frame_sampling: bool,
}

impl Default for ElementConfig {
    fn default() -> Self {
        Self {
            effect_type: "fadeIn".to_string(),
            duration: "0.5s".to_string(),
            delay: "0s".to_string(),
            easing: Easing::default(),
            once: None,
            threshold: 0.2,
            root_margin: "0px".to_string(),
            params: Params::new(),
            uses_frame_sampling: false,
        }
    }
}

struct Picked {
    name: String,
    shorthand_duration: Option<String>,
    consumed_key: Option<String>,
}

fn pick_effect(
    raw: &RawConfig,
    registry: &EffectRegistry,
    strict: bool,
) -> RevealResult<Option<Picked>> {
    let mut picked = None;
    for token in &raw.bare {
        if registry.contains(token) {
            if picked.is_none() {
                picked = Some(Picked {
                    name: token.clone(),
                    shorthand_duration: None,
                    consumed_key: None,
                });
            }
        } else if strict {
            return Err(RevealError::unknown_effect(token.as_str()));
        } else {
            warn!("ignoring unknown effect '{}'", token);
        }
    }
    if picked.is_some() {
        return Ok(picked);
    }
    // Shorthand: `slideUp=300ms`
    Ok(raw
        .params
        .iter()
        .find(|(key, _)| registry.contains(key))
        .map(|(key, value)| Picked {
            name: key.clone(),
            shorthand_duration: value
                .as_text()
                .filter(|v| parse_time_ms(v).is_ok())
                .map(str::to_string),
            consumed_key: Some(key.clone()),
        }))
}

// Validated, then kept as written; `duration_ms`/`delay_ms` convert on demand.
fn checked_time(value: &str) -> RevealResult<String> {
    parse_time_ms(value)?;
    Ok(value.trim().to_string())
}

/// Resolve raw configuration against the registry and global defaults.
pub fn resolve(
    raw: &RawConfig,
    registry: &EffectRegistry,
    defaults: &GlobalConfig,
) -> RevealResult<ElementConfig> {
    let picked = match pick_effect(raw, registry, defaults.strict)? {
        Some(picked) => picked,
        None => {
            if !registry.contains(&defaults.default_effect) {
                return Err(RevealError::configuration(format!(
                    "no effect named and default effect '{}' is not registered",
                    defaults.default_effect
                )));
            }
            debug!("no effect named; using '{}'", defaults.default_effect);
            Picked {
                name: defaults.default_effect.clone(),
                shorthand_duration: None,
                consumed_key: None,
            }
        }
    };
    let mut config = ElementConfig {
        effect_type: String::new(),
        duration: checked_time(&defaults.duration)?,
        delay: checked_time(&defaults.delay)?,
        easing: Easing::parse(&defaults.easing),
        once: None,
        threshold: defaults.threshold,
        root_margin: defaults.root_margin.clone(),
        params: Params::new(),
        uses_frame_sampling: false,
    };
    config.merge(raw, Some(picked), registry, defaults.strict)?;
    Ok(config)
}

/// Parse and resolve in one step.
pub fn resolve_text(
    text: &str,
    registry: &EffectRegistry,
    defaults: &GlobalConfig,
) -> RevealResult<ElementConfig> {
    resolve(&parse(text), registry, defaults)
}

impl ElementConfig {
    /// Copy of this configuration with per-call overrides applied.
    pub fn with_overrides(
        &self,
        raw: &RawConfig,
        registry: &EffectRegistry,
        defaults: &GlobalConfig,
    ) -> RevealResult<Self> {
        let mut config = self.clone();
        let picked = pick_effect(raw, registry, defaults.strict)?;
        config.merge(raw, picked, registry, defaults.strict)?;
        Ok(config)
    }

    fn merge(
        &mut self,
        raw: &RawConfig,
        picked: Option<Picked>,
        registry: &EffectRegistry,
        strict: bool,
    ) -> RevealResult<()> {
        let mut shorthand_duration = None;
        let mut consumed_key = None;
        if let Some(picked) = picked {
            self.effect_type = picked.name;
            shorthand_duration = picked.shorthand_duration;
            consumed_key = picked.consumed_key;
        }
        let definition = registry
            .lookup(&self.effect_type)
            .ok_or_else(|| RevealError::unknown_effect(self.effect_type.as_str()))?;
        self.uses_frame_sampling = definition.uses_frame_sampling;

        if let Some(duration) = raw.duration.as_deref().or(shorthand_duration.as_deref()) {
            self.duration = checked_time(duration)?;
        }
        if let Some(delay) = &raw.delay {
            self.delay = checked_time(delay)?;
        }
        if let Some(easing) = &raw.easing {
            self.easing = Easing::parse(easing);
        }
        if let Some(once) = &raw.once {
            match parse_flag(once) {
                Some(flag) => self.once = Some(flag),
                None => {
                    warn!("unrecognised once value '{}'", once);
                    self.once = None;
                }
            }
        }
        if let Some(threshold) = &raw.threshold {
            let value: f64 = threshold.trim().parse().map_err(|_| {
                RevealError::configuration(format!("invalid threshold '{threshold}'"))
            })?;
            if !(0.0..=1.0).contains(&value) {
                return Err(RevealError::configuration(format!(
                    "threshold {value} outside [0, 1]"
                )));
            }
            self.threshold = value;
        }
        if let Some(margin) = &raw.root_margin {
            self.root_margin = margin.clone();
        }
        for (key, value) in &raw.params {
            if consumed_key.as_deref() == Some(key.as_str()) {
                continue;
            }
            if strict && !definition.accepts_param(key) {
                return Err(RevealError::configuration(format!(
                    "effect '{}' does not accept parameter '{}'",
                    self.effect_type, key
                )));
            }
            self.params.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    /// Duration in milliseconds.
    #[inline]
    pub fn duration_ms(&self) -> f64 {
        parse_time_ms(&self.duration).unwrap_or(0.0)
    }

    /// Delay in milliseconds.
    #[inline]
    pub fn delay_ms(&self) -> f64 {
        parse_time_ms(&self.delay).unwrap_or(0.0)
    }

    #[inline]
    pub fn total_ms(&self) -> f64 {
        self.duration_ms() + self.delay_ms()
    }

    /// Copy with zero duration and delay, used to jump straight to the end state.
    pub fn immediate(&self) -> Self {
        Self {
            duration: "0ms".to_string(),
            delay: "0ms".to_string(),
            ..self.clone()
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(ParamValue::as_text)
    }

    /// Numeric parameter; trailing units are ignored (`"40px"` → 40).
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.param(key).and_then(leading_number)
    }

    pub fn param_bool(&self, key: &str) -> Option<bool> {
        self.param(key).and_then(parse_flag)
    }

    pub fn group(&self, name: &str) -> Option<&IndexMap<String, String>> {
        match self.params.get(name) {
            Some(ParamValue::Group(map)) => Some(map),
            _ => None,
        }
    }

    pub fn geometry(&self) -> ObserveGeometry {
        ObserveGeometry {
            threshold: self.threshold,
            root_margin: self.root_margin.clone(),
        }
    }
}

fn leading_number(value: &str) -> Option<f64> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    value[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
