//! Timing helpers:
//! - parse_time_ms / format_ms (CSS-like time strings)
//! - Easing (named curves, cubic-bezier, raw passthrough)
//! - cubic_bezier (x -> y solver used by the CSS keyword curves)

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{RevealError, RevealResult};

/// Convert a time string (`"300ms"`, `"0.5s"`, bare `"300"` = ms) into milliseconds.
pub fn parse_time_ms(input: &str) -> RevealResult<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RevealError::configuration("empty time value"));
    }
    let lower = trimmed.to_ascii_lowercase();
    let (number, scale) = if let Some(n) = lower.strip_suffix("ms") {
        (n, 1.0)
    } else if let Some(n) = lower.strip_suffix('s') {
        (n, 1000.0)
    } else {
        (lower.as_str(), 1.0)
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| RevealError::configuration(format!("invalid time value '{input}'")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(RevealError::configuration(format!(
            "time value out of range '{input}'"
        )));
    }
    Ok(value * scale)
}

/// Canonical string form for a millisecond quantity.
pub fn format_ms(ms: f64) -> String {
    if ms.fract() == 0.0 {
        format!("{}ms", ms as i64)
    } else {
        format!("{ms}ms")
    }
}

/// Named easing curves plus raw CSS timing functions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Easing {
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    EaseInOut,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InExpo,
    OutExpo,
    InOutExpo,
    InBack,
    OutBack,
    InOutBack,
    InElastic,
    OutElastic,
    InOutElastic,
    CubicBezier([f64; 4]),
    /// Unrecognised description, passed through to CSS verbatim.
    Raw(String),
}

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;
const ELASTIC_C4: f64 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f64 = (2.0 * PI) / 4.5;

impl Easing {
    /// Parse CSS keywords (`ease-out`), camelCase names (`easeOutCubic`) or `cubic-bezier(...)`.
    /// Never fails: unknown input becomes [`Easing::Raw`].
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if let Some(points) = parse_cubic_bezier(trimmed) {
            return Self::CubicBezier(points);
        }
        let key: String = trimmed
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "linear" => Self::Linear,
            "ease" => Self::Ease,
            "easein" => Self::EaseIn,
            "easeout" => Self::EaseOut,
            "easeinout" => Self::EaseInOut,
            "easeincubic" | "incubic" => Self::InCubic,
            "easeoutcubic" | "outcubic" => Self::OutCubic,
            "easeinoutcubic" | "inoutcubic" => Self::InOutCubic,
            "easeinquart" | "inquart" => Self::InQuart,
            "easeoutquart" | "outquart" => Self::OutQuart,
            "easeinoutquart" | "inoutquart" => Self::InOutQuart,
            "easeinexpo" | "inexpo" => Self::InExpo,
            "easeoutexpo" | "outexpo" => Self::OutExpo,
            "easeinoutexpo" | "inoutexpo" => Self::InOutExpo,
            "easeinback" | "inback" => Self::InBack,
            "easeoutback" | "outback" => Self::OutBack,
            "easeinoutback" | "inoutback" => Self::InOutBack,
            "easeinelastic" | "inelastic" => Self::InElastic,
            "easeoutelastic" | "outelastic" => Self::OutElastic,
            "easeinoutelastic" | "inoutelastic" => Self::InOutElastic,
            _ => Self::Raw(trimmed.to_string()),
        }
    }

    /// Map normalized time to eased progress. Input is clamped; endpoints are exact.
    pub fn apply(&self, t: f64) -> f64 {
        if t.is_nan() || t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            // Unknown curves sample like the library default.
            Self::EaseOut | Self::Raw(_) => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::CubicBezier([x1, y1, x2, y2]) => cubic_bezier(*x1, *y1, *x2, *y2, t),
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::InQuart => t.powi(4),
            Self::OutQuart => 1.0 - (1.0 - t).powi(4),
            Self::InOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Self::InExpo => 2f64.powf(10.0 * t - 10.0),
            Self::OutExpo => 1.0 - 2f64.powf(-10.0 * t),
            Self::InOutExpo => {
                if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Self::InBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Self::OutBack => {
                let u = t - 1.0;
                1.0 + BACK_C3 * u.powi(3) + BACK_C1 * u.powi(2)
            }
            Self::InOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2)
                        + 2.0)
                        / 2.0
                }
            }
            Self::InElastic => {
                -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
            }
            Self::OutElastic => {
                2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
            }
            Self::InOutElastic => {
                if t < 0.5 {
                    -(2f64.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin())
                        / 2.0
                } else {
                    (2f64.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin())
                        / 2.0
                        + 1.0
                }
            }
        }
    }

    /// CSS timing function for declarative transitions.
    /// Elastic curves have no cubic-bezier form and degrade to `ease-out`.
    pub fn css(&self) -> String {
        let bezier = |p: [f64; 4]| format!("cubic-bezier({}, {}, {}, {})", p[0], p[1], p[2], p[3]);
        match self {
            Self::Linear => "linear".to_string(),
            Self::Ease => "ease".to_string(),
            Self::EaseIn => "ease-in".to_string(),
            Self::EaseOut => "ease-out".to_string(),
            Self::EaseInOut => "ease-in-out".to_string(),
            Self::InCubic => bezier([0.32, 0.0, 0.67, 0.0]),
            Self::OutCubic => bezier([0.33, 1.0, 0.68, 1.0]),
            Self::InOutCubic => bezier([0.65, 0.0, 0.35, 1.0]),
            Self::InQuart => bezier([0.5, 0.0, 0.75, 0.0]),
            Self::OutQuart => bezier([0.25, 1.0, 0.5, 1.0]),
            Self::InOutQuart => bezier([0.76, 0.0, 0.24, 1.0]),
            Self::InExpo => bezier([0.7, 0.0, 0.84, 0.0]),
            Self::OutExpo => bezier([0.16, 1.0, 0.3, 1.0]),
            Self::InOutExpo => bezier([0.87, 0.0, 0.13, 1.0]),
            Self::InBack => bezier([0.36, 0.0, 0.66, -0.56]),
            Self::OutBack => bezier([0.34, 1.56, 0.64, 1.0]),
            Self::InOutBack => bezier([0.68, -0.6, 0.32, 1.6]),
            Self::InElastic | Self::OutElastic | Self::InOutElastic => "ease-out".to_string(),
            Self::CubicBezier(p) => bezier(*p),
            Self::Raw(raw) => raw.clone(),
        }
    }

    /// Canonical name; parses back to the same curve.
    pub fn name(&self) -> String {
        let named = match self {
            Self::Linear => "linear",
            Self::Ease => "ease",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
            Self::InCubic => "easeInCubic",
            Self::OutCubic => "easeOutCubic",
            Self::InOutCubic => "easeInOutCubic",
            Self::InQuart => "easeInQuart",
            Self::OutQuart => "easeOutQuart",
            Self::InOutQuart => "easeInOutQuart",
            Self::InExpo => "easeInExpo",
            Self::OutExpo => "easeOutExpo",
            Self::InOutExpo => "easeInOutExpo",
            Self::InBack => "easeInBack",
            Self::OutBack => "easeOutBack",
            Self::InOutBack => "easeInOutBack",
            Self::InElastic => "easeInElastic",
            Self::OutElastic => "easeOutElastic",
            Self::InOutElastic => "easeInOutElastic",
            Self::CubicBezier(_) | Self::Raw(_) => return self.css(),
        };
        named.to_string()
    }

    /// Curves whose output leaves [0, 1] between the endpoints.
    #[inline]
    pub fn overshoots(&self) -> bool {
        match self {
            Self::InBack
            | Self::OutBack
            | Self::InOutBack
            | Self::InElastic
            | Self::OutElastic
            | Self::InOutElastic => true,
            Self::CubicBezier([_, y1, _, y2]) => {
                !(0.0..=1.0).contains(y1) || !(0.0..=1.0).contains(y2)
            }
            _ => false,
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::EaseOut
    }
}

impl From<String> for Easing {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for Easing {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<Easing> for String {
    fn from(e: Easing) -> Self {
        e.name()
    }
}

fn parse_cubic_bezier(s: &str) -> Option<[f64; 4]> {
    let lower = s.to_ascii_lowercase();
    let inner = lower
        .strip_prefix("cubic-bezier(")
        .or_else(|| lower.strip_prefix("cubicbezier("))?
        .strip_suffix(')')?;
    let mut out = [0.0; 4];
    let mut count = 0;
    for part in inner.split(',') {
        if count == 4 {
            return None;
        }
        out[count] = part.trim().parse().ok()?;
        count += 1;
    }
    if count != 4 || !(0.0..=1.0).contains(&out[0]) || !(0.0..=1.0).contains(&out[2]) {
        return None;
    }
    Some(out)
}

/// Solve a CSS cubic-bezier timing curve for `x`, returning `y`.
/// Newton iterations with a bisection fallback, as browsers do.
pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;
    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample_x = |t: f64| ((ax * t + bx) * t + cx) * t;
    let sample_y = |t: f64| ((ay * t + by) * t + cy) * t;
    let slope_x = |t: f64| (3.0 * ax * t + 2.0 * bx) * t + cx;

    let mut t = x;
    for _ in 0..8 {
        let err = sample_x(t) - x;
        if err.abs() < 1e-7 {
            return sample_y(t);
        }
        let d = slope_x(t);
        if d.abs() < 1e-6 {
            break;
        }
        t -= err / d;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    t = x;
    for _ in 0..64 {
        let v = sample_x(t);
        if (v - x).abs() < 1e-7 {
            break;
        }
        if x > v {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) / 2.0;
    }
    sample_y(t)
}
