//! Frame-sampled motion effects.

use std::f64::consts::PI;

use super::{local_progress, staggered, CHILD_STAGGER_MS};
use crate::element::ElementConfig;
use crate::error::{EffectFault, EffectResult};
use crate::host::Paintable;
use crate::timing::Easing;

const STROKE_LENGTH_ATTR: &str = "data-reveal-stroke-length";
const COUNT_TARGET_ATTR: &str = "data-reveal-count-to";
const DEFAULT_CHILD_RISE_PX: f64 = 20.0;
const DEFAULT_SHAKE_PX: f64 = 10.0;
const SHAKE_CYCLES: f64 = 4.0;

pub(crate) fn children_initial(
    target: &mut dyn Paintable,
    config: &ElementConfig,
) -> EffectResult<()> {
    let distance = config.param_f64("distance").unwrap_or(DEFAULT_CHILD_RISE_PX);
    let count = target.child_count();
    if count == 0 {
        target.set_style("opacity", "0");
        return Ok(());
    }
    for i in 0..count {
        target.set_child_style(i, "opacity", "0");
        target.set_child_style(i, "transform", &format!("translateY({distance}px)"));
    }
    Ok(())
}

pub(crate) fn children_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    progress: Option<f64>,
) -> EffectResult<bool> {
    let t = local_progress(config, progress.unwrap_or(1.0));
    let count = target.child_count();
    if count == 0 {
        target.set_style("opacity", &format!("{:.3}", config.easing.apply(t)));
        return Ok(t >= 1.0);
    }
    let distance = config.param_f64("distance").unwrap_or(DEFAULT_CHILD_RISE_PX);
    let duration = config.duration_ms();
    for i in 0..count {
        let eased = config
            .easing
            .apply(staggered(i, count, duration, CHILD_STAGGER_MS, t));
        target.set_child_style(i, "opacity", &format!("{eased:.3}"));
        target.set_child_style(
            i,
            "transform",
            &format!("translateY({:.2}px)", distance * (1.0 - eased)),
        );
    }
    Ok(t >= 1.0)
}

fn count_target(target: &dyn Paintable, config: &ElementConfig) -> EffectResult<f64> {
    if let Some(to) = config.param("to") {
        return to
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| EffectFault::new(format!("'to' is not a number: '{to}'")));
    }
    let source = target
        .attribute(COUNT_TARGET_ATTR)
        .unwrap_or_else(|| target.content());
    let cleaned: String = source
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EffectFault::new(format!("no numeric value to count to in '{source}'")))
}

fn count_text(config: &ElementConfig, value: f64) -> String {
    let decimals = config.param_f64("decimals").unwrap_or(0.0).clamp(0.0, 10.0) as usize;
    format!(
        "{}{:.*}{}",
        config.param("prefix").unwrap_or(""),
        decimals,
        value,
        config.param("suffix").unwrap_or("")
    )
}

pub(crate) fn count_initial(
    target: &mut dyn Paintable,
    config: &ElementConfig,
) -> EffectResult<()> {
    let to = count_target(target, config)?;
    target.set_attribute(COUNT_TARGET_ATTR, &to.to_string());
    let from = config.param_f64("from").unwrap_or(0.0);
    target.set_content(&count_text(config, from));
    Ok(())
}

pub(crate) fn count_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    progress: Option<f64>,
) -> EffectResult<bool> {
    let to = count_target(target, config)?;
    let from = config.param_f64("from").unwrap_or(0.0);
    let t = local_progress(config, progress.unwrap_or(1.0));
    if t >= 1.0 {
        target.set_content(&count_text(config, to));
        target.remove_attribute(COUNT_TARGET_ATTR);
        return Ok(true);
    }
    let value = from + (to - from) * config.easing.apply(t);
    target.set_content(&count_text(config, value));
    Ok(false)
}

fn stroke_length(target: &dyn Paintable, config: &ElementConfig) -> EffectResult<f64> {
    if let Some(length) = config.param_f64("length") {
        return Ok(length);
    }
    if let Some(stored) = target
        .attribute(STROKE_LENGTH_ATTR)
        .and_then(|s| s.parse::<f64>().ok())
    {
        return Ok(stored);
    }
    let size = target.size();
    let perimeter = 2.0 * (size.width + size.height);
    if perimeter > 0.0 {
        Ok(perimeter)
    } else {
        Err(EffectFault::new(
            "cannot measure stroke length; set the 'length' parameter",
        ))
    }
}

pub(crate) fn stroke_initial(
    target: &mut dyn Paintable,
    config: &ElementConfig,
) -> EffectResult<()> {
    let length = stroke_length(target, config)?;
    target.set_attribute(STROKE_LENGTH_ATTR, &length.to_string());
    target.set_style("stroke-dasharray", &format!("{length}"));
    target.set_style("stroke-dashoffset", &format!("{length}"));
    Ok(())
}

pub(crate) fn stroke_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    progress: Option<f64>,
) -> EffectResult<bool> {
    let length = stroke_length(target, config)?;
    let t = local_progress(config, progress.unwrap_or(1.0));
    let offset = length * (1.0 - config.easing.apply(t));
    target.set_style("stroke-dashoffset", &format!("{offset:.2}"));
    if t >= 1.0 {
        target.remove_attribute(STROKE_LENGTH_ATTR);
        return Ok(true);
    }
    Ok(false)
}

pub(crate) fn pop_initial(target: &mut dyn Paintable, _config: &ElementConfig) -> EffectResult<()> {
    target.set_style("opacity", "0");
    target.set_style("transform", "scale(0)");
    Ok(())
}

pub(crate) fn pop_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    progress: Option<f64>,
) -> EffectResult<bool> {
    let t = local_progress(config, progress.unwrap_or(1.0));
    // Always elastic; the configured easing would flatten the overshoot.
    let scale = Easing::OutElastic.apply(t);
    let opacity = (t * 4.0).min(1.0);
    target.set_style("opacity", &format!("{opacity:.3}"));
    target.set_style("transform", &format!("scale({scale:.4})"));
    Ok(t >= 1.0)
}

pub(crate) fn shake_initial(
    target: &mut dyn Paintable,
    _config: &ElementConfig,
) -> EffectResult<()> {
    target.set_style("transform", "translateX(0px)");
    Ok(())
}

pub(crate) fn shake_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    progress: Option<f64>,
) -> EffectResult<bool> {
    let t = local_progress(config, progress.unwrap_or(1.0));
    if t >= 1.0 {
        target.set_style("transform", "translateX(0px)");
        return Ok(true);
    }
    let intensity = config.param_f64("intensity").unwrap_or(DEFAULT_SHAKE_PX);
    let offset = intensity * (t * PI * 2.0 * SHAKE_CYCLES).sin() * (1.0 - t);
    target.set_style("transform", &format!("translateX({offset:.2}px)"));
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ParamValue;
    use crate::headless::HeadlessElement;

    fn config(effect: &str, params: &[(&str, &str)]) -> ElementConfig {
        let mut cfg = ElementConfig {
            effect_type: effect.into(),
            duration: "1000ms".into(),
            easing: Easing::Linear,
            uses_frame_sampling: true,
            ..ElementConfig::default()
        };
        for (k, v) in params {
            cfg.params.insert(k.to_string(), ParamValue::Text(v.to_string()));
        }
        cfg
    }

    #[test]
    fn count_up_reads_target_from_content() {
        let mut el = HeadlessElement::new("span").with_content("1,250");
        let cfg = config("countUp", &[("prefix", "$")]);
        count_initial(&mut el, &cfg).unwrap();
        assert_eq!(el.content(), "$0");
        assert!(!count_animate(&mut el, &cfg, Some(0.5)).unwrap());
        assert_eq!(el.content(), "$625");
        assert!(count_animate(&mut el, &cfg, Some(1.0)).unwrap());
        assert_eq!(el.content(), "$1250");
    }

    #[test]
    fn count_up_faults_without_a_number() {
        let mut el = HeadlessElement::new("span").with_content("soon");
        let err = count_initial(&mut el, &config("countUp", &[])).unwrap_err();
        assert!(err.0.contains("soon"));
        let err = count_initial(&mut el, &config("countUp", &[("to", "lots")])).unwrap_err();
        assert!(err.0.contains("lots"));
    }

    #[test]
    fn count_up_decimals() {
        let mut el = HeadlessElement::new("span");
        let cfg = config("countUp", &[("to", "2.5"), ("decimals", "2"), ("suffix", "%")]);
        count_initial(&mut el, &cfg).unwrap();
        count_animate(&mut el, &cfg, Some(1.0)).unwrap();
        assert_eq!(el.content(), "2.50%");
    }

    #[test]
    fn draw_stroke_measures_perimeter() {
        let mut el = HeadlessElement::new("path").with_size(30.0, 20.0);
        let cfg = config("drawStroke", &[]);
        stroke_initial(&mut el, &cfg).unwrap();
        assert_eq!(el.style("stroke-dashoffset").as_deref(), Some("100"));
        stroke_animate(&mut el, &cfg, Some(0.5)).unwrap();
        assert_eq!(el.style("stroke-dashoffset").as_deref(), Some("50.00"));
        assert!(stroke_animate(&mut el, &cfg, Some(1.0)).unwrap());
        assert_eq!(el.style("stroke-dashoffset").as_deref(), Some("0.00"));

        let mut empty = HeadlessElement::new("path");
        assert!(stroke_initial(&mut empty, &cfg).is_err());
    }

    #[test]
    fn stagger_children_progresses_first_child_first() {
        let mut el = HeadlessElement::new("ul").with_children(3);
        let cfg = config("staggerChildren", &[]);
        children_initial(&mut el, &cfg).unwrap();
        assert_eq!(el.child_style(2, "opacity"), Some("0"));
        children_animate(&mut el, &cfg, Some(0.3)).unwrap();
        let first: f64 = el.child_style(0, "opacity").unwrap().parse().unwrap();
        let last: f64 = el.child_style(2, "opacity").unwrap().parse().unwrap();
        assert!(first > last);
        assert!(children_animate(&mut el, &cfg, Some(1.0)).unwrap());
        assert_eq!(el.child_style(2, "transform"), Some("translateY(0.00px)"));
    }

    #[test]
    fn shake_settles_at_rest() {
        let mut el = HeadlessElement::new("div");
        let cfg = config("shake", &[("intensity", "6")]);
        shake_animate(&mut el, &cfg, Some(0.1)).unwrap();
        assert_ne!(el.style("transform").as_deref(), Some("translateX(0px)"));
        assert!(shake_animate(&mut el, &cfg, Some(1.0)).unwrap());
        assert_eq!(el.style("transform").as_deref(), Some("translateX(0px)"));
    }

    #[test]
    fn elastic_pop_ends_at_unit_scale() {
        let mut el = HeadlessElement::new("div");
        let cfg = config("elasticPop", &[]);
        pop_initial(&mut el, &cfg).unwrap();
        assert!(pop_animate(&mut el, &cfg, Some(1.0)).unwrap());
        assert_eq!(el.style("transform").as_deref(), Some("scale(1.0000)"));
    }
}
