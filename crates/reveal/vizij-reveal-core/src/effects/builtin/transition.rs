//! Transition-driven effects. Variants sharing a shape dispatch on `config.effect_type`.

use super::declare_transition;
use crate::element::ElementConfig;
use crate::error::{EffectFault, EffectResult};
use crate::host::Paintable;

const DEFAULT_DISTANCE_PX: f64 = 30.0;
const DEFAULT_BLUR_PX: f64 = 10.0;
const FLIP_PERSPECTIVE: &str = "perspective(600px)";

fn num(value: f64) -> String {
    // `-0` is valid CSS but reads badly in snapshots.
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value}")
}

pub(crate) fn fade_initial(target: &mut dyn Paintable, config: &ElementConfig) -> EffectResult<()> {
    let start = if config.effect_type == "fadeOut" { "1" } else { "0" };
    target.set_style("opacity", start);
    Ok(())
}

pub(crate) fn fade_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    _progress: Option<f64>,
) -> EffectResult<bool> {
    let end = if config.effect_type == "fadeOut" { "0" } else { "1" };
    declare_transition(target, config, &["opacity"]);
    target.set_style("opacity", end);
    Ok(true)
}

fn slide_offset(config: &ElementConfig) -> (char, f64) {
    let distance = config.param_f64("distance").unwrap_or(DEFAULT_DISTANCE_PX);
    match config.effect_type.as_str() {
        "slideDown" => ('Y', -distance),
        "slideLeft" => ('X', distance),
        "slideRight" => ('X', -distance),
        _ => ('Y', distance),
    }
}

pub(crate) fn slide_initial(
    target: &mut dyn Paintable,
    config: &ElementConfig,
) -> EffectResult<()> {
    let (axis, offset) = slide_offset(config);
    target.set_style("opacity", "0");
    target.set_style("transform", &format!("translate{axis}({}px)", num(offset)));
    Ok(())
}

pub(crate) fn slide_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    _progress: Option<f64>,
) -> EffectResult<bool> {
    let (axis, _) = slide_offset(config);
    declare_transition(target, config, &["opacity", "transform"]);
    target.set_style("opacity", "1");
    target.set_style("transform", &format!("translate{axis}(0px)"));
    Ok(true)
}

pub(crate) fn zoom_initial(target: &mut dyn Paintable, config: &ElementConfig) -> EffectResult<()> {
    let fallback = if config.effect_type == "zoomOut" { 1.2 } else { 0.8 };
    let scale = config.param_f64("scale").unwrap_or(fallback);
    if scale < 0.0 {
        return Err(EffectFault::new(format!("scale {scale} is negative")));
    }
    target.set_style("opacity", "0");
    target.set_style("transform", &format!("scale({})", num(scale)));
    Ok(())
}

pub(crate) fn zoom_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    _progress: Option<f64>,
) -> EffectResult<bool> {
    declare_transition(target, config, &["opacity", "transform"]);
    target.set_style("opacity", "1");
    target.set_style("transform", "scale(1)");
    Ok(true)
}

fn flip_axis(config: &ElementConfig) -> char {
    if config.effect_type == "flipY" {
        'Y'
    } else {
        'X'
    }
}

pub(crate) fn flip_initial(target: &mut dyn Paintable, config: &ElementConfig) -> EffectResult<()> {
    let angle = config.param_f64("angle").unwrap_or(90.0);
    target.set_style("opacity", "0");
    target.set_style("backface-visibility", "hidden");
    target.set_style(
        "transform",
        &format!("{FLIP_PERSPECTIVE} rotate{}({}deg)", flip_axis(config), num(angle)),
    );
    Ok(())
}

pub(crate) fn flip_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    _progress: Option<f64>,
) -> EffectResult<bool> {
    declare_transition(target, config, &["opacity", "transform"]);
    target.set_style("opacity", "1");
    target.set_style(
        "transform",
        &format!("{FLIP_PERSPECTIVE} rotate{}(0deg)", flip_axis(config)),
    );
    Ok(true)
}

pub(crate) fn rotate_initial(
    target: &mut dyn Paintable,
    config: &ElementConfig,
) -> EffectResult<()> {
    let angle = config.param_f64("angle").unwrap_or(-180.0);
    target.set_style("opacity", "0");
    target.set_style("transform", &format!("rotate({}deg) scale(0.5)", num(angle)));
    Ok(())
}

pub(crate) fn rotate_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    _progress: Option<f64>,
) -> EffectResult<bool> {
    declare_transition(target, config, &["opacity", "transform"]);
    target.set_style("opacity", "1");
    target.set_style("transform", "rotate(0deg) scale(1)");
    Ok(true)
}

pub(crate) fn blur_initial(target: &mut dyn Paintable, config: &ElementConfig) -> EffectResult<()> {
    let blur = config.param_f64("blur").unwrap_or(DEFAULT_BLUR_PX);
    target.set_style("opacity", "0");
    target.set_style("filter", &format!("blur({}px)", num(blur)));
    Ok(())
}

pub(crate) fn blur_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    _progress: Option<f64>,
) -> EffectResult<bool> {
    declare_transition(target, config, &["opacity", "filter"]);
    target.set_style("opacity", "1");
    target.set_style("filter", "blur(0px)");
    Ok(true)
}

// inset(top right bottom left)
fn clip_start(config: &ElementConfig) -> EffectResult<&'static str> {
    match config.param("from").unwrap_or("bottom") {
        "bottom" => Ok("inset(100% 0 0 0)"),
        "top" => Ok("inset(0 0 100% 0)"),
        "left" => Ok("inset(0 100% 0 0)"),
        "right" => Ok("inset(0 0 0 100%)"),
        other => Err(EffectFault::new(format!(
            "unknown clip edge '{other}' (expected top, bottom, left or right)"
        ))),
    }
}

pub(crate) fn clip_initial(target: &mut dyn Paintable, config: &ElementConfig) -> EffectResult<()> {
    let start = clip_start(config)?;
    target.set_style("clip-path", start);
    Ok(())
}

pub(crate) fn clip_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    _progress: Option<f64>,
) -> EffectResult<bool> {
    clip_start(config)?;
    declare_transition(target, config, &["clip-path"]);
    target.set_style("clip-path", "inset(0 0 0 0)");
    Ok(true)
}
