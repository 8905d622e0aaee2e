//! Text effects. The original markup is kept in [`ORIGINAL_ATTR`] and every frame re-renders
//! from it, so a reset mid-animation restores the untouched content.

use super::{local_progress, staggered, LETTER_STAGGER_MS, WORD_STAGGER_MS};
use crate::element::ElementConfig;
use crate::error::EffectResult;
use crate::host::Paintable;
use crate::segment::{render, segment, unit_count, Segment, SegmentMode};

/// Target attribute holding the pre-animation markup.
pub const ORIGINAL_ATTR: &str = "data-reveal-original";

const CURSOR: &str = "<span class=\"reveal-cursor\">|</span>";
const DEFAULT_RISE_PX: f64 = 20.0;

/// Store the current markup unless a previous cycle already did.
fn remember_original(target: &mut dyn Paintable) -> String {
    match target.attribute(ORIGINAL_ATTR) {
        Some(original) => original,
        None => {
            let original = target.content();
            target.set_attribute(ORIGINAL_ATTR, &original);
            original
        }
    }
}

fn original(target: &mut dyn Paintable) -> String {
    target
        .attribute(ORIGINAL_ATTR)
        .unwrap_or_else(|| target.content())
}

fn finish(target: &mut dyn Paintable) {
    let original = original(target);
    target.set_content(&original);
    target.remove_attribute(ORIGINAL_ATTR);
}

pub(crate) fn typewriter_initial(
    target: &mut dyn Paintable,
    config: &ElementConfig,
) -> EffectResult<()> {
    let original = remember_original(target);
    let segments = segment(&original, SegmentMode::Letters);
    target.set_content(&typed(&segments, 0, config.param_bool("cursor").unwrap_or(false)));
    Ok(())
}

// Markup is kept whole; only the first `shown` letters (and the spaces between them) appear.
fn typed(segments: &[Segment], shown: usize, cursor: bool) -> String {
    let mut out = String::new();
    let mut seen = 0;
    for seg in segments {
        match seg {
            Segment::Unit(text) => {
                if seen < shown {
                    out.push_str(text);
                }
                seen += 1;
            }
            Segment::Space(text) => {
                if seen < shown {
                    out.push_str(text);
                }
            }
            Segment::Markup(text) => out.push_str(text),
        }
    }
    if cursor {
        out.push_str(CURSOR);
    }
    out
}

pub(crate) fn typewriter_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    progress: Option<f64>,
) -> EffectResult<bool> {
    let t = local_progress(config, progress.unwrap_or(1.0));
    if t >= 1.0 {
        finish(target);
        return Ok(true);
    }
    let original = original(target);
    let segments = segment(&original, SegmentMode::Letters);
    let shown = (t * unit_count(&segments) as f64).floor() as usize;
    let cursor = config.param_bool("cursor").unwrap_or(false);
    target.set_content(&typed(&segments, shown, cursor));
    Ok(false)
}

fn split_initial(target: &mut dyn Paintable, mode: SegmentMode, hidden: &str) {
    let original = remember_original(target);
    let segments = segment(&original, mode);
    target.set_content(&render(&segments, |_, _| hidden.to_string()));
}

pub(crate) fn letters_initial(
    target: &mut dyn Paintable,
    _config: &ElementConfig,
) -> EffectResult<()> {
    split_initial(target, SegmentMode::Letters, "opacity: 0");
    Ok(())
}

pub(crate) fn letter_fade_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    progress: Option<f64>,
) -> EffectResult<bool> {
    let t = local_progress(config, progress.unwrap_or(1.0));
    if t >= 1.0 {
        finish(target);
        return Ok(true);
    }
    let original = original(target);
    let segments = segment(&original, SegmentMode::Letters);
    let count = unit_count(&segments);
    let duration = config.duration_ms();
    let html = render(&segments, |i, _| {
        let eased = config
            .easing
            .apply(staggered(i, count, duration, LETTER_STAGGER_MS, t));
        format!("opacity: {eased:.3}")
    });
    target.set_content(&html);
    Ok(false)
}

pub(crate) fn words_initial(
    target: &mut dyn Paintable,
    config: &ElementConfig,
) -> EffectResult<()> {
    let distance = config.param_f64("distance").unwrap_or(DEFAULT_RISE_PX);
    split_initial(
        target,
        SegmentMode::Words,
        &format!("display: inline-block; opacity: 0; transform: translateY({distance}px)"),
    );
    Ok(())
}

pub(crate) fn word_rise_animate(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    progress: Option<f64>,
) -> EffectResult<bool> {
    let t = local_progress(config, progress.unwrap_or(1.0));
    if t >= 1.0 {
        finish(target);
        return Ok(true);
    }
    let distance = config.param_f64("distance").unwrap_or(DEFAULT_RISE_PX);
    let original = original(target);
    let segments = segment(&original, SegmentMode::Words);
    let count = unit_count(&segments);
    let duration = config.duration_ms();
    let html = render(&segments, |i, _| {
        let eased = config
            .easing
            .apply(staggered(i, count, duration, WORD_STAGGER_MS, t));
        format!(
            "display: inline-block; opacity: {:.3}; transform: translateY({:.2}px)",
            eased,
            distance * (1.0 - eased)
        )
    });
    target.set_content(&html);
    Ok(false)
}
