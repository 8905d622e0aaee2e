//! Built-in effect catalogue.
//!
//! Transition effects set a start state in `initial_state` and the end state plus a
//! `transition` declaration in `animate(None)`. Frame-sampled effects compute their
//! presentation from progress on every frame.

mod motion;
mod text;
mod transition;

use crate::effects::{AnimateFn, EffectDefinition, EffectRegistry, InitialStateFn};
use crate::element::ElementConfig;
use crate::host::Paintable;
use crate::timing::format_ms;

use motion::{
    children_animate, children_initial, count_animate, count_initial, pop_animate, pop_initial,
    shake_animate, shake_initial, stroke_animate, stroke_initial,
};
use text::{
    letter_fade_animate, letters_initial, typewriter_animate, typewriter_initial,
    word_rise_animate, words_initial,
};
use transition::{
    blur_animate, blur_initial, clip_animate, clip_initial, flip_animate, flip_initial,
    fade_animate, fade_initial, rotate_animate, rotate_initial, slide_animate, slide_initial,
    zoom_animate, zoom_initial,
};

pub use text::ORIGINAL_ATTR;

/// Delay between consecutive letters in `letterFade`.
pub const LETTER_STAGGER_MS: f64 = 40.0;
/// Delay between consecutive words in `wordRise`.
pub const WORD_STAGGER_MS: f64 = 80.0;
/// Delay between consecutive children in `staggerChildren`.
pub const CHILD_STAGGER_MS: f64 = 100.0;

const AUTHOR: &str = "vizij";
const VERSION: &str = "1.0.0";

/// Register every built-in effect, transition effects first.
pub fn register_all(registry: &mut EffectRegistry) {
    for (name, definition) in catalogue() {
        if let Err(err) = registry.register(name, definition) {
            tracing::warn!("built-in effect '{}' rejected: {}", name, err);
        }
    }
}

fn transition_fx(
    initial: InitialStateFn,
    animate: AnimateFn,
    description: &str,
    params: &[&str],
) -> EffectDefinition {
    EffectDefinition::transition(animate)
        .with_initial_state(initial)
        .with_description(description)
        .with_author(AUTHOR, VERSION)
        .with_params(params)
}

fn frame_fx(
    initial: InitialStateFn,
    animate: AnimateFn,
    description: &str,
    params: &[&str],
) -> EffectDefinition {
    EffectDefinition::frame_sampled(animate)
        .with_initial_state(initial)
        .with_description(description)
        .with_author(AUTHOR, VERSION)
        .with_params(params)
}

fn catalogue() -> Vec<(&'static str, EffectDefinition)> {
    vec![
        ("fadeIn", transition_fx(fade_initial, fade_animate, "Fade from transparent", &[])),
        ("fadeOut", transition_fx(fade_initial, fade_animate, "Fade to transparent", &[])),
        ("slideUp", transition_fx(slide_initial, slide_animate, "Rise into place", &["distance"])),
        (
            "slideDown",
            transition_fx(slide_initial, slide_animate, "Drop into place", &["distance"]),
        ),
        (
            "slideLeft",
            transition_fx(slide_initial, slide_animate, "Slide in from the right", &["distance"]),
        ),
        (
            "slideRight",
            transition_fx(slide_initial, slide_animate, "Slide in from the left", &["distance"]),
        ),
        ("zoomIn", transition_fx(zoom_initial, zoom_animate, "Grow into place", &["scale"])),
        ("zoomOut", transition_fx(zoom_initial, zoom_animate, "Shrink into place", &["scale"])),
        (
            "flipX",
            transition_fx(
                flip_initial,
                flip_animate,
                "Flip around the horizontal axis",
                &["angle"],
            ),
        ),
        (
            "flipY",
            transition_fx(flip_initial, flip_animate, "Flip around the vertical axis", &["angle"]),
        ),
        ("rotateIn", transition_fx(rotate_initial, rotate_animate, "Spin into place", &["angle"])),
        ("blurIn", transition_fx(blur_initial, blur_animate, "Sharpen from a blur", &["blur"])),
        (
            "clipReveal",
            transition_fx(clip_initial, clip_animate, "Wipe in from one edge", &["from"]),
        ),
        (
            "typewriter",
            frame_fx(
                typewriter_initial,
                typewriter_animate,
                "Type out letter by letter",
                &["cursor"],
            ),
        ),
        (
            "letterFade",
            frame_fx(letters_initial, letter_fade_animate, "Fade in letter by letter", &[]),
        ),
        (
            "wordRise",
            frame_fx(
                words_initial,
                word_rise_animate,
                "Raise words one after another",
                &["distance"],
            ),
        ),
        (
            "staggerChildren",
            frame_fx(
                children_initial,
                children_animate,
                "Reveal children in sequence",
                &["distance"],
            ),
        ),
        (
            "countUp",
            frame_fx(
                count_initial,
                count_animate,
                "Count a number up to its value",
                &["from", "to", "decimals", "prefix", "suffix"],
            ),
        ),
        ("drawStroke", frame_fx(stroke_initial, stroke_animate, "Draw an outline", &["length"])),
        ("elasticPop", frame_fx(pop_initial, pop_animate, "Pop in with an elastic overshoot", &[])),
        ("shake", frame_fx(shake_initial, shake_animate, "Shake horizontally", &["intensity"])),
    ]
}

/// Map overall progress (which spans delay + duration) onto the duration window.
pub(crate) fn local_progress(config: &ElementConfig, progress: f64) -> f64 {
    if progress >= 1.0 {
        return 1.0;
    }
    let delay = config.delay_ms();
    let duration = config.duration_ms();
    let elapsed = progress.max(0.0) * (delay + duration);
    if duration <= 0.0 {
        return if elapsed >= delay { 1.0 } else { 0.0 };
    }
    ((elapsed - delay) / duration).clamp(0.0, 1.0)
}

/// Progress of unit `index` out of `count` when units start `stagger_ms` apart.
/// The stagger is compressed so the last unit still gets half of the duration.
pub(crate) fn staggered(
    index: usize,
    count: usize,
    duration_ms: f64,
    stagger_ms: f64,
    t: f64,
) -> f64 {
    if t >= 1.0 {
        return 1.0;
    }
    if duration_ms <= 0.0 || count <= 1 {
        return t.clamp(0.0, 1.0);
    }
    let gaps = (count - 1) as f64;
    let stagger = stagger_ms.min(duration_ms * 0.5 / gaps);
    let window = duration_ms - stagger * gaps;
    let start = stagger * index as f64;
    ((t * duration_ms - start) / window).clamp(0.0, 1.0)
}

/// Declare a transition over `properties` using the configured duration, easing and delay.
pub(crate) fn declare_transition(
    target: &mut dyn Paintable,
    config: &ElementConfig,
    properties: &[&str],
) {
    let duration = format_ms(config.duration_ms());
    let delay = format_ms(config.delay_ms());
    let easing = config.easing.css();
    let value = properties
        .iter()
        .map(|p| format!("{p} {duration} {easing} {delay}"))
        .collect::<Vec<_>>()
        .join(", ");
    target.set_style("transition", &value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessElement;
    use approx::assert_abs_diff_eq;

    fn config(duration: &str, delay: &str) -> ElementConfig {
        ElementConfig {
            duration: duration.into(),
            delay: delay.into(),
            ..ElementConfig::default()
        }
    }

    #[test]
    fn catalogue_registers_every_builtin() {
        let registry = EffectRegistry::with_builtins();
        assert_eq!(registry.len(), 21);
        for name in ["fadeIn", "clipReveal", "typewriter", "shake"] {
            assert!(registry.contains(name), "{name}");
        }
        assert!(!registry.lookup("slideUp").unwrap().uses_frame_sampling);
        assert!(registry.lookup("wordRise").unwrap().uses_frame_sampling);
        assert!(registry.list().all(|m| !m.description.is_empty()));
    }

    #[test]
    fn local_progress_skips_the_delay() {
        let cfg = config("300ms", "100ms");
        assert_eq!(local_progress(&cfg, 0.0), 0.0);
        assert_eq!(local_progress(&cfg, 0.25), 0.0);
        assert_abs_diff_eq!(local_progress(&cfg, 0.625), 0.5, epsilon = 1e-9);
        assert_eq!(local_progress(&cfg, 1.0), 1.0);
        assert_eq!(local_progress(&config("0ms", "0ms"), 0.0), 1.0);
    }

    #[test]
    fn stagger_orders_units_and_finishes_together() {
        let first = staggered(0, 5, 1000.0, 100.0, 0.3);
        let last = staggered(4, 5, 1000.0, 100.0, 0.3);
        assert!(first > last);
        assert_eq!(staggered(4, 5, 1000.0, 100.0, 1.0), 1.0);
        // compressed: 50 units at 100ms would not fit in 1s
        assert!(staggered(49, 50, 1000.0, 100.0, 0.99) > 0.0);
    }

    #[test]
    fn transition_declaration_lists_properties() {
        let mut el = HeadlessElement::new("div");
        declare_transition(&mut el, &config("300ms", "0ms"), &["opacity", "transform"]);
        assert_eq!(
            el.style("transition").unwrap(),
            "opacity 300ms ease-out 0ms, transform 300ms ease-out 0ms"
        );
    }
}
