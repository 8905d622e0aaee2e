mod common;

use approx::assert_relative_eq;
use common::{run_for, system};
use vizij_reveal::headless::HeadlessElement;
use vizij_reveal::{
    EffectDefinition, EffectResult, ElementConfig, EventType, GlobalConfig, Paintable, Phase,
    PlayOutcome, ReducedMotion, VisibilityChange,
};

fn echo_initial(target: &mut dyn Paintable, _config: &ElementConfig) -> EffectResult<()> {
    target.set_style("opacity", "0");
    Ok(())
}

// Writes raw progress so tests can observe exactly what the scheduler sampled.
fn echo_animate(
    target: &mut dyn Paintable,
    _config: &ElementConfig,
    progress: Option<f64>,
) -> EffectResult<bool> {
    target.set_style("opacity", &progress.unwrap_or(1.0).to_string());
    Ok(false)
}

fn progress_echo() -> EffectDefinition {
    EffectDefinition::frame_sampled(echo_animate).with_initial_state(echo_initial)
}

#[test]
fn slide_up_scenario() {
    let (mut reveal, clock, mut host) = system(GlobalConfig::default());
    let el = host.add(HeadlessElement::new("div").with_reveal("slideUp,duration=300ms,delay=0s"));
    assert_eq!(reveal.init(&mut host), 1);
    let config = reveal.config_for(el).unwrap();
    assert_eq!(config.effect_type, "slideUp");
    assert_eq!(config.duration, "300ms");
    assert_eq!(config.delay, "0s");
    assert!(!config.uses_frame_sampling);
    assert_eq!(host.style(el, "opacity"), Some("0"));
    assert_eq!(host.style(el, "transform"), Some("translateY(30px)"));

    let handle = reveal.play(&mut host, el, None);
    let events = host.events_for(el);
    let start = events[0];
    assert_eq!(start.kind, EventType::Start);
    assert_eq!(start.effect_type, "slideUp");
    assert_eq!(start.duration_ms, 300.0);
    assert_eq!(start.delay_ms, 0.0);
    assert_eq!(host.style(el, "opacity"), Some("1"));
    assert_eq!(host.style(el, "transform"), Some("translateY(0px)"));
    assert_eq!(
        host.style(el, "transition"),
        Some("opacity 300ms ease-out 0ms, transform 300ms ease-out 0ms")
    );
    assert_eq!(reveal.phase(el), Phase::Playing);
    assert_eq!(reveal.next_deadline(), Some(350.0));

    clock.advance(300.0);
    assert!(reveal.on_transition_end(&mut host, el));
    assert_eq!(handle.outcome(), Some(PlayOutcome::Completed));
    assert_eq!(reveal.phase(el), Phase::Completed);

    run_for(&mut reveal, &clock, &mut host, 100.0);
    let kinds: Vec<EventType> = host.events_for(el).iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventType::Start, EventType::Complete]);
}

#[test]
fn at_most_one_context_per_element() {
    let (mut reveal, _clock, mut host) = system(GlobalConfig::default());
    let a = host.add(HeadlessElement::new("div").with_reveal("fadeIn"));
    let b = host.add(HeadlessElement::new("div").with_reveal("typewriter").with_content("abc"));
    reveal.init(&mut host);
    for _ in 0..3 {
        reveal.play(&mut host, a, None);
        reveal.play(&mut host, b, None);
    }
    assert_eq!(reveal.active_count(), 2);
    assert!(reveal.is_animating(a));
    assert!(reveal.is_animating(b));
}

#[test]
fn reentrant_play_abandons_previous_handle() {
    let (mut reveal, clock, mut host) = system(GlobalConfig::default());
    let el = host.add(HeadlessElement::new("div").with_reveal("fadeIn,duration=300ms"));
    reveal.init(&mut host);

    let first = reveal.play(&mut host, el, None);
    clock.advance(100.0);
    let second = reveal.play(&mut host, el, None);
    assert_eq!(first.outcome(), Some(PlayOutcome::Abandoned));
    assert!(!second.is_settled());

    run_for(&mut reveal, &clock, &mut host, 400.0);
    assert_eq!(second.outcome(), Some(PlayOutcome::Completed));
    assert_eq!(first.outcome(), Some(PlayOutcome::Abandoned));
    let completes = host
        .events_for(el)
        .iter()
        .filter(|e| e.kind == EventType::Complete)
        .count();
    assert_eq!(completes, 1);
}

#[test]
fn frame_effect_samples_progress_and_completes_at_one() {
    let (mut reveal, clock, mut host) = system(GlobalConfig::default());
    reveal.register_effect("echo", progress_echo()).unwrap();
    let el = host.add(HeadlessElement::new("div").with_reveal("echo,duration=1000ms"));
    reveal.init(&mut host);

    let handle = reveal.play(&mut host, el, None);
    assert!(host.frames_running());
    clock.advance(500.0);
    reveal.tick(&mut host);
    let mid: f64 = host.style(el, "opacity").unwrap().parse().unwrap();
    assert!(mid > 0.0 && mid < 1.0);
    assert_relative_eq!(mid, 0.5);
    assert!(!handle.is_settled());

    clock.advance(600.0);
    reveal.tick(&mut host);
    assert_eq!(host.style(el, "opacity"), Some("1"));
    assert_eq!(handle.outcome(), Some(PlayOutcome::Completed));
    assert!(!host.frames_running());
}

#[test]
fn delay_holds_frame_effects_at_start() {
    let (mut reveal, clock, mut host) = system(GlobalConfig::default());
    let el = host.add(
        HeadlessElement::new("path")
            .with_size(50.0, 50.0)
            .with_reveal("drawStroke,duration=200ms,delay=200ms,easing=linear"),
    );
    reveal.init(&mut host);
    reveal.play(&mut host, el, None);
    clock.advance(100.0);
    reveal.tick(&mut host);
    assert_eq!(host.style(el, "stroke-dashoffset"), Some("200.00"));
    clock.advance(200.0);
    reveal.tick(&mut host);
    assert_eq!(host.style(el, "stroke-dashoffset"), Some("100.00"));
}

#[test]
fn reset_then_play_starts_from_fresh_initial_state() {
    let (mut reveal, clock, mut host) = system(GlobalConfig::default());
    let text = host.add(
        HeadlessElement::new("p")
            .with_reveal("letterFade,duration=200ms")
            .with_content("Hello <em>world</em>"),
    );
    let slide = host.add(HeadlessElement::new("div").with_reveal("slideLeft,distance=50px"));
    reveal.init(&mut host);
    let fresh_text = host.element(text).unwrap().content();
    let fresh_slide = (
        host.style(slide, "opacity").map(str::to_string),
        host.style(slide, "transform").map(str::to_string),
    );

    let a = reveal.play(&mut host, text, None);
    let b = reveal.play(&mut host, slide, None);
    run_for(&mut reveal, &clock, &mut host, 600.0);
    assert!(a.outcome().unwrap().is_completed());
    assert!(b.outcome().unwrap().is_completed());
    assert_eq!(host.element(text).unwrap().content(), "Hello <em>world</em>");

    assert_eq!(reveal.reset(&mut host, "p, div").unwrap(), 2);
    assert_eq!(host.element(text).unwrap().content(), fresh_text);
    assert_eq!(
        (
            host.style(slide, "opacity").map(str::to_string),
            host.style(slide, "transform").map(str::to_string),
        ),
        fresh_slide
    );
    assert_eq!(host.style(slide, "transition"), Some("none"));
    assert_eq!(reveal.phase(slide), Phase::InitialStateApplied);

    // The reset already applied the initial state; play must not apply it again.
    reveal.play(&mut host, text, None);
    assert_eq!(host.element(text).unwrap().content(), fresh_text);
    let resets = host
        .events()
        .iter()
        .filter(|e| e.kind == EventType::Reset)
        .count();
    assert_eq!(resets, 2);
}

#[test]
fn frame_effect_played_right_after_reset_gets_its_transition_back() {
    let (mut reveal, clock, mut host) = system(GlobalConfig::default());
    let el = host.add(
        HeadlessElement::new("p")
            .with_reveal("typewriter,duration=100ms")
            .with_content("hello")
            .with_style("transition", "color 1s"),
    );
    reveal.init(&mut host);
    reveal.reset(&mut host, el).unwrap();
    assert_eq!(host.style(el, "transition"), Some("none"));

    let handle = reveal.play(&mut host, el, None);
    assert_eq!(host.style(el, "transition"), Some("color 1s"));
    run_for(&mut reveal, &clock, &mut host, 500.0);
    assert!(handle.outcome().unwrap().is_completed());
    assert_eq!(host.style(el, "transition"), Some("color 1s"));
    assert_eq!(host.element(el).unwrap().content(), "hello");
}

#[test]
fn reset_during_play_abandons() {
    let (mut reveal, clock, mut host) = system(GlobalConfig::default());
    let el = host.add(HeadlessElement::new("p").with_reveal("typewriter").with_content("abcdef"));
    reveal.init(&mut host);
    let handle = reveal.play(&mut host, el, None);
    clock.advance(250.0);
    reveal.tick(&mut host);
    assert_eq!(host.element(el).unwrap().content(), "abc");
    reveal.reset(&mut host, el).unwrap();
    assert_eq!(handle.outcome(), Some(PlayOutcome::Abandoned));
    assert_eq!(host.element(el).unwrap().content(), "");
    assert!(!reveal.is_animating(el));
}

#[test]
fn detached_element_is_dropped_without_completion() {
    let (mut reveal, clock, mut host) = system(GlobalConfig::default());
    let el = host.add(HeadlessElement::new("p").with_reveal("wordRise").with_content("a b c"));
    reveal.init(&mut host);
    let handle = reveal.play(&mut host, el, None);
    host.detach(el);
    run_for(&mut reveal, &clock, &mut host, 32.0);
    assert_eq!(handle.outcome(), Some(PlayOutcome::Abandoned));
    assert_eq!(reveal.phase(el), Phase::Abandoned);
    assert_eq!(reveal.active_count(), 0);
}

#[test]
fn reduced_motion_follows_host_preference() {
    let (mut reveal, _clock, mut host) = system(GlobalConfig::default());
    host.reduced_motion = true;
    let el = host.add(HeadlessElement::new("span").with_reveal("countUp,to=42,suffix=%"));
    reveal.init(&mut host);
    let handle = reveal.play(&mut host, el, None);
    assert!(handle.outcome().unwrap().is_completed());
    assert_eq!(host.element(el).unwrap().content(), "42%");
    assert!(!host.frames_running());

    let config = GlobalConfig {
        reduced_motion: ReducedMotion::Never,
        ..GlobalConfig::default()
    };
    let (mut animated, _clock, mut host) = system(config);
    host.reduced_motion = true;
    let el = host.add(HeadlessElement::new("span").with_reveal("countUp,to=42"));
    animated.init(&mut host);
    let handle = animated.play(&mut host, el, None);
    assert!(!handle.is_settled());
    assert!(host.frames_running());
}

#[test]
fn visibility_once_false_replays_on_every_enter() {
    let (mut reveal, clock, mut host) = system(GlobalConfig::default());
    let el = host.add(HeadlessElement::new("div").with_reveal("fadeIn,once=false,duration=100ms"));
    let geometry_el = host.add(
        HeadlessElement::new("div").with_reveal("fadeIn,threshold=0.75,rootMargin=10px 0px"),
    );
    reveal.init(&mut host);
    let geometry = host.geometry_for(geometry_el).unwrap();
    assert_eq!(geometry.threshold, 0.75);
    assert_eq!(geometry.root_margin, "10px 0px");

    for _ in 0..2 {
        let handle = reveal
            .on_visibility(&mut host, el, VisibilityChange::Enter)
            .expect("play triggered");
        run_for(&mut reveal, &clock, &mut host, 200.0);
        assert!(handle.outcome().unwrap().is_completed());
        reveal.on_visibility(&mut host, el, VisibilityChange::Exit);
    }
    assert!(reveal.is_observed(el));
    let starts = host
        .events_for(el)
        .iter()
        .filter(|e| e.kind == EventType::Start)
        .count();
    assert_eq!(starts, 2);
}

#[test]
fn global_once_false_keeps_bindings() {
    let config = GlobalConfig {
        once: false,
        ..GlobalConfig::default()
    };
    let (mut reveal, _clock, mut host) = system(config);
    let el = host.add(HeadlessElement::new("div").with_reveal("zoomIn"));
    reveal.init(&mut host);
    assert!(reveal
        .on_visibility(&mut host, el, VisibilityChange::Enter)
        .is_some());
    assert!(host.is_observed(el));
}

#[test]
fn events_serialize_for_hosts() {
    let (mut reveal, _clock, mut host) = system(GlobalConfig::default());
    let el = host.add(HeadlessElement::new("div").with_reveal("blurIn,duration=0.25s,delay=100"));
    reveal.init(&mut host);
    reveal.play(&mut host, el, None);
    let json = host.events()[0].to_json();
    assert_eq!(json["type"], "reveal:start");
    assert_eq!(json["detail"]["effectType"], "blurIn");
    assert_eq!(json["detail"]["duration"], 250.0);
    assert_eq!(json["detail"]["delay"], 100.0);
}

#[test]
fn debug_config_promotes_lifecycle_logging() {
    let config = GlobalConfig {
        debug: true,
        ..GlobalConfig::default()
    };
    let (mut reveal, clock, mut host) = system(config);
    let el = host.add(HeadlessElement::new("div").with_reveal("flipX"));
    reveal.init(&mut host);
    let handle = reveal.play(&mut host, el, None);
    run_for(&mut reveal, &clock, &mut host, 600.0);
    assert!(handle.outcome().unwrap().is_completed());
}
