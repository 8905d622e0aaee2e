#![allow(dead_code)]

use vizij_reveal::headless::HeadlessHost;
use vizij_reveal::{GlobalConfig, ManualClock, Reveal};

pub fn init_tracing() {
    let default_filter = "vizij_reveal=debug";
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Reveal system on a manual clock plus an empty headless host.
pub fn system(config: GlobalConfig) -> (Reveal, ManualClock, HeadlessHost) {
    init_tracing();
    let clock = ManualClock::new();
    let reveal = Reveal::new(config, Box::new(clock.clone()));
    (reveal, clock, HeadlessHost::new())
}

/// Advance the clock in 16ms frames for `ms` milliseconds, ticking after each frame.
pub fn run_for(reveal: &mut Reveal, clock: &ManualClock, host: &mut HeadlessHost, ms: f64) {
    let mut elapsed = 0.0;
    while elapsed < ms {
        let step = 16.0_f64.min(ms - elapsed);
        clock.advance(step);
        elapsed += step;
        reveal.tick(host);
    }
}
