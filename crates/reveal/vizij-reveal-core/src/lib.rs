//! Vizij Reveal Core (host-agnostic)
//!
//! Declarative scroll-reveal animations. Elements carry a configuration string
//! (`data-reveal="slideUp,duration=300ms"`); the system resolves it against a registry of
//! named effects, plays the effect when the element becomes visible (or on demand), and
//! reports lifecycle notifications back through the host.
//!
//! The crate never touches a real document: hosts implement the traits in [`host`] and call
//! [`Reveal::tick`], [`Reveal::on_visibility`] and [`Reveal::on_transition_end`] from their
//! event loop. [`headless::HeadlessHost`] is an in-memory host for tests.

// Lifecycle logging: `info` when the system runs with `debug` enabled, `debug` otherwise.
macro_rules! lifecycle {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

pub mod completion;
pub mod config;
pub mod effects;
pub mod element;
pub mod error;
pub mod events;
pub mod headless;
pub mod host;
pub mod ids;
pub mod reveal;
pub mod scheduler;
pub mod segment;
pub mod timing;
pub mod trigger;

// Re-exports for consumers (adapters)
pub use completion::{Completion, PlayHandle, PlayOutcome, Resolver};
pub use config::{ConfigPatch, GlobalConfig, ReducedMotion};
pub use effects::{AnimateFn, EffectDefinition, EffectMeta, EffectRegistry, InitialStateFn};
pub use element::{ElementConfig, ParamValue, Params, RawConfig};
pub use error::{EffectFault, EffectResult, RevealError, RevealResult};
pub use events::{EventType, RevealEvent};
pub use host::{
    Clock, Document, FrameDriver, Host, ManualClock, ObserveGeometry, Paintable, Size,
    SystemClock, VisibilityChange, VisibilityNotifier,
};
pub use ids::{BatchId, ElementId, NotifierHandle};
pub use reveal::{PlayTarget, ReplayReport, Reveal};
pub use scheduler::{Phase, TRANSITION_SAFETY_MARGIN_MS};
pub use timing::{parse_time_ms, Easing};
