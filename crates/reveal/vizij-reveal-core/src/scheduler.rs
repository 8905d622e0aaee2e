//! Animation scheduler.
//!
//! Owns every running animation context, the shared frame set and the timer list. Contexts are
//! keyed by element, so there is at most one per element; starting another abandons the old one.
//!
//! Within a `tick`, due timers fire first (deadline order, then arming order), then the frame
//! set is sampled in insertion order.

use hashbrown::{HashMap, HashSet};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::completion::{pending, PlayHandle, PlayOutcome, Resolver};
use crate::effects::EffectDefinition;
use crate::element::ElementConfig;
use crate::error::{EffectFault, RevealError, RevealResult};
use crate::events::{EventType, RevealEvent};
use crate::host::{Clock, Host, Paintable};
use crate::ids::{BatchId, ElementId, IdAllocator};

/// Slack added to a transition's duration before the fallback timer finalizes it.
pub const TRANSITION_SAFETY_MARGIN_MS: f64 = 50.0;

/// Per-element lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Preparing,
    InitialStateApplied,
    Playing,
    Completed,
    Abandoned,
}

/// How a running context is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Branch {
    /// Sampled every frame with normalized progress.
    Frame,
    /// Applied once; finished by a transition-end signal or the fallback timer.
    Transition,
}

/// One running animation.
#[derive(Debug)]
pub struct AnimationContext {
    /// Looked up through the document on every use; absence means detached.
    pub element: ElementId,
    pub config: ElementConfig,
    pub effect: EffectDefinition,
    pub started_at: f64,
    pub active: bool,
    pub generation: u64,
    pub branch: Branch,
    resolver: Resolver<PlayOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
enum TimerKind {
    TransitionFallback { element: ElementId, generation: u64 },
    RestoreTransition { element: ElementId, previous: Option<String> },
    Replay { batch: BatchId, element: ElementId },
}

#[derive(Debug, Clone)]
struct Timer {
    deadline: f64,
    seq: u64,
    kind: TimerKind,
}

enum Step {
    Detached,
    Fault(EffectFault),
    Done,
    Running,
}

pub struct Scheduler {
    clock: Box<dyn Clock>,
    contexts: IndexMap<ElementId, AnimationContext>,
    frame_set: IndexSet<ElementId>,
    phases: HashMap<ElementId, Phase>,
    initial_applied: HashSet<ElementId>,
    timers: Vec<Timer>,
    ids: IdAllocator,
    loop_running: bool,
    verbose: bool,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("contexts", &self.contexts.len())
            .field("frame_set", &self.frame_set)
            .field("timers", &self.timers.len())
            .field("loop_running", &self.loop_running)
            .finish()
    }
}

impl Scheduler {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            contexts: IndexMap::new(),
            frame_set: IndexSet::new(),
            phases: HashMap::new(),
            initial_applied: HashSet::new(),
            timers: Vec::new(),
            ids: IdAllocator::new(),
            loop_running: false,
            verbose: false,
        }
    }

    /// Promote lifecycle logs from `debug` to `info`.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Apply the effect's initial state unless it is already applied for this cycle.
    pub fn prepare(
        &mut self,
        host: &mut dyn Host,
        element: ElementId,
        config: &ElementConfig,
        effect: &EffectDefinition,
    ) -> RevealResult<()> {
        if self.initial_applied.contains(&element) {
            return Ok(());
        }
        let target = host
            .target(element)
            .ok_or_else(|| RevealError::element_not_found(element.to_string()))?;
        if let Some(initial_state) = effect.initial_state {
            initial_state(target, config)
                .map_err(|fault| RevealError::effect_runtime(config.effect_type.as_str(), &fault))?;
        }
        self.initial_applied.insert(element);
        if !self.contexts.contains_key(&element) {
            self.phases.insert(element, Phase::InitialStateApplied);
        }
        Ok(())
    }

    /// Start `effect` on `element`. Any running context for the element is abandoned first.
    pub fn start(
        &mut self,
        host: &mut dyn Host,
        element: ElementId,
        config: ElementConfig,
        effect: &EffectDefinition,
        reduce_motion: bool,
    ) -> PlayHandle {
        let (handle, resolver) = pending();
        if self.abandon(element) {
            lifecycle!(self.verbose, "{} superseded by a new play", element);
        }
        let pending_restore = self.take_restore(element);
        self.phases.insert(element, Phase::Preparing);

        let Some(animate) = effect.animate else {
            self.phases.remove(&element);
            resolver.resolve(PlayOutcome::Failed(RevealError::invalid_effect(
                config.effect_type.as_str(),
                "definition has no animate function",
            )));
            return handle;
        };
        let Some(target) = host.target(element) else {
            self.phases.remove(&element);
            resolver.resolve(PlayOutcome::Failed(RevealError::element_not_found(
                element.to_string(),
            )));
            return handle;
        };
        // A reset's suppressed transition comes back before the effect runs.
        if let Some(previous) = pending_restore {
            restore_transition(target, previous);
        }
        if !self.initial_applied.contains(&element) {
            if let Some(initial_state) = effect.initial_state {
                if let Err(fault) = initial_state(target, &config) {
                    self.fail(element, &config.effect_type, &fault, resolver);
                    return handle;
                }
            }
            self.initial_applied.insert(element);
        }
        self.phases.insert(element, Phase::InitialStateApplied);

        host.dispatch(element, &RevealEvent::new(EventType::Start, element, &config));
        self.phases.insert(element, Phase::Playing);
        lifecycle!(
            self.verbose,
            "{} playing '{}' ({} + {})",
            element,
            config.effect_type,
            config.delay,
            config.duration
        );

        if reduce_motion {
            let step = match host.target(element) {
                None => Step::Detached,
                Some(target) => {
                    let applied = if effect.uses_frame_sampling {
                        animate(target, &config, Some(1.0))
                    } else {
                        target.flush();
                        animate(target, &config.immediate(), None)
                    };
                    match applied {
                        Ok(_) => Step::Done,
                        Err(fault) => Step::Fault(fault),
                    }
                }
            };
            match step {
                Step::Fault(fault) => self.fail(element, &config.effect_type, &fault, resolver),
                Step::Detached => {
                    self.phases.insert(element, Phase::Abandoned);
                    resolver.resolve(PlayOutcome::Abandoned);
                }
                _ => self.finish(host, element, &config, resolver),
            }
            return handle;
        }

        let now = self.clock.now_ms();
        let generation = self.ids.alloc_generation();
        let branch = if effect.uses_frame_sampling {
            Branch::Frame
        } else {
            Branch::Transition
        };

        if branch == Branch::Transition {
            let applied = match host.target(element) {
                Some(target) => {
                    target.flush();
                    animate(target, &config, None)
                }
                None => Err(EffectFault::new("target detached before transition start")),
            };
            if let Err(fault) = applied {
                self.fail(element, &config.effect_type, &fault, resolver);
                return handle;
            }
            let deadline = now + config.total_ms() + TRANSITION_SAFETY_MARGIN_MS;
            self.arm(deadline, TimerKind::TransitionFallback { element, generation });
        }

        self.contexts.insert(
            element,
            AnimationContext {
                element,
                config,
                effect: effect.clone(),
                started_at: now,
                active: true,
                generation,
                branch,
                resolver,
            },
        );
        if branch == Branch::Frame {
            self.frame_set.insert(element);
            self.ensure_loop(host);
        }
        handle
    }

    /// Advance timers and frame-sampled animations. Returns replays that fell due, in order.
    pub fn tick(&mut self, host: &mut dyn Host) -> Vec<(BatchId, ElementId)> {
        let now = self.clock.now_ms();
        let mut replays = Vec::new();

        let mut due = Vec::new();
        self.timers.retain(|t| {
            if t.deadline <= now {
                due.push(t.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.deadline.total_cmp(&b.deadline).then(a.seq.cmp(&b.seq)));
        for timer in due {
            match timer.kind {
                TimerKind::TransitionFallback {
                    element,
                    generation,
                } => {
                    let current = self
                        .contexts
                        .get(&element)
                        .is_some_and(|ctx| ctx.generation == generation);
                    if current {
                        lifecycle!(self.verbose, "{} finalized by fallback timer", element);
                        self.complete(host, element);
                    }
                }
                TimerKind::RestoreTransition { element, previous } => {
                    if let Some(target) = host.target(element) {
                        restore_transition(target, previous);
                    }
                }
                TimerKind::Replay { batch, element } => replays.push((batch, element)),
            }
        }

        let sampled: Vec<ElementId> = self.frame_set.iter().copied().collect();
        for element in sampled {
            let step = match self.contexts.get(&element) {
                None => {
                    self.frame_set.shift_remove(&element);
                    continue;
                }
                Some(ctx) => {
                    let total = ctx.config.total_ms();
                    let progress = if total <= 0.0 {
                        1.0
                    } else {
                        ((now - ctx.started_at) / total).clamp(0.0, 1.0)
                    };
                    match (host.target(element), ctx.effect.animate) {
                        (None, _) => Step::Detached,
                        (Some(_), None) => Step::Done,
                        (Some(target), Some(animate)) => {
                            match animate(target, &ctx.config, Some(progress)) {
                                Err(fault) => Step::Fault(fault),
                                Ok(done) if done || progress >= 1.0 => Step::Done,
                                Ok(_) => Step::Running,
                            }
                        }
                    }
                }
            };
            match step {
                Step::Running => {}
                Step::Done => self.complete(host, element),
                Step::Detached => {
                    lifecycle!(self.verbose, "{} detached; dropping animation", element);
                    self.abandon(element);
                }
                Step::Fault(fault) => {
                    if let Some(ctx) = self.contexts.shift_remove(&element) {
                        self.frame_set.shift_remove(&element);
                        self.fail(element, &ctx.config.effect_type, &fault, ctx.resolver);
                    }
                }
            }
        }

        if self.frame_set.is_empty() {
            if self.loop_running {
                host.stop_frames();
                self.loop_running = false;
            }
        } else {
            self.ensure_loop(host);
        }
        replays
    }

    /// Transition-end signal from the host.
    pub fn on_transition_end(&mut self, host: &mut dyn Host, element: ElementId) -> bool {
        let running = self
            .contexts
            .get(&element)
            .is_some_and(|ctx| ctx.branch == Branch::Transition);
        if running {
            self.complete(host, element);
        }
        running
    }

    /// Abandon any context, restore the initial state with transitions suppressed and schedule
    /// the transition style to come back on the next tick.
    pub fn reset(
        &mut self,
        host: &mut dyn Host,
        element: ElementId,
        config: &ElementConfig,
        effect: Option<&EffectDefinition>,
    ) -> RevealResult<()> {
        self.abandon(element);
        // Back-to-back resets keep the value from before the first one.
        let pending_restore = self.take_restore(element);
        let target = host
            .target(element)
            .ok_or_else(|| RevealError::element_not_found(element.to_string()))?;
        let previous = match pending_restore {
            Some(previous) => previous,
            None => target.style("transition").filter(|v| v != "none"),
        };
        target.set_style("transition", "none");
        if let Some(initial_state) = effect.and_then(|e| e.initial_state) {
            initial_state(target, config)
                .map_err(|fault| RevealError::effect_runtime(config.effect_type.as_str(), &fault))?;
        }
        target.flush();
        self.initial_applied.insert(element);
        self.phases.insert(element, Phase::InitialStateApplied);
        host.dispatch(element, &RevealEvent::new(EventType::Reset, element, config));
        let now = self.clock.now_ms();
        self.arm(now, TimerKind::RestoreTransition { element, previous });
        lifecycle!(self.verbose, "{} reset", element);
        Ok(())
    }

    /// Arm a replay for `element` as part of `batch`, `delay_ms` from now.
    pub fn schedule_replay(&mut self, batch: BatchId, element: ElementId, delay_ms: f64) {
        let deadline = self.clock.now_ms() + delay_ms.max(0.0);
        self.arm(deadline, TimerKind::Replay { batch, element });
    }

    /// Abandon everything and stop the frame driver.
    pub fn clear(&mut self, host: &mut dyn Host) {
        let elements: Vec<ElementId> = self.contexts.keys().copied().collect();
        for element in elements {
            self.abandon(element);
        }
        self.timers.clear();
        self.frame_set.clear();
        self.phases.clear();
        self.initial_applied.clear();
        if self.loop_running {
            host.stop_frames();
            self.loop_running = false;
        }
    }

    #[inline]
    pub fn phase(&self, element: ElementId) -> Phase {
        self.phases.get(&element).copied().unwrap_or_default()
    }

    #[inline]
    pub fn is_animating(&self, element: ElementId) -> bool {
        self.contexts.get(&element).is_some_and(|ctx| ctx.active)
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.contexts.len()
    }

    pub fn context(&self, element: ElementId) -> Option<&AnimationContext> {
        self.contexts.get(&element)
    }

    #[inline]
    pub fn initial_state_applied(&self, element: ElementId) -> bool {
        self.initial_applied.contains(&element)
    }

    #[inline]
    pub fn frame_loop_running(&self) -> bool {
        self.loop_running
    }

    /// Earliest pending timer deadline, for hosts that sleep between ticks.
    pub fn next_deadline(&self) -> Option<f64> {
        self.timers
            .iter()
            .map(|t| t.deadline)
            .min_by(|a, b| a.total_cmp(b))
    }

    fn arm(&mut self, deadline: f64, kind: TimerKind) {
        let seq = self.ids.alloc_timer();
        self.timers.push(Timer {
            deadline,
            seq,
            kind,
        });
    }

    fn ensure_loop(&mut self, host: &mut dyn Host) {
        if !self.loop_running {
            host.start_frames();
            self.loop_running = true;
        }
    }

    /// Remove the pending transition restore for `element`, returning the value to restore.
    fn take_restore(&mut self, element: ElementId) -> Option<Option<String>> {
        let index = self.timers.iter().position(|t| {
            matches!(&t.kind, TimerKind::RestoreTransition { element: e, .. } if *e == element)
        })?;
        match self.timers.remove(index).kind {
            TimerKind::RestoreTransition { previous, .. } => Some(previous),
            _ => None,
        }
    }

    fn cancel_fallback(&mut self, element: ElementId) {
        self.timers.retain(|t| {
            !matches!(&t.kind, TimerKind::TransitionFallback { element: e, .. } if *e == element)
        });
    }

    /// Remove the context (if any) and resolve it as abandoned.
    fn abandon(&mut self, element: ElementId) -> bool {
        let Some(mut ctx) = self.contexts.shift_remove(&element) else {
            return false;
        };
        ctx.active = false;
        self.frame_set.shift_remove(&element);
        self.cancel_fallback(element);
        self.phases.insert(element, Phase::Abandoned);
        ctx.resolver.resolve(PlayOutcome::Abandoned);
        true
    }

    fn complete(&mut self, host: &mut dyn Host, element: ElementId) {
        let Some(ctx) = self.contexts.shift_remove(&element) else {
            return;
        };
        self.frame_set.shift_remove(&element);
        self.cancel_fallback(element);
        self.finish(host, element, &ctx.config, ctx.resolver);
    }

    fn finish(
        &mut self,
        host: &mut dyn Host,
        element: ElementId,
        config: &ElementConfig,
        resolver: Resolver<PlayOutcome>,
    ) {
        self.initial_applied.remove(&element);
        self.phases.insert(element, Phase::Completed);
        host.dispatch(element, &RevealEvent::new(EventType::Complete, element, config));
        lifecycle!(self.verbose, "{} completed '{}'", element, config.effect_type);
        resolver.resolve(PlayOutcome::Completed);
    }

    fn fail(
        &mut self,
        element: ElementId,
        effect: &str,
        fault: &EffectFault,
        resolver: Resolver<PlayOutcome>,
    ) {
        let error = RevealError::effect_runtime(effect, fault);
        warn!("{}: {}", element, error);
        self.initial_applied.remove(&element);
        self.phases.insert(element, Phase::Abandoned);
        resolver.resolve(PlayOutcome::Failed(error));
    }
}

fn restore_transition(target: &mut dyn Paintable, previous: Option<String>) {
    match previous {
        Some(value) => target.set_style("transition", &value),
        None => target.remove_style("transition"),
    }
}
