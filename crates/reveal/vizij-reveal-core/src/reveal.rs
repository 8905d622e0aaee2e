//! `Reveal`: the owned entry point tying configuration, registry, triggers and scheduler together.
//!
//! Every operation takes the host as `&mut dyn Host`. Failures are logged and surfaced through
//! the returned result or handle; one element failing never affects another.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::completion::{pending, Completion, PlayHandle, PlayOutcome, Resolver};
use crate::config::{ConfigPatch, GlobalConfig};
use crate::effects::{EffectDefinition, EffectMeta, EffectRegistry};
use crate::element::{parse, resolve_text, ElementConfig};
use crate::error::{RevealError, RevealResult};
use crate::host::{Clock, Host, SystemClock, VisibilityChange};
use crate::ids::{BatchId, ElementId, IdAllocator};
use crate::scheduler::{Phase, Scheduler};
use crate::trigger::TriggerManager;

/// What a `play` or `reset` call addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayTarget<'a> {
    Element(ElementId),
    /// First match for `play`, every match for `reset`.
    Selector(&'a str),
}

impl From<ElementId> for PlayTarget<'_> {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

impl<'a> From<&'a str> for PlayTarget<'a> {
    fn from(selector: &'a str) -> Self {
        Self::Selector(selector)
    }
}

/// Aggregate outcome of a `replay_all` batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub completed: usize,
    pub abandoned: usize,
    pub failed: usize,
}

impl ReplayReport {
    #[inline]
    pub fn total(&self) -> usize {
        self.completed + self.abandoned + self.failed
    }

    fn record(&mut self, outcome: &PlayOutcome) {
        match outcome {
            PlayOutcome::Completed => self.completed += 1,
            PlayOutcome::Abandoned => self.abandoned += 1,
            PlayOutcome::Failed(_) => self.failed += 1,
        }
    }
}

#[derive(Debug)]
struct ReplayBatch {
    id: BatchId,
    /// Elements whose replay timer has not fired yet.
    waiting: Vec<ElementId>,
    handles: Vec<PlayHandle>,
    report: ReplayReport,
    resolver: Resolver<ReplayReport>,
}

impl ReplayBatch {
    fn is_settled(&self) -> bool {
        self.waiting.is_empty() && self.handles.iter().all(Completion::is_settled)
    }

    fn finish(mut self) {
        for handle in &self.handles {
            if let Some(outcome) = handle.outcome() {
                self.report.record(&outcome);
            }
        }
        self.report.abandoned += self.waiting.len();
        self.resolver.resolve(self.report);
    }
}

/// One reveal system. Instances are fully independent.
pub struct Reveal {
    config: GlobalConfig,
    registry: EffectRegistry,
    elements: IndexMap<ElementId, ElementConfig>,
    triggers: TriggerManager,
    scheduler: Scheduler,
    batches: Vec<ReplayBatch>,
    ids: IdAllocator,
}

impl std::fmt::Debug for Reveal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reveal")
            .field("config", &self.config)
            .field("effects", &self.registry.len())
            .field("elements", &self.elements.len())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl Reveal {
    /// New system with the built-in effects registered.
    pub fn new(config: GlobalConfig, clock: Box<dyn Clock>) -> Self {
        Self::with_registry(config, EffectRegistry::with_builtins(), clock)
    }

    pub fn with_system_clock(config: GlobalConfig) -> Self {
        Self::new(config, Box::new(SystemClock::new()))
    }

    pub fn with_registry(
        config: GlobalConfig,
        registry: EffectRegistry,
        clock: Box<dyn Clock>,
    ) -> Self {
        let mut scheduler = Scheduler::new(clock);
        scheduler.set_verbose(config.debug);
        Self {
            config,
            registry,
            elements: IndexMap::new(),
            triggers: TriggerManager::new(),
            scheduler,
            batches: Vec::new(),
            ids: IdAllocator::new(),
        }
    }

    /// Prepare every element carrying the configuration attribute. Returns how many succeeded.
    pub fn init(&mut self, host: &mut dyn Host) -> usize {
        let annotated = host.annotated(&self.config.attribute);
        let total = annotated.len();
        let mut prepared = 0;
        for element in annotated {
            match self.prepare(host, element) {
                Ok(()) => prepared += 1,
                Err(err) => warn!(kind = err.kind(), "{}: prepare failed: {}", element, err),
            }
        }
        lifecycle!(
            self.config.debug,
            "initialized {} of {} annotated elements",
            prepared,
            total
        );
        prepared
    }

    /// Resolve and cache the element's configuration, apply its initial state and start
    /// observing its visibility.
    pub fn prepare(&mut self, host: &mut dyn Host, element: ElementId) -> RevealResult<()> {
        let config = self.element_config(host, element)?;
        match self.registry.lookup(&config.effect_type) {
            Some(effect) => self.scheduler.prepare(host, element, &config, effect)?,
            None => warn!(
                "{}: effect '{}' is not registered; skipping initial state",
                element, config.effect_type
            ),
        }
        self.triggers.observe(host, element, &config);
        Ok(())
    }

    /// Play the element's effect, optionally with per-call overrides in configuration syntax.
    pub fn play<'a>(
        &mut self,
        host: &mut dyn Host,
        target: impl Into<PlayTarget<'a>>,
        overrides: Option<&str>,
    ) -> PlayHandle {
        match self.try_play(host, target.into(), overrides) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(kind = err.kind(), "play failed: {}", err);
                Completion::ready(PlayOutcome::Failed(err))
            }
        }
    }

    fn try_play(
        &mut self,
        host: &mut dyn Host,
        target: PlayTarget<'_>,
        overrides: Option<&str>,
    ) -> RevealResult<PlayHandle> {
        let element = match target {
            PlayTarget::Element(id) => id,
            PlayTarget::Selector(selector) => host
                .query(selector)
                .first()
                .copied()
                .ok_or_else(|| RevealError::element_not_found(selector))?,
        };
        let base = self.element_config(host, element)?;
        let config = match overrides {
            Some(text) => base.with_overrides(&parse(text), &self.registry, &self.config)?,
            None => base,
        };
        let effect = self
            .registry
            .lookup(&config.effect_type)
            .ok_or_else(|| RevealError::unknown_effect(config.effect_type.as_str()))?;
        let reduce_motion = self.config.reduce_motion(host.prefers_reduced_motion());
        Ok(self
            .scheduler
            .start(host, element, config, effect, reduce_motion))
    }

    /// Return the target(s) to the initial state. Returns how many elements were reset.
    pub fn reset<'a>(
        &mut self,
        host: &mut dyn Host,
        target: impl Into<PlayTarget<'a>>,
    ) -> RevealResult<usize> {
        match target.into() {
            PlayTarget::Element(element) => {
                self.reset_one(host, element)?;
                Ok(1)
            }
            PlayTarget::Selector(selector) => {
                let mut count = 0;
                for element in host.query(selector) {
                    match self.reset_one(host, element) {
                        Ok(()) => count += 1,
                        Err(err) => warn!(kind = err.kind(), "{}: reset failed: {}", element, err),
                    }
                }
                Ok(count)
            }
        }
    }

    fn reset_one(&mut self, host: &mut dyn Host, element: ElementId) -> RevealResult<()> {
        let config = self.element_config(host, element)?;
        let effect = self.registry.lookup(&config.effect_type);
        self.scheduler.reset(host, element, &config, effect)
    }

    /// Reset every prepared element (matching `selector`, if given) and replay each one after a
    /// growing stagger. The returned completion always resolves.
    pub fn replay_all(
        &mut self,
        host: &mut dyn Host,
        selector: Option<&str>,
    ) -> Completion<ReplayReport> {
        let (handle, resolver) = pending();
        let candidates: Vec<ElementId> = match selector {
            Some(selector) => host
                .query(selector)
                .into_iter()
                .filter(|e| self.elements.contains_key(e))
                .collect(),
            None => self.elements.keys().copied().collect(),
        };
        let id = self.ids.alloc_batch();
        let stagger = self.config.replay_stagger_ms;
        let mut batch = ReplayBatch {
            id,
            waiting: Vec::new(),
            handles: Vec::new(),
            report: ReplayReport::default(),
            resolver,
        };
        for (index, element) in candidates.into_iter().enumerate() {
            match self.reset_one(host, element) {
                Ok(()) => {
                    self.scheduler
                        .schedule_replay(id, element, stagger * (index + 1) as f64);
                    batch.waiting.push(element);
                }
                Err(err) => {
                    warn!(kind = err.kind(), "{}: replay reset failed: {}", element, err);
                    batch.report.failed += 1;
                }
            }
        }
        lifecycle!(
            self.config.debug,
            "replay batch {:?} scheduled for {} elements",
            id,
            batch.waiting.len()
        );
        self.batches.push(batch);
        self.settle_batches();
        handle
    }

    pub fn register_effect(
        &mut self,
        name: &str,
        definition: EffectDefinition,
    ) -> RevealResult<()> {
        self.registry.register(name, definition).map_err(|err| {
            warn!(kind = err.kind(), "register_effect: {}", err);
            err
        })
    }

    pub fn effects(&self) -> impl Iterator<Item = &EffectMeta> + Clone + '_ {
        self.registry.list()
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Merge `patch` into the global configuration. Invalid results leave it unchanged.
    pub fn update_config(&mut self, patch: ConfigPatch) -> RevealResult<()> {
        let mut next = self.config.clone();
        next.apply(patch);
        if let Err(err) = next.validate() {
            warn!(kind = err.kind(), "update_config rejected: {}", err);
            return Err(err);
        }
        self.scheduler.set_verbose(next.debug);
        self.config = next;
        Ok(())
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Tear everything down: running animations are abandoned, timers dropped, observers
    /// released and caches cleared. Pending replay batches resolve.
    pub fn destroy(&mut self, host: &mut dyn Host) {
        self.scheduler.clear(host);
        self.triggers.unobserve_all(host);
        self.elements.clear();
        for batch in std::mem::take(&mut self.batches) {
            batch.finish();
        }
        lifecycle!(self.config.debug, "reveal system destroyed");
    }

    /// Per-frame (or timer) callback from the host.
    pub fn tick(&mut self, host: &mut dyn Host) {
        for (batch, element) in self.scheduler.tick(host) {
            let handle = self.play(host, PlayTarget::Element(element), None);
            if let Some(open) = self.batches.iter_mut().find(|b| b.id == batch) {
                open.waiting.retain(|e| *e != element);
                open.handles.push(handle);
            }
        }
        self.settle_batches();
    }

    /// Visibility change from the host's notifier. Returns the play handle when one started.
    pub fn on_visibility(
        &mut self,
        host: &mut dyn Host,
        element: ElementId,
        change: VisibilityChange,
    ) -> Option<PlayHandle> {
        if change == VisibilityChange::Exit {
            return None;
        }
        if !self.triggers.on_enter(host, element, self.config.once) {
            return None;
        }
        Some(self.play(host, PlayTarget::Element(element), None))
    }

    /// Transition-end signal from the host.
    pub fn on_transition_end(&mut self, host: &mut dyn Host, element: ElementId) -> bool {
        let finished = self.scheduler.on_transition_end(host, element);
        self.settle_batches();
        finished
    }

    #[inline]
    pub fn phase(&self, element: ElementId) -> Phase {
        self.scheduler.phase(element)
    }

    #[inline]
    pub fn is_animating(&self, element: ElementId) -> bool {
        self.scheduler.is_animating(element)
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.scheduler.active_count()
    }

    pub fn config_for(&self, element: ElementId) -> Option<&ElementConfig> {
        self.elements.get(&element)
    }

    #[inline]
    pub fn is_observed(&self, element: ElementId) -> bool {
        self.triggers.is_bound(element)
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.scheduler.next_deadline()
    }

    /// Cached configuration, resolved from the element's attribute on first use.
    fn element_config(
        &mut self,
        host: &mut dyn Host,
        element: ElementId,
    ) -> RevealResult<ElementConfig> {
        if let Some(config) = self.elements.get(&element) {
            return Ok(config.clone());
        }
        let text = host
            .target(element)
            .ok_or_else(|| RevealError::element_not_found(element.to_string()))?
            .attribute(&self.config.attribute)
            .unwrap_or_default();
        let config = resolve_text(&text, &self.registry, &self.config)?;
        self.elements.insert(element, config.clone());
        Ok(config)
    }

    fn settle_batches(&mut self) {
        if self.batches.iter().all(|b| !b.is_settled()) {
            return;
        }
        let (done, open): (Vec<_>, Vec<_>) = std::mem::take(&mut self.batches)
            .into_iter()
            .partition(ReplayBatch::is_settled);
        self.batches = open;
        for batch in done {
            lifecycle!(self.config.debug, "replay batch {:?} settled", batch.id);
            batch.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessElement, HeadlessHost};
    use crate::host::ManualClock;

    fn system() -> (Reveal, ManualClock) {
        let clock = ManualClock::new();
        (
            Reveal::new(GlobalConfig::default(), Box::new(clock.clone())),
            clock,
        )
    }

    #[test]
    fn init_prepares_annotated_elements() {
        let (mut reveal, _) = system();
        let mut host = HeadlessHost::new();
        let a = host.add(HeadlessElement::new("div").with_reveal("slideUp"));
        let b = host.add(HeadlessElement::new("div").with_reveal(""));
        host.add(HeadlessElement::new("div"));
        assert_eq!(reveal.init(&mut host), 2);
        assert_eq!(reveal.config_for(b).unwrap().effect_type, "fadeIn");
        assert_eq!(host.style(a, "opacity"), Some("0"));
        assert!(reveal.is_observed(a));
        assert_eq!(reveal.phase(a), Phase::InitialStateApplied);
    }

    #[test]
    fn selector_play_uses_first_match_and_reports_missing() {
        let (mut reveal, _) = system();
        let mut host = HeadlessHost::new();
        let first = host.add(HeadlessElement::new("div").with_class("card"));
        host.add(HeadlessElement::new("div").with_class("card"));
        let handle = reveal.play(&mut host, ".card", None);
        assert!(!handle.is_settled());
        assert!(reveal.is_animating(first));
        assert_eq!(reveal.active_count(), 1);

        let missing = reveal.play(&mut host, "#nope", None);
        assert_eq!(
            missing.outcome(),
            Some(PlayOutcome::Failed(RevealError::element_not_found("#nope")))
        );
    }

    #[test]
    fn overrides_do_not_change_cached_config() {
        let (mut reveal, _) = system();
        let mut host = HeadlessHost::new();
        let el = host.add(HeadlessElement::new("div").with_reveal("fadeIn,duration=1s"));
        reveal.prepare(&mut host, el).unwrap();
        reveal.play(&mut host, el, Some("duration=100ms"));
        assert_eq!(reveal.next_deadline(), Some(150.0));
        assert_eq!(reveal.config_for(el).unwrap().duration, "1s");
    }

    #[test]
    fn visibility_enter_plays_and_releases_once_binding() {
        let (mut reveal, _) = system();
        let mut host = HeadlessHost::new();
        let el = host.add(HeadlessElement::new("div").with_reveal("fadeIn"));
        reveal.init(&mut host);
        assert!(reveal
            .on_visibility(&mut host, el, VisibilityChange::Exit)
            .is_none());
        let handle = reveal.on_visibility(&mut host, el, VisibilityChange::Enter);
        assert!(handle.is_some());
        assert!(!host.is_observed(el));
        assert!(reveal
            .on_visibility(&mut host, el, VisibilityChange::Enter)
            .is_none());
    }

    #[test]
    fn update_config_rejects_invalid_patch() {
        let (mut reveal, _) = system();
        let bad = ConfigPatch {
            threshold: Some(3.0),
            ..ConfigPatch::default()
        };
        assert!(reveal.update_config(bad).is_err());
        assert_eq!(reveal.config().threshold, 0.2);
        let good = ConfigPatch {
            once: Some(false),
            ..ConfigPatch::default()
        };
        reveal.update_config(good).unwrap();
        assert!(!reveal.config().once);
    }

    #[test]
    fn destroy_abandons_and_releases_everything() {
        let (mut reveal, _) = system();
        let mut host = HeadlessHost::new();
        let el = host.add(HeadlessElement::new("p").with_reveal("typewriter").with_content("hi"));
        reveal.init(&mut host);
        let handle = reveal.play(&mut host, el, None);
        let batch = reveal.replay_all(&mut host, None);
        reveal.destroy(&mut host);
        assert_eq!(handle.outcome(), Some(PlayOutcome::Abandoned));
        assert_eq!(batch.outcome().map(|r| r.total()), Some(1));
        assert_eq!(host.observed_count(), 0);
        assert!(!host.frames_running());
        assert!(reveal.config_for(el).is_none());
        assert_eq!(reveal.active_count(), 0);
    }

    #[test]
    fn empty_replay_resolves_immediately() {
        let (mut reveal, _) = system();
        let mut host = HeadlessHost::new();
        let batch = reveal.replay_all(&mut host, None);
        assert_eq!(batch.outcome(), Some(ReplayReport::default()));
    }
}
