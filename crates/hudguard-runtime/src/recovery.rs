#![forbid(unsafe_code)]

//! Recovery orchestrator.
//!
//! Per requested element the orchestrator walks
//!
//! ```text
//! Idle -> Retrying(n) -> Success
//!                     -> Fallback -> Success
//!                                 -> Emergency -> Success
//!                                              -> Failed
//! ```
//!
//! The first primary attempt runs inside [`RecoveryOrchestrator::recover_element_at`].
//! Each later attempt `k` is parked in the timer queue for
//! `retry_delay_base * k` and runs from [`RecoveryOrchestrator::tick_at`], so
//! the host loop never blocks. While a recovery is parked, further requests
//! for the same component id join it instead of starting a second sequence.
//!
//! Whole-HUD recovery and the playability floor are synchronous: they walk
//! their tiers once, tearing down each failed tier before the next.
//!
//! Construction errors and panics never leave this module. The only failure
//! surfaced is [`ExhaustionFailure`], logged at `ERROR`.

use std::collections::HashMap;

use hudguard_layout::LayoutConfig;
use hudguard_render::RenderEngine;
use hudguard_widgets::{
    ConstructionError, ElementFactory, ElementMap, ElementRequest, HudBuilder, HudError, Strategy,
    UiElement, assemble_hud, default_hud_builder, emergency_for, emergency_marker,
    guard_construction,
};
use web_time::Instant;

use crate::config::RecoveryConfig;
use crate::diagnostics::{AttemptOutcome, AttemptStage, Diagnostics};
use crate::error::ExhaustionFailure;
use crate::timers::{TimerId, TimerQueue};

/// Component id used for whole-HUD recovery.
pub const HUD_COMPONENT: &str = "hud";
/// Component id used by the playability floor.
pub const PLAYABILITY_COMPONENT: &str = "playability";

/// Identifies one element recovery sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecoveryTicket(u64);

/// Result of requesting an element recovery.
#[derive(Debug)]
pub enum RecoveryPoll {
    /// Finished without waiting.
    Ready(Result<UiElement, ExhaustionFailure>),
    /// A retry is parked; the outcome arrives from `tick_at` under this
    /// ticket.
    Pending(RecoveryTicket),
}

impl RecoveryPoll {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// A parked recovery that finished during `tick_at`.
#[derive(Debug)]
pub struct RecoveryCompletion {
    pub ticket: RecoveryTicket,
    pub component: String,
    pub result: Result<UiElement, ExhaustionFailure>,
}

/// Where a component's recovery stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    /// Nothing in flight.
    Idle,
    /// Waiting to run primary attempt `attempt`.
    Retrying { attempt: u32 },
}

/// Outcome of the playability floor.
#[derive(Debug)]
pub enum Playability {
    /// A visible interactive element already exists.
    AlreadyPlayable,
    /// A fresh minimal-tier HUD was built.
    MinimalHud(ElementMap),
    /// Only the flashing emergency marker could be placed.
    EmergencyMarker(UiElement),
    /// Nothing could be built.
    Unplayable(ExhaustionFailure),
}

impl Playability {
    /// Some interactive element is on screen.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        !matches!(self, Self::Unplayable(_))
    }
}

struct InFlight {
    ticket: RecoveryTicket,
    request: ElementRequest,
    primary: ElementFactory,
    fallback: Option<ElementFactory>,
    /// Index of the next primary attempt.
    attempt: u32,
    timer: Option<TimerId>,
    last_error: Option<ConstructionError>,
}

/// Drives retries, fallbacks, and the emergency tier.
pub struct RecoveryOrchestrator {
    config: RecoveryConfig,
    diagnostics: Diagnostics,
    in_flight: HashMap<String, InFlight>,
    timers: TimerQueue<String>,
    next_ticket: u64,
}

impl std::fmt::Debug for RecoveryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryOrchestrator")
            .field("config", &self.config)
            .field("in_flight", &self.in_flight.len())
            .field("timers", &self.timers.len())
            .finish()
    }
}

impl RecoveryOrchestrator {
    pub fn new(config: RecoveryConfig, diagnostics: Diagnostics) -> Self {
        Self {
            config,
            diagnostics,
            in_flight: HashMap::new(),
            timers: TimerQueue::new(),
            next_ticket: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Recover one element.
    ///
    /// Tries `primary` up to the configured number of times, then
    /// `fallback` once, then the built-in emergency constructor for the
    /// request's role. If a recovery for `component` is already parked the
    /// new factories are dropped unused and the existing ticket returned.
    pub fn recover_element_at(
        &mut self,
        engine: &mut dyn RenderEngine,
        component: &str,
        request: ElementRequest,
        primary: ElementFactory,
        fallback: Option<ElementFactory>,
        now: Instant,
    ) -> RecoveryPoll {
        if let Some(flight) = self.in_flight.get(component) {
            tracing::debug!(component, attempt = flight.attempt, "joining in-flight recovery");
            return RecoveryPoll::Pending(flight.ticket);
        }

        let ticket = RecoveryTicket(self.next_ticket);
        self.next_ticket += 1;
        let flight = InFlight {
            ticket,
            request,
            primary,
            fallback,
            attempt: 0,
            timer: None,
            last_error: None,
        };
        match self.advance(engine, component.to_string(), flight, now) {
            Some(result) => RecoveryPoll::Ready(result),
            None => RecoveryPoll::Pending(ticket),
        }
    }

    /// Run every retry whose delay has elapsed.
    pub fn tick_at(
        &mut self,
        engine: &mut dyn RenderEngine,
        now: Instant,
    ) -> Vec<RecoveryCompletion> {
        let mut done = Vec::new();
        for component in self.timers.drain_due(now) {
            let Some(mut flight) = self.in_flight.remove(&component) else {
                continue;
            };
            flight.timer = None;
            let ticket = flight.ticket;
            if let Some(result) = self.advance(engine, component.clone(), flight, now) {
                done.push(RecoveryCompletion {
                    ticket,
                    component,
                    result,
                });
            }
        }
        done
    }

    /// Build a whole HUD, walking the fallback chain once.
    ///
    /// Each failed tier is torn down before the next is tried, so the result
    /// never mixes tiers. Returns the first HUD that passes validation.
    pub fn recover_whole_hud_at(
        &mut self,
        engine: &mut dyn RenderEngine,
        builder: &mut HudBuilder,
        layout: &LayoutConfig,
        now: Instant,
    ) -> Result<ElementMap, ExhaustionFailure> {
        let mut attempts = 0;
        let mut last_error = None;
        for (i, &strategy) in self.config.hud_chain().iter().enumerate() {
            if i > 0 {
                tracing::warn!(
                    component = HUD_COMPONENT,
                    strategy = strategy.as_str(),
                    "escalating hud to next tier"
                );
            }
            attempts += 1;
            match assemble_hud(engine, builder, strategy, layout) {
                Ok(map) => {
                    self.record(now, HUD_COMPONENT, AttemptStage::Tier(strategy), 0, None);
                    tracing::debug!(strategy = strategy.as_str(), elements = map.len(), "hud built");
                    return Ok(map);
                }
                Err(err) => {
                    tracing::debug!(strategy = strategy.as_str(), error = %err, "hud tier failed");
                    self.record_hud_failure(now, HUD_COMPONENT, AttemptStage::Tier(strategy), &err);
                    last_error = Some(err);
                }
            }
        }
        Err(self.exhausted(HUD_COMPONENT, attempts, last_error))
    }

    /// Guarantee something interactive is on screen.
    ///
    /// If `current` already shows a visible interactive element nothing is
    /// built. Otherwise a minimal-tier HUD is tried, then the single
    /// emergency marker. Ignores `auto_fallback_enabled`.
    pub fn ensure_playability_at(
        &mut self,
        engine: &mut dyn RenderEngine,
        current: Option<&ElementMap>,
        layout: &LayoutConfig,
        now: Instant,
    ) -> Playability {
        if current.is_some_and(|map| map.has_visible_interactive(&*engine)) {
            return Playability::AlreadyPlayable;
        }

        tracing::warn!("no visible interactive element; building minimal hud");
        let mut builder = default_hud_builder();
        let minimal_err = match assemble_hud(engine, &mut builder, Strategy::Minimal, layout) {
            Ok(map) => {
                self.record(
                    now,
                    PLAYABILITY_COMPONENT,
                    AttemptStage::Tier(Strategy::Minimal),
                    0,
                    None,
                );
                return Playability::MinimalHud(map);
            }
            Err(err) => err,
        };
        self.record_hud_failure(
            now,
            PLAYABILITY_COMPONENT,
            AttemptStage::Tier(Strategy::Minimal),
            &minimal_err,
        );

        let size = layout.size();
        match guard_construction(AttemptStage::Marker.as_str(), || emergency_marker(engine, size)) {
            Ok(marker) => {
                tracing::error!(
                    width = size.width,
                    height = size.height,
                    "emergency marker placed"
                );
                self.record(now, PLAYABILITY_COMPONENT, AttemptStage::Marker, 0, None);
                self.diagnostics.set_emergency_marker(true);
                Playability::EmergencyMarker(marker)
            }
            Err(err) => {
                self.record(
                    now,
                    PLAYABILITY_COMPONENT,
                    AttemptStage::Marker,
                    0,
                    Some(&err),
                );
                Playability::Unplayable(self.exhausted(
                    PLAYABILITY_COMPONENT,
                    2,
                    Some(HudError::from(err)),
                ))
            }
        }
    }

    /// Where `component`'s recovery stands.
    #[must_use]
    pub fn state(&self, component: &str) -> RecoveryState {
        match self.in_flight.get(component) {
            Some(flight) => RecoveryState::Retrying {
                attempt: flight.attempt,
            },
            None => RecoveryState::Idle,
        }
    }

    /// A recovery for `component` is parked.
    #[must_use]
    pub fn is_in_flight(&self, component: &str) -> bool {
        self.in_flight.contains_key(component)
    }

    /// Parked recoveries.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    /// When the next parked retry is due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Abandon one parked recovery. Its factories are dropped unused.
    pub fn cancel(&mut self, component: &str) -> bool {
        let Some(flight) = self.in_flight.remove(component) else {
            return false;
        };
        if let Some(timer) = flight.timer {
            self.timers.cancel(timer);
        }
        true
    }

    /// Abandon every parked recovery and clear all timers.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.in_flight.len();
        self.in_flight.clear();
        self.timers.clear();
        if cancelled > 0 {
            tracing::debug!(cancelled, "parked recoveries cancelled");
        }
        cancelled
    }

    // --- Internal methods ---

    /// Run the flight's next primary attempt. Returns `None` if a retry was
    /// parked.
    fn advance(
        &mut self,
        engine: &mut dyn RenderEngine,
        component: String,
        mut flight: InFlight,
        now: Instant,
    ) -> Option<Result<UiElement, ExhaustionFailure>> {
        let attempt = flight.attempt;
        let built = guard_construction(&component, || (flight.primary)(engine, &flight.request));
        match built {
            Ok(element) => {
                self.record(now, &component, AttemptStage::Primary, attempt, None);
                Some(Ok(element))
            }
            Err(err) => {
                tracing::debug!(
                    component = component.as_str(),
                    attempt,
                    error = %err,
                    "primary factory failed"
                );
                self.record(now, &component, AttemptStage::Primary, attempt, Some(&err));
                flight.last_error = Some(err);

                let next = attempt + 1;
                if next < self.config.primary_attempts() {
                    let deadline = now + self.config.retry_delay(next);
                    flight.attempt = next;
                    flight.timer = Some(self.timers.schedule(deadline, component.clone()));
                    self.in_flight.insert(component, flight);
                    None
                } else {
                    Some(self.escalate(engine, &component, flight, next, now))
                }
            }
        }
    }

    fn escalate(
        &mut self,
        engine: &mut dyn RenderEngine,
        component: &str,
        flight: InFlight,
        mut attempts: u32,
        now: Instant,
    ) -> Result<UiElement, ExhaustionFailure> {
        let InFlight {
            request,
            fallback,
            last_error,
            ..
        } = flight;
        let mut last_error = last_error;

        if !self.config.auto_fallback_enabled {
            return Err(self.exhausted(component, attempts, last_error.map(HudError::from)));
        }

        if let Some(mut fallback) = fallback {
            tracing::warn!(component, "escalating to fallback factory");
            attempts += 1;
            match guard_construction(component, || fallback(engine, &request)) {
                Ok(element) => {
                    self.record(now, component, AttemptStage::Fallback, 0, None);
                    return Ok(element);
                }
                Err(err) => {
                    self.record(now, component, AttemptStage::Fallback, 0, Some(&err));
                    last_error = Some(err);
                }
            }
        }

        tracing::warn!(
            component,
            role = request.role.as_str(),
            "escalating to emergency tier"
        );
        attempts += 1;
        let emergency = emergency_for(request.role);
        let stage = AttemptStage::Tier(Strategy::Emergency);
        match guard_construction(component, || emergency(engine, &request)) {
            Ok(element) => {
                self.record(now, component, stage, 0, None);
                Ok(element)
            }
            Err(err) => {
                self.record(now, component, stage, 0, Some(&err));
                last_error = Some(err);
                Err(self.exhausted(component, attempts, last_error.map(HudError::from)))
            }
        }
    }

    fn record(
        &self,
        now: Instant,
        component: &str,
        stage: AttemptStage,
        retry_index: u32,
        error: Option<&ConstructionError>,
    ) {
        let outcome = if error.is_some() {
            AttemptOutcome::ConstructionFailed
        } else {
            AttemptOutcome::Success
        };
        self.diagnostics.record_attempt(
            now,
            component,
            stage,
            outcome,
            retry_index,
            error.map(ToString::to_string),
        );
    }

    fn record_hud_failure(&self, now: Instant, component: &str, stage: AttemptStage, err: &HudError) {
        let outcome = match err {
            HudError::Construction(_) => AttemptOutcome::ConstructionFailed,
            HudError::Validation(_) => AttemptOutcome::ValidationFailed,
        };
        self.diagnostics
            .record_attempt(now, component, stage, outcome, 0, Some(err.to_string()));
    }

    fn exhausted(
        &self,
        component: &str,
        attempts: u32,
        last_error: Option<HudError>,
    ) -> ExhaustionFailure {
        let detail = last_error
            .as_ref()
            .map_or_else(|| "none".to_string(), ToString::to_string);
        tracing::error!(component, attempts, error = %detail, "recovery exhausted");
        self.diagnostics.record_exhaustion(component);
        ExhaustionFailure {
            component: component.to_string(),
            attempts,
            last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hudguard_core::geometry::Point;
    use hudguard_layout::calculate_layout;
    use hudguard_render::headless::{FaultMask, HeadlessEngine};
    use hudguard_widgets::{ElementRole, build_hud, populate_hud};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    fn live_parts(map: &ElementMap) -> usize {
        map.iter().map(|e| 1 + e.parts().len()).sum()
    }

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    fn request(role: ElementRole) -> ElementRequest {
        ElementRequest::new(role, Point::new(40.0, 40.0))
    }

    fn failing(calls: Rc<Cell<u32>>) -> ElementFactory {
        Box::new(
            move |_: &mut dyn RenderEngine,
                  _: &ElementRequest|
                  -> Result<UiElement, ConstructionError> {
                calls.set(calls.get() + 1);
                Err(ConstructionError::ResourceUnavailable("sprites"))
            },
        )
    }

    /// Fails `failures` times, then builds with the graphics tier.
    fn flaky(failures: u32, calls: Rc<Cell<u32>>) -> ElementFactory {
        Box::new(
            move |engine: &mut dyn RenderEngine,
                  request: &ElementRequest|
                  -> Result<UiElement, ConstructionError> {
                calls.set(calls.get() + 1);
                if calls.get() <= failures {
                    Err(ConstructionError::ResourceUnavailable("sprites"))
                } else {
                    Strategy::Graphics.build(engine, request)
                }
            },
        )
    }

    fn orchestrator(config: RecoveryConfig) -> (RecoveryOrchestrator, Diagnostics) {
        let diagnostics = Diagnostics::new();
        (RecoveryOrchestrator::new(config, diagnostics.clone()), diagnostics)
    }

    #[test]
    fn first_attempt_success_is_ready() {
        let (mut o, d) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new();
        let calls = Rc::new(Cell::new(0));
        let poll = o.recover_element_at(
            &mut engine,
            "score",
            request(ElementRole::Score),
            flaky(0, calls.clone()),
            None,
            Instant::now(),
        );
        match poll {
            RecoveryPoll::Ready(Ok(el)) => assert_eq!(el.strategy(), Strategy::Graphics),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(d.attempts().len(), 1);
        assert_eq!(o.state("score"), RecoveryState::Idle);
    }

    #[test]
    fn always_failing_primary_reaches_emergency_after_four_attempts() {
        let (mut o, d) = orchestrator(RecoveryConfig::default().with_max_retries(3));
        let mut engine = HeadlessEngine::new();
        let calls = Rc::new(Cell::new(0));
        let base = Instant::now();

        let poll = o.recover_element_at(
            &mut engine,
            "score",
            request(ElementRole::Score),
            failing(calls.clone()),
            None,
            base,
        );
        assert!(poll.is_pending());
        assert_eq!(o.state("score"), RecoveryState::Retrying { attempt: 1 });
        assert_eq!(o.next_deadline(), Some(at(base, 100)));

        assert!(o.tick_at(&mut engine, at(base, 99)).is_empty());
        assert!(o.tick_at(&mut engine, at(base, 100)).is_empty());
        assert_eq!(o.next_deadline(), Some(at(base, 300)));

        let done = o.tick_at(&mut engine, at(base, 300));
        assert_eq!(done.len(), 1);
        let element = done
            .into_iter()
            .next()
            .and_then(|c| c.result.ok())
            .expect("emergency element");
        assert_eq!(element.strategy(), Strategy::Emergency);
        assert_eq!(calls.get(), 3);

        let attempts = d.attempts_for("score");
        assert_eq!(attempts.len(), 4);
        let stages: Vec<_> = attempts.iter().map(|a| a.stage.as_str()).collect();
        assert_eq!(stages, ["primary", "primary", "primary", "emergency"]);
        let retries: Vec<_> = attempts.iter().map(|a| a.retry_index).collect();
        assert_eq!(retries, [0, 1, 2, 0]);
        assert_eq!(o.pending_count(), 0);
    }

    #[test]
    fn retry_succeeds_before_escalation() {
        let (mut o, d) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new();
        let calls = Rc::new(Cell::new(0));
        let base = Instant::now();
        let poll = o.recover_element_at(
            &mut engine,
            "timer",
            request(ElementRole::Timer),
            flaky(1, calls.clone()),
            None,
            base,
        );
        let RecoveryPoll::Pending(ticket) = poll else {
            panic!("expected pending");
        };
        let done = o.tick_at(&mut engine, at(base, 100));
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].ticket, ticket);
        assert_eq!(done[0].component, "timer");
        assert!(matches!(&done[0].result, Ok(el) if el.strategy() == Strategy::Graphics));
        assert_eq!(d.summary().successes, 1);
    }

    #[test]
    fn fallback_runs_once_after_primary_exhaustion() {
        let config = RecoveryConfig::default().with_retry(false);
        let (mut o, d) = orchestrator(config);
        let mut engine = HeadlessEngine::new();
        let primary_calls = Rc::new(Cell::new(0));
        let fallback_calls = Rc::new(Cell::new(0));
        let poll = o.recover_element_at(
            &mut engine,
            "prompt",
            request(ElementRole::TargetPrompt),
            failing(primary_calls.clone()),
            Some(flaky(0, fallback_calls.clone())),
            Instant::now(),
        );
        assert!(matches!(poll, RecoveryPoll::Ready(Ok(_))));
        assert_eq!(primary_calls.get(), 1);
        assert_eq!(fallback_calls.get(), 1);
        let stages: Vec<_> = d.attempts().iter().map(|a| a.stage).collect();
        assert_eq!(stages, [AttemptStage::Primary, AttemptStage::Fallback]);
    }

    #[test]
    fn concurrent_requests_share_one_sequence() {
        let (mut o, _) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new();
        let first_calls = Rc::new(Cell::new(0));
        let second_calls = Rc::new(Cell::new(0));
        let base = Instant::now();

        let a = o.recover_element_at(
            &mut engine,
            "score",
            request(ElementRole::Score),
            flaky(1, first_calls.clone()),
            None,
            base,
        );
        let b = o.recover_element_at(
            &mut engine,
            "score",
            request(ElementRole::Score),
            flaky(0, second_calls.clone()),
            None,
            at(base, 10),
        );
        match (a, b) {
            (RecoveryPoll::Pending(x), RecoveryPoll::Pending(y)) => assert_eq!(x, y),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(second_calls.get(), 0);

        let done = o.tick_at(&mut engine, at(base, 1000));
        assert_eq!(done.len(), 1);
        assert_eq!(first_calls.get(), 2);
        assert_eq!(second_calls.get(), 0);
    }

    #[test]
    fn different_components_interleave() {
        let (mut o, _) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new();
        let base = Instant::now();
        for id in ["score", "timer"] {
            let poll = o.recover_element_at(
                &mut engine,
                id,
                request(ElementRole::Generic),
                flaky(1, Rc::new(Cell::new(0))),
                None,
                base,
            );
            assert!(poll.is_pending());
        }
        assert_eq!(o.pending_count(), 2);
        let mut done: Vec<_> = o
            .tick_at(&mut engine, at(base, 100))
            .into_iter()
            .map(|c| c.component)
            .collect();
        done.sort();
        assert_eq!(done, ["score", "timer"]);
    }

    #[test]
    fn without_auto_fallback_primary_exhaustion_is_final() {
        let config = RecoveryConfig::default().with_auto_fallback(false);
        let (mut o, d) = orchestrator(config);
        let mut engine = HeadlessEngine::new();
        let base = Instant::now();
        o.recover_element_at(
            &mut engine,
            "score",
            request(ElementRole::Score),
            failing(Rc::new(Cell::new(0))),
            Some(flaky(0, Rc::new(Cell::new(0)))),
            base,
        );
        o.tick_at(&mut engine, at(base, 100));
        let done = o.tick_at(&mut engine, at(base, 300));
        let err = done
            .into_iter()
            .next()
            .and_then(|c| c.result.err())
            .expect("exhaustion");
        assert_eq!(err.attempts, 3);
        assert_eq!(err.component, "score");
        assert_eq!(d.summary().exhausted, 1);
        assert_eq!(engine.live_count(), 0);
    }

    #[test]
    fn failing_emergency_tier_is_exhaustion() {
        let config = RecoveryConfig::default().with_retry(false);
        let (mut o, d) = orchestrator(config);
        let mut engine = HeadlessEngine::new().with_faults(FaultMask::RECT);
        let poll = o.recover_element_at(
            &mut engine,
            "timer",
            request(ElementRole::Timer),
            failing(Rc::new(Cell::new(0))),
            None,
            Instant::now(),
        );
        match poll {
            RecoveryPoll::Ready(Err(err)) => {
                assert_eq!(err.attempts, 2);
                assert!(matches!(err.last_error, Some(HudError::Construction(_))));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(d.exhausted_components(), ["timer"]);
        assert_eq!(engine.live_count(), 0);
    }

    #[test]
    fn panicking_primary_is_contained_and_retried() {
        let config = RecoveryConfig::default().with_retry(false);
        let (mut o, d) = orchestrator(config);
        let mut engine = HeadlessEngine::new();
        let primary: ElementFactory = Box::new(
            |_: &mut dyn RenderEngine, _: &ElementRequest| -> Result<UiElement, ConstructionError> {
                panic!("factory bug")
            },
        );
        let poll = o.recover_element_at(
            &mut engine,
            "score",
            request(ElementRole::Score),
            primary,
            None,
            Instant::now(),
        );
        assert!(matches!(poll, RecoveryPoll::Ready(Ok(_))));
        let first = &d.attempts()[0];
        assert_eq!(first.error.as_deref(), Some("construction panicked: factory bug"));
    }

    #[test]
    fn cancel_all_drops_parked_work() {
        let (mut o, _) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new();
        let calls = Rc::new(Cell::new(0));
        let base = Instant::now();
        o.recover_element_at(
            &mut engine,
            "score",
            request(ElementRole::Score),
            failing(calls.clone()),
            None,
            base,
        );
        assert_eq!(o.cancel_all(), 1);
        assert!(o.tick_at(&mut engine, at(base, 10_000)).is_empty());
        assert_eq!(calls.get(), 1);
        assert_eq!(o.next_deadline(), None);
    }

    #[test]
    fn cancel_one_component() {
        let (mut o, _) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new();
        let base = Instant::now();
        o.recover_element_at(
            &mut engine,
            "score",
            request(ElementRole::Score),
            failing(Rc::new(Cell::new(0))),
            None,
            base,
        );
        assert!(o.cancel("score"));
        assert!(!o.cancel("score"));
        assert!(o.timers.is_empty());
    }

    // --- Whole HUD ---

    #[test]
    fn healthy_engine_gets_rich_hud() {
        let (mut o, d) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new();
        let layout = calculate_layout(1280.0, 720.0);
        let mut builder = default_hud_builder();
        let map = o
            .recover_whole_hud_at(&mut engine, &mut builder, &layout, Instant::now())
            .unwrap();
        assert_eq!(map.strategy(), Strategy::Rich);
        assert_eq!(d.attempts().len(), 1);
    }

    #[test]
    fn chain_walks_down_to_emergency_without_mixing_tiers() {
        let (mut o, d) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new()
            .without_fonts()
            .with_faults(FaultMask::CIRCLE);
        let layout = calculate_layout(1280.0, 720.0);
        let mut builder = default_hud_builder();
        let map = o
            .recover_whole_hud_at(&mut engine, &mut builder, &layout, Instant::now())
            .unwrap();
        assert_eq!(map.strategy(), Strategy::Emergency);
        assert!(map.iter().all(|e| e.strategy() == Strategy::Emergency));
        assert_eq!(engine.live_count(), live_parts(&map));

        let stages: Vec<_> = d.attempts().iter().map(|a| a.stage.as_str()).collect();
        assert_eq!(stages, ["rich", "graphics", "minimal", "emergency"]);
    }

    #[test]
    fn validation_failure_moves_to_next_tier() {
        let (mut o, d) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new();
        let layout = calculate_layout(800.0, 600.0);
        let mut builder: HudBuilder = Box::new(
            |engine: &mut dyn RenderEngine,
             strategy: Strategy,
             layout: &LayoutConfig,
             map: &mut ElementMap|
             -> Result<(), ConstructionError> {
                if strategy == Strategy::Rich {
                    let request = ElementRequest::for_role(ElementRole::Score, layout);
                    map.insert(strategy.build(engine, &request)?);
                    Ok(())
                } else {
                    populate_hud(engine, strategy, layout, map)
                }
            },
        );
        let map = o
            .recover_whole_hud_at(&mut engine, &mut builder, &layout, Instant::now())
            .unwrap();
        assert_eq!(map.strategy(), Strategy::Graphics);
        assert_eq!(d.attempts()[0].outcome, AttemptOutcome::ValidationFailed);
        assert_eq!(engine.live_count(), live_parts(&map));
    }

    #[test]
    fn builder_error_does_not_leave_partial_tier_on_screen() {
        let (mut o, _) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new();
        let layout = calculate_layout(1280.0, 720.0);
        let mut builder: HudBuilder = Box::new(
            |engine: &mut dyn RenderEngine,
             strategy: Strategy,
             layout: &LayoutConfig,
             map: &mut ElementMap|
             -> Result<(), ConstructionError> {
                if strategy == Strategy::Rich {
                    for role in [ElementRole::Header, ElementRole::Score] {
                        let request = ElementRequest::for_role(role, layout);
                        map.insert(strategy.build(engine, &request)?);
                    }
                    Err(ConstructionError::ResourceUnavailable("sprites"))
                } else {
                    populate_hud(engine, strategy, layout, map)
                }
            },
        );
        let map = o
            .recover_whole_hud_at(&mut engine, &mut builder, &layout, Instant::now())
            .unwrap();
        assert_eq!(map.strategy(), Strategy::Graphics);
        assert_eq!(engine.live_count(), live_parts(&map));
    }

    #[test]
    fn whole_hud_exhaustion_leaves_nothing() {
        let (mut o, d) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new().with_faults(FaultMask::CONTAINER);
        let layout = calculate_layout(800.0, 600.0);
        let mut builder = default_hud_builder();
        let err = o
            .recover_whole_hud_at(&mut engine, &mut builder, &layout, Instant::now())
            .unwrap_err();
        assert_eq!(err.component, HUD_COMPONENT);
        assert_eq!(err.attempts, 4);
        assert_eq!(engine.live_count(), 0);
        assert_eq!(d.summary().exhausted, 1);
    }

    #[test]
    fn whole_hud_without_auto_fallback_tries_first_tier_only() {
        let config = RecoveryConfig::default().with_auto_fallback(false);
        let (mut o, _) = orchestrator(config);
        let mut engine = HeadlessEngine::new().without_fonts();
        let layout = calculate_layout(800.0, 600.0);
        let mut builder = default_hud_builder();
        let err = o
            .recover_whole_hud_at(&mut engine, &mut builder, &layout, Instant::now())
            .unwrap_err();
        assert_eq!(err.attempts, 1);
    }

    // --- Playability ---

    #[test]
    fn playable_hud_is_left_alone() {
        let (mut o, _) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new();
        let layout = calculate_layout(800.0, 600.0);
        let map = build_hud(&mut engine, Strategy::Graphics, &layout).unwrap();
        let before = engine.live_count();
        let outcome = o.ensure_playability_at(&mut engine, Some(&map), &layout, Instant::now());
        assert!(matches!(outcome, Playability::AlreadyPlayable));
        assert_eq!(engine.live_count(), before);
    }

    #[test]
    fn missing_hud_gets_minimal_tier() {
        let (mut o, _) = orchestrator(RecoveryConfig::default().with_auto_fallback(false));
        let mut engine = HeadlessEngine::new();
        let layout = calculate_layout(390.0, 844.0);
        match o.ensure_playability_at(&mut engine, None, &layout, Instant::now()) {
            Playability::MinimalHud(map) => assert_eq!(map.strategy(), Strategy::Minimal),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn marker_is_the_floor() {
        let (mut o, d) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new().with_faults(FaultMask::CIRCLE);
        let layout = calculate_layout(800.0, 600.0);
        match o.ensure_playability_at(&mut engine, None, &layout, Instant::now()) {
            Playability::EmergencyMarker(marker) => {
                assert_eq!(marker.role(), ElementRole::Marker);
                assert_eq!(engine.flashing_nodes().len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(d.summary().emergency_marker);
    }

    #[test]
    fn dead_engine_is_unplayable() {
        let (mut o, d) = orchestrator(RecoveryConfig::default());
        let mut engine = HeadlessEngine::new().with_faults(FaultMask::CONTAINER);
        let layout = calculate_layout(800.0, 600.0);
        let outcome = o.ensure_playability_at(&mut engine, None, &layout, Instant::now());
        assert!(!outcome.is_playable());
        assert_eq!(d.exhausted_components(), [PLAYABILITY_COMPONENT]);
    }
}
