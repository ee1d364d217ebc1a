#![forbid(unsafe_code)]

//! The HUD subsystem: one owner for layout, elements, and recovery.
//!
//! [`HudSubsystem`] owns the current [`LayoutConfig`] snapshot, the element
//! registry, the flood guard, and the recovery orchestrator. Hosts feed it
//! resize signals and domain updates, call [`HudSubsystem::tick_at`] from
//! their frame or timer callback, and read positions back. Every mutation
//! of a live element goes through one of its operations.
//!
//! Each operation starts with [`HudSubsystem::validate_scene_state`]; after
//! [`HudSubsystem::destroy`] or once the engine reports its context lost,
//! operations return [`SceneError`] instead of touching the engine.

use std::collections::BTreeMap;
use std::fmt;

use hudguard_core::Instant;
use hudguard_core::event::{DomainUpdate, ResizeEvent, ResizeSource};
use hudguard_layout::{LayoutConfig, LayoutCorrection, calculate_layout_for, validate_anchors};
use hudguard_render::RenderEngine;
use hudguard_runtime::{
    Diagnostics, ExhaustionFailure, FloodAction, FloodGuard, FloodGuardConfig, FloodStats,
    Playability, RecoveryConfig, RecoveryOrchestrator, RecoveryPoll, RecoveryState,
    RecoveryTicket,
};
use hudguard_widgets::{
    ElementFactory, ElementMap, ElementRequest, HudBuilder, PlacementReport, Strategy, UiElement,
    default_hud_builder, update_element_positions,
};

use crate::SceneError;

/// Construction-time settings for a [`HudSubsystem`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubsystemConfig {
    /// Retry and fallback policy.
    pub recovery: RecoveryConfig,
    /// Resize debouncing and flood protection.
    pub flood: FloodGuardConfig,
    /// Viewport assumed until the first resize signal is applied.
    pub initial_size: (f64, f64),
    /// Pixel density reported with the initial viewport.
    pub pixel_density: f64,
}

impl Default for SubsystemConfig {
    fn default() -> Self {
        Self {
            recovery: RecoveryConfig::default(),
            flood: FloodGuardConfig::default(),
            initial_size: (800.0, 600.0),
            pixel_density: 1.0,
        }
    }
}

impl SubsystemConfig {
    /// Defaults with `HUDGUARD_*` environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            recovery: RecoveryConfig::from_env(),
            flood: FloodGuardConfig::from_env(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_recovery(mut self, recovery: RecoveryConfig) -> Self {
        self.recovery = recovery;
        self
    }

    #[must_use]
    pub fn with_flood(mut self, flood: FloodGuardConfig) -> Self {
        self.flood = flood;
        self
    }

    #[must_use]
    pub fn with_initial_size(mut self, width: f64, height: f64) -> Self {
        self.initial_size = (width, height);
        self
    }

    #[must_use]
    pub fn with_pixel_density(mut self, density: f64) -> Self {
        self.pixel_density = density;
        self
    }
}

/// Handle returned by [`HudSubsystem::on_resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Payload delivered to resize listeners after a layout is applied.
#[derive(Debug, Clone, Copy)]
pub struct LayoutApplied<'a> {
    /// The layout now in effect.
    pub layout: &'a LayoutConfig,
    /// What kind of host signal produced it.
    pub source: ResizeSource,
    /// Signals folded into this application.
    pub coalesced: u32,
    /// Placement found elements out of bounds and recomputed the layout.
    pub forced: bool,
}

/// Resize listener callback.
pub type ResizeListener = Box<dyn FnMut(&LayoutApplied<'_>)>;

/// Result of [`HudSubsystem::update_element_positions`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PositionUpdate {
    /// Placement counts from the final pass.
    pub report: PlacementReport,
    /// Every layout-owned element ended inside the viewport.
    pub in_bounds: bool,
    /// A fresh layout was computed after the first pass failed the check.
    pub forced: bool,
}

/// Where an element recovery stands after [`HudSubsystem::recover_element_at`].
#[derive(Debug, Clone, PartialEq)]
pub enum ElementStatus {
    /// The element is built and registered.
    Ready,
    /// A retry is parked; [`HudSubsystem::tick_at`] will finish it.
    Pending(RecoveryTicket),
    /// Every tier failed.
    Exhausted(ExhaustionFailure),
}

/// What one [`HudSubsystem::tick_at`] call did.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// A coalesced resize was applied.
    pub layout_applied: bool,
    /// Components whose parked recovery produced an element.
    pub recovered: Vec<String>,
    /// Components whose parked recovery ran out of tiers.
    pub exhausted: Vec<ExhaustionFailure>,
}

/// Owner of the HUD: layout snapshot, element registry, flood guard, and
/// recovery orchestrator, bound to one rendering engine.
pub struct HudSubsystem<E: RenderEngine> {
    engine: E,
    diagnostics: Diagnostics,
    flood: FloodGuard,
    orchestrator: RecoveryOrchestrator,
    builder: HudBuilder,
    layout: LayoutConfig,
    current: ResizeEvent,
    hud: Option<ElementMap>,
    elements: BTreeMap<String, UiElement>,
    marker: Option<UiElement>,
    listeners: Vec<(ListenerId, ResizeListener)>,
    next_listener: u64,
    destroyed: bool,
}

impl<E: RenderEngine> fmt::Debug for HudSubsystem<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HudSubsystem")
            .field("layout", &self.layout.device_class)
            .field("hud", &self.hud.as_ref().map(ElementMap::strategy))
            .field("elements", &self.elements.keys().collect::<Vec<_>>())
            .field("marker", &self.marker.is_some())
            .field("listeners", &self.listeners.len())
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl<E: RenderEngine> HudSubsystem<E> {
    /// Bind a subsystem to `engine`. Computes the initial layout; builds
    /// nothing until a recovery operation is called.
    pub fn new(config: SubsystemConfig, engine: E, diagnostics: Diagnostics) -> Self {
        let (width, height) = config.initial_size;
        let initial = ResizeEvent::new(width, height).with_pixel_density(config.pixel_density);
        let layout = calculate_layout_for(&initial.sanitize());
        record_corrections(&diagnostics, &layout);
        Self {
            engine,
            flood: FloodGuard::new(config.flood, initial),
            orchestrator: RecoveryOrchestrator::new(config.recovery, diagnostics.clone()),
            diagnostics,
            builder: default_hud_builder(),
            layout,
            current: initial,
            hud: None,
            elements: BTreeMap::new(),
            marker: None,
            listeners: Vec::new(),
            next_listener: 0,
            destroyed: false,
        }
    }

    /// Replace the whole-HUD constructor used by [`Self::recover_whole_hud_at`].
    #[must_use]
    pub fn with_hud_builder(mut self, builder: HudBuilder) -> Self {
        self.builder = builder;
        self
    }

    // ── Accessors ───────────────────────────────────────────────────────

    /// The layout snapshot in effect.
    #[must_use]
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable engine access, for hosts that swap resources or inject
    /// faults. Moving element nodes through it bypasses validation.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// The current whole HUD, if one is built.
    #[must_use]
    pub fn hud(&self) -> Option<&ElementMap> {
        self.hud.as_ref()
    }

    /// A registered element by component id.
    #[must_use]
    pub fn element(&self, component: &str) -> Option<&UiElement> {
        self.elements.get(component)
    }

    /// Registered component ids, sorted.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    /// The emergency marker is on screen.
    #[must_use]
    pub fn marker_visible(&self) -> bool {
        self.marker
            .as_ref()
            .is_some_and(|m| m.is_visible(&self.engine))
    }

    #[must_use]
    pub fn recovery_state(&self, component: &str) -> RecoveryState {
        self.orchestrator.state(component)
    }

    #[must_use]
    pub fn flood_stats(&self) -> FloodStats {
        self.flood.stats()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Earliest instant at which [`Self::tick_at`] has work to do.
    #[must_use]
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        let flood = self.flood.time_until_apply(now).map(|wait| now + wait);
        match (flood, self.orchestrator.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ── Precondition ────────────────────────────────────────────────────

    /// Check the subsystem can touch the engine.
    pub fn validate_scene_state(&self) -> Result<(), SceneError> {
        if self.destroyed {
            return Err(SceneError::Destroyed);
        }
        if !self.engine.is_alive() {
            return Err(SceneError::EngineLost);
        }
        Ok(())
    }

    // ── Layout ──────────────────────────────────────────────────────────

    /// Layout for an arbitrary viewport. Pure; does not change the
    /// snapshot in effect.
    #[must_use]
    pub fn calculate_layout(&self, width: f64, height: f64) -> LayoutConfig {
        hudguard_layout::calculate_layout(width, height)
    }

    /// Feed one raw resize or orientation signal through the flood guard.
    ///
    /// When the guard applies a signal the layout is recomputed, every
    /// element is repositioned, and listeners are notified.
    pub fn handle_resize_at(
        &mut self,
        event: ResizeEvent,
        now: Instant,
    ) -> Result<FloodAction, SceneError> {
        self.validate_scene_state()?;
        let before = self.flood.flood_activations();
        let action = self.flood.handle_resize_at(event, now);
        self.note_flood_activations(before);
        if let FloodAction::Apply {
            event, coalesced, ..
        } = action
        {
            self.apply_signal(event, coalesced);
        }
        Ok(action)
    }

    /// [`Self::handle_resize_at`] at the current instant.
    pub fn handle_resize(&mut self, event: ResizeEvent) -> Result<FloodAction, SceneError> {
        self.handle_resize_at(event, Instant::now())
    }

    /// Move every layout-owned element to its anchor in the current layout.
    ///
    /// If any anchor lands outside the viewport afterwards, the layout is
    /// recomputed from the last applied signal and reapplied once.
    pub fn update_element_positions(&mut self) -> Result<PositionUpdate, SceneError> {
        self.validate_scene_state()?;
        Ok(self.reposition())
    }

    fn reposition(&mut self) -> PositionUpdate {
        let mut report = self.place_all();
        let mut in_bounds = self.all_in_bounds();
        let mut forced = false;
        if !in_bounds {
            let size = self.layout.size();
            tracing::warn!(
                width = size.width,
                height = size.height,
                failures = report.failures.len(),
                "elements outside viewport; recomputing layout"
            );
            self.layout = calculate_layout_for(&self.current.sanitize());
            report = self.place_all();
            in_bounds = self.all_in_bounds();
            forced = true;
            if !in_bounds {
                tracing::warn!("elements still outside viewport after recompute");
            }
        }
        PositionUpdate {
            report,
            in_bounds,
            forced,
        }
    }

    // ── Scheduling ──────────────────────────────────────────────────────

    /// Flush a due resize and run due recovery retries.
    pub fn tick_at(&mut self, now: Instant) -> Result<TickOutcome, SceneError> {
        self.validate_scene_state()?;
        let mut outcome = TickOutcome::default();

        let before = self.flood.flood_activations();
        let action = self.flood.tick_at(now);
        self.note_flood_activations(before);
        if let FloodAction::Apply {
            event, coalesced, ..
        } = action
        {
            self.apply_signal(event, coalesced);
            outcome.layout_applied = true;
        }

        for completion in self.orchestrator.tick_at(&mut self.engine, now) {
            match completion.result {
                Ok(element) => {
                    self.register(completion.component.clone(), element);
                    outcome.recovered.push(completion.component);
                }
                Err(failure) => outcome.exhausted.push(failure),
            }
        }
        Ok(outcome)
    }

    /// [`Self::tick_at`] at the current instant.
    pub fn tick(&mut self) -> Result<TickOutcome, SceneError> {
        self.tick_at(Instant::now())
    }

    // ── Recovery ────────────────────────────────────────────────────────

    /// Build (or rebuild) the element registered as `component`.
    ///
    /// On success the element replaces any previous one with that id and is
    /// moved to its anchor in the current layout.
    pub fn recover_element_at(
        &mut self,
        component: &str,
        request: ElementRequest,
        primary: ElementFactory,
        fallback: Option<ElementFactory>,
        now: Instant,
    ) -> Result<ElementStatus, SceneError> {
        self.validate_scene_state()?;
        let poll = self.orchestrator.recover_element_at(
            &mut self.engine,
            component,
            request,
            primary,
            fallback,
            now,
        );
        Ok(match poll {
            RecoveryPoll::Ready(Ok(element)) => {
                self.register(component.to_string(), element);
                ElementStatus::Ready
            }
            RecoveryPoll::Ready(Err(failure)) => ElementStatus::Exhausted(failure),
            RecoveryPoll::Pending(ticket) => ElementStatus::Pending(ticket),
        })
    }

    /// [`Self::recover_element_at`] at the current instant.
    pub fn recover_element(
        &mut self,
        component: &str,
        request: ElementRequest,
        primary: ElementFactory,
        fallback: Option<ElementFactory>,
    ) -> Result<ElementStatus, SceneError> {
        self.recover_element_at(component, request, primary, fallback, Instant::now())
    }

    /// Tear down the current HUD and rebuild it, walking the fallback chain.
    ///
    /// Returns the tier that succeeded, or `None` when every tier failed and
    /// no HUD is shown.
    pub fn recover_whole_hud_at(&mut self, now: Instant) -> Result<Option<Strategy>, SceneError> {
        self.validate_scene_state()?;
        if let Some(old) = self.hud.take() {
            old.teardown(&mut self.engine);
        }
        match self.orchestrator.recover_whole_hud_at(
            &mut self.engine,
            &mut self.builder,
            &self.layout,
            now,
        ) {
            Ok(map) => {
                let strategy = map.strategy();
                self.hud = Some(map);
                self.retire_marker();
                Ok(Some(strategy))
            }
            Err(_) => Ok(None),
        }
    }

    /// [`Self::recover_whole_hud_at`] at the current instant.
    pub fn recover_whole_hud(&mut self) -> Result<Option<Strategy>, SceneError> {
        self.recover_whole_hud_at(Instant::now())
    }

    /// Make sure something interactive is on screen.
    ///
    /// Returns `false` only when even the emergency marker could not be
    /// placed.
    pub fn ensure_playability_at(&mut self, now: Instant) -> Result<bool, SceneError> {
        self.validate_scene_state()?;
        if self.marker_visible()
            || self
                .elements
                .values()
                .any(|e| e.is_interactive() && e.is_visible(&self.engine))
        {
            return Ok(true);
        }
        match self.orchestrator.ensure_playability_at(
            &mut self.engine,
            self.hud.as_ref(),
            &self.layout,
            now,
        ) {
            Playability::AlreadyPlayable => Ok(true),
            Playability::MinimalHud(map) => {
                if let Some(old) = self.hud.replace(map) {
                    old.teardown(&mut self.engine);
                }
                self.retire_marker();
                Ok(true)
            }
            Playability::EmergencyMarker(marker) => {
                if let Some(old) = self.marker.replace(marker) {
                    old.teardown(&mut self.engine);
                }
                Ok(true)
            }
            Playability::Unplayable(_) => Ok(false),
        }
    }

    /// [`Self::ensure_playability_at`] at the current instant.
    pub fn ensure_playability(&mut self) -> Result<bool, SceneError> {
        self.ensure_playability_at(Instant::now())
    }

    // ── Domain updates ──────────────────────────────────────────────────

    /// Forward a game-event update to every live element.
    ///
    /// Per-element failures are logged and counted; the return value is the
    /// number of elements that failed.
    pub fn dispatch(&mut self, update: &DomainUpdate) -> Result<usize, SceneError> {
        self.validate_scene_state()?;
        let mut failures = match self.hud.as_mut() {
            Some(hud) => hud.dispatch(&mut self.engine, update),
            None => Vec::new(),
        };
        for element in self.elements.values_mut() {
            if let Err(err) = element.update(&mut self.engine, update) {
                failures.push((element.role(), err));
            }
        }
        for (role, err) in &failures {
            tracing::warn!(
                role = role.as_str(),
                update = update.kind(),
                error = %err,
                "element update failed"
            );
        }
        self.diagnostics.record_update_failures(failures.len());
        Ok(failures.len())
    }

    // ── Listeners ───────────────────────────────────────────────────────

    /// Call `listener` after every applied layout.
    pub fn on_resize(&mut self, listener: impl FnMut(&LayoutApplied<'_>) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    // ── Teardown ────────────────────────────────────────────────────────

    /// Cancel every scheduled continuation, destroy every element, and drop
    /// every listener. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        let cancelled = self.orchestrator.cancel_all();
        let pending_resize = self.flood.cancel_pending();
        if let Some(hud) = self.hud.take() {
            hud.teardown(&mut self.engine);
        }
        for element in std::mem::take(&mut self.elements).into_values() {
            element.teardown(&mut self.engine);
        }
        self.retire_marker();
        self.listeners.clear();
        self.destroyed = true;
        tracing::debug!(cancelled, pending_resize, "hud subsystem destroyed");
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn apply_signal(&mut self, event: ResizeEvent, coalesced: u32) {
        self.current = event;
        self.layout = calculate_layout_for(&event.sanitize());
        record_corrections(&self.diagnostics, &self.layout);
        let size = self.layout.size();
        tracing::debug!(
            width = size.width,
            height = size.height,
            device_class = self.layout.device_class.label(),
            coalesced,
            "layout applied"
        );
        let placed = self.reposition();

        let applied = LayoutApplied {
            layout: &self.layout,
            source: event.source,
            coalesced,
            forced: placed.forced,
        };
        for (_, listener) in &mut self.listeners {
            listener(&applied);
        }
    }

    fn place_all(&mut self) -> PlacementReport {
        let Self {
            engine,
            hud,
            elements,
            layout,
            ..
        } = self;
        let live = hud
            .iter_mut()
            .flat_map(|map| map.iter_mut())
            .chain(elements.values_mut());
        update_element_positions(engine, live, layout)
    }

    fn all_in_bounds(&self) -> bool {
        let anchors = self
            .hud
            .iter()
            .flat_map(|map| map.iter())
            .chain(self.elements.values())
            .filter(|e| e.role().region().is_some())
            .map(|e| (e.role(), e.position()));
        validate_anchors(anchors, self.layout.size()).is_valid()
    }

    fn register(&mut self, component: String, mut element: UiElement) {
        if let Some(region) = element.role().region() {
            let target = self.layout.anchor(region);
            if let Err(err) = element.set_position(&mut self.engine, target) {
                tracing::warn!(
                    component = component.as_str(),
                    error = %err,
                    "recovered element could not be moved to its anchor"
                );
            }
        }
        if let Some(old) = self.elements.insert(component, element) {
            old.teardown(&mut self.engine);
        }
    }

    fn retire_marker(&mut self) {
        if let Some(marker) = self.marker.take() {
            marker.teardown(&mut self.engine);
            self.diagnostics.set_emergency_marker(false);
        }
    }

    fn note_flood_activations(&self, before: u64) {
        for _ in before..self.flood.flood_activations() {
            self.diagnostics.record_flood_activation();
        }
    }
}

fn record_corrections(diagnostics: &Diagnostics, layout: &LayoutConfig) {
    let sanitizer = layout
        .corrections
        .iter()
        .filter(|c| matches!(c, LayoutCorrection::Viewport(_)))
        .count();
    diagnostics.record_corrections(sanitizer, layout.corrections.len() - sanitizer);
}
