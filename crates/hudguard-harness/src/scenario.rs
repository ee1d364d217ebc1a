#![forbid(unsafe_code)]

//! Headless scenario runner: one storm against one subsystem.
//!
//! The run uses a virtual clock: signal delays advance it, frames tick it,
//! and nothing sleeps. Identical configs produce identical reports.
//!
//! # JSONL Schema
//!
//! ```json
//! {"event":"storm_start","case":"default","seed":42,"pattern":"mixed","event_count":200,"fail_rate":0.0}
//! {"event":"hud_built","strategy":"rich","playable":true}
//! {"event":"storm_resize","idx":0,"width":1030.0,"height":768.0,"orientation":false,"delay_ms":4,"elapsed_ms":4,"action":"apply"}
//! {"event":"recovery_exhausted","component":"combo","attempts":5,"elapsed_ms":310}
//! {"event":"storm_complete","outcome":"pass","signals":200,"layouts_applied":9,...}
//! {"event":"diagnostics_summary","attempts":12,...}
//! ```

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use hudguard::{
    ConstructionError, Diagnostics, DiagnosticsSummary, ElementFactory, ElementRequest,
    ElementRole, ElementStatus, FloodAction, HeadlessEngine, HudSubsystem, Instant, RenderEngine,
    SceneError, Strategy, SubsystemConfig, TickOutcome, UiElement,
};
use serde_json::json;

use crate::storm::{ResizeStorm, StormConfig};

/// Registry id of the element the runner recovers mid-storm.
pub const PROBE_COMPONENT: &str = "combo";

/// Quiet period after the last signal before the final checks.
const SETTLE_MS: u64 = 5_000;
/// Upper bound on deadline-driven ticks while settling.
const MAX_SETTLE_TICKS: usize = 64;

/// Scenario settings.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Storm to replay.
    pub storm: StormConfig,
    /// Subsystem settings. The initial size is taken from the storm.
    pub subsystem: SubsystemConfig,
    /// Seeded node-creation failure rate injected into the engine.
    pub fail_rate: f64,
    /// Frame interval at which the host ticks the subsystem (0 disables).
    pub frame_ms: u64,
    /// Recover the probe element after every this many signals (0 disables).
    pub recover_every: usize,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            storm: StormConfig::default(),
            subsystem: SubsystemConfig::default(),
            fail_rate: 0.0,
            frame_ms: 16,
            recover_every: 50,
        }
    }
}

impl ScenarioConfig {
    #[must_use]
    pub fn with_storm(mut self, storm: StormConfig) -> Self {
        self.storm = storm;
        self
    }

    #[must_use]
    pub fn with_subsystem(mut self, subsystem: SubsystemConfig) -> Self {
        self.subsystem = subsystem;
        self
    }

    #[must_use]
    pub fn with_fail_rate(mut self, rate: f64) -> Self {
        self.fail_rate = rate;
        self
    }

    #[must_use]
    pub fn with_frame_ms(mut self, frame_ms: u64) -> Self {
        self.frame_ms = frame_ms;
        self
    }

    #[must_use]
    pub fn with_recover_every(mut self, every: usize) -> Self {
        self.recover_every = every;
        self
    }
}

/// Outcome of [`run_scenario`].
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// Signals replayed.
    pub signals: usize,
    /// Layout recomputations that reached listeners.
    pub layouts_applied: usize,
    /// Signals folded into a later application.
    pub coalesced: usize,
    /// Times flood protection engaged.
    pub flood_activations: u64,
    /// Tier of the HUD on screen at the end, if any.
    pub hud_strategy: Option<Strategy>,
    /// Probe recoveries that produced an element.
    pub recovered: usize,
    /// Probe recoveries that ran out of tiers.
    pub exhausted: usize,
    /// Something interactive was on screen at the end.
    pub playable: bool,
    /// The emergency marker was on screen at the end.
    pub marker: bool,
    /// Every layout-owned element was inside the final viewport.
    pub in_bounds: bool,
    /// Collector counters at the end.
    pub diagnostics: DiagnosticsSummary,
    /// Checksum of the replayed storm.
    pub sequence_checksum: String,
    /// Report lines.
    pub lines: Vec<String>,
}

impl ScenarioReport {
    /// The HUD stayed playable and in bounds.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.playable && self.in_bounds
    }

    #[must_use]
    pub fn to_jsonl(&self) -> String {
        self.lines.join("\n")
    }
}

/// Replay `config.storm` against a fresh subsystem on a headless engine.
pub fn run_scenario(config: &ScenarioConfig) -> Result<ScenarioReport, SceneError> {
    let storm = ResizeStorm::new(config.storm.clone());
    let (width, height) = config.storm.initial_size;
    let engine = HeadlessEngine::new().with_random_faults(config.storm.seed, config.fail_rate);
    let subsystem = config.subsystem.clone().with_initial_size(width, height);
    let mut run = Run::new(HudSubsystem::new(subsystem, engine, Diagnostics::new()));

    run.lines.push(
        json!({
            "event": "storm_start",
            "case": config.storm.case_name,
            "seed": config.storm.seed,
            "pattern": config.storm.pattern.name(),
            "event_count": storm.signals().len(),
            "fail_rate": config.fail_rate,
        })
        .to_string(),
    );

    let start = run.at(0);
    let built = run.hud.recover_whole_hud_at(start)?;
    let playable = run.hud.ensure_playability_at(start)?;
    run.lines.push(
        json!({
            "event": "hud_built",
            "strategy": built.map(Strategy::as_str),
            "playable": playable,
        })
        .to_string(),
    );

    let mut elapsed = 0u64;
    let mut coalesced = 0usize;
    for signal in storm.signals() {
        let target = elapsed + signal.delay_ms;
        while config.frame_ms > 0 && elapsed + config.frame_ms < target {
            elapsed += config.frame_ms;
            run.tick(elapsed)?;
        }
        elapsed = target;
        let now = run.at(elapsed);

        let action = match run.hud.handle_resize_at(signal.to_event(), now)? {
            FloodAction::None => "none",
            FloodAction::Coalesce => {
                coalesced += 1;
                "coalesce"
            }
            FloodAction::Apply { forced: true, .. } => "apply_forced",
            FloodAction::Apply { .. } => "apply",
        };
        run.lines.push(signal.to_jsonl(elapsed, action));

        if config.recover_every > 0 && (signal.index + 1) % config.recover_every == 0 {
            let request = ElementRequest::for_role(ElementRole::Score, run.hud.layout());
            let status = run.hud.recover_element_at(
                PROBE_COMPONENT,
                request,
                tier_factory(Strategy::Rich),
                Some(tier_factory(Strategy::Graphics)),
                now,
            )?;
            run.note_status(&status, elapsed);
        }
    }

    elapsed += SETTLE_MS;
    run.tick(elapsed)?;
    for _ in 0..MAX_SETTLE_TICKS {
        let Some(deadline) = run.hud.next_deadline(run.at(elapsed)) else {
            break;
        };
        elapsed = elapsed.max(deadline.duration_since(run.base).as_millis() as u64);
        run.tick(elapsed)?;
    }

    let end = run.at(elapsed);
    let playable = run.hud.ensure_playability_at(end)?;
    let placed = run.hud.update_element_positions()?;
    let in_bounds = placed.in_bounds && run.hud.layout().validate().is_valid();

    let report = ScenarioReport {
        signals: storm.signals().len(),
        layouts_applied: run.applied.get(),
        coalesced,
        flood_activations: run.hud.flood_stats().flood_activations,
        hud_strategy: run.hud.hud().map(|map| map.strategy()),
        recovered: run.recovered,
        exhausted: run.exhausted,
        playable,
        marker: run.hud.marker_visible(),
        in_bounds,
        diagnostics: run.hud.diagnostics().summary(),
        sequence_checksum: storm.sequence_checksum(),
        lines: Vec::new(),
    };
    run.hud.destroy();

    let mut lines = run.lines;
    lines.push(
        json!({
            "event": "storm_complete",
            "outcome": if report.passed() { "pass" } else { "fail" },
            "signals": report.signals,
            "layouts_applied": report.layouts_applied,
            "coalesced": report.coalesced,
            "flood_activations": report.flood_activations,
            "hud_strategy": report.hud_strategy.map(Strategy::as_str),
            "recovered": report.recovered,
            "exhausted": report.exhausted,
            "playable": report.playable,
            "marker": report.marker,
            "in_bounds": report.in_bounds,
            "elapsed_ms": elapsed,
            "sequence_checksum": report.sequence_checksum,
        })
        .to_string(),
    );
    lines.push(report.diagnostics.to_jsonl());
    tracing::info!(
        passed = report.passed(),
        signals = report.signals,
        layouts_applied = report.layouts_applied,
        flood_activations = report.flood_activations,
        "scenario finished"
    );
    Ok(ScenarioReport { lines, ..report })
}

/// Per-run state threaded through the replay loop.
struct Run {
    hud: HudSubsystem<HeadlessEngine>,
    base: Instant,
    applied: Rc<Cell<usize>>,
    recovered: usize,
    exhausted: usize,
    lines: Vec<String>,
}

impl Run {
    fn new(mut hud: HudSubsystem<HeadlessEngine>) -> Self {
        let applied = Rc::new(Cell::new(0));
        let counter = Rc::clone(&applied);
        hud.on_resize(move |_| counter.set(counter.get() + 1));
        Self {
            hud,
            base: Instant::now(),
            applied,
            recovered: 0,
            exhausted: 0,
            lines: Vec::new(),
        }
    }

    fn at(&self, elapsed_ms: u64) -> Instant {
        self.base + Duration::from_millis(elapsed_ms)
    }

    fn tick(&mut self, elapsed_ms: u64) -> Result<(), SceneError> {
        let now = self.at(elapsed_ms);
        let TickOutcome {
            recovered,
            exhausted,
            ..
        } = self.hud.tick_at(now)?;
        self.recovered += recovered.len();
        for failure in exhausted {
            self.exhausted += 1;
            self.log_exhausted(&failure.component, failure.attempts, elapsed_ms);
        }
        Ok(())
    }

    fn note_status(&mut self, status: &ElementStatus, elapsed_ms: u64) {
        match status {
            ElementStatus::Ready => self.recovered += 1,
            ElementStatus::Pending(_) => {}
            ElementStatus::Exhausted(failure) => {
                self.exhausted += 1;
                self.log_exhausted(&failure.component, failure.attempts, elapsed_ms);
            }
        }
    }

    fn log_exhausted(&mut self, component: &str, attempts: u32, elapsed_ms: u64) {
        self.lines.push(
            json!({
                "event": "recovery_exhausted",
                "component": component,
                "attempts": attempts,
                "elapsed_ms": elapsed_ms,
            })
            .to_string(),
        );
    }
}

/// Element factory that builds with one stock tier.
fn tier_factory(strategy: Strategy) -> ElementFactory {
    Box::new(
        move |engine: &mut dyn RenderEngine,
              request: &ElementRequest|
              -> Result<UiElement, ConstructionError> { strategy.build(engine, request) },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storm::StormPattern;

    fn config(pattern: StormPattern) -> ScenarioConfig {
        ScenarioConfig::default().with_storm(StormConfig::default().with_seed(9).with_pattern(pattern))
    }

    #[test]
    fn sweep_applies_layouts_and_passes() {
        let report = run_scenario(&config(StormPattern::Sweep {
            start: (400.0, 600.0),
            end: (1600.0, 900.0),
            steps: 10,
        }))
        .unwrap();
        assert!(report.passed());
        assert!(report.layouts_applied >= 1);
        assert_eq!(report.flood_activations, 0);
        assert_eq!(report.hud_strategy, Some(Strategy::Rich));
    }

    #[test]
    fn report_brackets_signal_lines() {
        let report = run_scenario(&config(StormPattern::Burst { count: 12 })).unwrap();
        let events: Vec<String> = report
            .lines
            .iter()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["event"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(events.first().map(String::as_str), Some("storm_start"));
        assert_eq!(events[1], "hud_built");
        assert_eq!(
            events.iter().filter(|e| *e == "storm_resize").count(),
            12
        );
        assert_eq!(events[events.len() - 2], "storm_complete");
        assert_eq!(events[events.len() - 1], "diagnostics_summary");
    }

    #[test]
    fn probe_is_recovered_on_a_healthy_engine() {
        let report = run_scenario(
            &config(StormPattern::Burst { count: 20 }).with_recover_every(10),
        )
        .unwrap();
        assert_eq!(report.recovered, 2);
        assert_eq!(report.exhausted, 0);
    }
}
