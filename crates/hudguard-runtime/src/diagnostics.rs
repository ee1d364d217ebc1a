#![forbid(unsafe_code)]

//! Recovery diagnostics.
//!
//! The collector keeps the last [`DEFAULT_DIAGNOSTICS_CAPACITY`] recovery
//! attempts plus running counters. It is reporting only: nothing in the
//! subsystem reads it back to make a decision.
//!
//! [`Diagnostics`] is a cheap clonable handle. The host builds one, hands a
//! clone to the subsystem, and keeps its own clone for reporting. The
//! subsystem is single-threaded, so the handle is `Rc`-based.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use hudguard_widgets::Strategy;
use web_time::Instant;

/// Attempts kept before the oldest is dropped.
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 100;

/// Which constructor an attempt used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptStage {
    /// The caller's primary factory.
    Primary,
    /// The caller's fallback factory.
    Fallback,
    /// A built-in tier (whole-HUD, or the emergency element constructor).
    Tier(Strategy),
    /// The single flashing playability marker.
    Marker,
}

impl AttemptStage {
    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
            Self::Tier(strategy) => strategy.as_str(),
            Self::Marker => "marker",
        }
    }
}

/// How an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptOutcome {
    Success,
    /// The constructor returned an error or panicked.
    ConstructionFailed,
    /// Construction succeeded but the result failed validation.
    ValidationFailed,
}

impl AttemptOutcome {
    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ConstructionFailed => "construction_failed",
            Self::ValidationFailed => "validation_failed",
        }
    }
}

/// One recorded construction attempt. Immutable once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryAttempt {
    pub timestamp: Instant,
    /// Component id the attempt was made for.
    pub component: String,
    pub stage: AttemptStage,
    pub outcome: AttemptOutcome,
    /// Primary attempt index; 0 for every other stage.
    pub retry_index: u32,
    /// Error summary for failed attempts.
    pub error: Option<String>,
}

impl RecoveryAttempt {
    /// Serialize to one JSONL line. `elapsed_ms` is relative to the first
    /// retained attempt.
    #[must_use]
    pub fn to_jsonl(&self, elapsed_ms: f64) -> String {
        let error = match &self.error {
            Some(e) => format!("\"{}\"", json_escape(e)),
            None => "null".to_string(),
        };
        format!(
            r#"{{"event":"recovery_attempt","elapsed_ms":{:.3},"component":"{}","stage":"{}","outcome":"{}","retry_index":{},"error":{}}}"#,
            elapsed_ms,
            json_escape(&self.component),
            self.stage.as_str(),
            self.outcome.as_str(),
            self.retry_index,
            error
        )
    }
}

/// Counters over the collector's whole lifetime, including attempts no
/// longer retained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsSummary {
    pub attempts: u64,
    pub successes: u64,
    pub construction_failures: u64,
    pub validation_failures: u64,
    /// Recoveries where every tier failed.
    pub exhausted: u64,
    pub flood_activations: u64,
    pub sanitizer_corrections: u64,
    pub layout_corrections: u64,
    /// Element update callbacks that failed during dispatch.
    pub update_failures: u64,
    /// The flashing emergency marker is on screen.
    pub emergency_marker: bool,
    /// Attempts currently retained.
    pub retained: usize,
}

impl DiagnosticsSummary {
    /// Serialize to one JSONL line.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        format!(
            r#"{{"event":"diagnostics_summary","attempts":{},"successes":{},"construction_failures":{},"validation_failures":{},"exhausted":{},"flood_activations":{},"sanitizer_corrections":{},"layout_corrections":{},"update_failures":{},"emergency_marker":{},"retained":{}}}"#,
            self.attempts,
            self.successes,
            self.construction_failures,
            self.validation_failures,
            self.exhausted,
            self.flood_activations,
            self.sanitizer_corrections,
            self.layout_corrections,
            self.update_failures,
            self.emergency_marker,
            self.retained
        )
    }
}

/// Ring buffer of attempts plus counters.
#[derive(Debug, Clone)]
pub struct DiagnosticsCollector {
    capacity: usize,
    attempts: VecDeque<RecoveryAttempt>,
    summary: DiagnosticsSummary,
    exhausted_components: VecDeque<String>,
}

impl Default for DiagnosticsCollector {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_DIAGNOSTICS_CAPACITY)
    }
}

impl DiagnosticsCollector {
    /// Collector retaining at most `capacity` attempts and exhausted
    /// component ids (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            attempts: VecDeque::with_capacity(capacity),
            summary: DiagnosticsSummary::default(),
            exhausted_components: VecDeque::new(),
        }
    }

    pub fn record_attempt(&mut self, attempt: RecoveryAttempt) {
        self.summary.attempts += 1;
        match attempt.outcome {
            AttemptOutcome::Success => self.summary.successes += 1,
            AttemptOutcome::ConstructionFailed => self.summary.construction_failures += 1,
            AttemptOutcome::ValidationFailed => self.summary.validation_failures += 1,
        }
        if self.attempts.len() == self.capacity {
            self.attempts.pop_front();
        }
        self.attempts.push_back(attempt);
    }

    pub fn record_exhaustion(&mut self, component: &str) {
        self.summary.exhausted += 1;
        if self.exhausted_components.len() == self.capacity {
            self.exhausted_components.pop_front();
        }
        self.exhausted_components.push_back(component.to_string());
    }

    pub fn record_flood_activation(&mut self) {
        self.summary.flood_activations += 1;
    }

    pub fn record_corrections(&mut self, sanitizer: usize, layout: usize) {
        self.summary.sanitizer_corrections += sanitizer as u64;
        self.summary.layout_corrections += layout as u64;
    }

    pub fn record_update_failures(&mut self, count: usize) {
        self.summary.update_failures += count as u64;
    }

    pub fn set_emergency_marker(&mut self, showing: bool) {
        self.summary.emergency_marker = showing;
    }

    /// Retained attempts, oldest first.
    pub fn attempts(&self) -> impl Iterator<Item = &RecoveryAttempt> {
        self.attempts.iter()
    }

    /// Most recent exhausted components, oldest first.
    pub fn exhausted_components(&self) -> impl Iterator<Item = &str> {
        self.exhausted_components.iter().map(String::as_str)
    }

    #[must_use]
    pub fn summary(&self) -> DiagnosticsSummary {
        DiagnosticsSummary {
            retained: self.attempts.len(),
            ..self.summary.clone()
        }
    }

    /// Retained attempts followed by the summary, one JSON object per line.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let start = self.attempts.front().map(|a| a.timestamp);
        let mut lines: Vec<String> = self
            .attempts
            .iter()
            .map(|a| {
                let elapsed_ms = start
                    .and_then(|s| a.timestamp.checked_duration_since(s))
                    .map(|d| d.as_secs_f64() * 1000.0)
                    .unwrap_or(0.0);
                a.to_jsonl(elapsed_ms)
            })
            .collect();
        lines.push(self.summary().to_jsonl());
        lines.join("\n")
    }

    pub fn clear(&mut self) {
        self.attempts.clear();
        self.exhausted_components.clear();
        self.summary = DiagnosticsSummary::default();
    }
}

/// Shared handle to a [`DiagnosticsCollector`].
#[derive(Debug, Clone, Default)]
pub struct Diagnostics(Rc<RefCell<DiagnosticsCollector>>);

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Rc::new(RefCell::new(DiagnosticsCollector::with_capacity(
            capacity,
        ))))
    }

    /// Record one attempt.
    pub fn record_attempt(
        &self,
        now: Instant,
        component: &str,
        stage: AttemptStage,
        outcome: AttemptOutcome,
        retry_index: u32,
        error: Option<String>,
    ) {
        self.0.borrow_mut().record_attempt(RecoveryAttempt {
            timestamp: now,
            component: component.to_string(),
            stage,
            outcome,
            retry_index,
            error,
        });
    }

    pub fn record_exhaustion(&self, component: &str) {
        self.0.borrow_mut().record_exhaustion(component);
    }

    pub fn record_flood_activation(&self) {
        self.0.borrow_mut().record_flood_activation();
    }

    pub fn record_corrections(&self, sanitizer: usize, layout: usize) {
        if sanitizer > 0 || layout > 0 {
            self.0.borrow_mut().record_corrections(sanitizer, layout);
        }
    }

    pub fn record_update_failures(&self, count: usize) {
        if count > 0 {
            self.0.borrow_mut().record_update_failures(count);
        }
    }

    pub fn set_emergency_marker(&self, showing: bool) {
        self.0.borrow_mut().set_emergency_marker(showing);
    }

    #[must_use]
    pub fn summary(&self) -> DiagnosticsSummary {
        self.0.borrow().summary()
    }

    /// Copy of the retained attempts, oldest first.
    #[must_use]
    pub fn attempts(&self) -> Vec<RecoveryAttempt> {
        self.0.borrow().attempts().cloned().collect()
    }

    /// Attempts recorded for one component.
    #[must_use]
    pub fn attempts_for(&self, component: &str) -> Vec<RecoveryAttempt> {
        self.0
            .borrow()
            .attempts()
            .filter(|a| a.component == component)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn exhausted_components(&self) -> Vec<String> {
        self.0
            .borrow()
            .exhausted_components()
            .map(str::to_string)
            .collect()
    }

    #[must_use]
    pub fn to_jsonl(&self) -> String {
        self.0.borrow().to_jsonl()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub(crate) fn json_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write as _;
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fail(d: &Diagnostics, now: Instant, component: &str, retry: u32) {
        d.record_attempt(
            now,
            component,
            AttemptStage::Primary,
            AttemptOutcome::ConstructionFailed,
            retry,
            Some("render error".into()),
        );
    }

    #[test]
    fn ring_buffer_drops_oldest_but_counts_everything() {
        let d = Diagnostics::with_capacity(3);
        let now = Instant::now();
        for i in 0..5 {
            fail(&d, now, &format!("c{i}"), 0);
        }
        let kept: Vec<_> = d.attempts().into_iter().map(|a| a.component).collect();
        assert_eq!(kept, ["c2", "c3", "c4"]);
        let s = d.summary();
        assert_eq!(s.attempts, 5);
        assert_eq!(s.construction_failures, 5);
        assert_eq!(s.retained, 3);
    }

    #[test]
    fn exhausted_components_stay_bounded() {
        let d = Diagnostics::with_capacity(4);
        for i in 0..50 {
            d.record_exhaustion(&format!("c{i}"));
        }
        assert_eq!(d.exhausted_components(), ["c46", "c47", "c48", "c49"]);
        assert_eq!(d.summary().exhausted, 50);
    }

    #[test]
    fn clones_share_state() {
        let host = Diagnostics::new();
        let subsystem = host.clone();
        subsystem.record_flood_activation();
        subsystem.record_exhaustion("score");
        subsystem.set_emergency_marker(true);
        let s = host.summary();
        assert_eq!(s.flood_activations, 1);
        assert_eq!(s.exhausted, 1);
        assert!(s.emergency_marker);
        assert_eq!(host.exhausted_components(), ["score"]);
    }

    #[test]
    fn zero_counts_are_not_recorded() {
        let d = Diagnostics::new();
        d.record_corrections(0, 0);
        d.record_update_failures(0);
        assert_eq!(d.summary(), DiagnosticsSummary::default());
        d.record_corrections(2, 1);
        assert_eq!(d.summary().sanitizer_corrections, 2);
        assert_eq!(d.summary().layout_corrections, 1);
    }

    #[test]
    fn jsonl_has_one_line_per_attempt_plus_summary() {
        let d = Diagnostics::new();
        let t0 = Instant::now();
        fail(&d, t0, "timer", 0);
        d.record_attempt(
            t0 + Duration::from_millis(100),
            "timer",
            AttemptStage::Tier(Strategy::Emergency),
            AttemptOutcome::Success,
            0,
            None,
        );
        let jsonl = d.to_jsonl();
        let lines: Vec<_> = jsonl.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(r#""stage":"primary""#));
        assert!(lines[0].contains(r#""error":"render error""#));
        assert!(lines[1].contains(r#""elapsed_ms":100.000"#));
        assert!(lines[1].contains(r#""stage":"emergency""#));
        assert!(lines[1].contains(r#""error":null"#));
        assert!(lines[2].starts_with(r#"{"event":"diagnostics_summary","attempts":2,"#));
    }

    #[test]
    fn json_escape_quotes_and_controls() {
        assert_eq!(json_escape("a\"b\\c\n"), "a\\\"b\\\\c\\n");
        assert_eq!(json_escape("\u{1}"), "\\u0001");
    }

    #[test]
    fn clear_resets() {
        let d = Diagnostics::new();
        fail(&d, Instant::now(), "x", 0);
        d.clear();
        assert!(d.attempts().is_empty());
        assert_eq!(d.summary().attempts, 0);
    }
}
