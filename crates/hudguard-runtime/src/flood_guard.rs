#![forbid(unsafe_code)]

//! Resize flood guard.
//!
//! Sits between the host's resize/orientation signals and the layout
//! calculator so layout is recomputed at a bounded rate however fast the
//! host fires.
//!
//! - **Latest-wins**: only the most recent pending signal is applied.
//! - **Trailing debounce**: a pending signal applies once no new signal has
//!   arrived for the current debounce.
//! - **Bounded wait**: a pending signal applies no later than `max_wait`
//!   after it started pending, even if signals never stop.
//! - **Flood protection**: more than `flood_ceiling` signals inside the
//!   sliding `window` raises the flood flag and stretches the debounce by
//!   `flood_delay_multiplier` (capped at `max_debounce`). The flag and the
//!   counter reset once a full `window` passes without a signal.
//!
//! # Decision Rule
//!
//! 1) If the guard is flooded and the last signal is older than `window`,
//!    **reset** flood protection.
//! 2) If the pending signal has waited `max_wait`, **apply** (forced).
//! 3) On a signal arriving after a quiet gap of at least the debounce while
//!    not flooded, **apply** at once.
//! 4) On tick, if the last signal is older than the debounce, **apply**.
//! 5) Otherwise **coalesce**.
//!
//! Identical event sequences produce identical decisions; every method has
//! an `*_at(now)` form so tests drive time explicitly.

use std::collections::VecDeque;
use std::time::Duration;

use hudguard_core::event::ResizeEvent;
use web_time::Instant;

use crate::config::FloodGuardConfig;

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv_hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= *byte as u64;
        *hash = hash.wrapping_mul(FNV_PRIME);
    }
}

#[inline]
fn duration_since_or_zero(now: Instant, earlier: Instant) -> Duration {
    now.checked_duration_since(earlier)
        .unwrap_or(Duration::ZERO)
}

#[inline]
fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn json_f64(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        "null".to_string()
    }
}

/// What the caller should do after feeding the guard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FloodAction {
    /// Nothing pending.
    None,
    /// The signal is pending; keep showing the current layout.
    Coalesce,
    /// Recompute and apply layout for `event`.
    Apply {
        event: ResizeEvent,
        /// Signals folded into this one.
        coalesced: u32,
        /// How long the signal was pending.
        coalesce_time: Duration,
        /// Applied because `max_wait` expired.
        forced: bool,
    },
}

impl FloodAction {
    /// The event to apply, if any.
    #[must_use]
    pub fn applied(&self) -> Option<&ResizeEvent> {
        match self {
            Self::Apply { event, .. } => Some(event),
            _ => None,
        }
    }
}

/// One decision, for the in-memory log.
#[derive(Debug, Clone, PartialEq)]
pub struct FloodDecision {
    /// Elapsed time since logging started (ms).
    pub elapsed_ms: f64,
    /// Signals seen so far.
    pub event_idx: u64,
    /// Time since the previous signal (ms).
    pub dt_ms: f64,
    /// Signals inside the sliding window.
    pub window_count: usize,
    pub flood_active: bool,
    /// Debounce in effect after the decision (ms).
    pub debounce_ms: f64,
    pub action: &'static str,
    pub pending: Option<(f64, f64)>,
    pub applied: Option<(f64, f64)>,
    /// Time the applied signal spent pending (ms).
    pub coalesce_ms: Option<f64>,
    pub forced: bool,
}

impl FloodDecision {
    /// Serialize to one JSONL line.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let (pending_w, pending_h) = match self.pending {
            Some((w, h)) => (json_f64(w), json_f64(h)),
            None => ("null".to_string(), "null".to_string()),
        };
        let (applied_w, applied_h) = match self.applied {
            Some((w, h)) => (json_f64(w), json_f64(h)),
            None => ("null".to_string(), "null".to_string()),
        };
        let coalesce_ms = match self.coalesce_ms {
            Some(ms) => format!("{:.3}", ms),
            None => "null".to_string(),
        };
        format!(
            r#"{{"event":"flood_decision","idx":{},"elapsed_ms":{:.3},"dt_ms":{:.3},"window_count":{},"flood_active":{},"debounce_ms":{:.3},"action":"{}","pending_w":{},"pending_h":{},"applied_w":{},"applied_h":{},"coalesce_ms":{},"forced":{}}}"#,
            self.event_idx,
            self.elapsed_ms,
            self.dt_ms,
            self.window_count,
            self.flood_active,
            self.debounce_ms,
            self.action,
            pending_w,
            pending_h,
            applied_w,
            applied_h,
            coalesce_ms,
            self.forced
        )
    }
}

/// Counters kept whether or not decision logging is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloodStats {
    pub event_count: u64,
    pub apply_count: u64,
    pub forced_apply_count: u64,
    pub coalesce_count: u64,
    pub skip_count: u64,
    pub flood_activations: u64,
    pub flood_active: bool,
    pub has_pending: bool,
    pub last_applied: ResizeEvent,
}

/// Latest-wins resize debouncer with flood protection.
#[derive(Debug)]
pub struct FloodGuard {
    config: FloodGuardConfig,

    /// Currently pending signal (latest wins).
    pending: Option<ResizeEvent>,
    /// Last applied signal.
    last_applied: ResizeEvent,
    /// When the current pending signal started pending.
    window_start: Option<Instant>,
    /// Timestamp of the last signal.
    last_event: Option<Instant>,
    /// Signal timestamps inside the sliding window.
    recent: VecDeque<Instant>,
    flood_active: bool,

    event_count: u64,
    apply_count: u64,
    forced_apply_count: u64,
    coalesce_count: u64,
    skip_count: u64,
    flood_activations: u64,
    coalesced_in_window: u32,

    log_start: Option<Instant>,
    logs: Vec<FloodDecision>,
}

impl FloodGuard {
    /// Guard whose last applied signal is `initial`.
    pub fn new(config: FloodGuardConfig, initial: ResizeEvent) -> Self {
        Self {
            config,
            pending: None,
            last_applied: initial,
            window_start: None,
            last_event: None,
            recent: VecDeque::new(),
            flood_active: false,
            event_count: 0,
            apply_count: 0,
            forced_apply_count: 0,
            coalesce_count: 0,
            skip_count: 0,
            flood_activations: 0,
            coalesced_in_window: 0,
            log_start: None,
            logs: Vec::new(),
        }
    }

    /// Handle a host signal.
    pub fn handle_resize(&mut self, event: ResizeEvent) -> FloodAction {
        self.handle_resize_at(event, Instant::now())
    }

    /// Handle a host signal at a specific time.
    pub fn handle_resize_at(&mut self, event: ResizeEvent, now: Instant) -> FloodAction {
        self.event_count += 1;
        self.maybe_reset(now);

        let dt = self.last_event.map(|t| duration_since_or_zero(now, t));
        self.last_event = Some(now);

        self.recent.push_back(now);
        self.prune_window(now);
        if !self.flood_active && self.recent.len() > self.config.flood_ceiling as usize {
            self.flood_active = true;
            self.flood_activations += 1;
            tracing::warn!(
                window_count = self.recent.len(),
                ceiling = self.config.flood_ceiling,
                debounce_ms = self.config.flood_debounce().as_millis() as u64,
                "resize flood protection engaged"
            );
            self.log_decision(now, "flood_enter", dt, None, false);
        }

        if self.pending.is_none() && event.same_signal(&self.last_applied) {
            self.skip_count += 1;
            self.log_decision(now, "skip_same_signal", dt, None, false);
            return FloodAction::None;
        }

        self.pending = Some(event);
        self.coalesced_in_window += 1;
        let window_start = *self.window_start.get_or_insert(now);

        if duration_since_or_zero(now, window_start) >= self.config.max_wait {
            return self.apply_pending_at(now, true);
        }

        if !self.flood_active && dt.is_none_or(|dt| dt >= self.config.base_debounce) {
            return self.apply_pending_at(now, false);
        }

        self.coalesce_count += 1;
        self.log_decision(now, "coalesce", dt, None, false);
        FloodAction::Coalesce
    }

    /// Advance time (call from the host's frame or timer callback).
    pub fn tick(&mut self) -> FloodAction {
        self.tick_at(Instant::now())
    }

    /// Advance time to `now`.
    pub fn tick_at(&mut self, now: Instant) -> FloodAction {
        self.maybe_reset(now);

        let (Some(_), Some(window_start)) = (self.pending, self.window_start) else {
            return FloodAction::None;
        };

        if duration_since_or_zero(now, window_start) >= self.config.max_wait {
            return self.apply_pending_at(now, true);
        }

        if let Some(last_event) = self.last_event
            && duration_since_or_zero(now, last_event) >= self.current_debounce()
        {
            return self.apply_pending_at(now, false);
        }

        FloodAction::None
    }

    /// Time until the pending signal would apply, if one is pending.
    #[must_use]
    pub fn time_until_apply(&self, now: Instant) -> Option<Duration> {
        self.pending?;
        let last_event = self.last_event?;
        let window_start = self.window_start?;
        let debounce_left = self
            .current_debounce()
            .saturating_sub(duration_since_or_zero(now, last_event));
        let wait_left = self
            .config
            .max_wait
            .saturating_sub(duration_since_or_zero(now, window_start));
        Some(debounce_left.min(wait_left))
    }

    /// Drop any pending signal without applying it.
    pub fn cancel_pending(&mut self) -> bool {
        self.window_start = None;
        self.coalesced_in_window = 0;
        self.pending.take().is_some()
    }

    /// Debounce currently in effect.
    #[must_use]
    pub fn current_debounce(&self) -> Duration {
        if self.flood_active {
            self.config.flood_debounce()
        } else {
            self.config.base_debounce
        }
    }

    #[inline]
    pub fn is_flooded(&self) -> bool {
        self.flood_active
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    pub fn last_applied(&self) -> &ResizeEvent {
        &self.last_applied
    }

    #[inline]
    pub fn config(&self) -> &FloodGuardConfig {
        &self.config
    }

    /// Number of times flood protection has engaged.
    #[inline]
    pub fn flood_activations(&self) -> u64 {
        self.flood_activations
    }

    pub fn stats(&self) -> FloodStats {
        FloodStats {
            event_count: self.event_count,
            apply_count: self.apply_count,
            forced_apply_count: self.forced_apply_count,
            coalesce_count: self.coalesce_count,
            skip_count: self.skip_count,
            flood_activations: self.flood_activations,
            flood_active: self.flood_active,
            has_pending: self.pending.is_some(),
            last_applied: self.last_applied,
        }
    }

    /// Decision log (empty unless logging is enabled).
    pub fn logs(&self) -> &[FloodDecision] {
        &self.logs
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
        self.log_start = None;
    }

    /// Export the decision log as JSONL (one entry per line).
    #[must_use]
    pub fn decision_logs_jsonl(&self) -> String {
        self.logs
            .iter()
            .map(FloodDecision::to_jsonl)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Deterministic checksum of the decision log.
    #[must_use]
    pub fn decision_checksum(&self) -> u64 {
        let mut hash = FNV_OFFSET_BASIS;
        for entry in &self.logs {
            fnv_hash_bytes(&mut hash, &entry.event_idx.to_le_bytes());
            fnv_hash_bytes(&mut hash, &entry.elapsed_ms.to_bits().to_le_bytes());
            fnv_hash_bytes(&mut hash, entry.action.as_bytes());
            fnv_hash_bytes(&mut hash, &[0u8]);
            fnv_hash_bytes(&mut hash, &[entry.flood_active as u8, entry.forced as u8]);
            if let Some((w, h)) = entry.applied {
                fnv_hash_bytes(&mut hash, &w.to_bits().to_le_bytes());
                fnv_hash_bytes(&mut hash, &h.to_bits().to_le_bytes());
            }
        }
        hash
    }

    /// Checksum as a hex string.
    #[must_use]
    pub fn decision_checksum_hex(&self) -> String {
        format!("{:016x}", self.decision_checksum())
    }

    // --- Internal methods ---

    fn maybe_reset(&mut self, now: Instant) {
        if !self.flood_active {
            return;
        }
        let quiet = self
            .last_event
            .map(|t| duration_since_or_zero(now, t) > self.config.window)
            .unwrap_or(true);
        if quiet {
            self.flood_active = false;
            self.recent.clear();
            tracing::debug!(
                activations = self.flood_activations,
                "resize flood protection released"
            );
            self.log_decision(now, "flood_reset", None, None, false);
        }
    }

    fn prune_window(&mut self, now: Instant) {
        while let Some(&front) = self.recent.front() {
            if duration_since_or_zero(now, front) >= self.config.window {
                self.recent.pop_front();
            } else {
                break;
            }
        }
    }

    fn apply_pending_at(&mut self, now: Instant, forced: bool) -> FloodAction {
        let Some(event) = self.pending.take() else {
            return FloodAction::None;
        };
        let coalesce_time = self
            .window_start
            .take()
            .map(|s| duration_since_or_zero(now, s))
            .unwrap_or(Duration::ZERO);
        let coalesced = std::mem::take(&mut self.coalesced_in_window);

        self.last_applied = event;
        self.apply_count += 1;
        if forced {
            self.forced_apply_count += 1;
        }

        self.log_decision(
            now,
            if forced { "apply_forced" } else { "apply" },
            None,
            Some(millis(coalesce_time)),
            forced,
        );

        FloodAction::Apply {
            event,
            coalesced,
            coalesce_time,
            forced,
        }
    }

    fn log_decision(
        &mut self,
        now: Instant,
        action: &'static str,
        dt: Option<Duration>,
        coalesce_ms: Option<f64>,
        forced: bool,
    ) {
        if !self.config.enable_logging {
            return;
        }
        let log_start = *self.log_start.get_or_insert(now);
        let dt_ms = dt
            .or_else(|| self.last_event.map(|t| duration_since_or_zero(now, t)))
            .map(millis)
            .unwrap_or(0.0);
        let applied = if action == "apply" || action == "apply_forced" {
            Some((self.last_applied.width, self.last_applied.height))
        } else {
            None
        };
        self.logs.push(FloodDecision {
            elapsed_ms: millis(duration_since_or_zero(now, log_start)),
            event_idx: self.event_count,
            dt_ms,
            window_count: self.recent.len(),
            flood_active: self.flood_active,
            debounce_ms: millis(self.current_debounce()),
            action,
            pending: self.pending.map(|e| (e.width, e.height)),
            applied,
            coalesce_ms,
            forced,
        });
    }
}
