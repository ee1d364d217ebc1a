#![forbid(unsafe_code)]

//! Resize storm generator.
//!
//! Generates deterministic sequences of raw viewport signals for scenario
//! runs and tests. Unlike a well-behaved window system, a storm may carry
//! NaN, negative, zero, or absurdly large extents, and orientation flips
//! with no delay at all.
//!
//! # Usage
//!
//! ```
//! use hudguard_harness::storm::{ResizeStorm, StormConfig, StormPattern};
//!
//! let storm = ResizeStorm::new(
//!     StormConfig::default()
//!         .with_seed(42)
//!         .with_pattern(StormPattern::Burst { count: 50 }),
//! );
//! assert_eq!(storm.signals().len(), 50);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use hudguard::ResizeEvent;
use serde_json::json;

// ============================================================================
// Configuration
// ============================================================================

/// Shape of a generated storm.
#[derive(Debug, Clone, PartialEq)]
pub enum StormPattern {
    /// Rapid random walk with short delays.
    Burst {
        /// Number of signals.
        count: usize,
    },
    /// Linear interpolation from one size to another.
    Sweep {
        /// Starting (width, height).
        start: (f64, f64),
        /// Ending (width, height).
        end: (f64, f64),
        /// Number of steps.
        steps: usize,
    },
    /// Alternate between two sizes as orientation changes.
    Oscillate {
        /// First (width, height).
        size_a: (f64, f64),
        /// Second (width, height).
        size_b: (f64, f64),
        /// Number of a/b pairs.
        cycles: usize,
    },
    /// Hostile values: NaN, negative, zero, huge, extreme aspect.
    Pathological {
        /// Number of signals.
        count: usize,
    },
    /// A quarter of each of the above.
    Mixed {
        /// Total number of signals.
        count: usize,
    },
    /// Caller-supplied `(width, height, delay_ms)` triples.
    Custom {
        /// The signals.
        events: Vec<(f64, f64, u64)>,
    },
}

impl StormPattern {
    /// Pattern name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Burst { .. } => "burst",
            Self::Sweep { .. } => "sweep",
            Self::Oscillate { .. } => "oscillate",
            Self::Pathological { .. } => "pathological",
            Self::Mixed { .. } => "mixed",
            Self::Custom { .. } => "custom",
        }
    }

    /// Number of signals this pattern generates.
    #[must_use]
    pub fn event_count(&self) -> usize {
        match self {
            Self::Burst { count } | Self::Pathological { count } | Self::Mixed { count } => *count,
            Self::Sweep { steps, .. } => *steps,
            Self::Oscillate { cycles, .. } => cycles * 2,
            Self::Custom { events } => events.len(),
        }
    }

    /// Stock pattern by name, sized to roughly `count` signals.
    #[must_use]
    pub fn from_name(name: &str, count: usize) -> Option<Self> {
        Some(match name.trim().to_ascii_lowercase().as_str() {
            "burst" => Self::Burst { count },
            "sweep" => Self::Sweep {
                start: (320.0, 480.0),
                end: (1920.0, 1080.0),
                steps: count,
            },
            "oscillate" => Self::Oscillate {
                size_a: (1024.0, 768.0),
                size_b: (768.0, 1024.0),
                cycles: count / 2,
            },
            "pathological" => Self::Pathological { count },
            "mixed" => Self::Mixed { count },
            _ => return None,
        })
    }
}

impl Default for StormPattern {
    fn default() -> Self {
        Self::Burst { count: 50 }
    }
}

/// Storm generation settings.
#[derive(Debug, Clone)]
pub struct StormConfig {
    /// Seed for deterministic generation.
    pub seed: u64,
    /// Pattern to generate.
    pub pattern: StormPattern,
    /// Viewport before the storm begins.
    pub initial_size: (f64, f64),
    /// Minimum delay between signals (ms).
    pub min_delay_ms: u64,
    /// Maximum delay between signals (ms).
    pub max_delay_ms: u64,
    /// Random-walk width bounds.
    pub width_bounds: (f64, f64),
    /// Random-walk height bounds.
    pub height_bounds: (f64, f64),
    /// Case name for logging.
    pub case_name: String,
}

impl Default for StormConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            pattern: StormPattern::default(),
            initial_size: (1024.0, 768.0),
            min_delay_ms: 1,
            max_delay_ms: 32,
            width_bounds: (320.0, 2560.0),
            height_bounds: (240.0, 1600.0),
            case_name: "default".into(),
        }
    }
}

impl StormConfig {
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: StormPattern) -> Self {
        self.pattern = pattern;
        self
    }

    #[must_use]
    pub fn with_initial_size(mut self, width: f64, height: f64) -> Self {
        self.initial_size = (width, height);
        self
    }

    #[must_use]
    pub fn with_delay_range(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.min_delay_ms = min_ms;
        self.max_delay_ms = max_ms;
        self
    }

    #[must_use]
    pub fn with_size_bounds(mut self, width: (f64, f64), height: (f64, f64)) -> Self {
        self.width_bounds = width;
        self.height_bounds = height;
        self
    }

    #[must_use]
    pub fn with_case_name(mut self, name: impl Into<String>) -> Self {
        self.case_name = name.into();
        self
    }
}

// ============================================================================
// Seeded RNG
// ============================================================================

/// Simple LCG PRNG for deterministic generation.
#[derive(Debug, Clone)]
struct SeededRng {
    state: u64,
}

impl SeededRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        // LCG parameters from Numerical Recipes
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn next_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + (self.next_u64() % (max - min))
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() as f64) / (u64::MAX as f64)
    }

    fn next_f64_range(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

// ============================================================================
// Storm signal
// ============================================================================

/// One raw signal in a storm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StormSignal {
    /// Raw width. Unvalidated.
    pub width: f64,
    /// Raw height. Unvalidated.
    pub height: f64,
    /// Delay before this signal (ms).
    pub delay_ms: u64,
    /// Index in the sequence.
    pub index: usize,
    /// Reported as an orientation change rather than a resize.
    pub orientation: bool,
}

impl StormSignal {
    #[must_use]
    pub fn new(width: f64, height: f64, delay_ms: u64, index: usize) -> Self {
        Self {
            width,
            height,
            delay_ms,
            index,
            orientation: false,
        }
    }

    #[must_use]
    pub fn as_orientation(mut self) -> Self {
        self.orientation = true;
        self
    }

    /// The host event this signal represents.
    #[must_use]
    pub fn to_event(&self) -> ResizeEvent {
        if self.orientation {
            ResizeEvent::orientation_change(self.width, self.height)
        } else {
            ResizeEvent::new(self.width, self.height)
        }
    }

    /// JSONL line. Non-finite extents are written as `null`.
    #[must_use]
    pub fn to_jsonl(&self, elapsed_ms: u64, action: &str) -> String {
        json!({
            "event": "storm_resize",
            "idx": self.index,
            "width": self.width,
            "height": self.height,
            "orientation": self.orientation,
            "delay_ms": self.delay_ms,
            "elapsed_ms": elapsed_ms,
            "action": action,
        })
        .to_string()
    }
}

impl Hash for StormSignal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.width.to_bits().hash(state);
        self.height.to_bits().hash(state);
        self.delay_ms.hash(state);
        self.index.hash(state);
        self.orientation.hash(state);
    }
}

// ============================================================================
// Storm generator
// ============================================================================

/// A generated storm.
#[derive(Debug, Clone)]
pub struct ResizeStorm {
    config: StormConfig,
    signals: Vec<StormSignal>,
}

impl ResizeStorm {
    #[must_use]
    pub fn new(config: StormConfig) -> Self {
        let mut storm = Self {
            config,
            signals: Vec::new(),
        };
        storm.generate();
        storm
    }

    #[must_use]
    pub fn signals(&self) -> &[StormSignal] {
        &self.signals
    }

    #[must_use]
    pub fn config(&self) -> &StormConfig {
        &self.config
    }

    fn generate(&mut self) {
        let mut rng = SeededRng::new(self.config.seed);
        self.signals = match &self.config.pattern {
            StormPattern::Burst { count } => self.burst(&mut rng, *count),
            StormPattern::Sweep { start, end, steps } => self.sweep(*start, *end, *steps),
            StormPattern::Oscillate {
                size_a,
                size_b,
                cycles,
            } => self.oscillate(&mut rng, *size_a, *size_b, *cycles),
            StormPattern::Pathological { count } => self.pathological(&mut rng, *count),
            StormPattern::Mixed { count } => self.mixed(&mut rng, *count),
            StormPattern::Custom { events } => events
                .iter()
                .enumerate()
                .map(|(i, &(w, h, d))| StormSignal::new(w, h, d, i))
                .collect(),
        };
    }

    fn burst(&self, rng: &mut SeededRng, count: usize) -> Vec<StormSignal> {
        let (mut width, mut height) = self.config.initial_size;
        let (min_w, max_w) = self.config.width_bounds;
        let (min_h, max_h) = self.config.height_bounds;
        let mut signals = Vec::with_capacity(count);
        for i in 0..count {
            let delay = rng.next_range(self.config.min_delay_ms, self.config.max_delay_ms / 2);
            if rng.chance(0.7) {
                let delta = rng.next_f64_range(1.0, 40.0);
                let sign = if rng.chance(0.5) { 1.0 } else { -1.0 };
                width = (width + delta * sign).clamp(min_w, max_w);
            }
            if rng.chance(0.7) {
                let delta = rng.next_f64_range(1.0, 30.0);
                let sign = if rng.chance(0.5) { 1.0 } else { -1.0 };
                height = (height + delta * sign).clamp(min_h, max_h);
            }
            signals.push(StormSignal::new(width.round(), height.round(), delay, i));
        }
        signals
    }

    fn sweep(&self, start: (f64, f64), end: (f64, f64), steps: usize) -> Vec<StormSignal> {
        let delay = (self.config.min_delay_ms + self.config.max_delay_ms) / 2;
        (0..steps)
            .map(|i| {
                let t = if steps > 1 {
                    i as f64 / (steps - 1) as f64
                } else {
                    1.0
                };
                let width = (start.0 + (end.0 - start.0) * t).round();
                let height = (start.1 + (end.1 - start.1) * t).round();
                StormSignal::new(width, height, delay, i)
            })
            .collect()
    }

    fn oscillate(
        &self,
        rng: &mut SeededRng,
        size_a: (f64, f64),
        size_b: (f64, f64),
        cycles: usize,
    ) -> Vec<StormSignal> {
        let mut signals = Vec::with_capacity(cycles * 2);
        for cycle in 0..cycles {
            let delay_a = rng.next_range(self.config.min_delay_ms, self.config.max_delay_ms);
            let delay_b = rng.next_range(self.config.min_delay_ms, self.config.max_delay_ms);
            signals.push(StormSignal::new(size_a.0, size_a.1, delay_a, cycle * 2).as_orientation());
            signals.push(
                StormSignal::new(size_b.0, size_b.1, delay_b, cycle * 2 + 1).as_orientation(),
            );
        }
        signals
    }

    fn pathological(&self, rng: &mut SeededRng, count: usize) -> Vec<StormSignal> {
        let (min_w, max_w) = self.config.width_bounds;
        let (min_h, max_h) = self.config.height_bounds;
        (0..count)
            .map(|i| {
                let (width, height, delay) = match i % 10 {
                    0 => (f64::NAN, f64::NAN, 0),
                    1 => (-800.0, 600.0, 0),
                    2 => (0.0, 0.0, 1),
                    3 => (1e9, 1e9, 1),
                    4 => (f64::INFINITY, 480.0, 0),
                    5 => (10_000.0, 200.0, 2),
                    6 => (1.0, 1.0, 0),
                    7 => (
                        rng.next_f64_range(min_w, max_w).round(),
                        rng.next_f64_range(min_h, max_h).round(),
                        0,
                    ),
                    8 => (1024.0, 768.0, rng.next_range(0, 1_000)),
                    _ => (max_w, min_h, 5),
                };
                StormSignal::new(width, height, delay, i)
            })
            .collect()
    }

    fn mixed(&self, rng: &mut SeededRng, count: usize) -> Vec<StormSignal> {
        fn append(signals: &mut Vec<StormSignal>, part: Vec<StormSignal>) {
            for mut s in part {
                s.index = signals.len();
                signals.push(s);
            }
        }

        let segment = count / 4;
        let mut signals = self.burst(rng, segment);
        append(&mut signals, self.sweep((360.0, 640.0), (1920.0, 1080.0), segment));
        append(
            &mut signals,
            self.oscillate(rng, (1024.0, 768.0), (768.0, 1024.0), segment / 2),
        );
        let remaining = count.saturating_sub(signals.len());
        append(&mut signals, self.pathological(rng, remaining));
        signals
    }

    /// Deterministic checksum of the signal sequence.
    #[must_use]
    pub fn sequence_checksum(&self) -> String {
        let mut hasher = DefaultHasher::new();
        for signal in &self.signals {
            signal.hash(&mut hasher);
        }
        format!("{:016x}", hasher.finish())
    }

    /// Sum of all delays.
    #[must_use]
    pub fn total_duration_ms(&self) -> u64 {
        self.signals.iter().map(|s| s.delay_ms).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_pattern_generates_correct_count() {
        let storm = ResizeStorm::new(
            StormConfig::default()
                .with_seed(42)
                .with_pattern(StormPattern::Burst { count: 100 }),
        );
        assert_eq!(storm.signals().len(), 100);
    }

    #[test]
    fn burst_respects_size_bounds() {
        let storm = ResizeStorm::new(
            StormConfig::default()
                .with_seed(7)
                .with_size_bounds((400.0, 500.0), (300.0, 350.0))
                .with_initial_size(450.0, 320.0)
                .with_pattern(StormPattern::Burst { count: 200 }),
        );
        for s in storm.signals() {
            assert!((400.0..=500.0).contains(&s.width), "{s:?}");
            assert!((300.0..=350.0).contains(&s.height), "{s:?}");
        }
    }

    #[test]
    fn sweep_pattern_interpolates_sizes() {
        let storm = ResizeStorm::new(StormConfig::default().with_pattern(StormPattern::Sweep {
            start: (400.0, 300.0),
            end: (800.0, 600.0),
            steps: 5,
        }));
        let s = storm.signals();
        assert_eq!(s.len(), 5);
        assert_eq!((s[0].width, s[0].height), (400.0, 300.0));
        assert_eq!((s[2].width, s[2].height), (600.0, 450.0));
        assert_eq!((s[4].width, s[4].height), (800.0, 600.0));
    }

    #[test]
    fn oscillate_pattern_alternates_orientation() {
        let storm = ResizeStorm::new(StormConfig::default().with_pattern(
            StormPattern::Oscillate {
                size_a: (1024.0, 768.0),
                size_b: (768.0, 1024.0),
                cycles: 3,
            },
        ));
        let s = storm.signals();
        assert_eq!(s.len(), 6);
        assert!(s.iter().all(|s| s.orientation));
        assert_eq!((s[0].width, s[0].height), (1024.0, 768.0));
        assert_eq!((s[1].width, s[1].height), (768.0, 1024.0));
        assert_eq!(s[1].index, 1);
    }

    #[test]
    fn pathological_pattern_includes_hostile_values() {
        let storm = ResizeStorm::new(
            StormConfig::default()
                .with_seed(42)
                .with_pattern(StormPattern::Pathological { count: 20 }),
        );
        let s = storm.signals();
        assert!(s.iter().any(|s| s.width.is_nan()));
        assert!(s.iter().any(|s| s.width < 0.0));
        assert!(s.iter().any(|s| s.width.is_infinite()));
        assert!(s.iter().any(|s| s.width >= 1e9));
        assert!(s.iter().any(|s| s.delay_ms == 0));
    }

    #[test]
    fn mixed_pattern_has_requested_length_and_dense_indices() {
        let storm = ResizeStorm::new(
            StormConfig::default()
                .with_seed(42)
                .with_pattern(StormPattern::Mixed { count: 101 }),
        );
        let s = storm.signals();
        assert_eq!(s.len(), 101);
        assert!(s.iter().enumerate().all(|(i, s)| s.index == i));
    }

    #[test]
    fn same_seed_same_sequence() {
        let config = StormConfig::default()
            .with_seed(12345)
            .with_pattern(StormPattern::Mixed { count: 80 });
        let a = ResizeStorm::new(config.clone());
        let b = ResizeStorm::new(config);
        assert_eq!(a.sequence_checksum(), b.sequence_checksum());
    }

    #[test]
    fn different_seeds_differ() {
        let make = |seed| {
            ResizeStorm::new(
                StormConfig::default()
                    .with_seed(seed)
                    .with_pattern(StormPattern::Burst { count: 50 }),
            )
        };
        assert_ne!(make(1).sequence_checksum(), make(2).sequence_checksum());
    }

    #[test]
    fn custom_pattern_uses_provided_signals() {
        let storm = ResizeStorm::new(StormConfig::default().with_pattern(StormPattern::Custom {
            events: vec![(100.0, 50.0, 10), (f64::NAN, 24.0, 20)],
        }));
        let s = storm.signals();
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].delay_ms, 10);
        assert!(s[1].width.is_nan());
        assert_eq!(storm.total_duration_ms(), 30);
    }

    #[test]
    fn pattern_names_round_trip() {
        for name in ["burst", "sweep", "oscillate", "pathological", "mixed"] {
            let pattern = StormPattern::from_name(name, 10).unwrap();
            assert_eq!(pattern.name(), name);
        }
        assert!(StormPattern::from_name("tornado", 10).is_none());
        assert_eq!(StormPattern::from_name(" Oscillate ", 10).unwrap().event_count(), 10);
    }

    #[test]
    fn signal_jsonl_writes_non_finite_as_null() {
        let line = StormSignal::new(f64::NAN, 600.0, 0, 3).to_jsonl(12, "coalesce");
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event"], "storm_resize");
        assert!(value["width"].is_null());
        assert_eq!(value["height"], 600.0);
        assert_eq!(value["action"], "coalesce");
        assert_eq!(value["idx"], 3);
    }
}
