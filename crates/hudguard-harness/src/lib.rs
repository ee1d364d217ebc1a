#![forbid(unsafe_code)]

//! Resize storm harness for the HUD subsystem.
//!
//! [`storm`] generates seeded resize sequences and [`scenario`] replays them
//! against a [`HudSubsystem`](hudguard::HudSubsystem) on a headless engine,
//! producing a JSONL report.
//!
//! # Environment Variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `HUDGUARD_HARNESS_SEED` | `0` | Storm and fault seed |
//! | `HUDGUARD_HARNESS_PATTERN` | `mixed` | `burst`, `sweep`, `oscillate`, `pathological`, `mixed` |
//! | `HUDGUARD_HARNESS_EVENTS` | `200` | Approximate signal count |
//! | `HUDGUARD_HARNESS_FAIL_RATE` | `0.0` | Node-creation failure rate in `[0, 1]` |

pub mod scenario;
pub mod storm;

use hudguard::SubsystemConfig;

use crate::scenario::ScenarioConfig;
use crate::storm::{StormConfig, StormPattern};

pub const ENV_SEED: &str = "HUDGUARD_HARNESS_SEED";
pub const ENV_PATTERN: &str = "HUDGUARD_HARNESS_PATTERN";
pub const ENV_EVENTS: &str = "HUDGUARD_HARNESS_EVENTS";
pub const ENV_FAIL_RATE: &str = "HUDGUARD_HARNESS_FAIL_RATE";

const DEFAULT_PATTERN: &str = "mixed";

/// Command-line harness settings.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessOptions {
    pub seed: u64,
    pub pattern: String,
    pub events: usize,
    pub fail_rate: f64,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            pattern: DEFAULT_PATTERN.to_string(),
            events: 200,
            fail_rate: 0.0,
        }
    }
}

impl HarnessOptions {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through a custom lookup (for tests).
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        if let Some(raw) = get_env(ENV_SEED) {
            match raw.trim().parse() {
                Ok(seed) => options.seed = seed,
                Err(_) => tracing::warn!(key = ENV_SEED, value = %raw, "ignoring harness override"),
            }
        }
        if let Some(raw) = get_env(ENV_EVENTS) {
            match raw.trim().parse() {
                Ok(events) => options.events = events,
                Err(_) => tracing::warn!(key = ENV_EVENTS, value = %raw, "ignoring harness override"),
            }
        }
        if let Some(raw) = get_env(ENV_FAIL_RATE) {
            match raw.trim().parse::<f64>() {
                Ok(rate) if rate.is_finite() && (0.0..=1.0).contains(&rate) => {
                    options.fail_rate = rate;
                }
                _ => tracing::warn!(key = ENV_FAIL_RATE, value = %raw, "ignoring harness override"),
            }
        }
        if let Some(raw) = get_env(ENV_PATTERN) {
            let name = raw.trim().to_ascii_lowercase();
            if StormPattern::from_name(&name, options.events).is_some() {
                options.pattern = name;
            } else {
                tracing::warn!(key = ENV_PATTERN, value = %raw, "unknown storm pattern");
            }
        }
        options
    }

    /// Scenario described by these options.
    #[must_use]
    pub fn scenario(&self) -> ScenarioConfig {
        let pattern = StormPattern::from_name(&self.pattern, self.events)
            .unwrap_or(StormPattern::Mixed { count: self.events });
        let storm = StormConfig::default()
            .with_seed(self.seed)
            .with_pattern(pattern)
            .with_case_name(format!("{}_{}", self.pattern, self.seed));
        ScenarioConfig::default()
            .with_storm(storm)
            .with_subsystem(SubsystemConfig::from_env())
            .with_fail_rate(self.fail_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        assert_eq!(HarnessOptions::from_env_with(lookup(&[])), HarnessOptions::default());
    }

    #[test]
    fn overrides_apply() {
        let options = HarnessOptions::from_env_with(lookup(&[
            (ENV_SEED, "42"),
            (ENV_PATTERN, " Burst "),
            (ENV_EVENTS, "64"),
            (ENV_FAIL_RATE, "0.25"),
        ]));
        assert_eq!(options.seed, 42);
        assert_eq!(options.pattern, "burst");
        assert_eq!(options.events, 64);
        assert_eq!(options.fail_rate, 0.25);

        let scenario = options.scenario();
        assert_eq!(scenario.storm.seed, 42);
        assert_eq!(scenario.storm.pattern.event_count(), 64);
        assert_eq!(scenario.storm.case_name, "burst_42");
    }

    #[test]
    fn invalid_overrides_keep_defaults() {
        let options = HarnessOptions::from_env_with(lookup(&[
            (ENV_SEED, "-1"),
            (ENV_PATTERN, "tornado"),
            (ENV_EVENTS, "many"),
            (ENV_FAIL_RATE, "1.5"),
        ]));
        assert_eq!(options, HarnessOptions::default());

        let nan = HarnessOptions::from_env_with(lookup(&[(ENV_FAIL_RATE, "NaN")]));
        assert_eq!(nan.fail_rate, 0.0);
    }
}
