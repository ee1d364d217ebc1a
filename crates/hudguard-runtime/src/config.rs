#![forbid(unsafe_code)]

//! Recovery and flood-guard configuration.
//!
//! Both structs are supplied once when the subsystem is built and never
//! change afterwards. Defaults can be overridden from the environment:
//!
//! | Variable                  | Field                           |
//! |---------------------------|---------------------------------|
//! | `HUDGUARD_MAX_RETRIES`    | [`RecoveryConfig::max_retries`] |
//! | `HUDGUARD_RETRY_DELAY_MS` | [`RecoveryConfig::retry_delay_base`] |
//! | `HUDGUARD_RETRY`          | [`RecoveryConfig::retry_enabled`] |
//! | `HUDGUARD_AUTO_FALLBACK`  | [`RecoveryConfig::auto_fallback_enabled`] |
//! | `HUDGUARD_FLOOD_CEILING`  | [`FloodGuardConfig::flood_ceiling`] |
//! | `HUDGUARD_DEBOUNCE_MS`    | [`FloodGuardConfig::base_debounce`] |
//!
//! Values that fail to parse are ignored and the default is kept.

use std::str::FromStr;
use std::time::Duration;

use hudguard_widgets::Strategy;

pub const ENV_MAX_RETRIES: &str = "HUDGUARD_MAX_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "HUDGUARD_RETRY_DELAY_MS";
pub const ENV_RETRY: &str = "HUDGUARD_RETRY";
pub const ENV_AUTO_FALLBACK: &str = "HUDGUARD_AUTO_FALLBACK";
pub const ENV_FLOOD_CEILING: &str = "HUDGUARD_FLOOD_CEILING";
pub const ENV_DEBOUNCE_MS: &str = "HUDGUARD_DEBOUNCE_MS";

/// Retry and fallback policy for the recovery orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryConfig {
    /// Total primary-factory attempts before escalating.
    pub max_retries: u32,
    /// Retry `k` waits `retry_delay_base * k` after the previous failure.
    pub retry_delay_base: Duration,
    /// Tiers walked by whole-HUD recovery, most capable first.
    pub fallback_chain: Vec<Strategy>,
    /// Escalate past the primary factory (element) or first tier (HUD).
    pub auto_fallback_enabled: bool,
    /// When false the primary factory runs exactly once.
    pub retry_enabled: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_base: Duration::from_millis(100),
            fallback_chain: Strategy::ALL.to_vec(),
            auto_fallback_enabled: true,
            retry_enabled: true,
        }
    }
}

impl RecoveryConfig {
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_retry_delay_base(mut self, delay: Duration) -> Self {
        self.retry_delay_base = delay;
        self
    }

    #[must_use]
    pub fn with_fallback_chain(mut self, chain: impl IntoIterator<Item = Strategy>) -> Self {
        self.fallback_chain = chain.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_auto_fallback(mut self, enabled: bool) -> Self {
        self.auto_fallback_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, enabled: bool) -> Self {
        self.retry_enabled = enabled;
        self
    }

    /// Number of primary attempts a recovery makes. Never zero.
    #[must_use]
    pub fn primary_attempts(&self) -> u32 {
        if self.retry_enabled {
            self.max_retries.max(1)
        } else {
            1
        }
    }

    /// Delay before primary attempt `attempt` (0-based). Attempt 0 is
    /// immediate.
    #[must_use]
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_delay_base.saturating_mul(attempt)
    }

    /// Tiers whole-HUD recovery will try, in order.
    #[must_use]
    pub fn hud_chain(&self) -> &[Strategy] {
        if self.auto_fallback_enabled {
            &self.fallback_chain
        } else {
            let end = self.fallback_chain.len().min(1);
            &self.fallback_chain[..end]
        }
    }

    /// Defaults overridden from the process environment.
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
        let mut config = Self::default();
        if let Some(n) = env_parse(&get_env, ENV_MAX_RETRIES) {
            config.max_retries = n;
        }
        if let Some(ms) = env_parse(&get_env, ENV_RETRY_DELAY_MS) {
            config.retry_delay_base = Duration::from_millis(ms);
        }
        if let Some(on) = env_bool(&get_env, ENV_RETRY) {
            config.retry_enabled = on;
        }
        if let Some(on) = env_bool(&get_env, ENV_AUTO_FALLBACK) {
            config.auto_fallback_enabled = on;
        }
        config
    }
}

/// Settings for [`FloodGuard`](crate::flood_guard::FloodGuard).
#[derive(Debug, Clone, PartialEq)]
pub struct FloodGuardConfig {
    /// Quiet period after the last signal before a pending layout applies.
    pub base_debounce: Duration,
    /// Signals per window above which flood protection engages.
    pub flood_ceiling: u32,
    /// Debounce multiplier while flood protection is engaged.
    pub flood_delay_multiplier: u32,
    /// Upper bound on the flood debounce.
    pub max_debounce: Duration,
    /// A pending signal is applied no later than this after it arrived.
    pub max_wait: Duration,
    /// Sliding window for the signal counter; also the quiet time that
    /// resets flood protection.
    pub window: Duration,
    /// Keep an in-memory decision log.
    pub enable_logging: bool,
}

impl Default for FloodGuardConfig {
    fn default() -> Self {
        Self {
            base_debounce: Duration::from_millis(50),
            flood_ceiling: 60,
            flood_delay_multiplier: 4,
            max_debounce: Duration::from_millis(500),
            max_wait: Duration::from_secs(1),
            window: Duration::from_secs(1),
            enable_logging: false,
        }
    }
}

impl FloodGuardConfig {
    #[must_use]
    pub fn with_base_debounce(mut self, debounce: Duration) -> Self {
        self.base_debounce = debounce;
        self
    }

    #[must_use]
    pub fn with_flood_ceiling(mut self, ceiling: u32) -> Self {
        self.flood_ceiling = ceiling;
        self
    }

    #[must_use]
    pub fn with_flood_delay_multiplier(mut self, multiplier: u32) -> Self {
        self.flood_delay_multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_max_debounce(mut self, max: Duration) -> Self {
        self.max_debounce = max;
        self
    }

    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    #[must_use]
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Debounce in effect while flood protection is engaged.
    #[must_use]
    pub fn flood_debounce(&self) -> Duration {
        self.base_debounce
            .saturating_mul(self.flood_delay_multiplier.max(1))
            .min(self.max_debounce.max(self.base_debounce))
    }

    /// Defaults overridden from the process environment.
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
        let mut config = Self::default();
        if let Some(ceiling) = env_parse(&get_env, ENV_FLOOD_CEILING) {
            config.flood_ceiling = ceiling;
        }
        if let Some(ms) = env_parse(&get_env, ENV_DEBOUNCE_MS) {
            config.base_debounce = Duration::from_millis(ms);
        }
        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_bool<F>(get_env: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = get_env(key)?;
    let parsed = parse_bool(&raw);
    if parsed.is_none() {
        tracing::warn!(key, value = %raw, "ignoring unparseable boolean override");
    }
    parsed
}

fn env_parse<T, F>(get_env: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = get_env(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable numeric override");
            None
        }
    }
}
