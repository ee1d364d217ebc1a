#![forbid(unsafe_code)]

//! Terminal recovery failure.

use std::fmt;

use hudguard_widgets::HudError;

/// Every tier available to a recovery failed, including the emergency tier
/// when it was allowed to run.
///
/// This is the only failure the orchestrator surfaces; callers are expected
/// to fall back to the playability guarantee.
#[derive(Debug, Clone, PartialEq)]
pub struct ExhaustionFailure {
    /// Component the recovery was for (`"hud"` for whole-HUD recovery).
    pub component: String,
    /// Construction attempts made, across all stages.
    pub attempts: u32,
    /// Error from the final attempt, if any attempt ran.
    pub last_error: Option<HudError>,
}

impl fmt::Display for ExhaustionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "recovery exhausted for {} after {} attempt(s)",
            self.component, self.attempts
        )?;
        if let Some(err) = &self.last_error {
            write!(f, ": {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ExhaustionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.last_error
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
