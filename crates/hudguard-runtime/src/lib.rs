#![forbid(unsafe_code)]

//! Scheduling and recovery for the HUD subsystem.
//!
//! - [`flood_guard`] - latest-wins resize debouncing with flood protection.
//! - [`timers`] - deferred continuations drained by `tick_at`.
//! - [`diagnostics`] - bounded attempt log and counters.
//! - [`config`] - recovery and flood-guard settings, with env overrides.
//! - [`recovery`] - per-element retries, whole-HUD fallback, playability floor.
//!
//! Everything here is single-threaded and driven by explicit `now` values;
//! nothing blocks and nothing spawns.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod flood_guard;
pub mod recovery;
pub mod timers;

pub use config::{FloodGuardConfig, RecoveryConfig};
pub use diagnostics::{
    AttemptOutcome, AttemptStage, DEFAULT_DIAGNOSTICS_CAPACITY, Diagnostics, DiagnosticsCollector,
    DiagnosticsSummary, RecoveryAttempt,
};
pub use error::ExhaustionFailure;
pub use flood_guard::{FloodAction, FloodDecision, FloodGuard, FloodStats};
pub use recovery::{
    Playability, RecoveryCompletion, RecoveryOrchestrator, RecoveryPoll, RecoveryState,
    RecoveryTicket,
};
pub use timers::{TimerId, TimerQueue};
