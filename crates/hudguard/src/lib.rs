#![forbid(unsafe_code)]

//! Resilient heads-up display for canvas games.
//!
//! This crate is the public surface of the HUD subsystem. It re-exports the
//! common types from the internal crates and provides [`HudSubsystem`], which
//! ties a rendering engine to a responsive layout, a resize flood guard, and
//! a tiered recovery orchestrator.
//!
//! # Example
//!
//! ```
//! use hudguard::prelude::*;
//! use hudguard::HeadlessEngine;
//!
//! let mut hud = HudSubsystem::new(
//!     SubsystemConfig::default(),
//!     HeadlessEngine::new(),
//!     Diagnostics::new(),
//! );
//! let strategy = hud.recover_whole_hud().unwrap();
//! assert_eq!(strategy, Some(Strategy::Rich));
//! assert!(hud.ensure_playability().unwrap());
//! hud.destroy();
//! ```

use std::fmt;

pub mod subsystem;

pub use subsystem::{
    ElementStatus, HudSubsystem, LayoutApplied, ListenerId, PositionUpdate, ResizeListener,
    SubsystemConfig, TickOutcome,
};

// --- Core re-exports -------------------------------------------------------

pub use hudguard_core::Instant;
pub use hudguard_core::event::{DomainUpdate, ResizeEvent, ResizeSource, TargetColor};
pub use hudguard_core::geometry::{Point, Rect, Size};
pub use hudguard_core::viewport::{
    Correction, Orientation, Sanitized, ViewportDimensions, sanitize, sanitize_with_density,
};

// --- Layout re-exports -----------------------------------------------------

pub use hudguard_layout::{
    BoundsReport, DeviceClass, LayoutConfig, LayoutCorrection, Region, calculate_layout,
    calculate_layout_for, validate_anchors,
};

// --- Render re-exports -----------------------------------------------------

pub use hudguard_render::headless::{FaultMask, HeadlessEngine};
pub use hudguard_render::{NodeId, PackedRgba, RenderEngine, RenderError};

// --- Widget re-exports -----------------------------------------------------

pub use hudguard_widgets::{
    ConstructionError, ElementFactory, ElementMap, ElementRequest, ElementRole, HudBuilder,
    HudError, Strategy, UiElement, ValidationFailure, text_updater,
};

// --- Runtime re-exports ----------------------------------------------------

pub use hudguard_runtime::{
    Diagnostics, DiagnosticsSummary, ExhaustionFailure, FloodAction, FloodGuardConfig,
    FloodStats, RecoveryConfig, RecoveryState, RecoveryTicket,
};

// --- Errors ---------------------------------------------------------------

/// The subsystem cannot touch the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// [`HudSubsystem::destroy`] has run.
    Destroyed,
    /// The rendering engine reports its drawing context gone.
    EngineLost,
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Destroyed => write!(f, "hud subsystem already destroyed"),
            Self::EngineLost => write!(f, "rendering engine lost"),
        }
    }
}

impl std::error::Error for SceneError {}

/// Standard result type for subsystem operations.
pub type Result<T> = std::result::Result<T, SceneError>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Diagnostics, DomainUpdate, ElementRequest, ElementRole, ElementStatus, HudSubsystem,
        LayoutConfig, RecoveryConfig, RenderEngine, ResizeEvent, Result, SceneError, Strategy,
        SubsystemConfig,
    };

    pub use crate::{core, layout, render, runtime, widgets};
}

pub use hudguard_core as core;
pub use hudguard_layout as layout;
pub use hudguard_render as render;
pub use hudguard_runtime as runtime;
pub use hudguard_widgets as widgets;
