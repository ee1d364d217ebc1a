#![forbid(unsafe_code)]

//! HUD elements and the strategies that build them.
//!
//! - [`element`] - [`UiElement`] handles and [`ElementRequest`]s.
//! - [`strategy`] - the static four-tier constructor table.
//! - [`error_boundary`] - panic capture around construction.
//! - [`hud`] - whole-HUD assembly, region validation, teardown.
//! - [`placement`] - applying a layout snapshot to live elements.
//!
//! Nothing here retries or schedules; that is the recovery orchestrator's
//! job. Every function either returns a finished element set or leaves no
//! nodes behind.

pub mod element;
pub mod error;
pub mod error_boundary;
pub mod hud;
pub mod placement;
pub mod strategy;

pub use element::{ElementRequest, ElementRole, UiElement, Updater};
pub use error::{ConstructionError, HudError, ValidationFailure};
pub use error_boundary::{guard_construction, panic_message};
pub use hud::{
    ElementMap, HudBuilder, REQUIRED_ROLES, assemble_hud, build_hud, default_hud_builder,
    populate_hud, validate_hud,
};
pub use placement::{PlacementReport, update_element_positions};
pub use strategy::{
    BuildFn, ElementFactory, STRATEGIES, Strategy, StrategyEntry, emergency_for, emergency_marker,
    text_updater,
};
