#![forbid(unsafe_code)]

//! Rendering-engine seam.
//!
//! The HUD subsystem never draws anything itself. It asks a [`RenderEngine`]
//! for primitive nodes (containers, rectangles, circles, text), moves them,
//! and destroys them. Any of those calls may fail; callers above this crate
//! are responsible for turning failures into recovery.
//!
//! [`headless::HeadlessEngine`] is an in-memory implementation with
//! deterministic fault injection, used by tests and the storm harness.

pub mod color;
pub mod engine;
pub mod headless;

pub use color::PackedRgba;
pub use engine::{
    CircleSpec, NodeId, PrimitiveKind, RectSpec, RenderEngine, RenderError, TextSpec,
};
