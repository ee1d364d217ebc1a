#![forbid(unsafe_code)]

//! The [`RenderEngine`] trait and the primitive descriptions it consumes.

use std::fmt;

use hudguard_core::geometry::{Point, Size};

use crate::color::PackedRgba;

/// Opaque handle to a node owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Kind of primitive node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Grouping node; children are positioned relative to it.
    Container,
    /// Filled rectangle.
    Rect,
    /// Filled circle.
    Circle,
    /// Plain text.
    Text,
    /// Text with shaping and decorative effects (stroke, shadow, glow).
    RichText,
}

impl PrimitiveKind {
    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Text => "text",
            Self::RichText => "rich_text",
        }
    }
}

/// Filled rectangle, positioned relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectSpec {
    /// Offset from the parent origin.
    pub offset: Point,
    /// Extent.
    pub size: Size,
    /// Fill colour.
    pub fill: PackedRgba,
    /// Optional outline colour.
    pub stroke: Option<PackedRgba>,
}

impl RectSpec {
    /// A filled rectangle at `offset` with no outline.
    #[must_use]
    pub fn filled(offset: Point, size: Size, fill: PackedRgba) -> Self {
        Self {
            offset,
            size,
            fill,
            stroke: None,
        }
    }

    /// Add an outline.
    #[must_use]
    pub fn with_stroke(mut self, stroke: PackedRgba) -> Self {
        self.stroke = Some(stroke);
        self
    }
}

/// Filled circle, positioned relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleSpec {
    /// Center offset from the parent origin.
    pub center: Point,
    /// Radius.
    pub radius: f32,
    /// Fill colour.
    pub fill: PackedRgba,
}

/// Text node, positioned relative to its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpec {
    /// Anchor offset from the parent origin.
    pub offset: Point,
    /// Initial content.
    pub content: String,
    /// Font size in viewport units.
    pub font_size: f32,
    /// Fill colour.
    pub fill: PackedRgba,
    /// Request shaping and decorative effects. Needs loaded fonts.
    pub effects: bool,
}

impl TextSpec {
    /// Plain text without effects.
    #[must_use]
    pub fn plain(offset: Point, content: impl Into<String>, font_size: f32, fill: PackedRgba) -> Self {
        Self {
            offset,
            content: content.into(),
            font_size,
            fill,
            effects: false,
        }
    }

    /// Text with shaping and effects.
    #[must_use]
    pub fn rich(offset: Point, content: impl Into<String>, font_size: f32, fill: PackedRgba) -> Self {
        Self {
            effects: true,
            ..Self::plain(offset, content, font_size, fill)
        }
    }

    /// Primitive kind the engine will create for this spec.
    #[must_use]
    pub fn kind(&self) -> PrimitiveKind {
        if self.effects {
            PrimitiveKind::RichText
        } else {
            PrimitiveKind::Text
        }
    }
}

/// Failure reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The engine refused to create a primitive.
    NodeCreation {
        /// Primitive that failed.
        kind: PrimitiveKind,
        /// Engine-supplied reason.
        reason: String,
    },
    /// The node does not exist (already destroyed or never created).
    UnknownNode(NodeId),
    /// A resource the primitive needs is not ready (fonts, textures).
    ResourceUnavailable(&'static str),
    /// The engine's drawing context is gone.
    EngineLost,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeCreation { kind, reason } => {
                write!(f, "failed to create {} node: {reason}", kind.as_str())
            }
            Self::UnknownNode(id) => write!(f, "unknown {id}"),
            Self::ResourceUnavailable(what) => write!(f, "resource unavailable: {what}"),
            Self::EngineLost => write!(f, "rendering engine lost"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Primitive node construction and destruction, supplied by the host.
///
/// Construction and mutation calls may fail at any time. Destruction is
/// infallible and recursive: destroying a container destroys its children.
/// Destroying an unknown node is a no-op.
pub trait RenderEngine {
    /// Create a top-level container at an absolute position.
    fn create_container(&mut self, position: Point) -> Result<NodeId, RenderError>;

    /// Create a rectangle under `parent`.
    fn create_rect(&mut self, parent: NodeId, spec: RectSpec) -> Result<NodeId, RenderError>;

    /// Create a circle under `parent`.
    fn create_circle(&mut self, parent: NodeId, spec: CircleSpec) -> Result<NodeId, RenderError>;

    /// Create a text node under `parent`.
    fn create_text(&mut self, parent: NodeId, spec: TextSpec) -> Result<NodeId, RenderError>;

    /// Move a node. Containers take absolute positions, children offsets.
    fn set_position(&mut self, node: NodeId, position: Point) -> Result<(), RenderError>;

    /// Replace the content of a text node.
    fn set_text(&mut self, node: NodeId, content: &str) -> Result<(), RenderError>;

    /// Replace the fill colour of a shape or text node.
    fn set_fill(&mut self, node: NodeId, fill: PackedRgba) -> Result<(), RenderError>;

    /// Start or stop a flashing animation on a node.
    fn set_flashing(&mut self, node: NodeId, flashing: bool) -> Result<(), RenderError>;

    /// Halt every animation on `node` and its descendants.
    fn stop_animations(&mut self, node: NodeId);

    /// Destroy `node` and its descendants.
    fn destroy(&mut self, node: NodeId);

    /// The node exists and is shown.
    fn is_visible(&self, node: NodeId) -> bool;

    /// Richly styled text can be constructed safely.
    fn fonts_ready(&self) -> bool {
        true
    }

    /// The drawing context is usable.
    fn is_alive(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_spec_kind_follows_effects() {
        let plain = TextSpec::plain(Point::default(), "0", 12.0, PackedRgba::WHITE);
        let rich = TextSpec::rich(Point::default(), "0", 12.0, PackedRgba::WHITE);
        assert_eq!(plain.kind(), PrimitiveKind::Text);
        assert_eq!(rich.kind(), PrimitiveKind::RichText);
    }

    #[test]
    fn errors_display_primitive_kind() {
        let e = RenderError::NodeCreation {
            kind: PrimitiveKind::Circle,
            reason: "out of memory".into(),
        };
        assert_eq!(e.to_string(), "failed to create circle node: out of memory");
        assert_eq!(RenderError::UnknownNode(NodeId(7)).to_string(), "unknown node#7");
    }
}
