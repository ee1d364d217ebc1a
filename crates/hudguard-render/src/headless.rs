#![forbid(unsafe_code)]

//! In-memory rendering engine with deterministic fault injection.
//!
//! `HeadlessEngine` keeps a node table instead of drawing, so tests can
//! assert on what the subsystem built, where it put it, and what it tore
//! down. Faults can be injected per primitive kind, for the next N calls,
//! or at a seeded random rate.
//!
//! # Example
//!
//! ```
//! use hudguard_render::headless::{FaultMask, HeadlessEngine};
//! use hudguard_render::RenderEngine;
//! use hudguard_core::geometry::Point;
//!
//! let mut engine = HeadlessEngine::new().with_faults(FaultMask::CONTAINER);
//! assert!(engine.create_container(Point::new(0.0, 0.0)).is_err());
//! engine.clear_faults();
//! assert!(engine.create_container(Point::new(0.0, 0.0)).is_ok());
//! ```

use std::collections::BTreeMap;

use bitflags::bitflags;
use hudguard_core::geometry::{Point, Size};

use crate::color::PackedRgba;
use crate::engine::{
    CircleSpec, NodeId, PrimitiveKind, RectSpec, RenderEngine, RenderError, TextSpec,
};

bitflags! {
    /// Operations that should fail.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FaultMask: u8 {
        /// Container creation.
        const CONTAINER = 1 << 0;
        /// Rectangle creation.
        const RECT = 1 << 1;
        /// Circle creation.
        const CIRCLE = 1 << 2;
        /// Plain text creation.
        const TEXT = 1 << 3;
        /// Rich text creation.
        const RICH_TEXT = 1 << 4;
        /// `set_position`.
        const POSITION = 1 << 5;
        /// `set_text`, `set_fill`, `set_flashing`.
        const MUTATION = 1 << 6;
    }
}

impl FaultMask {
    /// Mask bit for a primitive kind.
    #[must_use]
    pub const fn for_kind(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Container => Self::CONTAINER,
            PrimitiveKind::Rect => Self::RECT,
            PrimitiveKind::Circle => Self::CIRCLE,
            PrimitiveKind::Text => Self::TEXT,
            PrimitiveKind::RichText => Self::RICH_TEXT,
        }
    }
}

/// A node held by the headless engine.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessNode {
    /// Primitive kind.
    pub kind: PrimitiveKind,
    /// Parent container, `None` for top-level containers.
    pub parent: Option<NodeId>,
    /// Absolute position for containers, offset for children.
    pub position: Point,
    /// Extent, zero for containers and text.
    pub size: Size,
    /// Text content.
    pub text: Option<String>,
    /// Font size for text nodes.
    pub font_size: f32,
    /// Fill colour.
    pub fill: PackedRgba,
    /// A flashing animation is running.
    pub flashing: bool,
}

/// Counters kept by the headless engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStats {
    /// Nodes successfully created.
    pub created: u64,
    /// Nodes destroyed, including descendants.
    pub destroyed: u64,
    /// Calls that failed, injected or not.
    pub failed: u64,
}

/// Simple LCG PRNG for deterministic fault generation.
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

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() as f64) / (u64::MAX as f64)
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

#[derive(Debug, Clone)]
struct RandomFaults {
    rng: SeededRng,
    rate: f64,
}

/// In-memory [`RenderEngine`].
#[derive(Debug, Clone)]
pub struct HeadlessEngine {
    next_id: u64,
    nodes: BTreeMap<NodeId, HeadlessNode>,
    always_fail: FaultMask,
    fail_next: u32,
    random: Option<RandomFaults>,
    fonts_ready: bool,
    alive: bool,
    stats: EngineStats,
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessEngine {
    /// A healthy engine with fonts loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            nodes: BTreeMap::new(),
            always_fail: FaultMask::empty(),
            fail_next: 0,
            random: None,
            fonts_ready: true,
            alive: true,
            stats: EngineStats::default(),
        }
    }

    /// Fail every operation in `mask` until cleared.
    #[must_use]
    pub fn with_faults(mut self, mask: FaultMask) -> Self {
        self.always_fail = mask;
        self
    }

    /// Fail node creation at `rate` (0.0..=1.0) using a seeded generator.
    #[must_use]
    pub fn with_random_faults(mut self, seed: u64, rate: f64) -> Self {
        self.random = Some(RandomFaults {
            rng: SeededRng::new(seed),
            rate: rate.clamp(0.0, 1.0),
        });
        self
    }

    /// Report fonts as not yet loaded.
    #[must_use]
    pub fn without_fonts(mut self) -> Self {
        self.fonts_ready = false;
        self
    }

    /// Replace the persistent fault mask.
    pub fn set_faults(&mut self, mask: FaultMask) {
        self.always_fail = mask;
    }

    /// Fail the next `count` node creations regardless of kind.
    pub fn fail_next(&mut self, count: u32) {
        self.fail_next = count;
    }

    /// Remove every injected fault.
    pub fn clear_faults(&mut self) {
        self.always_fail = FaultMask::empty();
        self.fail_next = 0;
        self.random = None;
    }

    /// Flip the font-readiness signal.
    pub fn set_fonts_ready(&mut self, ready: bool) {
        self.fonts_ready = ready;
    }

    /// Simulate losing the drawing context. Every later call fails.
    pub fn lose_context(&mut self) {
        self.alive = false;
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Look up a live node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&HeadlessNode> {
        self.nodes.get(&id)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.nodes.len()
    }

    /// Live top-level containers.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Direct children of `id`.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(id))
            .map(|(child, _)| *child)
            .collect()
    }

    /// Absolute position of a node, following the parent chain.
    #[must_use]
    pub fn absolute_position(&self, id: NodeId) -> Option<Point> {
        let mut node = self.nodes.get(&id)?;
        let mut pos = node.position;
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            pos = Point::new(pos.x + node.position.x, pos.y + node.position.y);
        }
        Some(pos)
    }

    /// Nodes currently flashing.
    #[must_use]
    pub fn flashing_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.flashing)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Text content of every live text node, in creation order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.nodes
            .values()
            .filter_map(|n| n.text.as_deref())
            .collect()
    }

    fn check_alive(&mut self) -> Result<(), RenderError> {
        if self.alive {
            Ok(())
        } else {
            self.stats.failed += 1;
            Err(RenderError::EngineLost)
        }
    }

    fn check_creation(&mut self, kind: PrimitiveKind) -> Result<(), RenderError> {
        self.check_alive()?;
        if kind == PrimitiveKind::RichText && !self.fonts_ready {
            self.stats.failed += 1;
            return Err(RenderError::ResourceUnavailable("fonts"));
        }

        let injected = if self.always_fail.contains(FaultMask::for_kind(kind)) {
            true
        } else if self.fail_next > 0 {
            self.fail_next -= 1;
            true
        } else if let Some(random) = self.random.as_mut() {
            random.rng.chance(random.rate)
        } else {
            false
        };

        if injected {
            self.stats.failed += 1;
            return Err(RenderError::NodeCreation {
                kind,
                reason: "injected fault".into(),
            });
        }
        Ok(())
    }

    fn check_mutation(&mut self, node: NodeId, mask: FaultMask) -> Result<(), RenderError> {
        self.check_alive()?;
        if !self.nodes.contains_key(&node) {
            self.stats.failed += 1;
            return Err(RenderError::UnknownNode(node));
        }
        if self.always_fail.contains(mask) {
            self.stats.failed += 1;
            return Err(RenderError::NodeCreation {
                kind: self.nodes[&node].kind,
                reason: "injected mutation fault".into(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, node: HeadlessNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        self.stats.created += 1;
        id
    }

    fn insert_child(&mut self, parent: NodeId, node: HeadlessNode) -> Result<NodeId, RenderError> {
        if !self.nodes.contains_key(&parent) {
            self.stats.failed += 1;
            return Err(RenderError::UnknownNode(parent));
        }
        Ok(self.insert(node))
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = vec![root];
        let mut idx = 0;
        while idx < out.len() {
            let current = out[idx];
            out.extend(self.children(current));
            idx += 1;
        }
        out
    }
}

impl RenderEngine for HeadlessEngine {
    fn create_container(&mut self, position: Point) -> Result<NodeId, RenderError> {
        self.check_creation(PrimitiveKind::Container)?;
        Ok(self.insert(HeadlessNode {
            kind: PrimitiveKind::Container,
            parent: None,
            position,
            size: Size::default(),
            text: None,
            font_size: 0.0,
            fill: PackedRgba::TRANSPARENT,
            flashing: false,
        }))
    }

    fn create_rect(&mut self, parent: NodeId, spec: RectSpec) -> Result<NodeId, RenderError> {
        self.check_creation(PrimitiveKind::Rect)?;
        self.insert_child(
            parent,
            HeadlessNode {
                kind: PrimitiveKind::Rect,
                parent: Some(parent),
                position: spec.offset,
                size: spec.size,
                text: None,
                font_size: 0.0,
                fill: spec.fill,
                flashing: false,
            },
        )
    }

    fn create_circle(&mut self, parent: NodeId, spec: CircleSpec) -> Result<NodeId, RenderError> {
        self.check_creation(PrimitiveKind::Circle)?;
        let diameter = spec.radius * 2.0;
        self.insert_child(
            parent,
            HeadlessNode {
                kind: PrimitiveKind::Circle,
                parent: Some(parent),
                position: spec.center,
                size: Size::new(diameter, diameter),
                text: None,
                font_size: 0.0,
                fill: spec.fill,
                flashing: false,
            },
        )
    }

    fn create_text(&mut self, parent: NodeId, spec: TextSpec) -> Result<NodeId, RenderError> {
        let kind = spec.kind();
        self.check_creation(kind)?;
        self.insert_child(
            parent,
            HeadlessNode {
                kind,
                parent: Some(parent),
                position: spec.offset,
                size: Size::default(),
                text: Some(spec.content),
                font_size: spec.font_size,
                fill: spec.fill,
                flashing: false,
            },
        )
    }

    fn set_position(&mut self, node: NodeId, position: Point) -> Result<(), RenderError> {
        self.check_mutation(node, FaultMask::POSITION)?;
        if let Some(n) = self.nodes.get_mut(&node) {
            n.position = position;
        }
        Ok(())
    }

    fn set_text(&mut self, node: NodeId, content: &str) -> Result<(), RenderError> {
        self.check_mutation(node, FaultMask::MUTATION)?;
        if let Some(n) = self.nodes.get_mut(&node) {
            n.text = Some(content.to_string());
        }
        Ok(())
    }

    fn set_fill(&mut self, node: NodeId, fill: PackedRgba) -> Result<(), RenderError> {
        self.check_mutation(node, FaultMask::MUTATION)?;
        if let Some(n) = self.nodes.get_mut(&node) {
            n.fill = fill;
        }
        Ok(())
    }

    fn set_flashing(&mut self, node: NodeId, flashing: bool) -> Result<(), RenderError> {
        self.check_mutation(node, FaultMask::MUTATION)?;
        if let Some(n) = self.nodes.get_mut(&node) {
            n.flashing = flashing;
        }
        Ok(())
    }

    fn stop_animations(&mut self, node: NodeId) {
        for id in self.descendants(node) {
            if let Some(n) = self.nodes.get_mut(&id) {
                n.flashing = false;
            }
        }
    }

    fn destroy(&mut self, node: NodeId) {
        if !self.nodes.contains_key(&node) {
            return;
        }
        for id in self.descendants(node) {
            if self.nodes.remove(&id).is_some() {
                self.stats.destroyed += 1;
            }
        }
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.alive && self.nodes.contains_key(&node)
    }

    fn fonts_ready(&self) -> bool {
        self.fonts_ready
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> RectSpec {
        RectSpec::filled(Point::new(1.0, 2.0), Size::new(10.0, 10.0), PackedRgba::RED)
    }

    #[test]
    fn destroy_removes_descendants() {
        let mut e = HeadlessEngine::new();
        let root = e.create_container(Point::new(5.0, 5.0)).unwrap();
        let child = e.create_rect(root, rect()).unwrap();
        assert_eq!(e.live_count(), 2);
        assert_eq!(e.absolute_position(child), Some(Point::new(6.0, 7.0)));

        e.destroy(root);
        assert_eq!(e.live_count(), 0);
        assert_eq!(e.stats().destroyed, 2);
        e.destroy(root);
        assert_eq!(e.stats().destroyed, 2);
    }

    #[test]
    fn fault_mask_targets_one_kind() {
        let mut e = HeadlessEngine::new().with_faults(FaultMask::CIRCLE);
        let root = e.create_container(Point::default()).unwrap();
        assert!(e.create_rect(root, rect()).is_ok());
        let err = e
            .create_circle(
                root,
                CircleSpec {
                    center: Point::default(),
                    radius: 4.0,
                    fill: PackedRgba::WHITE,
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::NodeCreation {
                kind: PrimitiveKind::Circle,
                ..
            }
        ));
        assert_eq!(e.stats().failed, 1);
    }

    #[test]
    fn fail_next_counts_down() {
        let mut e = HeadlessEngine::new();
        e.fail_next(2);
        assert!(e.create_container(Point::default()).is_err());
        assert!(e.create_container(Point::default()).is_err());
        assert!(e.create_container(Point::default()).is_ok());
    }

    #[test]
    fn rich_text_needs_fonts() {
        let mut e = HeadlessEngine::new().without_fonts();
        let root = e.create_container(Point::default()).unwrap();
        let spec = TextSpec::rich(Point::default(), "SCORE", 24.0, PackedRgba::WHITE);
        assert_eq!(
            e.create_text(root, spec.clone()),
            Err(RenderError::ResourceUnavailable("fonts"))
        );
        e.set_fonts_ready(true);
        assert!(e.create_text(root, spec).is_ok());
    }

    #[test]
    fn lost_context_fails_everything() {
        let mut e = HeadlessEngine::new();
        let root = e.create_container(Point::default()).unwrap();
        e.lose_context();
        assert_eq!(
            e.create_container(Point::default()),
            Err(RenderError::EngineLost)
        );
        assert_eq!(
            e.set_position(root, Point::default()),
            Err(RenderError::EngineLost)
        );
        assert!(!e.is_visible(root));
    }

    #[test]
    fn random_faults_are_deterministic() {
        let run = |seed| {
            let mut e = HeadlessEngine::new().with_random_faults(seed, 0.5);
            (0..32)
                .map(|_| e.create_container(Point::default()).is_ok())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
        assert!(run(42).iter().any(|ok| *ok));
        assert!(run(42).iter().any(|ok| !*ok));
    }

    #[test]
    fn stop_animations_reaches_children() {
        let mut e = HeadlessEngine::new();
        let root = e.create_container(Point::default()).unwrap();
        let child = e.create_rect(root, rect()).unwrap();
        e.set_flashing(child, true).unwrap();
        assert_eq!(e.flashing_nodes(), vec![child]);
        e.stop_animations(root);
        assert!(e.flashing_nodes().is_empty());
    }
}
