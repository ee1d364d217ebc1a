#![forbid(unsafe_code)]

//! HUD element handles.
//!
//! A [`UiElement`] owns one top-level container node plus the primitive
//! parts drawn inside it. It is replaced wholesale when a different
//! strategy rebuilds it; parts are never patched across strategies.

use std::fmt;

use hudguard_core::event::DomainUpdate;
use hudguard_core::geometry::{Point, Size};
use hudguard_layout::{LayoutConfig, MIN_FONT_SIZE, MIN_TAP_TARGET, Region};
use hudguard_render::{CircleSpec, NodeId, RectSpec, RenderEngine, RenderError, TextSpec};

use crate::strategy::Strategy;

/// Callback that applies a domain update to an element's parts.
pub type Updater =
    Box<dyn FnMut(&mut dyn RenderEngine, &[NodeId], &DomainUpdate) -> Result<(), RenderError>>;

/// Semantic role of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementRole {
    /// Header band.
    Header,
    /// Title text.
    Title,
    /// Score readout.
    Score,
    /// Timer readout.
    Timer,
    /// Status-charge indicators.
    ChargeRow,
    /// Target colour prompt.
    TargetPrompt,
    /// Primary tap target.
    ActionButton,
    /// Anything without a layout region.
    Generic,
    /// The last-resort flashing marker.
    Marker,
}

impl ElementRole {
    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Title => "title",
            Self::Score => "score",
            Self::Timer => "timer",
            Self::ChargeRow => "charge_row",
            Self::TargetPrompt => "target_prompt",
            Self::ActionButton => "action_button",
            Self::Generic => "generic",
            Self::Marker => "marker",
        }
    }

    /// Layout region the role is positioned by.
    #[must_use]
    pub const fn region(self) -> Option<Region> {
        match self {
            Self::Header => Some(Region::Header),
            Self::Title => Some(Region::Title),
            Self::Score => Some(Region::Score),
            Self::Timer => Some(Region::Timer),
            Self::ChargeRow => Some(Region::ChargeRow),
            Self::TargetPrompt => Some(Region::TargetPrompt),
            Self::ActionButton => Some(Region::ActionButton),
            Self::Generic | Self::Marker => None,
        }
    }

    /// The player can tap elements with this role.
    #[must_use]
    pub const fn is_interactive(self) -> bool {
        match self.region() {
            Some(region) => region.is_interactive(),
            None => matches!(self, Self::Marker),
        }
    }
}

impl From<Region> for ElementRole {
    fn from(region: Region) -> Self {
        match region {
            Region::Header => Self::Header,
            Region::Title => Self::Title,
            Region::Score => Self::Score,
            Region::Timer => Self::Timer,
            Region::ChargeRow => Self::ChargeRow,
            Region::TargetPrompt => Self::TargetPrompt,
            Region::ActionButton => Self::ActionButton,
        }
    }
}

impl fmt::Display for ElementRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a factory is asked to build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRequest {
    /// Semantic role.
    pub role: ElementRole,
    /// Absolute anchor position.
    pub position: Point,
    /// Extent of the element's box.
    pub extent: Size,
    /// Font size for any text.
    pub font_size: f32,
}

impl ElementRequest {
    /// A request with a tap-sized extent and a readable font.
    #[must_use]
    pub fn new(role: ElementRole, position: Point) -> Self {
        Self {
            role,
            position,
            extent: Size::new(MIN_TAP_TARGET * 2.0, MIN_TAP_TARGET),
            font_size: MIN_FONT_SIZE * 2.0,
        }
    }

    /// Override the extent.
    #[must_use]
    pub fn with_extent(mut self, extent: Size) -> Self {
        self.extent = extent;
        self
    }

    /// Override the font size.
    #[must_use]
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Request for a layout region.
    ///
    /// Text regions get a box sized from their font.
    #[must_use]
    pub fn for_region(region: Region, layout: &LayoutConfig) -> Self {
        let font_size = layout.text(region).map_or(layout.fonts.body, |t| t.font_size);
        let bounds = layout.bounds(region);
        let extent = if bounds.width > 0.0 && bounds.height > 0.0 {
            bounds.size()
        } else {
            Size::new(font_size * 3.0, font_size)
        };
        Self {
            role: ElementRole::from(region),
            position: layout.anchor(region),
            extent,
            font_size,
        }
    }

    /// Request for any role. Roles without a region are centered.
    #[must_use]
    pub fn for_role(role: ElementRole, layout: &LayoutConfig) -> Self {
        match role.region() {
            Some(region) => Self::for_region(region, layout),
            None => {
                let c = Point::new(layout.viewport.width / 2.0, layout.viewport.height / 2.0);
                Self::new(role, c).with_font_size(layout.fonts.body)
            }
        }
    }
}

/// A constructed HUD element.
pub struct UiElement {
    strategy: Strategy,
    role: ElementRole,
    container: NodeId,
    parts: Vec<NodeId>,
    position: Point,
    updater: Option<Updater>,
}

impl fmt::Debug for UiElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiElement")
            .field("strategy", &self.strategy)
            .field("role", &self.role)
            .field("container", &self.container)
            .field("parts", &self.parts)
            .field("position", &self.position)
            .field("has_updater", &self.updater.is_some())
            .finish()
    }
}

impl UiElement {
    /// Wrap an existing container. Prefer the strategy table for
    /// construction; this is for host-supplied factories.
    #[must_use]
    pub fn new(strategy: Strategy, role: ElementRole, container: NodeId, position: Point) -> Self {
        Self {
            strategy,
            role,
            container,
            parts: Vec::new(),
            position,
            updater: None,
        }
    }

    /// Add primitive parts owned by the container.
    #[must_use]
    pub fn with_parts(mut self, parts: impl IntoIterator<Item = NodeId>) -> Self {
        self.parts.extend(parts);
        self
    }

    /// Attach an update callback.
    #[must_use]
    pub fn with_updater(mut self, updater: Updater) -> Self {
        self.updater = Some(updater);
        self
    }

    /// Strategy that built this element.
    #[inline]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Semantic role.
    #[inline]
    pub fn role(&self) -> ElementRole {
        self.role
    }

    /// Owning container node.
    #[inline]
    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Primitive parts, in construction order.
    #[inline]
    pub fn parts(&self) -> &[NodeId] {
        &self.parts
    }

    /// Current absolute anchor.
    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    /// The element accepts taps.
    #[inline]
    pub fn is_interactive(&self) -> bool {
        self.role.is_interactive()
    }

    /// The element has an update callback.
    #[inline]
    pub fn has_updater(&self) -> bool {
        self.updater.is_some()
    }

    /// The container is still shown by the engine.
    pub fn is_visible(&self, engine: &dyn RenderEngine) -> bool {
        engine.is_visible(self.container)
    }

    /// Move the container to an absolute position.
    pub fn set_position(
        &mut self,
        engine: &mut dyn RenderEngine,
        position: Point,
    ) -> Result<(), RenderError> {
        engine.set_position(self.container, position)?;
        self.position = position;
        Ok(())
    }

    /// Forward a domain update to the callback, if any.
    pub fn update(
        &mut self,
        engine: &mut dyn RenderEngine,
        update: &DomainUpdate,
    ) -> Result<(), RenderError> {
        match self.updater.as_mut() {
            Some(apply) => apply(engine, &self.parts, update),
            None => Ok(()),
        }
    }

    /// Halt animations and destroy every node.
    pub fn teardown(self, engine: &mut dyn RenderEngine) {
        engine.stop_animations(self.container);
        engine.destroy(self.container);
    }
}

/// In-progress element. Destroys its container on drop unless finished,
/// so an early `?` or a panic leaves no orphan nodes behind.
pub(crate) struct Assembly<'e> {
    engine: &'e mut dyn RenderEngine,
    strategy: Strategy,
    role: ElementRole,
    position: Point,
    container: NodeId,
    parts: Vec<NodeId>,
    armed: bool,
}

impl<'e> Assembly<'e> {
    pub(crate) fn begin(
        engine: &'e mut dyn RenderEngine,
        strategy: Strategy,
        request: &ElementRequest,
    ) -> Result<Self, RenderError> {
        let container = engine.create_container(request.position)?;
        Ok(Self {
            engine,
            strategy,
            role: request.role,
            position: request.position,
            container,
            parts: Vec::new(),
            armed: true,
        })
    }

    pub(crate) fn rect(&mut self, spec: RectSpec) -> Result<NodeId, RenderError> {
        let id = self.engine.create_rect(self.container, spec)?;
        self.parts.push(id);
        Ok(id)
    }

    pub(crate) fn circle(&mut self, spec: CircleSpec) -> Result<NodeId, RenderError> {
        let id = self.engine.create_circle(self.container, spec)?;
        self.parts.push(id);
        Ok(id)
    }

    pub(crate) fn text(&mut self, spec: TextSpec) -> Result<NodeId, RenderError> {
        let id = self.engine.create_text(self.container, spec)?;
        self.parts.push(id);
        Ok(id)
    }

    pub(crate) fn flash(&mut self, node: NodeId) -> Result<(), RenderError> {
        self.engine.set_flashing(node, true)
    }

    pub(crate) fn finish(mut self, updater: Option<Updater>) -> UiElement {
        self.armed = false;
        UiElement {
            strategy: self.strategy,
            role: self.role,
            container: self.container,
            parts: std::mem::take(&mut self.parts),
            position: self.position,
            updater,
        }
    }
}

impl Drop for Assembly<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.engine.stop_animations(self.container);
            self.engine.destroy(self.container);
        }
    }
}
