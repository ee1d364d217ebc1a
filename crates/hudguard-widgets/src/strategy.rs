#![forbid(unsafe_code)]

//! Element creation strategies.
//!
//! Four tiers, ordered from most capable to least failure-prone. Each tier
//! restricts itself to a distinct set of primitives:
//!
//! | Tier       | Primitives                          | Needs fonts |
//! |------------|-------------------------------------|-------------|
//! | `rich`     | rich text, rects, circles           | yes         |
//! | `graphics` | plain text, rects, circles          | no          |
//! | `minimal`  | one circle                          | no          |
//! | `emergency`| rects                               | no          |
//!
//! The table is static and resolved at compile time; nothing is looked up
//! by name at call time.

use std::fmt;

use hudguard_core::event::DomainUpdate;
use hudguard_core::geometry::{Point, Size};
use hudguard_layout::MIN_TAP_TARGET;
use hudguard_render::{
    CircleSpec, NodeId, PackedRgba, RectSpec, RenderEngine, RenderError, TextSpec,
};

use crate::element::{Assembly, ElementRequest, ElementRole, UiElement, Updater};
use crate::error::ConstructionError;

/// Builds one element for a request.
pub type BuildFn =
    fn(&mut dyn RenderEngine, &ElementRequest) -> Result<UiElement, ConstructionError>;

/// Host-supplied element factory. May fail or panic.
pub type ElementFactory =
    Box<dyn FnMut(&mut dyn RenderEngine, &ElementRequest) -> Result<UiElement, ConstructionError>>;

/// Creation tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strategy {
    /// Styled text with decorative effects.
    Rich,
    /// Shapes and plain text.
    Graphics,
    /// One coloured indicator per element.
    Minimal,
    /// High-contrast rectangles only.
    Emergency,
}

impl Strategy {
    /// Tiers from most to least capable.
    pub const ALL: [Strategy; 4] = [
        Strategy::Rich,
        Strategy::Graphics,
        Strategy::Minimal,
        Strategy::Emergency,
    ];

    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rich => "rich",
            Self::Graphics => "graphics",
            Self::Minimal => "minimal",
            Self::Emergency => "emergency",
        }
    }

    /// Parse a tier name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// Next cheaper tier.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Rich => Some(Self::Graphics),
            Self::Graphics => Some(Self::Minimal),
            Self::Minimal => Some(Self::Emergency),
            Self::Emergency => None,
        }
    }

    /// Roles a whole HUD built with this tier contains.
    #[must_use]
    pub const fn hud_roles(self) -> &'static [ElementRole] {
        const FULL: &[ElementRole] = &[
            ElementRole::Header,
            ElementRole::Title,
            ElementRole::Score,
            ElementRole::Timer,
            ElementRole::ChargeRow,
            ElementRole::TargetPrompt,
            ElementRole::ActionButton,
        ];
        const REDUCED: &[ElementRole] = &[
            ElementRole::Header,
            ElementRole::Score,
            ElementRole::Timer,
            ElementRole::TargetPrompt,
            ElementRole::ActionButton,
        ];
        match self {
            Self::Rich | Self::Graphics => FULL,
            Self::Minimal | Self::Emergency => REDUCED,
        }
    }

    /// Table entry for this tier.
    #[must_use]
    pub fn entry(self) -> &'static StrategyEntry {
        &STRATEGIES[self as usize]
    }

    /// Build an element with this tier.
    pub fn build(
        self,
        engine: &mut dyn RenderEngine,
        request: &ElementRequest,
    ) -> Result<UiElement, ConstructionError> {
        (self.entry().build)(engine, request)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of [`STRATEGIES`].
#[derive(Debug, Clone, Copy)]
pub struct StrategyEntry {
    /// Tier.
    pub strategy: Strategy,
    /// Constructor.
    pub build: BuildFn,
}

/// Tier to constructor, in [`Strategy::ALL`] order.
pub static STRATEGIES: [StrategyEntry; 4] = [
    StrategyEntry {
        strategy: Strategy::Rich,
        build: build_rich,
    },
    StrategyEntry {
        strategy: Strategy::Graphics,
        build: build_graphics,
    },
    StrategyEntry {
        strategy: Strategy::Minimal,
        build: build_minimal,
    },
    StrategyEntry {
        strategy: Strategy::Emergency,
        build: build_emergency,
    },
];

// ── Palette ─────────────────────────────────────────────────────────────

const HEADER_FILL: PackedRgba = PackedRgba::rgb(24, 24, 40);
const PROMPT_FILL: PackedRgba = PackedRgba::rgb(40, 40, 64);
const BUTTON_FILL: PackedRgba = PackedRgba::rgb(60, 120, 220);
const CHARGE_FILL: PackedRgba = PackedRgba::YELLOW;
const INDICATOR_ON: PackedRgba = PackedRgba::rgb(80, 200, 120);
const INDICATOR_OFF: PackedRgba = PackedRgba::rgb(200, 80, 80);

const TITLE_TEXT: &str = "REACT";
const BUTTON_TEXT: &str = "GO";

// ── Updaters ────────────────────────────────────────────────────────────

fn score_text() -> Updater {
    Box::new(
        |engine: &mut dyn RenderEngine, parts: &[NodeId], update: &DomainUpdate| {
            match (update, parts.last()) {
                (DomainUpdate::ScoreChanged(score), Some(&node)) => {
                    engine.set_text(node, &score.to_string())
                }
                _ => Ok(()),
            }
        },
    )
}

fn timer_text() -> Updater {
    Box::new(
        |engine: &mut dyn RenderEngine, parts: &[NodeId], update: &DomainUpdate| {
            match (update, parts.last()) {
                (DomainUpdate::TimeElapsed(elapsed), Some(&node)) => {
                    engine.set_text(node, &format!("{:.1}", elapsed.as_secs_f32()))
                }
                _ => Ok(()),
            }
        },
    )
}

/// Band fill is the first part, label the second.
fn prompt_band() -> Updater {
    Box::new(
        |engine: &mut dyn RenderEngine, parts: &[NodeId], update: &DomainUpdate| {
            let DomainUpdate::TargetChanged(target) = update else {
                return Ok(());
            };
            if let Some(&band) = parts.first() {
                engine.set_fill(band, PackedRgba::from_rgb24(target.rgb))?;
            }
            match parts.get(1) {
                Some(&label) => engine.set_text(label, &target.name),
                None => Ok(()),
            }
        },
    )
}

/// Alternates one part between two fills on every matching update.
fn parity_fill(role: ElementRole, on: PackedRgba, off: PackedRgba) -> Updater {
    Box::new(
        move |engine: &mut dyn RenderEngine, parts: &[NodeId], update: &DomainUpdate| {
            let tick = match (role, update) {
                (ElementRole::Score, DomainUpdate::ScoreChanged(score)) => u64::from(*score),
                (ElementRole::Timer, DomainUpdate::TimeElapsed(elapsed)) => elapsed.as_secs(),
                _ => return Ok(()),
            };
            match parts.first() {
                Some(&node) => engine.set_fill(node, if tick % 2 == 0 { on } else { off }),
                None => Ok(()),
            }
        },
    )
}

fn target_fill() -> Updater {
    Box::new(
        |engine: &mut dyn RenderEngine, parts: &[NodeId], update: &DomainUpdate| {
            match (update, parts.first()) {
                (DomainUpdate::TargetChanged(target), Some(&node)) => {
                    engine.set_fill(node, PackedRgba::from_rgb24(target.rgb))
                }
                _ => Ok(()),
            }
        },
    )
}

// ── Rich / graphics ─────────────────────────────────────────────────────

fn build_rich(
    engine: &mut dyn RenderEngine,
    request: &ElementRequest,
) -> Result<UiElement, ConstructionError> {
    if !engine.fonts_ready() {
        return Err(ConstructionError::ResourceUnavailable("fonts"));
    }
    build_styled(engine, request, Strategy::Rich)
}

fn build_graphics(
    engine: &mut dyn RenderEngine,
    request: &ElementRequest,
) -> Result<UiElement, ConstructionError> {
    build_styled(engine, request, Strategy::Graphics)
}

fn build_styled(
    engine: &mut dyn RenderEngine,
    request: &ElementRequest,
    strategy: Strategy,
) -> Result<UiElement, ConstructionError> {
    let effects = strategy == Strategy::Rich;
    let text = |offset: Point, content: &str, font_size: f32| TextSpec {
        effects,
        ..TextSpec::plain(offset, content, font_size, PackedRgba::WHITE)
    };
    let extent = request.extent;
    let center = Point::new(extent.width / 2.0, extent.height / 2.0);
    let mut a = Assembly::begin(engine, strategy, request)?;

    let updater = match request.role {
        ElementRole::Header => {
            a.rect(RectSpec::filled(Point::default(), extent, HEADER_FILL))?;
            None
        }
        ElementRole::Title => {
            a.text(text(Point::default(), TITLE_TEXT, request.font_size))?;
            None
        }
        ElementRole::Score => {
            a.text(text(Point::default(), "0", request.font_size))?;
            Some(score_text())
        }
        ElementRole::Timer => {
            a.text(text(Point::default(), "0.0", request.font_size))?;
            Some(timer_text())
        }
        ElementRole::ChargeRow => {
            let d = extent.height;
            let gap = ((extent.width - 3.0 * d) / 2.0).max(0.0);
            for i in 0..3u8 {
                let cx = d / 2.0 + f32::from(i) * (d + gap);
                a.circle(CircleSpec {
                    center: Point::new(cx, d / 2.0),
                    radius: d / 2.0,
                    fill: CHARGE_FILL,
                })?;
            }
            None
        }
        ElementRole::TargetPrompt => {
            a.rect(RectSpec::filled(Point::default(), extent, PROMPT_FILL))?;
            a.text(text(center, "", request.font_size))?;
            Some(prompt_band())
        }
        ElementRole::ActionButton | ElementRole::Generic | ElementRole::Marker => {
            a.rect(
                RectSpec::filled(Point::default(), extent, BUTTON_FILL)
                    .with_stroke(PackedRgba::WHITE),
            )?;
            a.text(text(center, BUTTON_TEXT, request.font_size))?;
            None
        }
    };
    Ok(a.finish(updater))
}

// ── Minimal ─────────────────────────────────────────────────────────────

fn build_minimal(
    engine: &mut dyn RenderEngine,
    request: &ElementRequest,
) -> Result<UiElement, ConstructionError> {
    let extent = request.extent;
    let mut radius = extent.width.min(extent.height) / 2.0;
    if request.role.is_interactive() {
        radius = radius.max(MIN_TAP_TARGET / 2.0);
    }
    let fill = match request.role {
        ElementRole::TargetPrompt => PackedRgba::WHITE,
        ElementRole::ActionButton => BUTTON_FILL,
        _ => INDICATOR_ON,
    };
    let mut a = Assembly::begin(engine, Strategy::Minimal, request)?;
    a.circle(CircleSpec {
        center: Point::new(extent.width / 2.0, extent.height / 2.0),
        radius,
        fill,
    })?;
    let updater = match request.role {
        ElementRole::Score | ElementRole::Timer => {
            Some(parity_fill(request.role, INDICATOR_ON, INDICATOR_OFF))
        }
        ElementRole::TargetPrompt => Some(target_fill()),
        _ => None,
    };
    Ok(a.finish(updater))
}

// ── Emergency ───────────────────────────────────────────────────────────

/// Emergency elements are at least this large on both axes.
pub const EMERGENCY_MIN_EXTENT: f32 = MIN_TAP_TARGET * 2.0;

fn emergency_extent(extent: Size) -> Size {
    Size::new(
        (extent.width * 1.5).max(EMERGENCY_MIN_EXTENT),
        (extent.height * 1.5).max(EMERGENCY_MIN_EXTENT),
    )
}

fn emergency_block(
    engine: &mut dyn RenderEngine,
    request: &ElementRequest,
    fill: PackedRgba,
    updater: Option<Updater>,
) -> Result<UiElement, ConstructionError> {
    let mut a = Assembly::begin(engine, Strategy::Emergency, request)?;
    a.rect(
        RectSpec::filled(Point::default(), emergency_extent(request.extent), fill)
            .with_stroke(PackedRgba::YELLOW),
    )?;
    Ok(a.finish(updater))
}

/// Emergency score: a block that alternates colour as the score changes.
pub fn emergency_score(
    engine: &mut dyn RenderEngine,
    request: &ElementRequest,
) -> Result<UiElement, ConstructionError> {
    let updater = parity_fill(ElementRole::Score, PackedRgba::BLACK, PackedRgba::YELLOW);
    emergency_block(engine, request, PackedRgba::BLACK, Some(updater))
}

/// Emergency timer: a block that alternates colour every second.
pub fn emergency_timer(
    engine: &mut dyn RenderEngine,
    request: &ElementRequest,
) -> Result<UiElement, ConstructionError> {
    let updater = parity_fill(ElementRole::Timer, PackedRgba::BLACK, PackedRgba::YELLOW);
    emergency_block(engine, request, PackedRgba::BLACK, Some(updater))
}

/// Emergency target indicator: a block filled with the target colour.
pub fn emergency_target(
    engine: &mut dyn RenderEngine,
    request: &ElementRequest,
) -> Result<UiElement, ConstructionError> {
    emergency_block(engine, request, PackedRgba::WHITE, Some(target_fill()))
}

/// Emergency placeholder for any other role.
pub fn emergency_generic(
    engine: &mut dyn RenderEngine,
    request: &ElementRequest,
) -> Result<UiElement, ConstructionError> {
    emergency_block(engine, request, PackedRgba::BLACK, None)
}

/// Role-specific emergency constructor.
#[must_use]
pub fn emergency_for(role: ElementRole) -> BuildFn {
    match role {
        ElementRole::Score => emergency_score,
        ElementRole::Timer => emergency_timer,
        ElementRole::TargetPrompt => emergency_target,
        _ => emergency_generic,
    }
}

fn build_emergency(
    engine: &mut dyn RenderEngine,
    request: &ElementRequest,
) -> Result<UiElement, ConstructionError> {
    emergency_for(request.role)(engine, request)
}

/// The absolute floor: one oversized flashing block centered in the
/// viewport.
pub fn emergency_marker(
    engine: &mut dyn RenderEngine,
    viewport: Size,
) -> Result<UiElement, ConstructionError> {
    let side = (viewport.width.min(viewport.height) * 0.5).max(EMERGENCY_MIN_EXTENT);
    let position = Point::new(
        ((viewport.width - side) / 2.0).max(0.0),
        ((viewport.height - side) / 2.0).max(0.0),
    );
    let request =
        ElementRequest::new(ElementRole::Marker, position).with_extent(Size::new(side, side));
    let mut a = Assembly::begin(engine, Strategy::Emergency, &request)?;
    let block = a.rect(
        RectSpec::filled(Point::default(), request.extent, PackedRgba::RED)
            .with_stroke(PackedRgba::YELLOW),
    )?;
    a.flash(block)?;
    Ok(a.finish(None))
}

/// Stock updater for a text role. Expects the part layout the graphics
/// tier uses: label last, and for the prompt a band first.
#[must_use]
pub fn text_updater(role: ElementRole) -> Option<Updater> {
    match role {
        ElementRole::Score => Some(score_text()),
        ElementRole::Timer => Some(timer_text()),
        ElementRole::TargetPrompt => Some(prompt_band()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hudguard_core::event::TargetColor;
    use hudguard_render::PrimitiveKind;
    use hudguard_render::headless::{FaultMask, HeadlessEngine};
    use std::time::Duration;

    fn req(role: ElementRole) -> ElementRequest {
        ElementRequest::new(role, Point::new(100.0, 100.0))
    }

    fn kinds(engine: &HeadlessEngine, element: &UiElement) -> Vec<PrimitiveKind> {
        element
            .parts()
            .iter()
            .filter_map(|&id| engine.node(id).map(|n| n.kind))
            .collect()
    }

    #[test]
    fn table_is_in_tier_order() {
        for (i, entry) in STRATEGIES.iter().enumerate() {
            assert_eq!(entry.strategy, Strategy::ALL[i]);
            assert_eq!(Strategy::ALL[i].entry().strategy, entry.strategy);
        }
        assert_eq!(Strategy::from_name("minimal"), Some(Strategy::Minimal));
        assert_eq!(Strategy::from_name("fancy"), None);
        assert_eq!(Strategy::Emergency.next(), None);
    }

    #[test]
    fn rich_needs_fonts() {
        let mut engine = HeadlessEngine::new().without_fonts();
        let err = Strategy::Rich.build(&mut engine, &req(ElementRole::Score)).unwrap_err();
        assert_eq!(err, ConstructionError::ResourceUnavailable("fonts"));
        assert_eq!(engine.live_count(), 0);
    }

    #[test]
    fn each_tier_uses_its_own_primitives() {
        let mut engine = HeadlessEngine::new();
        let rich = Strategy::Rich.build(&mut engine, &req(ElementRole::Score)).unwrap();
        let graphics = Strategy::Graphics.build(&mut engine, &req(ElementRole::Score)).unwrap();
        let minimal = Strategy::Minimal.build(&mut engine, &req(ElementRole::Score)).unwrap();
        let emergency = Strategy::Emergency.build(&mut engine, &req(ElementRole::Score)).unwrap();
        assert_eq!(kinds(&engine, &rich), [PrimitiveKind::RichText]);
        assert_eq!(kinds(&engine, &graphics), [PrimitiveKind::Text]);
        assert_eq!(kinds(&engine, &minimal), [PrimitiveKind::Circle]);
        assert_eq!(kinds(&engine, &emergency), [PrimitiveKind::Rect]);
        assert_eq!(emergency.strategy(), Strategy::Emergency);
    }

    #[test]
    fn emergency_survives_text_and_circle_faults() {
        let mut engine = HeadlessEngine::new()
            .with_faults(FaultMask::TEXT | FaultMask::RICH_TEXT | FaultMask::CIRCLE);
        for tier in [Strategy::Rich, Strategy::Graphics, Strategy::Minimal] {
            assert!(tier.build(&mut engine, &req(ElementRole::Score)).is_err(), "{tier}");
        }
        assert_eq!(engine.live_count(), 0);
        let e = Strategy::Emergency.build(&mut engine, &req(ElementRole::Score)).unwrap();
        assert!(e.is_visible(&engine));
    }

    #[test]
    fn score_updater_sets_text() {
        let mut engine = HeadlessEngine::new();
        let mut e = Strategy::Graphics.build(&mut engine, &req(ElementRole::Score)).unwrap();
        e.update(&mut engine, &DomainUpdate::ScoreChanged(42)).unwrap();
        e.update(&mut engine, &DomainUpdate::TimeElapsed(Duration::from_secs(1))).unwrap();
        assert_eq!(engine.texts(), ["42"]);
    }

    #[test]
    fn emergency_target_takes_target_colour() {
        let mut engine = HeadlessEngine::new();
        let build = emergency_for(ElementRole::TargetPrompt);
        let mut e = build(&mut engine, &req(ElementRole::TargetPrompt)).unwrap();
        e.update(&mut engine, &DomainUpdate::TargetChanged(TargetColor::new("red", 0xff0000)))
            .unwrap();
        let block = engine.node(e.parts()[0]).unwrap();
        assert_eq!(block.fill, PackedRgba::from_rgb24(0xff0000));
        assert!(block.size.width >= EMERGENCY_MIN_EXTENT);
    }

    #[test]
    fn minimal_interactive_indicator_meets_tap_minimum() {
        let mut engine = HeadlessEngine::new();
        let small = req(ElementRole::ActionButton).with_extent(Size::new(10.0, 10.0));
        let e = Strategy::Minimal.build(&mut engine, &small).unwrap();
        let circle = engine.node(e.parts()[0]).unwrap();
        assert!(circle.size.width >= MIN_TAP_TARGET);
    }

    #[test]
    fn marker_flashes_and_is_interactive() {
        let mut engine = HeadlessEngine::new();
        let m = emergency_marker(&mut engine, Size::new(800.0, 600.0)).unwrap();
        assert!(m.is_interactive());
        assert_eq!(engine.flashing_nodes(), [m.parts()[0]]);
        assert_eq!(m.position(), Point::new(250.0, 150.0));
    }
}
