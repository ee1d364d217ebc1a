#![forbid(unsafe_code)]

//! Whole-HUD assembly and validation.
//!
//! A HUD is built with exactly one [`Strategy`]. If any element fails, or the
//! finished set fails [`validate_hud`], every node built so far is torn down
//! before the caller tries another tier, so a HUD never mixes tiers.

use std::collections::BTreeMap;

use hudguard_core::event::DomainUpdate;
use hudguard_layout::{BoundsReport, LayoutConfig, validate_anchors};
use hudguard_render::{RenderEngine, RenderError};

use crate::element::{ElementRequest, ElementRole, UiElement};
use crate::error::{ConstructionError, HudError, ValidationFailure};
use crate::error_boundary::guard_construction;
use crate::strategy::Strategy;

/// Roles every HUD must contain.
pub const REQUIRED_ROLES: [ElementRole; 4] = [
    ElementRole::Header,
    ElementRole::Score,
    ElementRole::Timer,
    ElementRole::TargetPrompt,
];

/// Whole-HUD constructor: fills the map with one tier's elements for one
/// layout. Whatever it inserted is torn down by [`assemble_hud`] if it fails.
pub type HudBuilder = Box<
    dyn FnMut(
        &mut dyn RenderEngine,
        Strategy,
        &LayoutConfig,
        &mut ElementMap,
    ) -> Result<(), ConstructionError>,
>;

/// Elements of one HUD, keyed by role.
#[derive(Debug)]
pub struct ElementMap {
    strategy: Strategy,
    elements: BTreeMap<ElementRole, UiElement>,
}

impl ElementMap {
    /// Empty map for a tier.
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            elements: BTreeMap::new(),
        }
    }

    /// Tier the HUD was built with.
    #[inline]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Insert an element, returning any element it replaced.
    pub fn insert(&mut self, element: UiElement) -> Option<UiElement> {
        self.elements.insert(element.role(), element)
    }

    /// Element for a role.
    pub fn get(&self, role: ElementRole) -> Option<&UiElement> {
        self.elements.get(&role)
    }

    /// Mutable element for a role.
    pub fn get_mut(&mut self, role: ElementRole) -> Option<&mut UiElement> {
        self.elements.get_mut(&role)
    }

    /// Present roles.
    pub fn roles(&self) -> impl Iterator<Item = ElementRole> + '_ {
        self.elements.keys().copied()
    }

    /// Elements in role order.
    pub fn iter(&self) -> impl Iterator<Item = &UiElement> {
        self.elements.values()
    }

    /// Mutable elements in role order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut UiElement> {
        self.elements.values_mut()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// No elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Required roles with no element.
    pub fn missing_required(&self) -> Vec<ElementRole> {
        REQUIRED_ROLES
            .into_iter()
            .filter(|role| !self.elements.contains_key(role))
            .collect()
    }

    /// Anchor check of every element against the layout viewport.
    pub fn check_bounds(&self, layout: &LayoutConfig) -> BoundsReport<ElementRole> {
        validate_anchors(self.iter().map(|e| (e.role(), e.position())), layout.size())
    }

    /// Any interactive element is still shown.
    pub fn has_visible_interactive(&self, engine: &dyn RenderEngine) -> bool {
        self.iter()
            .any(|e| e.is_interactive() && e.is_visible(engine))
    }

    /// Forward a domain update to every element. Returns the failures.
    pub fn dispatch(
        &mut self,
        engine: &mut dyn RenderEngine,
        update: &DomainUpdate,
    ) -> Vec<(ElementRole, RenderError)> {
        let mut failures = Vec::new();
        for element in self.elements.values_mut() {
            if let Err(err) = element.update(engine, update) {
                failures.push((element.role(), err));
            }
        }
        failures
    }

    /// Stop animations and destroy every element.
    pub fn teardown(self, engine: &mut dyn RenderEngine) {
        for element in self.elements.into_values() {
            element.teardown(engine);
        }
    }
}

/// Insert every role the tier covers, using the stock constructors.
///
/// Stops at the first failure; elements already inserted stay in `map`.
pub fn populate_hud(
    engine: &mut dyn RenderEngine,
    strategy: Strategy,
    layout: &LayoutConfig,
    map: &mut ElementMap,
) -> Result<(), ConstructionError> {
    for &role in strategy.hud_roles() {
        let request = ElementRequest::for_role(role, layout);
        let element = guard_construction(role.as_str(), || strategy.build(engine, &request))?;
        if let Some(replaced) = map.insert(element) {
            replaced.teardown(engine);
        }
    }
    Ok(())
}

/// Build every role the tier covers, using the stock constructors.
///
/// On failure every element built so far is torn down.
pub fn build_hud(
    engine: &mut dyn RenderEngine,
    strategy: Strategy,
    layout: &LayoutConfig,
) -> Result<ElementMap, ConstructionError> {
    let mut map = ElementMap::new(strategy);
    match populate_hud(engine, strategy, layout, &mut map) {
        Ok(()) => Ok(map),
        Err(err) => {
            map.teardown(engine);
            Err(err)
        }
    }
}

/// Check a constructed HUD: required roles present, anchors in bounds.
pub fn validate_hud(map: &ElementMap, layout: &LayoutConfig) -> Result<(), ValidationFailure> {
    let missing = map.missing_required();
    if !missing.is_empty() {
        return Err(ValidationFailure::MissingRegions(missing));
    }
    let report = map.check_bounds(layout);
    if !report.is_valid() {
        return Err(ValidationFailure::OutOfBounds(report.violations));
    }
    Ok(())
}

/// Build with `builder` into a fresh map and validate it.
///
/// The map is torn down if the builder errors, panics, or the result fails
/// validation.
pub fn assemble_hud(
    engine: &mut dyn RenderEngine,
    builder: &mut HudBuilder,
    strategy: Strategy,
    layout: &LayoutConfig,
) -> Result<ElementMap, HudError> {
    let mut map = ElementMap::new(strategy);
    let built = guard_construction(strategy.as_str(), || {
        builder(&mut *engine, strategy, layout, &mut map)
    });
    let checked = match built {
        Ok(()) => validate_hud(&map, layout).map_err(HudError::from),
        Err(err) => Err(HudError::from(err)),
    };
    match checked {
        Ok(()) => Ok(map),
        Err(err) => {
            map.teardown(engine);
            Err(err)
        }
    }
}

/// The stock whole-HUD constructor, boxed.
#[must_use]
pub fn default_hud_builder() -> HudBuilder {
    Box::new(populate_hud)
}
