#![forbid(unsafe_code)]

//! Applying a layout snapshot to live elements.

use hudguard_layout::LayoutConfig;
use hudguard_render::{RenderEngine, RenderError};

use crate::element::{ElementRole, UiElement};

/// Outcome of [`update_element_positions`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlacementReport {
    /// Elements moved to their new anchor.
    pub moved: usize,
    /// Elements with no layout region, left where they were.
    pub skipped: usize,
    /// Elements the engine refused to move.
    pub failures: Vec<(ElementRole, RenderError)>,
}

impl PlacementReport {
    /// Every positionable element was moved.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: PlacementReport) {
        self.moved += other.moved;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }
}

/// Move every element to the anchor `layout` gives its role.
///
/// Never aborts the batch: an element the engine refuses to move is logged
/// and reported, and the remaining elements are still placed.
pub fn update_element_positions<'a>(
    engine: &mut dyn RenderEngine,
    elements: impl IntoIterator<Item = &'a mut UiElement>,
    layout: &LayoutConfig,
) -> PlacementReport {
    let mut report = PlacementReport::default();
    for element in elements {
        let role = element.role();
        let Some(region) = role.region() else {
            report.skipped += 1;
            continue;
        };
        let target = layout.anchor(region);
        match element.set_position(engine, target) {
            Ok(()) => report.moved += 1,
            Err(err) => {
                tracing::warn!(
                    role = role.as_str(),
                    x = target.x,
                    y = target.y,
                    error = %err,
                    "element positioning failed"
                );
                report.failures.push((role, err));
            }
        }
    }
    report
}
