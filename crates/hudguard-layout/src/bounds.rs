#![forbid(unsafe_code)]

//! Post-placement bounds validation.
//!
//! An anchor is in bounds when it lies inside `[0, width] x [0, height]`,
//! edges inclusive. A failed report means the caller should reapply a
//! freshly computed layout rather than nudge individual elements.

use hudguard_core::geometry::{Point, Size};

/// Outcome of [`validate_anchors`].
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsReport<K> {
    /// Number of anchors checked.
    pub checked: usize,
    /// Anchors found outside the viewport, in input order.
    pub violations: Vec<(K, Point)>,
}

impl<K> BoundsReport<K> {
    /// No anchor lies outside the viewport.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

impl<K> Default for BoundsReport<K> {
    fn default() -> Self {
        Self {
            checked: 0,
            violations: Vec::new(),
        }
    }
}

/// Check each `(key, anchor)` pair against `viewport`.
///
/// Non-finite anchors are violations.
pub fn validate_anchors<K, I>(anchors: I, viewport: Size) -> BoundsReport<K>
where
    I: IntoIterator<Item = (K, Point)>,
{
    let mut report = BoundsReport::default();
    for (key, anchor) in anchors {
        report.checked += 1;
        if !anchor.is_within(viewport) {
            report.violations.push((key, anchor));
        }
    }
    report
}
