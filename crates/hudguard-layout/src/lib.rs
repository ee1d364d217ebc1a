#![forbid(unsafe_code)]

//! Responsive HUD layout.
//!
//! This crate turns a sanitized viewport into a [`LayoutConfig`]: absolute
//! positions and sizes for every HUD region plus font-size hints.
//!
//! - [`calculate_layout`] - raw `(width, height)` in, layout out. Never fails.
//! - [`DeviceClass`] / [`Breakpoints`] - width/orientation classification.
//! - [`params`] - per-class sizing tables.
//! - [`bounds`] - post-placement anchor validation.
//!
//! # Example
//!
//! ```
//! use hudguard_layout::{DeviceClass, calculate_layout};
//!
//! let layout = calculate_layout(800.0, 600.0);
//! assert_eq!(layout.device_class, DeviceClass::Desktop);
//! assert_eq!(layout.header.height, 60.0);
//! assert_eq!(layout.fonts.title, 72.0);
//! ```
//!
//! # Invariants
//!
//! - Same input, same output (no hidden state).
//! - Every coordinate lies in `[0, viewport extent]`.
//! - Interactive regions are at least [`MIN_TAP_TARGET`] on both axes.
//! - Font sizes lie in `[MIN_FONT_SIZE, MAX_FONT_SIZE]`.
//!
//! Violations found during the final pass are clamped and recorded in
//! [`LayoutConfig::corrections`]; they are never returned as errors.

pub mod bounds;
pub mod config;
pub mod params;

pub use bounds::{BoundsReport, validate_anchors};
pub use config::{
    CHARGE_COUNT, ChargeRow, FontRole, FontScale, LayoutConfig, LayoutCorrection, Region,
    TextAlign, TextAnchor,
};
use hudguard_core::viewport::{self, Sanitized, ViewportDimensions};

/// Minimum extent of an interactive region on either axis.
pub const MIN_TAP_TARGET: f32 = 44.0;
/// Smallest font size a layout may emit.
pub const MIN_FONT_SIZE: f32 = 12.0;
/// Largest font size a layout may emit.
pub const MAX_FONT_SIZE: f32 = 200.0;
/// Upper bound on the oversized-desktop scale factor.
pub const MAX_LARGE_SCALE: f32 = 2.0;

/// Device class chosen from the sanitized viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// Narrow and taller than wide.
    MobilePortrait,
    /// Narrow and at least as wide as tall.
    MobileLandscape,
    /// Regular desktop width.
    Desktop,
    /// Wider than [`Breakpoints::large_desktop`]; sizes scale up, bounded.
    LargeDesktop,
    /// Extreme aspect ratio; fixed, modest sizing.
    Conservative,
}

impl DeviceClass {
    /// All classes.
    pub const ALL: [DeviceClass; 5] = [
        DeviceClass::MobilePortrait,
        DeviceClass::MobileLandscape,
        DeviceClass::Desktop,
        DeviceClass::LargeDesktop,
        DeviceClass::Conservative,
    ];

    /// Short label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            DeviceClass::MobilePortrait => "mobile_portrait",
            DeviceClass::MobileLandscape => "mobile_landscape",
            DeviceClass::Desktop => "desktop",
            DeviceClass::LargeDesktop => "large_desktop",
            DeviceClass::Conservative => "conservative",
        }
    }

    /// Mobile portrait or landscape.
    #[must_use]
    pub const fn is_mobile(self) -> bool {
        matches!(self, DeviceClass::MobilePortrait | DeviceClass::MobileLandscape)
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Width thresholds for device classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoints {
    /// Widths strictly below this are mobile.
    pub mobile: f32,
    /// Widths strictly above this are large desktop.
    pub large_desktop: f32,
}

impl Breakpoints {
    /// Default breakpoints: mobile below 768, large desktop above 1920.
    pub const DEFAULT: Self = Self {
        mobile: 768.0,
        large_desktop: 1920.0,
    };

    /// Classify sanitized dimensions.
    #[must_use]
    pub fn classify(self, dims: &ViewportDimensions) -> DeviceClass {
        if dims.width < self.mobile {
            if dims.is_portrait() {
                DeviceClass::MobilePortrait
            } else {
                DeviceClass::MobileLandscape
            }
        } else if dims.width > self.large_desktop {
            DeviceClass::LargeDesktop
        } else {
            DeviceClass::Desktop
        }
    }

    /// Scale factor for oversized desktops, in `[1.0, MAX_LARGE_SCALE]`.
    #[must_use]
    pub fn large_scale(self, width: f32) -> f32 {
        if width > self.large_desktop {
            (width / self.large_desktop).min(MAX_LARGE_SCALE)
        } else {
            1.0
        }
    }
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Compute a layout for a raw host signal.
///
/// The signal is sanitized first; extreme aspect ratios get the
/// [`DeviceClass::Conservative`] table.
#[must_use]
pub fn calculate_layout(width: f64, height: f64) -> LayoutConfig {
    calculate_layout_for(&viewport::sanitize(width, height))
}

/// Compute a layout for already-sanitized input with default breakpoints.
#[must_use]
pub fn calculate_layout_for(sanitized: &Sanitized) -> LayoutConfig {
    LayoutConfig::compute(sanitized, Breakpoints::DEFAULT)
}
