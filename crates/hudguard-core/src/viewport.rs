#![forbid(unsafe_code)]

//! Viewport dimension sanitization.
//!
//! The host windowing system may deliver any `f64` pair on resize: NaN,
//! infinities, negatives, zero, or values far outside anything renderable.
//! [`sanitize`] turns such a pair into a [`ViewportDimensions`] that every
//! downstream component can trust, together with the list of corrections it
//! had to make.
//!
//! # Rules (applied in order)
//!
//! 1. Any non-finite axis replaces **both** axes with the fallback
//!    `800 x 600`.
//! 2. Negative values take their absolute value.
//! 3. Each axis is clamped to `[MIN_DIMENSION, MAX_DIMENSION]`.
//! 4. An aspect ratio outside `[MIN_ASPECT_RATIO, MAX_ASPECT_RATIO]` is
//!    flagged as extreme. The dimensions are left alone; callers decide.
//!
//! Sanitization never fails.

use std::fmt;

use crate::geometry::Size;

/// Smallest accepted viewport extent on either axis.
pub const MIN_DIMENSION: f32 = 200.0;
/// Largest accepted viewport extent on either axis.
pub const MAX_DIMENSION: f32 = 8192.0;
/// Width used when the host reports a non-finite size.
pub const FALLBACK_WIDTH: f32 = 800.0;
/// Height used when the host reports a non-finite size.
pub const FALLBACK_HEIGHT: f32 = 600.0;
/// Narrowest aspect ratio (width / height) considered normal.
pub const MIN_ASPECT_RATIO: f32 = 0.1;
/// Widest aspect ratio (width / height) considered normal.
pub const MAX_ASPECT_RATIO: f32 = 10.0;
/// Lowest accepted pixel density.
pub const MIN_PIXEL_DENSITY: f32 = 0.5;
/// Highest accepted pixel density.
pub const MAX_PIXEL_DENSITY: f32 = 4.0;
/// Density used when the host reports nothing usable.
pub const DEFAULT_PIXEL_DENSITY: f32 = 1.0;

/// One of the two viewport axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal extent.
    Width,
    /// Vertical extent.
    Height,
}

impl Axis {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::Height => "height",
        }
    }
}

/// Viewport orientation derived from the sanitized extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Taller than wide.
    Portrait,
    /// At least as wide as tall.
    #[default]
    Landscape,
}

impl Orientation {
    /// Portrait when `width < height`, otherwise landscape.
    #[must_use]
    pub fn from_extents(width: f32, height: f32) -> Self {
        if width < height {
            Self::Portrait
        } else {
            Self::Landscape
        }
    }
}

/// Sanitized viewport. Recomputed on every resize, never stored long-term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportDimensions {
    /// Width in viewport units, inside `[MIN_DIMENSION, MAX_DIMENSION]`.
    pub width: f32,
    /// Height in viewport units, inside `[MIN_DIMENSION, MAX_DIMENSION]`.
    pub height: f32,
    /// Device pixel ratio, inside `[MIN_PIXEL_DENSITY, MAX_PIXEL_DENSITY]`.
    pub pixel_density: f32,
    /// Orientation derived from width and height.
    pub orientation: Orientation,
}

impl ViewportDimensions {
    /// The `800 x 600` fallback viewport.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            width: FALLBACK_WIDTH,
            height: FALLBACK_HEIGHT,
            pixel_density: DEFAULT_PIXEL_DENSITY,
            orientation: Orientation::Landscape,
        }
    }

    /// Extents as a [`Size`].
    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Width divided by height.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }

    /// Portrait orientation.
    #[inline]
    pub fn is_portrait(&self) -> bool {
        self.orientation == Orientation::Portrait
    }
}

impl Default for ViewportDimensions {
    fn default() -> Self {
        Self::fallback()
    }
}

/// A correction applied while sanitizing raw input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// The axis was NaN or infinite; both axes fell back to `800 x 600`.
    NonFinite {
        /// Offending axis.
        axis: Axis,
    },
    /// The axis was negative.
    Negative {
        /// Offending axis.
        axis: Axis,
        /// Raw value reported by the host.
        raw: f64,
    },
    /// The axis was outside `[MIN_DIMENSION, MAX_DIMENSION]`.
    Clamped {
        /// Offending axis.
        axis: Axis,
        /// Value before clamping.
        from: f64,
        /// Value after clamping.
        to: f32,
    },
    /// The pixel density was unusable or out of range.
    PixelDensity {
        /// Raw density reported by the host.
        from: f64,
        /// Density after correction.
        to: f32,
    },
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { axis } => write!(
                f,
                "{} is not finite; using fallback {FALLBACK_WIDTH}x{FALLBACK_HEIGHT}",
                axis.as_str()
            ),
            Self::Negative { axis, raw } => {
                write!(f, "{} is negative ({raw}); using absolute value", axis.as_str())
            }
            Self::Clamped { axis, from, to } => {
                write!(f, "{} {from} outside accepted range; clamped to {to}", axis.as_str())
            }
            Self::PixelDensity { from, to } => {
                write!(f, "pixel density {from} unusable; using {to}")
            }
        }
    }
}

/// Result of [`sanitize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    /// Dimensions safe for layout.
    pub dimensions: ViewportDimensions,
    /// Corrections applied, in rule order. Empty for valid input.
    pub corrections: Vec<Correction>,
    /// Aspect ratio fell outside `[MIN_ASPECT_RATIO, MAX_ASPECT_RATIO]`.
    pub extreme_aspect: bool,
}

impl Sanitized {
    /// Input needed no correction.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty()
    }
}

/// Sanitize a raw `(width, height)` pair at the default pixel density.
#[must_use]
pub fn sanitize(width: f64, height: f64) -> Sanitized {
    sanitize_with_density(width, height, f64::from(DEFAULT_PIXEL_DENSITY))
}

/// Sanitize a raw `(width, height, pixel_density)` triple.
#[must_use]
pub fn sanitize_with_density(width: f64, height: f64, pixel_density: f64) -> Sanitized {
    let mut corrections = Vec::new();

    // Reasons come from the raw input, per axis, before any replacement.
    let axes = [(Axis::Width, width), (Axis::Height, height)];
    for (axis, raw) in axes {
        if !raw.is_finite() {
            corrections.push(Correction::NonFinite { axis });
        } else if raw < 0.0 {
            corrections.push(Correction::Negative { axis, raw });
        }
    }

    let (w, h) = if width.is_finite() && height.is_finite() {
        (width.abs(), height.abs())
    } else {
        (f64::from(FALLBACK_WIDTH), f64::from(FALLBACK_HEIGHT))
    };

    let w = clamp_axis(Axis::Width, w, &mut corrections);
    let h = clamp_axis(Axis::Height, h, &mut corrections);

    let density = sanitize_density(pixel_density, &mut corrections);

    let ratio = w / h;
    let extreme_aspect = !(MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&ratio);

    if !corrections.is_empty() {
        crate::debug!(
            raw_width = width,
            raw_height = height,
            width = w,
            height = h,
            corrections = corrections.len(),
            "viewport sanitized"
        );
    }
    if extreme_aspect {
        crate::debug!(width = w, height = h, ratio, "extreme viewport aspect ratio");
    }

    Sanitized {
        dimensions: ViewportDimensions {
            width: w,
            height: h,
            pixel_density: density,
            orientation: Orientation::from_extents(w, h),
        },
        corrections,
        extreme_aspect,
    }
}

fn clamp_axis(axis: Axis, value: f64, corrections: &mut Vec<Correction>) -> f32 {
    let min = f64::from(MIN_DIMENSION);
    let max = f64::from(MAX_DIMENSION);
    if value < min || value > max {
        let to = value.clamp(min, max) as f32;
        corrections.push(Correction::Clamped {
            axis,
            from: value,
            to,
        });
        to
    } else {
        value as f32
    }
}

fn sanitize_density(raw: f64, corrections: &mut Vec<Correction>) -> f32 {
    let min = f64::from(MIN_PIXEL_DENSITY);
    let max = f64::from(MAX_PIXEL_DENSITY);
    let to = if !raw.is_finite() || raw <= 0.0 {
        DEFAULT_PIXEL_DENSITY
    } else if raw < min || raw > max {
        raw.clamp(min, max) as f32
    } else {
        return raw as f32;
    };
    corrections.push(Correction::PixelDensity { from: raw, to });
    to
}
