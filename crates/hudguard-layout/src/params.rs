#![forbid(unsafe_code)]

//! Per-class sizing tables.
//!
//! Each [`DeviceClass`] owns one [`ClassParams`]. Percentages are percent
//! values (`9.0` = 9%) of the axis named by the field or by [`FontBasis`].
//! [`DeviceClass::LargeDesktop`] shares the desktop table; its extra growth
//! comes from [`Breakpoints::large_scale`](crate::Breakpoints::large_scale).

use crate::DeviceClass;

/// Axis a font percentage is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontBasis {
    /// Viewport width.
    Width,
    /// Viewport height.
    Height,
    /// The smaller of width and height.
    MinExtent,
}

impl FontBasis {
    /// Resolve the basis length for a viewport.
    #[inline]
    #[must_use]
    pub fn resolve(self, width: f32, height: f32) -> f32 {
        match self {
            FontBasis::Width => width,
            FontBasis::Height => height,
            FontBasis::MinExtent => width.min(height),
        }
    }
}

/// A `pct * basis` value clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaled {
    /// Percent of the basis length.
    pub pct: f32,
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
}

impl Scaled {
    /// Evaluate against a basis length.
    #[inline]
    #[must_use]
    pub fn of(self, basis: f32) -> f32 {
        (basis * self.pct / 100.0).clamp(self.min, self.max)
    }
}

/// Sizing parameters for one device class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassParams {
    /// Axis fonts are measured against.
    pub font_basis: FontBasis,
    /// Title font.
    pub title_font: Scaled,
    /// Score/timer font.
    pub body_font: Scaled,
    /// Caption font as a fraction of the body font.
    pub caption_ratio: f32,
    /// Header band height, as a percent of viewport height.
    pub header_height: Scaled,
    /// Fixed minimum margin.
    pub margin_min: f32,
    /// Margin as a percent of viewport width; the larger of the two wins.
    pub margin_pct: f32,
    /// Action button width as a percent of viewport width.
    pub button_width_pct: f32,
    /// Cap on action button width.
    pub button_width_max: f32,
    /// Action button height before the accessibility floor.
    pub button_height: f32,
    /// Target prompt band height as a multiple of the body font.
    pub prompt_height_factor: f32,
    /// Vertical center of the target prompt band, as a percent of height.
    pub prompt_center_pct: f32,
    /// Diameter of one status-charge indicator.
    pub charge_size: f32,
    /// Gap between status-charge indicators.
    pub charge_spacing: f32,
}

const DESKTOP: ClassParams = ClassParams {
    font_basis: FontBasis::Width,
    title_font: Scaled {
        pct: 9.0,
        min: 48.0,
        max: 96.0,
    },
    body_font: Scaled {
        pct: 3.0,
        min: 18.0,
        max: 36.0,
    },
    caption_ratio: 0.6,
    header_height: Scaled {
        pct: 10.0,
        min: 60.0,
        max: 120.0,
    },
    margin_min: 20.0,
    margin_pct: 2.5,
    button_width_pct: 30.0,
    button_width_max: 320.0,
    button_height: 56.0,
    prompt_height_factor: 2.5,
    prompt_center_pct: 45.0,
    charge_size: 28.0,
    charge_spacing: 12.0,
};

const MOBILE_PORTRAIT: ClassParams = ClassParams {
    font_basis: FontBasis::Width,
    title_font: Scaled {
        pct: 11.0,
        min: 28.0,
        max: 56.0,
    },
    body_font: Scaled {
        pct: 4.5,
        min: 14.0,
        max: 28.0,
    },
    caption_ratio: 0.7,
    header_height: Scaled {
        pct: 8.0,
        min: 48.0,
        max: 96.0,
    },
    margin_min: 12.0,
    margin_pct: 4.0,
    button_width_pct: 80.0,
    button_width_max: 360.0,
    button_height: 48.0,
    prompt_height_factor: 3.0,
    prompt_center_pct: 50.0,
    charge_size: 22.0,
    charge_spacing: 8.0,
};

const MOBILE_LANDSCAPE: ClassParams = ClassParams {
    font_basis: FontBasis::Height,
    title_font: Scaled {
        pct: 10.0,
        min: 24.0,
        max: 48.0,
    },
    body_font: Scaled {
        pct: 5.0,
        min: 12.0,
        max: 24.0,
    },
    caption_ratio: 0.75,
    header_height: Scaled {
        pct: 12.0,
        min: 40.0,
        max: 72.0,
    },
    margin_min: 10.0,
    margin_pct: 2.0,
    button_width_pct: 35.0,
    button_width_max: 280.0,
    button_height: 44.0,
    prompt_height_factor: 2.5,
    prompt_center_pct: 50.0,
    charge_size: 18.0,
    charge_spacing: 6.0,
};

const CONSERVATIVE: ClassParams = ClassParams {
    font_basis: FontBasis::MinExtent,
    title_font: Scaled {
        pct: 10.0,
        min: 16.0,
        max: 48.0,
    },
    body_font: Scaled {
        pct: 6.0,
        min: 12.0,
        max: 24.0,
    },
    caption_ratio: 0.8,
    header_height: Scaled {
        pct: 10.0,
        min: 40.0,
        max: 60.0,
    },
    margin_min: 8.0,
    margin_pct: 0.0,
    button_width_pct: 25.0,
    button_width_max: 200.0,
    button_height: 44.0,
    prompt_height_factor: 2.0,
    prompt_center_pct: 50.0,
    charge_size: 16.0,
    charge_spacing: 4.0,
};

impl ClassParams {
    /// The table for a device class.
    #[must_use]
    pub const fn for_class(class: DeviceClass) -> &'static ClassParams {
        match class {
            DeviceClass::MobilePortrait => &MOBILE_PORTRAIT,
            DeviceClass::MobileLandscape => &MOBILE_LANDSCAPE,
            DeviceClass::Desktop | DeviceClass::LargeDesktop => &DESKTOP,
            DeviceClass::Conservative => &CONSERVATIVE,
        }
    }

    /// Margin for a viewport width.
    #[inline]
    #[must_use]
    pub fn margin(&self, width: f32) -> f32 {
        self.margin_min.max(width * self.margin_pct / 100.0)
    }

    /// Action button width for a viewport width, before the tap floor.
    #[inline]
    #[must_use]
    pub fn button_width(&self, width: f32) -> f32 {
        (width * self.button_width_pct / 100.0).min(self.button_width_max)
    }
}
