#![forbid(unsafe_code)]

//! The [`LayoutConfig`] snapshot and the pass that builds it.

use std::fmt;

use hudguard_core::geometry::{Point, Rect, Size};
use hudguard_core::viewport::{Axis, Correction, Sanitized, ViewportDimensions};

use crate::bounds::{BoundsReport, validate_anchors};
use crate::params::ClassParams;
use crate::{Breakpoints, DeviceClass, MAX_FONT_SIZE, MIN_FONT_SIZE, MIN_TAP_TARGET};

/// Number of status-charge indicators in the charge row.
pub const CHARGE_COUNT: u8 = 3;

/// A named HUD region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    /// Full-width band across the top.
    Header,
    /// Title text, centered in the header.
    Title,
    /// Score readout, top left below the header.
    Score,
    /// Timer readout, top right below the header.
    Timer,
    /// Row of status-charge indicators under the score.
    ChargeRow,
    /// Band naming the current target colour.
    TargetPrompt,
    /// Primary tap target.
    ActionButton,
}

impl Region {
    /// All regions in placement order.
    pub const ALL: [Region; 7] = [
        Region::Header,
        Region::Title,
        Region::Score,
        Region::Timer,
        Region::ChargeRow,
        Region::TargetPrompt,
        Region::ActionButton,
    ];

    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Region::Header => "header",
            Region::Title => "title",
            Region::Score => "score",
            Region::Timer => "timer",
            Region::ChargeRow => "charge_row",
            Region::TargetPrompt => "target_prompt",
            Region::ActionButton => "action_button",
        }
    }

    /// The player can tap this region.
    #[must_use]
    pub const fn is_interactive(self) -> bool {
        matches!(self, Region::TargetPrompt | Region::ActionButton)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizontal alignment of text relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlign {
    /// Anchor is the left edge.
    #[default]
    Start,
    /// Anchor is the horizontal center.
    Center,
    /// Anchor is the right edge.
    End,
}

/// Where a text readout sits and how large it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextAnchor {
    /// Absolute anchor position.
    pub position: Point,
    /// Font size in viewport units.
    pub font_size: f32,
    /// Alignment relative to `position`.
    pub align: TextAlign,
}

/// Font role used for lookups in [`FontScale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    /// Title text.
    Title,
    /// Score, timer, and prompt text.
    Body,
    /// Small labels.
    Caption,
}

impl FontRole {
    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FontRole::Title => "title",
            FontRole::Body => "body",
            FontRole::Caption => "caption",
        }
    }
}

/// Font-size hints for the current viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontScale {
    /// Title size.
    pub title: f32,
    /// Body size.
    pub body: f32,
    /// Caption size.
    pub caption: f32,
}

impl FontScale {
    /// Size for a role.
    #[must_use]
    pub fn get(&self, role: FontRole) -> f32 {
        match role {
            FontRole::Title => self.title,
            FontRole::Body => self.body,
            FontRole::Caption => self.caption,
        }
    }

    fn get_mut(&mut self, role: FontRole) -> &mut f32 {
        match role {
            FontRole::Title => &mut self.title,
            FontRole::Body => &mut self.body,
            FontRole::Caption => &mut self.caption,
        }
    }
}

/// Row of status-charge indicators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeRow {
    /// Bounding box of the whole row.
    pub bounds: Rect,
    /// Diameter of one indicator.
    pub indicator_size: f32,
    /// Gap between indicators.
    pub spacing: f32,
    /// Number of indicators.
    pub count: u8,
}

impl ChargeRow {
    fn new(origin: Point, indicator_size: f32, spacing: f32, count: u8) -> Self {
        let n = f32::from(count);
        let width = n * indicator_size + (n - 1.0).max(0.0) * spacing;
        Self {
            bounds: Rect::new(origin.x, origin.y, width, indicator_size),
            indicator_size,
            spacing,
            count,
        }
    }

    /// Center of indicator `index`, relative to the row origin.
    #[must_use]
    pub fn indicator_offset(&self, index: u8) -> Point {
        let r = self.indicator_size / 2.0;
        Point::new(
            r + f32::from(index) * (self.indicator_size + self.spacing),
            r,
        )
    }
}

/// A violation found and clamped while computing a layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutCorrection {
    /// The sanitizer corrected the raw viewport.
    Viewport(Correction),
    /// An interactive region was raised to [`MIN_TAP_TARGET`].
    TapTargetRaised {
        /// Region raised.
        region: Region,
        /// Axis raised.
        axis: Axis,
        /// Extent before raising.
        from: f32,
    },
    /// A font size was outside `[MIN_FONT_SIZE, MAX_FONT_SIZE]`.
    FontClamped {
        /// Font role.
        role: FontRole,
        /// Size before clamping.
        from: f32,
        /// Size after clamping.
        to: f32,
    },
    /// The margin was outside the viewport.
    MarginClamped {
        /// Margin before clamping.
        from: f32,
        /// Margin after clamping.
        to: f32,
    },
    /// A region rectangle extended past the viewport.
    RegionClamped {
        /// Region moved or shrunk.
        region: Region,
        /// Rectangle before fitting.
        from: Rect,
        /// Rectangle after fitting.
        to: Rect,
    },
    /// A text anchor lay outside the viewport.
    AnchorClamped {
        /// Region moved.
        region: Region,
        /// Anchor before clamping.
        from: Point,
        /// Anchor after clamping.
        to: Point,
    },
}

impl fmt::Display for LayoutCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Viewport(c) => write!(f, "viewport: {c}"),
            Self::TapTargetRaised { region, axis, from } => write!(
                f,
                "{region} {} {from} below tap minimum; raised to {MIN_TAP_TARGET}",
                axis.as_str()
            ),
            Self::FontClamped { role, from, to } => {
                write!(f, "{} font {from} clamped to {to}", role.as_str())
            }
            Self::MarginClamped { from, to } => write!(f, "margin {from} clamped to {to}"),
            Self::RegionClamped { region, from, to } => write!(
                f,
                "{region} ({}, {}, {}x{}) fitted to ({}, {}, {}x{})",
                from.x, from.y, from.width, from.height, to.x, to.y, to.width, to.height
            ),
            Self::AnchorClamped { region, from, to } => write!(
                f,
                "{region} anchor ({}, {}) clamped to ({}, {})",
                from.x, from.y, to.x, to.y
            ),
        }
    }
}

/// Immutable layout snapshot for one viewport.
///
/// Recomputed wholesale on every accepted resize. All coordinates are
/// absolute viewport units.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Sanitized viewport this layout was computed for.
    pub viewport: ViewportDimensions,
    /// Class whose parameter table was used.
    pub device_class: DeviceClass,
    /// Outer margin.
    pub margin: f32,
    /// Font-size hints.
    pub fonts: FontScale,
    /// Header band.
    pub header: Rect,
    /// Title text.
    pub title: TextAnchor,
    /// Score readout.
    pub score: TextAnchor,
    /// Timer readout.
    pub timer: TextAnchor,
    /// Status-charge indicators.
    pub charge_row: ChargeRow,
    /// Target prompt band.
    pub target_prompt: Rect,
    /// Primary tap target.
    pub action_button: Rect,
    /// Corrections applied, sanitizer corrections first.
    pub corrections: Vec<LayoutCorrection>,
}

impl LayoutConfig {
    /// Compute a layout from sanitized input.
    #[must_use]
    pub fn compute(sanitized: &Sanitized, breakpoints: Breakpoints) -> Self {
        let viewport = sanitized.dimensions;
        let (w, h) = (viewport.width, viewport.height);
        let device_class = if sanitized.extreme_aspect {
            DeviceClass::Conservative
        } else {
            breakpoints.classify(&viewport)
        };
        let params = ClassParams::for_class(device_class);

        let mut corrections: Vec<LayoutCorrection> = sanitized
            .corrections
            .iter()
            .copied()
            .map(LayoutCorrection::Viewport)
            .collect();

        let basis = params.font_basis.resolve(w, h);
        let mut title_font = params.title_font.of(basis);
        let mut body_font = params.body_font.of(basis);
        let mut header_h = params.header_height.of(h);
        let margin = params.margin(w);
        let mut button = Size::new(params.button_width(w), params.button_height);
        let mut prompt_h = body_font * params.prompt_height_factor;
        let mut charge_size = params.charge_size;
        let mut charge_spacing = params.charge_spacing;

        raise_tap_target(Region::ActionButton, Axis::Width, &mut button.width, &mut corrections);
        raise_tap_target(Region::ActionButton, Axis::Height, &mut button.height, &mut corrections);
        raise_tap_target(Region::TargetPrompt, Axis::Height, &mut prompt_h, &mut corrections);

        if device_class == DeviceClass::LargeDesktop {
            let scale = breakpoints.large_scale(w);
            title_font *= scale;
            body_font *= scale;
            header_h *= scale;
            button.width *= scale;
            button.height *= scale;
            prompt_h *= scale;
            charge_size *= scale;
            charge_spacing *= scale;
        }

        let fonts = FontScale {
            title: title_font,
            body: body_font,
            caption: body_font * params.caption_ratio,
        };

        let below_header = header_h + margin;
        let prompt_center = h * params.prompt_center_pct / 100.0;

        let mut layout = Self {
            viewport,
            device_class,
            margin,
            fonts,
            header: Rect::new(0.0, 0.0, w, header_h),
            title: TextAnchor {
                position: Point::new(w / 2.0, header_h / 2.0),
                font_size: fonts.title,
                align: TextAlign::Center,
            },
            score: TextAnchor {
                position: Point::new(margin, below_header),
                font_size: fonts.body,
                align: TextAlign::Start,
            },
            timer: TextAnchor {
                position: Point::new(w - margin, below_header),
                font_size: fonts.body,
                align: TextAlign::End,
            },
            charge_row: ChargeRow::new(
                Point::new(margin, below_header + fonts.body * 1.5),
                charge_size,
                charge_spacing,
                CHARGE_COUNT,
            ),
            target_prompt: Rect::centered_on(
                Point::new(w / 2.0, prompt_center),
                Size::new(w - 2.0 * margin, prompt_h),
            ),
            action_button: Rect::new(
                (w - button.width) / 2.0,
                h - margin - button.height,
                button.width,
                button.height,
            ),
            corrections,
        };
        layout.enforce_bounds();

        if !layout.corrections.is_empty() {
            tracing::debug!(
                class = device_class.label(),
                width = w,
                height = h,
                corrections = layout.corrections.len(),
                "layout corrected"
            );
        }
        layout
    }

    /// Viewport extents.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Size {
        self.viewport.size()
    }

    /// Absolute position an element for `region` is anchored at.
    ///
    /// Text regions anchor at their text position; rectangular regions at
    /// their top-left corner.
    #[must_use]
    pub fn anchor(&self, region: Region) -> Point {
        match region {
            Region::Header => self.header.origin(),
            Region::Title => self.title.position,
            Region::Score => self.score.position,
            Region::Timer => self.timer.position,
            Region::ChargeRow => self.charge_row.bounds.origin(),
            Region::TargetPrompt => self.target_prompt.origin(),
            Region::ActionButton => self.action_button.origin(),
        }
    }

    /// Bounding box of a region. Text regions report a zero-size box at
    /// their anchor.
    #[must_use]
    pub fn bounds(&self, region: Region) -> Rect {
        match region {
            Region::Header => self.header,
            Region::ChargeRow => self.charge_row.bounds,
            Region::TargetPrompt => self.target_prompt,
            Region::ActionButton => self.action_button,
            Region::Title | Region::Score | Region::Timer => {
                let p = self.anchor(region);
                Rect::new(p.x, p.y, 0.0, 0.0)
            }
        }
    }

    /// Text anchor for a text region.
    #[must_use]
    pub fn text(&self, region: Region) -> Option<&TextAnchor> {
        match region {
            Region::Title => Some(&self.title),
            Region::Score => Some(&self.score),
            Region::Timer => Some(&self.timer),
            _ => None,
        }
    }

    /// Interactive regions and their rectangles.
    #[must_use]
    pub fn interactive_regions(&self) -> [(Region, Rect); 2] {
        [
            (Region::TargetPrompt, self.target_prompt),
            (Region::ActionButton, self.action_button),
        ]
    }

    /// Check every region anchor against the viewport.
    #[must_use]
    pub fn validate(&self) -> BoundsReport<Region> {
        validate_anchors(
            Region::ALL.iter().map(|&r| (r, self.anchor(r))),
            self.size(),
        )
    }

    fn enforce_bounds(&mut self) {
        let size = self.size();

        for role in [FontRole::Title, FontRole::Body, FontRole::Caption] {
            let v = self.fonts.get_mut(role);
            let to = if v.is_finite() {
                v.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
            } else {
                MIN_FONT_SIZE
            };
            if to != *v {
                self.corrections.push(LayoutCorrection::FontClamped {
                    role,
                    from: *v,
                    to,
                });
                *v = to;
            }
        }
        self.title.font_size = self.fonts.title;
        self.score.font_size = self.fonts.body;
        self.timer.font_size = self.fonts.body;

        let max_margin = size.width.min(size.height) / 2.0;
        let margin = if self.margin.is_finite() {
            self.margin.clamp(0.0, max_margin)
        } else {
            0.0
        };
        if margin != self.margin {
            self.corrections.push(LayoutCorrection::MarginClamped {
                from: self.margin,
                to: margin,
            });
            self.margin = margin;
        }

        let corrections = &mut self.corrections;
        for (region, rect) in [
            (Region::Header, &mut self.header),
            (Region::ChargeRow, &mut self.charge_row.bounds),
            (Region::TargetPrompt, &mut self.target_prompt),
            (Region::ActionButton, &mut self.action_button),
        ] {
            if !rect.fits_within(size) {
                let to = rect.fit_within(size);
                corrections.push(LayoutCorrection::RegionClamped {
                    region,
                    from: *rect,
                    to,
                });
                *rect = to;
            }
        }

        for (region, anchor) in [
            (Region::Title, &mut self.title),
            (Region::Score, &mut self.score),
            (Region::Timer, &mut self.timer),
        ] {
            if !anchor.position.is_within(size) {
                let to = anchor.position.clamp_to(size);
                corrections.push(LayoutCorrection::AnchorClamped {
                    region,
                    from: anchor.position,
                    to,
                });
                anchor.position = to;
            }
        }
    }
}

fn raise_tap_target(
    region: Region,
    axis: Axis,
    extent: &mut f32,
    corrections: &mut Vec<LayoutCorrection>,
) {
    if extent.is_nan() || *extent < MIN_TAP_TARGET {
        corrections.push(LayoutCorrection::TapTargetRaised {
            region,
            axis,
            from: *extent,
        });
        *extent = MIN_TAP_TARGET;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hudguard_core::viewport::sanitize;

    fn layout(w: f64, h: f64) -> LayoutConfig {
        LayoutConfig::compute(&sanitize(w, h), Breakpoints::DEFAULT)
    }

    #[test]
    fn reference_desktop_layout() {
        let l = layout(800.0, 600.0);
        assert_eq!(l.device_class, DeviceClass::Desktop);
        assert_eq!(l.header, Rect::new(0.0, 0.0, 800.0, 60.0));
        assert_eq!(l.fonts.title, 72.0);
        assert_eq!(l.fonts.body, 24.0);
        assert_eq!(l.margin, 20.0);
        assert_eq!(l.score.position, Point::new(20.0, 80.0));
        assert_eq!(l.timer.position, Point::new(780.0, 80.0));
        assert_eq!(l.action_button, Rect::new(280.0, 524.0, 240.0, 56.0));
        assert_eq!(l.target_prompt, Rect::new(20.0, 240.0, 760.0, 60.0));
        assert!(l.corrections.is_empty(), "{:?}", l.corrections);
    }

    #[test]
    fn small_mobile_landscape_raises_prompt_to_tap_minimum() {
        let l = layout(500.0, 220.0);
        assert_eq!(l.device_class, DeviceClass::MobileLandscape);
        assert!(l.target_prompt.height >= MIN_TAP_TARGET);
        assert!(l.corrections.iter().any(|c| matches!(
            c,
            LayoutCorrection::TapTargetRaised {
                region: Region::TargetPrompt,
                ..
            }
        )));
    }

    #[test]
    fn caption_below_minimum_is_clamped_and_recorded() {
        let l = layout(200.0, 600.0);
        assert_eq!(l.fonts.caption, MIN_FONT_SIZE);
        assert!(l.corrections.iter().any(|c| matches!(
            c,
            LayoutCorrection::FontClamped {
                role: FontRole::Caption,
                ..
            }
        )));
    }

    #[test]
    fn large_desktop_scales_fonts_and_button() {
        let base = layout(1920.0, 1080.0);
        let big = layout(3840.0, 2160.0);
        assert_eq!(big.device_class, DeviceClass::LargeDesktop);
        assert_eq!(big.fonts.title, base.fonts.title * 2.0);
        assert_eq!(big.action_button.height, base.action_button.height * 2.0);
    }

    #[test]
    fn extreme_aspect_uses_conservative_table() {
        let l = layout(5000.0, 250.0);
        assert_eq!(l.device_class, DeviceClass::Conservative);
        assert!(l.validate().is_valid());
        assert!(l.fonts.title <= 48.0);
    }

    #[test]
    fn viewport_corrections_lead_the_list() {
        let l = layout(-50.0, f64::NAN);
        assert_eq!(l.viewport.width, 800.0);
        assert!(matches!(l.corrections[0], LayoutCorrection::Viewport(_)));
        assert!(matches!(l.corrections[1], LayoutCorrection::Viewport(_)));
    }

    #[test]
    fn charge_indicators_are_evenly_spaced() {
        let l = layout(800.0, 600.0);
        let row = l.charge_row;
        assert_eq!(row.count, CHARGE_COUNT);
        assert_eq!(row.bounds.width, 3.0 * 28.0 + 2.0 * 12.0);
        assert_eq!(row.indicator_offset(0), Point::new(14.0, 14.0));
        assert_eq!(row.indicator_offset(2), Point::new(94.0, 14.0));
    }

    #[test]
    fn anchors_use_rect_origins() {
        let l = layout(1024.0, 768.0);
        assert_eq!(l.anchor(Region::ActionButton), l.action_button.origin());
        assert_eq!(l.bounds(Region::Score).size(), Size::default());
        assert!(l.text(Region::Header).is_none());
    }
}
