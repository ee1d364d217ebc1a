#![forbid(unsafe_code)]

//! Typed events delivered by the host and the game.
//!
//! Resize and orientation signals share one payload carrying both axes, so
//! there is a single callback signature regardless of which host API
//! produced the signal.

use std::time::Duration;

use crate::viewport::{self, Sanitized};

/// What kind of host signal produced a [`ResizeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResizeSource {
    /// Window or canvas resize.
    #[default]
    Resize,
    /// Device orientation change.
    OrientationChange,
}

impl ResizeSource {
    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::OrientationChange => "orientation_change",
        }
    }
}

/// Raw viewport signal from the host. Values are unvalidated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEvent {
    /// Reported width. May be NaN, negative, or absurd.
    pub width: f64,
    /// Reported height. May be NaN, negative, or absurd.
    pub height: f64,
    /// Reported device pixel ratio.
    pub pixel_density: f64,
    /// Signal origin.
    pub source: ResizeSource,
}

impl ResizeEvent {
    /// A plain resize at density 1.0.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            pixel_density: 1.0,
            source: ResizeSource::Resize,
        }
    }

    /// An orientation change at density 1.0.
    #[must_use]
    pub fn orientation_change(width: f64, height: f64) -> Self {
        Self {
            source: ResizeSource::OrientationChange,
            ..Self::new(width, height)
        }
    }

    /// Set the reported pixel density.
    #[must_use]
    pub fn with_pixel_density(mut self, density: f64) -> Self {
        self.pixel_density = density;
        self
    }

    /// Run the payload through the sanitizer.
    #[must_use]
    pub fn sanitize(&self) -> Sanitized {
        viewport::sanitize_with_density(self.width, self.height, self.pixel_density)
    }

    /// Bitwise equality of the reported values, so repeated NaN signals
    /// compare equal to each other.
    #[must_use]
    pub fn same_signal(&self, other: &Self) -> bool {
        self.width.to_bits() == other.width.to_bits()
            && self.height.to_bits() == other.height.to_bits()
            && self.pixel_density.to_bits() == other.pixel_density.to_bits()
    }
}

/// Colour of the current reaction target, as the game names it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetColor {
    /// Display name shown in the prompt.
    pub name: String,
    /// Packed `0xRRGGBB` value.
    pub rgb: u32,
}

impl TargetColor {
    /// Create a new target colour.
    #[must_use]
    pub fn new(name: impl Into<String>, rgb: u32) -> Self {
        Self {
            name: name.into(),
            rgb,
        }
    }
}

/// Domain update forwarded from the game event bus to element callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainUpdate {
    /// The score changed.
    ScoreChanged(u32),
    /// Time elapsed in the current round.
    TimeElapsed(Duration),
    /// The target colour changed.
    TargetChanged(TargetColor),
}

impl DomainUpdate {
    /// Stable string representation of the update kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ScoreChanged(_) => "score_changed",
            Self::TimeElapsed(_) => "time_elapsed",
            Self::TargetChanged(_) => "target_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_signals_compare_equal_bitwise() {
        let a = ResizeEvent::new(f64::NAN, 600.0);
        let b = ResizeEvent::new(f64::NAN, 600.0);
        assert_ne!(a, b);
        assert!(a.same_signal(&b));
    }

    #[test]
    fn orientation_change_keeps_extents() {
        let e = ResizeEvent::orientation_change(390.0, 844.0).with_pixel_density(3.0);
        assert_eq!(e.source, ResizeSource::OrientationChange);
        let s = e.sanitize();
        assert!(s.is_clean());
        assert!(s.dimensions.is_portrait());
        assert_eq!(s.dimensions.pixel_density, 3.0);
    }
}
