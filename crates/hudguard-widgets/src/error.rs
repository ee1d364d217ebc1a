#![forbid(unsafe_code)]

//! Construction and validation errors.

use std::fmt;

use hudguard_core::geometry::Point;
use hudguard_render::RenderError;

use crate::element::ElementRole;

/// A creation strategy failed to build an element.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructionError {
    /// The engine rejected a primitive.
    Render(RenderError),
    /// A resource the strategy needs is not ready.
    ResourceUnavailable(&'static str),
    /// The factory panicked; the payload message is kept.
    Panicked(String),
}

impl ConstructionError {
    /// Short classification for logs and diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Render(_) => "render",
            Self::ResourceUnavailable(_) => "resource_unavailable",
            Self::Panicked(_) => "panicked",
        }
    }
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(e) => write!(f, "render error: {e}"),
            Self::ResourceUnavailable(what) => write!(f, "resource unavailable: {what}"),
            Self::Panicked(msg) => write!(f, "construction panicked: {msg}"),
        }
    }
}

impl std::error::Error for ConstructionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderError> for ConstructionError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::ResourceUnavailable(what) => Self::ResourceUnavailable(what),
            other => Self::Render(other),
        }
    }
}

/// A constructed HUD failed its post-construction check.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    /// Required regions have no element.
    MissingRegions(Vec<ElementRole>),
    /// Elements are anchored outside the viewport.
    OutOfBounds(Vec<(ElementRole, Point)>),
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRegions(roles) => {
                f.write_str("missing required regions:")?;
                for role in roles {
                    write!(f, " {}", role.as_str())?;
                }
                Ok(())
            }
            Self::OutOfBounds(violations) => {
                f.write_str("elements outside viewport:")?;
                for (role, p) in violations {
                    write!(f, " {}@({}, {})", role.as_str(), p.x, p.y)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationFailure {}

/// Whole-HUD assembly failed at one strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum HudError {
    /// An element could not be built.
    Construction(ConstructionError),
    /// The assembled HUD did not pass validation.
    Validation(ValidationFailure),
}

impl fmt::Display for HudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construction(e) => write!(f, "construction failed: {e}"),
            Self::Validation(e) => write!(f, "validation failed: {e}"),
        }
    }
}

impl std::error::Error for HudError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Construction(e) => Some(e),
            Self::Validation(e) => Some(e),
        }
    }
}

impl From<ConstructionError> for HudError {
    fn from(err: ConstructionError) -> Self {
        Self::Construction(err)
    }
}

impl From<ValidationFailure> for HudError {
    fn from(err: ValidationFailure) -> Self {
        Self::Validation(err)
    }
}
