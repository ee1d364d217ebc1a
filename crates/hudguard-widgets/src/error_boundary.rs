#![forbid(unsafe_code)]

//! Construction boundary with panic capture.
//!
//! Host factories and strategy constructors run inside [`guard_construction`].
//! A panic is caught, its payload turned into a message, and the result
//! reported as [`ConstructionError::Panicked`] so a failing element never
//! unwinds into the host event loop. Nodes created before the panic are
//! released by the assembly guard while unwinding.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::ConstructionError;

/// Extract a readable message from a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    match message.strip_prefix("internal error: entered unreachable code: ") {
        Some(stripped) => stripped.to_string(),
        None => message,
    }
}

/// Run a constructor, converting a panic into an error.
pub fn guard_construction<T>(
    component: &str,
    build: impl FnOnce() -> Result<T, ConstructionError>,
) -> Result<T, ConstructionError> {
    match catch_unwind(AssertUnwindSafe(build)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::debug!(component, panic = %message, "construction panicked");
            Err(ConstructionError::Panicked(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Assembly, ElementRequest, ElementRole};
    use crate::strategy::Strategy;
    use hudguard_core::geometry::Point;
    use hudguard_render::headless::HeadlessEngine;
    use hudguard_render::{PackedRgba, RectSpec};

    #[test]
    fn ok_and_err_pass_through() {
        assert_eq!(guard_construction("c", || Ok::<_, ConstructionError>(7)), Ok(7));
        let err = guard_construction::<()>("c", || {
            Err(ConstructionError::ResourceUnavailable("fonts"))
        });
        assert_eq!(err, Err(ConstructionError::ResourceUnavailable("fonts")));
    }

    #[test]
    fn catches_str_panic() {
        let r = guard_construction::<()>("c", || panic!("boom"));
        assert_eq!(r, Err(ConstructionError::Panicked("boom".into())));
    }

    #[test]
    fn catches_string_panic() {
        let r = guard_construction::<()>("c", || panic!("{}", String::from("formatted")));
        assert_eq!(r, Err(ConstructionError::Panicked("formatted".into())));
    }

    #[test]
    fn strips_unreachable_prefix() {
        let r = guard_construction::<()>("c", || unreachable!("never"));
        assert_eq!(r, Err(ConstructionError::Panicked("never".into())));
    }

    #[test]
    fn unknown_payload_is_named() {
        let payload: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn panic_mid_assembly_releases_nodes() {
        let mut engine = HeadlessEngine::new();
        let request = ElementRequest::new(ElementRole::Score, Point::new(5.0, 5.0));
        let r = guard_construction::<()>("score", || {
            let mut a = Assembly::begin(&mut engine, Strategy::Graphics, &request)?;
            a.rect(RectSpec::filled(Point::default(), request.extent, PackedRgba::RED))?;
            panic!("factory gave up");
        });
        assert_eq!(r, Err(ConstructionError::Panicked("factory gave up".into())));
        assert_eq!(engine.live_count(), 0);
        assert_eq!(engine.stats().destroyed, 2);
    }
}
