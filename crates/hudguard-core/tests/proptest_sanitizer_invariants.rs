//! Property-based invariant tests for the viewport sanitizer.
//!
//! 1. Output extents are always inside `[MIN_DIMENSION, MAX_DIMENSION]`.
//! 2. Output pixel density is always inside its accepted range.
//! 3. Valid input is returned unchanged with no corrections.
//! 4. Sanitizing already-sanitized output is a no-op.
//! 5. Orientation always agrees with the output extents.

use hudguard_core::viewport::{
    MAX_DIMENSION, MAX_PIXEL_DENSITY, MIN_DIMENSION, MIN_PIXEL_DENSITY, Orientation, sanitize,
    sanitize_with_density,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn hostile_f64() -> impl Strategy<Value = f64> {
    prop_oneof![
        any::<f64>(),
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
        Just(0.0),
        Just(-0.0),
        -1.0e15f64..1.0e15f64,
        -10_000.0f64..10_000.0f64,
    ]
}

fn valid_extent() -> impl Strategy<Value = f64> {
    f64::from(MIN_DIMENSION)..=f64::from(MAX_DIMENSION)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Clamping invariant
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn output_extents_always_in_range(w in hostile_f64(), h in hostile_f64()) {
        let s = sanitize(w, h);
        let d = s.dimensions;
        prop_assert!(d.width.is_finite() && d.height.is_finite());
        prop_assert!((MIN_DIMENSION..=MAX_DIMENSION).contains(&d.width), "width {} for input {}", d.width, w);
        prop_assert!((MIN_DIMENSION..=MAX_DIMENSION).contains(&d.height), "height {} for input {}", d.height, h);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Density invariant
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn output_density_always_in_range(density in hostile_f64()) {
        let s = sanitize_with_density(800.0, 600.0, density);
        let p = s.dimensions.pixel_density;
        prop_assert!((MIN_PIXEL_DENSITY..=MAX_PIXEL_DENSITY).contains(&p));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Valid input untouched
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn valid_input_is_clean(w in valid_extent(), h in valid_extent()) {
        let s = sanitize(w, h);
        prop_assert!(s.is_clean(), "unexpected corrections {:?}", s.corrections);
        prop_assert_eq!(s.dimensions.width, w as f32);
        prop_assert_eq!(s.dimensions.height, h as f32);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sanitizing_twice_changes_nothing(w in hostile_f64(), h in hostile_f64()) {
        let first = sanitize(w, h).dimensions;
        let second = sanitize(f64::from(first.width), f64::from(first.height));
        prop_assert!(second.is_clean());
        prop_assert_eq!(second.dimensions, first);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Orientation agrees with extents
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn orientation_matches_extents(w in hostile_f64(), h in hostile_f64()) {
        let d = sanitize(w, h).dimensions;
        let expected = if d.width < d.height { Orientation::Portrait } else { Orientation::Landscape };
        prop_assert_eq!(d.orientation, expected);
    }
}
