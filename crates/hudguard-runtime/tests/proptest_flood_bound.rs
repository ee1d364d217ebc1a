//! Property-based invariant tests for the resize flood guard.
//!
//! 1. More than `flood_ceiling` signals inside one second produce strictly
//!    fewer layout applications than signals.
//! 2. The final signal of any sequence is applied once signals stop.
//! 3. Identical schedules produce identical decision logs.

use std::time::Duration;

use hudguard_core::Instant;
use hudguard_core::event::ResizeEvent;
use hudguard_runtime::{FloodAction, FloodGuard, FloodGuardConfig};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn guard(logging: bool) -> FloodGuard {
    FloodGuard::new(
        FloodGuardConfig::default().with_logging(logging),
        ResizeEvent::new(800.0, 600.0),
    )
}

/// Feed `gaps_ms` as a signal stream, then one late tick. Returns the
/// number of applications.
fn run(g: &mut FloodGuard, gaps_ms: &[u64]) -> usize {
    let base = Instant::now();
    let mut t = 0u64;
    let mut applies = 0;
    for (i, gap) in gaps_ms.iter().enumerate() {
        t += gap;
        let event = ResizeEvent::new(300.0 + i as f64, 400.0 + (i % 5) as f64);
        if let FloodAction::Apply { .. } = g.handle_resize_at(event, base + Duration::from_millis(t)) {
            applies += 1;
        }
    }
    if let FloodAction::Apply { .. } = g.tick_at(base + Duration::from_millis(t + 5_000)) {
        applies += 1;
    }
    applies
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Flood bound
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn flood_applies_fewer_than_signals(gaps in proptest::collection::vec(0u64..=3, 61..250)) {
        let mut g = guard(false);
        let n = gaps.len();
        let applies = run(&mut g, &gaps);
        prop_assert!(applies < n, "{} applies for {} signals", applies, n);
        prop_assert!(applies <= 2, "{} applies inside one second", applies);
        prop_assert_eq!(g.stats().flood_activations, 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Latest wins, never dropped
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn final_signal_is_applied(gaps in proptest::collection::vec(0u64..200, 1..120)) {
        let mut g = guard(false);
        run(&mut g, &gaps);
        let last = gaps.len() - 1;
        let expected = ResizeEvent::new(300.0 + last as f64, 400.0 + (last % 5) as f64);
        prop_assert!(!g.has_pending());
        prop_assert!(g.last_applied().same_signal(&expected));
        prop_assert!(!g.is_flooded());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn identical_schedules_identical_decisions(gaps in proptest::collection::vec(0u64..80, 1..150)) {
        let mut a = guard(true);
        let mut b = guard(true);
        let applies_a = run(&mut a, &gaps);
        let applies_b = run(&mut b, &gaps);
        prop_assert_eq!(applies_a, applies_b);
        prop_assert_eq!(a.decision_checksum(), b.decision_checksum());
        prop_assert_eq!(a.logs().len(), b.logs().len());
    }
}
