#![forbid(unsafe_code)]

//! Log-event integration tests.
//!
//! Positioning failures must be reported at `WARN` with the element role,
//! and contained construction panics at `DEBUG` with the component name.
//!
//!   cargo test -p hudguard-widgets --test tracing_tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hudguard_layout::calculate_layout;
use hudguard_render::headless::{FaultMask, HeadlessEngine};
use hudguard_widgets::{
    ConstructionError, Strategy, build_hud, guard_construction, update_element_positions,
};

use tracing_subscriber::layer::SubscriberExt;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// A captured event with its level and fields.
#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
}

/// A tracing Layer that records every event.
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

/// Visitor that extracts event fields.
struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.remove("message").unwrap_or_default();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
        });
    }
}

/// Run a closure under a capturing subscriber.
fn with_captured_events<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCapture {
        events: events.clone(),
    });
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn positioning_failure_is_warned_per_element() {
    let layout = calculate_layout(800.0, 600.0);
    let mut engine = HeadlessEngine::new();
    let mut map = build_hud(&mut engine, Strategy::Minimal, &layout).unwrap();
    engine.set_faults(FaultMask::POSITION);

    let events = with_captured_events(|| {
        let report = update_element_positions(&mut engine, map.iter_mut(), &layout);
        assert_eq!(report.failures.len(), map.len());
    });

    let warns: Vec<_> = events
        .iter()
        .filter(|e| e.level == tracing::Level::WARN && e.message == "element positioning failed")
        .collect();
    assert_eq!(warns.len(), Strategy::Minimal.hud_roles().len());
    assert!(warns.iter().any(|e| e.fields.get("role").map(String::as_str) == Some("score")));
}

#[test]
fn contained_panic_is_logged_with_component() {
    let events = with_captured_events(|| {
        let r = guard_construction::<()>("timer", || panic!("no clock"));
        assert_eq!(r, Err(ConstructionError::Panicked("no clock".into())));
    });

    let event = events
        .iter()
        .find(|e| e.message == "construction panicked")
        .expect("panic event");
    assert_eq!(event.level, tracing::Level::DEBUG);
    assert_eq!(event.fields.get("component").map(String::as_str), Some("timer"));
    assert_eq!(event.fields.get("panic").map(String::as_str), Some("no clock"));
}
