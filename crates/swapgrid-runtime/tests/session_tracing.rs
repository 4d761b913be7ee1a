//! Structured log events emitted by the session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use swapgrid_core::{EngineConfig, ShapeAssets};
use swapgrid_runtime::{Msg, Session, SessionSimulator, TimerEvent, TimerGeneration};
use tracing_subscriber::layer::SubscriberExt;

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn message(&self) -> &str {
        self.fields.get("message").map_or("", String::as_str)
    }
}

#[derive(Clone, Default)]
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn with_captured_tracing<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let capture = EventCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    let events = capture.events.lock().unwrap().clone();
    events
}

fn simulator() -> SessionSimulator<ShapeAssets> {
    let session = Session::with_rng(
        EngineConfig::default(),
        ShapeAssets::new(20),
        SmallRng::seed_from_u64(11),
    )
    .unwrap();
    SessionSimulator::new(session)
}

#[test]
fn level_start_is_logged_with_generation() {
    let events = with_captured_tracing(|| {
        simulator().start().unwrap();
    });
    let started = events
        .iter()
        .find(|e| e.message() == "level started")
        .unwrap();
    assert_eq!(started.level, tracing::Level::INFO);
    assert_eq!(started.target, "swapgrid.session");
    assert_eq!(started.fields["level"], "1");
    assert_eq!(started.fields["generation"], "1");
    assert_eq!(started.fields["provider"], "shapes");
}

#[test]
fn stale_timer_events_are_logged_and_dropped() {
    let events = with_captured_tracing(|| {
        let mut sim = simulator();
        sim.start().unwrap();
        sim.deliver(Msg::Timer(TimerEvent::Tick {
            generation: TimerGeneration::new(42),
        }))
        .unwrap();
    });
    let dropped = events
        .iter()
        .find(|e| e.message() == "dropped timer event")
        .unwrap();
    assert_eq!(dropped.target, "swapgrid.timer");
    assert_eq!(dropped.level, tracing::Level::DEBUG);
    assert!(dropped.fields["error"].contains("42"));
}

#[test]
fn recorded_results_carry_scores() {
    let events = with_captured_tracing(|| {
        let mut sim = simulator();
        sim.start().unwrap();
        sim.advance(Duration::from_secs(30)).unwrap();
        let moved = sim
            .session()
            .trial()
            .and_then(|t| t.moved_positions())
            .cloned()
            .unwrap();
        for position in moved {
            sim.deliver(Msg::ToggleSelection(position)).unwrap();
        }
        sim.deliver(Msg::Submit).unwrap();
        sim.deliver(Msg::Acknowledge).unwrap();
    });
    let recorded = events
        .iter()
        .find(|e| e.message() == "level result recorded")
        .unwrap();
    assert_eq!(recorded.fields["score"], "2");
    assert_eq!(recorded.fields["passed"], "true");
    assert!(events.iter().any(|e| e.message() == "study phase ended"));
}
