//! Event sinks.
//!
//! A sink is injected once when an orchestrator is built. `emit` returns
//! nothing, so a sink cannot change what the loop does next.

use std::sync::{Arc, Mutex};

use log::{debug, info};

use crate::domain::EngineEvent;

/// Receiver for [`EngineEvent`]s.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &EngineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &EngineEvent) {}
}

/// Renders events through the `log` facade.
///
/// Stop, strategy-switch and outer-loop events go to `info`, the rest to `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &EngineEvent) {
        let payload = serde_json::to_string(event).unwrap_or_default();
        match event {
            EngineEvent::Stopped { .. } | EngineEvent::StrategySwitch { .. } => {
                info!("{} {}", event.event_type(), payload)
            }
            e if e.is_outer_event() => info!("{} {}", event.event_type(), payload),
            _ => debug!("{} {}", event.event_type(), payload),
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events whose type equals `event_type` (e.g. `"probe.result"`).
    pub fn of_type(&self, event_type: &str) -> Vec<EngineEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &EngineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
