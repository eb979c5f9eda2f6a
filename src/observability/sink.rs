//! Outcome sinks.

use crate::models::{OutcomeEvent, OutcomeKind};
use std::sync::Arc;

/// Fire-and-forget consumer of outcome events.
///
/// Implementations must not block and must not fail observably.
pub trait OutcomeSink: Send + Sync {
    /// Handles one event.
    fn notify(&self, event: &OutcomeEvent);
}

/// Writes one structured log line per outcome and counts outcomes by kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    /// Creates a new tracing sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl OutcomeSink for TracingSink {
    fn notify(&self, event: &OutcomeEvent) {
        let kind = event.kind.as_str();
        metrics::counter!("sort_outcomes_total", "kind" => kind).increment(1);

        let item = event.display_name();
        let destination = event
            .destination
            .as_ref()
            .map_or("-", |id| id.as_str());

        match event.kind {
            OutcomeKind::Delivered { moved, requested } => {
                tracing::info!(
                    cycle = event.meta.cycle,
                    slot = event.slot,
                    item,
                    destination,
                    moved,
                    requested,
                    partial = event.kind.is_partial(),
                    "OK"
                );
            },
            OutcomeKind::Fallback { moved, requested } => {
                tracing::warn!(
                    cycle = event.meta.cycle,
                    slot = event.slot,
                    item,
                    destination,
                    moved,
                    requested,
                    "FALLBACK"
                );
            },
            OutcomeKind::DestinationFull => {
                tracing::warn!(cycle = event.meta.cycle, slot = event.slot, item, destination, "FULL");
            },
            OutcomeKind::FallbackFull => {
                tracing::warn!(
                    cycle = event.meta.cycle,
                    slot = event.slot,
                    item,
                    destination,
                    "FULL(fallback)"
                );
            },
            OutcomeKind::NoFallback => {
                tracing::warn!(cycle = event.meta.cycle, slot = event.slot, item, "WARN(no fallback)");
            },
            OutcomeKind::Unreadable => {
                tracing::warn!(
                    cycle = event.meta.cycle,
                    slot = event.slot,
                    "WARN(unreadable identifier)"
                );
            },
        }
    }
}

/// Forwards every event to each inner sink, in order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn OutcomeSink>>,
}

impl FanoutSink {
    /// Creates an empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink.
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn OutcomeSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of inner sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether there are no inner sinks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl OutcomeSink for FanoutSink {
    fn notify(&self, event: &OutcomeEvent) {
        for sink in &self.sinks {
            sink.notify(event);
        }
    }
}
