//! Cycle driver.
//!
//! One pass: snapshot destinations, list the source, route and move every
//! occupied slot against the frozen snapshot, emit one outcome per slot,
//! then pause. Passes repeat until the host stops the driver.

use super::{MoveExecutor, MoveOutcome, SnapshotBuilder, TypeIndex, route};
use crate::config::SortConfig;
use crate::inventory::{HandleRegistry, Inventory};
use crate::models::{
    EventMeta, InventoryId, ItemStack, Listing, OutcomeEvent, OutcomeKind, Route, SkipReason,
    SlotIndex,
};
use crate::observability::OutcomeSink;
use crate::Result;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Driver tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSettings {
    /// Maximum concurrent snapshot queries per wave.
    pub batch_size: usize,
    /// Pause between cycles.
    pub loop_delay: Duration,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            batch_size: crate::config::DEFAULT_BATCH_SIZE,
            loop_delay: Duration::ZERO,
        }
    }
}

impl From<&SortConfig> for DriverSettings {
    fn from(config: &SortConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            loop_delay: config.loop_delay,
        }
    }
}

/// Counters for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Cycle number, starting at 1.
    pub cycle: u64,
    /// Whether the source listing was read.
    pub source_listed: bool,
    /// Snapshot waves issued.
    pub waves: usize,
    /// Occupied source slots handled.
    pub slots: usize,
    /// Stacks moved into a matching destination.
    pub delivered: usize,
    /// Stacks whose matching destination was full.
    pub full: usize,
    /// Stacks moved into the fallback.
    pub fallback: usize,
    /// Stacks the fallback could not take.
    pub fallback_full: usize,
    /// Unmatched stacks left in place for lack of a fallback.
    pub no_fallback: usize,
    /// Stacks with an unreadable item type.
    pub unreadable: usize,
    /// Units transferred in total.
    pub units_moved: u64,
}

impl CycleReport {
    fn record(&mut self, kind: &OutcomeKind) {
        self.slots += 1;
        self.units_moved += u64::from(kind.units_moved());
        match kind {
            OutcomeKind::Delivered { .. } => self.delivered += 1,
            OutcomeKind::DestinationFull => self.full += 1,
            OutcomeKind::Fallback { .. } => self.fallback += 1,
            OutcomeKind::FallbackFull => self.fallback_full += 1,
            OutcomeKind::NoFallback => self.no_fallback += 1,
            OutcomeKind::Unreadable => self.unreadable += 1,
        }
    }

    /// Number of outcome events emitted this cycle.
    #[must_use]
    pub const fn events(&self) -> usize {
        self.slots
    }
}

/// State scoped to one cycle.
struct CycleContext {
    cycle: u64,
    index: TypeIndex,
    destinations: Vec<Arc<dyn Inventory>>,
    destination_ids: Vec<InventoryId>,
    fallback: Option<Arc<dyn Inventory>>,
}

/// Drives the sorting loop.
pub struct CycleDriver {
    registry: Arc<dyn HandleRegistry>,
    source: Arc<dyn Inventory>,
    settings: DriverSettings,
    snapshot: SnapshotBuilder,
    mover: MoveExecutor,
    sink: Arc<dyn OutcomeSink>,
}

impl CycleDriver {
    /// Creates a driver, resolving the source inventory up front.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot supply the source inventory.
    pub fn new(
        registry: Arc<dyn HandleRegistry>,
        settings: DriverSettings,
        sink: Arc<dyn OutcomeSink>,
    ) -> Result<Self> {
        let source = registry.source()?;
        Ok(Self {
            registry,
            source,
            snapshot: SnapshotBuilder::new(settings.batch_size),
            settings,
            mover: MoveExecutor::new(),
            sink,
        })
    }

    /// The driver's settings.
    #[must_use]
    pub const fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    /// Runs one full pass.
    pub async fn run_cycle(&self, cycle: u64) -> CycleReport {
        let destinations = self.registry.destinations();
        let index = self.snapshot.build(&destinations).await;
        let ctx = CycleContext {
            cycle,
            destination_ids: destinations.iter().map(|inv| inv.id().clone()).collect(),
            destinations,
            index,
            fallback: self.registry.fallback(),
        };

        let mut report = CycleReport {
            cycle,
            waves: ctx.index.waves(),
            ..CycleReport::default()
        };
        metrics::counter!("sort_cycles_total").increment(1);

        let Some(listing) = self.list_source().await else {
            return report;
        };
        report.source_listed = true;

        for (slot, stack) in listing {
            let (kind, destination) = self.handle_slot(&ctx, slot, &stack).await;
            report.record(&kind);
            self.sink.notify(&OutcomeEvent {
                meta: EventMeta::new(ctx.cycle),
                slot,
                item: stack.name,
                label: stack.label,
                destination,
                kind,
            });
        }

        metrics::counter!("sort_units_moved_total").increment(report.units_moved);
        tracing::debug!(
            cycle,
            slots = report.slots,
            units_moved = report.units_moved,
            waves = report.waves,
            "Cycle complete"
        );
        report
    }

    /// Runs `cycles` passes, pausing between them.
    pub async fn run_cycles(&self, cycles: u64) -> Vec<CycleReport> {
        let mut reports = Vec::new();
        for cycle in 1..=cycles {
            reports.push(self.run_cycle(cycle).await);
            if cycle < cycles {
                self.pause().await;
            }
        }
        reports
    }

    /// Runs passes until `shutdown` resolves, returning the number completed.
    ///
    /// Shutdown is observed between cycles and during the pause; a cycle in
    /// progress always finishes.
    pub async fn run_until<F>(&self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut cycle = 0;
        loop {
            cycle += 1;
            self.run_cycle(cycle).await;
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = self.pause() => {},
            }
        }
        tracing::info!(cycles = cycle, "Sorting loop stopped");
        cycle
    }

    async fn pause(&self) {
        if self.settings.loop_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.settings.loop_delay).await;
        }
    }

    async fn list_source(&self) -> Option<Listing> {
        let source = Arc::clone(&self.source);
        match tokio::task::spawn_blocking(move || source.list()).await {
            Ok(Ok(Some(listing))) => Some(listing),
            Ok(Ok(None)) => {
                tracing::debug!(source = %self.source.id(), "Source returned no listing");
                None
            },
            Ok(Err(e)) => {
                tracing::warn!(source = %self.source.id(), error = %e, "Could not list source");
                None
            },
            Err(e) => {
                tracing::warn!(source = %self.source.id(), error = %e, "Source listing task failed");
                None
            },
        }
    }

    /// Routes one slot and performs the move it calls for.
    async fn handle_slot(
        &self,
        ctx: &CycleContext,
        slot: SlotIndex,
        stack: &ItemStack,
    ) -> (OutcomeKind, Option<InventoryId>) {
        let decision = route(
            slot,
            stack,
            &ctx.index,
            &ctx.destination_ids,
            ctx.fallback.is_some(),
        );
        let requested = stack.count;

        match (decision.route, ctx.fallback.as_ref()) {
            (Route::Matched(position), _) => {
                let destination = &ctx.destinations[position];
                let kind = match self
                    .mover
                    .execute(&self.source, slot, requested, destination)
                    .await
                {
                    MoveOutcome::Moved { moved, requested } => {
                        OutcomeKind::Delivered { moved, requested }
                    },
                    MoveOutcome::Rejected { .. } => OutcomeKind::DestinationFull,
                };
                (kind, Some(destination.id().clone()))
            },
            (Route::Fallback, Some(fallback)) => {
                let kind = match self.mover.execute(&self.source, slot, requested, fallback).await {
                    MoveOutcome::Moved { moved, requested } => {
                        OutcomeKind::Fallback { moved, requested }
                    },
                    MoveOutcome::Rejected { .. } => OutcomeKind::FallbackFull,
                };
                (kind, Some(fallback.id().clone()))
            },
            (Route::Fallback | Route::Skip(SkipReason::NoFallback), _) => {
                (OutcomeKind::NoFallback, None)
            },
            (Route::Skip(SkipReason::UnreadableIdentifier), _) => (OutcomeKind::Unreadable, None),
        }
    }
}
