//! Concurrent snapshot of destination contents.
//!
//! Destinations are queried in consecutive waves of at most `batch_size`
//! concurrent listings. A wave is fully joined before the next one starts,
//! which bounds outstanding queries against the environment's shared event
//! budget.

use crate::inventory::Inventory;
use crate::models::{InventoryId, ItemTypeId, Listing};
use crate::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Item types present in each destination, read once per cycle.
///
/// Never updated in place; every cycle builds a new one.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    sets: HashMap<InventoryId, HashSet<ItemTypeId>>,
    waves: usize,
}

impl TypeIndex {
    /// Whether `inventory` held `item` when it was read.
    #[must_use]
    pub fn contains(&self, inventory: &InventoryId, item: &ItemTypeId) -> bool {
        self.sets
            .get(inventory)
            .is_some_and(|items| items.contains(item))
    }

    /// Item types recorded for `inventory`.
    #[must_use]
    pub fn items(&self, inventory: &InventoryId) -> Option<&HashSet<ItemTypeId>> {
        self.sets.get(inventory)
    }

    /// Number of destinations in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether the index has no destinations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Number of sequential query waves used to build the index.
    #[must_use]
    pub const fn waves(&self) -> usize {
        self.waves
    }

    /// Records the item types of one listing.
    pub fn insert_listing(&mut self, inventory: InventoryId, listing: &Listing) {
        let items = listing.values().map(|stack| stack.name.clone()).collect();
        self.sets.insert(inventory, items);
    }
}

/// Builds a [`TypeIndex`] under a concurrency budget.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotBuilder {
    batch_size: usize,
}

impl SnapshotBuilder {
    /// Creates a builder issuing at most `batch_size` concurrent queries.
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Maximum concurrent queries per wave.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Queries every destination exactly once and indexes the item types found.
    ///
    /// A destination whose query fails, returns no data, or panics
    /// contributes an empty set; its siblings are unaffected.
    pub async fn build(&self, destinations: &[Arc<dyn Inventory>]) -> TypeIndex {
        let start = Instant::now();
        let mut index = TypeIndex::default();

        // Pre-seed so that every queried destination has an entry.
        for inventory in destinations {
            index.sets.insert(inventory.id().clone(), HashSet::new());
        }

        for (wave, batch) in destinations.chunks(self.batch_size).enumerate() {
            let mut tasks = JoinSet::new();
            for inventory in batch {
                let inventory = Arc::clone(inventory);
                tasks.spawn_blocking(move || {
                    let listing = inventory.list();
                    (inventory.id().clone(), listing)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((id, listing)) => record(&mut index, id, listing),
                    Err(e) => {
                        metrics::counter!("sort_snapshot_query_failures_total", "reason" => "panic")
                            .increment(1);
                        tracing::warn!(wave, error = %e, "Snapshot query task failed");
                    },
                }
            }
            index.waves += 1;
        }

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("sort_snapshot_duration_ms").record(duration_ms);
        metrics::gauge!("sort_snapshot_waves").set(index.waves as f64);
        tracing::debug!(
            destinations = destinations.len(),
            waves = index.waves,
            batch_size = self.batch_size,
            duration_ms,
            "Built destination snapshot"
        );

        index
    }
}

fn record(index: &mut TypeIndex, id: InventoryId, listing: Result<Option<Listing>>) {
    match listing {
        Ok(Some(listing)) => index.insert_listing(id, &listing),
        Ok(None) => {
            metrics::counter!("sort_snapshot_query_failures_total", "reason" => "empty")
                .increment(1);
            tracing::debug!(inventory = %id, "Destination returned no listing");
        },
        Err(e) => {
            metrics::counter!("sort_snapshot_query_failures_total", "reason" => "error")
                .increment(1);
            tracing::debug!(inventory = %id, error = %e, "Destination listing failed");
        },
    }
}
