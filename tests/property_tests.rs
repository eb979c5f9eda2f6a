//! Property-based tests for routing and snapshotting.
//!
//! Uses proptest to verify invariants across random inputs:
//! - A match is always the earliest destination holding the item type
//! - Unmatched stacks go to the fallback only when one exists
//! - Unreadable identifiers are never routed
//! - Snapshot waves run fully concurrent and never exceed the batch size
//! - Transfers conserve units

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use stacksort::inventory::{InMemoryInventory, Inventory};
use stacksort::models::{InventoryId, ItemStack, Listing, Route, SkipReason, SlotIndex};
use stacksort::services::{SnapshotBuilder, TypeIndex, route};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const ITEMS: [&str; 5] = [
    "minecraft:stone",
    "minecraft:dirt",
    "minecraft:oak_log",
    "minecraft:sand",
    "minecraft:glass",
];

fn build_index(contents: &[Vec<usize>]) -> (TypeIndex, Vec<InventoryId>) {
    let mut index = TypeIndex::default();
    let mut ids = Vec::new();
    for (position, items) in contents.iter().enumerate() {
        let listing: Listing = (1..)
            .zip(items)
            .map(|(slot, item)| (slot, ItemStack::new(ITEMS[*item], 1)))
            .collect();
        let id = InventoryId::new(format!("chest_{position}"));
        index.insert_listing(id.clone(), &listing);
        ids.push(id);
    }
    (index, ids)
}

fn destination_contents() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0..ITEMS.len(), 0..4), 0..12)
}

/// Upper bound on how long a listing waits for the rest of its wave.
const WAVE_DEADLINE: Duration = Duration::from_secs(5);

/// Records the peak number of concurrent listings.
///
/// Each listing holds until every member of its wave has arrived (or the
/// deadline passes), so a wave that runs concurrently shows up as a peak
/// equal to its size.
#[derive(Debug)]
struct CountingInventory {
    id: InventoryId,
    wave_size: usize,
    arrived: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    calls: AtomicUsize,
}

impl Inventory for CountingInventory {
    fn id(&self) -> &InventoryId {
        &self.id
    }

    fn list(&self) -> stacksort::Result<Option<Listing>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.arrived.fetch_add(1, Ordering::SeqCst);

        let start = Instant::now();
        while self.arrived.load(Ordering::SeqCst) < self.wave_size
            && start.elapsed() < WAVE_DEADLINE
        {
            std::thread::sleep(Duration::from_micros(100));
        }
        self.peak
            .fetch_max(self.in_flight.load(Ordering::SeqCst), Ordering::SeqCst);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Some(Listing::new()))
    }

    fn push_items(&self, _slot: SlotIndex, _destination: &dyn Inventory) -> stacksort::Result<u32> {
        Ok(0)
    }

    fn accept(&self, _stack: &ItemStack) -> stacksort::Result<u32> {
        Ok(0)
    }
}

proptest! {
    /// Property: a matched route points at the earliest destination holding the type.
    #[test]
    fn prop_route_picks_earliest_holder(
        contents in destination_contents(),
        item in 0..ITEMS.len(),
        has_fallback in any::<bool>(),
    ) {
        let (index, ids) = build_index(&contents);
        let stack = ItemStack::new(ITEMS[item], 3);
        let expected = contents.iter().position(|items| items.contains(&item));

        let decision = route(7, &stack, &index, &ids, has_fallback);
        prop_assert_eq!(decision.slot, 7);

        match (expected, decision.route) {
            (Some(position), Route::Matched(found)) => {
                prop_assert_eq!(position, found);
            },
            (None, Route::Fallback) => {
                prop_assert!(has_fallback);
            },
            (None, Route::Skip(SkipReason::NoFallback)) => {
                prop_assert!(!has_fallback);
            },
            (expected, route) => {
                prop_assert!(false, "expected {:?}, got {:?}", expected, route);
            },
        }
    }

    /// Property: routing is deterministic for a fixed snapshot.
    #[test]
    fn prop_route_is_deterministic(contents in destination_contents(), item in 0..ITEMS.len()) {
        let (index, ids) = build_index(&contents);
        let stack = ItemStack::new(ITEMS[item], 1);
        prop_assert_eq!(
            route(1, &stack, &index, &ids, true),
            route(1, &stack, &index, &ids, true)
        );
    }

    /// Property: blank identifiers are skipped whatever the snapshot holds.
    #[test]
    fn prop_unreadable_identifier_is_skipped(
        contents in destination_contents(),
        name in "[ \t]{0,4}",
        has_fallback in any::<bool>(),
    ) {
        let (index, ids) = build_index(&contents);
        let decision = route(2, &ItemStack::new(name, 5), &index, &ids, has_fallback);
        prop_assert_eq!(decision.route, Route::Skip(SkipReason::UnreadableIdentifier));
    }

    /// Property: a transfer moves units without creating or losing any.
    #[test]
    fn prop_transfer_conserves_units(held in 0u32..=64, offered in 1u32..=64) {
        let source = InMemoryInventory::with_geometry("source", 1, 64);
        source.insert(1, ItemStack::new("minecraft:stone", offered)).unwrap();
        let target = InMemoryInventory::with_geometry("target", 1, 64);
        if held > 0 {
            target.insert(1, ItemStack::new("minecraft:stone", held)).unwrap();
        }

        let moved = source.push_items(1, &target).unwrap();
        prop_assert_eq!(moved, offered.min(64 - held));
        prop_assert_eq!(
            source.count_of("minecraft:stone") + target.count_of("minecraft:stone"),
            u64::from(held + offered)
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property: destinations are listed once each, in ceil(N / batch) waves
    /// that each run all of their (at most `batch`) queries at once.
    #[test]
    fn prop_snapshot_respects_batch_size(count in 0usize..30, batch_size in 1usize..8) {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let arrivals: Vec<Arc<AtomicUsize>> = (0..count.div_ceil(batch_size))
            .map(|_| Arc::new(AtomicUsize::new(0)))
            .collect();
        let chests: Vec<Arc<CountingInventory>> = (0..count)
            .map(|n| {
                let wave = n / batch_size;
                Arc::new(CountingInventory {
                    id: InventoryId::new(format!("chest_{n}")),
                    wave_size: batch_size.min(count - wave * batch_size),
                    arrived: Arc::clone(&arrivals[wave]),
                    in_flight: Arc::clone(&in_flight),
                    peak: Arc::clone(&peak),
                    calls: AtomicUsize::new(0),
                })
            })
            .collect();
        let destinations: Vec<Arc<dyn Inventory>> = chests
            .iter()
            .map(|chest| Arc::clone(chest) as Arc<dyn Inventory>)
            .collect();

        let index = tokio_test::block_on(SnapshotBuilder::new(batch_size).build(&destinations));

        prop_assert_eq!(index.waves(), count.div_ceil(batch_size));
        prop_assert_eq!(index.len(), count);
        prop_assert_eq!(peak.load(Ordering::SeqCst), batch_size.min(count));
        prop_assert!(chests.iter().all(|chest| chest.calls.load(Ordering::SeqCst) == 1));
    }
}
