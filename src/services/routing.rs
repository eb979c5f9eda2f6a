//! Routing decision engine.
//!
//! Pure function of the frozen snapshot; performs no I/O.

use super::TypeIndex;
use crate::models::{Decision, InventoryId, ItemStack, Route, SkipReason, SlotIndex};

/// Decides where the stack in `slot` should go.
///
/// Returns the first entry of `destinations`, in order, whose indexed set
/// holds the stack's item type. Ties always resolve to the earliest
/// destination. Without a match the stack goes to the fallback when
/// `has_fallback` is set and is otherwise left in place.
#[must_use]
pub fn route(
    slot: SlotIndex,
    stack: &ItemStack,
    index: &TypeIndex,
    destinations: &[InventoryId],
    has_fallback: bool,
) -> Decision {
    if !stack.name.is_readable() {
        return Decision {
            slot,
            route: Route::Skip(SkipReason::UnreadableIdentifier),
        };
    }

    let route = destinations
        .iter()
        .position(|id| index.contains(id, &stack.name))
        .map_or(
            if has_fallback {
                Route::Fallback
            } else {
                Route::Skip(SkipReason::NoFallback)
            },
            Route::Matched,
        );

    Decision { slot, route }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemTypeId, Listing};

    fn index(entries: &[(&str, &[&str])]) -> (TypeIndex, Vec<InventoryId>) {
        let mut index = TypeIndex::default();
        let mut ids = Vec::new();
        for (name, items) in entries {
            let listing: Listing = (1..)
                .zip(items.iter())
                .map(|(slot, item)| (slot, ItemStack::new(*item, 1)))
                .collect();
            let id = InventoryId::new(*name);
            index.insert_listing(id.clone(), &listing);
            ids.push(id);
        }
        (index, ids)
    }

    #[test]
    fn test_single_match() {
        let (index, ids) = index(&[("A", &["wood"]), ("B", &["stone"])]);
        let decision = route(1, &ItemStack::new("stone", 5), &index, &ids, true);
        assert_eq!(decision, Decision { slot: 1, route: Route::Matched(1) });
    }

    #[test]
    fn test_earliest_destination_wins_ties() {
        let (index, ids) = index(&[("A", &["dirt"]), ("B", &["stone"]), ("C", &["stone"])]);
        let decision = route(3, &ItemStack::new("stone", 1), &index, &ids, true);
        assert_eq!(decision.route, Route::Matched(1));
    }

    #[test]
    fn test_unmatched_goes_to_fallback() {
        let (index, ids) = index(&[("A", &["wood"])]);
        let decision = route(2, &ItemStack::new("glass", 3), &index, &ids, true);
        assert_eq!(decision.route, Route::Fallback);
    }

    #[test]
    fn test_unmatched_without_fallback_is_skipped() {
        let (index, ids) = index(&[("A", &["wood"])]);
        let decision = route(2, &ItemStack::new("glass", 3), &index, &ids, false);
        assert_eq!(decision.route, Route::Skip(SkipReason::NoFallback));
    }

    #[test]
    fn test_unreadable_identifier_is_skipped_even_with_fallback() {
        let (index, ids) = index(&[("A", &[""])]);
        let stack = ItemStack {
            name: ItemTypeId::new(""),
            count: 1,
            label: None,
        };
        let decision = route(9, &stack, &index, &ids, true);
        assert_eq!(decision.route, Route::Skip(SkipReason::UnreadableIdentifier));
    }

    #[test]
    fn test_destinations_missing_from_index_never_match() {
        let (index, _) = index(&[("A", &["stone"])]);
        let ids = vec![InventoryId::new("Z"), InventoryId::new("A")];
        let decision = route(1, &ItemStack::new("stone", 1), &index, &ids, false);
        assert_eq!(decision.route, Route::Matched(1));
    }
}
