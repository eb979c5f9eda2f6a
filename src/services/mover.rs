//! Move executor.

use crate::inventory::Inventory;
use crate::models::SlotIndex;
use std::sync::Arc;

/// Result of one transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// At least one unit was transferred.
    Moved {
        /// Units transferred.
        moved: u32,
        /// Units offered.
        requested: u32,
    },
    /// Nothing was transferred: the destination had no room or the call failed.
    Rejected {
        /// Failure reported by the primitive, if any.
        error: Option<String>,
    },
}

impl MoveOutcome {
    /// Whether any units were transferred.
    #[must_use]
    pub const fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Invokes the transfer primitive and classifies its result.
///
/// Never retries: a rejected move is re-evaluated on the next cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct MoveExecutor;

impl MoveExecutor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Pushes the whole stack at `slot` of `source` into `destination`.
    pub async fn execute(
        &self,
        source: &Arc<dyn Inventory>,
        slot: SlotIndex,
        requested: u32,
        destination: &Arc<dyn Inventory>,
    ) -> MoveOutcome {
        let src = Arc::clone(source);
        let dst = Arc::clone(destination);
        let result =
            tokio::task::spawn_blocking(move || src.push_items(slot, dst.as_ref())).await;

        let outcome = match result {
            Ok(Ok(moved)) if moved > 0 => MoveOutcome::Moved { moved, requested },
            Ok(Ok(_)) => MoveOutcome::Rejected { error: None },
            Ok(Err(e)) => MoveOutcome::Rejected {
                error: Some(e.to_string()),
            },
            Err(e) => MoveOutcome::Rejected {
                error: Some(format!("transfer task failed: {e}")),
            },
        };

        let label = if outcome.is_moved() { "moved" } else { "rejected" };
        metrics::counter!("sort_moves_total", "result" => label).increment(1);
        if let MoveOutcome::Rejected { error: Some(error) } = &outcome {
            tracing::debug!(
                source = %source.id(),
                destination = %destination.id(),
                slot,
                error = %error,
                "Transfer failed"
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InMemoryInventory;
    use crate::models::ItemStack;

    fn pair(dest_slots: u32, dest_limit: u32) -> (Arc<dyn Inventory>, Arc<InMemoryInventory>) {
        let source = InMemoryInventory::new("source")
            .with_stack(1, ItemStack::new("minecraft:stone", 5))
            .unwrap();
        let dest = Arc::new(InMemoryInventory::with_geometry("dest", dest_slots, dest_limit));
        (Arc::new(source), dest)
    }

    #[tokio::test]
    async fn test_full_move() {
        let (source, dest) = pair(1, 64);
        let dest_handle: Arc<dyn Inventory> = dest.clone();

        let outcome = MoveExecutor::new().execute(&source, 1, 5, &dest_handle).await;
        assert_eq!(outcome, MoveOutcome::Moved { moved: 5, requested: 5 });
        assert_eq!(dest.count_of("minecraft:stone"), 5);
    }

    #[tokio::test]
    async fn test_partial_move_is_still_moved() {
        let (source, dest) = pair(1, 3);
        let dest_handle: Arc<dyn Inventory> = dest;

        let outcome = MoveExecutor::new().execute(&source, 1, 5, &dest_handle).await;
        assert_eq!(outcome, MoveOutcome::Moved { moved: 3, requested: 5 });
    }

    #[tokio::test]
    async fn test_zero_units_is_rejected() {
        let (source, _) = pair(1, 64);
        let full: Arc<dyn Inventory> = Arc::new(
            InMemoryInventory::with_geometry("full", 1, 64)
                .with_stack(1, ItemStack::new("minecraft:dirt", 64))
                .unwrap(),
        );

        let outcome = MoveExecutor::new().execute(&source, 1, 5, &full).await;
        assert_eq!(outcome, MoveOutcome::Rejected { error: None });
    }

    #[tokio::test]
    async fn test_failed_call_is_rejected_with_error() {
        let (source, dest) = pair(1, 64);
        dest.set_offline(true);
        let dest_handle: Arc<dyn Inventory> = dest;

        let outcome = MoveExecutor::new().execute(&source, 1, 5, &dest_handle).await;
        assert!(matches!(outcome, MoveOutcome::Rejected { error: Some(_) }));
    }
}
