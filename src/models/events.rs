//! Outcome events emitted once per occupied source slot.

use super::{InventoryId, ItemTypeId, SlotIndex};
use crate::current_timestamp;
use serde::Serialize;
use uuid::Uuid;

/// Shared event metadata.
#[derive(Debug, Clone, Serialize)]
pub struct EventMeta {
    /// Unique identifier for this event.
    pub event_id: String,
    /// Cycle number the event belongs to.
    pub cycle: u64,
    /// Timestamp (Unix epoch seconds).
    pub timestamp: u64,
}

impl EventMeta {
    /// Creates new event metadata using the current timestamp.
    #[must_use]
    pub fn new(cycle: u64) -> Self {
        Self::with_timestamp(cycle, current_timestamp())
    }

    /// Creates new event metadata with a specified timestamp.
    #[must_use]
    pub fn with_timestamp(cycle: u64, timestamp: u64) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            cycle,
            timestamp,
        }
    }
}

/// Classified result of handling one source slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Moved into the matching destination (possibly only part of the stack).
    Delivered {
        /// Units actually transferred.
        moved: u32,
        /// Units offered.
        requested: u32,
    },
    /// The matching destination accepted nothing.
    DestinationFull,
    /// Moved into the fallback inventory.
    Fallback {
        /// Units actually transferred.
        moved: u32,
        /// Units offered.
        requested: u32,
    },
    /// The fallback inventory accepted nothing.
    FallbackFull,
    /// Nothing matched and no fallback is configured.
    NoFallback,
    /// The item type could not be read.
    Unreadable,
}

impl OutcomeKind {
    /// Returns the outcome name used in logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "ok",
            Self::DestinationFull => "full",
            Self::Fallback { .. } => "fallback",
            Self::FallbackFull => "fallback_full",
            Self::NoFallback => "no_fallback",
            Self::Unreadable => "unreadable",
        }
    }

    /// Whether this outcome triggers the failure tone.
    #[must_use]
    pub const fn alerts(&self) -> bool {
        matches!(
            self,
            Self::Fallback { .. } | Self::FallbackFull | Self::NoFallback
        )
    }

    /// Whether some, but not all, of the stack was moved.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        match self {
            Self::Delivered { moved, requested } | Self::Fallback { moved, requested } => {
                *moved > 0 && *moved < *requested
            },
            _ => false,
        }
    }

    /// Units transferred by this outcome.
    #[must_use]
    pub const fn units_moved(&self) -> u32 {
        match self {
            Self::Delivered { moved, .. } | Self::Fallback { moved, .. } => *moved,
            _ => 0,
        }
    }
}

/// Event describing what happened to one source slot.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeEvent {
    /// Event metadata.
    pub meta: EventMeta,
    /// Source slot.
    pub slot: SlotIndex,
    /// Item type in the slot.
    pub item: ItemTypeId,
    /// Display label, if the inventory reported one.
    pub label: Option<String>,
    /// Target inventory, when one was chosen.
    pub destination: Option<InventoryId>,
    /// What happened.
    #[serde(flatten)]
    pub kind: OutcomeKind,
}

impl OutcomeEvent {
    /// Returns the label if present, otherwise the item type.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.item.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alerting_outcomes() {
        assert!(!OutcomeKind::Delivered { moved: 5, requested: 5 }.alerts());
        assert!(!OutcomeKind::DestinationFull.alerts());
        assert!(OutcomeKind::Fallback { moved: 1, requested: 1 }.alerts());
        assert!(OutcomeKind::FallbackFull.alerts());
        assert!(OutcomeKind::NoFallback.alerts());
        assert!(!OutcomeKind::Unreadable.alerts());
    }

    #[test]
    fn test_partial_delivery_is_not_full() {
        let partial = OutcomeKind::Delivered { moved: 3, requested: 64 };
        assert!(partial.is_partial());
        assert_eq!(partial.as_str(), "ok");
        assert_ne!(partial, OutcomeKind::DestinationFull);

        let whole = OutcomeKind::Delivered { moved: 64, requested: 64 };
        assert!(!whole.is_partial());
    }

    #[test]
    fn test_event_serializes_flat_kind() {
        let event = OutcomeEvent {
            meta: EventMeta::with_timestamp(7, 1_700_000_000),
            slot: 2,
            item: ItemTypeId::new("minecraft:glass"),
            label: None,
            destination: None,
            kind: OutcomeKind::NoFallback,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "no_fallback");
        assert_eq!(json["meta"]["cycle"], 7);
        assert_eq!(event.display_name(), "minecraft:glass");
    }
}
