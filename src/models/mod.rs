//! Data models for stacksort.
//!
//! Everything here except [`InventoryId`] lives for a single cycle.

mod events;
mod item;
mod routing;

pub use events::{EventMeta, OutcomeEvent, OutcomeKind};
pub use item::{InventoryId, ItemStack, ItemTypeId, Listing, SlotIndex};
pub use routing::{Decision, Route, SkipReason};
