//! Collaborator seams for inventories and the handle registry.

use crate::models::{InventoryId, ItemStack, Listing, SlotIndex};
use crate::Result;
use std::fmt;
use std::sync::Arc;

/// A storage container with a slot-indexed listing.
///
/// Calls are blocking and are expected to complete or fail within a bounded
/// time. Implementations must tolerate concurrent `list` calls.
pub trait Inventory: Send + Sync + fmt::Debug {
    /// Stable identity of this inventory.
    fn id(&self) -> &InventoryId;

    /// Lists occupied slots.
    ///
    /// `Ok(None)` means the inventory answered without data.
    ///
    /// # Errors
    ///
    /// Returns an error on a transient read failure.
    fn list(&self) -> Result<Option<Listing>>;

    /// Pushes the whole stack at `slot` into `destination`.
    ///
    /// Returns the units actually transferred; zero means the destination
    /// could not accept anything.
    ///
    /// # Errors
    ///
    /// Returns an error if either side of the transfer fails.
    fn push_items(&self, slot: SlotIndex, destination: &dyn Inventory) -> Result<u32>;

    /// Stores as much of `stack` as fits, returning units stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory cannot be reached.
    fn accept(&self, stack: &ItemStack) -> Result<u32>;
}

/// Supplies the inventory handles the sorter works over.
pub trait HandleRegistry: Send + Sync {
    /// Destination handles in their fixed, configured order.
    fn destinations(&self) -> Vec<Arc<dyn Inventory>>;

    /// The source (staging) inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be reached. This is fatal at startup.
    fn source(&self) -> Result<Arc<dyn Inventory>>;

    /// The fallback inventory, if one is configured.
    fn fallback(&self) -> Option<Arc<dyn Inventory>>;
}
