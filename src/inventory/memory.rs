//! In-memory inventory backend.
//!
//! Models a container with a fixed number of slots and a per-slot stack
//! limit. Slots are numbered from 1. Used by the simulator and the tests.

use super::Inventory;
use crate::models::{InventoryId, ItemStack, ItemTypeId, Listing, SlotIndex};
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Default maximum units per slot.
pub const DEFAULT_STACK_LIMIT: u32 = 64;

/// Default number of slots (a single chest).
pub const DEFAULT_SLOT_COUNT: u32 = 27;

/// Largest slot count a world file may declare.
pub const MAX_SLOT_COUNT: u32 = 4096;

/// Mutex-guarded in-memory inventory.
#[derive(Debug)]
pub struct InMemoryInventory {
    id: InventoryId,
    stack_limit: u32,
    slots: Mutex<Vec<Option<ItemStack>>>,
    offline: AtomicBool,
    list_calls: AtomicUsize,
}

impl InMemoryInventory {
    /// Creates an empty inventory with the default geometry.
    #[must_use]
    pub fn new(id: impl Into<InventoryId>) -> Self {
        Self::with_geometry(id, DEFAULT_SLOT_COUNT, DEFAULT_STACK_LIMIT)
    }

    /// Creates an empty inventory with `slot_count` slots of `stack_limit` units.
    #[must_use]
    pub fn with_geometry(id: impl Into<InventoryId>, slot_count: u32, stack_limit: u32) -> Self {
        Self {
            id: id.into(),
            stack_limit: stack_limit.max(1),
            slots: Mutex::new(vec![None; slot_count as usize]),
            offline: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Places `stack` at `slot`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot is out of range or the stack exceeds the
    /// stack limit.
    pub fn insert(&self, slot: SlotIndex, stack: ItemStack) -> Result<()> {
        if stack.count > self.stack_limit {
            return Err(Error::InvalidInput(format!(
                "{} units of {} exceed the stack limit of {} in {}",
                stack.count, stack.name, self.stack_limit, self.id
            )));
        }
        let mut slots = self.lock()?;
        let index = slot_position(&slots, slot).ok_or_else(|| {
            Error::InvalidInput(format!("slot {slot} is out of range for {}", self.id))
        })?;
        slots[index] = (stack.count > 0).then_some(stack);
        drop(slots);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub fn with_stack(self, slot: SlotIndex, stack: ItemStack) -> Result<Self> {
        self.insert(slot, stack)?;
        Ok(self)
    }

    /// Marks the inventory as unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of times [`Inventory::list`] has been called.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Total units of `item` held across all slots.
    #[must_use]
    pub fn count_of(&self, item: &str) -> u64 {
        self.lock().map_or(0, |slots| {
            slots
                .iter()
                .flatten()
                .filter(|stack| stack.name.as_str() == item)
                .map(|stack| u64::from(stack.count))
                .sum()
        })
    }

    /// Current contents regardless of the offline flag.
    #[must_use]
    pub fn contents(&self) -> Listing {
        self.lock().map_or_else(|_| Listing::new(), |slots| to_listing(&slots))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Option<ItemStack>>>> {
        self.slots.lock().map_err(|e| Error::OperationFailed {
            operation: "inventory_lock".to_string(),
            cause: e.to_string(),
        })
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::InventoryUnavailable(self.id.to_string()));
        }
        Ok(())
    }

    /// Removes up to `units` of `item` from `slot`.
    fn take(&self, slot: SlotIndex, item: &ItemTypeId, units: u32) -> Result<()> {
        let mut slots = self.lock()?;
        let Some(index) = slot_position(&slots, slot) else {
            return Ok(());
        };
        if let Some(stack) = slots[index].as_mut()
            && &stack.name == item
        {
            stack.count = stack.count.saturating_sub(units);
            if stack.count == 0 {
                slots[index] = None;
            }
        }
        drop(slots);
        Ok(())
    }
}

impl Inventory for InMemoryInventory {
    fn id(&self) -> &InventoryId {
        &self.id
    }

    fn list(&self) -> Result<Option<Listing>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        let slots = self.lock()?;
        Ok(Some(to_listing(&slots)))
    }

    fn push_items(&self, slot: SlotIndex, destination: &dyn Inventory) -> Result<u32> {
        self.ensure_online()?;
        if destination.id() == &self.id {
            return Ok(0);
        }

        // The lock is released before calling into the destination.
        let stack = {
            let slots = self.lock()?;
            slot_position(&slots, slot).and_then(|index| slots[index].clone())
        };
        let Some(stack) = stack else {
            return Ok(0);
        };

        let moved = destination.accept(&stack)?;
        if moved > 0 {
            self.take(slot, &stack.name, moved)?;
        }
        Ok(moved)
    }

    fn accept(&self, stack: &ItemStack) -> Result<u32> {
        self.ensure_online()?;
        let mut slots = self.lock()?;
        let mut remaining = stack.count;

        for existing in slots.iter_mut().flatten() {
            if remaining == 0 {
                break;
            }
            if existing.name == stack.name && existing.count < self.stack_limit {
                let room = (self.stack_limit - existing.count).min(remaining);
                existing.count += room;
                remaining -= room;
            }
        }

        for empty in slots.iter_mut().filter(|slot| slot.is_none()) {
            if remaining == 0 {
                break;
            }
            let placed = remaining.min(self.stack_limit);
            *empty = Some(ItemStack {
                name: stack.name.clone(),
                count: placed,
                label: stack.label.clone(),
            });
            remaining -= placed;
        }
        drop(slots);

        Ok(stack.count - remaining)
    }
}

fn slot_position(slots: &[Option<ItemStack>], slot: SlotIndex) -> Option<usize> {
    let index = usize::try_from(slot).ok()?.checked_sub(1)?;
    (index < slots.len()).then_some(index)
}

fn to_listing(slots: &[Option<ItemStack>]) -> Listing {
    slots
        .iter()
        .zip(1..)
        .filter_map(|(stack, slot)| stack.clone().map(|stack| (slot, stack)))
        .collect()
}
