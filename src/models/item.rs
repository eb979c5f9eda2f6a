//! Inventory identities, item types and stacks.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Index of a slot inside one inventory's listing.
pub type SlotIndex = u32;

/// Occupied slots of one inventory, keyed by slot index.
///
/// Empty slots never appear in a listing.
pub type Listing = BTreeMap<SlotIndex, ItemStack>;

/// Stable identity of an inventory (its peripheral name or address).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryId(String);

impl InventoryId {
    /// Creates a new inventory ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InventoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for InventoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for InventoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for InventoryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Item type identifier, e.g. `minecraft:cobblestone`.
///
/// This is the only key used for matching.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemTypeId(String);

impl ItemTypeId {
    /// Creates a new item type ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier carries anything usable for matching.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for ItemTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemTypeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemTypeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for ItemTypeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A stack of identical items occupying one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item type identifier.
    pub name: ItemTypeId,
    /// Number of units in the stack.
    pub count: u32,
    /// Human-readable label, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ItemStack {
    /// Creates a stack without a display label.
    #[must_use]
    pub fn new(name: impl Into<ItemTypeId>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
            label: None,
        }
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the label if present, otherwise the type identifier.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.name.as_str())
    }
}
