//! Simulated world of named in-memory inventories.
//!
//! World files are TOML:
//!
//! ```toml
//! [[inventory]]
//! name = "minecraft:chest_0"
//! slots = 27
//! stack_limit = 64
//!
//! [[inventory.items]]
//! slot = 1
//! name = "minecraft:cobblestone"
//! count = 32
//! label = "Cobblestone"
//! ```

use super::memory::{DEFAULT_SLOT_COUNT, DEFAULT_STACK_LIMIT, MAX_SLOT_COUNT};
use super::{InMemoryInventory, Inventory};
use crate::models::{InventoryId, ItemStack, SlotIndex};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// World file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct WorldFile {
    /// Inventory definitions.
    #[serde(default)]
    pub inventory: Vec<WorldInventory>,
}

/// One inventory in a world file.
#[derive(Debug, Deserialize)]
pub struct WorldInventory {
    /// Peripheral name.
    pub name: String,
    /// Slot count.
    pub slots: Option<u32>,
    /// Units per slot.
    pub stack_limit: Option<u32>,
    /// Initial contents.
    #[serde(default)]
    pub items: Vec<WorldItem>,
}

/// One stack in a world file.
#[derive(Debug, Deserialize)]
pub struct WorldItem {
    /// Slot, starting at 1.
    pub slot: SlotIndex,
    /// Item type identifier.
    pub name: String,
    /// Units in the stack.
    pub count: u32,
    /// Display label.
    pub label: Option<String>,
}

/// Named collection of in-memory inventories.
#[derive(Debug, Default, Clone)]
pub struct World {
    inventories: HashMap<InventoryId, Arc<InMemoryInventory>>,
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an inventory, replacing any inventory with the same name.
    pub fn add(&mut self, inventory: InMemoryInventory) -> Arc<InMemoryInventory> {
        let inventory = Arc::new(inventory);
        self.inventories
            .insert(inventory.id().clone(), Arc::clone(&inventory));
        inventory
    }

    /// Looks up an inventory by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<InMemoryInventory>> {
        self.inventories.get(name).cloned()
    }

    /// Number of inventories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inventories.len()
    }

    /// Whether the world has no inventories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inventories.is_empty()
    }

    /// Loads a world from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if an inventory
    /// declares more than [`MAX_SLOT_COUNT`] slots, or if an item does not
    /// fit its inventory.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_world_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml(&contents)
    }

    /// Parses a world from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid world file.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: WorldFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_world_file".to_string(),
            cause: e.to_string(),
        })?;
        Self::from_world_file(file)
    }

    fn from_world_file(file: WorldFile) -> Result<Self> {
        let mut world = Self::new();
        for def in file.inventory {
            let slots = def.slots.unwrap_or(DEFAULT_SLOT_COUNT);
            if slots > MAX_SLOT_COUNT {
                return Err(Error::InvalidInput(format!(
                    "inventory '{}' declares {slots} slots, the limit is {MAX_SLOT_COUNT}",
                    def.name
                )));
            }
            let inventory = InMemoryInventory::with_geometry(
                def.name.as_str(),
                slots,
                def.stack_limit.unwrap_or(DEFAULT_STACK_LIMIT),
            );
            for item in def.items {
                let mut stack = ItemStack::new(item.name, item.count);
                stack.label = item.label;
                inventory.insert(item.slot, stack)?;
            }
            if world.get(&def.name).is_some() {
                return Err(Error::InvalidInput(format!(
                    "inventory '{}' is defined twice",
                    def.name
                )));
            }
            world.add(inventory);
        }
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: &str = r#"
        [[inventory]]
        name = "minecraft:barrel_0"
        slots = 9

        [[inventory.items]]
        slot = 1
        name = "minecraft:stone"
        count = 5
        label = "Stone"

        [[inventory]]
        name = "minecraft:chest_0"
        stack_limit = 16
    "#;

    #[test]
    fn test_world_from_toml() {
        let world = World::from_toml(WORLD).unwrap();
        assert_eq!(world.len(), 2);

        let barrel = world.get("minecraft:barrel_0").unwrap();
        let listing = barrel.contents();
        assert_eq!(listing[&1].display_name(), "Stone");
        assert!(world.get("minecraft:chest_0").is_some());
        assert!(world.get("minecraft:chest_1").is_none());
    }

    #[test]
    fn test_world_rejects_oversized_stack() {
        let text = r#"
            [[inventory]]
            name = "tiny"
            stack_limit = 4
            [[inventory.items]]
            slot = 1
            name = "minecraft:stone"
            count = 5
        "#;
        assert!(World::from_toml(text).is_err());
    }

    #[test]
    fn test_world_rejects_excessive_slot_count() {
        let text = r#"
            [[inventory]]
            name = "huge"
            slots = 4000000000
        "#;
        let err = World::from_toml(text).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().contains("4000000000 slots"));

        let at_limit = format!("[[inventory]]\nname = \"big\"\nslots = {MAX_SLOT_COUNT}\n");
        assert!(World::from_toml(&at_limit).is_ok());
    }

    #[test]
    fn test_world_rejects_duplicate_names() {
        let text = r#"
            [[inventory]]
            name = "a"
            [[inventory]]
            name = "a"
        "#;
        let err = World::from_toml(text).unwrap_err();
        assert!(err.to_string().contains("defined twice"));
    }

    #[test]
    fn test_world_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.toml");
        std::fs::write(&path, WORLD).unwrap();

        let world = World::load_from_file(&path).unwrap();
        assert!(!world.is_empty());
        assert!(World::load_from_file(&dir.path().join("missing.toml")).is_err());
    }
}
