//! Handle registry resolved from configuration.

use super::{HandleRegistry, Inventory, World};
use crate::config::SortConfig;
use crate::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// Registry with a fixed handle list.
///
/// Destination order is the configured order and never changes.
#[derive(Debug, Clone)]
pub struct ConfiguredRegistry {
    destinations: Vec<Arc<dyn Inventory>>,
    source_name: String,
    source: Option<Arc<dyn Inventory>>,
    fallback: Option<Arc<dyn Inventory>>,
}

impl ConfiguredRegistry {
    /// Creates a registry from already-acquired handles.
    #[must_use]
    pub fn new(
        destinations: Vec<Arc<dyn Inventory>>,
        source: Arc<dyn Inventory>,
        fallback: Option<Arc<dyn Inventory>>,
    ) -> Self {
        Self {
            destinations,
            source_name: source.id().to_string(),
            source: Some(source),
            fallback,
        }
    }

    /// Resolves the configured names against a simulated world.
    ///
    /// Unknown destinations and an unknown fallback are skipped with a
    /// warning, as is a fallback naming the source. A destination named more
    /// than once keeps its first position. The source and fallback are never
    /// used as destinations. An unknown source is reported later by
    /// [`HandleRegistry::source`].
    #[must_use]
    pub fn from_world(config: &SortConfig, world: &World) -> Self {
        let fallback_name = config.fallback.as_deref().filter(|name| {
            let same = *name == config.source;
            if same {
                tracing::warn!(inventory = %name, "Fallback is the source inventory, running without one");
            }
            !same
        });
        let mut destinations: Vec<Arc<dyn Inventory>> = Vec::new();
        let mut seen = HashSet::new();
        let mut missing = 0usize;

        for name in config.destinations.names() {
            if name == config.source || Some(name.as_str()) == fallback_name {
                continue;
            }
            if !seen.insert(name.clone()) {
                tracing::warn!(inventory = %name, "Destination listed more than once, keeping the first");
                continue;
            }
            match world.get(&name) {
                Some(inventory) => destinations.push(inventory),
                None => {
                    missing += 1;
                    tracing::warn!(inventory = %name, "Configured destination not found, skipping");
                },
            }
        }

        let fallback = fallback_name.and_then(|name| {
            let found = world.get(name).map(|inv| inv as Arc<dyn Inventory>);
            if found.is_none() {
                tracing::warn!(inventory = %name, "Configured fallback not found, running without one");
            }
            found
        });

        if destinations.is_empty() {
            tracing::warn!("No destination inventories found; everything routes to the fallback");
        } else {
            tracing::info!(
                destinations = destinations.len(),
                missing = missing,
                fallback = ?fallback_name,
                "Resolved destination inventories"
            );
        }

        Self {
            destinations,
            source_name: config.source.clone(),
            source: world.get(&config.source).map(|inv| inv as Arc<dyn Inventory>),
            fallback,
        }
    }
}

impl HandleRegistry for ConfiguredRegistry {
    fn destinations(&self) -> Vec<Arc<dyn Inventory>> {
        self.destinations.clone()
    }

    fn source(&self) -> Result<Arc<dyn Inventory>> {
        self.source
            .clone()
            .ok_or_else(|| Error::InventoryUnavailable(self.source_name.clone()))
    }

    fn fallback(&self) -> Option<Arc<dyn Inventory>> {
        self.fallback.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DestinationSelector;
    use crate::inventory::InMemoryInventory;

    fn world() -> World {
        let mut world = World::new();
        for name in ["barrel", "chest_0", "chest_1", "chest_3", "overflow"] {
            world.add(InMemoryInventory::new(name));
        }
        world
    }

    fn ids(registry: &ConfiguredRegistry) -> Vec<String> {
        registry
            .destinations()
            .iter()
            .map(|inv| inv.id().to_string())
            .collect()
    }

    #[test]
    fn test_range_resolution_keeps_order_and_skips_missing() {
        let config = SortConfig {
            source: "barrel".to_string(),
            fallback: Some("overflow".to_string()),
            destinations: DestinationSelector::Range {
                prefix: "chest_".to_string(),
                start: 0,
                end: 3,
            },
            ..SortConfig::default()
        };

        let registry = ConfiguredRegistry::from_world(&config, &world());
        assert_eq!(ids(&registry), vec!["chest_0", "chest_1", "chest_3"]);
        assert_eq!(registry.source().unwrap().id().as_str(), "barrel");
        assert_eq!(registry.fallback().unwrap().id().as_str(), "overflow");
    }

    #[test]
    fn test_source_and_fallback_are_not_destinations() {
        let config = SortConfig {
            source: "barrel".to_string(),
            fallback: Some("overflow".to_string()),
            destinations: DestinationSelector::List(vec![
                "overflow".to_string(),
                "chest_1".to_string(),
                "barrel".to_string(),
            ]),
            ..SortConfig::default()
        };

        let registry = ConfiguredRegistry::from_world(&config, &world());
        assert_eq!(ids(&registry), vec!["chest_1"]);
    }

    #[test]
    fn test_unknown_source_is_an_error() {
        let config = SortConfig {
            source: "nowhere".to_string(),
            ..SortConfig::default()
        };
        let registry = ConfiguredRegistry::from_world(&config, &world());
        let err = registry.source().unwrap_err();
        assert!(matches!(err, Error::InventoryUnavailable(name) if name == "nowhere"));
    }

    #[test]
    fn test_unknown_fallback_is_dropped() {
        let config = SortConfig {
            source: "barrel".to_string(),
            fallback: Some("void".to_string()),
            ..SortConfig::default()
        };
        let registry = ConfiguredRegistry::from_world(&config, &world());
        assert!(registry.fallback().is_none());
    }

    #[test]
    fn test_duplicate_destination_is_resolved_once() {
        let config = SortConfig {
            source: "barrel".to_string(),
            destinations: DestinationSelector::List(vec![
                "chest_1".to_string(),
                "chest_0".to_string(),
                "chest_1".to_string(),
            ]),
            ..SortConfig::default()
        };

        let registry = ConfiguredRegistry::from_world(&config, &world());
        assert_eq!(ids(&registry), vec!["chest_1", "chest_0"]);
    }

    #[tokio::test]
    async fn test_duplicate_destination_is_listed_once_per_cycle() {
        let world = world();
        let config = SortConfig {
            source: "barrel".to_string(),
            destinations: DestinationSelector::List(vec!["chest_1".to_string(); 2]),
            ..SortConfig::default()
        };

        let registry = ConfiguredRegistry::from_world(&config, &world);
        crate::services::SnapshotBuilder::new(4)
            .build(&registry.destinations())
            .await;
        assert_eq!(world.get("chest_1").unwrap().list_calls(), 1);
    }

    #[test]
    fn test_fallback_equal_to_source_is_dropped() {
        let config = SortConfig {
            source: "barrel".to_string(),
            fallback: Some("barrel".to_string()),
            destinations: DestinationSelector::List(vec!["chest_0".to_string()]),
            ..SortConfig::default()
        };
        let registry = ConfiguredRegistry::from_world(&config, &world());
        assert!(registry.fallback().is_none());
        assert_eq!(ids(&registry), vec!["chest_0"]);
    }
}
