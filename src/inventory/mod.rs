//! Inventory handles.
//!
//! The sorter only ever reads through these seams; it never creates or
//! destroys the containers behind them.

mod memory;
mod registry;
mod traits;
mod world;

pub use memory::{DEFAULT_SLOT_COUNT, DEFAULT_STACK_LIMIT, InMemoryInventory, MAX_SLOT_COUNT};
pub use registry::ConfiguredRegistry;
pub use traits::{HandleRegistry, Inventory};
pub use world::{World, WorldFile, WorldInventory, WorldItem};
