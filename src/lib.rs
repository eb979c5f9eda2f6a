//! # Stacksort
//!
//! Autonomous sorting loop for rooms full of homogeneous storage containers.
//!
//! There is no catalog of where things belong: an item type belongs in whichever
//! destination inventory already holds that type. Every cycle the sorter
//! snapshots the destinations, indexes the item types they hold, and pushes each
//! stack from the source inventory into the first destination that matches.
//! Unmatched stacks go to an optional fallback inventory.
//!
//! ## Layout
//!
//! - [`inventory`]: the collaborator seams ([`Inventory`], [`HandleRegistry`]) and
//!   an in-memory backend used by the simulator and the tests
//! - [`services`]: snapshot builder, routing engine, move executor, cycle driver
//! - [`observability`]: logging, metrics and outcome sinks
//!
//! ## Example
//!
//! ```rust,ignore
//! use stacksort::services::{CycleDriver, DriverSettings};
//!
//! let driver = CycleDriver::new(registry, DriverSettings::default(), sink)?;
//! let report = driver.run_cycle(1).await;
//! println!("moved {} units", report.units_moved);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod inventory;
pub mod models;
pub mod observability;
pub mod services;

pub use config::{DestinationSelector, SortConfig};
pub use inventory::{ConfiguredRegistry, HandleRegistry, InMemoryInventory, Inventory, World};
pub use models::{
    Decision, EventMeta, InventoryId, ItemStack, ItemTypeId, Listing, OutcomeEvent, OutcomeKind,
    Route, SkipReason, SlotIndex,
};
pub use observability::{EventBus, FanoutSink, OutcomeSink, TracingSink};
pub use services::{
    CycleDriver, CycleReport, DriverSettings, MoveExecutor, MoveOutcome, SnapshotBuilder,
    TypeIndex, route,
};

/// Error type for stacksort operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed world files, bad CLI values |
/// | `OperationFailed` | I/O errors, logging or metrics initialization fails |
/// | `InventoryUnavailable` | An inventory handle cannot be listed or reached |
/// | `Config` | Configuration is unreadable or inconsistent |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// An inventory could not be reached.
    ///
    /// Raised when:
    /// - The configured source inventory does not exist (fatal at startup)
    /// - A simulated inventory is offline
    #[error("inventory unavailable: {0}")]
    InventoryUnavailable(String),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for stacksort operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
