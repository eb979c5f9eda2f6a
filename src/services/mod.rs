//! Sorting services.
//!
//! Data flows strictly downward each cycle:
//! [`SnapshotBuilder`] → [`route`] → [`MoveExecutor`], orchestrated by
//! [`CycleDriver`].

mod cycle;
mod mover;
mod routing;
mod snapshot;

pub use cycle::{CycleDriver, CycleReport, DriverSettings};
pub use mover::{MoveExecutor, MoveOutcome};
pub use routing::route;
pub use snapshot::{SnapshotBuilder, TypeIndex};
