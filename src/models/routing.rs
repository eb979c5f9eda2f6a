//! Routing decisions.

use super::SlotIndex;
use std::fmt;

/// Where one source slot should go this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Source slot the decision applies to.
    pub slot: SlotIndex,
    /// The chosen route.
    pub route: Route,
}

/// Routing target for a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// First destination (by position in the configured order) holding the type.
    Matched(usize),
    /// No destination holds the type; divert to the fallback inventory.
    Fallback,
    /// Leave the stack in the source this cycle.
    Skip(SkipReason),
}

/// Why a stack is left in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The stack's item type identifier is empty or unreadable.
    UnreadableIdentifier,
    /// Nothing matched and no fallback is configured.
    NoFallback,
}

impl SkipReason {
    /// Returns the reason as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnreadableIdentifier => "unreadable identifier",
            Self::NoFallback => "no fallback",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
