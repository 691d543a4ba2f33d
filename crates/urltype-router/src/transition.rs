//! Transition identity tokens.
//!
//! Every navigation receives a fresh [`TransitionId`] from a shared
//! [`TransitionTracker`]. Starting a transition supersedes all earlier ones;
//! results of a superseded transition are discarded when they settle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one navigation transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionId(u64);

impl TransitionId {
    /// Wraps a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out transition ids and remembers which one is current.
#[derive(Debug, Default)]
pub struct TransitionTracker {
    current: AtomicU64,
}

impl TransitionTracker {
    /// Creates a tracker with no transition started.
    pub const fn new() -> Self {
        Self {
            current: AtomicU64::new(0),
        }
    }

    /// Starts a new transition, superseding the current one.
    pub fn begin(&self) -> TransitionId {
        TransitionId(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Returns the most recently started transition, if any.
    pub fn current(&self) -> Option<TransitionId> {
        match self.current.load(Ordering::SeqCst) {
            0 => None,
            id => Some(TransitionId(id)),
        }
    }

    /// Returns `true` if no transition started after `id`.
    pub fn is_current(&self, id: TransitionId) -> bool {
        self.current.load(Ordering::SeqCst) == id.0
    }
}
