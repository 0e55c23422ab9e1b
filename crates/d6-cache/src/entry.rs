//! Cache entry state machine
//!
//! ```text
//! Absent
//!   ↓ begin_pending
//! Pending
//!   ↓ resolve
//! Resolved
//!   ↓ ttl elapsed / evict
//! Absent
//! ```

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Callback waiting for a pending entry to resolve.
pub type Waiter<V> = Box<dyn FnOnce(&V) + Send + 'static>;

pub(crate) enum CacheEntry<V> {
    /// A request is in flight; waiters run in enqueue order on resolution
    Pending { waiters: Vec<Waiter<V>> },
    /// A response arrived and is kept until its TTL elapses
    Resolved {
        value: V,
        ttl: Duration,
        resolved_at: DateTime<Utc>,
    },
}

impl<V> CacheEntry<V> {
    pub(crate) fn kind(&self) -> EntryKind {
        match self {
            CacheEntry::Pending { .. } => EntryKind::Pending,
            CacheEntry::Resolved { .. } => EntryKind::Resolved,
        }
    }
}

/// Snapshot of a cache key, as returned by `ResourceCache::get`.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<V> {
    Absent,
    Pending { waiting: usize },
    Resolved(V),
}

impl<V> Lookup<V> {
    pub fn kind(&self) -> EntryKind {
        match self {
            Lookup::Absent => EntryKind::Absent,
            Lookup::Pending { .. } => EntryKind::Pending,
            Lookup::Resolved(_) => EntryKind::Resolved,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Lookup::Absent)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Lookup::Pending { .. })
    }

    pub fn resolved(self) -> Option<V> {
        match self {
            Lookup::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Absent,
    Pending,
    Resolved,
}

impl EntryKind {
    /// Check if the cache may move a key from this state to `target`
    pub fn can_transition_to(&self, target: EntryKind) -> bool {
        matches!(
            (self, target),
            (EntryKind::Absent, EntryKind::Pending)
                | (EntryKind::Pending, EntryKind::Resolved)
                | (EntryKind::Pending, EntryKind::Absent)
                | (EntryKind::Resolved, EntryKind::Absent)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Absent => "absent",
            EntryKind::Pending => "pending",
            EntryKind::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
