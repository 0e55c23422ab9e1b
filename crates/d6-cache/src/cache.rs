//! Resource cache
//!
//! Keyed by normalized URL. The cache owns every entry's lifetime: waiters are
//! handed back to the caller on resolution (so no callback ever runs under the
//! cache lock) and resolved entries remove themselves once their TTL elapses.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::entry::{CacheEntry, EntryKind, Lookup, Waiter};
use crate::error::CacheError;
use crate::scheduler::Scheduler;
use crate::Result;

/// How long a resolved response stays cached when it names no TTL
pub const DEFAULT_TTL: Duration = Duration::from_millis(10_000);

struct Slot<V> {
    /// Distinguishes this entry from any later entry under the same key
    generation: u64,
    entry: CacheEntry<V>,
}

struct CacheState<V> {
    slots: HashMap<String, Slot<V>>,
    next_generation: u64,
}

pub struct ResourceCache<V> {
    state: Arc<Mutex<CacheState<V>>>,
    scheduler: Arc<dyn Scheduler>,
    default_ttl: Duration,
}

impl<V> ResourceCache<V>
where
    V: Clone + Send + 'static,
{
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_default_ttl(scheduler, DEFAULT_TTL)
    }

    pub fn with_default_ttl(scheduler: Arc<dyn Scheduler>, default_ttl: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState {
                slots: HashMap::new(),
                next_generation: 1,
            })),
            scheduler,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Snapshot the state of a key
    pub fn get(&self, url: &str) -> Lookup<V> {
        match self.state.lock().slots.get(url).map(|slot| &slot.entry) {
            None => Lookup::Absent,
            Some(CacheEntry::Pending { waiters }) => Lookup::Pending {
                waiting: waiters.len(),
            },
            Some(CacheEntry::Resolved { value, .. }) => Lookup::Resolved(value.clone()),
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.state.lock().slots.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// When a resolved entry is due to expire
    pub fn expires_at(&self, url: &str) -> Option<DateTime<Utc>> {
        match self.state.lock().slots.get(url).map(|slot| &slot.entry) {
            Some(CacheEntry::Resolved {
                ttl, resolved_at, ..
            }) => chrono::Duration::from_std(*ttl)
                .ok()
                .map(|ttl| *resolved_at + ttl),
            _ => None,
        }
    }

    /// Start a pending entry with its first waiter.
    ///
    /// Returns the generation the eventual `resolve` must present.
    pub fn begin_pending(&self, url: &str, waiter: Waiter<V>) -> Result<u64> {
        let mut state = self.state.lock();
        if state.slots.contains_key(url) {
            return Err(CacheError::Occupied(url.to_string()));
        }

        let generation = state.next_generation;
        state.next_generation += 1;
        state.slots.insert(
            url.to_string(),
            Slot {
                generation,
                entry: CacheEntry::Pending {
                    waiters: vec![waiter],
                },
            },
        );

        tracing::debug!(url = %url, generation, "Created callback queue");

        Ok(generation)
    }

    /// Subscribe to an in-flight entry. Returns the queue length.
    pub fn enqueue(&self, url: &str, waiter: Waiter<V>) -> Result<usize> {
        let mut state = self.state.lock();
        match state.slots.get_mut(url).map(|slot| &mut slot.entry) {
            Some(CacheEntry::Pending { waiters }) => {
                waiters.push(waiter);
                tracing::debug!(url = %url, waiting = waiters.len(), "Queued callback");
                Ok(waiters.len())
            }
            _ => Err(CacheError::NotPending(url.to_string())),
        }
    }

    /// Replace the pending entry created with `generation` by a resolved one.
    ///
    /// Returns the queued waiters in enqueue order; the caller runs each
    /// exactly once. Arms an expiry timer that only removes this exact entry.
    pub fn resolve(
        &self,
        url: &str,
        generation: u64,
        value: V,
        ttl: Option<Duration>,
    ) -> Result<Vec<Waiter<V>>> {
        let ttl = ttl.unwrap_or(self.default_ttl);

        let waiters = {
            let mut state = self.state.lock();
            let slot = match state.slots.get_mut(url) {
                Some(slot)
                    if slot.generation == generation
                        && slot.entry.kind() == EntryKind::Pending =>
                {
                    slot
                }
                _ => {
                    return Err(CacheError::Stale {
                        url: url.to_string(),
                        generation,
                    })
                }
            };

            let resolved = CacheEntry::Resolved {
                value,
                ttl,
                resolved_at: Utc::now(),
            };
            match std::mem::replace(&mut slot.entry, resolved) {
                CacheEntry::Pending { waiters } => waiters,
                CacheEntry::Resolved { .. } => Vec::new(),
            }
        };

        tracing::debug!(
            url = %url,
            generation,
            waiting = waiters.len(),
            ttl_ms = ttl.as_millis() as u64,
            "Resolved cache entry"
        );

        self.schedule_expiry(url, generation, ttl);

        Ok(waiters)
    }

    /// Remove an entry immediately. Waiters of a pending entry are dropped.
    pub fn evict(&self, url: &str) -> bool {
        let removed = self.state.lock().slots.remove(url).is_some();
        if removed {
            tracing::debug!(url = %url, "Evicted cache entry");
        }
        removed
    }

    fn schedule_expiry(&self, url: &str, generation: u64, ttl: Duration) {
        let state: Weak<Mutex<CacheState<V>>> = Arc::downgrade(&self.state);
        let url = url.to_string();

        self.scheduler.schedule(
            ttl,
            Box::new(move || {
                let Some(state) = state.upgrade() else {
                    return;
                };
                let mut state = state.lock();
                let expired = matches!(
                    state.slots.get(&url),
                    Some(Slot {
                        generation: g,
                        entry: CacheEntry::Resolved { .. },
                    }) if *g == generation
                );
                if expired {
                    state.slots.remove(&url);
                    tracing::debug!(url = %url, "Removed expired cache entry");
                }
            }),
        );
    }
}

impl<V> Clone for ResourceCache<V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            scheduler: Arc::clone(&self.scheduler),
            default_ttl: self.default_ttl,
        }
    }
}
