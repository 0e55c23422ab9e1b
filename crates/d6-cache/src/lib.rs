//! D6 Resource Cache
//!
//! Collapses concurrent loads of the same URL into a single network request
//! and keeps resolved responses around for a short time so a prefetch can be
//! consumed by a later click.
//!
//! Each key is in exactly one state:
//! - Absent: nothing cached, nothing in flight
//! - Pending: a request is in flight, waiters are queued in arrival order
//! - Resolved: a response is cached until its TTL elapses or it is evicted

mod cache;
mod entry;
mod error;
mod scheduler;

pub use cache::{ResourceCache, DEFAULT_TTL};
pub use entry::{EntryKind, Lookup, Waiter};
pub use error::CacheError;
pub use scheduler::{ManualScheduler, Scheduler, Task, TokioScheduler};

pub type Result<T> = std::result::Result<T, CacheError>;
