//! D6 Core
//!
//! Turns a server-rendered site into a single-page experience: same-domain
//! clicks, hovers and form submissions are answered with JSON data requests
//! and rendered in place through named views. Coordinates the cache, fetch,
//! navigation and render crates behind one [`Navigator`].

mod config;
mod error;
mod navigator;

pub use config::Config;
pub use error::CoreError;
pub use navigator::{Disposition, Navigator};

// Re-export component crates
pub use d6_cache::{CacheError, Lookup, ManualScheduler, ResourceCache, Scheduler, TokioScheduler};
pub use d6_fetch::{
    FetchError, FetchRequest, HttpTransport, QueuedTransport, RawResponse, ResponsePayload,
    Transport,
};
pub use d6_navigation::{
    Form, FormField, FormMethod, HistoryAction, IgnoreReason, Interaction, Link, LoadOptions,
    LoadState, LoadTicket, MouseButton, NavigationError, NavigationPhase,
};
pub use d6_render::{
    MemoryPage, Page, Region, RenderOutcome, ScriptExecutor, View, ViewRegistry,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
