//! D6 Navigation
//!
//! Decides which page interactions become in-page loads:
//! 1. Same-domain left click → load
//! 2. Same-domain hover → prefetch
//! 3. Same-domain form submit → load with serialized fields
//! 4. History pop → reload the popped location
//!
//! Also owns URL normalization for the data-request marker and the
//! authoritative load state.

mod address;
mod error;
mod form;
mod history;
mod interaction;
mod load;

pub use address::{
    append_marker, cache_key, canonical_url, is_same_domain, remove_fragment, resolve_url,
    same_path, strip_data_marker, strip_markers, DATA_PARAM,
};
pub use error::NavigationError;
pub use form::{FieldKind, FieldValue, Form, FormField, FormMethod};
pub use history::HistoryAction;
pub use interaction::{
    Decision, IgnoreReason, Interaction, Interceptor, Link, LoadOptions, LoadRequest, MouseButton,
};
pub use load::{LoadState, LoadTicket, NavigationPhase};

pub type Result<T> = std::result::Result<T, NavigationError>;
