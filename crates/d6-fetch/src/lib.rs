//! D6 Fetch Gateway
//!
//! Issues data requests (URL tagged with `d6=1`, GET without a body, POST
//! with one) and hands every outcome to a single completion callback as a
//! decoded [`ResponsePayload`]. Network failures, error statuses and
//! undecodable bodies all arrive through that same path.

mod error;
mod gateway;
mod payload;
mod request;
mod transport;

pub use error::FetchError;
pub use gateway::FetchGateway;
pub use payload::{ResponsePayload, TTL_FIELD, URL_FIELD, VIEW_FIELD};
pub use request::{FetchRequest, Method, RawResponse};
pub use transport::{Completion, HttpTransport, QueuedTransport, Transport};

pub type Result<T> = std::result::Result<T, FetchError>;
