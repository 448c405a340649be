//! Supervision registry clients

mod http;
mod memory;

pub use http::{DEFAULT_TIMEOUT, HttpRegistryClient};
pub use memory::{InMemoryRegistry, LoggedInteraction, RecordedRequest, RecordedResult};
