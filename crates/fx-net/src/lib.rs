//! fx Networking
//!
//! The network side of the hypermedia engine: the [`FetchHandler`]
//! seam the engine issues requests through, a scripted in-memory
//! handler for tests, a plain-HTTP handler for real traffic, and
//! abort plumbing for in-flight cancellation.

mod abort;
mod handler;
mod http;
mod request;
mod scripted;

pub use abort::{AbortController, AbortSignal};
pub use handler::FetchHandler;
pub use http::HttpFetch;
pub use request::{FetchRequest, FetchResponse, Method};
pub use scripted::ScriptedFetch;
pub use url::Url;

/// Network error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request's abort signal fired while it was in flight.
    #[error("request aborted")]
    Aborted,

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}
