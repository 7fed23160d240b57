//! The fetch seam.

use async_trait::async_trait;

use crate::{FetchError, FetchRequest, FetchResponse};

/// Issues requests on behalf of the engine.
///
/// Implementations are single-threaded; the engine drives them on a
/// local executor and races them against the request's abort signal,
/// so a handler parked on I/O can simply be dropped.
#[async_trait(?Send)]
pub trait FetchHandler {
    async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}
