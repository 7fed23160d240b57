//! Scripted fetch handler for tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;

use crate::{FetchError, FetchHandler, FetchRequest, FetchResponse};

/// An in-memory [`FetchHandler`] that replays queued responses and
/// records every request it sees.
///
/// With a gate installed, each `send` parks until the test releases
/// it, which makes in-flight states reachable deterministically.
#[derive(Default)]
pub struct ScriptedFetch {
    script: RefCell<VecDeque<Result<FetchResponse, FetchError>>>,
    log: RefCell<Vec<FetchRequest>>,
    gate: RefCell<Option<smol::channel::Receiver<()>>>,
}

impl ScriptedFetch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a full response.
    pub fn respond_with(&self, response: FetchResponse) {
        self.script.borrow_mut().push_back(Ok(response));
    }

    /// Queues a text response.
    pub fn respond_text(&self, status: u16, body: &str) {
        self.respond_with(FetchResponse::with_text(status, body));
    }

    /// Queues a failure.
    pub fn fail_with(&self, error: FetchError) {
        self.script.borrow_mut().push_back(Err(error));
    }

    /// Installs a gate: every subsequent `send` waits for one message
    /// on the returned sender before answering.
    pub fn gate(&self) -> smol::channel::Sender<()> {
        let (tx, rx) = smol::channel::bounded(16);
        *self.gate.borrow_mut() = Some(rx);
        tx
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.log.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.log.borrow().len()
    }
}

#[async_trait(?Send)]
impl FetchHandler for ScriptedFetch {
    async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        tracing::debug!("scripted fetch: {} {}", request.method, request.url);
        self.log.borrow_mut().push(request);
        let gate = self.gate.borrow().clone();
        if let Some(rx) = gate {
            // Sender dropped means the test is done holding requests.
            let _ = rx.recv().await;
        }
        match self.script.borrow_mut().pop_front() {
            Some(result) => result,
            None => Ok(FetchResponse::with_text(200, "")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_in_order() {
        smol::block_on(async {
            let fetch = ScriptedFetch::new();
            fetch.respond_text(200, "first");
            fetch.respond_text(500, "second");

            let r1 = fetch.send(FetchRequest::get("/a")).await.unwrap();
            let r2 = fetch.send(FetchRequest::get("/b")).await.unwrap();
            assert_eq!(r1.text().unwrap(), "first");
            assert_eq!(r2.status, 500);
        });
    }

    #[test]
    fn test_default_response_when_script_empty() {
        smol::block_on(async {
            let fetch = ScriptedFetch::new();
            let r = fetch.send(FetchRequest::get("/")).await.unwrap();
            assert_eq!(r.status, 200);
            assert_eq!(r.text().unwrap(), "");
        });
    }

    #[test]
    fn test_failures_replay() {
        smol::block_on(async {
            let fetch = ScriptedFetch::new();
            fetch.fail_with(FetchError::Network("refused".into()));
            let err = fetch.send(FetchRequest::get("/")).await.unwrap_err();
            assert_eq!(err, FetchError::Network("refused".into()));
        });
    }

    #[test]
    fn test_gate_holds_requests() {
        smol::block_on(async {
            let fetch = ScriptedFetch::new();
            fetch.respond_text(200, "late");
            let gate = fetch.gate();

            let mut fut = Box::pin(fetch.send(FetchRequest::get("/")));
            assert!(smol::future::poll_once(fut.as_mut()).await.is_none());
            assert_eq!(fetch.request_count(), 1, "request logged before gating");

            gate.send(()).await.unwrap();
            let resp = fut.await.unwrap();
            assert_eq!(resp.text().unwrap(), "late");
        });
    }
}
