//! Abort plumbing.
//!
//! Single-threaded counterpart of the browser's AbortController and
//! AbortSignal pair: the controller flips a shared flag, the signal
//! exposes it both as a check and as a future the engine races
//! against the fetch.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Debug, Default)]
struct AbortState {
    aborted: Cell<bool>,
    wakers: RefCell<Vec<Waker>>,
}

/// Flips the shared abort flag and wakes anything waiting on it.
#[derive(Debug, Clone, Default)]
pub struct AbortController {
    state: Rc<AbortState>,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal tied to this controller.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            state: Rc::clone(&self.state),
        }
    }

    /// Aborts: the flag latches and all pending waiters wake.
    /// Idempotent.
    pub fn abort(&self) {
        if self.state.aborted.replace(true) {
            return;
        }
        tracing::debug!("abort signal fired");
        for waker in self.state.wakers.borrow_mut().drain(..) {
            waker.wake();
        }
    }
}

/// Read side of an [`AbortController`].
#[derive(Debug, Clone)]
pub struct AbortSignal {
    state: Rc<AbortState>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        self.state.aborted.get()
    }

    /// A future that resolves once the controller aborts.
    pub fn aborted(&self) -> Aborted {
        Aborted {
            state: Rc::clone(&self.state),
        }
    }
}

/// Future returned by [`AbortSignal::aborted`].
#[derive(Debug)]
pub struct Aborted {
    state: Rc<AbortState>,
}

impl Future for Aborted {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.state.aborted.get() {
            return Poll::Ready(());
        }
        let mut wakers = self.state.wakers.borrow_mut();
        if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
            wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
