//! The request executor.
//!
//! One triggered request walks a fixed set of states. `config` and
//! `before` listeners can veto, the tracker can drop, a confirm hook
//! can decline, and everything after tracking begins funnels through
//! `finalize` so `finally` fires exactly once.

use std::rc::Rc;

use fx_dom::NodeId;
use fx_net::{FetchError, FetchRequest};

use crate::config::build_config;
use crate::engine::Fx;
use crate::error::FxError;
use crate::events::{EventTarget, FxDetail, FxPhase, SharedConfig, TriggerEvent};
use crate::swap;

/// Terminal state of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A `config` listener cancelled the request.
    Vetoed,
    /// The drop policy discarded it while another request was in flight.
    Dropped,
    /// The confirm hook answered no.
    Declined,
    /// A `before` listener cancelled it after tracking began.
    BeforeVetoed,
    /// The response was received; the swap ran unless `after` skipped it.
    Succeeded,
    /// The fetch or the swap failed and `error` was dispatched.
    Failed,
    /// The abort signal fired; no `error` event was dispatched.
    Aborted,
}

/// Drives one request for `element` from trigger to terminal state.
pub(crate) async fn run_request(
    fx: &Fx,
    element: NodeId,
    trigger: &mut TriggerEvent,
) -> RequestOutcome {
    let cfg: SharedConfig = {
        let doc = fx.document.borrow();
        let mut cfg = build_config(
            &doc,
            element,
            trigger,
            Rc::clone(&fx.fetch),
            fx.default_mechanism.clone(),
            &fx.options.default_headers,
        );
        cfg.drop = fx.tracker.borrow().count(element);
        Rc::new(std::cell::RefCell::new(cfg))
    };

    let pending = fx.tracker.borrow().snapshot(element);
    let config_ok = fx.dispatch(
        EventTarget::Element(element),
        FxPhase::Config,
        FxDetail::Config {
            cfg: Rc::clone(&cfg),
            requests: pending,
        },
        true,
    );
    if !config_ok {
        // A listener may clear prevent_trigger to let the native
        // default action proceed despite the veto.
        if cfg.borrow().prevent_trigger {
            trigger.prevent_default();
        }
        tracing::debug!("request on {:?} vetoed at config", element);
        return RequestOutcome::Vetoed;
    }

    if fx.tracker.borrow().should_drop(element, &cfg) {
        tracing::debug!(
            "request on {:?} dropped, {} already in flight",
            element,
            cfg.borrow().drop
        );
        return RequestOutcome::Dropped;
    }

    let confirm = cfg.borrow().confirm.clone();
    if let Some(hook) = confirm {
        if !hook.confirm().await {
            tracing::debug!("request on {:?} declined", element);
            return RequestOutcome::Declined;
        }
    }

    fx.tracker.borrow_mut().add(element, Rc::clone(&cfg));
    let pending = fx.tracker.borrow().snapshot(element);
    let before_ok = fx.dispatch(
        EventTarget::Element(element),
        FxPhase::Before,
        FxDetail::Before {
            cfg: Rc::clone(&cfg),
            requests: pending,
        },
        true,
    );
    if !before_ok {
        tracing::debug!("request on {:?} vetoed at before", element);
        finalize(fx, element, &cfg);
        return RequestOutcome::BeforeVetoed;
    }

    // The request owns the interaction from here on.
    trigger.prevent_default();
    let outcome = perform(fx, element, &cfg).await;
    finalize(fx, element, &cfg);
    outcome
}

/// The in-flight leg: issue the fetch, race it against the abort
/// signal, then hand the response to the success path.
async fn perform(fx: &Fx, element: NodeId, cfg: &SharedConfig) -> RequestOutcome {
    let (request, fetch, signal) = {
        let cfg = cfg.borrow();
        let mut request = FetchRequest::new(cfg.method, &cfg.action);
        for (name, value) in &cfg.headers {
            request = request.with_header(name, value);
        }
        if let Some(body) = &cfg.body {
            request = request.with_body(&body.encode());
        }
        tracing::debug!("issuing {} {}", cfg.method, cfg.action);
        (request, Rc::clone(&cfg.fetch), cfg.signal())
    };

    let cancelled = async {
        signal.aborted().await;
        Err(FetchError::Aborted)
    };
    let result = smol::future::or(fetch.send(request), cancelled).await;

    match result {
        Ok(response) => {
            let text = response.text();
            cfg.borrow_mut().response = Some(response);
            match text {
                Ok(text) => {
                    cfg.borrow_mut().text = Some(text);
                    succeed(fx, element, cfg).await
                }
                Err(err) => fail(fx, element, cfg, FxError::from(err)),
            }
        }
        // An aborted request is not a reportable error.
        Err(FetchError::Aborted) => {
            tracing::debug!("request on {:?} aborted", element);
            RequestOutcome::Aborted
        }
        Err(err) if cfg.borrow().signal().is_aborted() => {
            tracing::debug!("request on {:?} aborted, handler said {}", element, err);
            RequestOutcome::Aborted
        }
        Err(err) => fail(fx, element, cfg, FxError::from(err)),
    }
}

/// Success path: `after` can skip the swap; a swap failure becomes a
/// reported error; `swapped` fires at the document root so listeners
/// survive the original element being swapped away.
async fn succeed(fx: &Fx, element: NodeId, cfg: &SharedConfig) -> RequestOutcome {
    let after_ok = fx.dispatch(
        EventTarget::Element(element),
        FxPhase::After,
        FxDetail::After { cfg: Rc::clone(cfg) },
        true,
    );
    if !after_ok {
        tracing::debug!("swap on {:?} skipped by after listener", element);
        return RequestOutcome::Succeeded;
    }

    match swap::apply_swap(&fx.document, cfg).await {
        Ok(()) => {
            fx.dispatch(
                EventTarget::Document,
                FxPhase::Swapped,
                FxDetail::Swapped { cfg: Rc::clone(cfg) },
                true,
            );
            RequestOutcome::Succeeded
        }
        Err(err) => fail(fx, element, cfg, err),
    }
}

fn fail(fx: &Fx, element: NodeId, cfg: &SharedConfig, error: FxError) -> RequestOutcome {
    tracing::warn!("request on {:?} failed: {}", element, error);
    cfg.borrow_mut().error = Some(error.clone());
    fx.dispatch(
        EventTarget::Element(element),
        FxPhase::Error,
        FxDetail::Error {
            cfg: Rc::clone(cfg),
            error,
        },
        true,
    );
    RequestOutcome::Failed
}

/// Runs for every terminal path reached after tracking began.
fn finalize(fx: &Fx, element: NodeId, cfg: &SharedConfig) {
    fx.tracker.borrow_mut().remove(element, cfg);
    fx.dispatch(
        EventTarget::Element(element),
        FxPhase::Finally,
        FxDetail::Finally { cfg: Rc::clone(cfg) },
        true,
    );
}
