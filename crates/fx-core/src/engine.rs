//! The engine.
//!
//! `Fx` owns the document, the listener registry, the request tracker
//! and the scanner state, and exposes the whole lifecycle: `init`
//! scans the tree, `fire` delivers a trigger event, listeners steer
//! each request through its phases. Single-threaded; every await
//! point releases all borrows first.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use fx_dom::{Document, NodeId};
use fx_net::FetchHandler;

use crate::error::FxError;
use crate::events::{
    EventGateway, EventTarget, FxDetail, FxEvent, FxPhase, ListenerId, SharedConfig, TriggerEvent,
};
use crate::executor::{self, RequestOutcome};
use crate::mechanism::{MechanismRegistry, SwapMechanism};
use crate::process::{self, ProcessState};
use crate::tracker::RequestTracker;

/// Engine options, also carried on every `init` event.
#[derive(Debug, Clone)]
pub struct FxOptions {
    /// Watch the document for inserted subtrees and scan them as they
    /// arrive.
    pub observe: bool,
    /// Headers appended to every request after the engine's own.
    pub default_headers: Vec<(String, String)>,
    /// Name of a registered mechanism to wrap every swap with.
    pub mechanism: Option<String>,
}

impl Default for FxOptions {
    fn default() -> Self {
        Self {
            observe: true,
            default_headers: Vec::new(),
            mechanism: None,
        }
    }
}

impl FxOptions {
    pub fn with_observe(mut self, observe: bool) -> Self {
        self.observe = observe;
        self
    }

    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_mechanism(mut self, name: &str) -> Self {
        self.mechanism = Some(name.to_string());
        self
    }
}

/// What one `fire` call did: whether the host should suppress the
/// native default action, and how each matched request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireReport {
    pub default_prevented: bool,
    pub outcomes: Vec<RequestOutcome>,
}

/// The hypermedia engine for one document.
pub struct Fx {
    pub(crate) document: RefCell<Document>,
    pub(crate) gateway: RefCell<EventGateway>,
    pub(crate) tracker: RefCell<RequestTracker>,
    pub(crate) state: RefCell<ProcessState>,
    pub(crate) fetch: Rc<dyn FetchHandler>,
    pub(crate) mechanisms: RefCell<MechanismRegistry>,
    pub(crate) default_mechanism: Option<Rc<dyn SwapMechanism>>,
    pub(crate) options: FxOptions,
    initialized: Cell<bool>,
}

impl Fx {
    pub fn new(document: Document, fetch: Rc<dyn FetchHandler>) -> Self {
        Self::assemble(
            document,
            fetch,
            FxOptions::default(),
            MechanismRegistry::new(),
            None,
        )
    }

    /// Fails if the options name a mechanism the registry does not
    /// have.
    pub fn with_options(
        document: Document,
        fetch: Rc<dyn FetchHandler>,
        options: FxOptions,
    ) -> Result<Self, FxError> {
        let registry = MechanismRegistry::new();
        let default_mechanism = match &options.mechanism {
            Some(name) => Some(
                registry
                    .get(name)
                    .ok_or_else(|| FxError::UnknownMechanism(name.clone()))?,
            ),
            None => None,
        };
        Ok(Self::assemble(
            document,
            fetch,
            options,
            registry,
            default_mechanism,
        ))
    }

    fn assemble(
        document: Document,
        fetch: Rc<dyn FetchHandler>,
        options: FxOptions,
        mechanisms: MechanismRegistry,
        default_mechanism: Option<Rc<dyn SwapMechanism>>,
    ) -> Self {
        Self {
            document: RefCell::new(document),
            gateway: RefCell::new(EventGateway::new()),
            tracker: RefCell::new(RequestTracker::new()),
            state: RefCell::new(ProcessState::default()),
            fetch,
            mechanisms: RefCell::new(mechanisms),
            default_mechanism,
            options,
            initialized: Cell::new(false),
        }
    }

    /// Scans the whole document and starts the mutation watcher.
    ///
    /// Dispatches `init` at the document first; a veto leaves the
    /// engine cold. Ends with a bubbling `inited` at the document once
    /// the subtree is live. Calling it again is a no-op.
    pub async fn init(&self) {
        if self.initialized.replace(true) {
            return;
        }
        let allowed = self.dispatch(
            EventTarget::Document,
            FxPhase::Init,
            FxDetail::Init {
                options: self.options.clone(),
            },
            true,
        );
        if !allowed {
            tracing::debug!("engine init vetoed");
            self.initialized.set(false);
            return;
        }

        if self.options.observe {
            self.document.borrow_mut().observe_children();
        }
        let root = self.document.borrow().root();
        let pending = process::scan(self, root);
        process::run_self_triggers(self, pending).await;
        process::poll_mutations(self).await;

        self.dispatch(EventTarget::Document, FxPhase::Inited, FxDetail::Inited, true);
        tracing::info!(
            "engine initialized, {} elements bound",
            self.state.borrow().bound_count()
        );
    }

    /// Stops the mutation watcher and marks the engine cold again.
    /// Processed marks survive, so a later `init` will not re-fire
    /// ready triggers on elements it already bound.
    pub fn destroy(&self) {
        self.document.borrow_mut().disconnect();
        self.initialized.set(false);
        tracing::info!("engine destroyed");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Delivers a trigger event at `target`, bubbling it to every
    /// bound ancestor whose trigger name matches. Runs each matched
    /// request to its terminal state, then drains mutation records so
    /// swapped-in markup gets scanned.
    ///
    /// Firing the process event name instead re-scans the subtree
    /// under `target` without running any request.
    pub async fn fire(&self, target: NodeId, event: TriggerEvent) -> FireReport {
        let mut event = event;
        if event.name() == FxPhase::Process.event_name() {
            self.process(target).await;
            return FireReport {
                default_prevented: event.default_prevented(),
                outcomes: Vec::new(),
            };
        }

        let mut outcomes = Vec::new();
        for element in self.event_chain(target) {
            let bound = {
                let state = self.state.borrow();
                state.trigger_of(element) == Some(event.name())
            };
            if !bound {
                continue;
            }
            if self.document.borrow().is_disabled(element) {
                tracing::debug!("trigger on disabled {:?} ignored", element);
                continue;
            }
            outcomes.push(executor::run_request(self, element, &mut event).await);
        }
        process::poll_mutations(self).await;

        FireReport {
            default_prevented: event.default_prevented(),
            outcomes,
        }
    }

    /// Re-scans the subtree under `element`, initializing
    /// action-bearing markup that arrived since the last pass.
    /// Dispatches the process event at the element first so listeners
    /// see the pass happen.
    pub async fn process(&self, element: NodeId) {
        self.dispatch(
            EventTarget::Element(element),
            FxPhase::Process,
            FxDetail::Process,
            true,
        );
        let pending = process::scan(self, element);
        process::run_self_triggers(self, pending).await;
        process::poll_mutations(self).await;
    }

    /// Drains pending insertion records and scans each added subtree.
    /// Useful after mutating the document through [`Fx::document_mut`]
    /// without going through `fire`.
    pub async fn poll_mutations(&self) {
        process::poll_mutations(self).await;
    }

    /// Cancels the in-flight requests of `element` only; siblings keep
    /// running.
    pub fn abort(&self, element: NodeId) {
        let snapshot = self.tracker.borrow().snapshot(element);
        for cfg in &snapshot {
            cfg.borrow().abort();
        }
        if !snapshot.is_empty() {
            tracing::debug!("aborted {} request(s) on {:?}", snapshot.len(), element);
        }
    }

    /// The configs currently in flight for `element`.
    pub fn requests(&self, element: NodeId) -> Vec<SharedConfig> {
        self.tracker.borrow().snapshot(element)
    }

    pub fn on(
        &self,
        target: EventTarget,
        phase: FxPhase,
        listener: impl Fn(&mut FxEvent) + 'static,
    ) -> ListenerId {
        self.gateway.borrow_mut().on(target, phase, Rc::new(listener))
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.gateway.borrow_mut().off(id)
    }

    pub fn register_mechanism(&self, name: &str, mechanism: Rc<dyn SwapMechanism>) {
        self.mechanisms.borrow_mut().register(name, mechanism);
    }

    pub fn mechanism(&self, name: &str) -> Option<Rc<dyn SwapMechanism>> {
        self.mechanisms.borrow().get(name)
    }

    /// Read access to the document. Do not hold the guard across
    /// `fire` or `init`.
    pub fn document(&self) -> Ref<'_, Document> {
        self.document.borrow()
    }

    /// Write access to the document. Insertions made through this
    /// guard are picked up by the watcher on the next `fire`.
    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.document.borrow_mut()
    }

    /// Synchronous single dispatch of one lifecycle event. Returns
    /// `false` if any listener on the path called `prevent_default`.
    pub(crate) fn dispatch(
        &self,
        target: EventTarget,
        phase: FxPhase,
        detail: FxDetail,
        bubbles: bool,
    ) -> bool {
        let path = self.dispatch_path(target, bubbles);
        let mut event = FxEvent::new(phase, target, detail, bubbles);
        for hop in path {
            let listeners = self.gateway.borrow().matching(hop, phase);
            for listener in listeners {
                listener(&mut event);
            }
        }
        !event.default_prevented()
    }

    /// Bubble path for a dispatch: the target, its element ancestors,
    /// and the document itself only when the chain is attached.
    fn dispatch_path(&self, target: EventTarget, bubbles: bool) -> Vec<EventTarget> {
        let EventTarget::Element(id) = target else {
            return vec![EventTarget::Document];
        };
        let mut path = vec![target];
        if !bubbles {
            return path;
        }
        let doc = self.document.borrow();
        let root = doc.root();
        let mut reached_root = false;
        let mut cur = doc.parent(id);
        while let Some(node) = cur {
            if node == root {
                reached_root = true;
            } else if doc.is_element(node) {
                path.push(EventTarget::Element(node));
            }
            cur = doc.parent(node);
        }
        if reached_root {
            path.push(EventTarget::Document);
        }
        path
    }

    /// Trigger delivery path: the target and all its ancestors,
    /// innermost first.
    fn event_chain(&self, target: NodeId) -> Vec<NodeId> {
        let doc = self.document.borrow();
        let mut chain = vec![target];
        let mut cur = doc.parent(target);
        while let Some(node) = cur {
            chain.push(node);
            cur = doc.parent(node);
        }
        chain
    }
}
