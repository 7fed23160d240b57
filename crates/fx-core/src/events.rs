//! Lifecycle events and the listener registry.
//!
//! Nine phases, all dispatched as cancelable events with a typed
//! payload. `config` and `before` are the only phases whose
//! cancellation changes the executor's path; the rest carry
//! information outward.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use fx_dom::NodeId;

use crate::config::RequestConfig;
use crate::engine::FxOptions;
use crate::error::FxError;

/// Event name prefix for every lifecycle event.
pub const EVENT_PREFIX: &str = "fx:";

/// A request config shared between the executor, the tracker and
/// event listeners for one invocation.
pub type SharedConfig = Rc<RefCell<RequestConfig>>;

/// The nine lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FxPhase {
    Init,
    Inited,
    Process,
    Config,
    Before,
    After,
    Error,
    Finally,
    Swapped,
}

impl FxPhase {
    /// Full event name, prefix included.
    pub fn event_name(self) -> &'static str {
        match self {
            FxPhase::Init => "fx:init",
            FxPhase::Inited => "fx:inited",
            FxPhase::Process => "fx:process",
            FxPhase::Config => "fx:config",
            FxPhase::Before => "fx:before",
            FxPhase::After => "fx:after",
            FxPhase::Error => "fx:error",
            FxPhase::Finally => "fx:finally",
            FxPhase::Swapped => "fx:swapped",
        }
    }

    /// Reverse of [`FxPhase::event_name`].
    pub fn from_event_name(name: &str) -> Option<FxPhase> {
        match name {
            "fx:init" => Some(FxPhase::Init),
            "fx:inited" => Some(FxPhase::Inited),
            "fx:process" => Some(FxPhase::Process),
            "fx:config" => Some(FxPhase::Config),
            "fx:before" => Some(FxPhase::Before),
            "fx:after" => Some(FxPhase::After),
            "fx:error" => Some(FxPhase::Error),
            "fx:finally" => Some(FxPhase::Finally),
            "fx:swapped" => Some(FxPhase::Swapped),
            _ => None,
        }
    }
}

impl fmt::Display for FxPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Where an event is aimed: a specific element or the document root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Document,
    Element(NodeId),
}

/// The host event that starts a request: a name, an optional
/// submitter (for multi-button forms), and a default-action flag the
/// engine may set.
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    name: String,
    submitter: Option<NodeId>,
    default_prevented: bool,
}

impl TriggerEvent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            submitter: None,
            default_prevented: false,
        }
    }

    pub fn with_submitter(mut self, submitter: NodeId) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn submitter(&self) -> Option<NodeId> {
        self.submitter
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether the host should suppress the native default action.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Typed payload carried by each phase.
#[derive(Debug, Clone)]
pub enum FxDetail {
    Init {
        options: FxOptions,
    },
    Inited,
    Process,
    Config {
        cfg: SharedConfig,
        requests: Vec<SharedConfig>,
    },
    Before {
        cfg: SharedConfig,
        requests: Vec<SharedConfig>,
    },
    After {
        cfg: SharedConfig,
    },
    Error {
        cfg: SharedConfig,
        error: FxError,
    },
    Finally {
        cfg: SharedConfig,
    },
    Swapped {
        cfg: SharedConfig,
    },
}

/// One dispatched lifecycle event.
///
/// Listeners receive it mutably: `prevent_default` is how `config`
/// and `before` are vetoed, and the shared config in the detail is
/// how per-request state is adjusted.
#[derive(Debug)]
pub struct FxEvent {
    phase: FxPhase,
    target: EventTarget,
    pub detail: FxDetail,
    bubbles: bool,
    default_prevented: bool,
}

impl FxEvent {
    pub(crate) fn new(phase: FxPhase, target: EventTarget, detail: FxDetail, bubbles: bool) -> Self {
        Self {
            phase,
            target,
            detail,
            bubbles,
            default_prevented: false,
        }
    }

    pub fn phase(&self) -> FxPhase {
        self.phase
    }

    /// Full event name, e.g. `"fx:before"`.
    pub fn name(&self) -> &'static str {
        self.phase.event_name()
    }

    /// The original dispatch target, stable while the event bubbles.
    pub fn target(&self) -> EventTarget {
        self.target
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Every lifecycle event is cancelable.
    pub fn cancelable(&self) -> bool {
        true
    }

    /// Lifecycle events cross shadow boundaries on browser hosts.
    pub fn composed(&self) -> bool {
        true
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// The request config riding on this event, if the phase has one.
    pub fn config(&self) -> Option<SharedConfig> {
        match &self.detail {
            FxDetail::Config { cfg, .. }
            | FxDetail::Before { cfg, .. }
            | FxDetail::After { cfg }
            | FxDetail::Error { cfg, .. }
            | FxDetail::Finally { cfg }
            | FxDetail::Swapped { cfg } => Some(Rc::clone(cfg)),
            _ => None,
        }
    }
}

/// Identifies one registered listener for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A registered listener. Receives the event mutably so it can veto.
pub type ListenerFn = dyn Fn(&mut FxEvent);

/// Listener registry: the engine's stand-in for the host's event
/// plumbing. Listeners attach to a target + phase pair and see every
/// matching event, whether aimed there or bubbling through.
#[derive(Default)]
pub struct EventGateway {
    listeners: HashMap<(EventTarget, FxPhase), Vec<(ListenerId, Rc<ListenerFn>)>>,
    next_id: u64,
}

impl EventGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, target: EventTarget, phase: FxPhase, listener: Rc<ListenerFn>) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners
            .entry((target, phase))
            .or_default()
            .push((id, listener));
        id
    }

    /// Removes a listener. Returns whether it was present.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        for bucket in self.listeners.values_mut() {
            let before = bucket.len();
            bucket.retain(|(lid, _)| *lid != id);
            removed |= bucket.len() != before;
        }
        removed
    }

    /// Listeners for one hop of the dispatch path, cloned out so
    /// handlers may register or remove listeners re-entrantly.
    pub(crate) fn matching(&self, target: EventTarget, phase: FxPhase) -> Vec<Rc<ListenerFn>> {
        self.listeners
            .get(&(target, phase))
            .map(|bucket| bucket.iter().map(|(_, f)| Rc::clone(f)).collect())
            .unwrap_or_default()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names_round_trip() {
        for phase in [
            FxPhase::Init,
            FxPhase::Inited,
            FxPhase::Process,
            FxPhase::Config,
            FxPhase::Before,
            FxPhase::After,
            FxPhase::Error,
            FxPhase::Finally,
            FxPhase::Swapped,
        ] {
            let name = phase.event_name();
            assert!(name.starts_with(EVENT_PREFIX));
            assert_eq!(FxPhase::from_event_name(name), Some(phase));
        }
        assert_eq!(FxPhase::from_event_name("fx:unknown"), None);
        assert_eq!(FxPhase::from_event_name("init"), None);
    }

    #[test]
    fn test_gateway_on_off() {
        let mut gateway = EventGateway::new();
        let id = gateway.on(EventTarget::Document, FxPhase::Init, Rc::new(|_| {}));
        assert_eq!(gateway.listener_count(), 1);
        assert_eq!(gateway.matching(EventTarget::Document, FxPhase::Init).len(), 1);
        assert!(gateway.matching(EventTarget::Document, FxPhase::Inited).is_empty());
        assert!(gateway.off(id));
        assert!(!gateway.off(id));
        assert_eq!(gateway.listener_count(), 0);
    }

    #[test]
    fn test_listeners_kept_per_target() {
        let mut gateway = EventGateway::new();
        let el = EventTarget::Element(fx_dom::Document::new().root());
        gateway.on(el, FxPhase::Config, Rc::new(|_| {}));
        gateway.on(EventTarget::Document, FxPhase::Config, Rc::new(|_| {}));
        assert_eq!(gateway.matching(el, FxPhase::Config).len(), 1);
        assert_eq!(gateway.matching(EventTarget::Document, FxPhase::Config).len(), 1);
    }

    #[test]
    fn test_event_veto() {
        let mut event = FxEvent::new(
            FxPhase::Config,
            EventTarget::Document,
            FxDetail::Process,
            true,
        );
        assert!(event.cancelable());
        assert!(!event.default_prevented());
        event.prevent_default();
        assert!(event.default_prevented());
    }

    #[test]
    fn test_trigger_event_accessors() {
        let mut event = TriggerEvent::new("submit");
        assert_eq!(event.name(), "submit");
        assert_eq!(event.submitter(), None);
        assert!(!event.default_prevented());
        event.prevent_default();
        assert!(event.default_prevented());
    }
}
