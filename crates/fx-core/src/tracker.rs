//! In-flight request bookkeeping.
//!
//! Requests are tracked per element in a side table rather than on the
//! element itself, so tracking state never leaks into serialization
//! and survives nothing it should not.

use std::collections::HashMap;

use fx_dom::NodeId;

use crate::events::SharedConfig;

/// Side table of active requests, keyed by triggering element.
#[derive(Default)]
pub struct RequestTracker {
    active: HashMap<NodeId, Vec<SharedConfig>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests currently in flight for `element`.
    pub fn count(&self, element: NodeId) -> usize {
        self.active.get(&element).map_or(0, Vec::len)
    }

    /// All configs in flight for `element`, cloned for iteration while
    /// the table is borrowed elsewhere.
    pub fn snapshot(&self, element: NodeId) -> Vec<SharedConfig> {
        self.active.get(&element).cloned().unwrap_or_default()
    }

    pub fn add(&mut self, element: NodeId, cfg: SharedConfig) {
        self.active.entry(element).or_default().push(cfg);
        tracing::trace!(
            "tracking request on {:?} ({} active)",
            element,
            self.count(element)
        );
    }

    /// Removes one tracked config by identity. Empty entries are
    /// dropped so the table does not accumulate dead keys.
    pub fn remove(&mut self, element: NodeId, cfg: &SharedConfig) {
        if let Some(list) = self.active.get_mut(&element) {
            list.retain(|c| !std::rc::Rc::ptr_eq(c, cfg));
            if list.is_empty() {
                self.active.remove(&element);
            }
        }
    }

    /// Drop policy: a request whose drop counter is non-zero was
    /// configured while others were still in flight, and is discarded
    /// as long as something is still in flight now.
    pub fn should_drop(&self, element: NodeId, cfg: &SharedConfig) -> bool {
        cfg.borrow().drop > 0 && self.count(element) > 0
    }

    /// Total requests in flight across the document.
    pub fn total(&self) -> usize {
        self.active.values().map(Vec::len).sum()
    }
}
