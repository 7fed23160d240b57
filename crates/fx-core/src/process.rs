//! Element discovery and initialization.
//!
//! `scan` walks a subtree for action-bearing elements and runs the
//! per-element init sequence on each one it has not seen before.
//! Processed marks and trigger bindings live in side tables keyed by
//! node identity, never on the nodes themselves. The mutation watcher
//! re-scans subtrees the document reports as newly inserted, so
//! swapped-in markup participates without another explicit call.

use std::collections::{HashMap, HashSet};

use fx_dom::NodeId;

use crate::attributes::FX_ACTION;
use crate::engine::Fx;
use crate::events::{EventTarget, FxDetail, FxPhase, TriggerEvent};
use crate::executor;
use crate::trigger;

const ACTION_SELECTOR: &str = "[fx-action]";
const IGNORE_SELECTOR: &str = "[fx-ignore]";

/// What one initialized element listens for.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub trigger: String,
}

/// Side tables for the scanner: which elements are already live and
/// what trigger each one is bound to.
#[derive(Default)]
pub(crate) struct ProcessState {
    processed: HashSet<NodeId>,
    bindings: HashMap<NodeId, Binding>,
}

impl ProcessState {
    pub(crate) fn is_processed(&self, element: NodeId) -> bool {
        self.processed.contains(&element)
    }

    pub(crate) fn trigger_of(&self, element: NodeId) -> Option<&str> {
        self.bindings.get(&element).map(|b| b.trigger.as_str())
    }

    pub(crate) fn bound_count(&self) -> usize {
        self.bindings.len()
    }
}

/// Walks `root` and its descendants, initializing every unprocessed
/// action-bearing element outside ignored subtrees. Returns elements
/// bound to the ready-event trigger, which self-fire once.
pub(crate) fn scan(fx: &Fx, root: NodeId) -> Vec<NodeId> {
    let candidates: Vec<NodeId> = {
        let doc = fx.document.borrow();
        let mut list = Vec::new();
        if doc.is_element(root) && doc.has_attribute(root, FX_ACTION) {
            list.push(root);
        }
        list.extend(doc.query_selector_all(root, ACTION_SELECTOR));
        // Ignore is inherited: a marker anywhere up the chain excludes
        // the whole subtree.
        list.retain(|&el| doc.closest(el, IGNORE_SELECTOR).is_none());
        list
    };

    let mut pending = Vec::new();
    for element in candidates {
        if let Some(trigger) = init_element(fx, element) {
            if trigger == FxPhase::Inited.event_name() {
                pending.push(element);
            }
        }
    }
    pending
}

/// The per-element init sequence. Re-running it on a processed
/// element is a no-op; a vetoed init leaves the element unprocessed
/// so a later pass may retry it.
pub(crate) fn init_element(fx: &Fx, element: NodeId) -> Option<String> {
    if fx.state.borrow().is_processed(element) {
        return None;
    }

    let allowed = fx.dispatch(
        EventTarget::Element(element),
        FxPhase::Init,
        FxDetail::Init {
            options: fx.options.clone(),
        },
        true,
    );
    if !allowed {
        tracing::debug!("init of {:?} vetoed", element);
        return None;
    }

    let trigger = {
        let doc = fx.document.borrow();
        trigger::trigger_for(&doc, element)
    };

    {
        let mut state = fx.state.borrow_mut();
        state.processed.insert(element);
        state.bindings.insert(
            element,
            Binding {
                trigger: trigger.clone(),
            },
        );
    }

    // Per-element readiness does not bubble; only the subtree-wide
    // completion signal from the engine does.
    fx.dispatch(
        EventTarget::Element(element),
        FxPhase::Inited,
        FxDetail::Inited,
        false,
    );
    tracing::debug!("initialized {:?} with trigger {:?}", element, trigger);
    Some(trigger)
}

/// Fires the one-shot ready trigger on each freshly bound element.
/// The processed mark is the loop guard: a swapped-in copy scans as a
/// new node and fires once, while the original never re-fires.
pub(crate) async fn run_self_triggers(fx: &Fx, elements: Vec<NodeId>) {
    for element in elements {
        let mut event = TriggerEvent::new(FxPhase::Inited.event_name());
        let outcome = executor::run_request(fx, element, &mut event).await;
        tracing::trace!("ready trigger on {:?} finished as {:?}", element, outcome);
    }
}

/// Drains insertion records and scans each added subtree, repeating
/// until the document reports quiet. Requests fired by freshly
/// scanned elements can insert more markup, hence the loop.
pub(crate) async fn poll_mutations(fx: &Fx) {
    loop {
        let records = fx.document.borrow_mut().take_mutations();
        if records.is_empty() {
            break;
        }
        let mut pending = Vec::new();
        for record in records {
            for added in record.added {
                pending.extend(scan(fx, added));
            }
        }
        run_self_triggers(fx, pending).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use fx_net::ScriptedFetch;

    fn engine(html: &str) -> (Fx, Rc<ScriptedFetch>) {
        let fetch = Rc::new(ScriptedFetch::new());
        let doc = fx_html::parse_document(html);
        (Fx::new(doc, fetch.clone()), fetch)
    }

    #[test]
    fn test_scan_is_idempotent() {
        let (fx, _) = engine("<button fx-action=\"/x\">Go</button>");
        let button = fx.document.borrow().query_selector("button").unwrap();

        let initeds = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&initeds);
        fx.on(EventTarget::Element(button), FxPhase::Inited, move |_| {
            seen.set(seen.get() + 1);
        });

        let root = fx.document.borrow().root();
        scan(&fx, root);
        scan(&fx, root);
        assert_eq!(initeds.get(), 1, "re-scanning must not re-init");
        assert_eq!(fx.state.borrow().trigger_of(button), Some("click"));
    }

    #[test]
    fn test_element_inited_does_not_bubble() {
        let (fx, _) = engine("<button fx-action=\"/x\">Go</button>");
        let at_document = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&at_document);
        fx.on(EventTarget::Document, FxPhase::Inited, move |_| {
            seen.set(seen.get() + 1);
        });

        let root = fx.document.borrow().root();
        scan(&fx, root);
        assert_eq!(
            at_document.get(),
            0,
            "per-element readiness must not reach document listeners"
        );
    }

    #[test]
    fn test_ignore_marker_excludes_whole_subtree() {
        let (fx, _) = engine(
            "<div fx-ignore><button fx-action=\"/a\">A</button></div>\
             <button fx-action=\"/b\">B</button>",
        );
        let root = fx.document.borrow().root();
        scan(&fx, root);

        let state = fx.state.borrow();
        let ignored = fx.document.borrow().query_selector("[fx-action=/a]").unwrap();
        let live = fx.document.borrow().query_selector("[fx-action=/b]").unwrap();
        assert!(!state.is_processed(ignored), "ignore is inherited");
        assert!(state.is_processed(live));
    }

    #[test]
    fn test_init_veto_leaves_element_eligible() {
        let (fx, _) = engine("<button fx-action=\"/x\">Go</button>");
        let button = fx.document.borrow().query_selector("button").unwrap();

        let veto_once = Cell::new(true);
        fx.on(EventTarget::Element(button), FxPhase::Init, move |event| {
            if veto_once.replace(false) {
                event.prevent_default();
            }
        });

        let root = fx.document.borrow().root();
        scan(&fx, root);
        assert!(
            !fx.state.borrow().is_processed(button),
            "a vetoed init must not mark the element processed"
        );

        scan(&fx, root);
        assert!(
            fx.state.borrow().is_processed(button),
            "a later pass should pick the element up"
        );
    }

    #[test]
    fn test_ready_trigger_fires_once() {
        let (fx, fetch) = engine(
            "<div fx-action=\"/load\" fx-trigger=\"fx:inited\" fx-swap=\"innerHTML\"></div>",
        );
        fetch.respond_text(200, "loaded");

        smol::block_on(async {
            fx.init().await;
            assert_eq!(fetch.request_count(), 1, "the ready trigger should fire on init");

            let div = fx.document.borrow().query_selector("div").unwrap();
            fx.fire(div, TriggerEvent::new("fx:process")).await;
            assert_eq!(fetch.request_count(), 1, "a re-scan must not re-fire it");
        });
    }

    #[test]
    fn test_watcher_scans_inserted_markup() {
        let (fx, _) = engine("<div id=\"host\"></div>");
        smol::block_on(fx.init());

        let late = {
            let mut doc = fx.document_mut();
            let host = doc.get_element_by_id("host").unwrap();
            let nodes = fx_html::parse_fragment(&mut doc, "<button fx-action=\"/late\">Late</button>");
            for node in &nodes {
                doc.append_child(host, *node).unwrap();
            }
            nodes[0]
        };
        assert!(
            !fx.state.borrow().is_processed(late),
            "nothing should be scanned until the engine runs again"
        );

        let host = fx.document.borrow().get_element_by_id("host").unwrap();
        smol::block_on(fx.fire(host, TriggerEvent::new("click")));
        assert_eq!(
            fx.state.borrow().trigger_of(late),
            Some("click"),
            "the watcher should have scanned the inserted subtree"
        );
    }
}
