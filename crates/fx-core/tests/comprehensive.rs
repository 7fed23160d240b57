//! End-to-end tests for the request lifecycle
//!
//! Drives complete documents through trigger, fetch, swap and the
//! event surface using the scripted fetch handler.

use std::cell::RefCell;
use std::rc::Rc;

use fx_core::{
    EventTarget, FireReport, Fx, FxOptions, FxPhase, Method, RequestOutcome, ScriptedFetch,
    TriggerEvent,
};

fn engine(html: &str) -> (Fx, Rc<ScriptedFetch>) {
    let fetch = Rc::new(ScriptedFetch::new());
    let doc = fx_core::html::parse_document(html);
    (Fx::new(doc, fetch.clone()), fetch)
}

fn record_at(fx: &Fx, target: EventTarget, phase: FxPhase, log: &Rc<RefCell<Vec<String>>>) {
    let log = Rc::clone(log);
    fx.on(target, phase, move |event| {
        log.borrow_mut().push(event.name().to_string());
    });
}

// ============================================================================
// END TO END
// ============================================================================

#[test]
fn test_form_post_end_to_end() {
    let (fx, fetch) = engine(
        "<form fx-action=\"/orders\" fx-method=\"post\" fx-target=\"#status\" fx-swap=\"innerHTML\">\
         <input name=\"item\" value=\"tea\">\
         <input name=\"qty\" value=\"2\">\
         <button name=\"op\" value=\"add\">Add</button>\
         </form>\
         <div id=\"status\">idle</div>",
    );
    fetch.respond_text(200, "<b>order placed</b>");

    let report = smol::block_on(async {
        fx.init().await;
        let form = fx.document().query_selector("form").unwrap();
        let submitter = fx.document().query_selector("button").unwrap();
        fx.fire(form, TriggerEvent::new("submit").with_submitter(submitter))
            .await
    });

    assert_eq!(report.outcomes, vec![RequestOutcome::Succeeded]);
    assert!(report.default_prevented, "native submission must be suppressed");

    let sent = fetch.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, Method::Post);
    assert_eq!(sent[0].url, "/orders");
    assert_eq!(sent[0].body.as_deref(), Some("item=tea&qty=2&op=add"));
    assert_eq!(sent[0].header("FX-Request"), Some("true"));
    assert_eq!(
        sent[0].header("Content-Type"),
        Some("application/x-www-form-urlencoded")
    );

    let status = fx.document().get_element_by_id("status").unwrap();
    assert_eq!(fx.document().inner_html(status), "<b>order placed</b>");
}

#[test]
fn test_get_form_folds_fields_into_query() {
    let (fx, fetch) = engine(
        "<form fx-action=\"/search\" fx-swap=\"innerHTML\">\
         <input name=\"q\" value=\"black tea\"></form>",
    );
    fetch.respond_text(200, "results");

    smol::block_on(async {
        fx.init().await;
        let form = fx.document().query_selector("form").unwrap();
        fx.fire(form, TriggerEvent::new("submit")).await
    });

    let sent = fetch.requests();
    assert_eq!(sent[0].method, Method::Get);
    assert_eq!(sent[0].url, "/search?q=black+tea");
    assert!(sent[0].body.is_none(), "a GET must never carry a body");
}

#[test]
fn test_default_headers_ride_every_request() {
    let fetch = Rc::new(ScriptedFetch::new());
    let doc = fx_core::html::parse_document("<button fx-action=\"/x\">Go</button>");
    let fx = Fx::with_options(
        doc,
        fetch.clone(),
        FxOptions::default().with_default_header("X-Client", "fx-test"),
    )
    .unwrap();

    smol::block_on(async {
        fx.init().await;
        let button = fx.document().query_selector("button").unwrap();
        fx.fire(button, TriggerEvent::new("click")).await
    });

    let sent = fetch.requests();
    assert_eq!(sent[0].header("X-Client"), Some("fx-test"));
    assert_eq!(sent[0].header("FX-Request"), Some("true"));
}

// ============================================================================
// LIFECYCLE EVENT ORDER
// ============================================================================

#[test]
fn test_success_path_event_order() {
    let (fx, fetch) = engine("<button fx-action=\"/x\" fx-swap=\"innerHTML\">Go</button>");
    fetch.respond_text(200, "done");

    let log = Rc::new(RefCell::new(Vec::new()));
    let button = fx.document().query_selector("button").unwrap();
    for phase in [
        FxPhase::Config,
        FxPhase::Before,
        FxPhase::After,
        FxPhase::Error,
        FxPhase::Finally,
    ] {
        record_at(&fx, EventTarget::Element(button), phase, &log);
    }
    record_at(&fx, EventTarget::Document, FxPhase::Swapped, &log);

    smol::block_on(async {
        fx.init().await;
        fx.fire(button, TriggerEvent::new("click")).await
    });

    assert_eq!(
        *log.borrow(),
        vec!["fx:config", "fx:before", "fx:after", "fx:swapped", "fx:finally"],
        "the success path should visit the phases in order, with no error"
    );
}

#[test]
fn test_failure_path_event_order() {
    let (fx, fetch) = engine("<button fx-action=\"/x\">Go</button>");
    fetch.fail_with(fx_core::FetchError::Network("connection refused".to_string()));

    let log = Rc::new(RefCell::new(Vec::new()));
    let button = fx.document().query_selector("button").unwrap();
    for phase in [
        FxPhase::Config,
        FxPhase::Before,
        FxPhase::After,
        FxPhase::Error,
        FxPhase::Finally,
    ] {
        record_at(&fx, EventTarget::Element(button), phase, &log);
    }
    record_at(&fx, EventTarget::Document, FxPhase::Swapped, &log);

    let report = smol::block_on(async {
        fx.init().await;
        fx.fire(button, TriggerEvent::new("click")).await
    });

    assert_eq!(report.outcomes, vec![RequestOutcome::Failed]);
    assert_eq!(
        *log.borrow(),
        vec!["fx:config", "fx:before", "fx:error", "fx:finally"],
        "a failed fetch should skip after and swapped but still finalize"
    );
}

#[test]
fn test_swapped_fires_at_document_after_element_is_gone() {
    // outerHTML replaces the trigger element itself; document-level
    // dispatch is what keeps the event observable.
    let (fx, fetch) = engine("<button fx-action=\"/x\">Go</button>");
    fetch.respond_text(200, "<div id=\"fresh\">new</div>");

    let swapped = Rc::new(RefCell::new(Vec::new()));
    record_at(&fx, EventTarget::Document, FxPhase::Swapped, &swapped);

    smol::block_on(async {
        fx.init().await;
        let button = fx.document().query_selector("button").unwrap();
        fx.fire(button, TriggerEvent::new("click")).await
    });

    assert_eq!(*swapped.borrow(), vec!["fx:swapped"]);
    assert!(fx.document().query_selector("button").is_none(), "the button is gone");
    assert!(fx.document().get_element_by_id("fresh").is_some());
}

#[test]
fn test_before_detail_includes_the_new_request() {
    let (fx, fetch) = engine("<button fx-action=\"/x\" fx-swap=\"innerHTML\">Go</button>");
    fetch.respond_text(200, "ok");

    let counts = Rc::new(RefCell::new(Vec::new()));
    let button = fx.document().query_selector("button").unwrap();

    let seen = Rc::clone(&counts);
    fx.on(EventTarget::Element(button), FxPhase::Config, move |event| {
        if let fx_core::FxDetail::Config { requests, .. } = &event.detail {
            seen.borrow_mut().push(("config", requests.len()));
        }
    });
    let seen = Rc::clone(&counts);
    fx.on(EventTarget::Element(button), FxPhase::Before, move |event| {
        if let fx_core::FxDetail::Before { requests, .. } = &event.detail {
            seen.borrow_mut().push(("before", requests.len()));
        }
    });

    smol::block_on(async {
        fx.init().await;
        fx.fire(button, TriggerEvent::new("click")).await
    });

    assert_eq!(
        *counts.borrow(),
        vec![("config", 0), ("before", 1)],
        "config sees prior requests only, before includes the new one"
    );
}

// ============================================================================
// SWAP STRATEGIES
// ============================================================================

#[test]
fn test_inner_html_round_trips_response_text() {
    let (fx, fetch) = engine(
        "<button fx-action=\"/x\" fx-target=\"#out\" fx-swap=\"innerHTML\">Go</button>\
         <div id=\"out\"><p>old</p></div>",
    );
    let payload = "<ul><li>one</li><li>two</li></ul>";
    fetch.respond_text(200, payload);

    smol::block_on(async {
        fx.init().await;
        let button = fx.document().query_selector("button").unwrap();
        fx.fire(button, TriggerEvent::new("click")).await
    });

    let out = fx.document().get_element_by_id("out").unwrap();
    assert_eq!(fx.document().inner_html(out), payload);
}

#[test]
fn test_outer_html_loses_element_identity() {
    let (fx, fetch) = engine(
        "<section><div id=\"card\" fx-action=\"/x\">old</div></section>",
    );
    fetch.respond_text(200, "<div id=\"card\">new</div>");

    let (old_id, new_id) = smol::block_on(async {
        fx.init().await;
        let old_id = fx.document().get_element_by_id("card").unwrap();
        fx.fire(old_id, TriggerEvent::new("click")).await;
        (old_id, fx.document().get_element_by_id("card").unwrap())
    });

    assert_ne!(old_id, new_id, "the swapped-in card is a different node");
    assert!(!fx.document().contains(old_id), "the old node is detached");
    assert_eq!(fx.document().text_content(new_id), "new");
}

#[test]
fn test_positional_swap_appends() {
    let (fx, fetch) = engine(
        "<button fx-action=\"/more\" fx-target=\"#list\" fx-swap=\"beforeend\">More</button>\
         <ul id=\"list\"><li>one</li></ul>",
    );
    fetch.respond_text(200, "<li>two</li>");

    smol::block_on(async {
        fx.init().await;
        let button = fx.document().query_selector("button").unwrap();
        fx.fire(button, TriggerEvent::new("click")).await
    });

    let list = fx.document().get_element_by_id("list").unwrap();
    assert_eq!(fx.document().inner_html(list), "<li>one</li><li>two</li>");
}

#[test]
fn test_dotted_swap_writes_nested_property() {
    let (fx, fetch) = engine("<div id=\"d\" fx-action=\"/v\" fx-swap=\"dataset.value\"></div>");
    fetch.respond_text(200, "42");

    smol::block_on(async {
        fx.init().await;
        let div = fx.document().get_element_by_id("d").unwrap();
        fx.fire(div, TriggerEvent::new("click")).await
    });

    let div = fx.document().get_element_by_id("d").unwrap();
    assert_eq!(
        fx.document().property_text(div, "dataset.value"),
        Some("42"),
        "the nested path should exist with the response text"
    );
}

// ============================================================================
// SCANNING AND LATE CONTENT
// ============================================================================

#[test]
fn test_swapped_in_markup_is_scanned_and_live() {
    let (fx, fetch) = engine(
        "<button fx-action=\"/panel\" fx-target=\"#out\" fx-swap=\"innerHTML\">Open</button>\
         <div id=\"out\"></div>",
    );
    fetch.respond_text(200, "<a fx-action=\"/detail\" fx-swap=\"innerHTML\">More</a>");
    fetch.respond_text(200, "detail text");

    smol::block_on(async {
        fx.init().await;
        let button = fx.document().query_selector("button").unwrap();
        fx.fire(button, TriggerEvent::new("click")).await;

        // The swapped-in link was scanned by the watcher and is live.
        let link = fx.document().query_selector("a").unwrap();
        fx.fire(link, TriggerEvent::new("click")).await
    });

    assert_eq!(fetch.request_count(), 2);
    assert_eq!(fetch.requests()[1].url, "/detail");
    let link = fx.document().query_selector("a").unwrap();
    assert_eq!(fx.document().text_content(link), "detail text");
}

#[test]
fn test_ready_trigger_chains_through_swapped_content() {
    let (fx, fetch) = engine("<div id=\"host\" fx-action=\"/step1\" fx-trigger=\"fx:inited\" fx-swap=\"innerHTML\"></div>");
    fetch.respond_text(
        200,
        "<p fx-action=\"/step2\" fx-trigger=\"fx:inited\" fx-swap=\"innerHTML\">loading</p>",
    );
    fetch.respond_text(200, "finished");

    smol::block_on(fx.init());

    assert_eq!(fetch.request_count(), 2, "both ready triggers should have fired");
    assert_eq!(fetch.requests()[0].url, "/step1");
    assert_eq!(fetch.requests()[1].url, "/step2");
    let p = fx.document().query_selector("p").unwrap();
    assert_eq!(fx.document().text_content(p), "finished");
}

#[test]
fn test_process_event_rescans_subtree() {
    let (fx, fetch) = engine("<div id=\"host\"></div>");
    fetch.respond_text(200, "hi");

    smol::block_on(async {
        fx.init().await;

        // Markup added behind the engine's back, then explicitly processed.
        {
            let mut doc = fx.document_mut();
            doc.disconnect();
            let host = doc.get_element_by_id("host").unwrap();
            let nodes =
                fx_core::html::parse_fragment(&mut doc, "<button fx-action=\"/x\" fx-swap=\"innerHTML\">Go</button>");
            for node in nodes {
                doc.append_child(host, node).unwrap();
            }
        }

        let host = fx.document().get_element_by_id("host").unwrap();
        let report = fx.fire(host, TriggerEvent::new("fx:process")).await;
        assert!(report.outcomes.is_empty(), "process runs no requests by itself");

        let button = fx.document().query_selector("button").unwrap();
        fx.fire(button, TriggerEvent::new("click")).await
    });

    assert_eq!(fetch.request_count(), 1);
    let button = fx.document().query_selector("button").unwrap();
    assert_eq!(fx.document().text_content(button), "hi");
}

// ============================================================================
// TRANSITION MECHANISMS
// ============================================================================

#[test]
fn test_fade_mechanism_wraps_the_swap() {
    let fetch = Rc::new(ScriptedFetch::new());
    let doc = fx_core::html::parse_document(
        "<button fx-action=\"/x\" fx-swap=\"innerHTML\">Go</button>",
    );
    let fx = Fx::with_options(doc, fetch.clone(), FxOptions::default().with_mechanism("fade"))
        .unwrap();
    fetch.respond_text(200, "faded in");

    let report: FireReport = smol::block_on(async {
        fx.init().await;
        let button = fx.document().query_selector("button").unwrap();
        fx.fire(button, TriggerEvent::new("click")).await
    });

    assert_eq!(report.outcomes, vec![RequestOutcome::Succeeded]);
    let button = fx.document().query_selector("button").unwrap();
    assert_eq!(fx.document().text_content(button), "faded in");
}
