//! Example: declarative markup driving scripted requests

use std::rc::Rc;

use fx_core::{Fx, FxOptions, ScriptedFetch, TriggerEvent};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // A scripted handler stands in for a real server
    let fetch = Rc::new(ScriptedFetch::new());
    fetch.respond_text(200, "<li>Earl Grey</li><li>Sencha</li>");
    fetch.respond_text(200, "<li>Gyokuro</li>");

    let doc = fx_core::html::parse_document(
        "<h1>Tea shelf</h1>\
         <button id=\"load\" fx-action=\"/teas\" fx-target=\"#shelf\" fx-swap=\"innerHTML\">Load</button>\
         <button id=\"more\" fx-action=\"/teas/more\" fx-target=\"#shelf\" fx-swap=\"beforeend\">More</button>\
         <ul id=\"shelf\"></ul>",
    );
    let fx = Fx::with_options(doc, fetch, FxOptions::default().with_mechanism("fade"))?;

    println!("fx v{} ready", fx_core::VERSION);

    smol::block_on(async {
        fx.init().await;

        let load = fx.document().get_element_by_id("load").unwrap();
        let report = fx.fire(load, TriggerEvent::new("click")).await;
        println!("load finished: {:?}", report.outcomes);

        let more = fx.document().get_element_by_id("more").unwrap();
        let report = fx.fire(more, TriggerEvent::new("click")).await;
        println!("more finished: {:?}", report.outcomes);
    });

    let shelf = fx.document().get_element_by_id("shelf").unwrap();
    println!("shelf now holds: {}", fx.document().inner_html(shelf));
    Ok(())
}
