//! fx
//!
//! A headless hypermedia engine: declarative attributes on markup are
//! wired to network requests, and responses are applied back to the
//! document through a small set of swap strategies. The whole request
//! lifecycle is steered by cancelable events.
//!
//! # Example
//! ```rust,ignore
//! use std::rc::Rc;
//! use fx_core::{Fx, HttpFetch};
//!
//! let doc = fx_core::html::parse_document(
//!     "<button fx-action=\"/greet\" fx-target=\"#out\" fx-swap=\"innerHTML\">Go</button>\
//!      <div id=\"out\"></div>",
//! );
//! let fx = Fx::new(doc, Rc::new(HttpFetch::new()));
//! smol::block_on(async {
//!     fx.init().await;
//!     let button = fx.document().query_selector("button").unwrap();
//!     fx.fire(button, fx_core::TriggerEvent::new("click")).await;
//! });
//! ```

mod attributes;
mod config;
mod engine;
mod error;
mod events;
mod executor;
mod mechanism;
mod process;
mod swap;
mod tracker;
mod trigger;

pub use attributes::{
    ParsedAttributes, FX_ACTION, FX_IGNORE, FX_METHOD, FX_SWAP, FX_TARGET, FX_TRIGGER,
};
pub use config::{ConfirmHook, FormBody, RequestConfig, FX_REQUEST_HEADER};
pub use engine::{FireReport, Fx, FxOptions};
pub use error::FxError;
pub use events::{
    EventGateway, EventTarget, FxDetail, FxEvent, FxPhase, ListenerFn, ListenerId, SharedConfig,
    TriggerEvent, EVENT_PREFIX,
};
pub use executor::RequestOutcome;
pub use mechanism::{
    FadeMechanism, ImmediateMechanism, MechanismRegistry, SwapMechanism, SwapOp,
};
pub use swap::{SwapFn, SwapStrategy};
pub use tracker::RequestTracker;
pub use trigger::{default_trigger, trigger_for};

// Re-export collaborator crates for host integration
pub use fx_dom as dom;
pub use fx_html as html;
pub use fx_net as net;

pub use fx_dom::{Document, DomError, InsertPosition, NodeId};
pub use fx_net::{
    FetchError, FetchHandler, FetchRequest, FetchResponse, HttpFetch, Method, ScriptedFetch,
};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
