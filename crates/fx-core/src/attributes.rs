//! Attribute surface: the `fx-*` markup vocabulary.

use fx_dom::{Document, NodeId};
use fx_net::Method;

use crate::swap::SwapStrategy;
use crate::trigger;

pub const FX_ACTION: &str = "fx-action";
pub const FX_METHOD: &str = "fx-method";
pub const FX_TARGET: &str = "fx-target";
pub const FX_SWAP: &str = "fx-swap";
pub const FX_TRIGGER: &str = "fx-trigger";
pub const FX_IGNORE: &str = "fx-ignore";

/// Static per-element configuration read from markup, with defaults
/// applied. Never fails: missing or invalid attributes resolve to
/// their defaults.
#[derive(Debug, Clone)]
pub struct ParsedAttributes {
    /// Request URL. Empty when the attribute is absent.
    pub action: String,
    /// Normalized method, `GET` unless a recognized verb is given.
    pub method: Method,
    /// Target selector. `None` means the element itself.
    pub target: Option<String>,
    /// Swap strategy, resolved once here.
    pub swap: SwapStrategy,
    /// Trigger event name, explicit or kind-derived.
    pub trigger: String,
}

/// Reads the `fx-*` attributes of `element`.
pub fn parse_attributes(doc: &Document, element: NodeId) -> ParsedAttributes {
    let action = doc.attribute(element, FX_ACTION).unwrap_or("").to_string();
    let method = doc
        .attribute(element, FX_METHOD)
        .map(Method::parse)
        .unwrap_or_default();
    let target = doc
        .attribute(element, FX_TARGET)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    let swap = SwapStrategy::parse(doc.attribute(element, FX_SWAP).unwrap_or("outerHTML"));
    let trigger = trigger::trigger_for(doc, element);
    ParsedAttributes {
        action,
        method,
        target,
        swap,
        trigger,
    }
}
