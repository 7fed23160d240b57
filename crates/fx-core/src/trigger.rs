//! Trigger resolution: which host event activates an element.

use fx_dom::{Document, NodeId};

use crate::attributes::FX_TRIGGER;

/// Input subtypes that behave like buttons and therefore trigger on
/// click rather than change.
const BUTTON_INPUT_TYPES: [&str; 4] = ["button", "submit", "reset", "image"];

/// Kind-derived default trigger: forms submit, value-bearing controls
/// change, everything else (buttons included) clicks.
pub fn default_trigger(doc: &Document, element: NodeId) -> &'static str {
    match doc.tag_name(element) {
        Some("form") => "submit",
        Some("input") => {
            let ty = doc
                .attribute(element, "type")
                .map(|t| t.to_ascii_lowercase())
                .unwrap_or_else(|| "text".to_string());
            if BUTTON_INPUT_TYPES.contains(&ty.as_str()) {
                "click"
            } else {
                "change"
            }
        }
        Some("select") | Some("textarea") => "change",
        _ => "click",
    }
}

/// The effective trigger for `element`: its explicit attribute, or
/// the kind-derived default.
pub fn trigger_for(doc: &Document, element: NodeId) -> String {
    match doc.attribute(element, FX_TRIGGER) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => default_trigger(doc, element).to_string(),
    }
}
