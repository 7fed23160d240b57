//! Element properties.
//!
//! Elements carry a dynamic property bag next to their attributes.
//! A few well-known property names write through to the tree or the
//! attribute map the way their browser counterparts do; everything
//! else lives in the bag. Dotted paths create nested maps on demand.

use std::collections::BTreeMap;

use crate::{Document, DomError, DomResult, NodeId};

/// A property value: plain text or a nested map of properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropValue {
    Text(String),
    Map(BTreeMap<String, PropValue>),
}

impl PropValue {
    /// The text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropValue::Text(t) => Some(t),
            PropValue::Map(_) => None,
        }
    }
}

/// Property names that write through to tree or attribute state
/// instead of the bag.
const WIRED: [&str; 3] = ["textContent", "className", "value"];

fn set_path(map: &mut BTreeMap<String, PropValue>, segments: &[&str], value: &str) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        map.insert(head.to_string(), PropValue::Text(value.to_string()));
        return;
    }
    let slot = map
        .entry(head.to_string())
        .or_insert_with(|| PropValue::Map(BTreeMap::new()));
    match slot {
        PropValue::Map(inner) => set_path(inner, rest, value),
        other => {
            let mut inner = BTreeMap::new();
            set_path(&mut inner, rest, value);
            *other = PropValue::Map(inner);
        }
    }
}

impl Document {
    /// Whether a direct assignment to `name` on `id` would land.
    /// Wired names always exist on elements; bag names must have been
    /// defined first.
    pub fn has_property(&self, id: NodeId, name: &str) -> bool {
        if !self.is_element(id) {
            return false;
        }
        if WIRED.contains(&name) {
            return true;
        }
        self.node(id)
            .and_then(|n| n.as_element())
            .is_some_and(|el| el.props.contains_key(name))
    }

    /// Assigns a direct property. Fails with [`DomError::UnknownProperty`]
    /// when the element has no such property.
    pub fn set_property(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        match name {
            "textContent" => return self.set_text_content(id, value),
            "className" => return self.set_attribute(id, "class", value),
            "value" => return self.set_attribute(id, "value", value),
            _ => {}
        }
        let el = self
            .node_mut(id)
            .ok_or(DomError::NotFound)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement)?;
        match el.props.get_mut(name) {
            Some(slot) => {
                *slot = PropValue::Text(value.to_string());
                Ok(())
            }
            None => Err(DomError::UnknownProperty(name.to_string())),
        }
    }

    /// Defines a bag property unconditionally, creating it if absent.
    pub fn put_property(&mut self, id: NodeId, name: &str, value: PropValue) -> DomResult<()> {
        let el = self
            .node_mut(id)
            .ok_or(DomError::NotFound)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement)?;
        el.props.insert(name.to_string(), value);
        Ok(())
    }

    /// Assigns along a dotted path, creating intermediate maps as
    /// needed. `"dataset.value"` sets `value` inside the `dataset` map.
    pub fn set_property_path(&mut self, id: NodeId, path: &str, value: &str) -> DomResult<()> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(DomError::UnknownProperty(path.to_string()));
        }
        let el = self
            .node_mut(id)
            .ok_or(DomError::NotFound)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement)?;
        set_path(&mut el.props, &segments, value);
        Ok(())
    }

    /// Reads a bag property by name.
    pub fn property(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        self.node(id)?.as_element()?.props.get(name)
    }

    /// Resolves a dotted path to its text value, if present.
    pub fn property_text(&self, id: NodeId, path: &str) -> Option<&str> {
        let mut segments = path.split('.');
        let mut cur = self.property(id, segments.next()?)?;
        for seg in segments {
            let PropValue::Map(map) = cur else {
                return None;
            };
            cur = map.get(seg)?;
        }
        cur.as_text()
    }
}
