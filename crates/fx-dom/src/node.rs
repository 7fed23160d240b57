//! Node storage: payload types kept in the document arena.

use std::collections::BTreeMap;

use crate::NodeId;
use crate::props::PropValue;

/// A single node. Tree shape lives in the sibling/child links,
/// node-kind data lives in [`NodeData`].
#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
        }
    }

    /// Element payload, if this is an element node.
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Text payload, if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }
}

/// Node-kind specific payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The document root. Exactly one per document, created with it.
    Document,
    /// `<!DOCTYPE …>`
    Doctype { name: String },
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// Element payload: tag name, attributes and the dynamic property bag.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercase tag name.
    pub name: String,
    pub attrs: Vec<Attribute>,
    /// Dynamic properties, written by property-style swaps.
    pub props: BTreeMap<String, PropValue>,
}

impl ElementData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
            props: BTreeMap::new(),
        }
    }

    /// Attribute value by name (names are ASCII case-insensitive).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Sets an attribute, replacing any existing value.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(a) => a.value = value.to_string(),
            None => self.attrs.push(Attribute {
                name,
                value: value.to_string(),
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|a| !a.name.eq_ignore_ascii_case(name));
    }

    /// Space-separated class list from the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }
}

/// One attribute on an element. Names are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}
