//! HTML serialization.

use std::fmt::Write;

use crate::node::NodeData;
use crate::{Document, NodeId};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

impl Document {
    /// Serializes `id` including the node itself. The document node
    /// serializes as its children.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serializes the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else { return };
        match &node.data {
            NodeData::Document => {
                for child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeData::Doctype { name } => {
                let _ = write!(out, "<!DOCTYPE {}>", name);
            }
            NodeData::Text(t) => out.push_str(&escape_text(t)),
            NodeData::Comment(t) => {
                let _ = write!(out, "<!--{}-->", t);
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for attr in &el.attrs {
                    let _ = write!(out, " {}=\"{}\"", attr.name, escape_attr(&attr.value));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.name.as_str()) {
                    return;
                }
                for child in self.children(id) {
                    self.write_node(child, out);
                }
                let _ = write!(out, "</{}>", el.name);
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
