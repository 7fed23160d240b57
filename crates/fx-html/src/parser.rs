//! HTML5 parser implementation
//!
//! Uses html5ever's built-in RcDom and converts into the fx arena.
//! This is simpler and more reliable than implementing TreeSink
//! directly.

use fx_dom::{Document, NodeId};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::ParseIssue;

/// HTML5 parser.
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses an HTML string into a fresh document.
    pub fn parse(&self, html: &str) -> Document {
        let (doc, _) = self.parse_with_issues(html);
        doc
    }

    /// Parses an HTML string, also returning tokenizer complaints.
    pub fn parse_with_issues(&self, html: &str) -> (Document, Vec<ParseIssue>) {
        tracing::debug!("Parsing HTML document ({} bytes)", html.len());
        let dom = read_dom(html);

        let mut document = Document::new();
        let root = document.root();
        for child in dom.document.children.borrow().iter() {
            if let Some(id) = convert(child, &mut document) {
                document
                    .append_child(root, id)
                    .expect("fresh subtree attaches to root");
            }
        }

        let issues = drain_issues(&dom);
        tracing::debug!("Parsed {} nodes, {} issues", document.len(), issues.len());
        (document, issues)
    }

    /// Parses `html` the way `innerHTML` assignment does: as body
    /// content, yielding detached top-level nodes inside `doc`.
    ///
    /// Content the HTML parser relocates out of the body (doctypes,
    /// stray head metadata) is dropped.
    pub fn parse_fragment(&self, doc: &mut Document, html: &str) -> Vec<NodeId> {
        tracing::debug!("Parsing HTML fragment ({} bytes)", html.len());
        let dom = read_dom(html);
        let Some(body) = find_body(&dom.document) else {
            return Vec::new();
        };
        let mut roots = Vec::new();
        for child in body.children.borrow().iter() {
            if let Some(id) = convert(child, doc) {
                roots.push(id);
            }
        }
        tracing::debug!("Fragment produced {} top-level nodes", roots.len());
        roots
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn read_dom(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .expect("HTML parsing should not fail")
}

fn drain_issues(dom: &RcDom) -> Vec<ParseIssue> {
    dom.errors
        .borrow()
        .iter()
        .map(|e| ParseIssue(e.to_string()))
        .collect()
}

/// Converts one RcDom node into a detached subtree of `doc`.
/// Returns `None` for nodes with no arena counterpart.
fn convert(handle: &Handle, doc: &mut Document) -> Option<NodeId> {
    match &handle.data {
        RcNodeData::Document => None,
        RcNodeData::Doctype { name, .. } => Some(doc.create_doctype(&name.to_string())),
        RcNodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            if text.trim().is_empty() {
                None
            } else {
                Some(doc.create_text(&text))
            }
        }
        RcNodeData::Comment { contents } => Some(doc.create_comment(&contents.to_string())),
        RcNodeData::Element { name, attrs, .. } => {
            let id = doc.create_element(name.local.as_ref());
            for attr in attrs.borrow().iter() {
                doc.set_attribute(id, attr.name.local.as_ref(), &attr.value)
                    .expect("just-created element accepts attributes");
            }
            for child in handle.children.borrow().iter() {
                if let Some(cid) = convert(child, doc) {
                    doc.append_child(id, cid)
                        .expect("fresh child attaches to fresh parent");
                }
            }
            Some(id)
        }
        _ => None,
    }
}

/// Finds the `<body>` element html5ever always synthesizes.
fn find_body(handle: &Handle) -> Option<Handle> {
    if let RcNodeData::Element { name, .. } = &handle.data {
        if name.local.as_ref() == "body" {
            return Some(handle.clone());
        }
    }
    for child in handle.children.borrow().iter() {
        if let Some(found) = find_body(child) {
            return Some(found);
        }
    }
    None
}
