//! fx HTML parsing
//!
//! Thin layer over html5ever: parses whole documents into a fresh
//! [`fx_dom::Document`] and response fragments into detached subtrees
//! of an existing one. Parsing is recovery-based and never fails;
//! tokenizer complaints surface as advisory [`ParseIssue`]s.

mod parser;

pub use parser::HtmlParser;

use fx_dom::{Document, NodeId};

/// Parses a complete HTML document.
pub fn parse_document(html: &str) -> Document {
    HtmlParser::new().parse(html)
}

/// Parses `html` as body content into detached nodes of `doc`,
/// returning the top-level nodes in order.
pub fn parse_fragment(doc: &mut Document, html: &str) -> Vec<NodeId> {
    HtmlParser::new().parse_fragment(doc, html)
}

/// Advisory issue reported by the tokenizer while recovering.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ParseIssue(pub String);
