//! Simple selector matching.
//!
//! Supports compound simple selectors (`tag`, `#id`, `.class`,
//! `[attr]`, `[attr=value]`, `*`) and comma-separated lists of them.
//! Combinators are not supported; a selector that fails to parse
//! matches nothing.

use crate::{Document, NodeId};

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

/// One compound simple selector: every part must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    value: Option<String>,
}

impl Selector {
    /// Parses a selector list. Returns `None` on empty input, unsupported
    /// syntax (combinators, pseudo-classes) or malformed brackets.
    pub fn parse(input: &str) -> Option<Selector> {
        let mut alternatives = Vec::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            alternatives.push(Compound::parse(part)?);
        }
        if alternatives.is_empty() {
            return None;
        }
        Some(Selector { alternatives })
    }

    /// Whether the element `id` matches any alternative.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(node) = doc.node(id) else {
            return false;
        };
        let Some(el) = node.as_element() else {
            return false;
        };
        self.alternatives.iter().any(|alt| {
            if let Some(tag) = &alt.tag {
                if el.name != *tag {
                    return false;
                }
            }
            if let Some(want) = &alt.id {
                if el.attr("id") != Some(want.as_str()) {
                    return false;
                }
            }
            if !alt.classes.iter().all(|c| el.classes().any(|have| have == c)) {
                return false;
            }
            alt.attrs.iter().all(|test| match &test.value {
                Some(v) => el.attr(&test.name) == Some(v.as_str()),
                None => el.has_attr(&test.name),
            })
        })
    }
}

impl Compound {
    fn parse(input: &str) -> Option<Compound> {
        let mut out = Compound::default();
        let mut chars = input.chars().peekable();

        if chars.peek() == Some(&'*') {
            chars.next();
        } else if chars.peek().is_some_and(|c| is_name_char(*c)) {
            out.tag = Some(take_name(&mut chars).to_ascii_lowercase());
        }

        while let Some(&c) = chars.peek() {
            match c {
                '#' => {
                    chars.next();
                    let name = take_name(&mut chars);
                    if name.is_empty() {
                        return None;
                    }
                    out.id = Some(name);
                }
                '.' => {
                    chars.next();
                    let name = take_name(&mut chars);
                    if name.is_empty() {
                        return None;
                    }
                    out.classes.push(name);
                }
                '[' => {
                    chars.next();
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) => body.push(c),
                            None => return None,
                        }
                    }
                    out.attrs.push(AttrTest::parse(&body)?);
                }
                _ => return None,
            }
        }

        if out.tag.is_none()
            && out.id.is_none()
            && out.classes.is_empty()
            && out.attrs.is_empty()
            && !input.starts_with('*')
        {
            return None;
        }
        Some(out)
    }
}

impl AttrTest {
    fn parse(body: &str) -> Option<AttrTest> {
        match body.split_once('=') {
            Some((name, value)) => {
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                    .unwrap_or(value);
                Some(AttrTest {
                    name: name.to_ascii_lowercase(),
                    value: Some(value.to_string()),
                })
            }
            None => {
                let name = body.trim();
                if name.is_empty() {
                    return None;
                }
                Some(AttrTest {
                    name: name.to_ascii_lowercase(),
                    value: None,
                })
            }
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if is_name_char(c) {
            out.push(c);
            chars.next();
        } else {
            break;
        }
    }
    out
}

impl Document {
    /// Whether element `id` matches `selector`. Unparseable selectors
    /// match nothing.
    pub fn matches(&self, id: NodeId, selector: &str) -> bool {
        match Selector::parse(selector) {
            Some(sel) => sel.matches(self, id),
            None => false,
        }
    }

    /// First attached element matching `selector`, in document order.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let sel = Selector::parse(selector)?;
        self.descendants(self.root())
            .into_iter()
            .find(|&d| sel.matches(self, d))
    }

    /// All elements under `scope` (excluding `scope`) matching `selector`.
    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let Some(sel) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.descendants(scope)
            .into_iter()
            .filter(|&d| sel.matches(self, d))
            .collect()
    }

    /// Nearest inclusive ancestor of `id` matching `selector`.
    pub fn closest(&self, id: NodeId, selector: &str) -> Option<NodeId> {
        let sel = Selector::parse(selector)?;
        let mut cur = Some(id);
        while let Some(c) = cur {
            if sel.matches(self, c) {
                return Some(c);
            }
            cur = self.parent(c);
        }
        None
    }
}
