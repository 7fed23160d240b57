//! Document arena and tree operations.

use crate::node::{ElementData, Node, NodeData};
use crate::observe::MutationRecord;
use crate::{DomError, DomResult, NodeId};

/// Where to place nodes relative to a target, mirroring the four
/// `insertAdjacentHTML` positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
    AfterEnd,
}

impl InsertPosition {
    /// Parses one of the four position tokens. Anything else is `None`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "beforebegin" => Some(Self::BeforeBegin),
            "afterbegin" => Some(Self::AfterBegin),
            "beforeend" => Some(Self::BeforeEnd),
            "afterend" => Some(Self::AfterEnd),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeBegin => "beforebegin",
            Self::AfterBegin => "afterbegin",
            Self::BeforeEnd => "beforeend",
            Self::AfterEnd => "afterend",
        }
    }
}

/// An arena-backed document tree.
///
/// Nodes are addressed by [`NodeId`] and never deallocated; removal
/// detaches a node from the tree but keeps its id valid, so callers
/// can hold ids across swaps and observe that detached nodes are no
/// longer [`Document::contains`]ed.
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    pub(crate) observing: bool,
    pub(crate) mutations: Vec<MutationRecord>,
}

impl Document {
    /// Creates an empty document containing only the document node.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            observing: false,
            mutations: Vec::new(),
        };
        doc.root = doc.push_node(Node::new(NodeData::Document));
        doc
    }

    /// The document node itself.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever created, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Creates a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(Node::new(NodeData::Element(ElementData::new(tag))))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(Node::new(NodeData::Text(text.to_string())))
    }

    /// Creates a detached comment node.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push_node(Node::new(NodeData::Comment(text.to_string())))
    }

    /// Creates a detached doctype node.
    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.push_node(Node::new(NodeData::Doctype {
            name: name.to_string(),
        }))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    fn get(&self, id: NodeId) -> DomResult<&Node> {
        self.node(id).ok_or(DomError::NotFound)
    }

    fn get_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.node_mut(id).ok_or(DomError::NotFound)
    }

    // ---- traversal -------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.first_child)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.next_sibling)
    }

    /// Iterator over the direct children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for child in self.children(id) {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }

    /// Whether `id` is attached to the document tree.
    pub fn contains(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root {
                return true;
            }
            match self.parent(cur) {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Whether `ancestor` is `id` itself or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.parent(c);
        }
        false
    }

    // ---- element info ----------------------------------------------

    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.is_element())
    }

    /// Lowercase tag name, if `id` is an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.node(id)?.as_element().map(|el| el.name.as_str())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)?.as_element()?.attr(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.get_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement)?
            .set_attr(name, value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<()> {
        self.get_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement)?
            .remove_attr(name);
        Ok(())
    }

    /// First attached element whose `id` attribute equals `value`.
    pub fn get_element_by_id(&self, value: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&d| self.attribute(d, "id") == Some(value))
    }

    /// First `<body>` element in the document, if any.
    pub fn body(&self) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&d| self.tag_name(d) == Some("body"))
    }

    // ---- text ------------------------------------------------------

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else { return };
        if let Some(t) = node.as_text() {
            out.push_str(t);
        }
        for child in self.children(id) {
            self.collect_text(child, out);
        }
    }

    /// Replaces the content of `id` with a single text node.
    /// On a text node, rewrites the text in place.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        if let NodeData::Text(t) = &mut self.get_mut(id)?.data {
            *t = text.to_string();
            return Ok(());
        }
        let old: Vec<NodeId> = self.children(id).collect();
        for child in old {
            self.detach(child);
        }
        if !text.is_empty() {
            let t = self.create_text(text);
            self.attach(id, t, None)?;
        }
        Ok(())
    }

    // ---- structure -------------------------------------------------

    /// Removes `id` from its parent. Detached nodes keep their id and
    /// subtree but are no longer reachable from the root.
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.node(id) else { return };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        if let Some(p) = prev {
            self.nodes[p.index()].next_sibling = next;
        } else if let Some(par) = parent {
            self.nodes[par.index()].first_child = next;
        }
        if let Some(n) = next {
            self.nodes[n.index()].prev_sibling = prev;
        } else if let Some(par) = parent {
            self.nodes[par.index()].last_child = prev;
        }
        let node = &mut self.nodes[id.index()];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Core insertion primitive: puts `child` under `parent`, before
    /// `before` (or at the end). Detaches `child` from any previous
    /// position first.
    pub(crate) fn attach(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> DomResult<()> {
        self.get(child)?;
        let parent_node = self.get(parent)?;
        match parent_node.data {
            NodeData::Document | NodeData::Element(_) => {}
            _ => return Err(DomError::HierarchyRequest),
        }
        if child == self.root || self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(b) = before {
            if self.parent(b) != Some(parent) {
                return Err(DomError::NotFound);
            }
        }
        self.detach(child);

        let prev = match before {
            Some(b) => self.nodes[b.index()].prev_sibling,
            None => self.nodes[parent.index()].last_child,
        };
        {
            let node = &mut self.nodes[child.index()];
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = before;
        }
        match prev {
            Some(p) => self.nodes[p.index()].next_sibling = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        match before {
            Some(b) => self.nodes[b.index()].prev_sibling = Some(child),
            None => self.nodes[parent.index()].last_child = Some(child),
        }
        self.note_insertion(parent, child);
        Ok(())
    }

    /// Appends `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.attach(parent, child, None)
    }

    /// Inserts `child` under `parent` before `reference` (append if `None`).
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.attach(parent, child, reference)
    }

    /// Replaces the children of `parent` with `nodes`.
    pub fn set_children(&mut self, parent: NodeId, nodes: Vec<NodeId>) -> DomResult<()> {
        self.get(parent)?;
        let old: Vec<NodeId> = self.children(parent).collect();
        for child in old {
            self.detach(child);
        }
        for node in nodes {
            self.attach(parent, node, None)?;
        }
        Ok(())
    }

    /// Replaces `target` in its parent with `nodes`, detaching `target`.
    pub fn replace_with(&mut self, target: NodeId, nodes: Vec<NodeId>) -> DomResult<()> {
        self.get(target)?;
        let parent = self.parent(target).ok_or(DomError::DetachedTarget)?;
        for node in nodes {
            self.attach(parent, node, Some(target))?;
        }
        self.detach(target);
        Ok(())
    }

    /// Inserts `nodes` relative to `target` at the given position,
    /// preserving their order.
    pub fn insert_adjacent(
        &mut self,
        target: NodeId,
        position: InsertPosition,
        nodes: Vec<NodeId>,
    ) -> DomResult<()> {
        self.get(target)?;
        match position {
            InsertPosition::BeforeBegin => {
                let parent = self.parent(target).ok_or(DomError::DetachedTarget)?;
                for node in nodes {
                    self.attach(parent, node, Some(target))?;
                }
            }
            InsertPosition::AfterBegin => {
                let first = self.first_child(target);
                for node in nodes {
                    self.attach(target, node, first)?;
                }
            }
            InsertPosition::BeforeEnd => {
                for node in nodes {
                    self.attach(target, node, None)?;
                }
            }
            InsertPosition::AfterEnd => {
                let parent = self.parent(target).ok_or(DomError::DetachedTarget)?;
                let next = self.next_sibling(target);
                for node in nodes {
                    self.attach(parent, node, next)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of one node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.doc.next_sibling(cur);
        Some(cur)
    }
}
