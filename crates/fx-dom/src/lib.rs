//! fx-dom - Headless DOM tree
//!
//! Arena-based node tree with the mutation, query, form and observation
//! primitives the hypermedia engine drives. No browser required: hosts
//! build a [`Document`], hand it to the engine, and read it back out.

mod document;
mod forms;
mod node;
mod observe;
mod props;
mod select;
mod serialize;

pub use document::{Children, Document, InsertPosition};
pub use node::{Attribute, ElementData, Node, NodeData};
pub use observe::MutationRecord;
pub use props::PropValue;
pub use select::Selector;

/// Identifier for a node in the document arena.
///
/// Ids are stable for the lifetime of the document and never reused,
/// so an id held across a removal keeps pointing at the detached node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Arena index of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Result type for DOM operations.
pub type DomResult<T> = Result<T, DomError>;

/// Errors raised by DOM operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node id does not exist in this document.
    #[error("node not found")]
    NotFound,

    /// Operation requires an element node.
    #[error("node is not an element")]
    NotAnElement,

    /// Insertion would create a cycle or re-root the document node.
    #[error("hierarchy request error")]
    HierarchyRequest,

    /// Relative insertion requires a target with a parent.
    #[error("target has no parent")]
    DetachedTarget,

    /// Direct assignment to a property the element does not have.
    #[error("unknown property: {0}")]
    UnknownProperty(String),
}
