//! Insertion observation.
//!
//! A single subtree-wide observer records nodes inserted into the
//! attached tree, so the engine can initialize markup that arrives
//! after the first scan. Records accumulate until drained with
//! [`Document::take_mutations`].

use crate::{Document, NodeId};

/// One recorded insertion: `added` went under `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
}

impl Document {
    /// Starts recording insertions into the attached tree.
    pub fn observe_children(&mut self) {
        self.observing = true;
    }

    /// Stops recording and discards pending records.
    pub fn disconnect(&mut self) {
        self.observing = false;
        self.mutations.clear();
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Drains and returns the pending records, oldest first.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }

    /// Called by the insertion primitive. Detached subtree assembly is
    /// not recorded; only insertions reachable from the root are.
    pub(crate) fn note_insertion(&mut self, parent: NodeId, child: NodeId) {
        if !self.observing || !self.contains(parent) {
            return;
        }
        tracing::trace!("recording insertion of {:?} under {:?}", child, parent);
        self.mutations.push(MutationRecord {
            target: parent,
            added: vec![child],
        });
    }
}
