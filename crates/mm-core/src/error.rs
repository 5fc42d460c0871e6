//! Error taxonomy for tree edits.
//!
//! Most variants describe expected rejections (stale ids from the UI, illegal
//! re-parenting) that callers turn into no-ops. Only [`ErrorKind::Bug`]
//! should ever surface to a user.

use crate::id::{NodeId, SheetId};
use thiserror::Error;

/// Coarse classification used by the mutation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced node, sheet, or theme is absent.
    NotFound,
    /// The edit would break a tree invariant and was rejected unapplied.
    InvariantViolation,
    /// The document was found in a state no sequence of edits should produce.
    Bug,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("sheet not found: {0}")]
    SheetNotFound(SheetId),

    #[error("theme not found: {0}")]
    ThemeNotFound(String),

    #[error("node {0} has no parent")]
    NoParent(NodeId),

    #[error("cannot delete sheet root {0}")]
    DeleteRoot(NodeId),

    #[error("cannot move sheet root {0}")]
    MoveRoot(NodeId),

    #[error("cannot move {0} under itself")]
    MoveToSelf(NodeId),

    #[error("{node} is already a child of {parent}")]
    AlreadyChild { node: NodeId, parent: NodeId },

    #[error("moving {node} under {target} would create a cycle")]
    Cycle { node: NodeId, target: NodeId },

    #[error("cannot delete the last sheet")]
    LastSheet,

    #[error("sheet index out of range: {from} -> {to} (len {len})")]
    SheetIndex { from: usize, to: usize, len: usize },

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl TreeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TreeError::NodeNotFound(_)
            | TreeError::SheetNotFound(_)
            | TreeError::ThemeNotFound(_) => ErrorKind::NotFound,
            TreeError::Invariant(_) => ErrorKind::Bug,
            _ => ErrorKind::InvariantViolation,
        }
    }

    /// Whether this error is an expected rejection rather than a defect.
    pub fn is_expected(&self) -> bool {
        self.kind() != ErrorKind::Bug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let id = NodeId::intern("a");
        assert_eq!(TreeError::NodeNotFound(id).kind(), ErrorKind::NotFound);
        assert_eq!(
            TreeError::Cycle {
                node: id,
                target: NodeId::intern("b")
            }
            .kind(),
            ErrorKind::InvariantViolation
        );
        assert!(!TreeError::Invariant("dangling child".into()).is_expected());
    }

    #[test]
    fn messages_name_the_ids() {
        let err = TreeError::AlreadyChild {
            node: NodeId::intern("leaf"),
            parent: NodeId::intern("trunk"),
        };
        assert_eq!(err.to_string(), "leaf is already a child of trunk");
    }
}
