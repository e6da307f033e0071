//! Error taxonomy for the split layout engine.
//!
//! Every variant belongs to one of three families (see [`ErrorCategory`]):
//! structural violations of the tree shape, acceptance rejections raised by
//! element negotiation, and degenerate geometry rejected at construction.

use splitdock_core::DockableId;
use thiserror::Error;

use crate::interchange::Key;
use crate::tree::NodeId;

/// Coarse classification of a [`SplitDockError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The requested change would break the tree shape. Discard any
    /// half-built structure.
    Structural,
    /// An element refused to be combined with another.
    Acceptance,
    /// Zero-area rectangles, out-of-range dividers and similar input.
    Geometric,
}

/// Errors raised by tree mutation, interchange, grid conversion and persistence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitDockError {
    #[error("node id 0 is invalid")]
    ZeroNodeId,
    #[error("node {node} already has parent {parent}")]
    AlreadyAttached { node: NodeId, parent: NodeId },
    #[error("attaching {node} below {ancestor} would make it its own ancestor")]
    WouldCycle { node: NodeId, ancestor: NodeId },
    #[error("key {key} already has a parent")]
    KeyHasParent { key: Key },
    #[error("key {key} is the root of its tree")]
    KeyIsRoot { key: Key },
    #[error("key {key} does not belong to this tree")]
    UnknownKey { key: Key },
    #[error("element {element} is used more than once")]
    DuplicateElement { element: DockableId },
    #[error("element {element} is stacked inside leaf {leaf}")]
    ElementStacked { element: DockableId, leaf: NodeId },
    #[error("element {element} is not part of the tree")]
    UnknownElement { element: DockableId },
    #[error("node {node_id} not found")]
    MissingNode { node_id: NodeId },
    #[error("node {node_id} is not a leaf")]
    NotALeaf { node_id: NodeId },
    #[error("node {node_id} is not a split node")]
    NotABranch { node_id: NodeId },
    #[error("node {child} is not a child of {parent}")]
    ParentChildMismatch { parent: NodeId, child: NodeId },
    #[error("node {node_id} parent mismatch: expected {expected:?}, got {actual:?}")]
    ParentMismatch {
        node_id: NodeId,
        expected: Option<NodeId>,
        actual: Option<NodeId>,
    },
    #[error("node {node_id} is unreachable from the root")]
    UnreachableNode { node_id: NodeId },
    #[error("the root node cannot be split or removed")]
    CannotRemoveRoot,
    #[error("node {node_id} is a second root")]
    DuplicateRoot { node_id: NodeId },
    #[error("next id {next_id} must be greater than max existing id {max_existing}")]
    NextIdNotGreaterThanExisting { next_id: NodeId, max_existing: NodeId },
    #[error("node id overflow after {current}")]
    NodeIdOverflow { current: NodeId },
    #[error("invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },
    #[error("{child} was rejected by {parent}")]
    Rejected { parent: DockableId, child: DockableId },
    #[error("divider {divider} is outside [0, 1]")]
    InvalidDivider { divider: f64 },
    #[error("rectangle {width}x{height} has no area")]
    DegenerateRectangle { width: f64, height: f64 },
    #[error("dividing line from {start} to {end} has no extent")]
    DegenerateLine { start: f64, end: f64 },
    #[error("a leaf needs at least one element")]
    EmptyElements,
    #[error("surface size {width}x{height} is negative")]
    InvalidSize { width: i32, height: i32 },
}

impl SplitDockError {
    /// Which error family this belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Rejected { .. } => ErrorCategory::Acceptance,
            Self::InvalidDivider { .. }
            | Self::DegenerateRectangle { .. }
            | Self::DegenerateLine { .. }
            | Self::EmptyElements
            | Self::InvalidSize { .. } => ErrorCategory::Geometric,
            Self::ZeroNodeId
            | Self::AlreadyAttached { .. }
            | Self::WouldCycle { .. }
            | Self::KeyHasParent { .. }
            | Self::KeyIsRoot { .. }
            | Self::UnknownKey { .. }
            | Self::DuplicateElement { .. }
            | Self::ElementStacked { .. }
            | Self::UnknownElement { .. }
            | Self::MissingNode { .. }
            | Self::NotALeaf { .. }
            | Self::NotABranch { .. }
            | Self::ParentChildMismatch { .. }
            | Self::ParentMismatch { .. }
            | Self::UnreachableNode { .. }
            | Self::CannotRemoveRoot
            | Self::DuplicateRoot { .. }
            | Self::NextIdNotGreaterThanExisting { .. }
            | Self::NodeIdOverflow { .. }
            | Self::InvalidSnapshot { .. } => ErrorCategory::Structural,
        }
    }
}

/// Reject dividers that are not a fraction in `[0, 1]`.
pub(crate) fn check_divider(divider: f64) -> Result<f64, SplitDockError> {
    if divider.is_finite() && (0.0..=1.0).contains(&divider) {
        Ok(divider)
    } else {
        Err(SplitDockError::InvalidDivider { divider })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_taxonomy() {
        let element = DockableId::new(1).expect("non-zero");
        let node = NodeId::MIN;
        assert_eq!(
            SplitDockError::Rejected {
                parent: element,
                child: element
            }
            .category(),
            ErrorCategory::Acceptance
        );
        assert_eq!(
            SplitDockError::InvalidDivider { divider: 1.5 }.category(),
            ErrorCategory::Geometric
        );
        assert_eq!(
            SplitDockError::AlreadyAttached {
                node,
                parent: node
            }
            .category(),
            ErrorCategory::Structural
        );
    }

    #[test]
    fn divider_range_is_checked() {
        assert_eq!(check_divider(0.0), Ok(0.0));
        assert_eq!(check_divider(1.0), Ok(1.0));
        assert!(check_divider(-0.01).is_err());
        assert!(check_divider(f64::NAN).is_err());
        assert!(check_divider(f64::INFINITY).is_err());
    }

    #[test]
    fn messages_name_the_offender() {
        let err = SplitDockError::DegenerateRectangle {
            width: 0.0,
            height: 3.0,
        };
        assert_eq!(err.to_string(), "rectangle 0x3 has no area");
    }
}
