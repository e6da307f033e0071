//! The mutable split tree.
//!
//! Nodes live in an arena keyed by [`NodeId`]. Children are owned through
//! the ids stored in their parent's [`SplitNodeKind`]; the `parent` field of
//! each record is a non-owning back-link used for upward walks. A node can only
//! be attached while it has no parent, which keeps the structure acyclic
//! without a separate cycle check on every mutation.
//!
//! Relative bounds are recomputed top-down by [`SplitTree::update_bounds`];
//! they are never set on a node directly.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use splitdock_core::{DockableHost, DockableId, PixelPoint, PixelRect, Rect, Size};
use tracing::debug;

use crate::coords::CoordinateSpace;
use crate::error::{SplitDockError, check_divider};
use crate::policy::{DividerContext, DividerPolicy};

/// Stable identifier for split nodes.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Lowest valid node ID.
    pub const MIN: Self = Self(1);

    /// Create a new node ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, SplitDockError> {
        if raw == 0 {
            return Err(SplitDockError::ZeroNodeId);
        }
        Ok(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, SplitDockError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(SplitDockError::NodeIdOverflow { current: self });
        };
        Self::new(next)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Orientation of a split node.
///
/// `Horizontal` divides left/right, `Vertical` divides top/bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Payload of an inner node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitBranch {
    pub orientation: Orientation,
    /// Fraction of the node given to `first`.
    pub divider: f64,
    /// Left or top child.
    pub first: NodeId,
    /// Right or bottom child.
    pub second: NodeId,
}

impl SplitBranch {
    /// The child that is not `child`, if `child` is one of the two.
    #[must_use]
    pub fn sibling_of(&self, child: NodeId) -> Option<NodeId> {
        if self.first == child {
            Some(self.second)
        } else if self.second == child {
            Some(self.first)
        } else {
            None
        }
    }
}

/// Node payload variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitNodeKind {
    /// The single root; owns at most one child.
    Root { child: Option<NodeId> },
    Node(SplitBranch),
    Leaf { element: DockableId },
}

/// A node together with its back-link and last computed bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitNodeRecord {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// Relative bounds from the last layout pass.
    pub bounds: Rect,
    pub kind: SplitNodeKind,
}

impl SplitNodeRecord {
    fn new(id: NodeId, kind: SplitNodeKind) -> Self {
        Self {
            id,
            parent: None,
            bounds: Rect::default(),
            kind,
        }
    }

    /// Element of a leaf.
    #[must_use]
    pub fn element(&self) -> Option<DockableId> {
        match self.kind {
            SplitNodeKind::Leaf { element } => Some(element),
            _ => None,
        }
    }

    /// Branch payload of an inner node.
    #[must_use]
    pub fn branch(&self) -> Option<&SplitBranch> {
        match &self.kind {
            SplitNodeKind::Node(branch) => Some(branch),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, SplitNodeKind::Leaf { .. })
    }
}

/// Outcome of unlinking a leaf from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Detached {
    /// Former parent. Removed from the arena unless it is the root.
    pub parent: NodeId,
    /// Node promoted into the former parent's slot.
    pub sibling: Option<NodeId>,
}

/// Binary space partition of a docking surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitTree {
    root: NodeId,
    next_id: NodeId,
    nodes: BTreeMap<NodeId, SplitNodeRecord>,
    space: CoordinateSpace,
    divider_size: i32,
    maximized: Option<NodeId>,
}

impl SplitTree {
    /// An empty tree: a root without child.
    #[must_use]
    pub fn new(divider_size: i32) -> Self {
        let root = NodeId::MIN;
        let mut nodes = BTreeMap::new();
        let mut record = SplitNodeRecord::new(root, SplitNodeKind::Root { child: None });
        record.bounds = Rect::UNIT;
        let _ = nodes.insert(root, record);
        Self {
            root,
            next_id: NodeId(2),
            nodes,
            space: CoordinateSpace::default(),
            divider_size: divider_size.max(0),
            maximized: None,
        }
    }

    /// Root node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// The root's only child.
    #[must_use]
    pub fn root_child(&self) -> Option<NodeId> {
        match self.nodes.get(&self.root).map(|record| record.kind) {
            Some(SplitNodeKind::Root { child }) => child,
            _ => None,
        }
    }

    /// No leaf is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root_child().is_none()
    }

    /// Next ID the allocator will hand out.
    #[must_use]
    pub const fn next_id(&self) -> NodeId {
        self.next_id
    }

    /// Lookup a node by ID.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SplitNodeRecord> {
        self.nodes.get(&id)
    }

    /// Iterate nodes in ID order.
    pub fn nodes(&self) -> impl Iterator<Item = &SplitNodeRecord> {
        self.nodes.values()
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Leaf IDs in left-to-right, top-to-bottom order.
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeId> {
        self.root_child()
            .map(|child| self.subtree_leaves(child))
            .unwrap_or_default()
    }

    /// Elements of all leaves, in [`leaves`](Self::leaves) order.
    #[must_use]
    pub fn elements(&self) -> Vec<DockableId> {
        self.leaves()
            .into_iter()
            .filter_map(|id| self.nodes.get(&id).and_then(SplitNodeRecord::element))
            .collect()
    }

    /// Leaf currently showing `element`.
    #[must_use]
    pub fn leaf_of(&self, element: DockableId) -> Option<NodeId> {
        self.nodes
            .values()
            .find(|record| record.element() == Some(element))
            .map(|record| record.id)
    }

    /// Leaf whose composite element stacks `element` as one of its members.
    ///
    /// A leaf showing `element` itself is not reported; see
    /// [`leaf_of`](Self::leaf_of).
    #[must_use]
    pub fn stacked_leaf_of<H>(&self, element: DockableId, host: &H) -> Option<NodeId>
    where
        H: DockableHost + ?Sized,
    {
        self.nodes.values().find_map(|record| {
            let shown = record.element()?;
            let stack = host.stack(shown)?;
            (shown != element && stack.elements.contains(&element)).then_some(record.id)
        })
    }

    /// Current coordinate mapping.
    #[must_use]
    pub const fn space(&self) -> CoordinateSpace {
        self.space
    }

    /// Replace the coordinate mapping. Bounds are stale until the next
    /// [`update_bounds`](Self::update_bounds).
    pub fn set_space(&mut self, space: CoordinateSpace) {
        self.space = space;
    }

    #[must_use]
    pub const fn divider_size(&self) -> i32 {
        self.divider_size
    }

    pub fn set_divider_size(&mut self, divider_size: i32) {
        self.divider_size = divider_size.max(0);
    }

    /// Leaf in exclusive maximized mode.
    #[must_use]
    pub const fn maximized(&self) -> Option<NodeId> {
        self.maximized
    }

    /// Maximize a leaf, or restore the normal layout with `None`.
    pub fn set_maximized(&mut self, leaf: Option<NodeId>) -> Result<(), SplitDockError> {
        if let Some(node_id) = leaf {
            let record = self
                .nodes
                .get(&node_id)
                .ok_or(SplitDockError::MissingNode { node_id })?;
            if !record.is_leaf() {
                return Err(SplitDockError::NotALeaf { node_id });
            }
        }
        debug!(leaf = ?leaf, "maximize");
        self.maximized = leaf;
        Ok(())
    }

    /// Validate internal invariants.
    pub fn validate(&self) -> Result<(), SplitDockError> {
        let root = self
            .nodes
            .get(&self.root)
            .ok_or(SplitDockError::MissingNode { node_id: self.root })?;
        if root.parent.is_some() {
            return Err(SplitDockError::ParentMismatch {
                node_id: self.root,
                expected: None,
                actual: root.parent,
            });
        }

        let max_existing = self.nodes.keys().next_back().copied().unwrap_or(self.root);
        if self.next_id <= max_existing {
            return Err(SplitDockError::NextIdNotGreaterThanExisting {
                next_id: self.next_id,
                max_existing,
            });
        }

        let mut expected_parents: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        let mut elements = BTreeSet::new();
        let mut claim = |child: NodeId, parent: NodeId| -> Result<(), SplitDockError> {
            if !self.nodes.contains_key(&child) {
                return Err(SplitDockError::MissingNode { node_id: child });
            }
            if child == self.root {
                return Err(SplitDockError::WouldCycle {
                    node: parent,
                    ancestor: child,
                });
            }
            if let Some(first_parent) = expected_parents.insert(child, parent)
                && first_parent != parent
            {
                return Err(SplitDockError::AlreadyAttached {
                    node: child,
                    parent: first_parent,
                });
            }
            Ok(())
        };

        for record in self.nodes.values() {
            if let Some(parent) = record.parent
                && !self.nodes.contains_key(&parent)
            {
                return Err(SplitDockError::MissingNode { node_id: parent });
            }

            match record.kind {
                SplitNodeKind::Root { child } => {
                    if record.id != self.root {
                        return Err(SplitDockError::DuplicateRoot { node_id: record.id });
                    }
                    if let Some(child) = child {
                        claim(child, record.id)?;
                    }
                }
                SplitNodeKind::Node(branch) => {
                    let _ = check_divider(branch.divider)?;
                    if branch.first == record.id || branch.second == record.id {
                        return Err(SplitDockError::WouldCycle {
                            node: record.id,
                            ancestor: record.id,
                        });
                    }
                    if branch.first == branch.second {
                        return Err(SplitDockError::AlreadyAttached {
                            node: branch.first,
                            parent: record.id,
                        });
                    }
                    claim(branch.first, record.id)?;
                    claim(branch.second, record.id)?;
                }
                SplitNodeKind::Leaf { element } => {
                    if !elements.insert(element) {
                        return Err(SplitDockError::DuplicateElement { element });
                    }
                }
            }
        }

        for record in self.nodes.values() {
            let expected = if record.id == self.root {
                None
            } else {
                expected_parents.get(&record.id).copied()
            };
            if record.parent != expected {
                return Err(SplitDockError::ParentMismatch {
                    node_id: record.id,
                    expected,
                    actual: record.parent,
                });
            }
        }

        let visited: BTreeSet<NodeId> = self.preorder().into_iter().collect();
        if visited.len() != self.nodes.len()
            && let Some(node_id) = self.nodes.keys().find(|id| !visited.contains(id))
        {
            return Err(SplitDockError::UnreachableNode { node_id: *node_id });
        }

        if let Some(node_id) = self.maximized {
            match self.nodes.get(&node_id) {
                None => return Err(SplitDockError::MissingNode { node_id }),
                Some(record) if !record.is_leaf() => {
                    return Err(SplitDockError::NotALeaf { node_id });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Check that no element is shown twice once every composite leaf is
    /// expanded into its members.
    pub fn validate_members<H>(&self, host: &H) -> Result<(), SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        let mut shown = BTreeSet::new();
        for element in self.nodes.values().filter_map(SplitNodeRecord::element) {
            let members = host.stack(element).map(|stack| stack.elements);
            for member in std::iter::once(element).chain(members.into_iter().flatten()) {
                if !shown.insert(member) {
                    return Err(SplitDockError::DuplicateElement { element: member });
                }
            }
        }
        Ok(())
    }

    /// Minimum pixel size of the whole surface, insets included.
    #[must_use]
    pub fn minimum_size<H>(&self, host: &H) -> Size
    where
        H: DockableHost + ?Sized,
    {
        self.minimum_sizes(host)
            .get(&self.root)
            .copied()
            .unwrap_or_default()
    }

    /// Minimum pixel size of the subtree rooted at `id`.
    #[must_use]
    pub fn node_minimum_size<H>(&self, id: NodeId, host: &H) -> Option<Size>
    where
        H: DockableHost + ?Sized,
    {
        self.minimum_sizes(host).get(&id).copied()
    }

    /// Recompute all relative bounds and hand pixel bounds to the host.
    ///
    /// Dividers pass through `policy` before they are used; the stored values
    /// are left untouched. A maximized leaf receives the whole surface and
    /// every other leaf an empty rectangle.
    pub fn update_bounds<H>(&mut self, host: &mut H, policy: &dyn DividerPolicy)
    where
        H: DockableHost + ?Sized,
    {
        let minimums = self.minimum_sizes(host);
        let factors = self.space.factors;
        let divider_size = self.divider_size;
        self.layout_relative(&mut |branch: &SplitBranch, rect: Rect| {
            let minimum = |id: NodeId| minimums.get(&id).copied().unwrap_or_default();
            let (first, second) = (minimum(branch.first), minimum(branch.second));
            let context = match branch.orientation {
                Orientation::Horizontal => DividerContext {
                    orientation: branch.orientation,
                    extent: rect.width * factors.width,
                    first_minimum: first.width,
                    second_minimum: second.width,
                    divider_size,
                },
                Orientation::Vertical => DividerContext {
                    orientation: branch.orientation,
                    extent: rect.height * factors.height,
                    first_minimum: first.height,
                    second_minimum: second.height,
                    divider_size,
                },
            };
            policy.validate(branch.divider, &context)
        });

        let surface = self.space.surface();
        for leaf in self.leaves() {
            let Some(record) = self.nodes.get(&leaf) else {
                continue;
            };
            let Some(element) = record.element() else {
                continue;
            };
            let bounds = match self.maximized {
                Some(maximized) if maximized == leaf => surface,
                Some(_) => PixelRect::default(),
                None => self.space.to_pixels(record.bounds),
            };
            host.set_bounds(element, bounds);
        }
    }

    /// Pixel rectangle of a node's last computed bounds.
    #[must_use]
    pub fn pixel_bounds(&self, id: NodeId) -> Option<PixelRect> {
        self.nodes
            .get(&id)
            .map(|record| self.space.to_pixels(record.bounds))
    }

    /// Leaf under a pixel position.
    #[must_use]
    pub fn leaf_at(&self, point: PixelPoint) -> Option<NodeId> {
        if let Some(maximized) = self.maximized {
            return self.space.surface().contains(point).then_some(maximized);
        }
        self.leaves().into_iter().find(|leaf| {
            self.pixel_bounds(*leaf)
                .is_some_and(|bounds| bounds.contains(point))
        })
    }

    /// Pixel strip between the two children of a split node.
    #[must_use]
    pub fn divider_bounds(&self, id: NodeId) -> Option<PixelRect> {
        let record = self.nodes.get(&id)?;
        let branch = record.branch()?;
        let node = self.space.to_pixels(record.bounds);
        let first = self.pixel_bounds(branch.first)?;
        let second = self.pixel_bounds(branch.second)?;
        Some(match branch.orientation {
            Orientation::Horizontal => PixelRect::new(
                first.right(),
                node.y,
                second.x.saturating_sub(first.right()).max(0),
                node.height,
            ),
            Orientation::Vertical => PixelRect::new(
                node.x,
                first.bottom(),
                node.width,
                second.y.saturating_sub(first.bottom()).max(0),
            ),
        })
    }

    /// Split node whose divider strip contains a pixel position.
    #[must_use]
    pub fn divider_at(&self, point: PixelPoint) -> Option<NodeId> {
        if self.maximized.is_some() {
            return None;
        }
        self.nodes
            .values()
            .filter(|record| record.branch().is_some())
            .find(|record| {
                self.divider_bounds(record.id)
                    .is_some_and(|strip| strip.contains(point))
            })
            .map(|record| record.id)
    }

    /// Set a divider directly. Values outside `[0, 1]` are rejected.
    pub fn set_divider(&mut self, id: NodeId, divider: f64) -> Result<(), SplitDockError> {
        let divider = check_divider(divider)?;
        let record = self
            .nodes
            .get_mut(&id)
            .ok_or(SplitDockError::MissingNode { node_id: id })?;
        let SplitNodeKind::Node(branch) = &mut record.kind else {
            return Err(SplitDockError::NotABranch { node_id: id });
        };
        branch.divider = divider;
        Ok(())
    }

    /// Move a divider so it sits under `point`, as far as `policy` allows.
    ///
    /// Returns the stored divider.
    pub fn drag_divider<H>(
        &mut self,
        id: NodeId,
        point: PixelPoint,
        host: &H,
        policy: &dyn DividerPolicy,
    ) -> Result<f64, SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        let record = self
            .nodes
            .get(&id)
            .ok_or(SplitDockError::MissingNode { node_id: id })?;
        let SplitNodeKind::Node(branch) = record.kind else {
            return Err(SplitDockError::NotABranch { node_id: id });
        };
        let rect = record.bounds;
        let (x, y) = self.space.to_relative(point);
        let minimums = self.minimum_sizes(host);
        let minimum = |id: NodeId| minimums.get(&id).copied().unwrap_or_default();
        let (first, second) = (minimum(branch.first), minimum(branch.second));

        let (proposed, context) = match branch.orientation {
            Orientation::Horizontal => (
                relative_offset(x, rect.x, rect.width).unwrap_or(branch.divider),
                DividerContext {
                    orientation: branch.orientation,
                    extent: rect.width * self.space.factors.width,
                    first_minimum: first.width,
                    second_minimum: second.width,
                    divider_size: self.divider_size,
                },
            ),
            Orientation::Vertical => (
                relative_offset(y, rect.y, rect.height).unwrap_or(branch.divider),
                DividerContext {
                    orientation: branch.orientation,
                    extent: rect.height * self.space.factors.height,
                    first_minimum: first.height,
                    second_minimum: second.height,
                    divider_size: self.divider_size,
                },
            ),
        };
        let divider = policy.validate(proposed, &context).clamp(0.0, 1.0);
        self.set_divider(id, divider)?;
        Ok(divider)
    }

    /// Remove the leaf showing `element`; its sibling takes the parent's place.
    pub fn remove_element(&mut self, element: DockableId) -> Result<NodeId, SplitDockError> {
        let leaf = self
            .leaf_of(element)
            .ok_or(SplitDockError::UnknownElement { element })?;
        let _ = self.remove_leaf(leaf)?;
        Ok(leaf)
    }

    /// Remove a leaf; its sibling takes the parent's place.
    pub fn remove_leaf(&mut self, leaf: NodeId) -> Result<DockableId, SplitDockError> {
        let element = self
            .nodes
            .get(&leaf)
            .ok_or(SplitDockError::MissingNode { node_id: leaf })?
            .element()
            .ok_or(SplitDockError::NotALeaf { node_id: leaf })?;
        let detached = self.detach_leaf(leaf)?;
        let _ = self.nodes.remove(&leaf);
        if self.maximized == Some(leaf) {
            self.maximized = None;
        }
        debug!(leaf = ?leaf, element = %element, promoted = ?detached.sibling, "remove leaf");
        Ok(element)
    }

    /// All node IDs reachable from the root, parents before children.
    pub(crate) fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut visited = BTreeSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(record) = self.nodes.get(&id) else {
                continue;
            };
            if !visited.insert(id) {
                continue;
            }
            out.push(id);
            match record.kind {
                SplitNodeKind::Root { child: Some(child) } => stack.push(child),
                SplitNodeKind::Node(branch) => {
                    stack.push(branch.second);
                    stack.push(branch.first);
                }
                SplitNodeKind::Root { child: None } | SplitNodeKind::Leaf { .. } => {}
            }
        }
        out
    }

    /// Leaves below `id` (inclusive), in order.
    pub(crate) fn subtree_leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            match self.nodes.get(&node_id).map(|record| record.kind) {
                Some(SplitNodeKind::Leaf { .. }) => out.push(node_id),
                Some(SplitNodeKind::Node(branch)) => {
                    stack.push(branch.second);
                    stack.push(branch.first);
                }
                Some(SplitNodeKind::Root { child: Some(child) }) => stack.push(child),
                Some(SplitNodeKind::Root { child: None }) | None => {}
            }
        }
        out
    }

    pub(crate) fn collect_subtree_ids(&self, root_id: NodeId) -> Result<Vec<NodeId>, SplitDockError> {
        if !self.nodes.contains_key(&root_id) {
            return Err(SplitDockError::MissingNode { node_id: root_id });
        }

        let mut out = Vec::new();
        let mut stack = vec![root_id];
        while let Some(node_id) = stack.pop() {
            let record = self
                .nodes
                .get(&node_id)
                .ok_or(SplitDockError::MissingNode { node_id })?;
            out.push(node_id);
            match record.kind {
                SplitNodeKind::Node(branch) => {
                    stack.push(branch.first);
                    stack.push(branch.second);
                }
                SplitNodeKind::Root { child: Some(child) } => stack.push(child),
                SplitNodeKind::Root { child: None } | SplitNodeKind::Leaf { .. } => {}
            }
        }
        Ok(out)
    }

    /// Recompute relative bounds from stored dividers without a policy.
    pub(crate) fn refresh_relative_bounds(&mut self) {
        self.layout_relative(&mut |branch: &SplitBranch, _: Rect| branch.divider);
    }

    fn layout_relative(&mut self, divider_for: &mut dyn FnMut(&SplitBranch, Rect) -> f64) {
        let divider_width = self.space.factors.divider_width(self.divider_size);
        let divider_height = self.space.factors.divider_height(self.divider_size);

        let mut stack = vec![(self.root, Rect::UNIT)];
        while let Some((id, rect)) = stack.pop() {
            let Some(record) = self.nodes.get_mut(&id) else {
                continue;
            };
            record.bounds = rect;
            let kind = record.kind;
            match kind {
                SplitNodeKind::Root { child: Some(child) } => stack.push((child, rect)),
                SplitNodeKind::Node(branch) => {
                    let divider = divider_for(&branch, rect);
                    let (first, second) = match branch.orientation {
                        Orientation::Horizontal => {
                            let location = rect.width * divider;
                            (
                                Rect::new(rect.x, rect.y, location - divider_width / 2.0, rect.height),
                                Rect::new(
                                    rect.x + location + divider_width / 2.0,
                                    rect.y,
                                    rect.width - location - divider_width / 2.0,
                                    rect.height,
                                ),
                            )
                        }
                        Orientation::Vertical => {
                            let location = rect.height * divider;
                            (
                                Rect::new(rect.x, rect.y, rect.width, location - divider_height / 2.0),
                                Rect::new(
                                    rect.x,
                                    rect.y + location + divider_height / 2.0,
                                    rect.width,
                                    rect.height - location - divider_height / 2.0,
                                ),
                            )
                        }
                    };
                    stack.push((branch.first, first));
                    stack.push((branch.second, second));
                }
                SplitNodeKind::Root { child: None } | SplitNodeKind::Leaf { .. } => {}
            }
        }
    }

    fn minimum_sizes<H>(&self, host: &H) -> BTreeMap<NodeId, Size>
    where
        H: DockableHost + ?Sized,
    {
        let mut sizes = BTreeMap::new();
        for id in self.preorder().into_iter().rev() {
            let Some(record) = self.nodes.get(&id) else {
                continue;
            };
            let size = match record.kind {
                SplitNodeKind::Leaf { element } => host.minimum_size(element),
                SplitNodeKind::Node(branch) => {
                    let first = sizes.get(&branch.first).copied().unwrap_or_default();
                    let second = sizes.get(&branch.second).copied().unwrap_or_default();
                    combine_minimum(branch.orientation, first, second, self.divider_size)
                }
                SplitNodeKind::Root { child } => {
                    let inner = child
                        .and_then(|child| sizes.get(&child).copied())
                        .unwrap_or_default();
                    Size::new(
                        inner.width.saturating_add(self.space.insets.horizontal_sum()),
                        inner.height.saturating_add(self.space.insets.vertical_sum()),
                    )
                }
            };
            let _ = sizes.insert(id, size);
        }
        sizes
    }

    pub(crate) fn allocate_node_id(&mut self) -> Result<NodeId, SplitDockError> {
        let current = self.next_id;
        self.next_id = self.next_id.checked_next()?;
        Ok(current)
    }

    /// Use `preferred` if it is free, otherwise allocate a fresh ID.
    pub(crate) fn claim_node_id(&mut self, preferred: Option<NodeId>) -> Result<NodeId, SplitDockError> {
        match preferred {
            Some(id) if !self.nodes.contains_key(&id) => {
                if id >= self.next_id {
                    self.next_id = id.checked_next()?;
                }
                Ok(id)
            }
            _ => self.allocate_node_id(),
        }
    }

    /// Insert an unattached leaf.
    pub(crate) fn insert_leaf(&mut self, id: NodeId, element: DockableId) {
        let _ = self
            .nodes
            .insert(id, SplitNodeRecord::new(id, SplitNodeKind::Leaf { element }));
    }

    /// Insert an unattached split node over two unattached children.
    pub(crate) fn insert_branch(
        &mut self,
        id: NodeId,
        orientation: Orientation,
        divider: f64,
        first: NodeId,
        second: NodeId,
    ) -> Result<(), SplitDockError> {
        let divider = check_divider(divider)?;
        if first == second {
            return Err(SplitDockError::AlreadyAttached {
                node: first,
                parent: id,
            });
        }
        for child in [first, second] {
            self.ensure_detached(child)?;
        }
        let _ = self.nodes.insert(
            id,
            SplitNodeRecord::new(
                id,
                SplitNodeKind::Node(SplitBranch {
                    orientation,
                    divider,
                    first,
                    second,
                }),
            ),
        );
        for child in [first, second] {
            if let Some(record) = self.nodes.get_mut(&child) {
                record.parent = Some(id);
            }
        }
        Ok(())
    }

    /// Make `child` the root's child, detaching the previous one.
    pub(crate) fn set_root_child(&mut self, child: Option<NodeId>) -> Result<(), SplitDockError> {
        if let Some(child) = child {
            self.ensure_detached(child)?;
        }
        let root = self.root;
        let record = self
            .nodes
            .get_mut(&root)
            .ok_or(SplitDockError::MissingNode { node_id: root })?;
        let SplitNodeKind::Root { child: slot } = &mut record.kind else {
            return Err(SplitDockError::MissingNode { node_id: root });
        };
        let previous = std::mem::replace(slot, child);
        if let Some(previous) = previous
            && Some(previous) != child
            && let Some(record) = self.nodes.get_mut(&previous)
        {
            record.parent = None;
        }
        if let Some(child) = child
            && let Some(record) = self.nodes.get_mut(&child)
        {
            record.parent = Some(root);
        }
        Ok(())
    }

    /// Split `target` and place a new leaf for `element` beside it.
    ///
    /// `new_first` puts the new leaf left/top of `target`. Returns the new
    /// leaf's ID.
    pub(crate) fn split_node(
        &mut self,
        target: NodeId,
        orientation: Orientation,
        divider: f64,
        element: DockableId,
        new_first: bool,
        leaf_id: Option<NodeId>,
    ) -> Result<NodeId, SplitDockError> {
        let divider = check_divider(divider)?;
        let record = self
            .nodes
            .get(&target)
            .ok_or(SplitDockError::MissingNode { node_id: target })?;
        if matches!(record.kind, SplitNodeKind::Root { .. }) {
            return Err(SplitDockError::CannotRemoveRoot);
        }
        let parent = record
            .parent
            .ok_or(SplitDockError::UnreachableNode { node_id: target })?;

        let branch_id = self.allocate_node_id()?;
        let leaf_id = self.claim_node_id(leaf_id)?;
        self.insert_leaf(leaf_id, element);

        self.replace_child(parent, target, branch_id)?;
        if let Some(record) = self.nodes.get_mut(&target) {
            record.parent = None;
        }
        let (first, second) = if new_first {
            (leaf_id, target)
        } else {
            (target, leaf_id)
        };
        self.insert_branch(branch_id, orientation, divider, first, second)?;
        if let Some(record) = self.nodes.get_mut(&branch_id) {
            record.parent = Some(parent);
        }
        Ok(leaf_id)
    }

    pub(crate) fn set_leaf_element(&mut self, leaf: NodeId, element: DockableId) -> Result<(), SplitDockError> {
        let record = self
            .nodes
            .get_mut(&leaf)
            .ok_or(SplitDockError::MissingNode { node_id: leaf })?;
        let SplitNodeKind::Leaf { element: slot } = &mut record.kind else {
            return Err(SplitDockError::NotALeaf { node_id: leaf });
        };
        *slot = element;
        Ok(())
    }

    /// Swap `old_child` for `new_child` in `parent`'s child slots.
    ///
    /// Only the parent's slot is rewritten; back-links are the caller's job.
    pub(crate) fn replace_child(
        &mut self,
        parent_id: NodeId,
        old_child: NodeId,
        new_child: NodeId,
    ) -> Result<(), SplitDockError> {
        let parent = self
            .nodes
            .get_mut(&parent_id)
            .ok_or(SplitDockError::MissingNode { node_id: parent_id })?;
        match &mut parent.kind {
            SplitNodeKind::Root { child } if *child == Some(old_child) => {
                *child = Some(new_child);
                Ok(())
            }
            SplitNodeKind::Node(branch) if branch.first == old_child => {
                branch.first = new_child;
                Ok(())
            }
            SplitNodeKind::Node(branch) if branch.second == old_child => {
                branch.second = new_child;
                Ok(())
            }
            SplitNodeKind::Leaf { .. } => Err(SplitDockError::NotABranch { node_id: parent_id }),
            _ => Err(SplitDockError::ParentChildMismatch {
                parent: parent_id,
                child: old_child,
            }),
        }
    }

    /// Unlink a leaf and promote its sibling into the parent's slot.
    ///
    /// The leaf record stays in the arena without parent; the former parent
    /// split node is removed.
    pub(crate) fn detach_leaf(&mut self, leaf: NodeId) -> Result<Detached, SplitDockError> {
        let record = self
            .nodes
            .get(&leaf)
            .ok_or(SplitDockError::MissingNode { node_id: leaf })?;
        if !record.is_leaf() {
            return Err(SplitDockError::NotALeaf { node_id: leaf });
        }
        let parent_id = record
            .parent
            .ok_or(SplitDockError::UnreachableNode { node_id: leaf })?;
        let parent = *self
            .nodes
            .get(&parent_id)
            .ok_or(SplitDockError::MissingNode { node_id: parent_id })?;

        let detached = match parent.kind {
            SplitNodeKind::Root { child } if child == Some(leaf) => {
                self.set_root_child(None)?;
                Detached {
                    parent: parent_id,
                    sibling: None,
                }
            }
            SplitNodeKind::Node(branch) => {
                let sibling = branch
                    .sibling_of(leaf)
                    .ok_or(SplitDockError::ParentChildMismatch {
                        parent: parent_id,
                        child: leaf,
                    })?;
                let grandparent = parent
                    .parent
                    .ok_or(SplitDockError::UnreachableNode { node_id: parent_id })?;
                self.replace_child(grandparent, parent_id, sibling)?;
                if let Some(record) = self.nodes.get_mut(&sibling) {
                    record.parent = Some(grandparent);
                }
                let _ = self.nodes.remove(&parent_id);
                Detached {
                    parent: parent_id,
                    sibling: Some(sibling),
                }
            }
            _ => {
                return Err(SplitDockError::ParentChildMismatch {
                    parent: parent_id,
                    child: leaf,
                });
            }
        };

        if let Some(record) = self.nodes.get_mut(&leaf) {
            record.parent = None;
        }
        Ok(detached)
    }

    /// Rewrite a node's back-link without touching either parent's slots.
    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(record) = self.nodes.get_mut(&id) {
            record.parent = parent;
        }
    }

    /// Drop an unattached subtree from the arena.
    pub(crate) fn discard(&mut self, ids: &[NodeId]) {
        for id in ids {
            let _ = self.nodes.remove(id);
            if self.maximized == Some(*id) {
                self.maximized = None;
            }
        }
    }

    fn ensure_detached(&self, child: NodeId) -> Result<(), SplitDockError> {
        let record = self
            .nodes
            .get(&child)
            .ok_or(SplitDockError::MissingNode { node_id: child })?;
        if matches!(record.kind, SplitNodeKind::Root { .. }) {
            return Err(SplitDockError::WouldCycle {
                node: child,
                ancestor: child,
            });
        }
        match record.parent {
            Some(parent) => Err(SplitDockError::AlreadyAttached {
                node: child,
                parent,
            }),
            None => Ok(()),
        }
    }
}

fn combine_minimum(orientation: Orientation, first: Size, second: Size, divider_size: i32) -> Size {
    match orientation {
        Orientation::Horizontal => Size::new(
            first
                .width
                .saturating_add(second.width)
                .saturating_add(divider_size),
            first.height.max(second.height),
        ),
        Orientation::Vertical => Size::new(
            first.width.max(second.width),
            first
                .height
                .saturating_add(second.height)
                .saturating_add(divider_size),
        ),
    }
}

fn relative_offset(value: f64, start: f64, extent: f64) -> Option<f64> {
    (extent > 0.0).then(|| (value - start) / extent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{MinimumSizeDividerPolicy, UnconstrainedDividerPolicy};
    use splitdock_core::{Insets, MemoryHost};

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw).expect("test ID must be non-zero")
    }

    /// `a | b` split horizontally at `divider` on a 204x100 surface.
    fn side_by_side(divider: f64) -> (SplitTree, MemoryHost, DockableId, DockableId) {
        let mut host = MemoryHost::new();
        let a = host.add_element(Size::new(20, 10));
        let b = host.add_element(Size::new(30, 40));
        let mut tree = SplitTree::new(4);
        tree.set_space(CoordinateSpace::new(Size::new(204, 100), Insets::default()));
        let leaf = tree.allocate_node_id().expect("id");
        tree.insert_leaf(leaf, a);
        tree.set_root_child(Some(leaf)).expect("attach");
        let _ = tree
            .split_node(leaf, Orientation::Horizontal, divider, b, false, None)
            .expect("split");
        tree.validate().expect("valid tree");
        (tree, host, a, b)
    }

    #[test]
    fn node_id_rejects_zero_and_overflow() {
        assert_eq!(NodeId::new(0), Err(SplitDockError::ZeroNodeId));
        assert_eq!(id(3).checked_next(), Ok(id(4)));
        assert!(matches!(
            id(u64::MAX).checked_next(),
            Err(SplitDockError::NodeIdOverflow { .. })
        ));
    }

    #[test]
    fn empty_tree_is_valid() {
        let tree = SplitTree::new(4);
        tree.validate().expect("empty tree validates");
        assert!(tree.is_empty());
        assert!(tree.leaves().is_empty());
        assert_eq!(tree.next_id(), id(2));
    }

    #[test]
    fn bounds_reserve_divider_gap() {
        let (mut tree, mut host, a, b) = side_by_side(0.5);
        tree.update_bounds(&mut host, &UnconstrainedDividerPolicy);

        let left = host.bounds(a).expect("a laid out");
        let right = host.bounds(b).expect("b laid out");
        assert_eq!(left, PixelRect::new(0, 0, 100, 100));
        assert_eq!(right, PixelRect::new(104, 0, 100, 100));

        let branch = tree.root_child().expect("split node");
        assert_eq!(tree.divider_bounds(branch), Some(PixelRect::new(100, 0, 4, 100)));
        assert_eq!(tree.divider_at(PixelPoint::new(102, 50)), Some(branch));
        assert_eq!(tree.divider_at(PixelPoint::new(99, 50)), None);
    }

    /// Pixel widths of the children and strip of the horizontal root split,
    /// summed, next to the split node's own width.
    fn horizontal_tiling(tree: &SplitTree) -> (i32, i32) {
        let node = tree.root_child().expect("split node");
        let branch = *tree.node(node).and_then(SplitNodeRecord::branch).expect("branch");
        let first = tree.pixel_bounds(branch.first).expect("first");
        let second = tree.pixel_bounds(branch.second).expect("second");
        let strip = tree.divider_bounds(node).expect("strip");
        let width = tree.pixel_bounds(node).expect("node").width;
        (first.width + strip.width + second.width, width)
    }

    #[test]
    fn divider_gap_tiles_from_minimum_size_up() {
        let (mut tree, mut host, a, b) = side_by_side(0.1);
        let surfaces = [
            (54, Insets::default()),
            (55, Insets::default()),
            (61, Insets::new(2, 3, 2, 4)),
            (333, Insets::new(0, 7, 0, 0)),
            (1021, Insets::all(5)),
        ];
        for (width, insets) in surfaces {
            let size = Size::new(width + insets.horizontal_sum(), 100);
            tree.set_space(CoordinateSpace::new(size, insets));
            assert!(size.width >= tree.minimum_size(&host).width);
            tree.update_bounds(&mut host, &MinimumSizeDividerPolicy);

            assert_eq!(horizontal_tiling(&tree), (width, width));
            assert!(host.bounds(a).is_some_and(|r| r.width >= 20 && r.x == insets.left));
            assert!(host.bounds(b).is_some_and(|r| r.width >= 30));
        }
    }

    #[test]
    fn divider_gap_overshoots_below_minimum_size() {
        let mut host = MemoryHost::new();
        let wide = host.add_element(Size::new(40, 0));
        let narrow = host.add_element(Size::ZERO);
        let mut tree = SplitTree::new(4);
        let leaf = tree.place_first_leaf(wide).expect("leaf");
        let _ = tree
            .split_node(leaf, Orientation::Horizontal, 0.5, narrow, false, None)
            .expect("split");
        assert_eq!(tree.minimum_size(&host), Size::new(44, 0));

        tree.set_space(CoordinateSpace::new(Size::new(44, 20), Insets::default()));
        tree.update_bounds(&mut host, &MinimumSizeDividerPolicy);
        assert_eq!(horizontal_tiling(&tree), (44, 44));

        // Squeezed past its minimum, the narrow child collapses to nothing
        // while the strip keeps its full width.
        tree.set_space(CoordinateSpace::new(Size::new(10, 20), Insets::default()));
        tree.update_bounds(&mut host, &MinimumSizeDividerPolicy);
        assert_eq!(horizontal_tiling(&tree), (12, 10));
        assert_eq!(host.bounds(narrow).map(|r| r.width), Some(0));
    }

    #[test]
    fn leaf_at_hits_leaves() {
        let (mut tree, mut host, a, b) = side_by_side(0.5);
        tree.update_bounds(&mut host, &UnconstrainedDividerPolicy);
        let leaf_a = tree.leaf_of(a);
        let leaf_b = tree.leaf_of(b);
        assert_eq!(tree.leaf_at(PixelPoint::new(10, 10)), leaf_a);
        assert_eq!(tree.leaf_at(PixelPoint::new(150, 90)), leaf_b);
        assert_eq!(tree.leaf_at(PixelPoint::new(102, 50)), None);
    }

    #[test]
    fn minimum_size_sums_along_axis() {
        let (tree, host, _, _) = side_by_side(0.5);
        assert_eq!(tree.minimum_size(&host), Size::new(20 + 30 + 4, 40));
    }

    #[test]
    fn minimum_size_includes_insets() {
        let (mut tree, host, _, _) = side_by_side(0.5);
        tree.set_space(CoordinateSpace::new(Size::new(204, 100), Insets::new(1, 2, 3, 4)));
        assert_eq!(tree.minimum_size(&host), Size::new(54 + 6, 40 + 4));
    }

    #[test]
    fn minimum_policy_keeps_children_visible() {
        let (mut tree, mut host, a, _) = side_by_side(0.01);
        tree.update_bounds(&mut host, &MinimumSizeDividerPolicy);
        let left = host.bounds(a).expect("a laid out");
        assert!(left.width >= 20, "left width {} below minimum", left.width);

        let branch = tree.root_child().expect("split node");
        let stored = tree.node(branch).and_then(SplitNodeRecord::branch).map(|b| b.divider);
        assert_eq!(stored, Some(0.01));
    }

    #[test]
    fn drag_divider_follows_pointer() {
        let (mut tree, mut host, _, _) = side_by_side(0.5);
        tree.update_bounds(&mut host, &UnconstrainedDividerPolicy);
        let branch = tree.root_child().expect("split node");
        let divider = tree
            .drag_divider(branch, PixelPoint::new(51, 10), &host, &UnconstrainedDividerPolicy)
            .expect("drag");
        assert!((divider - 0.25).abs() < 1e-9);

        let clamped = tree
            .drag_divider(branch, PixelPoint::new(1, 10), &host, &MinimumSizeDividerPolicy)
            .expect("drag");
        assert!((clamped - 22.0 / 204.0).abs() < 1e-9);
    }

    #[test]
    fn set_divider_rejects_out_of_range() {
        let (mut tree, _, _, _) = side_by_side(0.5);
        let branch = tree.root_child().expect("split node");
        assert_eq!(
            tree.set_divider(branch, 1.2),
            Err(SplitDockError::InvalidDivider { divider: 1.2 })
        );
        let leaf = tree.leaves()[0];
        assert_eq!(
            tree.set_divider(leaf, 0.3),
            Err(SplitDockError::NotABranch { node_id: leaf })
        );
        tree.set_divider(branch, 0.3).expect("in range");
    }

    #[test]
    fn remove_promotes_sibling() {
        let (mut tree, _, a, b) = side_by_side(0.5);
        let leaf_b = tree.leaf_of(b).expect("b present");
        tree.remove_element(a).expect("remove a");
        tree.validate().expect("still valid");
        assert_eq!(tree.root_child(), Some(leaf_b));
        assert_eq!(tree.node(leaf_b).and_then(|r| r.parent), Some(tree.root()));

        tree.remove_element(b).expect("remove b");
        assert!(tree.is_empty());
        assert_eq!(
            tree.remove_element(b),
            Err(SplitDockError::UnknownElement { element: b })
        );
    }

    #[test]
    fn attaching_twice_is_structural_error() {
        let (mut tree, _, _, _) = side_by_side(0.5);
        let leaves = tree.leaves();
        let fresh = tree.allocate_node_id().expect("id");
        let err = tree
            .insert_branch(fresh, Orientation::Vertical, 0.5, leaves[0], leaves[1])
            .expect_err("children already attached");
        assert!(matches!(err, SplitDockError::AlreadyAttached { .. }));
        assert_eq!(err.category(), crate::error::ErrorCategory::Structural);
    }

    #[test]
    fn root_cannot_become_a_child() {
        let (mut tree, _, _, _) = side_by_side(0.5);
        let leaf = tree.leaves()[0];
        let fresh = tree.allocate_node_id().expect("id");
        let err = tree
            .insert_branch(fresh, Orientation::Vertical, 0.5, tree.root(), leaf)
            .expect_err("root is never a child");
        assert!(matches!(err, SplitDockError::WouldCycle { .. }));
    }

    #[test]
    fn validate_detects_dangling_records() {
        let (mut tree, _, _, b) = side_by_side(0.5);
        let leaf_b = tree.leaf_of(b).expect("b present");
        let _ = tree.detach_leaf(leaf_b).expect("detach");
        assert_eq!(
            tree.validate(),
            Err(SplitDockError::UnreachableNode { node_id: leaf_b })
        );
    }

    #[test]
    fn maximized_leaf_takes_the_surface() {
        let (mut tree, mut host, a, b) = side_by_side(0.5);
        let leaf_b = tree.leaf_of(b);
        tree.set_maximized(leaf_b).expect("maximize");
        tree.update_bounds(&mut host, &UnconstrainedDividerPolicy);
        assert_eq!(host.bounds(b), Some(PixelRect::new(0, 0, 204, 100)));
        assert_eq!(host.bounds(a), Some(PixelRect::default()));
        assert_eq!(tree.leaf_at(PixelPoint::new(3, 3)), leaf_b);
        assert_eq!(tree.divider_at(PixelPoint::new(102, 50)), None);

        let branch = tree.root_child().expect("split node");
        assert_eq!(
            tree.set_maximized(Some(branch)),
            Err(SplitDockError::NotALeaf { node_id: branch })
        );
        tree.remove_element(b).expect("remove");
        assert_eq!(tree.maximized(), None);
    }

    #[test]
    fn claim_prefers_free_ids() {
        let mut tree = SplitTree::new(0);
        assert_eq!(tree.claim_node_id(Some(id(10))), Ok(id(10)));
        assert_eq!(tree.next_id(), id(11));
        assert_eq!(tree.claim_node_id(Some(tree.root())), Ok(id(11)));
    }
}
