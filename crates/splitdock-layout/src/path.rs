//! Addressing a leaf by the turns taken from the root.
//!
//! A [`DockPath`] records, for every split node above a leaf, which side the
//! leaf is on and how much of the node that side takes. Applying a path to a
//! tree that has changed since is lossy: where the recorded turns no longer
//! match, the path is read as a rectangle and the element is placed near it.

use serde::{Deserialize, Serialize};
use splitdock_core::{DockableHost, DockableId, Rect};
use tracing::debug;

use crate::error::SplitDockError;
use crate::policy::AcceptancePolicy;
use crate::put::{DropContext, clamp_fraction, classify};
use crate::tree::{NodeId, Orientation, SplitNodeKind, SplitTree};

/// Share of a node that must overlap a fallback rectangle to stack onto it.
const COMBINE_OVERLAP: f64 = 0.75;

/// Side of a split node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathLocation {
    Left,
    Right,
    Top,
    Bottom,
}

impl PathLocation {
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        match self {
            Self::Left | Self::Right => Orientation::Horizontal,
            Self::Top | Self::Bottom => Orientation::Vertical,
        }
    }

    /// The first (left/top) child.
    #[must_use]
    pub const fn is_first(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }

    const fn of(orientation: Orientation, first: bool) -> Self {
        match (orientation, first) {
            (Orientation::Horizontal, true) => Self::Left,
            (Orientation::Horizontal, false) => Self::Right,
            (Orientation::Vertical, true) => Self::Top,
            (Orientation::Vertical, false) => Self::Bottom,
        }
    }
}

/// One turn of a [`DockPath`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    pub location: PathLocation,
    /// Fraction of the node taken by the side in `location`.
    pub size: f64,
    /// Split node the step was recorded at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
}

/// Location of a leaf, from the root down.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockPath {
    pub steps: Vec<PathStep>,
    /// Leaf the path was recorded from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_id: Option<NodeId>,
}

impl DockPath {
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The relative rectangle the path describes, ignoring divider gaps.
    #[must_use]
    pub fn to_rect(&self) -> Rect {
        let mut rect = Rect::UNIT;
        for step in &self.steps {
            let size = step.size.clamp(0.0, 1.0);
            match step.location {
                PathLocation::Left => rect.width *= size,
                PathLocation::Right => {
                    rect.x += rect.width * (1.0 - size);
                    rect.width *= size;
                }
                PathLocation::Top => rect.height *= size,
                PathLocation::Bottom => {
                    rect.y += rect.height * (1.0 - size);
                    rect.height *= size;
                }
            }
        }
        rect
    }
}

/// Where following a path ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathEnd {
    /// The tree has no leaves.
    Empty,
    /// Every step matched; the node reached.
    Reached(NodeId),
    /// A leaf was reached with `remaining` steps left.
    Early { leaf: NodeId, remaining: usize },
    /// A split node's orientation disagrees with its step.
    Diverged,
}

impl SplitTree {
    /// Record the path from the root to `leaf`.
    pub fn create_path_from_leaf(&self, leaf: NodeId) -> Result<DockPath, SplitDockError> {
        let record = self
            .node(leaf)
            .ok_or(SplitDockError::MissingNode { node_id: leaf })?;
        if !record.is_leaf() {
            return Err(SplitDockError::NotALeaf { node_id: leaf });
        }

        let mut steps = Vec::new();
        let mut current = leaf;
        let mut parent = record.parent;
        while let Some(parent_id) = parent {
            let parent_record = self
                .node(parent_id)
                .ok_or(SplitDockError::MissingNode { node_id: parent_id })?;
            let SplitNodeKind::Node(branch) = parent_record.kind else {
                break;
            };
            let first = branch.first == current;
            steps.push(PathStep {
                location: PathLocation::of(branch.orientation, first),
                size: if first {
                    branch.divider
                } else {
                    1.0 - branch.divider
                },
                node_id: Some(parent_id),
            });
            current = parent_id;
            parent = parent_record.parent;
        }
        steps.reverse();
        Ok(DockPath {
            steps,
            leaf_id: Some(leaf),
        })
    }

    /// Put `element` where `path` points.
    ///
    /// Returns `Ok(false)` if the element would have to be stacked onto
    /// another one and that combination is refused; the tree is unchanged in
    /// that case.
    pub fn apply_path<H>(
        &mut self,
        path: &DockPath,
        element: DockableId,
        host: &mut H,
        context: DropContext<'_>,
    ) -> Result<bool, SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        if let PathEnd::Reached(node) = self.follow(path)
            && self.node(node).and_then(|record| record.element()) == Some(element)
        {
            return Ok(true);
        }

        if let Some(leaf) = self.stacked_leaf_of(element, &*host) {
            return Err(SplitDockError::ElementStacked { element, leaf });
        }
        let mut working = self.clone();
        if let Some(existing) = working.leaf_of(element) {
            let _ = working.detach_leaf(existing)?;
            working.discard(&[existing]);
            working.refresh_relative_bounds();
        }
        let Some(leaf) = working.apply_path_inner(path, element, host, context)? else {
            return Ok(false);
        };
        working.validate()?;
        working.validate_members(&*host)?;
        working.refresh_relative_bounds();
        debug!(element = %element, leaf = ?leaf, steps = path.len(), "path applied");
        *self = working;
        Ok(true)
    }

    fn apply_path_inner<H>(
        &mut self,
        path: &DockPath,
        element: DockableId,
        host: &mut H,
        context: DropContext<'_>,
    ) -> Result<Option<NodeId>, SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        match self.follow(path) {
            PathEnd::Empty => self.place_path_leaf(element, path.leaf_id).map(Some),
            PathEnd::Reached(node) if self.node(node).is_some_and(|record| record.is_leaf()) => {
                self.combine_or_refuse(node, element, host, context.acceptance)
            }
            PathEnd::Early { leaf, remaining } => {
                let Some(step) = path.steps.get(remaining) else {
                    return self.combine_or_refuse(leaf, element, host, context.acceptance);
                };
                let size = clamp_fraction(step.size, 0.0);
                let divider = if step.location.is_first() {
                    size
                } else {
                    1.0 - size
                };
                self.split_node(
                    leaf,
                    step.location.orientation(),
                    divider,
                    element,
                    step.location.is_first(),
                    path.leaf_id,
                )
                .map(Some)
            }
            PathEnd::Reached(_) | PathEnd::Diverged => {
                self.place_near(path.to_rect(), element, path.leaf_id, host, context)
            }
        }
    }

    fn follow(&self, path: &DockPath) -> PathEnd {
        let Some(mut current) = self.root_child() else {
            return PathEnd::Empty;
        };
        for (index, step) in path.steps.iter().enumerate() {
            match self.node(current).map(|record| record.kind) {
                Some(SplitNodeKind::Node(branch)) => {
                    if branch.orientation != step.location.orientation() {
                        return PathEnd::Diverged;
                    }
                    current = if step.location.is_first() {
                        branch.first
                    } else {
                        branch.second
                    };
                }
                Some(SplitNodeKind::Leaf { .. }) => {
                    return PathEnd::Early {
                        leaf: current,
                        remaining: index,
                    };
                }
                Some(SplitNodeKind::Root { .. }) | None => return PathEnd::Diverged,
            }
        }
        PathEnd::Reached(current)
    }

    /// Place `element` relative to the node that best covers `rect`.
    fn place_near<H>(
        &mut self,
        rect: Rect,
        element: DockableId,
        leaf_id: Option<NodeId>,
        host: &mut H,
        context: DropContext<'_>,
    ) -> Result<Option<NodeId>, SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        let mut best: Option<(NodeId, f64)> = None;
        let mut nearest: Option<(NodeId, f64)> = None;
        let (cx, cy) = rect.center();
        for id in self.preorder() {
            let Some(record) = self.node(id) else {
                continue;
            };
            if matches!(record.kind, SplitNodeKind::Root { .. }) {
                continue;
            }
            let bounds = record.bounds;
            let overlap = bounds.intersection_opt(&rect).map_or(0.0, |shared| shared.area());
            let union = bounds.area() + rect.area() - overlap;
            let score = if union > 0.0 { overlap / union } else { 0.0 };
            if score > 0.0 && best.is_none_or(|(_, top)| score > top) {
                best = Some((id, score));
            }
            let (bx, by) = bounds.center();
            let distance = (bx - cx).powi(2) + (by - cy).powi(2);
            if record.is_leaf() && nearest.is_none_or(|(_, closest)| distance < closest) {
                nearest = Some((id, distance));
            }
        }

        let Some((target, score)) = best.or(nearest) else {
            return self.place_path_leaf(element, leaf_id).map(Some);
        };
        let Some(record) = self.node(target) else {
            return Err(SplitDockError::MissingNode { node_id: target });
        };
        let bounds = record.bounds;
        if record.is_leaf() && score >= COMBINE_OVERLAP {
            debug!(target_node = ?target, score, "path fallback stacks");
            return self.combine_or_refuse(target, element, host, context.acceptance);
        }

        let put = classify(bounds, cx, cy);
        let Some(orientation) = put.orientation() else {
            return self.combine_or_refuse(target, element, host, context.acceptance);
        };
        let ratio = match orientation {
            Orientation::Horizontal if bounds.width > 0.0 => rect.width / bounds.width,
            Orientation::Vertical if bounds.height > 0.0 => rect.height / bounds.height,
            _ => 0.5,
        };
        let fraction = clamp_fraction(ratio, context.config.put_divider_min);
        let divider = if put.is_first() {
            fraction
        } else {
            1.0 - fraction
        };
        debug!(target_node = ?target, put = ?put, divider, "path fallback splits");
        self.split_node(target, orientation, divider, element, put.is_first(), leaf_id)
            .map(Some)
    }

    fn combine_or_refuse<H>(
        &mut self,
        target: NodeId,
        element: DockableId,
        host: &mut H,
        acceptance: Option<&dyn AcceptancePolicy>,
    ) -> Result<Option<NodeId>, SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        match self.combine_into(target, element, host, acceptance) {
            Ok(leaf) => Ok(Some(leaf)),
            Err(SplitDockError::Rejected { parent, child }) => {
                debug!(parent = %parent, child = %child, "path target refused element");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn place_path_leaf(
        &mut self,
        element: DockableId,
        leaf_id: Option<NodeId>,
    ) -> Result<NodeId, SplitDockError> {
        let leaf = self.claim_node_id(leaf_id)?;
        self.insert_leaf(leaf, element);
        self.set_root_child(Some(leaf))?;
        Ok(leaf)
    }
}
