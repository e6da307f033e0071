//! Drop resolution.
//!
//! [`SplitTree::get_put`] answers "where would this element land if released
//! here" in `O(depth)`: split nodes send the pointer to exactly one child and
//! the leaf that receives it classifies the position. [`SplitTree::apply_put`]
//! performs the mutation a resolved [`PutInfo`] describes.

use splitdock_core::{DockableHost, DockableId, PixelPoint, Rect, Size};
use tracing::debug;

use crate::config::SplitLayoutConfig;
use crate::error::{SplitDockError, check_divider};
use crate::policy::{AcceptancePolicy, negotiate};
use crate::tree::{NodeId, Orientation, SplitBranch, SplitNodeKind, SplitNodeRecord, SplitTree};

/// Where, relative to its target, a dropped element lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Put {
    Top,
    Left,
    Right,
    Bottom,
    /// Stack onto the target's element.
    Center,
    /// Stack onto the target's element, released over its title strip.
    Title,
}

impl Put {
    /// Split orientation for directional puts.
    #[must_use]
    pub const fn orientation(self) -> Option<Orientation> {
        match self {
            Self::Left | Self::Right => Some(Orientation::Horizontal),
            Self::Top | Self::Bottom => Some(Orientation::Vertical),
            Self::Center | Self::Title => None,
        }
    }

    /// The dropped element becomes the first (left/top) child.
    #[must_use]
    pub const fn is_first(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }

    /// Whether the put combines rather than splits.
    #[must_use]
    pub const fn is_combine(self) -> bool {
        matches!(self, Self::Center | Self::Title)
    }
}

/// A resolved drop candidate. Valid only for the tree it was resolved on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PutInfo {
    pub target: NodeId,
    pub put: Put,
    pub element: DockableId,
    /// Divider of the split node a directional put creates.
    pub divider: f64,
    /// Pixel size the element had before the drag started.
    pub old_size: Option<Size>,
}

/// Configuration and global acceptance consulted while dropping.
#[derive(Clone, Copy)]
pub struct DropContext<'a> {
    pub config: &'a SplitLayoutConfig,
    pub acceptance: Option<&'a dyn AcceptancePolicy>,
}

impl<'a> DropContext<'a> {
    #[must_use]
    pub fn new(config: &'a SplitLayoutConfig) -> Self {
        Self {
            config,
            acceptance: None,
        }
    }

    #[must_use]
    pub fn with_acceptance(mut self, acceptance: Option<&'a dyn AcceptancePolicy>) -> Self {
        self.acceptance = acceptance;
        self
    }
}

impl SplitTree {
    /// Resolve a drop of `candidate` at `point`, or `None` if it would be
    /// refused or has nowhere to go.
    pub fn get_put<H>(
        &self,
        point: PixelPoint,
        candidate: DockableId,
        host: &H,
        context: DropContext<'_>,
    ) -> Option<PutInfo>
    where
        H: DockableHost + ?Sized,
    {
        if self.maximized().is_some() || self.stacked_leaf_of(candidate, host).is_some() {
            return None;
        }
        let space = self.space();
        let surface = space.surface();
        let snap_zone = surface.inflate(context.config.side_snap_size.max(0));

        let Some(child) = self.root_child() else {
            return snap_zone.contains(point).then_some(PutInfo {
                target: self.root(),
                put: Put::Center,
                element: candidate,
                divider: 0.5,
                old_size: None,
            });
        };

        let (x, y) = space.to_relative(point);
        if !surface.contains(point) {
            if !snap_zone.contains(point)
                || self.node(child).and_then(SplitNodeRecord::element) == Some(candidate)
            {
                return None;
            }
            let put = classify(Rect::UNIT, x, y);
            return Some(self.split_put(child, put, candidate, host, context.config));
        }

        let mut current = child;
        loop {
            let record = self.node(current)?;
            match record.kind {
                SplitNodeKind::Node(branch) => current = self.descend(&branch, x, y)?,
                SplitNodeKind::Leaf { element } => {
                    return self.leaf_put(record, element, point, candidate, host, context);
                }
                SplitNodeKind::Root { .. } => return None,
            }
        }
    }

    /// Perform the drop `info` describes.
    ///
    /// An element already in the tree is moved. Returns the leaf that shows
    /// the element afterwards (for combining puts, the leaf of the composite).
    pub fn apply_put<H>(
        &mut self,
        info: &PutInfo,
        host: &mut H,
        context: DropContext<'_>,
    ) -> Result<NodeId, SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        let mut working = self.clone();
        let leaf = working.apply_put_inner(info, host, context.acceptance)?;
        working.validate()?;
        working.validate_members(&*host)?;
        working.refresh_relative_bounds();
        debug!(target_node = ?info.target, put = ?info.put, element = %info.element, leaf = ?leaf, "drop applied");
        *self = working;
        Ok(leaf)
    }

    fn apply_put_inner<H>(
        &mut self,
        info: &PutInfo,
        host: &mut H,
        acceptance: Option<&dyn AcceptancePolicy>,
    ) -> Result<NodeId, SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        let mut target = info.target;
        if self.node(target).is_none() {
            return Err(SplitDockError::MissingNode { node_id: target });
        }

        if let Some(leaf) = self.stacked_leaf_of(info.element, &*host) {
            return Err(SplitDockError::ElementStacked {
                element: info.element,
                leaf,
            });
        }
        if let Some(existing) = self.leaf_of(info.element) {
            if existing == target {
                return Ok(existing);
            }
            let detached = self.detach_leaf(existing)?;
            self.discard(&[existing]);
            if detached.parent == target {
                target = detached.sibling.unwrap_or(self.root());
            }
        }

        let Some(orientation) = info.put.orientation() else {
            return self.combine_into(target, info.element, host, acceptance);
        };
        let divider = check_divider(info.divider)?;
        if target == self.root() {
            match self.root_child() {
                Some(child) => target = child,
                None => return self.place_first_leaf(info.element),
            }
        }
        self.split_node(
            target,
            orientation,
            divider,
            info.element,
            info.put.is_first(),
            None,
        )
    }

    /// Stack `element` onto the leaf `target`, or make it the only leaf of an
    /// empty tree.
    pub(crate) fn combine_into<H>(
        &mut self,
        target: NodeId,
        element: DockableId,
        host: &mut H,
        acceptance: Option<&dyn AcceptancePolicy>,
    ) -> Result<NodeId, SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        let record = self
            .node(target)
            .ok_or(SplitDockError::MissingNode { node_id: target })?;
        match record.kind {
            SplitNodeKind::Root { child: None } => self.place_first_leaf(element),
            SplitNodeKind::Leaf { element: existing } => {
                if !negotiate(&*host, acceptance, existing, element) {
                    return Err(SplitDockError::Rejected {
                        parent: existing,
                        child: element,
                    });
                }
                let composite = host.combine(existing, element);
                self.set_leaf_element(target, composite)?;
                Ok(target)
            }
            SplitNodeKind::Root { child: Some(_) } | SplitNodeKind::Node(_) => {
                Err(SplitDockError::NotALeaf { node_id: target })
            }
        }
    }

    pub(crate) fn place_first_leaf(&mut self, element: DockableId) -> Result<NodeId, SplitDockError> {
        let leaf = self.allocate_node_id()?;
        self.insert_leaf(leaf, element);
        self.set_root_child(Some(leaf))?;
        Ok(leaf)
    }

    fn descend(&self, branch: &SplitBranch, x: f64, y: f64) -> Option<NodeId> {
        let first = self.node(branch.first)?.bounds;
        let second = self.node(branch.second)?.bounds;
        let toward_first = match branch.orientation {
            Orientation::Horizontal => x < (first.right() + second.x) / 2.0,
            Orientation::Vertical => y < (first.bottom() + second.y) / 2.0,
        };
        Some(if toward_first {
            branch.first
        } else {
            branch.second
        })
    }

    fn leaf_put<H>(
        &self,
        record: &SplitNodeRecord,
        element: DockableId,
        point: PixelPoint,
        candidate: DockableId,
        host: &H,
        context: DropContext<'_>,
    ) -> Option<PutInfo>
    where
        H: DockableHost + ?Sized,
    {
        if element == candidate {
            return None;
        }
        let combine = |put: Put| {
            negotiate(host, context.acceptance, element, candidate).then_some(PutInfo {
                target: record.id,
                put,
                element: candidate,
                divider: 0.5,
                old_size: None,
            })
        };

        if let Some(strip) = host.title_strip(element)
            && strip
                .area(self.space().to_pixels(record.bounds))
                .contains(point)
        {
            return combine(Put::Title);
        }

        let bounds = record.bounds;
        let (x, y) = self.space().to_relative(point);
        if !bounds.is_empty() {
            let half = context.config.center_fraction / 2.0;
            let fx = (x - bounds.x) / bounds.width;
            let fy = (y - bounds.y) / bounds.height;
            if (fx - 0.5).abs() <= half && (fy - 0.5).abs() <= half {
                return combine(Put::Center);
            }
        }

        let put = classify(bounds, x, y);
        Some(self.split_put(record.id, put, candidate, host, context.config))
    }

    fn split_put<H>(
        &self,
        target: NodeId,
        put: Put,
        candidate: DockableId,
        host: &H,
        config: &SplitLayoutConfig,
    ) -> PutInfo
    where
        H: DockableHost + ?Sized,
    {
        let old_size = match self.leaf_of(candidate) {
            Some(leaf) => self.pixel_bounds(leaf).map(|bounds| bounds.size()),
            None => Some(host.preferred_size(candidate)),
        };
        let extent = self.pixel_bounds(target).map(|bounds| bounds.size());
        PutInfo {
            target,
            put,
            element: candidate,
            divider: split_divider(put, old_size, extent, config.put_divider_min),
            old_size,
        }
    }
}

/// Divider that gives the dropped element roughly its old size.
pub(crate) fn split_divider(put: Put, old_size: Option<Size>, target: Option<Size>, minimum: f64) -> f64 {
    let (Some(old_size), Some(target), Some(orientation)) = (old_size, target, put.orientation()) else {
        return 0.5;
    };
    let (wanted, extent) = match orientation {
        Orientation::Horizontal => (old_size.width, target.width),
        Orientation::Vertical => (old_size.height, target.height),
    };
    if wanted <= 0 || extent <= 0 {
        return 0.5;
    }
    let fraction = clamp_fraction(f64::from(wanted) / f64::from(extent), minimum);
    if put.is_first() { fraction } else { 1.0 - fraction }
}

/// Clamp to `[minimum, 1 - minimum]`, with `minimum` itself kept in `[0, 0.5]`.
pub(crate) fn clamp_fraction(value: f64, minimum: f64) -> f64 {
    let minimum = if minimum.is_finite() {
        minimum.clamp(0.0, 0.5)
    } else {
        0.0
    };
    if value.is_nan() {
        return 0.5;
    }
    value.clamp(minimum, 1.0 - minimum)
}

/// Side of `bounds` a point is closest to, judged by the two diagonals.
pub(crate) fn classify(bounds: Rect, x: f64, y: f64) -> Put {
    let falling = above(bounds.x, bounds.y, bounds.right(), bounds.bottom(), x, y);
    let rising = above(bounds.x, bounds.bottom(), bounds.right(), bounds.y, x, y);
    match (falling, rising) {
        (true, true) => Put::Top,
        (true, false) => Put::Right,
        (false, true) => Put::Left,
        (false, false) => Put::Bottom,
    }
}

/// Whether `(x, y)` lies above (smaller y) the line through the two points.
fn above(x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) -> bool {
    let a = y2 - y1;
    let b = x1 - x2;
    if b == 0.0 {
        return y < (y1 + y2) / 2.0;
    }
    let c = a * x1 + b * y1;
    let side = a * x + b * y - c;
    side * -b.signum() > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::CoordinateSpace;
    use crate::error::ErrorCategory;
    use crate::policy::UnconstrainedDividerPolicy;
    use splitdock_core::{Insets, MemoryHost, PixelRect, TitleSide, TitleStrip};

    fn surface(width: i32, height: i32) -> (SplitTree, MemoryHost) {
        let mut tree = SplitTree::new(4);
        tree.set_space(CoordinateSpace::new(Size::new(width, height), Insets::default()));
        (tree, MemoryHost::new())
    }

    fn drop_at(
        tree: &mut SplitTree,
        host: &mut MemoryHost,
        config: &SplitLayoutConfig,
        point: PixelPoint,
        element: DockableId,
    ) -> Option<NodeId> {
        let info = tree.get_put(point, element, &*host, DropContext::new(config))?;
        let leaf = tree
            .apply_put(&info, host, DropContext::new(config))
            .expect("drop applies");
        tree.update_bounds(host, &UnconstrainedDividerPolicy);
        Some(leaf)
    }

    #[test]
    fn classify_by_diagonals() {
        let bounds = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(classify(bounds, 0.5, 0.1), Put::Top);
        assert_eq!(classify(bounds, 0.9, 0.5), Put::Right);
        assert_eq!(classify(bounds, 0.1, 0.5), Put::Left);
        assert_eq!(classify(bounds, 0.5, 0.9), Put::Bottom);

        let wide = Rect::new(0.2, 0.0, 0.8, 0.2);
        assert_eq!(classify(wide, 0.3, 0.1), Put::Left);
        assert_eq!(classify(wide, 0.6, 0.02), Put::Top);
    }

    #[test]
    fn empty_surface_resolves_to_center_at_root() {
        let (tree, mut host) = surface(200, 100);
        let a = host.add_element(Size::ZERO);
        let config = SplitLayoutConfig::default();
        let info = tree
            .get_put(PixelPoint::new(50, 50), a, &host, DropContext::new(&config))
            .expect("empty surface accepts");
        assert_eq!(info.target, tree.root());
        assert_eq!(info.put, Put::Center);
        assert!(
            tree.get_put(PixelPoint::new(500, 50), a, &host, DropContext::new(&config))
                .is_none()
        );
    }

    #[test]
    fn right_drop_with_divider_builds_horizontal_node() {
        let (mut tree, mut host) = surface(200, 100);
        let a = host.add_element(Size::ZERO);
        let b = host.add_element(Size::ZERO);
        let config = SplitLayoutConfig::default();
        let leaf_a = tree.place_first_leaf(a).expect("first leaf");

        let info = PutInfo {
            target: leaf_a,
            put: Put::Right,
            element: b,
            divider: 0.6,
            old_size: None,
        };
        let leaf_b = tree
            .apply_put(&info, &mut host, DropContext::new(&config))
            .expect("split");

        let node = tree.root_child().expect("root has child");
        let branch = *tree.node(node).and_then(SplitNodeRecord::branch).expect("split node");
        assert_eq!(branch.orientation, Orientation::Horizontal);
        assert_eq!(branch.divider, 0.6);
        assert_eq!(branch.first, leaf_a);
        assert_eq!(branch.second, leaf_b);
        assert_eq!(tree.elements(), vec![a, b]);
    }

    #[test]
    fn center_requires_mutual_acceptance() {
        let (mut tree, mut host) = surface(200, 100);
        let a = host.add_element(Size::ZERO);
        let b = host.add_element(Size::ZERO);
        let config = SplitLayoutConfig::default();
        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(10, 10), a);

        let center = PixelPoint::new(100, 50);
        let info = tree
            .get_put(center, b, &host, DropContext::new(&config))
            .expect("mutual acceptance");
        assert_eq!(info.put, Put::Center);

        host.reject(b, a);
        assert!(tree.get_put(center, b, &host, DropContext::new(&config)).is_none());
    }

    #[test]
    fn global_policy_can_veto_center() {
        let (mut tree, mut host) = surface(200, 100);
        let a = host.add_element(Size::ZERO);
        let b = host.add_element(Size::ZERO);
        let config = SplitLayoutConfig::default();
        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(10, 10), a);

        let veto = |_: DockableId, _: DockableId| false;
        let context = DropContext::new(&config).with_acceptance(Some(&veto));
        assert!(tree.get_put(PixelPoint::new(100, 50), b, &host, context).is_none());
        // Splits need no negotiation.
        let edge = tree
            .get_put(PixelPoint::new(195, 50), b, &host, context)
            .expect("split");
        assert_eq!(edge.put, Put::Right);
    }

    #[test]
    fn candidate_over_itself_is_refused() {
        let (mut tree, mut host) = surface(200, 100);
        let a = host.add_element(Size::ZERO);
        let config = SplitLayoutConfig::default();
        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(10, 10), a);
        assert!(
            tree.get_put(PixelPoint::new(100, 50), a, &host, DropContext::new(&config))
                .is_none()
        );
        assert!(
            tree.get_put(PixelPoint::new(-5, 50), a, &host, DropContext::new(&config))
                .is_none()
        );
    }

    #[test]
    fn divider_preserves_preferred_size() {
        let (mut tree, mut host) = surface(400, 100);
        let a = host.add_element(Size::ZERO);
        let b = host.add_element(Size::ZERO);
        host.set_preferred_size(b, Size::new(100, 100));
        let config = SplitLayoutConfig::default();
        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(10, 10), a);

        let info = tree
            .get_put(PixelPoint::new(395, 50), b, &host, DropContext::new(&config))
            .expect("edge drop");
        assert_eq!(info.put, Put::Right);
        assert_eq!(info.old_size, Some(Size::new(100, 100)));
        assert!((info.divider - 0.75).abs() < 1e-12);

        let left = tree
            .get_put(PixelPoint::new(5, 50), b, &host, DropContext::new(&config))
            .expect("edge drop");
        assert_eq!(left.put, Put::Left);
        assert!((left.divider - 0.25).abs() < 1e-12);
    }

    #[test]
    fn divider_is_clamped_and_defaults_to_half() {
        assert_eq!(split_divider(Put::Left, Some(Size::new(390, 0)), Some(Size::new(400, 0)), 0.25), 0.75);
        assert_eq!(split_divider(Put::Bottom, Some(Size::new(0, 1)), Some(Size::new(0, 400)), 0.25), 0.75);
        assert_eq!(split_divider(Put::Top, None, Some(Size::new(10, 10)), 0.25), 0.5);
        assert_eq!(split_divider(Put::Center, Some(Size::new(1, 1)), Some(Size::new(10, 10)), 0.25), 0.5);
        assert_eq!(clamp_fraction(0.9, f64::NAN), 0.9);
    }

    #[test]
    fn title_strip_resolves_to_title() {
        let (mut tree, mut host) = surface(200, 100);
        let a = host.add_element(Size::ZERO);
        let b = host.add_element(Size::ZERO);
        host.set_title_strip(
            a,
            Some(TitleStrip {
                side: TitleSide::Top,
                thickness: 12,
            }),
        );
        let config = SplitLayoutConfig::default();
        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(10, 10), a);
        let info = tree
            .get_put(PixelPoint::new(100, 5), b, &host, DropContext::new(&config))
            .expect("title drop");
        assert_eq!(info.put, Put::Title);
    }

    #[test]
    fn descent_picks_one_child() {
        let (mut tree, mut host) = surface(200, 100);
        let a = host.add_element(Size::ZERO);
        let b = host.add_element(Size::ZERO);
        let c = host.add_element(Size::ZERO);
        let config = SplitLayoutConfig::default();
        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(10, 10), a);
        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(195, 50), b);

        let leaf_b = tree.leaf_of(b);
        let info = tree
            .get_put(PixelPoint::new(190, 97), c, &host, DropContext::new(&config))
            .expect("drop into b");
        assert_eq!(Some(info.target), leaf_b);
        assert_eq!(info.put, Put::Bottom);
    }

    #[test]
    fn side_snap_targets_whole_tree() {
        let (mut tree, mut host) = surface(200, 100);
        let a = host.add_element(Size::ZERO);
        let b = host.add_element(Size::ZERO);
        let c = host.add_element(Size::ZERO);
        let config = SplitLayoutConfig::default();
        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(10, 10), a);
        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(195, 50), b);

        let info = tree
            .get_put(PixelPoint::new(100, -10), c, &host, DropContext::new(&config))
            .expect("snap above the surface");
        assert_eq!(Some(info.target), tree.root_child());
        assert_eq!(info.put, Put::Top);
        assert!(
            tree.get_put(PixelPoint::new(100, -30), c, &host, DropContext::new(&config))
                .is_none()
        );

        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(100, -10), c);
        let top = tree.root_child().expect("new root child");
        let branch = *tree.node(top).and_then(SplitNodeRecord::branch).expect("split");
        assert_eq!(branch.orientation, Orientation::Vertical);
        assert_eq!(tree.node(branch.first).and_then(SplitNodeRecord::element), Some(c));
    }

    #[test]
    fn dropping_an_existing_element_moves_it() {
        let (mut tree, mut host) = surface(200, 100);
        let a = host.add_element(Size::ZERO);
        let b = host.add_element(Size::ZERO);
        let c = host.add_element(Size::ZERO);
        let config = SplitLayoutConfig::default();
        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(10, 10), a);
        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(195, 50), b);
        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(190, 97), c);
        assert_eq!(tree.elements(), vec![a, b, c]);

        // Move `a` onto the top edge of `b`.
        let moved = drop_at(&mut tree, &mut host, &config, PixelPoint::new(160, 2), a);
        assert!(moved.is_some());
        tree.validate().expect("valid after move");
        assert_eq!(tree.leaves().len(), 3);
        assert_eq!(tree.elements(), vec![a, b, c]);
        assert_eq!(host.bounds(a).map(|r| r.y), Some(0));
        assert!(host.bounds(b).is_some_and(|r| r.x == 0));
    }

    #[test]
    fn rejected_combine_leaves_tree_untouched() {
        let (mut tree, mut host) = surface(200, 100);
        let a = host.add_element(Size::ZERO);
        let b = host.add_element(Size::ZERO);
        let config = SplitLayoutConfig::default();
        let leaf_a = tree.place_first_leaf(a).expect("first leaf");
        host.refuse_all(b);
        let before = tree.clone();

        let err = tree
            .apply_put(
                &PutInfo {
                    target: leaf_a,
                    put: Put::Center,
                    element: b,
                    divider: 0.5,
                    old_size: None,
                },
                &mut host,
                DropContext::new(&config),
            )
            .expect_err("refused");
        assert_eq!(err.category(), ErrorCategory::Acceptance);
        assert_eq!(tree, before);
    }

    #[test]
    fn center_drop_combines_into_stack() {
        let (mut tree, mut host) = surface(200, 100);
        let a = host.add_element(Size::ZERO);
        let b = host.add_element(Size::ZERO);
        let config = SplitLayoutConfig::default();
        let leaf = drop_at(&mut tree, &mut host, &config, PixelPoint::new(10, 10), a);
        let combined = drop_at(&mut tree, &mut host, &config, PixelPoint::new(100, 50), b);
        assert_eq!(leaf, combined);

        let element = tree.elements()[0];
        assert!(host.is_stack(element));
        assert_eq!(host.bounds(element), Some(PixelRect::new(0, 0, 200, 100)));
    }

    #[test]
    fn stacked_member_cannot_be_dropped_again() {
        let (mut tree, mut host) = surface(200, 100);
        let a = host.add_element(Size::ZERO);
        let b = host.add_element(Size::ZERO);
        let config = SplitLayoutConfig::default();
        let leaf = drop_at(&mut tree, &mut host, &config, PixelPoint::new(10, 10), a)
            .expect("first leaf");
        let _ = drop_at(&mut tree, &mut host, &config, PixelPoint::new(100, 50), b);
        assert_eq!(tree.stacked_leaf_of(a, &host), Some(leaf));

        assert!(
            tree.get_put(PixelPoint::new(195, 50), a, &host, DropContext::new(&config))
                .is_none()
        );

        let before = tree.clone();
        let err = tree
            .apply_put(
                &PutInfo {
                    target: leaf,
                    put: Put::Right,
                    element: a,
                    divider: 0.5,
                    old_size: None,
                },
                &mut host,
                DropContext::new(&config),
            )
            .expect_err("member already shown");
        assert_eq!(err, SplitDockError::ElementStacked { element: a, leaf });
        assert_eq!(err.category(), ErrorCategory::Structural);
        assert_eq!(tree, before);
        tree.validate_members(&host).expect("members shown once");
    }

    #[test]
    fn composite_whose_member_is_shown_is_refused() {
        let (mut tree, mut host) = surface(200, 100);
        let a = host.add_element(Size::ZERO);
        let b = host.add_element(Size::ZERO);
        let c = host.add_element(Size::ZERO);
        let config = SplitLayoutConfig::default();
        let leaf_a = tree.place_first_leaf(a).expect("first leaf");
        let outside = host.combine(b, a);

        let err = tree
            .apply_put(
                &PutInfo {
                    target: leaf_a,
                    put: Put::Left,
                    element: outside,
                    divider: 0.5,
                    old_size: None,
                },
                &mut host,
                DropContext::new(&config),
            )
            .expect_err("a would be shown twice");
        assert_eq!(err, SplitDockError::DuplicateElement { element: a });

        let _ = tree
            .apply_put(
                &PutInfo {
                    target: leaf_a,
                    put: Put::Left,
                    element: c,
                    divider: 0.5,
                    old_size: None,
                },
                &mut host,
                DropContext::new(&config),
            )
            .expect("plain element splits");
    }
}
