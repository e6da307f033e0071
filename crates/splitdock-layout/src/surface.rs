//! A docking surface: one split tree, its host and its strategies.
//!
//! [`DockSurface`] is the entry point for applications. It owns the
//! [`SplitTree`] together with the [`DockableHost`] that paints it, the
//! configuration, a [`DividerPolicy`] and an optional global
//! [`AcceptancePolicy`], and recomputes pixel bounds after every change.

use std::fmt;

use splitdock_core::{DockableHost, DockableId, Insets, PixelPoint, PixelRect, Size};
use tracing::debug;

use crate::config::{ConfigError, SplitLayoutConfig};
use crate::coords::CoordinateSpace;
use crate::error::SplitDockError;
use crate::grid::SplitDockGrid;
use crate::interchange::{Key, SplitDockTree};
use crate::path::DockPath;
use crate::persist::{ElementIdMap, SplitLayoutSnapshot};
use crate::policy::{AcceptancePolicy, DividerPolicy, MinimumSizeDividerPolicy};
use crate::put::{DropContext, PutInfo};
use crate::tree::{NodeId, SplitTree};

/// A split layout bound to a host.
pub struct DockSurface<H> {
    tree: SplitTree,
    host: H,
    config: SplitLayoutConfig,
    divider_policy: Box<dyn DividerPolicy>,
    acceptance: Option<Box<dyn AcceptancePolicy>>,
}

impl<H: fmt::Debug> fmt::Debug for DockSurface<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DockSurface")
            .field("tree", &self.tree)
            .field("host", &self.host)
            .field("config", &self.config)
            .field("global_acceptance", &self.acceptance.is_some())
            .finish_non_exhaustive()
    }
}

fn drop_context<'a>(
    config: &'a SplitLayoutConfig,
    acceptance: &'a Option<Box<dyn AcceptancePolicy>>,
) -> DropContext<'a> {
    DropContext::new(config).with_acceptance(acceptance.as_deref())
}

impl<H: DockableHost> DockSurface<H> {
    /// An empty surface with the default configuration.
    pub fn new(host: H) -> Self {
        let config = SplitLayoutConfig::default();
        Self {
            tree: SplitTree::new(config.divider_size),
            host,
            config,
            divider_policy: Box::new(MinimumSizeDividerPolicy),
            acceptance: None,
        }
    }

    /// An empty surface with `config`, which must validate.
    pub fn with_config(host: H, config: SplitLayoutConfig) -> Result<Self, ConfigError> {
        let config = config.checked()?;
        Ok(Self {
            tree: SplitTree::new(config.divider_size),
            host,
            config,
            divider_policy: Box::new(MinimumSizeDividerPolicy),
            acceptance: None,
        })
    }

    /// Replace the divider policy.
    #[must_use]
    pub fn with_divider_policy(mut self, policy: impl DividerPolicy + 'static) -> Self {
        self.divider_policy = Box::new(policy);
        self
    }

    /// Install a global acceptance policy consulted on every combination.
    #[must_use]
    pub fn with_acceptance(mut self, policy: impl AcceptancePolicy + 'static) -> Self {
        self.acceptance = Some(Box::new(policy));
        self
    }

    #[must_use]
    pub fn tree(&self) -> &SplitTree {
        &self.tree
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access. Call [`update_bounds`](Self::update_bounds)
    /// after changing anything that affects sizes.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn config(&self) -> &SplitLayoutConfig {
        &self.config
    }

    /// Give the surface a new pixel size.
    pub fn resize(&mut self, size: Size, insets: Insets) -> Result<(), SplitDockError> {
        if size.width < 0 || size.height < 0 {
            return Err(SplitDockError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }
        self.tree.set_space(CoordinateSpace::new(size, insets));
        self.update_bounds();
        Ok(())
    }

    /// Recompute bounds and push them to the host.
    pub fn update_bounds(&mut self) {
        self.tree
            .update_bounds(&mut self.host, self.divider_policy.as_ref());
    }

    /// Where `candidate` would land if released at `point`.
    #[must_use]
    pub fn get_put(&self, point: PixelPoint, candidate: DockableId) -> Option<PutInfo> {
        self.tree.get_put(
            point,
            candidate,
            &self.host,
            drop_context(&self.config, &self.acceptance),
        )
    }

    /// Perform a resolved drop.
    pub fn apply_put(&mut self, info: &PutInfo) -> Result<NodeId, SplitDockError> {
        let leaf = self.tree.apply_put(
            info,
            &mut self.host,
            drop_context(&self.config, &self.acceptance),
        )?;
        self.update_bounds();
        Ok(leaf)
    }

    /// Resolve and perform a drop in one go. `Ok(None)` if nothing accepts
    /// the element at `point`.
    pub fn drop_at(
        &mut self,
        point: PixelPoint,
        candidate: DockableId,
    ) -> Result<Option<NodeId>, SplitDockError> {
        match self.get_put(point, candidate) {
            Some(info) => self.apply_put(&info).map(Some),
            None => Ok(None),
        }
    }

    /// Rebuild the layout from `layout`.
    pub fn evolve(&mut self, layout: &SplitDockTree) -> Result<(), SplitDockError> {
        self.tree
            .evolve(layout, &mut self.host, self.acceptance.as_deref())?;
        self.update_bounds();
        Ok(())
    }

    /// Rebuild the subtree at `target` from `key`.
    pub fn evolve_at(
        &mut self,
        target: NodeId,
        layout: &SplitDockTree,
        key: Key,
    ) -> Result<(), SplitDockError> {
        self.tree
            .evolve_at(target, layout, key, &mut self.host, self.acceptance.as_deref())?;
        self.update_bounds();
        Ok(())
    }

    /// Capture the layout as keys.
    pub fn submit(&self) -> Result<SplitDockTree, SplitDockError> {
        self.tree.submit(&self.host)
    }

    /// Replace the layout with the conversion of `grid`.
    pub fn apply_grid(&mut self, grid: &SplitDockGrid) -> Result<(), SplitDockError> {
        let layout = grid.to_tree_with(&self.config.grid)?;
        debug!(rectangles = grid.len(), keys = layout.len(), "grid converted");
        self.evolve(&layout)
    }

    /// Path to the leaf showing `element`.
    pub fn create_path(&self, element: DockableId) -> Result<DockPath, SplitDockError> {
        let leaf = self
            .tree
            .leaf_of(element)
            .ok_or(SplitDockError::UnknownElement { element })?;
        self.tree.create_path_from_leaf(leaf)
    }

    pub fn create_path_from_leaf(&self, leaf: NodeId) -> Result<DockPath, SplitDockError> {
        self.tree.create_path_from_leaf(leaf)
    }

    /// Put `element` where `path` points. `Ok(false)` if it would have to be
    /// stacked and that was refused.
    pub fn apply_path(
        &mut self,
        path: &DockPath,
        element: DockableId,
    ) -> Result<bool, SplitDockError> {
        let placed = self.tree.apply_path(
            path,
            element,
            &mut self.host,
            drop_context(&self.config, &self.acceptance),
        )?;
        if placed {
            self.update_bounds();
        }
        Ok(placed)
    }

    /// Take `element` out of the layout. Returns the removed leaf.
    pub fn remove(&mut self, element: DockableId) -> Result<NodeId, SplitDockError> {
        let leaf = self.tree.remove_element(element)?;
        self.update_bounds();
        Ok(leaf)
    }

    pub fn set_divider(&mut self, node: NodeId, divider: f64) -> Result<(), SplitDockError> {
        self.tree.set_divider(node, divider)?;
        self.update_bounds();
        Ok(())
    }

    /// Drag the divider of `node` to `point`. Returns the stored divider.
    pub fn drag_divider(&mut self, node: NodeId, point: PixelPoint) -> Result<f64, SplitDockError> {
        let divider =
            self.tree
                .drag_divider(node, point, &self.host, self.divider_policy.as_ref())?;
        self.update_bounds();
        Ok(divider)
    }

    #[must_use]
    pub fn divider_at(&self, point: PixelPoint) -> Option<NodeId> {
        self.tree.divider_at(point)
    }

    #[must_use]
    pub fn divider_bounds(&self, node: NodeId) -> Option<PixelRect> {
        self.tree.divider_bounds(node)
    }

    #[must_use]
    pub fn leaf_at(&self, point: PixelPoint) -> Option<NodeId> {
        self.tree.leaf_at(point)
    }

    /// Maximize the leaf showing `element`, or restore with `None`.
    pub fn maximize(&mut self, element: Option<DockableId>) -> Result<(), SplitDockError> {
        let leaf = match element {
            Some(element) => Some(
                self.tree
                    .leaf_of(element)
                    .ok_or(SplitDockError::UnknownElement { element })?,
            ),
            None => None,
        };
        self.tree.set_maximized(leaf)?;
        self.update_bounds();
        Ok(())
    }

    /// Element of the maximized leaf.
    #[must_use]
    pub fn maximized(&self) -> Option<DockableId> {
        self.tree
            .maximized()
            .and_then(|leaf| self.tree.node(leaf))
            .and_then(|record| record.element())
    }

    /// Smallest pixel size the surface can be laid out at.
    #[must_use]
    pub fn minimum_size(&self) -> Size {
        self.tree.minimum_size(&self.host)
    }

    #[must_use]
    pub fn write_snapshot(&self, ids: &ElementIdMap) -> SplitLayoutSnapshot {
        self.tree.write_snapshot(ids)
    }

    /// Replace the layout with a saved one.
    pub fn restore(
        &mut self,
        snapshot: &SplitLayoutSnapshot,
        ids: &ElementIdMap,
    ) -> Result<(), SplitDockError> {
        self.tree.read_snapshot(snapshot, ids)?;
        self.update_bounds();
        Ok(())
    }

    /// Give the host back.
    pub fn into_host(self) -> H {
        self.host
    }
}
