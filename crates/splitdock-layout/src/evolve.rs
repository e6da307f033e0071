//! Conversion between the mutable tree and a [`SplitDockTree`].
//!
//! `evolve` rebuilds (part of) the tree from keys, reusing the leaves of
//! elements the tree already shows; `submit` reads the tree back into keys.

use rustc_hash::{FxHashMap, FxHashSet};
use splitdock_core::{DockableHost, DockableId};
use tracing::debug;

use crate::error::SplitDockError;
use crate::interchange::{BuildContext, Key, KeyKind, SplitDockTree};
use crate::policy::{AcceptancePolicy, negotiate};
use crate::tree::{NodeId, SplitNodeKind, SplitTree};

/// Leaves that may be picked up again while materializing keys.
#[derive(Debug, Default)]
struct Reusable {
    by_element: FxHashMap<DockableId, NodeId>,
    /// Composite elements with their members, in tab order.
    stacks: Vec<(Vec<DockableId>, DockableId)>,
}

impl SplitTree {
    /// Rebuild the whole tree to match `layout`. A layout without root key
    /// empties the tree.
    pub fn evolve<H>(
        &mut self,
        layout: &SplitDockTree,
        host: &mut H,
        acceptance: Option<&dyn AcceptancePolicy>,
    ) -> Result<(), SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        match layout.root_key() {
            Some(key) => self.evolve_at(self.root(), layout, key, host, acceptance),
            None => {
                let mut working = self.clone();
                if let Some(child) = working.root_child() {
                    let ids = working.collect_subtree_ids(child)?;
                    working.set_root_child(None)?;
                    working.discard(&ids);
                }
                working.validate()?;
                debug!("evolve cleared tree");
                *self = working;
                Ok(())
            }
        }
    }

    /// Replace the subtree at `target` (or the root's child, if `target` is
    /// the root) with the shape of `key`.
    ///
    /// Elements named by `key` that the tree already shows keep their leaf.
    /// On error the tree is unchanged; composites the host already created
    /// are not undone.
    pub fn evolve_at<H>(
        &mut self,
        target: NodeId,
        layout: &SplitDockTree,
        key: Key,
        host: &mut H,
        acceptance: Option<&dyn AcceptancePolicy>,
    ) -> Result<(), SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        let mut working = self.clone();
        let subtree = working.evolve_inner(target, layout, key, host, acceptance)?;
        working.validate()?;
        working.validate_members(&*host)?;
        working.refresh_relative_bounds();
        debug!(target_node = ?target, key = %key, subtree = ?subtree, "evolve applied");
        *self = working;
        Ok(())
    }

    /// Capture the current layout as keys.
    ///
    /// Composite elements are decomposed through [`DockableHost::stack`].
    /// Every key remembers the node id it was read from.
    pub fn submit<H>(&self, host: &H) -> Result<SplitDockTree, SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        let mut layout = SplitDockTree::new();
        let mut context = BuildContext::new();
        if let Some(child) = self.root_child() {
            let key = self.submit_node(child, host, &mut layout, &mut context)?;
            layout.root(key)?;
        }
        Ok(layout)
    }

    fn evolve_inner<H>(
        &mut self,
        target: NodeId,
        layout: &SplitDockTree,
        key: Key,
        host: &mut H,
        acceptance: Option<&dyn AcceptancePolicy>,
    ) -> Result<NodeId, SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        if layout.kind(key).is_none() {
            return Err(SplitDockError::UnknownKey { key });
        }
        if self.node(target).is_none() {
            return Err(SplitDockError::MissingNode { node_id: target });
        }
        let at_root = target == self.root();
        let old_subtree = if at_root { self.root_child() } else { Some(target) };
        let inside: FxHashSet<NodeId> = match old_subtree {
            Some(id) => self.collect_subtree_ids(id)?.into_iter().collect(),
            None => FxHashSet::default(),
        };

        // Pull wanted elements out of the rest of the tree first. A composite
        // only moves whole, for a leaf key that names exactly its members.
        let wanted: FxHashSet<DockableId> = layout.elements(key).into_iter().collect();
        let stacked_keys = stacked_leaf_keys(layout, key);
        let mut reusable = Reusable::default();
        for leaf in self.leaves() {
            if inside.contains(&leaf) {
                continue;
            }
            let Some(element) = self.node(leaf).and_then(|record| record.element()) else {
                continue;
            };
            let stack = host.stack(element).map(|stack| stack.elements);
            let pull = match stack {
                _ if wanted.contains(&element) => true,
                Some(members) if stacked_keys.contains(&members) => true,
                Some(members) => match members.into_iter().find(|m| wanted.contains(m)) {
                    Some(member) => {
                        return Err(SplitDockError::ElementStacked {
                            element: member,
                            leaf,
                        });
                    }
                    None => false,
                },
                None => false,
            };
            if pull {
                let _ = self.detach_leaf(leaf)?;
                let _ = reusable.by_element.insert(element, leaf);
            }
        }

        let parent = if at_root {
            None
        } else {
            let parent = self
                .node(target)
                .and_then(|record| record.parent)
                .ok_or(SplitDockError::UnreachableNode { node_id: target })?;
            Some(parent)
        };

        // Unhook the old subtree: split nodes go, leaves float until reused.
        if at_root {
            self.set_root_child(None)?;
        }
        let mut dropped = Vec::new();
        for id in &inside {
            match self.node(*id).map(|record| record.kind) {
                Some(SplitNodeKind::Leaf { element }) => {
                    self.set_parent(*id, None);
                    let _ = reusable.by_element.insert(element, *id);
                }
                Some(_) => dropped.push(*id),
                None => {}
            }
        }
        for element in reusable.by_element.keys() {
            if let Some(stack) = host.stack(*element)
                && !stack.elements.is_empty()
            {
                reusable.stacks.push((stack.elements, *element));
            }
        }
        self.discard(&dropped);

        let subtree = self.materialize(layout, key, &mut reusable, host, acceptance)?;
        match parent {
            None => self.set_root_child(Some(subtree))?,
            Some(parent) => {
                self.replace_child(parent, target, subtree)?;
                self.set_parent(subtree, Some(parent));
            }
        }

        let floating: Vec<NodeId> = self
            .nodes()
            .filter(|record| record.parent.is_none() && record.id != self.root())
            .map(|record| record.id)
            .collect();
        self.discard(&floating);
        Ok(subtree)
    }

    fn materialize<H>(
        &mut self,
        layout: &SplitDockTree,
        key: Key,
        reusable: &mut Reusable,
        host: &mut H,
        acceptance: Option<&dyn AcceptancePolicy>,
    ) -> Result<NodeId, SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        let kind = layout
            .kind(key)
            .ok_or(SplitDockError::UnknownKey { key })?
            .clone();
        match kind {
            KeyKind::Leaf { elements, selected } => {
                let [first, rest @ ..] = elements.as_slice() else {
                    return Err(SplitDockError::EmptyElements);
                };
                if rest.is_empty() {
                    if let Some(leaf) = reusable.by_element.remove(first) {
                        return Ok(leaf);
                    }
                    let leaf = self.claim_node_id(layout.node_id(key))?;
                    self.insert_leaf(leaf, *first);
                    return Ok(leaf);
                }

                if let Some(position) = reusable
                    .stacks
                    .iter()
                    .position(|(members, _)| *members == elements)
                {
                    let (_, composite) = reusable.stacks.swap_remove(position);
                    if let Some(leaf) = reusable.by_element.remove(&composite) {
                        if let Some(selected) = selected {
                            host.select(composite, selected);
                        }
                        return Ok(leaf);
                    }
                }

                let mut composite = *first;
                for next in rest {
                    if !negotiate(&*host, acceptance, composite, *next) {
                        return Err(SplitDockError::Rejected {
                            parent: composite,
                            child: *next,
                        });
                    }
                    composite = host.combine(composite, *next);
                }
                if let Some(selected) = selected {
                    host.select(composite, selected);
                }
                let leaf = self.claim_node_id(layout.node_id(key))?;
                self.insert_leaf(leaf, composite);
                Ok(leaf)
            }
            KeyKind::Node {
                orientation,
                divider,
                first,
                second,
            } => {
                let first = self.materialize(layout, first, reusable, host, acceptance)?;
                let second = self.materialize(layout, second, reusable, host, acceptance)?;
                let node = self.claim_node_id(layout.node_id(key))?;
                self.insert_branch(node, orientation, divider, first, second)?;
                Ok(node)
            }
        }
    }

    fn submit_node<H>(
        &self,
        id: NodeId,
        host: &H,
        layout: &mut SplitDockTree,
        context: &mut BuildContext,
    ) -> Result<Key, SplitDockError>
    where
        H: DockableHost + ?Sized,
    {
        let record = self
            .node(id)
            .ok_or(SplitDockError::MissingNode { node_id: id })?;
        match record.kind {
            SplitNodeKind::Leaf { element } => {
                let (elements, selected) = match host.stack(element) {
                    Some(stack) if !stack.elements.is_empty() => (stack.elements, stack.selected),
                    _ => (vec![element], None),
                };
                layout.leaf_with_id(context, &elements, selected, Some(id))
            }
            SplitNodeKind::Node(branch) => {
                let first = self.submit_node(branch.first, host, layout, context)?;
                let second = self.submit_node(branch.second, host, layout, context)?;
                layout.node(branch.orientation, first, second, branch.divider, Some(id))
            }
            SplitNodeKind::Root { .. } => Err(SplitDockError::DuplicateRoot { node_id: id }),
        }
    }
}

/// Member lists of the multi-element leaf keys below `key`.
fn stacked_leaf_keys(layout: &SplitDockTree, key: Key) -> Vec<Vec<DockableId>> {
    let mut found = Vec::new();
    let mut pending = vec![key];
    while let Some(key) = pending.pop() {
        match layout.kind(key) {
            Some(KeyKind::Leaf { elements, .. }) if elements.len() > 1 => {
                found.push(elements.clone());
            }
            Some(KeyKind::Node { first, second, .. }) => {
                pending.push(*first);
                pending.push(*second);
            }
            _ => {}
        }
    }
    found
}
