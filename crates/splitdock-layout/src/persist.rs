//! Saving and restoring a split layout.
//!
//! Elements are not serializable themselves; the caller supplies an
//! [`ElementIdMap`] between live elements and persistent integer ids. Leaves
//! whose element has no persistent id are left out when writing, and ids the
//! map does not know are skipped when reading. Either way the sibling of a
//! missing leaf takes its parent's place.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use splitdock_core::DockableId;
use tracing::debug;

use crate::error::{SplitDockError, check_divider};
use crate::tree::{NodeId, Orientation, SplitNodeKind, SplitTree};

/// Current snapshot schema version.
pub const SPLIT_LAYOUT_SCHEMA_VERSION: u16 = 1;

/// Persistent id meaning "nothing maximized".
pub const NO_MAXIMIZED: i32 = -1;

/// One persisted node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersistedNode {
    Node {
        id: NodeId,
        orientation: Orientation,
        divider: f64,
        first: Box<PersistedNode>,
        second: Box<PersistedNode>,
    },
    Leaf {
        id: NodeId,
        element: i32,
    },
}

/// Serialized split layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitLayoutSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    #[serde(default)]
    pub root: Option<PersistedNode>,
    /// Persistent id of the maximized element, or [`NO_MAXIMIZED`].
    #[serde(default = "default_maximized")]
    pub maximized: i32,
}

fn default_schema_version() -> u16 {
    SPLIT_LAYOUT_SCHEMA_VERSION
}

const fn default_maximized() -> i32 {
    NO_MAXIMIZED
}

impl Default for SplitLayoutSnapshot {
    fn default() -> Self {
        Self {
            schema_version: SPLIT_LAYOUT_SCHEMA_VERSION,
            root: None,
            maximized: NO_MAXIMIZED,
        }
    }
}

impl SplitLayoutSnapshot {
    /// FNV-1a hash over the snapshot contents, for diagnostics.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hash = FnvHash::new();
        hash.bytes(&self.schema_version.to_le_bytes());
        hash.bytes(&self.maximized.to_le_bytes());
        let mut stack: Vec<&PersistedNode> = self.root.iter().collect();
        while let Some(node) = stack.pop() {
            match node {
                PersistedNode::Node {
                    id,
                    orientation,
                    divider,
                    first,
                    second,
                } => {
                    hash.byte(1);
                    hash.bytes(&id.get().to_le_bytes());
                    hash.byte(match orientation {
                        Orientation::Horizontal => 0,
                        Orientation::Vertical => 1,
                    });
                    hash.bytes(&divider.to_bits().to_le_bytes());
                    stack.push(second);
                    stack.push(first);
                }
                PersistedNode::Leaf { id, element } => {
                    hash.byte(2);
                    hash.bytes(&id.get().to_le_bytes());
                    hash.bytes(&element.to_le_bytes());
                }
            }
        }
        hash.finish()
    }
}

struct FnvHash(u64);

impl FnvHash {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0001_0000_01b3;

    const fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    fn byte(&mut self, byte: u8) {
        self.0 ^= u64::from(byte);
        self.0 = self.0.wrapping_mul(Self::PRIME);
    }

    fn bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.byte(*byte);
        }
    }

    const fn finish(&self) -> u64 {
        self.0
    }
}

/// Two-way mapping between live elements and persistent ids.
#[derive(Debug, Clone, Default)]
pub struct ElementIdMap {
    by_element: FxHashMap<DockableId, i32>,
    by_id: FxHashMap<i32, DockableId>,
}

impl ElementIdMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `element` to `id`, replacing earlier mappings of either. Negative
    /// ids are reserved and refused.
    pub fn insert(&mut self, element: DockableId, id: i32) -> bool {
        if id < 0 {
            return false;
        }
        if let Some(old_id) = self.by_element.insert(element, id) {
            let _ = self.by_id.remove(&old_id);
        }
        if let Some(old_element) = self.by_id.insert(id, element)
            && old_element != element
        {
            let _ = self.by_element.remove(&old_element);
        }
        true
    }

    #[must_use]
    pub fn id_of(&self, element: DockableId) -> Option<i32> {
        self.by_element.get(&element).copied()
    }

    #[must_use]
    pub fn element_of(&self, id: i32) -> Option<DockableId> {
        self.by_id.get(&id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl SplitTree {
    /// Capture the layout, naming elements through `ids`.
    #[must_use]
    pub fn write_snapshot(&self, ids: &ElementIdMap) -> SplitLayoutSnapshot {
        let maximized = self
            .maximized()
            .and_then(|leaf| self.node(leaf))
            .and_then(|record| record.element())
            .and_then(|element| ids.id_of(element))
            .unwrap_or(NO_MAXIMIZED);
        SplitLayoutSnapshot {
            schema_version: SPLIT_LAYOUT_SCHEMA_VERSION,
            root: self.root_child().and_then(|child| self.persist(child, ids)),
            maximized,
        }
    }

    /// Replace the layout with `snapshot`.
    ///
    /// The tree is unchanged if the snapshot is rejected.
    pub fn read_snapshot(
        &mut self,
        snapshot: &SplitLayoutSnapshot,
        ids: &ElementIdMap,
    ) -> Result<(), SplitDockError> {
        if snapshot.schema_version != SPLIT_LAYOUT_SCHEMA_VERSION {
            return Err(SplitDockError::InvalidSnapshot {
                reason: format!("unsupported schema version {}", snapshot.schema_version),
            });
        }

        let mut working = self.clone();
        if let Some(child) = working.root_child() {
            let old = working.collect_subtree_ids(child)?;
            working.set_root_child(None)?;
            working.discard(&old);
        }
        let mut seen = FxHashSet::default();
        let root = match &snapshot.root {
            Some(node) => working.restore(node, ids, &mut seen)?,
            None => None,
        };
        working.set_root_child(root)?;

        if snapshot.maximized != NO_MAXIMIZED {
            let leaf = ids
                .element_of(snapshot.maximized)
                .and_then(|element| working.leaf_of(element));
            working.set_maximized(leaf)?;
        }
        working.validate()?;
        working.refresh_relative_bounds();
        debug!(leaves = seen.len(), maximized = ?working.maximized(), "snapshot restored");
        *self = working;
        Ok(())
    }

    fn persist(&self, id: NodeId, ids: &ElementIdMap) -> Option<PersistedNode> {
        match self.node(id)?.kind {
            SplitNodeKind::Leaf { element } => Some(PersistedNode::Leaf {
                id,
                element: ids.id_of(element)?,
            }),
            SplitNodeKind::Node(branch) => {
                match (self.persist(branch.first, ids), self.persist(branch.second, ids)) {
                    (Some(first), Some(second)) => Some(PersistedNode::Node {
                        id,
                        orientation: branch.orientation,
                        divider: branch.divider,
                        first: Box::new(first),
                        second: Box::new(second),
                    }),
                    (Some(only), None) | (None, Some(only)) => Some(only),
                    (None, None) => None,
                }
            }
            SplitNodeKind::Root { .. } => None,
        }
    }

    fn restore(
        &mut self,
        node: &PersistedNode,
        ids: &ElementIdMap,
        seen: &mut FxHashSet<DockableId>,
    ) -> Result<Option<NodeId>, SplitDockError> {
        match node {
            PersistedNode::Leaf { id, element } => {
                let Some(live) = ids.element_of(*element) else {
                    debug!(element, "snapshot names unknown element");
                    return Ok(None);
                };
                if !seen.insert(live) {
                    debug!(element, "snapshot repeats element");
                    return Ok(None);
                }
                let leaf = self.claim_node_id(Some(*id))?;
                self.insert_leaf(leaf, live);
                Ok(Some(leaf))
            }
            PersistedNode::Node {
                id,
                orientation,
                divider,
                first,
                second,
            } => {
                let divider = check_divider(*divider).map_err(|_| SplitDockError::InvalidSnapshot {
                    reason: format!("node {id} has divider {divider} outside [0, 1]"),
                })?;
                let first = self.restore(first, ids, seen)?;
                let second = self.restore(second, ids, seen)?;
                match (first, second) {
                    (Some(first), Some(second)) => {
                        let branch = self.claim_node_id(Some(*id))?;
                        self.insert_branch(branch, *orientation, divider, first, second)?;
                        Ok(Some(branch))
                    }
                    (Some(only), None) | (None, Some(only)) => Ok(Some(only)),
                    (None, None) => Ok(None),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::interchange::{BuildContext, SplitDockTree};
    use splitdock_core::{MemoryHost, Size};

    struct Fixture {
        host: MemoryHost,
        e: Vec<DockableId>,
        ids: ElementIdMap,
        tree: SplitTree,
    }

    /// `H(0.4)[a, V(0.7)[b, c]]` with ids 10, 11, 12.
    fn fixture() -> Fixture {
        let mut host = MemoryHost::new();
        let e: Vec<_> = (0..3).map(|_| host.add_element(Size::ZERO)).collect();
        let mut ids = ElementIdMap::new();
        for (offset, element) in e.iter().enumerate() {
            assert!(ids.insert(*element, 10 + offset as i32));
        }

        let mut layout = SplitDockTree::new();
        let mut ctx = BuildContext::new();
        let a = layout.leaf(&mut ctx, &[e[0]], None).expect("leaf");
        let b = layout.leaf(&mut ctx, &[e[1]], None).expect("leaf");
        let c = layout.leaf(&mut ctx, &[e[2]], None).expect("leaf");
        let right = layout.vertical(b, c, 0.7).expect("node");
        let root = layout.horizontal(a, right, 0.4).expect("node");
        layout.root(root).expect("root");
        let mut tree = SplitTree::new(4);
        tree.evolve(&layout, &mut host, None).expect("evolve");
        Fixture { host, e, ids, tree }
    }

    #[test]
    fn json_round_trip_restores_shape_and_ids() {
        let mut fx = fixture();
        let leaf_b = fx.tree.leaf_of(fx.e[1]).expect("b");
        fx.tree.set_maximized(Some(leaf_b)).expect("maximize");

        let snapshot = fx.tree.write_snapshot(&fx.ids);
        assert_eq!(snapshot.maximized, 11);
        let json = serde_json::to_string(&snapshot).expect("json");
        assert!(json.contains(r#""kind":"leaf""#));
        let parsed: SplitLayoutSnapshot = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, snapshot);
        assert_eq!(parsed.state_hash(), snapshot.state_hash());

        let mut restored = SplitTree::new(4);
        restored.read_snapshot(&parsed, &fx.ids).expect("read");
        assert_eq!(
            restored.submit(&fx.host).expect("submit").root_shape(),
            fx.tree.submit(&fx.host).expect("submit").root_shape()
        );
        let ids = |t: &SplitTree| t.nodes().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids(&restored), ids(&fx.tree));
        assert_eq!(restored.maximized(), Some(leaf_b));
    }

    #[test]
    fn unmapped_leaves_are_left_out() {
        let mut fx = fixture();
        let mut partial = ElementIdMap::new();
        assert!(partial.insert(fx.e[0], 10));
        assert!(partial.insert(fx.e[2], 12));

        let snapshot = fx.tree.write_snapshot(&partial);
        let Some(PersistedNode::Node { second, .. }) = &snapshot.root else {
            panic!("root should be a node");
        };
        assert!(matches!(**second, PersistedNode::Leaf { element: 12, .. }));

        fx.tree.read_snapshot(&snapshot, &fx.ids).expect("read");
        assert_eq!(fx.tree.elements(), vec![fx.e[0], fx.e[2]]);
    }

    #[test]
    fn unknown_ids_are_skipped_on_read() {
        let fx = fixture();
        let snapshot = fx.tree.write_snapshot(&fx.ids);
        let mut fewer = fx.ids.clone();
        assert!(fewer.insert(fx.e[1], 99));

        let mut restored = SplitTree::new(4);
        // 11 is unknown to `fewer`; b's sibling c moves up.
        restored.read_snapshot(&snapshot, &fewer).expect("read");
        assert_eq!(restored.elements(), vec![fx.e[0], fx.e[2]]);
        restored.validate().expect("valid");
    }

    #[test]
    fn rejects_bad_snapshots() {
        let mut fx = fixture();
        let before = fx.tree.clone();

        let wrong_version = SplitLayoutSnapshot {
            schema_version: 7,
            ..SplitLayoutSnapshot::default()
        };
        let err = fx
            .tree
            .read_snapshot(&wrong_version, &fx.ids)
            .expect_err("version");
        assert_eq!(err.category(), ErrorCategory::Structural);

        let id = |raw| NodeId::new(raw).expect("non-zero");
        let bad_divider = SplitLayoutSnapshot {
            root: Some(PersistedNode::Node {
                id: id(5),
                orientation: Orientation::Vertical,
                divider: 1.5,
                first: Box::new(PersistedNode::Leaf { id: id(3), element: 10 }),
                second: Box::new(PersistedNode::Leaf { id: id(4), element: 11 }),
            }),
            ..SplitLayoutSnapshot::default()
        };
        assert!(matches!(
            fx.tree.read_snapshot(&bad_divider, &fx.ids),
            Err(SplitDockError::InvalidSnapshot { .. })
        ));
        assert_eq!(fx.tree, before);
    }

    #[test]
    fn id_map_is_a_bijection() {
        let mut host = MemoryHost::new();
        let a = host.add_element(Size::ZERO);
        let b = host.add_element(Size::ZERO);
        let mut ids = ElementIdMap::new();
        assert!(ids.insert(a, 1));
        assert!(ids.insert(b, 1));
        assert_eq!(ids.id_of(a), None);
        assert_eq!(ids.element_of(1), Some(b));
        assert!(!ids.insert(a, NO_MAXIMIZED));
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn empty_tree_round_trips() {
        let mut tree = SplitTree::new(4);
        let snapshot = tree.write_snapshot(&ElementIdMap::new());
        assert_eq!(snapshot, SplitLayoutSnapshot::default());
        tree.read_snapshot(&snapshot, &ElementIdMap::new()).expect("read");
        assert!(tree.is_empty());
    }
}
