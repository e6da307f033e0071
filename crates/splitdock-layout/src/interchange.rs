//! Declarative layout description.
//!
//! A [`SplitDockTree`] is built bottom-up from [`Key`]s: leaf keys name the
//! elements of one leaf, node keys combine two existing keys that have no
//! parent yet. Since a node key can only reference keys created before it, the
//! description is acyclic by construction. Elements may appear in at most one
//! leaf of everything built with the same [`BuildContext`].

use std::fmt;

use rustc_hash::FxHashSet;
use splitdock_core::DockableId;

use crate::error::{SplitDockError, check_divider};
use crate::tree::{NodeId, Orientation};

/// Handle to one node or leaf of a [`SplitDockTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(u32);

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shape of a key.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyKind {
    Leaf {
        /// Stacked elements, in tab order.
        elements: Vec<DockableId>,
        selected: Option<DockableId>,
    },
    Node {
        orientation: Orientation,
        divider: f64,
        first: Key,
        second: Key,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct KeyRecord {
    kind: KeyKind,
    parent: Option<Key>,
    node_id: Option<NodeId>,
}

/// Elements already placed by a series of builder calls.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    used: FxHashSet<DockableId>,
}

impl BuildContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `element` was already placed.
    #[must_use]
    pub fn contains(&self, element: DockableId) -> bool {
        self.used.contains(&element)
    }
}

/// Owned, comparable picture of a key and everything below it.
///
/// Node ids are not part of the shape.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyShape {
    Leaf {
        elements: Vec<DockableId>,
        selected: Option<DockableId>,
    },
    Node {
        orientation: Orientation,
        divider: f64,
        first: Box<KeyShape>,
        second: Box<KeyShape>,
    },
}

/// Write-once builder describing a desired split layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitDockTree {
    keys: Vec<KeyRecord>,
    root: Option<Key>,
}

impl SplitDockTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A leaf stacking `elements`, showing `selected`.
    pub fn leaf(
        &mut self,
        context: &mut BuildContext,
        elements: &[DockableId],
        selected: Option<DockableId>,
    ) -> Result<Key, SplitDockError> {
        self.leaf_with_id(context, elements, selected, None)
    }

    /// Like [`leaf`](Self::leaf), remembering the node id the leaf should get.
    pub fn leaf_with_id(
        &mut self,
        context: &mut BuildContext,
        elements: &[DockableId],
        selected: Option<DockableId>,
        node_id: Option<NodeId>,
    ) -> Result<Key, SplitDockError> {
        if elements.is_empty() {
            return Err(SplitDockError::EmptyElements);
        }
        let mut seen = FxHashSet::default();
        for element in elements {
            if context.used.contains(element) || !seen.insert(*element) {
                return Err(SplitDockError::DuplicateElement { element: *element });
            }
        }
        if let Some(selected) = selected
            && !elements.contains(&selected)
        {
            return Err(SplitDockError::UnknownElement { element: selected });
        }

        context.used.extend(elements.iter().copied());
        // A single element has nothing to select between.
        let selected = if elements.len() == 1 { None } else { selected };
        Ok(self.push(
            KeyKind::Leaf {
                elements: elements.to_vec(),
                selected,
            },
            node_id,
        ))
    }

    /// `first` left of `second`.
    pub fn horizontal(&mut self, first: Key, second: Key, divider: f64) -> Result<Key, SplitDockError> {
        self.node(Orientation::Horizontal, first, second, divider, None)
    }

    /// `first` above `second`.
    pub fn vertical(&mut self, first: Key, second: Key, divider: f64) -> Result<Key, SplitDockError> {
        self.node(Orientation::Vertical, first, second, divider, None)
    }

    /// A split node over two parentless keys.
    pub fn node(
        &mut self,
        orientation: Orientation,
        first: Key,
        second: Key,
        divider: f64,
        node_id: Option<NodeId>,
    ) -> Result<Key, SplitDockError> {
        let divider = check_divider(divider)?;
        for key in [first, second] {
            let record = self.record(key)?;
            if record.parent.is_some() {
                return Err(SplitDockError::KeyHasParent { key });
            }
            if self.root == Some(key) {
                return Err(SplitDockError::KeyIsRoot { key });
            }
        }
        if first == second {
            return Err(SplitDockError::KeyHasParent { key: second });
        }

        let key = self.push(
            KeyKind::Node {
                orientation,
                divider,
                first,
                second,
            },
            node_id,
        );
        for child in [first, second] {
            if let Some(record) = self.keys.get_mut(child.0 as usize) {
                record.parent = Some(key);
            }
        }
        Ok(key)
    }

    /// Designate the root key.
    pub fn root(&mut self, key: Key) -> Result<(), SplitDockError> {
        if self.record(key)?.parent.is_some() {
            return Err(SplitDockError::KeyHasParent { key });
        }
        self.root = Some(key);
        Ok(())
    }

    #[must_use]
    pub const fn root_key(&self) -> Option<Key> {
        self.root
    }

    #[must_use]
    pub fn kind(&self, key: Key) -> Option<&KeyKind> {
        self.keys.get(key.0 as usize).map(|record| &record.kind)
    }

    #[must_use]
    pub fn node_id(&self, key: Key) -> Option<NodeId> {
        self.keys.get(key.0 as usize).and_then(|record| record.node_id)
    }

    #[must_use]
    pub fn parent(&self, key: Key) -> Option<Key> {
        self.keys.get(key.0 as usize).and_then(|record| record.parent)
    }

    /// Number of keys created so far, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Structure of `key` and everything below it.
    #[must_use]
    pub fn shape(&self, key: Key) -> Option<KeyShape> {
        Some(match self.kind(key)? {
            KeyKind::Leaf { elements, selected } => KeyShape::Leaf {
                elements: elements.clone(),
                selected: *selected,
            },
            KeyKind::Node {
                orientation,
                divider,
                first,
                second,
            } => KeyShape::Node {
                orientation: *orientation,
                divider: *divider,
                first: Box::new(self.shape(*first)?),
                second: Box::new(self.shape(*second)?),
            },
        })
    }

    /// Shape of the root key.
    #[must_use]
    pub fn root_shape(&self) -> Option<KeyShape> {
        self.root.and_then(|key| self.shape(key))
    }

    /// Elements below `key`, in order.
    #[must_use]
    pub fn elements(&self, key: Key) -> Vec<DockableId> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(key) = stack.pop() {
            match self.kind(key) {
                Some(KeyKind::Leaf { elements, .. }) => out.extend(elements.iter().copied()),
                Some(KeyKind::Node { first, second, .. }) => {
                    stack.push(*second);
                    stack.push(*first);
                }
                None => {}
            }
        }
        out
    }

    fn record(&self, key: Key) -> Result<&KeyRecord, SplitDockError> {
        self.keys
            .get(key.0 as usize)
            .ok_or(SplitDockError::UnknownKey { key })
    }

    fn push(&mut self, kind: KeyKind, node_id: Option<NodeId>) -> Key {
        let key = Key(u32::try_from(self.keys.len()).unwrap_or(u32::MAX));
        self.keys.push(KeyRecord {
            kind,
            parent: None,
            node_id,
        });
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn element(raw: u64) -> DockableId {
        DockableId::new(raw).expect("non-zero")
    }

    #[test]
    fn builds_nested_shape() {
        let mut tree = SplitDockTree::new();
        let mut ctx = BuildContext::new();
        let a = tree.leaf(&mut ctx, &[element(1)], None).expect("leaf");
        let b = tree
            .leaf(&mut ctx, &[element(2), element(3)], Some(element(3)))
            .expect("stack");
        let c = tree.leaf(&mut ctx, &[element(4)], None).expect("leaf");
        let top = tree.horizontal(a, b, 0.3).expect("node");
        let root = tree.vertical(top, c, 0.6).expect("node");
        tree.root(root).expect("root");

        assert_eq!(tree.root_key(), Some(root));
        assert_eq!(tree.parent(a), Some(top));
        assert_eq!(
            tree.elements(root),
            vec![element(1), element(2), element(3), element(4)]
        );
        let Some(KeyShape::Node {
            orientation,
            divider,
            first,
            ..
        }) = tree.root_shape()
        else {
            panic!("root is a node");
        };
        assert_eq!(orientation, Orientation::Vertical);
        assert_eq!(divider, 0.6);
        assert!(matches!(*first, KeyShape::Node { divider, .. } if divider == 0.3));
    }

    #[test]
    fn elements_are_used_once_per_context() {
        let mut tree = SplitDockTree::new();
        let mut ctx = BuildContext::new();
        let _ = tree.leaf(&mut ctx, &[element(1)], None).expect("leaf");
        assert_eq!(
            tree.leaf(&mut ctx, &[element(2), element(1)], None),
            Err(SplitDockError::DuplicateElement { element: element(1) })
        );
        assert_eq!(
            tree.leaf(&mut ctx, &[element(5), element(5)], None),
            Err(SplitDockError::DuplicateElement { element: element(5) })
        );
        assert!(!ctx.contains(element(2)));

        let mut fresh = BuildContext::new();
        assert!(tree.leaf(&mut fresh, &[element(1)], None).is_ok());
    }

    #[test]
    fn leaf_input_is_checked() {
        let mut tree = SplitDockTree::new();
        let mut ctx = BuildContext::new();
        let err = tree.leaf(&mut ctx, &[], None).expect_err("empty");
        assert_eq!(err.category(), ErrorCategory::Geometric);
        assert_eq!(
            tree.leaf(&mut ctx, &[element(1)], Some(element(2))),
            Err(SplitDockError::UnknownElement { element: element(2) })
        );
    }

    #[test]
    fn single_element_selection_is_dropped() {
        let mut tree = SplitDockTree::new();
        let mut ctx = BuildContext::new();
        let a = tree
            .leaf(&mut ctx, &[element(1)], Some(element(1)))
            .expect("leaf");
        assert_eq!(
            tree.shape(a),
            Some(KeyShape::Leaf {
                elements: vec![element(1)],
                selected: None
            })
        );
    }

    #[test]
    fn keys_attach_once() {
        let mut tree = SplitDockTree::new();
        let mut ctx = BuildContext::new();
        let a = tree.leaf(&mut ctx, &[element(1)], None).expect("leaf");
        let b = tree.leaf(&mut ctx, &[element(2)], None).expect("leaf");
        let c = tree.leaf(&mut ctx, &[element(3)], None).expect("leaf");
        let ab = tree.horizontal(a, b, 0.5).expect("node");

        assert_eq!(tree.vertical(a, c, 0.5), Err(SplitDockError::KeyHasParent { key: a }));
        assert_eq!(tree.root(b), Err(SplitDockError::KeyHasParent { key: b }));
        assert_eq!(tree.horizontal(c, c, 0.5), Err(SplitDockError::KeyHasParent { key: c }));

        tree.root(ab).expect("root");
        assert_eq!(tree.vertical(ab, c, 0.5), Err(SplitDockError::KeyIsRoot { key: ab }));
    }

    #[test]
    fn dividers_and_keys_are_validated() {
        let mut tree = SplitDockTree::new();
        let mut ctx = BuildContext::new();
        let a = tree.leaf(&mut ctx, &[element(1)], None).expect("leaf");
        let b = tree.leaf(&mut ctx, &[element(2)], None).expect("leaf");
        assert_eq!(
            tree.horizontal(a, b, -0.1),
            Err(SplitDockError::InvalidDivider { divider: -0.1 })
        );

        let mut other = SplitDockTree::new();
        assert_eq!(other.root(a), Err(SplitDockError::UnknownKey { key: a }));
    }
}
