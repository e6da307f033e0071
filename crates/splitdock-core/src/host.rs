//! Capabilities a host toolkit provides for its displayable elements.
//!
//! The split layout engine treats elements as opaque [`DockableId`] handles.
//! Everything it needs to know about them (sizes, title strips, whether two
//! elements may be stacked, how to stack them) is asked through
//! [`DockableHost`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::geometry::{PixelRect, Size};

/// Stable identity of a displayable element.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DockableId(u64);

impl DockableId {
    /// Create an element ID, rejecting 0.
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DockableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dockable#{}", self.0)
    }
}

/// Side of an element's frame that carries its title strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TitleSide {
    Top,
    Bottom,
    Left,
    Right,
}

/// A reserved title strip along one side of an element's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TitleStrip {
    pub side: TitleSide,
    /// Thickness in pixels, measured perpendicular to `side`.
    pub thickness: i32,
}

impl TitleStrip {
    /// Pixel area of the strip inside `bounds`.
    #[must_use]
    pub fn area(&self, bounds: PixelRect) -> PixelRect {
        let thickness = self.thickness.max(0);
        match self.side {
            TitleSide::Top => PixelRect::new(
                bounds.x,
                bounds.y,
                bounds.width,
                thickness.min(bounds.height),
            ),
            TitleSide::Bottom => {
                let height = thickness.min(bounds.height);
                PixelRect::new(bounds.x, bounds.bottom() - height, bounds.width, height)
            }
            TitleSide::Left => PixelRect::new(
                bounds.x,
                bounds.y,
                thickness.min(bounds.width),
                bounds.height,
            ),
            TitleSide::Right => {
                let width = thickness.min(bounds.width);
                PixelRect::new(bounds.right() - width, bounds.y, width, bounds.height)
            }
        }
    }
}

/// Decomposition of a composite (stacked) element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stack {
    /// Stacked elements in tab order.
    pub elements: Vec<DockableId>,
    pub selected: Option<DockableId>,
}

/// Host toolkit capabilities consumed by the layout engine.
///
/// Only [`minimum_size`](Self::minimum_size),
/// [`set_bounds`](Self::set_bounds) and [`combine`](Self::combine) are
/// mandatory; the rest default to an element without title strip that accepts
/// everything and is never a stack.
pub trait DockableHost {
    /// Smallest pixel size the element can be laid out at.
    fn minimum_size(&self, element: DockableId) -> Size;

    /// Size the element would like when it is first dropped somewhere.
    fn preferred_size(&self, element: DockableId) -> Size {
        self.minimum_size(element)
    }

    /// Title strip reserved inside the element's bounds, if any.
    fn title_strip(&self, element: DockableId) -> Option<TitleStrip> {
        let _ = element;
        None
    }

    /// Receive the pixel bounds computed for `element`.
    fn set_bounds(&mut self, element: DockableId, bounds: PixelRect);

    /// Whether `parent` agrees to have `child` combined into it.
    fn accept(&self, parent: DockableId, child: DockableId) -> bool {
        let _ = (parent, child);
        true
    }

    /// Stack `second` onto `first`, returning the composite element.
    ///
    /// Combining into an existing composite is expected to extend it rather
    /// than nest another composite.
    fn combine(&mut self, first: DockableId, second: DockableId) -> DockableId;

    /// Make `selected` the visible element of the composite `stack`.
    fn select(&mut self, stack: DockableId, selected: DockableId) {
        let _ = (stack, selected);
    }

    /// Decompose a composite element; `None` for plain elements.
    fn stack(&self, element: DockableId) -> Option<Stack> {
        let _ = element;
        None
    }
}

/// Per-element bookkeeping of [`MemoryHost`].
#[derive(Debug, Clone, Default)]
struct ElementState {
    minimum: Size,
    preferred: Option<Size>,
    title: Option<TitleStrip>,
    bounds: Option<PixelRect>,
}

/// In-memory [`DockableHost`] for headless layout computation.
///
/// Elements are registered with a minimum size; composites created through
/// [`combine`](DockableHost::combine) become new elements whose minimum size
/// is the component-wise maximum of their members.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    next_raw: u64,
    elements: BTreeMap<DockableId, ElementState>,
    stacks: BTreeMap<DockableId, Stack>,
    rejected: BTreeSet<(DockableId, DockableId)>,
    refusing: BTreeSet<DockableId>,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new element with the given minimum size.
    pub fn add_element(&mut self, minimum: Size) -> DockableId {
        let id = self.allocate();
        let _ = self.elements.insert(
            id,
            ElementState {
                minimum,
                ..ElementState::default()
            },
        );
        id
    }

    /// Set the preferred size reported for `element`.
    pub fn set_preferred_size(&mut self, element: DockableId, size: Size) {
        self.elements.entry(element).or_default().preferred = Some(size);
    }

    /// Give `element` a title strip.
    pub fn set_title_strip(&mut self, element: DockableId, strip: Option<TitleStrip>) {
        self.elements.entry(element).or_default().title = strip;
    }

    /// Make `parent` refuse `child` (one direction only).
    pub fn reject(&mut self, parent: DockableId, child: DockableId) {
        let _ = self.rejected.insert((parent, child));
    }

    /// Make `element` refuse every combination, in both roles.
    pub fn refuse_all(&mut self, element: DockableId) {
        let _ = self.refusing.insert(element);
    }

    /// Last bounds handed to `element`.
    #[must_use]
    pub fn bounds(&self, element: DockableId) -> Option<PixelRect> {
        self.elements.get(&element).and_then(|state| state.bounds)
    }

    /// Whether `element` is a composite created by this host.
    #[must_use]
    pub fn is_stack(&self, element: DockableId) -> bool {
        self.stacks.contains_key(&element)
    }

    fn allocate(&mut self) -> DockableId {
        self.next_raw = self.next_raw.saturating_add(1);
        DockableId(self.next_raw)
    }

    fn members(&self, element: DockableId) -> Vec<DockableId> {
        match self.stacks.get(&element) {
            Some(stack) => stack.elements.clone(),
            None => vec![element],
        }
    }
}

impl DockableHost for MemoryHost {
    fn minimum_size(&self, element: DockableId) -> Size {
        if let Some(stack) = self.stacks.get(&element) {
            return stack
                .elements
                .iter()
                .map(|member| self.minimum_size(*member))
                .fold(Size::ZERO, |acc, size| {
                    Size::new(acc.width.max(size.width), acc.height.max(size.height))
                });
        }
        self.elements
            .get(&element)
            .map(|state| state.minimum)
            .unwrap_or_default()
    }

    fn preferred_size(&self, element: DockableId) -> Size {
        self.elements
            .get(&element)
            .and_then(|state| state.preferred)
            .unwrap_or_else(|| self.minimum_size(element))
    }

    fn title_strip(&self, element: DockableId) -> Option<TitleStrip> {
        self.elements.get(&element).and_then(|state| state.title)
    }

    fn set_bounds(&mut self, element: DockableId, bounds: PixelRect) {
        self.elements.entry(element).or_default().bounds = Some(bounds);
    }

    fn accept(&self, parent: DockableId, child: DockableId) -> bool {
        !self.refusing.contains(&parent)
            && !self.refusing.contains(&child)
            && !self.rejected.contains(&(parent, child))
    }

    fn combine(&mut self, first: DockableId, second: DockableId) -> DockableId {
        let incoming = self.members(second);
        let _ = self.stacks.remove(&second);
        if let Some(stack) = self.stacks.get_mut(&first) {
            stack.elements.extend(incoming);
            return first;
        }

        let composite = self.allocate();
        let mut elements = vec![first];
        elements.extend(incoming);
        let _ = self.stacks.insert(
            composite,
            Stack {
                elements,
                selected: None,
            },
        );
        let _ = self.elements.insert(composite, ElementState::default());
        composite
    }

    fn select(&mut self, stack: DockableId, selected: DockableId) {
        if let Some(stack) = self.stacks.get_mut(&stack)
            && stack.elements.contains(&selected)
        {
            stack.selected = Some(selected);
        }
    }

    fn stack(&self, element: DockableId) -> Option<Stack> {
        self.stacks.get(&element).cloned()
    }
}
